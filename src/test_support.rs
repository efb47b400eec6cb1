//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use crate::models::CatalogItem;

/// Builds an unranked catalog item with placeholder names.
pub fn item(id: &str, score_type: &str, score: f64) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        university_name: format!("{} ÜNİVERSİTESİ", id),
        department_name: "Bilgisayar Mühendisliği".to_string(),
        faculty: "Mühendislik Fakültesi".to_string(),
        score_type: score_type.to_string(),
        year: 2024,
        score,
        rank: 0,
        quota: 50,
        city: "ANKARA".to_string(),
    }
}

/// Builds an unranked catalog item with explicit names and city.
pub fn named_item(
    id: &str,
    university: &str,
    department: &str,
    city: &str,
    score_type: &str,
    score: f64,
) -> CatalogItem {
    CatalogItem {
        university_name: university.to_string(),
        department_name: department.to_string(),
        city: city.to_string(),
        ..item(id, score_type, score)
    }
}
