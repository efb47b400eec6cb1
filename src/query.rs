//! # Query Engine
//!
//! Filters, sorts and paginates a read-only slice of rank-annotated catalog
//! items. Every predicate present in a [`QueryFilter`] must hold for an item
//! to match; absent predicates place no constraint.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::CatalogItem;
use crate::text;

/// Number of items in every page.
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryFilter {
    /// Substring of university, department or faculty name.
    pub search_query: Option<String>,
    /// Exact score-type code.
    pub score_type: Option<String>,
    pub city: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub year: Option<u16>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub min_rank: Option<u32>,
    pub max_rank: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Score,
    Rank,
    Quota,
    Year,
    University,
    Department,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySort {
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    pub items: Vec<CatalogItem>,
    pub next_cursor: Option<usize>,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "score" => Ok(SortKey::Score),
            "rank" => Ok(SortKey::Rank),
            "quota" => Ok(SortKey::Quota),
            "year" => Ok(SortKey::Year),
            "university" => Ok(SortKey::University),
            "department" => Ok(SortKey::Department),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Score => "score",
            SortKey::Rank => "rank",
            SortKey::Quota => "quota",
            SortKey::Year => "year",
            SortKey::University => "university",
            SortKey::Department => "department",
        };
        f.write_str(name)
    }
}

/// Treat blank text predicates as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Text predicates folded once per query rather than once per item.
struct FoldedFilter<'a> {
    filter: &'a QueryFilter,
    search: Option<String>,
    city: Option<String>,
    university: Option<String>,
    department: Option<String>,
}

impl<'a> FoldedFilter<'a> {
    fn new(filter: &'a QueryFilter) -> Self {
        Self {
            filter,
            search: filter.search_query.as_deref().filter(|q| !q.is_empty()).map(text::fold),
            city: present(&filter.city).map(text::fold),
            university: present(&filter.university).map(text::fold),
            department: present(&filter.department).map(text::fold),
        }
    }

    fn matches(&self, item: &CatalogItem) -> bool {
        let filter = self.filter;

        if let Some(score_type) = present(&filter.score_type) {
            if item.score_type != score_type {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if !text::contains_folded(&item.city, city) {
                return false;
            }
        }
        if let Some(university) = &self.university {
            if !text::contains_folded(&item.university_name, university) {
                return false;
            }
        }
        if let Some(department) = &self.department {
            if !text::contains_folded(&item.department_name, department) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let hit = text::contains_folded(&item.university_name, search)
                || text::contains_folded(&item.department_name, search)
                || text::contains_folded(&item.faculty, search);
            if !hit {
                return false;
            }
        }
        if filter.year.is_some_and(|year| item.year != year) {
            return false;
        }
        if filter.min_score.is_some_and(|min| item.score < min) {
            return false;
        }
        if filter.max_score.is_some_and(|max| item.score > max) {
            return false;
        }
        if filter.min_rank.is_some_and(|min| item.rank < min) {
            return false;
        }
        if filter.max_rank.is_some_and(|max| item.rank > max) {
            return false;
        }
        true
    }
}

fn compare(a: &CatalogItem, b: &CatalogItem, key: SortKey) -> Ordering {
    match key {
        SortKey::Score => a.score.total_cmp(&b.score),
        SortKey::Rank => a.rank.cmp(&b.rank),
        SortKey::Quota => a.quota.cmp(&b.quota),
        SortKey::Year => a.year.cmp(&b.year),
        SortKey::University => text::collate(&a.university_name, &b.university_name),
        SortKey::Department => text::collate(&a.department_name, &b.department_name),
    }
}

/// Every item matching `filter`, in requested order. Equal keys keep their
/// catalog order in both directions.
pub fn filter_and_sort<'a>(
    items: &'a [CatalogItem],
    filter: &QueryFilter,
    sort: QuerySort,
) -> Vec<&'a CatalogItem> {
    let folded = FoldedFilter::new(filter);
    let mut matched: Vec<&CatalogItem> = items.iter().filter(|item| folded.matches(item)).collect();

    matched.sort_by(|a, b| match sort.sort_order {
        SortOrder::Asc => compare(a, b, sort.sort_by),
        SortOrder::Desc => compare(b, a, sort.sort_by),
    });
    matched
}

/// Answer one page of a ranking query.
///
/// `next_cursor` is `page + 1` while more matches remain after this page and
/// `None` once the end is reached, including for pages past the end.
pub fn query(items: &[CatalogItem], filter: &QueryFilter, sort: QuerySort, page: usize) -> QueryPage {
    let matched = filter_and_sort(items, filter, sort);

    let start = page.saturating_mul(PAGE_SIZE);
    let end = start.saturating_add(PAGE_SIZE);
    let page_items = matched
        .iter()
        .skip(start)
        .take(PAGE_SIZE)
        .map(|item| (*item).clone())
        .collect();

    QueryPage {
        items: page_items,
        next_cursor: if end < matched.len() { Some(page + 1) } else { None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranker::derive_ranks;
    use crate::test_support::{item, named_item};

    fn ranked(mut items: Vec<CatalogItem>) -> Vec<CatalogItem> {
        derive_ranks(&mut items);
        items
    }

    fn ids(page: &QueryPage) -> Vec<&str> {
        page.items.iter().map(|i| i.id.as_str()).collect()
    }

    fn sample() -> Vec<CatalogItem> {
        ranked(vec![
            named_item("1", "ORTA DOĞU TEKNİK ÜNİVERSİTESİ", "Bilgisayar Mühendisliği", "ANKARA", "SAY", 520.0),
            named_item("2", "İSTANBUL ÜNİVERSİTESİ", "Hukuk", "İSTANBUL", "EA", 480.0),
            named_item("3", "EGE ÜNİVERSİTESİ", "Tıp", "İZMİR", "SAY", 530.0),
            named_item("4", "ISPARTA UYGULAMALI BİLİMLER ÜNİVERSİTESİ", "İnşaat Mühendisliği", "ISPARTA", "SAY", 300.0),
            named_item("5", "ANKARA ÜNİVERSİTESİ", "Türk Dili ve Edebiyatı", "ANKARA", "SÖZ", 410.0),
        ])
    }

    #[test]
    fn test_score_type_scenario() {
        let items = ranked(vec![item("A", "SAY", 90.0), item("B", "SAY", 80.0), item("C", "EA", 95.0)]);
        let filter = QueryFilter {
            score_type: Some("SAY".to_string()),
            ..Default::default()
        };
        let sort = QuerySort {
            sort_by: SortKey::Score,
            sort_order: SortOrder::Asc,
        };
        let page = query(&items, &filter, sort, 0);
        assert_eq!(ids(&page), vec!["B", "A"]);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_default_sort_is_score_descending() {
        let page = query(&sample(), &QueryFilter::default(), QuerySort::default(), 0);
        assert_eq!(ids(&page), vec!["3", "1", "2", "5", "4"]);
    }

    #[test]
    fn test_search_matches_any_name_with_turkish_folding() {
        let items = sample();
        let filter = QueryFilter {
            search_query: Some("İSTANBUL".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&query(&items, &filter, QuerySort::default(), 0)), vec!["2"]);

        // department name
        let filter = QueryFilter {
            search_query: Some("mühendisliği".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&query(&items, &filter, QuerySort::default(), 0)), vec!["1", "4"]);

        // dotless ı: "ısparta" must not match "istanbul"
        let filter = QueryFilter {
            search_query: Some("ısparta".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&query(&items, &filter, QuerySort::default(), 0)), vec!["4"]);
    }

    #[test]
    fn test_search_matches_faculty() {
        let mut items = sample();
        items[1].faculty = "Hukuk Fakültesi".to_string();
        let filter = QueryFilter {
            search_query: Some("fakültesi".to_string()),
            ..Default::default()
        };
        let page = query(&items, &filter, QuerySort::default(), 0);
        assert_eq!(page.items.len(), 5);
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let filter = QueryFilter {
            search_query: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(query(&sample(), &filter, QuerySort::default(), 0).items.len(), 5);
    }

    #[test]
    fn test_city_university_department_are_folded_substrings() {
        let items = sample();
        let filter = QueryFilter {
            city: Some("ankara".to_string()),
            university: Some("üniversitesi".to_string()),
            department: Some("bilgisayar".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&query(&items, &filter, QuerySort::default(), 0)), vec!["1"]);
    }

    #[test]
    fn test_blank_text_predicates_are_ignored() {
        let filter = QueryFilter {
            score_type: Some(String::new()),
            city: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(query(&sample(), &filter, QuerySort::default(), 0).items.len(), 5);
    }

    #[test]
    fn test_numeric_ranges_are_inclusive() {
        let items = sample();
        let filter = QueryFilter {
            min_score: Some(410.0),
            max_score: Some(520.0),
            ..Default::default()
        };
        assert_eq!(ids(&query(&items, &filter, QuerySort::default(), 0)), vec!["1", "2", "5"]);

        let filter = QueryFilter {
            score_type: Some("SAY".to_string()),
            min_rank: Some(2),
            max_rank: Some(3),
            ..Default::default()
        };
        assert_eq!(ids(&query(&items, &filter, QuerySort::default(), 0)), vec!["1", "4"]);
    }

    #[test]
    fn test_year_filter() {
        let mut items = sample();
        items[0].year = 2023;
        let filter = QueryFilter {
            year: Some(2023),
            ..Default::default()
        };
        assert_eq!(ids(&query(&items, &filter, QuerySort::default(), 0)), vec!["1"]);
    }

    #[test]
    fn test_sort_by_rank_and_quota() {
        let mut items = sample();
        items[0].quota = 10;
        items[1].quota = 30;
        items[2].quota = 20;
        items[3].quota = 5;
        items[4].quota = 40;

        let sort = QuerySort {
            sort_by: SortKey::Quota,
            sort_order: SortOrder::Asc,
        };
        assert_eq!(ids(&query(&items, &QueryFilter::default(), sort, 0)), vec!["4", "1", "3", "2", "5"]);

        // ranks: 3→1, 1→2, 4→3 (SAY); 2→1 (EA); 5→1 (SÖZ)
        let sort = QuerySort {
            sort_by: SortKey::Rank,
            sort_order: SortOrder::Desc,
        };
        assert_eq!(ids(&query(&items, &QueryFilter::default(), sort, 0)), vec!["4", "1", "2", "3", "5"]);
    }

    #[test]
    fn test_sort_by_university_uses_turkish_collation() {
        let sort = QuerySort {
            sort_by: SortKey::University,
            sort_order: SortOrder::Asc,
        };
        let page = query(&sample(), &QueryFilter::default(), sort, 0);
        // ANKARA, EGE, ISPARTA (ı), İSTANBUL (i), ORTA DOĞU
        assert_eq!(ids(&page), vec!["5", "3", "4", "2", "1"]);
    }

    #[test]
    fn test_equal_keys_keep_catalog_order_descending() {
        let items = ranked(vec![
            item("x", "SAY", 400.0),
            item("y", "SAY", 400.0),
            item("z", "SAY", 400.0),
        ]);
        let page = query(&items, &QueryFilter::default(), QuerySort::default(), 0);
        assert_eq!(ids(&page), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_pagination_walks_every_match_once() {
        let items = ranked(
            (0..47)
                .map(|i| item(&format!("P{:02}", i), "SAY", 200.0 + (i * 7 % 47) as f64))
                .collect(),
        );
        let mut collected = Vec::new();
        let mut page_index = 0;
        loop {
            let page = query(&items, &QueryFilter::default(), QuerySort::default(), page_index);
            assert!(page.items.len() <= PAGE_SIZE);
            collected.extend(page.items);
            match page.next_cursor {
                Some(next) => {
                    assert_eq!(next, page_index + 1);
                    page_index = next;
                }
                None => break,
            }
        }

        assert_eq!(page_index, 2);
        let expected: Vec<CatalogItem> = filter_and_sort(&items, &QueryFilter::default(), QuerySort::default())
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(collected, expected);
        assert!(collected.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_exact_page_boundary_has_no_next_cursor() {
        let items = ranked((0..20).map(|i| item(&i.to_string(), "SAY", 300.0 + i as f64)).collect());
        let page = query(&items, &QueryFilter::default(), QuerySort::default(), 0);
        assert_eq!(page.items.len(), 20);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = query(&sample(), &QueryFilter::default(), QuerySort::default(), 9);
        assert!(page.items.is_empty());
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_no_matches() {
        let filter = QueryFilter {
            score_type: Some("DİL".to_string()),
            ..Default::default()
        };
        let page = query(&sample(), &filter, QuerySort::default(), 0);
        assert!(page.items.is_empty());
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_parse_sort_arguments() {
        assert_eq!("RANK".parse::<SortKey>(), Ok(SortKey::Rank));
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert!("height".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_filter_deserializes_from_request_json() {
        let json = r#"{"searchQuery":"tıp","scoreType":"SAY","minRank":1,"maxRank":100}"#;
        let filter: QueryFilter = serde_json::from_str(json).unwrap();
        assert_eq!(filter.search_query.as_deref(), Some("tıp"));
        assert_eq!(filter.max_rank, Some(100));
        assert!(filter.city.is_none());

        let sort: QuerySort = serde_json::from_str(r#"{"sortBy":"quota","sortOrder":"asc"}"#).unwrap();
        assert_eq!(sort.sort_by, SortKey::Quota);
    }
}
