use crate::models::{CatalogItem, Config, DataSourceMode, RawRecord};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// City used when the university name carries no "(CITY)" suffix.
pub const UNKNOWN_CITY: &str = "Bilinmiyor";

static CITY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(([^)]+)\)$").expect("city suffix pattern is valid"));

pub struct CatalogLoader {
    client: reqwest::Client,
    default_year: u16,
}

impl CatalogLoader {
    pub fn new(default_year: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            default_year,
        }
    }

    /// Load the catalog from the source selected in `config`.
    pub async fn load_configured(&self, config: &Config) -> Result<Vec<CatalogItem>> {
        let file = config.catalog_file.as_deref();
        let url = config.catalog_url.as_deref();

        match config.data_source_mode {
            DataSourceMode::Local => self.load_file(file.context("catalog_file is not configured")?),
            DataSourceMode::Internet => {
                self.fetch_url(url.context("catalog_url is not configured")?).await
            }
            DataSourceMode::Both => match file {
                Some(path) if Path::new(path).exists() => self.load_file(path),
                _ => {
                    info!("Local catalog unavailable, falling back to URL");
                    self.fetch_url(url.context("catalog_url is not configured")?).await
                }
            },
        }
    }

    pub fn load_file(&self, file_path: &str) -> Result<Vec<CatalogItem>> {
        let content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read catalog file: {}", file_path))?;

        self.parse_catalog(&content)
            .with_context(|| format!("Failed to parse catalog file: {}", file_path))
    }

    pub async fn fetch_url(&self, url: &str) -> Result<Vec<CatalogItem>> {
        info!("Fetching catalog from {}", url);

        let response = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("HTTP request failed with status: {}", response.status()));
        }

        let content = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from: {}", url))?;

        self.parse_catalog(&content)
            .with_context(|| format!("Failed to parse catalog from: {}", url))
    }

    /// Parse a JSON array of raw records into normalized items.
    ///
    /// Records without a positive minimum score and records repeating an
    /// already seen program code are dropped. A record missing a required
    /// field fails the whole load.
    pub fn parse_catalog(&self, content: &str) -> Result<Vec<CatalogItem>> {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(content).context("Catalog is not a JSON array")?;

        let total = values.len();
        let mut seen_ids = HashSet::new();
        let mut items = Vec::with_capacity(total);
        let mut unscored = 0usize;

        for (index, value) in values.into_iter().enumerate() {
            let record: RawRecord = serde_json::from_value(value)
                .with_context(|| format!("Catalog record #{} is malformed", index))?;

            let Some(item) = self.normalize_record(record) else {
                unscored += 1;
                continue;
            };

            if !seen_ids.insert(item.id.clone()) {
                warn!("Dropping duplicate program code {} (record #{})", item.id, index);
                continue;
            }

            items.push(item);
        }

        if unscored > 0 {
            debug!("Dropped {} records without a positive minimum score", unscored);
        }
        info!("Loaded {} of {} catalog records", items.len(), total);

        Ok(items)
    }

    /// Normalize one raw record. Returns `None` when it has no usable score.
    pub fn normalize_record(&self, record: RawRecord) -> Option<CatalogItem> {
        let score = record.general.min_score.filter(|score| *score > 0.0)?;
        let (university_name, city) = split_city(&record.university_name);

        Some(CatalogItem {
            id: record.program_code,
            university_name,
            department_name: record.program_name,
            faculty: record.faculty_name,
            score_type: record.score_type,
            year: record.year.unwrap_or(self.default_year),
            score,
            rank: 0,
            quota: record.general.quota,
            city,
        })
    }
}

/// Split a composite "NAME (CITY)" field into name and city.
pub fn split_city(composite: &str) -> (String, String) {
    match CITY_SUFFIX.captures(composite) {
        Some(caps) => {
            let suffix = caps.get(0).map(|m| m.start()).unwrap_or(composite.len());
            let city = caps.get(1).map(|m| m.as_str()).unwrap_or(UNKNOWN_CITY);
            (composite[..suffix].to_string(), city.to_string())
        }
        None => (composite.to_string(), UNKNOWN_CITY.to_string()),
    }
}
