use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Catalog source configuration
    pub data_source_mode: DataSourceMode,
    pub catalog_file: Option<String>,
    pub catalog_url: Option<String>,
    pub default_year: u16,
    // Personal list storage
    pub storage_directory: Option<String>,
    pub default_list_name: String,
    pub favorites_list_name: String,
    // Logging
    pub log_file: Option<String>,
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSourceMode {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "internet")]
    Internet,
    #[serde(rename = "both")]
    Both,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_source_mode: DataSourceMode::Local,
            catalog_file: Some("data/catalog.json".to_string()),
            catalog_url: None,
            default_year: 2024,
            storage_directory: None,
            default_list_name: "Yeni Liste".to_string(),
            favorites_list_name: "Favoriler".to_string(),
            log_file: Some("yks-rankings.log".to_string()),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }

    /// Directory holding the persisted personal lists.
    pub fn resolved_storage_directory(&self) -> std::path::PathBuf {
        match &self.storage_directory {
            Some(dir) => std::path::PathBuf::from(dir),
            None => dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("yks-rankings"),
        }
    }
}

/// One record of the raw catalog snapshot, as published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "ProgramCode")]
    pub program_code: String,
    #[serde(rename = "UniversityType", default)]
    pub university_type: Option<String>,
    /// Composite "NAME (CITY)" field.
    #[serde(rename = "UniversityName")]
    pub university_name: String,
    #[serde(rename = "FacultyName")]
    pub faculty_name: String,
    #[serde(rename = "ProgramName")]
    pub program_name: String,
    #[serde(rename = "ScoreType")]
    pub score_type: String,
    #[serde(rename = "Year", default)]
    pub year: Option<u16>,
    #[serde(rename = "General")]
    pub general: RawGeneral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGeneral {
    #[serde(rename = "Quota")]
    pub quota: u32,
    #[serde(rename = "Placed", default)]
    pub placed: Option<u32>,
    #[serde(rename = "MinScore", default)]
    pub min_score: Option<f64>,
    #[serde(rename = "MaxScore", default)]
    pub max_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub university_name: String,
    pub department_name: String,
    pub faculty: String,
    pub score_type: String,
    pub year: u16,
    pub score: f64,
    pub rank: u32,
    pub quota: u32,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub year: u16,
    pub score: f64,
    pub rank: u32,
}

/// A catalog item enriched with descriptive data for the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingDetail {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub history: Vec<HistoryEntry>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub years: Vec<u16>,
    pub score_types: Vec<String>,
    pub cities: Vec<String>,
    pub universities: Vec<String>,
    pub departments: Vec<String>,
}
