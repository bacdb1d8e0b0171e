use std::{
    collections::BTreeMap,
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, RollupError};

const DEFAULT_DIR_NAME: &str = ".debt_rollup";
const CONFIG_FILE: &str = "config.json";
const HOME_ENV: &str = "DEBT_ROLLUP_HOME";
const TMP_SUFFIX: &str = "tmp";

/// Static tables and tunables consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Business-area code to station display name.
    #[serde(default = "EngineConfig::default_business_areas")]
    pub business_areas: BTreeMap<String, String>,
    /// Presentation order of account classes.
    #[serde(default = "EngineConfig::default_account_class_order")]
    pub account_class_order: Vec<String>,
    #[serde(default = "EngineConfig::default_government_classes")]
    pub government_classes: Vec<String>,
    #[serde(default = "EngineConfig::default_non_government_classes")]
    pub non_government_classes: Vec<String>,
    /// Presentation order of account-definition codes.
    #[serde(default = "EngineConfig::default_adid_order")]
    pub adid_order: Vec<String>,
    /// Filter sentinel matching records without a segment, also used as the
    /// dimension value for them.
    #[serde(default = "EngineConfig::default_blank_segment_label")]
    pub blank_segment_label: String,
    #[serde(default = "EngineConfig::default_unassigned_staff_label")]
    pub unassigned_staff_label: String,
    #[serde(default = "EngineConfig::default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "EngineConfig::default_max_page_size")]
    pub max_page_size: usize,
    #[serde(default = "EngineConfig::default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            business_areas: Self::default_business_areas(),
            account_class_order: Self::default_account_class_order(),
            government_classes: Self::default_government_classes(),
            non_government_classes: Self::default_non_government_classes(),
            adid_order: Self::default_adid_order(),
            blank_segment_label: Self::default_blank_segment_label(),
            unassigned_staff_label: Self::default_unassigned_staff_label(),
            default_page_size: Self::default_page_size(),
            max_page_size: Self::default_max_page_size(),
            cache_ttl_secs: Self::default_cache_ttl_secs(),
        }
    }
}

impl EngineConfig {
    pub fn default_business_areas() -> BTreeMap<String, String> {
        [
            ("6210", "Central"),
            ("6211", "Metro North"),
            ("6212", "Metro South"),
            ("6220", "Northern"),
            ("6221", "Highland"),
            ("6222", "Valley"),
            ("6230", "Southern"),
            ("6231", "Harbour"),
            ("6232", "Riverside"),
            ("6240", "Eastern"),
            ("6241", "Coastal"),
            ("6242", "Lakeside"),
            ("6250", "Western"),
            ("6251", "Industrial"),
            ("6252", "Airport"),
        ]
        .into_iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect()
    }

    pub fn default_account_class_order() -> Vec<String> {
        to_strings(&["OPCN", "LPCN", "LPCG", "OPCG"])
    }

    pub fn default_government_classes() -> Vec<String> {
        to_strings(&["LPCG", "OPCG"])
    }

    pub fn default_non_government_classes() -> Vec<String> {
        to_strings(&["OPCN", "LPCN"])
    }

    pub fn default_adid_order() -> Vec<String> {
        to_strings(&[
            "DM", "DS", "IN", "AG", "CM", "ST", "SL", "SP", "TR", "MS", "GV", "OT",
        ])
    }

    pub fn default_blank_segment_label() -> String {
        "Blanks".into()
    }

    pub fn default_unassigned_staff_label() -> String {
        "Unassigned".into()
    }

    pub fn default_page_size() -> usize {
        100
    }

    pub fn default_max_page_size() -> usize {
        1_000
    }

    pub fn default_cache_ttl_secs() -> u64 {
        300
    }

    /// Largest page a listing ever serves, whatever `maxPageSize` says.
    pub const PAGE_SIZE_CEILING: usize = 100_000;

    /// `maxPageSize` bounded to `1..=PAGE_SIZE_CEILING`.
    pub fn effective_max_page_size(&self) -> usize {
        self.max_page_size.clamp(1, Self::PAGE_SIZE_CEILING)
    }

    /// Parses a configuration document. Missing fields take their defaults.
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|err| RollupError::Config(err.to_string()))
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Loads and persists [`EngineConfig`] as a JSON document.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Uses `$DEBT_ROLLUP_HOME/config.json`, falling back to
    /// `~/.debt_rollup/config.json`.
    pub fn new() -> Self {
        Self::with_path(Self::base_dir().join(CONFIG_FILE))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn base_dir() -> PathBuf {
        if let Some(custom) = env::var_os(HOME_ENV) {
            return PathBuf::from(custom);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<EngineConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "config file missing, using defaults");
            return Ok(EngineConfig::default());
        }
        let data = fs::read_to_string(&self.path).map_err(config_error)?;
        EngineConfig::from_json(&data)
    }

    pub fn save(&self, config: &EngineConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(config_error)?;
        }
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| RollupError::Config(err.to_string()))?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path).map_err(config_error)?;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn config_error(err: std::io::Error) -> RollupError {
    RollupError::Config(err.to_string())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    let mut file = File::create(path).map_err(config_error)?;
    file.write_all(data.as_bytes()).map_err(config_error)?;
    file.flush().map_err(config_error)?;
    Ok(())
}
