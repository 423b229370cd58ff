use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Persisted document (a JSON array of source records).
    pub document: PathBuf,
    /// Flat directory holding every edition image.
    pub images_dir: PathBuf,
}

impl StoreConfig {
    /// The directory recorded `./images/...` paths resolve against: the
    /// images directory's parent.
    pub fn base_dir(&self) -> PathBuf {
        self.images_dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// The images directory's final component, as it appears in recorded
    /// paths.
    pub fn images_dir_name(&self) -> String {
        self.images_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("images")
            .to_string()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

fn default_concurrency() -> usize {
    6
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValidationConfig {
    /// Payloads below this byte count are rejected outright.
    #[serde(default = "default_min_bytes")]
    pub min_bytes: usize,
    /// Both decoded dimensions must reach this floor.
    #[serde(default = "default_min_dimension")]
    pub min_dimension: u32,
    /// Width must not exceed height times this ratio. Absent = filter off.
    #[serde(default)]
    pub aspect_ceiling: Option<f64>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_bytes: default_min_bytes(),
            min_dimension: default_min_dimension(),
            aspect_ceiling: None,
        }
    }
}

fn default_min_bytes() -> usize {
    1000
}
fn default_min_dimension() -> u32 {
    400
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionConfig {
    /// Slot comparison flavor: `tolerant` or `exact`. One per deployment.
    #[serde(default = "default_detection_mode")]
    pub mode: String,
    /// Tolerant mode: maximum relative byte-size difference per slot.
    #[serde(default = "default_size_tolerance")]
    pub size_tolerance: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            mode: default_detection_mode(),
            size_tolerance: default_size_tolerance(),
        }
    }
}

fn default_detection_mode() -> String {
    "tolerant".to_string()
}
fn default_size_tolerance() -> f64 {
    0.03
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub name: String,
    /// Per-source banner ceiling; falls back to `[validation].aspect_ceiling`.
    #[serde(default)]
    pub aspect_ceiling: Option<f64>,
    pub acquire: AcquireSpec,
}

/// Which page-acquisition strategy produces this source's candidate list.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AcquireSpec {
    /// Expand a URL template containing `{page}` for pages 1..=pages.
    Template { url: String, pages: u32 },
    /// A fixed, ordered list of candidate URLs.
    List { urls: Vec<String> },
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate fetch
    if config.fetch.concurrency == 0 || config.fetch.concurrency > 16 {
        anyhow::bail!("fetch.concurrency must be in 1..=16");
    }
    if config.fetch.timeout_secs == 0 {
        anyhow::bail!("fetch.timeout_secs must be > 0");
    }

    // Validate validation thresholds
    if config.validation.min_dimension == 0 {
        anyhow::bail!("validation.min_dimension must be > 0");
    }
    if let Some(ratio) = config.validation.aspect_ceiling {
        if ratio <= 0.0 {
            anyhow::bail!("validation.aspect_ceiling must be > 0");
        }
    }

    // Validate detection
    match config.detection.mode.as_str() {
        "tolerant" | "exact" => {}
        other => anyhow::bail!(
            "Unknown detection mode: '{}'. Must be tolerant or exact.",
            other
        ),
    }
    if !(config.detection.size_tolerance > 0.0 && config.detection.size_tolerance <= 0.5) {
        anyhow::bail!("detection.size_tolerance must be in (0.0, 0.5]");
    }

    // Validate sources
    if config.sources.is_empty() {
        anyhow::bail!("At least one [[sources]] entry is required");
    }
    for source in &config.sources {
        if source.name.trim().is_empty() {
            anyhow::bail!("Source names must not be empty");
        }
        if let Some(ratio) = source.aspect_ceiling {
            if ratio <= 0.0 {
                anyhow::bail!("aspect_ceiling for source '{}' must be > 0", source.name);
            }
        }
        match &source.acquire {
            AcquireSpec::Template { url, pages } => {
                if !url.contains("{page}") {
                    anyhow::bail!(
                        "Template URL for source '{}' must contain a {{page}} placeholder",
                        source.name
                    );
                }
                if *pages == 0 {
                    anyhow::bail!("Template pages for source '{}' must be > 0", source.name);
                }
            }
            AcquireSpec::List { urls } => {
                if urls.is_empty() {
                    anyhow::bail!("URL list for source '{}' must not be empty", source.name);
                }
            }
        }
    }
    let mut names: Vec<&str> = config.sources.iter().map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    if names.len() != config.sources.len() {
        anyhow::bail!("Source names must be unique");
    }

    Ok(config)
}

impl SourceConfig {
    /// Effective banner ceiling for this source, if any.
    pub fn effective_aspect_ceiling(&self, validation: &ValidationConfig) -> Option<f64> {
        self.aspect_ceiling.or(validation.aspect_ceiling)
    }
}
