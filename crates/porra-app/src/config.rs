// Configuration loading and parsing (porra.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// File name of the single configuration file under `config/`.
pub const CONFIG_FILE: &str = "porra.toml";

/// Database file name used when `[database] path` is not set.
const DEFAULT_DB_FILE: &str = "porra.db";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub pool: PoolConfig,
    pub data: DataConfig,
    /// Resolved database location.
    pub db_path: PathBuf,
    /// Directory relative paths in the config file are resolved against.
    pub base_dir: PathBuf,
}

impl Config {
    /// Where the dataset is read from.
    pub fn dataset_source(&self) -> Source {
        Source::parse(&self.data.dataset, &self.base_dir)
    }

    /// Where the shared override document is read from, if configured.
    pub fn shared_overrides_source(&self) -> Option<Source> {
        self.data
            .shared_overrides
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Source::parse(s, &self.base_dir))
    }
}

// ---------------------------------------------------------------------------
// porra.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire porra.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    pool: PoolConfig,
    data: DataConfig,
    #[serde(default)]
    database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub name: String,
    /// Key the local override layer is persisted under.
    pub storage_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Path or http(s) URL of the base dataset.
    pub dataset: String,
    /// Path or http(s) URL of the shared override document.
    #[serde(default)]
    pub shared_overrides: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: Option<String>,
}

/// A place a JSON document can be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    /// `http://` and `https://` values are URLs; anything else is a file path,
    /// taken relative to `base_dir` unless absolute.
    pub fn parse(raw: &str, base_dir: &Path) -> Self {
        let raw = raw.trim();
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(raw.to_string())
        } else {
            Source::File(base_dir.join(raw))
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Url(url) => write!(f, "{url}"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/porra.toml` relative to the
/// given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let db_path = resolve_db_path(file.database.path.as_deref(), base_dir);

    let config = Config {
        pool: file.pool,
        data: file.data,
        db_path,
        base_dir: base_dir.to_path_buf(),
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/porra.toml` from `defaults/porra.toml` on first run.
///
/// Returns the path written, or `None` when the config file already exists.
/// An existing file is never overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    let target = config_dir.join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let template = base_dir.join("defaults").join(CONFIG_FILE);
    let content = std::fs::read(&template).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!(
            "no {} and no template at {} ({e}); pass --base-dir pointing at the pool directory",
            target.display(),
            template.display()
        ),
    })?;

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create {}: {e}", config_dir.display()),
    })?;

    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(mut dest) => {
            std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                ConfigError::DefaultsCopyError {
                    message: format!("failed to write {}: {e}", target.display()),
                }
            })?;
            info!("Created {} from defaults", target.display());
            Ok(Some(target))
        }
        // Lost a race with another process creating it.
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

/// Loads config relative to `base_dir`, seeding it from defaults first.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Explicit path (relative to `base_dir`), else the platform data directory,
/// else `porra.db` next to the config.
fn resolve_db_path(configured: Option<&str>, base_dir: &Path) -> PathBuf {
    if let Some(path) = configured.map(str::trim).filter(|p| !p.is_empty()) {
        return base_dir.join(path);
    }
    directories::ProjectDirs::from("", "", "porra")
        .map(|dirs| dirs.data_dir().join(DEFAULT_DB_FILE))
        .unwrap_or_else(|| base_dir.join(DEFAULT_DB_FILE))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let required: &[(&str, &str)] = &[
        ("pool.storage_key", &config.pool.storage_key),
        ("data.dataset", &config.data.dataset),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Helper: returns the path to the porra-app crate root
    /// (works whether `cargo test` runs from the crate root or repo root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("crates/porra-app/defaults").exists() {
            cwd.join("crates/porra-app")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Fresh temp dir with `config/porra.toml` holding `body`.
    fn write_config(name: &str, body: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), body).unwrap();
        tmp
    }

    const VALID: &str = r#"
[pool]
name = "Porra Test"
storage_key = "porra_test_state"

[data]
dataset = "data/data.json"
shared_overrides = "https://example.org/state.json"

[database]
path = "test.db"
"#;

    #[test]
    fn load_valid_config_from_defaults() {
        let tmp = std::env::temp_dir().join("porra_config_test_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            tmp.join("defaults").join(CONFIG_FILE),
        )
        .unwrap();

        let config = load_config(&tmp).expect("should copy defaults and load");
        assert_eq!(config.pool.name, "Porra Champions 25-26");
        assert_eq!(config.pool.storage_key, "porra_champions_25_26_state_v2");
        assert_eq!(config.data.dataset, "data/data.json");
        assert_eq!(config.data.shared_overrides.as_deref(), Some("data/state.json"));
        assert_eq!(config.db_path, tmp.join("porra.db"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn sources_are_classified() {
        let tmp = write_config("porra_config_test_sources", VALID);
        let config = load_config_from(&tmp).unwrap();

        assert_eq!(
            config.dataset_source(),
            Source::File(tmp.join("data/data.json"))
        );
        assert_eq!(
            config.shared_overrides_source(),
            Some(Source::Url("https://example.org/state.json".into()))
        );
        assert_eq!(config.db_path, tmp.join("test.db"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn shared_overrides_are_optional() {
        let tmp = write_config(
            "porra_config_test_no_shared",
            "[pool]\nname = \"x\"\nstorage_key = \"k\"\n\n[data]\ndataset = \"d.json\"\n",
        );
        let config = load_config_from(&tmp).unwrap();
        assert!(config.shared_overrides_source().is_none());
        assert!(config.db_path.ends_with(DEFAULT_DB_FILE));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_storage_key() {
        let tmp = write_config(
            "porra_config_test_empty_key",
            &VALID.replace("porra_test_state", "  "),
        );
        match load_config_from(&tmp) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "pool.storage_key");
            }
            other => panic!("expected ValidationError, got {:?}", other),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_dataset() {
        let tmp = write_config(
            "porra_config_test_empty_dataset",
            &VALID.replace("data/data.json", ""),
        );
        match load_config_from(&tmp) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "data.dataset");
            }
            other => panic!("expected ValidationError, got {:?}", other),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let tmp = std::env::temp_dir().join("porra_config_test_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match load_config_from(&tmp) {
            Err(ConfigError::FileNotFound { path }) => {
                assert!(path.ends_with("config/porra.toml"));
            }
            other => panic!("expected FileNotFound, got {:?}", other),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let tmp = write_config("porra_config_test_malformed", "[pool\nname = ");
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ParseError { .. })
        ));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_never_overwrites() {
        let tmp = write_config("porra_config_test_no_overwrite", VALID);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), "garbage").unwrap();
        fs::write(tmp.join("defaults/porra.toml.example"), "template").unwrap();

        let copied = ensure_config_file(&tmp).unwrap();
        assert!(copied.is_none());
        assert!(!tmp.join("config/porra.toml.example").exists());
        assert!(load_config_from(&tmp).is_ok());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_copies_template_when_missing() {
        let tmp = std::env::temp_dir().join("porra_config_test_seed");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), VALID).unwrap();
        fs::write(tmp.join("defaults/porra.toml.example"), "template").unwrap();

        let copied = ensure_config_file(&tmp).unwrap();
        assert_eq!(copied, Some(tmp.join("config").join(CONFIG_FILE)));
        assert_eq!(
            fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap(),
            VALID
        );
        assert!(!tmp.join("config/porra.toml.example").exists());

        // Second run leaves the seeded file alone.
        assert!(ensure_config_file(&tmp).unwrap().is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_without_template_fails() {
        let tmp = std::env::temp_dir().join("porra_config_test_empty_base");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        assert!(matches!(
            ensure_config_file(&tmp),
            Err(ConfigError::DefaultsCopyError { .. })
        ));

        let _ = fs::remove_dir_all(&tmp);
    }
}
