use crate::errors::{AppError, AppResult};
use crate::identity::break_glass::BreakGlass;
use crate::ui::messages::success;
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod migrate;

const APP_DIR: &str = "fdcalllog";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    /// How long a writer waits for the database lock before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Rows per page for `call list` and `call search`.
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    #[serde(default)]
    pub break_glass: BreakGlass,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_busy_timeout_ms() -> u64 {
    crate::db::pool::DEFAULT_BUSY_TIMEOUT_MS
}
fn default_page_size() -> i64 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            busy_timeout_ms: default_busy_timeout_ms(),
            default_page_size: default_page_size(),
            break_glass: BreakGlass::default(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join(APP_DIR)
        } else {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
            home.join(format!(".{}", APP_DIR))
        }
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join(format!("{}.conf", APP_DIR))
    }

    pub fn database_file() -> PathBuf {
        Self::config_dir().join(format!("{}.sqlite", APP_DIR))
    }

    /// Load configuration from file, or return defaults if not found.
    /// Fields missing from the file take their defaults.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        let mut cfg: Config = serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        cfg.database = expand_tilde(&cfg.database).to_string_lossy().to_string();
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let yaml = serde_yaml::to_string(self).map_err(|_| AppError::ConfigSave)?;
        let mut file = fs::File::create(path)?;
        file.write_all(yaml.as_bytes())?;
        Ok(())
    }

    /// Initialize configuration and database files.
    ///
    /// A relative `custom_db` lands in the configuration directory. In test
    /// mode the configuration file is left alone and the database path is
    /// used as given.
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();

        let db_path = match custom_db {
            Some(name) => {
                let p = expand_tilde(&name);
                if p.is_absolute() || is_test {
                    p
                } else {
                    dir.join(p)
                }
            }
            None => Self::database_file(),
        };

        let base = if is_test { Self::default() } else { Self::load()? };
        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..base
        };

        if !is_test {
            fs::create_dir_all(&dir)?;
            config.save_to(&Self::config_file())?;
            success(format!("Config file: {}", Self::config_file().display()));
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        Ok(config)
    }
}
