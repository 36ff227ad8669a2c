use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rollcall_core::domain::PhoneRules;
use rollcall_core::rules::{
    validate_source_tag, SenderFilter, DEFAULT_BACKUP_SOURCE, DEFAULT_MIN_SENDER_LENGTH,
    DEFAULT_SYSTEM_SENDERS, DEFAULT_TABULAR_SOURCE,
};
use rollcall_core::CoreError;
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "rollcall";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub phone: PhoneRules,
    pub backup: BackupConfig,
    pub tabular: TabularConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub source_tag: String,
    pub senders: SenderFilter,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            source_tag: DEFAULT_BACKUP_SOURCE.to_string(),
            senders: SenderFilter::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TabularConfig {
    pub default_source: String,
    /// `None` means sniff the delimiter from the file.
    pub delimiter: Option<u8>,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            default_source: DEFAULT_TABULAR_SOURCE.to_string(),
            delimiter: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportConfig {
    pub allow_partial: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid [phone] settings: {0}")]
    InvalidPhone(#[source] CoreError),
    #[error("invalid [backup] settings: {0}")]
    InvalidBackup(#[source] CoreError),
    #[error("invalid [tabular] settings: {0}")]
    InvalidTabular(#[source] CoreError),
    #[error("invalid delimiter {0:?}: expected a single ASCII character or \"tab\"")]
    InvalidDelimiter(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    phone: Option<PhoneFile>,
    backup: Option<BackupFile>,
    tabular: Option<TabularFile>,
    import: Option<ImportFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PhoneFile {
    country_code: Option<String>,
    trunk_prefix: Option<String>,
    national_length: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BackupFile {
    source_tag: Option<String>,
    system_senders: Option<Vec<String>>,
    min_sender_length: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TabularFile {
    default_source: Option<String>,
    delimiter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportFile {
    allow_partial: Option<bool>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    let phone = parsed.phone.unwrap_or_default();
    if phone.country_code.is_some() || phone.trunk_prefix.is_some() || phone.national_length.is_some()
    {
        let defaults = PhoneRules::default();
        config.phone = PhoneRules::new(
            phone
                .country_code
                .as_deref()
                .unwrap_or(defaults.country_code()),
            phone
                .trunk_prefix
                .as_deref()
                .unwrap_or(defaults.trunk_prefix()),
            phone.national_length.unwrap_or(defaults.national_length()),
        )
        .map_err(ConfigError::InvalidPhone)?;
    }

    let backup = parsed.backup.unwrap_or_default();
    if let Some(tag) = backup.source_tag {
        config.backup.source_tag = validate_source_tag(&tag).map_err(ConfigError::InvalidBackup)?;
    }
    if backup.system_senders.is_some() || backup.min_sender_length.is_some() {
        let min_length = backup.min_sender_length.unwrap_or(DEFAULT_MIN_SENDER_LENGTH);
        config.backup.senders = match backup.system_senders {
            Some(senders) => SenderFilter::new(senders, min_length),
            None => SenderFilter::new(DEFAULT_SYSTEM_SENDERS.iter().copied(), min_length),
        }
        .map_err(ConfigError::InvalidBackup)?;
    }

    let tabular = parsed.tabular.unwrap_or_default();
    if let Some(source) = tabular.default_source {
        config.tabular.default_source =
            validate_source_tag(&source).map_err(ConfigError::InvalidTabular)?;
    }
    if let Some(delimiter) = tabular.delimiter {
        config.tabular.delimiter = Some(parse_delimiter(&delimiter)?);
    }

    if let Some(import) = parsed.import {
        if let Some(allow_partial) = import.allow_partial {
            config.import.allow_partial = allow_partial;
        }
    }

    Ok(config)
}

fn parse_delimiter(raw: &str) -> Result<u8> {
    if raw.eq_ignore_ascii_case("tab") {
        return Ok(b'\t');
    }
    match raw.as_bytes() {
        [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' && *byte != b'\r' => Ok(*byte),
        _ => Err(ConfigError::InvalidDelimiter(raw.to_string())),
    }
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
