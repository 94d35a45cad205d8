//! RON config file plus command-line overrides.
//!
//! Precedence, lowest first: compiled defaults, the config file, flags and
//! environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use harvest_engine::{
    ApiSettings, DisplayedCountSource, FixedCount, HarvestSettings, HtmlHeaderCount,
};
use harvest_logging::{harvest_warn, LogDestination, DEFAULT_LOG_FILE};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;

pub const DEFAULT_CONFIG_FILE: &str = "contact-harvest.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub base_url: String,
    pub profile_base_url: String,
    pub csrf_token: Option<String>,
    pub cookie: Option<String>,
    pub step_delay_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub max_response_bytes: u64,
    pub output_dir: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    /// Also log to stderr. Ignored when `log_file` is `None`.
    pub log_to_terminal: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        let harvest = HarvestSettings::default();
        Self {
            base_url: api.base_url,
            profile_base_url: harvest.profile_base_url,
            csrf_token: None,
            cookie: None,
            step_delay_ms: harvest.step_delay.as_millis() as u64,
            connect_timeout_secs: api.connect_timeout.as_secs(),
            request_timeout_secs: api.request_timeout.map(|t| t.as_secs()),
            max_response_bytes: api.max_bytes,
            output_dir: PathBuf::from("."),
            log_level: "info".to_string(),
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            log_to_terminal: true,
        }
    }
}

/// A parsed config and the file it came from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: FileConfig,
    pub source: Option<PathBuf>,
}

/// Load the config file. An explicit path must exist; the default one may not.
///
/// Runs before the logger is installed, so it does not log; callers report
/// `source` once logging is up.
pub fn load_file_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(LoadedConfig {
                config: FileConfig::default(),
                source: None,
            });
        }
        Err(source) => return Err(ConfigError::Io { path, source }),
    };

    let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    Ok(LoadedConfig {
        config,
        source: Some(path),
    })
}

/// Everything the binary needs, after merging file and command line.
pub struct Settings {
    pub api: ApiSettings,
    pub harvest: HarvestSettings,
    pub output_dir: PathBuf,
    pub log_level: LevelFilter,
    pub log_destination: LogDestination,
}

impl Settings {
    pub fn resolve(file: FileConfig, cli: &Cli) -> Result<Self, ConfigError> {
        let mut step_delay_ms = file.step_delay_ms;
        let mut output_dir = file.output_dir;
        if let crate::cli::Command::Harvest {
            output_dir: dir,
            delay_ms,
            ..
        } = &cli.command
        {
            if let Some(dir) = dir {
                output_dir = dir.clone();
            }
            if let Some(delay) = delay_ms {
                step_delay_ms = *delay;
            }
        }

        let log_level = if cli.verbose {
            LevelFilter::Debug
        } else {
            file.log_level
                .parse::<LevelFilter>()
                .map_err(|_| ConfigError::LogLevel(file.log_level.clone()))?
        };
        let log_destination = match (file.log_file, file.log_to_terminal) {
            (Some(path), true) => LogDestination::Both(path),
            (Some(path), false) => LogDestination::File(path),
            (None, _) => LogDestination::Terminal,
        };

        Ok(Self {
            api: ApiSettings {
                base_url: file.base_url,
                csrf_token: cli.csrf_token.clone().or(file.csrf_token).unwrap_or_default(),
                cookie: cli.cookie.clone().or(file.cookie).unwrap_or_default(),
                connect_timeout: Duration::from_secs(file.connect_timeout_secs),
                request_timeout: file.request_timeout_secs.map(Duration::from_secs),
                max_bytes: file.max_response_bytes,
            },
            harvest: HarvestSettings {
                step_delay: Duration::from_millis(step_delay_ms),
                profile_base_url: file.profile_base_url,
            },
            output_dir,
            log_level,
            log_destination,
        })
    }
}

/// True when the command line names a displayed-count source.
pub fn has_count_source(cli: &Cli) -> bool {
    cli.page_html.is_some() || cli.displayed_count.is_some()
}

/// Where the displayed count comes from: a saved page, a number, or nothing (0).
pub fn page_source(cli: &Cli) -> Result<Arc<dyn DisplayedCountSource>, ConfigError> {
    if !has_count_source(cli) {
        harvest_warn!(
            "Neither --page-html nor --displayed-count given; displayed count is 0 and no connections will be listed"
        );
    }
    if let Some(path) = &cli.page_html {
        let html = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        return Ok(Arc::new(HtmlHeaderCount::new(html)));
    }
    Ok(Arc::new(FixedCount(cli.displayed_count.unwrap_or(0))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["contact-harvest"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn partial_ron_file_keeps_defaults() {
        let config: FileConfig = ron::from_str("(step_delay_ms: 250, log_file: None)").unwrap();
        assert_eq!(config.step_delay_ms, 250);
        assert_eq!(config.log_file, None);
        assert_eq!(config.base_url, "https://www.linkedin.com");
        assert_eq!(config.request_timeout_secs, None);
    }

    #[test]
    fn loaded_config_names_its_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("harvest.ron");
        fs::write(&path, "(step_delay_ms: 10)").unwrap();

        let loaded = load_file_config(Some(&path)).unwrap();
        assert_eq!(loaded.source, Some(path));
        assert_eq!(loaded.config.step_delay_ms, 10);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let explicit = temp.path().join("nope.ron");
        assert!(matches!(
            load_file_config(Some(&explicit)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("bad.ron");
        fs::write(&path, "(step_delay_ms: \"soon\")").unwrap();
        assert!(matches!(
            load_file_config(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn flags_override_file_values() {
        let file = FileConfig {
            csrf_token: Some("from-file".into()),
            step_delay_ms: 2000,
            ..FileConfig::default()
        };
        let cli = cli(&[
            "--csrf-token",
            "from-flag",
            "harvest",
            "--delay-ms",
            "10",
            "--output-dir",
            "exports",
        ]);
        let settings = Settings::resolve(file, &cli).unwrap();

        assert_eq!(settings.api.csrf_token, "from-flag");
        assert_eq!(settings.harvest.step_delay, Duration::from_millis(10));
        assert_eq!(settings.output_dir, PathBuf::from("exports"));
    }

    #[test]
    fn log_destination_follows_file_settings() {
        let resolve = |file: FileConfig| Settings::resolve(file, &cli(&["count"])).unwrap();

        let both = resolve(FileConfig::default());
        assert_eq!(
            both.log_destination,
            LogDestination::Both(PathBuf::from(DEFAULT_LOG_FILE))
        );

        let file_only = resolve(FileConfig {
            log_to_terminal: false,
            ..FileConfig::default()
        });
        assert_eq!(
            file_only.log_destination,
            LogDestination::File(PathBuf::from(DEFAULT_LOG_FILE))
        );

        let terminal = resolve(FileConfig {
            log_file: None,
            log_to_terminal: false,
            ..FileConfig::default()
        });
        assert_eq!(terminal.log_destination, LogDestination::Terminal);
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let file = FileConfig {
            log_level: "loud".into(),
            ..FileConfig::default()
        };
        assert!(matches!(
            Settings::resolve(file, &cli(&["count"])),
            Err(ConfigError::LogLevel(_))
        ));
    }

    #[test]
    fn count_source_requires_a_flag() {
        assert!(!has_count_source(&cli(&["harvest"])));
        assert!(has_count_source(&cli(&["--displayed-count", "0", "harvest"])));
        assert!(has_count_source(&cli(&["--page-html", "page.html", "harvest"])));
    }

    #[test]
    fn displayed_count_flag_becomes_fixed_source() {
        let source = page_source(&cli(&["--displayed-count", "7", "count"])).unwrap();
        assert_eq!(source.displayed_count(), 7);
        let source = page_source(&cli(&["count"])).unwrap();
        assert_eq!(source.displayed_count(), 0);
    }
}
