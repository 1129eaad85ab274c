//! Jarvis CLI configuration types and loading
//!
//! The config file holds named environments, each pointing at one Jarvis API
//! host. A [`Profile`] is built once at start-up from the selected environment
//! and handed to every command.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment used when `-e` is not given
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Editor used when neither the config file nor `$EDITOR` names one
pub const FALLBACK_EDITOR: &str = "vi";

const CONFIG_DIR: &str = "jarvis";
const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not set up: {0} (run `jarvis init`)")]
    NotFound(PathBuf),

    #[error("Environment '{environment}' not found in {path}")]
    MissingEnvironment { environment: String, path: PathBuf },

    #[error("Could not determine the user config directory")]
    NoConfigDir,

    #[error("Invalid answer for {title}: {answer} ({reason})")]
    InvalidAnswer {
        title: String,
        answer: String,
        reason: String,
    },

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Contents of the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level used when `--log-level` is not given
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Editor command for editing buffers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    /// Program that displays `show` output instead of printing it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<String>,

    /// Named environments
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

/// One Jarvis deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub host: String,

    pub port: u16,

    /// Author recorded on new tags and log entries
    pub author: String,

    /// Directory holding the server's data files, used by backup and restore
    #[serde(rename = "data-directory")]
    pub data_directory: PathBuf,

    /// Directory receiving snapshot tarballs
    #[serde(rename = "snapshots-directory")]
    pub snapshots_directory: PathBuf,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR);
        Self {
            host: "localhost".to_string(),
            port: 3000,
            author: String::new(),
            data_directory: base.join("data"),
            snapshots_directory: base.join("snapshots"),
        }
    }
}

impl EnvironmentConfig {
    /// Base URL of the API this environment points at
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

impl Config {
    /// `~/.config/jarvis/config.yml` or the platform equivalent
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Explicit path if given, otherwise the default location
    pub fn resolve_path(path: Option<&PathBuf>) -> Result<PathBuf, ConfigError> {
        match path {
            Some(path) => Ok(path.clone()),
            None => Self::default_path(),
        }
    }

    /// Load the config file; a missing file is an error
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Config::load: called");
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config file, or start empty when there is none yet
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Log level from the config file, if it can be read at all
    ///
    /// Used before logging is set up, so failures are silent here and
    /// reported by the full load afterwards.
    pub fn load_log_level(path: &Path) -> Option<String> {
        Self::load(path).ok().and_then(|config| config.log_level)
    }

    /// Write the config file, creating its directory if needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_yaml::to_string(self).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Config::save: written");
        Ok(())
    }

    pub fn environment(&self, name: &str, path: &Path) -> Result<&EnvironmentConfig, ConfigError> {
        self.environments
            .get(name)
            .ok_or_else(|| ConfigError::MissingEnvironment {
                environment: name.to_string(),
                path: path.to_path_buf(),
            })
    }

    /// Editor command: config file, then `$EDITOR`, then `vi`
    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| std::env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()))
            .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
    }
}

/// Resolved settings for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub environment: String,
    pub base_url: String,
    pub author: String,
    pub editor: String,
    pub viewer: Option<String>,
    pub data_directory: PathBuf,
    pub snapshots_directory: PathBuf,
    /// Where editing buffers are written
    pub scratch_dir: PathBuf,
}

impl Profile {
    /// Build the profile for `environment`; a missing environment is fatal
    pub fn new(config: &Config, environment: &str, config_path: &Path) -> Result<Self, ConfigError> {
        let env = config.environment(environment, config_path)?;
        let profile = Self {
            environment: environment.to_string(),
            base_url: env.base_url(),
            author: env.author.clone(),
            editor: config.editor_command(),
            viewer: config.viewer.clone().filter(|v| !v.trim().is_empty()),
            data_directory: env.data_directory.clone(),
            snapshots_directory: env.snapshots_directory.clone(),
            scratch_dir: std::env::temp_dir(),
        };
        info!(
            environment = %profile.environment,
            base_url = %profile.base_url,
            "Profile::new: resolved"
        );
        Ok(profile)
    }
}

/// What kind of value an `init` question expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Text,
    Port,
    Directory,
}

/// Apply the default to an `init` answer and validate it
///
/// An empty answer takes `default`. A typed directory answer must name an
/// existing directory; the default is accepted as shown. Port answers must be
/// a valid port number.
pub fn resolve_answer(title: &str, answer: &str, default: &str, kind: AnswerKind) -> Result<String, ConfigError> {
    let answer = answer.trim();
    let value = if answer.is_empty() { default } else { answer };

    let invalid = |reason: &str| ConfigError::InvalidAnswer {
        title: title.to_string(),
        answer: value.to_string(),
        reason: reason.to_string(),
    };

    match kind {
        AnswerKind::Text => {}
        AnswerKind::Port => {
            value.parse::<u16>().map_err(|_| invalid("not a port number"))?;
        }
        AnswerKind::Directory => {
            if !answer.is_empty() && !Path::new(value).is_dir() {
                return Err(invalid("not an existing directory"));
            }
        }
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const YAML: &str = r#"
log-level: debug
editor: nano
environments:
  default:
    host: localhost
    port: 3000
    author: Jane Doe
    data-directory: /var/lib/jarvis/data
    snapshots-directory: /var/lib/jarvis/snapshots
  staging:
    host: https://jarvis.example.com
    port: 443
    author: Jane Doe
    data-directory: /srv/jarvis/data
    snapshots-directory: /srv/jarvis/snapshots
"#;

    fn write_config(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("config.yml");
        fs::write(&path, YAML).unwrap();
        path
    }

    #[test]
    fn test_deserialize_config() {
        let config: Config = serde_yaml::from_str(YAML).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.editor.as_deref(), Some("nano"));
        assert!(config.viewer.is_none());

        let env = &config.environments["default"];
        assert_eq!(env.port, 3000);
        assert_eq!(env.author, "Jane Doe");
        assert_eq!(env.data_directory, PathBuf::from("/var/lib/jarvis/data"));
    }

    #[test]
    fn test_base_url() {
        let config: Config = serde_yaml::from_str(YAML).unwrap();
        assert_eq!(config.environments["default"].base_url(), "http://localhost:3000");
        assert_eq!(
            config.environments["staging"].base_url(),
            "https://jarvis.example.com:443"
        );
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope.yml");
        assert!(matches!(Config::load(&path), Err(ConfigError::NotFound(_))));
        assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml_names_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "environments: [oops").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("config.yml"));
    }

    #[test]
    fn test_missing_environment_is_fatal() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp);
        let config = Config::load(&path).unwrap();

        let err = Profile::new(&config, "production", &path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvironment { .. }));
        assert!(err.to_string().contains("production"));
    }

    #[test]
    fn test_profile_from_environment() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp);
        let config = Config::load(&path).unwrap();

        let profile = Profile::new(&config, DEFAULT_ENVIRONMENT, &path).unwrap();
        assert_eq!(profile.base_url, "http://localhost:3000");
        assert_eq!(profile.author, "Jane Doe");
        assert_eq!(profile.editor, "nano");
        assert_eq!(profile.snapshots_directory, PathBuf::from("/var/lib/jarvis/snapshots"));
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.yml");

        let mut config = Config::default();
        config.environments.insert(
            "default".to_string(),
            EnvironmentConfig {
                author: "Jane".to_string(),
                ..Default::default()
            },
        );
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(Config::load_log_level(&path), None);
    }

    #[test]
    #[serial]
    fn test_editor_falls_back_to_env_then_vi() {
        let config = Config::default();

        // SAFETY: serialized with the other tests touching EDITOR
        unsafe {
            std::env::set_var("EDITOR", "emacs");
        }
        assert_eq!(config.editor_command(), "emacs");

        // SAFETY: serialized with the other tests touching EDITOR
        unsafe {
            std::env::remove_var("EDITOR");
        }
        assert_eq!(config.editor_command(), FALLBACK_EDITOR);
    }

    #[test]
    #[serial]
    fn test_config_editor_beats_env() {
        // SAFETY: serialized with the other tests touching EDITOR
        unsafe {
            std::env::set_var("EDITOR", "emacs");
        }
        let config = Config {
            editor: Some("hx".to_string()),
            ..Default::default()
        };
        let editor = config.editor_command();
        // SAFETY: serialized with the other tests touching EDITOR
        unsafe {
            std::env::remove_var("EDITOR");
        }
        assert_eq!(editor, "hx");
    }

    #[test]
    fn test_resolve_answer_default_and_validation() {
        assert_eq!(resolve_answer("Host", "", "localhost", AnswerKind::Text).unwrap(), "localhost");
        assert_eq!(resolve_answer("Host", " jarvis ", "localhost", AnswerKind::Text).unwrap(), "jarvis");
        assert_eq!(resolve_answer("Port", "", "3000", AnswerKind::Port).unwrap(), "3000");
        assert!(resolve_answer("Port", "http", "3000", AnswerKind::Port).is_err());
    }

    #[test]
    fn test_resolve_answer_directory_must_exist() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_string_lossy().to_string();
        assert_eq!(
            resolve_answer("Data directory", &dir, "/nowhere", AnswerKind::Directory).unwrap(),
            dir
        );

        let err = resolve_answer("Data directory", "/definitely/not/here", "/nowhere", AnswerKind::Directory).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAnswer { .. }));

        // The shown default is taken even before the directory exists
        assert_eq!(
            resolve_answer("Data directory", "", "/definitely/not/here", AnswerKind::Directory).unwrap(),
            "/definitely/not/here"
        );
    }
}
