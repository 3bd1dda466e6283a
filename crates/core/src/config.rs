//! Configuration management for the Promptify runner.
//!
//! Sources, lowest precedence first:
//! - Built-in defaults
//! - Config file (`.promptify/config.yaml` in the workspace, or `PROMPTIFY_CONFIG`)
//! - Environment variables
//! - Command-line flags (`with_overrides`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Public Promptify API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.promptify.com/api";

/// Environment variable holding the API token unless the config file names another.
pub const DEFAULT_TOKEN_ENV: &str = "PROMPTIFY_API_TOKEN";

/// Main application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .promptify/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Base URL of the Promptify API, without trailing slash
    pub api_url: String,

    /// API token sent as `Authorization: Token <token>`
    #[serde(skip_serializing)]
    pub api_token: Option<String>,

    /// Request timeout for non-streaming calls, in seconds
    pub timeout_secs: Option<u64>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("workspace", &self.workspace)
            .field("config_file", &self.config_file)
            .field("api_url", &self.api_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("log_level", &self.log_level)
            .field("verbose", &self.verbose)
            .field("no_color", &self.no_color)
            .finish()
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    api: Option<ApiSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiSection {
    url: Option<String>,
    #[serde(rename = "tokenEnv")]
    token_env: Option<String>,
    timeout: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            timeout_secs: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `PROMPTIFY_WORKSPACE`: Override workspace path
    /// - `PROMPTIFY_CONFIG`: Path to config file
    /// - `PROMPTIFY_API_URL`: API base URL
    /// - `PROMPTIFY_API_TOKEN`: API token (or the variable named by `api.tokenEnv`)
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration with the workspace and config file chosen on the
    /// command line. These take precedence over `PROMPTIFY_WORKSPACE` and
    /// `PROMPTIFY_CONFIG` and decide which file is read.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        } else if let Ok(workspace) = std::env::var("PROMPTIFY_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        } else if let Ok(config_file) = std::env::var("PROMPTIFY_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.promptify_dir().join("config.yaml"));

        let mut token_env = DEFAULT_TOKEN_ENV.to_string();
        if config.config_file.is_some() && !config_path.exists() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        if config_path.exists() {
            let file = read_config_file(&config_path)?;
            if let Some(env) = file.api.as_ref().and_then(|api| api.token_env.clone()) {
                token_env = env;
            }
            config.merge_file(file);
        }

        // Environment variables override the config file
        if let Ok(url) = std::env::var("PROMPTIFY_API_URL") {
            config.api_url = url;
        }

        if let Ok(token) = std::env::var(&token_env) {
            if !token.trim().is_empty() {
                config.api_token = Some(token);
            }
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.no_color = true;
        }

        config.api_url = normalize_url(&config.api_url);
        Ok(config)
    }

    fn merge_file(&mut self, file: ConfigFile) {
        if let Some(api) = file.api {
            if let Some(url) = api.url {
                self.api_url = url;
            }
            if let Some(timeout) = api.timeout {
                self.timeout_secs = Some(timeout);
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and config file.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        api_url: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(api_url) = api_url {
            self.api_url = normalize_url(&api_url);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .promptify directory.
    pub fn promptify_dir(&self) -> PathBuf {
        self.workspace.join(".promptify")
    }

    /// Token for API calls, or a configuration error naming how to provide one.
    pub fn require_token(&self) -> AppResult<&str> {
        self.api_token.as_deref().ok_or_else(|| {
            AppError::Config(format!(
                "API token not configured. Set {} or api.tokenEnv in .promptify/config.yaml",
                DEFAULT_TOKEN_ENV
            ))
        })
    }

    /// Validate the settings needed to talk to the API.
    pub fn validate(&self) -> AppResult<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "Invalid API URL: {}. Expected an http(s) URL",
                self.api_url
            )));
        }

        self.require_token()?;

        if self.timeout_secs == Some(0) {
            return Err(AppError::Config(
                "api.timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn read_config_file(path: &Path) -> AppResult<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

    serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.api_token.is_none());
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(
            None,
            None,
            Some("http://localhost:8000/api/".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.api_url, "http://localhost:8000/api");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_file_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
api:
  url: http://localhost:9000/api
  tokenEnv: MY_TOKEN
  timeout: 15
logging:
  level: warn
  color: false
"#,
        )
        .unwrap();

        let file = read_config_file(&path).unwrap();
        assert_eq!(
            file.api.as_ref().and_then(|a| a.token_env.clone()),
            Some("MY_TOKEN".to_string())
        );

        let mut config = AppConfig::default();
        config.merge_file(file);
        assert_eq!(config.api_url, "http://localhost:9000/api");
        assert_eq!(config.timeout_secs, Some(15));
        assert_eq!(config.log_level, Some("warn".to_string()));
        assert!(config.no_color);
    }

    #[test]
    fn test_load_with_explicit_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("other.yaml");
        fs::write(
            &path,
            "api:\n  url: http://localhost:9100/api/\n  timeout: 42\n",
        )
        .unwrap();

        let config =
            AppConfig::load_with(Some(temp_dir.path().to_path_buf()), Some(path.clone())).unwrap();
        assert_eq!(config.workspace, temp_dir.path());
        assert_eq!(config.config_file, Some(path));
        assert_eq!(config.timeout_secs, Some(42));
        if std::env::var("PROMPTIFY_API_URL").is_err() {
            assert_eq!(config.api_url, "http://localhost:9100/api");
        }
    }

    #[test]
    fn test_load_with_workspace_reads_its_config() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(".promptify");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yaml"), "api:\n  timeout: 7\n").unwrap();

        let config = AppConfig::load_with(Some(temp_dir.path().to_path_buf()), None);
        // An explicit PROMPTIFY_CONFIG in the environment would point elsewhere
        if std::env::var("PROMPTIFY_CONFIG").is_err() {
            assert_eq!(config.unwrap().timeout_secs, Some(7));
        }
    }

    #[test]
    fn test_load_with_missing_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = AppConfig::load_with(
            Some(temp_dir.path().to_path_buf()),
            Some(temp_dir.path().join("absent.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "api: [not, a, map").unwrap();
        assert!(read_config_file(&path).is_err());
    }

    #[test]
    fn test_validate_requires_token() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.api_token = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = AppConfig::default();
        config.api_token = Some("secret".to_string());
        config.api_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = AppConfig::default();
        config.api_token = Some("super-secret".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
