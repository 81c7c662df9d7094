//! Client configuration
//!
//! Layered lowest to highest: built-in defaults, the TOML file, environment
//! variables, command-line flags. The binary reads environment variables
//! through its flag definitions, so this module only merges the file with
//! an [`Overrides`] value.

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Default location of the API.
pub const DEFAULT_API_URL: &str = "http://localhost:4567/api/v1";

/// The configuration file could not be used.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read config file {}", path.display())]
    #[diagnostic(code(shiftboard::config::read))]
    Read {
        /// File path.
        path: PathBuf,
        /// Why.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration.
    #[error("invalid config file")]
    #[diagnostic(
        code(shiftboard::config::parse),
        help("known keys are `api_url`, `token`, `timeout_secs` and `snapshot`"),
    )]
    Parse {
        /// The file contents.
        #[source_code]
        src: NamedSource<String>,
        /// Where the problem is, when known.
        #[label("{message}")]
        span: Option<SourceSpan>,
        /// What is wrong.
        message: String,
    },
}

/// Settings for reaching the shift service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL every endpoint path is appended to.
    pub api_url: String,

    /// Bearer token sent with every request.
    pub token: Option<String>,

    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,

    /// Work against this snapshot file instead of the service.
    pub snapshot: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: 10,
            snapshot: None,
        }
    }
}

/// Values that take precedence over the file. [`None`] keeps the file's value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// See [`Config::api_url`].
    pub api_url: Option<String>,
    /// See [`Config::token`].
    pub token: Option<String>,
    /// See [`Config::snapshot`].
    pub snapshot: Option<PathBuf>,
}

impl Config {
    /// File read when no path is given.
    pub const FILE_NAME: &str = "shiftboard.toml";

    /// Parse configuration text. `name` labels diagnostics.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] with the offending span when `toml` reports one.
    pub fn from_toml(name: &str, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            span: e.span().map(SourceSpan::from),
            message: e.message().to_string(),
            src: NamedSource::new(name, text.to_string()),
        })
    }

    /// Read `path`, or [`Config::FILE_NAME`] if it exists when `path` is [`None`].
    ///
    /// An explicit path must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// See [`ConfigError`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(Self::FILE_NAME), false),
        };
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&path.display().to_string(), &text),
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Apply the higher-precedence layers.
    pub fn with_overrides(self, overrides: Overrides) -> Self {
        let Overrides {
            api_url,
            token,
            snapshot,
        } = overrides;
        Self {
            api_url: api_url.unwrap_or(self.api_url),
            token: token.or(self.token),
            snapshot: snapshot.or(self.snapshot),
            ..self
        }
    }

    /// [`Config::timeout_secs`] as a [`Duration`].
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_default() {
        let config = Config::from_toml("test.toml", "token = \"abc\"\n").unwrap();
        assert_eq!(
            config,
            Config {
                token: Some("abc".to_string()),
                ..Config::default()
            },
        );
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_unknown_key_is_labeled() {
        let text = "api_url = \"http://x\"\ntimeout = 3\n";
        let err = Config::from_toml("test.toml", text).unwrap_err();
        match err {
            ConfigError::Parse { span, message, .. } => {
                assert!(span.is_some(), "toml reports where the bad key is");
                assert!(message.contains("timeout"), "message: {message}");
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_overrides_win() {
        let file = Config {
            api_url: "http://file".to_string(),
            token: Some("file-token".to_string()),
            timeout_secs: 30,
            snapshot: None,
        };
        let merged = file.clone().with_overrides(Overrides {
            token: Some("flag-token".to_string()),
            ..Overrides::default()
        });
        assert_eq!(merged.api_url, "http://file");
        assert_eq!(merged.token.as_deref(), Some("flag-token"));
        assert_eq!(merged.timeout_secs, 30, "timeout only comes from the file");
        assert_eq!(file.clone().with_overrides(Overrides::default()), file);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let missing = Path::new("definitely/not/here/shiftboard.toml");
        assert!(matches!(Config::load(Some(missing)), Err(ConfigError::Read { .. })));
    }
}
