use std::path::PathBuf;

use serde::Serialize;

/// Errors that abort a prbell run.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to a `miette` report at the boundary.
/// Conditions that only degrade the notification are [`Degradation`]s instead.
///
/// # Examples
///
/// ```
/// use prbell_core::PrbellError;
///
/// let err = PrbellError::Config("missing webhook URL".into());
/// assert!(err.to_string().contains("missing webhook URL"));
/// assert_eq!(err.kind(), "config");
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PrbellError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(prbell::io))]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(prbell::config))]
    Config(String),

    /// The hosting API could not be queried.
    #[error("GitHub error: {0}")]
    #[diagnostic(
        code(prbell::github_fetch),
        help("check GITHUB_TOKEN, the repository name, and the API URL")
    )]
    GitHub(String),

    /// The webhook rejected the notification or could not be reached.
    #[error("webhook dispatch failed{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(prbell::dispatch))]
    Dispatch {
        /// HTTP status code, when the endpoint answered.
        status: Option<u16>,
        /// Underlying error or response body.
        message: String,
    },

    /// The configured chat provider has no message format.
    #[error("unsupported provider '{0}'")]
    #[diagnostic(
        code(prbell::unsupported_provider),
        help("use provider = \"slack\" or provider = \"msteams\"")
    )]
    UnsupportedProvider(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(prbell::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(prbell::toml))]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(prbell::file_not_found))]
    FileNotFound(PathBuf),
}

impl PrbellError {
    /// Stable machine-readable tag for this error, used in JSON run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PrbellError::Io(_) => "io",
            PrbellError::Config(_) => "config",
            PrbellError::GitHub(_) => "github_fetch",
            PrbellError::Dispatch { .. } => "dispatch",
            PrbellError::UnsupportedProvider(_) => "unsupported_provider",
            PrbellError::Serialization(_) => "serialization",
            PrbellError::Toml(_) => "toml",
            PrbellError::FileNotFound(_) => "file_not_found",
        }
    }
}

/// A non-fatal condition that changed how the notification was rendered.
///
/// Degradations never abort a run. They are collected in the run report so
/// callers can tell them apart from [`PrbellError`]s.
///
/// # Examples
///
/// ```
/// use prbell_core::Degradation;
///
/// let d = Degradation::UnmappedUser { login: "carol".into() };
/// let json = serde_json::to_value(&d).unwrap();
/// assert_eq!(json["kind"], "unmapped_user");
/// assert_eq!(json["login"], "carol");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// A provider map entry had no `:` separator or an empty mention id.
    MalformedMapEntry {
        /// The raw entry text.
        entry: String,
    },
    /// A requested reviewer or team has no mention id; the raw name is used.
    UnmappedUser {
        /// GitHub login or team slug.
        login: String,
    },
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Degradation::MalformedMapEntry { entry } => {
                write!(f, "malformed provider map entry '{entry}'")
            }
            Degradation::UnmappedUser { login } => {
                write!(f, "no mention id for '{login}'; raw name used")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PrbellError = io_err.into();
        assert!(err.to_string().contains("gone"));
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn config_error_displays_message() {
        let err = PrbellError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn dispatch_error_includes_status() {
        let err = PrbellError::Dispatch {
            status: Some(404),
            message: "no_team".into(),
        };
        assert_eq!(err.to_string(), "webhook dispatch failed (404): no_team");
        assert_eq!(err.kind(), "dispatch");
    }

    #[test]
    fn dispatch_error_without_status() {
        let err = PrbellError::Dispatch {
            status: None,
            message: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "webhook dispatch failed: connection refused");
    }

    #[test]
    fn unsupported_provider_names_value() {
        let err = PrbellError::UnsupportedProvider("discord".into());
        assert!(err.to_string().contains("discord"));
        assert_eq!(err.kind(), "unsupported_provider");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = PrbellError::FileNotFound(PathBuf::from("/tmp/.prbell.toml"));
        assert!(err.to_string().contains("/tmp/.prbell.toml"));
    }

    #[test]
    fn degradation_display() {
        let d = Degradation::MalformedMapEntry { entry: "bob".into() };
        assert_eq!(d.to_string(), "malformed provider map entry 'bob'");
    }

    #[test]
    fn unmapped_user_display_names_no_provider_syntax() {
        let d = Degradation::UnmappedUser {
            login: "carol".into(),
        };
        assert_eq!(d.to_string(), "no mention id for 'carol'; raw name used");
        assert!(!d.to_string().contains('@'));
    }
}
