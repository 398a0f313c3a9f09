// Error taxonomy for the publish path

use std::path::PathBuf;

use crate::config::ConfigField;

/// Errors raised while loading config, collecting a snapshot or publishing it.
///
/// Every variant is fatal for the current process run; nothing inside the crate
/// retries. The publish binary maps each variant to a non-zero exit code via
/// [`Error::exit_code`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The config path does not exist.
    #[error("config file {} does not exist", .0.display())]
    ConfigMissing(PathBuf),

    /// The config path exists but could not be read.
    #[error("config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not a valid JSON config object.
    #[error("config file {}: invalid JSON: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A config value is structurally invalid (independent of metric family).
    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    /// A field required by the selected metric family is absent or empty.
    #[error("config is missing required field(s) for '{family}': {}", join_fields(.missing))]
    ConfigValidation {
        family: &'static str,
        missing: Vec<ConfigField>,
    },

    /// The dispatcher or endpoint table has no entry for this name.
    #[error("unsupported metric family '{0}'")]
    UnsupportedFamily(String),

    /// The collector could not read the operating system statistics.
    #[error("collecting '{family}' failed: {message}")]
    Collect {
        family: &'static str,
        message: String,
    },

    /// The collector returned a snapshot of the wrong shape for the family.
    #[error("collector returned a {found} snapshot for '{family}', expected {expected}")]
    SnapshotShape {
        family: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// Serializing an outgoing record failed.
    #[error("encoding record: {0}")]
    Encode(#[from] serde_json::Error),

    /// Connection failure or non-2xx response from the remote endpoint.
    #[error("{}", transport_message(.url, .status, .message))]
    Transport {
        url: String,
        status: Option<u16>,
        /// Remote response body, when the server sent one.
        body: Option<String>,
        message: String,
    },
}

/// Convenience `Result` alias for the publish path.
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code of the publish binary when the log subscriber cannot be installed.
/// Distinct from every [`Error::exit_code`].
pub const LOGGING_SETUP_EXIT_CODE: u8 = 6;

impl Error {
    /// Process exit code for this error. Always non-zero.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::ConfigMissing(_) | Error::ConfigRead { .. } | Error::ConfigParse { .. } => 1,
            Error::ConfigInvalid(_) | Error::ConfigValidation { .. } => 2,
            Error::UnsupportedFamily(_) => 3,
            Error::Collect { .. } | Error::SnapshotShape { .. } | Error::Encode(_) => 4,
            Error::Transport { .. } => 5,
        }
    }

    /// Remote response body carried by a transport error.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Error::Transport { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}

fn join_fields(fields: &[ConfigField]) -> String {
    fields
        .iter()
        .map(|f| f.key())
        .collect::<Vec<_>>()
        .join(", ")
}

fn transport_message(url: &str, status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("POST {} returned HTTP {}: {}", url, code, message),
        None => format!("POST {} failed: {}", url, message),
    }
}
