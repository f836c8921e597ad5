//! Error types for draft editing, import and persistence.

use thiserror::Error;

/// Failure to turn an external document into a draft patch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// The document has no usable cluster name.
    #[error("import document is missing a cluster name")]
    MissingName,

    /// The document is not valid JSON or a known key has the wrong shape.
    #[error("failed to parse import document: {0}")]
    ParseFailure(String),

    /// The document describes more servers than a cluster may hold.
    #[error("import document describes {0} servers, at most {1} are supported")]
    TooManyServers(u64, u64),

    /// The document could not be read from disk.
    #[error("failed to read import document: {0}")]
    Read(String),
}

/// Rejected mod list edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModError {
    /// Mod ids are non-empty strings of ASCII digits.
    #[error("invalid mod id: {0:?}")]
    InvalidId(String),
}

/// Rejected draft mutation. The draft is unchanged whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error(transparent)]
    Mod(#[from] ModError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("no server at position {0}")]
    UnknownServer(usize),

    #[error("map {0} is not selected")]
    UnknownMap(String),

    #[error("unknown game setting: {0}")]
    UnknownSetting(String),

    #[error("invalid value for game setting {key}: expected {expected}")]
    InvalidSettingValue {
        key: String,
        expected: &'static str,
    },

    #[error("unknown wizard step: {0}")]
    UnknownStep(String),

    #[error("{requested} servers requested, at most {max} are supported")]
    TooManyServers { requested: u64, max: u64 },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    Io(String),

    #[error("failed to serialize {what}: {message}")]
    Serialize { what: &'static str, message: String },

    #[error("failed to parse {what}: {message}")]
    Parse { what: &'static str, message: String },

    #[error("{0}")]
    Invalid(String),
}
