use thiserror::Error;

use crate::pipeline::Stage;

#[derive(Error, Debug)]
pub enum GroomError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed input record {record}: {reason}")]
    MalformedInput { record: String, reason: String },

    #[error("Duplicate item ID {0}: later record wins")]
    DuplicateId(String),

    #[error("Item {id} is unclassifiable: {reason}")]
    Unclassifiable { id: String, reason: String },

    #[error("Stage {stage} failed ({kind}): {message}")]
    StageFailure {
        stage: Stage,
        kind: String,
        message: String,
    },

    #[error("Run cancelled before stage {0}")]
    Cancelled(Stage),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Project not initialized. Run 'groom init' first.")]
    NotInitialized,

    #[error("Project already initialized at {0}")]
    AlreadyInitialized(String),
}

impl GroomError {
    /// Short machine-readable name used in the failure boundary and in issue records.
    pub fn kind(&self) -> &'static str {
        match self {
            GroomError::Config(_) => "ConfigError",
            GroomError::MalformedInput { .. } => "MalformedInputError",
            GroomError::DuplicateId(_) => "DuplicateIdWarning",
            GroomError::Unclassifiable { .. } => "UnclassifiableItemError",
            GroomError::StageFailure { .. } => "StageFailure",
            GroomError::Cancelled(_) => "Cancelled",
            GroomError::NotFound(_) => "NotFound",
            GroomError::Parse(_) => "ParseError",
            GroomError::Export(_) => "ExportError",
            GroomError::Io(_) => "IoError",
            GroomError::Yaml(_) => "YamlError",
            GroomError::Json(_) => "JsonError",
            GroomError::Csv(_) => "CsvError",
            GroomError::NotInitialized => "NotInitialized",
            GroomError::AlreadyInitialized(_) => "AlreadyInitialized",
        }
    }
}

pub type Result<T> = std::result::Result<T, GroomError>;
