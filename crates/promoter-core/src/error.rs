//! Error types for the promoter.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed configuration {path}: {message}")]
    MalformedConfig { path: String, message: String },

    #[error("invalid rule `{rule}` for file {file}: {message}")]
    InvalidRule {
        rule: String,
        file: String,
        message: String,
    },

    #[error("{operation} failed: {message}")]
    Collaborator { operation: String, message: String },

    #[error("partial apply after {applied} operation(s), {file}: {message}")]
    PartialApply {
        file: String,
        applied: usize,
        message: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("{application}:{stage}: {source}")]
    Stage {
        application: String,
        stage: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn collaborator(operation: impl Into<String>, message: impl ToString) -> Self {
        Error::Collaborator {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the application and stage an error was raised for.
    pub fn for_stage(self, application: &str, stage: &str) -> Self {
        Error::Stage {
            application: application.to_string(),
            stage: stage.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping application/stage context.
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
