//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("YAML serialization error: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error(transparent)]
    Store(#[from] promoter_core::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl From<ConfigError> for promoter_core::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Parse { path, source } => promoter_core::Error::MalformedConfig {
                path,
                message: source.to_string(),
            },
            ConfigError::Serialize(source) => promoter_core::Error::MalformedConfig {
                path: promoter_core::layout::RELEASER_FILE.to_string(),
                message: source.to_string(),
            },
            ConfigError::Store(inner) => inner,
        }
    }
}
