use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read facility catalogue {path}: {source}")]
    CatalogueIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse facility catalogue: {0}")]
    CatalogueParse(#[source] serde_yaml::Error),

    #[error("invalid facility catalogue: {0}")]
    Validation(String),
}
