use thiserror::Error;

#[derive(Error, Debug)]
pub enum ErmError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("stage '{stage}' needs a non-blank {artifact}")]
    MissingInput {
        stage: &'static str,
        artifact: &'static str,
    },

    #[error("snapshot decode failed: {0}")]
    Snapshot(String),

    #[error("invalid edit: {0}")]
    Edit(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("tracing initialization failed: {0}")]
    Tracing(String),
}

pub type Result<T> = std::result::Result<T, ErmError>;
