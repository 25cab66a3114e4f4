use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    #[error("invalid pixel buffer: {len} bytes does not match {width}x{height} RGBA")]
    InvalidBuffer { width: u32, height: u32, len: usize },

    #[error("preset not found: {0}")]
    PresetNotFound(String),

    #[error("built-in preset cannot be removed: {0}")]
    BuiltinPresetImmutable(String),

    #[error("preset file version {got} is newer than supported {max}")]
    VersionTooNew { got: String, max: String },

    #[error("preset file version {got} is older than supported {min}")]
    VersionTooOld { got: String, min: String },

    #[error("invalid preset file: {0}")]
    InvalidPresetFile(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
