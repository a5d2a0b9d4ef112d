use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    /// The upstream contour hierarchy broke its own linking contract.
    #[error("Malformed contour hierarchy at node {index}: {reason}")]
    MalformedHierarchy { index: usize, reason: String },

    #[error("Unknown filter id {id} ({available} filters configured)")]
    UnknownFilter { id: usize, available: usize },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Unsupported format: {0}. Please use .toml or .json files")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid detection report: {0}")]
    InvalidReport(String),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, DetectError>;
