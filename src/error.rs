use thiserror::Error;

use crate::construct::{ResName, ResourceId};

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Resource id {id:#010x} belongs to package {actual:#04x}, but the table uses {expected:#04x}")]
    PackageIdentifierMismatch { id: ResourceId, expected: u8, actual: u8 },
    #[error("Resource id {id:#010x} is already mapped to {existing}, cannot map it to {requested}")]
    IdCollision { id: ResourceId, existing: ResName, requested: ResName },
    #[error("Resource {name} is already mapped to {existing:#010x}, cannot map it to {requested:#010x}")]
    NameCollision { name: ResName, existing: ResourceId, requested: ResourceId },
    #[error("Resource table for '{0}' is sealed")]
    Sealed(String),
    #[error("Overlay build for '{package}' timed out after {seconds}s")]
    MergeTimeout { package: String, seconds: u64 },
    #[error("Merged index for '{package}' holds {merged} entries, expected {expected}")]
    MergeCollision { package: String, merged: usize, expected: usize },
    #[error("Qualifier error: {message}")]
    Qualifier { message: String },
    #[error("Load error: {0}")]
    Load(String),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, ResourceError>;

// Helper conversions
impl From<serde_json::Error> for ResourceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Load(e.to_string())
    }
}
impl From<config::ConfigError> for ResourceError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
