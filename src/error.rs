//! Error types for towerstim.
//!
//! This module provides error types for reading stimulus tables, loading
//! configuration, assigning materials, talking to the host engine, and
//! running the dataset driver.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a stimulus table.
#[derive(Debug, Error)]
pub enum TableError {
    /// Failed to open or read the table file.
    #[error("failed to read stimulus table '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A row could not be parsed.
    #[error("malformed row in stimulus table: {0}")]
    Csv(#[from] csv::Error),
    /// A required column is absent from the header.
    #[error("stimulus table is missing required column '{0}'")]
    MissingColumn(&'static str),
    /// No rows exist for the requested stimulus (and ratio).
    #[error("no rows for stimulus '{name}'{}", ratio_suffix(.ratio))]
    MissingData { name: String, ratio: Option<String> },
    /// The same object name appears twice within one stimulus.
    #[error("object '{object}' appears more than once in stimulus '{name}'")]
    DuplicateObject { name: String, object: String },
    /// A blocktype value other than 0 or 1.
    #[error("invalid blocktype {value} for object '{object}' (expected 0 or 1)")]
    InvalidBlockType { object: String, value: f64 },
}

fn ratio_suffix(ratio: &Option<String>) -> String {
    match ratio {
        Some(r) => format!(" with ratio '{r}'"),
        None => String::new(),
    }
}

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the config file.
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid JSON for the expected schema.
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// A dataset is mapped to a strategy name that does not exist.
    #[error("dataset '{dataset}' maps to unknown material strategy '{strategy}'")]
    UnknownStrategy { dataset: String, strategy: String },
    /// A dataset was requested that has no strategy mapping.
    #[error("dataset '{0}' has no material strategy configured")]
    UnknownDataset(String),
}

/// Errors that can occur while assigning materials to blocks.
#[derive(Debug, Error)]
pub enum MaterialError {
    /// The strategy needs a blocktype but the block has none.
    #[error("material strategy '{strategy}' requires a blocktype for object '{object}'")]
    MissingBlockType {
        strategy: &'static str,
        object: String,
    },
    /// A reference color literal could not be parsed.
    #[error("invalid hex color '{0}'")]
    InvalidHexColor(String),
}

/// Errors reported by a host engine backend.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A handle did not refer to an object in the current scene.
    #[error("unknown object handle {0}")]
    UnknownHandle(usize),
    /// Filesystem failure while writing render output.
    #[error("render output error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to serialize the scene manifest.
    #[error("failed to write scene manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    /// Failed to write a texture image.
    #[error("failed to write texture: {0}")]
    Image(#[from] image::ImageError),
    /// The external render command exited unsuccessfully.
    #[error("render command '{command}' failed with {status}")]
    RenderCommand { command: String, status: String },
}

/// Errors that abort a dataset run.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The stimulus table is missing or malformed.
    #[error(transparent)]
    Table(#[from] TableError),
    /// Material assignment failed.
    #[error(transparent)]
    Material(#[from] MaterialError),
    /// The host engine reported a failure.
    #[error("host engine error: {0}")]
    Engine(Box<dyn std::error::Error + Send + Sync>),
}

impl DriverError {
    /// Wrap a backend-specific engine error.
    pub fn engine<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DriverError::Engine(Box::new(e))
    }
}
