use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LandcoverError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("server returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("unsupported metadata format: {0} (only .jsonld is supported)")]
    #[diagnostic(help("pass the JSON-LD document published on open.canada.ca"))]
    UnsupportedMetadataFormat(String),

    #[error("required metadata node missing: {0}")]
    MissingMetadataNode(&'static str),

    #[error("title does not start with a four digit year: {0}")]
    InvalidTitle(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("no raster found in {0}")]
    AssetNotFound(PathBuf),

    #[error("{program} exited with {status}: {output}")]
    ProcessFailed {
        program: String,
        status: String,
        output: String,
    },

    #[error("required tool not found: {0}")]
    #[diagnostic(help("install the GDAL command line utilities and make sure they are on PATH"))]
    MissingTool(String),

    #[error("raster error: {0}")]
    Raster(#[from] gdal::errors::GdalError),

    #[error("failed to (de)serialize JSON: {0}")]
    Json(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("destination directory does not exist: {0}")]
    DestinationMissing(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to start the STAC validator: {0}")]
    Validator(String),

    #[error("invalid STAC {kind} {id}: {reason}")]
    InvalidStac {
        kind: &'static str,
        id: String,
        reason: String,
    },
}
