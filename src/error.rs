use std::path::PathBuf;

/// Failure to read an external heightmap. The terrain it was meant for is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum TerrainLoadError {
    #[error("Error while opening heightmap {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Heightmap json error: {0}")]
    Parse(#[from] json::Error),
    #[error("Malformed heightmap: {0}")]
    Malformed(String),
    #[error("Heightmaps only apply to the spatial simulation")]
    PlanarMode,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Error while opening settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Settings json error: {0}")]
    Parse(#[from] json::Error),
    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
