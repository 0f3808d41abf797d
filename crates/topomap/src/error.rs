use std::path::PathBuf;
use topomap_lib::TopoError;

/// Everything that can stop the command line tool
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: TopoError,
    },

    #[error("Render failed: {0}")]
    Render(#[from] TopoError),

    #[error("Failed to write output: {0}")]
    Write(#[source] std::io::Error),

    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
