use std::path::PathBuf;
use thiserror::Error;

/// Manager-level failures reading or writing the preset file
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to read preset from {}", path.display())]
    LoadingFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write preset to {}", path.display())]
    SavingFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Preset is neither canonical ({canonical}) nor legacy ({legacy})")]
    InvalidFormat { canonical: String, legacy: String },

    #[error("No preset file at {}", .0.display())]
    MissingFile(PathBuf),
}

impl ConfigurationError {
    pub(crate) fn saving(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        ConfigurationError::SavingFailed {
            path: path.into(),
            source: source.into(),
        }
    }
}
