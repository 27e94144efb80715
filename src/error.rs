use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input at {:?} not found.", path)]
    InputNotFound { path: PathBuf },

    #[error(
        "Malformed row {} in {:?}: expected 2 fields, found {}.",
        line,
        path,
        fields
    )]
    MalformedRow {
        path: PathBuf,
        line: u64,
        fields: usize,
    },

    #[error("Raw read ids for sample '{}' not found at {:?}, skipping.", sample, path)]
    MissingSample { sample: String, path: PathBuf },

    #[error("Raw read ids for sample '{}' at {:?} could not be read ({}), skipping.", sample, path, msg)]
    UnreadableSample {
        sample: String,
        path: PathBuf,
        msg: String,
    },

    #[error("Member '{}' of cluster{} is not in the sequence universe.", member, cluster)]
    MissingMember { cluster: usize, member: String },

    #[error("Centroid '{}' of cluster{} is not in the sequence universe.", centroid, cluster)]
    MissingCentroid { cluster: usize, centroid: String },

    #[error("File at {:?} is invalid{}.", path, PipelineError::format_msg_as_detail(msg))]
    FileNotValid {
        path: PathBuf,
        msg: Option<String>,
    },
}

impl PipelineError {
    /// The sample a soft failure was about, if any
    pub fn skipped_sample(&self) -> Option<&str> {
        match self {
            PipelineError::MissingSample { sample, .. }
            | PipelineError::UnreadableSample { sample, .. } => Some(sample),
            _ => None,
        }
    }

    pub fn format_msg_as_detail(msg: &Option<String>) -> String {
        match msg {
            Some(m) => format!(" ({})", m),
            None => String::new(),
        }
    }
}

/// Fail with InputNotFound unless the directory exists
pub fn require_dir(p: &std::path::Path) -> Result<(), PipelineError> {
    if p.is_dir() {
        Ok(())
    } else {
        Err(PipelineError::InputNotFound { path: p.to_path_buf() })
    }
}

/// Fail with InputNotFound unless the file exists
pub fn require_file(p: &std::path::Path) -> Result<(), PipelineError> {
    if p.is_file() {
        Ok(())
    } else {
        Err(PipelineError::InputNotFound { path: p.to_path_buf() })
    }
}
