pub mod command;
pub mod error;
pub mod fileformat;

pub use error::PipelineError;
