use std::io;

use thiserror::Error;

use crate::reader::ParseError;
use crate::source::EventId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Malformed xml: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("Invalid value '{value}' for attribute '{name}'")]
    InvalidAttribute { name: String, value: String },

    /// Generator information is required for all simulated events
    #[error("Simulated event {0} has no generator information")]
    MissingGeneratorInfo(EventId),

    #[error("Simulated event {0} has no beam particles")]
    MissingBeams(EventId),
}
