//! Error types for quire operations.

use thiserror::Error;

/// Errors that can occur while loading, synthesizing, or writing structure.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid structure container: {0}")]
    InvalidMets(String),

    #[error("Invalid page file: {0}")]
    InvalidPage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
