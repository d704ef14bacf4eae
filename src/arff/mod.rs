/// ARFF (attribute-relation file format) layer.
///
/// ```text
///   Table ──► convert ──► ArffDataset ──► writer ──► .arff
///                              ▲
///   .arff ──► parser ──────────┘
/// ```
pub mod convert;
pub mod model;
pub mod parser;
pub mod writer;

use thiserror::Error;

pub use model::{ArffDataset, Attribute, AttributeType};

#[derive(Debug, Error)]
pub enum ArffError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: value '{value}' is not valid for attribute '{attribute}'")]
    InvalidValue {
        line: usize,
        attribute: String,
        value: String,
    },

    #[error("missing @DATA section")]
    MissingData,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArffError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        ArffError::Syntax {
            line,
            message: message.into(),
        }
    }
}
