//! Error types for the translation pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("*{keyword}, {option} is not supported")]
    Unsupported { keyword: String, option: String },

    #[error("*{keyword} requires {option}")]
    MissingOption { keyword: String, option: String },

    #[error("{0}")]
    Structural(String),
}

impl ConvertError {
    pub fn unsupported(keyword: impl Into<String>, option: impl Into<String>) -> Self {
        ConvertError::Unsupported {
            keyword: keyword.into(),
            option: option.into(),
        }
    }

    pub fn missing(keyword: impl Into<String>, option: impl Into<String>) -> Self {
        ConvertError::MissingOption {
            keyword: keyword.into(),
            option: option.into(),
        }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        ConvertError::Structural(message.into())
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        ConvertError::Parse {
            line,
            message: message.into(),
        }
    }
}

impl From<a2f_inp::ParseError> for ConvertError {
    fn from(err: a2f_inp::ParseError) -> Self {
        ConvertError::Parse {
            line: err.line,
            message: err.message,
        }
    }
}
