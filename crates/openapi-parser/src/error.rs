//! Errors raised while reading an OpenAPI document

use thiserror::Error;

pub type ParseResult<T> = std::result::Result<T, ParseError>;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("OpenAPI document must be a JSON object")]
    NotAnObject,

    #[error("OpenAPI document has no `{0}` field")]
    MissingField(&'static str),

    #[error("`{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    /// Only 3.x documents are understood
    #[error("unsupported OpenAPI version {0}, expected 3.x")]
    UnsupportedVersion(String),

    #[error("malformed OpenAPI document: {0}")]
    Json(#[from] serde_json::Error),
}
