//! Diagnostic error types for document extraction.

use std::path::PathBuf;

use miette::Diagnostic;
use respace_types::SourceFormat;
use thiserror::Error;

/// Errors from turning document bytes into text.
#[derive(Debug, Error, Diagnostic)]
pub enum ExtractError {
    #[error("unsupported file format: \"{name}\"")]
    #[diagnostic(
        code(respace::extract::unsupported_format),
        help("Supported extensions are: pdf, docx, pptx, xlsx, xls, txt and md.")
    )]
    UnsupportedFormat { name: String },

    #[error("parse error in {format} document: {message}")]
    #[diagnostic(
        code(respace::extract::parse_error),
        help(
            "The document could not be parsed. Verify the file is a valid {format} \
             document and not corrupted."
        )
    )]
    Parse {
        format: SourceFormat,
        message: String,
    },

    #[error("{format} document is missing required part \"{part}\"")]
    #[diagnostic(
        code(respace::extract::missing_part),
        help(
            "The archive opened but does not contain the expected {format} layout. \
             The file may have the wrong extension."
        )
    )]
    MissingPart {
        format: SourceFormat,
        part: String,
    },

    #[error("\"{name}\" is {size} bytes, over the {limit} byte limit")]
    #[diagnostic(
        code(respace::extract::too_large),
        help("Split the document or extract a smaller part of it.")
    )]
    TooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    #[error("no text could be extracted from \"{name}\"")]
    #[diagnostic(
        code(respace::extract::empty_text),
        help("The document may be scanned images without a text layer, or empty.")
    )]
    EmptyText { name: String },

    #[error("I/O error reading \"{}\": {source}", path.display())]
    #[diagnostic(
        code(respace::extract::io),
        help("A filesystem operation failed. Check file paths and permissions.")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub(crate) fn parse(format: SourceFormat, err: impl std::fmt::Display) -> Self {
        ExtractError::Parse {
            format,
            message: err.to_string(),
        }
    }
}

/// Convenience alias for extraction results.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
