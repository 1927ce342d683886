//! Document text extraction and format detection.
//!
//! Each supported format implements [`Extractor`]. The [`extractor_for`]
//! factory returns the extractor for a [`SourceFormat`], and
//! [`extract_text`] dispatches on a file name.
//!
//! Text bound for the normalizer goes through [`extract_for_normalization`],
//! which adds the upload guards: a size limit, NUL removal and a check that
//! some text came out at all.

pub mod error;
mod ooxml;
mod pdf;
mod sheet;
mod xml;

use std::path::Path;

use respace_types::SourceFormat;
use tracing::{debug, info};

use crate::analyzer::TextNormalizer;

pub use error::{ExtractError, ExtractResult};

/// Largest document accepted by [`extract_for_normalization`].
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Format-specific text extraction.
pub trait Extractor {
    /// Extracts the text content of a whole document.
    fn extract(&self, data: &[u8]) -> ExtractResult<String>;

    /// The format this extractor handles.
    fn format(&self) -> SourceFormat;
}

macro_rules! extractor {
    ($name:ident, $format:expr, $func:path) => {
        struct $name;

        impl Extractor for $name {
            fn extract(&self, data: &[u8]) -> ExtractResult<String> {
                $func(data)
            }

            fn format(&self) -> SourceFormat {
                $format
            }
        }
    };
}

extractor!(PdfExtractor, SourceFormat::Pdf, pdf::extract_pdf);
extractor!(DocxExtractor, SourceFormat::Docx, ooxml::extract_docx);
extractor!(PptxExtractor, SourceFormat::Pptx, ooxml::extract_pptx);
extractor!(XlsxExtractor, SourceFormat::Xlsx, sheet::extract_xlsx);
extractor!(XlsExtractor, SourceFormat::Xls, sheet::extract_xls);
extractor!(PlainTextExtractor, SourceFormat::PlainText, decode_plain_text);

/// Returns the extractor for `format`.
pub fn extractor_for(format: SourceFormat) -> Box<dyn Extractor + Send + Sync> {
    match format {
        SourceFormat::Pdf => Box::new(PdfExtractor),
        SourceFormat::Docx => Box::new(DocxExtractor),
        SourceFormat::Pptx => Box::new(PptxExtractor),
        SourceFormat::Xlsx => Box::new(XlsxExtractor),
        SourceFormat::Xls => Box::new(XlsExtractor),
        SourceFormat::PlainText => Box::new(PlainTextExtractor),
    }
}

/// Decodes UTF-8, dropping invalid byte sequences.
fn decode_plain_text(data: &[u8]) -> ExtractResult<String> {
    let mut out = String::with_capacity(data.len());
    for chunk in data.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    Ok(out)
}

/// Extracts the text of `data`, choosing the format from `file_name`'s
/// extension.
///
/// # Errors
///
/// [`ExtractError::UnsupportedFormat`] when the extension is not recognised;
/// otherwise whatever the format's extractor reports.
pub fn extract_text(data: &[u8], file_name: &str) -> ExtractResult<String> {
    let format =
        SourceFormat::from_file_name(file_name).ok_or_else(|| ExtractError::UnsupportedFormat {
            name: file_name.to_string(),
        })?;

    let text = extractor_for(format).extract(data)?;
    debug!(
        file = file_name,
        %format,
        bytes_in = data.len(),
        bytes_out = text.len(),
        "extracted text"
    );
    Ok(text)
}

/// Reads `path`, returning its file name and contents.
///
/// The extension is checked before the file is opened.
pub fn read_document(path: &Path) -> ExtractResult<(String, Vec<u8>)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if SourceFormat::from_file_name(&name).is_none() {
        return Err(ExtractError::UnsupportedFormat { name });
    }

    let data = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = data.len(), "read document");

    Ok((name, data))
}

/// Reads `path` and extracts its text.
pub fn extract_file(path: &Path) -> ExtractResult<String> {
    let (name, data) = read_document(path)?;
    extract_text(&data, &name)
}

/// Extracts `data` for normalization.
///
/// On top of [`extract_text`] this rejects input over
/// [`MAX_DOCUMENT_BYTES`], removes NUL characters, and rejects a result that
/// is empty or whitespace-only.
///
/// # Errors
///
/// [`ExtractError::TooLarge`] and [`ExtractError::EmptyText`], plus anything
/// [`extract_text`] reports.
pub fn extract_for_normalization(data: &[u8], file_name: &str) -> ExtractResult<String> {
    if data.len() > MAX_DOCUMENT_BYTES {
        return Err(ExtractError::TooLarge {
            name: file_name.to_string(),
            size: data.len(),
            limit: MAX_DOCUMENT_BYTES,
        });
    }

    let mut text = extract_text(data, file_name)?;
    text.retain(|c| c != '\0');

    if text.trim().is_empty() {
        return Err(ExtractError::EmptyText {
            name: file_name.to_string(),
        });
    }
    Ok(text)
}

/// Extracts `data` and runs the result through `normalizer`.
pub fn extract_and_normalize(
    data: &[u8],
    file_name: &str,
    normalizer: &TextNormalizer,
) -> ExtractResult<String> {
    let raw = extract_for_normalization(data, file_name)?;
    Ok(normalizer.normalize(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_matches_format() {
        let formats = [
            SourceFormat::Pdf,
            SourceFormat::Docx,
            SourceFormat::Pptx,
            SourceFormat::Xlsx,
            SourceFormat::Xls,
            SourceFormat::PlainText,
        ];
        for format in formats {
            assert_eq!(extractor_for(format).format(), format);
        }
    }

    #[test]
    fn plain_text_is_lossy() {
        let text = extract_text(b"caf\xc3\xa9 \xff\xfeok", "notes.txt").unwrap();
        assert_eq!(text, "café ok");
    }

    #[test]
    fn markdown_is_plain_text() {
        assert_eq!(extract_text(b"# Title", "README.MD").unwrap(), "# Title");
    }

    #[test]
    fn unknown_extension_rejected() {
        let err = extract_text(b"\x89PNG", "image.png").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat { ref name } if name == "image.png"));
    }

    #[test]
    fn docx_needs_zip() {
        let err = extract_text(b"plain bytes", "letter.docx").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Parse {
                format: SourceFormat::Docx,
                ..
            }
        ));
    }

    #[test]
    fn normalizes_after_extraction() {
        let out =
            extract_and_normalize(b"w ord  split.Next", "a.txt", &TextNormalizer::default())
                .unwrap();
        assert_eq!(out, "word split. Next");
    }

    #[test]
    fn nul_characters_removed() {
        let n = TextNormalizer::default();
        assert_eq!(extract_and_normalize(b"a\0b", "a.txt", &n).unwrap(), "ab");
        assert_eq!(
            extract_for_normalization(b"\0w\0ord\0", "a.txt").unwrap(),
            "word"
        );
    }

    #[test]
    fn blank_text_rejected() {
        let n = TextNormalizer::default();
        for data in [&b""[..], b"  \r\n\t ", b"\0\0 \0\n"] {
            let err = extract_and_normalize(data, "blank.txt", &n).unwrap_err();
            assert!(
                matches!(err, ExtractError::EmptyText { ref name } if name == "blank.txt"),
                "{data:?}"
            );
        }
    }

    #[test]
    fn blank_text_allowed_without_guards() {
        assert_eq!(extract_text(b"  \n", "blank.txt").unwrap(), "  \n");
    }

    #[test]
    fn oversized_input_rejected() {
        let data = vec![b'x'; MAX_DOCUMENT_BYTES + 1];
        let err = extract_for_normalization(&data, "huge.txt").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::TooLarge {
                size,
                limit: MAX_DOCUMENT_BYTES,
                ..
            } if size == MAX_DOCUMENT_BYTES + 1
        ));

        // Checked before parsing, so even a broken archive reports the size.
        let err = extract_for_normalization(&data, "huge.docx").unwrap_err();
        assert!(matches!(err, ExtractError::TooLarge { .. }));
    }

    #[test]
    fn input_at_limit_accepted() {
        let data = vec![b'x'; MAX_DOCUMENT_BYTES];
        let text = extract_for_normalization(&data, "big.txt").unwrap();
        assert_eq!(text.len(), MAX_DOCUMENT_BYTES);
    }
}
