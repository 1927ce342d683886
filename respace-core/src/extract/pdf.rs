//! PDF extraction via pdf-extract.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use respace_types::SourceFormat;
use tracing::warn;

use super::error::{ExtractError, ExtractResult};

/// Extracts the text layer of a PDF.
///
/// pdf-extract panics on some malformed font tables; a panic is reported as
/// a parse error instead of unwinding into the caller.
pub(crate) fn extract_pdf(data: &[u8]) -> ExtractResult<String> {
    match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::parse(SourceFormat::Pdf, e)),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(%message, "pdf parser panicked");
            Err(ExtractError::parse(SourceFormat::Pdf, message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "parser panicked".to_string()
    }
}
