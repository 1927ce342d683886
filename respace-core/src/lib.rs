//! Spacing repair for text extracted from documents.
//!
//! - [`analyzer`]: the normalization pipeline
//! - [`extract`]: PDF, Office and spreadsheet text extraction
//! - [`config`]: TOML settings for the `respace` binary
//!
//! ```
//! assert_eq!(respace_core::normalize("w ord.Next  line"), "word. Next line");
//! ```

pub mod analyzer;
pub mod config;
pub mod extract;

pub use analyzer::{normalize, normalize_opt, NormalizerConfig, PassList, TextNormalizer};
pub use respace_types::{Pass, PassOutcome, PassStats, SourceFormat, UnknownPass};
