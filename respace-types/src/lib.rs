//! Core types shared across the respace crates.
//!
//! This crate holds the vocabulary that both the normalizer and its callers
//! speak. Keeping it separate means:
//!
//! - **No heavy dependencies**: consumers can name passes and formats without
//!   pulling in the extraction stack
//! - **Stable identifiers**: pass and format names used in config files and
//!   logs are defined in one place

#![warn(missing_docs)]

use core::fmt;
use core::str::FromStr;

/// A single rewrite pass of the normalization pipeline.
///
/// Passes run in the order given by [`Pass::ORDER`]. Later passes assume the
/// earlier ones already ran, so the order is part of the contract.
///
/// `#[repr(u8)]` keeps the discriminant usable as a table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Pass {
    /// `CRLF` and lone `CR` become `LF`.
    LineEndings = 0,
    /// `foo-\nbar` becomes `foo-bar`.
    HyphenWrap = 1,
    /// `w ord` becomes `word`.
    IntraWordSpace = 2,
    /// `well - known` becomes `well-known`.
    HyphenSpacing = 3,
    /// `end.Next` becomes `end. Next`.
    PunctuationSpacing = 4,
    /// Runs of spaces and tabs become a single space.
    HorizontalWhitespace = 5,
}

impl Pass {
    /// Number of passes.
    pub const COUNT: usize = 6;

    /// Canonical pipeline order.
    pub const ORDER: [Pass; Pass::COUNT] = [
        Pass::LineEndings,
        Pass::HyphenWrap,
        Pass::IntraWordSpace,
        Pass::HyphenSpacing,
        Pass::PunctuationSpacing,
        Pass::HorizontalWhitespace,
    ];

    /// Position of this pass in [`Pass::ORDER`].
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Kebab-case name used in config files and log output.
    pub const fn name(self) -> &'static str {
        match self {
            Pass::LineEndings => "line-endings",
            Pass::HyphenWrap => "hyphen-wrap",
            Pass::IntraWordSpace => "intra-word-space",
            Pass::HyphenSpacing => "hyphen-spacing",
            Pass::PunctuationSpacing => "punctuation-spacing",
            Pass::HorizontalWhitespace => "horizontal-whitespace",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a pass name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPass {
    /// The name that failed to parse.
    pub name: String,
}

impl fmt::Display for UnknownPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown normalization pass: {:?}", self.name)
    }
}

impl core::error::Error for UnknownPass {}

impl FromStr for Pass {
    type Err = UnknownPass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pass::ORDER
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPass { name: s.to_string() })
    }
}

/// Document format an extracted text value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Portable Document Format.
    Pdf,
    /// Office Open XML word-processing document.
    Docx,
    /// Office Open XML presentation.
    Pptx,
    /// Office Open XML spreadsheet.
    Xlsx,
    /// Legacy BIFF spreadsheet.
    Xls,
    /// Plain text or Markdown.
    PlainText,
}

impl SourceFormat {
    /// Maps a bare extension (no dot) to a format, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(SourceFormat::Pdf),
            "docx" => Some(SourceFormat::Docx),
            "pptx" => Some(SourceFormat::Pptx),
            "xlsx" => Some(SourceFormat::Xlsx),
            "xls" => Some(SourceFormat::Xls),
            "txt" | "md" => Some(SourceFormat::PlainText),
            _ => None,
        }
    }

    /// Detects the format from the text after the last `.` of a file name.
    ///
    /// A name without a dot is treated as an extension in its own right, so
    /// `"pdf"` and `"report.pdf"` both resolve.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit('.').next().unwrap_or(name);
        Self::from_extension(ext)
    }

    /// Short lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            SourceFormat::Pdf => "pdf",
            SourceFormat::Docx => "docx",
            SourceFormat::Pptx => "pptx",
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Xls => "xls",
            SourceFormat::PlainText => "text",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single pass did to the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Whether the pass ran at all.
    pub ran: bool,
    /// Whether the output differs from the input.
    pub changed: bool,
    /// Byte length before the pass.
    pub bytes_in: usize,
    /// Byte length after the pass.
    pub bytes_out: usize,
}

impl PassOutcome {
    /// Signed change in byte length.
    #[inline]
    pub fn delta(&self) -> isize {
        self.bytes_out as isize - self.bytes_in as isize
    }
}

/// Per-pass report for one normalization run.
///
/// Indexed by [`Pass::index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    outcomes: [PassOutcome; Pass::COUNT],
}

impl PassStats {
    /// Records the outcome of `pass`.
    #[inline]
    pub fn record(&mut self, pass: Pass, outcome: PassOutcome) {
        self.outcomes[pass.index()] = outcome;
    }

    /// Returns the outcome of `pass`.
    #[inline]
    pub fn get(&self, pass: Pass) -> PassOutcome {
        self.outcomes[pass.index()]
    }

    /// Iterates outcomes in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (Pass, PassOutcome)> + '_ {
        Pass::ORDER.into_iter().map(|p| (p, self.get(p)))
    }

    /// Number of passes that changed the text.
    pub fn changed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.changed).count()
    }
}

impl fmt::Display for PassStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pass, outcome) in self.iter() {
            if !outcome.ran {
                writeln!(f, "{:<22} skipped", pass.name())?;
                continue;
            }
            writeln!(
                f,
                "{:<22} {:>10} -> {:<10} ({:+}){}",
                pass.name(),
                outcome.bytes_in,
                outcome.bytes_out,
                outcome.delta(),
                if outcome.changed { "" } else { " unchanged" }
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_order_matches_discriminants() {
        for (i, pass) in Pass::ORDER.iter().enumerate() {
            assert_eq!(pass.index(), i);
        }
    }

    #[test]
    fn pass_name_roundtrip() {
        for pass in Pass::ORDER {
            assert_eq!(pass.name().parse::<Pass>(), Ok(pass));
        }
        assert_eq!("Hyphen-Wrap".parse::<Pass>(), Ok(Pass::HyphenWrap));
    }

    #[test]
    fn unknown_pass_name() {
        let err = "spellcheck".parse::<Pass>().unwrap_err();
        assert_eq!(err.name, "spellcheck");
        assert!(err.to_string().contains("spellcheck"));
    }

    #[test]
    fn format_from_file_name() {
        assert_eq!(SourceFormat::from_file_name("report.PDF"), Some(SourceFormat::Pdf));
        assert_eq!(SourceFormat::from_file_name("a.b.docx"), Some(SourceFormat::Docx));
        assert_eq!(SourceFormat::from_file_name("deck.pptx"), Some(SourceFormat::Pptx));
        assert_eq!(SourceFormat::from_file_name("book.xlsx"), Some(SourceFormat::Xlsx));
        assert_eq!(SourceFormat::from_file_name("old.xls"), Some(SourceFormat::Xls));
        assert_eq!(SourceFormat::from_file_name("notes.md"), Some(SourceFormat::PlainText));
        assert_eq!(SourceFormat::from_file_name("notes.txt"), Some(SourceFormat::PlainText));
        assert_eq!(SourceFormat::from_file_name("image.png"), None);
        assert_eq!(SourceFormat::from_file_name("pdf"), Some(SourceFormat::Pdf));
    }

    #[test]
    fn stats_record_and_count() {
        let mut stats = PassStats::default();
        stats.record(
            Pass::LineEndings,
            PassOutcome {
                ran: true,
                changed: true,
                bytes_in: 10,
                bytes_out: 8,
            },
        );
        stats.record(
            Pass::HorizontalWhitespace,
            PassOutcome {
                ran: true,
                changed: false,
                bytes_in: 8,
                bytes_out: 8,
            },
        );

        assert_eq!(stats.changed_count(), 1);
        assert_eq!(stats.get(Pass::LineEndings).delta(), -2);
        assert!(!stats.get(Pass::HyphenWrap).ran);

        let rendered = stats.to_string();
        assert!(rendered.contains("line-endings"));
        assert!(rendered
            .lines()
            .any(|l| l.starts_with("hyphen-wrap") && l.ends_with("skipped")));
    }
}
