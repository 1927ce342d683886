use std::sync::LazyLock;

use respace_types::{Pass, PassOutcome, PassStats};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::passes::run_pass;

/// Ordered list of enabled passes.
pub type PassList = SmallVec<[Pass; Pass::COUNT]>;

/// Configuration options for text normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerConfig {
    /// Passes to run. Order is canonicalised by [`TextNormalizer::new`], so
    /// this only selects which passes are enabled.
    pub passes: PassList,
    /// Single letters that are words in their own right and must never be
    /// glued to a neighbour by the intra-word pass.
    pub protected_words: FxHashSet<char>,
    /// When enabled, `.`, `,` and `:` between two digits do not get a space
    /// inserted after them. For example, "3.14" stays "3.14".
    pub keep_numeric_separators: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            passes: Pass::ORDER.into_iter().collect(),
            protected_words: ['a', 'A'].into_iter().collect(),
            keep_numeric_separators: false,
        }
    }
}

impl NormalizerConfig {
    /// Default configuration with only `passes` enabled.
    pub fn with_passes(passes: impl IntoIterator<Item = Pass>) -> Self {
        Self {
            passes: passes.into_iter().collect(),
            ..Self::default()
        }
    }
}

/// Spacing repair for extracted document text.
///
/// Runs an ordered pipeline of rewrite passes:
/// - Normalizes line endings to `\n`
/// - Rejoins hyphenated words wrapped across lines
/// - Removes spaces splitting a word (`"w ord"` -> `"word"`)
/// - Tightens spaced hyphens (`"well - known"` -> `"well-known"`)
/// - Adds a space after sentence punctuation (`"end.Next"` -> `"end. Next"`)
/// - Collapses runs of spaces and tabs, keeping newlines
///
/// The normalizer holds no mutable state and is `Send + Sync`; one instance
/// can serve any number of threads.
///
/// # Examples
///
/// ```
/// use respace_core::analyzer::TextNormalizer;
///
/// let normalizer = TextNormalizer::default();
/// assert_eq!(normalizer.normalize("w ord split"), "word split");
/// assert_eq!(normalizer.normalize("New York"), "New York");
/// ```
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    config: NormalizerConfig,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl TextNormalizer {
    /// Creates a new normalizer with the specified configuration.
    pub fn new(mut config: NormalizerConfig) -> Self {
        config.passes.sort_unstable();
        config.passes.dedup();
        Self { config }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Passes this normalizer runs, in order.
    pub fn passes(&self) -> &[Pass] {
        &self.config.passes
    }

    /// Normalizes text into an existing String buffer.
    ///
    /// Clears the buffer before writing. The buffer's allocation is reused as
    /// one side of the pass-to-pass ping-pong.
    #[inline]
    pub fn normalize_into(&self, input: &str, out: &mut String) {
        self.run(input, out, None);
    }

    /// Normalizes text and returns a new String.
    #[inline]
    pub fn normalize(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        self.normalize_into(input, &mut out);
        out
    }

    /// Normalizes text and reports what each pass did.
    pub fn normalize_with_stats(&self, input: &str) -> (String, PassStats) {
        let mut out = String::with_capacity(input.len());
        let mut stats = PassStats::default();
        self.run(input, &mut out, Some(&mut stats));
        (out, stats)
    }

    fn run(&self, input: &str, out: &mut String, mut stats: Option<&mut PassStats>) {
        out.clear();
        out.push_str(input);
        let mut scratch = String::with_capacity(input.len() + input.len() / 8);

        for &pass in &self.config.passes {
            run_pass(pass, &self.config, out.as_str(), &mut scratch);

            let outcome = PassOutcome {
                ran: true,
                changed: *out != scratch,
                bytes_in: out.len(),
                bytes_out: scratch.len(),
            };
            trace!(
                pass = %pass,
                bytes_in = outcome.bytes_in,
                bytes_out = outcome.bytes_out,
                changed = outcome.changed,
                "normalization pass"
            );
            if let Some(stats) = stats.as_deref_mut() {
                stats.record(pass, outcome);
            }

            core::mem::swap(out, &mut scratch);
        }

        debug!(
            bytes_in = input.len(),
            bytes_out = out.len(),
            passes = self.config.passes.len(),
            "normalized text"
        );
    }
}

static DEFAULT_NORMALIZER: LazyLock<TextNormalizer> = LazyLock::new(TextNormalizer::default);

/// Normalizes `text` with the default configuration.
///
/// Total: never panics, and `normalize("")` is `""`.
pub fn normalize(text: &str) -> String {
    DEFAULT_NORMALIZER.normalize(text)
}

/// Passes an absent value through untouched and normalizes a present one.
pub fn normalize_opt(text: Option<&str>) -> Option<String> {
    text.map(normalize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(input: &str) -> String {
        TextNormalizer::default().normalize(input)
    }

    #[test]
    fn empty_input() {
        assert_eq!(norm(""), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn absent_input_passes_through() {
        assert_eq!(normalize_opt(None), None);
        assert_eq!(normalize_opt(Some("w ord")), Some("word".to_string()));
    }

    #[test]
    fn short_words_survive() {
        assert_eq!(norm("a lot of work"), "a lot of work");
        assert_eq!(norm("A lot of work"), "A lot of work");
    }

    #[test]
    fn proper_nouns_survive() {
        assert_eq!(norm("New York"), "New York");
    }

    #[test]
    fn split_word_rejoined() {
        assert_eq!(norm("w ord split"), "word split");
    }

    #[test]
    fn spaced_hyphen_tightened() {
        assert_eq!(norm("well - known fact"), "well-known fact");
    }

    #[test]
    fn sentence_boundary_spaced() {
        assert_eq!(norm("end.Next sentence"), "end. Next sentence");
    }

    #[test]
    fn wrapped_hyphen_joined() {
        assert_eq!(norm("foo-\nbar"), "foo-bar");
        assert_eq!(norm("foo-\r\nbar"), "foo-bar");
    }

    #[test]
    fn spaced_hyphen_across_lines() {
        assert_eq!(norm("well\n-\nknown"), "well-known");
        assert_eq!(norm("apples\n- pears"), "apples-pears");
    }

    #[test]
    fn split_word_across_lines() {
        assert_eq!(norm("w\nord split"), "word split");
        assert_eq!(norm("first line\nsecond line"), "first line\nsecond line");
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(norm("a    b"), "a b");
    }

    #[test]
    fn newlines_preserved() {
        assert_eq!(norm("line1\n\nline2"), "line1\n\nline2");
    }

    #[test]
    fn no_carriage_returns_left() {
        let out = norm("one\r\ntwo\rthree\r\n\r\nfour");
        assert!(!out.contains('\r'));
        assert_eq!(out, "one\ntwo\nthree\n\nfour");
    }

    #[test]
    fn realistic_pdf_page() {
        let input = "The experi-\r\nment was a success.It showed that\r\n\
                     well -known  results hold ;for a lot of cases.";
        let expected = "The experi-ment was a success. It showed that\n\
                        well-known results hold ; for a lot of cases.";
        assert_eq!(norm(input), expected);
    }

    #[test]
    fn idempotent_on_samples() {
        let n = TextNormalizer::default();
        let samples = [
            "w o r d s and a b c",
            "end.Next,then;more:fine!ok?yes",
            "x - y z - w",
            "state-\nof-\nthe -art",
            "wait...what  is\tthis",
            "a.b c",
        ];

        for s in samples {
            let once = n.normalize(s);
            let twice = n.normalize(&once);
            assert_eq!(once, twice, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn pass_order_is_canonical() {
        let n = TextNormalizer::new(NormalizerConfig::with_passes([
            Pass::HorizontalWhitespace,
            Pass::LineEndings,
            Pass::LineEndings,
        ]));
        assert_eq!(n.passes(), &[Pass::LineEndings, Pass::HorizontalWhitespace]);
    }

    #[test]
    fn disabled_pass_is_skipped() {
        let n = TextNormalizer::new(NormalizerConfig::with_passes(
            Pass::ORDER
                .into_iter()
                .filter(|&p| p != Pass::PunctuationSpacing),
        ));
        assert_eq!(n.normalize("end.Next"), "end.Next");
    }

    #[test]
    fn no_passes_is_identity() {
        let n = TextNormalizer::new(NormalizerConfig::with_passes(PassList::new()));
        assert_eq!(n.normalize("a\r\nb  c"), "a\r\nb  c");
    }

    #[test]
    fn numeric_separators_option() {
        let n = TextNormalizer::new(NormalizerConfig {
            keep_numeric_separators: true,
            ..NormalizerConfig::default()
        });
        assert_eq!(n.normalize("costs 3.50 today.Then"), "costs 3.50 today. Then");
        assert_eq!(norm("costs 3.50"), "costs 3. 50");
    }

    #[test]
    fn stats_report_changes() {
        let n = TextNormalizer::default();
        let (out, stats) = n.normalize_with_stats("end.Next\r\n");

        assert_eq!(out, "end. Next\n");
        assert!(stats.get(Pass::LineEndings).changed);
        assert!(stats.get(Pass::PunctuationSpacing).changed);
        assert!(!stats.get(Pass::HyphenWrap).changed);
        assert!(stats.get(Pass::HyphenWrap).ran);
        assert_eq!(stats.changed_count(), 2);
        assert_eq!(stats.get(Pass::LineEndings).delta(), -1);
    }

    #[test]
    fn stats_mark_disabled_passes() {
        let n = TextNormalizer::new(NormalizerConfig::with_passes([Pass::LineEndings]));
        let (_, stats) = n.normalize_with_stats("x");
        assert!(stats.get(Pass::LineEndings).ran);
        assert!(!stats.get(Pass::HorizontalWhitespace).ran);
    }

    #[test]
    fn empty_input_still_runs_every_pass() {
        let (out, stats) = TextNormalizer::default().normalize_with_stats("");
        assert_eq!(out, "");
        for (pass, outcome) in stats.iter() {
            assert!(outcome.ran, "{pass} reported as skipped");
            assert!(!outcome.changed);
            assert_eq!((outcome.bytes_in, outcome.bytes_out), (0, 0));
        }
        assert!(!stats.to_string().contains("skipped"));
    }

    #[test]
    fn normalize_into_clears_buffer() {
        let n = TextNormalizer::default();
        let mut buf = String::from("leftover");

        n.normalize_into("w ord", &mut buf);
        assert_eq!(buf, "word");

        n.normalize_into("", &mut buf);
        assert_eq!(buf, "");
    }

    #[test]
    fn multiple_normalize_calls_same_buffer() {
        let n = TextNormalizer::default();
        let mut buf = String::with_capacity(128);

        for i in 0..100 {
            n.normalize_into(&format!("item{i}.next"), &mut buf);
            assert_eq!(buf, format!("item{i}. next"));
        }
    }

    #[test]
    fn output_always_valid_utf8_and_total() {
        let inputs = [
            "café-\nau-lait",
            "İstanbul ve Ankara",
            "ΠΡΟΒΛΗΜΑ.Λύση",
            "مرحبا  بالعالم",
            "こんにちは。世界",
            "\u{200B}\u{00A0}\u{00A0}",
            "-\n-\n-",
            "\r\r\r",
        ];

        for input in inputs {
            let out = norm(input);
            assert!(std::str::from_utf8(out.as_bytes()).is_ok());
        }
    }

    #[test]
    fn normalizer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TextNormalizer>();
    }

    #[test]
    fn shared_across_threads() {
        let n = std::sync::Arc::new(TextNormalizer::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let n = n.clone();
                std::thread::spawn(move || n.normalize("w ord.Next"))
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), "word. Next");
        }
    }
}
