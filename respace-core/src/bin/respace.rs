//! respace CLI: extract text from documents and repair its spacing.
//!
//! ```bash
//! # Print normalized text for each file
//! respace clean report.pdf slides.pptx
//!
//! # Show what each pass changed
//! respace clean --stats report.pdf
//!
//! # Measure normalizer throughput (release build recommended)
//! respace bench wiki.txt --runs 10
//! ```
//!
//! Log verbosity comes from `RUST_LOG`, else `[logging] level` in the
//! `--config` file, else `info`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing::info;

use respace_core::config::Settings;
use respace_core::extract::{
    extract_file, extract_for_normalization, extract_text, read_document,
};
use respace_core::TextNormalizer;

#[derive(Parser)]
#[command(name = "respace", version, about = "Spacing repair for extracted document text")]
struct Cli {
    /// TOML settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and normalize documents, printing the result to stdout.
    Clean {
        /// Documents to process (pdf, docx, pptx, xlsx, xls, txt, md).
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print a per-pass report to stderr after each file.
        #[arg(long)]
        stats: bool,

        /// Print extracted text as is: no normalization, size limit or
        /// empty-text check.
        #[arg(long, conflicts_with = "stats")]
        raw: bool,
    },

    /// Measure normalization throughput on one document.
    Bench {
        /// Document to benchmark.
        file: PathBuf,

        /// Timed runs; the reported time is their mean.
        #[arg(long, default_value = "5")]
        runs: u32,

        /// Untimed runs before measuring.
        #[arg(long, default_value = "1")]
        warmup: u32,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.logging.level)),
        )
        .init();

    let normalizer = TextNormalizer::new(settings.normalizer_config()?);

    match cli.command {
        Commands::Clean { files, stats, raw } => clean(&normalizer, &files, stats, raw),
        Commands::Bench { file, runs, warmup } => bench(&normalizer, &file, runs.max(1), warmup),
    }
}

fn clean(normalizer: &TextNormalizer, files: &[PathBuf], stats: bool, raw: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for path in files {
        let (name, data) = read_document(path)?;

        if raw {
            let text = extract_text(&data, &name)?;
            out.write_all(text.as_bytes()).into_diagnostic()?;
        } else if stats {
            let text = extract_for_normalization(&data, &name)?;
            let (clean, report) = normalizer.normalize_with_stats(&text);
            out.write_all(clean.as_bytes()).into_diagnostic()?;
            eprintln!("== {} ==\n{report}", path.display());
        } else {
            let text = extract_for_normalization(&data, &name)?;
            out.write_all(normalizer.normalize(&text).as_bytes())
                .into_diagnostic()?;
        }

        if files.len() > 1 {
            out.write_all(b"\n").into_diagnostic()?;
        }
    }

    out.flush().into_diagnostic()
}

fn bench(normalizer: &TextNormalizer, path: &Path, runs: u32, warmup_runs: u32) -> Result<()> {
    let input = extract_file(path)?;
    let chars = input.chars().count() as u64;
    info!(path = %path.display(), runs, "benchmarking");

    println!("File size : {}", fmt_bytes(input.len() as u64));
    println!("Passes    : {}\n", normalizer.passes().len());

    let mut out = String::with_capacity(input.len());

    warmup(warmup_runs, || normalizer.normalize_into(&input, &mut out));
    let elapsed = measure(runs, || {
        normalizer.normalize_into(&input, &mut out);
        std::hint::black_box(out.len());
    });

    print_perf(input.len(), chars, elapsed);

    let (_, stats) = normalizer.normalize_with_stats(&input);
    println!("{stats}");
    Ok(())
}

fn warmup<F: FnMut()>(runs: u32, mut f: F) {
    for _ in 0..runs {
        f();
    }
}

fn measure<F: FnMut()>(runs: u32, mut f: F) -> Duration {
    let mut total = Duration::ZERO;

    for _ in 0..runs {
        let start = Instant::now();
        f();
        total += start.elapsed();
    }

    total / runs
}

fn print_perf(input_bytes: usize, chars: u64, elapsed: Duration) {
    let secs = elapsed.as_secs_f64().max(f64::MIN_POSITIVE);
    let mib = input_bytes as f64 / (1024.0 * 1024.0);

    println!("--------------------------------");
    println!("Elapsed     : {:.3} ms", secs * 1000.0);
    println!("Throughput  : {:.2} MiB/s", mib / secs);
    println!("Chars       : {}", fmt_count(chars));
    println!("Chars/sec   : {}", fmt_count((chars as f64 / secs) as u64));
    println!("--------------------------------\n");
}

const BYTE_UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

/// Human-readable size: whole bytes below 1 KiB, else two decimals.
fn fmt_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < BYTE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", BYTE_UNITS[unit])
}

/// Digit grouping with `_`, as in Rust literals.
fn fmt_count(n: u64) -> String {
    let digits = n.to_string();
    let lead = match digits.len() % 3 {
        0 => 3,
        r => r,
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    out.push_str(&digits[..lead]);
    for group in digits.as_bytes()[lead..].chunks(3) {
        out.push('_');
        out.extend(group.iter().map(|&d| char::from(d)));
    }
    out
}
