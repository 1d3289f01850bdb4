//! charset-nose CLI - encoding and line-ending sniffer

use charset_nose::{
    CharsetMatches, Detector, NewlineStyle, Normalizer, Outcome, SamplingParams,
    DEFAULT_MAX_SAMPLE_SIZE, DEFAULT_MIN_SAMPLE_SIZE, DEFAULT_PERCENTAGE_SAMPLE_SIZE,
};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Character encoding and line-ending sniffer.
///
/// Detects the encoding and newline convention of text files from a bounded sample,
/// and rewrites files into a target encoding and newline style.
#[derive(Parser, Debug)]
#[command(name = "charset-nose")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect encoding and newline style of one or more files
    Detect {
        /// Input file(s) to analyse
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        sampling: SamplingArgs,

        /// Output format: text (default) or json
        #[arg(short = 'f', long, default_value = "text")]
        format: OutputFormat,

        /// Show scores, languages and runner-up encodings
        #[arg(short = 'v', long)]
        verbose: bool,
    },
    /// Rewrite a file into a target encoding and newline style
    Normalize {
        /// File to normalize
        file: PathBuf,

        /// Target encoding (e.g. utf-8, cp1252, utf-16)
        #[arg(short = 't', long, default_value = "utf_8")]
        to: String,

        /// Target newline style: LF, CRLF or CR
        #[arg(short = 'n', long, default_value = "LF")]
        newline: NewlineStyle,

        /// Write to this path instead of rewriting the file in place
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        sampling: SamplingArgs,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct SamplingArgs {
    /// Minimum number of bytes to sample
    #[arg(long, default_value_t = DEFAULT_MIN_SAMPLE_SIZE)]
    min_sample: usize,

    /// Percentage of the file to sample when larger than --min-sample
    #[arg(long, default_value_t = DEFAULT_PERCENTAGE_SAMPLE_SIZE)]
    percentage: f64,

    /// Maximum number of bytes to sample
    #[arg(long, default_value_t = DEFAULT_MAX_SAMPLE_SIZE)]
    max_sample: usize,
}

impl SamplingArgs {
    fn params(&self) -> charset_nose::Result<SamplingParams> {
        SamplingParams::new(self.min_sample, self.percentage, Some(self.max_sample))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Detect {
            files,
            sampling,
            format,
            verbose,
        } => detect_files(&files, sampling, format, verbose),
        Command::Normalize {
            file,
            to,
            newline,
            output,
            sampling,
        } => {
            if let Err(e) = normalize_file(&file, &to, newline, output.as_deref(), sampling) {
                eprintln!("Error processing {}: {}", file.display(), e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
    }
}

fn detect_files(
    files: &[PathBuf],
    sampling: SamplingArgs,
    format: OutputFormat,
    verbose: bool,
) -> ExitCode {
    let params = match sampling.params() {
        Ok(params) => params,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut detector = Detector::new();
    detector.sampling(params);

    // Files are analysed in parallel; results are printed in argument order.
    let results: Vec<_> = files
        .par_iter()
        .map(|file| detector.inspect_path(file))
        .collect();

    let mut exit_code = ExitCode::SUCCESS;
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok((matches, newlines)) => match format {
                OutputFormat::Text => print_text_output(file, &matches, newlines, verbose),
                OutputFormat::Json => print_json_output(file, &matches, newlines, verbose),
            },
            Err(e) => {
                eprintln!("Error processing {}: {}", file.display(), e);
                exit_code = ExitCode::FAILURE;
            }
        }
    }

    exit_code
}

fn normalize_file(
    file: &Path,
    to: &str,
    newline: NewlineStyle,
    output: Option<&Path>,
    sampling: SamplingArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut normalizer = Normalizer::new();
    normalizer.sampling(sampling.params()?);

    let outcome = match output {
        Some(dest) => normalizer.normalize_to(file, dest, to, newline)?,
        None => normalizer.normalize_in_place(file, to, newline)?,
    };

    match outcome {
        Outcome::Skipped { encoding, newline } => {
            println!(
                "{}: already {} with {} line endings",
                file.display(),
                encoding,
                newline
            );
        }
        Outcome::Rewritten {
            from,
            to,
            newline,
            bytes_written,
        } => {
            println!(
                "{}: {} -> {} ({}), {} bytes written",
                output.unwrap_or(file).display(),
                from,
                to,
                newline,
                bytes_written
            );
        }
    }

    Ok(())
}

fn print_text_output(path: &Path, matches: &CharsetMatches, newlines: NewlineStyle, verbose: bool) {
    let best = matches.best();
    println!("File: {}", path.display());
    println!("  Encoding: {}", best.encoding);
    println!("  Newlines: {}", newlines);
    println!("  Language: {}", best.language());
    println!("  BOM: {}", best.bom);

    if verbose {
        println!("  Candidates:");
        for (i, m) in matches.iter().enumerate() {
            println!(
                "    {}: {} (mess {:.3}, coherence {:.3}, languages: {})",
                i + 1,
                m.encoding,
                m.mess,
                m.coherence,
                if m.languages.is_empty() {
                    "-".to_string()
                } else {
                    m.languages.join(", ")
                }
            );
        }
    }

    println!();
}

fn print_json_output(path: &Path, matches: &CharsetMatches, newlines: NewlineStyle, verbose: bool) {
    let best = matches.best();
    print!(
        r#"{{"file":"{}","encoding":"{}","newlines":"{}","language":"{}","bom":{}"#,
        json_escape(&path.display().to_string()),
        best.encoding,
        newlines,
        json_escape(best.language()),
        best.bom
    );

    if verbose {
        print!(r#","candidates":["#);
        for (i, m) in matches.iter().enumerate() {
            if i > 0 {
                print!(",");
            }
            print!(
                r#"{{"encoding":"{}","mess":{:.4},"coherence":{:.4},"languages":[{}]}}"#,
                m.encoding,
                m.mess,
                m.coherence,
                m.languages
                    .iter()
                    .map(|l| format!("\"{}\"", json_escape(l)))
                    .collect::<Vec<_>>()
                    .join(",")
            );
        }
        print!("]");
    }

    println!("}}");
}

fn json_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
