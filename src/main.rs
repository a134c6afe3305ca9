use std::process::ExitCode;

use clap::Parser;
use reflect_diff::hooks::builtins::{Lowercase, Rounded};
use reflect_diff::{Comparator, Config, DiffError, DiffOption, Level, Result};
use serde_json::Value;
use tracing::debug;

/// Structural diff of two JSON documents.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Left document: a file path, or JSON text with --inline
    left: String,
    /// Right document: a file path, or JSON text with --inline
    right: String,
    /// Treat LEFT and RIGHT as JSON text instead of file paths
    #[arg(long)]
    inline: bool,
    /// Verbosity: auto, path-only or full
    #[arg(long, default_value_t = Level::Auto)]
    level: Level,
    /// Print differences as a JSON array of {path, message}
    #[arg(long)]
    json: bool,
    /// Compare strings case-insensitively
    #[arg(long)]
    ignore_case: bool,
    /// Compare floating-point numbers rounded to this many decimal places
    #[arg(long)]
    epsilon_places: Option<u8>,
}

fn main() -> ExitCode {
    // Parse CLI arguments.
    let args = Args::parse();

    // Logs go to stderr so they never mix with the differences.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("rdiff: {e}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the documents are equal.
fn run(args: &Args) -> Result<bool> {
    // Build options.
    let mut opts = vec![DiffOption::Level(args.level)];
    if args.ignore_case {
        opts.push(DiffOption::with_transform(Lowercase));
    }
    if let Some(places) = args.epsilon_places {
        opts.push(DiffOption::with_transform(Rounded::new(places)));
    }
    let comparator = Comparator::new(Config::new(opts));
    debug!(config = ?comparator.config(), "configured");

    // Load both documents.
    let left = load(&args.left, args.inline)?;
    let right = load(&args.right, args.inline)?;

    // Compare and print.
    if args.json {
        let reports = comparator.reports(&left, &right);
        let text = serde_json::to_string_pretty(&reports).map_err(|source| DiffError::Json {
            origin: "report output".to_string(),
            source,
        })?;
        println!("{text}");
        Ok(reports.is_empty())
    } else {
        let mut equal = true;
        comparator.each(
            |line| {
                equal = false;
                print!("{line}");
            },
            &left,
            &right,
        );
        Ok(equal)
    }
}

fn load(source: &str, inline: bool) -> Result<Value> {
    let (text, origin) = if inline {
        (source.to_string(), "inline document".to_string())
    } else {
        let text = std::fs::read_to_string(source).map_err(|e| DiffError::Io {
            path: source.to_string(),
            source: e,
        })?;
        (text, source.to_string())
    };
    serde_json::from_str(&text).map_err(|source| DiffError::Json { origin, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn level_flag_is_parsed_by_clap() {
        let args = Args::try_parse_from(["rdiff", "a.json", "b.json", "--level", "path-only"])
            .map(|args| args.level);
        assert_eq!(args.ok(), Some(Level::PathOnly));

        let args = Args::try_parse_from(["rdiff", "a.json", "b.json"]).map(|args| args.level);
        assert_eq!(args.ok(), Some(Level::Auto));

        let err = Args::try_parse_from(["rdiff", "a.json", "b.json", "--level", "loud"])
            .err()
            .map(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::ValueValidation));
    }
}
