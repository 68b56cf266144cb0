mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};

use logscope_compare::{ComparisonResult, LogComparator, TracingMeasure};
use logscope_logs::{
    ExportFormat, FileParseOutcome, LogEntry, LogFilter, LogLevel, LogStats, collect_all, export,
    parse_multiple_files,
};

use config::AppConfig;

/// Logscope - Parse, filter, export and compare log files
#[derive(Parser, Debug)]
#[command(name = "logscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse log files, filter the entries and export them
    Parse(ParseArgs),

    /// Compare two log files
    Compare(CompareArgs),

    /// Print a summary of each log file
    Stats {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(ClapArgs, Debug)]
struct ParseArgs {
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,

    /// Export format (json or csv); defaults to the configured format
    #[arg(long)]
    format: Option<ExportFormat>,

    /// Write the export here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Only keep these levels (repeatable)
    #[arg(long = "level", value_name = "LEVEL", value_parser = parse_level)]
    levels: Vec<LogLevel>,

    /// Case-insensitive text search
    #[arg(long)]
    search: Option<String>,

    /// Treat --search as a regular expression
    #[arg(long, requires = "search")]
    regex: bool,

    /// Earliest timestamp to keep (date or date-time)
    #[arg(long, value_name = "DATE")]
    from: Option<String>,

    /// Latest timestamp to keep; a bare date includes the whole day
    #[arg(long, value_name = "DATE")]
    to: Option<String>,

    /// Only keep these channels (repeatable)
    #[arg(long = "channel", value_name = "CHANNEL")]
    channels: Vec<String>,

    /// Only keep these environments (repeatable)
    #[arg(long = "environment", value_name = "ENV")]
    environments: Vec<String>,

    /// Fail if any file cannot be read
    #[arg(long)]
    strict: bool,
}

#[derive(ClapArgs, Debug)]
struct CompareArgs {
    #[arg(value_name = "FILE_A")]
    file_a: PathBuf,

    #[arg(value_name = "FILE_B")]
    file_b: PathBuf,

    /// Similarity threshold in (0, 1]
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

fn parse_level(s: &str) -> Result<LogLevel, String> {
    let level = LogLevel::from_str(s);
    // from_str falls back to Info for unknown tokens
    let is_info = matches!(s.trim().to_lowercase().as_str(), "info" | "inf" | "information");
    if level != LogLevel::Info || is_info {
        Ok(level)
    } else {
        Err(format!("unknown log level '{s}'"))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };

    // Logs go to stderr so exports on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = AppConfig::load()?;

    match args.command {
        Command::Parse(parse) => run_parse(parse, &config).await,
        Command::Compare(compare) => run_compare(compare, &config).await,
        Command::Stats { files } => run_stats(&files).await,
    }
}

async fn run_parse(args: ParseArgs, config: &AppConfig) -> Result<()> {
    let filter = build_filter(&args)?;
    let outcomes = parse_multiple_files(&args.files).await;

    let entries: Vec<LogEntry> = if args.strict {
        collect_all(outcomes)?
            .into_iter()
            .flat_map(|file| file.entries)
            .collect()
    } else {
        lenient_entries(outcomes)?
    };

    let kept = filter.apply(&entries);
    tracing::info!(parsed = entries.len(), kept = kept.len(), "filtered entries");

    let format = args.format.unwrap_or(config.export.format);
    let text = export(&kept, format)?;

    match &args.output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{text}"),
    }

    Ok(())
}

/// Entries of every readable file. Unreadable files are reported and skipped.
fn lenient_entries(outcomes: Vec<FileParseOutcome>) -> Result<Vec<LogEntry>> {
    let total = outcomes.len();
    let mut failed = 0;
    let mut entries = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok(parsed) => entries.extend(parsed),
            Err(e) => {
                failed += 1;
                eprintln!("Skipping {}: {}", outcome.path.display(), e);
            }
        }
    }

    if failed == total {
        anyhow::bail!("None of the {} input file(s) could be read", total);
    }
    Ok(entries)
}

fn build_filter(args: &ParseArgs) -> Result<LogFilter> {
    let mut filter = LogFilter::new();

    if !args.levels.is_empty() {
        filter = filter.with_levels(args.levels.iter().copied());
    }
    if let Some(search) = &args.search {
        filter = if args.regex {
            filter.with_regex(search)?
        } else {
            filter.with_search(search)
        };
    }
    if let Some(from) = &args.from {
        filter = filter.with_date_from_str(from)?;
    }
    if let Some(to) = &args.to {
        filter = filter.with_date_to_str(to)?;
    }

    Ok(filter
        .with_channels(args.channels.iter().cloned())
        .with_environments(args.environments.iter().cloned()))
}

async fn run_compare(args: CompareArgs, config: &AppConfig) -> Result<()> {
    let mut options = config.compare_options();
    if let Some(threshold) = args.threshold {
        options = options.with_threshold(threshold);
    }

    let comparator = LogComparator::new(options)
        .context("Invalid comparison settings")?
        .with_measure(Arc::new(TracingMeasure::new()));

    let mut files = collect_all(parse_multiple_files(&[&args.file_a, &args.file_b]).await)?;
    let second = files.pop().context("missing second file")?;
    let first = files.pop().context("missing first file")?;

    let result = comparator.compare(&first.entries, &second.entries);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_comparison(&args.file_a, &args.file_b, &result);
    }
    Ok(())
}

fn print_comparison(file_a: &Path, file_b: &Path, result: &ComparisonResult) {
    let stats = &result.stats;

    println!("File 1: {} ({} entries)", file_a.display(), stats.total_file1);
    println!("File 2: {} ({} entries)", file_b.display(), stats.total_file2);
    println!();
    println!("Exact matches:    {}", stats.exact_matches);
    println!("Similar matches:  {}", stats.similar_matches);
    println!("Unique to file 1: {}", stats.unique_to_file1);
    println!("Unique to file 2: {}", stats.unique_to_file2);
    println!("Match percentage: {:.1}%", stats.match_percentage);

    if !stats.level_breakdown.is_empty() {
        println!();
        println!("{:<10} {:>8} {:>8} {:>8}", "LEVEL", "FILE 1", "FILE 2", "MATCHES");
        for (level, counts) in &stats.level_breakdown {
            println!(
                "{:<10} {:>8} {:>8} {:>8}",
                level.as_str(),
                counts.file1_count,
                counts.file2_count,
                counts.matches
            );
        }
    }
}

async fn run_stats(files: &[PathBuf]) -> Result<()> {
    let outcomes = parse_multiple_files(files).await;

    for outcome in outcomes {
        let entries = match outcome.result {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("Skipping {}: {}", outcome.path.display(), e);
                continue;
            }
        };
        print_stats(&outcome.file_name, &LogStats::from_entries(&entries));
    }
    Ok(())
}

fn print_stats(name: &str, stats: &LogStats) {
    println!("== {} ==", name);
    println!("Entries:    {}", stats.total_entries);
    if let Some(range) = &stats.time_range {
        println!("Time range: {} .. {}", range.start.to_rfc3339(), range.end.to_rfc3339());
    }
    println!("Error rate: {:.1}%", stats.error_rate);

    for (level, count) in &stats.level_counts {
        println!("  {:<10} {}", level.as_str(), count);
    }

    if !stats.top_channels.is_empty() {
        println!("Top channels:");
        for (channel, count) in &stats.top_channels {
            println!("  {:<20} {}", channel, count);
        }
    }
    println!();
}
