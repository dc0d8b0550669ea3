//! Filetools command-line front end
//!
//! Lists the tool catalog, validates files, runs tools and keeps a history
//! of completed runs.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use filetools_core::catalog::{self, ToolStatus};
use filetools_core::validation::format_file_size;
use filetools_core::{
    Blob, Config, HistoryLog, HistoryRecord, InputFile, ProcessingRequest, ProgressSink,
    ToolError, ToolOptions, ValidationRules,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "filetools")]
#[command(version, about = "Convert, compress and edit files locally")]
struct Args {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available tools
    Tools {
        /// Only tools for this file extension
        #[arg(long)]
        extension: Option<String>,

        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check files against the configured size limits
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Run a tool over one or more files
    Run {
        /// Tool name as listed by `tools`, e.g. "Merge PDFs"
        #[arg(long)]
        tool: String,

        /// Tool option as key=value; values are parsed as JSON when possible
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,

        /// Directory for output files
        #[arg(long, default_value = ".")]
        out: PathBuf,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show or clear the processing history
    History {
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries command output, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    debug!(?config, "Loaded configuration");

    match args.command {
        Command::Tools { extension, json } => list_tools(extension.as_deref(), json),
        Command::Validate { files } => validate(&config, &files),
        Command::Run {
            tool,
            options,
            out,
            files,
        } => run(&config, &tool, &options, &out, &files).await,
        Command::History { clear } => history(&config, clear),
    }
}

fn list_tools(extension: Option<&str>, json: bool) -> anyhow::Result<()> {
    let entries = match extension {
        Some(ext) => catalog::tools_for_extension(ext),
        None => catalog::catalog().iter().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let mut current = "";
    for entry in entries {
        if entry.file_extension != current {
            current = entry.file_extension;
            let name = catalog::file_type_info(current).map_or(current, |t| t.name);
            println!("{} (.{})", name, current);
        }
        let marker = match entry.status {
            ToolStatus::Working => " ",
            ToolStatus::Maintenance => "~",
        };
        println!("  {} {:<26} {}", marker, entry.tool_name, entry.description);
    }
    Ok(())
}

fn read_inputs(paths: &[PathBuf]) -> anyhow::Result<Vec<InputFile>> {
    paths
        .iter()
        .map(|path| {
            InputFile::read(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect()
}

fn validate(config: &Config, paths: &[PathBuf]) -> anyhow::Result<()> {
    let files = read_inputs(paths)?;
    let mut failed = 0;

    for file in &files {
        let result = filetools_core::validate_file(file, &ValidationRules::for_file(file, &config.limits));
        match &result.error {
            None => println!("ok    {} ({})", file.name, format_file_size(file.size())),
            Some(error) => {
                failed += 1;
                println!("fail  {}: {}", file.name, error);
            }
        }
        for warning in &result.warnings {
            println!("      warning: {}", warning);
        }
    }

    if failed > 0 {
        bail!("{} of {} files failed validation", failed, files.len());
    }
    Ok(())
}

async fn run(
    config: &Config,
    tool: &str,
    raw_options: &[String],
    out: &Path,
    paths: &[PathBuf],
) -> anyhow::Result<()> {
    let files = read_inputs(paths)?;
    let mut options = ToolOptions::new();
    for pair in raw_options {
        options.set_from_pair(pair)?;
    }

    let first = files
        .first()
        .map(|f| (f.name.clone(), f.stem().to_string(), f.extension().unwrap_or_default()))
        .context("No input files")?;
    let input_size: u64 = files.iter().map(InputFile::size).sum();

    let request = ProcessingRequest::new(tool, files)
        .with_options(options)
        .with_progress(ProgressSink::new(|percent| eprint!("\r{:>3}%", percent)));

    let processor = config.processor();
    let result = processor.process(request).await;
    eprintln!();
    let result = result.map_err(describe)?;

    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;
    let (name, stem, extension) = first;
    let blobs = result.into_blobs();
    let numbered = blobs.len() > 1;
    for (index, blob) in blobs.iter().enumerate() {
        let path = out.join(output_name(&stem, tool, blob, numbered.then_some(index + 1)));
        std::fs::write(&path, &blob.data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} ({})", path.display(), format_file_size(blob.size()));
    }

    let mut log = HistoryLog::load(&config.history_path, config.history_capacity)?;
    log.add(HistoryRecord::new(name, extension, tool, input_size));
    log.save(&config.history_path)?;
    info!(tool, outputs = blobs.len(), "Run complete");
    Ok(())
}

/// Attach the user-facing hint to a tool error
fn describe(error: ToolError) -> anyhow::Error {
    let hint = error.user_hint();
    let mut message = format!("{}\n{}", error, hint.message);
    for solution in hint.solutions {
        message.push_str("\n  - ");
        message.push_str(solution);
    }
    anyhow::Error::msg(message)
}

/// `<stem>-<tool>.<ext>`, with a part number when a tool produced several
/// outputs
fn output_name(stem: &str, tool: &str, blob: &Blob, part: Option<usize>) -> String {
    let slug: String = tool
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    let extension = blob.extension();
    match part {
        Some(n) => format!("{}-{}-{}.{}", stem, slug, n, extension),
        None => format!("{}-{}.{}", stem, slug, extension),
    }
}

fn history(config: &Config, clear: bool) -> anyhow::Result<()> {
    let mut log = HistoryLog::load(&config.history_path, config.history_capacity)?;
    if clear {
        log.clear();
        log.save(&config.history_path)?;
        println!("History cleared");
        return Ok(());
    }

    if log.is_empty() {
        println!("No history yet");
    }
    for record in log.records() {
        println!(
            "{}  {:<24} {:<20} {}",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.tool_name,
            record.file_name,
            format_file_size(record.file_size_bytes)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_name() {
        let pdf = Blob::new(vec![], "application/pdf");
        assert_eq!(output_name("report", "Merge PDFs", &pdf, None), "report-merge-pdfs.pdf");
        assert_eq!(output_name("report", "Split PDF", &pdf, Some(2)), "report-split-pdf-2.pdf");

        let png = Blob::new(vec![], "image/png");
        assert_eq!(output_name("photo", "Rotate & Flip", &png, None), "photo-rotate-flip.png");
    }

    #[test]
    fn test_args_parse_run() {
        let args = Args::try_parse_from([
            "filetools",
            "run",
            "--tool",
            "Resize",
            "-o",
            "width=100",
            "--option",
            "height=50",
            "a.png",
        ])
        .unwrap();
        match args.command {
            Command::Run { tool, options, files, .. } => {
                assert_eq!(tool, "Resize");
                assert_eq!(options, vec!["width=100", "height=50"]);
                assert_eq!(files, vec![PathBuf::from("a.png")]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
