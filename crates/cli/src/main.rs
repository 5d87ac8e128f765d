//! CLI tool for extracting position-ordered text from presentations.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use slidetext_pptx::PptxParser;
use slidetext_render::PdfRenderer;
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extract slide text in visual reading order, or convert decks to PDF.
#[derive(Parser, Debug)]
#[command(name = "slidetext")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from .pptx files, one block per slide
    Text(TextArgs),
    /// Convert presentations to PDF with a headless office suite
    Pdf(PdfArgs),
}

#[derive(Args, Debug)]
struct TextArgs {
    /// Input presentation file(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print output to stdout instead of writing to file
    #[arg(short, long)]
    print: bool,

    /// Print one JSON response object per file instead of plain text
    #[arg(long, conflicts_with = "dump_model")]
    json: bool,

    /// Print the parsed document model as JSON
    #[arg(long)]
    dump_model: bool,
}

#[derive(Args, Debug)]
struct PdfArgs {
    /// Input presentation file(s) (.ppt or .pptx)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Converter executable
    #[arg(long, env = "SLIDETEXT_SOFFICE", default_value = slidetext_render::DEFAULT_PROGRAM)]
    soffice: String,

    /// Conversion time limit in seconds
    #[arg(long, env = "SLIDETEXT_RENDER_TIMEOUT", default_value_t = 60)]
    timeout: u64,
}

/// Per-file result in `--json` mode.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum TextResponse {
    Success {
        success: bool,
        text: String,
        filename: String,
    },
    Failure {
        error: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let (failed, total) = match &cli.command {
        Command::Text(args) => run_text(args, cli.verbose)?,
        Command::Pdf(args) => run_pdf(args, cli.verbose)?,
    };

    if failed > 0 {
        anyhow::bail!("{} of {} files failed", failed, total);
    }
    Ok(())
}

/// Run the `text` subcommand; returns `(failed, total)`.
fn run_text(args: &TextArgs, verbose: bool) -> Result<(usize, usize)> {
    let mut failed = 0;

    for input_path in &args.input {
        if verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        let filename = display_name(input_path);

        if args.json {
            let response = match process_file(input_path) {
                Ok(text) => TextResponse::Success {
                    success: true,
                    text,
                    filename,
                },
                Err(e) => {
                    failed += 1;
                    TextResponse::Failure {
                        error: format!("{:#}", e),
                    }
                }
            };
            println!("{}", serde_json::to_string(&response)?);
            continue;
        }

        let result = if args.dump_model {
            dump_model(input_path)
        } else {
            process_file(input_path)
        };

        match result {
            Ok(output) => {
                if args.print || args.dump_model {
                    print!("{}", output);
                } else {
                    let output_path = get_output_path(input_path, args.output.as_ref(), "txt")?;
                    write_output(&output_path, &output)?;
                    if verbose {
                        eprintln!("Written to: {}", output_path.display());
                    }
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
            }
        }
    }

    Ok((failed, args.input.len()))
}

/// Run the `pdf` subcommand; returns `(failed, total)`.
fn run_pdf(args: &PdfArgs, verbose: bool) -> Result<(usize, usize)> {
    let renderer = PdfRenderer::new()
        .with_program(&args.soffice)
        .with_timeout(Duration::from_secs(args.timeout));
    let mut failed = 0;

    for input_path in &args.input {
        if verbose {
            eprintln!("Converting: {}", input_path.display());
        }

        let output_path = get_output_path(input_path, args.output.as_ref(), "pdf")?;
        match renderer.render_to_file(input_path, &output_path) {
            Ok(()) => {
                if verbose {
                    eprintln!("Written to: {}", output_path.display());
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("Error converting {}: {}", input_path.display(), e);
            }
        }
    }

    Ok((failed, args.input.len()))
}

/// Extract the text of a single presentation file.
fn process_file(input_path: &Path) -> Result<String> {
    let data = fs::read(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let filename = display_name(input_path);

    let text = slidetext_pptx::extract_text_from_bytes(&data, &filename)?;
    log::debug!("Extracted {} bytes of text from {}", text.len(), filename);
    Ok(text)
}

/// Parse a presentation and serialize its document model.
fn dump_model(input_path: &Path) -> Result<String> {
    let data = fs::read(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let document = PptxParser::new().parse(Cursor::new(data))?;
    let mut json = serde_json::to_string_pretty(&document)?;
    json.push('\n');
    Ok(json)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Determine the output path for a processed file.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>, extension: &str) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}.{}", stem, extension);

    let output_path = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
