//! CLI tool to transpile and evaluate textml documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use log::debug;

use textml::render::{self, Document};
use textml::template::{Config, Engine, FileLoader};
use textml::{Block, Value};

#[derive(Parser)]
#[command(name = "textml")]
#[command(about = "Brace-delimited markup: transpiler and template engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a document to another format
    Transpile {
        /// Output format
        #[arg(short, long, default_value = "json",
              value_parser = clap::builder::PossibleValuesParser::new(render::RENDERERS))]
        format: String,
        /// Output file, `-` for stdout
        #[arg(short, long, default_value = "-")]
        output: String,
        /// Input document
        input: PathBuf,
    },

    /// Evaluate a document as a template
    Template {
        /// Output file, `-` for stdout
        #[arg(short, long, default_value = "-")]
        output: String,
        /// Trim spaces around literal text
        #[arg(long)]
        trim_spaces: bool,
        /// Seed a variable, as NAME=VALUE
        #[arg(long = "var", value_name = "NAME=VALUE")]
        variables: Vec<String>,
        /// Seed variables from the members of a JSON object
        #[arg(long, value_name = "FILE")]
        context: Option<PathBuf>,
        /// Input document
        input: PathBuf,
    },

    /// Print the text of a document, or its metadata as JSON
    Document {
        /// Output file, `-` for stdout
        #[arg(short, long, default_value = "-")]
        output: String,
        /// Print the collected metadata instead of the text
        #[arg(long)]
        metadata: bool,
        /// Input document
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Transpile {
            format,
            output,
            input,
        } => {
            let block = read_document(&input)?;
            let renderer =
                render::renderer(&format).ok_or_else(|| anyhow!("unknown format {format:?}"))?;
            let rendered = renderer
                .render(&block)
                .with_context(|| format!("cannot render {} as {format}", input.display()))?;
            write_output(&output, &rendered)
        }
        Command::Template {
            output,
            trim_spaces,
            variables,
            context,
            input,
        } => {
            let block = read_document(&input)?;
            let root = input.parent().unwrap_or_else(|| Path::new("."));
            let config = Config::default()
                .with_trim_spaces(trim_spaces)
                .with_loader(FileLoader::new(root));

            let mut engine = Engine::new(config);
            if let Some(path) = context {
                engine = engine.with_context(read_context(&path)?);
            }
            for variable in &variables {
                let (name, value) = parse_variable(variable)?;
                engine = engine.with_variable(name, value);
            }

            let rendered = engine
                .evaluate(&block)
                .with_context(|| format!("cannot evaluate {}", input.display()))?;
            write_output(&output, &format!("{}\n", rendered.trim()))
        }
        Command::Document {
            output,
            metadata,
            input,
        } => {
            let block = read_document(&input)?;
            let document = Document
                .render_document(&block)
                .with_context(|| format!("cannot render {}", input.display()))?;
            if metadata {
                let json = serde_json::to_string_pretty(&document.metadata)?;
                write_output(&output, &format!("{json}\n"))
            } else {
                write_output(&output, &document.text)
            }
        }
    }
}

fn read_document(path: &Path) -> Result<Block> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    debug!("read {} bytes from {}", source.len(), path.display());
    textml::parse_str(&source).with_context(|| path.display().to_string())
}

fn read_context(path: &Path) -> Result<Vec<(String, Value)>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&source)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    let serde_json::Value::Object(members) = json else {
        bail!("{}: context must be a JSON object", path.display());
    };

    members
        .into_iter()
        .map(|(name, value)| {
            let value = Value::try_from(value)
                .with_context(|| format!("{}: member {name:?}", path.display()))?;
            Ok((name, value))
        })
        .collect()
}

/// Split `NAME=VALUE`; the value is a number or boolean literal if it
/// reads as one, otherwise text.
fn parse_variable(variable: &str) -> Result<(String, Value)> {
    let (name, value) = variable
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got {variable:?}"))?;
    let value = Value::literal(value).unwrap_or_else(|| Value::from(value));
    Ok((name.trim().to_string(), value))
}

fn write_output(output: &str, content: &str) -> Result<()> {
    if output == "-" {
        print!("{content}");
        Ok(())
    } else {
        fs::write(output, content).with_context(|| format!("cannot write {output}"))
    }
}
