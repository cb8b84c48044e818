use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use attnviz::{load_layers, load_tokens, render, ModelOutput, ViewSelection, ViewerConfig};
use clap::Parser;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("attnviz failed: {:#}", err);
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Attention visualisation payload builder", long_about = None)]
struct Args {
    #[arg(long, value_name = "PATH", help = "Safetensors file with attention weights")]
    attention: PathBuf,

    #[arg(long, value_name = "PATH", help = "JSON file with the display tokens")]
    tokens: PathBuf,

    #[arg(
        long,
        value_name = "PATH",
        requires = "keys",
        help = "Safetensors file with query vectors"
    )]
    queries: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        requires = "queries",
        help = "Safetensors file with key vectors"
    )]
    keys: Option<PathBuf>,

    #[arg(long, value_name = "N", help = "Offset of sentence B in the token sequence")]
    sentence_b_start: Option<usize>,

    #[arg(short, long, value_name = "PATH", help = "Viewer config file (toml or json)")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, help = "View to build, overrides the config")]
    view: Option<ViewSelection>,

    #[arg(short, long, value_name = "PATH", help = "Write JSON here instead of stdout")]
    output: Option<PathBuf>,

    #[arg(long, help = "Pretty-print the JSON output")]
    pretty: bool,
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(view) = args.view {
        config.view = view;
    }

    let attention = load_layers(&args.attention, "attention")?;
    let queries = args
        .queries
        .as_ref()
        .map(|path| load_layers(path, "queries"))
        .transpose()?;
    let keys = args
        .keys
        .as_ref()
        .map(|path| load_layers(path, "keys"))
        .transpose()?;
    let token_file = load_tokens(&args.tokens)?;

    let sentence_b_start = match (args.sentence_b_start, token_file.sentence_b_start) {
        (Some(flag), Some(file)) if flag != file => bail!(
            "--sentence-b-start {flag} disagrees with sentence_b_start {file} in {}",
            args.tokens.display()
        ),
        (flag, file) => flag.or(file),
    };

    log::info!(
        "building {:?} view: {} layers, {} tokens, sentence_b_start={:?}, vectors={}",
        config.view,
        attention.len(),
        token_file.tokens.len(),
        sentence_b_start,
        queries.is_some()
    );

    let output = ModelOutput {
        attention: &attention,
        queries: queries.as_deref(),
        keys: keys.as_deref(),
    };
    let params = render(&config, &output, &token_file.tokens, sentence_b_start)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&params)?
    } else {
        serde_json::to_string(&params)?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("wrote view parameters to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    Ok(())
}
