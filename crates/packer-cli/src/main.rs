use anyhow::{Context, Result};
use clap::Parser;
use packer_core::{
    CounterRegistry, MessagesPacker, PackUsage, PackerConfig, TextFormat, TextPacker,
};
use std::path::PathBuf;

mod logging;
mod request;

use logging::init_logging;
use request::PackRequest;

#[derive(Parser, Debug, Clone)]
#[command(name = "packer-cli")]
#[command(about = "Pack prioritized prompt items into a token budget")]
#[command(version)]
struct Cli {
    /// Pack request file (JSON)
    request: PathBuf,

    /// Output shape: chat messages (JSON) or a single text prompt
    #[arg(long, value_enum, default_value = "messages")]
    mode: Mode,

    /// Token ceiling (overrides the request's config)
    #[arg(long, env = "PACKER_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Text layout: raw, markdown or xml
    #[arg(long)]
    format: Option<TextFormat>,

    /// Separator between text items
    #[arg(long)]
    separator: Option<String>,

    /// Model name used to pick a tokenizer
    #[arg(long, env = "PACKER_MODEL")]
    model: Option<String>,

    /// Tokenizer registry file (JSON list of model_pattern/tokenizer_path)
    #[arg(long)]
    tokenizers: Option<PathBuf>,

    /// Print a usage report to stderr
    #[arg(long)]
    usage: bool,

    /// Enable debug logging
    #[arg(long, env = "DEBUG", default_value = "false")]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Mode {
    Messages,
    Text,
}

impl Cli {
    /// Command line flags win over the request file.
    fn apply_overrides(&self, mut config: PackerConfig) -> PackerConfig {
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(format) = self.format {
            config = config.with_format(format);
        }
        if let Some(separator) = &self.separator {
            config = config.with_separator(separator.clone());
        }
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let request = PackRequest::load(&cli.request)?;
    let config = cli.apply_overrides(request.config.clone());
    tracing::debug!("Effective configuration: {:?}", config);

    let mut registry = CounterRegistry::new();
    if let Some(path) = &cli.tokenizers {
        registry
            .load_config(path)
            .with_context(|| format!("Failed to load tokenizer registry {}", path.display()))?;
    }

    match cli.mode {
        Mode::Messages => {
            let mut packer = MessagesPacker::from_config(&config, &registry)?;
            request.fill(&mut packer)?;
            let packed = packer.pack_with_usage();
            println!("{}", serde_json::to_string_pretty(&packed.output)?);
            report_usage(cli.usage, &packed.usage)?;
        }
        Mode::Text => {
            let mut packer = TextPacker::from_config(&config, &registry)?;
            request.fill(&mut packer)?;
            let packed = packer.pack_with_usage();
            println!("{}", packed.output);
            report_usage(cli.usage, &packed.usage)?;
        }
    }

    Ok(())
}

fn report_usage(enabled: bool, usage: &PackUsage) -> Result<()> {
    if !enabled {
        return Ok(());
    }

    let report = serde_json::json!({
        "usage": usage,
        "usage_percentage": usage.usage_percentage(),
        "truncation_occurred": usage.truncation_occurred(),
    });
    eprintln!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
