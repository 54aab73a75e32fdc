//! Roundkey CLI: recover the round-key table from an obfuscated script.

use anyhow::{Context, Result};
use clap::Parser;
use roundkey::extractor::{extract_key, ExtractorConfig, OutputFormat};
use roundkey::utils::fetch::{FileSource, HttpSource, ScriptSource};
use std::io::{IsTerminal, Read};

#[derive(Parser, Debug)]
#[command(
    name = "roundkey",
    version,
    about = "Recover cipher round keys from an obfuscated script without executing it"
)]
struct Cli {
    /// Script file to analyse. Reads stdin when omitted.
    #[arg(value_name = "FILE", conflicts_with = "url")]
    file: Option<String>,

    /// Fetch the script over HTTP(S) instead.
    #[arg(short = 'u', long)]
    url: Option<String>,

    /// Output format: text (default), json, hex.
    #[arg(short = 'o', long, default_value = "text")]
    format: String,

    /// Number of leading round groups packed into the byte key.
    #[arg(short = 'g', long, default_value_t = roundkey::key::DEFAULT_KEY_GROUPS)]
    groups: usize,

    /// Let later declarations overwrite earlier ones in every round.
    #[arg(long)]
    uniform_bindings: bool,

    /// Disable coloured output.
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let script = if let Some(ref url) = cli.url {
        HttpSource::new(url.as_str()).fetch()?
    } else if let Some(ref path) = cli.file {
        FileSource::new(path).fetch()?
    } else if std::io::stdin().is_terminal() {
        anyhow::bail!("no script provided: pass a file, --url, or pipe it to stdin");
    } else {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    };

    if script.trim().is_empty() {
        anyhow::bail!("empty script");
    }

    let format = match cli.format.as_str() {
        "json" => OutputFormat::Json,
        "hex" => OutputFormat::Hex,
        "text" => OutputFormat::Text,
        other => anyhow::bail!("unknown output format `{other}` (expected text, json or hex)"),
    };

    let config = ExtractorConfig {
        key_groups: cli.groups,
        sticky_declarations: !cli.uniform_bindings,
        format,
        color: !cli.no_color && std::io::stdout().is_terminal(),
    };

    let result = extract_key(&script, &config)?;
    println!("{}", result.text);

    Ok(())
}
