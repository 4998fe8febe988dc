//! Command-line entry point for inspecting harness configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use harness_rs::config::{BUNDLED_OVERLAYS, FieldInfo, HarnessConfig, Resolver, Schema};
use log::debug;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Command-line options for the harness CLI.
#[derive(Parser)]
#[command(name = "harness", version, about = "Resolve and inspect harness configuration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the configuration and print it
    Resolve {
        /// Bundled overlay to apply; repeat to apply several in order
        #[arg(long = "overlay", value_name = "NAME")]
        overlays: Vec<String>,
        /// Custom overlay file, relative to the working directory; an absolute
        /// path is used as given
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
        /// Seed for generated random values
        #[arg(long)]
        seed: Option<u64>,
        /// Print credentials instead of masking them
        #[arg(long)]
        show_secrets: bool,
    },
    /// List bundled overlays
    Overlays,
    /// Describe every field with its environment variable and default
    Describe,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    harness_rs::init_logging();
    let cli = Cli::parse();
    match cli.command {
        Command::Resolve {
            overlays,
            config,
            format,
            seed,
            show_secrets,
        } => resolve(&overlays, config, format, seed, show_secrets),
        Command::Overlays => {
            for name in BUNDLED_OVERLAYS.names() {
                println!("{name}");
            }
            Ok(())
        }
        Command::Describe => {
            print!("{}", describe(&HarnessConfig::describe()));
            Ok(())
        }
    }
}

fn resolve(
    overlays: &[String],
    custom: Option<PathBuf>,
    format: OutputFormat,
    seed: Option<u64>,
    show_secrets: bool,
) -> Result<()> {
    let mut resolver = Resolver::new(BUNDLED_OVERLAYS);
    if let Some(seed) = seed {
        debug!("using fixed seed {seed}");
        resolver = resolver.with_seed(seed);
    }
    let config = HarnessConfig::resolve_with(&mut resolver, overlays, custom.as_deref())
        .context("configuration unusable")?;
    let config = if show_secrets {
        config
    } else {
        config.redacted()
    };
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(&config).context("render yaml")?,
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&config).context("render json")?;
            json.push('\n');
            json
        }
    };
    print!("{rendered}");
    Ok(())
}

/// Render field rows grouped by documentation section.
fn describe(rows: &[FieldInfo]) -> String {
    let mut sections: BTreeMap<&str, Vec<&FieldInfo>> = BTreeMap::new();
    for row in rows {
        sections
            .entry(row.section.unwrap_or("General"))
            .or_default()
            .push(row);
    }

    let mut out = String::new();
    for (section, rows) in sections {
        out.push_str(&format!("{section}\n"));
        for row in rows {
            out.push_str(&format!("  {} ({})\n", row.path, row.kind));
            if let Some(env) = row.env {
                out.push_str(&format!("    env: {env}\n"));
            }
            if let Some(default) = row.default {
                out.push_str(&format!("    default: {default:?}\n"));
            }
            if let Some(help) = row.help {
                out.push_str(&format!("    {help}\n"));
            }
        }
    }
    out
}
