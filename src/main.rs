mod cli;

use initseg::{config, summary};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // RUST_LOG wins, then the config file's filter, then defaults based on the verbose flag
    let env_filter = std::env::var("RUST_LOG")
        .ok()
        .or_else(|| configured_filter(cli.config.as_deref()))
        .unwrap_or_else(|| {
            if cli.verbose {
                "initseg=trace,initseg_fmp4=trace,initseg_codecs=trace".to_string()
            } else {
                "initseg=info,initseg_fmp4=info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { file, json } => inspect_file(&file, json),
        Commands::Build { output } => build_segment(cli.config.as_deref(), &output),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("initseg {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Logging filter from the config file, if one loads cleanly. Config errors
/// are reported later by the command that needs the config.
fn configured_filter(config_path: Option<&Path>) -> Option<String> {
    config::load_config_or_default(config_path)
        .ok()
        .and_then(|config| config.logging.filter)
}

fn inspect_file(file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let data = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    let tracks = initseg_fmp4::decode_init(&data)
        .with_context(|| format!("Failed to decode init segment {:?}", file))?;
    tracing::debug!("Decoded {} tracks from {:?}", tracks.len(), file);

    let summaries = summary::summarize(&tracks);

    if json {
        let json_str = serde_json::to_string_pretty(&summaries)?;
        println!("{}", json_str);
    } else {
        println!("File: {}", file.display());
        println!("Size: {} bytes", data.len());
        println!("\nTracks: {}", summaries.len());
        for track in &summaries {
            println!("  {}", track);
        }
    }

    Ok(())
}

fn build_segment(config_path: Option<&Path>, output: &Path) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tracks = config.tracks()?;
    if tracks.is_empty() {
        tracing::warn!("No tracks configured, writing a segment without tracks");
    }

    let segment = initseg_fmp4::encode_init(&tracks).context("Failed to encode init segment")?;
    std::fs::write(output, &segment)
        .with_context(|| format!("Failed to write {:?}", output))?;

    tracing::info!("Wrote init segment to {:?}", output);
    println!(
        "Wrote {} bytes ({} tracks) to {}",
        segment.len(),
        tracks.len(),
        output.display()
    );

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!(
                "  Logging filter: {}",
                config.logging.filter.as_deref().unwrap_or("(default)")
            );
            println!("  Tracks: {}", config.tracks.len());
            for track in config.tracks()? {
                println!("    {}", summary::TrackSummary::from_track(&track));
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Tracks: {}", config.tracks.len());
        }
    }

    Ok(())
}
