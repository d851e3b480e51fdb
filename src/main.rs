//! anchorkit - resolve a TOML scene into a layout tree and print it as JSON.

use anchorkit::{config::DEFAULT_CONFIG_PATH, scene, AppConfig};
use anchorkit_layout::NodeSnapshot;
use anchorkit_testkit::{canonical_json, EventLog, JsonlSink};
use anyhow::{bail, Context, Result};
use clap::Parser;
use glam::Vec3;
use std::{fs, path::PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Anchor layout resolver for scene files", long_about = None)]
struct Args {
    /// Scene file (TOML) to resolve
    scene: PathBuf,

    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Resize the root node after loading, as X,Y,Z
    #[arg(long, value_parser = parse_vec3)]
    resize: Option<Vec3>,

    /// Record every node event as JSON lines
    #[arg(long)]
    events: Option<PathBuf>,

    /// Write the resolved tree here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load_from_path(&args.config);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting anchorkit v{}", env!("CARGO_PKG_VERSION"));

    let scene = scene::load(&args.scene)?;
    let root = scene.build(config.precision)?;
    info!(
        nodes = root.descendants().len() + 1,
        "Loaded scene {}",
        args.scene.display()
    );

    let log = args.events.as_ref().map(|_| EventLog::attach_tree(&root));

    if let Some(size) = args.resize {
        info!("Resizing root to {size}");
        scene::resize(&root, size);
    }

    if let (Some(path), Some(log)) = (&args.events, &log) {
        let mut sink = JsonlSink::create(path)?;
        sink.write_all(&log.records())?;
        info!(events = log.len(), "Wrote events to {}", path.display());
    }

    let snapshot = NodeSnapshot::capture(&root);
    let json = if config.pretty {
        canonical_json(&snapshot)?
    } else {
        let mut line = serde_json::to_string(&snapshot).context("Failed to serialize tree")?;
        line.push('\n');
        line
    };

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => print!("{json}"),
    }

    root.dispose();
    Ok(())
}

fn parse_vec3(value: &str) -> Result<Vec3> {
    let parts = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .with_context(|| format!("`{part}` is not a number"))
        })
        .collect::<Result<Vec<_>>>()?;
    match parts.as_slice() {
        &[x, y, z] => Ok(Vec3::new(x, y, z)),
        &[x, y] => Ok(Vec3::new(x, y, 0.0)),
        _ => bail!("expected X,Y,Z (or X,Y), got `{value}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vec3_arguments() {
        assert_eq!(parse_vec3("1, 2,3").unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(parse_vec3("4,5").unwrap(), Vec3::new(4.0, 5.0, 0.0));
        assert!(parse_vec3("1,2,3,4").is_err());
        assert!(parse_vec3("a,b,c").is_err());
    }

    #[test]
    fn cli_accepts_all_flags() {
        let args = Args::try_parse_from([
            "anchorkit",
            "scene.toml",
            "--config",
            "cfg.toml",
            "--resize",
            "10,20,30",
            "--events",
            "events.jsonl",
            "-o",
            "out.json",
        ])
        .unwrap();
        assert_eq!(args.resize, Some(Vec3::new(10.0, 20.0, 30.0)));
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }
}
