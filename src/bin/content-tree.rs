use clap::{Parser, Subcommand, ValueEnum};
use content_tree::{Command, ContentTree, NodeSpec, Outline, Snapshot, TreeConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replays a script's commands against its document and prints the result
    Run {
        script: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Do not carry formatting over to newly typed characters
        #[arg(long)]
        no_inherit: bool,
        /// Insert newlines as line-break leaves instead of splitting blocks
        #[arg(long)]
        line_breaks: bool,
    },
    /// Checks a script's document without running its commands
    Check { script: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Outline,
    Text,
}

#[derive(Deserialize)]
struct Script {
    #[serde(default)]
    config: TreeConfig,
    #[serde(default)]
    document: Vec<NodeSpec>,
    #[serde(default)]
    commands: Vec<Command>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "content_tree=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            script,
            format,
            no_inherit,
            line_breaks,
        } => run_command(script, *format, *no_inherit, *line_breaks),
        Commands::Check { script } => check_command(script),
    }
}

fn load_script(path: &Path) -> Script {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("Error: {}: {err}", path.display());
            std::process::exit(1);
        }
    };
    match serde_json::from_str(&raw) {
        Ok(script) => script,
        Err(err) => {
            eprintln!("Error: invalid script: {err}");
            std::process::exit(1);
        }
    }
}

fn build_tree(script: &Script, config: TreeConfig) -> ContentTree {
    match ContentTree::from_specs(&script.document, config) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

fn run_command(path: &Path, format: Format, no_inherit: bool, line_breaks: bool) {
    let script = load_script(path);
    let mut config = script.config;
    if no_inherit {
        config.inherit_formats = false;
    }
    if line_breaks {
        config.newline_splits_block = false;
    }
    let mut tree = build_tree(&script, config);

    for (index, command) in script.commands.iter().enumerate() {
        if let Err(err) = tree.execute(command) {
            eprintln!("Error: command {index} failed: {err}");
            std::process::exit(2);
        }
    }

    match format {
        Format::Json => {
            let output = serde_json::json!({
                "collapsed": tree.is_collapsed(),
                "direction": tree.direction(),
                "selected": tree.selected_nodes(),
                "root": tree.render(&Snapshot),
            });
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    eprintln!("Error: {err}");
                    std::process::exit(1);
                }
            }
        }
        Format::Outline => println!("{}", tree.render(&Outline::with_attributes())),
        Format::Text => println!("{}", tree.text()),
    }
}

fn check_command(path: &Path) {
    let script = load_script(path);
    let tree = build_tree(&script, script.config);
    if let Err(err) = tree.check_invariants() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
    println!(
        "Document is valid: {} nodes, {} commands",
        tree.arena().len(),
        script.commands.len()
    );
}
