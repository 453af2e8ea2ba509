//! `labcanvas` command-line entry point.
//!
//! ```bash
//! # Show the display step number of every protocol step
//! labcanvas steps diagram.json
//!
//! # Export the protocol of a diagram
//! labcanvas export diagram.json --name "Cell passage" -o protocol.json
//!
//! # Turn a protocol document into a diagram and save it
//! labcanvas import protocol.json -o diagram.json --store ./diagrams
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use labcanvas_core::{
    EditorConfig, EditorSession, FileStorage, JsonExtractor, Shape, ShapeStore, ShortcutRegistry,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "labcanvas")]
#[command(version)]
#[command(about = "Number, export and import LabCanvas protocol diagrams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Editor config file (JSON); defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the step number of every protocol step in a diagram
    Steps {
        /// Diagram file (JSON shape list)
        diagram: PathBuf,
    },

    /// Export the protocol of a diagram as an interchange document
    Export {
        /// Diagram file (JSON shape list)
        diagram: PathBuf,

        /// Protocol name written into the document metadata
        #[arg(long)]
        name: String,

        /// Output file (stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a diagram from an interchange document
    Import {
        /// Protocol document (JSON)
        protocol: PathBuf,

        /// Output diagram file (stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also save the diagram into this storage directory
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// List keyboard shortcuts
    Shortcuts,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Commands::Steps { diagram } => steps(config, &diagram),
        Commands::Export {
            diagram,
            name,
            output,
        } => export(config, &diagram, &name, output.as_deref()),
        Commands::Import {
            protocol,
            output,
            store,
        } => import(config, &protocol, output.as_deref(), store),
        Commands::Shortcuts => {
            for shortcut in ShortcutRegistry::all() {
                println!("  {:20} {}", shortcut.format(), shortcut.description);
            }
            Ok(())
        }
    }
}

fn load_session(config: EditorConfig, path: &Path) -> Result<EditorSession> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let store =
        ShapeStore::from_json(&json).with_context(|| format!("parsing {}", path.display()))?;
    log::info!("Loaded {} shapes from {}", store.len(), path.display());
    Ok(EditorSession::with_shapes(config, store.into_shapes()))
}

fn write_output(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{}", contents),
    }
    Ok(())
}

fn steps(config: EditorConfig, diagram: &Path) -> Result<()> {
    let session = load_session(config, diagram)?;
    let numbering = session.step_numbers();
    if numbering.steps.is_empty() {
        bail!("{} has no protocol steps", diagram.display());
    }

    let mut rows: Vec<(u32, &Shape)> = session
        .store
        .iter()
        .filter_map(|shape| numbering.step(shape.id()).map(|step| (step, shape)))
        .collect();
    rows.sort_by_key(|(step, _)| *step);

    for (step, shape) in rows {
        let marker = if numbering.unresolved.contains(shape.id()) {
            " (cycle)"
        } else {
            ""
        };
        println!("{:>3}. {}{}", step, shape.label(), marker);
    }
    Ok(())
}

fn export(config: EditorConfig, diagram: &Path, name: &str, output: Option<&Path>) -> Result<()> {
    let session = load_session(config, diagram)?;
    let doc = session.export_protocol(name)?;
    write_output(output, &doc.to_json()?)
}

fn import(
    config: EditorConfig,
    protocol: &Path,
    output: Option<&Path>,
    store: Option<PathBuf>,
) -> Result<()> {
    let bytes =
        std::fs::read(protocol).with_context(|| format!("reading {}", protocol.display()))?;
    let file_name = protocol
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("protocol.json");

    let mut session = EditorSession::new(config);
    let extracted = session.import_extracted(&JsonExtractor, &bytes, file_name, None);
    let count = pollster::block_on(extracted)?;
    log::info!("Imported {} shapes from {}", count, protocol.display());

    if let Some(dir) = store {
        let storage = FileStorage::new(dir)?;
        let id = pollster::block_on(session.save_to(&storage, None))?;
        eprintln!("Saved diagram {} in {}", id, storage.base_path().display());
    }

    write_output(output, &session.store.to_json()?)
}
