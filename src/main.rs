//! vecdoc-inspect.
//!
//! Lädt ein Dokument, wendet optional eine Transaktion an und gibt den
//! Szenenbaum mit Bounding-Boxen aus.
//!
//! Aufruf: `vecdoc-inspect <dokument.json> [transaktion.json] [--undo]`

use std::path::PathBuf;

use anyhow::{bail, Context};
use vecdoc_engine::{DataSync, Document, EngineOptions, Scene, Transaction};

fn main() {
    // Logger initialisieren
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(e) = run() {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

struct Args {
    document: PathBuf,
    transaction: Option<PathBuf>,
    undo: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut document = None;
    let mut transaction = None;
    let mut undo = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--undo" => undo = true,
            _ if document.is_none() => document = Some(PathBuf::from(arg)),
            _ if transaction.is_none() => transaction = Some(PathBuf::from(arg)),
            _ => bail!("Unerwartetes Argument: {}", arg),
        }
    }
    let Some(document) = document else {
        bail!("Aufruf: vecdoc-inspect <dokument.json> [transaktion.json] [--undo]");
    };
    Ok(Args {
        document,
        transaction,
        undo,
    })
}

fn run() -> anyhow::Result<()> {
    let args = parse_args()?;
    log::info!("vecdoc-inspect v{} startet...", env!("CARGO_PKG_VERSION"));

    let options = EngineOptions::load_from_file(&EngineOptions::config_path());
    let mut sync = DataSync::new(options);
    let document = Document::load_from_file(&args.document)?;
    sync.load_document(&document);

    if let Some(path) = &args.transaction {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Transaktion nicht lesbar: {}", path.display()))?;
        let transaction: Transaction =
            serde_json::from_str(&content).context("Transaktions-JSON nicht lesbar")?;
        let applied = sync.transact_local(&transaction)?;
        log::info!("{} von {} Changes angewendet", applied.len(), transaction.len());

        if args.undo {
            sync.undo();
        }
    }

    let scene = sync.scene();
    for root in scene.roots() {
        print_subtree(scene, root, 0);
    }
    Ok(())
}

fn print_subtree(scene: &Scene, id: &str, depth: usize) {
    let Some(node) = scene.node(id) else {
        return;
    };
    let element = node.element();
    let indent = "  ".repeat(depth);
    match node.bounds() {
        Some(b) => println!(
            "{}{} [{:?}] '{}' aabb=({:.2}, {:.2}, {:.2} x {:.2})",
            indent,
            id,
            element.element_type(),
            element.name,
            b.aabb.x,
            b.aabb.y,
            b.aabb.w,
            b.aabb.h
        ),
        None => println!(
            "{}{} [{:?}] '{}'",
            indent,
            id,
            element.element_type(),
            element.name
        ),
    }
    for child in node.children() {
        print_subtree(scene, child, depth + 1);
    }
}
