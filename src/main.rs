use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardbox_core::import_export::{
    self, bulk, classify_payload, export_deck, export_document, import_batch, table,
    CardBatch, ImportOptions, ImportPayload,
};
use cardbox_core::{CreateDeckRequest, Deck, DeckKind, DocumentStore};

#[derive(Parser)]
#[command(name = "cardbox")]
#[command(about = "Cardbox - maintenance CLI for the flashcard document store")]
struct Cli {
    /// Data directory holding document.json; defaults to the local app-data
    /// directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List decks with card counts and accuracy
    Decks,
    /// Create a deck
    AddDeck {
        name: String,
        #[arg(long, default_value = "grammar")]
        kind: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Import a file: full backup JSON, card-array JSON, a delimited table,
    /// or (with --lines) the one-card-per-line paste format
    Import {
        file: PathBuf,
        /// Target deck name or id; not used for full backups
        #[arg(long)]
        deck: Option<String>,
        /// Merge duplicate vocabulary prompts instead of appending
        #[arg(long)]
        merge: bool,
        /// Treat the file as bulk-paste lines instead of a table
        #[arg(long)]
        lines: bool,
        /// Confirm replacing the whole document with a backup
        #[arg(long)]
        yes: bool,
    },
    /// Export the whole document, or one deck with --deck
    Export {
        #[arg(long)]
        deck: Option<String>,
        /// Output file; prints to stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Merge duplicate vocabulary cards within a deck
    Dedup { deck: String },
    /// Discard everything and restore the sample data
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_local_dir()
            .context("no local data directory on this platform; pass --data-dir")?
            .join("cardbox"),
    };
    let mut store = DocumentStore::new(data_dir)?;

    match cli.command {
        Command::Decks => {
            for deck in store.document().decks_sorted() {
                let summary = store.document().deck_summary(&deck.id);
                let accuracy = summary
                    .accuracy
                    .map(|a| format!("{a}%"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}  {} [{}]  {} cards, accuracy {}",
                    deck.id, deck.name, deck.kind, summary.cards_count, accuracy
                );
            }
        }
        Command::AddDeck {
            name,
            kind,
            description,
        } => {
            let deck = store.create_deck(CreateDeckRequest {
                name,
                description,
                kind: Some(DeckKind::parse(&kind)),
            })?;
            println!("created {} deck {} ({})", deck.kind, deck.name, deck.id);
        }
        Command::Import {
            file,
            deck,
            merge,
            lines,
            yes,
        } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            if lines {
                let target = resolve_deck(&store, deck.as_deref())?;
                let batch = bulk::parse_lines(&text, target.kind);
                run_import(&mut store, &target.id, batch, merge)?;
            } else if let Ok(raw) = serde_json::from_str::<Value>(&text) {
                match classify_payload(raw)? {
                    ImportPayload::Backup(raw) => {
                        if !yes {
                            bail!("a full backup replaces the whole document; re-run with --yes");
                        }
                        store.replace_document(raw)?;
                        println!(
                            "replaced document: {} decks, {} cards",
                            store.document().decks.len(),
                            store.document().cards.len()
                        );
                    }
                    ImportPayload::Cards(rows) => {
                        let target = resolve_deck(&store, deck.as_deref())?;
                        let batch = import_export::parse_card_array(&rows, target.kind);
                        run_import(&mut store, &target.id, batch, merge)?;
                    }
                }
            } else {
                let target = resolve_deck(&store, deck.as_deref())?;
                let batch = table::parse_table(&text, target.kind)?;
                run_import(&mut store, &target.id, batch, merge)?;
            }
        }
        Command::Export { deck, out } => {
            let text = match deck {
                Some(name) => {
                    let target = resolve_deck(&store, Some(&name))?;
                    export_deck(store.document(), &target.id)?
                }
                None => export_document(store.document())?,
            };
            match out {
                Some(path) => {
                    fs::write(&path, text)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("wrote {}", path.display());
                }
                None => println!("{text}"),
            }
        }
        Command::Dedup { deck } => {
            let target = resolve_deck(&store, Some(&deck))?;
            let merged = store.merge_vocab_duplicates(&target.id)?;
            println!("merged {merged} duplicate cards in {}", target.name);
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("reset discards every deck and card; re-run with --yes");
            }
            store.reset()?;
            println!("document reset to sample data");
        }
    }
    Ok(())
}

/// Finds a deck by id or (exact) name.
fn resolve_deck(store: &DocumentStore, name_or_id: Option<&str>) -> Result<Deck> {
    let Some(wanted) = name_or_id else {
        bail!("this import needs a target deck; pass --deck <name or id>");
    };
    store
        .document()
        .decks
        .iter()
        .find(|d| d.id == wanted || d.name == wanted)
        .cloned()
        .with_context(|| format!("no deck named {wanted}"))
}

fn run_import(
    store: &mut DocumentStore,
    deck_id: &str,
    batch: CardBatch,
    merge: bool,
) -> Result<()> {
    let issues = batch.issues.clone();
    let report = import_batch(
        store,
        deck_id,
        batch,
        ImportOptions {
            merge_duplicates: merge,
        },
    )?;
    println!(
        "imported: {} created, {} updated, {} duplicate rows, {} pre-existing merged",
        report.created, report.updated, report.duplicate_rows, report.merged_existing
    );
    if !issues.is_empty() {
        println!("{} rows rejected:", issues.len());
        for issue in issues.iter().take(5) {
            println!("  {issue}");
        }
        if issues.len() > 5 {
            println!("  ... and {} more", issues.len() - 5);
        }
    }
    Ok(())
}
