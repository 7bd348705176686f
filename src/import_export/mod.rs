//! Import and export
//!
//! Three ways in: a full backup object (wholesale replacement), a JSON card
//! array, and pasted text (delimited tables or the one-line-per-card format).
//! Everything funnels into a [`CardBatch`] of validated rows plus the row
//! issues collected along the way, then [`import_batch`] writes the batch in
//! one commit. Exports mirror the backup shape so any exported file can be
//! imported again.

pub mod bulk;
pub mod table;

use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::dedup::{merge_deck_duplicates, prompt_key};
use crate::document::normalize::value_token;
use crate::document::{
    push_new_card, Answer, CardContent, CardStat, DeckKind, Document, DocumentError,
    DocumentStore, NewCard,
};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unrecognized payload, expected a full backup or a card array")]
    UnsupportedPayload,
    #[error("No importable rows ({0} rejected)")]
    NoValidRows(usize),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// One rejected input row. Numbering is 1-based over the rows the parser
/// actually saw, so it matches what the user pasted.
#[derive(Debug, Clone, PartialEq)]
pub struct RowIssue {
    pub row: usize,
    pub reason: String,
}

impl RowIssue {
    fn new(row: usize, reason: impl Into<String>) -> RowIssue {
        RowIssue {
            row,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.reason)
    }
}

/// Parse outcome: the cards worth inserting plus the rows that were not.
/// A batch with issues still imports; only an empty one is an error.
#[derive(Debug, Default)]
pub struct CardBatch {
    pub items: Vec<NewCard>,
    pub issues: Vec<RowIssue>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Fold duplicate vocabulary prompts together instead of appending
    /// blindly. Ignored for grammar decks.
    pub merge_duplicates: bool,
}

/// What [`import_batch`] did, for the caller to report.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    /// Rows dropped because a later row in the same batch had the same key.
    pub duplicate_rows: usize,
    /// Pre-existing duplicate cards folded together before the batch ran.
    pub merged_existing: usize,
}

/// What a pasted or uploaded JSON payload turned out to be.
#[derive(Debug)]
pub enum ImportPayload {
    /// Whole-document backup; importing it replaces everything.
    Backup(Value),
    /// An array of card objects destined for one deck.
    Cards(Vec<Value>),
}

/// Decides how a parsed JSON payload should be imported. A top-level array
/// is a card batch; an object carrying both `decks` and `cards` arrays is a
/// backup; anything else is refused.
pub fn classify_payload(raw: Value) -> Result<ImportPayload, ImportError> {
    match raw {
        Value::Array(rows) => Ok(ImportPayload::Cards(rows)),
        Value::Object(ref map)
            if map.get("decks").map_or(false, Value::is_array)
                && map.get("cards").map_or(false, Value::is_array) =>
        {
            Ok(ImportPayload::Backup(raw))
        }
        _ => Err(ImportError::UnsupportedPayload),
    }
}

/// Interprets a JSON card array for a deck of the given kind. Field aliases
/// cover the export shapes of earlier versions and of the companion
/// vocabulary app: `prompt`/`word`, `mnemonic`/`assoc`/`association`,
/// `example`/`sentence`.
pub fn parse_card_array(rows: &[Value], kind: DeckKind) -> CardBatch {
    let mut batch = CardBatch::default();
    for (i, row) in rows.iter().enumerate() {
        let row_no = i + 1;
        let map = match row.as_object() {
            Some(map) => map,
            None => {
                batch.issues.push(RowIssue::new(row_no, "not an object"));
                continue;
            }
        };
        let prompt = value_token(map.get("prompt").or_else(|| map.get("word")))
            .trim()
            .to_string();
        if prompt.is_empty() {
            batch.issues.push(RowIssue::new(row_no, "empty prompt"));
            continue;
        }
        let content = match kind {
            DeckKind::Grammar => {
                let token = value_token(map.get("answer"));
                match Answer::normalize(&token) {
                    Some(answer) => CardContent::Grammar {
                        answer,
                        explanation: text_field(map, &["explanation"]),
                    },
                    None => {
                        batch.issues.push(RowIssue::new(row_no, "answer is not O/X"));
                        continue;
                    }
                }
            }
            DeckKind::Vocab => CardContent::Vocab {
                meaning: text_field(map, &["meaning"]),
                mnemonic: text_field(map, &["mnemonic", "assoc", "association"]),
                example: text_field(map, &["example", "sentence"]),
            },
        };
        batch.items.push(NewCard {
            prompt,
            tags: tags_field(map.get("tags")),
            content,
        });
    }
    batch
}

/// First non-empty value among the aliased field names, trimmed.
fn text_field(map: &Map<String, Value>, names: &[&str]) -> String {
    for name in names {
        let text = value_token(map.get(*name));
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
    }
    String::new()
}

fn tags_field(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| value_token(Some(item)).trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Writes a parsed batch into a deck in one commit.
///
/// With merging enabled on a vocabulary deck, pre-existing duplicates are
/// folded first, the batch itself is deduplicated (last occurrence of a
/// prompt key wins), and each surviving row either updates the card that
/// already owns its key or creates a new one. Otherwise every item is
/// appended as-is.
pub fn import_batch(
    store: &mut DocumentStore,
    deck_id: &str,
    batch: CardBatch,
    options: ImportOptions,
) -> Result<ImportReport, ImportError> {
    let kind = store
        .document()
        .deck(deck_id)
        .ok_or_else(|| DocumentError::DeckNotFound(deck_id.to_string()))?
        .kind;
    if batch.items.is_empty() {
        return Err(ImportError::NoValidRows(batch.issues.len()));
    }

    let mut report = ImportReport::default();
    if options.merge_duplicates && kind == DeckKind::Vocab {
        let doc = store.document_mut();
        let (mut index, merged) = merge_deck_duplicates(doc, deck_id);
        report.merged_existing = merged;

        let mut order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, NewCard> = HashMap::new();
        for item in batch.items {
            let key = prompt_key(&item.prompt);
            if latest.insert(key.clone(), item).is_some() {
                report.duplicate_rows += 1;
            } else {
                order.push(key);
            }
        }

        for key in order {
            let item = match latest.remove(&key) {
                Some(item) => item,
                None => continue,
            };
            match index.get(&key) {
                Some(card_id) => {
                    update_existing_vocab(doc, card_id, item);
                    report.updated += 1;
                }
                None => {
                    let card = push_new_card(doc, deck_id, item);
                    index.insert(key, card.id);
                    report.created += 1;
                }
            }
        }
    } else {
        for item in batch.items {
            push_new_card(store.document_mut(), deck_id, item);
            report.created += 1;
        }
    }
    store.commit()?;
    Ok(report)
}

/// In-place update of a card that already owns an incoming row's key. The
/// incoming row's non-empty fields overwrite; existing text survives only
/// where the row is silent. Tags are unioned. The prompt and the review
/// history stay with the card.
fn update_existing_vocab(doc: &mut Document, card_id: &str, item: NewCard) {
    let card = match doc.card_mut(card_id) {
        Some(card) => card,
        None => return,
    };
    if let (
        CardContent::Vocab {
            meaning,
            mnemonic,
            example,
        },
        CardContent::Vocab {
            meaning: new_meaning,
            mnemonic: new_mnemonic,
            example: new_example,
        },
    ) = (&mut card.content, item.content)
    {
        if !new_meaning.is_empty() {
            *meaning = new_meaning;
        }
        if !new_mnemonic.is_empty() {
            *mnemonic = new_mnemonic;
        }
        if !new_example.is_empty() {
            *example = new_example;
        }
    }
    for tag in item.tags {
        if !card.tags.contains(&tag) {
            card.tags.push(tag);
        }
    }
    card.updated_at = Utc::now();
    doc.stats.entry(card_id.to_string()).or_default();
}

// ========== Export Methods ==========

/// The whole document as pretty JSON, the backup format.
pub fn export_document(doc: &Document) -> Result<String, ImportError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// One deck with its cards and their stats, shaped like a full backup so
/// the file imports anywhere.
pub fn export_deck(doc: &Document, deck_id: &str) -> Result<String, ImportError> {
    let deck = doc
        .deck(deck_id)
        .ok_or_else(|| DocumentError::DeckNotFound(deck_id.to_string()))?;
    let cards = doc.cards_in_deck(deck_id);
    let stats: HashMap<&str, CardStat> = cards
        .iter()
        .map(|card| {
            let stat = doc.stat(&card.id).cloned().unwrap_or_default();
            (card.id.as_str(), stat)
        })
        .collect();
    let value = json!({
        "version": doc.version,
        "decks": [deck],
        "cards": cards,
        "stats": stats,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
