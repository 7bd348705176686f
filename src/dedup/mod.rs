//! Vocabulary de-duplication
//!
//! Repeated spreadsheet imports pile up near-identical rows, each dragging
//! its own review history. A vocabulary card's identity is its normalized
//! prompt; merging folds every duplicate into one survivor, accumulating
//! stats instead of discarding them.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::document::{CardContent, DeckKind, Document, DocumentError, DocumentStore};

/// Content identity of a vocabulary prompt: trimmed, lowercased, inner
/// whitespace runs collapsed to single spaces.
pub fn prompt_key(prompt: &str) -> String {
    let lowered = prompt.to_lowercase();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Entry {
    id: String,
    updated_at: DateTime<Utc>,
}

/// Merges duplicate vocabulary cards within one deck. Returns the
/// key-to-survivor index (for every vocabulary card in the deck, merged or
/// not) and the number of cards merged away. The import pipeline chains on
/// the index without re-scanning; persisting is the caller's job.
pub(crate) fn merge_deck_duplicates(
    doc: &mut Document,
    deck_id: &str,
) -> (HashMap<String, String>, usize) {
    // Group in scan order so ties keep the card the user saw first.
    let mut groups: Vec<(String, Vec<Entry>)> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();
    for card in doc.cards.iter().filter(|c| c.deck_id == deck_id) {
        if !matches!(card.content, CardContent::Vocab { .. }) {
            continue;
        }
        let key = prompt_key(&card.prompt);
        let entry = Entry {
            id: card.id.clone(),
            updated_at: card.updated_at,
        };
        match by_key.get(&key) {
            Some(&i) => groups[i].1.push(entry),
            None => {
                by_key.insert(key.clone(), groups.len());
                groups.push((key, vec![entry]));
            }
        }
    }

    let mut index = HashMap::with_capacity(groups.len());
    let mut merged = 0;
    for (key, entries) in groups {
        let mut keeper = &entries[0];
        for entry in &entries[1..] {
            // strictly newer wins; equal timestamps keep the earlier card
            if entry.updated_at > keeper.updated_at {
                keeper = entry;
            }
        }
        let keeper_id = keeper.id.clone();
        for entry in &entries {
            if entry.id != keeper_id {
                merge_into(doc, &keeper_id, &entry.id);
                merged += 1;
            }
        }
        index.insert(key, keeper_id);
    }
    (index, merged)
}

/// Folds one duplicate into the keeper: the keeper's non-empty text fields
/// win, tags are unioned, counters are summed, bookmarks are ORed. The
/// dropped card and its stat entry disappear.
fn merge_into(doc: &mut Document, keeper_id: &str, dropped_id: &str) {
    let pos = match doc.cards.iter().position(|c| c.id == dropped_id) {
        Some(pos) => pos,
        None => return,
    };
    let dropped = doc.cards.remove(pos);
    let dropped_stat = doc.stats.remove(&dropped.id).unwrap_or_default();
    let now = Utc::now();

    if let Some(keeper) = doc.card_mut(keeper_id) {
        if let (
            CardContent::Vocab {
                meaning,
                mnemonic,
                example,
            },
            CardContent::Vocab {
                meaning: d_meaning,
                mnemonic: d_mnemonic,
                example: d_example,
            },
        ) = (&mut keeper.content, dropped.content)
        {
            if meaning.is_empty() {
                *meaning = d_meaning;
            }
            if mnemonic.is_empty() {
                *mnemonic = d_mnemonic;
            }
            if example.is_empty() {
                *example = d_example;
            }
        }
        for tag in dropped.tags {
            if !keeper.tags.contains(&tag) {
                keeper.tags.push(tag);
            }
        }
        keeper.bookmarked |= dropped.bookmarked;
        keeper.updated_at = keeper.updated_at.max(dropped.updated_at).max(now);
    }

    let stat = doc.stats.entry(keeper_id.to_string()).or_default();
    stat.correct += dropped_stat.correct;
    stat.wrong += dropped_stat.wrong;
    stat.last_reviewed = match (stat.last_reviewed, dropped_stat.last_reviewed) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
}

impl DocumentStore {
    /// Merges duplicate vocabulary cards inside one deck and returns how
    /// many were merged away. Commits only when something changed.
    pub fn merge_vocab_duplicates(&mut self, deck_id: &str) -> Result<usize, DocumentError> {
        let deck = self
            .document()
            .deck(deck_id)
            .ok_or_else(|| DocumentError::DeckNotFound(deck_id.to_string()))?;
        if deck.kind != DeckKind::Vocab {
            return Err(DocumentError::NotVocabDeck(deck_id.to_string()));
        }
        let (_, merged) = merge_deck_duplicates(self.document_mut(), deck_id);
        if merged > 0 {
            self.commit()?;
        }
        Ok(merged)
    }
}
