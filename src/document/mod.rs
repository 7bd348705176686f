//! Persistent study document for Cardbox
//!
//! One JSON file holds everything the app knows:
//! - Decks (grammar O/X or vocabulary)
//! - Cards with a kind-specific payload
//! - Per-card review statistics
//!
//! The document is loaded once at store construction, mutated in memory,
//! and flushed whole after every mutating operation. Loading and committing
//! both run a repair pass, so readers never observe a malformed document.

pub mod answer;
pub mod normalize;
pub mod queries;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

pub use answer::Answer;
pub use queries::DeckSummary;

/// Schema version written into fresh documents.
pub const SCHEMA_VERSION: u32 = 3;

const DOCUMENT_FILE: &str = "document.json";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Deck not found: {0}")]
    DeckNotFound(String),
    #[error("Card not found: {0}")]
    CardNotFound(String),
    #[error("Deck name must not be empty")]
    EmptyDeckName,
    #[error("Card prompt must not be empty")]
    EmptyPrompt,
    #[error("Card payload does not match a {0} deck")]
    KindMismatch(DeckKind),
    #[error("Not a vocabulary deck: {0}")]
    NotVocabDeck(String),
}

/// What a deck holds, and therefore how its cards are studied and imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckKind {
    #[default]
    Grammar,
    Vocab,
}

impl DeckKind {
    /// Lenient parse: anything that is not "vocab" collapses to grammar.
    pub fn parse(input: &str) -> DeckKind {
        if input.trim().eq_ignore_ascii_case("vocab") {
            DeckKind::Vocab
        } else {
            DeckKind::Grammar
        }
    }
}

impl fmt::Display for DeckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckKind::Grammar => f.write_str("grammar"),
            DeckKind::Vocab => f.write_str("vocab"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: DeckKind,
    /// Manual sort position, 1-based.
    pub order: i64,
    pub created_at: DateTime<Utc>,
}

/// Kind-specific card payload. The owning deck decides which variant a
/// card carries; mixing kinds within a deck is rejected at the API edge
/// and converted during repair.
#[derive(Debug, Clone, PartialEq)]
pub enum CardContent {
    Grammar { answer: Answer, explanation: String },
    Vocab { meaning: String, mnemonic: String, example: String },
}

impl CardContent {
    pub fn kind(&self) -> DeckKind {
        match self {
            CardContent::Grammar { .. } => DeckKind::Grammar,
            CardContent::Vocab { .. } => DeckKind::Vocab,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "CardRecord")]
pub struct Card {
    pub id: String,
    pub deck_id: String,
    pub prompt: String,
    pub tags: Vec<String>,
    pub bookmarked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub content: CardContent,
}

/// Flat persisted shape of a card. The stored format predates the payload
/// enum: every card carries an `answer` (vocabulary cards pin `"O"`), and
/// the kind-specific fields sit side by side. Cards are only ever read back
/// through the normalizer, which needs the owning deck to pick the variant,
/// so this bridge is serialize-only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CardRecord {
    id: String,
    deck_id: String,
    prompt: String,
    answer: Answer,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meaning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mnemonic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    example: Option<String>,
    tags: Vec<String>,
    bookmarked: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Card> for CardRecord {
    fn from(card: Card) -> Self {
        let (answer, explanation, meaning, mnemonic, example) = match card.content {
            CardContent::Grammar { answer, explanation } => {
                (answer, Some(explanation), None, None, None)
            }
            CardContent::Vocab { meaning, mnemonic, example } => {
                (Answer::O, None, Some(meaning), Some(mnemonic), Some(example))
            }
        };
        CardRecord {
            id: card.id,
            deck_id: card.deck_id,
            prompt: card.prompt,
            answer,
            explanation,
            meaning,
            mnemonic,
            example,
            tags: card.tags,
            bookmarked: card.bookmarked,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}

/// Cumulative review statistics for one card.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStat {
    pub correct: u32,
    pub wrong: u32,
    pub last_reviewed: Option<DateTime<Utc>>,
}

/// The whole persisted state. Invariants kept by [`normalize`] and
/// [`Document::repair`]: every card references a live deck, `stats` holds
/// exactly one entry per live card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub version: u32,
    pub decks: Vec<Deck>,
    pub cards: Vec<Card>,
    pub stats: HashMap<String, CardStat>,
}

const SEED_CARDS: &[(&str, Answer, &str, &str)] = &[
    (
        "She has lived here since 2019.",
        Answer::O,
        "Present perfect pairs with 'since' + a point in time.",
        "tense",
    ),
    (
        "He suggested me to go home.",
        Answer::X,
        "'Suggest' takes a gerund or a that-clause, not object + infinitive.",
        "verbs",
    ),
    (
        "Hardly had I arrived when it started to rain.",
        Answer::O,
        "Inversion after the negative adverbial 'hardly'.",
        "inversion",
    ),
    (
        "If I was you, I would apologize.",
        Answer::X,
        "The hypothetical conditional takes 'were'.",
        "conditionals",
    ),
    (
        "The committee have reached a decision.",
        Answer::O,
        "Collective nouns accept plural agreement in British usage.",
        "agreement",
    ),
    (
        "Each of the students have a laptop.",
        Answer::X,
        "'Each of' takes a singular verb.",
        "agreement",
    ),
];

impl Document {
    /// Starter document for first runs and resets: one grammar deck with a
    /// handful of sample cards and zeroed stats.
    pub fn seeded() -> Document {
        let now = Utc::now();
        let deck = Deck {
            id: new_id(),
            name: "Grammar basics".to_string(),
            description: "Sample O/X items to try the study flow".to_string(),
            kind: DeckKind::Grammar,
            order: 1,
            created_at: now,
        };
        let mut cards = Vec::with_capacity(SEED_CARDS.len());
        let mut stats = HashMap::with_capacity(SEED_CARDS.len());
        for (i, (prompt, answer, explanation, tag)) in SEED_CARDS.iter().enumerate() {
            // Distinct timestamps keep the creation order visible.
            let t = now + Duration::milliseconds(i as i64);
            let card = Card {
                id: new_id(),
                deck_id: deck.id.clone(),
                prompt: (*prompt).to_string(),
                tags: vec![(*tag).to_string()],
                bookmarked: false,
                created_at: t,
                updated_at: t,
                content: CardContent::Grammar {
                    answer: *answer,
                    explanation: (*explanation).to_string(),
                },
            };
            stats.insert(card.id.clone(), CardStat::default());
            cards.push(card);
        }
        Document {
            version: SCHEMA_VERSION,
            decks: vec![deck],
            cards,
            stats,
        }
    }
}

// ========== Request Types ==========

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateDeckRequest {
    pub name: String,
    pub description: Option<String>,
    pub kind: Option<DeckKind>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDeckRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A card to insert, before it gets an id, timestamps, and a stat entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCard {
    pub prompt: String,
    pub tags: Vec<String>,
    pub content: CardContent,
}

/// Partial card update; `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct CardPatch {
    pub prompt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub content: Option<CardContent>,
}

/// Main store: the in-memory document plus the directory it persists to.
pub struct DocumentStore {
    data_dir: PathBuf,
    document: Document,
}

impl DocumentStore {
    pub fn new(data_dir: PathBuf) -> Result<Self, DocumentError> {
        fs::create_dir_all(&data_dir)?;
        let mut store = Self {
            data_dir,
            document: Document::seeded(),
        };
        store.load()?;
        Ok(store)
    }

    fn load(&mut self) -> Result<(), DocumentError> {
        let path = self.document_path();
        if !path.exists() {
            // First run keeps the seed; it is persisted on the first commit.
            return Ok(());
        }
        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => self.document = normalize::normalize_document(value),
            Err(err) => {
                tracing::warn!("stored document is not valid JSON, reseeding: {err}");
                self.document = Document::seeded();
            }
        }
        Ok(())
    }

    fn document_path(&self) -> PathBuf {
        self.data_dir.join(DOCUMENT_FILE)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Repairs the in-memory document and flushes it to disk. Every
    /// mutating operation ends here.
    pub fn commit(&mut self) -> Result<(), DocumentError> {
        self.document.repair();
        self.save()
    }

    fn save(&self) -> Result<(), DocumentError> {
        let data = serde_json::to_string_pretty(&self.document)?;
        fs::write(self.document_path(), data)?;
        Ok(())
    }

    // ========== Deck Methods ==========

    pub fn create_deck(&mut self, req: CreateDeckRequest) -> Result<Deck, DocumentError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(DocumentError::EmptyDeckName);
        }
        let order = self.document.decks.iter().map(|d| d.order).max().unwrap_or(0) + 1;
        let deck = Deck {
            id: new_id(),
            name,
            description: req.description.unwrap_or_default(),
            kind: req.kind.unwrap_or_default(),
            order,
            created_at: Utc::now(),
        };
        self.document.decks.push(deck.clone());
        self.commit()?;
        Ok(deck)
    }

    pub fn update_deck(
        &mut self,
        deck_id: &str,
        req: UpdateDeckRequest,
    ) -> Result<Deck, DocumentError> {
        let deck = self
            .document
            .deck_mut(deck_id)
            .ok_or_else(|| DocumentError::DeckNotFound(deck_id.to_string()))?;
        if let Some(name) = req.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DocumentError::EmptyDeckName);
            }
            deck.name = name;
        }
        if let Some(description) = req.description {
            deck.description = description;
        }
        let updated = deck.clone();
        self.commit()?;
        Ok(updated)
    }

    /// Deletes a deck together with its cards; their stats are pruned by
    /// the commit repair.
    pub fn delete_deck(&mut self, deck_id: &str) -> Result<(), DocumentError> {
        if self.document.deck(deck_id).is_none() {
            return Err(DocumentError::DeckNotFound(deck_id.to_string()));
        }
        self.document.decks.retain(|d| d.id != deck_id);
        self.document.cards.retain(|c| c.deck_id != deck_id);
        self.commit()
    }

    // ========== Card Methods ==========

    pub fn create_card(&mut self, deck_id: &str, new: NewCard) -> Result<Card, DocumentError> {
        let kind = self
            .document
            .deck(deck_id)
            .map(|d| d.kind)
            .ok_or_else(|| DocumentError::DeckNotFound(deck_id.to_string()))?;
        let prompt = new.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(DocumentError::EmptyPrompt);
        }
        if new.content.kind() != kind {
            return Err(DocumentError::KindMismatch(kind));
        }
        let card = push_new_card(
            &mut self.document,
            deck_id,
            NewCard { prompt, ..new },
        );
        self.commit()?;
        Ok(card)
    }

    pub fn update_card(&mut self, card_id: &str, patch: CardPatch) -> Result<Card, DocumentError> {
        let kind = {
            let card = self
                .document
                .card(card_id)
                .ok_or_else(|| DocumentError::CardNotFound(card_id.to_string()))?;
            self.document
                .deck(&card.deck_id)
                .map(|d| d.kind)
                .unwrap_or_else(|| card.content.kind())
        };
        if let Some(content) = &patch.content {
            if content.kind() != kind {
                return Err(DocumentError::KindMismatch(kind));
            }
        }
        let prompt = match patch.prompt {
            Some(p) => {
                let p = p.trim().to_string();
                if p.is_empty() {
                    return Err(DocumentError::EmptyPrompt);
                }
                Some(p)
            }
            None => None,
        };
        let card = self
            .document
            .card_mut(card_id)
            .ok_or_else(|| DocumentError::CardNotFound(card_id.to_string()))?;
        if let Some(p) = prompt {
            card.prompt = p;
        }
        if let Some(tags) = patch.tags {
            card.tags = tags;
        }
        if let Some(content) = patch.content {
            card.content = content;
        }
        card.updated_at = Utc::now();
        let updated = card.clone();
        self.commit()?;
        Ok(updated)
    }

    pub fn delete_card(&mut self, card_id: &str) -> Result<(), DocumentError> {
        let before = self.document.cards.len();
        self.document.cards.retain(|c| c.id != card_id);
        if self.document.cards.len() == before {
            return Err(DocumentError::CardNotFound(card_id.to_string()));
        }
        self.document.stats.remove(card_id);
        self.commit()
    }

    pub fn set_bookmark(&mut self, card_id: &str, bookmarked: bool) -> Result<(), DocumentError> {
        let card = self
            .document
            .card_mut(card_id)
            .ok_or_else(|| DocumentError::CardNotFound(card_id.to_string()))?;
        card.bookmarked = bookmarked;
        self.commit()
    }

    /// The grading write: bumps the card's counters and stamps the review
    /// time. The only mutation the study session performs.
    pub fn record_review(&mut self, card_id: &str, correct: bool) -> Result<(), DocumentError> {
        if self.document.card(card_id).is_none() {
            return Err(DocumentError::CardNotFound(card_id.to_string()));
        }
        let stat = self.document.stats.entry(card_id.to_string()).or_default();
        if correct {
            stat.correct += 1;
        } else {
            stat.wrong += 1;
        }
        stat.last_reviewed = Some(Utc::now());
        self.commit()
    }

    // ========== Document Methods ==========

    /// Wholesale replacement from a raw backup payload. Destructive;
    /// confirmation is the caller's job.
    pub fn replace_document(&mut self, raw: Value) -> Result<(), DocumentError> {
        tracing::info!("replacing document from imported backup");
        self.document = normalize::normalize_document(raw);
        self.commit()
    }

    /// Discards everything and restores the seeded sample data.
    pub fn reset(&mut self) -> Result<(), DocumentError> {
        tracing::info!("resetting document to seed data");
        self.document = Document::seeded();
        self.commit()
    }
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Inserts a card with fresh id/timestamps and a zeroed stat entry. The
/// caller has already validated the deck and the payload kind.
pub(crate) fn push_new_card(doc: &mut Document, deck_id: &str, new: NewCard) -> Card {
    let now = Utc::now();
    let card = Card {
        id: new_id(),
        deck_id: deck_id.to_string(),
        prompt: new.prompt,
        tags: new.tags,
        bookmarked: false,
        created_at: now,
        updated_at: now,
        content: new.content,
    };
    doc.stats.insert(card.id.clone(), CardStat::default());
    doc.cards.push(card.clone());
    card
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn grammar_card(prompt: &str) -> NewCard {
        NewCard {
            prompt: prompt.to_string(),
            tags: vec![],
            content: CardContent::Grammar {
                answer: Answer::O,
                explanation: String::new(),
            },
        }
    }

    fn vocab_card(prompt: &str, meaning: &str) -> NewCard {
        NewCard {
            prompt: prompt.to_string(),
            tags: vec![],
            content: CardContent::Vocab {
                meaning: meaning.to_string(),
                mnemonic: String::new(),
                example: String::new(),
            },
        }
    }

    #[test]
    fn test_store_seeds_on_first_run() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let doc = store.document();
        assert_eq!(doc.version, SCHEMA_VERSION);
        assert_eq!(doc.decks.len(), 1);
        assert_eq!(doc.decks[0].kind, DeckKind::Grammar);
        assert_eq!(doc.cards.len(), SEED_CARDS.len());
        assert_eq!(doc.stats.len(), doc.cards.len());
    }

    #[test]
    fn test_document_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().to_path_buf();

        let (deck_id, card_id) = {
            let mut store = DocumentStore::new(path.clone()).unwrap();
            let deck = store
                .create_deck(CreateDeckRequest {
                    name: "Vocab".to_string(),
                    kind: Some(DeckKind::Vocab),
                    ..Default::default()
                })
                .unwrap();
            let card = store
                .create_card(&deck.id, vocab_card("ephemeral", "short-lived"))
                .unwrap();
            (deck.id, card.id)
        };

        {
            let store = DocumentStore::new(path).unwrap();
            let doc = store.document();
            assert!(doc.deck(&deck_id).is_some());
            let card = doc.card(&card_id).unwrap();
            assert_eq!(card.prompt, "ephemeral");
            assert_eq!(
                card.content,
                CardContent::Vocab {
                    meaning: "short-lived".to_string(),
                    mnemonic: String::new(),
                    example: String::new(),
                }
            );
            assert!(doc.stats.contains_key(&card_id));
        }
    }

    #[test]
    fn test_corrupt_file_falls_back_to_seed() {
        let dir = tempdir().unwrap();
        let path = dir.path().to_path_buf();
        fs::write(path.join(DOCUMENT_FILE), "{not json").unwrap();

        let store = DocumentStore::new(path).unwrap();
        assert_eq!(store.document().decks[0].name, "Grammar basics");
    }

    #[test]
    fn test_create_deck_requires_name() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let err = store
            .create_deck(CreateDeckRequest {
                name: "   ".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, DocumentError::EmptyDeckName));
    }

    #[test]
    fn test_create_deck_orders_after_existing() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let deck = store
            .create_deck(CreateDeckRequest {
                name: "Second".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(deck.order, 2); // seed deck is order 1
    }

    #[test]
    fn test_delete_deck_cascades() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let deck_id = store.document().decks[0].id.clone();
        let other = store
            .create_deck(CreateDeckRequest {
                name: "Keep".to_string(),
                ..Default::default()
            })
            .unwrap();
        let kept = store.create_card(&other.id, grammar_card("kept")).unwrap();

        store.delete_deck(&deck_id).unwrap();

        let doc = store.document();
        assert!(doc.deck(&deck_id).is_none());
        assert!(doc.cards.iter().all(|c| c.deck_id == other.id));
        assert_eq!(doc.stats.len(), 1);
        assert!(doc.stats.contains_key(&kept.id));
    }

    #[test]
    fn test_create_card_rejects_kind_mismatch() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let deck_id = store.document().decks[0].id.clone();
        let err = store
            .create_card(&deck_id, vocab_card("word", "meaning"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::KindMismatch(DeckKind::Grammar)));
    }

    #[test]
    fn test_create_card_rejects_empty_prompt() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let deck_id = store.document().decks[0].id.clone();
        let err = store.create_card(&deck_id, grammar_card("  ")).unwrap_err();
        assert!(matches!(err, DocumentError::EmptyPrompt));
    }

    #[test]
    fn test_update_card_partial() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let deck_id = store.document().decks[0].id.clone();
        let card = store.create_card(&deck_id, grammar_card("before")).unwrap();

        let updated = store
            .update_card(
                &card.id,
                CardPatch {
                    prompt: Some("after".to_string()),
                    tags: Some(vec!["edited".to_string()]),
                    content: None,
                },
            )
            .unwrap();

        assert_eq!(updated.prompt, "after");
        assert_eq!(updated.tags, vec!["edited".to_string()]);
        assert_eq!(updated.content, card.content);
        assert!(updated.updated_at >= card.updated_at);
    }

    #[test]
    fn test_delete_card_removes_stat() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let deck_id = store.document().decks[0].id.clone();
        let card = store.create_card(&deck_id, grammar_card("bye")).unwrap();

        store.delete_card(&card.id).unwrap();

        assert!(store.document().card(&card.id).is_none());
        assert!(!store.document().stats.contains_key(&card.id));
    }

    #[test]
    fn test_record_review_updates_stat() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let card_id = store.document().cards[0].id.clone();

        store.record_review(&card_id, true).unwrap();
        store.record_review(&card_id, false).unwrap();

        let stat = store.document().stat(&card_id).unwrap();
        assert_eq!(stat.correct, 1);
        assert_eq!(stat.wrong, 1);
        assert!(stat.last_reviewed.is_some());
    }

    #[test]
    fn test_record_review_unknown_card() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let err = store.record_review("nope", true).unwrap_err();
        assert!(matches!(err, DocumentError::CardNotFound(_)));
    }

    #[test]
    fn test_set_bookmark() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let card_id = store.document().cards[0].id.clone();

        store.set_bookmark(&card_id, true).unwrap();
        assert!(store.document().is_bookmarked(&card_id));

        store.set_bookmark(&card_id, false).unwrap();
        assert!(!store.document().is_bookmarked(&card_id));
    }

    #[test]
    fn test_replace_document() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();

        store
            .replace_document(serde_json::json!({
                "version": 2,
                "decks": [{ "id": "d1", "name": "Imported", "order": 1 }],
                "cards": [{ "id": "c1", "deckId": "d1", "prompt": "p", "answer": "O" }],
                "stats": {}
            }))
            .unwrap();

        let doc = store.document();
        assert_eq!(doc.decks.len(), 1);
        assert_eq!(doc.decks[0].name, "Imported");
        assert_eq!(doc.cards.len(), 1);
        assert!(doc.stats.contains_key("c1"));
    }

    #[test]
    fn test_reset_restores_seed() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let deck_id = store.document().decks[0].id.clone();
        store.delete_deck(&deck_id).unwrap();
        assert!(store.document().decks.is_empty());

        store.reset().unwrap();

        assert_eq!(store.document().decks.len(), 1);
        assert_eq!(store.document().cards.len(), SEED_CARDS.len());
    }

    #[test]
    fn test_vocab_card_serializes_pinned_answer() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let deck = store
            .create_deck(CreateDeckRequest {
                name: "Vocab".to_string(),
                kind: Some(DeckKind::Vocab),
                ..Default::default()
            })
            .unwrap();
        let card = store
            .create_card(&deck.id, vocab_card("ephemeral", "short-lived"))
            .unwrap();

        // The flat persisted shape pins `answer` to "O" on vocabulary cards
        // and drops the grammar-only explanation field.
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["answer"], "O");
        assert_eq!(value["meaning"], "short-lived");
        assert!(value.get("explanation").is_none());
    }

    #[test]
    fn test_update_deck() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().to_path_buf()).unwrap();
        let deck_id = store.document().decks[0].id.clone();

        let updated = store
            .update_deck(
                &deck_id,
                UpdateDeckRequest {
                    name: Some("Renamed".to_string()),
                    description: None,
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.description, "Sample O/X items to try the study flow");
    }
}
