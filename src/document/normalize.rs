//! Never-failing repair of raw persisted JSON into a well-formed
//! [`Document`].
//!
//! Anything this app ever wrote (or a user hand-edited) must load: missing
//! ids and timestamps are backfilled, cards are reattached to live decks,
//! legacy field spellings are migrated, and the stats map is rebuilt to
//! cover exactly the live cards. Running the pass twice changes nothing.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::{
    new_id, Answer, Card, CardContent, CardStat, Deck, DeckKind, Document, SCHEMA_VERSION,
};

/// Repairs a raw JSON value into a document. Structurally nonsensical input
/// (non-object root, wrong container types) degrades to an empty document
/// rather than an error.
pub fn normalize_document(raw: Value) -> Document {
    let root = match raw {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let version = root
        .get("version")
        .and_then(Value::as_u64)
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(SCHEMA_VERSION);

    let raw_decks = root
        .get("decks")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let raw_cards = root
        .get("cards")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let raw_stats = root.get("stats").and_then(Value::as_object);

    let empty = Map::new();

    let mut decks: Vec<Deck> = Vec::with_capacity(raw_decks.len());
    for (idx, value) in raw_decks.iter().enumerate() {
        let obj = value.as_object().unwrap_or(&empty);
        decks.push(Deck {
            id: id_string(obj.get("id")).unwrap_or_else(new_id),
            name: non_empty_string(obj.get("name")).unwrap_or_else(|| format!("Deck {}", idx + 1)),
            description: string_or_default(obj.get("description")),
            kind: obj
                .get("type")
                .and_then(Value::as_str)
                .map(DeckKind::parse)
                .unwrap_or_default(),
            order: int_or(obj.get("order"), (idx + 1) as i64),
            created_at: time_or_now(obj.get("createdAt")),
        });
    }

    let mut cards: Vec<Card> = Vec::with_capacity(raw_cards.len());
    for value in raw_cards {
        let obj = value.as_object().unwrap_or(&empty);
        let id = id_string(obj.get("id")).unwrap_or_else(new_id);

        // Resolve the owning deck; a dangling or missing reference lands in
        // the first deck, synthesized if there is none at all.
        let deck_id = match id_string(obj.get("deckId"))
            .filter(|deck_id| decks.iter().any(|d| d.id == *deck_id))
        {
            Some(deck_id) => deck_id,
            None => {
                if decks.is_empty() {
                    decks.push(default_deck());
                }
                decks[0].id.clone()
            }
        };
        let kind = decks
            .iter()
            .find(|d| d.id == deck_id)
            .map(|d| d.kind)
            .unwrap_or_default();

        let content = match kind {
            DeckKind::Grammar => CardContent::Grammar {
                answer: Answer::normalize(&value_token(obj.get("answer"))).unwrap_or(Answer::O),
                explanation: string_or_default(obj.get("explanation")),
            },
            DeckKind::Vocab => {
                let mut meaning = string_or_default(obj.get("meaning"));
                if meaning.is_empty() {
                    // Legacy vocab rows kept the meaning in `explanation`.
                    meaning = string_or_default(obj.get("explanation"));
                }
                CardContent::Vocab {
                    meaning,
                    mnemonic: string_or_default(obj.get("mnemonic")),
                    example: string_or_default(obj.get("example")),
                }
            }
        };

        // The card-level flag is canonical; older documents only had a
        // `bookmark` boolean on the stat entry.
        let bookmarked = obj
            .get("bookmarked")
            .and_then(Value::as_bool)
            .or_else(|| {
                raw_stats
                    .and_then(|stats| stats.get(&id))
                    .and_then(|s| s.get("bookmark"))
                    .and_then(Value::as_bool)
            })
            .unwrap_or(false);

        let created_at = time_or_now(obj.get("createdAt"));
        cards.push(Card {
            id,
            deck_id,
            prompt: string_or_default(obj.get("prompt")),
            tags: tags_of(obj.get("tags")),
            bookmarked,
            created_at,
            updated_at: time_opt(obj.get("updatedAt")).unwrap_or(created_at),
            content,
        });
    }

    // Exactly one stat entry per live card; orphans disappear here.
    let mut stats = HashMap::with_capacity(cards.len());
    for card in &cards {
        let stat = raw_stats
            .and_then(|m| m.get(&card.id))
            .map(stat_of)
            .unwrap_or_default();
        stats.insert(card.id.clone(), stat);
    }

    Document {
        version,
        decks,
        cards,
        stats,
    }
}

impl Document {
    /// Typed subset of the load-time repair, run before every persist:
    /// every card references a live deck and `stats` covers exactly the
    /// live cards. A payload that disagrees with its deck's kind after a
    /// reattachment is converted rather than dropped.
    pub(crate) fn repair(&mut self) {
        if self.decks.is_empty() && !self.cards.is_empty() {
            self.decks.push(default_deck());
        }
        let decks: Vec<(String, DeckKind)> = self
            .decks
            .iter()
            .map(|d| (d.id.clone(), d.kind))
            .collect();
        for card in &mut self.cards {
            if !decks.iter().any(|(id, _)| *id == card.deck_id) {
                card.deck_id = decks[0].0.clone();
            }
            let kind = decks
                .iter()
                .find(|(id, _)| *id == card.deck_id)
                .map(|(_, kind)| *kind)
                .unwrap_or_default();
            if let Some(converted) = coerce_content(&card.content, kind) {
                card.content = converted;
            }
        }

        let mut stats = HashMap::with_capacity(self.cards.len());
        for card in &self.cards {
            let stat = self.stats.remove(&card.id).unwrap_or_default();
            stats.insert(card.id.clone(), stat);
        }
        self.stats = stats;
    }
}

/// Rebuilds a payload for a new deck kind, keeping the text that makes
/// sense on the other side. Returns `None` when the kinds already agree.
fn coerce_content(content: &CardContent, kind: DeckKind) -> Option<CardContent> {
    match (content, kind) {
        (CardContent::Vocab { meaning, .. }, DeckKind::Grammar) => Some(CardContent::Grammar {
            answer: Answer::O,
            explanation: meaning.clone(),
        }),
        (CardContent::Grammar { explanation, .. }, DeckKind::Vocab) => Some(CardContent::Vocab {
            meaning: explanation.clone(),
            mnemonic: String::new(),
            example: String::new(),
        }),
        _ => None,
    }
}

fn default_deck() -> Deck {
    Deck {
        id: new_id(),
        name: "Default".to_string(),
        description: String::new(),
        kind: DeckKind::Grammar,
        order: 1,
        created_at: Utc::now(),
    }
}

fn stat_of(value: &Value) -> CardStat {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);
    CardStat {
        correct: count_of(obj.get("correct")),
        wrong: count_of(obj.get("wrong")),
        last_reviewed: time_opt(obj.get("lastReviewed")),
    }
}

fn id_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        // Early exports used numeric ids.
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn string_or_default(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Stringifies scalars so numeric or boolean answers ("1", "true") pass
/// through [`Answer::normalize`] like their text spellings.
pub(crate) fn value_token(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn int_or(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        None => default,
    }
}

fn count_of(value: Option<&Value>) -> u32 {
    match value {
        Some(v) => v
            .as_u64()
            .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        None => 0,
    }
}

fn tags_of(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Accepts both RFC 3339 strings and legacy epoch-millisecond numbers.
fn time_opt(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    }
}

fn time_or_now(value: Option<&Value>) -> DateTime<Utc> {
    time_opt(value).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_kitchen_sink() -> Value {
        json!({
            "version": 2,
            "decks": [
                { "id": 7, "type": "VOCAB", "order": 3 },
                { "name": "Grammar", "createdAt": 1700000000000i64 }
            ],
            "cards": [
                { "id": "c1", "deckId": 7, "prompt": "ephemeral", "answer": "X",
                  "explanation": "short-lived", "tags": ["gre", 3] },
                { "id": "c2", "prompt": "dangling deck ref", "deckId": "gone",
                  "answer": "nonsense", "createdAt": "2024-01-02T03:04:05Z" },
                "not even an object"
            ],
            "stats": {
                "c1": { "correct": 3, "wrong": "bad", "lastReviewed": 1700000001000i64,
                        "bookmark": true },
                "orphan": { "correct": 9, "wrong": 9 }
            }
        })
    }

    #[test]
    fn test_nonsense_input_is_empty_document() {
        for raw in [json!(null), json!([1, 2, 3]), json!("text"), json!(42)] {
            let doc = normalize_document(raw);
            assert_eq!(doc.version, SCHEMA_VERSION);
            assert!(doc.decks.is_empty());
            assert!(doc.cards.is_empty());
            assert!(doc.stats.is_empty());
        }
    }

    #[test]
    fn test_kitchen_sink_repair() {
        let doc = normalize_document(legacy_kitchen_sink());

        assert_eq!(doc.version, 2); // positive versions survive
        assert_eq!(doc.decks.len(), 2);
        assert_eq!(doc.decks[0].id, "7");
        assert_eq!(doc.decks[0].kind, DeckKind::Vocab);
        assert_eq!(doc.decks[0].name, "Deck 1");
        assert_eq!(doc.decks[0].order, 3);
        assert_eq!(doc.decks[1].name, "Grammar");
        assert_eq!(doc.decks[1].order, 2);

        assert_eq!(doc.cards.len(), 3);
        // vocab payload: answer discarded, meaning recovered from explanation
        assert_eq!(
            doc.cards[0].content,
            CardContent::Vocab {
                meaning: "short-lived".to_string(),
                mnemonic: String::new(),
                example: String::new(),
            }
        );
        assert_eq!(doc.cards[0].tags, vec!["gre".to_string(), "3".to_string()]);
        assert!(doc.cards[0].bookmarked); // pulled up from the legacy stat field
        // dangling deck reference lands in the first deck
        assert_eq!(doc.cards[1].deck_id, "7");
        // the junk row still becomes a structurally valid card
        assert_eq!(doc.cards[2].prompt, "");

        // stats cover exactly the live cards
        assert_eq!(doc.stats.len(), 3);
        assert!(!doc.stats.contains_key("orphan"));
        let c1 = &doc.stats["c1"];
        assert_eq!(c1.correct, 3);
        assert_eq!(c1.wrong, 0); // non-numeric count zeroes out
        assert!(c1.last_reviewed.is_some());
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            json!(null),
            json!({}),
            json!({ "cards": [{ "prompt": "no decks at all" }] }),
            legacy_kitchen_sink(),
        ] {
            let once = normalize_document(raw);
            let twice = normalize_document(serde_json::to_value(&once).unwrap());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_default_deck_synthesized() {
        let doc = normalize_document(json!({
            "cards": [{ "id": "c1", "prompt": "stranded", "answer": "O" }]
        }));
        assert_eq!(doc.decks.len(), 1);
        assert_eq!(doc.decks[0].name, "Default");
        assert_eq!(doc.cards[0].deck_id, doc.decks[0].id);
    }

    #[test]
    fn test_grammar_answer_defaults_to_o() {
        let doc = normalize_document(json!({
            "decks": [{ "id": "d", "name": "G", "order": 1 }],
            "cards": [
                { "id": "a", "deckId": "d", "prompt": "p", "answer": "?" },
                { "id": "b", "deckId": "d", "prompt": "p", "answer": 1 },
                { "id": "c", "deckId": "d", "prompt": "p", "answer": false }
            ]
        }));
        let answers: Vec<Answer> = doc
            .cards
            .iter()
            .map(|c| match &c.content {
                CardContent::Grammar { answer, .. } => *answer,
                _ => panic!("expected grammar payload"),
            })
            .collect();
        assert_eq!(answers, vec![Answer::O, Answer::O, Answer::X]);
    }

    #[test]
    fn test_card_bookmark_field_wins_over_stat() {
        let doc = normalize_document(json!({
            "decks": [{ "id": "d", "name": "G", "order": 1 }],
            "cards": [{ "id": "c", "deckId": "d", "prompt": "p", "answer": "O",
                        "bookmarked": false }],
            "stats": { "c": { "bookmark": true } }
        }));
        assert!(!doc.cards[0].bookmarked);
    }

    #[test]
    fn test_timestamps_millis_and_rfc3339() {
        let doc = normalize_document(json!({
            "decks": [{ "id": "d", "name": "G", "order": 1,
                        "createdAt": "2023-05-01T00:00:00Z" }],
            "cards": [{ "id": "c", "deckId": "d", "prompt": "p", "answer": "O",
                        "createdAt": 1700000000000i64 }]
        }));
        assert_eq!(
            doc.decks[0].created_at,
            DateTime::parse_from_rfc3339("2023-05-01T00:00:00Z").unwrap()
        );
        assert_eq!(doc.cards[0].created_at.timestamp_millis(), 1700000000000);
        assert_eq!(doc.cards[0].updated_at, doc.cards[0].created_at);
    }

    #[test]
    fn test_version_zero_defaults() {
        let doc = normalize_document(json!({ "version": 0 }));
        assert_eq!(doc.version, SCHEMA_VERSION);
    }

    #[test]
    fn test_repair_reattaches_and_converts() {
        let mut doc = normalize_document(json!({
            "decks": [{ "id": "g", "name": "Grammar", "order": 1 },
                      { "id": "v", "name": "Vocab", "type": "vocab", "order": 2 }],
            "cards": [{ "id": "c", "deckId": "v", "prompt": "ephemeral",
                        "meaning": "short-lived" }]
        }));
        doc.decks.retain(|d| d.id == "g");
        doc.stats.insert("ghost".to_string(), CardStat::default());

        doc.repair();

        assert_eq!(doc.cards[0].deck_id, "g");
        assert_eq!(
            doc.cards[0].content,
            CardContent::Grammar {
                answer: Answer::O,
                explanation: "short-lived".to_string(),
            }
        );
        assert_eq!(doc.stats.len(), 1);
        assert!(doc.stats.contains_key("c"));
    }
}
