//! Tag filtering for study sessions. Pure functions over the document; the
//! session engine applies them when building its queue.

use serde::{Deserialize, Serialize};

use super::{eligible_ids, StudyMode};
use crate::document::{Card, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMatch {
    /// Card carries at least one of the selected tags.
    #[default]
    Any,
    /// Card carries every selected tag.
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagFilter {
    pub tags: Vec<String>,
    pub match_mode: TagMatch,
}

impl TagFilter {
    pub fn new(tags: Vec<String>, match_mode: TagMatch) -> TagFilter {
        TagFilter { tags, match_mode }
    }

    pub fn matches(&self, card: &Card) -> bool {
        card_has_tags(card, &self.tags, self.match_mode)
    }
}

/// Distinct tags of the cards a session over `mode` would draw from,
/// case-insensitively sorted. Korean tags sort after Latin ones; Hangul
/// code points already collate in dictionary order.
pub fn deck_tags(doc: &Document, deck_id: &str, mode: StudyMode) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for id in eligible_ids(doc, deck_id, mode) {
        if let Some(card) = doc.card(&id) {
            for tag in &card.tags {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
    }
    tags.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    tags
}

/// An empty selection matches everything; that is what "no filter" means.
pub fn card_has_tags(card: &Card, selected: &[String], match_mode: TagMatch) -> bool {
    if selected.is_empty() {
        return true;
    }
    match match_mode {
        TagMatch::Any => selected.iter().any(|tag| card.tags.contains(tag)),
        TagMatch::All => selected.iter().all(|tag| card.tags.contains(tag)),
    }
}

/// Applies the filter over an id list, dropping ids whose card no longer
/// exists.
pub fn filter_card_ids(doc: &Document, ids: &[String], filter: &TagFilter) -> Vec<String> {
    ids.iter()
        .filter(|id| doc.card(id).map(|card| filter.matches(card)).unwrap_or(false))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::normalize::normalize_document;
    use serde_json::json;

    fn tagged_document() -> Document {
        normalize_document(json!({
            "decks": [{ "id": "d", "name": "Deck", "order": 1 }],
            "cards": [
                { "id": "a", "deckId": "d", "prompt": "a", "answer": "O",
                  "tags": ["tense", "문법"], "bookmarked": true },
                { "id": "b", "deckId": "d", "prompt": "b", "answer": "O",
                  "tags": ["Agreement", "tense"] },
                { "id": "c", "deckId": "d", "prompt": "c", "answer": "O",
                  "tags": [] }
            ],
            "stats": { "b": { "wrong": 1 } }
        }))
    }

    #[test]
    fn test_deck_tags_sorted_and_deduped() {
        let doc = tagged_document();
        let tags = deck_tags(&doc, "d", StudyMode::All);
        assert_eq!(tags, vec!["Agreement", "tense", "문법"]);
    }

    #[test]
    fn test_deck_tags_respects_base_mode() {
        let doc = tagged_document();
        assert_eq!(
            deck_tags(&doc, "d", StudyMode::Bookmarks),
            vec!["tense", "문법"]
        );
        assert_eq!(
            deck_tags(&doc, "d", StudyMode::Wrongs),
            vec!["Agreement", "tense"]
        );
    }

    #[test]
    fn test_empty_selection_matches_everything() {
        let doc = tagged_document();
        let card = doc.card("c").unwrap();
        assert!(card_has_tags(card, &[], TagMatch::Any));
        assert!(card_has_tags(card, &[], TagMatch::All));
    }

    #[test]
    fn test_any_and_all_matching() {
        let doc = tagged_document();
        let card = doc.card("b").unwrap();
        let selected = vec!["tense".to_string(), "문법".to_string()];
        assert!(card_has_tags(card, &selected, TagMatch::Any));
        assert!(!card_has_tags(card, &selected, TagMatch::All));

        let both = vec!["Agreement".to_string(), "tense".to_string()];
        assert!(card_has_tags(card, &both, TagMatch::All));
    }

    #[test]
    fn test_filter_card_ids_drops_dead_ids() {
        let doc = tagged_document();
        let filter = TagFilter::new(vec!["tense".to_string()], TagMatch::Any);
        let ids = vec![
            "a".to_string(),
            "c".to_string(),
            "deleted".to_string(),
            "b".to_string(),
        ];
        assert_eq!(
            filter_card_ids(&doc, &ids, &filter),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
