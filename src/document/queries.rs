//! Read-only lookups over the in-memory document. Always computed fresh;
//! the document is small enough that caching would only invite staleness.

use serde::{Deserialize, Serialize};

use super::{Card, CardStat, Deck, Document};

/// Per-deck aggregate shown in deck lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSummary {
    pub cards_count: usize,
    pub correct: u32,
    pub wrong: u32,
    pub total: u32,
    /// Rounded percentage of correct reviews; `None` until the first review.
    pub accuracy: Option<u32>,
}

impl Document {
    pub fn deck(&self, deck_id: &str) -> Option<&Deck> {
        self.decks.iter().find(|d| d.id == deck_id)
    }

    pub(crate) fn deck_mut(&mut self, deck_id: &str) -> Option<&mut Deck> {
        self.decks.iter_mut().find(|d| d.id == deck_id)
    }

    /// Decks in display order (the manual `order` field; insertion order
    /// breaks ties).
    pub fn decks_sorted(&self) -> Vec<&Deck> {
        let mut decks: Vec<&Deck> = self.decks.iter().collect();
        decks.sort_by_key(|d| d.order);
        decks
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub(crate) fn card_mut(&mut self, card_id: &str) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == card_id)
    }

    /// Cards of one deck in insertion order.
    pub fn cards_in_deck(&self, deck_id: &str) -> Vec<&Card> {
        self.cards.iter().filter(|c| c.deck_id == deck_id).collect()
    }

    pub fn stat(&self, card_id: &str) -> Option<&CardStat> {
        self.stats.get(card_id)
    }

    pub fn is_bookmarked(&self, card_id: &str) -> bool {
        self.card(card_id).map(|c| c.bookmarked).unwrap_or(false)
    }

    /// A card counts as "wrong" once it has ever been answered incorrectly.
    pub fn is_wrong(&self, card_id: &str) -> bool {
        self.stat(card_id).map(|s| s.wrong > 0).unwrap_or(false)
    }

    pub fn bookmarked_count(&self, deck_id: &str) -> usize {
        self.cards_in_deck(deck_id)
            .iter()
            .filter(|c| c.bookmarked)
            .count()
    }

    pub fn wrong_count(&self, deck_id: &str) -> usize {
        self.cards_in_deck(deck_id)
            .iter()
            .filter(|c| self.is_wrong(&c.id))
            .count()
    }

    pub fn deck_summary(&self, deck_id: &str) -> DeckSummary {
        let cards = self.cards_in_deck(deck_id);
        let mut correct = 0u32;
        let mut wrong = 0u32;
        for card in &cards {
            if let Some(stat) = self.stat(&card.id) {
                correct += stat.correct;
                wrong += stat.wrong;
            }
        }
        let total = correct + wrong;
        let accuracy = if total == 0 {
            None
        } else {
            Some(((correct as f64 / total as f64) * 100.0).round() as u32)
        };
        DeckSummary {
            cards_count: cards.len(),
            correct,
            wrong,
            total,
            accuracy,
        }
    }
}
