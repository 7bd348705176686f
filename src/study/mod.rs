//! Study session state machine
//!
//! A session is a shuffled queue of card ids walked front to back:
//! - Grade the current card (the only operation that touches stats)
//! - Advance past an answered card; the end of the queue is the summary
//! - Skip an unanswered card to the back of the queue, unscored
//! - From the summary, retry just the wrong cards or restart the deck
//!
//! The session never holds cards, only ids; cards deleted mid-session are
//! pruned lazily when they come up, without scoring.

pub mod tags;

use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{Answer, Card, CardContent, Document, DocumentError, DocumentStore};

pub use tags::{TagFilter, TagMatch};

#[derive(Error, Debug)]
pub enum StudyError {
    #[error("Deck not found: {0}")]
    DeckNotFound(String),
    #[error("No cards to study")]
    NothingToStudy,
    #[error("No wrong answers to retry")]
    NothingToRetry,
    #[error("Session is still in progress")]
    SessionInProgress,
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Which cards of the deck a session draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyMode {
    #[default]
    All,
    Bookmarks,
    Wrongs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Study,
    Summary,
}

#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub deck_id: String,
    pub mode: StudyMode,
    /// Explicit card set; ids not belonging to the deck are dropped.
    /// `None` means "whatever the mode selects".
    pub card_ids: Option<Vec<String>>,
    pub tag_filter: Option<TagFilter>,
}

impl SessionRequest {
    pub fn all_cards(deck_id: impl Into<String>) -> SessionRequest {
        SessionRequest {
            deck_id: deck_id.into(),
            mode: StudyMode::All,
            card_ids: None,
            tag_filter: None,
        }
    }
}

/// One pass over a deck. Fields are private; every transition goes through
/// a method so the phase/counter invariants hold.
#[derive(Debug, Clone)]
pub struct StudySession {
    deck_id: String,
    mode: StudyMode,
    tag_filter: Option<TagFilter>,
    phase: Phase,
    queue: Vec<String>,
    index: usize,
    answered: bool,
    choice: Option<Answer>,
    last_is_correct: Option<bool>,
    wrong_ids: Vec<String>,
    correct_count: u32,
    wrong_count: u32,
}

pub(crate) fn eligible_ids(doc: &Document, deck_id: &str, mode: StudyMode) -> Vec<String> {
    doc.cards_in_deck(deck_id)
        .into_iter()
        .filter(|card| match mode {
            StudyMode::All => true,
            StudyMode::Bookmarks => card.bookmarked,
            StudyMode::Wrongs => doc.is_wrong(&card.id),
        })
        .map(|card| card.id.clone())
        .collect()
}

impl StudySession {
    /// Builds a session over a shuffled queue. Refuses to construct when the
    /// eligible set comes out empty, so callers always have something to
    /// show; an empty bookmark or wrong-answer selection is a normal state,
    /// not a crash.
    pub fn create(doc: &Document, req: SessionRequest) -> Result<StudySession, StudyError> {
        if doc.deck(&req.deck_id).is_none() {
            return Err(StudyError::DeckNotFound(req.deck_id));
        }
        let mut ids = match &req.card_ids {
            Some(explicit) => explicit
                .iter()
                .filter(|id| {
                    doc.card(id)
                        .map(|card| card.deck_id == req.deck_id)
                        .unwrap_or(false)
                })
                .cloned()
                .collect(),
            None => eligible_ids(doc, &req.deck_id, req.mode),
        };
        if let Some(filter) = &req.tag_filter {
            ids = tags::filter_card_ids(doc, &ids, filter);
        }
        if ids.is_empty() {
            return Err(StudyError::NothingToStudy);
        }
        ids.shuffle(&mut thread_rng());
        Ok(StudySession {
            deck_id: req.deck_id,
            mode: req.mode,
            tag_filter: req.tag_filter,
            phase: Phase::Study,
            queue: ids,
            index: 0,
            answered: false,
            choice: None,
            last_is_correct: None,
            wrong_ids: Vec::new(),
            correct_count: 0,
            wrong_count: 0,
        })
    }

    /// The card at the front of the queue. Entries whose card was deleted
    /// mid-session are dropped here without scoring; draining the queue
    /// this way settles the session into the summary phase.
    pub fn current_card<'d>(&mut self, doc: &'d Document) -> Option<&'d Card> {
        loop {
            if self.phase != Phase::Study {
                return None;
            }
            if self.index >= self.queue.len() {
                self.phase = Phase::Summary;
                self.reset_card_state();
                return None;
            }
            if let Some(card) = doc.card(&self.queue[self.index]) {
                return Some(card);
            }
            self.queue.remove(self.index);
            self.reset_card_state();
        }
    }

    /// Grades the current card and records the review. A no-op when the
    /// card was already answered or nothing is left to grade; grading twice
    /// must never double-count.
    pub fn grade(&mut self, store: &mut DocumentStore, choice: Answer) -> Result<(), StudyError> {
        if self.phase != Phase::Study || self.answered {
            return Ok(());
        }
        let graded = {
            let doc = store.document();
            self.current_card(doc).map(|card| {
                let correct = match &card.content {
                    CardContent::Grammar { answer, .. } => choice == *answer,
                    // Vocabulary is self-assessed: O = "knew it".
                    CardContent::Vocab { .. } => choice == Answer::O,
                };
                (card.id.clone(), correct)
            })
        };
        let (card_id, correct) = match graded {
            Some(graded) => graded,
            None => return Ok(()),
        };
        store.record_review(&card_id, correct)?;
        self.answered = true;
        self.choice = Some(choice);
        self.last_is_correct = Some(correct);
        if correct {
            self.correct_count += 1;
        } else {
            self.wrong_count += 1;
            self.wrong_ids.push(card_id);
        }
        Ok(())
    }

    /// Moves past an answered card. Does nothing before the card is graded;
    /// unanswered cards leave the front only via [`StudySession::skip`].
    pub fn advance(&mut self) {
        if self.phase != Phase::Study || !self.answered {
            return;
        }
        self.index += 1;
        self.reset_card_state();
        if self.index >= self.queue.len() {
            self.phase = Phase::Summary;
        }
    }

    /// After an answer this is just "next". Before an answer it defers the
    /// current card to the back of the queue, unscored; at the last
    /// position the card stays put.
    pub fn skip(&mut self) {
        if self.phase != Phase::Study {
            return;
        }
        if self.answered {
            self.advance();
            return;
        }
        if self.index >= self.queue.len() {
            return;
        }
        let id = self.queue.remove(self.index);
        self.queue.push(id);
        self.reset_card_state();
    }

    /// Starts a fresh pass over just the cards answered wrong, like a new
    /// session: counters and the wrong list reset.
    pub fn retry_wrong(&mut self) -> Result<(), StudyError> {
        if self.phase != Phase::Summary {
            return Err(StudyError::SessionInProgress);
        }
        if self.wrong_ids.is_empty() {
            return Err(StudyError::NothingToRetry);
        }
        let mut queue = std::mem::take(&mut self.wrong_ids);
        queue.shuffle(&mut thread_rng());
        self.queue = queue;
        self.index = 0;
        self.correct_count = 0;
        self.wrong_count = 0;
        self.reset_card_state();
        self.phase = Phase::Study;
        Ok(())
    }

    /// Rebuilds the session from its original mode and tag filter against
    /// the live document. On failure (the eligible set emptied out) the
    /// current session is left untouched.
    pub fn restart(&mut self, doc: &Document) -> Result<(), StudyError> {
        let fresh = StudySession::create(
            doc,
            SessionRequest {
                deck_id: self.deck_id.clone(),
                mode: self.mode,
                card_ids: None,
                tag_filter: self.tag_filter.clone(),
            },
        )?;
        *self = fresh;
        Ok(())
    }

    fn reset_card_state(&mut self) {
        self.answered = false;
        self.choice = None;
        self.last_is_correct = None;
    }

    // ========== Accessors ==========

    pub fn deck_id(&self) -> &str {
        &self.deck_id
    }

    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    pub fn tag_filter(&self) -> Option<&TagFilter> {
        self.tag_filter.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Summary
    }

    /// (zero-based position, queue length).
    pub fn progress(&self) -> (usize, usize) {
        (self.index, self.queue.len())
    }

    pub fn queue(&self) -> &[String] {
        &self.queue
    }

    pub fn answered(&self) -> bool {
        self.answered
    }

    pub fn choice(&self) -> Option<Answer> {
        self.choice
    }

    pub fn last_is_correct(&self) -> Option<bool> {
        self.last_is_correct
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    pub fn wrong_ids(&self) -> &[String] {
        &self.wrong_ids
    }

    /// Queue entries never graded. Skipped-then-deleted cards make this
    /// visible at the summary; the session reports graded counts only and
    /// does not resurface them.
    pub fn unanswered_count(&self) -> usize {
        self.queue
            .len()
            .saturating_sub((self.correct_count + self.wrong_count) as usize)
    }
}
