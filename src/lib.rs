//! Cardbox Core — document store, study session engine, and import/export
//! for a two-kind (grammar O/X and vocabulary) flashcard app.

pub mod dedup;
pub mod document;
pub mod import_export;
pub mod study;

pub use document::{
    Answer, Card, CardContent, CardPatch, CardStat, CreateDeckRequest, Deck, DeckKind,
    DeckSummary, Document, DocumentError, DocumentStore, NewCard, UpdateDeckRequest,
};
pub use import_export::{CardBatch, ImportError, ImportOptions, ImportReport, RowIssue};
pub use study::{
    Phase, SessionRequest, StudyError, StudyMode, StudySession, TagFilter, TagMatch,
};
