//! Bulk-paste line format: one card per line, fields separated by a tab
//! when the line has one, else by `|`. Grammar lines are
//! `sentence | O/X | explanation?`; vocabulary lines are
//! `word | meaning | mnemonic? | example?`. Bad lines become row issues and
//! the rest of the paste still goes through.

use super::{CardBatch, RowIssue};
use crate::document::{Answer, CardContent, DeckKind, NewCard};

/// Parses pasted lines into a batch for a deck of the given kind. Blank
/// lines are skipped; issue numbers still count them so they match the
/// pasted text.
pub fn parse_lines(text: &str, kind: DeckKind) -> CardBatch {
    let mut batch = CardBatch::default();
    for (i, line) in text.lines().enumerate() {
        let row_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let sep = if line.contains('\t') { '\t' } else { '|' };
        match parse_line(line, sep, kind) {
            Ok(item) => batch.items.push(item),
            Err(reason) => batch.issues.push(RowIssue::new(row_no, reason)),
        }
    }
    batch
}

fn parse_line(line: &str, sep: char, kind: DeckKind) -> Result<NewCard, String> {
    // splitn folds surplus separators into the last field, so a stray `|`
    // inside an explanation or example survives verbatim.
    let fields: Vec<&str> = match kind {
        DeckKind::Grammar => line.splitn(3, sep).map(str::trim).collect(),
        DeckKind::Vocab => line.splitn(4, sep).map(str::trim).collect(),
    };
    let prompt = fields[0];
    if prompt.is_empty() {
        return Err("empty prompt".to_string());
    }
    let content = match kind {
        DeckKind::Grammar => {
            let token = fields.get(1).copied().unwrap_or("");
            if token.is_empty() {
                return Err("missing answer".to_string());
            }
            let answer =
                Answer::normalize(token).ok_or_else(|| "answer is not O/X".to_string())?;
            CardContent::Grammar {
                answer,
                explanation: fields.get(2).copied().unwrap_or("").to_string(),
            }
        }
        DeckKind::Vocab => {
            let meaning = fields.get(1).copied().unwrap_or("");
            if meaning.is_empty() {
                return Err("missing meaning".to_string());
            }
            CardContent::Vocab {
                meaning: meaning.to_string(),
                mnemonic: fields.get(2).copied().unwrap_or("").to_string(),
                example: fields.get(3).copied().unwrap_or("").to_string(),
            }
        }
    };
    Ok(NewCard {
        prompt: prompt.to_string(),
        tags: Vec::new(),
        content,
    })
}
