//! Delimited table imports, built for text pasted straight out of a
//! spreadsheet. Tab-separated wins when a tab is present, comma-separated
//! (quote-aware) is the fallback, and plain `term - meaning` lines are the
//! last resort. The first row is treated as a header when at least two of
//! its cells look like known column names; column roles are matched against
//! synonym tables (English and Korean) so header wording is data, not code.

use std::collections::HashMap;

use csv::ReaderBuilder;

use super::{CardBatch, ImportError, RowIssue};
use crate::document::{Answer, CardContent, DeckKind, NewCard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Role {
    Prompt,
    Answer,
    Explanation,
    Meaning,
    Mnemonic,
    Example,
    Tags,
}

/// One importable column: the header spellings that select it and the
/// position it defaults to when the table has no header row.
struct RoleSpec {
    role: Role,
    synonyms: &'static [&'static str],
    fallback_col: usize,
}

const VOCAB_ROLES: &[RoleSpec] = &[
    RoleSpec {
        role: Role::Prompt,
        synonyms: &["word", "term", "voca", "prompt", "단어", "어휘"],
        fallback_col: 0,
    },
    RoleSpec {
        role: Role::Meaning,
        synonyms: &["meaning", "definition", "뜻", "의미"],
        fallback_col: 1,
    },
    RoleSpec {
        role: Role::Mnemonic,
        synonyms: &["mnemonic", "assoc", "association", "연상", "암기법"],
        fallback_col: 2,
    },
    RoleSpec {
        role: Role::Example,
        synonyms: &["example", "sentence", "예문", "예시"],
        fallback_col: 3,
    },
    RoleSpec {
        role: Role::Tags,
        synonyms: &["tags", "tag", "태그"],
        fallback_col: 4,
    },
];

const GRAMMAR_ROLES: &[RoleSpec] = &[
    RoleSpec {
        role: Role::Prompt,
        synonyms: &["prompt", "sentence", "question", "문장", "문제"],
        fallback_col: 0,
    },
    RoleSpec {
        role: Role::Answer,
        synonyms: &["answer", "o/x", "ox", "정답", "답"],
        fallback_col: 1,
    },
    RoleSpec {
        role: Role::Explanation,
        synonyms: &["explanation", "해설", "설명"],
        fallback_col: 2,
    },
    RoleSpec {
        role: Role::Tags,
        synonyms: &["tags", "tag", "태그"],
        fallback_col: 3,
    },
];

/// Splits pasted text into cell rows. Delimiter sniffing only; no card
/// semantics here.
pub fn parse_rows(text: &str) -> Result<Vec<Vec<String>>, ImportError> {
    let delimiter = if text.contains('\t') {
        Some(b'\t')
    } else if text.contains(',') {
        Some(b',')
    } else {
        None
    };
    let Some(delimiter) = delimiter else {
        // Manual vocabulary lists are often just "term - meaning" lines.
        return Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once(" - ") {
                Some((term, meaning)) => {
                    vec![term.trim().to_string(), meaning.trim().to_string()]
                }
                None => vec![line.to_string()],
            })
            .collect());
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        // Spreadsheet TSV does not quote; literal quotes must survive.
        .quoting(delimiter != b'\t')
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Column assignment for a table: either read off a recognized header row
/// or the fixed fallback positions.
fn detect_columns(specs: &[RoleSpec], first_row: &[String]) -> (HashMap<Role, usize>, bool) {
    let mut columns = HashMap::new();
    let mut matched_cells = 0;
    for (col, cell) in first_row.iter().enumerate() {
        let cell = cell.trim().to_lowercase();
        if cell.is_empty() {
            continue;
        }
        if let Some(spec) = specs
            .iter()
            .find(|spec| spec.synonyms.iter().any(|syn| cell.contains(syn)))
        {
            matched_cells += 1;
            columns.entry(spec.role).or_insert(col);
        }
    }
    if matched_cells >= 2 {
        (columns, true)
    } else {
        (
            specs.iter().map(|spec| (spec.role, spec.fallback_col)).collect(),
            false,
        )
    }
}

/// Parses pasted table text into a batch for a deck of the given kind.
/// Issue numbers are 1-based over the parsed rows, header included.
pub fn parse_table(text: &str, kind: DeckKind) -> Result<CardBatch, ImportError> {
    let rows = parse_rows(text)?;
    let mut batch = CardBatch::default();
    let Some(first_row) = rows.first() else {
        return Ok(batch);
    };
    let specs = match kind {
        DeckKind::Grammar => GRAMMAR_ROLES,
        DeckKind::Vocab => VOCAB_ROLES,
    };
    let (columns, has_header) = detect_columns(specs, first_row);

    for (i, row) in rows.iter().enumerate().skip(usize::from(has_header)) {
        let row_no = i + 1;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let cell = |role: Role| -> &str {
            columns
                .get(&role)
                .and_then(|&col| row.get(col))
                .map(|s| s.trim())
                .unwrap_or("")
        };
        let prompt = cell(Role::Prompt);
        if prompt.is_empty() {
            batch.issues.push(RowIssue::new(row_no, "empty prompt"));
            continue;
        }
        let content = match kind {
            DeckKind::Grammar => match Answer::normalize(cell(Role::Answer)) {
                Some(answer) => CardContent::Grammar {
                    answer,
                    explanation: cell(Role::Explanation).to_string(),
                },
                None => {
                    batch.issues.push(RowIssue::new(row_no, "answer is not O/X"));
                    continue;
                }
            },
            DeckKind::Vocab => CardContent::Vocab {
                meaning: cell(Role::Meaning).to_string(),
                mnemonic: cell(Role::Mnemonic).to_string(),
                example: cell(Role::Example).to_string(),
            },
        };
        batch.items.push(NewCard {
            prompt: prompt.to_string(),
            tags: cell(Role::Tags)
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
            content,
        });
    }
    Ok(batch)
}
