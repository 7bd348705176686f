use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokens accepted as a positive answer, compared after trim + uppercase.
const TRUTHY_TOKENS: &[&str] = &["O", "○", "T", "TRUE", "1", "YES", "Y", "맞", "맞음", "정답"];
/// Tokens accepted as a negative answer.
const FALSY_TOKENS: &[&str] = &["X", "×", "F", "FALSE", "0", "NO", "N", "틀", "틀림", "오답"];

/// Canonical binary answer of a grammar card.
///
/// Vocabulary study reuses the same pair for self-assessment: `O` means
/// "knew it", `X` means "didn't".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    O,
    X,
}

impl Answer {
    /// Maps free-form user or import input onto `O`/`X`.
    ///
    /// Trim + uppercase, then token tables (Korean study shorthand
    /// included), then a leading-letter rule so "ok"/"x!" still land.
    /// Unrecognized input is `None`; callers treat that as a recoverable
    /// validation failure, never a panic.
    pub fn normalize(input: &str) -> Option<Answer> {
        let token = input.trim().to_uppercase();
        if token.is_empty() {
            return None;
        }
        if TRUTHY_TOKENS.contains(&token.as_str()) {
            return Some(Answer::O);
        }
        if FALSY_TOKENS.contains(&token.as_str()) {
            return Some(Answer::X);
        }
        if token.starts_with('O') {
            return Some(Answer::O);
        }
        if token.starts_with('X') {
            return Some(Answer::X);
        }
        None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Answer::O => "O",
            Answer::X => "X",
        }
    }

    /// The other answer. Handy for building wrong choices in tests and
    /// answer-reveal UIs.
    pub fn opposite(&self) -> Answer {
        match self {
            Answer::O => Answer::X,
            Answer::X => Answer::O,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_truthy_tokens() {
        for token in ["O", "o", "○", "T", "true", "TRUE", "1", "yes", "Y", "맞", "맞음", "정답"] {
            assert_eq!(Answer::normalize(token), Some(Answer::O), "token: {token}");
        }
    }

    #[test]
    fn test_normalize_falsy_tokens() {
        for token in ["X", "x", "×", "F", "false", "0", "no", "N", "틀", "틀림", "오답"] {
            assert_eq!(Answer::normalize(token), Some(Answer::X), "token: {token}");
        }
    }

    #[test]
    fn test_normalize_prefix_rule() {
        assert_eq!(Answer::normalize("ok"), Some(Answer::O));
        assert_eq!(Answer::normalize("  oh?"), Some(Answer::O));
        assert_eq!(Answer::normalize("x!"), Some(Answer::X));
    }

    #[test]
    fn test_normalize_rejects_unrecognized() {
        assert_eq!(Answer::normalize("maybe"), None);
        assert_eq!(Answer::normalize("2"), None);
        assert_eq!(Answer::normalize(""), None);
        assert_eq!(Answer::normalize("   "), None);
    }

    #[test]
    fn test_normalize_is_idempotent_over_outputs() {
        for answer in [Answer::O, Answer::X] {
            assert_eq!(Answer::normalize(answer.as_str()), Some(answer));
        }
    }

    #[test]
    fn test_serde_round_trip() {
        assert_eq!(serde_json::to_string(&Answer::O).unwrap(), "\"O\"");
        assert_eq!(serde_json::from_str::<Answer>("\"X\"").unwrap(), Answer::X);
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Answer::O.opposite(), Answer::X);
        assert_eq!(Answer::X.opposite(), Answer::O);
    }
}
