use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty level a learner can assign to a word.
///
/// The cycling order is fixed: easy → medium → hard → easy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Returns the next level in the cycle.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Easy => Self::Medium,
            Self::Medium => Self::Hard,
            Self::Hard => Self::Easy,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for parsing a difficulty level from string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown difficulty level: {0}")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(ParseDifficultyError(other.to_string())),
        }
    }
}

//
// ─── WORD ──────────────────────────────────────────────────────────────────────
//

/// A single vocabulary word as supplied by the externally owned word lists.
///
/// The progress layer never mutates words; it only derives keys and the
/// default difficulty from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub english: String,
    pub polish: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

impl Word {
    /// Stable key identifying this word for bookmarks and difficulty
    /// overrides: the explicit id when present, else both display fields.
    #[must_use]
    pub fn key(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}-{}", self.english, self.polish),
        }
    }
}

//
// ─── DIFFICULTY OVERRIDES ──────────────────────────────────────────────────────
//

/// Per-word difficulty overrides, keyed by word key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifficultyMap(BTreeMap<String, Difficulty>);

impl DifficultyMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective level for a word: the stored override, else the word's own
    /// difficulty field, else medium.
    #[must_use]
    pub fn level_for(&self, word: &Word) -> Difficulty {
        self.0
            .get(&word.key())
            .copied()
            .or(word.difficulty)
            .unwrap_or_default()
    }

    /// Advances the word one step through the cycle and stores the result.
    pub fn toggle(&mut self, word: &Word) -> Difficulty {
        let next = self.level_for(word).next();
        self.0.insert(word.key(), next);
        next
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Difficulty> {
        self.0.get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
