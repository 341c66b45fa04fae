//! Cleanup steps for values extracted from pre-header text
//!
//! A raw extracted substring passes through an ordered list of steps
//! (split, pick, trim). Steps may turn the value into a sequence of parts;
//! whatever is left at the end is collapsed back to a single string.

use serde::{Deserialize, Serialize};

use crate::error::{ExpressionError, ExpressionResult};

/// All available cleanup steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CleanupStep {
    /// Split the value into parts
    Split {
        #[serde(default = "default_delimiter")]
        delimiter: String,
        #[serde(default)]
        mode: SplitMode,
    },

    /// Select the 1-indexed `part` of a split value
    Pick {
        #[serde(default)]
        part: usize,
    },

    /// Strip surrounding whitespace from the value or each part
    Trim,

    /// Step type this engine does not know; ignored
    #[serde(other)]
    Unknown,
}

/// Where `split` cuts the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Only at the first occurrence, producing two parts
    First,
    /// At every occurrence
    #[default]
    All,
}

fn default_delimiter() -> String {
    " ".to_string()
}

/// Value flowing through the cleanup steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Scalar(String),
    Parts(Vec<String>),
}

impl Extracted {
    /// Collapse to a string: first part of a sequence, or empty.
    pub fn into_string(self) -> String {
        match self {
            Extracted::Scalar(s) => s,
            Extracted::Parts(parts) => parts.into_iter().next().unwrap_or_default(),
        }
    }
}

impl CleanupStep {
    /// Apply this step to a value
    pub fn apply(&self, value: Extracted) -> ExpressionResult<Extracted> {
        match self {
            CleanupStep::Split { delimiter, mode } => Self::apply_split(value, delimiter, *mode),
            CleanupStep::Pick { part } => Ok(Self::apply_pick(value, *part)),
            CleanupStep::Trim => Ok(Self::apply_trim(value)),
            CleanupStep::Unknown => Ok(value),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CleanupStep::Split { .. } => "split",
            CleanupStep::Pick { .. } => "pick",
            CleanupStep::Trim => "trim",
            CleanupStep::Unknown => "unknown",
        }
    }

    fn apply_split(value: Extracted, delimiter: &str, mode: SplitMode) -> ExpressionResult<Extracted> {
        if delimiter.is_empty() {
            return Err(ExpressionError::Evaluation("split delimiter is empty".to_string()));
        }
        let text = match value {
            Extracted::Scalar(s) => s,
            Extracted::Parts(_) => {
                return Err(ExpressionError::Evaluation(
                    "cannot split a value that is already split".to_string(),
                ))
            }
        };

        match mode {
            SplitMode::First => match text.split_once(delimiter) {
                Some((left, right)) => Ok(Extracted::Parts(vec![
                    left.trim().to_string(),
                    right.trim().to_string(),
                ])),
                None => Ok(Extracted::Scalar(text)),
            },
            SplitMode::All => Ok(Extracted::Parts(
                text.split(delimiter).map(|p| p.trim().to_string()).collect(),
            )),
        }
    }

    fn apply_pick(value: Extracted, part: usize) -> Extracted {
        match value {
            Extracted::Parts(parts) => {
                let picked = part
                    .checked_sub(1)
                    .and_then(|idx| parts.get(idx))
                    .cloned()
                    .unwrap_or_default();
                Extracted::Scalar(picked)
            }
            scalar => scalar,
        }
    }

    fn apply_trim(value: Extracted) -> Extracted {
        match value {
            Extracted::Scalar(s) => Extracted::Scalar(s.trim().to_string()),
            Extracted::Parts(parts) => {
                Extracted::Parts(parts.iter().map(|p| p.trim().to_string()).collect())
            }
        }
    }
}

/// Run every step in order and collapse the result to a string.
pub fn run_cleanup(raw: &str, steps: &[CleanupStep]) -> ExpressionResult<String> {
    let mut value = Extracted::Scalar(raw.to_string());
    for step in steps {
        value = step.apply(value)?;
    }
    Ok(value.into_string())
}
