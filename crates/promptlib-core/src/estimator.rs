//! Heuristic token estimation.

use promptlib_protocol::{Confidence, TokenEstimate};
use regex::RegexSet;
use std::sync::LazyLock;

/// Words per token for prose.
const TOKENS_PER_WORD: f64 = 0.75;
/// Tokens per UTF-16 code unit.
const TOKENS_PER_CHAR: f64 = 0.25;
/// Code tokenizes denser than prose.
const CODE_MULTIPLIER: f64 = 1.3;
/// Upper bounds below this are `high` confidence.
const HIGH_CONFIDENCE_BELOW: u64 = 1000;
/// Upper bounds up to this are `medium` confidence.
const MEDIUM_CONFIDENCE_UP_TO: u64 = 5000;

static CODE_SIGNALS: LazyLock<Option<RegexSet>> = LazyLock::new(|| {
    RegexSet::new([
        r"```",
        r"\{\s*\}",
        r";\s*\n",
        r"function\b|const\b|let\b|var\b",
        r"class\b|def\b|=>",
    ])
    .ok()
});

/// Estimate the token count range of `text`.
///
/// The lower bound counts whitespace separated words, the upper bound counts
/// UTF-16 code units; both are scaled up for code. Confidence is derived from
/// the upper bound.
pub fn estimate_tokens(text: &str, is_code: bool) -> TokenEstimate {
    let words = text.split_whitespace().count() as f64;
    let chars = utf16_len(text) as f64;

    let mut min = words * TOKENS_PER_WORD;
    let mut max = chars * TOKENS_PER_CHAR;
    if is_code {
        min *= CODE_MULTIPLIER;
        max *= CODE_MULTIPLIER;
    }

    let min = round_half_up(min);
    let max = round_half_up(max).max(min);
    TokenEstimate {
        min,
        max,
        confidence: confidence_for(max),
    }
}

/// Guess whether `text` is source code.
pub fn looks_like_code(text: &str) -> bool {
    CODE_SIGNALS
        .as_ref()
        .is_some_and(|signals| signals.is_match(text))
}

/// Length in UTF-16 code units.
pub(crate) fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

fn confidence_for(max: u64) -> Confidence {
    if max < HIGH_CONFIDENCE_BELOW {
        Confidence::High
    } else if max <= MEDIUM_CONFIDENCE_UP_TO {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn round_half_up(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        (value + 0.5).floor() as u64
    } else {
        0
    }
}
