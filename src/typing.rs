//! Per-character typing delays.
//!
//! Short values are typed at a readable pace while long free-text values
//! (paragraphs) speed up so a whole form never takes minutes to fill.

use std::time::Duration;

/// Total typing time aimed for on an average-length field, in milliseconds.
pub const NOMINAL_FILL_MS: f64 = 400.0;
/// Upper bound for the target typing time of very long values, in milliseconds.
pub const MAX_FILL_MS: f64 = 1500.0;
/// Fastest allowed delay between two characters, in milliseconds.
pub const MIN_CHAR_DELAY_MS: f64 = 10.0;
/// Slowest allowed delay between two characters, in milliseconds.
pub const MAX_CHAR_DELAY_MS: f64 = 100.0;

/// How a single free-text value gets typed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypingPlan {
    chars: usize,
    per_char: Duration,
}

impl TypingPlan {
    /// Plan the typing of `value`, counted in characters rather than bytes.
    pub fn for_text(value: &str) -> Self {
        Self::for_len(value.chars().count())
    }

    /// Plan the typing of a value that is `chars` characters long.
    pub fn for_len(chars: usize) -> Self {
        if chars == 0 {
            return Self {
                chars,
                per_char: Duration::ZERO,
            };
        }

        let len = chars as f64;
        let mut target = NOMINAL_FILL_MS;
        if len > NOMINAL_FILL_MS / MIN_CHAR_DELAY_MS {
            target = MAX_FILL_MS.min(len * MIN_CHAR_DELAY_MS);
        }
        let per_char_ms = (target / len).clamp(MIN_CHAR_DELAY_MS, MAX_CHAR_DELAY_MS);

        Self {
            chars,
            per_char: Duration::from_micros((per_char_ms * 1000.0).round() as u64),
        }
    }

    pub fn chars(&self) -> usize {
        self.chars
    }

    /// Delay inserted after each typed character.
    pub fn per_char(&self) -> Duration {
        self.per_char
    }

    /// Time spent typing the whole value.
    pub fn total(&self) -> Duration {
        let nanos = self.per_char.as_nanos() * self.chars as u128;
        Duration::new(
            (nanos / 1_000_000_000) as u64,
            (nanos % 1_000_000_000) as u32,
        )
    }
}
