//! Window length parsing: `<integer><unit>` with unit one of `s`, `m`, `h`, `d`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use gatekeeper_core::error::AppError;

/// A validated, non-zero window length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowSize {
    amount: u64,
    unit: char,
}

impl WindowSize {
    /// Parse a window such as `"60s"`, `"1m"`, `"1h"`, or `"1d"`.
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let trimmed = input.trim();
        let Some(unit) = trimmed.chars().last() else {
            return Err(AppError::validation("Invalid window format: empty"));
        };
        if !matches!(unit, 's' | 'm' | 'h' | 'd') {
            return Err(AppError::validation(format!(
                "Invalid window unit in '{input}'. Use s, m, h, or d"
            )));
        }

        let digits = &trimmed[..trimmed.len() - unit.len_utf8()];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::validation(format!(
                "Invalid window amount in '{input}'"
            )));
        }
        let amount: u64 = digits
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid window amount in '{input}'")))?;
        if amount == 0 {
            return Err(AppError::validation(format!(
                "Window must be longer than zero: '{input}'"
            )));
        }

        let window = Self { amount, unit };
        window
            .amount
            .checked_mul(window.unit_millis())
            .filter(|ms| *ms <= i64::MAX as u64)
            .ok_or_else(|| AppError::validation(format!("Window too large: '{input}'")))?;
        Ok(window)
    }

    fn unit_millis(&self) -> u64 {
        match self.unit {
            's' => 1_000,
            'm' => 60_000,
            'h' => 3_600_000,
            _ => 86_400_000,
        }
    }

    /// Window length in milliseconds.
    pub fn as_millis(&self) -> i64 {
        (self.amount * self.unit_millis()) as i64
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.amount * self.unit_millis())
    }
}

impl FromStr for WindowSize {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit)
    }
}
