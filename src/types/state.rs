use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::{Parity, Tick};

/// Number of recent ticks discretized into a learner state.
pub const STATE_WINDOW: usize = 5;

/// Discretized view of the most recent ticks, used as the value-table key.
///
/// `parity_bits` is order-sensitive: ticks enter oldest to newest, shifting
/// left, with the bit set on an even digit. The newest tick is therefore the
/// least significant bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LearnerState {
    pub last_digit: u8,
    pub even_count: u8,
    pub parity_bits: u8,
}

impl LearnerState {
    /// Build the state from a tick history; requires at least
    /// `STATE_WINDOW` ticks.
    pub fn from_ticks(ticks: &[Tick]) -> Option<Self> {
        if ticks.len() < STATE_WINDOW {
            return None;
        }
        let window = &ticks[ticks.len() - STATE_WINDOW..];
        let mut even_count = 0u8;
        let mut parity_bits = 0u8;
        for tick in window {
            parity_bits <<= 1;
            if tick.is_even {
                parity_bits |= 1;
                even_count += 1;
            }
        }
        Some(Self {
            last_digit: window[STATE_WINDOW - 1].digit,
            even_count,
            parity_bits,
        })
    }

    /// Canonical storage-key encoding. Only the persistence boundary uses
    /// this; in memory the typed struct is the key.
    pub fn encode(&self) -> String {
        format!("{}:{}:{:05b}", self.last_digit, self.even_count, self.parity_bits)
    }

    pub fn decode(s: &str) -> Option<Self> {
        let mut parts = s.split(':');
        let last_digit = parts.next()?.parse().ok()?;
        let even_count = parts.next()?.parse().ok()?;
        let parity_bits = u8::from_str_radix(parts.next()?, 2).ok()?;
        if parts.next().is_some() || last_digit > 9 || even_count > STATE_WINDOW as u8 {
            return None;
        }
        Some(Self {
            last_digit,
            even_count,
            parity_bits,
        })
    }
}

impl fmt::Display for LearnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Estimated action values for one learner state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionValues {
    pub even: f64,
    pub odd: f64,
}

impl ActionValues {
    pub fn get(&self, action: Parity) -> f64 {
        match action {
            Parity::Even => self.even,
            Parity::Odd => self.odd,
        }
    }

    pub fn set(&mut self, action: Parity, value: f64) {
        match action {
            Parity::Even => self.even = value,
            Parity::Odd => self.odd = value,
        }
    }

    pub fn max(&self) -> f64 {
        self.even.max(self.odd)
    }

    /// Greedy action; ties resolve toward EVEN.
    pub fn best_action(&self) -> Parity {
        if self.odd > self.even {
            Parity::Odd
        } else {
            Parity::Even
        }
    }
}

/// The learner's persisted value table. Rows are lazily created and never
/// deleted by the core.
pub type ValueTable = HashMap<LearnerState, ActionValues>;
