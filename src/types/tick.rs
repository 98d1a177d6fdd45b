#![allow(dead_code)]
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of_digit(digit: u8) -> Self {
        if digit % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Parity::Even => "EVEN",
            Parity::Odd => "ODD",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EVEN" => Some(Parity::Even),
            "ODD" => Some(Parity::Odd),
            _ => None,
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One market price update with its derived terminal digit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    pub digit: u8,
    pub is_even: bool,
    pub quote: Decimal,
    pub timestamp: i64,
}

impl Tick {
    pub fn new(digit: u8, quote: Decimal, timestamp: i64) -> Self {
        Self {
            digit,
            is_even: digit % 2 == 0,
            quote,
            timestamp,
        }
    }

    /// Build a tick from a raw quote, taking the terminal digit of the quote
    /// rendered at `pip_digits` decimal places (how the upstream feed formats
    /// prices before extracting the last digit).
    pub fn from_quote(quote: Decimal, pip_digits: u32, timestamp: i64) -> Self {
        use rust_decimal::prelude::ToPrimitive;
        let scaled = (quote.round_dp(pip_digits) * Decimal::from(10u64.pow(pip_digits))).abs();
        let digit = (scaled % Decimal::from(10)).to_u32().unwrap_or(0) as u8;
        Self::new(digit, quote, timestamp)
    }

    pub fn parity(&self) -> Parity {
        Parity::of_digit(self.digit)
    }
}

/// Bounded, append-only view of the most recent ticks.
#[derive(Debug, Clone, Default)]
pub struct TickBuffer {
    pub ticks: Vec<Tick>,
    pub max_size: usize,
}

impl TickBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            ticks: Vec::with_capacity(max_size),
            max_size,
        }
    }

    pub fn push(&mut self, tick: Tick) {
        if self.ticks.len() >= self.max_size {
            self.ticks.remove(0);
        }
        self.ticks.push(tick);
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn last(&self) -> Option<&Tick> {
        self.ticks.last()
    }

    pub fn last_n(&self, n: usize) -> &[Tick] {
        let len = self.ticks.len();
        if n >= len {
            &self.ticks[..]
        } else {
            &self.ticks[len - n..]
        }
    }

    pub fn digits(&self) -> Vec<u8> {
        self.ticks.iter().map(|t| t.digit).collect()
    }

    pub fn parities(&self) -> Vec<Parity> {
        self.ticks.iter().map(|t| t.parity()).collect()
    }
}
