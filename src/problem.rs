use std::collections::VecDeque;
use std::fmt;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::{operation::Operation, settings::Settings};

pub const NO_OPERATIONS_TEXT: &str = "No operations enabled. Please restart.";

/// One question shown to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    Arithmetic {
        operation: Operation,
        left: u128,
        right: u128,
        answer: u128,
    },
    /// Fallback when settings carry no enabled operation
    NoOperations,
}

impl Problem {
    pub fn question_text(&self) -> String {
        self.to_string()
    }

    pub fn expected_answer(&self) -> Option<u128> {
        match self {
            Problem::Arithmetic { answer, .. } => Some(*answer),
            Problem::NoOperations => None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            Problem::Arithmetic { operation, .. } => Some(*operation),
            Problem::NoOperations => None,
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Arithmetic {
                operation,
                left,
                right,
                ..
            } => write!(f, "{} {} {}", left, operation.symbol(), right),
            Problem::NoOperations => f.write_str(NO_OPERATIONS_TEXT),
        }
    }
}

/// Source of the random choices made while generating a problem
pub trait Draws {
    /// Index in `0..count`; `count` is never zero
    fn pick(&mut self, count: usize) -> usize;
    /// Value in `min..=max`
    fn operand(&mut self, min: u64, max: u64) -> u64;
}

/// Uniform draws from a seedable PRNG
#[derive(Debug, Clone)]
pub struct RandomDraws {
    rng: StdRng,
}

impl RandomDraws {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDraws {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Draws for RandomDraws {
    fn pick(&mut self, count: usize) -> usize {
        self.rng.gen_range(0..count)
    }

    fn operand(&mut self, min: u64, max: u64) -> u64 {
        self.rng.gen_range(min..=max)
    }
}

/// Replays scripted picks and operands. Once a script runs dry it falls back
/// to the lowest legal value.
#[derive(Debug, Clone, Default)]
pub struct SequenceDraws {
    picks: VecDeque<usize>,
    operands: VecDeque<u64>,
}

impl SequenceDraws {
    pub fn new<P, O>(picks: P, operands: O) -> Self
    where
        P: IntoIterator<Item = usize>,
        O: IntoIterator<Item = u64>,
    {
        Self {
            picks: picks.into_iter().collect(),
            operands: operands.into_iter().collect(),
        }
    }
}

impl Draws for SequenceDraws {
    fn pick(&mut self, count: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % count
    }

    fn operand(&mut self, min: u64, max: u64) -> u64 {
        self.operands.pop_front().unwrap_or(min).clamp(min, max)
    }
}

/// Generate one problem from the enabled operations in `settings`
pub fn generate(settings: &Settings, draws: &mut dyn Draws) -> Problem {
    let operations = settings.enabled_operations();
    if operations.is_empty() {
        return Problem::NoOperations;
    }

    let operation = operations[draws.pick(operations.len())];
    let range = settings.operation(operation);
    let a = u128::from(draws.operand(range.min, range.max));
    let b = u128::from(draws.operand(range.min, range.max));

    let problem = match operation {
        Operation::Addition => Problem::Arithmetic {
            operation,
            left: a,
            right: b,
            answer: a + b,
        },
        Operation::Subtraction => {
            let (left, right) = if a < b { (b, a) } else { (a, b) };
            Problem::Arithmetic {
                operation,
                left,
                right,
                answer: left - right,
            }
        }
        Operation::Multiplication => Problem::Arithmetic {
            operation,
            left: a,
            right: b,
            answer: a * b,
        },
        Operation::Division => Problem::Arithmetic {
            operation,
            left: a * b,
            right: b,
            answer: a,
        },
    };

    debug!(question = %problem, "generated problem");
    problem
}
