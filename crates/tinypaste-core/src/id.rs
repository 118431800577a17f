//! Paste identifier generation.
//!
//! The store never talks to a random generator directly; it is handed an
//! [`IdSource`] so tests can substitute scripted sequences.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces candidate paste identifiers.
///
/// Implementations must be safe to call from many request tasks at once.
/// Uniqueness is not their concern: the store rejects candidates that are
/// already taken and asks again.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Uniform random identifiers of a fixed length over a fixed alphabet.
pub struct RandomIdGenerator {
    alphabet: Vec<char>,
    length: usize,
    rng: Mutex<StdRng>,
}

impl RandomIdGenerator {
    /// Generator seeded from OS entropy, so separate runs diverge.
    ///
    /// # Panics
    ///
    /// Panics if `alphabet` is empty; `PasteConfig::validate` rules that out.
    pub fn new(alphabet: &str, length: usize) -> Self {
        Self::with_rng(alphabet, length, StdRng::from_entropy())
    }

    /// Deterministic generator for reproducible tests.
    pub fn with_seed(alphabet: &str, length: usize, seed: u64) -> Self {
        Self::with_rng(alphabet, length, StdRng::seed_from_u64(seed))
    }

    fn with_rng(alphabet: &str, length: usize, rng: StdRng) -> Self {
        assert!(!alphabet.is_empty(), "identifier alphabet must not be empty");
        Self {
            alphabet: alphabet.chars().collect(),
            length,
            rng: Mutex::new(rng),
        }
    }
}

impl IdSource for RandomIdGenerator {
    fn next_id(&self) -> String {
        // Poisoning leaves the generator state intact.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        (0..self.length)
            .map(|_| self.alphabet[rng.gen_range(0..self.alphabet.len())])
            .collect()
    }
}

/// True when `name` is non-empty and made only of `[A-Za-z0-9_-]`.
///
/// Every identifier the store can hand out satisfies this, so anything
/// else can be rejected before it reaches the filesystem.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
