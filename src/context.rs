//! Execution context: the virtual clock and the seeded random source

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

const ID_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ID_LENGTH: usize = 8;

/// `time` plus `ms` milliseconds, saturating at the latest representable instant
pub fn later_by_ms(time: DateTime<Utc>, ms: u64) -> DateTime<Utc> {
    let delta = Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX));
    time.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Virtual time. Only moves when the event loop advances it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeterministicTime {
    current_time: DateTime<Utc>,
}

impl DeterministicTime {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self { current_time: time }
    }

    pub fn current(&self) -> DateTime<Utc> {
        self.current_time
    }

    /// Calendar day of the current instant
    pub fn today(&self) -> NaiveDate {
        self.current_time.date_naive()
    }

    /// Move forward to `time`. Moving backwards is ignored.
    pub fn advance_to(&mut self, time: DateTime<Utc>) {
        if time > self.current_time {
            self.current_time = time;
        }
    }

    pub fn advance_by_ms(&mut self, ms: u64) {
        self.current_time = later_by_ms(self.current_time, ms);
    }
}

/// Seeded random number generator for ids and delay jitter
#[derive(Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_u64(&mut self) -> u64 {
        self.rng.gen()
    }

    /// Uniform value in `[0, bound)`; zero when `bound` is zero
    pub fn jitter_ms(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }

    /// Uniform value in `[min, max]`
    pub fn between_ms(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Eight uppercase base-36 characters, e.g. `K3Z09QAB`
    pub fn next_id(&mut self) -> String {
        (0..ID_LENGTH)
            .map(|_| ID_ALPHABET[self.rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect()
    }
}

impl Clone for SeededRandom {
    fn clone(&self) -> Self {
        // Restart from the seed so clones replay the same sequence
        Self::new(self.seed)
    }
}

/// Clock and randomness shared by every workflow
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    deterministic_time: DeterministicTime,
    seeded_random: SeededRandom,
}

impl ExecutionContext {
    pub fn new(time: DateTime<Utc>, random_seed: u64) -> Self {
        Self {
            deterministic_time: DeterministicTime::new(time),
            seeded_random: SeededRandom::new(random_seed),
        }
    }

    pub fn builder() -> ExecutionContextBuilder {
        ExecutionContextBuilder::new()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.deterministic_time.current()
    }

    pub fn today(&self) -> NaiveDate {
        self.deterministic_time.today()
    }

    pub fn clock_mut(&mut self) -> &mut DeterministicTime {
        &mut self.deterministic_time
    }

    pub fn random(&mut self) -> &mut SeededRandom {
        &mut self.seeded_random
    }
}

/// Builder for constructing execution contexts
pub struct ExecutionContextBuilder {
    time: Option<DateTime<Utc>>,
    random_seed: Option<u64>,
}

impl ExecutionContextBuilder {
    pub fn new() -> Self {
        Self {
            time: None,
            random_seed: None,
        }
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Falls back to the wall clock and seed 0
    pub fn build(self) -> ExecutionContext {
        let time = self.time.unwrap_or_else(Utc::now);
        let random_seed = self.random_seed.unwrap_or(0);
        ExecutionContext::new(time, random_seed)
    }
}

impl Default for ExecutionContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
