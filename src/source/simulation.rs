//! Synthetic, unbounded message generator

use crate::error::Result;
use crate::etl::Source;
use crate::message::Message;

use chrono::{DateTime, FixedOffset, Local, SubsecRound};
use rand::Rng;
use rand::rngs::ThreadRng;
use std::fmt;

/// Source that makes up a fresh random message on every read
///
/// - key: one uppercase letter followed by three digits, e.g. `Q042`
/// - value: uniform in `[0, 100]`, rounded to one decimal place
/// - timestamp: the current time at the local offset, to the microsecond
///
/// The source never runs dry and never fails.
pub struct SimulationSource<R = ThreadRng> {
    name: String,
    rng: R,
}

impl SimulationSource {
    /// Create a simulation source backed by the thread-local generator
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_rng(name, rand::rng())
    }
}

impl<R: Rng> SimulationSource<R> {
    /// Create a simulation source driven by the given generator
    ///
    /// Pass a seeded generator for reproducible keys and values.
    pub fn with_rng(name: impl Into<String>, rng: R) -> Self {
        Self {
            name: name.into(),
            rng,
        }
    }

    fn generate_key(&mut self) -> String {
        let letter = self.rng.random_range(b'A'..=b'Z') as char;
        let digits: u16 = self.rng.random_range(0..1000);
        format!("{}{:03}", letter, digits)
    }

    fn generate_value(&mut self) -> f64 {
        let raw: f64 = self.rng.random_range(0.0..=100.0);
        (raw * 10.0).round() / 10.0
    }

    fn generate_timestamp(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset().trunc_subsecs(6)
    }
}

impl<R> fmt::Display for SimulationSource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimulationSource({})", self.name)
    }
}

impl<R: Rng> Source for SimulationSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_infinite(&self) -> bool {
        true
    }

    fn has_message(&self) -> bool {
        true
    }

    fn read_message(&mut self) -> Result<Option<Message>> {
        let key = self.generate_key();
        let value = self.generate_value();
        let ts = self.generate_timestamp();
        Ok(Some(Message::new(key, value, ts)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use regex::Regex;

    #[test]
    fn test_generated_messages_are_well_formed() {
        let key_pattern = Regex::new(r"^[A-Z][0-9]{3}$").unwrap();
        let mut source = SimulationSource::with_rng("sim", StdRng::seed_from_u64(7));

        for _ in 0..500 {
            let msg = source.read_message().unwrap().unwrap();
            assert!(key_pattern.is_match(msg.key()), "bad key {}", msg.key());
            assert!((0.0..=100.0).contains(&msg.value()), "bad value {}", msg.value());

            // One decimal place
            let scaled = msg.value() * 10.0;
            assert!((scaled - scaled.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_timestamps_are_microsecond_precision() {
        let mut source = SimulationSource::new("sim");
        for _ in 0..20 {
            let msg = source.read_message().unwrap().unwrap();
            assert_eq!(msg.timestamp().timestamp_subsec_nanos() % 1000, 0);
        }
    }

    #[test]
    fn test_always_has_message() {
        let mut source = SimulationSource::new("sim");
        assert!(source.is_infinite());
        for _ in 0..10 {
            assert!(source.has_message());
            assert!(source.read_message().unwrap().is_some());
        }
        assert!(source.has_message());
    }

    #[test]
    fn test_seeded_sources_agree() {
        let mut a = SimulationSource::with_rng("a", StdRng::seed_from_u64(42));
        let mut b = SimulationSource::with_rng("b", StdRng::seed_from_u64(42));

        let ma = a.read_message().unwrap().unwrap();
        let mb = b.read_message().unwrap().unwrap();
        assert_eq!(ma.key(), mb.key());
        assert_eq!(ma.value(), mb.value());
    }

    #[test]
    fn test_display() {
        let source = SimulationSource::new("Simulation Source");
        assert_eq!(source.to_string(), "SimulationSource(Simulation Source)");
    }
}
