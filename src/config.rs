//! Exploration settings.

use crate::transform::Engine;

/// Settings for [`determinize`][crate::explore::determinize].
#[derive(Debug, Clone)]
pub struct Config {
    /// The state table holds at most `2^storage_bits - 1` trees.
    pub storage_bits: usize,
    /// Transformer driving the exploration.
    pub engine: Engine,
    /// Also run the other transformer on every step and assert agreement.
    pub cross_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_bits: 20,
            engine: Engine::default(),
            cross_check: false,
        }
    }
}

impl Config {
    pub fn with_storage_bits(mut self, bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");
        self.storage_bits = bits;
        self
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_cross_check(mut self, cross_check: bool) -> Self {
        self.cross_check = cross_check;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = Config::default()
            .with_storage_bits(8)
            .with_engine(Engine::MultiPass)
            .with_cross_check(true);
        assert_eq!(config.storage_bits, 8);
        assert_eq!(config.engine, Engine::MultiPass);
        assert!(config.cross_check);
    }

    #[test]
    #[should_panic(expected = "Storage bits")]
    fn test_storage_bits_too_large() {
        let _ = Config::default().with_storage_bits(32);
    }
}
