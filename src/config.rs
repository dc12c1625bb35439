use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::blockchain::{
    BASE_REWARD, DEFAULT_DIFFICULTY, DEFAULT_MINER_COUNT, DIFF_ADJUST_WINDOW,
    TARGET_BLOCK_TIME_SECS,
};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}")]
    Unparsable { var: &'static str, value: String },

    #[error("retarget window must be at least one block")]
    ZeroWindow,

    #[error("target block time must be at least one second")]
    ZeroBlockTime,

    #[error("initial difficulty must be within [0, 256), got {0}")]
    DifficultyOutOfRange(f64),
}

/// Network parameters, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub miner_count: usize,
    pub target_block_time_secs: u64,
    pub initial_difficulty: f64,
    pub adjust_window: usize,
    pub block_reward: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            miner_count: DEFAULT_MINER_COUNT,
            target_block_time_secs: TARGET_BLOCK_TIME_SECS,
            initial_difficulty: DEFAULT_DIFFICULTY,
            adjust_window: DIFF_ADJUST_WINDOW,
            block_reward: BASE_REWARD,
        }
    }
}

impl NetworkConfig {
    /// Read the configuration from the environment (call `dotenv()` first),
    /// falling back to the defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as `from_env` with an arbitrary variable source.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let cfg = Self {
            miner_count: parse_var(&lookup, "MINER_COUNT", d.miner_count)?,
            target_block_time_secs: parse_var(
                &lookup,
                "TARGET_BLOCK_TIME_SECS",
                d.target_block_time_secs,
            )?,
            initial_difficulty: parse_var(&lookup, "INITIAL_DIFFICULTY", d.initial_difficulty)?,
            adjust_window: parse_var(&lookup, "DIFF_ADJUST_WINDOW", d.adjust_window)?,
            block_reward: parse_var(&lookup, "BLOCK_REWARD", d.block_reward)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject parameters the retarget loop or the miners cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.adjust_window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.target_block_time_secs == 0 {
            return Err(ConfigError::ZeroBlockTime);
        }
        if !self.initial_difficulty.is_finite()
            || self.initial_difficulty < 0.0
            || self.initial_difficulty >= 256.0
        {
            return Err(ConfigError::DifficultyOutOfRange(self.initial_difficulty));
        }
        Ok(())
    }
}

fn parse_var<L, T>(lookup: &L, var: &'static str, default: T) -> Result<T, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Unparsable {
            var,
            value: raw.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = NetworkConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, NetworkConfig::default());
        assert_eq!(cfg.adjust_window, 10);
        assert_eq!(cfg.target_block_time_secs, 10);
        assert_eq!(cfg.initial_difficulty, 20.0);
        assert_eq!(cfg.block_reward, 20);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = NetworkConfig::from_lookup(lookup(&[
            ("MINER_COUNT", "2"),
            ("INITIAL_DIFFICULTY", " 12.5 "),
            ("DIFF_ADJUST_WINDOW", "5"),
        ]))
        .unwrap();
        assert_eq!(cfg.miner_count, 2);
        assert_eq!(cfg.initial_difficulty, 12.5);
        assert_eq!(cfg.adjust_window, 5);
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = NetworkConfig::from_lookup(lookup(&[("DIFF_ADJUST_WINDOW", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::ZeroWindow);
    }

    #[test]
    fn zero_block_time_is_rejected() {
        let err =
            NetworkConfig::from_lookup(lookup(&[("TARGET_BLOCK_TIME_SECS", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::ZeroBlockTime);
    }

    #[test]
    fn garbage_is_rejected() {
        let err = NetworkConfig::from_lookup(lookup(&[("MINER_COUNT", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::Unparsable { var: "MINER_COUNT", .. }));
    }

    #[test]
    fn absurd_difficulty_is_rejected() {
        for raw in ["256", "-1", "NaN", "inf"] {
            let err =
                NetworkConfig::from_lookup(lookup(&[("INITIAL_DIFFICULTY", raw)])).unwrap_err();
            assert!(matches!(err, ConfigError::DifficultyOutOfRange(_)), "{raw}");
        }
    }
}
