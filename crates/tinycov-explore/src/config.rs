//! Generator configuration and validation.

use crate::input::ControlAlphabet;
use crate::mutator::MutationConfig;
use crate::seed::SeedStrategy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration rejected at construction time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("control alphabet is empty")]
    EmptyAlphabet,

    #[error("control alphabet has {0} symbols, at most {max} are supported", max = ControlAlphabet::MAX_SYMBOLS)]
    AlphabetTooLarge(usize),

    #[error("sequence length must be positive")]
    ZeroLength,

    #[error("pool ceiling must be positive")]
    ZeroPool,

    #[error("exhaustive seeding of {alphabet_size}^{length} sequences exceeds the limit of {max}", max = crate::seed::MAX_SEED_POOL)]
    SeedSpaceTooLarge { alphabet_size: usize, length: usize },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Everything the generator needs, fixed for the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Symbols available at each step.
    pub alphabet: ControlAlphabet,
    /// Fixed length `L` of every sequence.
    pub sequence_length: usize,
    /// Ceiling on pending sequences after feedback admission.
    pub max_pool: usize,
    /// Master seed; the whole session is deterministic given this value.
    pub seed: u64,
    /// How the worklist is populated at construction.
    pub seeding: SeedStrategy,
    /// Mutants generated per coverage-increasing record, before reduction.
    pub candidate_batch: usize,
    /// Mutants admitted per coverage-increasing record, after reduction.
    pub mutants_per_record: usize,
    pub mutation: MutationConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            alphabet: ControlAlphabet::control_pad(),
            sequence_length: 10,
            max_pool: 65_536,
            seed: 42,
            seeding: SeedStrategy::default(),
            candidate_batch: 32,
            mutants_per_record: 8,
            mutation: MutationConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Check every parameter; the first problem found is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alphabet.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        if self.alphabet.len() > ControlAlphabet::MAX_SYMBOLS {
            return Err(ConfigError::AlphabetTooLarge(self.alphabet.len()));
        }
        if self.sequence_length == 0 {
            return Err(ConfigError::ZeroLength);
        }
        if self.max_pool == 0 {
            return Err(ConfigError::ZeroPool);
        }
        if self.mutants_per_record == 0 {
            return Err(ConfigError::Invalid(
                "mutants_per_record must be positive".into(),
            ));
        }
        if self.candidate_batch < self.mutants_per_record {
            return Err(ConfigError::Invalid(format!(
                "candidate_batch ({}) is smaller than mutants_per_record ({})",
                self.candidate_batch, self.mutants_per_record
            )));
        }
        self.seeding
            .validate(self.alphabet.len(), self.sequence_length)?;
        self.mutation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GeneratorConfig::default();
        assert_eq!(config.alphabet.len(), 4);
        assert_eq!(config.sequence_length, 10);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_alphabet_rejected() {
        let config = GeneratorConfig {
            alphabet: ControlAlphabet::with_size(0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyAlphabet));
    }

    #[test]
    fn test_oversized_alphabet_rejected() {
        let config = GeneratorConfig {
            alphabet: ControlAlphabet::with_size(300),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::AlphabetTooLarge(300)));
    }

    #[test]
    fn test_zero_length_rejected() {
        let config = GeneratorConfig {
            sequence_length: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroLength));
    }

    #[test]
    fn test_zero_pool_rejected() {
        let config = GeneratorConfig {
            max_pool: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPool));
    }

    #[test]
    fn test_batch_smaller_than_admission_rejected() {
        let config = GeneratorConfig {
            candidate_batch: 2,
            mutants_per_record: 4,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("candidate_batch (2)"));
    }

    #[test]
    fn test_unbounded_exhaustive_rejected() {
        let config = GeneratorConfig {
            sequence_length: 64,
            seeding: SeedStrategy::Exhaustive,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SeedSpaceTooLarge { alphabet_size: 4, length: 64 })
        ));
    }

    #[test]
    fn test_intractable_exhaustive_rejected() {
        let config = GeneratorConfig {
            sequence_length: 20,
            seeding: SeedStrategy::Exhaustive,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::SeedSpaceTooLarge {
                alphabet_size: 4,
                length: 20
            })
        );
    }

    #[test]
    fn test_zero_mutants_rejected() {
        let config = GeneratorConfig {
            mutants_per_record: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mutants_per_record must be positive"));
    }

    #[test]
    fn test_non_finite_mutation_weight_rejected() {
        let mut config = GeneratorConfig::default();
        config.mutation.splice_prob = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.mutation.insert_prob = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.mutation.delete_prob = -0.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("finite and non-negative"));
    }

    #[test]
    fn test_config_serde_fills_defaults() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"sequence_length": 6, "seed": 7}"#).unwrap();
        assert_eq!(config.sequence_length, 6);
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_pool, GeneratorConfig::default().max_pool);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::AlphabetTooLarge(300).to_string(),
            "control alphabet has 300 symbols, at most 256 are supported"
        );
        assert_eq!(
            ConfigError::SeedSpaceTooLarge {
                alphabet_size: 4,
                length: 64
            }
            .to_string(),
            "exhaustive seeding of 4^64 sequences exceeds the limit of 16777216"
        );
    }
}
