//! Configuration structures for LarchDB.

use crate::error::{LarchError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a B-tree index instance and its node arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Branching degree `t`: a node holds at most `2t-1` keys.
    pub degree: usize,
    /// Number of pre-allocated node slots in the arena.
    ///
    /// The arena never grows; it must be sized for the worst-case node
    /// count of every tree sharing it.
    pub arena_capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            degree: 8,
            arena_capacity: 4096,
        }
    }
}

impl IndexConfig {
    /// Maximum keys a node may hold in steady state.
    pub fn max_keys_per_node(&self) -> usize {
        self.degree * 2 - 1
    }

    /// Minimum keys every non-root node must hold.
    pub fn min_keys_per_node(&self) -> usize {
        self.degree - 1
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.degree < 2 {
            return Err(LarchError::InvalidParameter {
                name: "degree".to_string(),
                value: self.degree.to_string(),
            });
        }
        if self.arena_capacity == 0 {
            return Err(LarchError::InvalidParameter {
                name: "arena_capacity".to_string(),
                value: self.arena_capacity.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_config_defaults() {
        let config = IndexConfig::default();
        assert_eq!(config.degree, 8);
        assert_eq!(config.arena_capacity, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_index_config_custom() {
        let config = IndexConfig {
            degree: 3,
            arena_capacity: 64,
        };
        assert_eq!(config.degree, 3);
        assert_eq!(config.arena_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_key_bounds() {
        let config = IndexConfig {
            degree: 3,
            arena_capacity: 64,
        };
        assert_eq!(config.max_keys_per_node(), 5);
        assert_eq!(config.min_keys_per_node(), 2);

        let config = IndexConfig::default();
        assert_eq!(config.max_keys_per_node(), 15);
        assert_eq!(config.min_keys_per_node(), 7);
    }

    #[test]
    fn test_validate_rejects_degenerate_degree() {
        let config = IndexConfig {
            degree: 1,
            arena_capacity: 64,
        };
        assert!(matches!(
            config.validate(),
            Err(LarchError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_arena() {
        let config = IndexConfig {
            degree: 4,
            arena_capacity: 0,
        };
        assert!(matches!(
            config.validate(),
            Err(LarchError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_index_config_clone() {
        let config1 = IndexConfig::default();
        let config2 = config1.clone();
        assert_eq!(config1.degree, config2.degree);
        assert_eq!(config1.arena_capacity, config2.arena_capacity);
    }

    #[test]
    fn test_index_config_serde_roundtrip() {
        let original = IndexConfig {
            degree: 5,
            arena_capacity: 1024,
        };
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: IndexConfig = serde_json::from_str(&serialized).unwrap();

        assert_eq!(original.degree, deserialized.degree);
        assert_eq!(original.arena_capacity, deserialized.arena_capacity);
    }
}
