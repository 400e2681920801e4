//! # Engine Configuration
//!
//! Optional TOML overlay on top of a rule's own configuration.
//!
//! Precedence, lowest to highest: the rule document's `config`, the TOML
//! file passed with `--config`, then command-line flags.
//!
//! ```toml
//! mode = "find_all"
//! repeat_until_fixpoint = true
//! seed = 42
//!
//! [limits]
//! max_depth = 64
//! node_budget = 500000
//! ```

use regraft_core::{Mode, RegraftError, RuleConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum size of a configuration file (1 MB).
const MAX_CONFIG_BYTES: u64 = 1024 * 1024;

/// Search limit overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_depth: Option<usize>,
    pub node_budget: Option<u64>,
}

/// Every field is optional; unset fields leave the layer below untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub mode: Option<Mode>,
    pub match_only: Option<bool>,
    pub repeat_count: Option<u32>,
    pub repeat_until_fixpoint: Option<bool>,
    pub max_passes: Option<u32>,
    /// Seed for the random generator used by `find_any`.
    pub seed: Option<u64>,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl EngineConfig {
    /// Parse a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, RegraftError> {
        toml::from_str(contents)
            .map_err(|e| RegraftError::InvalidConfiguration(format!("config: {}", e)))
    }

    /// Load and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self, RegraftError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            RegraftError::IoError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(RegraftError::IoError(format!(
                "Path '{}' is not a regular file",
                path.display()
            )));
        }
        if metadata.len() > MAX_CONFIG_BYTES {
            return Err(RegraftError::InvalidConfiguration(format!(
                "config file exceeds {} bytes",
                MAX_CONFIG_BYTES
            )));
        }
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RegraftError::IoError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Layer `other` on top of `self`; set fields in `other` win.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            mode: other.mode.or(self.mode),
            match_only: other.match_only.or(self.match_only),
            repeat_count: other.repeat_count.or(self.repeat_count),
            repeat_until_fixpoint: other.repeat_until_fixpoint.or(self.repeat_until_fixpoint),
            max_passes: other.max_passes.or(self.max_passes),
            seed: other.seed.or(self.seed),
            limits: LimitsConfig {
                max_depth: other.limits.max_depth.or(self.limits.max_depth),
                node_budget: other.limits.node_budget.or(self.limits.node_budget),
            },
        }
    }

    /// Apply the overlay to a rule configuration and validate the result.
    pub fn apply_to(&self, base: RuleConfig) -> Result<RuleConfig, RegraftError> {
        let mut config = base;
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(match_only) = self.match_only {
            config.match_only = match_only;
        }
        if let Some(count) = self.repeat_count {
            config.repeat_count = count;
        }
        if let Some(fixpoint) = self.repeat_until_fixpoint {
            config.repeat_until_fixpoint = fixpoint;
        }
        if let Some(passes) = self.max_passes {
            config.max_passes = passes;
        }
        if let Some(depth) = self.limits.max_depth {
            config.limits.max_depth = depth;
        }
        if let Some(budget) = self.limits.node_budget {
            config.limits.node_budget = budget;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overlay_keeps_base() {
        let base = RuleConfig::default();
        assert_eq!(EngineConfig::default().apply_to(base).expect("apply"), base);
    }

    #[test]
    fn toml_overrides_fields() {
        let overlay = EngineConfig::from_toml(
            "mode = \"find_all\"\nseed = 7\n[limits]\nmax_depth = 8\n",
        )
        .expect("parse");
        assert_eq!(overlay.seed, Some(7));
        let config = overlay.apply_to(RuleConfig::default()).expect("apply");
        assert_eq!(config.mode, Mode::FindAll);
        assert_eq!(config.limits.max_depth, 8);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml("colour = \"blue\"\n"),
            Err(RegraftError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn later_layer_wins() {
        let file = EngineConfig {
            mode: Some(Mode::FindAny),
            seed: Some(1),
            ..EngineConfig::default()
        };
        let flags = EngineConfig {
            mode: Some(Mode::FindAll),
            ..EngineConfig::default()
        };
        let merged = file.merge(flags);
        assert_eq!(merged.mode, Some(Mode::FindAll));
        assert_eq!(merged.seed, Some(1));
    }

    #[test]
    fn invalid_result_is_rejected() {
        let overlay = EngineConfig {
            mode: Some(Mode::Stepped),
            repeat_until_fixpoint: Some(true),
            ..EngineConfig::default()
        };
        assert!(overlay.apply_to(RuleConfig::default()).is_err());
    }
}
