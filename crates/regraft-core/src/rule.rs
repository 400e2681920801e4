//! # Rule Engine
//!
//! A `TransformationRule` pairs a pattern with a configuration; a
//! `RuleEngine` drives the matcher and the replacement applier for it.
//!
//! ## Modes
//!
//! - `FindFirst`: rewrite the first match of each pass.
//! - `FindAny`: collect every match of the pass, rewrite one picked uniformly
//!   at random from the engine's seedable generator.
//! - `FindAll`: collect every match of the pass, rewrite them all in one
//!   simultaneous replacement.
//! - `Stepped`: collect and queue matches; the caller pulls them with
//!   `advance` and pushes chosen ones back with `apply_match`.
//!
//! `match_only` overrides the mode: the engine only reports whether a match
//! exists.
//!
//! ## Isolation
//!
//! The caller's host is never mutated. Every activation works on a clone and
//! hands the rewritten copy back; an error drops the copy. Parameters are
//! resolved into a private working copy of the pattern, rebuilt only when the
//! rule version or the effective parameter values change.

use crate::graph::HierarchicalGraph;
use crate::match_result::MatchResult;
use crate::matcher::{CancelToken, Matcher, SearchLimits};
use crate::pattern::Pattern;
use crate::primitives::{DEFAULT_MAX_PASSES, DEFAULT_REPEAT_COUNT};
use crate::replacement::{ReplacementApplier, ReplacementSpec};
use crate::RegraftError;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// How matches of one pass are consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    FindFirst,
    FindAny,
    FindAll,
    Stepped,
}

impl Mode {
    /// Lowercase name as used in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FindFirst => "find_first",
            Self::FindAny => "find_any",
            Self::FindAll => "find_all",
            Self::Stepped => "stepped",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = RegraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "find_first" => Ok(Self::FindFirst),
            "find_any" => Ok(Self::FindAny),
            "find_all" => Ok(Self::FindAll),
            "stepped" => Ok(Self::Stepped),
            other => Err(RegraftError::InvalidConfiguration(format!(
                "unknown mode '{}'",
                other
            ))),
        }
    }
}

/// Behaviour of one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub mode: Mode,
    /// Only report whether a match exists.
    pub match_only: bool,
    /// Number of replacement passes when not running to a fixpoint.
    pub repeat_count: u32,
    /// Repeat until no match remains.
    pub repeat_until_fixpoint: bool,
    /// Upper bound on passes of a fixpoint loop.
    pub max_passes: u32,
    pub limits: SearchLimits,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            match_only: false,
            repeat_count: DEFAULT_REPEAT_COUNT,
            repeat_until_fixpoint: false,
            max_passes: DEFAULT_MAX_PASSES,
            limits: SearchLimits::default(),
        }
    }
}

impl RuleConfig {
    pub fn validate(&self) -> Result<(), RegraftError> {
        if self.repeat_until_fixpoint && self.mode == Mode::Stepped {
            return Err(RegraftError::InvalidConfiguration(
                "repeat until fixpoint is not available in stepped mode".to_string(),
            ));
        }
        if self.repeat_count == 0 && !self.repeat_until_fixpoint {
            return Err(RegraftError::InvalidConfiguration(
                "repeat count must be at least 1".to_string(),
            ));
        }
        if self.max_passes == 0 {
            return Err(RegraftError::InvalidConfiguration(
                "max passes must be at least 1".to_string(),
            ));
        }
        if self.limits.max_depth == 0 {
            return Err(RegraftError::InvalidConfiguration(
                "max depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// RULE
// =============================================================================

/// Canonical rule definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationRule {
    pub name: String,
    pattern: Pattern,
    /// Declared parameters with their current values.
    parameters: BTreeMap<String, String>,
    pub config: RuleConfig,
    version: u64,
}

impl TransformationRule {
    #[must_use]
    pub fn new(name: impl Into<String>, pattern: Pattern) -> Self {
        Self {
            name: name.into(),
            pattern,
            parameters: BTreeMap::new(),
            config: RuleConfig::default(),
            version: 0,
        }
    }

    /// Declare a parameter with its initial value.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: RuleConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Bumped by every change to a parameter value.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Change the value of a declared parameter.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<String>) -> Result<(), RegraftError> {
        let slot = self.parameters.get_mut(name).ok_or_else(|| {
            RegraftError::InvalidConfiguration(format!("undeclared parameter '{}'", name))
        })?;
        *slot = value.into();
        self.version += 1;
        Ok(())
    }

    /// Check the pattern against the declared parameters and the configuration.
    pub fn validate(&self) -> Result<(), RegraftError> {
        self.pattern
            .validate(self.parameters.keys().map(String::as_str))?;
        self.config.validate()
    }
}

// =============================================================================
// ACTIVATION OUTCOME
// =============================================================================

/// Result of one activation, one variant per surface.
#[derive(Debug, Clone)]
pub enum Activation<H> {
    /// `match_only` was set.
    MatchOnly { matched: bool },
    /// Autonomous modes: the rewritten host copy.
    Rewritten {
        host: H,
        matched: bool,
        replacements: usize,
    },
    /// Stepped mode: matches queued for `advance`.
    Stepped { remaining: usize },
}

impl<H> Activation<H> {
    /// Whether at least one match was found.
    #[must_use]
    pub fn matched(&self) -> bool {
        match self {
            Self::MatchOnly { matched } | Self::Rewritten { matched, .. } => *matched,
            Self::Stepped { remaining } => *remaining > 0,
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Resolved pattern and operations for one rule version and parameter set.
#[derive(Debug, Clone)]
struct WorkingCopy {
    version: u64,
    parameters: BTreeMap<String, String>,
    pattern: Pattern,
    spec: ReplacementSpec,
}

/// Drives the matcher and an applier for one rule.
pub struct RuleEngine<A: ReplacementApplier> {
    rule: TransformationRule,
    applier: A,
    rng: Pcg64Mcg,
    cancel: Option<CancelToken>,
    working: Option<WorkingCopy>,
    queue: VecDeque<MatchResult>,
    current: Option<A::Host>,
}

impl<A: ReplacementApplier> RuleEngine<A> {
    /// Engine with an entropy-seeded generator.
    #[must_use]
    pub fn new(rule: TransformationRule, applier: A) -> Self {
        Self::with_rng(rule, applier, Pcg64Mcg::from_entropy())
    }

    /// Engine with a generator seeded from `seed`.
    #[must_use]
    pub fn seeded(rule: TransformationRule, applier: A, seed: u64) -> Self {
        Self::with_rng(rule, applier, Pcg64Mcg::seed_from_u64(seed))
    }

    #[must_use]
    pub fn with_rng(rule: TransformationRule, applier: A, rng: Pcg64Mcg) -> Self {
        Self {
            rule,
            applier,
            rng,
            cancel: None,
            working: None,
            queue: VecDeque::new(),
            current: None,
        }
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn rule(&self) -> &TransformationRule {
        &self.rule
    }

    pub fn set_parameter(&mut self, name: &str, value: impl Into<String>) -> Result<(), RegraftError> {
        self.rule.set_parameter(name, value)
    }

    /// Run one activation against `host`.
    ///
    /// `overrides` replace declared parameter values for this activation only.
    pub fn activate(
        &mut self,
        host: &A::Host,
        overrides: &BTreeMap<String, String>,
    ) -> Result<Activation<A::Host>, RegraftError> {
        self.rule.validate()?;
        self.prepare(overrides)?;
        let config = self.rule.config;
        let matcher = self.matcher();
        let working = self.working.as_ref().ok_or_else(|| {
            RegraftError::InvalidConfiguration("working copy was not prepared".to_string())
        })?;

        if config.match_only {
            let matched = matcher.exists(&working.pattern, host)?;
            info!(rule = %self.rule.name, matched, "match-only activation");
            return Ok(Activation::MatchOnly { matched });
        }

        if config.mode == Mode::Stepped {
            let found = matcher.find_all(&working.pattern, host)?;
            self.queue = found.into();
            self.current = Some(host.clone());
            info!(
                rule = %self.rule.name,
                queued = self.queue.len(),
                "stepped activation"
            );
            return Ok(Activation::Stepped {
                remaining: self.queue.len(),
            });
        }

        let mut copy = host.clone();
        let mut remaining = config.repeat_count;
        let mut passes = 0u32;
        let mut replacements = 0usize;
        let mut matched = false;

        while config.repeat_until_fixpoint || remaining > 0 {
            let found = match config.mode {
                Mode::FindFirst => matcher
                    .find_first(&working.pattern, &copy)?
                    .into_iter()
                    .collect(),
                _ => matcher.find_all(&working.pattern, &copy)?,
            };
            if found.is_empty() {
                break;
            }
            // Only a fixpoint loop is bounded; a counted loop ends on its own.
            if config.repeat_until_fixpoint && passes >= config.max_passes {
                return Err(RegraftError::SearchLimitExceeded {
                    limit: "max_passes",
                    value: u64::from(config.max_passes),
                });
            }
            passes += 1;
            matched = true;

            match config.mode {
                Mode::FindAny => {
                    let pick = self.rng.gen_range(0..found.len());
                    self.applier.apply(&mut copy, &found[pick], &working.spec)?;
                    replacements += 1;
                    debug!(pass = passes, pick, candidates = found.len(), "replaced one match");
                }
                Mode::FindAll => {
                    self.applier.apply_all(&mut copy, &found, &working.spec)?;
                    replacements += found.len();
                    debug!(pass = passes, count = found.len(), "replaced all matches");
                }
                Mode::FindFirst | Mode::Stepped => {
                    self.applier.apply(&mut copy, &found[0], &working.spec)?;
                    replacements += 1;
                    debug!(pass = passes, "replaced first match");
                }
            }

            if !config.repeat_until_fixpoint {
                remaining -= 1;
            }
        }

        info!(
            rule = %self.rule.name,
            mode = config.mode.name(),
            matched,
            replacements,
            passes,
            "activation finished"
        );
        Ok(Activation::Rewritten {
            host: copy,
            matched,
            replacements,
        })
    }

    // -------------------------------------------------------------------------
    // Stepped surface
    // -------------------------------------------------------------------------

    /// Dequeue the oldest pending match.
    pub fn advance(&mut self) -> Result<Option<MatchResult>, RegraftError> {
        self.require_stepped()?;
        Ok(self.queue.pop_front())
    }

    /// Apply an externally chosen match to the current host copy and return
    /// the rewritten host.
    ///
    /// Matches still queued are kept; one that no longer fits the rewritten
    /// host fails when applied.
    pub fn apply_match(&mut self, result: &MatchResult) -> Result<A::Host, RegraftError> {
        self.require_stepped()?;
        let current = self.current.as_ref().ok_or_else(|| {
            RegraftError::InvalidConfiguration("no host; activate the rule first".to_string())
        })?;
        let working = self.working.as_ref().ok_or_else(|| {
            RegraftError::InvalidConfiguration("no working copy; activate the rule first".to_string())
        })?;

        if result.host_root() != current.root() {
            return Err(RegraftError::ReplacementConflict(format!(
                "match belongs to host root {}, current host root is {}",
                result.host_root(),
                current.root()
            )));
        }
        if let Some(missing) = result.host_nodes().find(|node| !current.contains(*node)) {
            return Err(RegraftError::UnresolvableHostNode(missing));
        }

        let mut next = current.clone();
        self.applier.apply(&mut next, result, &working.spec)?;
        debug!(rule = %self.rule.name, remaining = self.queue.len(), "applied stepped match");
        self.current = Some(next.clone());
        Ok(next)
    }

    /// Number of queued matches not yet advanced.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Host copy the stepped surface rewrites.
    #[must_use]
    pub fn current_host(&self) -> Option<&A::Host> {
        self.current.as_ref()
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn matcher(&self) -> Matcher {
        let matcher = Matcher::new().with_limits(self.rule.config.limits);
        match &self.cancel {
            Some(token) => matcher.with_cancel_token(token.clone()),
            None => matcher,
        }
    }

    fn require_stepped(&self) -> Result<(), RegraftError> {
        if self.rule.config.mode != Mode::Stepped {
            return Err(RegraftError::InvalidConfiguration(format!(
                "stepped operation called in {} mode",
                self.rule.config.mode.name()
            )));
        }
        Ok(())
    }

    /// Resolve the pattern for the current version and effective parameters.
    fn prepare(&mut self, overrides: &BTreeMap<String, String>) -> Result<(), RegraftError> {
        let mut parameters = self.rule.parameters.clone();
        for (name, value) in overrides {
            let slot = parameters.get_mut(name).ok_or_else(|| {
                RegraftError::InvalidConfiguration(format!("undeclared parameter '{}'", name))
            })?;
            slot.clone_from(value);
        }

        let fresh = self.working.as_ref().is_some_and(|working| {
            working.version == self.rule.version && working.parameters == parameters
        });
        if fresh {
            return Ok(());
        }

        // Drop the stale copy first so a failed resolve cannot leave it behind.
        self.working = None;
        let pattern = self.rule.pattern.resolve(&parameters)?;
        let spec = ReplacementSpec::from_pattern(&pattern);
        debug!(rule = %self.rule.name, version = self.rule.version, "working copy rebuilt");
        self.working = Some(WorkingCopy {
            version: self.rule.version,
            parameters,
            pattern,
            spec,
        });
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
