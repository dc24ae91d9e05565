//! Engine configuration.

use serde::Deserialize;

use crate::schema::{KeyPolicy, ParseOptions, DEFAULT_MAX_DEPTH};

/// How model-level payload objects treat undeclared keys.
///
/// Operator objects (`{equals, in, ...}`, `{connect, create, ...}`) always
/// reject unknown keys regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKeys {
    /// Reject with `UnrecognizedKeys`.
    #[default]
    Strict,
    /// Silently drop them.
    Strip,
}

impl From<UnknownKeys> for KeyPolicy {
    fn from(keys: UnknownKeys) -> Self {
        match keys {
            UnknownKeys::Strict => KeyPolicy::Strict,
            UnknownKeys::Strip => KeyPolicy::Strip,
        }
    }
}

/// Schema engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Unknown-key handling for model-level objects.
    pub unknown_keys: UnknownKeys,

    /// Maximum payload nesting depth.
    pub max_depth: usize,

    /// Fail declaration when two compound constraints share an effective
    /// name instead of keeping the first one.
    pub reject_compound_name_collisions: bool,
}

impl EngineConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            unknown_keys: UnknownKeys::Strict,
            max_depth: DEFAULT_MAX_DEPTH,
            reject_compound_name_collisions: false,
        }
    }

    /// Set unknown-key handling.
    pub fn with_unknown_keys(mut self, unknown_keys: UnknownKeys) -> Self {
        self.unknown_keys = unknown_keys;
        self
    }

    /// Set the maximum payload depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Reject compound constraint name collisions at declaration.
    pub fn rejecting_compound_name_collisions(mut self) -> Self {
        self.reject_compound_name_collisions = true;
        self
    }

    /// Policy for model-level payload objects.
    pub fn key_policy(&self) -> KeyPolicy {
        self.unknown_keys.into()
    }

    /// Parse options derived from this configuration.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::default().with_max_depth(self.max_depth)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
