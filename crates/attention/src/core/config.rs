//! Configuration options shared by every payload call site.
//!
//! The [`Config`] struct captures which optional fields and which label set
//! the payload builder emits, so call sites differ only by configuration.

use serde::{Deserialize, Serialize};

/// Short keys used for views in the model-facing payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelScheme {
    /// `all`, `aa`, `ab`, `ba`, `bb`.
    #[default]
    Directional,
    /// `all`, `a`, `b`, `ab`, `ba`, where `a`/`b` are the self-attention views.
    Legacy,
}

/// Configuration driving payload assembly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Attach per-layer query and key vectors to every view.
    ///
    /// When set, the caller must supply both query and key tensors.
    #[serde(default)]
    pub include_queries_and_keys: bool,
    /// Label set used when keying views.
    #[serde(default)]
    pub labels: LabelScheme,
}

impl Config {
    pub fn with_queries_and_keys(mut self) -> Self {
        self.include_queries_and_keys = true;
        self
    }

    pub fn with_labels(mut self, labels: LabelScheme) -> Self {
        self.labels = labels;
        self
    }
}
