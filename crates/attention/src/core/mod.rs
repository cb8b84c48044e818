//! Core types shared across validation, slicing and payload assembly.
//!
//! Attention tensors arrive one per layer with layout
//! `[batch, n_heads, seq_len, seq_len]`; query and key tensors share the
//! layout `[batch, n_heads, seq_len, head_dim]`. Only `batch == 1` is
//! accepted.

pub mod config;
pub mod errors;

pub use config::{Config, LabelScheme};
pub use errors::{AttentionError, Axis, Result};
