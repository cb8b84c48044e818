//! Attention view payloads for interactive transformer visualisations.
//!
//! The crate turns per-layer attention tensors with layout
//! `[batch=1, n_heads, seq_len, seq_len]` (and optionally query/key tensors
//! `[batch=1, n_heads, seq_len, head_dim]`) into plain nested arrays keyed by
//! view, ready to be serialised to JSON for a browser front end.
//!
//! For sentence-pair inputs the sequence is split at a segment boundary and,
//! next to the full `all` view, four directional views are derived: A→A,
//! A→B, B→A and B→B. The directional views are cut from the full tensor
//! without renormalisation, so stacking `aa | ab` above `ba | bb` reproduces
//! `all` exactly.
//!
//! Pipeline: [`validate`] checks every tensor against the token counts,
//! [`slicing`] cuts strided views, and [`payload`] assembles the result.
//! Token display formatting lives in the `tokenizer` crate.

pub mod core;
pub mod interop;
pub mod payload;
pub mod slicing;
pub mod validate;

pub use core::{AttentionError, Axis, Config, LabelScheme, Result};
pub use payload::{
    AttentionInputs, AttentionPayload, AttentionView, NamedView, PayloadBuilder, ViewKind,
};
pub use slicing::{Directional, Segment, SegmentBoundary, SegmentSlicer, Segments};
