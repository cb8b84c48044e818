//! Shared types describing per-layer tensor stacks and their JSON form.

/// Logical description of a per-layer tensor stack after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackShape {
    /// Number of layers supplied.
    pub num_layers: usize,
    /// Number of heads per layer.
    pub num_heads: usize,
    /// Length of the position axis (second-to-last axis).
    pub positions: usize,
    /// Size of the last axis: key positions for attention, features for
    /// query/key vectors.
    pub last_dim: usize,
}

/// One layer of a view as plain nested arrays, indexed
/// `[head][position][key position or feature]`.
pub type LayerMatrix = Vec<Vec<Vec<f64>>>;
