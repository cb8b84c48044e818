//! Bridges between candle tensors and the plain nested arrays carried by
//! payloads.

pub mod types;

use candle_core::{DType, Tensor};

use crate::core::{AttentionError, Result};

pub use types::{LayerMatrix, StackShape};

/// Copy a `[heads, rows, cols]` tensor (possibly a strided view) into nested
/// `f64` arrays.
///
/// Every float dtype widens to `f64` without loss, so double-precision
/// inputs keep their values. The source tensor is left untouched.
pub fn to_nested(tensor: &Tensor) -> Result<LayerMatrix> {
    if tensor.rank() != 3 {
        return Err(AttentionError::unsupported(format!(
            "expected a [heads, rows, cols] tensor, got shape {:?}",
            tensor.dims()
        )));
    }
    let tensor = if tensor.dtype() == DType::F64 {
        tensor.clone()
    } else {
        tensor.to_dtype(DType::F64)?
    };
    Ok(tensor.to_vec3::<f64>()?)
}

/// Drop the leading batch axis of a validated `[1, heads, rows, cols]` layer.
pub(crate) fn squeeze_batch(layer: &Tensor) -> Result<Tensor> {
    Ok(layer.squeeze(0)?)
}
