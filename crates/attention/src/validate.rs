//! Shape checks run before any slicing.
//!
//! Every check is pure. Attention layers must line up with the token
//! sequence on both position axes; query/key layers only on the position
//! axis, their last axis being the feature dimension.

use candle_core::Tensor;

use crate::core::{AttentionError, Axis, Result};
use crate::interop::StackShape;

/// Confirm that the last two axes of `tensor` match the left (query) and
/// right (key) token counts.
pub fn validate(tensor: &Tensor, left_tokens: &[String], right_tokens: &[String]) -> Result<()> {
    let (rows, cols) = trailing_axes(tensor)?;
    if rows != left_tokens.len() {
        return Err(AttentionError::shape_mismatch(
            Axis::Query,
            rows,
            left_tokens.len(),
            left_tokens,
        ));
    }
    if cols != right_tokens.len() {
        return Err(AttentionError::shape_mismatch(
            Axis::Key,
            cols,
            right_tokens.len(),
            right_tokens,
        ));
    }
    Ok(())
}

/// Confirm that the position axis (second-to-last) of a query/key tensor
/// matches the token count.
pub fn validate_positions(tensor: &Tensor, tokens: &[String]) -> Result<()> {
    let (rows, _) = trailing_axes(tensor)?;
    if rows != tokens.len() {
        return Err(AttentionError::shape_mismatch(
            Axis::Query,
            rows,
            tokens.len(),
            tokens,
        ));
    }
    Ok(())
}

/// Check a per-layer stack of `[batch, heads, positions, last]` tensors.
///
/// Rejects empty stacks, tensors that are not rank 4, batches other than 1,
/// and layers whose trailing shape differs from the first layer.
pub fn validate_layer_stack(layers: &[Tensor], what: &str) -> Result<StackShape> {
    let first = layers
        .first()
        .ok_or_else(|| AttentionError::missing(format!("no {what} layers supplied")))?;
    let reference = first.dims();

    for (index, layer) in layers.iter().enumerate() {
        let dims = layer.dims();
        if dims.len() != 4 {
            return Err(AttentionError::unsupported(format!(
                "{what} layer {index} must be shaped [batch, heads, positions, _], got {dims:?}"
            )));
        }
        if dims[0] != 1 {
            return Err(AttentionError::unsupported(format!(
                "{what} layer {index} has batch size {}; only a single example is supported",
                dims[0]
            )));
        }
        if dims[1..] != reference[1..] {
            return Err(AttentionError::unsupported(format!(
                "{what} layer {index} has shape {dims:?}, expected {reference:?} like layer 0"
            )));
        }
    }

    Ok(StackShape {
        num_layers: layers.len(),
        num_heads: reference[1],
        positions: reference[2],
        last_dim: reference[3],
    })
}

fn trailing_axes(tensor: &Tensor) -> Result<(usize, usize)> {
    match tensor.dims() {
        [.., rows, cols] => Ok((*rows, *cols)),
        dims => Err(AttentionError::unsupported(format!(
            "expected at least two axes, got shape {dims:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn accepts_matching_axes() -> Result<()> {
        let t = Tensor::zeros((1, 2, 3, 2), DType::F32, &Device::Cpu)?;
        validate(&t, &tokens(&["a", "b", "c"]), &tokens(&["d", "e"]))
    }

    #[test]
    fn rejects_key_axis_mismatch_with_diagnostics() -> Result<()> {
        let t = Tensor::zeros((2, 3, 3), DType::F32, &Device::Cpu)?;
        let err = validate(&t, &tokens(&["a", "b", "c"]), &tokens(&["x", "y"])).unwrap_err();
        match err {
            AttentionError::ShapeMismatch {
                axis,
                observed,
                expected,
                tokens,
            } => {
                assert_eq!(axis, Axis::Key);
                assert_eq!(observed, 3);
                assert_eq!(expected, 2);
                assert_eq!(tokens, "x y");
            }
            other => panic!("unexpected error {other}"),
        }
        Ok(())
    }

    #[test]
    fn positions_ignore_feature_axis() -> Result<()> {
        let t = Tensor::zeros((1, 2, 3, 64), DType::F32, &Device::Cpu)?;
        validate_positions(&t, &tokens(&["a", "b", "c"]))?;
        assert!(validate_positions(&t, &tokens(&["a", "b"])).is_err());
        Ok(())
    }

    #[test]
    fn layer_stack_rejects_batches_and_ragged_layers() -> Result<()> {
        let device = Device::Cpu;
        assert!(matches!(
            validate_layer_stack(&[], "attention"),
            Err(AttentionError::MissingData(_))
        ));

        let batched = Tensor::zeros((2, 1, 3, 3), DType::F32, &device)?;
        assert!(matches!(
            validate_layer_stack(&[batched], "attention"),
            Err(AttentionError::UnsupportedConfiguration(_))
        ));

        let layer0 = Tensor::zeros((1, 2, 3, 3), DType::F32, &device)?;
        let layer1 = Tensor::zeros((1, 4, 3, 3), DType::F32, &device)?;
        assert!(matches!(
            validate_layer_stack(&[layer0.clone(), layer1], "attention"),
            Err(AttentionError::UnsupportedConfiguration(_))
        ));

        let shape = validate_layer_stack(&[layer0.clone(), layer0], "attention")?;
        assert_eq!(
            shape,
            StackShape {
                num_layers: 2,
                num_heads: 2,
                positions: 3,
                last_dim: 3
            }
        );
        Ok(())
    }
}
