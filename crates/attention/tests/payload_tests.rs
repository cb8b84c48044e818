use attention::{
    AttentionError, AttentionInputs, Axis, Config, PayloadBuilder, SegmentSlicer, ViewKind,
};
use candle_core::{DType, Device, Result, Tensor, D};
use proptest::prelude::*;
use serde_json::json;

fn tokens(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Row-stochastic `[1, heads, seq_len, seq_len]` layer with distinct entries.
fn softmax_layer(heads: usize, seq_len: usize, seed: f32) -> Result<Tensor> {
    let logits: Vec<f32> = (0..heads * seq_len * seq_len)
        .map(|v| ((v as f32 + seed) * 0.37).sin())
        .collect();
    let logits = Tensor::from_vec(logits, (1, heads, seq_len, seq_len), &Device::Cpu)?;
    let exp = logits.exp()?;
    exp.broadcast_div(&exp.sum_keepdim(D::Minus1)?)
}

fn stack_rows(blocks: &[&Vec<Vec<Vec<Vec<f64>>>>]) -> Vec<Vec<Vec<Vec<f64>>>> {
    // Concatenate along the key axis: same layer/head/row, columns appended.
    let mut out = blocks[0].clone();
    for block in &blocks[1..] {
        for (layer_out, layer_in) in out.iter_mut().zip(block.iter()) {
            for (head_out, head_in) in layer_out.iter_mut().zip(layer_in.iter()) {
                for (row_out, row_in) in head_out.iter_mut().zip(head_in.iter()) {
                    row_out.extend_from_slice(row_in);
                }
            }
        }
    }
    out
}

fn stack_columns(
    top: Vec<Vec<Vec<Vec<f64>>>>,
    bottom: Vec<Vec<Vec<Vec<f64>>>>,
) -> Vec<Vec<Vec<Vec<f64>>>> {
    top.into_iter()
        .zip(bottom)
        .map(|(top_layer, bottom_layer)| {
            top_layer
                .into_iter()
                .zip(bottom_layer)
                .map(|(mut top_head, bottom_head)| {
                    top_head.extend(bottom_head);
                    top_head
                })
                .collect()
        })
        .collect()
}

#[test]
fn uniform_single_sequence_scenario() -> anyhow::Result<()> {
    let words = tokens(&["[CLS]", "hello", "world", "[SEP]"]);
    let attention = vec![(Tensor::ones((1, 2, 4, 4), DType::F32, &Device::Cpu)? * 0.25)?];

    let payload = PayloadBuilder::default().build(&AttentionInputs::new(&attention, &words))?;

    let row = vec![0.25f64; 4];
    let head = vec![row; 4];
    let expected = json!({
        "all": {
            "attn": [vec![head.clone(), head]],
            "left_text": words,
            "right_text": words,
        }
    });
    assert_eq!(serde_json::to_value(&payload)?, expected);
    Ok(())
}

#[test]
fn sentence_pair_blocks_match_manual_slices() -> anyhow::Result<()> {
    let words = tokens(&["a1", "a2", "a3", "b1", "b2"]);
    let data: Vec<f32> = (0..2 * 25).map(|v| v as f32 / 100.0).collect();
    let attention = vec![Tensor::from_vec(data, (1, 2, 5, 5), &Device::Cpu)?];
    let full = attention[0].squeeze(0)?.to_dtype(DType::F64)?.to_vec3::<f64>()?;

    let payload = PayloadBuilder::default()
        .build(&AttentionInputs::new(&attention, &words).with_sentence_b_start(Some(3)))?;

    let manual = |rows: std::ops::Range<usize>, cols: std::ops::Range<usize>| {
        vec![full
            .iter()
            .map(|head| {
                head[rows.clone()]
                    .iter()
                    .map(|row| row[cols.clone()].to_vec())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()]
    };

    assert_eq!(payload.get("aa").expect("aa").attn, manual(0..3, 0..3));
    assert_eq!(payload.get("bb").expect("bb").attn, manual(3..5, 3..5));
    assert_eq!(payload.get("ab").expect("ab").attn, manual(0..3, 3..5));
    assert_eq!(payload.get("ba").expect("ba").attn, manual(3..5, 0..3));
    Ok(())
}

#[test]
fn all_view_rows_are_distributions() -> anyhow::Result<()> {
    let words = tokens(&["a", "b", "c", "d", "e", "f"]);
    let attention = vec![softmax_layer(3, 6, 0.0)?, softmax_layer(3, 6, 11.0)?];

    let payload = PayloadBuilder::default()
        .build(&AttentionInputs::new(&attention, &words).with_sentence_b_start(Some(2)))?;

    for layer in &payload.get("all").expect("all").attn {
        for head in layer {
            for row in head {
                let sum: f64 = row.iter().sum();
                assert!((sum - 1.0).abs() < 1e-6, "row sums to {sum}");
            }
        }
    }
    Ok(())
}

#[test]
fn directional_views_reassemble_all_exactly() -> anyhow::Result<()> {
    let words = tokens(&["a", "b", "c", "d", "e", "f", "g"]);
    let attention = vec![softmax_layer(2, 7, 3.0)?, softmax_layer(2, 7, 5.0)?];
    let boundary = 4;

    let payload = PayloadBuilder::default()
        .build(&AttentionInputs::new(&attention, &words).with_sentence_b_start(Some(boundary)))?;

    let view = |kind| &payload.view(kind).expect("view present").attn;
    let top = stack_rows(&[view(ViewKind::AA), view(ViewKind::AB)]);
    let bottom = stack_rows(&[view(ViewKind::BA), view(ViewKind::BB)]);
    let all = view(ViewKind::All);

    for (layer, expected) in top.iter().zip(all.iter()) {
        for (head, expected) in layer.iter().zip(expected.iter()) {
            assert_eq!(head.as_slice(), &expected[..boundary]);
        }
    }
    for (layer, expected) in bottom.iter().zip(all.iter()) {
        for (head, expected) in layer.iter().zip(expected.iter()) {
            assert_eq!(head.as_slice(), &expected[boundary..]);
        }
    }
    assert_eq!(&stack_columns(top, bottom), all);
    Ok(())
}

#[test]
fn mismatched_tokens_raise_shape_mismatch() -> anyhow::Result<()> {
    let words = tokens(&["only", "three", "tokens"]);
    let attention = vec![softmax_layer(1, 4, 0.0)?];

    let err = PayloadBuilder::default()
        .build(&AttentionInputs::new(&attention, &words))
        .unwrap_err();

    match err {
        AttentionError::ShapeMismatch {
            axis,
            observed,
            expected,
            tokens,
        } => {
            assert_eq!(axis, Axis::Query);
            assert_eq!(observed, 4);
            assert_eq!(expected, 3);
            assert_eq!(tokens, "only three tokens");
        }
        other => panic!("expected ShapeMismatch, got {other}"),
    }
    Ok(())
}

#[test]
fn batched_attention_is_rejected() -> anyhow::Result<()> {
    let words = tokens(&["a", "b"]);
    let attention = vec![Tensor::zeros((2, 1, 2, 2), DType::F32, &Device::Cpu)?];

    let err = PayloadBuilder::default()
        .build(&AttentionInputs::new(&attention, &words))
        .unwrap_err();

    assert!(matches!(err, AttentionError::UnsupportedConfiguration(_)));
    Ok(())
}

#[test]
fn payload_serialises_in_view_order_with_optional_vectors() -> anyhow::Result<()> {
    let words = tokens(&["a", "b", "c"]);
    let attention = vec![softmax_layer(1, 3, 0.0)?];
    let vectors = vec![Tensor::zeros((1, 1, 3, 2), DType::F32, &Device::Cpu)?];
    let inputs = AttentionInputs::new(&attention, &words)
        .with_sentence_b_start(Some(1))
        .with_queries_and_keys(&vectors, &vectors);

    let plain = serde_json::to_string(&PayloadBuilder::default().build(&inputs)?)?;
    assert!(!plain.contains("\"queries\""));
    let positions: Vec<usize> = ["\"all\"", "\"aa\"", "\"ab\"", "\"ba\"", "\"bb\""]
        .iter()
        .map(|key| plain.find(key).expect("key present"))
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

    let with_vectors = serde_json::to_value(
        PayloadBuilder::new(Config::default().with_queries_and_keys()).build(&inputs)?,
    )?;
    assert_eq!(with_vectors["ab"]["queries"][0][0].as_array().map(Vec::len), Some(1));
    assert_eq!(with_vectors["ab"]["keys"][0][0].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn source_tensors_are_reusable_after_build() -> anyhow::Result<()> {
    let words = tokens(&["a", "b", "c", "d"]);
    let attention = vec![softmax_layer(2, 4, 1.0)?];
    let before = attention[0].flatten_all()?.to_vec1::<f32>()?;

    let inputs = AttentionInputs::new(&attention, &words).with_sentence_b_start(Some(2));
    let first = PayloadBuilder::default().build(&inputs)?;
    let second = PayloadBuilder::default().build(&inputs)?;

    assert_eq!(attention[0].flatten_all()?.to_vec1::<f32>()?, before);
    assert_eq!(first, second);
    Ok(())
}

proptest! {
    #[test]
    fn slicer_blocks_reassemble_for_any_boundary(
        (seq_len, boundary) in (2usize..9).prop_flat_map(|len| (Just(len), 1..len)),
        heads in 1usize..4,
        seed in 0u32..1000,
    ) {
        let attention = softmax_layer(heads, seq_len, seed as f32).unwrap();
        let slicer = SegmentSlicer::new(seq_len, Some(boundary)).unwrap();

        let blocks = slicer.slice_attention(&attention).unwrap().unwrap();
        prop_assert_eq!(blocks.aa.dims(), &[1, heads, boundary, boundary]);
        prop_assert_eq!(blocks.bb.dims(), &[1, heads, seq_len - boundary, seq_len - boundary]);

        let rebuilt = blocks.reassemble().unwrap();
        prop_assert_eq!(
            rebuilt.flatten_all().unwrap().to_vec1::<f32>().unwrap(),
            attention.flatten_all().unwrap().to_vec1::<f32>().unwrap()
        );
    }
}
