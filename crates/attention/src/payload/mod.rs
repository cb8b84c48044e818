//! Assembly of attention payloads from validated, sliced tensors.
//!
//! [`PayloadBuilder`] is the single entry point for every call site; the
//! differences between call sites (label set, query/key vectors) live in
//! [`Config`]. The build runs all shape checks first and only then slices,
//! so a failure never yields a partial payload.

mod views;

use candle_core::Tensor;

use crate::core::{AttentionError, Config, Result};
use crate::interop::{squeeze_batch, to_nested, LayerMatrix, StackShape};
use crate::slicing::{Directional, Segment, SegmentSlicer, Segments};
use crate::validate::{validate, validate_layer_stack, validate_positions};

pub use views::{AttentionPayload, AttentionView, NamedView, ViewKind};

/// Tensors and tokens for one visualisation call.
///
/// * `attention`: one `[1, heads, seq_len, seq_len]` tensor per layer.
/// * `queries` / `keys`: optional, one `[1, heads, seq_len, feature]` tensor
///   per layer.
/// * `tokens`: display tokens, already formatted, `seq_len` long.
/// * `sentence_b_start`: offset of segment B for sentence-pair inputs.
#[derive(Debug, Clone, Copy)]
pub struct AttentionInputs<'a> {
    pub attention: &'a [Tensor],
    pub queries: Option<&'a [Tensor]>,
    pub keys: Option<&'a [Tensor]>,
    pub tokens: &'a [String],
    pub sentence_b_start: Option<usize>,
}

impl<'a> AttentionInputs<'a> {
    pub fn new(attention: &'a [Tensor], tokens: &'a [String]) -> Self {
        Self {
            attention,
            queries: None,
            keys: None,
            tokens,
            sentence_b_start: None,
        }
    }

    pub fn with_sentence_b_start(mut self, sentence_b_start: Option<usize>) -> Self {
        self.sentence_b_start = sentence_b_start;
        self
    }

    pub fn with_queries_and_keys(mut self, queries: &'a [Tensor], keys: &'a [Tensor]) -> Self {
        self.queries = Some(queries);
        self.keys = Some(keys);
        self
    }
}

/// Builds [`AttentionPayload`]s according to a [`Config`].
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    config: Config,
}

impl PayloadBuilder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn build(&self, inputs: &AttentionInputs<'_>) -> Result<AttentionPayload> {
        let tokens = inputs.tokens;
        let vectors = self.requested_vectors(inputs)?;
        let slicer = SegmentSlicer::new(tokens.len(), inputs.sentence_b_start)?;

        let shape = validate_layer_stack(inputs.attention, "attention")?;
        for layer in inputs.attention {
            validate(layer, tokens, tokens)?;
        }
        if let Some((queries, keys)) = vectors {
            check_vectors(queries, "queries", &shape, tokens)?;
            check_vectors(keys, "keys", &shape, tokens)?;
        }

        let mut attn = AttentionSeries::new(slicer.is_segmented(), shape.num_layers);
        for layer in inputs.attention {
            attn.push(&slicer, &squeeze_batch(layer)?)?;
        }

        let vectors = match vectors {
            Some((queries, keys)) => Some((
                VectorSeries::collect(&slicer, queries)?,
                VectorSeries::collect(&slicer, keys)?,
            )),
            None => None,
        };

        let mut views = Vec::with_capacity(5);
        let (all_queries, all_keys) = match &vectors {
            Some((queries, keys)) => (Some(queries.all.clone()), Some(keys.all.clone())),
            None => (None, None),
        };
        views.push((
            ViewKind::All,
            AttentionView {
                attn: attn.all,
                left_text: tokens.to_vec(),
                right_text: tokens.to_vec(),
                queries: all_queries,
                keys: all_keys,
            },
        ));

        if let (Some(blocks), Some(token_segments)) = (attn.directional, slicer.slice_tokens(tokens))
        {
            for (kind, block) in ViewKind::DIRECTIONAL.into_iter().zip(blocks.into_array()) {
                let Some((query_side, key_side)) = kind.sides() else {
                    continue;
                };
                let (queries, keys) = match &vectors {
                    Some((queries, keys)) => (
                        queries.segment(query_side).cloned(),
                        keys.segment(key_side).cloned(),
                    ),
                    None => (None, None),
                };
                views.push((
                    kind,
                    AttentionView {
                        attn: block,
                        left_text: token_segments.get(query_side).to_vec(),
                        right_text: token_segments.get(key_side).to_vec(),
                        queries,
                        keys,
                    },
                ));
            }
        }

        log::debug!(
            "attention payload built views={} layers={} heads={} seq_len={} segmented={} vectors={}",
            views.len(),
            shape.num_layers,
            shape.num_heads,
            shape.positions,
            slicer.is_segmented(),
            self.config.include_queries_and_keys
        );

        Ok(AttentionPayload::new(self.config.labels, views))
    }

    fn requested_vectors<'a>(
        &self,
        inputs: &AttentionInputs<'a>,
    ) -> Result<Option<(&'a [Tensor], &'a [Tensor])>> {
        if !self.config.include_queries_and_keys {
            return Ok(None);
        }
        match (inputs.queries, inputs.keys) {
            (Some(queries), Some(keys)) => Ok(Some((queries, keys))),
            (None, _) => Err(AttentionError::missing(
                "queries were requested but the model adapter did not supply them",
            )),
            (_, None) => Err(AttentionError::missing(
                "keys were requested but the model adapter did not supply them",
            )),
        }
    }
}

fn check_vectors(
    layers: &[Tensor],
    what: &str,
    attention: &StackShape,
    tokens: &[String],
) -> Result<()> {
    let shape = validate_layer_stack(layers, what)?;
    if shape.num_layers != attention.num_layers || shape.num_heads != attention.num_heads {
        return Err(AttentionError::unsupported(format!(
            "{what} cover {} layers x {} heads, attention covers {} layers x {} heads",
            shape.num_layers, shape.num_heads, attention.num_layers, attention.num_heads
        )));
    }
    for layer in layers {
        validate_positions(layer, tokens)?;
    }
    Ok(())
}

/// Per-view attention, one entry appended per layer.
struct AttentionSeries {
    all: Vec<LayerMatrix>,
    directional: Option<Directional<Vec<LayerMatrix>>>,
}

impl AttentionSeries {
    fn new(segmented: bool, num_layers: usize) -> Self {
        let series = || Vec::with_capacity(num_layers);
        Self {
            all: series(),
            directional: segmented.then(|| Directional {
                aa: series(),
                ab: series(),
                ba: series(),
                bb: series(),
            }),
        }
    }

    fn push(&mut self, slicer: &SegmentSlicer, layer: &Tensor) -> Result<()> {
        self.all.push(to_nested(layer)?);
        if let (Some(series), Some(blocks)) =
            (self.directional.as_mut(), slicer.slice_attention(layer)?)
        {
            series.aa.push(to_nested(&blocks.aa)?);
            series.ab.push(to_nested(&blocks.ab)?);
            series.ba.push(to_nested(&blocks.ba)?);
            series.bb.push(to_nested(&blocks.bb)?);
        }
        Ok(())
    }
}

/// Query or key vectors for the whole sequence and, when segmented, per
/// segment.
struct VectorSeries {
    all: Vec<LayerMatrix>,
    segments: Option<Segments<Vec<LayerMatrix>>>,
}

impl VectorSeries {
    fn collect(slicer: &SegmentSlicer, layers: &[Tensor]) -> Result<Self> {
        let mut all = Vec::with_capacity(layers.len());
        let mut segments = slicer.is_segmented().then(|| Segments {
            a: Vec::with_capacity(layers.len()),
            b: Vec::with_capacity(layers.len()),
        });
        for layer in layers {
            let layer = squeeze_batch(layer)?;
            all.push(to_nested(&layer)?);
            if let (Some(series), Some(parts)) = (segments.as_mut(), slicer.slice_positions(&layer)?)
            {
                series.a.push(to_nested(&parts.a)?);
                series.b.push(to_nested(&parts.b)?);
            }
        }
        Ok(Self { all, segments })
    }

    fn segment(&self, segment: Segment) -> Option<&Vec<LayerMatrix>> {
        self.segments.as_ref().map(|series| series.get(segment))
    }
}
