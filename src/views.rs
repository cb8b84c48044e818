//! Parameter objects for the head, model and neuron views.
//!
//! Each function runs one visualisation call: format tokens, build the
//! attention payload, check the initial layer/head selection against it, and
//! return a serialisable parameter object for the renderer.

use attention::{
    AttentionError, AttentionInputs, AttentionPayload, Config, LabelScheme, NamedView,
    PayloadBuilder,
};
use candle_core::Tensor;
use serde::{Deserialize, Serialize};
use tokenizer::{display_tokens, format_special_chars, ModelFamily, SpecialTokens};

use crate::config::{ViewSelection, ViewerConfig};
use crate::error::Result;

/// View selected when the visualisation first loads.
pub const DEFAULT_FILTER: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Light,
    #[default]
    Dark,
}

/// Shape of the `attention` field handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadLayout {
    /// Object keyed by view label.
    #[default]
    Keyed,
    /// Ordered list of `{name, attn, left_text, right_text}`.
    Named,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ViewData {
    Keyed(AttentionPayload),
    Named(Vec<NamedView>),
}

impl ViewData {
    fn new(payload: AttentionPayload, layout: PayloadLayout) -> Self {
        match layout {
            PayloadLayout::Keyed => ViewData::Keyed(payload),
            PayloadLayout::Named => ViewData::Named(payload.into_named_views()),
        }
    }
}

/// Tensors returned by the model adapter for one forward pass.
#[derive(Debug, Clone, Copy)]
pub struct ModelOutput<'a> {
    pub attention: &'a [Tensor],
    pub queries: Option<&'a [Tensor]>,
    pub keys: Option<&'a [Tensor]>,
}

impl<'a> ModelOutput<'a> {
    pub fn attention_only(attention: &'a [Tensor]) -> Self {
        Self {
            attention,
            queries: None,
            keys: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadViewOptions {
    /// Replace subword boundary markers with spaces.
    pub prettify_tokens: bool,
    pub labels: LabelScheme,
    pub layout: PayloadLayout,
    pub layer: Option<usize>,
    pub heads: Option<Vec<usize>>,
}

impl Default for HeadViewOptions {
    fn default() -> Self {
        Self {
            prettify_tokens: true,
            labels: LabelScheme::default(),
            layout: PayloadLayout::default(),
            layer: None,
            heads: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadViewParams {
    pub attention: ViewData,
    pub default_filter: String,
    pub layer: Option<usize>,
    pub heads: Option<Vec<usize>>,
}

pub fn head_view(
    attention: &[Tensor],
    tokens: &[String],
    sentence_b_start: Option<usize>,
    options: &HeadViewOptions,
) -> Result<HeadViewParams> {
    let tokens = prettify(tokens, options.prettify_tokens);
    let inputs = AttentionInputs::new(attention, &tokens).with_sentence_b_start(sentence_b_start);
    let payload = PayloadBuilder::new(Config::default().with_labels(options.labels)).build(&inputs)?;

    check_layer(&payload, options.layer)?;
    for &head in options.heads.iter().flatten() {
        check_head(&payload, head)?;
    }

    Ok(HeadViewParams {
        attention: ViewData::new(payload, options.layout),
        default_filter: DEFAULT_FILTER.to_string(),
        layer: options.layer,
        heads: options.heads.clone(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelViewOptions {
    pub prettify_tokens: bool,
    pub labels: LabelScheme,
    pub layout: PayloadLayout,
    pub display_mode: DisplayMode,
}

impl Default for ModelViewOptions {
    fn default() -> Self {
        Self {
            prettify_tokens: true,
            labels: LabelScheme::default(),
            layout: PayloadLayout::default(),
            display_mode: DisplayMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelViewParams {
    pub attention: ViewData,
    pub default_filter: String,
    pub display_mode: DisplayMode,
}

pub fn model_view(
    attention: &[Tensor],
    tokens: &[String],
    sentence_b_start: Option<usize>,
    options: &ModelViewOptions,
) -> Result<ModelViewParams> {
    let tokens = prettify(tokens, options.prettify_tokens);
    let inputs = AttentionInputs::new(attention, &tokens).with_sentence_b_start(sentence_b_start);
    let payload = PayloadBuilder::new(Config::default().with_labels(options.labels)).build(&inputs)?;

    Ok(ModelViewParams {
        attention: ViewData::new(payload, options.layout),
        default_filter: DEFAULT_FILTER.to_string(),
        display_mode: options.display_mode,
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeuronViewOptions {
    pub labels: LabelScheme,
    pub display_mode: DisplayMode,
    pub layer: Option<usize>,
    pub head: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeuronViewParams {
    pub attention: AttentionPayload,
    pub default_filter: String,
    pub bidirectional: bool,
    pub display_mode: DisplayMode,
    pub layer: Option<usize>,
    pub head: Option<usize>,
}

/// Neuron view: every view carries query and key vectors, and tokens are
/// formatted for display according to `family`.
pub fn neuron_view(
    output: &ModelOutput<'_>,
    tokens: &[String],
    sentence_b_start: Option<usize>,
    family: ModelFamily,
    specials: &SpecialTokens,
    options: &NeuronViewOptions,
) -> Result<NeuronViewParams> {
    if sentence_b_start.is_some() && !family.supports_pairs() {
        return Err(tokenizer::Error::UnsupportedPair(family).into());
    }
    let tokens = display_tokens(family, specials, tokens);
    let mut inputs =
        AttentionInputs::new(output.attention, &tokens).with_sentence_b_start(sentence_b_start);
    inputs.queries = output.queries;
    inputs.keys = output.keys;
    let config = Config::default()
        .with_queries_and_keys()
        .with_labels(options.labels);
    let payload = PayloadBuilder::new(config).build(&inputs)?;

    check_layer(&payload, options.layer)?;
    if let Some(head) = options.head {
        check_head(&payload, head)?;
    }

    Ok(NeuronViewParams {
        attention: payload,
        default_filter: DEFAULT_FILTER.to_string(),
        bidirectional: family.policy().bidirectional,
        display_mode: options.display_mode,
        layer: options.layer,
        head: options.head,
    })
}

fn prettify(tokens: &[String], enabled: bool) -> Vec<String> {
    if enabled {
        format_special_chars(tokens)
    } else {
        tokens.to_vec()
    }
}

fn check_layer(payload: &AttentionPayload, layer: Option<usize>) -> Result<()> {
    match layer {
        Some(layer) if layer >= payload.num_layers() => Err(AttentionError::unsupported(format!(
            "layer {layer} selected but the model has {} layers",
            payload.num_layers()
        ))
        .into()),
        _ => Ok(()),
    }
}

fn check_head(payload: &AttentionPayload, head: usize) -> Result<()> {
    if head >= payload.num_heads() {
        return Err(AttentionError::unsupported(format!(
            "head {head} selected but each layer has {} heads",
            payload.num_heads()
        ))
        .into());
    }
    Ok(())
}

/// Parameters for whichever view a [`ViewerConfig`] selects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ViewParams {
    Head(HeadViewParams),
    Model(ModelViewParams),
    Neuron(NeuronViewParams),
}

pub fn render(
    config: &ViewerConfig,
    output: &ModelOutput<'_>,
    tokens: &[String],
    sentence_b_start: Option<usize>,
) -> Result<ViewParams> {
    config.validate()?;
    let params = match config.view {
        ViewSelection::Head => ViewParams::Head(head_view(
            output.attention,
            tokens,
            sentence_b_start,
            &config.head_view_options(),
        )?),
        ViewSelection::Model => ViewParams::Model(model_view(
            output.attention,
            tokens,
            sentence_b_start,
            &config.model_view_options(),
        )?),
        ViewSelection::Neuron => ViewParams::Neuron(neuron_view(
            output,
            tokens,
            sentence_b_start,
            config.model_family,
            &config.special_tokens(),
            &config.neuron_view_options(),
        )?),
    };
    Ok(params)
}
