//! Parameter objects for interactive attention visualisations.
//!
//! Ties the `attention` payload builder and the `tokenizer` display rules
//! together into the three view call sites (head, model and neuron), plus
//! the configuration and file loading used by the `attnviz` binary.

pub mod config;
pub mod error;
pub mod io;
pub mod views;

pub use attention;
pub use tokenizer;

pub use config::{ViewSelection, ViewerConfig};
pub use error::{Result, ViewError};
pub use io::{load_layers, load_tokens, TokenFile};
pub use views::{
    head_view, model_view, neuron_view, render, DisplayMode, HeadViewOptions, HeadViewParams,
    ModelOutput, ModelViewOptions, ModelViewParams, NeuronViewOptions, NeuronViewParams,
    PayloadLayout, ViewData, ViewParams, DEFAULT_FILTER,
};
