//! Loading of dumped model outputs.
//!
//! Tensors come from safetensors files, stored either as a single stacked
//! tensor named after the quantity (`attention`, `queries`, `keys`) with a
//! leading layer axis, or as one tensor per layer named `<name>.<layer>`.
//! Tokens come from a JSON file holding either a bare array of strings or an
//! object with `tokens` and an optional `sentence_b_start`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use candle_core::safetensors::load as load_safetensors;
use candle_core::{Device, Tensor};
use serde::Deserialize;

use crate::error::{Result, ViewError};

pub fn load_layers(path: impl AsRef<Path>, name: &str) -> Result<Vec<Tensor>> {
    let path = path.as_ref();
    let tensors_error = |source| ViewError::Tensors {
        path: path.to_path_buf(),
        source,
    };
    let mut tensors = load_safetensors(path, &Device::Cpu).map_err(tensors_error)?;

    let layers = match tensors.remove(name) {
        Some(stacked) => unstack(&stacked).map_err(tensors_error)?,
        None => per_layer(&mut tensors, name)
            .ok_or_else(|| ViewError::format(path.display().to_string(), missing(name)))?,
    };
    log::debug!("loaded {} {name} layers from {}", layers.len(), path.display());
    Ok(layers)
}

fn missing(name: &str) -> String {
    format!("no tensor named '{name}' and no per-layer tensors '{name}.0', '{name}.1', ...")
}

fn unstack(stacked: &Tensor) -> candle_core::Result<Vec<Tensor>> {
    let num_layers = stacked.dim(0)?;
    (0..num_layers).map(|layer| stacked.get(layer)).collect()
}

/// Collects `<name>.0`, `<name>.1`, ... until the first gap.
fn per_layer(tensors: &mut HashMap<String, Tensor>, name: &str) -> Option<Vec<Tensor>> {
    let layers: Vec<Tensor> = (0..)
        .map_while(|layer| tensors.remove(&format!("{name}.{layer}")))
        .collect();
    if layers.is_empty() {
        return None;
    }
    let prefix = format!("{name}.");
    let stray = tensors.keys().filter(|key| key.starts_with(&prefix)).count();
    if stray > 0 {
        log::warn!(
            "ignoring {stray} '{name}' tensors after layer {} (layer indices are not contiguous)",
            layers.len() - 1
        );
    }
    Some(layers)
}

/// Tokens and optional segment boundary read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFile {
    pub tokens: Vec<String>,
    pub sentence_b_start: Option<usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTokens {
    List(Vec<String>),
    Object {
        tokens: Vec<String>,
        #[serde(default)]
        sentence_b_start: Option<usize>,
    },
}

pub fn load_tokens(path: impl AsRef<Path>) -> Result<TokenFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ViewError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawTokens = serde_json::from_str(&contents)
        .map_err(|err| ViewError::format(path.display().to_string(), err))?;
    Ok(match raw {
        RawTokens::List(tokens) => TokenFile {
            tokens,
            sentence_b_start: None,
        },
        RawTokens::Object {
            tokens,
            sentence_b_start,
        } => TokenFile {
            tokens,
            sentence_b_start,
        },
    })
}
