use std::fs;
use std::path::Path;

use attention::LabelScheme;
use serde::{Deserialize, Serialize};
use tokenizer::{ModelFamily, SpecialTokens};

use crate::error::{Result, ViewError};
use crate::views::{DisplayMode, HeadViewOptions, ModelViewOptions, NeuronViewOptions, PayloadLayout};

/// Which visualisation the parameters are produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewSelection {
    #[default]
    Head,
    Model,
    Neuron,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub view: ViewSelection,
    pub model_family: ModelFamily,
    pub prettify_tokens: bool,
    pub labels: LabelScheme,
    pub layout: PayloadLayout,
    pub display_mode: DisplayMode,
    pub layer: Option<usize>,
    pub heads: Option<Vec<usize>>,
    pub head: Option<usize>,
    /// Overrides the family's default classification token.
    pub cls_token: Option<String>,
    /// Overrides the family's default separator token.
    pub sep_token: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            view: ViewSelection::default(),
            model_family: ModelFamily::Bert,
            prettify_tokens: true,
            labels: LabelScheme::default(),
            layout: PayloadLayout::default(),
            display_mode: DisplayMode::default(),
            layer: None,
            heads: None,
            head: None,
            cls_token: None,
            sep_token: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ViewError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let what = path.display().to_string();
        let config: ViewerConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                serde_json::from_str(&contents).map_err(|err| ViewError::format(&what, err))?
            }
            Some("toml") | Some("tml") | None => {
                toml::from_str(&contents).map_err(|err| ViewError::format(&what, err))?
            }
            Some(other) => {
                return Err(ViewError::format(
                    what,
                    format!("unsupported configuration extension '{other}'"),
                ));
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path(path)
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if let Some(heads) = &self.heads {
            if heads.is_empty() {
                errors.push("heads must not be empty when set".to_string());
            }
            let mut seen = heads.clone();
            seen.sort_unstable();
            seen.dedup();
            if seen.len() != heads.len() {
                errors.push("heads must not contain duplicates".to_string());
            }
        }

        match self.view {
            ViewSelection::Head => {
                if self.head.is_some() {
                    errors.push("head is only used by the neuron view; use heads".to_string());
                }
            }
            ViewSelection::Model => {
                if self.layer.is_some() || self.heads.is_some() || self.head.is_some() {
                    errors.push("the model view takes no layer or head selection".to_string());
                }
            }
            ViewSelection::Neuron => {
                if self.heads.is_some() {
                    errors.push("heads is only used by the head view; use head".to_string());
                }
                if self.layout == PayloadLayout::Named {
                    errors.push("the neuron view only supports the keyed layout".to_string());
                }
            }
        }

        for (name, token) in [("cls_token", &self.cls_token), ("sep_token", &self.sep_token)] {
            if matches!(token.as_deref(), Some(text) if text.trim().is_empty()) {
                errors.push(format!("{name} must not be blank"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ViewError::validation(errors))
        }
    }

    /// Configured special tokens, falling back to the family defaults.
    pub fn special_tokens(&self) -> SpecialTokens {
        let defaults = self.model_family.default_special_tokens();
        SpecialTokens {
            cls: self.cls_token.clone().or(defaults.cls),
            sep: self.sep_token.clone().or(defaults.sep),
        }
    }

    pub fn head_view_options(&self) -> HeadViewOptions {
        HeadViewOptions {
            prettify_tokens: self.prettify_tokens,
            labels: self.labels,
            layout: self.layout,
            layer: self.layer,
            heads: self.heads.clone(),
        }
    }

    pub fn model_view_options(&self) -> ModelViewOptions {
        ModelViewOptions {
            prettify_tokens: self.prettify_tokens,
            labels: self.labels,
            layout: self.layout,
            display_mode: self.display_mode,
        }
    }

    pub fn neuron_view_options(&self) -> NeuronViewOptions {
        NeuronViewOptions {
            labels: self.labels,
            display_mode: self.display_mode,
            layer: self.layer,
            head: self.head,
        }
    }
}
