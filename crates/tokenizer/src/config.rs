//! Model-family policy table.
//!
//! Each family lays out its input differently around the classification and
//! separator tokens, and not every family accepts sentence pairs. The table
//! is consumed by [`crate::layout`] when assembling model inputs and by
//! [`crate::display`] when deciding whether delimiters get canonical labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Bert,
    Roberta,
    Xlnet,
    Gpt2,
}

/// Where special tokens go around a single input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleLayout {
    /// `CLS text SEP`
    ClsTextSep,
    /// `text SEP CLS`
    TextSepCls,
    /// `text`
    Text,
}

/// Sentence-pair layout: segment A is always `CLS a SEP`, segment B is
/// `b SEP`, optionally preceded by an extra `SEP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairLayout {
    pub segment_b_prefix_sep: bool,
    pub token_type_ids: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyPolicy {
    pub single: SingleLayout,
    /// `None` when the family does not support sentence pairs.
    pub pair: Option<PairLayout>,
    /// Replace the family's delimiter tokens with `[CLS]` / `[SEP]` for display.
    pub format_delimiters: bool,
    /// Whether every position may attend to every other position.
    pub bidirectional: bool,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 4] = [
        ModelFamily::Bert,
        ModelFamily::Roberta,
        ModelFamily::Xlnet,
        ModelFamily::Gpt2,
    ];

    /// Layout rules for the family. XLNet and GPT-2 accept single inputs
    /// only; a pair for either is rejected with [`Error::UnsupportedPair`].
    pub fn policy(self) -> FamilyPolicy {
        match self {
            ModelFamily::Bert => FamilyPolicy {
                single: SingleLayout::ClsTextSep,
                pair: Some(PairLayout {
                    segment_b_prefix_sep: false,
                    token_type_ids: true,
                }),
                format_delimiters: true,
                bidirectional: true,
            },
            ModelFamily::Roberta => FamilyPolicy {
                single: SingleLayout::ClsTextSep,
                pair: Some(PairLayout {
                    segment_b_prefix_sep: true,
                    token_type_ids: false,
                }),
                format_delimiters: true,
                bidirectional: true,
            },
            ModelFamily::Xlnet => FamilyPolicy {
                single: SingleLayout::TextSepCls,
                pair: None,
                format_delimiters: true,
                bidirectional: true,
            },
            ModelFamily::Gpt2 => FamilyPolicy {
                single: SingleLayout::Text,
                pair: None,
                format_delimiters: false,
                bidirectional: false,
            },
        }
    }

    pub fn supports_pairs(self) -> bool {
        self.policy().pair.is_some()
    }

    /// Conventional special-token text for the family's reference tokenizers.
    pub fn default_special_tokens(self) -> SpecialTokens {
        let (cls, sep) = match self {
            ModelFamily::Bert => ("[CLS]", "[SEP]"),
            ModelFamily::Roberta => ("<s>", "</s>"),
            ModelFamily::Xlnet => ("<cls>", "<sep>"),
            ModelFamily::Gpt2 => return SpecialTokens::default(),
        };
        SpecialTokens {
            cls: Some(cls.to_string()),
            sep: Some(sep.to_string()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelFamily::Bert => "bert",
            ModelFamily::Roberta => "roberta",
            ModelFamily::Xlnet => "xlnet",
            ModelFamily::Gpt2 => "gpt2",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelFamily::ALL
            .into_iter()
            .find(|family| family.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidConfig(format!("unknown model family '{s}'")))
    }
}

/// Classification and separator token text of a concrete tokenizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokens {
    #[serde(default)]
    pub cls: Option<String>,
    #[serde(default)]
    pub sep: Option<String>,
}

impl SpecialTokens {
    pub fn cls(&self) -> Option<&str> {
        self.cls.as_deref().filter(|token| !token.is_empty())
    }

    pub fn sep(&self) -> Option<&str> {
        self.sep.as_deref().filter(|token| !token.is_empty())
    }
}
