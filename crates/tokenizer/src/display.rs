//! Display formatting for token text.
//!
//! Both functions are pure, accept any list (including an empty one), and
//! return a list of the same length and order. Formatting is applied to the
//! concatenated sequence before it is split into segments, so every view
//! built from the same tokens sees identical text at each position.

use crate::config::{ModelFamily, SpecialTokens};

/// Byte-level BPE marker for a preceding space.
pub const BYTE_LEVEL_SPACE: char = 'Ġ';
/// SentencePiece word-boundary marker.
pub const SENTENCEPIECE_SPACE: char = '▁';

pub const CLS_LABEL: &str = "[CLS]";
pub const SEP_LABEL: &str = "[SEP]";

/// Replace subword boundary markers with a plain space.
pub fn format_special_chars(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .map(|token| token.replace([BYTE_LEVEL_SPACE, SENTENCEPIECE_SPACE], " "))
        .collect()
}

/// Replace tokens equal to the tokenizer's classification or separator
/// marker with `[CLS]` / `[SEP]`.
pub fn format_delimiters(
    tokens: &[String],
    cls_marker: Option<&str>,
    sep_marker: Option<&str>,
) -> Vec<String> {
    let cls_marker = cls_marker.filter(|marker| !marker.is_empty());
    let sep_marker = sep_marker.filter(|marker| !marker.is_empty());
    tokens
        .iter()
        .map(|token| {
            if Some(token.as_str()) == sep_marker {
                SEP_LABEL.to_string()
            } else if Some(token.as_str()) == cls_marker {
                CLS_LABEL.to_string()
            } else {
                token.clone()
            }
        })
        .collect()
}

/// Display text for `tokens` under `family`: boundary markers become spaces
/// and, for families that use them, delimiters get canonical labels.
pub fn display_tokens(family: ModelFamily, specials: &SpecialTokens, tokens: &[String]) -> Vec<String> {
    let formatted = format_special_chars(tokens);
    if family.policy().format_delimiters {
        format_delimiters(&formatted, specials.cls(), specials.sep())
    } else {
        formatted
    }
}
