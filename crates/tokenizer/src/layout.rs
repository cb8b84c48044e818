//! Assembly of model inputs for single sentences and sentence pairs.
//!
//! The tokenizer itself is a collaborator reached through [`Tokenize`]; this
//! module only places special tokens according to the family's
//! [`FamilyPolicy`](crate::config::FamilyPolicy) and records where segment B
//! begins.

use crate::config::{ModelFamily, SingleLayout, SpecialTokens};
use crate::errors::{Error, Result};

/// Minimal tokenizer surface needed to lay out inputs.
pub trait Tokenize {
    /// Split `text` into vocabulary tokens without adding special tokens.
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;

    /// Vocabulary id of `token`, if present.
    fn token_id(&self, token: &str) -> Option<u32>;
}

impl Tokenize for tokenizers::Tokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let encoding = self.encode(text, false)?;
        Ok(encoding.get_tokens().to_vec())
    }

    fn token_id(&self, token: &str) -> Option<u32> {
        self.token_to_id(token)
    }
}

/// Token sequence ready for a forward pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInput {
    /// Raw vocabulary tokens of segment A followed by segment B.
    pub tokens: Vec<String>,
    pub token_ids: Vec<u32>,
    /// Segment ids (`0` for A, `1` for B) for families that use them.
    pub token_type_ids: Option<Vec<u32>>,
    /// Offset of the first segment-B token, `None` for single inputs.
    pub sentence_b_start: Option<usize>,
}

impl EncodedInput {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_pair(&self) -> bool {
        self.sentence_b_start.is_some()
    }
}

/// Tokenize `sentence_a` (and `sentence_b`, if non-empty) and lay the
/// tokens out for `family`.
pub fn encode_input<T: Tokenize + ?Sized>(
    tokenizer: &T,
    family: ModelFamily,
    specials: &SpecialTokens,
    sentence_a: &str,
    sentence_b: Option<&str>,
) -> Result<EncodedInput> {
    if sentence_a.is_empty() {
        return Err(Error::Validation("sentence A is required".into()));
    }
    let policy = family.policy();
    let sentence_b = sentence_b.filter(|text| !text.is_empty());

    let (tokens, sentence_b_start, token_type_ids) = match sentence_b {
        None => {
            let text = tokenizer.tokenize(sentence_a)?;
            let tokens = match policy.single {
                SingleLayout::ClsTextSep => {
                    let (cls, sep) = require_specials(family, specials)?;
                    wrap(Some(cls), text, &[sep])
                }
                SingleLayout::TextSepCls => {
                    let (cls, sep) = require_specials(family, specials)?;
                    wrap(None, text, &[sep, cls])
                }
                SingleLayout::Text => text,
            };
            (tokens, None, None)
        }
        Some(sentence_b) => {
            let pair = policy.pair.ok_or(Error::UnsupportedPair(family))?;
            let (cls, sep) = require_specials(family, specials)?;
            let tokens_a = wrap(Some(cls), tokenizer.tokenize(sentence_a)?, &[sep]);
            let prefix = pair.segment_b_prefix_sep.then_some(sep);
            let tokens_b = wrap(prefix, tokenizer.tokenize(sentence_b)?, &[sep]);

            let boundary = tokens_a.len();
            let token_type_ids = pair.token_type_ids.then(|| {
                std::iter::repeat(0)
                    .take(tokens_a.len())
                    .chain(std::iter::repeat(1).take(tokens_b.len()))
                    .collect::<Vec<u32>>()
            });
            let mut tokens = tokens_a;
            tokens.extend(tokens_b);
            (tokens, Some(boundary), token_type_ids)
        }
    };

    let token_ids = tokens
        .iter()
        .map(|token| {
            tokenizer
                .token_id(token)
                .ok_or_else(|| Error::UnknownToken(token.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "encoded {family} input tokens={} pair={}",
        tokens.len(),
        sentence_b_start.is_some()
    );

    Ok(EncodedInput {
        tokens,
        token_ids,
        token_type_ids,
        sentence_b_start,
    })
}

fn require_specials(family: ModelFamily, specials: &SpecialTokens) -> Result<(&str, &str)> {
    match (specials.cls(), specials.sep()) {
        (Some(cls), Some(sep)) => Ok((cls, sep)),
        _ => Err(Error::InvalidConfig(format!(
            "{family} inputs require both a classification and a separator token"
        ))),
    }
}

fn wrap(prefix: Option<&str>, body: Vec<String>, suffix: &[&str]) -> Vec<String> {
    let mut tokens = Vec::with_capacity(body.len() + suffix.len() + 1);
    tokens.extend(prefix.map(str::to_string));
    tokens.extend(body);
    tokens.extend(suffix.iter().map(|token| token.to_string()));
    tokens
}
