//! Tokenizer-side collaborators of the attention visualisation.
//!
//! This crate does not implement tokenisation. It drives an existing
//! tokenizer through the [`Tokenize`] trait (implemented for
//! `tokenizers::Tokenizer`) and knows, per [`ModelFamily`], where the
//! classification and separator tokens go and whether sentence pairs are
//! supported. It also owns the display formatting applied to token text
//! before it reaches a payload.
//!
//! # Model families
//!
//! | family  | single        | pair                      |
//! |---------|---------------|---------------------------|
//! | bert    | `CLS a SEP`   | `CLS a SEP` + `b SEP`     |
//! | roberta | `CLS a SEP`   | `CLS a SEP` + `SEP b SEP` |
//! | xlnet   | `a SEP CLS`   | unsupported               |
//! | gpt2    | `a`           | unsupported               |

pub mod config;
pub mod display;
pub mod errors;
pub mod layout;

pub use config::{FamilyPolicy, ModelFamily, PairLayout, SingleLayout, SpecialTokens};
pub use display::{display_tokens, format_delimiters, format_special_chars};
pub use errors::{Error, Result};
pub use layout::{encode_input, EncodedInput, Tokenize};
