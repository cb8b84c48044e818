use std::collections::HashMap;

use tokenizer::{
    display_tokens, encode_input, Error, ModelFamily, Result, SpecialTokens, Tokenize,
};

/// Whitespace tokenizer over a fixed vocabulary, lower-casing like an
/// uncased WordPiece model.
struct WhitespaceVocab {
    ids: HashMap<String, u32>,
}

impl WhitespaceVocab {
    fn new(words: &[&str]) -> Self {
        let ids = words
            .iter()
            .enumerate()
            .map(|(id, word)| (word.to_string(), id as u32))
            .collect();
        Self { ids }
    }
}

impl Tokenize for WhitespaceVocab {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        Ok(text.split_whitespace().map(str::to_lowercase).collect())
    }

    fn token_id(&self, token: &str) -> Option<u32> {
        self.ids.get(token).copied()
    }
}

fn vocab() -> WhitespaceVocab {
    WhitespaceVocab::new(&[
        "[CLS]", "[SEP]", "<s>", "</s>", "<cls>", "<sep>", "the", "cat", "sat", "dog", "ran",
    ])
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[test]
fn bert_pair_layout_records_boundary_and_segments() -> Result<()> {
    let family = ModelFamily::Bert;
    let encoded = encode_input(
        &vocab(),
        family,
        &family.default_special_tokens(),
        "The cat sat",
        Some("the dog ran"),
    )?;

    assert_eq!(
        encoded.tokens,
        strings(&["[CLS]", "the", "cat", "sat", "[SEP]", "the", "dog", "ran", "[SEP]"])
    );
    assert_eq!(encoded.sentence_b_start, Some(5));
    assert_eq!(
        encoded.token_type_ids,
        Some(vec![0, 0, 0, 0, 0, 1, 1, 1, 1])
    );
    assert_eq!(encoded.token_ids[0], 0);
    assert_eq!(encoded.token_ids.len(), encoded.len());
    Ok(())
}

#[test]
fn roberta_pair_prefixes_segment_b_with_separator() -> Result<()> {
    let family = ModelFamily::Roberta;
    let specials = family.default_special_tokens();
    let encoded = encode_input(&vocab(), family, &specials, "the cat", Some("the dog"))?;

    assert_eq!(
        encoded.tokens,
        strings(&["<s>", "the", "cat", "</s>", "</s>", "the", "dog", "</s>"])
    );
    assert_eq!(encoded.sentence_b_start, Some(4));
    assert!(encoded.token_type_ids.is_none());

    let display = display_tokens(family, &specials, &encoded.tokens);
    assert_eq!(
        display,
        strings(&["[CLS]", "the", "cat", "[SEP]", "[SEP]", "the", "dog", "[SEP]"])
    );
    Ok(())
}

#[test]
fn single_layouts_follow_family_policy() -> Result<()> {
    let tok = vocab();
    let cases = [
        (ModelFamily::Bert, vec!["[CLS]", "the", "cat", "[SEP]"]),
        (ModelFamily::Xlnet, vec!["the", "cat", "<sep>", "<cls>"]),
        (ModelFamily::Gpt2, vec!["the", "cat"]),
    ];
    for (family, expected) in cases {
        let encoded = encode_input(&tok, family, &family.default_special_tokens(), "the cat", None)?;
        assert_eq!(encoded.tokens, strings(&expected), "{family}");
        assert!(!encoded.is_pair());
    }
    Ok(())
}

#[test]
fn empty_sentence_b_is_a_single_input() -> Result<()> {
    let family = ModelFamily::Gpt2;
    let encoded = encode_input(&vocab(), family, &SpecialTokens::default(), "the dog", Some(""))?;
    assert_eq!(encoded.sentence_b_start, None);
    Ok(())
}

#[test]
fn unsupported_pairs_and_missing_inputs_are_rejected() {
    let tok = vocab();
    for family in [ModelFamily::Gpt2, ModelFamily::Xlnet] {
        let err = encode_input(
            &tok,
            family,
            &family.default_special_tokens(),
            "the cat",
            Some("the dog"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedPair(f) if f == family));
    }

    let err = encode_input(&tok, ModelFamily::Bert, &SpecialTokens::default(), "", None).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = encode_input(&tok, ModelFamily::Bert, &SpecialTokens::default(), "the", None)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));

    let err = encode_input(
        &tok,
        ModelFamily::Bert,
        &ModelFamily::Bert.default_special_tokens(),
        "the zebra",
        None,
    )
    .unwrap_err();
    assert!(matches!(err, Error::UnknownToken(ref token) if token == "zebra"));
}

#[test]
fn families_parse_case_insensitively() -> Result<()> {
    assert_eq!("RoBERTa".parse::<ModelFamily>()?, ModelFamily::Roberta);
    assert_eq!(" gpt2 ".parse::<ModelFamily>()?, ModelFamily::Gpt2);
    assert!("t5".parse::<ModelFamily>().is_err());
    assert!(!ModelFamily::Gpt2.policy().bidirectional);
    Ok(())
}
