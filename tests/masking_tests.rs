use candle_core::{Device, Tensor};
use mlm_masking::tokenizer::{build_from_artifacts, write_vocab, Config};
use mlm_masking::{MaskedLanguageModeling, MaskingConfig, Vocabulary, IGNORE_INDEX};

const VOCAB: [&str; 14] = [
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "the", "cat", "sat", "on", "mat", ".", "play",
    "##ing", "##ful",
];

fn batch(tok: &impl Vocabulary, sentences: &[&str]) -> Tensor {
    let encoded: Vec<Vec<i64>> = sentences
        .iter()
        .map(|s| {
            tok.encode(s, true)
                .unwrap()
                .into_iter()
                .map(i64::from)
                .collect()
        })
        .collect();
    let width = encoded.iter().map(Vec::len).max().unwrap();
    let pad = i64::from(tok.pad_token_id().unwrap());
    let flat: Vec<i64> = encoded
        .into_iter()
        .flat_map(|mut row| {
            row.resize(width, pad);
            row
        })
        .collect();
    Tensor::from_vec(flat, (sentences.len(), width), &Device::Cpu).unwrap()
}

#[test]
fn test_padded_batch_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_vocab(&dir.path().join("vocab.txt"), &VOCAB).unwrap();
    let tok = build_from_artifacts(&Config::bert_cased(dir.path())).unwrap();
    let engine = MaskedLanguageModeling::new(
        &tok,
        MaskingConfig::default()
            .with_mlm_probability(0.6)
            .with_whole_word_masking(true),
    )
    .unwrap();

    let inputs = batch(&tok, &["the cat sat on the mat.", "playing playful"]);
    let original = inputs.to_vec2::<i64>().unwrap();
    assert_eq!(original[1], vec![2, 11, 12, 11, 13, 3, 0, 0, 0]);

    for seed in 0..20 {
        let out = engine.mask_tokens_seeded(&inputs, None, None, seed).unwrap();
        let labels = out.labels.to_vec2::<i64>().unwrap();
        let corrupted = out.input_ids.to_vec2::<i64>().unwrap();

        for row in 0..original.len() {
            for col in 0..original[row].len() {
                let before = original[row][col];
                let label = labels[row][col];
                if label == IGNORE_INDEX {
                    assert_eq!(corrupted[row][col], before);
                } else {
                    assert_eq!(label, before);
                    assert!(before > 4, "special id {before} selected");
                    assert!(!tok.is_continuation(before as u32));
                }
            }
        }
    }
}

#[test]
fn test_summary_matches_labels() {
    let dir = tempfile::tempdir().unwrap();
    write_vocab(&dir.path().join("vocab.txt"), &VOCAB).unwrap();
    let tok = build_from_artifacts(&Config::bert_cased(dir.path())).unwrap();
    let engine = MaskedLanguageModeling::new(&tok, MaskingConfig::default()).unwrap();

    let inputs = batch(&tok, &["the cat sat on the mat."; 8]);
    let out = engine.mask_tokens_seeded(&inputs, None, None, 123).unwrap();
    let targets = out
        .labels
        .flatten_all()
        .unwrap()
        .to_vec1::<i64>()
        .unwrap()
        .into_iter()
        .filter(|&label| label != IGNORE_INDEX)
        .count();

    assert_eq!(out.summary.targets, targets);
    assert_eq!(out.summary.positions, 8 * 9);
    assert_eq!(out.summary.eligible, 8 * 7);
}
