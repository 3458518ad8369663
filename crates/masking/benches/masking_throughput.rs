use candle_core::{Device, Tensor};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use masking::{word_tails_tensor, MaskedLanguageModeling, MaskingConfig};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokenizer::Vocabulary;

const SPECIALS: u32 = 5;
const VOCAB: u32 = 8192;

/// Synthetic vocabulary: ids below `SPECIALS` are structural, odd ids are
/// continuation pieces.
struct SyntheticVocab;

impl Vocabulary for SyntheticVocab {
    fn encode(&self, text: &str, _add_special_tokens: bool) -> tokenizer::Result<Vec<u32>> {
        Ok(text.bytes().map(|b| SPECIALS + u32::from(b)).collect())
    }

    fn decode_token(&self, id: u32) -> Option<String> {
        match id {
            id if id >= VOCAB => None,
            id if id < SPECIALS => Some(format!("[S{id}]")),
            id if id % 2 == 1 => Some(format!("##w{id}")),
            id => Some(format!("w{id}")),
        }
    }

    fn vocab_size(&self) -> usize {
        VOCAB as usize
    }

    fn mask_token_id(&self) -> Option<u32> {
        Some(4)
    }

    fn pad_token_id(&self) -> Option<u32> {
        Some(0)
    }

    fn is_special_id(&self, id: u32) -> bool {
        id < SPECIALS
    }
}

fn random_batch(batch: usize, seq: usize, device: &Device) -> Tensor {
    let mut rng = StdRng::seed_from_u64(11);
    let ids: Vec<i64> = (0..batch * seq)
        .map(|_| rng.gen_range(i64::from(SPECIALS)..i64::from(VOCAB)))
        .collect();
    Tensor::from_vec(ids, (batch, seq), device).expect("batch")
}

fn bench_masking(c: &mut Criterion) {
    let device = Device::Cpu;
    let shapes = &[(8usize, 128usize), (32, 512), (64, 512)];

    for whole_word in [false, true] {
        let config = MaskingConfig::default().with_whole_word_masking(whole_word);
        let engine = MaskedLanguageModeling::new(SyntheticVocab, config).expect("engine");
        let mut group = c.benchmark_group(format!("mask_tokens/whole_word={whole_word}"));
        for &(batch, seq) in shapes {
            let inputs = random_batch(batch, seq, &device);
            let tails = word_tails_tensor(&inputs, &SyntheticVocab).expect("tails");
            group.throughput(Throughput::Elements((batch * seq) as u64));
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{}x{}", batch, seq)),
                &(inputs, tails),
                |b, (inputs, tails)| {
                    let mut rng = StdRng::seed_from_u64(0);
                    b.iter(|| {
                        let out = engine
                            .mask_tokens(black_box(inputs), None, Some(tails), &mut rng)
                            .expect("mask");
                        black_box(out);
                    });
                },
            );
        }
        group.finish();
    }
}

fn bench_word_tails(c: &mut Criterion) {
    let device = Device::Cpu;
    let mut group = c.benchmark_group("word_tails");
    for &(batch, seq) in &[(8usize, 128usize), (32, 512)] {
        let inputs = random_batch(batch, seq, &device);
        group.throughput(Throughput::Elements((batch * seq) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", batch, seq)),
            &inputs,
            |b, inputs| {
                b.iter(|| {
                    let out = word_tails_tensor(black_box(inputs), &SyntheticVocab).expect("tails");
                    black_box(out);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_masking, bench_word_tails);
criterion_main!(benches);
