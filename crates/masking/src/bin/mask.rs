use std::path::PathBuf;

use clap::Parser;
use masking::run::{encode_batch, load_weights, render_labels, render_tokens, OverrideArg, RunConfig};
use masking::{word_tails_mask, MaskedLanguageModeling, MaskingError};
use rand::{rngs::StdRng, SeedableRng};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("masking failed: {}", err);
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Apply masked-language-modeling corruption to sentences", long_about = None)]
struct Args {
    #[arg(short, long, value_name = "PATH", help = "Path to run config file (TOML or JSON)")]
    config: PathBuf,

    #[arg(
        long = "override",
        value_name = "KEY=VALUE",
        help = "Override configuration value using dot-separated paths"
    )]
    overrides: Vec<OverrideArg>,

    #[arg(long, help = "Seed for the random generator; defaults to the config's seed")]
    seed: Option<u64>,

    #[arg(
        long,
        value_name = "PATH",
        help = "JSON array with one importance weight per vocabulary id"
    )]
    weights: Option<PathBuf>,

    #[arg(long, help = "Print the filtered masking probabilities before sampling")]
    show_probabilities: bool,

    #[arg(required = true, value_name = "SENTENCE")]
    sentences: Vec<String>,
}

fn run() -> Result<(), MaskingError> {
    let args = Args::parse();

    let mut config = RunConfig::load(&args.config)?;
    if !args.overrides.is_empty() {
        config = config.apply_overrides(&args.overrides)?;
    }
    config.masking.validate()?;

    let tokenizer = tokenizer::build_from_artifacts(&config.tokenizer)?;
    let engine = MaskedLanguageModeling::new(&tokenizer, config.masking.clone())?;
    let seed = args.seed.unwrap_or(config.seed);

    let mut tokens = encode_batch(&tokenizer, args.sentences.as_slice())?;
    let original = tokens.clone();
    let weights = match &args.weights {
        Some(path) => Some(load_weights(path)?),
        None => None,
    };
    let tails = if config.masking.whole_word_masking {
        Some(word_tails_mask(&tokens, &tokenizer)?)
    } else {
        None
    };

    if args.show_probabilities {
        let probabilities = engine.probability_matrix(&tokens, weights.as_ref(), tails.as_ref())?;
        for (index, row) in probabilities.rows().enumerate() {
            let rendered: Vec<String> = row.iter().map(|p| format!("{:.3}", p)).collect();
            println!("probabilities {}: {}", index, rendered.join(" "));
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let output = engine.mask_in_place(&mut tokens, weights.as_ref(), tails.as_ref(), &mut rng)?;

    for (index, sentence) in args.sentences.iter().enumerate() {
        println!("sentence {}: {}", index, sentence);
        println!("  original: {}", render_tokens(&tokenizer, original.row(index)));
        println!("  masked  : {}", render_tokens(&tokenizer, tokens.row(index)));
        println!("  labels  : {}", render_labels(&tokenizer, output.labels.row(index)));
    }

    let summary = output.summary;
    println!(
        "seed {}: {} positions, {} eligible, {} targets ({} mask, {} random, {} unchanged)",
        seed,
        summary.positions,
        summary.eligible,
        summary.targets,
        summary.masked,
        summary.randomized,
        summary.unchanged
    );

    Ok(())
}
