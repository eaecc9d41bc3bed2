use std::env;

use anyhow::{anyhow, Context, Result};
use maternity_intake::config::{load_or_default, workspace_root};
use maternity_intake::normalize::{
    load_synonyms, KeywordNormalizer, LemmaNormalizer, LemmaTable, NormalizeOutcome, Normalizer,
};

fn main() -> Result<()> {
    let args = CliArgs::parse()?;
    let root = workspace_root()?;
    let config = load_or_default()?;
    let table = load_synonyms(&config.normalizer, &root)?;
    let vocabulary = table.vocabulary(&args.vocabulary).with_context(|| {
        let known: Vec<&str> = table.vocabulary_names().collect();
        format!(
            "Unknown vocabulary '{}' (known: {})",
            args.vocabulary,
            known.join(", ")
        )
    })?;

    let mut strategies: Vec<Box<dyn Normalizer>> = vec![Box::new(KeywordNormalizer::new())];
    let lemma_path = config.normalizer.lemma_table_file(&root);
    match LemmaTable::load(&lemma_path) {
        Ok(lemmas) => strategies.push(Box::new(LemmaNormalizer::new(lemmas))),
        Err(err) => println!("lemma: unavailable ({err:#})"),
    }

    println!("synonyms {} / vocabulary {}", table.version(), vocabulary.name());
    for normalizer in &strategies {
        let outcome = normalizer.normalize(vocabulary, &args.phrase, args.payload.as_deref());
        println!("{:<8} {}", normalizer.strategy(), describe(&outcome));
    }
    Ok(())
}

fn describe(outcome: &NormalizeOutcome) -> String {
    match outcome {
        NormalizeOutcome::Matched(codes) => format!("matched {}", codes.as_slice().join(", ")),
        NormalizeOutcome::Ambiguous(codes) => format!("ambiguous {}", codes.as_slice().join(", ")),
        NormalizeOutcome::NoMatch => "no match".to_string(),
    }
}

struct CliArgs {
    vocabulary: String,
    phrase: String,
    payload: Option<String>,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut vocabulary = None;
        let mut payload = None;
        let mut words = Vec::new();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--vocabulary" | "-v" => {
                    vocabulary = Some(args.next().context("Expected a vocabulary name after --vocabulary")?);
                }
                "--payload" => {
                    payload = Some(args.next().context("Expected codes after --payload")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => words.push(arg),
            }
        }
        let vocabulary =
            vocabulary.ok_or_else(|| anyhow!("Missing --vocabulary. Run with --help for usage instructions."))?;
        Ok(Self {
            vocabulary,
            phrase: words.join(" "),
            payload,
        })
    }
}

fn print_usage() {
    println!("Normalization check");
    println!("Shows how each normalizer strategy classifies a phrase.");
    println!("Usage: cargo run --bin normalize_phrase -- --vocabulary <name> [--payload <codes>] <phrase...>");
}
