

use std::env;
use std::fs;
use std::path::PathBuf;

use medqa::toolkit::symptoms::TrainingExample;
use medqa::{MedQaConfig, MedQaError, ToolingManager};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn"))
                .add_directive("medqa=info".parse()?),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut models_dir: Option<PathBuf> = None;
    let mut data_dir: Option<PathBuf> = None;
    let mut examples_path: Option<PathBuf> = None;
    let mut top_k: Option<usize> = None;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--models-dir" => {
                if i + 1 < args.len() {
                    models_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--data-dir" => {
                if i + 1 < args.len() {
                    data_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--examples" => {
                if i + 1 < args.len() {
                    examples_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--top-k" | "-k" => {
                if i + 1 < args.len() {
                    top_k = Some(args[i + 1].parse()?);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let Some((command, rest)) = positional.split_first() else {
        print_help();
        return Ok(());
    };
    let text = rest.join(" ");

    let mut config = match config_path {
        Some(path) => MedQaConfig::load(Some(&path))?,
        None => MedQaConfig::from_env()?,
    };
    if let Some(dir) = models_dir {
        config.models_dir = dir;
    }
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }

    let manager = ToolingManager::new(config)?;

    let outcome = match command.as_str() {
        "train" => train(&manager, examples_path),
        "status" => manager.initialize().and_then(|summary| {
            print_json(&serde_json::json!({
                "summary": summary,
                "model": manager.model_metadata(),
            }))
        }),
        "classify" => {
            ensure_loaded(&manager).and_then(|_| print_json(&manager.classify(&text)?))
        }
        "diagnose" => manager
            .initialize()
            .and_then(|_| print_json(&manager.diagnose(&text)?)),
        "describe" => manager
            .load_disease_info()
            .and_then(|_| print_json(&manager.describe_disease(&text))),
        "search" => manager.load_knowledge_corpus().and_then(|_| match top_k {
            Some(k) => print_json(&manager.retrieve(&text, k)?),
            None => print_json(&manager.search(&text)?),
        }),
        "category" => manager
            .load_knowledge_corpus()
            .and_then(|_| print_json(&manager.documents_by_category(&text))),
        unknown => {
            eprintln!("❌ Unknown command: {}", unknown);
            print_help();
            std::process::exit(2);
        }
    };

    if let Err(e) = outcome {
        report_error(&e);
        std::process::exit(1);
    }
    Ok(())
}

fn train(manager: &ToolingManager, examples_path: Option<PathBuf>) -> medqa::Result<()> {
    println!("🩺 MedQA - Model Training");

    let accuracy = match examples_path {
        Some(path) => {
            println!("   Examples: {}", path.display());
            let raw = fs::read_to_string(&path)?;
            let examples: Vec<TrainingExample> = serde_json::from_str(&raw)
                .map_err(|e| MedQaError::InvalidArgument(format!("{}: {e}", path.display())))?;
            manager.train_classifier(&examples)?
        }
        None => {
            println!("   Diseases: {}", manager.config().diseases_path().display());
            manager.train_from_disease_data()?
        }
    };

    println!(
        "   ✅ Trained on {} examples, {:.2}% accuracy on {} held out",
        accuracy.train_size,
        accuracy.accuracy * 100.0,
        accuracy.test_size
    );
    println!(
        "   Saved to {} and {}",
        manager.config().vectorizer_path().display(),
        manager.config().classifier_path().display()
    );
    Ok(())
}

fn ensure_loaded(manager: &ToolingManager) -> medqa::Result<()> {
    if manager.load_classifier()? {
        Ok(())
    } else {
        Err(MedQaError::ModelNotLoaded)
    }
}

fn print_json<T: Serialize>(value: &T) -> medqa::Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| MedQaError::Internal(e.to_string()))?;
    println!("{}", rendered);
    Ok(())
}

fn report_error(error: &MedQaError) {
    let body = serde_json::json!({
        "status": error.status_code(),
        "error": error.to_string(),
    });
    eprintln!("{}", body);
}

fn print_help() {
    println!(
        r#"MedQA - symptom classification and medical knowledge search

USAGE:
    medqa [OPTIONS] <COMMAND> [TEXT...]

COMMANDS:
    train                 Train from diseases.json (or --examples FILE)
    classify <symptoms>   Rank likely conditions
    diagnose <symptoms>   Classify and attach disease guidance
    describe <disease>    Show guidance for a disease
    search <question>     Retrieve knowledge documents
    category <name>       List documents in a category
    status                Show what is loaded

OPTIONS:
    -c, --config <FILE>      Config file (TOML/JSON); MEDQA_* env vars override
                             Without it, config comes from MEDQA_* env vars only
        --models-dir <DIR>   Model artifact directory
        --data-dir <DIR>     Data directory
        --examples <FILE>    JSON array of {{symptoms_text, disease_label}}
    -k, --top-k <N>          Documents to return for search
    -h, --help               Print this help

ENVIRONMENT:
    RUST_LOG                 Log filter (default: warn,medqa=info)
"#
    );
}
