//! CLI de avaliação e extração offline sobre o `cner-core`.
//!
//! ```bash
//! cner-eval evaluate --input dev.jsonl --case-file case/bad_case.txt
//! cner-eval resolve --input preds.jsonl
//! cner-eval extract --lexicon pessoas.json --trajectory-lexicon trajetos.json --input req.json
//! cner-eval prepare --input train.json > train.jsonl
//! cner-eval chunk --text "..." --window 4
//! ```
//!
//! O nível de log vem de `RUST_LOG` (padrão `info`).

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cner_core::{
    chunker::chunk,
    evaluate,
    records::{travel_pipeline, Envelope, ExtractionRequest},
    resolve_batch_labels,
    tokenizer::{clean_chars, prepare_training, AnnotatedText, CleanMode},
    CaseFile, EntityMap, Example, LexiconTagger, NerConfig, SkippedExample,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cner-eval", version, about = "Avaliação e pós-processamento de NER chinês")]
struct Cli {
    /// Configuração JSON (rótulos, janela, arquivo de casos, resolvedor)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pontua predições contra o gold e grava os bad cases
    Evaluate {
        /// JSONL com `{sentence, gold, predicted}` por linha
        #[arg(long)]
        input: PathBuf,
        /// Sobrescreve `case_file` da configuração
        #[arg(long)]
        case_file: Option<PathBuf>,
    },
    /// Resolve entidades a partir de texto + tags já preditas
    Resolve {
        /// JSONL com `{text, tags}` por linha
        #[arg(long)]
        input: PathBuf,
    },
    /// Extrai linhas de trajeto usando léxicos como preditores
    Extract {
        /// Léxico JSON (rótulo → superfícies) das colunas de pessoa e veículo
        #[arg(long)]
        lexicon: PathBuf,
        /// Léxico das colunas de data e local; sem ele, usa `--lexicon`
        #[arg(long)]
        trajectory_lexicon: Option<PathBuf>,
        /// Array JSON de requisições
        #[arg(long)]
        input: PathBuf,
    },
    /// Gera o JSONL `{sentence, gold}` de treino a partir de textos anotados
    Prepare {
        /// Array JSON de `{text, labels: [[start, end, rótulo], ...]}`
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        window: Option<NonZeroUsize>,
    },
    /// Mostra as janelas de um texto já limpo
    Chunk {
        #[arg(long)]
        text: String,
        #[arg(long)]
        window: Option<NonZeroUsize>,
    },
}

/// Uma linha do JSONL de `resolve`.
#[derive(Deserialize)]
struct TaggedText {
    text: String,
    tags: Vec<String>,
}

/// Uma janela de treino.
#[derive(Serialize)]
struct TrainingWindow {
    sentence: Vec<String>,
    gold: Vec<String>,
}

#[derive(Serialize)]
struct ResolveOutput {
    entities: EntityMap,
    skipped: Vec<SkippedExample>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => NerConfig::from_path(path)
            .with_context(|| format!("falha ao carregar a configuração {}", path.display()))?,
        None => NerConfig::default(),
    };

    match cli.command {
        Command::Evaluate { input, case_file } => run_evaluate(&config, &input, case_file),
        Command::Resolve { input } => run_resolve(&config, &input),
        Command::Extract { lexicon, trajectory_lexicon, input } => {
            run_extract(&config, &lexicon, trajectory_lexicon.as_deref(), &input)
        }
        Command::Prepare { input, window } => run_prepare(&config, &input, window),
        Command::Chunk { text, window } => run_chunk(&config, &text, window),
    }
}

fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("falha ao abrir {}", path.display()))?;
    let mut rows = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: JSON inválido", path.display(), n + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("falha ao ler {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{}: JSON inválido", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_evaluate(config: &NerConfig, input: &Path, case_file: Option<PathBuf>) -> Result<()> {
    let examples: Vec<Example> = read_jsonl(input)?;
    if examples.is_empty() {
        bail!("nenhum exemplo em {}", input.display());
    }
    info!(examples = examples.len(), "avaliando");

    let report = evaluate(&examples, &config.labels);
    for ls in &report.per_label {
        info!(label = %ls.label, f1 = ls.scores.f1, "f1 por rótulo");
    }

    let sink = CaseFile::new(case_file.unwrap_or_else(|| config.case_file.clone()));
    sink.append(&report.bad_cases)
        .with_context(|| format!("falha ao gravar {}", sink.path().display()))?;

    print_json(&report)
}

fn run_resolve(config: &NerConfig, input: &Path) -> Result<()> {
    let rows: Vec<TaggedText> = read_jsonl(input)?;
    let texts: Vec<Vec<char>> = rows.iter().map(|r| r.text.chars().collect()).collect();
    let tags: Vec<Vec<String>> = rows.into_iter().map(|r| r.tags).collect();

    let resolution = resolve_batch_labels(&texts, &tags, &config.labels, config.resolver);
    info!(
        entities = resolution.entities.total(),
        skipped = resolution.skipped.len(),
        "resolução concluída"
    );

    print_json(&ResolveOutput { entities: resolution.entities, skipped: resolution.skipped })
}

fn load_lexicon(config: &NerConfig, path: &Path) -> Result<LexiconTagger> {
    LexiconTagger::from_path(config.labels.clone(), path)
        .with_context(|| format!("falha ao carregar o léxico {}", path.display()))
}

fn run_extract(
    config: &NerConfig,
    lexicon: &Path,
    trajectory_lexicon: Option<&Path>,
    input: &Path,
) -> Result<()> {
    let identity = load_lexicon(config, lexicon)?;
    let trajectory = match trajectory_lexicon {
        Some(path) => load_lexicon(config, path)?,
        None => identity.clone(),
    };
    let requests: Vec<ExtractionRequest> = read_json(input)?;

    let pipeline = travel_pipeline(identity, trajectory, config)?;
    let mut data = Vec::new();
    for request in &requests {
        let rows = pipeline
            .travel_records(request)
            .with_context(|| format!("falha na requisição {}", request.event_id))?;
        data.extend(rows);
    }
    info!(requests = requests.len(), rows = data.len(), "extração concluída");

    print_json(&Envelope::success(data))
}

fn run_prepare(config: &NerConfig, input: &Path, window: Option<NonZeroUsize>) -> Result<()> {
    let window = match window {
        Some(w) => w,
        None => config.window()?,
    };
    let texts: Vec<AnnotatedText> = read_json(input)?;

    let mut windows = 0;
    let mut skipped = 0;
    for (index, example) in texts.iter().enumerate() {
        let chunks = match prepare_training(example, window) {
            Ok(chunks) => chunks,
            Err(err) => {
                warn!(index, error = %err, "texto de treino ignorado");
                skipped += 1;
                continue;
            }
        };
        for (chars, tags) in chunks {
            let row = TrainingWindow {
                sentence: chars.iter().map(char::to_string).collect(),
                gold: tags.iter().map(|t| t.label()).collect(),
            };
            println!("{}", serde_json::to_string(&row)?);
            windows += 1;
        }
    }
    info!(texts = texts.len(), windows, skipped, "preparação concluída");
    Ok(())
}

fn run_chunk(config: &NerConfig, text: &str, window: Option<NonZeroUsize>) -> Result<()> {
    let window = match window {
        Some(w) => w,
        None => config.window()?,
    };
    let chars = clean_chars(text, CleanMode::Prediction);
    let windows: Vec<String> = chunk(&chars, window)
        .into_iter()
        .map(|w| w.into_iter().collect())
        .collect();
    print_json(&windows)
}
