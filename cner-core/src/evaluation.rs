//! # Avaliação em Lote
//!
//! Recebe exemplos já anotados (sentença, tags gold e tags preditas, como
//! strings), valida cada um em paralelo e pontua o lote inteiro de uma vez.
//!
//! Exemplos inválidos (tag malformada ou comprimentos diferentes) não
//! derrubam o lote: são pulados e listados no relatório.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::badcase::{report, MismatchRecord};
use crate::error::{NerError, Result, SkippedExample};
use crate::labels::LabelSet;
use crate::metrics::{f1_score_per_label, LabelScore, Scores};
use crate::tagger::Tag;

/// Um exemplo de avaliação, uma linha do JSONL de entrada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub sentence: Vec<String>,
    pub gold: Vec<String>,
    pub predicted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub overall: Scores,
    pub per_label: Vec<LabelScore>,
    pub unknown_spans: usize,
    /// Exemplos efetivamente pontuados.
    pub evaluated: usize,
    pub skipped: Vec<SkippedExample>,
    pub bad_cases: Vec<MismatchRecord>,
}

struct Parsed {
    gold: Vec<Tag>,
    predicted: Vec<Tag>,
}

fn parse_example(index: usize, example: &Example) -> Result<Parsed> {
    let chars = example.sentence.len();
    for tags in [example.gold.len(), example.predicted.len()] {
        if tags != chars {
            return Err(NerError::LengthMismatch { index, chars, tags });
        }
    }
    Ok(Parsed {
        gold: Tag::parse_sequence(&example.gold)?,
        predicted: Tag::parse_sequence(&example.predicted)?,
    })
}

/// Avalia um lote de exemplos contra o conjunto de rótulos.
///
/// Os bad cases são gerados sobre todos os exemplos, inclusive os pulados,
/// já que a comparação é feita sobre as strings.
pub fn evaluate(examples: &[Example], labels: &LabelSet) -> EvaluationReport {
    let parsed: Vec<std::result::Result<Parsed, SkippedExample>> = examples
        .par_iter()
        .enumerate()
        .map(|(index, example)| {
            parse_example(index, example).map_err(|err| SkippedExample::new(index, &err))
        })
        .collect();

    let mut gold = Vec::with_capacity(parsed.len());
    let mut predicted = Vec::with_capacity(parsed.len());
    let mut skipped = Vec::new();
    for result in parsed {
        match result {
            Ok(p) => {
                gold.push(p.gold);
                predicted.push(p.predicted);
            }
            Err(skip) => {
                warn!(index = skip.index, reason = %skip.reason, "exemplo ignorado");
                skipped.push(skip);
            }
        }
    }

    let scores = f1_score_per_label(&gold, &predicted, labels);
    info!(
        evaluated = gold.len(),
        skipped = skipped.len(),
        f1 = scores.overall.f1,
        "avaliação concluída"
    );
    for ls in &scores.per_label {
        debug!(label = %ls.label, f1 = ls.scores.f1, "f1 por rótulo");
    }

    let gold_raw: Vec<Vec<String>> = examples.iter().map(|e| e.gold.clone()).collect();
    let predicted_raw: Vec<Vec<String>> = examples.iter().map(|e| e.predicted.clone()).collect();
    let sentences: Vec<Vec<String>> = examples.iter().map(|e| e.sentence.clone()).collect();
    let bad_cases = report(&gold_raw, &predicted_raw, &sentences);

    EvaluationReport {
        overall: scores.overall,
        per_label: scores.per_label,
        unknown_spans: scores.unknown_spans,
        evaluated: gold.len(),
        skipped,
        bad_cases,
    }
}
