//! # Métricas de Avaliação — Precisão, Revocação e F1
//!
//! Compara spans gold com spans preditos usando **igualdade estrita**: um span
//! predito só conta como acerto se tipo, início e fim coincidem exatamente.
//!
//! - `precision = acertos / |preditos|` (0 se não houver preditos)
//! - `recall    = acertos / |gold|`     (0 se não houver gold)
//! - `f1        = 2·p·r / (p + r)`      (0 se `p + r == 0`)
//!
//! Denominadores vazios nunca são erro: o resultado é 0 por convenção.
//!
//! A média é **micro**: todos os spans de todos os rótulos entram no mesmo
//! pool. O relatório por rótulo repete o cálculo filtrando pelos rótulos do
//! [`LabelSet`], na ordem do conjunto.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::labels::LabelSet;
use crate::span::{decode_batch, Span};
use crate::tagger::Tag;

/// Precisão, revocação e F1 de uma comparação gold × predito.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Scores {
    /// Calcula as métricas a partir das contagens brutas.
    pub fn from_counts(correct: usize, predicted: usize, gold: usize) -> Self {
        let precision = ratio(correct, predicted);
        let recall = ratio(correct, gold);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self { precision, recall, f1 }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Métricas de um rótulo individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    #[serde(flatten)]
    pub scores: Scores,
}

/// Relatório por rótulo mais o resultado geral (não filtrado).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelReport {
    pub overall: Scores,
    /// Um item por rótulo do conjunto, na ordem do conjunto.
    pub per_label: Vec<LabelScore>,
    /// Spans (gold ou preditos) cujo tipo não pertence ao conjunto.
    pub unknown_spans: usize,
}

impl LabelReport {
    /// Métricas de um rótulo específico.
    pub fn get(&self, label: &str) -> Option<&Scores> {
        self.per_label
            .iter()
            .find(|ls| ls.label == label)
            .map(|ls| &ls.scores)
    }
}

/// Compara dois conjuntos de spans (média micro).
pub fn score(gold: &HashSet<Span>, predicted: &HashSet<Span>) -> Scores {
    let correct = gold.intersection(predicted).count();
    Scores::from_counts(correct, predicted.len(), gold.len())
}

/// Calcula as métricas gerais e, para cada rótulo do conjunto, as métricas
/// restritas àquele rótulo.
///
/// Spans de tipo desconhecido entram no resultado geral, mas ficam fora de
/// todos os buckets por rótulo; são contados e reportados via `warn!`.
pub fn score_per_label(
    gold: &HashSet<Span>,
    predicted: &HashSet<Span>,
    labels: &LabelSet,
) -> LabelReport {
    let overall = score(gold, predicted);

    let mut unknown: Vec<&str> = gold
        .iter()
        .chain(predicted.iter())
        .filter(|span| !labels.contains(&span.label))
        .map(|span| span.label.as_str())
        .collect();
    let unknown_spans = unknown.len();
    if unknown_spans > 0 {
        unknown.sort_unstable();
        unknown.dedup();
        warn!(
            unknown_spans,
            labels = ?unknown,
            "spans com rótulos fora do conjunto configurado foram ignorados no relatório por rótulo"
        );
    }

    let per_label = labels
        .iter()
        .map(|label| {
            let gold_label = filter_label(gold, label);
            let pred_label = filter_label(predicted, label);
            LabelScore {
                label: label.to_string(),
                scores: score(&gold_label, &pred_label),
            }
        })
        .collect();

    LabelReport { overall, per_label, unknown_spans }
}

fn filter_label(spans: &HashSet<Span>, label: &str) -> HashSet<Span> {
    spans.iter().filter(|s| s.label == label).cloned().collect()
}

/// F1 geral entre dois lotes de sequências de tags (modo "dev").
pub fn f1_score(gold: &[Vec<Tag>], predicted: &[Vec<Tag>]) -> f64 {
    let gold: HashSet<Span> = decode_batch(gold).into_iter().collect();
    let predicted: HashSet<Span> = decode_batch(predicted).into_iter().collect();
    score(&gold, &predicted).f1
}

/// Relatório completo entre dois lotes de sequências de tags (modo "test").
pub fn f1_score_per_label(
    gold: &[Vec<Tag>],
    predicted: &[Vec<Tag>],
    labels: &LabelSet,
) -> LabelReport {
    let gold: HashSet<Span> = decode_batch(gold).into_iter().collect();
    let predicted: HashSet<Span> = decode_batch(predicted).into_iter().collect();
    score_per_label(&gold, &predicted, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(spans: &[(&str, usize, usize)]) -> HashSet<Span> {
        spans.iter().map(|(l, s, e)| Span::new(*l, *s, *e)).collect()
    }

    fn batch(raw: &[&[&str]]) -> Vec<Vec<Tag>> {
        raw.iter().map(|seq| Tag::parse_sequence(seq).unwrap()).collect()
    }

    #[test]
    fn test_precision_recall_f1() {
        let gold = set(&[("PER", 0, 1), ("LOC", 3, 3)]);
        let pred = set(&[("PER", 0, 1)]);
        let s = score(&gold, &pred);
        assert_eq!(s.precision, 1.0);
        assert_eq!(s.recall, 0.5);
        assert!((s.f1 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_sets_give_zero() {
        let s = score(&HashSet::new(), &HashSet::new());
        assert_eq!(s, Scores::default());
        assert!(!s.f1.is_nan());

        let s = score(&set(&[("date", 0, 2)]), &HashSet::new());
        assert_eq!(s.precision, 0.0);
        assert_eq!(s.recall, 0.0);
        assert_eq!(s.f1, 0.0);
    }

    #[test]
    fn test_boundaries_must_match_exactly() {
        let gold = set(&[("PER", 0, 1)]);
        let pred = set(&[("PER", 0, 2)]);
        assert_eq!(score(&gold, &pred).f1, 0.0);

        let pred = set(&[("LOC", 0, 1)]);
        assert_eq!(score(&gold, &pred).precision, 0.0);
    }

    #[test]
    fn test_f1_score_on_batches() {
        let gold = batch(&[
            &["O", "O", "O", "B-MISC", "I-MISC", "I-MISC", "O"],
            &["B-PER", "I-PER", "O"],
        ]);
        let pred = batch(&[
            &["O", "O", "B-MISC", "I-MISC", "I-MISC", "I-MISC", "O"],
            &["B-PER", "I-PER", "O"],
        ]);
        assert!((f1_score(&gold, &pred) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_per_label_report() {
        let labels = LabelSet::new(["name", "date", "location"]).unwrap();
        let gold = set(&[("name", 0, 1), ("date", 3, 5), ("date", 8, 9)]);
        let pred = set(&[("name", 0, 1), ("date", 3, 5), ("location", 8, 9)]);
        let report = score_per_label(&gold, &pred, &labels);

        assert_eq!(report.per_label.len(), 3);
        assert_eq!(report.per_label[0].label, "name");
        assert_eq!(report.get("name").unwrap().f1, 1.0);
        let date = report.get("date").unwrap();
        assert_eq!(date.precision, 1.0);
        assert_eq!(date.recall, 0.5);
        assert_eq!(report.get("location").unwrap().f1, 0.0);
        assert!((report.overall.f1 - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.unknown_spans, 0);
    }

    #[test]
    fn test_unknown_labels_excluded_from_buckets() {
        let labels = LabelSet::new(["name"]).unwrap();
        let gold = set(&[("name", 0, 1), ("vaccine", 4, 5)]);
        let pred = set(&[("name", 0, 1), ("vaccine", 4, 5)]);
        let report = score_per_label(&gold, &pred, &labels);

        assert_eq!(report.unknown_spans, 2);
        assert_eq!(report.per_label.len(), 1);
        assert_eq!(report.get("vaccine"), None);
        // O resultado geral continua contando o span desconhecido
        assert_eq!(report.overall.f1, 1.0);
    }

    #[test]
    fn test_report_serializes_flat_scores() {
        let labels = LabelSet::new(["date"]).unwrap();
        let report = score_per_label(&HashSet::new(), &HashSet::new(), &labels);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["per_label"][0]["label"], "date");
        assert_eq!(json["per_label"][0]["f1"], 0.0);
    }
}
