//! # Resolvedor de Entidades por Votação de Maioria
//!
//! Percorre caracteres e tags em passo único, acumulando corridas `B`/`I` no
//! texto da entidade. Modelos caractere a caractere às vezes trocam o tipo no
//! meio de uma entidade (`深`=B-abroad, `圳`=I-domestic); o tipo final é
//! decidido por **votação de maioria** entre os sufixos vistos na corrida.
//!
//! ## Regras
//!
//! - `B`: fecha a entidade em curso (se houver) e começa outra com este caractere.
//! - `I`: anexa o caractere e registra o voto do seu tipo.
//! - `O` ou qualquer outra categoria (inclusive `S`): fecha a entidade em curso
//!   (se houver) e zera buffer e votos.
//! - Fechamento: vence o tipo mais votado; empates vão para o primeiro tipo
//!   registrado entre os de contagem máxima. O texto é anexado a cada rótulo
//!   do conjunto compatível com o vencedor (ver [`LabelMatch`]).
//! - Fim da sequência: a entidade ainda aberta **não** é descarregada, a menos
//!   que [`ResolverOptions::flush_trailing`] esteja ligado.

use std::fmt;

use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::{NerError, Result, SkippedExample};
use crate::labels::LabelSet;
use crate::tagger::Tag;

/// Como o tipo vencedor é comparado com os nomes dos rótulos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMatch {
    /// O vencedor precisa estar **contido** no nome do rótulo
    /// (ex: vencedor `"at"` casa com `"date"` e `"location"`).
    #[default]
    Substring,
    /// O vencedor precisa ser exatamente o nome do rótulo.
    Exact,
}

impl LabelMatch {
    fn accepts(self, label: &str, winner: &str) -> bool {
        match self {
            LabelMatch::Substring => label.contains(winner),
            LabelMatch::Exact => label == winner,
        }
    }
}

/// Opções do resolvedor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    pub label_match: LabelMatch,
    /// Descarrega a entidade que termina exatamente no último caractere.
    pub flush_trailing: bool,
}

/// Mapa rótulo → textos de entidade, na ordem de aparição.
///
/// As chaves seguem a ordem do [`LabelSet`] que criou o mapa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMap {
    labels: Vec<String>,
    entities: Vec<Vec<String>>,
}

impl EntityMap {
    /// Mapa vazio com uma entrada por rótulo do conjunto.
    pub fn new(labels: &LabelSet) -> Self {
        Self {
            labels: labels.iter().map(str::to_string).collect(),
            entities: vec![Vec::new(); labels.len()],
        }
    }

    /// Entidades de um rótulo (vazio se o rótulo não existir no mapa).
    pub fn get(&self, label: &str) -> &[String] {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.entities[i].as_slice())
            .unwrap_or(&[])
    }

    /// Anexa as entidades de `other`, rótulo a rótulo, preservando a ordem.
    pub fn merge(&mut self, other: EntityMap) {
        for (label, texts) in other.labels.into_iter().zip(other.entities) {
            match self.labels.iter().position(|l| *l == label) {
                Some(i) => self.entities[i].extend(texts),
                None => {
                    self.labels.push(label);
                    self.entities.push(texts);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.entities.iter().map(Vec::as_slice))
    }

    /// Número total de entidades em todos os rótulos.
    pub fn total(&self) -> usize {
        self.entities.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn push(&mut self, index: usize, text: &str) {
        self.entities[index].push(text.to_string());
    }
}

impl Serialize for EntityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.labels.len()))?;
        for (label, texts) in self.iter() {
            map.serialize_entry(label, texts)?;
        }
        map.end()
    }
}

impl fmt::Display for EntityMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, texts) in self.iter().filter(|(_, t)| !t.is_empty()) {
            writeln!(f, "{label}: {}", texts.join(", "))?;
        }
        Ok(())
    }
}

/// Buffer da corrida em curso: texto acumulado e votos por tipo.
#[derive(Default)]
struct Run {
    text: String,
    /// Tipos na ordem do primeiro voto, com suas contagens.
    votes: Vec<(String, usize)>,
}

impl Run {
    fn vote(&mut self, kind: &str) {
        match self.votes.iter_mut().find(|(k, _)| k == kind) {
            Some((_, count)) => *count += 1,
            None => self.votes.push((kind.to_string(), 1)),
        }
    }

    /// Tipo mais votado; empate fica com o primeiro registrado.
    fn winner(&self) -> Option<&str> {
        let max = self.votes.iter().map(|(_, c)| *c).max()?;
        self.votes
            .iter()
            .find(|(_, c)| *c == max)
            .map(|(k, _)| k.as_str())
    }

    fn close(&mut self, labels: &LabelSet, policy: LabelMatch, map: &mut EntityMap) {
        if let Some(winner) = self.winner() {
            let mut placed = false;
            for (i, label) in labels.iter().enumerate() {
                if policy.accepts(label, winner) {
                    map.push(i, &self.text);
                    placed = true;
                }
            }
            if !placed {
                debug!(entity = %self.text, winner, "entidade sem rótulo compatível descartada");
            }
        }
        self.clear();
    }

    fn clear(&mut self) {
        self.text.clear();
        self.votes.clear();
    }
}

/// Resolve as entidades de um exemplo.
///
/// Falha com [`NerError::SequenceMismatch`] se `text` e `tags` tiverem
/// tamanhos diferentes.
pub fn resolve(
    text: &[char],
    tags: &[Tag],
    labels: &LabelSet,
    options: ResolverOptions,
) -> Result<EntityMap> {
    if text.len() != tags.len() {
        return Err(NerError::SequenceMismatch { chars: text.len(), tags: tags.len() });
    }
    Ok(resolve_aligned(text, tags, labels, options))
}

/// Varredura em si; `text` e `tags` já têm o mesmo tamanho.
fn resolve_aligned(
    text: &[char],
    tags: &[Tag],
    labels: &LabelSet,
    options: ResolverOptions,
) -> EntityMap {
    let mut map = EntityMap::new(labels);
    let mut run = Run::default();

    for (&ch, tag) in text.iter().zip(tags) {
        match tag {
            Tag::Begin(kind) => {
                if !run.text.is_empty() {
                    run.close(labels, options.label_match, &mut map);
                }
                run.text.push(ch);
                run.vote(kind);
            }
            Tag::Inside(kind) => {
                run.text.push(ch);
                run.vote(kind);
            }
            Tag::Outside | Tag::Single(_) => {
                if !run.text.is_empty() {
                    run.close(labels, options.label_match, &mut map);
                }
                run.clear();
            }
        }
    }

    if !run.text.is_empty() {
        if options.flush_trailing {
            run.close(labels, options.label_match, &mut map);
        } else {
            debug!(entity = %run.text, "entidade no fim da sequência não descarregada");
        }
    }

    map
}

/// Resultado da resolução de um lote.
#[derive(Debug, Clone)]
pub struct BatchResolution {
    /// Entidades de todos os exemplos válidos, concatenadas na ordem do lote.
    pub entities: EntityMap,
    pub skipped: Vec<SkippedExample>,
}

/// Resolve um lote em paralelo e junta os resultados na ordem original.
///
/// Exemplos com tamanhos divergentes são pulados sem bloquear o restante.
pub fn resolve_batch(
    texts: &[Vec<char>],
    tags: &[Vec<Tag>],
    labels: &LabelSet,
    options: ResolverOptions,
) -> BatchResolution {
    let n = texts.len().max(tags.len());
    let results: Vec<Result<EntityMap>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let (text, seq) = aligned_pair(i, texts.get(i), tags.get(i))?;
            Ok(resolve_aligned(text, seq, labels, options))
        })
        .collect();
    gather(results, labels)
}

/// Como [`resolve_batch`], mas com as tags ainda em texto.
///
/// Uma tag malformada derruba só o seu exemplo, que vai para `skipped` no
/// índice original.
pub fn resolve_batch_labels<S>(
    texts: &[Vec<char>],
    tags: &[Vec<S>],
    labels: &LabelSet,
    options: ResolverOptions,
) -> BatchResolution
where
    S: AsRef<str> + Sync,
{
    let n = texts.len().max(tags.len());
    let results: Vec<Result<EntityMap>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let (text, raw) = aligned_pair(i, texts.get(i), tags.get(i))?;
            let seq = Tag::parse_sequence(raw)?;
            Ok(resolve_aligned(text, &seq, labels, options))
        })
        .collect();
    gather(results, labels)
}

fn aligned_pair<'a, T>(
    index: usize,
    text: Option<&'a Vec<char>>,
    tags: Option<&'a Vec<T>>,
) -> Result<(&'a [char], &'a [T])> {
    match (text, tags) {
        (Some(text), Some(seq)) if text.len() == seq.len() => {
            Ok((text.as_slice(), seq.as_slice()))
        }
        (text, seq) => Err(NerError::LengthMismatch {
            index,
            chars: text.map_or(0, Vec::len),
            tags: seq.map_or(0, Vec::len),
        }),
    }
}

fn gather(results: Vec<Result<EntityMap>>, labels: &LabelSet) -> BatchResolution {
    let mut entities = EntityMap::new(labels);
    let mut skipped = Vec::new();
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(map) => entities.merge(map),
            Err(err) => {
                warn!(index = i, error = %err, "exemplo pulado na resolução");
                skipped.push(SkippedExample::new(i, &err));
            }
        }
    }
    BatchResolution { entities, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn tags(raw: &[&str]) -> Vec<Tag> {
        Tag::parse_sequence(raw).unwrap()
    }

    fn trailing() -> ResolverOptions {
        ResolverOptions { flush_trailing: true, ..Default::default() }
    }

    #[test]
    fn test_majority_vote_tie_goes_to_first_seen() {
        let labels = LabelSet::clue();
        let map = resolve(
            &chars("深圳。"),
            &tags(&["B-abroad", "I-domestic", "O"]),
            &labels,
            ResolverOptions::default(),
        )
        .unwrap();
        assert_eq!(map.get("abroad"), ["深圳"]);
        assert!(map.get("domestic").is_empty());
    }

    #[test]
    fn test_majority_vote_wins() {
        let labels = LabelSet::clue();
        let map = resolve(
            &chars("伊斯坦布尔，"),
            &tags(&["B-domestic", "I-abroad", "I-abroad", "I-abroad", "I-domestic", "O"]),
            &labels,
            ResolverOptions::default(),
        )
        .unwrap();
        assert_eq!(map.get("abroad"), ["伊斯坦布尔"]);
        assert!(map.get("domestic").is_empty());
    }

    #[test]
    fn test_begin_closes_previous_entity() {
        let labels = LabelSet::clue();
        let map = resolve(
            &chars("周静张三说"),
            &tags(&["B-name", "I-name", "B-name", "I-name", "O"]),
            &labels,
            ResolverOptions::default(),
        )
        .unwrap();
        assert_eq!(map.get("name"), ["周静", "张三"]);
    }

    #[test]
    fn test_trailing_entity_not_flushed_by_default() {
        let labels = LabelSet::clue();
        let text = chars("到达广州");
        let seq = tags(&["O", "O", "B-location", "I-location"]);

        let map = resolve(&text, &seq, &labels, ResolverOptions::default()).unwrap();
        assert!(map.get("location").is_empty());

        let map = resolve(&text, &seq, &labels, trailing()).unwrap();
        assert_eq!(map.get("location"), ["广州"]);
    }

    #[test]
    fn test_single_tag_acts_as_outside() {
        let labels = LabelSet::clue();
        let map = resolve(
            &chars("京溪X"),
            &tags(&["B-location", "I-location", "S-CT"]),
            &labels,
            ResolverOptions::default(),
        )
        .unwrap();
        assert_eq!(map.get("location"), ["京溪"]);
        assert!(map.get("CT").is_empty());
    }

    #[test]
    fn test_inside_without_begin_starts_entity() {
        let labels = LabelSet::clue();
        let map = resolve(
            &chars("口罩。"),
            &tags(&["I-mask", "I-mask", "O"]),
            &labels,
            ResolverOptions::default(),
        )
        .unwrap();
        assert_eq!(map.get("mask"), ["口罩"]);
    }

    #[test]
    fn test_substring_policy_vs_exact() {
        let labels = LabelSet::new(["date", "location", "person"]).unwrap();
        let text = chars("某地，");
        let seq = tags(&["B-at", "I-at", "O"]);

        let map = resolve(&text, &seq, &labels, ResolverOptions::default()).unwrap();
        assert_eq!(map.get("date"), ["某地"]);
        assert_eq!(map.get("location"), ["某地"]);
        assert!(map.get("person").is_empty());

        let exact = ResolverOptions { label_match: LabelMatch::Exact, ..Default::default() };
        let map = resolve(&text, &seq, &labels, exact).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_length_mismatch() {
        let labels = LabelSet::clue();
        let options = ResolverOptions::default();
        let err = resolve(&chars("深圳"), &tags(&["B-abroad"]), &labels, options);
        assert!(matches!(err, Err(NerError::SequenceMismatch { chars: 2, tags: 1 })));
    }

    #[test]
    fn test_batch_preserves_order_and_skips_bad_examples() {
        let labels = LabelSet::clue();
        let texts = vec![chars("周静说"), chars("坏例"), chars("张三说")];
        let seqs = vec![
            tags(&["B-name", "I-name", "O"]),
            tags(&["B-name"]),
            tags(&["B-name", "I-name", "O"]),
        ];
        let batch = resolve_batch(&texts, &seqs, &labels, ResolverOptions::default());

        assert_eq!(batch.entities.get("name"), ["周静", "张三"]);
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].index, 1);
    }

    #[test]
    fn test_string_batch_isolates_malformed_row() {
        let labels = LabelSet::clue();
        let texts = vec![chars("周静说"), chars("深圳。"), chars("张三说")];
        let seqs = vec![
            vec!["B-name", "I-name", "O"],
            vec!["B-abroad", "E-abroad", "O"],
            vec!["B-name", "I-name", "O"],
        ];
        let batch = resolve_batch_labels(&texts, &seqs, &labels, ResolverOptions::default());

        assert_eq!(batch.entities.get("name"), ["周静", "张三"]);
        assert!(batch.entities.get("abroad").is_empty());
        let skipped: Vec<usize> = batch.skipped.iter().map(|s| s.index).collect();
        assert_eq!(skipped, vec![1]);
        assert!(batch.skipped[0].reason.contains("E-abroad"));
    }

    #[test]
    fn test_string_batch_length_mismatch_keeps_index() {
        let labels = LabelSet::clue();
        let texts = vec![chars("深圳"), chars("周静说")];
        let seqs = vec![vec!["B-abroad"], vec!["B-name", "I-name", "O"]];
        let batch = resolve_batch_labels(&texts, &seqs, &labels, ResolverOptions::default());
        assert_eq!(batch.entities.get("name"), ["周静"]);
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].index, 0);
    }

    #[test]
    fn test_batch_with_missing_tag_sequence() {
        let labels = LabelSet::clue();
        let texts = vec![chars("周静说"), chars("多余")];
        let seqs = vec![tags(&["B-name", "I-name", "O"])];
        let batch = resolve_batch(&texts, &seqs, &labels, ResolverOptions::default());
        assert_eq!(batch.entities.total(), 1);
        assert_eq!(batch.skipped[0].index, 1);
    }

    #[test]
    fn test_entity_map_serializes_in_label_order() {
        let labels = LabelSet::new(["name", "date"]).unwrap();
        let mut map = EntityMap::new(&labels);
        map.push(1, "10月27日");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"name":[],"date":["10月27日"]}"#);
    }

    #[test]
    fn test_entity_map_merge() {
        let labels = LabelSet::new(["name", "date"]).unwrap();
        let mut a = EntityMap::new(&labels);
        a.push(0, "周静");
        let mut b = EntityMap::new(&labels);
        b.push(0, "张三");
        b.push(1, "2020年");
        a.merge(b);
        assert_eq!(a.get("name"), ["周静", "张三"]);
        assert_eq!(a.get("date"), ["2020年"]);
        assert_eq!(a.total(), 3);
    }
}
