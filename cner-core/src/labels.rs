//! # Conjunto de Rótulos e Vocabulário de Tags
//!
//! O conjunto de rótulos é um valor **imutável** passado explicitamente a
//! quem precisa dele (scorer, resolvedor, tagger de léxico). Não existe
//! estado global.
//!
//! ## Vocabulário de ids
//!
//! Para `n` rótulos, o vocabulário segue o layout `label2id` do modelo:
//!
//! | Id            | Tag            |
//! |---------------|----------------|
//! | `0`           | `O`            |
//! | `1 + i`       | `B-<rótulo_i>` |
//! | `1 + n + i`   | `I-<rótulo_i>` |

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{NerError, Result};
use crate::tagger::Tag;

/// Os 20 rótulos do corpus epidemiológico CLUE usado no treino do modelo.
pub const CLUE_LABELS: [&str; 20] = [
    "name",
    "workplace",
    "occupation",
    "native",
    "abroad",
    "domestic",
    "port",
    "insulate",
    "hospital",
    "date",
    "person",
    "location",
    "mask",
    "airline",
    "license",
    "symptom",
    "test",
    "IG",
    "CT",
    "blood",
];

/// Conjunto ordenado e sem duplicatas de rótulos de entidade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Cria o conjunto, rejeitando rótulos vazios e duplicados.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for label in labels {
            let label = label.into();
            if label.is_empty() {
                return Err(NerError::EmptyLabel);
            }
            if !seen.insert(label.clone()) {
                return Err(NerError::DuplicateLabel { label });
            }
            ordered.push(label);
        }
        Ok(Self { labels: ordered })
    }

    /// Conjunto CLUE padrão ([`CLUE_LABELS`]).
    pub fn clue() -> Self {
        Self {
            labels: CLUE_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Posição do rótulo no conjunto.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Número total de tags no vocabulário (`O` + `B-*` + `I-*`).
    pub fn tag_count(&self) -> usize {
        1 + 2 * self.labels.len()
    }

    /// Id da tag no vocabulário. Tags `S-*` e tipos fora do conjunto não têm id.
    pub fn tag_id(&self, tag: &Tag) -> Option<usize> {
        let n = self.labels.len();
        match tag {
            Tag::Outside => Some(0),
            Tag::Begin(kind) => self.position(kind).map(|i| 1 + i),
            Tag::Inside(kind) => self.position(kind).map(|i| 1 + n + i),
            Tag::Single(_) => None,
        }
    }

    /// Converte um id do modelo de volta para a tag (`id2label`).
    pub fn tag_from_id(&self, id: usize) -> Result<Tag> {
        let n = self.labels.len();
        match id {
            0 => Ok(Tag::Outside),
            i if i <= n => Ok(Tag::Begin(self.labels[i - 1].clone())),
            i if i <= 2 * n => Ok(Tag::Inside(self.labels[i - 1 - n].clone())),
            _ => Err(NerError::UnknownTagId { id }),
        }
    }

    /// Converte uma sequência de ids em tags.
    pub fn tags_from_ids(&self, ids: &[usize]) -> Result<Vec<Tag>> {
        ids.iter().map(|&id| self.tag_from_id(id)).collect()
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::clue()
    }
}

impl TryFrom<Vec<String>> for LabelSet {
    type Error = NerError;

    fn try_from(labels: Vec<String>) -> Result<Self> {
        Self::new(labels)
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(set: LabelSet) -> Self {
        set.labels
    }
}
