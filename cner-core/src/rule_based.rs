//! # Tagger de Léxico — Gazetteers por Rótulo
//!
//! Um preditor determinístico que complementa (ou substitui, em testes e
//! demonstrações) o modelo neural: listas de entidades conhecidas por rótulo,
//! casadas contra o texto pela **maior correspondência** da esquerda para a
//! direita.
//!
//! Cada ocorrência vira `B-<rótulo>` seguido de `I-<rótulo>`; o resto é `O`.
//! O formato JSON do léxico é um objeto rótulo → lista de superfícies:
//!
//! ```json
//! { "location": ["广州", "广州白云国际机场"], "license": ["tk72"] }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{NerError, Result};
use crate::labels::LabelSet;
use crate::pipeline::TagPredictor;
use crate::tagger::Tag;

/// Uma entrada do léxico: a superfície em caracteres e o rótulo.
#[derive(Debug, Clone)]
struct Entry {
    surface: Vec<char>,
    label: String,
}

/// Tagger baseado em gazetteers por rótulo.
#[derive(Debug, Clone)]
pub struct LexiconTagger {
    labels: LabelSet,
    /// Mantidas da maior para a menor superfície.
    entries: Vec<Entry>,
}

impl LexiconTagger {
    pub fn new(labels: LabelSet) -> Self {
        Self { labels, entries: Vec::new() }
    }

    /// Carrega um léxico JSON (rótulo → superfícies).
    pub fn from_path(labels: LabelSet, path: impl AsRef<Path>) -> Result<Self> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(&fs::read_to_string(path)?)?;
        let mut tagger = Self::new(labels);
        for (label, surfaces) in &raw {
            for surface in surfaces {
                tagger.add_entry(label, surface)?;
            }
        }
        Ok(tagger)
    }

    /// Adiciona uma superfície conhecida. Superfícies vazias são ignoradas.
    pub fn add_entry(&mut self, label: &str, surface: &str) -> Result<()> {
        if !self.labels.contains(label) {
            return Err(NerError::UnknownLabel { label: label.to_string() });
        }
        let surface: Vec<char> = surface.chars().collect();
        if surface.is_empty() {
            return Ok(());
        }
        // Inserção estável: entre superfícies do mesmo tamanho vale a primeira
        let at = self
            .entries
            .partition_point(|e| e.surface.len() >= surface.len());
        self.entries.insert(at, Entry { surface, label: label.to_string() });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aplica o léxico a uma janela de caracteres.
    pub fn tag(&self, chars: &[char]) -> Vec<Tag> {
        let mut tags = Vec::with_capacity(chars.len());
        let mut i = 0;
        while i < chars.len() {
            let found = self
                .entries
                .iter()
                .find(|e| chars[i..].starts_with(&e.surface));
            match found {
                Some(entry) => {
                    tags.push(Tag::Begin(entry.label.clone()));
                    for _ in 1..entry.surface.len() {
                        tags.push(Tag::Inside(entry.label.clone()));
                    }
                    i += entry.surface.len();
                }
                None => {
                    tags.push(Tag::Outside);
                    i += 1;
                }
            }
        }
        tags
    }
}

impl TagPredictor for LexiconTagger {
    fn predict(&self, chunk: &[char]) -> Result<Vec<Tag>> {
        Ok(self.tag(chunk))
    }
}
