//! # Decodificação BIO → Spans
//!
//! Converte a saída "caractere a caractere" do modelo em spans tipados
//! `(tipo, início, fim)`, com índices **inclusivos**.
//!
//! ## Algoritmo
//! 1. Lotes aninhados são achatados explicitamente, com um `O` sentinela após
//!    cada sub-sequência ([`flatten_with_sentinels`]), para que nenhuma
//!    entidade atravesse a fronteira entre exemplos.
//! 2. Um `O` sentinela final força o fechamento da última entidade.
//! 3. Uma máquina de estados compara a tag anterior com a atual:
//!    qualquer transição proibida ou mudança de tipo fecha o span corrente
//!    e (possivelmente ao mesmo tempo) abre outro.
//!
//! O decodificador é tolerante a sequências malformadas (`I` logo após `O`,
//! `B` seguido de `B`) e nunca falha sobre tags já parseadas.
//!
//! ## Exemplo
//! `[O, O, O, B-MISC, I-MISC, I-MISC, O]` → `[("MISC", 3, 5)]`

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tagger::Tag;

/// Uma ocorrência de entidade decodificada.
///
/// Dois spans são iguais apenas se tipo, início e fim coincidem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Tipo da entidade (ex: "date", "location")
    pub label: String,
    /// Índice do primeiro elemento (inclusivo)
    pub start: usize,
    /// Índice do último elemento (inclusivo)
    pub end: usize,
}

impl Span {
    pub fn new(label: impl Into<String>, start: usize, end: usize) -> Self {
        Self { label: label.into(), start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.label, self.start, self.end)
    }
}

/// Achata um lote inserindo um `O` sentinela após cada sub-sequência.
///
/// Os índices dos spans decodificados passam a referir-se a esta sequência
/// achatada (cada exemplo ocupa `len + 1` posições).
pub fn flatten_with_sentinels(batch: &[Vec<Tag>]) -> Vec<Tag> {
    let total: usize = batch.iter().map(|seq| seq.len() + 1).sum();
    let mut flat = Vec::with_capacity(total);
    for seq in batch {
        flat.extend(seq.iter().cloned());
        flat.push(Tag::Outside);
    }
    flat
}

/// Decodifica uma sequência plana de tags em spans, na ordem em que fecham.
pub fn decode(tags: &[Tag]) -> Vec<Span> {
    let sentinel = Tag::Outside;
    let mut spans = Vec::new();
    let mut prev_symbol = 'O';
    let mut prev_type = "";
    let mut begin_offset = 0usize;

    for (i, tag) in tags.iter().chain(std::iter::once(&sentinel)).enumerate() {
        let symbol = tag.symbol();
        let kind = tag.entity_type();

        if end_of_chunk(prev_symbol, symbol, prev_type, kind) {
            spans.push(Span::new(prev_type, begin_offset, i - 1));
        }
        if start_of_chunk(prev_symbol, symbol, prev_type, kind) {
            begin_offset = i;
        }
        prev_symbol = symbol;
        prev_type = kind;
    }

    spans
}

/// Decodifica um lote, achatando-o com sentinelas antes.
pub fn decode_batch(batch: &[Vec<Tag>]) -> Vec<Span> {
    decode(&flatten_with_sentinels(batch))
}

/// Parseia tags em formato string e decodifica.
pub fn decode_labels<S: AsRef<str>>(tags: &[S]) -> Result<Vec<Span>> {
    Ok(decode(&Tag::parse_sequence(tags)?))
}

/// Verifica se um span terminou entre o elemento anterior e o atual.
fn end_of_chunk(prev: char, current: char, prev_type: &str, kind: &str) -> bool {
    match (prev, current) {
        ('S', _) => true,
        ('B' | 'I', 'B' | 'S' | 'O') => true,
        _ => prev != 'O' && prev_type != kind,
    }
}

/// Verifica se um span começou entre o elemento anterior e o atual.
fn start_of_chunk(prev: char, current: char, prev_type: &str, kind: &str) -> bool {
    match (prev, current) {
        (_, 'B' | 'S') => true,
        ('S' | 'O', 'I') => true,
        _ => current != 'O' && prev_type != kind,
    }
}
