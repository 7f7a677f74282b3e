//! # Erros do cner-core
//!
//! Todas as operações falíveis do crate retornam [`Result`], cujo erro é
//! [`NerError`]. As operações algoritmicamente totais (chunker, decodificador
//! sobre tags já parseadas, scorer) nunca falham.
//!
//! Falhas por exemplo (tag malformada, comprimentos diferentes) são isoladas:
//! os processamentos em lote pulam o exemplo e seguem com o restante.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Erros que podem ocorrer no pós-processamento de NER.
#[derive(Debug, Error)]
pub enum NerError {
    /// O símbolo de categoria da tag não é `O`, `B`, `I` nem `S`.
    #[error("tag malformada: {tag:?} (categoria deve ser O, B, I ou S)")]
    MalformedTag {
        /// A tag original, como recebida.
        tag: String,
    },

    /// Exemplo de um lote com caracteres e tags de tamanhos diferentes.
    #[error("exemplo {index}: {chars} caracteres mas {tags} tags")]
    LengthMismatch {
        index: usize,
        chars: usize,
        tags: usize,
    },

    /// Mesma divergência, fora de um lote (uma única sequência).
    #[error("{chars} caracteres mas {tags} tags")]
    SequenceMismatch { chars: usize, tags: usize },

    /// O preditor devolveu um número de tags diferente do tamanho da janela.
    #[error("janela {window}: {chars} caracteres mas o preditor devolveu {tags} tags")]
    WindowMismatch {
        window: usize,
        chars: usize,
        tags: usize,
    },

    /// Dois preditores registrados com o mesmo nome no pipeline.
    #[error("preditor duplicado no pipeline: {name:?}")]
    DuplicatePredictor { name: String },

    /// Id de tag fora do vocabulário `label2id`.
    #[error("id de tag desconhecido: {id}")]
    UnknownTagId { id: usize },

    /// Rótulo fora do conjunto configurado.
    #[error("rótulo desconhecido: {label:?}")]
    UnknownLabel { label: String },

    #[error("rótulo duplicado no conjunto: {label:?}")]
    DuplicateLabel { label: String },

    #[error("rótulo vazio no conjunto de rótulos")]
    EmptyLabel,

    /// Anotação `(início, fim)` fora dos limites do texto.
    #[error("anotação inválida {label:?} [{start}, {end}) para texto de {len} caracteres")]
    InvalidAnnotation {
        label: String,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("configuração inválida: {0}")]
    InvalidConfig(String),

    #[error("erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("erro de JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias de resultado para as operações do cner-core.
pub type Result<T> = std::result::Result<T, NerError>;

/// Um exemplo de um lote que foi pulado, com o motivo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedExample {
    /// Índice do exemplo no lote original.
    pub index: usize,
    pub reason: String,
}

impl SkippedExample {
    pub fn new(index: usize, error: &NerError) -> Self {
        Self { index, reason: error.to_string() }
    }
}
