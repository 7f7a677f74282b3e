//! # cner-core — Pós-processamento e Avaliação de NER Chinês
//!
//! Este crate transforma as predições caractere a caractere de um modelo de
//! NER (BERT + classificador/CRF, externo a este crate) em entidades
//! tipadas, pontua essas entidades contra anotações gold e gera relatórios
//! de erros.
//!
//! ## Arquitetura do Sistema
//!
//! O dado flui em linha, estágio a estágio:
//!
//! 1.  **Entrada**: Texto bruto (String).
//! 2.  **Limpeza** ([`tokenizer`]): O texto vira uma sequência de caracteres alinhável com tags.
//! 3.  **Chunking** ([`chunker`]): Janelas de no máximo 511 caracteres, o limite do encoder.
//! 4.  **Inferência** ([`pipeline::TagPredictor`]): Modelo externo ou léxico ([`rule_based`]).
//! 5.  **Decodificação** ([`span`]): Tags BIO/BIOS → spans `(tipo, início, fim)`.
//! 6.  **Resolução** ([`resolver`]): Voto majoritário do tipo de cada entidade → [`EntityMap`].
//! 7.  **Avaliação** ([`metrics`], [`evaluation`], [`badcase`]): P/R/F1 e bad cases.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use cner_core::{LabelSet, ResolverOptions, Tag};
//!
//! let labels = LabelSet::clue();
//! let chars: Vec<char> = "去深圳。".chars().collect();
//! let tags = Tag::parse_sequence(&["O", "B-abroad", "I-domestic", "O"]).unwrap();
//!
//! let map = cner_core::resolve(&chars, &tags, &labels, ResolverOptions::default()).unwrap();
//! assert_eq!(map.get("abroad"), ["深圳"]);
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: Orquestrador do caminho de serviço, do texto às linhas tabulares.
//! - [`records`]: Requisições e linhas de trajeto da implantação epidemiológica.
//! - [`labels`]: Conjunto fechado de rótulos e o vocabulário de tags.
//! - [`config`]: Configuração JSON passada explicitamente aos componentes.

pub mod badcase;
pub mod chunker;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod labels;
pub mod metrics;
pub mod pipeline;
pub mod records;
pub mod resolver;
pub mod rule_based;
pub mod span;
pub mod tagger;
pub mod tokenizer;

pub use badcase::{CaseFile, MismatchRecord};
pub use config::NerConfig;
pub use error::{NerError, Result, SkippedExample};
pub use evaluation::{evaluate, EvaluationReport, Example};
pub use labels::LabelSet;
pub use metrics::{f1_score, f1_score_per_label, LabelReport, Scores};
pub use pipeline::{ColumnBinding, Extraction, ExtractionPipeline, TagPredictor};
pub use resolver::{
    resolve, resolve_batch, resolve_batch_labels, EntityMap, LabelMatch, ResolverOptions,
};
pub use rule_based::LexiconTagger;
pub use span::Span;
pub use tagger::Tag;
