//! # Tokenização Caractere a Caractere
//!
//! O modelo rotula o texto chinês **caractere a caractere**. Antes da
//! inferência, o texto bruto é limpo: caracteres de espaçamento que o
//! vocabulário do BERT não conhece são trocados por equivalentes visíveis,
//! para que cada posição continue alinhada 1:1 com uma tag.
//!
//! ## Tabela de limpeza
//!
//! | Original   | Substituto | Modo             |
//! |------------|------------|------------------|
//! | `\u{a0}`   | `-`        | sempre           |
//! | `\t`       | `,`        | sempre           |
//! | `\u{e0e7}` | `-`        | sempre           |
//! | `\u{3000}` | `-`        | sempre           |
//! | `\n`       | `。`       | sempre           |
//! | ` `        | `-`        | só `Training`    |
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use cner_core::tokenizer::{clean_chars, CleanMode};
//!
//! let chars = clean_chars("  一例\t马来西亚输入\n", CleanMode::Prediction);
//! assert_eq!(chars.iter().collect::<String>(), "一例,马来西亚输入");
//! ```

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::chunker::chunk_aligned;
use crate::error::{NerError, Result};
use crate::tagger::Tag;

/// Contexto da limpeza: dados de treino também trocam espaços por `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanMode {
    Training,
    #[default]
    Prediction,
}

/// Remove espaços das pontas e aplica a tabela de limpeza, caractere a caractere.
pub fn clean_chars(text: &str, mode: CleanMode) -> Vec<char> {
    text.trim()
        .chars()
        .map(|c| match c {
            '\u{a0}' | '\u{e0e7}' | '\u{3000}' => '-',
            '\t' => ',',
            '\n' => '。',
            ' ' if mode == CleanMode::Training => '-',
            other => other,
        })
        .collect()
}

/// Uma anotação gold: `[start, end)` em caracteres, com o rótulo.
///
/// Em JSON é a tripla `[start, end, "rótulo"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(usize, usize, String)", into = "(usize, usize, String)")]
pub struct Annotation {
    pub start: usize,
    /// Fim exclusivo.
    pub end: usize,
    pub label: String,
}

impl From<(usize, usize, String)> for Annotation {
    fn from((start, end, label): (usize, usize, String)) -> Self {
        Self { start, end, label }
    }
}

impl From<Annotation> for (usize, usize, String) {
    fn from(ann: Annotation) -> Self {
        (ann.start, ann.end, ann.label)
    }
}

/// Constrói a sequência BIO gold de um texto de `len` caracteres.
///
/// `B-<rótulo>` em `start`, `I-<rótulo>` em `start+1..end`, `O` no resto.
/// Uma anotação com `start == end` ainda marca `B-<rótulo>` em `start`.
/// Anotações posteriores sobrescrevem as anteriores nas posições em comum.
pub fn tags_from_annotations(len: usize, annotations: &[Annotation]) -> Result<Vec<Tag>> {
    let mut tags = vec![Tag::Outside; len];
    for ann in annotations {
        if ann.start > ann.end || ann.start >= len || ann.end > len {
            return Err(NerError::InvalidAnnotation {
                label: ann.label.clone(),
                start: ann.start,
                end: ann.end,
                len,
            });
        }
        tags[ann.start] = Tag::Begin(ann.label.clone());
        for tag in tags.iter_mut().take(ann.end).skip(ann.start + 1) {
            *tag = Tag::Inside(ann.label.clone());
        }
    }
    Ok(tags)
}

/// Um texto de treino com suas anotações (`labels` pode faltar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedText {
    pub text: String,
    #[serde(default)]
    pub labels: Vec<Annotation>,
}

/// Prepara um texto de treino: limpeza em modo `Training`, tags gold e
/// quebra em janelas alinhadas.
///
/// Os offsets das anotações se referem ao texto já sem espaços nas pontas.
pub fn prepare_training(
    example: &AnnotatedText,
    window: NonZeroUsize,
) -> Result<Vec<(Vec<char>, Vec<Tag>)>> {
    let chars = clean_chars(&example.text, CleanMode::Training);
    let tags = tags_from_annotations(chars.len(), &example.labels)?;
    chunk_aligned(&chars, &tags, window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_prediction_mode() {
        let raw = "\u{3000}北京\u{a0}时间\t10月\n下午 3时 ";
        let chars = clean_chars(raw, CleanMode::Prediction);
        let text: String = chars.into_iter().collect();
        assert_eq!(text, "北京-时间,10月。下午 3时");
    }

    #[test]
    fn test_clean_training_mode_replaces_spaces() {
        let text: String = clean_chars("tk72 航班", CleanMode::Training).into_iter().collect();
        assert_eq!(text, "tk72-航班");
    }

    #[test]
    fn test_clean_keeps_one_char_per_position() {
        let raw = "到达广州白云国际机场";
        assert_eq!(clean_chars(raw, CleanMode::Prediction).len(), raw.chars().count());
        assert!(clean_chars("   ", CleanMode::Training).is_empty());
    }

    #[test]
    fn test_tags_from_annotations() {
        let anns = vec![
            Annotation { start: 2, end: 6, label: "domestic".into() },
            Annotation { start: 0, end: 1, label: "date".into() },
        ];
        let tags = tags_from_annotations(8, &anns).unwrap();
        let labels: Vec<String> = tags.iter().map(Tag::label).collect();
        assert_eq!(
            labels,
            vec!["B-date", "O", "B-domestic", "I-domestic", "I-domestic", "I-domestic", "O", "O"]
        );
    }

    #[test]
    fn test_empty_range_still_marks_begin() {
        let anns = vec![Annotation { start: 1, end: 1, label: "CT".into() }];
        let tags = tags_from_annotations(3, &anns).unwrap();
        assert_eq!(tags, vec![Tag::Outside, Tag::Begin("CT".into()), Tag::Outside]);

        let reversed = vec![Annotation { start: 2, end: 1, label: "CT".into() }];
        assert!(tags_from_annotations(3, &reversed).is_err());
    }

    #[test]
    fn test_annotation_from_json_triple() {
        let ex: AnnotatedText =
            serde_json::from_str(r#"{"text": "一例马来西亚输入", "labels": [[2, 6, "domestic"]]}"#)
                .unwrap();
        assert_eq!(ex.labels[0], Annotation { start: 2, end: 6, label: "domestic".into() });

        let bare: AnnotatedText = serde_json::from_str(r#"{"text": "无标注"}"#).unwrap();
        assert!(bare.labels.is_empty());
    }

    #[test]
    fn test_prepare_training_windows() {
        let ex = AnnotatedText {
            text: " 一例 马来西亚输入 ".into(),
            labels: vec![Annotation { start: 3, end: 7, label: "domestic".into() }],
        };
        let windows = prepare_training(&ex, NonZeroUsize::new(4).unwrap()).unwrap();

        assert_eq!(windows.len(), 3);
        let text: String = windows.iter().flat_map(|(c, _)| c.iter()).collect();
        assert_eq!(text, "一例-马来西亚输入");
        assert_eq!(windows[0].1[3], Tag::Begin("domestic".into()));
        assert_eq!(windows[1].0, vec!['来', '西', '亚', '输']);
        assert_eq!(windows[1].1[2], Tag::Inside("domestic".into()));
        assert_eq!(windows[1].1[3], Tag::Outside);
    }

    #[test]
    fn test_annotation_out_of_range() {
        let anns = vec![Annotation { start: 3, end: 9, label: "port".into() }];
        assert!(matches!(
            tags_from_annotations(5, &anns),
            Err(NerError::InvalidAnnotation { len: 5, .. })
        ));
    }
}
