//! # Chunker — Janelas de Tamanho Fixo
//!
//! O encoder BERT aceita no máximo 512 posições, uma delas ocupada pelo
//! `[CLS]`. Textos longos são quebrados em janelas de no máximo
//! [`DEFAULT_WINDOW_SIZE`] elementos antes da inferência.
//!
//! A decomposição preserva a ordem e não perde nada: concatenar as janelas
//! reconstrói a sequência original.

use std::num::NonZeroUsize;

use crate::error::{NerError, Result};

/// Tamanho padrão da janela (512 posições do BERT menos o `[CLS]`).
pub const DEFAULT_WINDOW_SIZE: usize = 511;

/// Janela padrão como `NonZeroUsize`.
pub fn default_window() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_WINDOW_SIZE).unwrap_or(NonZeroUsize::MIN)
}

/// Quebra a sequência em janelas de no máximo `window` elementos.
///
/// A posição `i` abre uma nova janela sempre que `i % window == 0`.
pub fn chunk<T: Clone>(sequence: &[T], window: NonZeroUsize) -> Vec<Vec<T>> {
    let window = window.get();
    let mut chunks: Vec<Vec<T>> = Vec::with_capacity(sequence.len().div_ceil(window));
    for (i, item) in sequence.iter().enumerate() {
        if i % window == 0 {
            chunks.push(Vec::with_capacity(window));
        }
        if let Some(current) = chunks.last_mut() {
            current.push(item.clone());
        }
    }
    chunks
}

/// Aplica a mesma quebra a duas sequências paralelas (caracteres e tags).
///
/// As saídas ficam alinhadas janela a janela. Falha com
/// [`NerError::SequenceMismatch`] se as sequências tiverem tamanhos diferentes.
pub fn chunk_aligned<A: Clone, B: Clone>(
    chars: &[A],
    tags: &[B],
    window: NonZeroUsize,
) -> Result<Vec<(Vec<A>, Vec<B>)>> {
    if chars.len() != tags.len() {
        return Err(NerError::SequenceMismatch { chars: chars.len(), tags: tags.len() });
    }
    Ok(chunk(chars, window).into_iter().zip(chunk(tags, window)).collect())
}
