//! # Relatório de Bad Cases
//!
//! Compara, exemplo a exemplo, a sequência gold com a predita. Qualquer
//! diferença na sequência (não no conjunto de spans) gera um
//! [`MismatchRecord`] legível, gravado no arquivo de casos em modo append.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// Um exemplo em que a predição difere do gold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchRecord {
    /// Índice do exemplo no lote.
    pub index: usize,
    pub sentence: Vec<String>,
    pub gold: Vec<String>,
    pub predicted: Vec<String>,
}

impl fmt::Display for MismatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "bad case {}: ", self.index)?;
        writeln!(f, "sentence: {}", QuotedList(&self.sentence))?;
        writeln!(f, "golden label: {}", QuotedList(&self.gold))?;
        writeln!(f, "model pred: {}", QuotedList(&self.predicted))
    }
}

/// Formata uma lista como `['a', 'b']`.
struct QuotedList<'a>(&'a [String]);

impl fmt::Display for QuotedList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{item}'")?;
        }
        f.write_str("]")
    }
}

/// Gera um registro para cada índice em que `gold[i] != predicted[i]`.
///
/// Os três lotes são percorridos em paralelo; exemplos além do menor lote
/// são ignorados.
pub fn report<G, P, C>(
    gold: &[Vec<G>],
    predicted: &[Vec<P>],
    sources: &[Vec<C>],
) -> Vec<MismatchRecord>
where
    G: AsRef<str>,
    P: AsRef<str>,
    C: ToString,
{
    gold.iter()
        .zip(predicted)
        .zip(sources)
        .enumerate()
        .filter(|(_, ((g, p), _))| !same_sequence(g, p))
        .map(|(index, ((g, p), s))| MismatchRecord {
            index,
            sentence: s.iter().map(ToString::to_string).collect(),
            gold: g.iter().map(|t| t.as_ref().to_string()).collect(),
            predicted: p.iter().map(|t| t.as_ref().to_string()).collect(),
        })
        .collect()
}

fn same_sequence<G: AsRef<str>, P: AsRef<str>>(gold: &[G], predicted: &[P]) -> bool {
    gold.len() == predicted.len()
        && gold.iter().zip(predicted).all(|(g, p)| g.as_ref() == p.as_ref())
}

/// Arquivo de casos: destino append-only, um registro por exemplo divergente.
#[derive(Debug, Clone)]
pub struct CaseFile {
    path: PathBuf,
}

impl CaseFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Anexa os registros ao arquivo, criando-o (e seus diretórios) se preciso.
    pub fn append(&self, records: &[MismatchRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut out = BufWriter::new(file);
        for record in records {
            write!(out, "{record}")?;
        }
        out.flush()?;
        info!(cases = records.len(), path = %self.path.display(), "bad cases gravados");
        Ok(())
    }
}
