//! # Configuração
//!
//! Um único valor imutável, carregado de JSON e passado explicitamente para
//! os componentes. Todo campo tem padrão, então `{}` é uma configuração
//! válida.
//!
//! ```json
//! {
//!   "labels": ["name", "date", "location", "license"],
//!   "window_size": 511,
//!   "case_file": "case/bad_case.txt",
//!   "resolver": { "label_match": "substring", "flush_trailing": false }
//! }
//! ```

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunker::DEFAULT_WINDOW_SIZE;
use crate::error::{NerError, Result};
use crate::labels::LabelSet;
use crate::resolver::ResolverOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    /// Conjunto fechado de rótulos (padrão: CLUE, 20 rótulos).
    pub labels: LabelSet,
    /// Tamanho da janela do chunker; precisa ser maior que zero.
    pub window_size: usize,
    /// Arquivo de bad cases (append).
    pub case_file: PathBuf,
    pub resolver: ResolverOptions,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            labels: LabelSet::clue(),
            window_size: DEFAULT_WINDOW_SIZE,
            case_file: PathBuf::from("case/bad_case.txt"),
            resolver: ResolverOptions::default(),
        }
    }
}

impl NerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: NerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.window().map(|_| ())
    }

    /// Janela do chunker como `NonZeroUsize`.
    pub fn window(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.window_size)
            .ok_or_else(|| NerError::InvalidConfig("window_size deve ser maior que zero".into()))
    }
}
