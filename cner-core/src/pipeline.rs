//! # Pipeline de Extração
//!
//! Orquestra o caminho de serviço, do texto bruto até as linhas tabulares:
//!
//! 1. **Limpeza** ([`crate::tokenizer`]): texto → caracteres alinháveis.
//! 2. **Chunking** ([`crate::chunker`]): janelas de no máximo 511 caracteres.
//! 3. **Inferência** ([`TagPredictor`]): cada janela → tags (em paralelo).
//! 4. **Resolução** ([`crate::resolver`]): caracteres + tags → [`EntityMap`].
//! 5. **Tabulação** ([`tabulate`]): uma linha por índice de entidade.
//!
//! O modelo neural é um colaborador externo: o pipeline só o enxerga através
//! do trait [`TagPredictor`]. Vários preditores podem ser registrados, cada
//! um com um nome; todos recebem as mesmas janelas e cada um produz o seu
//! próprio [`EntityMap`]. As colunas da saída dizem de qual preditor leem.

use std::num::NonZeroUsize;

use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::chunker::chunk;
use crate::config::NerConfig;
use crate::error::{NerError, Result};
use crate::labels::LabelSet;
use crate::resolver::{resolve, EntityMap, ResolverOptions};
use crate::tagger::Tag;
use crate::tokenizer::{clean_chars, CleanMode};

/// Nome do preditor registrado por [`ExtractionPipeline::new`].
pub const DEFAULT_SOURCE: &str = "model";

/// Contrato da inferência do modelo: uma janela de caracteres → uma tag por
/// caractere.
pub trait TagPredictor: Send + Sync {
    fn predict(&self, chunk: &[char]) -> Result<Vec<Tag>>;
}

impl<F> TagPredictor for F
where
    F: Fn(&[char]) -> Result<Vec<Tag>> + Send + Sync,
{
    fn predict(&self, chunk: &[char]) -> Result<Vec<Tag>> {
        self(chunk)
    }
}

struct NamedPredictor {
    name: String,
    predictor: Box<dyn TagPredictor>,
}

/// O pipeline de extração sobre um ou mais preditores nomeados.
pub struct ExtractionPipeline {
    predictors: Vec<NamedPredictor>,
    labels: LabelSet,
    window: NonZeroUsize,
    options: ResolverOptions,
}

impl ExtractionPipeline {
    /// Pipeline com um único preditor, registrado como [`DEFAULT_SOURCE`].
    pub fn new(predictor: impl TagPredictor + 'static, config: &NerConfig) -> Result<Self> {
        Self::empty(config)?.with_predictor(DEFAULT_SOURCE, predictor)
    }

    /// Pipeline sem preditores; registre-os com [`Self::with_predictor`].
    pub fn empty(config: &NerConfig) -> Result<Self> {
        Ok(Self {
            predictors: Vec::new(),
            labels: config.labels.clone(),
            window: config.window()?,
            options: config.resolver,
        })
    }

    /// Registra mais um preditor. Nomes repetidos são rejeitados.
    pub fn with_predictor(
        mut self,
        name: impl Into<String>,
        predictor: impl TagPredictor + 'static,
    ) -> Result<Self> {
        let name = name.into();
        if self.predictors.iter().any(|p| p.name == name) {
            return Err(NerError::DuplicatePredictor { name });
        }
        self.predictors.push(NamedPredictor { name, predictor: Box::new(predictor) });
        Ok(self)
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Nomes dos preditores, na ordem de registro.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.predictors.iter().map(|p| p.name.as_str())
    }

    /// Extrai as entidades de um texto bruto com todos os preditores.
    ///
    /// A resolução corre sobre a concatenação das janelas, então uma entidade
    /// cortada na fronteira de uma janela continua na seguinte. Texto vazio
    /// depois da limpeza não chama nenhum preditor.
    pub fn extract(&self, text: &str) -> Result<Extraction> {
        let chars = clean_chars(text, CleanMode::Prediction);
        if chars.is_empty() {
            return Ok(self
                .predictors
                .iter()
                .map(|p| (p.name.clone(), EntityMap::new(&self.labels)))
                .collect());
        }

        let windows = chunk(&chars, self.window);
        let maps: Vec<(String, EntityMap)> = self
            .predictors
            .par_iter()
            .map(|p| {
                let tags = predict_windows(p.predictor.as_ref(), &windows)?;
                let map = resolve(&chars, &tags, &self.labels, self.options)?;
                Ok((p.name.clone(), map))
            })
            .collect::<Result<_>>()?;
        debug!(
            chars = chars.len(),
            windows = windows.len(),
            sources = maps.len(),
            "extração concluída"
        );
        Ok(maps.into_iter().collect())
    }
}

/// Infere todas as janelas em paralelo e remonta as tags na ordem original.
fn predict_windows(predictor: &dyn TagPredictor, windows: &[Vec<char>]) -> Result<Vec<Tag>> {
    let predicted: Vec<Vec<Tag>> = windows
        .par_iter()
        .enumerate()
        .map(|(window, chunk)| {
            let tags = predictor.predict(chunk)?;
            if tags.len() != chunk.len() {
                return Err(NerError::WindowMismatch {
                    window,
                    chars: chunk.len(),
                    tags: tags.len(),
                });
            }
            Ok(tags)
        })
        .collect::<Result<_>>()?;
    Ok(predicted.concat())
}

/// Resultado de [`ExtractionPipeline::extract`]: um [`EntityMap`] por preditor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    maps: Vec<(String, EntityMap)>,
}

impl Extraction {
    pub fn get(&self, source: &str) -> Option<&EntityMap> {
        self.maps.iter().find(|(name, _)| name == source).map(|(_, map)| map)
    }

    /// Entidades de um rótulo segundo um preditor (vazio se algum não existir).
    pub fn entities(&self, source: &str, label: &str) -> &[String] {
        match self.get(source) {
            Some(map) => map.get(label),
            None => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityMap)> {
        self.maps.iter().map(|(name, map)| (name.as_str(), map))
    }
}

impl FromIterator<(String, EntityMap)> for Extraction {
    fn from_iter<I: IntoIterator<Item = (String, EntityMap)>>(iter: I) -> Self {
        Self { maps: iter.into_iter().collect() }
    }
}

impl Serialize for Extraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.maps.len()))?;
        for (name, map) in &self.maps {
            out.serialize_entry(name, map)?;
        }
        out.end()
    }
}

/// Liga uma coluna da saída tabular a um rótulo do [`EntityMap`] de um
/// preditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBinding {
    pub column: String,
    /// Nome do preditor de onde a coluna é lida.
    pub source: String,
    pub label: String,
}

impl ColumnBinding {
    pub fn new(
        column: impl Into<String>,
        source: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self { column: column.into(), source: source.into(), label: label.into() }
    }
}

/// Transforma a extração em linhas: a linha `i` traz a `i`-ésima entidade
/// de cada coluna, ou `""` quando aquele rótulo já acabou.
///
/// Sem nenhuma entidade, retorna uma única linha vazia.
pub fn tabulate(extraction: &Extraction, columns: &[ColumnBinding]) -> Vec<Vec<String>> {
    let cells = |c: &ColumnBinding| extraction.entities(&c.source, &c.label);
    let rows = columns.iter().map(|c| cells(c).len()).max().unwrap_or(0).max(1);

    (0..rows)
        .map(|i| columns.iter().map(|c| cells(c).get(i).cloned().unwrap_or_default()).collect())
        .collect()
}
