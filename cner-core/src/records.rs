//! # Registros de Trajeto
//!
//! Formato tabular da implantação de rastreamento epidemiológico: cada
//! requisição traz um texto de trajeto (`travelContent`) e recebe uma linha
//! por índice de entidade, com data, pessoa, local e meio de transporte.

use serde::{Deserialize, Serialize};

use crate::config::NerConfig;
use crate::error::Result;
use crate::pipeline::{tabulate, ColumnBinding, Extraction, ExtractionPipeline, TagPredictor};

/// Requisição de extração. Campos ausentes viram `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionRequest {
    pub event_id: String,
    pub case_id: String,
    pub source_id: String,
    pub travel_content: String,
}

/// Uma linha da resposta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelRecord {
    pub event_id: String,
    pub case_id: String,
    pub source_id: String,
    pub travel_time: String,
    pub dig_person_name: String,
    pub dig_place_name: String,
    pub dig_traffic_tool: String,
}

/// Preditor das colunas de pessoa e meio de transporte.
pub const IDENTITY_SOURCE: &str = "identity";
/// Preditor das colunas de data e local.
pub const TRAJECTORY_SOURCE: &str = "trajectory";

/// Colunas da resposta, o preditor e o rótulo que alimentam cada uma.
///
/// Nome e veículo vêm do modelo de identificação; data e local, do modelo
/// de trajeto. Os dois rodam sobre as mesmas janelas.
pub fn travel_columns() -> Vec<ColumnBinding> {
    vec![
        ColumnBinding::new("travelTime", TRAJECTORY_SOURCE, "date"),
        ColumnBinding::new("digPersonName", IDENTITY_SOURCE, "name"),
        ColumnBinding::new("digPlaceName", TRAJECTORY_SOURCE, "location"),
        ColumnBinding::new("digTrafficTool", IDENTITY_SOURCE, "license"),
    ]
}

/// Pipeline com os dois preditores esperados por [`travel_columns`].
pub fn travel_pipeline(
    identity: impl TagPredictor + 'static,
    trajectory: impl TagPredictor + 'static,
    config: &NerConfig,
) -> Result<ExtractionPipeline> {
    ExtractionPipeline::empty(config)?
        .with_predictor(IDENTITY_SOURCE, identity)?
        .with_predictor(TRAJECTORY_SOURCE, trajectory)
}

/// Monta as linhas de uma requisição a partir das entidades extraídas.
pub fn travel_records(request: &ExtractionRequest, extraction: &Extraction) -> Vec<TravelRecord> {
    tabulate(extraction, &travel_columns())
        .into_iter()
        .map(|row| {
            let mut cells = row.into_iter();
            let mut next = || cells.next().unwrap_or_default();
            TravelRecord {
                event_id: request.event_id.clone(),
                case_id: request.case_id.clone(),
                source_id: request.source_id.clone(),
                travel_time: next(),
                dig_person_name: next(),
                dig_place_name: next(),
                dig_traffic_tool: next(),
            }
        })
        .collect()
}

impl ExtractionPipeline {
    /// Atende uma requisição completa. Conteúdo vazio gera uma linha vazia
    /// sem chamar os preditores.
    pub fn travel_records(&self, request: &ExtractionRequest) -> Result<Vec<TravelRecord>> {
        let extraction = self.extract(&request.travel_content)?;
        Ok(travel_records(request, &extraction))
    }
}

/// Envelope da resposta do serviço.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i32,
    pub msg: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self { code: 1, msg: "执行成功".to_string(), data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelSet;
    use crate::rule_based::LexiconTagger;
    use crate::tagger::Tag;

    fn lexicon() -> LexiconTagger {
        let mut lexicon = LexiconTagger::new(LabelSet::clue());
        lexicon.add_entry("location", "广州").unwrap();
        lexicon.add_entry("location", "伊斯坦布尔").unwrap();
        lexicon.add_entry("date", "10月27日").unwrap();
        lexicon.add_entry("license", "tk72").unwrap();
        lexicon
    }

    fn pipeline() -> ExtractionPipeline {
        travel_pipeline(lexicon(), lexicon(), &NerConfig::default()).unwrap()
    }

    /// Data: corridas de dígitos, 月 e 日 que não começam dentro de um código
    /// alfanumérico. Local: só 广州.
    fn trajectory(chunk: &[char]) -> Result<Vec<Tag>> {
        let mut tags = Vec::with_capacity(chunk.len());
        let mut in_date = false;
        for (i, &c) in chunk.iter().enumerate() {
            let prev = if i > 0 { Some(chunk[i - 1]) } else { None };
            let starts_date =
                c.is_ascii_digit() && !prev.is_some_and(|p| p.is_ascii_alphanumeric());
            let tag = if in_date && (c.is_ascii_digit() || c == '月' || c == '日') {
                Tag::Inside("date".into())
            } else if starts_date {
                Tag::Begin("date".into())
            } else if c == '广' {
                Tag::Begin("location".into())
            } else if c == '州' && prev == Some('广') {
                Tag::Inside("location".into())
            } else {
                Tag::Outside
            };
            in_date = matches!(&tag, Tag::Begin(k) | Tag::Inside(k) if k == "date");
            tags.push(tag);
        }
        Ok(tags)
    }

    #[test]
    fn test_request_missing_fields_default_to_empty() {
        let req: ExtractionRequest =
            serde_json::from_str(r#"{"eventId": "e1", "travelContent": "到达广州"}"#).unwrap();
        assert_eq!(req.event_id, "e1");
        assert_eq!(req.case_id, "");
        assert_eq!(req.source_id, "");
    }

    #[test]
    fn test_rows_padded_to_longest_column() {
        let req = ExtractionRequest {
            event_id: "e1".into(),
            case_id: "c1".into(),
            source_id: "s1".into(),
            travel_content: "10月27日从伊斯坦布尔乘坐tk72到达广州。".into(),
        };
        let rows = pipeline().travel_records(&req).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].travel_time, "10月27日");
        assert_eq!(rows[0].dig_place_name, "伊斯坦布尔");
        assert_eq!(rows[0].dig_traffic_tool, "tk72");
        assert_eq!(rows[1].travel_time, "");
        assert_eq!(rows[1].dig_place_name, "广州");
        assert_eq!(rows[1].event_id, "e1");
        assert!(rows.iter().all(|r| r.dig_person_name.is_empty()));
    }

    #[test]
    fn test_columns_read_from_their_own_predictor() {
        let mut identity = LexiconTagger::new(LabelSet::clue());
        identity.add_entry("name", "张三").unwrap();
        identity.add_entry("license", "tk72").unwrap();
        // local e data deste preditor não devem chegar às colunas
        identity.add_entry("location", "伊斯坦布尔").unwrap();
        identity.add_entry("date", "27日").unwrap();

        let pipeline = travel_pipeline(identity, trajectory, &NerConfig::default()).unwrap();
        let req = ExtractionRequest {
            event_id: "e3".into(),
            travel_content: "张三10月27日从伊斯坦布尔乘坐tk72到达广州。".into(),
            ..Default::default()
        };
        let rows = pipeline.travel_records(&req).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].dig_person_name, "张三");
        assert_eq!(rows[0].dig_traffic_tool, "tk72");
        assert_eq!(rows[0].travel_time, "10月27日");
        assert_eq!(rows[0].dig_place_name, "广州");
    }

    #[test]
    fn test_travel_pipeline_sources() {
        let pipeline = pipeline();
        let sources: Vec<&str> = pipeline.sources().collect();
        assert_eq!(sources, [IDENTITY_SOURCE, TRAJECTORY_SOURCE]);
        assert!(travel_columns()
            .iter()
            .all(|c| sources.contains(&c.source.as_str())));
    }

    #[test]
    fn test_empty_content_gives_one_empty_row() {
        let failing = |_: &[char]| -> Result<Vec<Tag>> {
            Err(crate::error::NerError::InvalidConfig("não chamar".into()))
        };
        let pipeline = travel_pipeline(failing, failing, &NerConfig::default()).unwrap();
        let req = ExtractionRequest { event_id: "e2".into(), ..Default::default() };
        let rows = pipeline.travel_records(&req).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_id, "e2");
        assert_eq!(rows[0].travel_time, "");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let json = serde_json::to_value(Envelope::success(vec![TravelRecord::default()])).unwrap();
        assert_eq!(json["code"], 1);
        assert_eq!(json["msg"], "执行成功");
        assert!(json["data"][0].get("digTrafficTool").is_some());
    }
}
