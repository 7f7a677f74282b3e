//! # Esquema de Tags BIO/BIOS
//!
//! Define o esquema de anotação **BIO** (Beginning-Inside-Outside), com a
//! extensão **S** (Single) usada por alguns modelos, para rotular cada
//! caractere de um texto chinês.
//!
//! ## Esquema
//!
//! | Tag        | Significado                                  | Exemplo           |
//! |------------|----------------------------------------------|-------------------|
//! | `B-<tipo>` | Begin — primeiro caractere de uma entidade    | **深** (B-abroad) |
//! | `I-<tipo>` | Inside — caracteres seguintes da entidade     | 深**圳** (I-abroad)|
//! | `S-<tipo>` | Single — entidade de um único caractere       |                   |
//! | `O`        | Outside — fora de qualquer entidade           |                   |
//!
//! As tags chegam do modelo como strings. Elas são parseadas **uma única vez**
//! na fronteira para o enum fechado [`Tag`]; daí para frente nenhum módulo
//! fatia strings para descobrir a categoria.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NerError, Result};

/// Tag BIOS aplicada a um caractere.
///
/// O tipo da entidade é tudo o que vem depois do primeiro `-`
/// (ex: `"B-name"` → `Begin("name")`). Uma tag sem `-` (ex: `"B"`)
/// tem tipo vazio.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Tag {
    /// **Outside**: o caractere não faz parte de nenhuma entidade.
    Outside,
    /// **Begin**: marca o INÍCIO de uma entidade.
    Begin(String),
    /// **Inside**: marca a CONTINUAÇÃO de uma entidade.
    Inside(String),
    /// **Single**: entidade formada por um único caractere.
    Single(String),
}

impl Tag {
    /// Parseia uma tag a partir de string (ex: "B-date" → `Begin("date")`).
    ///
    /// Falha com [`NerError::MalformedTag`] se a string for vazia ou se o
    /// primeiro caractere não for `O`, `B`, `I` ou `S`.
    pub fn parse(s: &str) -> Result<Self> {
        let symbol = s.chars().next().ok_or_else(|| NerError::MalformedTag { tag: s.to_string() })?;
        let kind = match s.split_once('-') {
            Some((_, kind)) => kind.to_string(),
            None => String::new(),
        };
        match symbol {
            'O' => Ok(Tag::Outside),
            'B' => Ok(Tag::Begin(kind)),
            'I' => Ok(Tag::Inside(kind)),
            'S' => Ok(Tag::Single(kind)),
            _ => Err(NerError::MalformedTag { tag: s.to_string() }),
        }
    }

    /// Parseia uma sequência inteira de tags, falhando na primeira malformada.
    pub fn parse_sequence<S: AsRef<str>>(tags: &[S]) -> Result<Vec<Tag>> {
        tags.iter().map(|t| Tag::parse(t.as_ref())).collect()
    }

    /// Símbolo de categoria: `'O'`, `'B'`, `'I'` ou `'S'`.
    pub fn symbol(&self) -> char {
        match self {
            Tag::Outside => 'O',
            Tag::Begin(_) => 'B',
            Tag::Inside(_) => 'I',
            Tag::Single(_) => 'S',
        }
    }

    /// Tipo da entidade (vazio para `O`).
    pub fn entity_type(&self) -> &str {
        match self {
            Tag::Begin(kind) | Tag::Inside(kind) | Tag::Single(kind) => kind,
            Tag::Outside => "",
        }
    }

    pub fn is_outside(&self) -> bool {
        matches!(self, Tag::Outside)
    }

    /// Representação textual da tag (ex: "B-name", "I-date", "O")
    pub fn label(&self) -> String {
        match self {
            Tag::Outside => "O".to_string(),
            Tag::Begin(kind) => with_type('B', kind),
            Tag::Inside(kind) => with_type('I', kind),
            Tag::Single(kind) => with_type('S', kind),
        }
    }
}

fn with_type(symbol: char, kind: &str) -> String {
    if kind.is_empty() {
        symbol.to_string()
    } else {
        format!("{symbol}-{kind}")
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Tag {
    type Err = NerError;

    fn from_str(s: &str) -> Result<Self> {
        Tag::parse(s)
    }
}

impl TryFrom<String> for Tag {
    type Error = NerError;

    fn try_from(s: String) -> Result<Self> {
        Tag::parse(&s)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.label()
    }
}
