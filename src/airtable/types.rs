//! Tipos da API de registros do Airtable e sua conversão em [`Park`].
//!
//! `Region` é um campo de seleção múltipla, então chega como lista. Linhas
//! antigas podem guardar uma string simples; as duas formas são aceitas aqui
//! e nada fora deste módulo vê a lista.

use serde::{Deserialize, Serialize};

use crate::park::Park;
use crate::region::Region;

/// Uma página de `GET /v0/{base}/{table}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub records: Vec<Record>,
    /// Token de continuação; ausente na última página.
    #[serde(default)]
    pub offset: Option<String>,
}

/// Uma linha da tabela.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub fields: ParkFields,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

/// As colunas lidas pela ferramenta. O resto da linha é ignorado.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParkFields {
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "States", default, skip_serializing_if = "Option::is_none")]
    pub states: Option<String>,
    #[serde(rename = "States (Multi)", default, skip_serializing_if = "Vec::is_empty")]
    pub states_multi: Vec<String>,
    #[serde(rename = "Latitude", default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude", default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Region", default, skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionField>,
}

/// Forma gravada da coluna `Region`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionField {
    Many(Vec<String>),
    One(String),
}

impl RegionField {
    /// Cada tag não vazia, na ordem gravada.
    pub fn tags(&self) -> Vec<&str> {
        match self {
            RegionField::Many(tags) => tags
                .iter()
                .map(String::as_str)
                .filter(|t| !t.is_empty())
                .collect(),
            RegionField::One(tag) if tag.is_empty() => Vec::new(),
            RegionField::One(tag) => vec![tag.as_str()],
        }
    }
}

impl ParkFields {
    /// Tags de região desta linha; vazio quando sem região.
    pub fn region_tags(&self) -> Vec<&str> {
        self.region.as_ref().map(RegionField::tags).unwrap_or_default()
    }

    /// Estados da coluna de seleção múltipla, ou da coluna de texto separada
    /// por vírgulas quando a primeira está vazia.
    pub fn state_list(&self) -> Vec<String> {
        if !self.states_multi.is_empty() {
            return self.states_multi.clone();
        }
        self.states
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Record {
    /// Converte a linha na visão de domínio usada pelo classificador.
    pub fn to_park(&self) -> Park {
        let f = &self.fields;
        Park {
            id: self.id.clone(),
            name: f
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Unknown Park".to_string()),
            states: f.state_list(),
            states_text: f.states.clone().filter(|s| !s.trim().is_empty()),
            coordinates: f.latitude.zip(f.longitude),
            description: f.description.clone().filter(|d| !d.is_empty()),
            existing_region: f.region_tags().first().map(|t| t.to_string()),
        }
    }
}

/// Corpo de `PATCH /v0/{base}/{table}/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateRequest {
    pub fields: RegionUpdate,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionUpdate {
    #[serde(rename = "Region")]
    pub region: Vec<String>,
}

impl UpdateRequest {
    /// Envolve `region` na lista de um elemento que a coluna espera.
    pub fn region(region: Region) -> Self {
        Self {
            fields: RegionUpdate {
                region: vec![region.as_str().to_string()],
            },
        }
    }
}
