//! Classificação de região via LLM, com recurso aos estados e à região padrão.
//!
//! Uma resposta sem sentido é reparada, depois trocada pela região derivada
//! dos estados e por fim por [`DEFAULT_REGION`]. Uma chamada que falha
//! recorre apenas à região dos estados.

use tracing::{error, info, warn};

use crate::openai::{ChatMessage, ChatRequest, CompletionError, CompletionSender};
use crate::park::Park;
use crate::region::{self, DEFAULT_REGION, REGIONS, Region};

/// Descrições maiores que isto são cortadas antes de entrar no prompt.
pub const DESCRIPTION_LIMIT: usize = 500;

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 10;

const SYSTEM_PROMPT: &str = "You are a geography expert who categorizes US National Parks into \
     geographic regions with high accuracy. Always respond with exactly one region name.";

/// O que o texto do modelo significou.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelVerdict {
    /// Uma região do catálogo, exata ou após reparo por substring.
    Accepted(Region),
    /// Nenhuma região pôde ser lida da resposta.
    Invalid(String),
}

/// Origem da região resolvida.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Model,
    States,
    Default,
}

/// Região resolvida e sua origem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub region: Region,
    pub source: Source,
}

/// Lê uma região de uma resposta em texto livre.
///
/// A resposta aparada deve ser igual a um nome de região ou conter um, sem
/// diferenciar maiúsculas; vence a primeira região na ordem do catálogo.
pub fn parse_reply(reply: &str) -> ModelVerdict {
    let trimmed = reply.trim();
    if let Ok(region) = trimmed.parse::<Region>() {
        return ModelVerdict::Accepted(region);
    }
    let lower = trimmed.to_lowercase();
    REGIONS
        .into_iter()
        .find(|r| lower.contains(&r.as_str().to_lowercase()))
        .map(ModelVerdict::Accepted)
        .unwrap_or_else(|| ModelVerdict::Invalid(trimmed.to_string()))
}

/// Corta `text` em [`DESCRIPTION_LIMIT`] caracteres, marcando o corte com "...".
pub fn truncate_description(text: &str) -> String {
    match text.char_indices().nth(DESCRIPTION_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Monta o prompt de usuário para `park`.
pub fn build_prompt(park: &Park) -> String {
    let location = park
        .coordinates
        .map(|(lat, lon)| format!("Latitude: {lat}, Longitude: {lon}"))
        .unwrap_or_default();
    let description = park
        .description
        .as_deref()
        .map(truncate_description)
        .unwrap_or_default();
    let region_names = REGIONS.map(Region::as_str).join(", ");

    format!(
        "I need to determine which geographic region of the United States the following national park belongs to.\n\
         \n\
         Park Information:\n\
         - Name: {name}\n\
         - States: {states}\n\
         - {location}\n\
         - Description: {description}\n\
         \n\
         US Geographic Regions and their states:\n\
         {catalog}\n\
         \n\
         Based on the park information, especially the state(s) it's located in, determine which region this park belongs to.\n\
         If a park spans multiple regions, choose the most appropriate primary region.\n\
         \n\
         If the state information clearly puts this park in a specific region, that should be your primary consideration.\n\
         \n\
         Respond with ONLY ONE of these exact region names:\n\
         {region_names}\n",
        name = park.name,
        states = park.state_info(),
        catalog = region::catalog_text(),
    )
}

/// Classifica parques através de um [`CompletionSender`].
pub struct RegionClassifier<C> {
    client: C,
    model: String,
}

impl<C: CompletionSender> RegionClassifier<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Uma chamada ao modelo para `park`. Só retorna erro se a chamada falhar.
    pub async fn ask_model(&self, park: &Park) -> Result<ModelVerdict, CompletionError> {
        let req = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_prompt(park)),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self.client.complete(&req).await?;
        let text = response.first_text().ok_or(CompletionError::EmptyReply)?;
        Ok(parse_reply(text))
    }

    /// Resolve a região de `park`, ou `None` quando a chamada falhou e os
    /// estados não dão resposta.
    ///
    /// Com `compare`, a região existente é relatada como igual ou diferente
    /// do resultado, sem alterá-lo.
    pub async fn classify(&self, park: &Park, compare: bool) -> Option<Classification> {
        if compare && let Some(existing) = &park.existing_region {
            info!(park = %park.name, existing = %existing, "park already has a region");
        }

        let by_states = region::resolve_by_states(&park.states);

        let classification = match self.ask_model(park).await {
            Ok(ModelVerdict::Accepted(region)) => Classification {
                region,
                source: Source::Model,
            },
            Ok(ModelVerdict::Invalid(reply)) => match by_states {
                Some(region) => {
                    warn!(park = %park.name, reply = %reply, fallback = %region,
                        "model returned an invalid region, using state-based region");
                    Classification {
                        region,
                        source: Source::States,
                    }
                }
                None => {
                    warn!(park = %park.name, reply = %reply, fallback = %DEFAULT_REGION,
                        "model returned an invalid region, using default");
                    Classification {
                        region: DEFAULT_REGION,
                        source: Source::Default,
                    }
                }
            },
            Err(e) => {
                error!(park = %park.name, error = %e, "error determining region");
                let region = by_states?;
                info!(park = %park.name, fallback = %region, "using state-based region");
                Classification {
                    region,
                    source: Source::States,
                }
            }
        };

        let region = classification.region;
        match park.existing_region.as_deref() {
            Some(existing) if compare && existing == region.as_str() => {
                info!(park = %park.name, states = %park.state_info(), region = %region,
                    "MATCH: model agrees with existing region");
            }
            Some(existing) if compare => {
                warn!(park = %park.name, states = %park.state_info(), suggested = %region,
                    existing = %existing, "DIFF: model disagrees with existing region");
            }
            _ => {
                info!(park = %park.name, states = %park.state_info(), region = %region,
                    "determined region");
            }
        }

        Some(classification)
    }
}
