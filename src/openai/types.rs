//! Tipos de requisição e resposta do endpoint `v1/chat/completions` da OpenAI.
//!
//! Apenas os campos enviados ou lidos pela ferramenta são modelados; campos
//! desconhecidos da resposta são ignorados pelo serde.

use serde::{Deserialize, Serialize};

/// Corpo de uma requisição de chat completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Identificador do modelo, repassado sem alteração (ex.: "gpt-4o").
    pub model: String,
    /// Conversa com papéis; normalmente uma mensagem system e uma user.
    pub messages: Vec<ChatMessage>,
    /// Temperatura de amostragem, mantida baixa para classificação.
    pub temperature: f32,
    /// Limite de tokens gerados.
    pub max_tokens: u32,
}

/// Mensagem individual com papel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" ou "assistant".
    pub role: String,
    // Texto da mensagem.
    pub content: String,
}

impl ChatMessage {
    /// Cria uma mensagem com papel "system".
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    /// Cria uma mensagem com papel "user".
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Resposta devolvida pelo endpoint de chat completions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Texto da primeira escolha, se o modelo produziu algum.
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

/// Uma alternativa gerada.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ReplyMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Mensagem do assistente dentro de um [`Choice`]. `content` vem nulo em
/// recusas e chamadas de ferramenta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyMessage {
    pub role: String,
    pub content: Option<String>,
}

/// Contagem de tokens de uma chamada.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
