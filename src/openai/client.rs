//! Cliente HTTP para o endpoint de chat completions da OpenAI.
//!
//! Uma chamada por requisição, sem retentativas: o classificador trata
//! qualquer erro recorrendo aos estados do parque.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use super::error::CompletionError;
use super::types::{ChatRequest, ChatResponse};

/// Endpoint público de chat completions.
pub const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Qualquer coisa capaz de responder a uma requisição de chat completion.
///
/// O classificador é genérico sobre este trait para que os testes usem
/// respostas prontas.
pub trait CompletionSender {
    async fn complete(&self, req: &ChatRequest) -> Result<ChatResponse, CompletionError>;
}

/// Cliente autenticado por bearer token.
pub struct OpenAiClient {
    // Chave da API enviada no cabeçalho Authorization.
    api_key: String,
    // Cliente reqwest com timeouts de conexão e de requisição.
    client: Client,
    // URL completa do endpoint de completions.
    endpoint: String,
}

impl OpenAiClient {
    /// Cria um cliente para `endpoint`, normalmente [`API_URL`] ou um servidor de teste.
    pub fn with_base_url(api_key: String, endpoint: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Self {
            api_key,
            client,
            endpoint,
        }
    }
}

// Corpo da resposta de erro, ou um texto genérico se não puder ser lido.
async fn error_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string())
}

impl CompletionSender for OpenAiClient {
    async fn complete(&self, req: &ChatRequest) -> Result<ChatResponse, CompletionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json::<ChatResponse>().await?),
            StatusCode::TOO_MANY_REQUESTS => Err(CompletionError::RateLimited {
                message: error_body(response).await,
            }),
            status => Err(CompletionError::ApiError {
                status: status.as_u16(),
                message: error_body(response).await,
            }),
        }
    }
}
