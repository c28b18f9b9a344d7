//! Falhas de uma chamada ao endpoint de chat completions.
//!
//! Para o classificador, qualquer variante é uma falha dura da chamada: ele
//! recorre à região derivada dos estados e nunca substitui pela região padrão.
//! Não há retentativas, então o 429 carrega apenas o corpo da resposta.

use thiserror::Error;

/// Erros possíveis ao consultar o modelo.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP 429: cota ou limite de taxa excedido.
    #[error("OpenAI rate limit exceeded: {message}")]
    RateLimited { message: String },

    /// Qualquer outro status de erro (401 chave inválida, 500, ...).
    #[error("OpenAI returned status {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Falha de transporte ou de decodificação do corpo.
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A primeira escolha da resposta veio sem texto.
    #[error("completion contained no text")]
    EmptyReply,
}
