//! Erros ao conversar com a API de registros do Airtable.

use thiserror::Error;

/// Falhas de listagem, leitura ou atualização de registros.
#[derive(Debug, Error)]
pub enum AirtableError {
    /// Status de erro, com o corpo da resposta como mensagem.
    #[error("Airtable returned status {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Falha de transporte ou de decodificação do corpo.
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// A URL base configurada não aceita um caminho de registro.
    #[error("invalid Airtable URL: {0}")]
    InvalidUrl(String),
}
