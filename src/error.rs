use thiserror::Error;

use crate::airtable::AirtableError;

/// Condições que abortam a execução inteira. Falhas por registro nunca chegam aqui.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Credencial ausente ou configuração inválida.
    #[error("Config error: {0}")]
    Config(String),

    /// Falha na busca inicial da tabela.
    #[error("Failed to fetch parks from Airtable: {0}")]
    Fetch(#[source] AirtableError),

    /// Falha ao buscar o registro pedido via `--id`.
    #[error("Failed to fetch park with ID {id}: {source}")]
    FetchRecord {
        id: String,
        #[source]
        source: AirtableError,
    },
}
