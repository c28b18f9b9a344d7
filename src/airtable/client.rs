//! Cliente da API de registros do Airtable para uma única tabela.

use std::time::Duration;

use reqwest::{Client, Response, Url};

use super::error::AirtableError;
use super::types::{ListResponse, Record, UpdateRequest};
use crate::region::Region;

/// Raiz pública da API.
pub const API_URL: &str = "https://api.airtable.com/v0";

/// Maior página que o Airtable devolve.
pub const MAX_PAGE_SIZE: u32 = 100;

/// As três operações de tabela usadas pela sincronização.
pub trait RecordStore {
    /// Uma página de registros, continuando de `offset` quando informado.
    async fn list_page(
        &self,
        offset: Option<&str>,
        page_size: u32,
    ) -> Result<ListResponse, AirtableError>;

    /// Um registro pelo seu ID.
    async fn get_record(&self, id: &str) -> Result<Record, AirtableError>;

    /// Atualiza apenas a coluna `Region`.
    async fn update_region(&self, id: &str, region: Region) -> Result<Record, AirtableError>;
}

/// Cliente autenticado por bearer token para uma tabela.
pub struct AirtableClient {
    // Token de acesso pessoal.
    token: String,
    // Base `app...` que contém a tabela.
    base_id: String,
    // Nome da tabela.
    table: String,
    client: Client,
    // Raiz da API; barra final é tolerada.
    base_url: String,
}

impl AirtableClient {
    /// Cria um cliente para a tabela em `base_url`, normalmente [`API_URL`] ou um servidor de teste.
    pub fn with_base_url(token: String, base_id: String, table: String, base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            token,
            base_id,
            table,
            client,
            base_url,
        }
    }

    // `{base_url}/{base_id}/{table}[/{record_id}]`, cada segmento com percent-encoding.
    fn table_url(&self, record_id: Option<&str>) -> Result<Url, AirtableError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| AirtableError::InvalidUrl(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AirtableError::InvalidUrl(self.base_url.clone()))?;
            segments.pop_if_empty().push(&self.base_id).push(&self.table);
            if let Some(id) = record_id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

// Converte um status de erro em `ApiError` com o corpo da resposta.
async fn check_status(response: Response) -> Result<Response, AirtableError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(AirtableError::ApiError {
        status: status.as_u16(),
        message,
    })
}

impl RecordStore for AirtableClient {
    async fn list_page(
        &self,
        offset: Option<&str>,
        page_size: u32,
    ) -> Result<ListResponse, AirtableError> {
        let mut query = vec![("pageSize", page_size.clamp(1, MAX_PAGE_SIZE).to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let response = self
            .client
            .get(self.table_url(None)?)
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await?;

        Ok(check_status(response).await?.json::<ListResponse>().await?)
    }

    async fn get_record(&self, id: &str) -> Result<Record, AirtableError> {
        let response = self
            .client
            .get(self.table_url(Some(id))?)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Ok(check_status(response).await?.json::<Record>().await?)
    }

    async fn update_region(&self, id: &str, region: Region) -> Result<Record, AirtableError> {
        let response = self
            .client
            .patch(self.table_url(Some(id))?)
            .bearer_auth(&self.token)
            .json(&UpdateRequest::region(region))
            .send()
            .await?;

        Ok(check_status(response).await?.json::<Record>().await?)
    }
}
