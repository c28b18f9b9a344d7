//! Configuração de execução carregada a partir de `park-regions.toml`.
//!
//! A struct [`SyncConfig`] reúne credenciais e parâmetros da sincronização.
//! Valores ausentes no arquivo usam defaults. Variáveis de ambiente têm
//! precedência sobre o arquivo; as flags da CLI são aplicadas por cima.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use crate::airtable::MAX_PAGE_SIZE;
use crate::error::SyncError;

pub const CONFIG_FILE: &str = "park-regions.toml";

/// Configuração de nível superior carregada de `park-regions.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Token de acesso pessoal do Airtable.
    #[serde(default)]
    pub airtable_token: String,

    /// Identificador da base Airtable (`app...`).
    #[serde(default)]
    pub airtable_base_id: String,

    /// Nome da tabela de parques dentro da base.
    #[serde(default = "default_table_name")]
    pub airtable_table_name: String,

    /// Chave da API OpenAI; exigida apenas pelo `sync`.
    #[serde(default)]
    pub openai_api_key: String,

    /// Identificador do modelo repassado ao endpoint de completions.
    #[serde(default = "default_model")]
    pub model: String,

    /// Registros por página de listagem, limitado ao máximo do Airtable.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pausa após cada registro processado, em milissegundos.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Raiz da API Airtable; sobrescrita nos testes.
    #[serde(default = "default_airtable_url")]
    pub airtable_url: String,

    /// Endpoint de chat completions da OpenAI.
    #[serde(default = "default_openai_url")]
    pub openai_url: String,
}

// Tabela padrão: "national-parks".
fn default_table_name() -> String {
    "national-parks".to_string()
}

// Modelo padrão: "gpt-4o".
fn default_model() -> String {
    "gpt-4o".to_string()
}

// Página cheia: 100 registros.
fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

// Pausa padrão entre registros: 1000ms.
fn default_delay_ms() -> u64 {
    1000
}

// API pública do Airtable.
fn default_airtable_url() -> String {
    crate::airtable::client::API_URL.to_string()
}

// API pública da OpenAI.
fn default_openai_url() -> String {
    crate::openai::client::API_URL.to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            airtable_token: String::new(),
            airtable_base_id: String::new(),
            airtable_table_name: default_table_name(),
            openai_api_key: String::new(),
            model: default_model(),
            page_size: default_page_size(),
            delay_ms: default_delay_ms(),
            airtable_url: default_airtable_url(),
            openai_url: default_openai_url(),
        }
    }
}

impl SyncConfig {
    /// Carrega `park-regions.toml` do diretório atual e aplica as variáveis
    /// de ambiente. Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho específico.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<SyncConfig>(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Sobrescreve campos com as variáveis não vazias devolvidas por `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields: [(&str, &mut String); 5] = [
            ("AIRTABLE_TOKEN", &mut self.airtable_token),
            ("AIRTABLE_BASE_ID", &mut self.airtable_base_id),
            ("AIRTABLE_TABLE_NAME", &mut self.airtable_table_name),
            ("OPENAI_API_KEY", &mut self.openai_api_key),
            ("OPENAI_MODEL", &mut self.model),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key)
                && !value.is_empty()
            {
                *field = value;
            }
        }
    }

    /// Falha na primeira credencial ausente.
    ///
    /// A chave OpenAI só é exigida quando a execução vai consultar o modelo.
    pub fn validate(&self, needs_model: bool) -> Result<(), SyncError> {
        if self.airtable_token.is_empty() {
            return Err(SyncError::Config(
                "Airtable token is required. Set AIRTABLE_TOKEN or airtable_token.".into(),
            ));
        }
        if self.airtable_base_id.is_empty() {
            return Err(SyncError::Config(
                "Airtable base id is required. Set AIRTABLE_BASE_ID or airtable_base_id.".into(),
            ));
        }
        if self.airtable_table_name.is_empty() {
            return Err(SyncError::Config("Airtable table name must not be empty.".into()));
        }
        if needs_model && self.openai_api_key.is_empty() {
            return Err(SyncError::Config(
                "OpenAI API key is required. Provide it via --api-key or OPENAI_API_KEY.".into(),
            ));
        }
        Ok(())
    }

    /// Pausa entre registros como [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
