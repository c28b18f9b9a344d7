//! Interface de linha de comando baseada em clap.
//!
//! Define a struct [`Cli`] com os subcomandos [`Command`] (sync, report)
//! e a flag global --verbose.

use clap::{Args, Parser, Subcommand};

/// Atribui regiões geográficas dos EUA aos parques nacionais no Airtable.
#[derive(Debug, Parser)]
#[command(name = "park-regions", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Habilita logs em nível debug (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Subcomandos disponíveis.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classifica os parques e grava a região de volta no Airtable.
    Sync(SyncArgs),

    /// Conta parques por região, com estados e parques sem região.
    Report,
}

/// Argumentos do subcomando `sync`.
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Executa sem atualizar o Airtable; regiões existentes são comparadas em vez de puladas.
    #[arg(long, alias = "dry-run")]
    pub test: bool,

    /// Limita o número de parques processados.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub limit: Option<u64>,

    /// Processa apenas o parque com este ID de registro do Airtable.
    #[arg(long)]
    pub id: Option<String>,

    /// Processa apenas parques cujo nome contém este texto (sem diferenciar maiúsculas).
    #[arg(long)]
    pub name: Option<String>,

    /// Reatribui a região mesmo quando já definida.
    #[arg(long)]
    pub force: bool,

    /// Chave da API OpenAI (sobrescreve OPENAI_API_KEY).
    #[arg(long)]
    pub api_key: Option<String>,

    /// Modelo OpenAI a usar [padrão: gpt-4o].
    #[arg(long)]
    pub model: Option<String>,
}
