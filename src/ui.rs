//! Saída de terminal: barra de progresso da execução e resumos coloridos.
//!
//! Usa `indicatif` para o progresso e `console` para o estilo. Eventos de
//! diagnóstico passam pelo `tracing`, escritos via [`ProgressWriter`] para
//! não corromper a barra; o restante aqui é o relatório para humanos.

use std::io::{self, Write};

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::fmt::MakeWriter;

use crate::region::{REGIONS, Region};
use crate::report::{RegionTally, UNASSIGNED_LIST_LIMIT};
use crate::sync::{Change, SyncOptions, SyncOutcome};

/// Barra de progresso por registro de uma sincronização.
pub struct SyncProgress {
    // Barra do indicatif; clones compartilham o mesmo estado.
    pb: ProgressBar,
}

impl SyncProgress {
    /// Cria a barra com o estilo da sincronização, ainda sem tamanho.
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} Processing parks [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .expect("invalid template")
                .progress_chars("=> "),
        );
        Self { pb }
    }

    /// Uma barra que não desenha nada.
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }

    /// Writer para o subscriber do `tracing` que apaga a barra antes de cada
    /// linha de log e a redesenha em seguida.
    pub fn writer(&self) -> ProgressWriter {
        ProgressWriter {
            pb: self.pb.clone(),
        }
    }

    /// Define o total de registros e zera a posição.
    pub fn start(&self, total: usize) {
        self.pb.set_length(total as u64);
        self.pb.set_position(0);
    }

    /// Mostra o nome do parque em processamento.
    pub fn set_message(&self, park: &str) {
        self.pb.set_message(park.to_string());
    }

    pub fn inc(&self) {
        self.pb.inc(1);
    }

    /// Remove a barra do terminal.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl Default for SyncProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Destino de logs que escreve em stderr com a barra suspensa.
#[derive(Clone)]
pub struct ProgressWriter {
    pb: ProgressBar,
}

impl Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pb.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for ProgressWriter {
    type Writer = ProgressWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Imprime o modo de execução e os filtros ativos antes da sincronização.
pub fn print_header(options: &SyncOptions, model: &str) {
    let bold = Style::new().bold();
    let mode = if options.dry_run { "TEST MODE" } else { "UPDATE MODE" };
    println!("Starting region update process in {}...", bold.apply_to(mode));
    println!("Using OpenAI model: {model}");
    println!(
        "Using region options: {}",
        REGIONS.map(Region::as_str).join(", ")
    );
    if let Some(id) = &options.record_id {
        println!("Processing only park with ID: {id}");
    }
    if let Some(name) = &options.name_filter {
        println!("Processing only parks with name containing: {name}");
    }
    if let Some(limit) = options.limit {
        println!("Limiting to {limit} parks");
    }
    if options.force {
        println!("Forcing update even for parks with existing regions");
    }
}

/// Imprime os contadores e o detalhe das mudanças após a sincronização.
pub fn print_summary(outcome: &SyncOutcome, options: &SyncOptions) {
    let header = Style::new().cyan().bold();
    let red = Style::new().red();
    let yellow = Style::new().yellow();
    let stats = &outcome.stats;
    let changes = &outcome.changes;

    println!();
    println!("{}", header.apply_to("--- SUMMARY ---"));
    println!("Total parks processed: {}", stats.total);
    if !options.dry_run && !options.force {
        println!("Parks already had regions (skipped): {}", stats.already_set);
    }
    println!("Parks processed: {}", stats.processed);
    let errors = format!("Errors: {}", stats.errors);
    if stats.errors > 0 {
        println!("{}", red.apply_to(errors));
    } else {
        println!("{errors}");
    }

    println!();
    println!("{}", header.apply_to("--- CHANGES DETAIL ---"));
    println!("New region assignments: {}", changes.new.len());
    println!("Changed region assignments: {}", changes.changed.len());
    println!("Unchanged region assignments: {}", changes.unchanged.len());

    if !changes.changed.is_empty() {
        println!();
        println!("Region changes:");
        for change in &changes.changed {
            if let Change::Changed {
                name,
                old_region,
                new_region,
                ..
            } = change
            {
                println!("  {name}: {old_region} {} {new_region}", yellow.apply_to("→"));
            }
        }
    }

    if !changes.errors.is_empty() {
        println!();
        println!("Failed parks:");
        for change in &changes.errors {
            if let Change::Error {
                id,
                name,
                existing_region,
            } = change
            {
                let existing = existing_region.as_deref().unwrap_or("none");
                println!("  {} {name} ({id}), existing region: {existing}", red.apply_to("✗"));
            }
        }
    }
}

/// Imprime a contagem por região, como após uma sincronização que gravou algo.
pub fn print_regions_report(tally: &RegionTally) {
    println!();
    println!("{}", Style::new().cyan().bold().apply_to("--- REGIONS REPORT ---"));
    for row in tally.rows() {
        println!("{}: {} parks ({:.1}%)", row.label, row.count, row.percentage);
    }
}

/// Imprime a contagem com os estados vistos por região e os parques sem região.
pub fn print_detailed_report(tally: &RegionTally) {
    let header = Style::new().cyan().bold();
    let dim = Style::new().dim();

    println!();
    println!("{}", header.apply_to("=== National Parks by Region ==="));
    println!("Total Parks: {}", tally.total);
    println!();

    for row in tally.rows() {
        if row.count == 0 {
            continue;
        }
        println!("{}: {} parks ({:.1}%)", row.label, row.count, row.percentage);
        if let Ok(region) = row.label.parse::<Region>()
            && let Some(states) = tally.states.get(&region)
        {
            let states: Vec<&str> = states.iter().map(String::as_str).collect();
            println!("  States: {}", dim.apply_to(states.join(", ")));
        }
        if row.label == crate::report::UNASSIGNED && tally.unassigned <= UNASSIGNED_LIST_LIMIT {
            println!("Unassigned parks:");
            for park in &tally.unassigned_parks {
                println!("  - {park}");
            }
        }
        println!();
    }
}
