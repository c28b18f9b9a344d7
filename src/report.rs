//! Contagem de parques por região na tabela inteira.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::airtable::{AirtableError, Record, RecordStore};
use crate::region::{REGIONS, Region};

pub const UNASSIGNED: &str = "Unassigned";

/// Parques sem região são listados por nome só até esta quantidade.
pub const UNASSIGNED_LIST_LIMIT: usize = 20;

/// Uma linha do relatório.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub label: String,
    pub count: usize,
    /// Fração de todos os registros; 0 com a tabela vazia.
    pub percentage: f64,
}

/// Contagens de uma passada pela tabela.
#[derive(Debug, Clone, Default)]
pub struct RegionTally {
    pub total: usize,
    pub counts: BTreeMap<Region, usize>,
    pub unassigned: usize,
    /// Estados vistos nos parques de cada região.
    pub states: BTreeMap<Region, BTreeSet<String>>,
    /// `name (states)` de cada parque sem região.
    pub unassigned_parks: Vec<String>,
}

impl RegionTally {
    /// Conta cada tag de região de cada registro.
    ///
    /// Tags desconhecidas são logadas e ignoradas; um registro sem nenhuma tag
    /// fica sem região.
    pub fn from_records(records: &[Record]) -> Self {
        let mut tally = Self {
            total: records.len(),
            counts: REGIONS.into_iter().map(|r| (r, 0)).collect(),
            ..Self::default()
        };

        for record in records {
            let park = record.to_park();
            let tags = record.fields.region_tags();
            if tags.is_empty() {
                tally.unassigned += 1;
                tally
                    .unassigned_parks
                    .push(format!("{} ({})", park.name, park.states.join(", ")));
                continue;
            }
            for tag in tags {
                match tag.parse::<Region>() {
                    Ok(region) => {
                        *tally.counts.entry(region).or_default() += 1;
                        tally
                            .states
                            .entry(region)
                            .or_default()
                            .extend(park.states.iter().cloned());
                    }
                    Err(_) => {
                        warn!(park = %park.name, region = %tag, "unknown region found in park record");
                    }
                }
            }
        }
        tally
    }

    /// Regiões mais "Unassigned", por contagem decrescente e rótulo crescente.
    pub fn rows(&self) -> Vec<ReportRow> {
        let mut rows: Vec<ReportRow> = self
            .counts
            .iter()
            .map(|(region, &count)| (region.as_str().to_string(), count))
            .chain(std::iter::once((UNASSIGNED.to_string(), self.unassigned)))
            .map(|(label, count)| ReportRow {
                percentage: percentage(count, self.total),
                label,
                count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        rows
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Todos os registros da tabela, seguindo os tokens de continuação.
pub async fn fetch_all<S: RecordStore>(
    store: &S,
    page_size: u32,
) -> Result<Vec<Record>, AirtableError> {
    let mut records = Vec::new();
    let mut offset: Option<String> = None;
    loop {
        let page = store.list_page(offset.as_deref(), page_size).await?;
        records.extend(page.records);
        match page.offset {
            Some(next) => offset = Some(next),
            None => return Ok(records),
        }
    }
}

/// Busca a tabela inteira de novo e faz a contagem.
pub async fn recount<S: RecordStore>(
    store: &S,
    page_size: u32,
) -> Result<RegionTally, AirtableError> {
    let records = fetch_all(store, page_size).await?;
    Ok(RegionTally::from_records(&records))
}
