//! Busca, classifica e grava a região de um lote de parques.
//!
//! Falhas por registro são contabilizadas em [`SyncOutcome`] e nunca param o
//! lote. Só a falha ao buscar o conjunto de trabalho aborta a execução.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::airtable::{Record, RecordStore};
use crate::classifier::RegionClassifier;
use crate::error::SyncError;
use crate::openai::CompletionSender;
use crate::park::Park;
use crate::region::Region;
use crate::ui::SyncProgress;

/// O que processar e como.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Classifica e compara, mas nunca grava.
    pub dry_run: bool,
    /// Para após este número de registros selecionados.
    pub limit: Option<usize>,
    /// Processa apenas este ID de registro.
    pub record_id: Option<String>,
    /// Trecho que o nome do parque deve conter, sem diferenciar maiúsculas.
    pub name_filter: Option<String>,
    /// Reclassifica parques que já têm região.
    pub force: bool,
    pub page_size: u32,
    /// Pausa após cada registro processado.
    pub delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            limit: None,
            record_id: None,
            name_filter: None,
            force: false,
            page_size: crate::airtable::MAX_PAGE_SIZE,
            delay: Duration::from_secs(1),
        }
    }
}

/// Como a região de um registro mudou.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    New {
        id: String,
        name: String,
        region: Region,
    },
    Changed {
        id: String,
        name: String,
        old_region: String,
        new_region: Region,
    },
    Unchanged {
        id: String,
        name: String,
        region: Region,
    },
    Error {
        id: String,
        name: String,
        existing_region: Option<String>,
    },
}

/// Mudanças agrupadas por tipo, cada grupo na ordem de processamento.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    pub new: Vec<Change>,
    pub changed: Vec<Change>,
    pub unchanged: Vec<Change>,
    pub errors: Vec<Change>,
}

impl ChangeLog {
    fn record(&mut self, change: Change) {
        let bucket = match &change {
            Change::New { .. } => &mut self.new,
            Change::Changed { .. } => &mut self.changed,
            Change::Unchanged { .. } => &mut self.unchanged,
            Change::Error { .. } => &mut self.errors,
        };
        bucket.push(change);
    }
}

/// Contadores do resumo da execução.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Registros no conjunto de trabalho.
    pub total: usize,
    /// Registros classificados e gravados (ou que seriam, em modo de teste).
    pub processed: usize,
    /// Registros efetivamente gravados.
    pub written: usize,
    /// Registros pulados por já terem região.
    pub already_set: usize,
    /// Falhas de classificação ou de gravação.
    pub errors: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub stats: SyncStats,
    pub changes: ChangeLog,
}

impl SyncOutcome {
    /// Indica se a tabela mudou, caso em que vale imprimir a recontagem.
    pub fn wrote_any(&self) -> bool {
        self.stats.written > 0
    }
}

/// Classifica a transição de `existing` para `region`.
pub fn classify_change(park: &Park, region: Region) -> Change {
    let id = park.id.clone();
    let name = park.name.clone();
    match park.existing_region.as_deref() {
        None => Change::New { id, name, region },
        Some(old) if old == region.as_str() => Change::Unchanged { id, name, region },
        Some(old) => Change::Changed {
            id,
            name,
            old_region: old.to_string(),
            new_region: region,
        },
    }
}

/// Conduz uma sincronização contra uma tabela e um classificador.
pub struct Synchronizer<'a, S, C> {
    store: &'a S,
    classifier: &'a RegionClassifier<C>,
    options: SyncOptions,
}

impl<'a, S: RecordStore, C: CompletionSender> Synchronizer<'a, S, C> {
    pub fn new(store: &'a S, classifier: &'a RegionClassifier<C>, options: SyncOptions) -> Self {
        Self {
            store,
            classifier,
            options,
        }
    }

    /// O registro pedido, ou todos os registros selecionados até o limite.
    pub async fn fetch_working_set(&self) -> Result<Vec<Record>, SyncError> {
        if let Some(id) = &self.options.record_id {
            let record = self
                .store
                .get_record(id)
                .await
                .map_err(|source| SyncError::FetchRecord {
                    id: id.clone(),
                    source,
                })?;
            info!(id = %id, name = %record.to_park().name, "fetched park");
            return Ok(vec![record]);
        }

        let limit = self.options.limit;
        let page_size = match limit {
            Some(n) => self.options.page_size.min(u32::try_from(n).unwrap_or(u32::MAX)),
            None => self.options.page_size,
        };
        let needle = self.options.name_filter.as_ref().map(|n| n.to_lowercase());

        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let page = self
                .store
                .list_page(offset.as_deref(), page_size)
                .await
                .map_err(SyncError::Fetch)?;

            let fetched = page.records.into_iter().filter(|r| match &needle {
                Some(needle) => r
                    .fields
                    .name
                    .as_deref()
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains(needle.as_str()),
                None => true,
            });
            let before = records.len();
            records.extend(fetched);
            debug!(count = records.len() - before, "fetched page of parks");

            if let Some(limit) = limit
                && records.len() >= limit
            {
                records.truncate(limit);
                break;
            }
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }
        Ok(records)
    }

    /// Processa cada registro do conjunto de trabalho, na ordem da busca.
    pub async fn run(&self, progress: &SyncProgress) -> Result<SyncOutcome, SyncError> {
        let records = self.fetch_working_set().await?;
        info!(total = records.len(), "parks to process");

        let mut outcome = SyncOutcome::default();
        outcome.stats.total = records.len();
        progress.start(records.len());

        for record in &records {
            let park = record.to_park();
            progress.set_message(&park.name);

            if park.existing_region.is_some() && !self.options.force && !self.options.dry_run {
                outcome.stats.already_set += 1;
                progress.inc();
                continue;
            }

            let resolved = self.process(&park, &mut outcome).await;
            progress.inc();
            // Pausa só após registros que chegaram à etapa de gravação.
            if resolved && !self.options.delay.is_zero() {
                sleep(self.options.delay).await;
            }
        }

        progress.finish();
        Ok(outcome)
    }

    // Classifica, contabiliza e grava um parque. Retorna false quando nenhuma
    // região pôde ser resolvida.
    async fn process(&self, park: &Park, outcome: &mut SyncOutcome) -> bool {
        let Some(classification) = self.classifier.classify(park, self.options.dry_run).await else {
            outcome.stats.errors += 1;
            outcome.changes.record(Change::Error {
                id: park.id.clone(),
                name: park.name.clone(),
                existing_region: park.existing_region.clone(),
            });
            return false;
        };
        let region = classification.region;
        debug!(park = %park.name, region = %region, source = ?classification.source, "classified");
        outcome.changes.record(classify_change(park, region));

        if self.options.dry_run {
            info!(id = %park.id, region = %region, "TEST MODE: would update record");
            outcome.stats.processed += 1;
            return true;
        }

        match self.store.update_region(&park.id, region).await {
            Ok(_) => {
                outcome.stats.processed += 1;
                outcome.stats.written += 1;
            }
            Err(e) => {
                error!(id = %park.id, park = %park.name, error = %e, "error updating record");
                outcome.stats.errors += 1;
            }
        }
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::airtable::types::{ParkFields, RegionField};
    use crate::airtable::AirtableError;
    use crate::airtable::types::ListResponse;
    use crate::classifier::tests::MockClient;
    use crate::openai::types::{Choice, ReplyMessage};
    use crate::openai::{ChatRequest, ChatResponse, CompletionError};

    /// Tabela em memória servida em páginas de tamanho fixo.
    pub(crate) struct MockStore {
        pub(crate) records: RefCell<Vec<Record>>,
        pub(crate) updates: RefCell<Vec<(String, Region)>>,
        pub(crate) page_requests: RefCell<Vec<u32>>,
        pub(crate) fail_list: bool,
        pub(crate) fail_update_for: Option<String>,
    }

    impl MockStore {
        pub(crate) fn new(records: Vec<Record>) -> Self {
            Self {
                records: RefCell::new(records),
                updates: RefCell::new(Vec::new()),
                page_requests: RefCell::new(Vec::new()),
                fail_list: false,
                fail_update_for: None,
            }
        }
    }

    impl RecordStore for MockStore {
        async fn list_page(
            &self,
            offset: Option<&str>,
            page_size: u32,
        ) -> Result<ListResponse, AirtableError> {
            if self.fail_list {
                return Err(AirtableError::ApiError {
                    status: 401,
                    message: "AUTHENTICATION_REQUIRED".into(),
                });
            }
            self.page_requests.borrow_mut().push(page_size);
            let start: usize = offset.map_or(0, |o| o.parse().unwrap());
            let records = self.records.borrow();
            let end = (start + page_size as usize).min(records.len());
            Ok(ListResponse {
                records: records[start..end].to_vec(),
                offset: (end < records.len()).then(|| end.to_string()),
            })
        }

        async fn get_record(&self, id: &str) -> Result<Record, AirtableError> {
            self.records
                .borrow()
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| AirtableError::ApiError {
                    status: 404,
                    message: "NOT_FOUND".into(),
                })
        }

        async fn update_region(&self, id: &str, region: Region) -> Result<Record, AirtableError> {
            if self.fail_update_for.as_deref() == Some(id) {
                return Err(AirtableError::ApiError {
                    status: 422,
                    message: "INVALID_VALUE".into(),
                });
            }
            self.updates.borrow_mut().push((id.to_string(), region));
            let mut records = self.records.borrow_mut();
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| AirtableError::ApiError {
                    status: 404,
                    message: "NOT_FOUND".into(),
                })?;
            record.fields.region = Some(RegionField::Many(vec![region.as_str().to_string()]));
            Ok(record.clone())
        }
    }

    /// Responde com a próxima resposta roteirizada a cada chamada.
    struct ScriptedClient {
        replies: RefCell<VecDeque<&'static str>>,
    }

    impl ScriptedClient {
        fn new(replies: &[&'static str]) -> Self {
            Self {
                replies: RefCell::new(replies.iter().copied().collect()),
            }
        }
    }

    impl CompletionSender for ScriptedClient {
        async fn complete(&self, _req: &ChatRequest) -> Result<ChatResponse, CompletionError> {
            let text = self
                .replies
                .borrow_mut()
                .pop_front()
                .ok_or(CompletionError::EmptyReply)?;
            Ok(ChatResponse {
                id: "scripted".into(),
                choices: vec![Choice {
                    index: 0,
                    message: ReplyMessage {
                        role: "assistant".into(),
                        content: Some(text.to_string()),
                    },
                    finish_reason: Some("stop".into()),
                }],
                model: "scripted".into(),
                usage: None,
            })
        }
    }

    pub(crate) fn park_record(id: &str, name: &str, states: &[&str], region: Option<&str>) -> Record {
        Record {
            id: id.into(),
            fields: ParkFields {
                name: Some(name.into()),
                states_multi: states.iter().map(|s| s.to_string()).collect(),
                region: region.map(|r| RegionField::Many(vec![r.to_string()])),
                ..Default::default()
            },
            created_time: None,
        }
    }

    fn options() -> SyncOptions {
        SyncOptions {
            delay: Duration::ZERO,
            ..SyncOptions::default()
        }
    }

    async fn run<C: CompletionSender>(
        store: &MockStore,
        classifier: &RegionClassifier<C>,
        options: SyncOptions,
    ) -> SyncOutcome {
        Synchronizer::new(store, classifier, options)
            .run(&SyncProgress::hidden())
            .await
            .unwrap()
    }

    #[test]
    fn change_kinds() {
        let mut park = Park {
            id: "rec1".into(),
            name: "Zion".into(),
            ..Default::default()
        };
        assert!(matches!(classify_change(&park, Region::West), Change::New { .. }));
        park.existing_region = Some("West".into());
        assert!(matches!(classify_change(&park, Region::West), Change::Unchanged { .. }));
        park.existing_region = Some("South".into());
        assert_eq!(
            classify_change(&park, Region::West),
            Change::Changed {
                id: "rec1".into(),
                name: "Zion".into(),
                old_region: "South".into(),
                new_region: Region::West,
            }
        );
    }

    #[tokio::test]
    async fn end_to_end_new_changed_and_skipped() {
        let store = MockStore::new(vec![
            park_record("rec1", "Yosemite", &["California"], None),
            park_record("rec2", "Acadia", &["Maine"], Some("South")),
            park_record("rec3", "Arches", &["Utah"], Some("West")),
        ]);
        // A segunda resposta não faz sentido, então decidem os estados.
        let classifier = RegionClassifier::new(ScriptedClient::new(&["West", "unsure"]), "m");

        // Force vale para rec2; rec3 fica de fora e roda separado abaixo.
        let forced = SyncOptions {
            force: true,
            limit: Some(2),
            ..options()
        };
        let outcome = run(&store, &classifier, forced).await;
        assert_eq!(outcome.stats.total, 2);
        assert_eq!(outcome.stats.written, 2);
        assert_eq!(outcome.changes.new.len(), 1);
        assert_eq!(
            outcome.changes.changed,
            vec![Change::Changed {
                id: "rec2".into(),
                name: "Acadia".into(),
                old_region: "South".into(),
                new_region: Region::Northeast,
            }]
        );
        assert_eq!(
            *store.updates.borrow(),
            vec![("rec1".to_string(), Region::West), ("rec2".to_string(), Region::Northeast)]
        );

        let untouched = MockClient::ok("South");
        let classifier = RegionClassifier::new(&untouched, "m");
        let outcome = run(
            &store,
            &classifier,
            SyncOptions {
                record_id: Some("rec3".into()),
                ..options()
            },
        )
        .await;
        assert_eq!(outcome.stats.already_set, 1);
        assert_eq!(outcome.stats.written, 0);
        assert_eq!(untouched.calls(), 0);
        assert_eq!(store.updates.borrow().len(), 2);
    }

    #[tokio::test]
    async fn existing_region_is_skipped_without_force() {
        let store = MockStore::new(vec![
            park_record("rec1", "Arches", &["Utah"], Some("West")),
            park_record("rec2", "Everglades", &["Florida"], None),
        ]);
        let client = MockClient::ok("South");
        let classifier = RegionClassifier::new(&client, "m");

        let outcome = run(&store, &classifier, options()).await;
        assert_eq!(outcome.stats.already_set, 1);
        assert_eq!(outcome.stats.processed, 1);
        assert_eq!(client.calls(), 1);
        assert_eq!(*store.updates.borrow(), vec![("rec2".to_string(), Region::South)]);
    }

    #[tokio::test]
    async fn dry_run_classifies_existing_but_never_writes() {
        let store = MockStore::new(vec![
            park_record("rec1", "Arches", &["Utah"], Some("West")),
            park_record("rec2", "Everglades", &["Florida"], Some("West")),
        ]);
        let client = MockClient::ok("South");
        let classifier = RegionClassifier::new(&client, "m");

        let outcome = run(
            &store,
            &classifier,
            SyncOptions {
                dry_run: true,
                ..options()
            },
        )
        .await;
        assert_eq!(client.calls(), 2);
        assert!(store.updates.borrow().is_empty());
        assert_eq!(outcome.stats.already_set, 0);
        assert_eq!(outcome.stats.processed, 2);
        assert!(!outcome.wrote_any());
        assert_eq!(outcome.changes.changed.len(), 2);
    }

    #[tokio::test]
    async fn classification_failure_is_tallied_and_run_continues() {
        let store = MockStore::new(vec![
            park_record("rec1", "Mystery", &[], None),
            park_record("rec2", "Shenandoah", &["Virginia"], None),
        ]);
        let classifier = RegionClassifier::new(MockClient::failing(500), "m");

        let outcome = run(&store, &classifier, options()).await;
        assert_eq!(outcome.stats.errors, 1);
        assert_eq!(outcome.changes.errors.len(), 1);
        assert_eq!(*store.updates.borrow(), vec![("rec2".to_string(), Region::South)]);
    }

    #[tokio::test]
    async fn write_failure_is_tallied_and_run_continues() {
        let mut store = MockStore::new(vec![
            park_record("rec1", "Zion", &["Utah"], None),
            park_record("rec2", "Bryce Canyon", &["Utah"], None),
        ]);
        store.fail_update_for = Some("rec1".into());
        let classifier = RegionClassifier::new(MockClient::ok("West"), "m");

        let outcome = run(&store, &classifier, options()).await;
        assert_eq!(outcome.stats.errors, 1);
        assert_eq!(outcome.stats.written, 1);
        assert_eq!(outcome.changes.new.len(), 2);
    }

    #[tokio::test]
    async fn initial_fetch_failure_aborts() {
        let mut store = MockStore::new(vec![]);
        store.fail_list = true;
        let classifier = RegionClassifier::new(MockClient::ok("West"), "m");
        let result = Synchronizer::new(&store, &classifier, options())
            .run(&SyncProgress::hidden())
            .await;
        assert!(matches!(result, Err(SyncError::Fetch(_))));
    }

    #[tokio::test]
    async fn unknown_record_id_aborts() {
        let store = MockStore::new(vec![park_record("rec1", "Zion", &["Utah"], None)]);
        let classifier = RegionClassifier::new(MockClient::ok("West"), "m");
        let sync = Synchronizer::new(
            &store,
            &classifier,
            SyncOptions {
                record_id: Some("recNope".into()),
                ..options()
            },
        );
        assert!(matches!(
            sync.fetch_working_set().await,
            Err(SyncError::FetchRecord { .. })
        ));
    }

    #[tokio::test]
    async fn pagination_follows_offsets() {
        let records = (0..7)
            .map(|i| park_record(&format!("rec{i}"), &format!("Park {i}"), &[], None))
            .collect();
        let store = MockStore::new(records);
        let classifier = RegionClassifier::new(MockClient::ok("West"), "m");
        let sync = Synchronizer::new(
            &store,
            &classifier,
            SyncOptions {
                page_size: 3,
                ..options()
            },
        );
        let fetched = sync.fetch_working_set().await.unwrap();
        assert_eq!(fetched.len(), 7);
        assert_eq!(*store.page_requests.borrow(), vec![3, 3, 3]);
    }

    #[tokio::test]
    async fn limit_truncates_and_shrinks_page_size() {
        let records = (0..10)
            .map(|i| park_record(&format!("rec{i}"), &format!("Park {i}"), &[], None))
            .collect();
        let store = MockStore::new(records);
        let classifier = RegionClassifier::new(MockClient::ok("West"), "m");
        let sync = Synchronizer::new(
            &store,
            &classifier,
            SyncOptions {
                limit: Some(4),
                ..options()
            },
        );
        let fetched = sync.fetch_working_set().await.unwrap();
        assert_eq!(
            fetched.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["rec0", "rec1", "rec2", "rec3"]
        );
        assert_eq!(*store.page_requests.borrow(), vec![4]);
    }

    #[tokio::test]
    async fn name_filter_is_case_insensitive_substring() {
        let store = MockStore::new(vec![
            park_record("rec1", "Grand Canyon", &["Arizona"], None),
            park_record("rec2", "Grand Teton", &["Wyoming"], None),
            park_record("rec3", "Glacier", &["Montana"], None),
        ]);
        let classifier = RegionClassifier::new(MockClient::ok("West"), "m");
        let sync = Synchronizer::new(
            &store,
            &classifier,
            SyncOptions {
                name_filter: Some("GRAND".into()),
                ..options()
            },
        );
        let fetched = sync.fetch_working_set().await.unwrap();
        assert_eq!(fetched.len(), 2);
        assert!(fetched.iter().all(|r| r.id != "rec3"));
    }

    #[tokio::test]
    async fn unchanged_region_is_still_written_when_forced() {
        let store = MockStore::new(vec![park_record("rec1", "Zion", &["Utah"], Some("West"))]);
        let classifier = RegionClassifier::new(MockClient::ok("West"), "m");
        let outcome = run(
            &store,
            &classifier,
            SyncOptions {
                force: true,
                ..options()
            },
        )
        .await;
        assert_eq!(outcome.changes.unchanged.len(), 1);
        assert_eq!(outcome.stats.written, 1);
    }

    // Relógio pausado: cada sleep avança o tempo virtual exatamente.
    async fn timed_run<C: CompletionSender>(
        store: &MockStore,
        classifier: &RegionClassifier<C>,
        options: SyncOptions,
    ) -> (SyncOutcome, Duration) {
        let started = tokio::time::Instant::now();
        let outcome = run(store, classifier, options).await;
        (outcome, started.elapsed())
    }

    fn paced() -> SyncOptions {
        SyncOptions {
            delay: Duration::from_millis(400),
            ..SyncOptions::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn each_processed_record_waits_once() {
        let store = MockStore::new(vec![
            park_record("rec1", "Zion", &["Utah"], None),
            park_record("rec2", "Acadia", &["Maine"], None),
        ]);
        let classifier = RegionClassifier::new(MockClient::ok("West"), "m");
        let (outcome, elapsed) = timed_run(&store, &classifier, paced()).await;
        assert_eq!(outcome.stats.written, 2);
        assert_eq!(elapsed, Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn skipped_record_does_not_wait() {
        let store = MockStore::new(vec![
            park_record("rec1", "Arches", &["Utah"], Some("West")),
            park_record("rec2", "Everglades", &["Florida"], None),
        ]);
        let classifier = RegionClassifier::new(MockClient::ok("South"), "m");
        let (outcome, elapsed) = timed_run(&store, &classifier, paced()).await;
        assert_eq!(outcome.stats.already_set, 1);
        assert_eq!(elapsed, Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_classification_does_not_wait() {
        let store = MockStore::new(vec![park_record("rec1", "Mystery", &[], None)]);
        let classifier = RegionClassifier::new(MockClient::failing(500), "m");
        let (outcome, elapsed) = timed_run(&store, &classifier, paced()).await;
        assert_eq!(outcome.stats.errors, 1);
        assert_eq!(elapsed, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_still_waits() {
        let mut store = MockStore::new(vec![park_record("rec1", "Zion", &["Utah"], None)]);
        store.fail_update_for = Some("rec1".into());
        let classifier = RegionClassifier::new(MockClient::ok("West"), "m");
        let (outcome, elapsed) = timed_run(&store, &classifier, paced()).await;
        assert_eq!(outcome.stats.errors, 1);
        assert_eq!(elapsed, Duration::from_millis(400));
    }
}
