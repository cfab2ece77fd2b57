//! Drives a complete run: crawl, dispatch per leaf, finalize.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::{
    FailedBranch, OutputMode, PipelineConfig, PipelineError, RunProgress, RunState, RunSummary,
};
use crate::catalog::{CatalogCrawler, Extractor, HtmlExtractor, LeafBatch, print_url};
use crate::download::{DocumentFetcher, DownloadTask, FetchError, HttpClient};
use crate::naming::NamingPolicy;
use crate::output::{AppendWriter, OutputAssembler, OutputSink};

/// One configured crawl-and-convert run.
///
/// # Example
///
/// ```no_run
/// use chartfetch_core::pipeline::{Pipeline, PipelineConfig, Preset};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = Pipeline::new(PipelineConfig::from_preset(Preset::AirfieldsWithInfo))?;
/// let summary = pipeline.run().await?;
/// println!("{} written, {} failed", summary.documents_written, summary.documents_failed());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    client: HttpClient,
    extractor: Arc<dyn Extractor>,
    naming: NamingPolicy,
    assembler: Option<Box<dyn OutputAssembler>>,
    cancel: Arc<AtomicBool>,
    progress: Arc<RunProgress>,
}

/// Mutable state threaded through the leaf loop.
struct Dispatch {
    fetcher: DocumentFetcher,
    semaphore: Arc<Semaphore>,
    next_sequence: u64,
    /// Names already written in per-document mode.
    used_names: HashSet<String>,
    output_files: BTreeSet<PathBuf>,
}

impl Pipeline {
    /// Validates `config` and builds the HTTP client and extractor.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for invalid configuration,
    /// or a setup error if the client or extractor cannot be built.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let client =
            HttpClient::with_timeouts(config.connect_timeout, config.read_timeout, config.fetch_timeout)
                .map_err(PipelineError::Client)?;
        let extractor: Arc<dyn Extractor> = Arc::new(HtmlExtractor::new(&config.info_prefix)?);
        Ok(Self {
            naming: config.naming_policy(),
            config,
            client,
            extractor,
            assembler: None,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(RunProgress::new()),
        })
    }

    /// Replaces the page extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Sets the step run over the output root after all documents are written.
    #[must_use]
    pub fn with_assembler(mut self, assembler: impl OutputAssembler + 'static) -> Self {
        self.assembler = Some(Box::new(assembler));
        self
    }

    /// Uses an externally owned cancellation flag.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag that stops the run before the next leaf when set.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Live counters for progress display.
    #[must_use]
    pub fn progress(&self) -> Arc<RunProgress> {
        Arc::clone(&self.progress)
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the pipeline to completion.
    ///
    /// Only an unreachable index or an unpreparable output root abort the
    /// run; every other failure is recorded in the returned summary.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexUnreachable`] or [`PipelineError::OutputSetup`].
    #[instrument(skip(self), fields(output = %self.config.output_dir.display()))]
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let result = self.run_inner().await;
        let state = if result.is_ok() {
            RunState::Done
        } else {
            RunState::Failed
        };
        self.progress.set_state(state);
        result
    }

    async fn run_inner(&self) -> Result<RunSummary, PipelineError> {
        self.progress.set_state(RunState::Crawling);
        let index_url = self.config.index_url()?;
        info!(index = %index_url, "starting crawl");

        let mut crawler = CatalogCrawler::open(
            self.client.clone(),
            Arc::clone(&self.extractor),
            self.config.retry_policy(),
            &self.config.base_url,
            &index_url,
            &self.config.print_url_base,
            &self.config.section_selection,
        )
        .await?;

        let (sink, writer) = self.prepare_output().await?;
        let mut dispatch = Dispatch {
            fetcher: DocumentFetcher::new(
                self.client.clone(),
                Arc::clone(&self.extractor),
                self.config.retry_policy(),
                sink,
            ),
            semaphore: Arc::new(Semaphore::new(self.config.concurrency)),
            next_sequence: 0,
            used_names: HashSet::new(),
            output_files: BTreeSet::new(),
        };
        let mut summary = RunSummary::default();

        loop {
            if self.cancel.load(Ordering::SeqCst) {
                info!("cancellation requested, stopping before next leaf");
                summary.interrupted = true;
                break;
            }
            self.progress.set_state(RunState::Crawling);
            let Some(batch) = crawler.next_leaf().await else {
                break;
            };
            self.progress.leaf_visited();
            self.run_batch(&batch, &mut dispatch, &mut summary).await;
        }

        summary.branch_errors = crawler
            .take_branch_errors()
            .iter()
            .map(FailedBranch::from)
            .collect();

        self.progress.set_state(RunState::Finalizing);
        let Dispatch {
            fetcher,
            mut output_files,
            ..
        } = dispatch;
        drop(fetcher);

        if let Some(writer) = writer {
            let path = writer.path().to_path_buf();
            match writer.finish().await {
                Ok(outcome) => {
                    debug!(pages = outcome.pages, bytes = outcome.bytes, "append document finished");
                    output_files.insert(path);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "append document incomplete");
                    summary
                        .finalize_errors
                        .push(format!("{}: {e}", path.display()));
                }
            }
        }

        if let Some(assembler) = &self.assembler {
            if let Err(e) = assembler.assemble(&self.config.output_dir).await {
                warn!(error = %e, "output assembly failed");
                summary.finalize_errors.push(e.to_string());
            }
        }

        summary.output_files = output_files.into_iter().collect();
        info!(
            written = summary.documents_written,
            skipped = summary.documents_skipped,
            failed = summary.documents_failed(),
            branches_skipped = summary.branch_errors.len(),
            interrupted = summary.interrupted,
            "run complete"
        );
        Ok(summary)
    }

    async fn prepare_output(&self) -> Result<(OutputSink, Option<AppendWriter>), PipelineError> {
        let root = &self.config.output_dir;
        create_dir(root).await?;
        match self.config.output_mode {
            OutputMode::PerDocumentFile => {
                let dir = self.config.document_dir();
                create_dir(&dir).await?;
                Ok((OutputSink::Directory(dir), None))
            }
            OutputMode::AppendedSinglePdf => {
                let path = self.config.append_path();
                let (writer, handle) = AppendWriter::create(&path)
                    .await
                    .map_err(|source| PipelineError::OutputSetup { path, source })?;
                Ok((OutputSink::Append(handle), Some(writer)))
            }
        }
    }

    /// Names, dispatches and awaits every document of one leaf.
    ///
    /// A document whose name is held by an in-flight sibling waits for the
    /// next round; it is only refused once that name has been written.
    #[instrument(skip_all, fields(leaf = %batch.leaf.display_name, documents = batch.entries.len()))]
    async fn run_batch(&self, batch: &LeafBatch, dispatch: &mut Dispatch, summary: &mut RunSummary) {
        self.progress.set_state(RunState::Fetching);
        let mut pending = Vec::with_capacity(batch.entries.len());

        for entry in &batch.entries {
            let Some(name) = self.naming.name(entry, &batch.leaf) else {
                debug!(document = %entry.display_name, "skipped by naming policy");
                summary.documents_skipped += 1;
                self.progress.document_skipped();
                continue;
            };

            match print_url(&batch.print_base, &entry.href) {
                Ok(url) => pending.push((url, name)),
                Err(e) => {
                    let error = FetchError::unreachable(&entry.href, e);
                    warn!(href = %entry.href, error = %error, "unresolvable document link");
                    summary.record_failure(&entry.href, &name, &error);
                    self.progress.document_failed();
                }
            }
        }

        while !pending.is_empty() {
            pending = self.run_round(pending, &batch.leaf.url, dispatch, summary).await;
        }
    }

    /// Dispatches one round of a leaf's documents and waits for all of them.
    ///
    /// Returns the documents deferred behind a same-named sibling.
    async fn run_round(
        &self,
        pending: Vec<(String, String)>,
        referer: &str,
        dispatch: &mut Dispatch,
        summary: &mut RunSummary,
    ) -> Vec<(String, String)> {
        self.progress.set_state(RunState::Fetching);
        let append = dispatch.fetcher.sink().is_append();
        let mut claimed = HashSet::new();
        let mut deferred = Vec::new();
        let mut handles = Vec::new();

        for (url, name) in pending {
            if !append {
                if dispatch.used_names.contains(&name) {
                    let error = FetchError::NameCollision {
                        url: url.clone(),
                        name: name.clone(),
                    };
                    warn!(url = %url, name = %name, "output name already written");
                    summary.record_failure(&url, &name, &error);
                    self.progress.document_failed();
                    continue;
                }
                if !claimed.insert(name.clone()) {
                    debug!(url = %url, name = %name, "waiting for same-named document");
                    deferred.push((url, name));
                    continue;
                }
            }

            let task = DownloadTask {
                source_url: url,
                output_name: name,
                referer: referer.to_string(),
                sequence: dispatch.next_sequence,
            };
            dispatch.next_sequence += 1;

            // Permits are taken in sequence order so append slots always drain.
            let Ok(permit) = Arc::clone(&dispatch.semaphore).acquire_owned().await else {
                warn!("concurrency limiter closed, dropping remaining documents");
                dispatch.fetcher.sink().release(task.sequence).await;
                deferred.clear();
                break;
            };

            let fetcher = dispatch.fetcher.clone();
            let progress = Arc::clone(&self.progress);
            let job = task.clone();
            handles.push((
                task,
                tokio::spawn(async move {
                    let _permit = permit;
                    let result = fetcher.run(&job).await;
                    match &result {
                        Ok(written) => progress.document_written(written.bytes),
                        Err(_) => progress.document_failed(),
                    }
                    result
                }),
            ));
        }

        self.progress.set_state(RunState::Awaiting);
        debug!(task_count = handles.len(), "waiting for leaf documents");
        let (tasks, joins): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let results = join_all(joins).await;

        for (task, result) in tasks.into_iter().zip(results) {
            match result {
                Ok(Ok(written)) => {
                    info!(path = %written.path.display(), bytes = written.bytes, "document written");
                    summary.documents_written += 1;
                    summary.bytes_written += written.bytes;
                    dispatch.output_files.insert(written.path);
                    if !append {
                        dispatch.used_names.insert(task.output_name);
                    }
                }
                Ok(Err(e)) => {
                    warn!(url = %task.source_url, error = %e, "document failed");
                    summary.record_failure(&task.source_url, &task.output_name, &e);
                }
                Err(e) => {
                    // Task panics are logged but don't fail the batch
                    warn!(url = %task.source_url, error = %e, "document task panicked");
                    dispatch.fetcher.sink().release(task.sequence).await;
                    let error = FetchError::unreachable(&task.source_url, format!("task aborted: {e}"));
                    summary.record_failure(&task.source_url, &task.output_name, &error);
                    self.progress.document_failed();
                }
            }
        }

        deferred
    }
}

async fn create_dir(path: &std::path::Path) -> Result<(), PipelineError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| PipelineError::OutputSetup {
            path: path.to_path_buf(),
            source,
        })
}
