use std::sync::Arc;

use barscale_cache::CacheManager;
use barscale_core::{
    BarSource, Indicator, IndicatorPoint, plan_chunks, postcheck, precheck, progress_after,
    resample_bars, resample_points,
};
use barscale_types::{
    Bar, BarscaleError, EngineConfig, Exchange, IndicatorMode, Interval, ResampleKey,
    ResampleRequest, TimeRange,
};

use crate::task::{Admission, TaskRecord, TaskRegistry};
use crate::{TaskId, TaskStatus};

/// How a resample request completed.
#[derive(Debug, Clone)]
pub enum ResampleOutcome {
    /// The aggregated series, produced synchronously from the cache or a
    /// small enough range.
    Complete(Arc<Vec<Bar>>),
    /// The range was large enough to run as a background task; poll with
    /// [`ResampleEngine::task_status`].
    Queued(TaskId),
}

/// On-demand OHLCV resampling engine.
///
/// Derives coarser bars from a 1-minute [`BarSource`], serving small ranges
/// synchronously and large ranges as chunked background tasks with progress
/// and cancellation. Results are cached per request key with LRU and TTL
/// bounds; new base data for a symbol is signalled via [`invalidate`].
///
/// The engine is cheap to share: every method takes `&self` and internal
/// state is synchronized. Construction hands back an `Arc` because
/// background tasks hold a reference to the engine across awaits.
///
/// [`invalidate`]: ResampleEngine::invalidate
pub struct ResampleEngine {
    source: Arc<dyn BarSource>,
    cache: CacheManager,
    tasks: TaskRegistry,
    cfg: EngineConfig,
}

impl ResampleEngine {
    /// Build an engine over `source` with the given configuration.
    #[must_use]
    pub fn new(source: Arc<dyn BarSource>, cfg: EngineConfig) -> Arc<Self> {
        Arc::new(Self {
            source,
            cache: CacheManager::new(cfg.cache.clone()),
            tasks: TaskRegistry::new(cfg.task_retention),
            cfg,
        })
    }

    /// The engine's cache, for inspection and maintenance sweeps.
    #[must_use]
    pub const fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Resample a request, choosing the execution mode by estimated size.
    ///
    /// A cache hit or a range within the chunk threshold completes
    /// synchronously. Anything larger runs as a background task; an
    /// identical request while that task is live joins it instead of
    /// duplicating the work.
    ///
    /// # Errors
    /// `Disabled` when the engine is switched off; `NoBaseData` when the
    /// source holds nothing for the range; validation and adapter errors
    /// propagate from the pipeline. Background-task failures surface through
    /// [`task_status`](ResampleEngine::task_status) instead.
    pub async fn resample(
        self: &Arc<Self>,
        req: ResampleRequest,
    ) -> Result<ResampleOutcome, BarscaleError> {
        if !self.cfg.enabled {
            return Err(BarscaleError::Disabled);
        }
        let key = req.key();
        if let Some(entry) = self.cache.get(&key).await {
            tracing::debug!(symbol = req.symbol(), interval = %req.target(), "cache hit");
            return Ok(ResampleOutcome::Complete(Arc::new(entry.bars.clone())));
        }

        let threshold = i64::try_from(self.cfg.chunk_threshold).unwrap_or(i64::MAX);
        if req.estimated_source_bars() <= threshold {
            let bars = Arc::new(self.run_pipeline(&req, None).await?);
            self.store(&key, &bars).await;
            return Ok(ResampleOutcome::Complete(bars));
        }

        match self.tasks.admit(key) {
            Admission::Existing(id) => {
                tracing::debug!(task = %id, symbol = req.symbol(), "joined in-flight task");
                Ok(ResampleOutcome::Queued(id))
            }
            Admission::New(id, record) => {
                let engine = Arc::clone(self);
                let task_id = id.clone();
                tokio::spawn(async move {
                    engine.run_task(task_id, record, req).await;
                });
                Ok(ResampleOutcome::Queued(id))
            }
        }
    }

    /// Snapshot a background task.
    ///
    /// # Errors
    /// `UnknownTask` for ids never issued or already reaped after the
    /// retention window.
    pub fn task_status(&self, id: &TaskId) -> Result<TaskStatus, BarscaleError> {
        self.tasks.status(id)
    }

    /// Request cooperative cancellation of a background task.
    ///
    /// The runner stops at the next chunk boundary; in-flight chunk work is
    /// not interrupted. Cancelling an already-terminal task is a no-op.
    ///
    /// # Errors
    /// `UnknownTask` when the id does not resolve.
    pub fn cancel_task(&self, id: &TaskId) -> Result<(), BarscaleError> {
        self.tasks.request_cancel(id)
    }

    /// Drop every cached series for a symbol/exchange pair, typically after
    /// new 1-minute data lands. Returns the number of entries removed.
    pub async fn invalidate(&self, symbol: &str, exchange: &Exchange) -> usize {
        self.cache.invalidate(symbol, exchange).await
    }

    /// Derive all standard target intervals from a single source fetch.
    ///
    /// Each derived series is cached under its own request key. Runs
    /// synchronously regardless of range size; callers batching very large
    /// ranges should prefer per-target [`resample`](ResampleEngine::resample)
    /// calls.
    ///
    /// # Errors
    /// `Disabled`, `NoBaseData`, plus validation and adapter failures.
    pub async fn resample_to_standard_targets(
        &self,
        symbol: &str,
        exchange: &Exchange,
        range: TimeRange,
    ) -> Result<Vec<(Interval, Vec<Bar>)>, BarscaleError> {
        if !self.cfg.enabled {
            return Err(BarscaleError::Disabled);
        }
        let data = self
            .source
            .fetch_minute_bars(symbol, exchange, range)
            .await?;
        let bars = data.into_bars();
        let report = precheck(&bars, range, self.cfg.strictness)?;
        if report.accepted.is_empty() {
            return Err(BarscaleError::no_base_data(symbol, exchange.code()));
        }

        let mut out = Vec::with_capacity(Interval::standard_targets().len());
        for &target in Interval::standard_targets() {
            let series = resample_bars(&report.accepted, target, exchange)?;
            postcheck(&report.accepted, &series)?;
            let key = ResampleRequest::new(symbol, exchange.clone(), target, range)?.key();
            self.store(&key, &Arc::new(series.clone())).await;
            out.push((target, series));
        }
        Ok(out)
    }

    /// Compute an indicator series for a request.
    ///
    /// `mode` overrides the configured default: `OnResampled` computes over
    /// the aggregated bars (sharing the resample cache), `OnSource` computes
    /// over raw minute bars and buckets the resulting point series to the
    /// target cadence. The two give different values for any indicator with
    /// memory; which one is correct depends on the caller's semantics.
    ///
    /// # Errors
    /// `Disabled`, `NoBaseData`, plus validation and adapter failures.
    pub async fn resample_indicator(
        &self,
        req: &ResampleRequest,
        indicator: &dyn Indicator,
        mode: Option<IndicatorMode>,
    ) -> Result<Vec<IndicatorPoint>, BarscaleError> {
        if !self.cfg.enabled {
            return Err(BarscaleError::Disabled);
        }
        let mode = mode.unwrap_or(self.cfg.indicator_mode);
        tracing::debug!(
            symbol = req.symbol(),
            indicator = %indicator.name(),
            ?mode,
            "computing indicator"
        );
        match mode {
            IndicatorMode::OnResampled => {
                let key = req.key();
                let bars = match self.cache.get(&key).await {
                    Some(entry) => Arc::new(entry.bars.clone()),
                    None => {
                        let bars = Arc::new(self.run_pipeline(req, None).await?);
                        self.store(&key, &bars).await;
                        bars
                    }
                };
                Ok(indicator.compute(&bars))
            }
            IndicatorMode::OnSource => {
                let data = self
                    .source
                    .fetch_minute_bars(req.symbol(), req.exchange(), req.range())
                    .await?;
                let report = precheck(&data.into_bars(), req.range(), self.cfg.strictness)?;
                if report.accepted.is_empty() {
                    return Err(BarscaleError::no_base_data(
                        req.symbol(),
                        req.exchange().code(),
                    ));
                }
                let points = indicator.compute(&report.accepted);
                Ok(resample_points(&points, req.target(), req.exchange()))
            }
        }
    }

    async fn run_task(self: Arc<Self>, id: TaskId, record: Arc<TaskRecord>, req: ResampleRequest) {
        record.set_running();
        tracing::info!(
            task = %id,
            symbol = req.symbol(),
            interval = %req.target(),
            minutes = req.range().minutes(),
            "background resample started"
        );
        match self.run_pipeline(&req, Some(&record)).await {
            Ok(bars) => {
                let bars = Arc::new(bars);
                self.store(record.key(), &bars).await;
                tracing::info!(task = %id, bars = bars.len(), "background resample finished");
                record.finish_success(bars);
            }
            Err(BarscaleError::Cancelled) => {
                tracing::info!(task = %id, "background resample cancelled");
                record.finish_cancelled();
            }
            Err(err) => {
                tracing::warn!(task = %id, error = %err, "background resample failed");
                record.finish_failed(err);
            }
        }
    }

    /// Shared fetch-validate-aggregate-verify pipeline, chunk by chunk.
    ///
    /// Chunk boundaries land on target bucket starts, so concatenating the
    /// per-chunk outputs is identical to aggregating the whole range at
    /// once. `record` carries progress and the cancellation flag for
    /// background runs; the synchronous path passes `None`.
    async fn run_pipeline(
        &self,
        req: &ResampleRequest,
        record: Option<&TaskRecord>,
    ) -> Result<Vec<Bar>, BarscaleError> {
        let chunks = plan_chunks(
            req.range(),
            req.target(),
            req.exchange(),
            self.cfg.chunk_threshold,
        );
        let total = chunks.len();
        let mut out: Vec<Bar> = Vec::new();
        let mut source_bars = 0usize;

        for (done, chunk) in chunks.into_iter().enumerate() {
            if record.is_some_and(TaskRecord::cancel_requested) {
                return Err(BarscaleError::Cancelled);
            }
            let data = self
                .source
                .fetch_minute_bars(req.symbol(), req.exchange(), chunk)
                .await?;
            // An empty chunk is a gap, not a failure; only a completely
            // empty run is NoBaseData.
            let bars = data.into_bars();
            let report = precheck(&bars, chunk, self.cfg.strictness)?;
            source_bars += report.accepted.len();
            let part = resample_bars(&report.accepted, req.target(), req.exchange())?;
            postcheck(&report.accepted, &part)?;
            out.extend(part);
            if let Some(rec) = record {
                rec.set_progress(progress_after(done + 1, total));
            }
        }

        if source_bars == 0 {
            return Err(BarscaleError::no_base_data(
                req.symbol(),
                req.exchange().code(),
            ));
        }
        Ok(out)
    }

    async fn store(&self, key: &ResampleKey, bars: &Arc<Vec<Bar>>) {
        if let Err(err) = self.cache.put(key.clone(), bars.as_ref().clone()).await {
            // Oversize results degrade to uncached; the caller still gets
            // the series.
            tracing::warn!(error = %err, "resample result not cached");
        }
    }
}
