//! Page-by-page collection state machine.
//!
//! One control loop drives `Idle -> FetchingPage -> ValidatingItems ->
//! Buffering -> Flushing -> (FetchingPage | Done)`. Validation of a page's
//! candidates runs concurrently and is joined before buffering; run-scoped
//! state lives in a [`RunContext`] owned by the loop.

use crate::catalog::models::{ListingRecord, Source};
use crate::catalog::normalize::{normalize, strip_edition};
use crate::collect::sink::ListingSink;
use crate::collect::{Cancellation, ListingSource, Page, RawItem, ValidationPolicy};
use crate::error::{CollectError, ExtractionError, ValidationError};
use crate::filters::FilterChain;
use futures::future::join_all;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Tuning for one collection run.
#[derive(Debug, Clone)]
pub struct ScheduleOptions {
    /// Stop once this many items are accepted. `None` collects until exhaustion.
    pub target: Option<usize>,
    /// Stop after this many pages.
    pub max_pages: Option<u32>,
    /// Extra attempts for transport errors and timeouts on a page fetch.
    pub fetch_retries: u32,
    /// Backoff before the first retry; doubled per attempt.
    pub retry_backoff: Duration,
    /// Per-item validation deadline.
    pub validation_timeout: Option<Duration>,
    pub on_validation_error: ValidationPolicy,
    pub on_validation_timeout: ValidationPolicy,
    /// Remove "<word> Edition" fragments from titles before dedup.
    pub strip_edition: bool,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            target: None,
            max_pages: None,
            fetch_retries: 2,
            retry_backoff: Duration::from_millis(500),
            validation_timeout: Some(Duration::from_secs(15)),
            on_validation_error: ValidationPolicy::Accept,
            on_validation_timeout: ValidationPolicy::Reject,
            strip_edition: false,
        }
    }
}

/// Why a run stopped.
#[derive(Debug)]
pub enum Termination {
    /// A page came back empty or the source reported no further pages.
    Exhausted,
    TargetReached,
    PageLimit,
    Cancelled,
    Failed(CollectError),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exhausted => write!(f, "source exhausted"),
            Termination::TargetReached => write!(f, "target reached"),
            Termination::PageLimit => write!(f, "page limit reached"),
            Termination::Cancelled => write!(f, "cancelled"),
            Termination::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub source: Source,
    pub items_collected: usize,
    pub pages_processed: u32,
    pub termination: Termination,
    pub duplicates_skipped: usize,
    pub filtered_out: usize,
    pub excluded: usize,
    pub extraction_errors: usize,
    pub validation_errors: usize,
    pub fetch_retries: u32,
}

impl RunReport {
    fn new(source: Source, ctx: RunContext, termination: Termination) -> Self {
        Self {
            source,
            items_collected: ctx.collected,
            pages_processed: ctx.pages,
            termination,
            duplicates_skipped: ctx.duplicates,
            filtered_out: ctx.filtered,
            excluded: ctx.excluded,
            extraction_errors: ctx.extraction_errors,
            validation_errors: ctx.validation_errors,
            fetch_retries: ctx.retries,
        }
    }

    /// False when the run ended with a fatal error.
    pub fn is_success(&self) -> bool {
        !matches!(self.termination, Termination::Failed(_))
    }
}

/// Run-scoped state, touched only by the control loop.
#[derive(Debug, Default)]
struct RunContext {
    seen: HashSet<String>,
    collected: usize,
    pages: u32,
    duplicates: usize,
    filtered: usize,
    excluded: usize,
    extraction_errors: usize,
    validation_errors: usize,
    retries: u32,
}

/// Items of the current page still being worked through.
struct PageWork {
    index: u32,
    pending: VecDeque<Result<RawItem, ExtractionError>>,
    buffer: Vec<ListingRecord>,
    exhausted: bool,
}

enum Phase {
    Idle,
    FetchingPage { index: u32 },
    ValidatingItems(PageWork),
    Buffering { work: PageWork, wave: Vec<(RawItem, Result<bool, ValidationError>)> },
    Flushing { index: u32, buffer: Vec<ListingRecord>, then: Option<Termination> },
    Done(Termination),
}

/// Drives one paginated source until exhaustion, target, or failure.
pub struct CollectionScheduler<'a> {
    source: &'a dyn ListingSource,
    filters: FilterChain,
    options: ScheduleOptions,
}

impl<'a> CollectionScheduler<'a> {
    pub fn new(
        source: &'a dyn ListingSource,
        filters: FilterChain,
        options: ScheduleOptions,
    ) -> Self {
        Self { source, filters, options }
    }

    /// Runs to completion. Pages already flushed stay in `sink` whatever the outcome.
    pub async fn run(&self, sink: &mut dyn ListingSink, cancel: &Cancellation) -> RunReport {
        let source = self.source.source();
        info!("Collecting {} (target: {:?})", source, self.options.target);
        if !self.filters.is_empty() {
            debug!("Active filters: {}", self.filters.descriptions().join(", "));
        }

        let mut ctx = RunContext::default();
        let mut phase = Phase::Idle;

        loop {
            phase = match phase {
                Phase::Idle => {
                    if self.target_reached(&ctx) {
                        Phase::Done(Termination::TargetReached)
                    } else {
                        Phase::FetchingPage { index: 0 }
                    }
                }
                Phase::FetchingPage { index } => self.fetch(&mut ctx, index, cancel).await,
                Phase::ValidatingItems(work) => self.validate(&mut ctx, work).await,
                Phase::Buffering { work, wave } => self.buffer(&mut ctx, work, wave),
                Phase::Flushing { index, buffer, then } => {
                    self.flush(&mut ctx, sink, index, buffer, then)
                }
                Phase::Done(termination) => {
                    info!(
                        "Collected {} {} items from {} pages: {}",
                        ctx.collected, source, ctx.pages, termination
                    );
                    return RunReport::new(source, ctx, termination);
                }
            };
        }
    }

    fn target_reached(&self, ctx: &RunContext) -> bool {
        self.options.target.is_some_and(|t| ctx.collected >= t)
    }

    fn remaining(&self, ctx: &RunContext) -> usize {
        self.options.target.map_or(usize::MAX, |t| t.saturating_sub(ctx.collected))
    }

    async fn fetch(&self, ctx: &mut RunContext, index: u32, cancel: &Cancellation) -> Phase {
        if cancel.is_cancelled() {
            info!("Cancelled before page {}", index);
            return Phase::Done(Termination::Cancelled);
        }
        if self.options.max_pages.is_some_and(|max| index >= max) {
            return Phase::Done(Termination::PageLimit);
        }

        debug!("Fetching page {}", index);
        let mut attempt = 0;
        let page: Page = loop {
            match self.source.fetch_page(index).await {
                Ok(page) => break page,
                Err(e) if e.is_retryable() && attempt < self.options.fetch_retries => {
                    let backoff = self.options.retry_backoff * 2u32.saturating_pow(attempt);
                    warn!("Page {} fetch failed ({}), retrying in {:?}", index, e, backoff);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                    ctx.retries += 1;
                }
                Err(e) => {
                    return Phase::Done(Termination::Failed(CollectError::Fetch {
                        page: index,
                        source: e,
                    }));
                }
            }
        };

        if page.is_empty() {
            debug!("No items on page {}, stopping", index);
            return Phase::Done(Termination::Exhausted);
        }

        debug!("Page {} returned {} raw items", index, page.items.len());
        Phase::ValidatingItems(PageWork {
            index,
            pending: page.items.into(),
            buffer: Vec::new(),
            exhausted: page.exhausted,
        })
    }

    /// Selects the next wave of candidates, at most the remaining target, and
    /// validates them concurrently.
    async fn validate(&self, ctx: &mut RunContext, mut work: PageWork) -> Phase {
        let quota = self.remaining(ctx);
        let mut wave: Vec<RawItem> = Vec::new();
        let mut wave_keys: HashSet<String> = HashSet::new();

        while wave.len() < quota {
            let Some(next) = work.pending.pop_front() else {
                break;
            };

            let mut item = match next {
                Ok(item) => item,
                Err(e) => {
                    warn!("Skipping item on page {}: {}", work.index, e);
                    ctx.extraction_errors += 1;
                    continue;
                }
            };

            if self.options.strip_edition {
                item.title = strip_edition(&item.title);
            }

            let key = normalize(&item.title);
            if key.is_empty() {
                let e = ExtractionError::missing("title");
                warn!("Skipping item on page {}: {}", work.index, e);
                ctx.extraction_errors += 1;
                continue;
            }

            if !self.filters.matches(&item) {
                trace!("Filtered out: {}", item.title);
                ctx.filtered += 1;
                continue;
            }

            if ctx.seen.contains(&key) {
                trace!("Duplicate: {}", item.title);
                ctx.duplicates += 1;
                continue;
            }
            if !wave_keys.insert(key) {
                // Same key as a wave member: close the wave and decide this one
                // once that member's verdict is known.
                work.pending.push_front(Ok(item));
                break;
            }

            wave.push(item);
        }

        debug!("Validating {} items from page {}", wave.len(), work.index);
        let verdicts = join_all(wave.iter().map(|item| self.check(item))).await;

        Phase::Buffering { work, wave: wave.into_iter().zip(verdicts).collect() }
    }

    async fn check(&self, item: &RawItem) -> Result<bool, ValidationError> {
        match self.options.validation_timeout {
            Some(limit) => tokio::time::timeout(limit, self.source.validate_item(item))
                .await
                .unwrap_or(Err(ValidationError::Timeout(limit))),
            None => self.source.validate_item(item).await,
        }
    }

    fn buffer(
        &self,
        ctx: &mut RunContext,
        mut work: PageWork,
        wave: Vec<(RawItem, Result<bool, ValidationError>)>,
    ) -> Phase {
        for (item, verdict) in wave {
            let excluded = match verdict {
                Ok(excluded) => excluded,
                Err(e) => {
                    ctx.validation_errors += 1;
                    let policy = match e {
                        ValidationError::Timeout(_) => self.options.on_validation_timeout,
                        ValidationError::Failed(_) => self.options.on_validation_error,
                    };
                    warn!("Validating '{}': {} ({})", item.title, e, policy);
                    policy.excludes()
                }
            };

            if excluded {
                debug!("Excluded by validation: {}", item.title);
                ctx.excluded += 1;
                continue;
            }

            ctx.seen.insert(normalize(&item.title));
            ctx.collected += 1;
            work.buffer.push(item.into_record(self.source.source()));
        }

        if self.target_reached(ctx) {
            if !work.pending.is_empty() {
                debug!("Target reached, discarding {} unprocessed items", work.pending.len());
            }
            return Phase::Flushing {
                index: work.index,
                buffer: work.buffer,
                then: Some(Termination::TargetReached),
            };
        }

        if !work.pending.is_empty() {
            return Phase::ValidatingItems(work);
        }

        let then = work.exhausted.then_some(Termination::Exhausted);
        Phase::Flushing { index: work.index, buffer: work.buffer, then }
    }

    fn flush(
        &self,
        ctx: &mut RunContext,
        sink: &mut dyn ListingSink,
        index: u32,
        buffer: Vec<ListingRecord>,
        then: Option<Termination>,
    ) -> Phase {
        if let Err(e) = sink.append(&buffer) {
            return Phase::Done(Termination::Failed(e.into()));
        }
        ctx.pages += 1;
        info!("Page {}: kept {} items ({} total)", index, buffer.len(), ctx.collected);

        match then {
            Some(termination) => Phase::Done(termination),
            None => Phase::FetchingPage { index: index + 1 },
        }
    }
}
