//! Collect command implementation.

use crate::catalog::models::Source;
use crate::collect::{Cancellation, CollectionScheduler, CsvSink, ListingSource, RunReport};
use crate::config::Config;
use crate::filters::{FilterChain, FilterChainBuilder};
use crate::sources::{HttpFetcher, MetacriticBrowse, SteamStore};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Runs one collection into a source table.
pub struct CollectCommand {
    config: Config,
    source: Source,
    output: PathBuf,
    term: Option<String>,
}

impl CollectCommand {
    pub fn new(config: Config, source: Source) -> Self {
        Self { config, source, output: default_output(source), term: None }
    }

    /// Overrides the output path.
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        if let Some(path) = output {
            self.output = path;
        }
        self
    }

    /// Restricts storefront searches to a query term.
    pub fn with_term(mut self, term: Option<String>) -> Self {
        self.term = term;
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Builds the HTTP adapter for the configured source and runs it.
    pub async fn execute(&self, cancel: &Cancellation) -> Result<RunReport> {
        let http = HttpFetcher::new(&self.config).context("Failed to create HTTP client")?;

        match self.source {
            Source::Steam => {
                let store = SteamStore::new(http, &self.config).with_term(self.term.clone());
                self.execute_with_source(&store, cancel).await
            }
            Source::Metacritic => {
                let browse = MetacriticBrowse::new(http, &self.config);
                self.execute_with_source(&browse, cancel).await
            }
            Source::Epic => bail!(
                "Epic Games Store listings cannot be collected over plain HTTP; \
                 pass an exported table to `merge --epic` instead"
            ),
        }
    }

    /// Runs the collection against a provided source (for testing).
    pub async fn execute_with_source(
        &self,
        source: &dyn ListingSource,
        cancel: &Cancellation,
    ) -> Result<RunReport> {
        let mut sink = CsvSink::create(&self.output, source.source())
            .with_context(|| format!("Failed to create {}", self.output.display()))?;

        let scheduler = CollectionScheduler::new(
            source,
            self.filters(source.source()),
            self.config.schedule_options(),
        );
        let report = scheduler.run(&mut sink, cancel).await;

        info!("Wrote {} rows to {}", sink.rows(), sink.path().display());
        Ok(report)
    }

    /// Storefronts drop free listings and excluded keywords; critic listings pass through.
    fn filters(&self, source: Source) -> FilterChain {
        if !source.is_storefront() {
            return FilterChain::new();
        }
        FilterChainBuilder::new()
            .priced_only(true)
            .exclude_keywords(&self.config.exclude_keywords)
            .build()
    }
}

/// `steam_games.csv`, `metacritic_games.csv`, ...
pub fn default_output(source: Source) -> PathBuf {
    PathBuf::from(format!("{}_games.csv", source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::table::read_source_table;
    use crate::collect::{Page, RawItem, Termination};
    use crate::error::{FetchError, ValidationError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Mock storefront serving canned pages.
    struct MockStore {
        source: Source,
        pages: Vec<Vec<RawItem>>,
        fetch_count: Arc<AtomicU32>,
    }

    impl MockStore {
        fn new(source: Source, pages: Vec<Vec<RawItem>>) -> Self {
            Self { source, pages, fetch_count: Arc::new(AtomicU32::new(0)) }
        }

        fn call_count(&self) -> u32 {
            self.fetch_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ListingSource for MockStore {
        fn source(&self) -> Source {
            self.source
        }

        async fn fetch_page(&self, index: u32) -> Result<Page, FetchError> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            let items = self.pages.get(index as usize).cloned().unwrap_or_default();
            Ok(Page::new(items.into_iter().map(Ok).collect()))
        }

        async fn validate_item(&self, item: &RawItem) -> Result<bool, ValidationError> {
            Ok(item.title.ends_with("Soundtrack"))
        }
    }

    fn make_test_config() -> Config {
        Config { delay_ms: 0, delay_jitter_ms: 0, retry_backoff_ms: 0, ..Config::default() }
    }

    fn game(title: &str, price: &str) -> RawItem {
        RawItem::priced(title, Some(price), Some("https://store/app"))
    }

    #[tokio::test]
    async fn test_collect_writes_storefront_table() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("steam.csv");

        let store = MockStore::new(
            Source::Steam,
            vec![
                vec![
                    game("Hades", "₺199,99"),
                    game("Dota 2", "Ücretsiz"),
                    game("Hades Soundtrack", "₺20"),
                ],
                vec![
                    game("Celeste", "₺40"),
                    game("Art Pack", "₺5"),
                    game("hades", "₺199,99"),
                ],
            ],
        );

        let cmd = CollectCommand::new(make_test_config(), Source::Steam)
            .with_output(Some(output.clone()));
        let report = cmd.execute_with_source(&store, &Cancellation::new()).await.unwrap();

        assert!(report.is_success());
        assert!(matches!(report.termination, Termination::Exhausted));
        assert_eq!(report.items_collected, 2);
        assert_eq!(report.filtered_out, 2);
        assert_eq!(report.excluded, 1);
        assert_eq!(report.duplicates_skipped, 1);
        assert_eq!(store.call_count(), 3);

        let records = read_source_table(&output, Source::Steam).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.display_name()).collect();
        assert_eq!(names, vec!["Hades", "Celeste"]);
    }

    #[tokio::test]
    async fn test_collect_respects_target() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("steam.csv");

        let page: Vec<RawItem> = (0..10).map(|i| game(&format!("Game {}", i), "₺10")).collect();
        let store = MockStore::new(Source::Steam, vec![page.clone(), page]);

        let config = Config { target_items: 4, ..make_test_config() };
        let cmd = CollectCommand::new(config, Source::Steam).with_output(Some(output.clone()));
        let report = cmd.execute_with_source(&store, &Cancellation::new()).await.unwrap();

        assert!(matches!(report.termination, Termination::TargetReached));
        assert_eq!(read_source_table(&output, Source::Steam).unwrap().len(), 4);
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn test_collect_critic_source_unfiltered() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("metacritic.csv");

        let hades = RawItem { title: "Hades".to_string(), score: Some(93), ..Default::default() };
        let pack = RawItem { title: "Expansion Pack".to_string(), ..Default::default() };
        let store = MockStore::new(Source::Metacritic, vec![vec![hades, pack]]);

        let cmd = CollectCommand::new(make_test_config(), Source::Metacritic)
            .with_output(Some(output.clone()));
        let report = cmd.execute_with_source(&store, &Cancellation::new()).await.unwrap();
        assert_eq!(report.items_collected, 2);

        let records = read_source_table(&output, Source::Metacritic).unwrap();
        assert_eq!(records[0].score(), Some(93));
        assert_eq!(records[1].score(), None);
    }

    #[tokio::test]
    async fn test_collect_bad_output_path() {
        let store = MockStore::new(Source::Steam, Vec::new());
        let cmd = CollectCommand::new(make_test_config(), Source::Steam)
            .with_output(Some(PathBuf::from("/nonexistent/dir/steam.csv")));

        let err = cmd.execute_with_source(&store, &Cancellation::new()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to create"));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_collect_epic_unsupported() {
        let cmd = CollectCommand::new(make_test_config(), Source::Epic);
        let err = cmd.execute(&Cancellation::new()).await.unwrap_err();
        assert!(err.to_string().contains("merge --epic"));
    }

    #[test]
    fn test_default_output() {
        assert_eq!(default_output(Source::Steam), PathBuf::from("steam_games.csv"));
        let cmd = CollectCommand::new(Config::default(), Source::Metacritic);
        assert_eq!(cmd.output(), Path::new("metacritic_games.csv"));
    }
}
