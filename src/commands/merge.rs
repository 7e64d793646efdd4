//! Merge command implementation.

use crate::catalog::models::{CatalogEntry, Source};
use crate::catalog::table::{read_source_table, write_catalog};
use crate::catalog::CatalogMerger;
use crate::config::Config;
use crate::format::Formatter;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// Paths of the three source tables.
#[derive(Debug, Clone)]
pub struct MergeInputs {
    pub steam: PathBuf,
    pub metacritic: PathBuf,
    pub epic: PathBuf,
}

/// Reconciles three source tables into the merged catalog.
pub struct MergeCommand {
    config: Config,
    inputs: MergeInputs,
    output: Option<PathBuf>,
    priced_only: bool,
}

impl MergeCommand {
    pub fn new(config: Config, inputs: MergeInputs) -> Self {
        Self { config, inputs, output: None, priced_only: false }
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    /// Drops entries without any storefront price.
    pub fn priced_only(mut self, enabled: bool) -> Self {
        self.priced_only = enabled;
        self
    }

    /// Merges, writes the output table if configured, and returns formatted entries.
    pub fn execute(&self) -> Result<String> {
        let entries = self.merge()?;

        if let Some(path) = &self.output {
            write_catalog(path, &entries)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} entries to {}", entries.len(), path.display());
        }

        Ok(Formatter::new(self.config.format).format_entries(&entries))
    }

    /// Reads the inputs and returns merged entries without writing anything.
    pub fn merge(&self) -> Result<Vec<CatalogEntry>> {
        let steam = read_source_table(&self.inputs.steam, Source::Steam)
            .context("Failed to read Steam table")?;
        let metacritic = read_source_table(&self.inputs.metacritic, Source::Metacritic)
            .context("Failed to read Metacritic table")?;
        let epic = read_source_table(&self.inputs.epic, Source::Epic)
            .context("Failed to read Epic table")?;

        let merger = CatalogMerger::new(self.config.threshold);
        let (mut entries, [critic_stats, store_stats]) =
            merger.merge_with_stats(&steam, &metacritic, &epic);

        info!(
            "Metacritic: {} exact, {} fuzzy, {} unmatched; Epic: {} exact, {} fuzzy, {} unmatched",
            critic_stats.exact,
            critic_stats.fuzzy,
            critic_stats.unmatched,
            store_stats.exact,
            store_stats.fuzzy,
            store_stats.unmatched
        );

        if self.priced_only {
            let before = entries.len();
            entries.retain(CatalogEntry::has_any_price);
            debug!("Dropped {} unpriced entries", before - entries.len());
        }

        Ok(entries)
    }
}
