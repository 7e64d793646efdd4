//! game-catalog - collects game listings from storefronts and critic sites and
//! reconciles them into one catalog.
//!
//! Collection runs page by page through a [`collect::CollectionScheduler`];
//! merging matches each primary listing against the other sources by exact
//! normalized name, then by token-set similarity.

pub mod catalog;
pub mod collect;
pub mod commands;
pub mod config;
pub mod error;
pub mod filters;
pub mod format;
pub mod sources;

pub use catalog::{CatalogEntry, CatalogMerger, ListingRecord, Source};
pub use collect::{CollectionScheduler, ListingSource, RunReport, Termination};
pub use config::Config;
