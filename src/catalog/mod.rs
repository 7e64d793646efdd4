//! Name normalization, matching, and merging of per-source listings.

pub mod matcher;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod table;

pub use matcher::{resolve, token_set_ratio, CandidatePool, MatchCandidate};
pub use merge::{merge, CatalogMerger, MergeStats};
pub use models::{CatalogEntry, ListingRecord, Offer, Source};
pub use normalize::{is_free_label, is_free_or_absent, normalize};
