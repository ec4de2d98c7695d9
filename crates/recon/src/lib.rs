//! `shelfwise-recon` - product matching and price reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded rows and records, returns scores,
//! classified decisions and mutation requests. Persistence sits behind the
//! [`store::PriceStore`] trait; file handling lives in the CLI.

pub mod classify;
pub mod config;
pub mod decision;
pub mod error;
pub mod etl;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod price_sync;
pub mod scorer;
pub mod similarity;
pub mod size;
pub mod store;
pub mod table;

pub use config::ReconConfig;
pub use error::ReconError;
pub use etl::{classify_rows, EtlOutcome, FeedKind};
pub use matcher::{check_single, match_catalog, rank_candidates};
pub use model::{CandidateProduct, InternalProduct, MatchDecision, MatchScore, MatchStatus};
pub use price_sync::{apply_transitions, sync_prices, PriceTransition, SyncReport};
pub use store::{MemoryStore, PriceStore};
