//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod award_repo;
pub mod cash_fare_repo;
pub mod reference_repo;
pub mod search_log_repo;
pub mod search_usage_repo;

pub use award_repo::AwardRepo;
pub use cash_fare_repo::CashFareRepo;
pub use reference_repo::ReferenceRepo;
pub use search_log_repo::SearchLogRepo;
pub use search_usage_repo::SearchUsageRepo;
