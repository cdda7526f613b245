pub mod classify;
pub mod merge;
pub mod summary;
pub mod types;

pub use classify::classify_pull_requests;
pub use summary::build_summary;
pub use types::{MergedUserSummary, UserContributorStats, UserPrStats};
