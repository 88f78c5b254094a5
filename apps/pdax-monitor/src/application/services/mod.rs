//! Application Services
//!
//! - `FeedSupervisor`: runs feed sessions and restarts them after failures
//! - `RecoveryPolicy`: classifies failures and picks the restart delay

mod recovery;
mod supervisor;

pub use recovery::{
    MAINTENANCE_END_MINUTE, MAINTENANCE_START_MINUTE, RecoveryConfig, RecoveryDecision,
    RecoveryPolicy, RecoveryReason, is_maintenance_window,
};
pub use supervisor::{FeedSupervisor, SupervisorStats};
