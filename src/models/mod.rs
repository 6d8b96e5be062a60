// ============================================================================
// Module : models
// ============================================================================
// Structures de données échangées avec le service de signaux
// ============================================================================

pub mod signal; // Signal, Direction
pub mod stats;  // StatsSummary, StatsWindow, WinRate
pub mod vote;   // VoteType, VoteReceipt, SignalStatus

// Re-export des structures principales pour simplifier les imports
pub use signal::{Direction, Signal};
pub use stats::{StatsSummary, StatsWindow, WinRate};
pub use vote::{ErrorBody, SignalStatus, VoteReceipt, VoteType};
