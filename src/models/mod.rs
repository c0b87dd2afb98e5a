pub mod chart;
pub mod leaderboard;
pub mod pec;
pub mod record;
pub mod rpe;
pub mod submission;
pub mod vote;

pub use chart::*;
pub use leaderboard::*;
pub use record::*;
pub use submission::*;
pub use vote::*;
