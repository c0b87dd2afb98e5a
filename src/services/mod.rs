pub mod chart;
pub mod leaderboard;
pub mod rating;
pub mod review;

// 重新导出主要的服务结构体，以便可以直接从 services 模块导入
pub use chart::{ChartService, FileStorage, LocalFileStorage};
pub use leaderboard::{ChartLeaderboards, DivisionLeaderboards, Leaderboard, LeaderboardRegistry};
pub use rating::{RatingService, VoteRepository};
