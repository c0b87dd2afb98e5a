//! 谱面上传校验、成绩计算、排行榜与评分聚合。

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use utils::error::{AppError, AppResult, ParseError};
