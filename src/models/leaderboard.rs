use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::Hash;
use uuid::Uuid;

/// 可以进入排行榜的条目
pub trait Ranked: Clone {
    /// 排行榜键：谱面 ID 或活动分组 ID
    type Key: Eq + Hash + Clone + Send + Sync;
    /// 同一排行榜内每个持有者只保留一条
    type Owner: Eq + Hash + Clone;

    fn id(&self) -> Uuid;
    fn key(&self) -> Self::Key;
    fn owner(&self) -> Self::Owner;
    /// 排序主键，越大越靠前
    fn value(&self) -> f64;
    fn date_created(&self) -> DateTime<Utc>;
}

/// 排行榜全序：数值降序，创建时间升序，最后按 ID 升序
pub fn compare_entries<T: Ranked>(a: &T, b: &T) -> Ordering {
    compare_performance(a, b).then_with(|| a.id().cmp(&b.id()))
}

/// 只比较成绩本身（数值与时间），用于判断新成绩是否更好
pub fn compare_performance<T: Ranked>(a: &T, b: &T) -> Ordering {
    b.value()
        .total_cmp(&a.value())
        .then_with(|| a.date_created().cmp(&b.date_created()))
}

/// 活动分组中的队伍条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub id: Uuid,
    pub division_id: Uuid,
    pub name: String,
    pub score: f64,
    pub date_created: DateTime<Utc>,
}

impl Ranked for TeamEntry {
    type Key = Uuid;
    type Owner = Uuid;

    fn id(&self) -> Uuid {
        self.id
    }

    fn key(&self) -> Uuid {
        self.division_id
    }

    fn owner(&self) -> Uuid {
        self.id
    }

    fn value(&self) -> f64 {
        self.score
    }

    fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }
}
