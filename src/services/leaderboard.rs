use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::config::CONFIG;
use crate::models::leaderboard::{compare_entries, compare_performance, Ranked, TeamEntry};
use crate::models::record::Record;

/// 单个谱面（或活动分组）的排行榜，每个持有者最多一条
pub struct Leaderboard<T: Ranked> {
    // 按 compare_entries 排好序
    entries: Vec<T>,
    by_owner: HashMap<T::Owner, T>,
}

impl<T: Ranked> Default for Leaderboard<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_owner: HashMap::new(),
        }
    }
}

impl<T: Ranked> Leaderboard<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 批量构建：每个持有者只保留最好的一条
    pub fn from_entries(entries: Vec<T>) -> Self {
        let mut best: HashMap<T::Owner, T> = HashMap::with_capacity(entries.len());
        for entry in entries {
            let owner = entry.owner();
            let replace = best
                .get(&owner)
                .map_or(true, |current| compare_entries(current, &entry) == Ordering::Greater);
            if replace {
                best.insert(owner, entry);
            }
        }

        let mut sorted: Vec<T> = best.values().cloned().collect();
        sorted.sort_by(compare_entries);
        Self {
            entries: sorted,
            by_owner: best,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, entry: &T) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|probe| compare_entries(probe, entry))
    }

    /// 加入新成绩。持有者已有不差于它的成绩时不做任何修改并返回 `false`
    pub fn add(&mut self, entry: T) -> bool {
        let owner = entry.owner();
        if let Some(existing) = self.by_owner.get(&owner) {
            if compare_performance(existing, &entry) != Ordering::Greater {
                return false;
            }
            let existing = existing.clone();
            if let Ok(index) = self.position(&existing) {
                self.entries.remove(index);
            }
        }

        let index = match self.position(&entry) {
            Ok(index) | Err(index) => index,
        };
        self.entries.insert(index, entry.clone());
        self.by_owner.insert(owner, entry);
        true
    }

    /// 按 ID 移除。条目不存在时什么也不做，同样返回 `true`
    pub fn remove(&mut self, entry: &T) -> bool {
        let owner = entry.owner();
        let Some(stored) = self.by_owner.get(&owner) else {
            return true;
        };
        if stored.id() != entry.id() {
            return true;
        }
        if let Ok(index) = self.position(stored) {
            self.entries.remove(index);
        }
        self.by_owner.remove(&owner);
        true
    }

    /// 从 1 开始的名次，条目不在榜上时为 `None`
    pub fn rank(&self, entry: &T) -> Option<usize> {
        let stored = self.by_owner.get(&entry.owner())?;
        if stored.id() != entry.id() {
            return None;
        }
        self.position(stored).ok().map(|index| index + 1)
    }

    pub fn get(&self, owner: &T::Owner) -> Option<&T> {
        self.by_owner.get(owner)
    }

    pub fn range(&self, skip: usize, take: usize) -> &[T] {
        let start = skip.min(self.entries.len());
        let end = start.saturating_add(take).min(self.entries.len());
        &self.entries[start..end]
    }
}

pub type LeaderboardHandle<T> = Arc<Mutex<Leaderboard<T>>>;

fn lock<T: Ranked>(handle: &LeaderboardHandle<T>) -> MutexGuard<'_, Leaderboard<T>> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 所有排行榜的注册表。每个键持有独立的锁，不同谱面之间互不阻塞
pub struct LeaderboardRegistry<T: Ranked> {
    boards: RwLock<HashMap<T::Key, LeaderboardHandle<T>>>,
}

pub type ChartLeaderboards = LeaderboardRegistry<Record>;
pub type DivisionLeaderboards = LeaderboardRegistry<TeamEntry>;

impl<T: Ranked> Default for LeaderboardRegistry<T> {
    fn default() -> Self {
        Self {
            boards: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Ranked> LeaderboardRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &T::Key) -> Option<LeaderboardHandle<T>> {
        self.boards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// 获取（必要时创建）某个键的排行榜
    pub fn handle(&self, key: &T::Key) -> LeaderboardHandle<T> {
        if let Some(handle) = self.get(key) {
            return handle;
        }
        self.boards
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_default()
            .clone()
    }

    pub fn add(&self, entry: T) -> bool {
        let handle = self.handle(&entry.key());
        let added = lock(&handle).add(entry.clone());
        if added {
            log::debug!("排行榜加入条目 {}，数值 {:.4}", entry.id(), entry.value());
        } else {
            log::trace!("排行榜已有更好的成绩，忽略条目 {}", entry.id());
        }
        added
    }

    /// 在已存在的排行榜上持锁执行操作
    fn with_board<R>(&self, key: &T::Key, f: impl FnOnce(&mut Leaderboard<T>) -> R) -> Option<R> {
        let handle = self.get(key)?;
        let mut board = lock(&handle);
        Some(f(&mut *board))
    }

    pub fn remove(&self, entry: &T) -> bool {
        self.with_board(&entry.key(), |board| board.remove(entry))
            .unwrap_or(true)
    }

    pub fn rank(&self, entry: &T) -> Option<usize> {
        self.with_board(&entry.key(), |board| board.rank(entry))
            .flatten()
    }

    pub fn range(&self, key: &T::Key, skip: usize, take: usize) -> Vec<T> {
        self.with_board(key, |board| board.range(skip, take).to_vec())
            .unwrap_or_default()
    }

    /// 按配置的分页大小取第 `page` 页（从 0 开始）
    pub fn page(&self, key: &T::Key, page: usize) -> Vec<T> {
        let size = CONFIG.leaderboard_page_size;
        self.range(key, page.saturating_mul(size), size)
    }

    pub fn len(&self, key: &T::Key) -> usize {
        self.with_board(key, |board| board.len()).unwrap_or(0)
    }
}

impl<T> LeaderboardRegistry<T>
where
    T: Ranked + Send,
    T::Owner: Send,
{
    /// 进程启动时从已持久化的记录重建，按键并行构建
    pub fn initialize(&self, entries: Vec<T>) {
        let total = entries.len();
        let mut groups: HashMap<T::Key, Vec<T>> = HashMap::new();
        for entry in entries {
            groups.entry(entry.key()).or_default().push(entry);
        }

        let built: Vec<(T::Key, Leaderboard<T>)> = groups
            .into_par_iter()
            .map(|(key, entries)| (key, Leaderboard::from_entries(entries)))
            .collect();

        let mut boards = self.boards.write().unwrap_or_else(PoisonError::into_inner);
        let count = built.len();
        for (key, board) in built {
            boards.insert(key, Arc::new(Mutex::new(board)));
        }
        log::info!("排行榜初始化完成: {count} 个排行榜, 共 {total} 条记录");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn record(chart_id: Uuid, owner_id: i32, rks: f64, minutes_ago: i64) -> Record {
        Record {
            id: Uuid::new_v4(),
            chart_id,
            owner_id,
            perfect: 0,
            good_early: 0,
            good_late: 0,
            bad: 0,
            miss: 0,
            max_combo: 0,
            perfect_judgment: 80,
            good_judgment: 160,
            std_deviation: 0.0,
            score: 0,
            accuracy: 0.0,
            rks,
            date_created: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn worse_record_for_same_owner_is_ignored() {
        let chart = Uuid::new_v4();
        let mut board = Leaderboard::new();
        let first = record(chart, 1, 12.0, 10);
        assert!(board.add(first.clone()));

        let worse = record(chart, 1, 11.0, 5);
        assert!(!board.add(worse.clone()));
        assert_eq!(board.len(), 1);
        assert_eq!(board.rank(&first), Some(1));
        assert_eq!(board.rank(&worse), None);

        // 同分但更晚，也不算更好
        let tie = record(chart, 1, 12.0, 1);
        assert!(!board.add(tie));
        assert_eq!(board.get(&1).unwrap().id, first.id);
    }

    #[test]
    fn better_record_replaces_and_moves_up() {
        let chart = Uuid::new_v4();
        let mut board = Leaderboard::new();
        board.add(record(chart, 1, 14.0, 30));
        board.add(record(chart, 2, 13.0, 30));
        let old = record(chart, 3, 10.0, 30);
        board.add(old.clone());
        assert_eq!(board.rank(&old), Some(3));

        let better = record(chart, 3, 15.0, 1);
        assert!(board.add(better.clone()));
        assert_eq!(board.len(), 3);
        assert_eq!(board.rank(&better), Some(1));
        assert_eq!(board.rank(&old), None);
        assert_eq!(board.get(&1).and_then(|entry| board.rank(entry)), Some(2));
    }

    #[test]
    fn earlier_record_wins_ties() {
        let chart = Uuid::new_v4();
        let mut board = Leaderboard::new();
        let late = record(chart, 1, 12.0, 1);
        let early = record(chart, 2, 12.0, 60);
        board.add(late.clone());
        board.add(early.clone());
        assert_eq!(board.rank(&early), Some(1));
        assert_eq!(board.rank(&late), Some(2));
    }

    #[test]
    fn remove_is_by_identity() {
        let chart = Uuid::new_v4();
        let mut board = Leaderboard::new();
        let kept = record(chart, 1, 12.0, 10);
        let removed = record(chart, 2, 13.0, 10);
        board.add(kept.clone());
        board.add(removed.clone());

        // 同一持有者但不是榜上那条
        let stranger = record(chart, 1, 20.0, 10);
        assert!(board.remove(&stranger));
        assert_eq!(board.len(), 2);

        assert!(board.remove(&removed));
        assert_eq!(board.rank(&kept), Some(1));
        assert!(board.remove(&removed));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn range_windows_in_order() {
        let chart = Uuid::new_v4();
        let mut board = Leaderboard::new();
        for owner in 0..10 {
            board.add(record(chart, owner, owner as f64, 0));
        }
        let page: Vec<i32> = board.range(2, 3).iter().map(|r| r.owner_id).collect();
        assert_eq!(page, vec![7, 6, 5]);
        assert_eq!(board.range(8, 100).len(), 2);
        assert!(board.range(50, 5).is_empty());
        assert_eq!(board.range(0, usize::MAX).len(), 10);
    }

    #[test]
    fn pages_use_configured_size() {
        let chart = Uuid::new_v4();
        let registry = ChartLeaderboards::new();
        let size = CONFIG.leaderboard_page_size;
        for owner in 0..(size + 3) as i32 {
            registry.add(record(chart, owner, owner as f64, 0));
        }
        assert_eq!(registry.page(&chart, 0).len(), size);
        let second = registry.page(&chart, 1);
        assert_eq!(second.len(), 3);
        assert_eq!(second[2].owner_id, 0);
        assert!(registry.page(&chart, usize::MAX).is_empty());
    }

    #[test]
    fn initialize_keeps_best_per_owner() {
        let chart_a = Uuid::new_v4();
        let chart_b = Uuid::new_v4();
        let best = record(chart_a, 1, 15.0, 20);
        let records = vec![
            record(chart_a, 1, 12.0, 30),
            best.clone(),
            record(chart_a, 1, 15.0, 5),
            record(chart_a, 2, 13.0, 10),
            record(chart_b, 1, 9.0, 10),
        ];

        let registry = ChartLeaderboards::new();
        registry.initialize(records);
        assert_eq!(registry.len(&chart_a), 2);
        assert_eq!(registry.len(&chart_b), 1);
        assert_eq!(registry.rank(&best), Some(1));
        assert_eq!(registry.range(&chart_a, 0, 1)[0].id, best.id);
    }

    #[test]
    fn absent_keys_are_harmless() {
        let registry = ChartLeaderboards::new();
        let entry = record(Uuid::new_v4(), 1, 10.0, 0);
        assert_eq!(registry.rank(&entry), None);
        assert!(registry.remove(&entry));
        assert!(registry.range(&entry.chart_id, 0, 10).is_empty());
        assert!(registry.page(&entry.chart_id, 0).is_empty());
    }

    #[test]
    fn division_boards_rank_teams_by_score() {
        let division = Uuid::new_v4();
        let registry = DivisionLeaderboards::new();
        let team = |name: &str, score: f64| TeamEntry {
            id: Uuid::new_v4(),
            division_id: division,
            name: name.to_string(),
            score,
            date_created: Utc::now(),
        };
        let alpha = team("alpha", 800.0);
        let beta = team("beta", 950.0);
        registry.add(alpha.clone());
        registry.add(beta.clone());
        assert_eq!(registry.rank(&beta), Some(1));
        assert_eq!(registry.rank(&alpha), Some(2));
        assert_eq!(registry.len(&division), 2);
    }

    #[test]
    fn concurrent_adds_keep_one_entry_per_owner() {
        let chart = Uuid::new_v4();
        let registry = ChartLeaderboards::new();
        std::thread::scope(|scope| {
            for worker in 0..8 {
                let registry = &registry;
                scope.spawn(move || {
                    for owner in 0..50 {
                        let rks = (worker * 50 + owner) as f64 / 100.0;
                        registry.add(record(chart, owner, rks, 0));
                    }
                });
            }
        });

        assert_eq!(registry.len(&chart), 50);
        let all = registry.range(&chart, 0, 50);
        for pair in all.windows(2) {
            assert!(pair[0].rks >= pair[1].rks);
        }
        // 每个持有者保留的是最高的那次
        for entry in &all {
            let expected = (7 * 50 + entry.owner_id) as f64 / 100.0;
            assert_eq!(entry.rks, expected);
        }
    }
}
