use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::models::vote::{ChartRatings, Vote, VoteScores, DIMENSIONS};
use crate::utils::error::{AppError, AppResult};

/// 没有任何有效投票时的评分
pub const RATING_PRIOR: f64 = 2.5;

const RELIABILITY_BASE: f64 = 1.3;

/// 经验阈值与对应的投票权重，取不超过经验值的最高一档
const EXPERIENCE_THRESHOLDS: [u64; 11] = [
    0, 50, 100, 500, 1000, 3000, 6000, 10000, 30000, 60000, 100000,
];
const EXPERIENCE_MULTIPLIERS: [f64; 11] = [0.0, 1.0, 1.1, 1.2, 1.3, 1.4, 1.5, 1.6, 1.8, 2.0, 3.0];

pub fn vote_multiplier(experience: u64) -> f64 {
    EXPERIENCE_THRESHOLDS
        .iter()
        .rposition(|&threshold| threshold <= experience)
        .map_or(0.0, |index| EXPERIENCE_MULTIPLIERS[index])
}

/// 可信度 r = 1 - 1.3^(-总权重)：无权重时为 0，权重越大越接近 1
pub fn reliability(weight_amount: f64) -> f64 {
    1.0 - RELIABILITY_BASE.powf(-weight_amount)
}

fn shrink(weighted_sum: f64, weight_amount: f64, reliability: f64) -> f64 {
    if weight_amount == 0.0 || weighted_sum == 0.0 {
        return RATING_PRIOR;
    }
    reliability * weighted_sum / weight_amount + (1.0 - reliability) * RATING_PRIOR
}

/// 由全部投票重算谱面评分。空输入得到先验值
pub fn recompute(votes: &[Vote]) -> ChartRatings {
    let weight_amount: f64 = votes.iter().map(|vote| vote.multiplier).sum();
    let r = reliability(weight_amount);

    let mut dimension_sums = [0.0f64; DIMENSIONS];
    let mut total_sum = 0.0;
    for vote in votes {
        for (sum, value) in dimension_sums.iter_mut().zip(vote.scores.as_array()) {
            *sum += vote.multiplier * value as f64;
        }
        total_sum += vote.multiplier * vote.total as f64;
    }

    // 总评按六个维度的平均值计
    let score = total_sum / DIMENSIONS as f64;
    let [arrangement, gameplay, visual_effects, creativity, concord, impression] =
        dimension_sums.map(|sum| shrink(sum, weight_amount, r));

    let ratings = ChartRatings {
        rating: shrink(score, weight_amount, r),
        rating_on_arrangement: arrangement,
        rating_on_gameplay: gameplay,
        rating_on_visual_effects: visual_effects,
        rating_on_creativity: creativity,
        rating_on_concord: concord,
        rating_on_impression: impression,
        score,
    };
    log::debug!(
        "评分重算: {} 票, 总权重 {:.2}, 可信度 {:.4}, 评分 {:.4}",
        votes.len(),
        weight_amount,
        r,
        ratings.rating
    );
    ratings
}

/// 投票的持久化由调用方提供
pub trait VoteRepository {
    fn votes_for_chart(&self, chart_id: Uuid) -> AppResult<Vec<Vote>>;

    /// 新建或覆盖
    fn save_vote(&self, vote: &Vote) -> AppResult<()>;

    /// 返回是否确实删除了记录
    fn delete_vote(&self, chart_id: Uuid, vote_id: Uuid) -> AppResult<bool>;

    fn save_ratings(&self, chart_id: Uuid, ratings: &ChartRatings) -> AppResult<()>;
}

/// 投票变更与评分重算。同一谱面的操作串行执行，避免并发投票互相覆盖
pub struct RatingService<R: VoteRepository> {
    repository: R,
    chart_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl<R: VoteRepository> RatingService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            chart_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn chart_lock(&self, chart_id: Uuid) -> Arc<Mutex<()>> {
        self.chart_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(chart_id)
            .or_default()
            .clone()
    }

    /// 没有其他调用方持有时移除该谱面的锁，锁表只保留正在使用的谱面
    fn release_chart_lock(&self, chart_id: Uuid, lock: Arc<Mutex<()>>) {
        let mut locks = self.chart_locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if locks.get(&chart_id).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            locks.remove(&chart_id);
        }
    }

    /// 在谱面的临界区内执行变更，随后重算并保存评分
    fn mutate<F>(&self, chart_id: Uuid, mutation: F) -> AppResult<ChartRatings>
    where
        F: FnOnce(&R) -> AppResult<()>,
    {
        let lock = self.chart_lock(chart_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.apply(chart_id, mutation)
        };
        self.release_chart_lock(chart_id, lock);
        result
    }

    fn apply<F>(&self, chart_id: Uuid, mutation: F) -> AppResult<ChartRatings>
    where
        F: FnOnce(&R) -> AppResult<()>,
    {
        mutation(&self.repository)?;
        let votes = self.repository.votes_for_chart(chart_id)?;
        let ratings = recompute(&votes);
        self.repository.save_ratings(chart_id, &ratings)?;
        Ok(ratings)
    }

    #[cfg(test)]
    fn locked_charts(&self) -> usize {
        self.chart_locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// 投票或修改已有投票。权重按投票者当前经验确定
    pub fn cast_vote(
        &self,
        chart_id: Uuid,
        owner_id: i32,
        scores: VoteScores,
        experience: u64,
    ) -> AppResult<(Vote, ChartRatings)> {
        let multiplier = vote_multiplier(experience);
        let mut vote = Vote::new(chart_id, owner_id, scores, multiplier)?;

        let ratings = self.mutate(chart_id, |repository| {
            let existing = repository
                .votes_for_chart(chart_id)?
                .into_iter()
                .find(|v| v.owner_id == owner_id);
            if let Some(existing) = existing {
                log::debug!("用户[{owner_id}]修改对谱面[{chart_id}]的投票");
                vote.id = existing.id;
            }
            repository.save_vote(&vote)
        })?;
        log::info!(
            "谱面[{chart_id}]收到投票: 总分 {}, 权重 {multiplier}, 新评分 {:.4}",
            vote.total,
            ratings.rating
        );
        Ok((vote, ratings))
    }

    pub fn remove_vote(&self, vote: &Vote) -> AppResult<ChartRatings> {
        self.mutate(vote.chart_id, |repository| {
            if repository.delete_vote(vote.chart_id, vote.id)? {
                Ok(())
            } else {
                Err(AppError::Storage(format!("投票 {} 删除失败", vote.id)))
            }
        })
    }

    /// 不修改投票，仅重算（供一致性任务使用）
    pub fn refresh(&self, chart_id: Uuid) -> AppResult<ChartRatings> {
        self.mutate(chart_id, |_| Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn vote(value: i32, multiplier: f64) -> Vote {
        let scores = VoteScores {
            arrangement: value,
            gameplay: value,
            visual_effects: value,
            creativity: value,
            concord: value,
            impression: value,
        };
        Vote {
            id: Uuid::new_v4(),
            chart_id: Uuid::nil(),
            owner_id: 0,
            scores,
            total: scores.total(),
            multiplier,
            date_created: Utc::now(),
        }
    }

    #[test]
    fn multiplier_steps() {
        assert_eq!(vote_multiplier(0), 0.0);
        assert_eq!(vote_multiplier(49), 0.0);
        assert_eq!(vote_multiplier(50), 1.0);
        assert_eq!(vote_multiplier(499), 1.1);
        assert_eq!(vote_multiplier(5999), 1.4);
        assert_eq!(vote_multiplier(30000), 1.8);
        assert_eq!(vote_multiplier(u64::MAX), 3.0);
    }

    #[test]
    fn no_votes_gives_prior() {
        let ratings = recompute(&[]);
        assert_eq!(ratings.rating, RATING_PRIOR);
        assert!(ratings.dimensions().iter().all(|&r| r == RATING_PRIOR));
        assert_eq!(ratings.score, 0.0);
    }

    #[test]
    fn weightless_votes_give_prior() {
        let ratings = recompute(&[vote(5, 0.0), vote(4, 0.0)]);
        assert_eq!(ratings.rating, RATING_PRIOR);
        assert_eq!(ratings.rating_on_concord, RATING_PRIOR);
    }

    #[test]
    fn zero_scores_give_prior() {
        let ratings = recompute(&[vote(0, 1.5)]);
        assert_eq!(ratings.rating, RATING_PRIOR);
    }

    #[test]
    fn rating_matches_formula() {
        let votes = [vote(5, 1.0), vote(3, 2.0)];
        let ratings = recompute(&votes);
        let weight = 3.0;
        let r = 1.0 - 1.3f64.powf(-weight);
        let average = (5.0 * 1.0 + 3.0 * 2.0) / weight;
        let expected = r * average + (1.0 - r) * 2.5;
        assert!((ratings.rating - expected).abs() < 1e-12);
        assert!((ratings.rating_on_gameplay - expected).abs() < 1e-12);
        assert!((ratings.score - (30.0 * 1.0 + 18.0 * 2.0) / 6.0).abs() < 1e-12);
    }

    #[test]
    fn more_weight_moves_rating_towards_average() {
        let light = recompute(&[vote(4, 1.0)]);
        let heavy = recompute(&[vote(4, 1.0), vote(4, 1.0), vote(4, 1.0)]);
        assert!((4.0 - heavy.rating).abs() < (4.0 - light.rating).abs());
        assert!((heavy.rating - 2.5).abs() > (light.rating - 2.5).abs());

        let low_light = recompute(&[vote(1, 1.1)]);
        let low_heavy = recompute(&[vote(1, 3.0)]);
        assert!(low_heavy.rating < low_light.rating);
        assert!(low_light.rating < RATING_PRIOR);
    }

    #[test]
    fn reliability_bounds() {
        assert_eq!(reliability(0.0), 0.0);
        assert!(reliability(1.0) > 0.0);
        assert!(reliability(100.0) > 0.99);
    }

    #[derive(Default)]
    struct MemoryRepository {
        votes: Mutex<HashMap<Uuid, Vec<Vote>>>,
        ratings: Mutex<HashMap<Uuid, ChartRatings>>,
    }

    impl VoteRepository for MemoryRepository {
        fn votes_for_chart(&self, chart_id: Uuid) -> AppResult<Vec<Vote>> {
            Ok(self.votes.lock().unwrap().get(&chart_id).cloned().unwrap_or_default())
        }

        fn save_vote(&self, vote: &Vote) -> AppResult<()> {
            let mut votes = self.votes.lock().unwrap();
            let list = votes.entry(vote.chart_id).or_default();
            list.retain(|v| v.id != vote.id);
            list.push(vote.clone());
            Ok(())
        }

        fn delete_vote(&self, chart_id: Uuid, vote_id: Uuid) -> AppResult<bool> {
            let mut votes = self.votes.lock().unwrap();
            let Some(list) = votes.get_mut(&chart_id) else {
                return Ok(false);
            };
            let before = list.len();
            list.retain(|v| v.id != vote_id);
            Ok(list.len() != before)
        }

        fn save_ratings(&self, chart_id: Uuid, ratings: &ChartRatings) -> AppResult<()> {
            self.ratings.lock().unwrap().insert(chart_id, *ratings);
            Ok(())
        }
    }

    fn uniform(value: i32) -> VoteScores {
        VoteScores {
            arrangement: value,
            gameplay: value,
            visual_effects: value,
            creativity: value,
            concord: value,
            impression: value,
        }
    }

    #[test]
    fn service_recomputes_on_every_mutation() {
        let service = RatingService::new(MemoryRepository::default());
        let chart = Uuid::new_v4();

        let (first, ratings) = service.cast_vote(chart, 1, uniform(5), 1000).unwrap();
        assert_eq!(first.multiplier, 1.3);
        assert!(ratings.rating > RATING_PRIOR);

        // 同一用户再次投票覆盖原投票
        let (second, ratings) = service.cast_vote(chart, 1, uniform(1), 1000).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(service.repository().votes_for_chart(chart).unwrap().len(), 1);
        assert!(ratings.rating < RATING_PRIOR);

        let ratings = service.remove_vote(&second).unwrap();
        assert_eq!(ratings.rating, RATING_PRIOR);
        assert_eq!(
            service.repository().ratings.lock().unwrap()[&chart].rating,
            RATING_PRIOR
        );

        assert!(matches!(service.remove_vote(&second), Err(AppError::Storage(_))));
        // 失败的操作同样释放锁
        assert_eq!(service.locked_charts(), 0);
    }

    #[test]
    fn concurrent_votes_are_not_lost() {
        let service = RatingService::new(MemoryRepository::default());
        let chart = Uuid::new_v4();
        std::thread::scope(|scope| {
            for owner in 0..16 {
                let service = &service;
                scope.spawn(move || {
                    service.cast_vote(chart, owner, uniform(4), 100).unwrap();
                });
            }
        });

        let stored = service.repository().ratings.lock().unwrap()[&chart];
        let votes = service.repository().votes_for_chart(chart).unwrap();
        assert_eq!(votes.len(), 16);
        assert_eq!(service.locked_charts(), 0);
        assert_eq!(stored, recompute(&votes));
    }
}
