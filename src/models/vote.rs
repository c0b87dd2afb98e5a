use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::error::{AppError, AppResult};

/// 评分维度数
pub const DIMENSIONS: usize = 6;

/// 单个维度的分值范围
pub const MIN_DIMENSION_SCORE: i32 = 0;
pub const MAX_DIMENSION_SCORE: i32 = 5;

/// 投票时提交的各维度分数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteScores {
    pub arrangement: i32,
    pub gameplay: i32,
    pub visual_effects: i32,
    pub creativity: i32,
    pub concord: i32,
    pub impression: i32,
}

impl VoteScores {
    pub fn as_array(&self) -> [i32; DIMENSIONS] {
        [
            self.arrangement,
            self.gameplay,
            self.visual_effects,
            self.creativity,
            self.concord,
            self.impression,
        ]
    }

    pub fn total(&self) -> i32 {
        self.as_array().iter().sum()
    }

    pub fn validate(&self) -> AppResult<()> {
        if let Some(score) = self
            .as_array()
            .into_iter()
            .find(|score| !(MIN_DIMENSION_SCORE..=MAX_DIMENSION_SCORE).contains(score))
        {
            return Err(AppError::ValidationError(format!(
                "评分 {score} 超出范围 [{MIN_DIMENSION_SCORE}, {MAX_DIMENSION_SCORE}]"
            )));
        }
        Ok(())
    }
}

/// 谱面投票
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub chart_id: Uuid,
    pub owner_id: i32,
    pub scores: VoteScores,
    /// 各维度之和
    pub total: i32,
    /// 投票时按投票者经验确定的权重，之后不随谱面状态变化
    pub multiplier: f64,
    pub date_created: DateTime<Utc>,
}

impl Vote {
    pub fn new(chart_id: Uuid, owner_id: i32, scores: VoteScores, multiplier: f64) -> AppResult<Self> {
        scores.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            chart_id,
            owner_id,
            scores,
            total: scores.total(),
            multiplier,
            date_created: Utc::now(),
        })
    }
}

/// 由投票重算得到的谱面评分字段
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartRatings {
    pub rating: f64,
    pub rating_on_arrangement: f64,
    pub rating_on_gameplay: f64,
    pub rating_on_visual_effects: f64,
    pub rating_on_creativity: f64,
    pub rating_on_concord: f64,
    pub rating_on_impression: f64,
    /// 加权总分 / 6
    pub score: f64,
}

impl ChartRatings {
    pub fn dimensions(&self) -> [f64; DIMENSIONS] {
        [
            self.rating_on_arrangement,
            self.rating_on_gameplay,
            self.rating_on_visual_effects,
            self.rating_on_creativity,
            self.rating_on_concord,
            self.rating_on_impression,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_dimensions() {
        let scores = VoteScores {
            arrangement: 5,
            gameplay: 4,
            visual_effects: 3,
            creativity: 2,
            concord: 1,
            impression: 0,
        };
        let vote = Vote::new(Uuid::new_v4(), 1, scores, 1.2).unwrap();
        assert_eq!(vote.total, 15);
        assert_eq!(vote.multiplier, 1.2);
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        let scores = VoteScores {
            concord: 6,
            ..VoteScores::default()
        };
        assert!(matches!(
            Vote::new(Uuid::new_v4(), 1, scores, 1.0),
            Err(AppError::ValidationError(_))
        ));
    }
}
