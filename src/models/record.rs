use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CONFIG;
use crate::models::leaderboard::Ranked;
use crate::utils::error::{AppError, AppResult};
use crate::utils::rks_utils::{calculate_accuracy, calculate_rks, calculate_score};

/// 一次游玩提交的原始数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayResult {
    pub perfect: i32,
    pub good_early: i32,
    pub good_late: i32,
    pub bad: i32,
    pub miss: i32,
    pub max_combo: i32,
    /// Perfect 判定区间（毫秒），缺省取配置中的默认值
    #[serde(default)]
    pub perfect_judgment: Option<i32>,
    /// Good 判定区间（毫秒），缺省取配置中的默认值
    #[serde(default)]
    pub good_judgment: Option<i32>,
    /// 打击时间偏差的标准差（毫秒）
    pub std_deviation: f64,
}

impl PlayResult {
    /// 计数不能为负，最大连击不能超过音符总数，否则分数与准确率会越界
    pub fn validate(&self) -> AppResult<()> {
        let counts = [self.perfect, self.good_early, self.good_late, self.bad, self.miss];
        if counts.iter().any(|&count| count < 0) || self.max_combo < 0 {
            return Err(AppError::ValidationError("判定计数不能为负".to_string()));
        }
        let total: i64 = counts.iter().map(|&count| count as i64).sum();
        if self.max_combo as i64 > total {
            return Err(AppError::ValidationError(format!(
                "最大连击 {} 超过音符总数 {total}",
                self.max_combo
            )));
        }
        if self.perfect_judgment.is_some_and(|j| j <= 0) || self.good_judgment.is_some_and(|j| j <= 0) {
            return Err(AppError::ValidationError("判定区间必须为正数".to_string()));
        }
        Ok(())
    }
}

/// 成绩记录。`score`、`accuracy`、`rks` 是缓存值，随时可由原始数据和谱面定数重算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub chart_id: Uuid,
    pub owner_id: i32,
    pub perfect: i32,
    pub good_early: i32,
    pub good_late: i32,
    pub bad: i32,
    pub miss: i32,
    pub max_combo: i32,
    pub perfect_judgment: i32,
    pub good_judgment: i32,
    pub std_deviation: f64,
    pub score: i32,
    pub accuracy: f64,
    pub rks: f64,
    pub date_created: DateTime<Utc>,
}

impl Record {
    /// 创建记录并计算派生字段
    ///
    /// # 参数
    /// * `chart_id` - 谱面ID
    /// * `owner_id` - 玩家ID
    /// * `play` - 原始游玩数据
    /// * `difficulty` - 谱面定数
    pub fn new(chart_id: Uuid, owner_id: i32, play: &PlayResult, difficulty: f64) -> AppResult<Self> {
        play.validate()?;
        let mut record = Self {
            id: Uuid::new_v4(),
            chart_id,
            owner_id,
            perfect: play.perfect,
            good_early: play.good_early,
            good_late: play.good_late,
            bad: play.bad,
            miss: play.miss,
            max_combo: play.max_combo,
            perfect_judgment: play.perfect_judgment.unwrap_or(CONFIG.default_perfect_judgment),
            good_judgment: play.good_judgment.unwrap_or(CONFIG.default_good_judgment),
            std_deviation: play.std_deviation,
            score: 0,
            accuracy: 0.0,
            rks: 0.0,
            date_created: Utc::now(),
        };
        record.recompute(difficulty);
        Ok(record)
    }

    pub fn good(&self) -> i32 {
        self.good_early + self.good_late
    }

    /// 重算派生字段，返回缓存值是否发生了变化。重复调用结果不变
    pub fn recompute(&mut self, difficulty: f64) -> bool {
        let good = self.good();
        let score = calculate_score(self.perfect, good, self.bad, self.miss, self.max_combo);
        let accuracy = calculate_accuracy(self.perfect, good, self.bad, self.miss);
        let rks = calculate_rks(
            self.perfect,
            good,
            self.bad,
            self.miss,
            difficulty,
            self.std_deviation,
            self.perfect_judgment,
            self.good_judgment,
        );

        let changed = score != self.score
            || accuracy.to_bits() != self.accuracy.to_bits()
            || rks.to_bits() != self.rks.to_bits();
        if changed {
            log::debug!(
                "记录[{}]派生字段更新: score {} -> {}, rks {:.4} -> {:.4}",
                self.id,
                self.score,
                score,
                self.rks,
                rks
            );
            self.score = score;
            self.accuracy = accuracy;
            self.rks = rks;
        }
        changed
    }
}

impl Ranked for Record {
    type Key = Uuid;
    type Owner = i32;

    fn id(&self) -> Uuid {
        self.id
    }

    fn key(&self) -> Uuid {
        self.chart_id
    }

    fn owner(&self) -> i32 {
        self.owner_id
    }

    fn value(&self) -> f64 {
        self.rks
    }

    fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }
}
