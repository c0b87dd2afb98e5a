//! 成绩相关的纯函数：分数、准确率与 RKS。
//!
//! 下游一致性检查以 1e-7 量级的容差比对缓存值，因此各式的运算顺序与常数必须保持原样，
//! 不要为了"化简"而重新结合。

/// 满分
pub const MAX_SCORE: i32 = 1_000_000;

/// 默认判定区间（毫秒），此时 RKS 系数为 1
pub const DEFAULT_PERFECT_JUDGMENT: i32 = 80;
pub const DEFAULT_GOOD_JUDGMENT: i32 = 160;

// 以 i64 求和，计数再大也不会溢出
fn total(perfect: i32, good: i32, bad: i32, miss: i32) -> i64 {
    perfect as i64 + good as i64 + bad as i64 + miss as i64
}

/// 分数 = round((900000·P + 585000·G + 100000·maxCombo) / total)，四舍六入五成双
pub fn calculate_score(perfect: i32, good: i32, bad: i32, miss: i32, max_combo: i32) -> i32 {
    let total = total(perfect, good, bad, miss);
    if total == 0 {
        return 0;
    }
    let raw = (900000.0 * perfect as f64 + 585000.0 * good as f64 + 100000.0 * max_combo as f64)
        / total as f64;
    raw.round_ties_even() as i32
}

/// 准确率，取值 [0, 1]
pub fn calculate_accuracy(perfect: i32, good: i32, bad: i32, miss: i32) -> f64 {
    let total = total(perfect, good, bad, miss);
    if total == 0 {
        return 0.0;
    }
    (perfect as f64 + 0.65 * good as f64) / total as f64
}

/// 未乘判定系数的 RKS。百分比准确率低于 70 时为 0
pub fn calculate_rks_base(
    perfect: i32,
    good: i32,
    bad: i32,
    miss: i32,
    difficulty: f64,
    std_deviation: f64,
) -> f64 {
    let total = total(perfect, good, bad, miss);
    if total == 0 {
        return 0.0;
    }
    let acc = (100.0 * perfect as f64 + 65.0 * good as f64) / total as f64;
    if acc < 70.0 {
        return 0.0;
    }
    let a = acc - 55.0;
    let rks = a * a * difficulty / 2025.0 + 0.02 - std_deviation / 2000.0;
    // 偏差极大时公式会给出负值
    rks.max(0.0)
}

/// 判定区间带来的系数。默认区间 (80, 160) 时恰为 1
pub fn calculate_rks_factor(perfect_judgment: i32, good_judgment: i32) -> f64 {
    let x = 0.8 * perfect_judgment as f64 + 0.225 * good_judgment as f64;
    if x > 150.0 {
        return 0.0;
    }
    if x > 100.0 {
        return x * x / 7500.0 - 4.0 * x / 75.0 + 5.0;
    }
    let y = x - 100.0;
    -(y * y * y) / 4000000.0 + 1.0
}

#[allow(clippy::too_many_arguments)]
pub fn calculate_rks(
    perfect: i32,
    good: i32,
    bad: i32,
    miss: i32,
    difficulty: f64,
    std_deviation: f64,
    perfect_judgment: i32,
    good_judgment: i32,
) -> f64 {
    calculate_rks_base(perfect, good, bad, miss, difficulty, std_deviation)
        * calculate_rks_factor(perfect_judgment, good_judgment)
}
