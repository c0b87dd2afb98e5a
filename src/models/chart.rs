use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::models::pec::PecChart;
use crate::models::rpe::RpeChart;

/// RPE 使用的拍数表示：`[整数部分, 分子, 分母]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct Beat {
    pub whole: i32,
    pub numerator: i32,
    pub denominator: i32,
}

impl Beat {
    pub const ZERO: Beat = Beat {
        whole: 0,
        numerator: 0,
        denominator: 1,
    };

    pub fn new(whole: i32, numerator: i32, denominator: i32) -> Self {
        Self {
            whole,
            numerator,
            denominator,
        }
    }

    /// 分母为 0 而分子不为 0 时是非法分数
    pub fn is_malformed(&self) -> bool {
        self.denominator == 0 && self.numerator != 0
    }

    /// 换算为拍数。`0/0` 视为整拍
    pub fn value(&self) -> f64 {
        if self.denominator == 0 {
            return self.whole as f64;
        }
        self.whole as f64 + self.numerator as f64 / self.denominator as f64
    }

    pub fn cmp_value(&self, other: &Beat) -> Ordering {
        self.value().total_cmp(&other.value())
    }
}

impl From<[i32; 3]> for Beat {
    fn from(raw: [i32; 3]) -> Self {
        Self::new(raw[0], raw[1], raw[2])
    }
}

impl From<Beat> for [i32; 3] {
    fn from(beat: Beat) -> Self {
        [beat.whole, beat.numerator, beat.denominator]
    }
}

impl fmt::Display for Beat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.whole, self.numerator, self.denominator)
    }
}

/// 支持的两种谱面编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    /// Re:PhiEdit 的 JSON 结构化格式
    Rpe,
    /// PhiEdit 的逐行文本格式
    Pec,
}

impl ChartFormat {
    /// 存储时使用的文件扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Rpe => "json",
            ChartFormat::Pec => "pec",
        }
    }
}

impl fmt::Display for ChartFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartFormat::Rpe => write!(f, "RPE"),
            ChartFormat::Pec => write!(f, "PEC"),
        }
    }
}

/// 解析后的谱面，保留各自编码的完整结构以便原样回写
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartDocument {
    Rpe(RpeChart),
    Pec(PecChart),
}

impl ChartDocument {
    pub fn format(&self) -> ChartFormat {
        match self {
            ChartDocument::Rpe(_) => ChartFormat::Rpe,
            ChartDocument::Pec(_) => ChartFormat::Pec,
        }
    }

    /// 非 Fake 音符数
    pub fn note_count(&self) -> usize {
        match self {
            ChartDocument::Rpe(chart) => chart
                .judge_line_list
                .iter()
                .flat_map(|line| line.notes.iter())
                .filter(|note| !note.is_fake())
                .count(),
            ChartDocument::Pec(chart) => chart.notes.iter().filter(|note| !note.is_fake).count(),
        }
    }

    /// 与编码无关的 BPM 列表：`(拍数, bpm)`
    pub fn bpm_events(&self) -> Vec<(f64, f64)> {
        match self {
            ChartDocument::Rpe(chart) => chart
                .bpm_list
                .iter()
                .map(|bpm| (bpm.start_time.value(), bpm.bpm))
                .collect(),
            ChartDocument::Pec(chart) => chart.bpm_list.iter().map(|bpm| (bpm.time, bpm.bpm)).collect(),
        }
    }
}

/// `validate` 的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedChart {
    pub format: ChartFormat,
    pub document: ChartDocument,
    pub note_count: usize,
}

/// 上传处理完成后交给调用方持久化的信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedChart {
    pub storage_key: String,
    pub url: String,
    pub checksum: String,
    pub format: ChartFormat,
    pub note_count: usize,
}
