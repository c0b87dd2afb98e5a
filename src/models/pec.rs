//! PhiEdit (PEC) 逐行格式的结构。时间单位均为拍。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PecChart {
    /// 全局偏移（毫秒）
    pub offset: i32,
    pub bpm_list: Vec<PecBpm>,
    pub notes: Vec<PecNote>,
    /// `cv`
    pub speed_events: Vec<PecSpeedEvent>,
    /// `cp`
    pub position_events: Vec<PecPositionEvent>,
    /// `cd`
    pub rotation_events: Vec<PecRotationEvent>,
    /// `ca`
    pub alpha_events: Vec<PecAlphaEvent>,
    /// `cm`
    pub move_events: Vec<PecMoveEvent>,
    /// `cr`
    pub rotate_events: Vec<PecRotateEvent>,
    /// `cf`
    pub fade_events: Vec<PecFadeEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PecBpm {
    pub time: f64,
    pub bpm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PecNoteKind {
    Tap,
    Hold,
    Flick,
    Drag,
}

impl PecNoteKind {
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            b'1' => Some(PecNoteKind::Tap),
            b'2' => Some(PecNoteKind::Hold),
            b'3' => Some(PecNoteKind::Flick),
            b'4' => Some(PecNoteKind::Drag),
            _ => None,
        }
    }

    pub fn marker(&self) -> u8 {
        match self {
            PecNoteKind::Tap => 1,
            PecNoteKind::Hold => 2,
            PecNoteKind::Flick => 3,
            PecNoteKind::Drag => 4,
        }
    }

    /// 只有 Hold 带结束时间
    pub fn is_durational(&self) -> bool {
        matches!(self, PecNoteKind::Hold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PecNote {
    pub kind: PecNoteKind,
    pub line: i32,
    pub start_time: f64,
    /// 非 Hold 音符与 `start_time` 相同
    pub end_time: f64,
    pub position_x: f64,
    /// 1 在判定线上方，2 在下方
    pub above: i32,
    pub is_fake: bool,
    pub speed: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PecSpeedEvent {
    pub line: i32,
    pub time: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PecPositionEvent {
    pub line: i32,
    pub time: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PecRotationEvent {
    pub line: i32,
    pub time: f64,
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PecAlphaEvent {
    pub line: i32,
    pub time: f64,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PecMoveEvent {
    pub line: i32,
    pub start_time: f64,
    pub end_time: f64,
    pub x: f64,
    pub y: f64,
    pub easing: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PecRotateEvent {
    pub line: i32,
    pub start_time: f64,
    pub end_time: f64,
    pub rotation: f64,
    pub easing: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PecFadeEvent {
    pub line: i32,
    pub start_time: f64,
    pub end_time: f64,
    pub alpha: f64,
}
