//! Re:PhiEdit (RPE) 谱面的类型化结构。字段声明顺序即输出顺序。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::chart::Beat;
use crate::utils::serde_helpers::{control_curve, null_as_default, one, one_i32, skip_nulls};

/// 控制曲线末点的横坐标。JSON 不能表示无穷大，沿用编辑器的约定值
pub const CURVE_END: f64 = 9_999_999.0;

const LINEAR_EASING: i32 = 1;

fn linear() -> i32 {
    LINEAR_EASING
}

fn no_father() -> i32 {
    -1
}

fn opaque() -> i32 {
    255
}

fn always_visible() -> f64 {
    999_999.0
}

fn default_texture() -> String {
    "line.png".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpeChart {
    #[serde(rename = "BPMList", deserialize_with = "skip_nulls")]
    pub bpm_list: Vec<RpeBpm>,
    #[serde(rename = "META", default)]
    pub meta: RpeMeta,
    #[serde(rename = "judgeLineGroup", default, deserialize_with = "skip_nulls")]
    pub judge_line_group: Vec<String>,
    #[serde(rename = "judgeLineList", deserialize_with = "skip_nulls")]
    pub judge_line_list: Vec<RpeJudgeLine>,
    /// 未声明的字段原样保留，回写时不丢失
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpeBpm {
    pub bpm: f64,
    #[serde(rename = "startTime")]
    pub start_time: Beat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpeMeta {
    #[serde(rename = "RPEVersion")]
    pub rpe_version: i32,
    pub background: String,
    pub charter: String,
    pub composer: String,
    pub id: String,
    pub illustration: Option<String>,
    pub level: String,
    pub name: String,
    pub offset: i32,
    pub song: String,
    /// 未声明的字段原样保留，回写时不丢失
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpeJudgeLine {
    #[serde(rename = "Group", default)]
    pub group: i32,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Texture", default = "default_texture")]
    pub texture: String,
    #[serde(
        rename = "alphaControl",
        default = "AlphaControl::identity_curve",
        deserialize_with = "control_curve"
    )]
    pub alpha_control: Vec<AlphaControl>,
    #[serde(rename = "bpmfactor", default = "one")]
    pub bpm_factor: f64,
    #[serde(rename = "eventLayers", default, deserialize_with = "skip_nulls")]
    pub event_layers: Vec<RpeEventLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended: Option<RpeExtendedEvents>,
    #[serde(default = "no_father")]
    pub father: i32,
    #[serde(rename = "isCover", default = "one_i32")]
    pub is_cover: i32,
    #[serde(default, deserialize_with = "skip_nulls")]
    pub notes: Vec<RpeNote>,
    #[serde(rename = "numOfNotes", default)]
    pub num_of_notes: usize,
    #[serde(
        rename = "posControl",
        default = "PosControl::identity_curve",
        deserialize_with = "control_curve"
    )]
    pub pos_control: Vec<PosControl>,
    #[serde(
        rename = "sizeControl",
        default = "SizeControl::identity_curve",
        deserialize_with = "control_curve"
    )]
    pub size_control: Vec<SizeControl>,
    #[serde(
        rename = "skewControl",
        default = "SkewControl::identity_curve",
        deserialize_with = "control_curve"
    )]
    pub skew_control: Vec<SkewControl>,
    #[serde(
        rename = "yControl",
        default = "YControl::identity_curve",
        deserialize_with = "control_curve"
    )]
    pub y_control: Vec<YControl>,
    #[serde(rename = "zOrder", default)]
    pub z_order: i32,
    /// 未声明的字段原样保留，回写时不丢失
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpeNote {
    #[serde(default = "one_i32")]
    pub above: i32,
    #[serde(default = "opaque")]
    pub alpha: i32,
    #[serde(rename = "endTime")]
    pub end_time: Beat,
    #[serde(rename = "isFake", default)]
    pub is_fake: i32,
    #[serde(rename = "positionX", default)]
    pub position_x: f64,
    #[serde(default = "one")]
    pub size: f64,
    #[serde(default = "one")]
    pub speed: f64,
    #[serde(rename = "startTime")]
    pub start_time: Beat,
    /// 1 Tap, 2 Hold, 3 Flick, 4 Drag
    #[serde(rename = "type")]
    pub kind: i32,
    #[serde(rename = "visibleTime", default = "always_visible")]
    pub visible_time: f64,
    #[serde(rename = "yOffset", default)]
    pub y_offset: f64,
    /// 未声明的字段原样保留，回写时不丢失
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RpeNote {
    pub const HOLD: i32 = 2;

    pub fn is_fake(&self) -> bool {
        self.is_fake != 0
    }

    pub fn is_hold(&self) -> bool {
        self.kind == Self::HOLD
    }
}

/// 通用事件。`T` 为数值、RGB 颜色或文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpeEvent<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub bezier: u8,
    #[serde(rename = "bezierPoints", default, deserialize_with = "null_as_default")]
    pub bezier_points: [f64; 4],
    #[serde(rename = "easingLeft", default)]
    pub easing_left: f64,
    #[serde(rename = "easingRight", default = "one")]
    pub easing_right: f64,
    #[serde(rename = "easingType", default = "linear")]
    pub easing_type: i32,
    pub end: T,
    #[serde(rename = "endTime")]
    pub end_time: Beat,
    #[serde(default)]
    pub linkgroup: i32,
    pub start: T,
    #[serde(rename = "startTime")]
    pub start_time: Beat,
    /// 未声明的字段原样保留，回写时不丢失
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpeEventLayer {
    #[serde(rename = "alphaEvents", default, deserialize_with = "skip_nulls")]
    pub alpha_events: Vec<RpeEvent<f64>>,
    #[serde(rename = "moveXEvents", default, deserialize_with = "skip_nulls")]
    pub move_x_events: Vec<RpeEvent<f64>>,
    #[serde(rename = "moveYEvents", default, deserialize_with = "skip_nulls")]
    pub move_y_events: Vec<RpeEvent<f64>>,
    #[serde(rename = "rotateEvents", default, deserialize_with = "skip_nulls")]
    pub rotate_events: Vec<RpeEvent<f64>>,
    #[serde(rename = "speedEvents", default, deserialize_with = "skip_nulls")]
    pub speed_events: Vec<RpeEvent<f64>>,
    /// 未声明的字段原样保留，回写时不丢失
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RpeEventLayer {
    pub fn lists(&self) -> [&Vec<RpeEvent<f64>>; 5] {
        [
            &self.alpha_events,
            &self.move_x_events,
            &self.move_y_events,
            &self.rotate_events,
            &self.speed_events,
        ]
    }

    pub fn lists_mut(&mut self) -> [&mut Vec<RpeEvent<f64>>; 5] {
        [
            &mut self.alpha_events,
            &mut self.move_x_events,
            &mut self.move_y_events,
            &mut self.rotate_events,
            &mut self.speed_events,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpeExtendedEvents {
    #[serde(
        rename = "colorEvents",
        default,
        deserialize_with = "skip_nulls",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub color_events: Vec<RpeEvent<[i32; 3]>>,
    #[serde(
        rename = "inclineEvents",
        default,
        deserialize_with = "skip_nulls",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub incline_events: Vec<RpeEvent<f64>>,
    #[serde(
        rename = "paintEvents",
        default,
        deserialize_with = "skip_nulls",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub paint_events: Vec<RpeEvent<f64>>,
    #[serde(
        rename = "scaleXEvents",
        default,
        deserialize_with = "skip_nulls",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub scale_x_events: Vec<RpeEvent<f64>>,
    #[serde(
        rename = "scaleYEvents",
        default,
        deserialize_with = "skip_nulls",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub scale_y_events: Vec<RpeEvent<f64>>,
    #[serde(
        rename = "textEvents",
        default,
        deserialize_with = "skip_nulls",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub text_events: Vec<RpeEvent<String>>,
    /// 未声明的字段原样保留，回写时不丢失
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RpeExtendedEvents {
    pub fn numeric_lists(&self) -> [&Vec<RpeEvent<f64>>; 4] {
        [
            &self.incline_events,
            &self.paint_events,
            &self.scale_x_events,
            &self.scale_y_events,
        ]
    }

    pub fn numeric_lists_mut(&mut self) -> [&mut Vec<RpeEvent<f64>>; 4] {
        [
            &mut self.incline_events,
            &mut self.paint_events,
            &mut self.scale_x_events,
            &mut self.scale_y_events,
        ]
    }
}

/// 判定线控制曲线上的点
pub trait ControlPoint: Sized {
    /// 恒等值：该曲线不产生任何效果时的取值
    const IDENTITY: f64;

    fn at(x: f64) -> Self;

    fn x(&self) -> f64;

    fn identity_curve() -> Vec<Self> {
        vec![Self::at(0.0), Self::at(CURVE_END)]
    }
}

macro_rules! control_point {
    ($name:ident, $field:ident, $identity:expr) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(default = "linear")]
            pub easing: i32,
            pub $field: f64,
            pub x: f64,
            #[serde(flatten)]
            pub extra: BTreeMap<String, Value>,
        }

        impl ControlPoint for $name {
            const IDENTITY: f64 = $identity;

            fn at(x: f64) -> Self {
                Self {
                    easing: LINEAR_EASING,
                    $field: Self::IDENTITY,
                    x,
                    extra: BTreeMap::new(),
                }
            }

            fn x(&self) -> f64 {
                self.x
            }
        }
    };
}

control_point!(AlphaControl, alpha, 1.0);
control_point!(PosControl, pos, 1.0);
control_point!(SizeControl, size, 1.0);
control_point!(SkewControl, skew, 0.0);
control_point!(YControl, y, 1.0);
