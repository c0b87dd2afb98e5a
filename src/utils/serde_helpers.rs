//! 反序列化阶段的缺省值处理。
//!
//! RPE 导出器的输出并不总是完整：列表里可能夹着 `null`，贝塞尔参数和控制曲线可能缺失。
//! 这些情况统一在这里替换为文档约定的默认值，之后的校验和规范化只面对完整的数据。

use serde::{Deserialize, Deserializer};

use crate::models::rpe::ControlPoint;

/// 丢弃列表中的 `null` 元素；整个列表为 `null` 时视为空列表
pub fn skip_nulls<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

/// `null` 与缺失一样取类型默认值
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// 控制曲线不足两个点时补为恒等曲线
pub fn control_curve<'de, D, P>(deserializer: D) -> Result<Vec<P>, D::Error>
where
    D: Deserializer<'de>,
    P: Deserialize<'de> + ControlPoint,
{
    let points: Vec<P> = skip_nulls(deserializer)?;
    if points.len() < 2 {
        return Ok(P::identity_curve());
    }
    Ok(points)
}

pub fn one() -> f64 {
    1.0
}

pub fn one_i32() -> i32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rpe::{AlphaControl, RpeEvent, CURVE_END};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "skip_nulls")]
        items: Vec<i32>,
        #[serde(default = "AlphaControl::identity_curve", deserialize_with = "control_curve")]
        curve: Vec<AlphaControl>,
    }

    #[test]
    fn nulls_are_dropped() {
        let holder: Holder = serde_json::from_str(r#"{"items": [1, null, 3]}"#).unwrap();
        assert_eq!(holder.items, vec![1, 3]);

        let holder: Holder = serde_json::from_str(r#"{"items": null}"#).unwrap();
        assert!(holder.items.is_empty());
    }

    #[test]
    fn missing_or_short_curves_become_identity() {
        let holder: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(holder.curve.len(), 2);
        assert_eq!(holder.curve[0].alpha, 1.0);
        assert_eq!(holder.curve[0].x, 0.0);
        assert_eq!(holder.curve[1].x, CURVE_END);

        let holder: Holder =
            serde_json::from_str(r#"{"curve": [{"alpha": 0.5, "easing": 1, "x": 0.0}]}"#).unwrap();
        assert_eq!(holder.curve, AlphaControl::identity_curve());

        let holder: Holder = serde_json::from_str(r#"{"curve": null}"#).unwrap();
        assert_eq!(holder.curve, AlphaControl::identity_curve());
    }

    #[test]
    fn missing_bezier_defaults_to_linear() {
        let event: RpeEvent<f64> = serde_json::from_str(
            r#"{"start": 0.0, "end": 1.0, "startTime": [0, 0, 1], "endTime": [1, 0, 1], "bezier": null}"#,
        )
        .unwrap();
        assert_eq!(event.bezier, 0);
        assert_eq!(event.bezier_points, [0.0; 4]);
        assert_eq!(event.easing_type, 1);
        assert_eq!(event.easing_right, 1.0);
    }
}
