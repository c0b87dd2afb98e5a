use crate::models::chart::Beat;
use crate::models::rpe::{RpeChart, RpeEvent};
use crate::utils::error::ParseError;

/// 尝试按 RPE 解析。
///
/// 返回 `Ok(None)` 表示不是 RPE 谱面，调用方应继续尝试其他格式；
/// 存在非法拍数分数时直接返回错误，不再尝试其他格式。
pub fn parse_rpe(text: &str) -> Result<Option<RpeChart>, ParseError> {
    let chart: RpeChart = match serde_json::from_str(text) {
        Ok(chart) => chart,
        Err(e) => {
            log::debug!("不是 RPE 谱面: {e}");
            return Ok(None);
        }
    };

    if chart.bpm_list.is_empty() {
        log::debug!("RPE 谱面缺少 BPM 列表");
        return Ok(None);
    }

    if let Some(beat) = first_malformed_beat(&chart) {
        log::warn!("RPE 谱面包含非法拍数 {beat}");
        return Err(ParseError::InvalidTimeSignature(beat));
    }

    log::debug!(
        "RPE 解析完成: {} 条判定线, {} 个 BPM 节点",
        chart.judge_line_list.len(),
        chart.bpm_list.len()
    );
    Ok(Some(chart))
}

fn event_beats<T>(events: &[RpeEvent<T>]) -> impl Iterator<Item = Beat> + '_ {
    events
        .iter()
        .flat_map(|event| [event.start_time, event.end_time])
}

/// 遍历谱面中所有拍数，返回第一个非法的
pub fn first_malformed_beat(chart: &RpeChart) -> Option<Beat> {
    let bpm_beats = chart.bpm_list.iter().map(|bpm| bpm.start_time);

    let line_beats = chart.judge_line_list.iter().flat_map(|line| {
        let notes = line
            .notes
            .iter()
            .flat_map(|note| [note.start_time, note.end_time]);
        let layers = line
            .event_layers
            .iter()
            .flat_map(|layer| layer.lists().into_iter().flat_map(|list| event_beats(list)));
        let extended = line.extended.iter().flat_map(|extended| {
            let numeric = extended
                .numeric_lists()
                .into_iter()
                .flat_map(|list| event_beats(list));
            numeric
                .chain(event_beats(&extended.color_events))
                .chain(event_beats(&extended.text_events))
        });
        notes.chain(layers).chain(extended)
    });

    bpm_beats.chain(line_beats).find(Beat::is_malformed)
}
