use crate::models::chart::ChartDocument;
use crate::models::pec::PecChart;
use crate::models::rpe::RpeChart;
use crate::utils::error::AppResult;

/// 按谱面原本的编码回写
pub fn serialize(document: &ChartDocument) -> AppResult<String> {
    match document {
        ChartDocument::Rpe(chart) => serialize_rpe(chart),
        ChartDocument::Pec(chart) => Ok(serialize_pec(chart)),
    }
}

pub fn serialize_rpe(chart: &RpeChart) -> AppResult<String> {
    Ok(serde_json::to_string(chart)?)
}

/// PEC 输出：首行偏移，之后按固定顺序分块，块之间空一行。
/// 数字使用最短可往返表示，重新解析后数值不变。
pub fn serialize_pec(chart: &PecChart) -> String {
    let mut sections: Vec<String> = Vec::with_capacity(9);

    sections.push(block(chart.bpm_list.iter().map(|bpm| format!("bp {} {}", bpm.time, bpm.bpm))));

    sections.push(block(chart.notes.iter().map(|note| {
        let end_time = if note.kind.is_durational() {
            format!(" {}", note.end_time)
        } else {
            String::new()
        };
        format!(
            "n{} {} {}{end_time} {} {} {}\n# {}\n& {}",
            note.kind.marker(),
            note.line,
            note.start_time,
            note.position_x,
            note.above,
            u8::from(note.is_fake),
            note.speed,
            note.size
        )
    })));

    sections.push(block(
        chart
            .speed_events
            .iter()
            .map(|e| format!("cv {} {} {}", e.line, e.time, e.speed)),
    ));
    sections.push(block(
        chart
            .position_events
            .iter()
            .map(|e| format!("cp {} {} {} {}", e.line, e.time, e.x, e.y)),
    ));
    sections.push(block(
        chart
            .rotation_events
            .iter()
            .map(|e| format!("cd {} {} {}", e.line, e.time, e.rotation)),
    ));
    sections.push(block(
        chart
            .alpha_events
            .iter()
            .map(|e| format!("ca {} {} {}", e.line, e.time, e.alpha)),
    ));
    sections.push(block(chart.move_events.iter().map(|e| {
        format!(
            "cm {} {} {} {} {} {}",
            e.line, e.start_time, e.end_time, e.x, e.y, e.easing
        )
    })));
    sections.push(block(chart.rotate_events.iter().map(|e| {
        format!(
            "cr {} {} {} {} {}",
            e.line, e.start_time, e.end_time, e.rotation, e.easing
        )
    })));
    sections.push(block(chart.fade_events.iter().map(|e| {
        format!(
            "cf {} {} {} {}",
            e.line, e.start_time, e.end_time, e.alpha
        )
    })));

    let mut output = format!("{}\n", chart.offset);
    output.push_str(&sections.join("\n"));
    output
}

fn block(lines: impl Iterator<Item = String>) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(&line);
        text.push('\n');
    }
    text
}
