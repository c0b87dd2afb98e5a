use std::io::Read;

use crate::models::chart::{ChartDocument, ValidatedChart};
use crate::utils::chart_normalizer::normalize;
use crate::utils::error::ParseError;
use crate::utils::pec_parser::parse_pec;
use crate::utils::rpe_parser::parse_rpe;

/// 识别并解析谱面：先尝试 RPE，再尝试 PEC，两者都不成立时失败。
/// 返回的谱面已经规范化。
pub fn validate(raw: &str) -> Result<ValidatedChart, ParseError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let document = if let Some(chart) = parse_rpe(text)? {
        ChartDocument::Rpe(chart)
    } else if let Some(chart) = parse_pec(text) {
        ChartDocument::Pec(chart)
    } else {
        log::info!("谱面格式无法识别 ({} 字节)", raw.len());
        return Err(ParseError::UnsupportedFormat);
    };

    let document = normalize(document);
    let format = document.format();
    let note_count = document.note_count();
    log::info!("谱面校验通过: 格式 {format}, 音符数 {note_count}");

    Ok(ValidatedChart {
        format,
        document,
        note_count,
    })
}

/// 非 UTF-8 内容不可能是任何一种格式
pub fn validate_bytes(bytes: &[u8]) -> Result<ValidatedChart, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        log::debug!("谱面不是有效的 UTF-8: {e}");
        ParseError::UnsupportedFormat
    })?;
    validate(text)
}

pub fn validate_reader<R: Read>(mut reader: R) -> Result<ValidatedChart, ParseError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    validate_bytes(&bytes)
}
