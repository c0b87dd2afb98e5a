use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

use crate::models::pec::{
    PecAlphaEvent, PecBpm, PecChart, PecFadeEvent, PecMoveEvent, PecNote, PecNoteKind,
    PecPositionEvent, PecRotateEvent, PecRotationEvent, PecSpeedEvent,
};

lazy_static! {
    // 允许的命令前缀，其余行一律跳过
    static ref COMMAND: Regex =
        Regex::new(r"^(bp|n[1-4]|c[vpdamrf]|#|&)(?:\s|$)").expect("PEC 命令正则无效");
}

/// 修饰行（`#` 速度、`&` 大小）只能紧跟在音符之后
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    ExpectingCommand,
    ExpectingNoteModifier(usize),
}

/// 一行命令处理后的结果
enum Outcome {
    Note(usize),
    Modified,
    Command,
    Skipped,
}

struct Args<'a>(Vec<&'a str>);

impl<'a> Args<'a> {
    fn int<T: FromStr>(&self, index: usize) -> Option<T> {
        self.0.get(index)?.parse().ok()
    }

    fn float(&self, index: usize) -> Option<f64> {
        self.0
            .get(index)?
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }
}

struct PecReader {
    chart: PecChart,
    offset: Option<i32>,
    bpm_commands: usize,
    cursor: Cursor,
    skipped: usize,
}

impl PecReader {
    fn new() -> Self {
        Self {
            chart: PecChart::default(),
            offset: None,
            bpm_commands: 0,
            cursor: Cursor::ExpectingCommand,
            skipped: 0,
        }
    }

    fn feed(&mut self, line_number: usize, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if let Ok(offset) = line.parse::<i32>() {
            if self.offset.is_none() {
                self.offset = Some(offset);
            }
            self.cursor = Cursor::ExpectingCommand;
            return;
        }

        let Some(command) = COMMAND.captures(line).and_then(|c| c.get(1)) else {
            log::trace!("PEC 第 {line_number} 行无法识别，跳过: {line}");
            self.skipped += 1;
            self.cursor = Cursor::ExpectingCommand;
            return;
        };
        let command = command.as_str();
        let args = Args(line[command.len()..].split_whitespace().collect());

        match self.apply(command, &args) {
            Outcome::Note(index) => self.cursor = Cursor::ExpectingNoteModifier(index),
            Outcome::Modified => {}
            Outcome::Command => self.cursor = Cursor::ExpectingCommand,
            Outcome::Skipped => {
                log::trace!("PEC 第 {line_number} 行参数无效，跳过: {line}");
                self.skipped += 1;
                if !matches!(command, "#" | "&") {
                    self.cursor = Cursor::ExpectingCommand;
                }
            }
        }
    }

    fn apply(&mut self, command: &str, args: &Args) -> Outcome {
        let applied = match command {
            "bp" => self.bpm(args),
            "#" | "&" => return self.modifier(command, args),
            "cv" => self.speed(args),
            "cp" => self.position(args),
            "cd" => self.rotation(args),
            "ca" => self.alpha(args),
            "cm" => self.movement(args),
            "cr" => self.rotate(args),
            "cf" => self.fade(args),
            note => return self.note(note, args),
        };
        match applied {
            Some(()) => Outcome::Command,
            None => Outcome::Skipped,
        }
    }

    fn bpm(&mut self, args: &Args) -> Option<()> {
        let time = args.float(0)?;
        let bpm = args.float(1)?;
        self.chart.bpm_list.push(PecBpm { time, bpm });
        self.bpm_commands += 1;
        Some(())
    }

    fn note(&mut self, command: &str, args: &Args) -> Outcome {
        let Some(kind) = command.as_bytes().get(1).copied().and_then(PecNoteKind::from_marker) else {
            return Outcome::Skipped;
        };
        match Self::read_note(kind, args) {
            Some(note) => {
                self.chart.notes.push(note);
                Outcome::Note(self.chart.notes.len() - 1)
            }
            None => Outcome::Skipped,
        }
    }

    fn read_note(kind: PecNoteKind, args: &Args) -> Option<PecNote> {
        let line = args.int(0)?;
        let start_time = args.float(1)?;
        // Hold 多一个结束时间，后续参数整体后移一位
        let (end_time, rest) = if kind.is_durational() {
            (args.float(2)?, 3)
        } else {
            (start_time, 2)
        };
        let position_x = args.float(rest)?;
        let above = args.int(rest + 1)?;
        let is_fake = args.int::<i32>(rest + 2)? != 0;
        Some(PecNote {
            kind,
            line,
            start_time,
            end_time,
            position_x,
            above,
            is_fake,
            speed: 1.0,
            size: 1.0,
        })
    }

    fn modifier(&mut self, command: &str, args: &Args) -> Outcome {
        let Cursor::ExpectingNoteModifier(index) = self.cursor else {
            log::debug!("PEC 修饰行 `{command}` 前没有音符，丢弃");
            return Outcome::Skipped;
        };
        let (Some(value), Some(note)) = (args.float(0), self.chart.notes.get_mut(index)) else {
            return Outcome::Skipped;
        };
        if command == "#" {
            note.speed = value;
        } else {
            note.size = value;
        }
        Outcome::Modified
    }

    fn speed(&mut self, args: &Args) -> Option<()> {
        self.chart.speed_events.push(PecSpeedEvent {
            line: args.int(0)?,
            time: args.float(1)?,
            speed: args.float(2)?,
        });
        Some(())
    }

    fn position(&mut self, args: &Args) -> Option<()> {
        self.chart.position_events.push(PecPositionEvent {
            line: args.int(0)?,
            time: args.float(1)?,
            x: args.float(2)?,
            y: args.float(3)?,
        });
        Some(())
    }

    fn rotation(&mut self, args: &Args) -> Option<()> {
        self.chart.rotation_events.push(PecRotationEvent {
            line: args.int(0)?,
            time: args.float(1)?,
            rotation: args.float(2)?,
        });
        Some(())
    }

    fn alpha(&mut self, args: &Args) -> Option<()> {
        self.chart.alpha_events.push(PecAlphaEvent {
            line: args.int(0)?,
            time: args.float(1)?,
            alpha: args.float(2)?,
        });
        Some(())
    }

    fn movement(&mut self, args: &Args) -> Option<()> {
        self.chart.move_events.push(PecMoveEvent {
            line: args.int(0)?,
            start_time: args.float(1)?,
            end_time: args.float(2)?,
            x: args.float(3)?,
            y: args.float(4)?,
            easing: args.int(5)?,
        });
        Some(())
    }

    fn rotate(&mut self, args: &Args) -> Option<()> {
        self.chart.rotate_events.push(PecRotateEvent {
            line: args.int(0)?,
            start_time: args.float(1)?,
            end_time: args.float(2)?,
            rotation: args.float(3)?,
            easing: args.int(4)?,
        });
        Some(())
    }

    fn fade(&mut self, args: &Args) -> Option<()> {
        self.chart.fade_events.push(PecFadeEvent {
            line: args.int(0)?,
            start_time: args.float(1)?,
            end_time: args.float(2)?,
            alpha: args.float(3)?,
        });
        Some(())
    }

    fn finish(self) -> Option<PecChart> {
        if self.bpm_commands == 0 {
            log::debug!("不是 PEC 谱面: 没有 BPM 命令");
            return None;
        }
        log::debug!(
            "PEC 解析完成: {} 个音符, {} 个 BPM 节点, 跳过 {} 行",
            self.chart.notes.len(),
            self.bpm_commands,
            self.skipped
        );
        Some(PecChart {
            offset: self.offset.unwrap_or(0),
            ..self.chart
        })
    }
}

/// 按 PEC 逐行解析。无法识别的行被跳过，只有一个 BPM 命令都没有时才失败
pub fn parse_pec(text: &str) -> Option<PecChart> {
    let mut reader = PecReader::new();
    for (index, line) in text.lines().enumerate() {
        reader.feed(index + 1, line);
    }
    reader.finish()
}
