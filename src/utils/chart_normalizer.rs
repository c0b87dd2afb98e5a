use std::cmp::Ordering;

use crate::models::chart::{Beat, ChartDocument};
use crate::models::pec::PecChart;
use crate::models::rpe::{RpeChart, RpeEvent};

/// 规范化：所有按时间排列的列表稳定排序，并重算非 Fake 音符数
pub fn normalize(document: ChartDocument) -> ChartDocument {
    match document {
        ChartDocument::Rpe(mut chart) => {
            normalize_rpe(&mut chart);
            ChartDocument::Rpe(chart)
        }
        ChartDocument::Pec(mut chart) => {
            normalize_pec(&mut chart);
            ChartDocument::Pec(chart)
        }
    }
}

fn by_beat(a: &Beat, b: &Beat) -> Ordering {
    a.cmp_value(b)
}

fn sort_events<T>(events: &mut [RpeEvent<T>]) {
    events.sort_by(|a, b| by_beat(&a.start_time, &b.start_time));
}

pub fn normalize_rpe(chart: &mut RpeChart) {
    chart
        .bpm_list
        .sort_by(|a, b| by_beat(&a.start_time, &b.start_time));

    for line in chart.judge_line_list.iter_mut() {
        for note in line.notes.iter_mut().filter(|note| !note.is_hold()) {
            note.end_time = note.start_time;
        }
        line.notes
            .sort_by(|a, b| by_beat(&a.start_time, &b.start_time));
        line.num_of_notes = line.notes.iter().filter(|note| !note.is_fake()).count();

        for layer in line.event_layers.iter_mut() {
            for events in layer.lists_mut() {
                sort_events(events);
            }
        }

        if let Some(extended) = line.extended.as_mut() {
            for events in extended.numeric_lists_mut() {
                sort_events(events);
            }
            sort_events(&mut extended.color_events);
            sort_events(&mut extended.text_events);
        }
    }
}

pub fn normalize_pec(chart: &mut PecChart) {
    chart.bpm_list.sort_by(|a, b| a.time.total_cmp(&b.time));
    chart
        .notes
        .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    chart
        .speed_events
        .sort_by(|a, b| a.time.total_cmp(&b.time));
    chart
        .position_events
        .sort_by(|a, b| a.time.total_cmp(&b.time));
    chart
        .rotation_events
        .sort_by(|a, b| a.time.total_cmp(&b.time));
    chart
        .alpha_events
        .sort_by(|a, b| a.time.total_cmp(&b.time));
    chart
        .move_events
        .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    chart
        .rotate_events
        .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    chart
        .fade_events
        .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
}

fn is_sorted_by_key<T>(items: &[T], key: impl Fn(&T) -> f64) -> bool {
    items.windows(2).all(|pair| key(&pair[0]) <= key(&pair[1]))
}

fn events_sorted<T>(events: &[RpeEvent<T>]) -> bool {
    is_sorted_by_key(events, |event| event.start_time.value())
}

/// 所有时间列表是否都已非递减
pub fn is_normalized(document: &ChartDocument) -> bool {
    match document {
        ChartDocument::Rpe(chart) => {
            is_sorted_by_key(&chart.bpm_list, |bpm| bpm.start_time.value())
                && chart.judge_line_list.iter().all(|line| {
                    is_sorted_by_key(&line.notes, |note| note.start_time.value())
                        && line
                            .event_layers
                            .iter()
                            .all(|layer| layer.lists().into_iter().all(|list| events_sorted(list)))
                        && line.extended.as_ref().map_or(true, |extended| {
                            extended
                                .numeric_lists()
                                .into_iter()
                                .all(|list| events_sorted(list))
                                && events_sorted(&extended.color_events)
                                && events_sorted(&extended.text_events)
                        })
                })
        }
        ChartDocument::Pec(chart) => {
            is_sorted_by_key(&chart.bpm_list, |bpm| bpm.time)
                && is_sorted_by_key(&chart.notes, |note| note.start_time)
                && is_sorted_by_key(&chart.speed_events, |event| event.time)
                && is_sorted_by_key(&chart.position_events, |event| event.time)
                && is_sorted_by_key(&chart.rotation_events, |event| event.time)
                && is_sorted_by_key(&chart.alpha_events, |event| event.time)
                && is_sorted_by_key(&chart.move_events, |event| event.start_time)
                && is_sorted_by_key(&chart.rotate_events, |event| event.start_time)
                && is_sorted_by_key(&chart.fade_events, |event| event.start_time)
        }
    }
}
