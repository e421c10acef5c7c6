use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use horay::FrameTimingEvent;
use std::collections::VecDeque;

/// Format time in microseconds to the most appropriate unit (µs, ms, or s)
fn format_time_auto(time_us: u64) -> String {
    let time_us_f = time_us as f64;

    if time_us < 1_000 {
        format!("{:.2} µs", time_us_f)
    } else if time_us < 1_000_000 {
        format!("{:.2} ms", time_us_f / 1_000.0)
    } else {
        format!("{:.2} s", time_us_f / 1_000_000.0)
    }
}

/// One plotted series of the graph.
struct Series {
    label: &'static str,
    color: Color32,
    width: f32,
    value: fn(&FrameTimingEvent) -> u64,
}

const SERIES: [Series; 4] = [
    Series {
        label: "Total",
        color: Color32::WHITE,
        width: 2.0,
        value: |t: &FrameTimingEvent| t.total_time_us,
    },
    Series {
        label: "Scan",
        color: Color32::LIGHT_BLUE,
        width: 1.5,
        value: |t: &FrameTimingEvent| t.scan_time_us(),
    },
    Series {
        label: "Decode",
        color: Color32::LIGHT_GREEN,
        width: 1.5,
        value: |t: &FrameTimingEvent| t.decode_time_us,
    },
    Series {
        label: "Post",
        color: Color32::YELLOW,
        width: 1.5,
        value: |t: &FrameTimingEvent| t.post_time_us,
    },
];

/// Draw a performance profiling widget showing frame timing history
///
/// # Arguments
/// * `ui` - The egui UI context
/// * `timing_history` - History of frame timing events
/// * `frame_budget_us` - Target frame time in microseconds
pub fn draw_profiling_widget(
    ui: &mut egui::Ui,
    timing_history: &VecDeque<FrameTimingEvent>,
    frame_budget_us: u64,
) {
    ui.collapsing("Performance Profiling", |ui| {
        let Some(latest) = timing_history.back() else {
            ui.label("No timing data available yet...");
            return;
        };

        let utilization =
            (latest.total_time_us as f32 / frame_budget_us as f32 * 100.0).min(999.0);

        ui.heading(format!("Frame {}", latest.frame_index));
        ui.label(format!(
            "Total: {} ({:.1}%)",
            format_time_auto(latest.total_time_us),
            utilization
        ));
        ui.label(format!(
            "Plane / Cull / Shade: {} / {} / {}",
            format_time_auto(latest.plane_time_us),
            format_time_auto(latest.cull_time_us),
            format_time_auto(latest.shade_time_us)
        ));
        ui.label(format!("Decode: {}", format_time_auto(latest.decode_time_us)));
        ui.label(format!("Post: {}", format_time_auto(latest.post_time_us)));
        ui.label(format!(
            "Candidates: {}, echoes: {}",
            latest.candidates, latest.echoes
        ));
        ui.label(format!("Budget: {}", format_time_auto(frame_budget_us)));

        if utilization > 90.0 {
            ui.colored_label(Color32::RED, "⚠ WARNING: Over frame budget!");
        } else if utilization > 70.0 {
            ui.colored_label(Color32::YELLOW, "⚠ Caution: Close to frame budget");
        }

        ui.add_space(10.0);

        let graph_height = 200.0;
        let (response, painter) = ui.allocate_painter(
            Vec2::new(ui.available_width(), graph_height),
            egui::Sense::hover(),
        );
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, Color32::from_gray(20));

        if timing_history.len() < 2 {
            return;
        }

        let max_y_value = timing_history
            .iter()
            .map(|t| t.total_time_us as f32)
            .fold(frame_budget_us as f32 * 1.2, f32::max);

        // Budget line
        let budget_y = rect.max.y - (frame_budget_us as f32 / max_y_value) * rect.height();
        painter.line_segment(
            [
                Pos2::new(rect.min.x, budget_y),
                Pos2::new(rect.max.x, budget_y),
            ],
            Stroke::new(2.0, Color32::RED),
        );
        painter.text(
            Pos2::new(rect.max.x - 5.0, budget_y - 5.0),
            egui::Align2::RIGHT_BOTTOM,
            format_time_auto(frame_budget_us),
            egui::FontId::proportional(10.0),
            Color32::RED,
        );

        for series in &SERIES {
            draw_series(&painter, rect, timing_history, max_y_value, series);
        }

        // Legend
        let legend = Pos2::new(rect.min.x + 10.0, rect.min.y + 10.0);
        for (i, series) in SERIES.iter().enumerate() {
            let y = legend.y + i as f32 * 15.0;
            painter.line_segment(
                [Pos2::new(legend.x, y), Pos2::new(legend.x + 20.0, y)],
                Stroke::new(series.width, series.color),
            );
            painter.text(
                Pos2::new(legend.x + 25.0, y),
                egui::Align2::LEFT_CENTER,
                series.label,
                egui::FontId::proportional(10.0),
                series.color,
            );
        }

        // Y-axis labels (ms)
        let num_y_labels = 5;
        for i in 0..=num_y_labels {
            let value = (max_y_value / 1000.0) * (i as f32 / num_y_labels as f32);
            let y = rect.max.y - (i as f32 / num_y_labels as f32) * rect.height();
            painter.text(
                Pos2::new(rect.min.x + 2.0, y),
                egui::Align2::LEFT_CENTER,
                format!("{:.1}", value),
                egui::FontId::proportional(9.0),
                Color32::GRAY,
            );
        }
    });
}

fn draw_series(
    painter: &egui::Painter,
    rect: Rect,
    timing_history: &VecDeque<FrameTimingEvent>,
    max_y_value: f32,
    series: &Series,
) {
    let x_step = rect.width() / (timing_history.len() - 1) as f32;
    let points: Vec<Pos2> = timing_history
        .iter()
        .enumerate()
        .map(|(i, timing)| {
            let x = rect.min.x + i as f32 * x_step;
            let y = rect.max.y - ((series.value)(timing) as f32 / max_y_value) * rect.height();
            Pos2::new(x, y)
        })
        .collect();

    for window in points.windows(2) {
        painter.line_segment(
            [window[0], window[1]],
            Stroke::new(series.width, series.color),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_auto() {
        assert_eq!(format_time_auto(250), "250.00 µs");
        assert_eq!(format_time_auto(16_600), "16.60 ms");
        assert_eq!(format_time_auto(2_500_000), "2.50 s");
    }
}
