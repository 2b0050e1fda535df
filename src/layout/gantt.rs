use super::*;
use crate::ir::{GanttChart, GanttStatus, GanttTask};
use crate::theme::LevelColor;
use chrono::{Duration, NaiveDate};
use std::fmt::Write as _;

/// Visible date range: one day before the earliest start through two days
/// after the latest end.
pub fn gantt_date_range(chart: &GanttChart) -> Option<(NaiveDate, NaiveDate)> {
    let start = chart.tasks().map(|t| t.start).min()?;
    let end = chart.tasks().map(|t| t.end).max()?;
    Some((start - Duration::days(1), end + Duration::days(2)))
}

fn tick_label(date: NaiveDate, format: &str) -> String {
    let mut label = String::new();
    if write!(label, "{}", date.format(format)).is_err() {
        warn!(format = format; "invalid tick label format, using %m/%d");
        return date.format("%m/%d").to_string();
    }
    label
}

fn task_colors<'a>(task: &GanttTask, theme: &'a Theme) -> (&'a str, &'a str) {
    let pick = |color: &'a LevelColor| (color.fill.as_str(), color.stroke.as_str());
    if task.status.contains(&GanttStatus::Milestone) {
        return pick(&theme.gantt_milestone);
    }
    if task.status.contains(&GanttStatus::Crit) {
        pick(&theme.gantt_crit)
    } else if task.status.contains(&GanttStatus::Active) {
        pick(&theme.gantt_active)
    } else if task.status.contains(&GanttStatus::Done) {
        pick(&theme.gantt_done)
    } else {
        (theme.gantt_bar_fill.as_str(), theme.gantt_bar_border.as_str())
    }
}

pub(super) fn compute_gantt_layout(chart: &GanttChart, theme: &Theme, config: &LayoutConfig) -> Layout {
    let gantt = &config.gantt;
    let mut builder = LayoutBuilder::new(DiagramKind::Gantt);
    let Some((range_start, range_end)) = gantt_date_range(chart) else {
        return builder.finish();
    };
    let total_days = (range_end - range_start).num_days();
    let total_width = gantt.section_width + total_days as f32 * gantt.day_width;
    let day_x = |date: NaiveDate| {
        gantt.section_width + (date - range_start).num_days() as f32 * gantt.day_width
    };

    let row_count: usize = chart.sections.iter().map(|s| s.tasks.len()).sum();
    let chart_bottom = gantt.header_height + row_count as f32 * gantt.row_height;

    let title_id = builder.ids.next("title");
    builder.add_vertex(
        1,
        VertexCell::new(
            title_id,
            chart.title.as_str(),
            text_style(theme).set("fontStyle", 1).set("fontSize", 16),
            Bounds::new(0.0, 0.0, total_width, gantt.title_height),
        ),
    );

    let tick_line = Style::parse("html=1;").set("strokeColor", &theme.gantt_bar_border);
    let tick_text = text_style(theme)
        .set("fontSize", 10)
        .set("fontColor", &theme.muted_line_color);
    for day in 0..=total_days {
        let x = gantt.section_width + day as f32 * gantt.day_width;
        let id = builder.ids.next("tick");
        builder.add_edge(
            0,
            plain_line(
                id,
                tick_line.clone(),
                Point::new(x, gantt.title_height),
                Point::new(x, chart_bottom),
            ),
        );
        let date = range_start + Duration::days(day);
        let label_id = builder.ids.next("tick_label");
        builder.add_vertex(
            1,
            VertexCell::new(
                label_id,
                tick_label(date, &gantt.tick_label_format),
                tick_text.clone(),
                Bounds::new(x, gantt.title_height, gantt.day_width, gantt.title_height),
            ),
        );
    }

    let section_style = Style::parse(
        "shape=partialRectangle;whiteSpace=wrap;html=1;left=0;right=0;fillColor=none;top=0;bottom=0;align=left;spacingLeft=10;fontStyle=1;fontSize=14;",
    );
    let grid_style = Style::parse("html=1;dashed=1;").set("strokeColor", &theme.grid_line_color);
    let bar_style = Style::parse("rounded=1;whiteSpace=wrap;html=1;align=center;verticalAlign=middle;")
        .set("fontColor", &theme.primary_text_color);
    let bar_height = gantt.row_height - 2.0 * gantt.bar_inset;

    let mut section_top = gantt.header_height;
    for section in &chart.sections {
        let height = section.tasks.len() as f32 * gantt.row_height;
        let section_id = builder.ids.next("section");
        builder.add_vertex(
            1,
            VertexCell::new(
                section_id,
                section.name.as_str(),
                section_style.clone(),
                Bounds::new(0.0, section_top, gantt.section_width, height),
            ),
        );
        let id = builder.ids.next("grid");
        builder.add_edge(
            0,
            plain_line(
                id,
                grid_style.clone(),
                Point::new(gantt.section_width, section_top + height),
                Point::new(total_width, section_top + height),
            ),
        );

        for (row, task) in section.tasks.iter().enumerate() {
            let (fill, stroke) = task_colors(task, theme);
            let top = section_top + row as f32 * gantt.row_height + gantt.bar_inset;
            let id = match &task.id {
                Some(key) => builder.ids.claim(key),
                None => builder.ids.next("task"),
            };
            let (style, bounds) = if task.status.contains(&GanttStatus::Milestone) {
                let center = Point::new(day_x(task.start), top + bar_height / 2.0);
                (
                    bar_style.clone().set("shape", "rhombus").set("perimeter", "rhombusPerimeter"),
                    Bounds::from_center(center, bar_height, bar_height),
                )
            } else {
                (
                    bar_style.clone(),
                    Bounds::new(
                        day_x(task.start),
                        top,
                        task.duration_days() as f32 * gantt.day_width,
                        bar_height,
                    ),
                )
            };
            builder.add_vertex(
                2,
                VertexCell::new(
                    id,
                    task.name.as_str(),
                    style.set("fillColor", fill).set("strokeColor", stroke),
                    bounds,
                ),
            );
        }
        section_top += height;
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_mermaid;

    const SOURCE: &str = "gantt
    title Release
    dateFormat YYYY-MM-DD
    section Build
    Design :done, des, 2024-01-02, 3d
    Code :active, code, after des, 1w
    section Ship
    Launch :milestone, 2024-01-16, 0d
    Review :crit, 2024-01-12, 2024-01-14
";

    fn chart() -> GanttChart {
        match parse_mermaid(SOURCE, None).unwrap().diagram {
            Diagram::Gantt(chart) => chart,
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn range_pads_one_day_before_and_two_after() {
        let (start, end) = gantt_date_range(&chart()).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 18).unwrap());
    }

    #[test]
    fn bars_scale_by_day_and_stack_by_declaration() {
        let layout = compute_gantt_layout(&chart(), &Theme::default(), &LayoutConfig::default());
        let design = layout.vertex("des").unwrap();
        assert_eq!(design.bounds, Bounds::new(140.0, 65.0, 120.0, 30.0));
        assert_eq!(design.style.get("fillColor"), Some("#f5f5f5"));

        let code = layout.vertex("code").unwrap();
        assert_eq!(code.bounds.x, 260.0);
        assert_eq!(code.bounds.width, 280.0);
        assert!(code.bounds.y > design.bounds.y);

        let review = layout.vertices().find(|v| v.value == "Review").unwrap();
        assert_eq!(review.style.get("strokeColor"), Some("#b85450"));
        let launch = layout.vertices().find(|v| v.value == "Launch").unwrap();
        assert!(launch.bounds.y < review.bounds.y);
        assert_eq!(launch.style.get("shape"), Some("rhombus"));
        assert_eq!(launch.bounds.center().x, 100.0 + 15.0 * 40.0);
    }

    #[test]
    fn one_tick_per_day_across_the_range() {
        let layout = compute_gantt_layout(&chart(), &Theme::default(), &LayoutConfig::default());
        let labels: Vec<&str> = layout
            .vertices()
            .filter(|v| v.id.starts_with("tick_label"))
            .map(|v| v.value.as_str())
            .collect();
        assert_eq!(labels.len(), 18);
        assert_eq!(labels.first(), Some(&"01/01"));
        assert_eq!(labels.last(), Some(&"01/18"));
        assert_eq!(layout.vertex("title_0").unwrap().bounds.width, 100.0 + 17.0 * 40.0);
    }

    #[test]
    fn ticks_cross_year_end_and_leap_day() {
        let source = "gantt\ndateFormat YYYY-MM-DD\nsection Winter\nFreeze :f1, 2023-12-20, 2024-03-05\n";
        let chart = match parse_mermaid(source, None).unwrap().diagram {
            Diagram::Gantt(chart) => chart,
            other => panic!("unexpected {:?}", other.kind()),
        };
        let (start, end) = gantt_date_range(&chart).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 12, 19).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());

        let layout = compute_gantt_layout(&chart, &Theme::default(), &LayoutConfig::default());
        let labels: Vec<&str> = layout
            .vertices()
            .filter(|v| v.id.starts_with("tick_label"))
            .map(|v| v.value.as_str())
            .collect();
        assert_eq!(labels.len() as i64, (end - start).num_days() + 1);
        assert_eq!(labels.len(), 80);
        assert_eq!(labels.first(), Some(&"12/19"));
        assert_eq!(labels.last(), Some(&"03/07"));
        assert!(labels.contains(&"02/29"));
        assert!(labels.contains(&"01/01"));
    }
}
