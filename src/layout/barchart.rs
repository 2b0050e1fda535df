use super::*;
use crate::ir::BarChart;

const VALUE_DECIMALS: i32 = 6;

/// Tick spacing for a value axis: `max * headroom / target_ticks` rounded to
/// 1, 2, 5 or 10 times a power of ten.
pub fn axis_step(max_value: f64, headroom: f64, target_ticks: f64) -> f64 {
    let raw = max_value * headroom / target_ticks;
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized < 1.5 {
        1.0
    } else if normalized < 3.0 {
        2.0
    } else if normalized < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Highest tick on the axis, the first step multiple at or above `max * headroom`.
pub fn axis_top(max_value: f64, headroom: f64, step: f64) -> f64 {
    let top = (max_value * headroom / step).ceil() * step;
    if top > 0.0 { top } else { step }
}

/// Decimal places needed to print multiples of `step` exactly.
fn step_decimals(step: f64) -> i32 {
    (-step.log10().floor()).clamp(0.0, 12.0) as i32
}

/// Rounds away accumulated float noise before printing, so `3 * 0.2` reads
/// `0.6`.
fn format_rounded(value: f64, decimals: i32) -> String {
    let scale = 10f64.powi(decimals);
    let rounded = (value * scale).round() / scale;
    if rounded == 0.0 {
        return "0".to_string();
    }
    rounded.to_string()
}

pub(super) fn compute_bar_chart_layout(
    chart: &BarChart,
    theme: &Theme,
    config: &LayoutConfig,
) -> Layout {
    let bar = &config.bar;
    let mut builder = LayoutBuilder::new(DiagramKind::Bar);

    let max_value = chart.values.iter().copied().fold(0.0_f64, f64::max);
    let step = axis_step(max_value, bar.headroom, bar.target_ticks);
    let top = axis_top(max_value, bar.headroom, step);
    let scale = f64::from(bar.chart_height) / top;

    let count = chart.values.len() as f32;
    let plot_width =
        count * bar.bar_width + (count - 1.0).max(0.0) * bar.bar_gap + 100.0;
    let origin = Point::new(bar.left_padding, bar.chart_height + bar.top_margin);
    let value_y = |value: f64| origin.y - (value * scale) as f32;

    let grid_style = Style::parse("html=1;strokeWidth=1;").set("strokeColor", &theme.grid_line_color);
    let tick_style = Style::parse("text;html=1;align=right;verticalAlign=middle;fontStyle=0;fontSize=11;");
    let ticks = (top / step).round() as usize;
    let decimals = step_decimals(step);
    for tick in 0..=ticks {
        let value = tick as f64 * step;
        let y = value_y(value);
        if tick > 0 {
            let id = builder.ids.next("grid");
            builder.add_edge(
                0,
                plain_line(
                    id,
                    grid_style.clone(),
                    Point::new(origin.x, y),
                    Point::new(origin.x + plot_width, y),
                ),
            );
        }
        let id = builder.ids.next("y_label");
        builder.add_vertex(
            1,
            VertexCell::new(
                id,
                format_rounded(value, decimals),
                tick_style.clone(),
                Bounds::new(origin.x - 40.0, y - 10.0, 30.0, 20.0),
            ),
        );
    }

    if !chart.title.is_empty() {
        let id = builder.ids.next("title");
        builder.add_vertex(
            1,
            VertexCell::new(
                id,
                chart.title.as_str(),
                Style::parse("text;fontSize=24;fontStyle=1;align=center;"),
                Bounds::new(origin.x, 20.0, plot_width, 40.0),
            ),
        );
    }

    let axis_style = Style::parse("endArrow=classic;html=1;strokeWidth=2;").set("strokeColor", &theme.line_color);
    let id = builder.ids.next("axis");
    builder.add_edge(
        1,
        EdgeCell::new(id, "", axis_style.clone()).with_terminal_points(
            origin,
            Point::new(origin.x, origin.y - bar.chart_height - 30.0),
        ),
    );
    let id = builder.ids.next("axis");
    builder.add_edge(
        1,
        EdgeCell::new(id, "", axis_style)
            .with_terminal_points(origin, Point::new(origin.x + plot_width, origin.y)),
    );

    if let Some(y_title) = &chart.y_title {
        let id = builder.ids.next("y_title");
        builder.add_vertex(
            1,
            VertexCell::new(
                id,
                y_title.as_str(),
                Style::parse("text;html=1;align=center;verticalAlign=middle;rotation=-90;fontStyle=1;"),
                Bounds::new(10.0, origin.y - bar.chart_height / 2.0, 40.0, 40.0),
            ),
        );
    }

    let bar_style = Style::parse("rounded=0;whiteSpace=wrap;html=1;")
        .set("fillColor", &theme.bar_fill)
        .set("strokeColor", &theme.bar_stroke);
    let value_style = Style::parse("text;html=1;align=center;verticalAlign=middle;fontStyle=1;");
    let category_style = Style::parse("text;html=1;align=center;verticalAlign=top;fontStyle=0;");
    for (index, &value) in chart.values.iter().enumerate() {
        let x = origin.x + 20.0 + index as f32 * (bar.bar_width + bar.bar_gap);
        let y = value_y(value);
        let id = builder.ids.next("bar");
        builder.add_vertex(
            2,
            VertexCell::new(
                id,
                "",
                bar_style.clone(),
                Bounds::new(x, y, bar.bar_width, origin.y - y),
            ),
        );
        let id = builder.ids.next("value");
        builder.add_vertex(
            3,
            VertexCell::new(
                id,
                format_rounded(value, VALUE_DECIMALS),
                value_style.clone(),
                Bounds::new(x, y - 20.0, bar.bar_width, 20.0),
            ),
        );
        let category = chart
            .categories
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("Item {}", index + 1));
        let id = builder.ids.next("category");
        builder.add_vertex(
            3,
            VertexCell::new(
                id,
                category,
                category_style.clone(),
                Bounds::new(x, origin.y + 5.0, bar.bar_width, 30.0),
            ),
        );
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_rounds_to_nice_magnitudes() {
        assert_eq!(axis_step(61.5, 1.1, 6.0), 10.0);
        assert_eq!(axis_top(61.5, 1.1, 10.0), 70.0);
        assert_eq!(axis_step(1000.0, 1.1, 6.0), 200.0);
        assert_eq!(axis_step(5.0, 1.1, 6.0), 1.0);
        assert_eq!(axis_step(30.0, 1.1, 6.0), 5.0);
        assert_eq!(axis_step(0.0, 1.1, 6.0), 1.0);
    }

    #[test]
    fn bars_scale_against_the_top_tick() {
        let chart = BarChart {
            title: "Sales".to_string(),
            categories: vec!["a".into(), "b".into()],
            y_title: Some("Units".to_string()),
            values: vec![10.0, 25.0, 61.5],
        };
        let layout = compute_bar_chart_layout(&chart, &Theme::default(), &LayoutConfig::default());

        let labels: Vec<&str> = layout
            .vertices()
            .filter(|v| v.id.starts_with("y_label"))
            .map(|v| v.value.as_str())
            .collect();
        assert_eq!(labels, ["0", "10", "20", "30", "40", "50", "60", "70"]);

        let tallest = layout.vertex("bar_2").unwrap().bounds;
        assert!((tallest.height - 61.5 * 400.0 / 70.0).abs() < 1e-3);
        assert!((tallest.bottom() - 500.0).abs() < 1e-3);
        assert_eq!(layout.vertex("bar_1").unwrap().bounds.x, 200.0);
        assert_eq!(layout.vertex("category_2").unwrap().value, "Item 3");
        assert_eq!(layout.vertex("value_2").unwrap().value, "61.5");
        // 3 * 60 + 2 * 40 + 100
        assert_eq!(layout.vertex("title_0").unwrap().bounds.width, 360.0);
    }

    #[test]
    fn fractional_steps_print_clean_labels() {
        let chart = BarChart {
            title: String::new(),
            categories: vec!["a".into(), "b".into()],
            y_title: None,
            values: vec![0.1 + 0.2, 1.0],
        };
        let layout = compute_bar_chart_layout(&chart, &Theme::default(), &LayoutConfig::default());

        let labels: Vec<&str> = layout
            .vertices()
            .filter(|v| v.id.starts_with("y_label"))
            .map(|v| v.value.as_str())
            .collect();
        assert_eq!(labels, ["0", "0.2", "0.4", "0.6", "0.8", "1", "1.2"]);
        assert_eq!(layout.vertex("value_0").unwrap().value, "0.3");
        assert_eq!(layout.vertex("value_1").unwrap().value, "1");
    }

    #[test]
    fn large_values_keep_their_digits() {
        assert_eq!(format_rounded(123_456_789.0, 0), "123456789");
        assert_eq!(format_rounded(-0.00001, 2), "0");
        assert_eq!(step_decimals(0.05), 2);
        assert_eq!(step_decimals(200.0), 0);
    }
}
