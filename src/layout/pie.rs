use super::*;
use crate::ir::PieChart;
use std::f64::consts::{FRAC_PI_2, TAU};

/// Start and end of each slice as fractions of a full turn, in declaration
/// order. The last slice always ends at exactly 1.0.
pub(crate) fn slice_fractions(chart: &PieChart) -> Vec<(f64, f64)> {
    let total = chart.total();
    if total <= 0.0 {
        return Vec::new();
    }
    let mut cursor = 0.0;
    let mut fractions: Vec<(f64, f64)> = chart
        .slices
        .iter()
        .map(|slice| {
            let start = cursor;
            cursor += slice.value / total;
            (start, cursor)
        })
        .collect();
    if let Some(last) = fractions.last_mut() {
        last.1 = 1.0;
    }
    fractions
}

pub(super) fn compute_pie_layout(chart: &PieChart, theme: &Theme, config: &LayoutConfig) -> Layout {
    let pie = &config.pie;
    let mut builder = LayoutBuilder::new(DiagramKind::Pie);

    if !chart.title.is_empty() {
        let id = builder.ids.next("title");
        builder.add_vertex(
            1,
            VertexCell::new(
                id,
                chart.title.as_str(),
                text_style(theme).set("fontSize", 20).set("fontStyle", 1),
                Bounds::new(0.0, 0.0, pie.title_width, pie.title_height),
            ),
        );
    }

    let total = chart.total();
    let label_radius = f64::from(pie.chart_size) / 2.0 * f64::from(pie.label_radius_ratio);
    let legend_text = Style::parse(
        "text;html=1;strokeColor=none;fillColor=none;align=left;verticalAlign=middle;whiteSpace=wrap;rounded=0;",
    )
    .set("fontSize", theme.font_size)
    .set("fontFamily", &theme.font_family);

    for (index, (slice, (start, end))) in chart.slices.iter().zip(slice_fractions(chart)).enumerate() {
        let color = theme.pie_color(index);
        let percent = (slice.value / total * 100.0).round();
        let value = if chart.show_data {
            format!("{} ({percent}%)", slice.value)
        } else {
            format!("{percent}%")
        };

        // Fractions run clockwise from 12 o'clock.
        let angle = (start + end) / 2.0 * TAU - FRAC_PI_2;
        let offset = Point::new(
            (angle.cos() * label_radius).round() as f32,
            (angle.sin() * label_radius).round() as f32,
        );
        let style = Style::parse("shape=mxgraph.basic.pie;whiteSpace=wrap;html=1;")
            .set("startAngle", start)
            .set("endAngle", end)
            .set("fillColor", color)
            .set("strokeColor", "#FFFFFF")
            .set("strokeWidth", 2)
            .set("fontColor", "#ffffff")
            .set("fontSize", 10)
            .set("fontStyle", 1)
            .set("align", "center")
            .set("verticalAlign", "middle");
        let id = builder.ids.next("slice");
        builder.add_vertex(
            1,
            VertexCell::new(
                id,
                value,
                style,
                Bounds::new(0.0, pie.chart_y, pie.chart_size, pie.chart_size),
            )
            .with_label_offset(offset),
        );

        let row_y = pie.chart_y + index as f32 * pie.legend_item_height;
        let id = builder.ids.next("legend");
        builder.add_vertex(
            1,
            VertexCell::new(
                id,
                "",
                Style::parse("rounded=1;whiteSpace=wrap;html=1;strokeColor=none;").set("fillColor", color),
                Bounds::new(pie.legend_x, row_y, pie.legend_swatch, pie.legend_swatch),
            ),
        );
        let id = builder.ids.next("legend_text");
        builder.add_vertex(
            1,
            VertexCell::new(
                id,
                format!("{}: {}", slice.label, slice.value),
                legend_text.clone(),
                Bounds::new(
                    pie.legend_x + pie.legend_swatch + 10.0,
                    row_y,
                    pie.legend_text_width,
                    pie.legend_swatch,
                ),
            ),
        );
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::PieSlice;

    fn chart(values: &[f64]) -> PieChart {
        PieChart {
            title: "Pets".to_string(),
            show_data: false,
            slices: values
                .iter()
                .enumerate()
                .map(|(i, v)| PieSlice {
                    label: format!("s{i}"),
                    value: *v,
                })
                .collect(),
        }
    }

    #[test]
    fn fractions_are_contiguous_and_close_the_circle() {
        let fractions = slice_fractions(&chart(&[10.0, 20.0, 30.0, 40.0]));
        assert_eq!(fractions[0].0, 0.0);
        for pair in fractions.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
        assert_eq!(fractions.last().unwrap().1, 1.0);

        let thirds = slice_fractions(&chart(&[1.0, 1.0, 1.0]));
        assert_eq!(thirds[2].1, 1.0);
    }

    #[test]
    fn slices_carry_percentages_and_label_offsets() {
        let layout = compute_pie_layout(&chart(&[25.0, 75.0]), &Theme::default(), &LayoutConfig::default());
        let first = layout.vertex("slice_0").unwrap();
        assert_eq!(first.value, "25%");
        assert_eq!(first.style.get("startAngle"), Some("0"));
        assert_eq!(first.style.get("endAngle"), Some("0.25"));
        assert_eq!(first.style.get("fillColor"), Some("#FF6384"));
        // Mid angle 45 degrees clockwise from 12 o'clock, at 105px.
        assert_eq!(first.label_offset, Some(Point::new(74.0, -74.0)));
        assert_eq!(first.bounds, Bounds::new(0.0, 50.0, 300.0, 300.0));

        let legend = layout.vertex("legend_text_1").unwrap();
        assert_eq!(legend.value, "s1: 75");
        assert_eq!(legend.bounds.x, 380.0);
        assert_eq!(legend.bounds.y, 80.0);
    }
}
