use super::*;
use crate::ir::Timeline;

pub(super) fn compute_timeline_layout(
    timeline: &Timeline,
    theme: &Theme,
    config: &LayoutConfig,
) -> Layout {
    let cfg = &config.timeline;
    let mut builder = LayoutBuilder::new(DiagramKind::Timeline);

    if !timeline.title.is_empty() {
        let id = builder.ids.next("title");
        builder.add_vertex(
            1,
            VertexCell::new(
                id,
                timeline.title.as_str(),
                Style::parse("text;fontSize=24;fontStyle=1;align=center;"),
                Bounds::new(cfg.start_x, 50.0, 400.0, 50.0),
            ),
        );
    }

    let period_x = |index: usize| cfg.start_x + index as f32 * cfg.spacing;

    for (section_index, name) in timeline.sections.iter().enumerate() {
        let mut spanned = timeline
            .periods
            .iter()
            .enumerate()
            .filter(|(_, p)| p.section == Some(section_index))
            .map(|(i, _)| period_x(i));
        let Some(first) = spanned.next() else {
            continue;
        };
        let last = spanned.last().unwrap_or(first);
        let id = builder.ids.next("section");
        builder.add_vertex(
            0,
            VertexCell::new(
                id,
                name.as_str(),
                text_style(theme).set("fontStyle", 1).set("fontSize", 16),
                Bounds::new(
                    first - cfg.event_width / 2.0,
                    cfg.section_label_y,
                    last - first + cfg.event_width,
                    30.0,
                ),
            ),
        );
    }

    let axis_style = Style::parse("endArrow=none;html=1;strokeWidth=3;")
        .set("strokeColor", &theme.line_color);
    let dot_style = Style::parse("ellipse;whiteSpace=wrap;html=1;aspect=fixed;")
        .set("fillColor", &theme.timeline_dot)
        .set("strokeColor", &theme.timeline_dot);
    let label_style = Style::parse("text;html=1;align=center;verticalAlign=middle;fontStyle=1;fontSize=14;");
    let event_style = Style::parse("rounded=1;whiteSpace=wrap;html=1;shadow=1;fontStyle=0;")
        .set("fillColor", &theme.primary_color)
        .set("strokeColor", &theme.timeline_event_stroke);
    let connector_style = Style::parse("endArrow=none;html=1;dashed=1;entryX=0.5;")
        .set("strokeColor", &theme.muted_line_color);

    let mut previous_dot: Option<String> = None;
    for (index, period) in timeline.periods.iter().enumerate() {
        let x = period_x(index);
        let above = index % 2 == 0;

        let dot_id = builder.ids.next("dot");
        builder.add_vertex(
            1,
            VertexCell::new(
                dot_id.clone(),
                "",
                dot_style.clone(),
                Bounds::from_center(Point::new(x, cfg.axis_y), cfg.dot_size, cfg.dot_size),
            ),
        );
        if let Some(previous) = previous_dot.replace(dot_id.clone()) {
            let id = builder.ids.next("axis");
            builder.add_edge(
                0,
                EdgeCell::new(id, "", axis_style.clone()).connect(&previous, &dot_id),
            );
        }

        let label_y = if above { cfg.axis_y + 15.0 } else { cfg.axis_y - 35.0 };
        let label_id = builder.ids.next("period");
        builder.add_vertex(
            1,
            VertexCell::new(
                label_id,
                period.period.as_str(),
                label_style.clone(),
                Bounds::new(x - 30.0, label_y, 60.0, 20.0),
            ),
        );

        // Events stack away from the axis; each hangs off the one before it.
        let mut anchor = dot_id;
        for (stack, event) in period.events.iter().enumerate() {
            let offset = cfg.event_offset + stack as f32 * cfg.stack_gap;
            let y = if above {
                cfg.axis_y - offset
            } else {
                cfg.axis_y + offset
            };
            let event_id = builder.ids.next("event");
            builder.add_vertex(
                2,
                VertexCell::new(
                    event_id.clone(),
                    event.as_str(),
                    event_style.clone(),
                    Bounds::new(x - cfg.event_width / 2.0, y, cfg.event_width, cfg.event_height),
                ),
            );

            let style = match (stack, above) {
                (0, true) => connector_style.clone().set("entryY", 1),
                (0, false) => connector_style.clone().set("entryY", 0),
                (_, true) => connector_style
                    .clone()
                    .set("exitX", 0.5)
                    .set("exitY", 0)
                    .set("entryY", 1),
                (_, false) => connector_style
                    .clone()
                    .set("exitX", 0.5)
                    .set("exitY", 1)
                    .set("entryY", 0),
            };
            let id = builder.ids.next("connector");
            builder.add_edge(0, EdgeCell::new(id, "", style).connect(&anchor, &event_id));
            anchor = event_id;
        }
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TimelinePeriod;

    fn period(name: &str, events: &[&str], section: Option<usize>) -> TimelinePeriod {
        TimelinePeriod {
            period: name.to_string(),
            events: events.iter().map(|e| e.to_string()).collect(),
            section,
        }
    }

    fn sample() -> Timeline {
        Timeline {
            title: "History".to_string(),
            sections: vec!["Early".to_string()],
            periods: vec![
                period("2001", &["a", "b"], Some(0)),
                period("2002", &["c"], Some(0)),
                period("2003", &[], None),
            ],
        }
    }

    #[test]
    fn periods_alternate_above_and_below_the_axis() {
        let layout = compute_timeline_layout(&sample(), &Theme::default(), &LayoutConfig::default());
        let first = layout.vertex("event_0").unwrap().bounds;
        let stacked = layout.vertex("event_1").unwrap().bounds;
        let below = layout.vertex("event_2").unwrap().bounds;
        assert_eq!(first, Bounds::new(40.0, 200.0, 120.0, 50.0));
        assert_eq!(stacked.y, 140.0);
        assert_eq!(below, Bounds::new(240.0, 400.0, 120.0, 50.0));
        assert_eq!(layout.vertex("dot_2").unwrap().bounds.x, 495.0);
    }

    #[test]
    fn connectors_chain_from_the_dot_through_the_stack() {
        let layout = compute_timeline_layout(&sample(), &Theme::default(), &LayoutConfig::default());
        let first = layout.edge("connector_0").unwrap();
        assert_eq!(first.source.as_deref(), Some("dot_0"));
        assert_eq!(first.style.get("entryY"), Some("1"));
        assert!(!first.style.has("exitY"));
        let second = layout.edge("connector_1").unwrap();
        assert_eq!(second.source.as_deref(), Some("event_0"));
        assert_eq!(second.style.get("exitY"), Some("0"));
        let below = layout.edge("connector_2").unwrap();
        assert_eq!(below.style.get("entryY"), Some("0"));

        let axis: Vec<_> = layout.edges().filter(|e| e.id.starts_with("axis")).collect();
        assert_eq!(axis.len(), 2);
        assert_eq!(axis[1].target.as_deref(), Some("dot_2"));
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn section_label_spans_its_periods() {
        let layout = compute_timeline_layout(&sample(), &Theme::default(), &LayoutConfig::default());
        let section = layout.vertex("section_0").unwrap();
        assert_eq!(section.bounds, Bounds::new(40.0, 110.0, 320.0, 30.0));
    }
}
