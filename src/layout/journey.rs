use super::*;
use crate::ir::Journey;

fn actor_icon(actor: &str) -> &'static str {
    let lower = actor.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if has(&["feeling", "emotion"]) {
        "💭"
    } else if has(&["system", "touchpoint", "app", "interface"]) {
        "⚙️"
    } else if has(&["action", "user"]) {
        "👱"
    } else {
        "📌"
    }
}

pub(super) fn compute_journey_layout(journey: &Journey, theme: &Theme, config: &LayoutConfig) -> Layout {
    let cfg = &config.journey;
    let mut builder = LayoutBuilder::new(DiagramKind::Journey);
    let lane_pitch = cfg.lane_width + cfg.lane_gap;
    let node_pitch = cfg.node_height + cfg.vertical_gap;
    let lane_x = |index: usize| cfg.start_x + index as f32 * lane_pitch;

    if let Some(title) = journey.title.as_deref().filter(|t| !t.is_empty()) {
        let id = builder.ids.next("title");
        builder.add_vertex(
            2,
            VertexCell::new(
                id,
                title,
                text_style(theme).set("fontSize", 20).set("fontStyle", 1).set("align", "left"),
                Bounds::new(cfg.start_x, 0.0, lane_pitch * journey.actors.len().max(1) as f32, 30.0),
            ),
        );
    }

    let node_style = Style::parse("rounded=0;whiteSpace=wrap;html=1;strokeWidth=2;")
        .set("fontFamily", &theme.font_family)
        .set("fontSize", theme.font_size)
        .set("strokeColor", &theme.primary_border_color);
    let edge_style = Style::parse(
        "edgeStyle=orthogonalEdgeStyle;rounded=0;orthogonalLoop=1;jettySize=auto;html=1;strokeWidth=1;endArrow=classic;endFill=1;",
    )
    .set("strokeColor", &theme.primary_border_color);
    let phase_style = text_style(theme)
        .set("fontStyle", 1)
        .set("fontSize", 14)
        .set("align", "left");

    let mut previous: Vec<Option<String>> = vec![None; journey.actors.len()];
    let mut current_y = cfg.start_y + cfg.padding_top;
    let mut drawn_phase = false;
    for section in &journey.sections {
        if section.tasks.is_empty() {
            continue;
        }
        let mut tallest = 0usize;
        for (lane, actor) in journey.actors.iter().enumerate() {
            let tasks = section.tasks.iter().filter(|t| t.actors.contains(actor));
            let mut count = 0usize;
            for task in tasks {
                let bounds = Bounds::new(
                    lane_x(lane) + (cfg.lane_width - cfg.node_width) / 2.0,
                    current_y + count as f32 * node_pitch,
                    cfg.node_width,
                    cfg.node_height,
                );
                let id = builder.ids.next("task");
                builder.add_vertex(
                    2,
                    VertexCell::new(
                        id.clone(),
                        task.name.as_str(),
                        node_style
                            .clone()
                            .set("fillColor", theme.journey_score_color(task.score)),
                        bounds,
                    ),
                );
                // Consecutive tasks of one actor chain across phase boundaries.
                if let Some(from) = previous[lane].replace(id.clone()) {
                    let edge_id = builder.ids.next("edge");
                    builder.add_edge(1, EdgeCell::new(edge_id, "", edge_style.clone()).connect(&from, &id));
                }
                count += 1;
            }
            tallest = tallest.max(count);
        }
        if tallest == 0 {
            warn!(section = section.name.as_str(); "journey section has no actor tasks, skipping");
            continue;
        }

        let span = tallest as f32 * cfg.node_height + (tallest - 1) as f32 * cfg.vertical_gap;
        let id = builder.ids.next("phase");
        builder.add_vertex(
            2,
            VertexCell::new(
                id,
                section.name.as_str(),
                phase_style.clone(),
                Bounds::new(
                    lane_x(journey.actors.len()),
                    current_y,
                    cfg.phase_label_width,
                    span,
                ),
            ),
        );
        current_y += span + cfg.phase_gap;
        drawn_phase = true;
    }

    let content_bottom = if drawn_phase {
        current_y - cfg.phase_gap
    } else {
        cfg.start_y + cfg.lane_header_height
    };
    let lane_height = content_bottom - cfg.start_y + cfg.vertical_gap;
    let lane_style = Style::parse(
        "swimlane;fontStyle=0;childLayout=stackLayout;horizontal=1;horizontalStack=0;resizeParent=1;resizeParentMax=0;resizeLast=0;collapsible=1;marginBottom=0;whiteSpace=wrap;html=1;rounded=0;shadow=0;comic=0;labelBackgroundColor=none;strokeWidth=2;fontSize=14;align=center;",
    )
    .set("startSize", cfg.lane_header_height)
    .set("fontFamily", &theme.font_family)
    .set("fillColor", &theme.primary_color)
    .set("strokeColor", &theme.primary_border_color);
    for (lane, actor) in journey.actors.iter().enumerate() {
        let id = builder.ids.next("lane");
        builder.add_vertex(
            0,
            VertexCell::new(
                id,
                format!("{} {actor}", actor_icon(actor)),
                lane_style.clone(),
                Bounds::new(lane_x(lane), cfg.start_y, cfg.lane_width, lane_height),
            ),
        );
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_mermaid;

    const SOURCE: &str = "journey
    title My working day
    section Go to work
      Make tea: 5: Me
      Go upstairs: 3: Me, Cat
      Do work: 1: Me
    section Go home
      Go downstairs: 4: Me, Cat
";

    fn layout() -> Layout {
        let parsed = parse_mermaid(SOURCE, None).unwrap();
        crate::layout::compute_layout(&parsed.diagram, &Theme::default(), &LayoutConfig::default())
    }

    #[test]
    fn phases_advance_by_their_tallest_lane() {
        let layout = layout();
        let tea = layout.vertices().find(|v| v.value == "Make tea").unwrap();
        assert_eq!(tea.bounds, Bounds::new(100.0, 120.0, 160.0, 60.0));
        assert_eq!(tea.style.get("fillColor"), Some("#d5e8d4"));
        let downstairs: Vec<Bounds> = layout
            .vertices()
            .filter(|v| v.value == "Go downstairs")
            .map(|v| v.bounds)
            .collect();
        // Phase one holds three tasks for Me: 3 * 60 + 2 * 40 + 80.
        assert_eq!(downstairs[0].y, 120.0 + 340.0);
        assert_eq!(downstairs[1].x, 400.0);
        let phase = layout.vertex("phase_1").unwrap();
        assert_eq!((phase.value.as_str(), phase.bounds.x), ("Go home", 640.0));
    }

    #[test]
    fn actors_chain_across_phases() {
        let layout = layout();
        let targets: Vec<&str> = layout
            .edges()
            .map(|e| layout.vertex(e.target.as_deref().unwrap()).unwrap().value.as_str())
            .collect();
        assert_eq!(targets, ["Go upstairs", "Do work", "Go downstairs", "Go downstairs"]);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn lanes_cover_every_phase() {
        let layout = layout();
        let lane = layout.vertex("lane_0").unwrap();
        assert_eq!(lane.value, "📌 Me");
        assert_eq!(lane.bounds.height, 460.0 + 60.0 - 40.0 + 40.0);
        assert_eq!(actor_icon("System API"), "⚙️");
        assert_eq!(actor_icon("End user"), "👱");
    }
}
