use super::*;
use crate::ir::{ArrowKind, FrameKind, NotePlacement, SequenceDiagram};
use std::collections::HashMap;

const Z_LIFELINE: i32 = 0;
const Z_FRAME: i32 = 1;
const Z_MESSAGE: i32 = 2;
const Z_NOTE: i32 = 3;

fn end_arrow(arrow: ArrowKind) -> &'static str {
    match arrow {
        ArrowKind::Open => "open",
        ArrowKind::Block | ArrowKind::Classic => "block",
        ArrowKind::Cross => "diamond",
        ArrowKind::None => "none",
    }
}

fn frame_label(kind: FrameKind, label: &str) -> String {
    match (kind, label.is_empty()) {
        (FrameKind::Loop, false) => label.to_string(),
        (_, true) => kind.keyword().to_string(),
        (_, false) => format!("{}: {label}", kind.keyword()),
    }
}

pub(super) fn compute_sequence_layout(
    diagram: &SequenceDiagram,
    theme: &Theme,
    config: &LayoutConfig,
) -> Layout {
    let seq = &config.sequence;
    let mut builder = LayoutBuilder::new(DiagramKind::Sequence);

    let left = |index: usize| seq.start_x + index as f32 * seq.participant_spacing;
    let center = |index: usize| left(index) + seq.participant_width / 2.0;
    let row_y = |row: usize| seq.first_message_y + row as f32 * seq.row_height;

    let height = seq
        .min_height
        .max(diagram.messages.len() as f32 * seq.row_height + 200.0);
    let lifeline_style = Style::parse(
        "shape=umlLifeline;perimeter=lifelinePerimeter;whiteSpace=wrap;html=1;container=1;dropTarget=0;collapsible=0;recursiveResize=0;outlineConnect=0;portConstraint=eastwest;newEdgeStyle={\"curved\":0,\"rounded\":0};",
    )
    .set("size", seq.header_size)
    .set("fillColor", &theme.primary_color)
    .set("strokeColor", &theme.primary_border_color)
    .set("fontFamily", &theme.font_family);

    let mut lifelines: HashMap<&str, (usize, String)> = HashMap::new();
    for (index, participant) in diagram.participants.iter().enumerate() {
        let id = builder.ids.claim(&participant.id);
        let style = if participant.actor {
            lifeline_style.clone().set("participant", "umlActor")
        } else {
            lifeline_style.clone()
        };
        builder.add_vertex(
            Z_LIFELINE,
            VertexCell::new(
                id.clone(),
                participant.label.as_str(),
                style,
                Bounds::new(left(index), seq.start_y, seq.participant_width, height),
            ),
        );
        lifelines.insert(participant.id.as_str(), (index, id));
    }

    // Rows advance only for messages whose endpoints resolve.
    let mut rows: Vec<Option<usize>> = Vec::with_capacity(diagram.messages.len());
    let mut next_row = 0;
    for (index, message) in diagram.messages.iter().enumerate() {
        let (Some((from_idx, from_id)), Some((to_idx, to_id))) = (
            lifelines.get(message.from.as_str()),
            lifelines.get(message.to.as_str()),
        ) else {
            warn!(message = index; "message names an unknown participant, skipping");
            rows.push(None);
            continue;
        };
        let y = row_y(next_row);
        rows.push(Some(next_row));
        next_row += 1;

        let mut style = Style::parse("html=1;verticalAlign=bottom;")
            .set("endArrow", end_arrow(message.arrow))
            .set("strokeColor", &theme.line_color);
        if message.dashed {
            style = style.set("dashed", 1);
        }
        let style = style.set("curved", 0).set("rounded", 0);

        let start = Point::new(center(*from_idx), y);
        let edge = if from_idx == to_idx {
            let loop_x = start.x + seq.participant_width / 2.0 - 10.0;
            let end = Point::new(start.x, y + seq.row_height / 3.0);
            EdgeCell::new(String::new(), message.text.as_str(), style)
                .with_terminal_points(start, end)
                .with_waypoints(vec![Point::new(loop_x, start.y), Point::new(loop_x, end.y)])
        } else {
            let end = Point::new(center(*to_idx), y);
            EdgeCell::new(String::new(), message.text.as_str(), style)
                .with_terminal_points(start, end)
                .with_waypoints(vec![start, end])
        };
        let id = builder.ids.next("msg");
        builder.add_edge(
            Z_MESSAGE,
            EdgeCell { id, ..edge }.connect(from_id, to_id),
        );
    }

    let frame_style = Style::parse(
        "shape=umlFrame;whiteSpace=wrap;html=1;width=60;height=30;boundedLbl=1;verticalAlign=middle;align=left;spacingLeft=5;fillColor=none;",
    )
    .set("strokeColor", &theme.primary_border_color);
    for frame in &diagram.frames {
        let covered: Vec<usize> = frame
            .messages
            .clone()
            .filter_map(|m| rows.get(m).copied().flatten())
            .collect();
        let (Some(&first_row), Some(&last_row)) = (covered.first(), covered.last()) else {
            debug!(kind = frame.kind.keyword(); "frame covers no drawn messages, skipping");
            continue;
        };
        let touched = frame
            .messages
            .clone()
            .filter_map(|m| diagram.messages.get(m))
            .flat_map(|m| [m.from.as_str(), m.to.as_str()])
            .filter_map(|id| lifelines.get(id).map(|(idx, _)| *idx));
        let (min_idx, max_idx) = touched.fold((usize::MAX, 0), |(lo, hi), idx| (lo.min(idx), hi.max(idx)));
        let x = center(min_idx) - seq.frame_pad_x;
        let width = left(max_idx) - left(min_idx) + 2.0 * seq.frame_pad_x;
        let rows_spanned = (last_row - first_row + 1) as f32;
        let id = builder.ids.next(frame.kind.keyword());
        builder.add_vertex(
            Z_FRAME,
            VertexCell::new(
                id,
                frame_label(frame.kind, &frame.label),
                frame_style.clone(),
                Bounds::new(
                    x,
                    row_y(first_row) - seq.frame_pad_top,
                    width,
                    rows_spanned * seq.row_height + seq.frame_extra_height,
                ),
            ),
        );
    }

    let note_style = Style::parse("shape=note;whiteSpace=wrap;html=1;backgroundOutline=1;darkOpacity=0.05;")
        .set("fillColor", &theme.note_fill)
        .set("strokeColor", &theme.note_border);
    for (index, note) in diagram.notes.iter().enumerate() {
        let y = row_y(index) + seq.note_offset_y;
        let index_of = |id: &str| lifelines.get(id).map(|(idx, _)| *idx);
        let placed = match &note.placement {
            NotePlacement::Over(targets) => {
                let indices: Option<Vec<usize>> = targets.iter().map(|t| index_of(t)).collect();
                indices.and_then(|indices| {
                    let first = *indices.iter().min()?;
                    let last = *indices.iter().max()?;
                    Some((left(first), left(last) - left(first) + seq.participant_width))
                })
            }
            NotePlacement::RightOf(target) => index_of(target)
                .map(|idx| (center(idx) + 10.0, seq.note_width)),
            NotePlacement::LeftOf(target) => index_of(target)
                .map(|idx| (left(idx) - seq.note_width - 10.0, seq.note_width)),
        };
        let Some((x, width)) = placed else {
            warn!(note = index; "note names an unknown participant, skipping");
            continue;
        };
        let id = builder.ids.next("note");
        builder.add_vertex(
            Z_NOTE,
            VertexCell::new(
                id,
                note.text.as_str(),
                note_style.clone(),
                Bounds::new(x, y, width, seq.note_height),
            ),
        );
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_mermaid;

    fn layout(src: &str) -> Layout {
        let parsed = parse_mermaid(src, Some(DiagramKind::Sequence)).unwrap();
        crate::layout::compute_layout(&parsed.diagram, &Theme::default(), &LayoutConfig::default())
    }

    const SOURCE: &str = "sequenceDiagram
    participant A as Alice
    actor B
    participant C
    A->>B: hello
    loop retry
        B-->>C: ping
        C->>B: pong
    end
    A-xA: think
    Note over A,C: shared
    Note right of B: aside
    Note left of Z: lost
";

    #[test]
    fn lifelines_span_all_messages() {
        let layout = layout(SOURCE);
        let alice = layout.vertex("A").unwrap();
        assert_eq!(alice.value, "Alice");
        assert_eq!(alice.bounds, Bounds::new(80.0, 40.0, 100.0, 440.0));
        assert_eq!(layout.vertex("B").unwrap().style.get("participant"), Some("umlActor"));
        assert_eq!(layout.vertex("C").unwrap().bounds.x, 480.0);
    }

    #[test]
    fn messages_stack_one_row_each() {
        let layout = layout(SOURCE);
        let hello = layout.edge("msg_0").unwrap();
        assert_eq!(hello.source_point, Some(Point::new(130.0, 110.0)));
        assert_eq!(hello.target_point, Some(Point::new(330.0, 110.0)));
        assert_eq!(hello.waypoints.len(), 2);
        assert_eq!(hello.style.get("endArrow"), Some("open"));
        let ping = layout.edge("msg_1").unwrap();
        assert_eq!(ping.style.get("dashed"), Some("1"));
        assert_eq!(ping.source_point.unwrap().y, 170.0);
        let think = layout.edge("msg_3").unwrap();
        assert_eq!(think.source.as_deref(), Some("A"));
        assert_eq!(think.target.as_deref(), Some("A"));
        assert_eq!(think.style.get("endArrow"), Some("diamond"));
    }

    #[test]
    fn frame_covers_its_rows_and_participants() {
        let layout = layout(SOURCE);
        let frame = layout.vertex("loop_0").unwrap();
        assert_eq!(frame.value, "retry");
        // Rows 1..=2, participants B..C.
        assert_eq!(frame.bounds, Bounds::new(270.0, 145.0, 320.0, 150.0));
    }

    #[test]
    fn notes_follow_their_participants_and_draw_last() {
        let layout = layout(SOURCE);
        let shared = layout.vertex("note_0").unwrap();
        assert_eq!(shared.bounds, Bounds::new(80.0, 140.0, 500.0, 40.0));
        let aside = layout.vertex("note_1").unwrap();
        assert_eq!(aside.bounds.x, 340.0);
        assert!(layout.vertex("note_2").is_none());

        let order: Vec<&str> = layout.ordered_cells().iter().map(|c| c.id()).collect();
        let frame = order.iter().position(|id| *id == "loop_0").unwrap();
        let first_message = order.iter().position(|id| *id == "msg_0").unwrap();
        let first_note = order.iter().position(|id| *id == "note_0").unwrap();
        assert!(frame < first_message && first_message < first_note);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn keyword_prefixes_non_loop_frames() {
        assert_eq!(frame_label(FrameKind::Alt, "ok"), "alt: ok");
        assert_eq!(frame_label(FrameKind::Opt, ""), "opt");
        assert_eq!(frame_label(FrameKind::Loop, "each"), "each");
    }
}
