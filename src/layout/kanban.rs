use super::*;
use crate::ir::{Kanban, KanbanTask};

fn task_label(task: &KanbanTask) -> String {
    match task.meta("ticket") {
        Some(ticket) => format!("{} ({ticket})", task.description),
        None => task.description.clone(),
    }
}

fn priority_stroke<'a>(task: &KanbanTask, theme: &'a Theme) -> &'a str {
    match task.meta("priority").map(str::to_ascii_lowercase).as_deref() {
        Some("high" | "very high") => &theme.kanban_priority_high,
        Some("low" | "very low") => &theme.kanban_priority_low,
        _ => &theme.primary_border_color,
    }
}

pub(super) fn compute_kanban_layout(board: &Kanban, theme: &Theme, config: &LayoutConfig) -> Layout {
    let kanban = &config.kanban;
    let mut builder = LayoutBuilder::new(DiagramKind::Kanban);
    let pitch = kanban.task_height + kanban.task_spacing;

    let column_style = Style::parse(
        "swimlane;fontStyle=1;childLayout=stackLayout;horizontal=1;horizontalStack=0;resizeParent=1;resizeLast=0;collapsible=1;marginBottom=0;",
    )
    .set("startSize", kanban.header_height)
    .set("fillColor", &theme.primary_color)
    .set("strokeColor", &theme.primary_border_color);
    let task_style = Style::parse("whiteSpace=wrap;html=1;").set("fillColor", &theme.primary_color);

    for (index, column) in board.columns.iter().enumerate() {
        // Each column is as tall as its own task list.
        let height =
            kanban.header_height + column.tasks.len() as f32 * pitch + kanban.bottom_padding;
        let x = index as f32 * (kanban.column_width + kanban.column_spacing);
        let column_id = builder.ids.claim(&column.id);
        builder.add_vertex(
            0,
            VertexCell::new(
                column_id.clone(),
                column.title.as_str(),
                column_style.clone(),
                Bounds::new(x, 0.0, kanban.column_width, height),
            ),
        );

        for (row, task) in column.tasks.iter().enumerate() {
            let id = builder.ids.claim(&task.id);
            builder.add_vertex(
                1,
                VertexCell::new(
                    id,
                    task_label(task),
                    task_style.clone().set("strokeColor", priority_stroke(task, theme)),
                    Bounds::new(
                        0.0,
                        kanban.header_height + row as f32 * pitch,
                        kanban.column_width,
                        kanban.task_height,
                    ),
                )
                .with_parent(&column_id),
            );
        }
    }

    builder.finish()
}
