use super::*;
use crate::ir::Swot;

pub(super) fn compute_swot_layout(swot: &Swot, theme: &Theme, config: &LayoutConfig) -> Layout {
    let cfg = &config.swot;
    let mut builder = LayoutBuilder::new(DiagramKind::Swot);
    let pitch = cfg.item_height + cfg.item_gap;

    let heights: Vec<f32> = swot
        .quadrants
        .iter()
        .map(|q| cfg.title_top_margin + q.items.len() as f32 * pitch + cfg.bottom_padding)
        .collect();
    let second_row = cfg.start_y + heights[0].max(heights[1]) + cfg.gap_y;
    let right_column = cfg.start_x + cfg.container_width + cfg.gap_x;
    let origins = [
        Point::new(cfg.start_x, cfg.start_y),
        Point::new(right_column, cfg.start_y),
        Point::new(cfg.start_x, second_row),
        Point::new(right_column, second_row),
    ];

    let container_style = Style::parse(
        "whiteSpace=wrap;html=1;strokeWidth=2;verticalAlign=top;fontStyle=1;fontSize=14;spacingTop=10;",
    )
    .set("fillColor", &theme.primary_color)
    .set("strokeColor", &theme.primary_border_color);
    let item_style = Style::parse("rounded=1;whiteSpace=wrap;html=1;strokeWidth=1;")
        .set("fillColor", &theme.primary_color)
        .set("strokeColor", &theme.primary_border_color)
        .set("fontSize", theme.font_size);

    for (index, (quadrant, origin)) in swot.quadrants.iter().zip(origins).enumerate() {
        let number = index + 1;
        let id = builder.ids.claim(&format!("q{number}_container"));
        builder.add_vertex(
            0,
            VertexCell::new(
                id,
                quadrant.title.as_str(),
                container_style.clone(),
                Bounds::new(origin.x, origin.y, cfg.container_width, heights[index]),
            ),
        );
        for (row, item) in quadrant.items.iter().enumerate() {
            let id = builder.ids.claim(&format!("q{number}_item_{row}"));
            builder.add_vertex(
                1,
                VertexCell::new(
                    id,
                    item.as_str(),
                    item_style.clone(),
                    Bounds::new(
                        origin.x + cfg.item_margin_x,
                        origin.y + cfg.title_top_margin + row as f32 * pitch,
                        cfg.container_width - 2.0 * cfg.item_margin_x,
                        cfg.item_height,
                    ),
                ),
            );
        }
    }

    builder.finish()
}
