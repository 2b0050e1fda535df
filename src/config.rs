use crate::error::ConvertError;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GraphEngine {
    Dagre,
    Ranked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowchartConfig {
    pub engine: GraphEngine,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub edge_spacing: f32,
    /// Dagre's in-rank alignment (`UL`, `UR`, `DL`, `DR`). Unset leaves the
    /// balanced placement, which keeps siblings apart.
    pub align: Option<String>,
    pub margin: f32,
    pub rect_width: f32,
    pub rect_height: f32,
    pub diamond_width: f32,
    pub diamond_height: f32,
}

impl Default for FlowchartConfig {
    fn default() -> Self {
        Self {
            engine: GraphEngine::Dagre,
            node_spacing: 120.0,
            rank_spacing: 120.0,
            edge_spacing: 80.0,
            align: None,
            margin: 0.0,
            rect_width: 140.0,
            rect_height: 70.0,
            diamond_width: 160.0,
            diamond_height: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrgChartConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub level_height: f32,
    pub sibling_gap: f32,
    pub canvas_center_x: f32,
    pub base_y: f32,
}

impl Default for OrgChartConfig {
    fn default() -> Self {
        Self {
            node_width: 140.0,
            node_height: 60.0,
            level_height: 150.0,
            sibling_gap: 60.0,
            canvas_center_x: 500.0,
            base_y: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GanttConfig {
    pub day_width: f32,
    pub row_height: f32,
    pub header_height: f32,
    pub section_width: f32,
    pub title_height: f32,
    pub bar_inset: f32,
    pub tick_label_format: String,
}

impl Default for GanttConfig {
    fn default() -> Self {
        Self {
            day_width: 40.0,
            row_height: 40.0,
            header_height: 60.0,
            section_width: 100.0,
            title_height: 30.0,
            bar_inset: 5.0,
            tick_label_format: "%m/%d".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineConfig {
    pub spacing: f32,
    pub axis_y: f32,
    pub start_x: f32,
    pub event_offset: f32,
    pub stack_gap: f32,
    pub event_width: f32,
    pub event_height: f32,
    pub dot_size: f32,
    pub section_label_y: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            spacing: 200.0,
            axis_y: 300.0,
            start_x: 100.0,
            event_offset: 100.0,
            stack_gap: 60.0,
            event_width: 120.0,
            event_height: 50.0,
            dot_size: 10.0,
            section_label_y: 110.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SequenceConfig {
    pub start_x: f32,
    pub start_y: f32,
    pub participant_spacing: f32,
    pub participant_width: f32,
    pub header_size: f32,
    pub min_height: f32,
    pub first_message_y: f32,
    pub row_height: f32,
    pub frame_pad_x: f32,
    pub frame_pad_top: f32,
    pub frame_extra_height: f32,
    pub note_width: f32,
    pub note_height: f32,
    pub note_offset_y: f32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            start_x: 80.0,
            start_y: 40.0,
            participant_spacing: 200.0,
            participant_width: 100.0,
            header_size: 40.0,
            min_height: 400.0,
            first_message_y: 110.0,
            row_height: 60.0,
            frame_pad_x: 60.0,
            frame_pad_top: 25.0,
            frame_extra_height: 30.0,
            note_width: 100.0,
            note_height: 40.0,
            note_offset_y: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PieConfig {
    pub chart_size: f32,
    pub chart_y: f32,
    pub label_radius_ratio: f32,
    pub legend_x: f32,
    pub legend_item_height: f32,
    pub legend_swatch: f32,
    pub legend_text_width: f32,
    pub title_width: f32,
    pub title_height: f32,
}

impl Default for PieConfig {
    fn default() -> Self {
        Self {
            chart_size: 300.0,
            chart_y: 50.0,
            label_radius_ratio: 0.7,
            legend_x: 350.0,
            legend_item_height: 30.0,
            legend_swatch: 20.0,
            legend_text_width: 150.0,
            title_width: 500.0,
            title_height: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarChartConfig {
    pub chart_height: f32,
    pub bar_width: f32,
    pub bar_gap: f32,
    pub left_padding: f32,
    pub top_margin: f32,
    pub target_ticks: f64,
    pub headroom: f64,
}

impl Default for BarChartConfig {
    fn default() -> Self {
        Self {
            chart_height: 400.0,
            bar_width: 60.0,
            bar_gap: 40.0,
            left_padding: 80.0,
            top_margin: 100.0,
            target_ticks: 6.0,
            headroom: 1.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KanbanConfig {
    pub column_width: f32,
    pub column_spacing: f32,
    pub header_height: f32,
    pub task_height: f32,
    pub task_spacing: f32,
    pub bottom_padding: f32,
}

impl Default for KanbanConfig {
    fn default() -> Self {
        Self {
            column_width: 200.0,
            column_spacing: 20.0,
            header_height: 30.0,
            task_height: 60.0,
            task_spacing: 10.0,
            bottom_padding: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SwotConfig {
    pub container_width: f32,
    pub gap_x: f32,
    pub gap_y: f32,
    pub start_x: f32,
    pub start_y: f32,
    pub item_height: f32,
    pub item_gap: f32,
    pub item_margin_x: f32,
    pub title_top_margin: f32,
    pub bottom_padding: f32,
}

impl Default for SwotConfig {
    fn default() -> Self {
        Self {
            container_width: 280.0,
            gap_x: 40.0,
            gap_y: 40.0,
            start_x: 80.0,
            start_y: 80.0,
            item_height: 40.0,
            item_gap: 10.0,
            item_margin_x: 20.0,
            title_top_margin: 40.0,
            bottom_padding: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JourneyConfig {
    pub lane_width: f32,
    pub lane_gap: f32,
    pub lane_header_height: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub vertical_gap: f32,
    pub phase_gap: f32,
    pub padding_top: f32,
    pub start_x: f32,
    pub start_y: f32,
    pub phase_label_width: f32,
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            lane_width: 280.0,
            lane_gap: 20.0,
            lane_header_height: 40.0,
            node_width: 160.0,
            node_height: 60.0,
            vertical_gap: 40.0,
            phase_gap: 80.0,
            padding_top: 80.0,
            start_x: 40.0,
            start_y: 40.0,
            phase_label_width: 140.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub flowchart: FlowchartConfig,
    pub orgchart: OrgChartConfig,
    pub gantt: GanttConfig,
    pub timeline: TimelineConfig,
    pub sequence: SequenceConfig,
    pub pie: PieConfig,
    pub bar: BarChartConfig,
    pub kanban: KanbanConfig,
    pub swot: SwotConfig,
    pub journey: JourneyConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    primary_color: Option<String>,
    primary_text_color: Option<String>,
    primary_border_color: Option<String>,
    line_color: Option<String>,
    #[serde(rename = "noteBkgColor")]
    note_bkg: Option<String>,
    note_border_color: Option<String>,
}

impl ThemeVariables {
    fn apply_to(self, theme: &mut Theme) {
        let slots = [
            (self.font_family, &mut theme.font_family),
            (self.primary_color, &mut theme.primary_color),
            (self.primary_text_color, &mut theme.primary_text_color),
            (self.primary_border_color, &mut theme.primary_border_color),
            (self.line_color, &mut theme.line_color),
            (self.note_bkg, &mut theme.note_fill),
            (self.note_border_color, &mut theme.note_border),
        ];
        for (value, slot) in slots {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if let Some(size) = self.font_size {
            theme.font_size = size;
        }
    }
}

/// Applies the `themeVariables` object of a `%%{init}%%` directive on top of
/// `config`. Unknown keys are ignored; a malformed object leaves the theme
/// untouched.
pub(crate) fn apply_init_theme(config: &mut Config, init: &serde_json::Value) {
    let Some(raw) = init.get("themeVariables") else {
        return;
    };
    match ThemeVariables::deserialize(raw) {
        Ok(vars) => vars.apply_to(&mut config.theme),
        Err(err) => log::warn!("ignoring init themeVariables: {err}"),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfig>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config, ConvertError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<Config, ConvertError> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|err| ConvertError::Config(format!("{json_err}; json5: {err}")))?,
    };

    let mut config = Config::default();
    match parsed.theme.as_deref() {
        Some("modern") => config.theme = Theme::modern(),
        Some("drawio") | Some("default") | None => {}
        Some(other) => {
            log::warn!("unknown theme '{other}', keeping the default palette");
        }
    }

    if let Some(vars) = parsed.theme_variables {
        vars.apply_to(&mut config.theme);
    }

    if let Some(layout) = parsed.layout {
        config.layout = layout;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_layout_tables_keep_defaults() {
        let config = parse_config(r#"{"layout": {"gantt": {"dayWidth": 25}}}"#).unwrap();
        assert_eq!(config.layout.gantt.day_width, 25.0);
        assert_eq!(config.layout.gantt.row_height, 40.0);
        assert_eq!(config.layout.orgchart.node_width, 140.0);
    }

    #[test]
    fn accepts_json5_and_theme_overrides() {
        let config = parse_config(
            "{theme: 'modern', themeVariables: {lineColor: '#123456'}, layout: {flowchart: {engine: 'ranked'}}}",
        )
        .unwrap();
        assert_eq!(config.theme.font_family, "Inter");
        assert_eq!(config.theme.line_color, "#123456");
        assert_eq!(config.layout.flowchart.engine, GraphEngine::Ranked);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_config("not a config"), Err(ConvertError::Config(_))));
    }
}
