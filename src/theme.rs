use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelColor {
    pub fill: String,
    pub stroke: String,
}

impl LevelColor {
    fn new(fill: &str, stroke: &str) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: stroke.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub primary_color: String,
    pub primary_text_color: String,
    pub primary_border_color: String,
    pub line_color: String,
    pub edge_label_background: String,
    pub muted_line_color: String,
    pub grid_line_color: String,
    pub note_fill: String,
    pub note_border: String,
    pub org_levels: Vec<LevelColor>,
    pub pie_colors: Vec<String>,
    pub bar_fill: String,
    pub bar_stroke: String,
    pub gantt_bar_fill: String,
    pub gantt_bar_border: String,
    pub gantt_done: LevelColor,
    pub gantt_active: LevelColor,
    pub gantt_crit: LevelColor,
    pub gantt_milestone: LevelColor,
    pub timeline_dot: String,
    pub timeline_event_stroke: String,
    pub journey_scores: Vec<String>,
    pub kanban_priority_high: String,
    pub kanban_priority_low: String,
}

impl Theme {
    /// The palette the stand-alone converters shipped with.
    pub fn drawio_default() -> Self {
        Self {
            font_family: "Helvetica".to_string(),
            font_size: 12.0,
            primary_color: "#ffffff".to_string(),
            primary_text_color: "#333333".to_string(),
            primary_border_color: "#000000".to_string(),
            line_color: "#333333".to_string(),
            edge_label_background: "#ffffff".to_string(),
            muted_line_color: "#666666".to_string(),
            grid_line_color: "#e6e6e6".to_string(),
            note_fill: "#fff2cc".to_string(),
            note_border: "#d6b656".to_string(),
            org_levels: vec![
                LevelColor::new("#dae8fc", "#6c8ebf"),
                LevelColor::new("#f5f5f5", "#666666"),
                LevelColor::new("#d5e8d4", "#82b366"),
                LevelColor::new("#fff2cc", "#d6b656"),
            ],
            pie_colors: [
                "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#E7E9ED",
                "#C9CBCF",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            bar_fill: "#e0e0e0".to_string(),
            bar_stroke: "#999999".to_string(),
            gantt_bar_fill: "#ffffff".to_string(),
            gantt_bar_border: "#cccccc".to_string(),
            gantt_done: LevelColor::new("#f5f5f5", "#999999"),
            gantt_active: LevelColor::new("#dae8fc", "#6c8ebf"),
            gantt_crit: LevelColor::new("#f8cecc", "#b85450"),
            gantt_milestone: LevelColor::new("#ffe6cc", "#d79b00"),
            timeline_dot: "#000000".to_string(),
            timeline_event_stroke: "#cccccc".to_string(),
            journey_scores: [
                "#f8cecc", "#f8cecc", "#fff2cc", "#d5e8d4", "#d5e8d4",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            kanban_priority_high: "#b85450".to_string(),
            kanban_priority_low: "#82b366".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter".to_string(),
            font_size: 13.0,
            primary_color: "#F8FAFF".to_string(),
            primary_text_color: "#1C2430".to_string(),
            primary_border_color: "#C7D2E5".to_string(),
            line_color: "#7A8AA6".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            muted_line_color: "#94A3B8".to_string(),
            grid_line_color: "#EEF2F8".to_string(),
            note_fill: "#FEF9C3".to_string(),
            note_border: "#EAB308".to_string(),
            org_levels: vec![
                LevelColor::new("#DBEAFE", "#3B82F6"),
                LevelColor::new("#EEF2F8", "#7A8AA6"),
                LevelColor::new("#DCFCE7", "#22C55E"),
                LevelColor::new("#FEF9C3", "#EAB308"),
            ],
            pie_colors: [
                "#6366F1", "#0EA5E9", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#14B8A6",
                "#94A3B8",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            bar_fill: "#E0E7FF".to_string(),
            bar_stroke: "#6366F1".to_string(),
            gantt_bar_fill: "#F8FAFF".to_string(),
            gantt_bar_border: "#C7D2E5".to_string(),
            gantt_done: LevelColor::new("#F1F5F9", "#94A3B8"),
            gantt_active: LevelColor::new("#E0F2FE", "#0EA5E9"),
            gantt_crit: LevelColor::new("#FEE2E2", "#EF4444"),
            gantt_milestone: LevelColor::new("#FEF3C7", "#F59E0B"),
            timeline_dot: "#1C2430".to_string(),
            timeline_event_stroke: "#C7D2E5".to_string(),
            journey_scores: [
                "#FEE2E2", "#FEE2E2", "#FEF9C3", "#DCFCE7", "#DCFCE7",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            kanban_priority_high: "#EF4444".to_string(),
            kanban_priority_low: "#22C55E".to_string(),
        }
    }

    /// Fill/stroke for an org-chart depth; depths past the palette reuse the last entry.
    pub fn org_level(&self, depth: usize) -> Option<&LevelColor> {
        let last = self.org_levels.len().checked_sub(1)?;
        self.org_levels.get(depth.min(last))
    }

    pub fn pie_color(&self, index: usize) -> &str {
        if self.pie_colors.is_empty() {
            return self.primary_color.as_str();
        }
        self.pie_colors[index % self.pie_colors.len()].as_str()
    }

    pub fn journey_score_color(&self, score: u8) -> &str {
        if self.journey_scores.is_empty() {
            return self.primary_color.as_str();
        }
        let idx = (score.max(1) as usize - 1).min(self.journey_scores.len() - 1);
        self.journey_scores[idx].as_str()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::drawio_default()
    }
}
