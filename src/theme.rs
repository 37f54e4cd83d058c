use crate::family::Gender;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub male_fill: String,
    pub female_fill: String,
    pub avatar_border: String,
    pub line_color: String,
    pub marker_color: String,
    pub selection_color: String,
    pub text_color: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            male_fill: "#B3D4FC".to_string(),
            female_fill: "#F9C6D3".to_string(),
            avatar_border: "#555555".to_string(),
            line_color: "#333333".to_string(),
            marker_color: "#333333".to_string(),
            selection_color: "#E8A317".to_string(),
            text_color: "#222222".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            male_fill: "#DCE8FA".to_string(),
            female_fill: "#FBE3EA".to_string(),
            avatar_border: "#C7D2E5".to_string(),
            line_color: "#7A8AA6".to_string(),
            marker_color: "#5B6B86".to_string(),
            selection_color: "#3B82F6".to_string(),
            text_color: "#1C2430".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn fill_for(&self, gender: Gender) -> &str {
        match gender {
            Gender::Male => &self.male_fill,
            Gender::Female => &self.female_fill,
        }
    }
}
