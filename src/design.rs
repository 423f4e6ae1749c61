use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::{self, PartCategory};

pub const CANVAS_SIZE: i32 = 600;
pub const GRID_SIZE: i32 = 20;
pub const PART_SIZE: i32 = 80;

const DEFAULT_NAME: &str = "나만의 로봇";
const DEFAULT_COLOR: &str = "#4CAF50";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DesignError {
    #[error("unknown robot part {0:?}")]
    UnknownPart(String),
    #[error("no placed part with id {0:?}")]
    NotPlaced(String),
    #[error("design has no parts yet")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedPart {
    pub instance_id: String,
    pub part_id: String,
    pub category: PartCategory,
    pub x: i32,
    pub y: i32,
    pub rotation: u32,
    pub scale_x: f64,
    pub scale_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotDesign {
    pub name: String,
    pub mission: Option<String>,
    pub color: String,
    pub description: String,
    pub parts: Vec<PlacedPart>,
    pub created_at: DateTime<Utc>,
}

impl Default for RobotDesign {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            mission: None,
            color: DEFAULT_COLOR.to_string(),
            description: String::new(),
            parts: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Rounds to the nearest grid line and keeps the whole part on the canvas.
pub fn snap(coordinate: i32) -> i32 {
    let snapped = (coordinate as f64 / GRID_SIZE as f64).round() as i32 * GRID_SIZE;
    snapped.clamp(0, CANVAS_SIZE - PART_SIZE)
}

impl RobotDesign {
    pub fn place(&mut self, part_id: &str, x: i32, y: i32) -> Result<&PlacedPart, DesignError> {
        let part =
            catalog::find_part(part_id).ok_or_else(|| DesignError::UnknownPart(part_id.to_string()))?;
        self.parts.push(PlacedPart {
            instance_id: format!("{}-{}", part.id, Uuid::new_v4().simple()),
            part_id: part.id.to_string(),
            category: part.category,
            x: snap(x),
            y: snap(y),
            rotation: 0,
            scale_x: 1.0,
            scale_y: 1.0,
        });
        Ok(&self.parts[self.parts.len() - 1])
    }

    fn placed_mut(&mut self, instance_id: &str) -> Result<&mut PlacedPart, DesignError> {
        self.parts
            .iter_mut()
            .find(|part| part.instance_id == instance_id)
            .ok_or_else(|| DesignError::NotPlaced(instance_id.to_string()))
    }

    pub fn move_part(&mut self, instance_id: &str, x: i32, y: i32) -> Result<(), DesignError> {
        let part = self.placed_mut(instance_id)?;
        part.x = snap(x);
        part.y = snap(y);
        Ok(())
    }

    pub fn rotate(&mut self, instance_id: &str) -> Result<u32, DesignError> {
        let part = self.placed_mut(instance_id)?;
        part.rotation = (part.rotation + 90) % 360;
        Ok(part.rotation)
    }

    pub fn remove(&mut self, instance_id: &str) -> Result<PlacedPart, DesignError> {
        let index = self
            .parts
            .iter()
            .position(|part| part.instance_id == instance_id)
            .ok_or_else(|| DesignError::NotPlaced(instance_id.to_string()))?;
        Ok(self.parts.remove(index))
    }

    pub fn blueprint(&self, style: BlueprintStyle) -> Result<Blueprint, DesignError> {
        if self.parts.is_empty() {
            return Err(DesignError::Empty);
        }

        let mut materials: Vec<MaterialLine> = Vec::new();
        for placed in &self.parts {
            if let Some(line) = materials.iter_mut().find(|line| line.part_id == placed.part_id) {
                line.count += 1;
                continue;
            }
            let part = catalog::find_part(&placed.part_id)
                .ok_or_else(|| DesignError::UnknownPart(placed.part_id.clone()))?;
            materials.push(MaterialLine {
                part_id: part.id,
                name: part.name,
                kit_component: part.kit_component,
                count: 1,
            });
        }

        let main_color = style.main_color(&self.color).to_string();
        Ok(Blueprint {
            robot_name: self.name.clone(),
            label_color: label_color(&main_color, style),
            secondary_color: style.secondary_color(&self.color).to_string(),
            main_color,
            style,
            materials,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BlueprintStyle {
    /// Robot colour.
    Color,
    /// Grey print.
    Bw,
    /// White outlines for colouring in.
    Coloring,
}

impl BlueprintStyle {
    fn main_color<'a>(self, robot_color: &'a str) -> &'a str {
        match self {
            BlueprintStyle::Color => robot_color,
            BlueprintStyle::Bw => "#999999",
            BlueprintStyle::Coloring => "#ffffff",
        }
    }

    fn secondary_color<'a>(self, robot_color: &'a str) -> &'a str {
        match self {
            BlueprintStyle::Color => robot_color,
            BlueprintStyle::Bw => "#bbbbbb",
            BlueprintStyle::Coloring => "#ffffff",
        }
    }
}

/// Text colour that stays readable on the given face colour.
pub fn label_color(background: &str, style: BlueprintStyle) -> String {
    const DARK: &str = "#333333";
    const LIGHT: &str = "#ffffff";

    match style {
        BlueprintStyle::Coloring => return DARK.to_string(),
        BlueprintStyle::Bw => return LIGHT.to_string(),
        BlueprintStyle::Color => {}
    }

    let hex = background.trim_start_matches('#');
    if hex.len() != 6 {
        return DARK.to_string();
    }
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
    };
    let (Some(r), Some(g), Some(b)) = (channel(0..2), channel(2..4), channel(4..6)) else {
        return DARK.to_string();
    };

    let brightness = (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) as f64 / 1000.0;
    let color = if brightness > 128.0 { DARK } else { LIGHT };
    color.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialLine {
    pub part_id: &'static str,
    pub name: &'static str,
    pub kit_component: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    pub robot_name: String,
    pub style: BlueprintStyle,
    pub main_color: String,
    pub secondary_color: String,
    pub label_color: String,
    pub materials: Vec<MaterialLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_to_grid_inside_canvas() {
        assert_eq!(snap(29), 20);
        assert_eq!(snap(30), 40);
        assert_eq!(snap(-15), 0);
        assert_eq!(snap(590), 520);
    }

    #[test]
    fn place_move_rotate_remove() {
        let mut design = RobotDesign::default();
        let id = design.place("body1", 103, 47).unwrap().instance_id.clone();
        assert!(id.starts_with("body1-"));
        assert_eq!((design.parts[0].x, design.parts[0].y), (100, 40));

        design.move_part(&id, 1000, 61).unwrap();
        assert_eq!((design.parts[0].x, design.parts[0].y), (520, 60));

        for expected in [90, 180, 270, 0] {
            assert_eq!(design.rotate(&id).unwrap(), expected);
        }

        let removed = design.remove(&id).unwrap();
        assert_eq!(removed.part_id, "body1");
        assert!(design.parts.is_empty());
        assert_eq!(design.rotate(&id), Err(DesignError::NotPlaced(id.clone())));
    }

    #[test]
    fn unknown_parts_are_refused() {
        let mut design = RobotDesign::default();
        assert_eq!(
            design.place("laser", 0, 0).map(|_| ()),
            Err(DesignError::UnknownPart("laser".to_string()))
        );
    }

    #[test]
    fn blueprint_groups_materials() {
        let mut design = RobotDesign::default();
        design.place("leg1", 0, 0).unwrap();
        design.place("body2", 100, 100).unwrap();
        design.place("leg1", 200, 0).unwrap();

        let blueprint = design.blueprint(BlueprintStyle::Color).unwrap();
        assert_eq!(blueprint.materials.len(), 2);
        assert_eq!(blueprint.materials[0].part_id, "leg1");
        assert_eq!(blueprint.materials[0].count, 2);
        assert_eq!(blueprint.materials[1].kit_component, "확장 허브 블록");
        assert_eq!(blueprint.main_color, "#4CAF50");
        assert_eq!(blueprint.label_color, "#333333");
    }

    #[test]
    fn empty_design_has_no_blueprint() {
        assert_eq!(
            RobotDesign::default().blueprint(BlueprintStyle::Bw),
            Err(DesignError::Empty)
        );
    }

    #[test]
    fn label_color_follows_brightness() {
        assert_eq!(label_color("#1565C0", BlueprintStyle::Color), "#ffffff");
        assert_eq!(label_color("#ffffff", BlueprintStyle::Color), "#333333");
        assert_eq!(label_color("#abc", BlueprintStyle::Color), "#333333");
        assert_eq!(label_color("#zzzzzz", BlueprintStyle::Color), "#333333");
        assert_eq!(label_color("#1565C0", BlueprintStyle::Bw), "#ffffff");
        assert_eq!(label_color("#1565C0", BlueprintStyle::Coloring), "#333333");
    }
}
