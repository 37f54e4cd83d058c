use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Available drawing area used to centre the forest after layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// One reserved position in a children row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Child(String),
    ChildSpouse { child: String, spouse: String },
}

impl Slot {
    pub fn target(&self) -> &str {
        match self {
            Slot::Child(id) => id,
            Slot::ChildSpouse { spouse, .. } => spouse,
        }
    }

    pub fn is_child(&self) -> bool {
        matches!(self, Slot::Child(_))
    }
}

/// Horizontal extent of a member's children row plus the point the descent
/// connector drops from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildRow {
    pub left: f32,
    pub right: f32,
    pub anchor: Point,
    pub y: f32,
    /// Slot targets that are children (child spouses are excluded).
    pub children: Vec<String>,
}

impl ChildRow {
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.left && x <= self.right
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FamilyLayout {
    pub positions: BTreeMap<String, Point>,
    pub ranges: BTreeMap<String, ChildRow>,
    pub draw_order: Vec<String>,
    pub width: f32,
    pub height: f32,
}

impl FamilyLayout {
    pub fn position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    pub fn is_positioned(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// `(left, right)` of the member's children row.
    pub fn range(&self, id: &str) -> Option<(f32, f32)> {
        self.ranges.get(id).map(|row| (row.left, row.right))
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// `(min_x, min_y, max_x, max_y)` over member centres.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        if self.positions.is_empty() {
            return None;
        }
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for point in self.positions.values() {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        Some((min_x, min_y, max_x, max_y))
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        for point in self.positions.values_mut() {
            point.x += dx;
            point.y += dy;
        }
        for row in self.ranges.values_mut() {
            row.left += dx;
            row.right += dx;
            row.anchor.x += dx;
            row.anchor.y += dy;
            row.y += dy;
        }
    }

    /// Moves the minimum centre to `(margin, margin)`, then centres the
    /// content inside `canvas` on each axis where the canvas is larger.
    pub fn normalize(&mut self, margin: f32, canvas: Option<Canvas>) {
        let Some((min_x, min_y, max_x, max_y)) = self.bounds() else {
            self.width = canvas.map(|c| c.width).unwrap_or(0.0);
            self.height = canvas.map(|c| c.height).unwrap_or(0.0);
            return;
        };
        self.translate(margin - min_x, margin - min_y);

        let mut width = (max_x - min_x) + margin * 2.0;
        let mut height = (max_y - min_y) + margin * 2.0;
        if let Some(canvas) = canvas {
            let shift_x = if canvas.width > width {
                (canvas.width - width) / 2.0
            } else {
                0.0
            };
            let shift_y = if canvas.height > height {
                (canvas.height - height) / 2.0
            } else {
                0.0
            };
            self.translate(shift_x, shift_y);
            width = width.max(canvas.width);
            height = height.max(canvas.height);
        }
        self.width = width;
        self.height = height;
    }
}
