use super::{FamilyLayout, Point};

/// Topmost member whose avatar circle contains `point`. Later entries in the
/// draw order paint over earlier ones, so the walk runs backwards.
pub fn hit_test(layout: &FamilyLayout, point: Point, radius: f32) -> Option<&str> {
    layout
        .draw_order
        .iter()
        .rev()
        .find(|id| {
            layout
                .positions
                .get(id.as_str())
                .is_some_and(|center| center.distance(point) <= radius)
        })
        .map(String::as_str)
}
