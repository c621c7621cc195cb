// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Minimum horizontal travel before a drag counts as a page turn.
pub const SWIPE_THRESHOLD: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    Advance,
    Retreat,
}

/// Maps a drag to a page turn. Travel is measured as `start - end`, so
/// dragging toward the left advances and dragging toward the right retreats.
/// Short or vertical-dominant drags are scroll intent and map to nothing.
pub fn interpret_gesture(start: Point, end: Point) -> Option<Swipe> {
    let dx = start.x - end.x;
    let dy = start.y - end.y;

    if dx.abs() <= SWIPE_THRESHOLD || dx.abs() <= dy.abs() {
        return None;
    }

    if dx > 0.0 {
        Some(Swipe::Advance)
    } else {
        Some(Swipe::Retreat)
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Swipe, interpret_gesture};

    fn drag(dx: f32, dy: f32) -> Option<Swipe> {
        let start = Point::new(200.0, 200.0);
        interpret_gesture(start, Point::new(start.x + dx, start.y + dy))
    }

    #[test]
    fn leftward_drag_advances() {
        assert_eq!(drag(-80.0, 0.0), Some(Swipe::Advance));
    }

    #[test]
    fn rightward_drag_retreats() {
        assert_eq!(drag(80.0, 0.0), Some(Swipe::Retreat));
    }

    #[test]
    fn short_drag_is_ignored() {
        assert_eq!(drag(30.0, 0.0), None);
        assert_eq!(drag(-50.0, 0.0), None);
    }

    #[test]
    fn vertical_dominant_drag_is_ignored() {
        assert_eq!(drag(60.0, 70.0), None);
        assert_eq!(drag(-60.0, -60.0), None);
    }

    #[test]
    fn diagonal_drag_with_horizontal_dominance_turns_page() {
        assert_eq!(drag(-90.0, 40.0), Some(Swipe::Advance));
    }
}
