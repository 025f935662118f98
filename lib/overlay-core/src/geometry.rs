use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Display-space rectangle, origin at the top left of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Bounds {
    pub position: Position,
    pub size: Size,
}

fn clamp_extent(extent: u32) -> i32 {
    i32::try_from(extent).unwrap_or(i32::MAX)
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            position: Position::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_position(position: Position, size: Size) -> Self {
        Self { position, size }
    }

    pub fn right(&self) -> i32 {
        self.position.x.saturating_add(clamp_extent(self.size.width))
    }

    pub fn bottom(&self) -> i32 {
        self.position.y.saturating_add(clamp_extent(self.size.height))
    }

    pub fn center(&self) -> Position {
        Position::new(
            self.position.x.saturating_add(clamp_extent(self.size.width / 2)),
            self.position.y.saturating_add(clamp_extent(self.size.height / 2)),
        )
    }

    pub fn contains(&self, position: &Position) -> bool {
        position.x >= self.position.x
            && position.x < self.right()
            && position.y >= self.position.y
            && position.y < self.bottom()
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.position.x < other.right()
            && self.right() > other.position.x
            && self.position.y < other.bottom()
            && self.bottom() > other.position.y
    }

    /// True when `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &Bounds) -> bool {
        other.position.x >= self.position.x
            && other.position.y >= self.position.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_saturate_on_huge_sizes() {
        let bounds = Bounds::new(i32::MAX - 5, 0, u32::MAX, 10);
        assert_eq!(bounds.right(), i32::MAX);
        assert!(!Bounds::new(0, 0, 800, 600).encloses(&bounds));
    }

    #[test]
    fn test_bounds_edges() {
        let bounds = Bounds::new(10, 20, 100, 50);
        assert_eq!(bounds.right(), 110);
        assert_eq!(bounds.bottom(), 70);
        assert_eq!(bounds.center(), Position::new(60, 45));
    }

    #[test]
    fn test_bounds_contains_is_half_open() {
        let bounds = Bounds::new(0, 0, 10, 10);
        assert!(bounds.contains(&Position::new(0, 0)));
        assert!(bounds.contains(&Position::new(9, 9)));
        assert!(!bounds.contains(&Position::new(10, 5)));
    }

    #[test]
    fn test_bounds_intersects() {
        let a = Bounds::new(0, 0, 10, 10);
        assert!(a.intersects(&Bounds::new(5, 5, 10, 10)));
        assert!(!a.intersects(&Bounds::new(10, 0, 10, 10)));
    }

    #[test]
    fn test_bounds_encloses() {
        let outer = Bounds::new(0, 0, 100, 100);
        assert!(outer.encloses(&Bounds::new(10, 10, 90, 90)));
        assert!(!outer.encloses(&Bounds::new(10, 10, 91, 10)));
    }

    #[test]
    fn test_size_is_empty() {
        assert!(Size::new(0, 10).is_empty());
        assert!(!Size::new(1, 1).is_empty());
    }
}
