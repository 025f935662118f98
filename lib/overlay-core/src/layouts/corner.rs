use crate::config::LayoutConfig;
use crate::geometry::{Bounds, Position};
use crate::layouts::Layouter;
use crate::overlay::OverlayRef;
use crate::renderer::{RendererRef, WeakRendererRef};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn identifier(&self) -> &'static str {
        match self {
            Corner::TopLeft => "corner.top_left",
            Corner::TopRight => "corner.top_right",
            Corner::BottomLeft => "corner.bottom_left",
            Corner::BottomRight => "corner.bottom_right",
        }
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }

    pub fn is_left(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::BottomLeft)
    }
}

/// Stacks overlays in one corner of the viewport, first overlay closest to
/// the corner.
#[derive(Debug)]
pub struct CornerLayouter {
    corner: Corner,
    renderer: WeakRendererRef,
    margin: u32,
    spacing: u32,
}

impl CornerLayouter {
    pub fn new(renderer: &RendererRef, corner: Corner, config: &LayoutConfig) -> Arc<Self> {
        Arc::new(Self {
            corner,
            renderer: Arc::downgrade(renderer),
            margin: config.margin,
            spacing: config.spacing,
        })
    }

    pub fn corner(&self) -> Corner {
        self.corner
    }
}

impl Layouter for CornerLayouter {
    fn identifier(&self) -> &str {
        self.corner.identifier()
    }

    fn renderer(&self) -> WeakRendererRef {
        self.renderer.clone()
    }

    fn prepare_layout(&self, renderer: &RendererRef, overlays: &[OverlayRef]) {
        let viewport = renderer.viewport();
        let margin = to_coord(self.margin);
        let spacing = to_coord(self.spacing);
        let mut offset = margin;

        for overlay in overlays {
            let size = overlay.preferred_size(renderer);
            let width = to_coord(size.width);
            let height = to_coord(size.height);

            let x = if self.corner.is_left() {
                margin
            } else {
                to_coord(viewport.width)
                    .saturating_sub(margin)
                    .saturating_sub(width)
            };
            let y = if self.corner.is_top() {
                offset
            } else {
                to_coord(viewport.height)
                    .saturating_sub(offset)
                    .saturating_sub(height)
            };

            overlay.set_bounds(renderer, Bounds::from_position(Position::new(x, y), size));
            offset = offset.saturating_add(height).saturating_add(spacing);
        }
    }
}

fn to_coord(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
