pub mod config;
pub mod geometry;
pub mod layouts;
pub mod mock;
pub mod overlay;
pub mod paths;
pub mod renderer;

pub use config::{CollisionPolicy, ConfigRef, LayoutConfig, OverlayConfig};
pub use geometry::{Bounds, Position, Size};
pub use layouts::{Corner, CornerLayouter, GridLayouter, Layouter, LayouterRef, GRID_IDENTIFIER};
pub use overlay::overlays::{TextOverlay, TextOverlayState};
pub use overlay::{
    LocalStorageHandler, ManagerDirectory, Overlay, OverlayError, OverlayKey, OverlayManager,
    OverlayRef, OverlayResult,
};
pub use renderer::{Renderer, RendererKey, RendererRef, WeakRendererRef};

pub fn version() -> &'static str {
    option_env!("VERSION").unwrap_or("v0.0.0-dev")
}
