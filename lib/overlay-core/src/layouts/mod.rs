use crate::overlay::OverlayRef;
use crate::renderer::{RendererRef, WeakRendererRef};
use std::fmt::Debug;
use std::sync::Arc;

mod corner;
mod grid;

pub use corner::{Corner, CornerLayouter};
pub use grid::{GridLayouter, GRID_IDENTIFIER};

/// A placement strategy for the overlays bound to it on one renderer.
///
/// A layouter belongs to exactly one renderer and is registered under its
/// `identifier` for that renderer. It may read and place overlays but must not
/// call back into the manager that invokes it.
pub trait Layouter: Debug + Send + Sync {
    fn identifier(&self) -> &str;

    fn renderer(&self) -> WeakRendererRef;

    /// Places `overlays` for `renderer`, in the order given.
    fn prepare_layout(&self, renderer: &RendererRef, overlays: &[OverlayRef]);
}

pub type LayouterRef = Arc<dyn Layouter>;
