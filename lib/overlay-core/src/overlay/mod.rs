mod directory;
mod local_storage;
mod manager;

pub mod overlays;

pub use directory::ManagerDirectory;
pub use local_storage::LocalStorageHandler;
pub use manager::OverlayManager;

use crate::geometry::{Bounds, Size};
use crate::renderer::RendererRef;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// A renderable annotation drawn on top of one or more renderers.
///
/// Layouters write placement through `set_bounds`; the render loop then calls
/// `update_for_renderer` once per frame so the overlay can refresh whatever it
/// shows on that renderer.
pub trait Overlay: Debug + Send + Sync {
    fn update_for_renderer(&self, renderer: &RendererRef);

    /// Size the overlay would like to occupy on `renderer`.
    fn preferred_size(&self, _renderer: &RendererRef) -> Size {
        Size::default()
    }

    fn bounds(&self, _renderer: &RendererRef) -> Option<Bounds> {
        None
    }

    fn set_bounds(&self, _renderer: &RendererRef, _bounds: Bounds) {}
}

pub type OverlayRef = Arc<dyn Overlay>;

/// Identity of a tracked overlay. Stable for as long as the manager holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayKey(usize);

impl OverlayKey {
    pub fn of(overlay: &OverlayRef) -> Self {
        Self(Arc::as_ptr(overlay) as *const () as usize)
    }
}

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Layouter not found: '{identifier}' on renderer '{renderer}'")]
    LayouterNotFound { identifier: String, renderer: String },

    #[error("Manager identifier already in use: {0}")]
    IdentifierInUse(String),

    #[error("Manager directory no longer exists")]
    DirectoryGone,

    #[error("Renderer of layouter '{identifier}' no longer exists")]
    RendererGone { identifier: String },
}

pub type OverlayResult<T> = Result<T, OverlayError>;
