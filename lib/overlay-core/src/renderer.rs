use crate::geometry::Size;
use std::fmt::Debug;
use std::sync::{Arc, Weak};

/// A render target overlays are drawn onto. The registry never owns one; it
/// only keeps a `Weak` handle for association.
pub trait Renderer: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Size of the drawable area in display pixels.
    fn viewport(&self) -> Size;
}

pub type RendererRef = Arc<dyn Renderer>;
pub type WeakRendererRef = Weak<dyn Renderer>;

/// Identity of a renderer, derived from the address of its allocation.
///
/// Only meaningful while the renderer is alive. Tables keyed by it must also
/// hold the matching `Weak` so a reused address can be told apart from the
/// original renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererKey(usize);

impl RendererKey {
    pub fn of(renderer: &RendererRef) -> Self {
        Self(Arc::as_ptr(renderer) as *const () as usize)
    }

    pub fn of_weak(renderer: &WeakRendererRef) -> Self {
        Self(Weak::as_ptr(renderer) as *const () as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRenderer;

    #[test]
    fn test_key_is_identity_based() {
        let a: RendererRef = MockRenderer::new("view", Size::new(10, 10));
        let b: RendererRef = MockRenderer::new("view", Size::new(10, 10));

        assert_eq!(RendererKey::of(&a), RendererKey::of(&a.clone()));
        assert_ne!(RendererKey::of(&a), RendererKey::of(&b));
    }

    #[test]
    fn test_weak_key_matches_strong_key() {
        let a: RendererRef = MockRenderer::new("view", Size::new(10, 10));
        let weak = Arc::downgrade(&a);
        assert_eq!(RendererKey::of(&a), RendererKey::of_weak(&weak));
    }
}
