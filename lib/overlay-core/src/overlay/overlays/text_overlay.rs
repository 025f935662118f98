use crate::config::LayoutConfig;
use crate::geometry::{Bounds, Position, Size};
use crate::overlay::{LocalStorageHandler, Overlay};
use crate::renderer::RendererRef;
use log::trace;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// What a text overlay shows on one renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextOverlayState {
    /// Placement assigned by a layouter
    pub placement: Option<Bounds>,
    /// Bounds published on the last update
    pub display_bounds: Option<Bounds>,
    pub visible: bool,
    pub text: String,
    pub update_count: u64,
}

/// A multi-line label. Its size follows its text; without a layouter it sits
/// at its anchor.
#[derive(Debug)]
pub struct TextOverlay {
    text: RwLock<String>,
    anchor: Position,
    glyph: Size,
    visible: AtomicBool,
    storage: LocalStorageHandler<TextOverlayState>,
}

impl TextOverlay {
    pub fn new(text: &str, config: &LayoutConfig) -> Arc<Self> {
        Self::with_anchor(text, Position::default(), config)
    }

    pub fn with_anchor(text: &str, anchor: Position, config: &LayoutConfig) -> Arc<Self> {
        Arc::new(Self {
            text: RwLock::new(text.to_owned()),
            anchor,
            glyph: Size::new(config.glyph_width, config.glyph_height),
            visible: AtomicBool::new(true),
            storage: LocalStorageHandler::new(),
        })
    }

    pub fn text(&self) -> String {
        self.text
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_text(&self, text: &str) {
        *self.text.write().unwrap_or_else(PoisonError::into_inner) = text.to_owned();
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    /// State last computed for `renderer`, if it was ever updated or placed
    /// there.
    pub fn state(&self, renderer: &RendererRef) -> Option<TextOverlayState> {
        self.storage.get(renderer)
    }

    fn text_size(&self, text: &str) -> Size {
        let columns = text.lines().map(|line| line.chars().count()).max().unwrap_or(0);
        let lines = text.lines().count().max(1);
        let columns = u32::try_from(columns).unwrap_or(u32::MAX);
        let lines = u32::try_from(lines).unwrap_or(u32::MAX);
        Size::new(
            self.glyph.width.saturating_mul(columns),
            self.glyph.height.saturating_mul(lines),
        )
    }
}

impl Overlay for TextOverlay {
    fn update_for_renderer(&self, renderer: &RendererRef) {
        let text = self.text();
        let size = self.text_size(&text);
        let viewport = Bounds::from_position(Position::default(), renderer.viewport());
        let visible = self.is_visible();

        self.storage.update(renderer, |state| {
            let bounds = state
                .placement
                .unwrap_or_else(|| Bounds::from_position(self.anchor, size));
            state.visible = visible && !text.is_empty() && viewport.encloses(&bounds);
            state.display_bounds = Some(bounds);
            state.text = text;
            state.update_count += 1;
            trace!(
                "Text overlay updated on '{}': {:?} visible={}",
                renderer.name(),
                bounds,
                state.visible
            );
        });
    }

    fn preferred_size(&self, _renderer: &RendererRef) -> Size {
        self.text_size(&self.text())
    }

    fn bounds(&self, renderer: &RendererRef) -> Option<Bounds> {
        self.storage.read(renderer, |state| state.placement).flatten()
    }

    fn set_bounds(&self, renderer: &RendererRef, bounds: Bounds) {
        self.storage
            .update(renderer, |state| state.placement = Some(bounds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRenderer;

    fn config() -> LayoutConfig {
        LayoutConfig {
            glyph_width: 10,
            glyph_height: 20,
            ..LayoutConfig::default()
        }
    }

    fn renderer() -> RendererRef {
        MockRenderer::new("view", Size::new(400, 300))
    }

    #[test]
    fn test_preferred_size_follows_text() {
        let renderer = renderer();
        let overlay = TextOverlay::new("abc\nlonger", &config());
        assert_eq!(overlay.preferred_size(&renderer), Size::new(60, 40));

        overlay.set_text("");
        assert_eq!(overlay.preferred_size(&renderer), Size::new(0, 20));
    }

    #[test]
    fn test_unplaced_overlay_uses_anchor() {
        let renderer = renderer();
        let overlay = TextOverlay::with_anchor("hi", Position::new(5, 6), &config());

        overlay.update_for_renderer(&renderer);

        let state = overlay.state(&renderer).unwrap();
        assert_eq!(state.display_bounds, Some(Bounds::new(5, 6, 20, 20)));
        assert!(state.visible);
        assert_eq!(state.text, "hi");
        assert_eq!(state.update_count, 1);
    }

    #[test]
    fn test_placement_wins_over_anchor() {
        let renderer = renderer();
        let overlay = TextOverlay::new("hi", &config());

        overlay.set_bounds(&renderer, Bounds::new(100, 100, 20, 20));
        overlay.update_for_renderer(&renderer);

        let state = overlay.state(&renderer).unwrap();
        assert_eq!(state.display_bounds, Some(Bounds::new(100, 100, 20, 20)));
        assert_eq!(overlay.bounds(&renderer), Some(Bounds::new(100, 100, 20, 20)));
    }

    #[test]
    fn test_outside_viewport_is_hidden() {
        let renderer = renderer();
        let overlay = TextOverlay::new("hi", &config());

        overlay.set_bounds(&renderer, Bounds::new(390, 0, 20, 20));
        overlay.update_for_renderer(&renderer);

        assert!(!overlay.state(&renderer).unwrap().visible);
    }

    #[test]
    fn test_hidden_overlay_still_updates() {
        let renderer = renderer();
        let overlay = TextOverlay::new("hi", &config());
        overlay.set_visible(false);

        overlay.update_for_renderer(&renderer);
        overlay.update_for_renderer(&renderer);

        let state = overlay.state(&renderer).unwrap();
        assert!(!state.visible);
        assert_eq!(state.update_count, 2);
    }

    #[test]
    fn test_state_is_per_renderer() {
        let a = renderer();
        let b = renderer();
        let overlay = TextOverlay::new("hi", &config());

        overlay.set_bounds(&a, Bounds::new(1, 1, 20, 20));
        overlay.update_for_renderer(&b);

        assert_eq!(overlay.bounds(&b), None);
        assert_eq!(overlay.state(&a).unwrap().update_count, 0);
    }

    #[test]
    fn test_huge_glyphs_saturate_and_hide() {
        let renderer = renderer();
        let config = LayoutConfig {
            glyph_width: 1_000_000_000,
            ..config()
        };
        let overlay = TextOverlay::new("wide text", &config);

        overlay.update_for_renderer(&renderer);

        assert_eq!(overlay.preferred_size(&renderer), Size::new(u32::MAX, 20));
        let state = overlay.state(&renderer).unwrap();
        assert!(!state.visible);
        assert_eq!(state.update_count, 1);
    }
}
