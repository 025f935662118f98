//! Headless stand-ins for renderers, layouters and overlays, shared by the
//! tests and the CLI.

use crate::geometry::{Bounds, Size};
use crate::layouts::Layouter;
use crate::overlay::{LocalStorageHandler, Overlay, OverlayRef};
use crate::renderer::{Renderer, RendererRef, WeakRendererRef};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
pub struct MockRenderer {
    name: String,
    viewport: Mutex<Size>,
}

impl MockRenderer {
    pub fn new(name: &str, viewport: Size) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            viewport: Mutex::new(viewport),
        })
    }

    pub fn set_viewport(&self, viewport: Size) {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner) = viewport;
    }
}

impl Renderer for MockRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn viewport(&self) -> Size {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Layout {
        layouter: String,
        renderer: String,
        overlays: Vec<String>,
    },
    Update {
        overlay: String,
        renderer: String,
    },
}

/// Ordered record of layout and update calls, shared between mocks.
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<Call>>,
}

impl CallLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn calls_mut(&self) -> MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, call: Call) {
        self.calls_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls_mut().clone()
    }

    pub fn layout_count(&self) -> usize {
        self.calls_mut()
            .iter()
            .filter(|call| matches!(call, Call::Layout { .. }))
            .count()
    }

    pub fn update_count(&self) -> usize {
        self.calls_mut()
            .iter()
            .filter(|call| matches!(call, Call::Update { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.calls_mut().clear();
    }
}

/// Layouter that only records what it was asked to place.
#[derive(Debug)]
pub struct RecordingLayouter {
    identifier: String,
    renderer: WeakRendererRef,
    log: Arc<CallLog>,
}

impl RecordingLayouter {
    pub fn new(identifier: &str, renderer: &RendererRef, log: Arc<CallLog>) -> Arc<Self> {
        Arc::new(Self {
            identifier: identifier.to_owned(),
            renderer: Arc::downgrade(renderer),
            log,
        })
    }
}

impl Layouter for RecordingLayouter {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn renderer(&self) -> WeakRendererRef {
        self.renderer.clone()
    }

    fn prepare_layout(&self, renderer: &RendererRef, overlays: &[OverlayRef]) {
        self.log.push(Call::Layout {
            layouter: self.identifier.clone(),
            renderer: renderer.name().to_owned(),
            overlays: overlays.iter().map(|overlay| format!("{:?}", overlay)).collect(),
        });
    }
}

/// Overlay that records its updates and keeps whatever bounds it is given.
pub struct RecordingOverlay {
    name: String,
    size: Size,
    bounds: LocalStorageHandler<Option<Bounds>>,
    log: Arc<CallLog>,
}

impl RecordingOverlay {
    pub fn new(name: &str, log: Arc<CallLog>) -> Arc<Self> {
        Self::with_size(name, Size::default(), log)
    }

    pub fn with_size(name: &str, size: Size, log: Arc<CallLog>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            size,
            bounds: LocalStorageHandler::new(),
            log,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Prints the overlay name only, so layout calls can be asserted by name.
impl std::fmt::Debug for RecordingOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl Overlay for RecordingOverlay {
    fn update_for_renderer(&self, renderer: &RendererRef) {
        self.log.push(Call::Update {
            overlay: self.name.clone(),
            renderer: renderer.name().to_owned(),
        });
    }

    fn preferred_size(&self, _renderer: &RendererRef) -> Size {
        self.size
    }

    fn bounds(&self, renderer: &RendererRef) -> Option<Bounds> {
        self.bounds.get(renderer).flatten()
    }

    fn set_bounds(&self, renderer: &RendererRef, bounds: Bounds) {
        self.bounds.update(renderer, |slot| *slot = Some(bounds));
    }
}
