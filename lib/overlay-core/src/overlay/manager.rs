use crate::config::ConfigRef;
use crate::layouts::LayouterRef;
use crate::overlay::directory::ManagerDirectory;
use crate::overlay::{OverlayError, OverlayKey, OverlayRef, OverlayResult};
use crate::renderer::{RendererKey, RendererRef, WeakRendererRef};
use indexmap::IndexMap;
use log::{debug, error, trace};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Layouters and overlay bindings of a single renderer.
#[derive(Debug)]
struct RendererEntry {
    renderer: WeakRendererRef,
    layouters: IndexMap<String, LayouterRef>,
    /// overlay -> layouter identifier, in binding order
    bindings: IndexMap<OverlayKey, String>,
}

impl RendererEntry {
    fn new(renderer: WeakRendererRef) -> Self {
        Self {
            renderer,
            layouters: IndexMap::new(),
            bindings: IndexMap::new(),
        }
    }

    fn is_alive(&self) -> bool {
        self.renderer.strong_count() > 0
    }
}

#[derive(Debug, Default)]
struct ManagerState {
    overlays: IndexMap<OverlayKey, OverlayRef>,
    renderers: IndexMap<RendererKey, RendererEntry>,
}

impl ManagerState {
    /// Entry of `renderer`, registering it when unknown.
    fn entry(&mut self, renderer: &RendererRef) -> &mut RendererEntry {
        self.renderers
            .entry(RendererKey::of(renderer))
            .or_insert_with(|| {
                trace!("Tracking renderer '{}'", renderer.name());
                RendererEntry::new(Arc::downgrade(renderer))
            })
    }

    fn existing(&self, renderer: &RendererRef) -> Option<&RendererEntry> {
        self.renderers
            .get(&RendererKey::of(renderer))
            .filter(|entry| entry.is_alive())
    }

    fn existing_mut(&mut self, renderer: &RendererRef) -> Option<&mut RendererEntry> {
        self.renderers
            .get_mut(&RendererKey::of(renderer))
            .filter(|entry| entry.is_alive())
    }

    fn prune_dead(&mut self) -> usize {
        let before = self.renderers.len();
        self.renderers.retain(|_, entry| entry.is_alive());
        before - self.renderers.len()
    }

    /// Layouters to run for `renderer` and the overlays each one receives.
    fn layout_plan(
        &self,
        renderer: &RendererRef,
        include_idle: bool,
    ) -> Vec<(LayouterRef, Vec<OverlayRef>)> {
        let Some(entry) = self.existing(renderer) else {
            return Vec::new();
        };

        let mut grouped: IndexMap<&str, Vec<OverlayRef>> = IndexMap::new();
        for (overlay_key, identifier) in &entry.bindings {
            match self.overlays.get(overlay_key) {
                Some(overlay) => grouped
                    .entry(identifier.as_str())
                    .or_default()
                    .push(overlay.clone()),
                None => {
                    debug_assert!(false, "binding for an untracked overlay");
                    error!("Skipping binding of untracked overlay to '{identifier}'");
                }
            }
        }

        let mut plan = Vec::with_capacity(grouped.len());
        for (identifier, overlays) in grouped {
            match entry.layouters.get(identifier) {
                Some(layouter) => plan.push((layouter.clone(), overlays)),
                None => {
                    debug_assert!(false, "binding to an unregistered layouter");
                    error!("Skipping bindings to unregistered layouter '{identifier}'");
                }
            }
        }

        if include_idle {
            for (identifier, layouter) in &entry.layouters {
                if !entry.bindings.values().any(|bound| bound == identifier) {
                    plan.push((layouter.clone(), Vec::new()));
                }
            }
        }

        plan
    }
}

/// Tracks overlays, renderers and layouters, and decides once per frame which
/// layouter places which overlay on which renderer.
///
/// The manager holds the aggregating strong reference to every overlay and
/// layouter it tracks. Renderers are only referenced weakly. Instances are
/// obtained through a [`ManagerDirectory`].
#[derive(Debug)]
pub struct OverlayManager {
    state: Mutex<ManagerState>,
    id: Mutex<Option<String>>,
    config: ConfigRef,
    directory: Weak<ManagerDirectory>,
}

impl OverlayManager {
    pub(crate) fn new(config: ConfigRef, directory: Weak<ManagerDirectory>) -> Self {
        Self {
            state: Mutex::new(ManagerState::default()),
            id: Mutex::new(None),
            config,
            directory,
        }
    }

    fn state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn id_slot(&self) -> MutexGuard<'_, Option<String>> {
        self.id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &ConfigRef {
        &self.config
    }

    /// Starts tracking `overlay`. Returns `false` if it was already tracked.
    pub fn add_overlay(&self, overlay: &OverlayRef) -> bool {
        let key = OverlayKey::of(overlay);
        let mut state = self.state();
        if state.overlays.contains_key(&key) {
            return false;
        }
        state.overlays.insert(key, overlay.clone());
        trace!("Added overlay {:?}", key);
        true
    }

    /// Stops tracking `overlay` and drops its binding on every renderer.
    pub fn remove_overlay(&self, overlay: &OverlayRef) -> bool {
        let key = OverlayKey::of(overlay);
        let mut state = self.state();
        if state.overlays.shift_remove(&key).is_none() {
            return false;
        }
        for entry in state.renderers.values_mut() {
            entry.bindings.shift_remove(&key);
        }
        trace!("Removed overlay {:?}", key);
        true
    }

    /// Drops every overlay and binding. Renderers and layouters stay registered.
    pub fn remove_all_overlays(&self) {
        let mut state = self.state();
        let count = state.overlays.len();
        state.overlays.clear();
        for entry in state.renderers.values_mut() {
            entry.bindings.clear();
        }
        debug!("Removed all {} overlays", count);
    }

    pub fn contains_overlay(&self, overlay: &OverlayRef) -> bool {
        self.state().overlays.contains_key(&OverlayKey::of(overlay))
    }

    pub fn overlays(&self) -> Vec<OverlayRef> {
        self.state().overlays.values().cloned().collect()
    }

    pub fn overlay_count(&self) -> usize {
        self.state().overlays.len()
    }

    /// Starts tracking `renderer`. Returns `false` if it was already tracked.
    pub fn add_base_renderer(&self, renderer: &RendererRef) -> bool {
        let mut state = self.state();
        if self.config.prune_dead_renderers {
            state.prune_dead();
        }
        if state.existing(renderer).is_some() {
            return false;
        }
        state.entry(renderer);
        true
    }

    /// Forgets `renderer` together with its layouters and bindings.
    pub fn remove_base_renderer(&self, renderer: &RendererRef) -> bool {
        let removed = self
            .state()
            .renderers
            .shift_remove(&RendererKey::of(renderer))
            .is_some();
        if removed {
            debug!("Removed renderer '{}'", renderer.name());
        }
        removed
    }

    /// Live renderers, in the order they were first seen.
    pub fn renderers(&self) -> Vec<RendererRef> {
        self.state()
            .renderers
            .values()
            .filter_map(|entry| entry.renderer.upgrade())
            .collect()
    }

    pub fn renderer_count(&self) -> usize {
        self.state()
            .renderers
            .values()
            .filter(|entry| entry.is_alive())
            .count()
    }

    /// Drops the entries of renderers whose owners have released them.
    pub fn prune_renderers(&self) -> usize {
        let pruned = self.state().prune_dead();
        if pruned > 0 {
            debug!("Pruned {} dead renderers", pruned);
        }
        pruned
    }

    /// Makes `layouter` available to [`Self::set_layouter`] on its own renderer.
    ///
    /// A layouter already registered under the same identifier for that
    /// renderer is replaced; overlays bound to the identifier follow the new
    /// instance.
    pub fn add_layouter(&self, layouter: LayouterRef) -> OverlayResult<()> {
        let identifier = layouter.identifier().to_owned();
        let renderer = layouter
            .renderer()
            .upgrade()
            .ok_or_else(|| OverlayError::RendererGone {
                identifier: identifier.clone(),
            })?;

        let mut state = self.state();
        if self.config.prune_dead_renderers {
            state.prune_dead();
        }
        let entry = state.entry(&renderer);
        if entry.layouters.insert(identifier.clone(), layouter).is_some() {
            debug!(
                "Replaced layouter '{}' on renderer '{}'",
                identifier,
                renderer.name()
            );
        } else {
            trace!(
                "Added layouter '{}' on renderer '{}'",
                identifier,
                renderer.name()
            );
        }
        Ok(())
    }

    /// Unregisters the layouter `identifier` of `renderer` and drops the
    /// bindings that pointed at it.
    pub fn remove_layouter(&self, renderer: &RendererRef, identifier: &str) -> Option<LayouterRef> {
        let mut state = self.state();
        let entry = state.existing_mut(renderer)?;
        let layouter = entry.layouters.shift_remove(identifier)?;
        entry.bindings.retain(|_, bound| bound != identifier);
        Some(layouter)
    }

    pub fn get_layouter(&self, renderer: &RendererRef, identifier: &str) -> Option<LayouterRef> {
        self.state()
            .existing(renderer)
            .and_then(|entry| entry.layouters.get(identifier).cloned())
    }

    /// Binds `overlay` to the layouter `identifier` of `renderer`, replacing
    /// any previous binding of the overlay on that renderer. The overlay is
    /// tracked from here on if it was not already.
    pub fn set_layouter(
        &self,
        overlay: &OverlayRef,
        identifier: &str,
        renderer: &RendererRef,
    ) -> OverlayResult<()> {
        let key = OverlayKey::of(overlay);
        let mut state = self.state();

        let entry = state
            .existing_mut(renderer)
            .filter(|entry| entry.layouters.contains_key(identifier))
            .ok_or_else(|| OverlayError::LayouterNotFound {
                identifier: identifier.to_owned(),
                renderer: renderer.name().to_owned(),
            })?;

        if entry.bindings.get(&key).map(String::as_str) != Some(identifier) {
            entry.bindings.shift_remove(&key);
            entry.bindings.insert(key, identifier.to_owned());
        }

        state.overlays.entry(key).or_insert_with(|| overlay.clone());
        trace!(
            "Bound overlay {:?} to '{}' on renderer '{}'",
            key,
            identifier,
            renderer.name()
        );
        Ok(())
    }

    /// Drops the binding of `overlay` on `renderer`, if any.
    pub fn clear_layouter(&self, overlay: &OverlayRef, renderer: &RendererRef) -> bool {
        self.state()
            .existing_mut(renderer)
            .is_some_and(|entry| entry.bindings.shift_remove(&OverlayKey::of(overlay)).is_some())
    }

    /// Identifier of the layouter `overlay` is bound to on `renderer`.
    pub fn layouter_key(&self, overlay: &OverlayRef, renderer: &RendererRef) -> Option<String> {
        self.state()
            .existing(renderer)
            .and_then(|entry| entry.bindings.get(&OverlayKey::of(overlay)).cloned())
    }

    /// The overlays the layouter `identifier` receives on `renderer`.
    pub fn overlays_for_layouter(&self, renderer: &RendererRef, identifier: &str) -> Vec<OverlayRef> {
        let state = self.state();
        let Some(entry) = state.existing(renderer) else {
            return Vec::new();
        };
        entry
            .bindings
            .iter()
            .filter(|(_, bound)| bound.as_str() == identifier)
            .filter_map(|(key, _)| state.overlays.get(key).cloned())
            .collect()
    }

    /// Takes what a frame on `renderer` needs from the tables, so that no
    /// callback runs while the lock is held.
    fn frame_snapshot(
        &self,
        renderer: &RendererRef,
        with_overlays: bool,
    ) -> (Vec<(LayouterRef, Vec<OverlayRef>)>, Vec<OverlayRef>) {
        let mut state = self.state();
        if self.config.prune_dead_renderers {
            let pruned = state.prune_dead();
            if pruned > 0 {
                debug!("Pruned {} dead renderers", pruned);
            }
        }
        state.entry(renderer);

        let plan = state.layout_plan(renderer, self.config.invoke_idle_layouters);
        let overlays = if with_overlays {
            state.overlays.values().cloned().collect()
        } else {
            Vec::new()
        };
        (plan, overlays)
    }

    fn run_layouts(renderer: &RendererRef, plan: Vec<(LayouterRef, Vec<OverlayRef>)>) {
        for (layouter, overlays) in plan {
            trace!(
                "Layouter '{}' placing {} overlays on '{}'",
                layouter.identifier(),
                overlays.len(),
                renderer.name()
            );
            layouter.prepare_layout(renderer, &overlays);
        }
    }

    /// Runs every layouter of `renderer` that has overlays bound to it.
    pub fn update_layouts(&self, renderer: &RendererRef) {
        let (plan, _) = self.frame_snapshot(renderer, false);
        Self::run_layouts(renderer, plan);
    }

    /// Per-frame entry point: lays out `renderer`, then lets every tracked
    /// overlay refresh itself for it, bound or not.
    pub fn update_overlays(&self, renderer: &RendererRef) {
        let (plan, overlays) = self.frame_snapshot(renderer, true);
        Self::run_layouts(renderer, plan);
        for overlay in overlays {
            overlay.update_for_renderer(renderer);
        }
    }

    /// Publishes this manager in its directory and returns the identifier it
    /// ended up with. Returns the current identifier if already registered.
    pub fn register_microservice(self: &Arc<Self>, suggested: Option<&str>) -> OverlayResult<String> {
        let directory = self.directory.upgrade().ok_or(OverlayError::DirectoryGone)?;
        directory.register(self, suggested)
    }

    /// Removes this manager from its directory. Safe to call repeatedly.
    pub fn unregister_microservice(&self) {
        let Some(id) = self.id_slot().take() else {
            return;
        };
        if let Some(directory) = self.directory.upgrade() {
            directory.remove(&id, self);
        }
    }

    pub fn id(&self) -> Option<String> {
        self.id_slot().clone()
    }

    pub(crate) fn set_id(&self, id: Option<String>) {
        *self.id_slot() = id;
    }
}
