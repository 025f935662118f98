use crate::config::{CollisionPolicy, ConfigRef};
use crate::overlay::manager::OverlayManager;
use crate::overlay::{OverlayError, OverlayResult};
use indexmap::IndexMap;
use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Resolves overlay managers by identifier.
///
/// The directory owns every manager registered in it: a manager stays alive
/// until it is unregistered or the directory is cleared or dropped. Each
/// subsystem that needs to share a manager is handed the directory rather
/// than reaching for a global.
#[derive(Debug)]
pub struct ManagerDirectory {
    config: ConfigRef,
    managers: Mutex<IndexMap<String, Arc<OverlayManager>>>,
    this: Weak<ManagerDirectory>,
}

impl ManagerDirectory {
    pub fn new(config: ConfigRef) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            config,
            managers: Mutex::new(IndexMap::new()),
            this: this.clone(),
        })
    }

    fn managers(&self) -> MutexGuard<'_, IndexMap<String, Arc<OverlayManager>>> {
        self.managers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &ConfigRef {
        &self.config
    }

    /// Builds a manager bound to this directory without publishing it.
    pub fn create_manager(&self) -> Arc<OverlayManager> {
        Arc::new(OverlayManager::new(self.config.clone(), self.this.clone()))
    }

    /// Returns the manager published under `id`, creating and publishing one
    /// if there is none. Concurrent callers asking for the same `id` always
    /// converge on a single instance.
    pub fn get_service_instance(&self, id: &str) -> Arc<OverlayManager> {
        let mut managers = self.managers();
        if let Some(manager) = managers.get(id) {
            return manager.clone();
        }

        let manager = self.create_manager();
        manager.set_id(Some(id.to_owned()));
        managers.insert(id.to_owned(), manager.clone());
        info!("Created overlay manager '{}'", id);
        manager
    }

    /// [`Self::get_service_instance`] for the configured default identifier.
    pub fn default_instance(&self) -> Arc<OverlayManager> {
        self.get_service_instance(&self.config.default_manager_id)
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<OverlayManager>> {
        self.managers().get(id).cloned()
    }

    /// Identifiers of all published managers, in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.managers().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.managers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers().is_empty()
    }

    /// Unregisters every manager. Handles held elsewhere stay usable but no
    /// longer resolve through the directory.
    pub fn clear(&self) {
        let drained: Vec<_> = self.managers().drain(..).collect();
        for (id, manager) in drained {
            manager.set_id(None);
            debug!("Unregistered overlay manager '{}'", id);
        }
    }

    pub(crate) fn register(
        &self,
        manager: &Arc<OverlayManager>,
        suggested: Option<&str>,
    ) -> OverlayResult<String> {
        let mut managers = self.managers();
        if let Some(id) = manager.id() {
            return Ok(id);
        }

        let base = suggested.unwrap_or(self.config.default_manager_id.as_str());
        let id = if !managers.contains_key(base) {
            base.to_owned()
        } else if suggested.is_some() && self.config.id_collision == CollisionPolicy::Reject {
            return Err(OverlayError::IdentifierInUse(base.to_owned()));
        } else {
            let mut suffix = 1usize;
            loop {
                let candidate = format!("{base}-{suffix}");
                if !managers.contains_key(&candidate) {
                    break candidate;
                }
                suffix += 1;
            }
        };

        manager.set_id(Some(id.clone()));
        managers.insert(id.clone(), manager.clone());
        info!("Registered overlay manager '{}'", id);
        Ok(id)
    }

    /// Removes `id` if it still maps to `manager`.
    pub(crate) fn remove(&self, id: &str, manager: &OverlayManager) -> bool {
        let mut managers = self.managers();
        let owned = managers
            .get(id)
            .is_some_and(|registered| std::ptr::eq(Arc::as_ptr(registered), manager));
        if owned {
            managers.shift_remove(id);
            debug!("Unregistered overlay manager '{}'", id);
        }
        owned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;

    fn new_directory(policy: CollisionPolicy) -> Arc<ManagerDirectory> {
        let config = OverlayConfig {
            id_collision: policy,
            ..OverlayConfig::default()
        };
        ManagerDirectory::new(config.into_ref())
    }

    #[test]
    fn test_get_service_instance_is_shared() {
        let directory = new_directory(CollisionPolicy::Suffix);
        let a = directory.get_service_instance("X");
        let b = directory.get_service_instance("X");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.id().as_deref(), Some("X"));
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_default_instance_uses_configured_id() {
        let directory = new_directory(CollisionPolicy::Suffix);
        let manager = directory.default_instance();
        assert_eq!(manager.id().as_deref(), Some("0"));
        assert!(Arc::ptr_eq(&manager, &directory.get_service_instance("0")));
    }

    #[test]
    fn test_register_without_suggestion_uses_default_then_suffixes() {
        let directory = new_directory(CollisionPolicy::Reject);
        let first = directory.create_manager();
        let second = directory.create_manager();
        let third = directory.create_manager();

        assert_eq!(first.register_microservice(None).unwrap(), "0");
        assert_eq!(second.register_microservice(None).unwrap(), "0-1");
        assert_eq!(third.register_microservice(None).unwrap(), "0-2");
        assert_eq!(directory.ids(), vec!["0", "0-1", "0-2"]);
    }

    #[test]
    fn test_register_suffix_policy() {
        let directory = new_directory(CollisionPolicy::Suffix);
        let first = directory.create_manager();
        let second = directory.create_manager();

        assert_eq!(first.register_microservice(Some("view")).unwrap(), "view");
        assert_eq!(second.register_microservice(Some("view")).unwrap(), "view-1");
        assert!(Arc::ptr_eq(&directory.lookup("view").unwrap(), &first));
    }

    #[test]
    fn test_register_reject_policy() {
        let directory = new_directory(CollisionPolicy::Reject);
        let first = directory.create_manager();
        let second = directory.create_manager();

        first.register_microservice(Some("view")).unwrap();
        let result = second.register_microservice(Some("view"));

        assert!(matches!(result, Err(OverlayError::IdentifierInUse(id)) if id == "view"));
        assert!(second.id().is_none());
        assert!(Arc::ptr_eq(&directory.lookup("view").unwrap(), &first));
    }

    #[test]
    fn test_register_twice_keeps_identifier() {
        let directory = new_directory(CollisionPolicy::Suffix);
        let manager = directory.create_manager();
        let id = manager.register_microservice(Some("a")).unwrap();
        assert_eq!(manager.register_microservice(Some("b")).unwrap(), id);
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let directory = new_directory(CollisionPolicy::Suffix);
        let manager = directory.create_manager();
        manager.register_microservice(None).unwrap();

        manager.unregister_microservice();
        manager.unregister_microservice();

        assert!(manager.id().is_none());
        assert!(directory.is_empty());
    }

    #[test]
    fn test_unregister_frees_identifier_for_reuse() {
        let directory = new_directory(CollisionPolicy::Suffix);
        let first = directory.get_service_instance("X");
        first.unregister_microservice();

        let second = directory.get_service_instance("X");
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_clear_unregisters_everything() {
        let directory = new_directory(CollisionPolicy::Suffix);
        let a = directory.get_service_instance("a");
        let b = directory.get_service_instance("b");

        directory.clear();

        assert!(directory.is_empty());
        assert!(a.id().is_none());
        assert!(b.id().is_none());
    }

    #[test]
    fn test_register_after_directory_dropped() {
        let directory = new_directory(CollisionPolicy::Suffix);
        let manager = directory.create_manager();
        drop(directory);

        assert!(matches!(
            manager.register_microservice(None),
            Err(OverlayError::DirectoryGone)
        ));
        manager.unregister_microservice();
    }
}
