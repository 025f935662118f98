use overlay_core::mock::{CallLog, MockRenderer, RecordingOverlay};
use overlay_core::{ManagerDirectory, OverlayConfig, OverlayManager, OverlayRef, RendererRef, Size};
use std::sync::{Arc, Barrier};
use std::thread;

fn new_directory() -> Arc<ManagerDirectory> {
    ManagerDirectory::new(OverlayConfig::default().into_ref())
}

#[test]
fn test_call_sites_share_one_manager() {
    let directory = new_directory();
    let log = CallLog::new();
    let renderer: RendererRef = MockRenderer::new("axial", Size::new(100, 100));

    let from_view = directory.get_service_instance("X");
    let from_tool = directory.get_service_instance("X");
    let overlay: OverlayRef = RecordingOverlay::new("O", log.clone());
    from_view.add_overlay(&overlay);

    from_tool.update_overlays(&renderer);

    assert!(Arc::ptr_eq(&from_view, &from_tool));
    assert_eq!(log.update_count(), 1);
}

#[test]
fn test_racing_first_use_creates_one_instance() {
    let directory = new_directory();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let directory = directory.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                directory.get_service_instance("shared")
            })
        })
        .collect();
    let managers: Vec<Arc<OverlayManager>> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert!(managers.iter().all(|m| Arc::ptr_eq(m, &managers[0])));
    assert_eq!(directory.ids(), vec!["shared"]);
}

#[test]
fn test_racing_registrations_get_distinct_ids() {
    let directory = new_directory();
    let barrier = Arc::new(Barrier::new(6));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let manager = directory.create_manager();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                manager.register_microservice(Some("view")).unwrap()
            })
        })
        .collect();
    let mut ids: Vec<String> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    ids.sort();

    assert_eq!(ids, vec!["view", "view-1", "view-2", "view-3", "view-4", "view-5"]);
    assert_eq!(directory.len(), 6);
}

#[test]
fn test_unregistered_manager_keeps_its_state() {
    let directory = new_directory();
    let manager = directory.get_service_instance("X");
    let overlay: OverlayRef = RecordingOverlay::new("O", CallLog::new());
    manager.add_overlay(&overlay);

    manager.unregister_microservice();

    assert!(directory.lookup("X").is_none());
    assert!(manager.id().is_none());
    assert!(manager.contains_overlay(&overlay));
}

#[test]
fn test_reregister_after_unregister() {
    let directory = new_directory();
    let manager = directory.create_manager();

    assert_eq!(manager.register_microservice(None).unwrap(), "0");
    manager.unregister_microservice();
    assert_eq!(manager.register_microservice(Some("again")).unwrap(), "again");
    assert!(Arc::ptr_eq(&directory.lookup("again").unwrap(), &manager));
}
