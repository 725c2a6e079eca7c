//! End-to-end lifecycle tests driving the manager with a fake backend,
//! a manual scheduler and an in-memory cloud source.

use std::future::Future;
use std::path::Path;

use cloudview_core::{ColoredPoint3f, Error, Point3f, PointCloud, Result};
use cloudview_io::{CloudSource, LoadedCloud};
use cloudview_render::{CameraMatrices, RenderBackend};
use cloudview_viewer::{
    LifecyclePhase, ManualScheduler, RecordingSink, ViewerEvent, ViewerManager, Viewport,
};

#[derive(Debug, Default)]
struct FakeBackend {
    attached: Option<usize>,
    detach_calls: usize,
    draw_calls: usize,
}

impl RenderBackend for FakeBackend {
    fn resize(&mut self, _width: u32, _height: u32) {}

    fn set_camera(&mut self, _camera: &CameraMatrices) {}

    fn attach_cloud(&mut self, points: &[ColoredPoint3f]) -> Result<()> {
        self.attached = Some(points.len());
        Ok(())
    }

    fn detach_cloud(&mut self) {
        self.attached = None;
        self.detach_calls += 1;
    }

    fn refresh(&mut self) -> Result<()> {
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        self.draw_calls += 1;
        Ok(())
    }
}

/// Source serving a fixed cloud, or failing when `points` is `None`
struct FixedSource {
    points: Option<usize>,
}

impl CloudSource for FixedSource {
    fn fetch(&self, locator: &Path) -> impl Future<Output = Result<LoadedCloud>> + Send {
        let result = match self.points {
            Some(n) => {
                let cloud: PointCloud<ColoredPoint3f> = (0..n)
                    .map(|i| ColoredPoint3f::from_position(Point3f::new(i as f32, 0.0, 0.0)))
                    .collect();
                Ok(LoadedCloud::from_cloud(
                    locator.file_stem().and_then(|s| s.to_str()).unwrap_or(""),
                    cloud,
                ))
            }
            None => Err(Error::Load("unreadable cloud".to_string())),
        };
        async move { result }
    }
}

fn ready_manager() -> ViewerManager<FakeBackend, ManualScheduler> {
    let mut manager = ViewerManager::new(ManualScheduler::new());
    manager
        .initialize(Viewport::new(1024, 768), |_| Ok(FakeBackend::default()))
        .unwrap();
    manager
}

#[test]
fn full_session_load_view_reset_destroy() {
    let mut manager = ready_manager();
    let source = FixedSource { points: Some(500) };

    pollster::block_on(manager.load_point_cloud(&source, Path::new("scan.ply"), None)).unwrap();

    assert_eq!(manager.point_count(), Some(500));
    assert_eq!(manager.resource().unwrap().name, "scan");
    assert!(!manager.state().is_loading);
    assert!(manager.state().error.is_none());

    // Drive a few frames
    for _ in 0..3 {
        let handle = manager.pending_tick().unwrap();
        manager.tick(handle);
    }
    assert_eq!(manager.surface().unwrap().backend.draw_calls, 3);

    // Perturb the camera, then reset back onto the cloud
    manager.surface_mut().unwrap().camera.position = Point3f::new(0.0, 0.0, -1.0);
    manager.reset_camera();
    let camera = &manager.surface().unwrap().camera;
    assert_eq!(camera.target.x, 249.5);

    manager.destroy();
    assert_eq!(manager.phase(), LifecyclePhase::Destroyed);
    assert!(manager.surface().is_none());
}

#[test]
fn display_name_override_reaches_the_resource() {
    let mut manager = ready_manager();
    let source = FixedSource { points: Some(1) };

    pollster::block_on(manager.load_point_cloud(
        &source,
        Path::new("raw_export.ply"),
        Some("Survey 42"),
    ))
    .unwrap();

    assert_eq!(manager.resource().unwrap().name, "Survey 42");
}

#[test]
fn failed_load_then_recovery() {
    let mut manager = ready_manager();

    let broken = FixedSource { points: None };
    let result =
        pollster::block_on(manager.load_point_cloud(&broken, Path::new("bad.ply"), None));
    assert!(result.is_err());
    assert!(manager.resource().is_none());
    assert!(manager.state().error.as_deref().unwrap().contains("unreadable"));
    assert!(!manager.state().is_loading);

    // The loop is still alive after a failed load
    let handle = manager.pending_tick().unwrap();
    manager.tick(handle);
    assert!(manager.pending_tick().is_some());

    let working = FixedSource { points: Some(9) };
    pollster::block_on(manager.load_point_cloud(&working, Path::new("good.ply"), None)).unwrap();
    assert!(manager.state().error.is_none());
    assert_eq!(manager.point_count(), Some(9));
}

#[test]
fn load_before_initialize_reports_uninitialized() {
    let mut manager: ViewerManager<FakeBackend, _> = ViewerManager::new(ManualScheduler::new());
    let source = FixedSource { points: Some(1) };

    let result =
        pollster::block_on(manager.load_point_cloud(&source, Path::new("scan.ply"), None));

    assert!(matches!(result, Err(Error::Uninitialized)));
    assert!(!manager.state().is_loading);
    assert!(manager.state().error.is_some());
    assert!(manager.resource().is_none());
}

#[test]
fn replacement_load_swaps_the_resource() {
    let mut manager = ready_manager();

    let first = FixedSource { points: Some(10) };
    pollster::block_on(manager.load_point_cloud(&first, Path::new("first.ply"), None)).unwrap();

    let second = FixedSource { points: Some(20) };
    pollster::block_on(manager.load_point_cloud(&second, Path::new("second.ply"), None)).unwrap();

    let surface = manager.surface().unwrap();
    assert_eq!(surface.backend.attached, Some(20));
    assert_eq!(surface.backend.detach_calls, 1);
    assert_eq!(manager.resource().unwrap().name, "second");
}

#[test]
fn no_tick_fires_after_destroy() {
    let mut manager = ready_manager();
    let handle = manager.pending_tick().unwrap();

    manager.destroy();
    manager.destroy();

    // The cancelled handle going off late must not render or reschedule
    manager.tick(handle);
    assert!(manager.pending_tick().is_none());
    assert_eq!(manager.scheduler().cancelled_count(), 1);
}

#[test]
fn events_cover_failure_paths() {
    let sink = RecordingSink::new();
    let mut manager: ViewerManager<FakeBackend, _> =
        ViewerManager::with_sink(ManualScheduler::new(), Box::new(sink.clone()));

    manager
        .initialize(Viewport::new(0, 0), |_| Ok(FakeBackend::default()))
        .unwrap();
    let broken = FixedSource { points: None };
    let _ = pollster::block_on(manager.load_point_cloud(&broken, Path::new("bad.ply"), None));

    let events = sink.events();
    assert!(events.contains(&ViewerEvent::InitCompleted {
        width: 800,
        height: 600
    }));
    assert!(events
        .iter()
        .any(|e| matches!(e, ViewerEvent::LoadFailed { .. })));
}
