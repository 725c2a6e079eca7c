//! Viewer lifecycle management

use std::path::Path;

use cloudview_core::{Error, Result};
use cloudview_io::{CloudSource, LoadedCloud};
use cloudview_render::{CameraMatrices, RenderBackend};

use crate::camera::Camera;
use crate::events::{EventSink, LogSink, ViewerEvent};
use crate::framing::{compute_framing, default_framing, Framing};
use crate::resource::CloudResource;
use crate::scheduler::{FrameScheduler, TickHandle};
use crate::state::{FpsCounter, LifecyclePhase, ManagerState};

/// Container dimensions handed to [`ViewerManager::initialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Fallback size used when the container reports zero dimensions
    pub const DEFAULT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Replace zero dimensions with the default size
    fn or_default(self) -> Self {
        if self.width == 0 || self.height == 0 {
            Self::DEFAULT
        } else {
            self
        }
    }

    fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Ticket identifying one load request
///
/// Tickets are issued in monotonically increasing order; only the most
/// recently issued one can complete into the displayed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Drawable surface bundle: render backend, camera and viewport
///
/// Built once per manager lifetime by `initialize`, dropped by
/// `destroy`; never shared outside the manager.
pub struct RenderSurface<B> {
    pub backend: B,
    pub camera: Camera,
    viewport: Viewport,
}

impl<B> RenderSurface<B> {
    /// Current viewport size
    pub fn viewport(&self) -> (u32, u32) {
        (self.viewport.width, self.viewport.height)
    }
}

/// Owns the render surface, the attached point cloud and the render
/// loop, and exposes the viewer lifecycle to UI shells
///
/// `B` is the rendering engine, `S` the host's frame scheduler. All
/// methods run on the driving thread; loads are awaited elsewhere and
/// re-enter through [`finish_load`](Self::finish_load).
pub struct ViewerManager<B, S> {
    phase: LifecyclePhase,
    surface: Option<RenderSurface<B>>,
    resource: Option<CloudResource>,
    state: ManagerState,
    scheduler: S,
    sink: Box<dyn EventSink>,
    pending_tick: Option<TickHandle>,
    next_ticket: u64,
    active_ticket: Option<LoadTicket>,
    fps: FpsCounter,
}

impl<B, S> ViewerManager<B, S>
where
    B: RenderBackend,
    S: FrameScheduler,
{
    /// Create a manager logging through the `log` facade
    pub fn new(scheduler: S) -> Self {
        Self::with_sink(scheduler, Box::new(LogSink))
    }

    /// Create a manager with a custom event sink
    pub fn with_sink(scheduler: S, sink: Box<dyn EventSink>) -> Self {
        Self {
            phase: LifecyclePhase::Uninitialized,
            surface: None,
            resource: None,
            state: ManagerState::default(),
            scheduler,
            sink,
            pending_tick: None,
            next_ticket: 0,
            active_ticket: None,
            fps: FpsCounter::new(),
        }
    }

    /// Build the render surface and start the render loop
    ///
    /// `build_backend` constructs the engine for the (possibly
    /// defaulted) viewport; a failure there surfaces as an
    /// initialization error and no loop starts. Calling this while
    /// already initialized keeps the existing surface.
    pub fn initialize<F>(&mut self, viewport: Viewport, build_backend: F) -> Result<()>
    where
        F: FnOnce(Viewport) -> Result<B>,
    {
        match self.phase {
            LifecyclePhase::Destroyed => {
                let message = Error::Destroyed.to_string();
                self.state.error = Some(message.clone());
                self.sink.record(ViewerEvent::InitFailed { message });
                return Err(Error::Destroyed);
            }
            LifecyclePhase::Ready => {
                self.sink.record(ViewerEvent::InitSkipped);
                return Ok(());
            }
            LifecyclePhase::Uninitialized => {}
        }

        self.sink.record(ViewerEvent::InitStarted);
        self.state.error = None;

        let viewport = viewport.or_default();
        let backend = match build_backend(viewport) {
            Ok(backend) => backend,
            Err(e) => {
                let error = Error::Initialization(e.to_string());
                let message = error.to_string();
                self.state.error = Some(message.clone());
                self.sink.record(ViewerEvent::InitFailed { message });
                return Err(error);
            }
        };

        let mut camera = Camera::default();
        camera.aspect_ratio = viewport.aspect_ratio();

        self.surface = Some(RenderSurface {
            backend,
            camera,
            viewport,
        });
        self.phase = LifecyclePhase::Ready;
        self.pending_tick = Some(self.scheduler.schedule_tick());
        self.sink.record(ViewerEvent::InitCompleted {
            width: viewport.width,
            height: viewport.height,
        });

        Ok(())
    }

    /// Keep camera aspect and drawable size in sync with the container
    pub fn resize(&mut self, width: u32, height: u32) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if width == 0 || height == 0 {
            return;
        }

        surface.viewport = Viewport::new(width, height);
        surface.camera.aspect_ratio = surface.viewport.aspect_ratio();
        surface.backend.resize(width, height);
    }

    /// Fetch, decode and attach a point cloud
    ///
    /// Requires a successful `initialize`. The previously attached
    /// resource is released before the fetch is issued; a failure
    /// leaves the viewer with no cloud (no rollback). Completion always
    /// clears `is_loading`.
    pub async fn load_point_cloud<L>(
        &mut self,
        source: &L,
        locator: &Path,
        name: Option<&str>,
    ) -> Result<()>
    where
        L: CloudSource,
    {
        let display_name = display_name(locator, name);
        let ticket = self.begin_load(&display_name)?;
        let result = source.fetch(locator).await.map(|loaded| LoadedCloud {
            name: display_name,
            ..loaded
        });
        self.finish_load(ticket, result)
    }

    /// Start a load: release the current resource, mark loading, issue
    /// a ticket
    ///
    /// Split from [`finish_load`](Self::finish_load) so hosts can await
    /// the fetch off the driving thread and hand the result back.
    pub fn begin_load(&mut self, display_name: &str) -> Result<LoadTicket> {
        let unavailable = match self.phase {
            LifecyclePhase::Uninitialized => Some(Error::Uninitialized),
            LifecyclePhase::Destroyed => Some(Error::Destroyed),
            LifecyclePhase::Ready => None,
        };
        if let Some(error) = unavailable {
            self.state.error = Some(error.to_string());
            self.sink.record(ViewerEvent::LoadFailed {
                message: error.to_string(),
            });
            return Err(error);
        }

        // Release the previous cloud before the replacement is fetched
        if self.resource.take().is_some() {
            if let Some(surface) = self.surface.as_mut() {
                surface.backend.detach_cloud();
            }
        }

        self.state.is_loading = true;
        self.state.error = None;

        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        self.active_ticket = Some(ticket);
        self.sink.record(ViewerEvent::LoadStarted {
            name: display_name.to_string(),
        });

        Ok(ticket)
    }

    /// Complete a load started with [`begin_load`](Self::begin_load)
    ///
    /// Results for any ticket other than the most recently issued one
    /// are discarded (last-issued-wins), as are results arriving after
    /// `destroy`.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<LoadedCloud>,
    ) -> Result<()> {
        if self.phase == LifecyclePhase::Destroyed {
            return Ok(());
        }
        if self.active_ticket != Some(ticket) {
            if let Ok(loaded) = result {
                self.sink
                    .record(ViewerEvent::LoadSuperseded { name: loaded.name });
            }
            return Ok(());
        }

        self.active_ticket = None;
        self.state.is_loading = false;

        let loaded = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                let message = e.to_string();
                self.state.error = Some(message.clone());
                self.sink.record(ViewerEvent::LoadFailed { message });
                return Err(e);
            }
        };

        // A live ticket implies a live surface
        let Some(surface) = self.surface.as_mut() else {
            return Err(Error::Uninitialized);
        };

        if let Err(e) = surface.backend.attach_cloud(&loaded.cloud.points) {
            let error = Error::Load(e.to_string());
            let message = error.to_string();
            self.state.error = Some(message.clone());
            self.sink.record(ViewerEvent::LoadFailed { message });
            return Err(error);
        }

        let framing = loaded
            .bounds
            .as_ref()
            .map(|bounds| compute_framing(bounds, surface.camera.fov))
            .unwrap_or_else(default_framing);
        apply_framing(&mut surface.camera, framing);

        self.sink.record(ViewerEvent::LoadCompleted {
            name: loaded.name.clone(),
            point_count: loaded.point_count(),
        });
        let point_count = loaded.point_count();
        self.resource = Some(CloudResource::new(
            loaded.name,
            point_count,
            loaded.bounds,
        ));

        Ok(())
    }

    /// Reframe the camera on the attached cloud
    ///
    /// No-op without a surface or a resource; a resource without bounds
    /// resets to the fixed default placement.
    pub fn reset_camera(&mut self) {
        let (Some(surface), Some(resource)) = (self.surface.as_mut(), self.resource.as_ref())
        else {
            return;
        };

        let framing = resource
            .bounds
            .as_ref()
            .map(|bounds| compute_framing(bounds, surface.camera.fov))
            .unwrap_or_else(default_framing);
        apply_framing(&mut surface.camera, framing);
        self.sink.record(ViewerEvent::CameraReset);
    }

    /// Run one frame for the given scheduled tick
    ///
    /// Stale or cancelled handles are ignored; a live tick renders and
    /// schedules the next one.
    pub fn tick(&mut self, handle: TickHandle) {
        if self.pending_tick != Some(handle) {
            return;
        }
        self.pending_tick = None;

        self.update();

        if self.phase == LifecyclePhase::Ready {
            self.pending_tick = Some(self.scheduler.schedule_tick());
        }
    }

    /// Render one frame
    ///
    /// Never fails: backend errors are swallowed (logged at debug
    /// level) so the loop stays alive.
    pub fn update(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        if self.resource.is_some() {
            if let Err(e) = surface.backend.refresh() {
                log::debug!("per-frame refresh failed: {}", e);
            }
        }

        let matrices = CameraMatrices {
            view: surface.camera.view_matrix(),
            projection: surface.camera.projection_matrix(),
            position: surface.camera.position.coords,
        };
        surface.backend.set_camera(&matrices);

        if let Err(e) = surface.backend.draw() {
            log::debug!("draw failed: {}", e);
        }

        self.fps.frame();
    }

    /// Tear down the viewer
    ///
    /// Idempotent and safe before `initialize`: cancels the pending
    /// tick, releases the attached cloud and the surface, and moves to
    /// the terminal phase. A load completing afterwards is discarded.
    pub fn destroy(&mut self) {
        if self.phase == LifecyclePhase::Destroyed {
            return;
        }

        if let Some(handle) = self.pending_tick.take() {
            self.scheduler.cancel_tick(handle);
        }
        if let Some(mut surface) = self.surface.take() {
            surface.backend.detach_cloud();
        }
        self.resource = None;
        self.active_ticket = None;
        self.state.is_loading = false;
        self.phase = LifecyclePhase::Destroyed;
        self.sink.record(ViewerEvent::Destroyed);
    }

    /// Observable loading/error state
    pub fn state(&self) -> &ManagerState {
        &self.state
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// The attached resource, if any
    pub fn resource(&self) -> Option<&CloudResource> {
        self.resource.as_ref()
    }

    /// Points in the attached resource
    pub fn point_count(&self) -> Option<usize> {
        self.resource.as_ref().map(|r| r.point_count)
    }

    /// Frames rendered per second over the last full window
    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    /// The tick the manager is waiting on, if the loop is running
    pub fn pending_tick(&self) -> Option<TickHandle> {
        self.pending_tick
    }

    /// The owned surface, for hosts adjusting camera or render settings
    pub fn surface_mut(&mut self) -> Option<&mut RenderSurface<B>> {
        self.surface.as_mut()
    }

    pub fn surface(&self) -> Option<&RenderSurface<B>> {
        self.surface.as_ref()
    }

    /// The host-supplied scheduler
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

fn apply_framing(camera: &mut Camera, framing: Framing) {
    camera.position = framing.position;
    camera.target = framing.look_at;
}

fn display_name(locator: &Path, name: Option<&str>) -> String {
    match name {
        Some(name) => name.to_string(),
        None => locator
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("PointCloud")
            .to_string(),
    }
}
