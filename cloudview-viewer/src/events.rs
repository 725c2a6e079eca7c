//! Lifecycle events and the logging seam
//!
//! The manager reports what it does through a typed event stream rather
//! than writing to an output stream directly; hosts pick the sink. The
//! default forwards to the `log` facade.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error, info, warn};

/// Events emitted at defined lifecycle points
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    InitStarted,
    InitCompleted { width: u32, height: u32 },
    InitFailed { message: String },
    /// `initialize` called while already initialized; kept idempotent
    InitSkipped,
    LoadStarted { name: String },
    LoadCompleted { name: String, point_count: usize },
    LoadFailed { message: String },
    /// A load completed after a newer request replaced it; discarded
    LoadSuperseded { name: String },
    CameraReset,
    Destroyed,
}

/// Sink for lifecycle events
pub trait EventSink {
    fn record(&mut self, event: ViewerEvent);
}

/// Sink forwarding events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::InitStarted => debug!("viewer init started"),
            ViewerEvent::InitCompleted { width, height } => {
                info!("viewer initialized at {}x{}", width, height)
            }
            ViewerEvent::InitFailed { message } => error!("viewer init failed: {}", message),
            ViewerEvent::InitSkipped => warn!("viewer already initialized; init skipped"),
            ViewerEvent::LoadStarted { name } => info!("loading point cloud '{}'", name),
            ViewerEvent::LoadCompleted { name, point_count } => {
                info!("loaded point cloud '{}' ({} points)", name, point_count)
            }
            ViewerEvent::LoadFailed { message } => error!("point cloud load failed: {}", message),
            ViewerEvent::LoadSuperseded { name } => {
                debug!("discarded superseded load result for '{}'", name)
            }
            ViewerEvent::CameraReset => debug!("camera reset"),
            ViewerEvent::Destroyed => info!("viewer destroyed"),
        }
    }
}

/// Sink recording events in memory
///
/// Clones share the same buffer, so a handle kept outside the manager
/// observes everything the manager records.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<ViewerEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<ViewerEvent> {
        self.events.borrow().clone()
    }
}

impl EventSink for RecordingSink {
    fn record(&mut self, event: ViewerEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_shares_its_buffer_across_clones() {
        let sink = RecordingSink::new();
        let mut writer = sink.clone();

        writer.record(ViewerEvent::InitStarted);
        writer.record(ViewerEvent::CameraReset);

        assert_eq!(
            sink.events(),
            vec![ViewerEvent::InitStarted, ViewerEvent::CameraReset]
        );
    }
}
