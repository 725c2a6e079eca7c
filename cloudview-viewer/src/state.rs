//! Observable manager state

use instant::Instant;

/// Status exposed to UI shells
///
/// Mutated only by the manager; `is_loading` is true strictly between
/// the start and completion of a load, and `error` is cleared at the
/// start of every attempt and set only when that attempt fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerState {
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Lifecycle phase of a viewer manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Uninitialized,
    Ready,
    /// Terminal; only reached through `destroy`
    Destroyed,
}

/// Frames-per-second counter over a one second window
#[derive(Debug)]
pub struct FpsCounter {
    window_start: Instant,
    frame_count: u32,
    fps: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frame_count: 0,
            fps: 0,
        }
    }

    /// Count one rendered frame
    pub fn frame(&mut self) {
        self.frame_count += 1;
        let now = Instant::now();
        if now.duration_since(self.window_start).as_millis() >= 1000 {
            self.fps = self.frame_count;
            self.frame_count = 0;
            self.window_start = now;
        }
    }

    /// Frames counted in the last full window
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        let state = ManagerState::default();
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[test]
    fn fps_reports_zero_before_first_window() {
        let mut counter = FpsCounter::new();
        counter.frame();
        counter.frame();
        assert_eq!(counter.fps(), 0);
    }
}
