use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use crate::error::CameraError;
use crate::pipeline::FrameSink;

/// Default capacity of a [`CameraRegistry`].
pub const MAX_CAMERAS: usize = 64;

/// Tracks every live frame pipeline so all capture can be halted at once,
/// typically when the process backgrounds or shuts down.
///
/// The registry holds weak references only; a dropped camera vacates its
/// slot without explicit bookkeeping.
pub struct CameraRegistry {
    sinks: Mutex<Vec<Weak<FrameSink>>>,
    capacity: usize,
}

fn lock(m: &Mutex<Vec<Weak<FrameSink>>>) -> MutexGuard<'_, Vec<Weak<FrameSink>>> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl CameraRegistry {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CAMERAS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sinks: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Enrolls a pipeline.
    ///
    /// # Errors
    ///
    /// `CameraError::Device` when every slot is taken by a live pipeline.
    pub fn register(&self, sink: &Arc<FrameSink>) -> Result<(), CameraError> {
        let mut sinks = lock(&self.sinks);
        sinks.retain(|w| w.strong_count() > 0);
        if sinks.len() >= self.capacity {
            return Err(CameraError::Device(format!(
                "camera registry is full ({} slots)",
                self.capacity
            )));
        }
        sinks.push(Arc::downgrade(sink));
        Ok(())
    }

    /// Removes a pipeline. Unknown sinks are ignored.
    pub fn unregister(&self, sink: &Arc<FrameSink>) {
        let mut sinks = lock(&self.sinks);
        sinks.retain(|w| match w.upgrade() {
            Some(live) => !Arc::ptr_eq(&live, sink),
            None => false,
        });
    }

    /// Number of live registered pipelines.
    pub fn len(&self) -> usize {
        lock(&self.sinks).iter().filter(|w| w.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bars delivery on every registered pipeline, then waits up to `grace`
    /// per pipeline for in-flight frames to finish. Sources keep their
    /// threads; this only makes the sinks drop everything they receive.
    pub fn stop_all(&self, grace: Duration) {
        let live: Vec<Arc<FrameSink>> = {
            let sinks = lock(&self.sinks);
            sinks.iter().filter_map(Weak::upgrade).collect()
        };
        for sink in &live {
            sink.begin_stop();
        }
        for sink in &live {
            if !sink.wait_idle(grace) {
                log::warn!("a pipeline did not go idle within {grace:?}");
            }
        }
        log::info!("stopped {} camera pipeline(s)", live.len());
    }
}

impl Default for CameraRegistry {
    fn default() -> Self {
        Self::new()
    }
}
