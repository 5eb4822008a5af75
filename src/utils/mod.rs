use std::time::Instant;
use tracing::{debug, info};

/// Logs how long a scope took when dropped.
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    pub fn start(label: &'static str) -> Self {
        debug!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!("⏱  {} took {:.2?}", self.label, self.start.elapsed());
    }
}
