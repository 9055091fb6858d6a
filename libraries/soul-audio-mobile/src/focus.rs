/// Simulated OS audio focus
use soul_playback::AudioFocusFacility;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// Focus facility whose answer can be flipped at runtime
///
/// Clones share state, so the app keeps one to script denials while the
/// controller owns another.
#[derive(Debug, Clone)]
pub struct SimulatedFocus {
    grant: Arc<AtomicBool>,
    held: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
}

impl Default for SimulatedFocus {
    fn default() -> Self {
        Self {
            grant: Arc::new(AtomicBool::new(true)),
            held: Arc::new(AtomicBool::new(false)),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl SimulatedFocus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer future requests with `grant`
    pub fn set_grant(&self, grant: bool) {
        self.grant.store(grant, Ordering::SeqCst);
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl AudioFocusFacility for SimulatedFocus {
    fn request(&mut self) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let granted = self.grant.load(Ordering::SeqCst);
        self.held.store(granted, Ordering::SeqCst);
        info!(granted, "Audio focus requested");
        granted
    }

    fn abandon(&mut self) {
        self.held.store(false, Ordering::SeqCst);
        info!("Audio focus abandoned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_denial_applies_to_clones() {
        let script = SimulatedFocus::new();
        let mut facility = script.clone();

        assert!(facility.request());
        assert!(script.is_held());

        script.set_grant(false);
        assert!(!facility.request());
        assert!(!script.is_held());
        assert_eq!(script.requests(), 2);
    }

    #[test]
    fn abandon_releases() {
        let mut focus = SimulatedFocus::new();
        focus.request();
        focus.abandon();
        assert!(!focus.is_held());
    }
}
