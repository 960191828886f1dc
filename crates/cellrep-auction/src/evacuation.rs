//! Evacuation gate.
//!
//! Evacuation is detected elsewhere; the rep only reads the flag. `state`
//! and `perform` each read it independently, so evacuation starting between
//! the two is caught by `perform`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

pub trait EvacuationReporter: Send + Sync {
    fn evacuating(&self) -> bool;
}

/// Shared evacuation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct EvacuationContext {
    evacuating: Arc<AtomicBool>,
}

impl EvacuationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the cell as draining. Idempotent.
    pub fn begin_evacuating(&self) {
        if !self.evacuating.swap(true, Ordering::SeqCst) {
            info!("evacuation started");
        }
    }
}

impl EvacuationReporter for EvacuationContext {
    fn evacuating(&self) -> bool {
        self.evacuating.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_not_evacuating() {
        assert!(!EvacuationContext::new().evacuating());
    }

    #[test]
    fn clones_share_the_flag() {
        let ctx = EvacuationContext::new();
        let reporter = ctx.clone();

        ctx.begin_evacuating();
        assert!(reporter.evacuating());

        ctx.begin_evacuating();
        assert!(reporter.evacuating());
    }
}
