use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable abort flag handed to `Dispatcher::dispatch_with_signal`. The
/// host flips it when the client goes away; the pipeline checks it before
/// every stage and never invokes the handler once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let signal = CancelSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_cancelled());
        signal.cancel();
        assert!(observer.is_cancelled());
    }
}
