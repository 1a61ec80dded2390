use std::sync::atomic::{AtomicBool, Ordering};

/// Admits one activation at a time.
///
/// The dispatcher takes a permit when it hears the wake phrase and holds it
/// until the reply and follow-up have been spoken. A wake phrase heard while
/// a permit is out is rejected rather than queued.
#[derive(Debug, Default)]
pub struct ActivationGate {
    busy: AtomicBool,
}

/// Releases the gate on drop.
#[derive(Debug)]
pub struct ActivationPermit<'a> {
    gate: &'a ActivationGate,
}

impl ActivationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<ActivationPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ActivationPermit { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for ActivationPermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}
