//! Run control: the scheduler asks once per iteration whether to go on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait RunControl: Send {
    /// Called at the top of every loop iteration; `false` stops the run.
    fn proceed(&self) -> bool;
}

/// Cooperative stop flag. Clones share the flag, so a handle can be given to
/// a progress callback or another thread. An oracle call already sent is
/// always allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    stopped: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self { Self::default() }

    pub fn cancel(&self) { self.stopped.store(true, Ordering::SeqCst); }

    pub fn is_cancelled(&self) -> bool { self.stopped.load(Ordering::SeqCst) }

    pub(crate) fn reset(&self) { self.stopped.store(false, Ordering::SeqCst); }
}

impl RunControl for CancelToken {
    fn proceed(&self) -> bool { !self.is_cancelled() }
}

#[cfg(any(test, feature = "step-gate"))]
pub use gate::StepGate;

#[cfg(any(test, feature = "step-gate"))]
mod gate {
    use std::sync::{Arc, Condvar, Mutex};
    use std::time::Duration;

    use super::{CancelToken, RunControl};

    /// Debug variant of [`CancelToken`]: every iteration waits for a permit
    /// handed out by [`StepGate::release`].
    #[derive(Debug, Clone)]
    pub struct StepGate {
        token: CancelToken,
        permits: Arc<(Mutex<usize>, Condvar)>,
    }

    impl StepGate {
        pub fn new(token: CancelToken) -> Self {
            Self { token, permits: Arc::new((Mutex::new(0), Condvar::new())) }
        }

        pub fn release(&self, steps: usize) {
            let (lock, cvar) = &*self.permits;
            let mut n = lock.lock().unwrap_or_else(|e| e.into_inner());
            *n += steps;
            cvar.notify_all();
        }

        pub fn cancel(&self) {
            self.token.cancel();
            self.permits.1.notify_all();
        }
    }

    impl RunControl for StepGate {
        fn proceed(&self) -> bool {
            let (lock, cvar) = &*self.permits;
            let mut n = lock.lock().unwrap_or_else(|e| e.into_inner());
            loop {
                if self.token.is_cancelled() { return false; }
                if *n > 0 {
                    *n -= 1;
                    return true;
                }
                n = cvar.wait_timeout(n, Duration::from_millis(20)).map(|(g, _)| g).unwrap_or_else(|e| e.into_inner().0);
            }
        }
    }
}
