//! At most one rebuild in flight; triggers during a build coalesce.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct GateState {
    running: bool,
    pending: bool,
}

/// Serializes rebuilds.
///
/// The first caller of [`RebuildGate::trigger`] runs the build on its own
/// thread. Any number of triggers arriving meanwhile return at once and
/// leave a single pending flag, which the running caller turns into exactly
/// one follow-up build.
#[derive(Debug, Default)]
pub struct RebuildGate {
    state: Mutex<GateState>,
    idle: Condvar,
}

impl RebuildGate {
    /// An idle gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a build. Returns how many times `build` ran on this call:
    /// zero when another caller already holds the gate.
    pub fn trigger<F: FnMut()>(&self, mut build: F) -> usize {
        {
            let mut state = self.state.lock();
            if state.running {
                state.pending = true;
                log::debug!("build in flight, coalescing trigger");
                return 0;
            }
            state.running = true;
        }

        let _reset = ResetOnPanic(self);
        let mut runs = 0;
        loop {
            build();
            runs += 1;
            let mut state = self.state.lock();
            if state.pending {
                state.pending = false;
                continue;
            }
            state.running = false;
            self.idle.notify_all();
            return runs;
        }
    }

    /// Whether a build is in flight.
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Blocks until no build is in flight.
    pub fn wait_idle(&self) {
        let mut state = self.state.lock();
        while state.running {
            self.idle.wait(&mut state);
        }
    }
}

/// Reopens the gate if a build panics.
struct ResetOnPanic<'a>(&'a RebuildGate);

impl Drop for ResetOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut state = self.0.state.lock();
            state.running = false;
            state.pending = false;
            self.0.idle.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn idle_gate_runs_once() {
        let gate = RebuildGate::new();
        let mut count = 0;
        assert_eq!(gate.trigger(|| count += 1), 1);
        assert_eq!(count, 1);
        assert!(!gate.is_running());
    }

    #[test]
    fn triggers_during_a_build_coalesce_into_one_follow_up() {
        let gate = Arc::new(RebuildGate::new());
        let builds = Arc::new(AtomicUsize::new(0));
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let runner = {
            let gate = Arc::clone(&gate);
            let builds = Arc::clone(&builds);
            thread::spawn(move || {
                gate.trigger(|| {
                    if builds.fetch_add(1, Ordering::SeqCst) == 0 {
                        started_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                    }
                })
            })
        };

        started_rx.recv().unwrap();
        for _ in 0..5 {
            assert_eq!(gate.trigger(|| panic!("must not run concurrently")), 0);
        }
        release_tx.send(()).unwrap();

        assert_eq!(runner.join().unwrap(), 2);
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        gate.wait_idle();
        assert!(!gate.is_running());
    }

    #[test]
    fn panicking_build_reopens_the_gate() {
        let gate = Arc::new(RebuildGate::new());
        let g = Arc::clone(&gate);
        let result = thread::spawn(move || g.trigger(|| panic!("boom"))).join();
        assert!(result.is_err());
        assert!(!gate.is_running());
        assert_eq!(gate.trigger(|| {}), 1);
    }
}
