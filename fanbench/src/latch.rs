use std::sync::{Arc, Condvar, Mutex};

/// One-shot countdown latch.
///
/// Created with a number of pending signals, counted down exactly once per
/// finished job and awaited by the benchmark's control thread. The counter
/// saturates at zero: extra signals are ignored rather than treated as an
/// error.
#[derive(Debug, Clone)]
pub struct Latch {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    remaining: Mutex<u64>,
    zero: Condvar,
}

impl Latch {
    pub fn new(count: u64) -> Self {
        let shared = Arc::new(Shared {
            remaining: Mutex::new(count),
            zero: Condvar::new(),
        });

        Self { shared }
    }

    /// Decrements the counter by one, waking waiters when it reaches zero.
    pub fn count_down(&self) {
        let mut remaining = self.shared.remaining.lock().expect("no poison");

        match *remaining {
            0 => {}
            1 => {
                *remaining = 0;
                self.shared.zero.notify_all();
            }
            _ => *remaining -= 1,
        }
    }

    /// Blocks the calling thread until the counter reaches zero.
    ///
    /// Returns immediately if the latch was created with a zero count. There
    /// is no timeout: a job that never counts down blocks this forever.
    pub fn wait(&self) {
        let mut remaining = self.shared.remaining.lock().expect("no poison");
        while *remaining > 0 {
            remaining = self.shared.zero.wait(remaining).expect("no poison");
        }
    }

    /// Current counter value.
    pub fn remaining(&self) -> u64 {
        *self.shared.remaining.lock().expect("no poison")
    }

    /// Arms a guard that counts down once when dropped.
    ///
    /// Jobs hold one of these across their whole body so the signal fires on
    /// every exit path, panics included.
    pub fn guard(&self) -> CountGuard {
        CountGuard { latch: self.clone() }
    }
}

/// Counts its latch down exactly once, on drop.
#[derive(Debug)]
pub struct CountGuard {
    latch: Latch,
}

impl Drop for CountGuard {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}
