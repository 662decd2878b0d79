/*
 *
 *  *
 *  *      Copyright (c) 2018-2025, SnackCloud All rights reserved.
 *  *
 *  *   Redistribution and use in source and binary forms, with or without
 *  *   modification, are permitted provided that the following conditions are met:
 *  *
 *  *   Redistributions of source code must retain the above copyright notice,
 *  *   this list of conditions and the following disclaimer.
 *  *   Redistributions in binary form must reproduce the above copyright
 *  *   notice, this list of conditions and the following disclaimer in the
 *  *   documentation and/or other materials provided with the distribution.
 *  *   Neither the name of the www.snackcloud.cn developer nor the names of its
 *  *   contributors may be used to endorse or promote products derived from
 *  *   this software without specific prior written permission.
 *  *   Author: SnackCloud
 *  *
 *
 */
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::lock::WatchdogState;
use crate::{LeaseLossPolicy, LockResult};

/// One-shot stop signal; waiting on it wakes as soon as it is raised.
#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    /// Sleep up to `timeout`. Returns `true` once the signal has been raised.
    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.condvar.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }

    fn raise(&self) {
        *self.stopped.lock() = true;
        self.condvar.notify_all();
    }

    fn is_raised(&self) -> bool {
        *self.stopped.lock()
    }
}

/// Thread-backed lease renewer
pub struct LockWatchdog {
    name: String,
    signal: Arc<StopSignal>,
    handle: Option<thread::JoinHandle<()>>,
}

impl LockWatchdog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signal: Arc::new(StopSignal::default()),
            handle: None,
        }
    }

    /// Run `renew_func` every `renew_interval` until stopped. The first renewal
    /// happens one interval after start.
    pub fn start<F>(&mut self, renew_interval: Duration, policy: LeaseLossPolicy, renew_func: F)
    where
        F: Fn() -> LockResult<bool> + Send + 'static,
    {
        // Stop the previous renewer first
        self.stop();

        let signal = Arc::new(StopSignal::default());
        self.signal = signal.clone();
        let name = self.name.clone();

        let handle = thread::spawn(move || {
            info!(lock = %name, interval = ?renew_interval, "watchdog started");
            while !signal.wait(renew_interval) {
                match renew_func() {
                    Ok(true) => debug!(lock = %name, "lease renewed"),
                    Ok(false) => {
                        warn!(lock = %name, "lease renewal rejected, token no longer owns the key");
                        if policy == LeaseLossPolicy::Stop {
                            break;
                        }
                    }
                    Err(e) => warn!(lock = %name, error = %e, "lease renewal failed"),
                }
            }
            info!(lock = %name, "watchdog stopped");
        });

        self.handle = Some(handle);
    }

    /// Raise the stop signal and wait for the renewer thread. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.signal.raise();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn state(&self) -> WatchdogState {
        match &self.handle {
            Some(handle) if !handle.is_finished() && !self.signal.is_raised() => WatchdogState::Active,
            _ => WatchdogState::Stopped,
        }
    }
}

impl Drop for LockWatchdog {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LockError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(result: fn() -> LockResult<bool>) -> (Arc<AtomicUsize>, impl Fn() -> LockResult<bool> + Send + 'static) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        (calls, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            result()
        })
    }

    #[test]
    fn test_renews_on_schedule() {
        let (calls, renew) = counting(|| Ok(true));
        let mut watchdog = LockWatchdog::new("renew");
        watchdog.start(Duration::from_millis(20), LeaseLossPolicy::KeepRenewing, renew);
        assert_eq!(watchdog.state(), WatchdogState::Active);

        thread::sleep(Duration::from_millis(150));
        watchdog.stop();
        assert!(calls.load(Ordering::SeqCst) >= 3);
        assert_eq!(watchdog.state(), WatchdogState::Stopped);
    }

    #[test]
    fn test_stop_is_prompt_and_final() {
        let (calls, renew) = counting(|| Ok(true));
        let mut watchdog = LockWatchdog::new("prompt");
        watchdog.start(Duration::from_secs(60), LeaseLossPolicy::KeepRenewing, renew);

        let started = Instant::now();
        watchdog.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Idempotent
        watchdog.stop();
        assert_eq!(watchdog.state(), WatchdogState::Stopped);
    }

    #[test]
    fn test_keeps_renewing_after_rejection_and_errors() {
        let (rejected, renew) = counting(|| Ok(false));
        let mut watchdog = LockWatchdog::new("stolen");
        watchdog.start(Duration::from_millis(10), LeaseLossPolicy::KeepRenewing, renew);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(watchdog.state(), WatchdogState::Active);
        watchdog.stop();
        assert!(rejected.load(Ordering::SeqCst) >= 2);

        let (failed, renew) = counting(|| Err(LockError::StoreUnavailable("down".to_string())));
        watchdog.start(Duration::from_millis(10), LeaseLossPolicy::Stop, renew);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(watchdog.state(), WatchdogState::Active);
        watchdog.stop();
        assert!(failed.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_stop_policy_terminates_on_rejection() {
        let (calls, renew) = counting(|| Ok(false));
        let mut watchdog = LockWatchdog::new("strict");
        watchdog.start(Duration::from_millis(10), LeaseLossPolicy::Stop, renew);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(watchdog.state(), WatchdogState::Stopped);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_restart_replaces_previous_renewer() {
        let (first, renew) = counting(|| Ok(true));
        let mut watchdog = LockWatchdog::new("restart");
        watchdog.start(Duration::from_millis(10), LeaseLossPolicy::KeepRenewing, renew);
        thread::sleep(Duration::from_millis(50));

        let (second, renew) = counting(|| Ok(true));
        watchdog.start(Duration::from_millis(10), LeaseLossPolicy::KeepRenewing, renew);
        let frozen = first.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        watchdog.stop();

        assert_eq!(first.load(Ordering::SeqCst), frozen);
        assert!(second.load(Ordering::SeqCst) >= 1);
    }
}
