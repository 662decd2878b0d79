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
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::lock::WatchdogState;
use crate::{LeaseLossPolicy, LockResult};

/// Task-backed lease renewer
pub struct AsyncLockWatchdog {
    name: String,
    stop_tx: Option<watch::Sender<bool>>,
    task_handle: Option<JoinHandle<()>>,
}

impl AsyncLockWatchdog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stop_tx: None,
            task_handle: None,
        }
    }

    pub async fn start<F, Fut>(&mut self, renew_interval: Duration, policy: LeaseLossPolicy, renew_func: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LockResult<bool>> + Send + 'static,
    {
        // Stop the previous task first
        self.stop().await;

        let (stop_tx, mut stop_rx) = watch::channel(false);
        self.stop_tx = Some(stop_tx);
        let name = self.name.clone();

        let handle = tokio::spawn(async move {
            info!(lock = %name, interval = ?renew_interval, "watchdog started");
            let mut ticker = interval_at(Instant::now() + renew_interval, renew_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    // Fires on the stop signal and when the sender is dropped
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => match renew_func().await {
                        Ok(true) => debug!(lock = %name, "lease renewed"),
                        Ok(false) => {
                            warn!(lock = %name, "lease renewal rejected, token no longer owns the key");
                            if policy == LeaseLossPolicy::Stop {
                                break;
                            }
                        }
                        Err(e) => warn!(lock = %name, error = %e, "lease renewal failed"),
                    },
                }
            }
            info!(lock = %name, "watchdog stopped");
        });

        self.task_handle = Some(handle);
    }

    /// Signal the task and wait for it to finish. Safe to call repeatedly.
    pub async fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        if let Some(handle) = self.task_handle.take() {
            let _ = handle.await;
        }
    }

    pub fn state(&self) -> WatchdogState {
        match (&self.stop_tx, &self.task_handle) {
            (Some(_), Some(handle)) if !handle.is_finished() => WatchdogState::Active,
            _ => WatchdogState::Stopped,
        }
    }
}

impl Drop for AsyncLockWatchdog {
    fn drop(&mut self) {
        // The task exits on its own once it sees the signal
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LockError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn counting(
        result: fn() -> LockResult<bool>,
    ) -> (Arc<AtomicUsize>, impl Fn() -> std::future::Ready<LockResult<bool>> + Send + Sync + 'static) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        (calls, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(result())
        })
    }

    #[tokio::test]
    async fn test_renews_on_schedule() {
        let (calls, renew) = counting(|| Ok(true));
        let mut watchdog = AsyncLockWatchdog::new("renew");
        watchdog.start(Duration::from_millis(20), LeaseLossPolicy::KeepRenewing, renew).await;
        assert_eq!(watchdog.state(), WatchdogState::Active);

        sleep(Duration::from_millis(150)).await;
        watchdog.stop().await;
        assert!(calls.load(Ordering::SeqCst) >= 3);
        assert_eq!(watchdog.state(), WatchdogState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_is_prompt_and_final() {
        let (calls, renew) = counting(|| Ok(true));
        let mut watchdog = AsyncLockWatchdog::new("prompt");
        watchdog.start(Duration::from_secs(60), LeaseLossPolicy::KeepRenewing, renew).await;

        let started = std::time::Instant::now();
        watchdog.stop().await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        watchdog.stop().await;
        assert_eq!(watchdog.state(), WatchdogState::Stopped);
    }

    #[tokio::test]
    async fn test_keeps_renewing_through_failures() {
        let (calls, renew) = counting(|| Err(LockError::StoreUnavailable("down".to_string())));
        let mut watchdog = AsyncLockWatchdog::new("flaky");
        watchdog.start(Duration::from_millis(10), LeaseLossPolicy::Stop, renew).await;
        sleep(Duration::from_millis(100)).await;
        assert_eq!(watchdog.state(), WatchdogState::Active);
        watchdog.stop().await;
        assert!(calls.load(Ordering::SeqCst) >= 2);

        let (calls, renew) = counting(|| Ok(false));
        watchdog.start(Duration::from_millis(10), LeaseLossPolicy::KeepRenewing, renew).await;
        sleep(Duration::from_millis(100)).await;
        assert_eq!(watchdog.state(), WatchdogState::Active);
        watchdog.stop().await;
        assert!(calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_stop_policy_terminates_on_rejection() {
        let (calls, renew) = counting(|| Ok(false));
        let mut watchdog = AsyncLockWatchdog::new("strict");
        watchdog.start(Duration::from_millis(10), LeaseLossPolicy::Stop, renew).await;
        sleep(Duration::from_millis(100)).await;
        assert_eq!(watchdog.state(), WatchdogState::Stopped);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_stops_task() {
        let (calls, renew) = counting(|| Ok(true));
        let mut watchdog = AsyncLockWatchdog::new("dropped");
        watchdog.start(Duration::from_millis(10), LeaseLossPolicy::KeepRenewing, renew).await;
        drop(watchdog);

        sleep(Duration::from_millis(20)).await;
        let frozen = calls.load(Ordering::SeqCst);
        sleep(Duration::from_millis(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), frozen);
    }
}
