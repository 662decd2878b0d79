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
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as TokioMutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::lock::{
    deadline_after, normalize_interval, time_left, validate_bounded_wait, AttemptLog, HeldLease, OwnershipToken,
    WatchdogState, MIN_RETRY_DELAY,
};
use crate::{AsyncLockWatchdog, AsyncStoreGateway, LeaseLossPolicy, LockResult};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(30);

/// === AsyncRLock (asynchronous non-reentrant distributed lock) ===
pub struct AsyncRLock {
    gateway: Arc<dyn AsyncStoreGateway>,
    name: String,
    renewal_interval: Option<Duration>,
    retry_delay: Duration,
    lease_loss_policy: LeaseLossPolicy,
    lease: TokioMutex<Option<HeldLease<AsyncLockWatchdog>>>,
}

impl AsyncRLock {
    pub fn new(gateway: Arc<dyn AsyncStoreGateway>, name: String, renewal_interval: Option<Duration>) -> Self {
        Self {
            gateway,
            name,
            renewal_interval: normalize_interval(renewal_interval),
            retry_delay: DEFAULT_RETRY_DELAY,
            lease_loss_policy: LeaseLossPolicy::default(),
            lease: TokioMutex::new(None),
        }
    }

    /// Backoff between failed attempts, never below [`MIN_RETRY_DELAY`].
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay.max(MIN_RETRY_DELAY);
        self
    }

    pub fn with_lease_loss_policy(mut self, policy: LeaseLossPolicy) -> Self {
        self.lease_loss_policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn renewal_interval(&self) -> Option<Duration> {
        self.renewal_interval
    }

    pub async fn is_held(&self) -> bool {
        self.lease.lock().await.is_some()
    }

    pub async fn watchdog_state(&self) -> WatchdogState {
        self.lease
            .lock()
            .await
            .as_ref()
            .and_then(|lease| lease.watchdog.as_ref())
            .map_or(WatchdogState::Stopped, AsyncLockWatchdog::state)
    }

    /// Wait until the lock is acquired, retrying contention and store errors
    /// without limit. No watchdog is started.
    pub async fn acquire(&self, lease_time: Duration) -> LockResult<bool> {
        let token = OwnershipToken::generate();
        let mut attempts = AttemptLog::default();
        self.spin_until_acquired(&token, lease_time, None, &mut attempts).await;
        debug!(lock = %self.name, "lock acquired");
        self.install(token, None).await;
        Ok(true)
    }

    /// Single attempt; store errors are returned to the caller.
    pub async fn try_acquire(&self, lease_time: Duration) -> LockResult<bool> {
        let token = OwnershipToken::generate();
        let acquired = self.gateway.set_if_absent(&self.name, token.as_str(), lease_time).await?;
        if acquired {
            debug!(lock = %self.name, "lock acquired");
            self.install(token, None).await;
        }
        Ok(acquired)
    }

    /// Retry until acquired or `wait_time` elapses. The deadline is checked between
    /// attempts, so an attempt already sent to the store is always seen through.
    pub async fn acquire_within(&self, wait_time: Duration, lease_time: Duration) -> LockResult<bool> {
        validate_bounded_wait(wait_time, lease_time, self.renewal_interval)?;

        let token = OwnershipToken::generate();
        let mut attempts = AttemptLog::default();

        let deadline = deadline_after(wait_time);
        if !self.spin_until_acquired(&token, lease_time, deadline, &mut attempts).await {
            debug!(lock = %self.name, "gave up waiting for lock");
            return attempts.into_timeout_result();
        }

        debug!(lock = %self.name, "lock acquired");
        let watchdog = self.start_watchdog(&token, lease_time).await;
        self.install(token, watchdog).await;
        Ok(true)
    }

    /// Delete the lock if this handle's token still owns it, then stop the watchdog.
    pub async fn release(&self) -> LockResult<bool> {
        let mut lease = self.lease.lock().await;
        let Some(held) = lease.as_ref() else {
            return Ok(false);
        };

        let released = self.gateway.compare_and_delete(&self.name, held.token.as_str()).await?;

        if let Some(HeldLease { watchdog: Some(mut watchdog), .. }) = lease.take() {
            watchdog.stop().await;
        }

        if released {
            debug!(lock = %self.name, "lock released");
        } else {
            warn!(lock = %self.name, "lock was no longer held at release");
        }
        Ok(released)
    }

    /// `true` once acquired, `false` when `deadline` passed first.
    async fn spin_until_acquired(
        &self,
        token: &OwnershipToken,
        lease_time: Duration,
        deadline: Option<Instant>,
        attempts: &mut AttemptLog,
    ) -> bool {
        loop {
            let result = self.gateway.set_if_absent(&self.name, token.as_str(), lease_time).await;
            if let Err(e) = &result {
                warn!(lock = %self.name, error = %e, "lock attempt failed, retrying");
            }
            if attempts.record(result) {
                return true;
            }

            let remaining = time_left(deadline);
            if remaining.is_zero() {
                return false;
            }
            sleep(self.retry_delay.min(remaining)).await;
        }
    }

    async fn start_watchdog(&self, token: &OwnershipToken, lease_time: Duration) -> Option<AsyncLockWatchdog> {
        let interval = self.renewal_interval?;
        if lease_time.is_zero() {
            return None;
        }

        let gateway = self.gateway.clone();
        let name = self.name.clone();
        let token = token.clone();
        let renew_func = move || {
            let gateway = gateway.clone();
            let name = name.clone();
            let token = token.clone();
            async move { gateway.compare_and_extend(&name, token.as_str(), lease_time).await }
        };

        let mut watchdog = AsyncLockWatchdog::new(self.name.clone());
        watchdog.start(interval, self.lease_loss_policy, renew_func).await;
        Some(watchdog)
    }

    async fn install(&self, token: OwnershipToken, watchdog: Option<AsyncLockWatchdog>) {
        let previous = self.lease.lock().await.replace(HeldLease { token, watchdog });
        if let Some(HeldLease { watchdog: Some(mut watchdog), .. }) = previous {
            watchdog.stop().await;
        }
    }
}
