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
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::lock::{
    deadline_after, normalize_interval, time_left, validate_bounded_wait, AttemptLog, HeldLease, OwnershipToken,
    WatchdogState, MIN_RETRY_DELAY,
};
use crate::{LeaseLossPolicy, LockResult, LockWatchdog, StoreGateway};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(30);

/// === RLock (non-reentrant distributed lock) ===
///
/// One handle represents one attempt at a time to hold `name`. Sequential
/// acquire/release cycles may reuse the handle; concurrent use of the same
/// handle is not supported.
pub struct RLock {
    gateway: Arc<dyn StoreGateway>,
    name: String,
    renewal_interval: Option<Duration>,
    retry_delay: Duration,
    lease_loss_policy: LeaseLossPolicy,
    lease: Mutex<Option<HeldLease<LockWatchdog>>>,
}

impl RLock {
    pub fn new(gateway: Arc<dyn StoreGateway>, name: String, renewal_interval: Option<Duration>) -> Self {
        Self {
            gateway,
            name,
            renewal_interval: normalize_interval(renewal_interval),
            retry_delay: DEFAULT_RETRY_DELAY,
            lease_loss_policy: LeaseLossPolicy::default(),
            lease: Mutex::new(None),
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

    /// Whether this handle believes it holds the lock. The store may disagree if the lease expired.
    pub fn is_held(&self) -> bool {
        self.lease.lock().is_some()
    }

    pub fn watchdog_state(&self) -> WatchdogState {
        self.lease
            .lock()
            .as_ref()
            .and_then(|lease| lease.watchdog.as_ref())
            .map_or(WatchdogState::Stopped, LockWatchdog::state)
    }

    /// Block until the lock is acquired. Contention and store errors are retried
    /// forever; no watchdog is started, so a zero `lease_time` is the usual choice.
    pub fn acquire(&self, lease_time: Duration) -> LockResult<bool> {
        let token = OwnershipToken::generate();
        loop {
            match self.gateway.set_if_absent(&self.name, token.as_str(), lease_time) {
                Ok(true) => {
                    debug!(lock = %self.name, "lock acquired");
                    self.install(token, None);
                    return Ok(true);
                }
                Ok(false) => {}
                Err(e) => warn!(lock = %self.name, error = %e, "lock attempt failed, retrying"),
            }
            thread::sleep(self.retry_delay);
        }
    }

    /// Single attempt; store errors are returned to the caller.
    pub fn try_acquire(&self, lease_time: Duration) -> LockResult<bool> {
        let token = OwnershipToken::generate();
        let acquired = self.gateway.set_if_absent(&self.name, token.as_str(), lease_time)?;
        if acquired {
            debug!(lock = %self.name, "lock acquired");
            self.install(token, None);
        }
        Ok(acquired)
    }

    /// Retry until acquired or `wait_time` elapses. On success with a non-zero
    /// lease and a renewal interval, a watchdog keeps the lease alive until release.
    pub fn acquire_within(&self, wait_time: Duration, lease_time: Duration) -> LockResult<bool> {
        validate_bounded_wait(wait_time, lease_time, self.renewal_interval)?;

        let deadline = deadline_after(wait_time);
        let token = OwnershipToken::generate();
        let mut attempts = AttemptLog::default();

        loop {
            let result = self.gateway.set_if_absent(&self.name, token.as_str(), lease_time);
            if let Err(e) = &result {
                warn!(lock = %self.name, error = %e, "lock attempt failed, retrying");
            }
            if attempts.record(result) {
                debug!(lock = %self.name, "lock acquired");
                let watchdog = self.start_watchdog(&token, lease_time);
                self.install(token, watchdog);
                return Ok(true);
            }

            let remaining = time_left(deadline);
            if remaining.is_zero() {
                debug!(lock = %self.name, "gave up waiting for lock");
                return attempts.into_timeout_result();
            }
            thread::sleep(self.retry_delay.min(remaining));
        }
    }

    /// Delete the lock if this handle's token still owns it.
    ///
    /// `Ok(true)` when the entry was removed; `Ok(false)` when nothing was held or the
    /// lease had already been lost. The watchdog is stopped in both cases. On a store
    /// error the lease is kept so the caller can retry.
    pub fn release(&self) -> LockResult<bool> {
        let token = match self.lease.lock().as_ref() {
            Some(lease) => lease.token.clone(),
            None => return Ok(false),
        };

        let released = self.gateway.compare_and_delete(&self.name, token.as_str())?;

        let lease = self.lease.lock().take();
        if let Some(HeldLease { watchdog: Some(mut watchdog), .. }) = lease {
            watchdog.stop();
        }

        if released {
            debug!(lock = %self.name, "lock released");
        } else {
            warn!(lock = %self.name, "lock was no longer held at release");
        }
        Ok(released)
    }

    fn start_watchdog(&self, token: &OwnershipToken, lease_time: Duration) -> Option<LockWatchdog> {
        let interval = self.renewal_interval?;
        if lease_time.is_zero() {
            return None;
        }

        let gateway = self.gateway.clone();
        let name = self.name.clone();
        let token = token.clone();
        let renew_func = move || gateway.compare_and_extend(&name, token.as_str(), lease_time);

        let mut watchdog = LockWatchdog::new(self.name.clone());
        watchdog.start(interval, self.lease_loss_policy, renew_func);
        Some(watchdog)
    }

    fn install(&self, token: OwnershipToken, watchdog: Option<LockWatchdog>) {
        let previous = self.lease.lock().replace(HeldLease { token, watchdog });
        if let Some(HeldLease { watchdog: Some(mut watchdog), .. }) = previous {
            watchdog.stop();
        }
    }
}
