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
mod blocking;
mod non_blocking;

pub use blocking::*;
pub use non_blocking::*;

use std::fmt;
use std::time::{Duration, Instant};

use crate::errors::{LockError, LockResult};
use crate::get_lock_id;

/// A lease may only be watched if it outlives this many renewal intervals.
pub const RENEWAL_SAFETY_FACTOR: u32 = 3;

/// Floor for the backoff between acquisition attempts
pub const MIN_RETRY_DELAY: Duration = Duration::from_millis(1);

/// Proof of ownership written as the value of the lock key.
///
/// Generated fresh for every acquisition attempt and never derived from the key
/// or from process identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnershipToken(String);

impl OwnershipToken {
    pub fn generate() -> Self {
        Self(get_lock_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnershipToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    /// Periodically renewing the lease
    Active,
    /// Terminal
    Stopped,
}

/// Local view of a lease this handle acquired
struct HeldLease<W> {
    token: OwnershipToken,
    watchdog: Option<W>,
}

/// Outcome bookkeeping for a bounded-wait acquisition that ran out of time
#[derive(Default)]
struct AttemptLog {
    contended: bool,
    last_error: Option<LockError>,
}

impl AttemptLog {
    fn record(&mut self, result: LockResult<bool>) -> bool {
        match result {
            Ok(true) => true,
            Ok(false) => {
                self.contended = true;
                false
            }
            Err(e) => {
                self.last_error = Some(e);
                false
            }
        }
    }

    /// "Not acquired", unless no attempt ever reached the store successfully.
    fn into_timeout_result(self) -> LockResult<bool> {
        match self.last_error {
            Some(e) if !self.contended => Err(e),
            _ => Ok(false),
        }
    }
}

/// `None` when the wait is too long to be represented, i.e. no deadline.
fn deadline_after(wait_time: Duration) -> Option<Instant> {
    Instant::now().checked_add(wait_time)
}

fn time_left(deadline: Option<Instant>) -> Duration {
    deadline.map_or(Duration::MAX, |at| at.saturating_duration_since(Instant::now()))
}

/// Treat a zero renewal interval as "no watchdog".
fn normalize_interval(renewal_interval: Option<Duration>) -> Option<Duration> {
    renewal_interval.filter(|interval| !interval.is_zero())
}

fn validate_bounded_wait(
    wait_time: Duration,
    lease_time: Duration,
    renewal_interval: Option<Duration>,
) -> LockResult<()> {
    if wait_time.is_zero() {
        return Err(LockError::InvalidArgument(
            "wait time must be greater than zero".to_string(),
        ));
    }
    if let Some(interval) = renewal_interval {
        let safe = interval
            .checked_mul(RENEWAL_SAFETY_FACTOR)
            .is_some_and(|bound| lease_time > bound);
        if !lease_time.is_zero() && !safe {
            return Err(LockError::InvalidArgument(format!(
                "lease time {:?} must exceed {} x renewal interval {:?}",
                lease_time, RENEWAL_SAFETY_FACTOR, interval
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_fresh() {
        let a = OwnershipToken::generate();
        let b = OwnershipToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.as_str());
    }

    #[test]
    fn test_validate_bounded_wait() {
        let second = Duration::from_secs(1);
        assert!(validate_bounded_wait(second, 10 * second, Some(3 * second)).is_ok());
        assert!(validate_bounded_wait(second, 10 * second, None).is_ok());
        // No lease, no watchdog: the interval is irrelevant
        assert!(validate_bounded_wait(second, Duration::ZERO, Some(second)).is_ok());

        assert!(matches!(
            validate_bounded_wait(Duration::ZERO, 10 * second, None),
            Err(LockError::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_bounded_wait(second, 9 * second, Some(3 * second)),
            Err(LockError::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_bounded_wait(second, 2 * second, Some(second)),
            Err(LockError::InvalidArgument(_))
        ));
        // An interval whose safety bound overflows can never be safe
        assert!(matches!(
            validate_bounded_wait(second, 10 * second, Some(Duration::MAX / 2)),
            Err(LockError::InvalidArgument(_))
        ));
        assert!(validate_bounded_wait(Duration::MAX, 10 * second, Some(3 * second)).is_ok());
    }

    #[test]
    fn test_deadline_saturates() {
        let deadline = deadline_after(Duration::MAX);
        assert!(deadline.is_none());
        assert_eq!(time_left(deadline), Duration::MAX);

        let deadline = deadline_after(Duration::from_millis(10));
        assert!(deadline.is_some());
        assert!(time_left(deadline) <= Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(20));
        assert!(time_left(deadline).is_zero());
    }

    #[test]
    fn test_normalize_interval() {
        assert_eq!(normalize_interval(Some(Duration::ZERO)), None);
        assert_eq!(normalize_interval(None), None);
        assert_eq!(
            normalize_interval(Some(Duration::from_millis(5))),
            Some(Duration::from_millis(5))
        );
    }

    #[test]
    fn test_attempt_log_outcomes() {
        let mut log = AttemptLog::default();
        assert!(!log.record(Err(LockError::StoreUnavailable("down".to_string()))));
        assert!(matches!(log.into_timeout_result(), Err(LockError::StoreUnavailable(_))));

        let mut log = AttemptLog::default();
        log.record(Err(LockError::StoreUnavailable("down".to_string())));
        log.record(Ok(false));
        assert!(matches!(log.into_timeout_result(), Ok(false)));

        assert!(matches!(AttemptLog::default().into_timeout_result(), Ok(false)));
        assert!(AttemptLog::default().record(Ok(true)));
    }
}
