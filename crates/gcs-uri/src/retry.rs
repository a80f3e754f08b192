/*
* Copyright (C) 2024 Swift Navigation Inc.
* Contact: Swift Navigation <dev@swiftnav.com>
*
* This source is subject to the license found in the file 'LICENSE' which must
* be be distributed together with this source. All other rights reserved.
*
* THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
* EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
* WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
*/

use std::time::{Duration, Instant};

use futures::Future;
use log::debug;
use tokio_retry::RetryIf;

use crate::config::Config;
use crate::errors::{Error, Result};

/// Exponential retry schedule with a cap on the total time spent retrying.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    pub initial: Duration,
    pub maximum: Duration,
    pub multiplier: f64,
    pub deadline: Duration,
}

impl Backoff {
    /// The delays to sleep between attempts.  Ends once the sum of delays would pass the
    /// deadline.
    pub fn delays(&self) -> Delays {
        Delays {
            next: self.initial,
            maximum: self.maximum,
            multiplier: self.multiplier,
            remaining: self.deadline,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Config::global().backoff()
    }
}

#[derive(Debug, Clone)]
pub struct Delays {
    next: Duration,
    maximum: Duration,
    multiplier: f64,
    remaining: Duration,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = Duration::min(self.next, self.maximum);
        self.remaining = self.remaining.checked_sub(delay)?;
        self.next = self.next.mul_f64(self.multiplier);
        Some(delay)
    }
}

/// Decides whether a request against the object store is retried.
///
/// Reads are always safe to repeat.  Writes are only repeated when the request pins the
/// generation of the object it replaces, otherwise a blind retry could clobber a write that
/// landed in between.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryPolicy {
    Always(Backoff),
    IfGenerationSpecified(Backoff),
    Never,
}

impl RetryPolicy {
    /// Unconditional retry used for downloads, listings, existence checks and deletes.
    pub fn read() -> Self {
        RetryPolicy::Always(Backoff::default())
    }

    /// Conditional retry used for uploads and server-side copies.
    pub fn write() -> Self {
        RetryPolicy::IfGenerationSpecified(Backoff::default())
    }

    /// The schedule to use for a request carrying `generation` as its precondition, `None`
    /// when the request must not be retried.
    pub fn resolve(&self, generation: Option<i64>) -> Option<&Backoff> {
        match self {
            RetryPolicy::Always(backoff) => Some(backoff),
            RetryPolicy::IfGenerationSpecified(backoff) if generation.is_some() => Some(backoff),
            RetryPolicy::IfGenerationSpecified(_) | RetryPolicy::Never => None,
        }
    }
}

pub async fn handle_transient_error<F, R, T>(
    policy: &RetryPolicy,
    generation: Option<i64>,
    func: F,
) -> Result<T>
where
    F: FnMut() -> R,
    R: Future<Output = Result<T>>,
{
    let mut func = func;
    let backoff = match policy.resolve(generation) {
        Some(backoff) => backoff,
        None => return func().await,
    };
    let start = Instant::now();
    let deadline = backoff.deadline;
    RetryIf::spawn(backoff.delays(), func, |err: &Error| {
        let retry = err.is_transient() && start.elapsed() < deadline;
        if retry {
            debug!("retrying transient storage error: {}", err);
        }
        retry
    })
    .await
}
