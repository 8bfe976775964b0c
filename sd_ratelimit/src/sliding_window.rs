use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::debug;
use tracing::trace;

use crate::dispatch::Dispatcher;
use crate::error::AdmitError;
use crate::error::RateLimitError;
use crate::error::Result;

/// Sliding-window admission limiter
///
/// Admits at most `capacity` dispatches within any trailing window of the
/// configured duration. Excess callers block until the window rolls past an
/// earlier admission; nothing is ever rejected for being over the rate.
///
/// Two pieces of state cooperate:
/// - a semaphore **gate** bounding in-flight dispatches to `capacity`, whose
///   permit guard releases on every exit path (including dropped futures),
/// - a timestamp **ledger** of admissions inside the current window, swept of
///   expired entries before every fullness check.
///
/// A caller holds its gate permit for the whole admission: sweep, at most one
/// pacing wait sized from the oldest unexpired admission, re-sweep, dispatch,
/// record. The pacing wait is paid at most once per call.
///
/// The fullness check compares the swept ledger against `capacity` itself,
/// not against free gate permits, so concurrent in-flight callers do not
/// tighten the window for each other.
#[derive(Debug)]
pub struct SlidingWindow {
    /// Bounds in-flight dispatches; permits double as scoped-release guards
    gate: Semaphore,
    /// Admission timestamps within the current window
    ledger: Mutex<Vec<Instant>>,
    /// Maximum admissions per trailing window
    capacity: u32,
    /// Trailing window length
    window: Duration,
}

impl SlidingWindow {
    /// Create a new sliding-window limiter
    pub fn new(capacity: u32, window: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(RateLimitError::InvalidConfig("capacity must be greater than 0"));
        }
        if window.is_zero() {
            return Err(RateLimitError::InvalidConfig("window duration must be greater than 0"));
        }

        Ok(Self { gate: Semaphore::new(capacity as usize), ledger: Mutex::new(Vec::new()), capacity, window })
    }

    /// Limiter admitting `capacity` dispatches per second
    pub fn per_second(capacity: u32) -> Result<Self> {
        Self::new(capacity, Duration::from_secs(1))
    }

    /// Limiter admitting `capacity` dispatches per minute
    pub fn per_minute(capacity: u32) -> Result<Self> {
        Self::new(capacity, Duration::from_secs(60))
    }

    /// Limiter admitting `capacity` dispatches per hour
    pub fn per_hour(capacity: u32) -> Result<Self> {
        Self::new(capacity, Duration::from_secs(3600))
    }

    /// Create a builder for configuring a sliding-window limiter
    pub fn builder() -> SlidingWindowBuilder {
        SlidingWindowBuilder::new()
    }

    /// Block until the rate constraint admits this call, then dispatch once
    ///
    /// Suspends while all gate slots are held by in-flight callers, and again
    /// while the trailing window is full. The dispatcher is invoked exactly
    /// once per successful admission; its error propagates unchanged with the
    /// gate slot already released, and a failed dispatch consumes no window
    /// slot.
    ///
    /// Dropping the returned future at either suspension point releases the
    /// gate slot and no dispatch occurs.
    pub async fn admit<D: Dispatcher>(
        &self,
        dispatcher: &D,
        payload: D::Payload,
        signature: &str,
    ) -> std::result::Result<D::Response, AdmitError<D::Error>> {
        self.admit_inner(dispatcher, payload, signature, None).await
    }

    /// Like [`admit`](Self::admit), but both suspension points are bounded
    ///
    /// If the gate slot cannot be acquired before the deadline, or the pacing
    /// wait cannot elapse before it, the call fails with
    /// [`RateLimitError::Interrupted`] without dispatching. The deadline does
    /// not bound the dispatch itself.
    pub async fn admit_with_timeout<D: Dispatcher>(
        &self,
        dispatcher: &D,
        payload: D::Payload,
        signature: &str,
        timeout: Duration,
    ) -> std::result::Result<D::Response, AdmitError<D::Error>> {
        let deadline = Instant::now() + timeout;
        self.admit_inner(dispatcher, payload, signature, Some(deadline)).await
    }

    async fn admit_inner<D: Dispatcher>(
        &self,
        dispatcher: &D,
        payload: D::Payload,
        signature: &str,
        deadline: Option<Instant>,
    ) -> std::result::Result<D::Response, AdmitError<D::Error>> {
        // Held for the whole admission; released on every exit path below,
        // including cancellation, by the permit guard.
        let _permit = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.gate.acquire())
                .await
                .map_err(|_| RateLimitError::Interrupted)?
                .map_err(|_| RateLimitError::Interrupted)?,
            None => self.gate.acquire().await.map_err(|_| RateLimitError::Interrupted)?,
        };

        self.pace(deadline).await?;

        let response = dispatcher.dispatch(payload, signature).await.map_err(AdmitError::Dispatch)?;
        self.record_admission();

        Ok(response)
    }

    /// One pacing pass: sweep, wait out the oldest entry if the window is
    /// full, then sweep again
    async fn pace(&self, deadline: Option<Instant>) -> Result<()> {
        let wait = {
            let mut ledger = self.ledger.lock();
            let now = Instant::now();
            sweep(&mut ledger, now, self.window);

            if ledger.len() >= self.capacity as usize {
                oldest(&ledger).map(|entry| self.window - now.duration_since(entry))
            } else {
                None
            }
        };

        let Some(wait) = wait else {
            return Ok(());
        };

        if !wait.is_zero() {
            if let Some(deadline) = deadline {
                // The wait length is fixed, so a deadline inside it is a
                // guaranteed interruption; fail without sleeping it out.
                if Instant::now() + wait > deadline {
                    return Err(RateLimitError::Interrupted);
                }
            }

            debug!(wait_ms = wait.as_millis() as u64, "window full, pacing admission");
            tokio::time::sleep(wait).await;
        }

        let mut ledger = self.ledger.lock();
        sweep(&mut ledger, Instant::now(), self.window);
        Ok(())
    }

    fn record_admission(&self) {
        let mut ledger = self.ledger.lock();
        ledger.push(Instant::now());
        trace!(occupancy = ledger.len(), "admission recorded");
    }

    /// Maximum admissions per trailing window
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Trailing window length
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Gate slots not currently held by in-flight callers
    pub fn available_slots(&self) -> u32 {
        self.gate.available_permits() as u32
    }

    /// Unexpired admissions in the current window, after a sweep
    pub fn occupancy(&self) -> usize {
        let mut ledger = self.ledger.lock();
        sweep(&mut ledger, Instant::now(), self.window);
        ledger.len()
    }
}

/// Evict every ledger entry whose age is at least `window`
fn sweep(ledger: &mut Vec<Instant>, now: Instant, window: Duration) {
    ledger.retain(|entry| now.duration_since(*entry) < window);
}

/// Numerically oldest entry, independent of insertion order
fn oldest(ledger: &[Instant]) -> Option<Instant> {
    ledger.iter().min().copied()
}

/// Builder for configuring a sliding-window limiter
pub struct SlidingWindowBuilder {
    capacity: Option<u32>,
    window: Option<Duration>,
}

impl SlidingWindowBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self { capacity: None, window: None }
    }

    /// Set the maximum admissions per window
    pub fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the trailing window length
    pub fn window(mut self, window: Duration) -> Self {
        self.window = Some(window);
        self
    }

    /// Set `capacity` admissions per one-second window
    pub fn per_second(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self.window = Some(Duration::from_secs(1));
        self
    }

    /// Set `capacity` admissions per one-minute window
    pub fn per_minute(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self.window = Some(Duration::from_secs(60));
        self
    }

    /// Build the limiter
    pub fn build(self) -> Result<SlidingWindow> {
        let capacity = self.capacity.ok_or(RateLimitError::InvalidConfig("capacity must be set"))?;
        let window = self.window.ok_or(RateLimitError::InvalidConfig("window must be set"))?;
        SlidingWindow::new(capacity, window)
    }
}

impl Default for SlidingWindowBuilder {
    fn default() -> Self {
        Self::new()
    }
}
