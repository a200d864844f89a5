use crate::constants::RATE_LIMIT_WINDOW_SECS;
use crate::errors::{Error, Result};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Limits executor invocations to `max_rpm` per one-minute window.
///
/// Shared by every run of a swarm. Callers that exceed the budget sleep
/// until the current window rolls over.
#[derive(Debug)]
pub struct RpmController {
    max_rpm: u32,
    window: Duration,
    state: Mutex<WindowState>,
}

#[derive(Debug)]
struct WindowState {
    started: Instant,
    used: u32,
}

impl RpmController {
    pub fn new(max_rpm: u32) -> Result<Self> {
        if max_rpm == 0 {
            return Err(Error::Configuration(
                "max_rpm must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_rpm,
            window: Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
            state: Mutex::new(WindowState {
                started: Instant::now(),
                used: 0,
            }),
        })
    }

    pub fn max_rpm(&self) -> u32 {
        self.max_rpm
    }

    /// Wait for a permit to start one executor invocation.
    pub async fn acquire(&self) {
        // the lock is held while sleeping so waiters are served in order
        let mut state = self.state.lock().await;
        let now = Instant::now();
        if now.duration_since(state.started) >= self.window {
            state.started = now;
            state.used = 0;
        }

        if state.used >= self.max_rpm {
            let resume_at = state.started + self.window;
            debug!(
                "Rate limit of {} requests per minute reached, waiting {:?}",
                self.max_rpm,
                resume_at.saturating_duration_since(now)
            );
            tokio::time::sleep_until(resume_at).await;
            state.started = Instant::now();
            state.used = 0;
        }

        state.used += 1;
    }
}
