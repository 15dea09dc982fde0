//! Periodic tick generators.
//!
//! Each generator owns one tokio task that sleeps until its next deadline,
//! forwards the deadline by whole intervals and, if the toggle switch is on,
//! taps its key on the virtual device. Deadlines advance as
//! `deadline + n * interval`, never `now + interval`, so dispatch latency does
//! not accumulate into drift.

use crate::device::{self, InputSink};
use crate::keys::KeyCode;
use crate::toggle::ToggleSwitch;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Moves `deadline` past `now` by whole multiples of `interval`.
///
/// Returns the new deadline and the overrun count: 0 when `now` is still
/// before `deadline`, 1 for an on-time tick, and `1 + missed` when whole
/// intervals went by without a firing.
pub fn forward(deadline: Instant, now: Instant, interval: Duration) -> (Instant, u64) {
    if now < deadline || interval.is_zero() {
        return (deadline, 0);
    }

    let step = interval.as_nanos();
    let overruns = now.duration_since(deadline).as_nanos() / step + 1;
    let advance = u64::try_from(step * overruns).unwrap_or(u64::MAX);

    (
        deadline + Duration::from_nanos(advance),
        u64::try_from(overruns).unwrap_or(u64::MAX),
    )
}

/// One independently scheduled key generator.
#[derive(Debug)]
pub struct TickGenerator {
    index: usize,
    interval: Duration,
    key: KeyCode,
    task: Option<JoinHandle<()>>,
}

impl TickGenerator {
    pub fn new(index: usize, interval: Duration, key: KeyCode) -> Self {
        Self {
            index,
            interval,
            key,
            task: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn key(&self) -> KeyCode {
        self.key
    }

    pub fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    /// Starts the repeating timer. The first tick is one interval from now.
    ///
    /// Must be called from within a tokio runtime. Arming an armed generator
    /// is a no-op.
    pub fn arm(&mut self, switch: ToggleSwitch, sink: Arc<dyn InputSink>, origin: Instant) {
        if self.task.is_some() {
            warn!("Generator {} is already armed", self.index);
            return;
        }

        info!(
            "Starting timer {} ({}ns, key '{}')...",
            self.index,
            self.interval.as_nanos(),
            self.key
        );

        let tick = Tick {
            first_deadline: Instant::now() + self.interval,
            index: self.index,
            interval: self.interval,
            key: self.key,
            switch,
            sink,
            origin,
        };
        self.task = Some(tokio::spawn(tick.run()));
    }

    /// Stops the timer for good, waiting for an in-flight tick to finish.
    pub async fn cancel(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        debug!("Stopping timer {}...", self.index);
        task.abort();
        if let Err(e) = task.await {
            if e.is_panic() {
                warn!("Generator {} panicked: {}", self.index, e);
            }
        }
    }
}

impl Drop for TickGenerator {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Tick {
    first_deadline: Instant,
    index: usize,
    interval: Duration,
    key: KeyCode,
    switch: ToggleSwitch,
    sink: Arc<dyn InputSink>,
    origin: Instant,
}

impl Tick {
    async fn run(self) {
        let mut deadline = self.first_deadline;
        loop {
            time::sleep_until(deadline).await;
            deadline = self.fire(deadline, Instant::now());
        }
    }

    /// Handles one timer expiry and returns the next deadline.
    fn fire(&self, deadline: Instant, now: Instant) -> Instant {
        let (next, overruns) = forward(deadline, now, self.interval);

        if overruns > 1 {
            info!("Generator {}: missed ticks {}.", self.index, overruns - 1);
        }

        if self.switch.is_on() {
            match device::tap(self.sink.as_ref(), self.key) {
                Ok(()) => info!(
                    "Key event '{}' ({}ns).",
                    self.key,
                    now.duration_since(self.origin).as_nanos()
                ),
                Err(e) => warn!("Generator {}: failed to emit '{}': {}", self.index, self.key, e),
            }
        }

        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceSpec, InputHost, KeyState, Recording, RecordingHost};

    const SECOND: Duration = Duration::from_secs(1);

    fn recording_sink(keys: &[KeyCode]) -> (Arc<dyn InputSink>, Recording) {
        let host = RecordingHost::new();
        let allocated = host
            .allocate(&DeviceSpec::keyboard(keys.iter().copied()))
            .unwrap();
        let sink = host.register(allocated).unwrap();
        (sink, host.recording())
    }

    #[test]
    fn test_forward_before_deadline_is_noop() {
        let start = Instant::now();
        let deadline = start + SECOND;
        assert_eq!(forward(deadline, start, SECOND), (deadline, 0));
    }

    #[test]
    fn test_forward_on_time() {
        let deadline = Instant::now() + SECOND;
        assert_eq!(forward(deadline, deadline, SECOND), (deadline + SECOND, 1));

        let late = deadline + Duration::from_millis(10);
        assert_eq!(forward(deadline, late, SECOND), (deadline + SECOND, 1));
    }

    #[test]
    fn test_forward_counts_missed_intervals() {
        let deadline = Instant::now() + SECOND;
        let now = deadline + Duration::from_millis(2500);
        let (next, overruns) = forward(deadline, now, SECOND);
        assert_eq!(overruns, 3);
        assert_eq!(next, deadline + 3 * SECOND);
        assert!(next > now);
    }

    #[test]
    fn test_forward_exact_multiple_lands_after_now() {
        let deadline = Instant::now() + SECOND;
        let now = deadline + 2 * SECOND;
        assert_eq!(forward(deadline, now, SECOND), (deadline + 3 * SECOND, 3));
    }

    #[test]
    fn test_fire_suppressed_when_off_but_schedule_advances() {
        let (sink, recording) = recording_sink(&[KeyCode::Space]);
        let switch = ToggleSwitch::new(false);
        let origin = Instant::now();
        let tick = Tick {
            first_deadline: origin + SECOND,
            index: 1,
            interval: SECOND,
            key: KeyCode::Space,
            switch: switch.clone(),
            sink,
            origin,
        };

        let deadline = origin + SECOND;
        let next = tick.fire(deadline, deadline);
        assert_eq!(next, deadline + SECOND);
        assert!(recording.events().is_empty());

        switch.toggle();
        let after = tick.fire(next, next + Duration::from_millis(1500));
        assert_eq!(after, next + 2 * SECOND);

        let events = recording.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].state, KeyState::Pressed);
        assert_eq!(events[1].state, KeyState::Released);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generator_does_not_drift() {
        let (sink, recording) = recording_sink(&[KeyCode::A]);
        let interval = Duration::from_millis(250);
        let origin = Instant::now();

        let mut generator = TickGenerator::new(1, interval, KeyCode::A);
        generator.arm(ToggleSwitch::new(true), sink, origin);
        assert!(generator.is_armed());

        time::sleep(Duration::from_millis(2_600)).await;
        generator.cancel().await;
        assert!(!generator.is_armed());

        let presses = recording.presses(KeyCode::A);
        assert_eq!(presses.len(), 10);
        for (n, at) in presses.iter().enumerate() {
            assert_eq!(*at, origin + interval * (n as u32 + 1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_stops_emission() {
        let (sink, recording) = recording_sink(&[KeyCode::Space]);
        let mut generator = TickGenerator::new(1, SECOND, KeyCode::Space);
        generator.arm(ToggleSwitch::new(true), sink, Instant::now());

        time::sleep(Duration::from_millis(1_500)).await;
        generator.cancel().await;
        generator.cancel().await;

        let before = recording.events().len();
        time::sleep(5 * SECOND).await;
        assert_eq!(recording.events().len(), before);
        assert!(recording.is_released());
    }
}
