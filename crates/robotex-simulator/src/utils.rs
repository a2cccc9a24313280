use tokio::time::Instant;

/// A struct that triggers an event periodically at a given interval of simulated time.
pub struct IntervalTrigger {
    interval: f64,
    next_trigger: f64,
}

impl IntervalTrigger {
    /// Creates a new `IntervalTrigger` that first fires after one full interval.
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            next_trigger: interval,
        }
    }

    /// Returns true if the event should be triggered at the given time.
    pub fn trigger(&mut self, time: f64) -> bool {
        if time >= self.next_trigger {
            self.next_trigger += self.interval;
            true
        } else {
            false
        }
    }
}

/// Measures how many frames are registered per second of runtime clock time.
///
/// The rate is recomputed once every `window` frames. Changes of one frame per second
/// or less are ignored so the reported value does not flicker.
pub struct FpsCounter {
    window: u32,
    target_fps: u32,
    window_start: Instant,
    counted_frames: u32,
    last_fps: u32,
    best_fps: u32,
    worst_fps: Option<u32>,
}

impl FpsCounter {
    pub fn new(window: u32, target_fps: u32) -> Self {
        Self {
            window: window.max(1),
            target_fps,
            window_start: Instant::now(),
            counted_frames: 0,
            last_fps: target_fps,
            best_fps: 0,
            worst_fps: None,
        }
    }

    pub fn register_frame(&mut self) {
        self.register_frame_at(Instant::now());
    }

    fn register_frame_at(&mut self, now: Instant) {
        self.counted_frames += 1;
        if self.counted_frames < self.window {
            return;
        }

        let elapsed = now.duration_since(self.window_start).as_secs_f64();
        if elapsed > 0.0 {
            let current = (self.counted_frames as f64 / elapsed).round() as u32;
            if current.abs_diff(self.last_fps) > 1 {
                self.last_fps = current;
            }
        }
        self.best_fps = self.best_fps.max(self.last_fps);
        self.worst_fps = Some(match self.worst_fps {
            Some(worst) => worst.min(self.last_fps),
            None => self.last_fps,
        });

        self.window_start = now;
        self.counted_frames = 0;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.window, self.target_fps);
    }

    pub fn fps(&self) -> u32 {
        self.last_fps
    }

    pub fn best_fps(&self) -> u32 {
        self.best_fps
    }

    pub fn worst_fps(&self) -> Option<u32> {
        self.worst_fps
    }
}
