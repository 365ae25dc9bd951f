use std::time::{Duration, Instant};

const FRAME_DURATION: Duration = Duration::from_millis(100);

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Braille spinner advanced by the render loop.
#[derive(Debug, Clone)]
pub struct Spinner {
    frame: usize,
    last_tick: Instant,
}

impl Spinner {
    pub fn new(now: Instant) -> Self {
        Self {
            frame: 0,
            last_tick: now,
        }
    }

    /// Advance one frame if a frame duration has passed since the last advance.
    pub fn tick(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_tick) >= FRAME_DURATION {
            self.frame = (self.frame + 1) % FRAMES.len();
            self.last_tick = now;
        }
    }

    /// Start over from the first frame, e.g. when the indicator reappears.
    pub fn reset(&mut self, now: Instant) {
        self.frame = 0;
        self.last_tick = now;
    }

    pub fn current_frame(&self) -> &'static str {
        FRAMES[self.frame]
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_respects_frame_duration() {
        let t0 = Instant::now();
        let mut s = Spinner::new(t0);
        s.tick(t0 + Duration::from_millis(50));
        assert_eq!(s.current_frame(), FRAMES[0]);
        s.tick(t0 + Duration::from_millis(100));
        assert_eq!(s.current_frame(), FRAMES[1]);
    }

    #[test]
    fn test_wraps_around() {
        let t0 = Instant::now();
        let mut s = Spinner::new(t0);
        for i in 1..=FRAMES.len() {
            s.tick(t0 + FRAME_DURATION * i as u32);
        }
        assert_eq!(s.current_frame(), FRAMES[0]);
    }
}
