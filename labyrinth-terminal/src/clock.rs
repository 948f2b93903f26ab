//! Fixed-rate loop timing.
//!
//! Updates run at a fixed rate. Renders run at a capped rate, or on every poll
//! when uncapped. Each poll grants at most one of each, so a stalled loop drops
//! work rather than replaying it.

use std::time::{Duration, Instant};

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// What the loop should do on this poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick {
    pub update: bool,
    pub render: bool,
}

/// Updates and renders completed over the last whole second
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rates {
    pub fps: u32,
    pub ups: u32,
}

#[derive(Debug, Clone)]
pub struct FrameClock {
    nanos_per_update: f64,
    nanos_per_render: Option<f64>,
    last_poll: Instant,
    update_delta: f64,
    render_delta: f64,
    window_start: Instant,
    updates: u32,
    renders: u32,
}

impl FrameClock {
    /// `max_ups` must be non-zero, as must `max_fps` when given.
    pub fn new(max_ups: u32, max_fps: Option<u32>, now: Instant) -> Self {
        Self {
            nanos_per_update: NANOS_PER_SECOND / max_ups.max(1) as f64,
            nanos_per_render: max_fps.map(|fps| NANOS_PER_SECOND / fps.max(1) as f64),
            last_poll: now,
            update_delta: 0.0,
            render_delta: 0.0,
            window_start: now,
            updates: 0,
            renders: 0,
        }
    }

    pub fn poll(&mut self, now: Instant) -> Tick {
        let elapsed = now.saturating_duration_since(self.last_poll).as_nanos() as f64;
        self.last_poll = now;

        let mut tick = Tick::default();

        self.update_delta += elapsed / self.nanos_per_update;
        if self.update_delta >= 1.0 {
            tick.update = true;
            self.updates += 1;
            self.update_delta -= 1.0;
        }

        match self.nanos_per_render {
            Some(nanos) => {
                self.render_delta += elapsed / nanos;
                if self.render_delta >= 1.0 {
                    tick.render = true;
                    self.render_delta -= 1.0;
                }
            }
            None => tick.render = true,
        }
        if tick.render {
            self.renders += 1;
        }

        tick
    }

    /// Counts for the second that just closed, once per second
    pub fn rates(&mut self, now: Instant) -> Option<Rates> {
        if now.saturating_duration_since(self.window_start) < Duration::from_secs(1) {
            return None;
        }
        let rates = Rates {
            fps: self.renders,
            ups: self.updates,
        };
        self.window_start += Duration::from_secs(1);
        self.updates = 0;
        self.renders = 0;
        Some(rates)
    }

    /// Time until the next update or capped render falls due
    pub fn until_next(&self) -> Duration {
        let update = (1.0 - self.update_delta).max(0.0) * self.nanos_per_update;
        let wait = match self.nanos_per_render {
            Some(nanos) => update.min((1.0 - self.render_delta).max(0.0) * nanos),
            None => 0.0,
        };
        Duration::from_nanos(wait as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_update_fires_at_fixed_rate() {
        let start = Instant::now();
        let mut clock = FrameClock::new(20, Some(10), start);

        assert_eq!(clock.poll(start + ms(25)), Tick::default());
        let tick = clock.poll(start + ms(50));
        assert!(tick.update);
        assert!(!tick.render);

        let tick = clock.poll(start + ms(100));
        assert!(tick.update);
        assert!(tick.render);
    }

    #[test]
    fn test_at_most_one_update_per_poll() {
        let start = Instant::now();
        let mut clock = FrameClock::new(20, Some(10), start);

        // a 300ms stall owes six updates but only one is granted per poll
        let tick = clock.poll(start + ms(300));
        assert!(tick.update);
        assert!(tick.render);
        assert!(clock.poll(start + ms(300)).update);
    }

    #[test]
    fn test_uncapped_render_every_poll() {
        let start = Instant::now();
        let mut clock = FrameClock::new(20, None, start);
        for i in 1..=5 {
            assert!(clock.poll(start + ms(i)).render);
        }
        assert_eq!(clock.until_next(), Duration::ZERO);
    }

    #[test]
    fn test_rates_reported_once_per_second() {
        let start = Instant::now();
        let mut clock = FrameClock::new(20, Some(10), start);
        for i in 1..=20 {
            clock.poll(start + ms(i * 50));
        }
        assert_eq!(clock.rates(start + ms(999)), None);
        assert_eq!(clock.rates(start + ms(1000)), Some(Rates { fps: 10, ups: 20 }));
        assert_eq!(clock.rates(start + ms(1500)), None);
    }

    #[test]
    fn test_until_next_tracks_nearest_deadline() {
        let start = Instant::now();
        let mut clock = FrameClock::new(10, Some(40), start);
        clock.poll(start + ms(10));
        let wait = clock.until_next();
        assert!(wait <= ms(15) && wait >= ms(14), "{wait:?}");
    }
}
