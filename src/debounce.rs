use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debounce {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescheduling_pushes_the_deadline_out() {
        let t0 = Instant::now();
        let mut d = Debounce::new(Duration::from_millis(300));
        d.schedule(t0);
        d.schedule(t0 + Duration::from_millis(200));
        assert!(!d.fire(t0 + Duration::from_millis(350)));
        assert!(d.fire(t0 + Duration::from_millis(500)));
        assert!(!d.fire(t0 + Duration::from_millis(900)));
    }

    #[test]
    fn cancel_disarms() {
        let t0 = Instant::now();
        let mut d = Debounce::new(Duration::ZERO);
        d.schedule(t0);
        assert!(d.cancel());
        assert!(!d.cancel());
        assert!(!d.fire(t0));
    }
}
