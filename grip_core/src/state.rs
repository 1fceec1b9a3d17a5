//! ON/OFF mode driven by a debounced push button.
use grip_traits::ButtonLevel;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceMode {
    #[default]
    On,
    Off,
}

impl DeviceMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

impl std::fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::On => "on",
            Self::Off => "off",
        })
    }
}

/// Falling-edge detector with a settle window.
///
/// A Released -> Pressed edge is accepted immediately when the line has not
/// changed level within `settle` before it. Contact bounce on press or
/// release therefore produces no extra edges, and a held button produces
/// none at all.
#[derive(Debug, Clone)]
pub struct ButtonEdgeDetector {
    settle: Duration,
    previous: ButtonLevel,
    last_change: Option<Instant>,
}

impl ButtonEdgeDetector {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            previous: ButtonLevel::Released,
            last_change: None,
        }
    }

    /// Feed one sample; true when it is an accepted press.
    pub fn sample(&mut self, level: ButtonLevel, now: Instant) -> bool {
        if level == self.previous {
            return false;
        }
        let falling = level == ButtonLevel::Pressed;
        let bouncing = self
            .last_change
            .is_some_and(|t| now.saturating_duration_since(t) < self.settle);
        self.previous = level;
        self.last_change = Some(now);
        if falling && bouncing {
            tracing::trace!("button edge inside settle window ignored");
        }
        falling && !bouncing
    }
}

/// Device mode plus the button that toggles it.
#[derive(Debug, Clone)]
pub struct DeviceState {
    mode: DeviceMode,
    button: ButtonEdgeDetector,
}

impl DeviceState {
    pub fn new(initial: DeviceMode, debounce: Duration) -> Self {
        Self {
            mode: initial,
            button: ButtonEdgeDetector::new(debounce),
        }
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    /// Returns the new mode when this sample toggled it.
    pub fn poll(&mut self, level: ButtonLevel, now: Instant) -> Option<DeviceMode> {
        if self.button.sample(level, now) {
            self.mode = self.mode.toggled();
            Some(self.mode)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ButtonLevel::{Pressed, Released};

    #[test]
    fn held_button_toggles_once() {
        let t0 = Instant::now();
        let mut s = DeviceState::new(DeviceMode::On, Duration::from_millis(200));
        assert_eq!(s.poll(Pressed, t0), Some(DeviceMode::Off));
        for i in 1..50 {
            assert_eq!(s.poll(Pressed, t0 + Duration::from_millis(i * 10)), None);
        }
        assert_eq!(s.mode(), DeviceMode::Off);
    }

    #[test]
    fn bounce_inside_settle_window_is_ignored() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut d = ButtonEdgeDetector::new(ms(200));
        assert!(d.sample(Pressed, t0));
        assert!(!d.sample(Released, t0 + ms(5)));
        assert!(!d.sample(Pressed, t0 + ms(10)));
        assert!(!d.sample(Released, t0 + ms(250)));
        // release bounce
        assert!(!d.sample(Pressed, t0 + ms(300)));
        assert!(!d.sample(Released, t0 + ms(305)));
        assert!(d.sample(Pressed, t0 + ms(600)));
    }

    #[test]
    fn rising_edge_does_nothing() {
        let mut d = ButtonEdgeDetector::new(Duration::ZERO);
        let now = Instant::now();
        assert!(!d.sample(Released, now));
        assert!(d.sample(Pressed, now));
        assert!(!d.sample(Released, now));
    }
}
