//! Real-time feed, rapid and spindle overrides.

pub const OVERRIDE_MIN: u8 = 10;
pub const OVERRIDE_MAX: u8 = 200;

pub const FEED_RESET: u8 = 0x90;
pub const FEED_COARSE_PLUS: u8 = 0x91;
pub const FEED_COARSE_MINUS: u8 = 0x92;
pub const FEED_FINE_PLUS: u8 = 0x93;
pub const FEED_FINE_MINUS: u8 = 0x94;
pub const RAPID_RESET: u8 = 0x95;
pub const RAPID_MEDIUM: u8 = 0x96;
pub const RAPID_LOW: u8 = 0x97;
pub const SPINDLE_RESET: u8 = 0x99;
pub const SPINDLE_COARSE_PLUS: u8 = 0x9A;
pub const SPINDLE_COARSE_MINUS: u8 = 0x9B;
pub const SPINDLE_FINE_PLUS: u8 = 0x9C;
pub const SPINDLE_FINE_MINUS: u8 = 0x9D;

/// Percentages, 100 meaning programmed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overrides {
    pub feed: u8,
    pub rapid: u8,
    pub spindle: u8,
}

impl Default for Overrides {
    fn default() -> Self {
        Self { feed: 100, rapid: 100, spindle: 100 }
    }
}

fn step(value: u8, delta: i16) -> u8 {
    (value as i16 + delta).clamp(OVERRIDE_MIN as i16, OVERRIDE_MAX as i16) as u8
}

impl Overrides {
    /// Applies an override byte. Returns `false` if the byte is not one.
    pub fn apply(&mut self, byte: u8) -> bool {
        match byte {
            FEED_RESET => self.feed = 100,
            FEED_COARSE_PLUS => self.feed = step(self.feed, 10),
            FEED_COARSE_MINUS => self.feed = step(self.feed, -10),
            FEED_FINE_PLUS => self.feed = step(self.feed, 1),
            FEED_FINE_MINUS => self.feed = step(self.feed, -1),
            RAPID_RESET => self.rapid = 100,
            RAPID_MEDIUM => self.rapid = 50,
            RAPID_LOW => self.rapid = 25,
            SPINDLE_RESET => self.spindle = 100,
            SPINDLE_COARSE_PLUS => self.spindle = step(self.spindle, 10),
            SPINDLE_COARSE_MINUS => self.spindle = step(self.spindle, -10),
            SPINDLE_FINE_PLUS => self.spindle = step(self.spindle, 1),
            SPINDLE_FINE_MINUS => self.spindle = step(self.spindle, -1),
            _ => return false,
        }
        tracing::debug!("overrides now feed={} rapid={} spindle={}", self.feed, self.rapid, self.spindle);
        true
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn report(&self) -> String {
        format!("{},{},{}", self.feed, self.rapid, self.spindle)
    }
}
