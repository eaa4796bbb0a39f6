use serde::Serialize;

pub const XP_PER_LEVEL: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Profile {
    xp: u32,
}

impl Profile {
    pub fn new(start_xp: u32) -> Self {
        Profile { xp: start_xp }
    }

    pub fn xp(&self) -> u32 {
        self.xp
    }

    /// XP never goes down.
    pub fn grant(&mut self, amount: u32) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        self.xp
    }

    pub fn level(&self) -> u32 {
        1 + self.xp / XP_PER_LEVEL
    }

    /// How far into the current level, 0..100.
    pub fn level_percent(&self) -> f64 {
        (self.xp % XP_PER_LEVEL) as f64 * 100.0 / XP_PER_LEVEL as f64
    }
}
