//! Light color debouncing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::msg::LightColor;
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Debounce state for the observed light color.
///
/// A color is only stabilised once it has been seen on `threshold` cycles
/// after the cycle it first appeared on. Until then the previous output is
/// kept.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DebounceState {
    threshold: u32,

    /// Color observed on the previous cycle
    last_raw: LightColor,

    /// Color currently acted upon
    stabilised: LightColor,

    /// Number of cycles since `last_raw` changed
    count: u32,

    /// Stop index currently output
    stop_index: Option<usize>,
}

/// The result of one debounce cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceOutput {
    /// The stop waypoint index, or `None` if there is no red light to stop for
    pub stop_index: Option<usize>,

    /// True if the stabilised color changed this cycle
    pub changed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DebounceState {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            last_raw: LightColor::Unknown,
            stabilised: LightColor::Unknown,
            count: 0,
            stop_index: None,
        }
    }

    /// Update with the color observed this cycle.
    ///
    /// `light_stop_index` is the waypoint index of the stop line the color
    /// belongs to, used as the output if the stabilised color is red.
    pub fn update(&mut self, raw: LightColor, light_stop_index: Option<usize>) -> DebounceOutput {
        let mut changed = false;

        if raw != self.last_raw {
            self.count = 0;
            self.last_raw = raw;
        } else if self.count >= self.threshold {
            changed = self.stabilised != self.last_raw;
            self.stabilised = self.last_raw;
            self.stop_index = match self.stabilised {
                LightColor::Red => light_stop_index,
                _ => None,
            };
        }

        self.count = self.count.saturating_add(1);

        DebounceOutput {
            stop_index: self.stop_index,
            changed,
        }
    }

    pub fn stabilised(&self) -> LightColor {
        self.stabilised
    }

    pub fn last_raw(&self) -> LightColor {
        self.last_raw
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn stop_index(&self) -> Option<usize> {
        self.stop_index
    }
}

impl Default for DebounceState {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use LightColor::*;

    #[test]
    fn test_red_stabilises_after_threshold() {
        let mut db = DebounceState::new(3);

        // First red resets the counter, then 3 more cycles are needed
        for _ in 0..3 {
            assert_eq!(db.update(Red, Some(292)).stop_index, None);
        }

        let out = db.update(Red, Some(292));
        assert_eq!(out.stop_index, Some(292));
        assert!(out.changed);
        assert_eq!(db.stabilised(), Red);
    }

    #[test]
    fn test_stabilises_once() {
        let mut db = DebounceState::new(3);
        let mut num_changes = 0;

        for _ in 0..20 {
            if db.update(Yellow, Some(10)).changed {
                num_changes += 1;
            }
        }

        assert_eq!(num_changes, 1);
        assert_eq!(db.stabilised(), Yellow);
        assert_eq!(db.stop_index(), None);
    }

    #[test]
    fn test_flicker_does_not_promote() {
        let mut db = DebounceState::new(3);

        for c in [Red, Red, Green].iter() {
            let out = db.update(*c, Some(60));
            assert_eq!(out.stop_index, None);
            assert!(!out.changed);
            assert_eq!(db.stabilised(), Unknown);
        }

        assert_eq!(db.last_raw(), Green);
        assert_eq!(db.count(), 1);
    }

    #[test]
    fn test_change_resets_counter() {
        let mut db = DebounceState::new(3);

        for _ in 0..5 {
            db.update(Red, Some(60));
        }
        assert_eq!(db.stop_index(), Some(60));

        // A single green frame does not release the stop
        assert_eq!(db.update(Green, Some(60)).stop_index, Some(60));
        assert_eq!(db.update(Red, Some(60)).stop_index, Some(60));

        // A sustained green releases it after the threshold
        for _ in 0..3 {
            assert_eq!(db.update(Green, Some(60)).stop_index, Some(60));
        }
        assert_eq!(db.update(Green, Some(60)).stop_index, None);
        assert_eq!(db.stabilised(), Green);
    }

    #[test]
    fn test_stop_index_follows_light() {
        let mut db = DebounceState::new(3);

        for _ in 0..4 {
            db.update(Red, Some(60));
        }
        assert_eq!(db.stop_index(), Some(60));

        // Still red but now a different light
        assert_eq!(db.update(Red, Some(120)).stop_index, Some(120));
    }
}
