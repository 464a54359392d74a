//! Ordering of bitplanes within one refresh chain.
//!
//! A refresh chain has `2^PLANES - 1` slots. Each slot shows one bitplane
//! for one scan-out pass, so how often a plane appears sets how long it is
//! lit. Plane `i` is inserted with a load of `2^(PLANES - i)` and every slot
//! goes to the plane with the smallest accumulated load (lowest index on
//! ties). The result visits plane `i` exactly `2^i` times and spreads the
//! visits over the chain instead of clustering them, which keeps flicker
//! low.
//!
//! For four planes:
//!
//! ```text
//! 0 1 2 3 3 2 3 3 1 2 3 3 2 3 3 END
//! ```
//!
//! # Example
//! ```rust
//! use hub75_bitplane::compute_chain_len;
//! use hub75_bitplane::schedule::{Schedule, Slot};
//!
//! const PLANES: usize = 2;
//! const SCHEDULE: Schedule<PLANES, { compute_chain_len(PLANES) }> = Schedule::new();
//!
//! assert_eq!(
//!     SCHEDULE.slots(),
//!     &[Slot::Plane(0), Slot::Plane(1), Slot::Plane(1), Slot::End]
//! );
//! ```

use core::fmt;

/// One entry of a refresh chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Show the bitplane with this index.
    Plane(u8),
    /// End of the chain.
    End,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Slot {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Slot::Plane(plane) => defmt::write!(f, "{}", plane),
            Slot::End => defmt::write!(f, "END"),
        }
    }
}

/// Load added to `plane` each time it is inserted into a chain of `planes`
/// bitplanes.
#[must_use]
pub const fn plane_weight(plane: usize, planes: usize) -> u32 {
    1 << (planes - plane)
}

/// Slot order of a refresh chain of `PLANES` bitplanes.
///
/// `CHAIN_LEN` must be `2^PLANES`: `2^PLANES - 1` plane slots followed by
/// [`Slot::End`]. Use [`crate::compute_chain_len`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Schedule<const PLANES: usize, const CHAIN_LEN: usize> {
    slots: [Slot; CHAIN_LEN],
}

impl<const PLANES: usize, const CHAIN_LEN: usize> Schedule<PLANES, CHAIN_LEN> {
    /// Build the schedule.
    ///
    /// # Panics
    /// Panics unless `1 <= PLANES <= 8` and `CHAIN_LEN == 2^PLANES`.
    #[must_use]
    pub const fn new() -> Self {
        assert!(PLANES >= 1 && PLANES <= 8, "PLANES must be within 1..=8");
        assert!(CHAIN_LEN == 1 << PLANES, "CHAIN_LEN must be 2^PLANES");

        let mut loads = [0u32; PLANES];
        let mut slots = [Slot::End; CHAIN_LEN];
        let mut slot = 0;
        while slot < CHAIN_LEN - 1 {
            let mut chosen = 0;
            let mut plane = 1;
            while plane < PLANES {
                if loads[plane] < loads[chosen] {
                    chosen = plane;
                }
                plane += 1;
            }
            slots[slot] = Slot::Plane(chosen as u8);
            loads[chosen] += plane_weight(chosen, PLANES);
            slot += 1;
        }
        Self { slots }
    }

    /// All slots, including the trailing [`Slot::End`].
    #[must_use]
    pub const fn slots(&self) -> &[Slot; CHAIN_LEN] {
        &self.slots
    }

    /// Number of plane slots, not counting the end marker.
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        CHAIN_LEN - 1
    }

    /// Plane indices in chain order, stopping at the end marker.
    pub fn planes(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().map_while(|slot| match slot {
            Slot::Plane(plane) => Some(*plane as usize),
            Slot::End => None,
        })
    }

    /// How many slots show `plane`.
    #[must_use]
    pub fn occurrences(&self, plane: usize) -> usize {
        self.planes().filter(|p| *p == plane).count()
    }

    /// Load added to `plane` per insertion.
    #[must_use]
    pub const fn weight(&self, plane: usize) -> u32 {
        plane_weight(plane, PLANES)
    }
}

impl<const PLANES: usize, const CHAIN_LEN: usize> Default for Schedule<PLANES, CHAIN_LEN> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const PLANES: usize, const CHAIN_LEN: usize> fmt::Display for Schedule<PLANES, CHAIN_LEN> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, plane) in self.planes().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{plane}")?;
        }
        Ok(())
    }
}

impl<const PLANES: usize, const CHAIN_LEN: usize> fmt::Debug for Schedule<PLANES, CHAIN_LEN> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule")
            .field("planes", &PLANES)
            .field("slots", &self.len())
            .field("order", &format_args!("{self}"))
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl<const PLANES: usize, const CHAIN_LEN: usize> defmt::Format for Schedule<PLANES, CHAIN_LEN> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Schedule<{}, {}> {}", PLANES, CHAIN_LEN, self.slots);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::format;
    use std::vec::Vec;

    use super::*;
    use crate::compute_chain_len;

    fn order<const PLANES: usize, const CHAIN_LEN: usize>() -> Vec<usize> {
        Schedule::<PLANES, CHAIN_LEN>::new().planes().collect()
    }

    macro_rules! for_each_depth {
        ($check:ident) => {
            $check::<1, { compute_chain_len(1) }>();
            $check::<2, { compute_chain_len(2) }>();
            $check::<3, { compute_chain_len(3) }>();
            $check::<4, { compute_chain_len(4) }>();
            $check::<5, { compute_chain_len(5) }>();
            $check::<6, { compute_chain_len(6) }>();
            $check::<7, { compute_chain_len(7) }>();
            $check::<8, { compute_chain_len(8) }>();
        };
    }

    #[test]
    fn test_known_orders() {
        assert_eq!(order::<1, 2>(), [0]);
        assert_eq!(order::<2, 4>(), [0, 1, 1]);
        assert_eq!(order::<3, 8>(), [0, 1, 2, 2, 1, 2, 2]);
        assert_eq!(
            order::<4, 16>(),
            [0, 1, 2, 3, 3, 2, 3, 3, 1, 2, 3, 3, 2, 3, 3]
        );
    }

    #[test]
    fn test_slot_count() {
        fn check<const PLANES: usize, const CHAIN_LEN: usize>() {
            let schedule = Schedule::<PLANES, CHAIN_LEN>::new();
            assert_eq!(schedule.len(), (1 << PLANES) - 1);
            assert_eq!(schedule.planes().count(), (1 << PLANES) - 1);
            assert_eq!(schedule.slots().last(), Some(&Slot::End));
            assert_eq!(
                schedule.slots().iter().filter(|s| **s == Slot::End).count(),
                1
            );
        }
        for_each_depth!(check);
    }

    #[test]
    fn test_every_plane_present_with_binary_multiplicity() {
        fn check<const PLANES: usize, const CHAIN_LEN: usize>() {
            let schedule = Schedule::<PLANES, CHAIN_LEN>::new();
            for plane in 0..PLANES {
                assert_eq!(
                    schedule.occurrences(plane),
                    1 << plane,
                    "plane {plane} of {PLANES}"
                );
            }
            assert!(schedule.planes().all(|p| p < PLANES));
        }
        for_each_depth!(check);
    }

    #[test]
    fn test_deterministic() {
        fn check<const PLANES: usize, const CHAIN_LEN: usize>() {
            let a = Schedule::<PLANES, CHAIN_LEN>::new();
            let b = Schedule::<PLANES, CHAIN_LEN>::default();
            assert_eq!(a, b);
        }
        for_each_depth!(check);
    }

    #[test]
    fn test_loads_balance() {
        // after a full chain every plane carries the same load
        fn check<const PLANES: usize, const CHAIN_LEN: usize>() {
            let schedule = Schedule::<PLANES, CHAIN_LEN>::new();
            let mut loads = [0u32; PLANES];
            for plane in schedule.planes() {
                loads[plane] += schedule.weight(plane);
            }
            assert!(loads.iter().all(|l| *l == 1 << PLANES), "{loads:?}");
        }
        for_each_depth!(check);
    }

    #[test]
    fn test_most_significant_plane_spread() {
        // plane 3 of 4 never appears more than twice in a row
        let order = order::<4, 16>();
        let longest_run = order
            .split(|p| *p != 3)
            .map(<[usize]>::len)
            .max()
            .unwrap_or(0);
        assert_eq!(longest_run, 2);
    }

    #[test]
    fn test_weights() {
        let schedule = Schedule::<3, 8>::new();
        assert_eq!(schedule.weight(0), 8);
        assert_eq!(schedule.weight(1), 4);
        assert_eq!(schedule.weight(2), 2);
        assert_eq!(plane_weight(0, 1), 2);
    }

    #[test]
    fn test_const_construction() {
        const SCHEDULE: Schedule<2, 4> = Schedule::new();
        assert_eq!(
            SCHEDULE.slots(),
            &[Slot::Plane(0), Slot::Plane(1), Slot::Plane(1), Slot::End]
        );
    }

    #[test]
    fn test_display_and_debug() {
        let schedule = Schedule::<3, 8>::new();
        assert_eq!(format!("{schedule}"), "0 1 2 2 1 2 2");
        assert_eq!(
            format!("{schedule:?}"),
            "Schedule { planes: 3, slots: 7, order: 0 1 2 2 1 2 2 }"
        );
    }

    #[test]
    #[should_panic(expected = "CHAIN_LEN")]
    fn test_wrong_chain_len_panics() {
        let _ = Schedule::<3, 7>::new();
    }
}
