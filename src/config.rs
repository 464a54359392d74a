//! Build-time configuration of the scan-line encoding and refresh pacing.
//!
//! Panel geometry and plane count are const generics on the types that use
//! them; everything else that shapes a scan line lives in [`Config`].
//!
//! # Example
//! ```rust
//! use hub75_bitplane::config::Config;
//! use fugit::MillisDurationU32;
//!
//! const CONFIG: Config<64> = Config::new()
//!     .with_brightness(48)
//!     .with_refresh_interval(MillisDurationU32::from_ticks(5));
//!
//! assert_eq!(CONFIG.brightness(), 48);
//! assert_eq!(Config::<64>::LATCH_COLUMN, 62);
//! ```

use fugit::MillisDurationU32;

/// Default pause between two refreshes.
pub const DEFAULT_REFRESH_INTERVAL: MillisDurationU32 = MillisDurationU32::from_ticks(10);

/// Scan-line configuration for a panel `COLS` pixels wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config<const COLS: usize> {
    brightness: usize,
    refresh_interval: MillisDurationU32,
    swap_column_pairs: bool,
}

impl<const COLS: usize> Config<COLS> {
    /// Column that strobes LAT.
    ///
    /// One column before the end of the line, so the address lines have
    /// settled before the last clock.
    pub const LATCH_COLUMN: usize = COLS - 2;

    /// Create a configuration with full brightness, the default refresh
    /// interval and column-pair swapping following the `esp32-ordering`
    /// feature.
    ///
    /// # Panics
    /// Panics if `COLS` is smaller than 3.
    #[must_use]
    pub const fn new() -> Self {
        assert!(COLS >= 3, "a scan line needs at least three columns");
        let config = Self {
            brightness: Self::LATCH_COLUMN,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            swap_column_pairs: false,
        };
        config.with_swapped_column_pairs(cfg!(feature = "esp32-ordering"))
    }

    /// Set the brightness cap.
    ///
    /// Column 0 and every column from `brightness` onwards are blanked, so a
    /// lower value shortens the lit part of each scan line.
    ///
    /// # Panics
    /// Panics unless `1 <= brightness <= COLS - 2`; the latch column must lie
    /// in the blanked tail.
    #[must_use]
    pub const fn with_brightness(mut self, brightness: usize) -> Self {
        assert!(
            brightness >= 1 && brightness <= Self::LATCH_COLUMN,
            "brightness cap must be within 1..=COLS-2"
        );
        self.brightness = brightness;
        self
    }

    /// Set the pause taken after every flip.
    #[must_use]
    pub const fn with_refresh_interval(mut self, interval: MillisDurationU32) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Swap every pair of columns (`x ^ 1`) for panels wired mirrored per
    /// column pair, or transports that emit words in swapped pairs.
    ///
    /// # Panics
    /// Panics if `swap` is set and `COLS` is odd.
    #[must_use]
    pub const fn with_swapped_column_pairs(mut self, swap: bool) -> Self {
        assert!(!swap || COLS % 2 == 0, "column pair swap needs an even width");
        self.swap_column_pairs = swap;
        self
    }

    /// First blanked column of the tail.
    #[must_use]
    pub const fn brightness(&self) -> usize {
        self.brightness
    }

    /// Pause after every flip.
    #[must_use]
    pub const fn refresh_interval(&self) -> MillisDurationU32 {
        self.refresh_interval
    }

    /// Whether column pairs are swapped.
    #[must_use]
    pub const fn swap_column_pairs(&self) -> bool {
        self.swap_column_pairs
    }

    /// Whether output is blanked at scan column `col`.
    #[inline]
    #[must_use]
    pub const fn is_blanked(&self, col: usize) -> bool {
        col < 1 || col >= self.brightness
    }

    /// Whether scan column `col` strobes LAT.
    #[inline]
    #[must_use]
    pub const fn is_latch(col: usize) -> bool {
        col == Self::LATCH_COLUMN
    }

    /// Image column sampled for scan column `col`.
    #[inline]
    #[must_use]
    pub const fn source_column(&self, col: usize) -> usize {
        if self.swap_column_pairs {
            col ^ 1
        } else {
            col
        }
    }
}

impl<const COLS: usize> Default for Config<COLS> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "defmt")]
impl<const COLS: usize> defmt::Format for Config<COLS> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Config<{}> brightness: {} latch: {} refresh: {}ms swap: {}",
            COLS,
            self.brightness,
            Self::LATCH_COLUMN,
            self.refresh_interval.ticks(),
            self.swap_column_pairs
        );
    }
}
