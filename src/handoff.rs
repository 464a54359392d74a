//! Handing image buffers from a producer to the refresh loop.
//!
//! [`FrameHandoff`] guards the reference to the current image buffer with a
//! `critical-section` mutex. The lock is held for a single install or for a
//! single pixel-pair read, never for a whole render pass:
//!
//! - **per-pixel visibility, no frame isolation**: a buffer installed while
//!   a pass is running is seen by every later read of that pass, so one
//!   refresh may mix pixels of two images. This is fine for a live display
//!   but not for bit-exact reproduction of single frames.
//! - [`FrameIsolated`] pins the installed reference once per pass instead.
//!   Installed buffers are shared borrows, so the pinned image stays valid
//!   and unchanged until the pass ends even if the producer installs a new
//!   one meanwhile.
//!
//! # Example
//! ```rust
//! use hub75_bitplane::handoff::FrameHandoff;
//! use hub75_bitplane::{compute_image_len, Color};
//!
//! static IMAGE: [u8; compute_image_len(64, 32)] = [0; compute_image_len(64, 32)];
//! static HANDOFF: FrameHandoff<'static, 64> = FrameHandoff::new();
//!
//! HANDOFF.install(&IMAGE);
//! assert_eq!(HANDOFF.read_pixel(3, 4), Color::new(0, 0, 0));
//! ```

use core::cell::Cell;

use critical_section::Mutex;

use crate::pixel::{read_rgb, PixelSource};
use crate::Color;

/// Shared reference to the image buffer currently shown on a panel `COLS`
/// pixels wide.
pub struct FrameHandoff<'a, const COLS: usize> {
    current: Mutex<Cell<Option<&'a [u8]>>>,
}

impl<'a, const COLS: usize> FrameHandoff<'a, COLS> {
    /// Create a handoff with no buffer installed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: Mutex::new(Cell::new(None)),
        }
    }

    /// Replace the installed image buffer.
    ///
    /// The buffer must hold `COLS * 2 * NROWS` RGB888 pixels; its layout is
    /// not validated.
    pub fn install(&self, buffer: &'a [u8]) {
        critical_section::with(|cs| self.current.borrow(cs).set(Some(buffer)));
        log::trace!("image buffer installed ({} bytes)", buffer.len());
    }

    /// Whether a buffer has been installed yet.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.current.borrow(cs).get().is_some())
    }

    /// The installed buffer.
    ///
    /// # Panics
    /// Panics if no buffer has been installed.
    #[must_use]
    pub fn current(&self) -> &'a [u8] {
        expect_installed(critical_section::with(|cs| self.current.borrow(cs).get()))
    }

    /// Read the pixel at (`x`, `y`) of the installed buffer.
    ///
    /// # Panics
    /// Panics if no buffer has been installed or the pixel lies outside it.
    #[must_use]
    pub fn read_pixel(&self, x: usize, y: usize) -> Color {
        let pixel = critical_section::with(|cs| {
            let buffer = self.current.borrow(cs).get()?;
            Some(read_rgb(buffer, COLS, x, y))
        });
        expect_installed(pixel)
    }

    /// Read the pixels at (`x`, `top`) and (`x`, `bottom`) under one lock.
    ///
    /// # Panics
    /// Panics if no buffer has been installed or a pixel lies outside it.
    #[must_use]
    pub fn read_pair(&self, x: usize, top: usize, bottom: usize) -> (Color, Color) {
        let pair = critical_section::with(|cs| {
            let buffer = self.current.borrow(cs).get()?;
            Some((
                read_rgb(buffer, COLS, x, top),
                read_rgb(buffer, COLS, x, bottom),
            ))
        });
        expect_installed(pair)
    }
}

impl<const COLS: usize> Default for FrameHandoff<'_, COLS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const COLS: usize> core::fmt::Debug for FrameHandoff<'_, COLS> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameHandoff")
            .field("cols", &COLS)
            .field("installed", &self.is_installed())
            .finish()
    }
}

impl<const COLS: usize> PixelSource for FrameHandoff<'_, COLS> {
    #[inline]
    fn pixel(&self, x: usize, y: usize) -> Color {
        self.read_pixel(x, y)
    }

    #[inline]
    fn pixel_pair(&self, x: usize, top: usize, bottom: usize) -> (Color, Color) {
        self.read_pair(x, top, bottom)
    }
}

#[inline]
#[track_caller]
fn expect_installed<T>(value: Option<T>) -> T {
    match value {
        Some(value) => value,
        None => panic!("image buffer is not installed"),
    }
}

/// A [`PixelSource`] that reads every render pass from a single image.
///
/// The handoff's current buffer is pinned by [`PixelSource::begin_pass`];
/// installs that land during the pass take effect on the next one.
pub struct FrameIsolated<'h, 'a, const COLS: usize> {
    handoff: &'h FrameHandoff<'a, COLS>,
    pinned: Cell<Option<&'a [u8]>>,
}

impl<'h, 'a, const COLS: usize> FrameIsolated<'h, 'a, COLS> {
    /// Wrap `handoff`. Nothing is pinned until the first pass begins.
    #[must_use]
    pub const fn new(handoff: &'h FrameHandoff<'a, COLS>) -> Self {
        Self {
            handoff,
            pinned: Cell::new(None),
        }
    }

    /// The wrapped handoff, for installing new buffers.
    #[must_use]
    pub const fn handoff(&self) -> &'h FrameHandoff<'a, COLS> {
        self.handoff
    }

    fn pinned(&self) -> &'a [u8] {
        match self.pinned.get() {
            Some(buffer) => buffer,
            None => {
                // reads outside a pass see the current buffer
                self.handoff.current()
            }
        }
    }
}

impl<const COLS: usize> core::fmt::Debug for FrameIsolated<'_, '_, COLS> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameIsolated")
            .field("handoff", self.handoff)
            .field("pinned", &self.pinned.get().is_some())
            .finish()
    }
}

impl<const COLS: usize> PixelSource for FrameIsolated<'_, '_, COLS> {
    #[inline]
    fn pixel(&self, x: usize, y: usize) -> Color {
        read_rgb(self.pinned(), COLS, x, y)
    }

    fn begin_pass(&self) {
        self.pinned.set(Some(self.handoff.current()));
    }
}
