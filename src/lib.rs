//! Bitplane scheduling and double-buffered refresh for HUB75 LED matrix displays.
//!
//! ## How HUB75 LED Displays Work
//!
//! HUB75 RGB LED matrix panels are scanned, time-multiplexed displays that behave like a long
//! daisy-chained shift register rather than a random-access framebuffer.
//!
//! ### Signal names
//! - **R1 G1 B1 / R2 G2 B2** – Serial colour data for the upper and lower halves of the active scan line
//! - **CLK** – Shift-register clock; every rising edge pushes the six colour bits one pixel to the right
//! - **LAT / STB** – Latch; copies the shift-register contents to the LED drivers for the row currently selected by the address lines
//! - **OE** – Output-Enable (active LOW): LEDs are lit while OE is LOW and blanked when it is HIGH
//! - **A B C D** – Row-address select lines (choose which pair of rows is lit)
//!
//! ### Row addressing
//! The address lines select the row pair that is lit *while* the next row pair is shifted in, so
//! every scan line carries the address of the **previous** row. The first scan line of a pass
//! addresses the last row pair of the panel. Each scan line blanks the output on its first column
//! and from the brightness cap onwards, and strobes LAT one column before the end of the line.
//!
//! ## Bitplanes instead of BCM frames
//!
//! Classic Binary Code Modulation renders `2^N - 1` frames per refresh. This crate renders only
//! `N` bitplanes, one per bit of significance, and lets the transport replay them through a
//! precomputed [`schedule::Schedule`] of `2^N - 1` slots. Plane `i` occupies `2^i` slots, and the
//! slots are spread evenly over the chain instead of being clustered, which keeps flicker low
//! while still giving `2^N` intensity levels per channel.
//!
//! ## Pipeline
//!
//! 1. A producer draws into an RGB888 buffer (see [`pixel::RgbCanvas`]) and installs it with
//!    [`handoff::FrameHandoff::install`].
//! 2. The [`refresh::RefreshLoop`] encodes every plane of the back buffer from the installed
//!    image ([`plane::Plane::encode`]).
//! 3. The filled back buffer is handed to the [`refresh::Transport`] as a [`plane::Chain`] of
//!    plane segments in schedule order, followed by a flip to that buffer.
//! 4. The back buffer index toggles and the loop sleeps for the refresh interval.
//!
//! ## Consistency
//!
//! [`handoff::FrameHandoff`] takes its lock per pixel pair, so a buffer installed while a pass is
//! running becomes visible part way through that pass. Wrap it in
//! [`handoff::FrameIsolated`] when every refresh must come from a single image.
//!
//! ## Available Feature Flags
//!
//! ### `esp-dma` Feature (required when using `esp-hal`)
//! Switches the `ReadBuffer` implementation of [`plane::Plane`] from `embedded-dma` to
//! `esp-hal::dma`.
//!
//! ### `esp32-ordering` Feature (required for original ESP32 only)
//! The original ESP32 I²S peripheral emits 16-bit words in swapped pairs. With this feature the
//! default [`config::Config`] swaps every pair of columns to compensate.
//!
//! ### `defmt` Feature
//! Implements `defmt::Format` for the public types so they can be emitted with the `defmt`
//! logging framework.
#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use embedded_graphics::pixelcolor::Rgb888;

pub mod config;
pub mod handoff;
pub mod pixel;
pub mod plane;
pub mod refresh;
pub mod schedule;

/// Color type read from image buffers
pub type Color = Rgb888;

/// Word size of the encoded scan data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSize {
    /// 8-bit word size
    Eight,
    /// 16-bit word size
    Sixteen,
}

/// Computes the number of scan lines (`NROWS`) for a panel with `rows` physical rows.
///
/// Two physical rows are driven per scan line.
#[must_use]
pub const fn compute_rows(rows: usize) -> usize {
    rows / 2
}

/// Computes the number of schedule slots for `planes` bitplanes.
///
/// # Arguments
///
/// * `planes` - Number of bitplanes (bits per color channel)
///
/// # Returns
///
/// `2^planes - 1`, the number of plane segments in one refresh chain
#[must_use]
pub const fn compute_slot_count(planes: usize) -> usize {
    (1usize << planes) - 1
}

/// Computes the length of a schedule including its end-of-chain sentinel.
///
/// This is the `CHAIN_LEN` parameter of [`schedule::Schedule`] and
/// [`refresh::RefreshLoop`].
#[must_use]
pub const fn compute_chain_len(planes: usize) -> usize {
    compute_slot_count(planes) + 1
}

/// Computes the size in bytes of an RGB888 image buffer of `cols` × `rows` pixels.
#[must_use]
pub const fn compute_image_len(cols: usize, rows: usize) -> usize {
    cols * rows * 3
}
