//! Bitplane memory and the scan-word encoder.
//!
//! Every bitplane holds one complete scan-out pass: `NROWS` scan lines of
//! `COLS` 16-bit words. Each word drives the HUB75 bus for one clock:
//!
//! ```text
//!  15 14 | 13 | 12  | 11 10  9  8 | 7  6 |  5  4  3 |  2  1  0
//!   -  - | OE | LAT |  D  C  B  A | -  - | B2 G2 R2 | B1 G1 R1
//! ```
//!
//! The address lines carry the *previous* scan line because the panel keeps
//! showing that line while the current one is shifted in; LAT commits the
//! address once per line with the output blanked.
//!
//! Two complete sets of planes ([`Backbuffer`]) live in a [`PlaneArena`]:
//! one is streamed by the transport while the other is refilled. A filled
//! back buffer is handed over as a [`Chain`], its planes in
//! [`Schedule`] order.
//!
//! # Memory Usage
//! `2 × PLANES × NROWS × COLS × 2` bytes, e.g. 32 KiB for a 64 × 32 panel
//! with 8 planes. The arena is meant to be placed in DMA-capable memory
//! once, for example in a `static`.
//!
//! # Safety
//! The `ReadBuffer` implementations hand raw pointers to the transport. The
//! refresh loop never writes the buffer it last flipped to, so a transport
//! may keep streaming a chain until the next flip.

use bitfield::bitfield;
#[cfg(not(feature = "esp-dma"))]
use embedded_dma::ReadBuffer;
use embedded_graphics::pixelcolor::RgbColor;
#[cfg(feature = "esp-dma")]
use esp_hal::dma::ReadBuffer;

use crate::config::Config;
use crate::pixel::PixelSource;
use crate::schedule::{Schedule, Slot};
use crate::WordSize;

bitfield! {
    /// 16-bit word representing the HUB75 signals for one clock.
    ///
    /// The bit layout is as follows:
    /// - Bit 13: Output enable (set = blanked)
    /// - Bit 12: Latch signal
    /// - Bits 11-8: Row address (A, B, C, D)
    /// - Bit 5: Blue channel for the lower half
    /// - Bit 4: Green channel for the lower half
    /// - Bit 3: Red channel for the lower half
    /// - Bit 2: Blue channel for the upper half
    /// - Bit 1: Green channel for the upper half
    /// - Bit 0: Red channel for the upper half
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct Entry(u16);
    impl Debug;
    pub blank, set_blank: 13;
    pub latch, set_latch: 12;
    pub u8, addr, set_addr: 11, 8;
    pub blu2, set_blu2: 5;
    pub grn2, set_grn2: 4;
    pub red2, set_red2: 3;
    pub blu1, set_blu1: 2;
    pub grn1, set_grn1: 1;
    pub red1, set_red1: 0;
}

#[cfg(feature = "defmt")]
impl defmt::Format for Entry {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Entry({=u16:#x})", self.0)
    }
}

impl Entry {
    /// Mask of the six color bits.
    pub const COLOR_MASK: u16 = 0b0011_1111;

    /// An all-zero word.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// The raw bus word.
    #[must_use]
    pub const fn bits(&self) -> u16 {
        self.0
    }

    /// Set the upper-half color bits.
    pub fn set_color0(&mut self, r: bool, g: bool, b: bool) {
        self.set_red1(r);
        self.set_grn1(g);
        self.set_blu1(b);
    }

    /// Set the lower-half color bits.
    pub fn set_color1(&mut self, r: bool, g: bool, b: bool) {
        self.set_red2(r);
        self.set_grn2(g);
        self.set_blu2(b);
    }

    /// Control bits for column `col` of scan line `row`.
    #[must_use]
    pub fn control<const COLS: usize>(config: &Config<COLS>, row: usize, col: usize) -> Self {
        let mut entry = Self::new();
        entry.set_addr(row_address(row));
        entry.set_blank(config.is_blanked(col));
        entry.set_latch(Config::<COLS>::is_latch(col));
        entry
    }
}

/// Address lines driven while scan line `row` is shifted in: bits 0-3 of
/// `row - 1`, so row 0 addresses 15.
#[inline]
#[must_use]
pub const fn row_address(row: usize) -> u8 {
    (row.wrapping_sub(1) & 0x0f) as u8
}

/// Bit of each 8-bit channel shown by `plane` out of `planes`.
///
/// # Panics
/// Panics unless `plane < planes <= 8`.
#[inline]
#[must_use]
pub const fn plane_mask(plane: usize, planes: usize) -> u8 {
    assert!(plane < planes && planes <= 8, "plane out of range");
    1 << (8 - planes + plane)
}

/// Whether `color` has `mask` set in its red, green and blue channels.
#[inline]
fn channel_bits(color: crate::Color, mask: u8) -> (bool, bool, bool) {
    (
        color.r() & mask != 0,
        color.g() & mask != 0,
        color.b() & mask != 0,
    )
}

/// One scan-out pass of a single bitplane.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(C)]
pub struct Plane<const COLS: usize, const NROWS: usize> {
    rows: [[Entry; COLS]; NROWS],
}

impl<const COLS: usize, const NROWS: usize> Plane<COLS, NROWS> {
    /// Word size the transport has to clock out.
    pub const WORD_SIZE: WordSize = WordSize::Sixteen;

    /// An all-zero plane.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows: [[Entry::new(); COLS]; NROWS],
        }
    }

    /// Word at scan line `row`, column `col`.
    #[must_use]
    pub fn entry(&self, row: usize, col: usize) -> Entry {
        self.rows[row][col]
    }

    /// Scan line `row`.
    #[must_use]
    pub fn row(&self, row: usize) -> &[Entry; COLS] {
        &self.rows[row]
    }

    /// All words in scan-out order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.rows.iter().flatten()
    }

    /// Encode bitplane `plane` of `planes` from `source`.
    ///
    /// Scan line `y` takes its upper half from image row `y` and its lower
    /// half from image row `y + NROWS`.
    pub fn encode<S: PixelSource + ?Sized>(
        &mut self,
        plane: usize,
        planes: usize,
        config: &Config<COLS>,
        source: &S,
    ) {
        let mask = plane_mask(plane, planes);
        for (y, row) in self.rows.iter_mut().enumerate() {
            for (col, word) in row.iter_mut().enumerate() {
                let x = config.source_column(col);
                let mut entry = Entry::control(config, y, col);
                let (top, bottom) = source.pixel_pair(x, y, y + NROWS);
                let (r, g, b) = channel_bits(top, mask);
                entry.set_color0(r, g, b);
                let (r, g, b) = channel_bits(bottom, mask);
                entry.set_color1(r, g, b);
                *word = entry;
            }
        }
    }
}

impl<const COLS: usize, const NROWS: usize> Default for Plane<COLS, NROWS> {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl<const COLS: usize, const NROWS: usize> ReadBuffer for Plane<COLS, NROWS> {
    #[cfg(not(feature = "esp-dma"))]
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const u8, usize) {
        let ptr = &self.rows as *const _ as *const u8;
        let len = core::mem::size_of_val(&self.rows);
        (ptr, len)
    }
}

unsafe impl<const COLS: usize, const NROWS: usize> ReadBuffer for &Plane<COLS, NROWS> {
    #[cfg(not(feature = "esp-dma"))]
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const u8, usize) {
        let ptr = &self.rows as *const _ as *const u8;
        let len = core::mem::size_of_val(&self.rows);
        (ptr, len)
    }
}

/// One complete set of `PLANES` bitplanes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(C)]
pub struct Backbuffer<const COLS: usize, const NROWS: usize, const PLANES: usize> {
    planes: [Plane<COLS, NROWS>; PLANES],
}

impl<const COLS: usize, const NROWS: usize, const PLANES: usize> Backbuffer<COLS, NROWS, PLANES> {
    /// All planes zeroed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            planes: [Plane::new(); PLANES],
        }
    }

    /// Bitplane `plane`.
    #[must_use]
    pub fn plane(&self, plane: usize) -> &Plane<COLS, NROWS> {
        &self.planes[plane]
    }

    /// Encode every bitplane from `source`.
    pub fn encode<S: PixelSource + ?Sized>(&mut self, config: &Config<COLS>, source: &S) {
        for (index, plane) in self.planes.iter_mut().enumerate() {
            plane.encode(index, PLANES, config, source);
        }
    }

    /// The planes in the order given by `schedule`.
    #[must_use]
    pub fn chain<'a, const CHAIN_LEN: usize>(
        &'a self,
        schedule: &'a Schedule<PLANES, CHAIN_LEN>,
    ) -> Chain<'a, COLS, NROWS, PLANES> {
        Chain {
            buffer: self,
            slots: schedule.slots().iter(),
        }
    }
}

impl<const COLS: usize, const NROWS: usize, const PLANES: usize> Default
    for Backbuffer<COLS, NROWS, PLANES>
{
    fn default() -> Self {
        Self::new()
    }
}

/// Which of the two back buffers of a [`PlaneArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferIndex {
    /// Buffer 0
    First,
    /// Buffer 1
    Second,
}

impl BufferIndex {
    /// The other buffer.
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    /// Numeric index, as used by transports that keep two descriptor chains.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BufferIndex {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "buffer {}", self.index());
    }
}

/// Both back buffers, addressed by ([`BufferIndex`], plane).
#[derive(Clone, Copy)]
#[repr(C)]
#[repr(align(4))]
pub struct PlaneArena<const COLS: usize, const NROWS: usize, const PLANES: usize> {
    buffers: [Backbuffer<COLS, NROWS, PLANES>; 2],
}

impl<const COLS: usize, const NROWS: usize, const PLANES: usize> PlaneArena<COLS, NROWS, PLANES> {
    /// Create a zeroed arena.
    /// # Example
    /// ```rust
    /// use hub75_bitplane::compute_rows;
    /// use hub75_bitplane::plane::PlaneArena;
    ///
    /// const COLS: usize = 64;
    /// const NROWS: usize = compute_rows(32);
    /// const PLANES: usize = 4;
    ///
    /// static mut ARENA: PlaneArena<COLS, NROWS, PLANES> = PlaneArena::new();
    /// assert_eq!(PlaneArena::<COLS, NROWS, PLANES>::size_bytes(), 2 * 4 * 16 * 64 * 2);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffers: [Backbuffer::new(); 2],
        }
    }

    /// Size of the arena in bytes.
    #[must_use]
    pub const fn size_bytes() -> usize {
        core::mem::size_of::<[Backbuffer<COLS, NROWS, PLANES>; 2]>()
    }

    /// Back buffer `index`.
    #[must_use]
    pub fn buffer(&self, index: BufferIndex) -> &Backbuffer<COLS, NROWS, PLANES> {
        &self.buffers[index.index()]
    }

    /// Back buffer `index`, for filling.
    pub fn buffer_mut(&mut self, index: BufferIndex) -> &mut Backbuffer<COLS, NROWS, PLANES> {
        &mut self.buffers[index.index()]
    }

    /// Bitplane `plane` of back buffer `index`.
    #[must_use]
    pub fn plane(&self, index: BufferIndex, plane: usize) -> &Plane<COLS, NROWS> {
        self.buffer(index).plane(plane)
    }
}

impl<const COLS: usize, const NROWS: usize, const PLANES: usize> Default
    for PlaneArena<COLS, NROWS, PLANES>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const COLS: usize, const NROWS: usize, const PLANES: usize> core::fmt::Debug
    for PlaneArena<COLS, NROWS, PLANES>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PlaneArena")
            .field("size", &Self::size_bytes())
            .field("planes", &PLANES)
            .field("plane_size", &core::mem::size_of::<Plane<COLS, NROWS>>())
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl<const COLS: usize, const NROWS: usize, const PLANES: usize> defmt::Format
    for PlaneArena<COLS, NROWS, PLANES>
{
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "PlaneArena<{}, {}, {}>", COLS, NROWS, PLANES);
        defmt::write!(f, " size: {}", Self::size_bytes());
        defmt::write!(
            f,
            " plane_size: {}",
            core::mem::size_of::<Plane<COLS, NROWS>>()
        );
    }
}

/// The planes of one back buffer in schedule order.
///
/// Yields one plane segment per schedule slot and ends at the end-of-chain
/// marker.
#[derive(Clone, Debug)]
pub struct Chain<'a, const COLS: usize, const NROWS: usize, const PLANES: usize> {
    buffer: &'a Backbuffer<COLS, NROWS, PLANES>,
    slots: core::slice::Iter<'a, Slot>,
}

impl<'a, const COLS: usize, const NROWS: usize, const PLANES: usize> Iterator
    for Chain<'a, COLS, NROWS, PLANES>
{
    type Item = &'a Plane<COLS, NROWS>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.slots.next()? {
            Slot::Plane(plane) => Some(self.buffer.plane(*plane as usize)),
            Slot::End => None,
        }
    }
}
