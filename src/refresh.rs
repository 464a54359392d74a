//! The double-buffered refresh loop.
//!
//! The loop alternates between two phases, forever:
//!
//! - [`Phase::Filling`]: encode every bitplane of the back buffer from the
//!   pixel source.
//! - [`Phase::Presenting`]: hand the back buffer to the [`Transport`] as a
//!   [`Chain`] in schedule order and flip to it, toggle the back buffer,
//!   then sleep for the refresh interval.
//!
//! The schedule is built once in [`RefreshLoop::new`] and reused for every
//! refresh of both buffers.
//!
//! # Example
//! ```rust
//! use core::sync::atomic::{AtomicBool, Ordering};
//! use fugit::MillisDurationU32;
//! use hub75_bitplane::config::Config;
//! use hub75_bitplane::handoff::FrameHandoff;
//! use hub75_bitplane::plane::{BufferIndex, Chain, PlaneArena};
//! use hub75_bitplane::refresh::{Pacer, RefreshLoop, Transport};
//! use hub75_bitplane::{compute_chain_len, compute_image_len, compute_rows};
//!
//! const COLS: usize = 64;
//! const NROWS: usize = compute_rows(32);
//! const PLANES: usize = 4;
//! const CHAIN_LEN: usize = compute_chain_len(PLANES);
//!
//! struct Bus;
//! impl Transport<COLS, NROWS, PLANES> for Bus {
//!     fn flip(&mut self, _index: BufferIndex, chain: Chain<'_, COLS, NROWS, PLANES>) {
//!         // start the DMA transfer of every segment in `chain`
//!         assert_eq!(chain.count(), 15);
//!     }
//! }
//!
//! struct Sleep;
//! impl Pacer for Sleep {
//!     fn pause(&mut self, _interval: MillisDurationU32) {}
//! }
//!
//! static STOP: AtomicBool = AtomicBool::new(false);
//! let image = [0u8; compute_image_len(COLS, 2 * NROWS)];
//! let handoff = FrameHandoff::<COLS>::new();
//! handoff.install(&image);
//!
//! let mut arena = PlaneArena::<COLS, NROWS, PLANES>::new();
//! let mut refresh = RefreshLoop::<_, _, _, COLS, NROWS, PLANES, CHAIN_LEN>::new(
//!     Config::new(),
//!     &mut arena,
//!     &handoff,
//!     Bus,
//!     Sleep,
//! );
//! STOP.store(true, Ordering::Relaxed);
//! assert_eq!(refresh.run_until(&STOP), 1);
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use fugit::MillisDurationU32;

use crate::config::Config;
use crate::pixel::PixelSource;
use crate::plane::{BufferIndex, Chain, PlaneArena};
use crate::schedule::Schedule;

/// Sink that streams filled back buffers to the panel.
pub trait Transport<const COLS: usize, const NROWS: usize, const PLANES: usize> {
    /// Start showing back buffer `index`, whose plane segments in schedule
    /// order are `chain`.
    ///
    /// The buffer is not written again until after the next flip.
    fn flip(&mut self, index: BufferIndex, chain: Chain<'_, COLS, NROWS, PLANES>);
}

/// Paces refreshes, e.g. a task delay of the RTOS or executor.
pub trait Pacer {
    /// Sleep for `interval`.
    fn pause(&mut self, interval: MillisDurationU32);
}

/// Phase of the refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The back buffer is being encoded.
    Filling,
    /// The back buffer is handed to the transport.
    Presenting,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Phase {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Phase::Filling => defmt::write!(f, "Filling"),
            Phase::Presenting => defmt::write!(f, "Presenting"),
        }
    }
}

/// Continuously encodes the pixel source into alternating back buffers and
/// flips the transport to them.
pub struct RefreshLoop<
    'r,
    S,
    T,
    P,
    const COLS: usize,
    const NROWS: usize,
    const PLANES: usize,
    const CHAIN_LEN: usize,
> {
    config: Config<COLS>,
    schedule: Schedule<PLANES, CHAIN_LEN>,
    arena: &'r mut PlaneArena<COLS, NROWS, PLANES>,
    source: S,
    transport: T,
    pacer: P,
    back: BufferIndex,
    phase: Phase,
    refreshes: u32,
}

impl<
        'r,
        S,
        T,
        P,
        const COLS: usize,
        const NROWS: usize,
        const PLANES: usize,
        const CHAIN_LEN: usize,
    > RefreshLoop<'r, S, T, P, COLS, NROWS, PLANES, CHAIN_LEN>
where
    S: PixelSource,
    T: Transport<COLS, NROWS, PLANES>,
    P: Pacer,
{
    /// Build the schedule and set up the loop. Buffer 0 is filled first.
    ///
    /// # Panics
    /// Panics if `NROWS` exceeds the 16 scan lines four address lines can
    /// select, or if the schedule parameters are invalid (see
    /// [`Schedule::new`]).
    pub fn new(
        config: Config<COLS>,
        arena: &'r mut PlaneArena<COLS, NROWS, PLANES>,
        source: S,
        transport: T,
        pacer: P,
    ) -> Self {
        assert!((1..=16).contains(&NROWS), "NROWS must be within 1..=16");
        let schedule = Schedule::new();
        log::info!("bitplane order: {schedule}");
        log::debug!(
            "{}x{} panel, {} planes, brightness {}, refresh every {}ms",
            COLS,
            2 * NROWS,
            PLANES,
            config.brightness(),
            config.refresh_interval().ticks()
        );
        Self {
            config,
            schedule,
            arena,
            source,
            transport,
            pacer,
            back: BufferIndex::First,
            phase: Phase::Filling,
            refreshes: 0,
        }
    }

    /// Encode every plane of the back buffer.
    pub fn fill(&mut self) {
        self.source.begin_pass();
        self.arena
            .buffer_mut(self.back)
            .encode(&self.config, &self.source);
        log::trace!("filled {:?}", self.back);
    }

    /// Flip the transport to the back buffer, toggle it and pause.
    pub fn present(&mut self) {
        let chain = self.arena.buffer(self.back).chain(&self.schedule);
        self.transport.flip(self.back, chain);
        log::trace!("flipped to {:?}", self.back);
        self.back = self.back.toggle();
        self.refreshes = self.refreshes.wrapping_add(1);
        self.pacer.pause(self.config.refresh_interval());
    }

    /// Run the current phase and return the next one.
    pub fn step(&mut self) -> Phase {
        self.phase = match self.phase {
            Phase::Filling => {
                self.fill();
                Phase::Presenting
            }
            Phase::Presenting => {
                self.present();
                Phase::Filling
            }
        };
        self.phase
    }

    /// Run phases until the next buffer swap has happened.
    pub fn refresh(&mut self) {
        while self.step() != Phase::Filling {}
    }

    /// Refresh forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.refresh();
        }
    }

    /// Refresh until `stop` is set, checking it after every buffer swap.
    /// Returns the number of refreshes completed by this call.
    pub fn run_until(&mut self, stop: &AtomicBool) -> u32 {
        let mut completed = 0u32;
        loop {
            self.refresh();
            completed = completed.wrapping_add(1);
            if stop.load(Ordering::Acquire) {
                log::debug!("refresh stopped after {completed} refreshes");
                return completed;
            }
        }
    }

    /// Buffer the next fill writes to.
    #[must_use]
    pub fn back_buffer(&self) -> BufferIndex {
        self.back
    }

    /// Phase the next [`RefreshLoop::step`] runs.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Total refreshes presented.
    #[must_use]
    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }

    /// The bitplane schedule.
    #[must_use]
    pub fn schedule(&self) -> &Schedule<PLANES, CHAIN_LEN> {
        &self.schedule
    }

    /// The scan-line configuration.
    #[must_use]
    pub fn config(&self) -> &Config<COLS> {
        &self.config
    }

    /// Both back buffers.
    #[must_use]
    pub fn arena(&self) -> &PlaneArena<COLS, NROWS, PLANES> {
        self.arena
    }

    /// The pixel source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The pacer.
    #[must_use]
    pub fn pacer(&self) -> &P {
        &self.pacer
    }
}

impl<
        S,
        T,
        P,
        const COLS: usize,
        const NROWS: usize,
        const PLANES: usize,
        const CHAIN_LEN: usize,
    > core::fmt::Debug for RefreshLoop<'_, S, T, P, COLS, NROWS, PLANES, CHAIN_LEN>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RefreshLoop")
            .field("config", &self.config)
            .field("schedule", &self.schedule)
            .field("back", &self.back)
            .field("phase", &self.phase)
            .field("refreshes", &self.refreshes)
            .finish_non_exhaustive()
    }
}
