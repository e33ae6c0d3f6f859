//! PCH thermal register block (BAR 0).
//!
//! ```text
//!   0x00  TEMP  u16   current temperature (9-bit packed)
//!   0x04  TSC   u8    bit0 CPDE  catastrophic power-down enable
//!                     bit7 PLD   policy lock
//!   0x06  TSS   u8    status
//!   0x08  TSEL  u8    bit0 ETS   enable thermal sensor
//!                     bit7 PLDB  policy lock
//!   0x10  CTT   u16   catastrophic trip threshold (9-bit packed)
//! ```
//!
//! [`ThermalRegisters`] is the only way the driver touches this block.  It
//! can only be built from a window returned by a successful mapping, and
//! only handed back through the unmap path.

use core::ptr::NonNull;

use crate::codec;

pub const TEMP_OFFSET: usize = 0x00;
pub const TSC_OFFSET: usize = 0x04;
pub const TSS_OFFSET: usize = 0x06;
pub const TSEL_OFFSET: usize = 0x08;
pub const CTT_OFFSET: usize = 0x10;

/// TSEL: enable thermal sensor.
pub const TSEL_ETS: u8 = 1 << 0;
/// TSEL: policy lock-down.
pub const TSEL_PLDB: u8 = 1 << 7;
/// TSC: power off on catastrophic trip.
pub const TSC_CPDE: u8 = 1 << 0;
/// TSC: policy lock.
pub const TSC_PLD: u8 = 1 << 7;

/// Smallest window that covers every register this driver touches.
pub const BLOCK_LEN: usize = CTT_OFFSET + 2;

// ───────────────────────────────────────────────────────────────
// Raw MMIO access
// ───────────────────────────────────────────────────────────────

/// Byte-addressed access to a mapped register window.
pub trait MmioWindow {
    fn read8(&self, offset: usize) -> u8;
    fn write8(&mut self, offset: usize, value: u8);
    fn read16(&self, offset: usize) -> u16;
    fn write16(&mut self, offset: usize, value: u16);
}

/// A real uncached device mapping accessed with volatile loads and stores.
#[derive(Debug)]
pub struct MmioRegion {
    base: NonNull<u8>,
    len: usize,
}

impl MmioRegion {
    /// Wrap a mapped device window.
    ///
    /// # Safety
    ///
    /// `base` must point at `len` bytes of device memory mapped uncached and
    /// read/write, aligned to at least 2 bytes, and must stay mapped for the
    /// lifetime of the returned value.  No other code may access the window
    /// while this value exists.
    pub unsafe fn new(base: NonNull<u8>, len: usize) -> Self {
        Self { base, len }
    }

    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check(&self, offset: usize, width: usize) {
        assert!(
            offset % width == 0 && offset + width <= self.len,
            "MMIO access at {offset:#x} (width {width}) outside window of {:#x}",
            self.len
        );
    }
}

impl MmioWindow for MmioRegion {
    fn read8(&self, offset: usize) -> u8 {
        self.check(offset, 1);
        // SAFETY: bounds checked above; validity of the mapping is the
        // contract of `MmioRegion::new`.
        unsafe { self.base.as_ptr().add(offset).read_volatile() }
    }

    fn write8(&mut self, offset: usize, value: u8) {
        self.check(offset, 1);
        // SAFETY: as in `read8`.
        unsafe { self.base.as_ptr().add(offset).write_volatile(value) }
    }

    fn read16(&self, offset: usize) -> u16 {
        self.check(offset, 2);
        // SAFETY: bounds and alignment checked above; base is 2-byte aligned.
        unsafe { self.base.as_ptr().add(offset).cast::<u16>().read_volatile() }
    }

    fn write16(&mut self, offset: usize, value: u16) {
        self.check(offset, 2);
        // SAFETY: as in `read16`.
        unsafe {
            self.base
                .as_ptr()
                .add(offset)
                .cast::<u16>()
                .write_volatile(value);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Register capability
// ───────────────────────────────────────────────────────────────

/// Exclusive handle on a mapped thermal register block.
///
/// Reads are public; writes are limited to the crate so that only the
/// controller's bring-up and teardown sequences can change hardware state.
#[derive(Debug)]
pub struct ThermalRegisters<W: MmioWindow> {
    window: W,
}

impl<W: MmioWindow> ThermalRegisters<W> {
    pub(crate) fn new(window: W) -> Self {
        Self { window }
    }

    /// Give the window back for unmapping.
    pub(crate) fn into_window(self) -> W {
        self.window
    }

    // ── Reads ────────────────────────────────────────────────

    pub fn tsel(&self) -> u8 {
        self.window.read8(TSEL_OFFSET)
    }

    pub fn tsc(&self) -> u8 {
        self.window.read8(TSC_OFFSET)
    }

    pub fn sensor_enabled(&self) -> bool {
        self.tsel() & TSEL_ETS != 0
    }

    /// TSEL policy lock.  A locked block ignores enable writes.
    pub fn sensor_policy_locked(&self) -> bool {
        self.tsel() & TSEL_PLDB != 0
    }

    pub fn trip_poweroff_enabled(&self) -> bool {
        self.tsc() & TSC_CPDE != 0
    }

    /// Raw 9-bit catastrophic trip threshold.
    pub fn ctt_raw(&self) -> u16 {
        self.window.read16(CTT_OFFSET) & codec::RAW_MASK
    }

    /// Catastrophic trip threshold in whole degrees.
    pub fn ctt_degrees(&self) -> i16 {
        codec::decode(self.ctt_raw())
    }

    // ── Writes ───────────────────────────────────────────────

    /// Read-modify-write of TSEL bit 0; other bits are preserved.
    pub(crate) fn set_sensor_enabled(&mut self, enabled: bool) {
        let tsel = self.tsel();
        let tsel = if enabled {
            tsel | TSEL_ETS
        } else {
            tsel & !TSEL_ETS
        };
        self.window.write8(TSEL_OFFSET, tsel);
    }

    /// Overwrite CTT with the encoding of `degrees`.
    pub(crate) fn set_ctt_degrees(&mut self, degrees: i16) {
        self.window.write16(CTT_OFFSET, codec::encode(degrees));
    }

    /// Read-modify-write of TSC bit 0; other bits are preserved.
    pub(crate) fn enable_trip_poweroff(&mut self) {
        let tsc = self.tsc();
        self.window.write8(TSC_OFFSET, tsc | TSC_CPDE);
    }
}
