//! Port traits: the boundary between the driver and the kernel services it uses.
//!
//! ```text
//!   PCI bus framework ──▶ PciDevicePort ──▶ PchThermal
//!   VM subsystem      ──▶ VmmPort       ──▶ PchThermal
//! ```
//!
//! The bus framework hands the controller a device handle implementing
//! [`PciDevicePort`]; the virtual-memory subsystem is reached through
//! [`VmmPort`].  Neither is ever called outside the lifecycle entry points.
//!
//! All fallible framework calls report failure as a raw `i32` status code,
//! which the controller wraps into the matching
//! [`StartupError`](crate::error::StartupError) variant.

use core::ops::BitOr;

use crate::registers::MmioWindow;

// ───────────────────────────────────────────────────────────────
// Device identity and resources
// ───────────────────────────────────────────────────────────────

/// Vendor / device id pair read from configuration space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    pub vendor_id: u16,
    pub device_id: u16,
}

impl DeviceId {
    pub const fn new(vendor_id: u16, device_id: u16) -> Self {
        Self {
            vendor_id,
            device_id,
        }
    }
}

/// A memory BAR as reported by the bus framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarInfo {
    /// Bus address of the region.
    pub bus_addr: u64,
    /// Region size in bytes, as reported by firmware.
    pub size: u64,
}

/// Interrupt delivery mode requested from the bus framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqMode {
    Disabled,
    /// Single shared INTx line.
    Legacy,
}

/// What an interrupt handler did with the interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqReturn {
    NoAction,
}

/// Interrupt callback.  Carries no captured state; the device identity and
/// line index are all it is given.
pub type IrqHandler = fn(device: &DeviceId, irq_id: u32) -> IrqReturn;

// ───────────────────────────────────────────────────────────────
// Mapping flags
// ───────────────────────────────────────────────────────────────

/// Architecture MMU flags for a physical mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmuFlags(u32);

impl MmuFlags {
    pub const UNCACHED_DEVICE: Self = Self(1 << 0);
    pub const PERM_READ: Self = Self(1 << 1);
    pub const PERM_WRITE: Self = Self(1 << 2);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MmuFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ───────────────────────────────────────────────────────────────
// PCI device port (bus framework → driver)
// ───────────────────────────────────────────────────────────────

/// A bus-enumerated PCI function as exposed by the bus framework.
pub trait PciDevicePort {
    /// Identity read from configuration space.
    fn id(&self) -> DeviceId;

    /// Memory BAR `index`, or `None` if the BAR is absent or not memory.
    fn bar_info(&self, index: usize) -> Option<BarInfo>;

    /// Select an interrupt delivery mode with `requested_irqs` vectors.
    fn set_irq_mode(&mut self, mode: IrqMode, requested_irqs: u32) -> Result<(), i32>;

    /// Bind `handler` to interrupt `irq_id`.
    fn register_irq_handler(&mut self, irq_id: u32, handler: IrqHandler) -> Result<(), i32>;

    /// Allow delivery on interrupt `irq_id`.
    fn unmask_irq(&mut self, irq_id: u32) -> Result<(), i32>;

    /// Turn interrupt delivery off entirely.  Also drops registered handlers.
    fn disable_irqs(&mut self);

    /// Toggle memory-space decoding in the command register.
    fn enable_mmio(&mut self, enabled: bool) -> Result<(), i32>;
}

// ───────────────────────────────────────────────────────────────
// VMM port (driver ↔ virtual-memory subsystem)
// ───────────────────────────────────────────────────────────────

/// Physical-to-virtual mapping service.
pub trait VmmPort {
    /// Handle naming an address space.
    type Aspace: Copy + core::fmt::Debug;

    /// The addressable view produced by a successful mapping.
    type Window: MmioWindow;

    /// The kernel's own address space.
    fn kernel_aspace(&mut self) -> Self::Aspace;

    /// Map `size` bytes at physical `paddr` into `aspace`.
    ///
    /// `size` is already page-rounded and `paddr` within the platform
    /// physical address width.
    fn map_physical(
        &mut self,
        aspace: Self::Aspace,
        name: &'static str,
        paddr: u64,
        size: usize,
        flags: MmuFlags,
    ) -> Result<Self::Window, i32>;

    /// Release a mapping previously returned by [`map_physical`](Self::map_physical).
    fn unmap(&mut self, aspace: Self::Aspace, window: Self::Window);
}
