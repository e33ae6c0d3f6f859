//! Driver registration surface.
//!
//! A driver is described to the bus framework by a static
//! [`PciDriverEntry`] (name plus identity filter) and by its lifecycle
//! entry points, expressed as the [`PciDriver`] trait.  The framework keeps
//! entries in a fixed-capacity [`DriverRegistry`] installed at boot and
//! drives bound devices through [`bind`] and [`unbind`].

use heapless::Vec;
use log::{debug, info};

use crate::bus::{DeviceId, PciDevicePort};
use crate::error::{RegistryError, StartupError};

/// Intel's PCI vendor id.
pub const INTEL_VID: u16 = 0x8086;

/// Supported PCH thermal functions: ICH10, Wildcat Point-LP.
pub const PCH_THERMAL_DIDS: &[u16] = &[0x3a32, 0x9ca4];

/// Registry entry for this driver.
pub static PCH_THERMAL_DRIVER: PciDriverEntry = PciDriverEntry {
    name: "Intel PCH Thermal Sensors",
    vendor_id: INTEL_VID,
    device_ids: PCH_THERMAL_DIDS,
};

/// Capacity of the boot-time driver registry.
pub const MAX_DRIVERS: usize = 16;

// ───────────────────────────────────────────────────────────────
// Driver description
// ───────────────────────────────────────────────────────────────

/// Static identity of a PCI driver.
#[derive(Debug)]
pub struct PciDriverEntry {
    /// Human-readable driver name.
    pub name: &'static str,
    pub vendor_id: u16,
    /// Device ids accepted under `vendor_id`.
    pub device_ids: &'static [u16],
}

impl PciDriverEntry {
    /// True if `device` passes this entry's identity filter.
    pub fn matches(&self, device: DeviceId) -> bool {
        device.vendor_id == self.vendor_id && self.device_ids.contains(&device.device_id)
    }
}

/// Lifecycle entry points the bus framework invokes.
pub trait PciDriver<D: PciDevicePort> {
    /// Token proving a successful probe.
    type Claim;

    fn entry(&self) -> &'static PciDriverEntry;

    /// Claim `device`, or `None` if it is not ours.
    fn probe(&mut self, device: DeviceId) -> Option<Self::Claim>;

    /// Bring the claimed device up.  Must leave nothing acquired on error.
    fn startup(&mut self, claim: &Self::Claim, device: &mut D) -> Result<(), StartupError>;

    /// Quiesce and release hardware resources.
    fn shutdown(&mut self, claim: &Self::Claim, device: &mut D);

    /// Give up the claim after shutdown.
    fn release(&mut self, claim: Self::Claim);
}

// ───────────────────────────────────────────────────────────────
// Framework side
// ───────────────────────────────────────────────────────────────

/// Result of offering a device to a driver.
#[derive(Debug)]
pub enum BindOutcome<C> {
    /// The driver declined the device.
    NotMatched,
    /// Probe and startup both succeeded.
    Started(C),
    /// Probe succeeded but startup failed; the claim is still held.
    StartFailed(C, StartupError),
}

/// Offer `device` to `driver`: probe, then start on a successful claim.
pub fn bind<D, Drv>(driver: &mut Drv, device: &mut D) -> BindOutcome<Drv::Claim>
where
    D: PciDevicePort,
    Drv: PciDriver<D>,
{
    let Some(claim) = driver.probe(device.id()) else {
        return BindOutcome::NotMatched;
    };

    match driver.startup(&claim, device) {
        Ok(()) => BindOutcome::Started(claim),
        Err(e) => {
            debug!("{}: holding claim after failed startup", driver.entry().name);
            BindOutcome::StartFailed(claim, e)
        }
    }
}

/// Detach a bound device: shutdown, then release.
pub fn unbind<D, Drv>(driver: &mut Drv, claim: Drv::Claim, device: &mut D)
where
    D: PciDevicePort,
    Drv: PciDriver<D>,
{
    driver.shutdown(&claim, device);
    driver.release(claim);
}

/// Boot-time table of installed drivers.
#[derive(Debug, Default)]
pub struct DriverRegistry {
    entries: Vec<&'static PciDriverEntry, MAX_DRIVERS>,
}

impl DriverRegistry {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Install a driver entry.  Names must be unique.
    pub fn register(&mut self, entry: &'static PciDriverEntry) -> crate::Result<()> {
        if self.entries.iter().any(|e| e.name == entry.name) {
            return Err(RegistryError::Duplicate(entry.name).into());
        }
        self.entries.push(entry).map_err(|_| RegistryError::Full)?;
        info!("registry: installed \"{}\"", entry.name);
        Ok(())
    }

    /// First installed entry whose filter accepts `device`.
    pub fn find(&self, device: DeviceId) -> Option<&'static PciDriverEntry> {
        self.entries.iter().copied().find(|e| e.matches(device))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
