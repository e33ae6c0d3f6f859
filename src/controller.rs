//! PCH thermal device controller.
//!
//! [`PchThermal`] holds the driver's single device claim.  The bus
//! framework owns it and calls the lifecycle entry points in order:
//!
//! ```text
//!   probe ──▶ startup ──▶ ... ──▶ shutdown ──▶ release
//!     │          │ (failure)          ▲
//!     │          └──── teardown ──────┘
//!     └─ Claim token: produced only by probe, consumed only by release
//! ```
//!
//! ## Resource order
//!
//! Startup acquires: address space, BAR 0, legacy IRQ mode, IRQ handler,
//! register mapping, MMIO decode, then configures the sensor.  Any failure
//! runs [`teardown`](PchThermal::teardown) before the error is returned,
//! so a failed startup leaves nothing mapped.
//!
//! Teardown always goes IRQ disable → sensor disable → unmap → clear.
//! It never touches the claim; only `release` does.
//!
//! ## Interrupts
//!
//! [`irq_handler`] touches no controller state, which is the only reason
//! it may run concurrently with teardown.  A handler that reads the
//! registers would need explicit exclusion against the unmap.

use core::sync::atomic::{AtomicU32, Ordering};

use log::{debug, error, info, warn};

use crate::bus::{DeviceId, IrqMode, IrqReturn, MmuFlags, PciDevicePort, VmmPort};
use crate::config::ThermalConfig;
use crate::error::{Result, StartupError};
use crate::registers::{BLOCK_LEN, ThermalRegisters};
use crate::registration::{PCH_THERMAL_DRIVER, PciDriver, PciDriverEntry};

/// Name given to the register mapping.
pub const MAPPING_NAME: &str = "pch_therm";

/// Interrupt line used in legacy mode.
pub const IRQ_LINE: u32 = 0;

/// Smallest BAR 0 that still covers the whole register block.
pub const MIN_BAR_SIZE: u64 = BLOCK_LEN as u64;

/// Source of controller instance tags.
static NEXT_INSTANCE: AtomicU32 = AtomicU32::new(0);

/// Proof that [`PchThermal::probe`] granted this driver a device.
///
/// Not `Clone`: there is at most one, and [`PchThermal::release`]
/// consumes it.  Only the controller that issued it accepts it back.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a claim without release leaves the driver claimed"]
pub struct Claim {
    device: DeviceId,
    owner: u32,
}

impl Claim {
    /// Identity of the claimed device.
    pub fn device(&self) -> DeviceId {
        self.device
    }
}

/// The driver's device-claim state.
pub struct PchThermal<V: VmmPort> {
    /// Tag stamped into every claim this controller issues.
    instance: u32,
    config: ThermalConfig,
    vmm: V,
    /// Set by probe, cleared by release.
    claimed: bool,
    /// Address space of the register mapping.
    aspace: Option<V::Aspace>,
    /// Present only while the block is mapped and configured.
    regs: Option<ThermalRegisters<V::Window>>,
}

impl<V: VmmPort> PchThermal<V> {
    /// Create an unclaimed, unmapped controller.
    pub fn new(vmm: V, config: ThermalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            config,
            vmm,
            claimed: false,
            aspace: None,
            regs: None,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Claim `device` if it is a supported PCH thermal function and no
    /// other device is claimed.
    pub fn probe(&mut self, device: DeviceId) -> Option<Claim> {
        if self.claimed {
            debug!(
                "pch_thermal: already bound, ignoring {:04x}:{:04x}",
                device.vendor_id, device.device_id
            );
            return None;
        }

        if !PCH_THERMAL_DRIVER.matches(device) {
            return None;
        }

        self.claimed = true;
        info!(
            "pch_thermal: claimed {:04x}:{:04x}",
            device.vendor_id, device.device_id
        );
        Some(Claim {
            device,
            owner: self.instance,
        })
    }

    /// Map and configure the claimed device.
    ///
    /// On error every resource acquired so far has been released again.
    ///
    /// # Panics
    ///
    /// If the controller is already mapped, not claimed, or `claim` was
    /// issued by another controller or for a different device.
    pub fn startup<D: PciDevicePort>(
        &mut self,
        claim: &Claim,
        device: &mut D,
    ) -> core::result::Result<(), StartupError> {
        assert!(self.regs.is_none(), "pch_thermal: startup while mapped");
        assert!(self.claimed, "pch_thermal: startup without a claim");
        self.check_owner(claim);
        assert_eq!(
            claim.device,
            device.id(),
            "pch_thermal: startup on a device this driver is not bound to"
        );

        match self.bring_up(device) {
            Ok(()) => {
                info!(
                    "pch_thermal: started, CTT={}C",
                    self.regs.as_ref().map_or(0, ThermalRegisters::ctt_degrees)
                );
                Ok(())
            }
            Err(e) => {
                error!("pch_thermal: startup failed: {e}");
                self.teardown(Some(device));
                Err(e)
            }
        }
    }

    /// Quiesce and unmap the device.  Safe to call on a torn-down controller.
    ///
    /// # Panics
    ///
    /// If `claim` was issued by another controller or for a different
    /// device.
    pub fn shutdown<D: PciDevicePort>(&mut self, claim: &Claim, device: &mut D) {
        self.check_owner(claim);
        assert_eq!(
            claim.device,
            device.id(),
            "pch_thermal: shutdown on a device this driver is not bound to"
        );
        self.teardown(Some(device));
        info!("pch_thermal: shut down");
    }

    /// Drop the claim so a later probe can succeed.
    ///
    /// # Panics
    ///
    /// If the register block is still mapped (shutdown has not run), or
    /// `claim` was issued by another controller.
    pub fn release(&mut self, claim: Claim) {
        self.check_owner(&claim);
        assert!(self.regs.is_none(), "pch_thermal: release while mapped");
        self.claimed = false;
        info!(
            "pch_thermal: released {:04x}:{:04x}",
            claim.device.vendor_id, claim.device.device_id
        );
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    pub fn is_mapped(&self) -> bool {
        self.regs.is_some()
    }

    pub fn aspace(&self) -> Option<V::Aspace> {
        self.aspace
    }

    /// Read access to the mapped registers.
    pub fn registers(&self) -> Option<&ThermalRegisters<V::Window>> {
        self.regs.as_ref()
    }

    pub fn config(&self) -> &ThermalConfig {
        &self.config
    }

    pub fn vmm(&self) -> &V {
        &self.vmm
    }

    pub fn vmm_mut(&mut self) -> &mut V {
        &mut self.vmm
    }

    // ── Internal ──────────────────────────────────────────────

    fn check_owner(&self, claim: &Claim) {
        assert_eq!(
            claim.owner, self.instance,
            "pch_thermal: claim issued by another controller"
        );
    }

    fn bring_up<D: PciDevicePort>(&mut self, device: &mut D) -> core::result::Result<(), StartupError> {
        let aspace = self.vmm.kernel_aspace();
        self.aspace = Some(aspace);

        let bar = match device.bar_info(0) {
            Some(bar) if bar.size >= MIN_BAR_SIZE && bar.bus_addr != 0 => bar,
            _ => return Err(StartupError::InvalidResource),
        };

        device
            .set_irq_mode(IrqMode::Legacy, 1)
            .map_err(StartupError::IrqConfig)?;

        device
            .register_irq_handler(IRQ_LINE, irq_handler)
            .map_err(StartupError::IrqRegister)?;

        let size = bar
            .size
            .checked_next_multiple_of(self.config.page_size)
            .ok_or(StartupError::AddressRange)?;
        if bar.bus_addr > self.config.max_phys_addr() {
            return Err(StartupError::AddressRange);
        }
        let size = usize::try_from(size).map_err(|_| StartupError::AddressRange)?;

        let flags = MmuFlags::UNCACHED_DEVICE | MmuFlags::PERM_READ | MmuFlags::PERM_WRITE;
        let window = self
            .vmm
            .map_physical(aspace, MAPPING_NAME, bar.bus_addr, size, flags)
            .map_err(StartupError::Mapping)?;

        if let Err(rc) = device.enable_mmio(true) {
            // Not yet owned by `regs`, so teardown would not see it.
            self.vmm.unmap(aspace, window);
            return Err(StartupError::MmioEnable(rc));
        }

        let regs = self.regs.insert(ThermalRegisters::new(window));

        if !regs.sensor_enabled() && regs.sensor_policy_locked() {
            warn!("pch_thermal: TSEL policy-locked, sensor enable may be ignored");
        }
        regs.set_sensor_enabled(true);

        let current = regs.ctt_degrees();
        if current >= self.config.ctt_ceiling_c {
            info!(
                "pch_thermal: lowering CTT {}C -> {}C",
                current, self.config.ctt_ceiling_c
            );
            regs.set_ctt_degrees(self.config.ctt_ceiling_c);
        }

        regs.enable_trip_poweroff();

        device
            .unmask_irq(IRQ_LINE)
            .map_err(StartupError::IrqUnmask)?;

        Ok(())
    }

    /// Release everything startup acquired.  A no-op on the mapping when
    /// nothing is mapped.
    fn teardown<D: PciDevicePort>(&mut self, device: Option<&mut D>) {
        if let Some(device) = device {
            device.disable_irqs();
        }

        if let Some(mut regs) = self.regs.take() {
            regs.set_sensor_enabled(false);
            match self.aspace {
                Some(aspace) => self.vmm.unmap(aspace, regs.into_window()),
                None => error!("pch_thermal: mapped registers without an address space"),
            }
        }

        self.aspace = None;
    }
}

impl<V: VmmPort, D: PciDevicePort> PciDriver<D> for PchThermal<V> {
    type Claim = Claim;

    fn entry(&self) -> &'static PciDriverEntry {
        &PCH_THERMAL_DRIVER
    }

    fn probe(&mut self, device: DeviceId) -> Option<Claim> {
        PchThermal::probe(self, device)
    }

    fn startup(&mut self, claim: &Claim, device: &mut D) -> core::result::Result<(), StartupError> {
        PchThermal::startup(self, claim, device)
    }

    fn shutdown(&mut self, claim: &Claim, device: &mut D) {
        PchThermal::shutdown(self, claim, device);
    }

    fn release(&mut self, claim: Claim) {
        PchThermal::release(self, claim);
    }
}

/// Legacy IRQ handler.  Sensor interrupts are not acted on yet.
pub fn irq_handler(device: &DeviceId, irq_id: u32) -> IrqReturn {
    debug!(
        "pch_thermal: thermal interrupt ({:04x}:{:04x} irq {})",
        device.vendor_id, device.device_id, irq_id
    );
    IrqReturn::NoAction
}
