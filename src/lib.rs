//! Intel PCH thermal sensor driver.
//!
//! Claims the PCH thermal PCI function, maps its register block, enables
//! the sensor, caps the catastrophic trip threshold, arms hardware
//! power-off on a catastrophic trip, and tears all of it down again on
//! removal or failure.
//!
//! The bus framework and the VM subsystem are reached only through the
//! port traits in [`bus`], so the whole lifecycle runs on the host against
//! mock ports.

#![cfg_attr(not(test), no_std)]
#![deny(unused_must_use)]

pub mod bus;
pub mod codec;
pub mod config;
pub mod controller;
pub mod registers;
pub mod registration;

mod error;

pub use bus::{BarInfo, DeviceId, IrqHandler, IrqMode, IrqReturn, MmuFlags, PciDevicePort, VmmPort};
pub use config::ThermalConfig;
pub use controller::{Claim, PchThermal, irq_handler};
pub use error::{ConfigError, Error, RegistryError, Result, StartupError};
pub use registers::{MmioRegion, MmioWindow, ThermalRegisters};
pub use registration::{
    BindOutcome, DriverRegistry, INTEL_VID, PCH_THERMAL_DRIVER, PciDriver, PciDriverEntry, bind,
    unbind,
};
