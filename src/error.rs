//! Error types for the PCH thermal driver.
//!
//! Recoverable failures all originate in `startup`; each one is reported
//! after the controller has already torn down whatever it had acquired.
//! Broken caller contracts (mismatched claim, startup on a mapped
//! controller, release before shutdown) are not represented here: they
//! panic, because the hardware-mapping state can no longer be trusted.
//!
//! All variants are `Copy` so they can be handed back through the bus
//! framework's status path without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level driver error
// ---------------------------------------------------------------------------

/// Every fallible driver operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Device bring-up failed and was unwound.
    Startup(StartupError),
    /// Configuration was rejected.
    Config(ConfigError),
    /// The driver registry refused an entry.
    Registry(RegistryError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup(e) => write!(f, "startup: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Startup errors
// ---------------------------------------------------------------------------

/// A step of device bring-up was rejected.
///
/// Variants carrying an `i32` hold the status code returned by the bus or
/// memory-mapping framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupError {
    /// BAR 0 is missing or zero-sized.
    InvalidResource,
    /// Legacy IRQ mode could not be selected.
    IrqConfig(i32),
    /// The IRQ handler could not be registered.
    IrqRegister(i32),
    /// BAR address or page-rounded size does not fit the platform.
    AddressRange,
    /// The register window could not be mapped.
    Mapping(i32),
    /// MMIO decode could not be enabled on the device.
    MmioEnable(i32),
    /// IRQ line 0 could not be unmasked.
    IrqUnmask(i32),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidResource => write!(f, "BAR 0 missing or empty"),
            Self::IrqConfig(rc) => write!(f, "legacy IRQ mode rejected (rc={})", rc),
            Self::IrqRegister(rc) => write!(f, "IRQ handler registration failed (rc={})", rc),
            Self::AddressRange => write!(f, "register window outside platform address range"),
            Self::Mapping(rc) => write!(f, "register mapping failed (rc={})", rc),
            Self::MmioEnable(rc) => write!(f, "MMIO enable failed (rc={})", rc),
            Self::IrqUnmask(rc) => write!(f, "IRQ unmask failed (rc={})", rc),
        }
    }
}

impl From<StartupError> for Error {
    fn from(e: StartupError) -> Self {
        Self::Startup(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// A [`ThermalConfig`](crate::config::ThermalConfig) field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The `&'static str` names the field and the violated bound.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// No free slot left in the registry.
    Full,
    /// An entry with the same name is already installed.
    Duplicate(&'static str),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "driver registry full"),
            Self::Duplicate(name) => write!(f, "driver \"{}\" already registered", name),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Driver-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
