//! Mock bus framework and VM subsystem for integration tests.
//!
//! Every framework call and every register write lands in one shared
//! journal, so tests can assert on the exact ordering of bring-up and
//! teardown without touching real configuration space or page tables.

use std::cell::RefCell;
use std::rc::Rc;

use pch_thermal::registers::{CTT_OFFSET, TSC_OFFSET, TSEL_OFFSET};
use pch_thermal::{
    BarInfo, DeviceId, IrqHandler, IrqMode, IrqReturn, MmioWindow, MmuFlags, PciDevicePort,
    VmmPort, codec,
};

// ── Call record ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusCall {
    SetIrqMode { mode: IrqMode, irqs: u32 },
    RegisterIrq { irq: u32 },
    UnmaskIrq { irq: u32 },
    DisableIrqs,
    EnableMmio { enabled: bool },
    KernelAspace,
    Map { paddr: u64, size: usize, flags: MmuFlags },
    Unmap,
    Write8 { offset: usize, value: u8 },
    Write16 { offset: usize, value: u16 },
}

pub type Journal = Rc<RefCell<Vec<BusCall>>>;

/// Little-endian register file shared by the VMM and every window it hands out.
pub type RegFile = Rc<RefCell<[u8; 0x20]>>;

/// Framework call to reject, with the status code to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    IrqMode(i32),
    RegisterIrq(i32),
    Map(i32),
    Mmio(i32),
    Unmask(i32),
}

pub const ERR_NOT_SUPPORTED: i32 = -2;
pub const ERR_NO_MEMORY: i32 = -4;
pub const BAR0_ADDR: u64 = 0xfe10_0000;

// ── MockDevice ───────────────────────────────────────────────

pub struct MockDevice {
    pub id: DeviceId,
    pub bar: Option<BarInfo>,
    pub fail: Option<Fail>,
    pub journal: Journal,
    pub irq_mode: IrqMode,
    pub handler: Option<IrqHandler>,
    pub unmasked: bool,
    pub mmio: bool,
}

#[allow(dead_code)]
impl MockDevice {
    pub fn new(id: DeviceId, journal: Journal) -> Self {
        Self {
            id,
            bar: Some(BarInfo {
                bus_addr: BAR0_ADDR,
                size: 0x100,
            }),
            fail: None,
            journal,
            irq_mode: IrqMode::Disabled,
            handler: None,
            unmasked: false,
            mmio: false,
        }
    }

    /// Deliver an interrupt the way the framework would.
    pub fn fire_irq(&self, irq: u32) -> Option<IrqReturn> {
        if self.irq_mode == IrqMode::Disabled || !self.unmasked {
            return None;
        }
        self.handler.map(|h| h(&self.id, irq))
    }

    fn record(&self, call: BusCall) {
        self.journal.borrow_mut().push(call);
    }
}

impl PciDevicePort for MockDevice {
    fn id(&self) -> DeviceId {
        self.id
    }

    fn bar_info(&self, index: usize) -> Option<BarInfo> {
        if index == 0 { self.bar } else { None }
    }

    fn set_irq_mode(&mut self, mode: IrqMode, irqs: u32) -> Result<(), i32> {
        self.record(BusCall::SetIrqMode { mode, irqs });
        if let Some(Fail::IrqMode(rc)) = self.fail {
            return Err(rc);
        }
        self.irq_mode = mode;
        Ok(())
    }

    fn register_irq_handler(&mut self, irq: u32, handler: IrqHandler) -> Result<(), i32> {
        self.record(BusCall::RegisterIrq { irq });
        if let Some(Fail::RegisterIrq(rc)) = self.fail {
            return Err(rc);
        }
        self.handler = Some(handler);
        Ok(())
    }

    fn unmask_irq(&mut self, irq: u32) -> Result<(), i32> {
        self.record(BusCall::UnmaskIrq { irq });
        if let Some(Fail::Unmask(rc)) = self.fail {
            return Err(rc);
        }
        self.unmasked = true;
        Ok(())
    }

    fn disable_irqs(&mut self) {
        self.record(BusCall::DisableIrqs);
        self.irq_mode = IrqMode::Disabled;
        self.handler = None;
        self.unmasked = false;
    }

    fn enable_mmio(&mut self, enabled: bool) -> Result<(), i32> {
        self.record(BusCall::EnableMmio { enabled });
        if let Some(Fail::Mmio(rc)) = self.fail {
            return Err(rc);
        }
        self.mmio = enabled;
        Ok(())
    }
}

// ── MockVmm ──────────────────────────────────────────────────

pub struct MockWindow {
    regs: RegFile,
    journal: Journal,
}

impl MmioWindow for MockWindow {
    fn read8(&self, offset: usize) -> u8 {
        self.regs.borrow()[offset]
    }

    fn write8(&mut self, offset: usize, value: u8) {
        self.journal.borrow_mut().push(BusCall::Write8 { offset, value });
        self.regs.borrow_mut()[offset] = value;
    }

    fn read16(&self, offset: usize) -> u16 {
        let r = self.regs.borrow();
        u16::from_le_bytes([r[offset], r[offset + 1]])
    }

    fn write16(&mut self, offset: usize, value: u16) {
        self.journal.borrow_mut().push(BusCall::Write16 { offset, value });
        self.regs.borrow_mut()[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }
}

pub struct MockVmm {
    pub regs: RegFile,
    pub journal: Journal,
    pub fail: Option<Fail>,
    /// Mappings currently outstanding.
    pub live: usize,
}

#[allow(dead_code)]
impl MockVmm {
    pub fn new(journal: Journal) -> Self {
        Self {
            regs: Rc::new(RefCell::new([0; 0x20])),
            journal,
            fail: None,
            live: 0,
        }
    }

    /// Preload the catastrophic trip threshold, in degrees.
    pub fn with_ctt(self, degrees: i16) -> Self {
        self.set_ctt_raw(codec::encode(degrees));
        self
    }

    pub fn set_ctt_raw(&self, raw: u16) {
        self.regs.borrow_mut()[CTT_OFFSET..CTT_OFFSET + 2].copy_from_slice(&raw.to_le_bytes());
    }

    pub fn tsel(&self) -> u8 {
        self.regs.borrow()[TSEL_OFFSET]
    }

    pub fn tsc(&self) -> u8 {
        self.regs.borrow()[TSC_OFFSET]
    }

    pub fn ctt_raw(&self) -> u16 {
        let r = self.regs.borrow();
        u16::from_le_bytes([r[CTT_OFFSET], r[CTT_OFFSET + 1]])
    }
}

impl VmmPort for MockVmm {
    type Aspace = u32;
    type Window = MockWindow;

    fn kernel_aspace(&mut self) -> u32 {
        self.journal.borrow_mut().push(BusCall::KernelAspace);
        0x4b
    }

    fn map_physical(
        &mut self,
        _aspace: u32,
        _name: &'static str,
        paddr: u64,
        size: usize,
        flags: MmuFlags,
    ) -> Result<MockWindow, i32> {
        self.journal
            .borrow_mut()
            .push(BusCall::Map { paddr, size, flags });
        if let Some(Fail::Map(rc)) = self.fail {
            return Err(rc);
        }
        self.live += 1;
        Ok(MockWindow {
            regs: Rc::clone(&self.regs),
            journal: Rc::clone(&self.journal),
        })
    }

    fn unmap(&mut self, _aspace: u32, _window: MockWindow) {
        self.journal.borrow_mut().push(BusCall::Unmap);
        self.live -= 1;
    }
}

// ── Fixtures ─────────────────────────────────────────────────

/// A device and VMM sharing one journal.
#[allow(dead_code)]
pub fn rig(id: DeviceId) -> (MockDevice, MockVmm, Journal) {
    let journal: Journal = Rc::new(RefCell::new(Vec::new()));
    let device = MockDevice::new(id, Rc::clone(&journal));
    let vmm = MockVmm::new(Rc::clone(&journal));
    (device, vmm, journal)
}
