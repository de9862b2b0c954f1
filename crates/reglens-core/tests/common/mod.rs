//! Shared test fixtures: an in-memory port and two device layouts.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

use reglens_core::decl::{DeviceDecl, FieldDecl, PeripheralDecl, RegisterDecl};
use reglens_core::device::Device;
use reglens_core::error::Result;
use reglens_core::port::MemoryPort;

/// In-memory port with read/write counters.
///
/// Tests keep the typed `Rc` handle so they can poke memory directly
/// (simulating hardware state changes) and assert on port traffic.
pub struct FakePort
{
    pub memory: HashMap<u64, u64>,
    pub reads: usize,
    pub writes: usize,
}

impl FakePort
{
    pub fn new(seed: &[(u64, u64)]) -> Rc<RefCell<Self>>
    {
        Rc::new(RefCell::new(Self {
            memory: seed.iter().copied().collect(),
            reads: 0,
            writes: 0,
        }))
    }
}

impl MemoryPort for FakePort
{
    fn read(&mut self, _width_bits: u32, address: u64) -> Result<u64>
    {
        self.reads += 1;
        self.memory
            .get(&address)
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no memory at {address:#x}")).into())
    }

    fn write(&mut self, _width_bits: u32, address: u64, value: u64) -> Result<()>
    {
        self.writes += 1;
        self.memory.insert(address, value);
        Ok(())
    }
}

fn field(bit_offset: u32, bit_width: u32) -> FieldDecl
{
    FieldDecl { bit_offset, bit_width }
}

/// The TEST1/TEST2 layout used by the accessor tests.
///
/// TESTA @ 0x1234 preloaded to 0x0010_0003:
/// - A3 occupies the two low bits (reads 3)
/// - A1 is a single cleared bit (reads 0)
/// - A2 is the single set bit at position 20 (reads 1)
pub fn sample_decl() -> DeviceDecl
{
    let testa = RegisterDecl {
        address_offset: 0,
        size_bits: 32,
        fields: [
            ("A1".to_string(), field(2, 1)),
            ("A2".to_string(), field(20, 1)),
            ("A3".to_string(), field(0, 2)),
        ]
        .into_iter()
        .collect(),
    };
    let testb = RegisterDecl {
        address_offset: 4,
        size_bits: 32,
        fields: [("B1".to_string(), field(16, 1))].into_iter().collect(),
    };
    let testc = RegisterDecl {
        address_offset: 0,
        size_bits: 32,
        fields: HashMap::new(),
    };

    DeviceDecl {
        name: "TESTDEV".to_string(),
        peripherals: [
            (
                "TEST1".to_string(),
                PeripheralDecl {
                    base_address: 0x1234,
                    registers: [("TESTA".to_string(), testa), ("TESTB".to_string(), testb)]
                        .into_iter()
                        .collect(),
                },
            ),
            (
                "TEST2".to_string(),
                PeripheralDecl {
                    base_address: 0x123c,
                    registers: [("TESTC".to_string(), testc)].into_iter().collect(),
                },
            ),
        ]
        .into_iter()
        .collect(),
    }
}

pub fn sample_device() -> (Rc<RefCell<FakePort>>, Device)
{
    let port = FakePort::new(&[(0x1234, 0x0010_0003), (0x1238, 0x0001_0000), (0x123c, 0x8000_0000)]);
    let device = Device::new(sample_decl(), port.clone()).expect("sample declaration is valid");
    (port, device)
}

/// A small clock-controller layout for the clock tests.
///
/// CLOCK @ 0x4000:
/// - OSCCTL (offset 0): EN bit 0, RDY bit 1; preloaded 0x3 (enabled, ready)
/// - MUXSEL (offset 4): SEL bits 0..4; preloaded 1
/// - DIVCFG (offset 8): DIV0 bits 0..4, DIV1 bits 4..8; preloaded 0x24
/// - PLLCFG (offset 12): MULT bits 0..8; preloaded 8
pub fn clock_device() -> (Rc<RefCell<FakePort>>, Device)
{
    let oscctl = RegisterDecl {
        address_offset: 0,
        size_bits: 32,
        fields: [("EN".to_string(), field(0, 1)), ("RDY".to_string(), field(1, 1))]
            .into_iter()
            .collect(),
    };
    let muxsel = RegisterDecl {
        address_offset: 4,
        size_bits: 32,
        fields: [("SEL".to_string(), field(0, 4))].into_iter().collect(),
    };
    let divcfg = RegisterDecl {
        address_offset: 8,
        size_bits: 32,
        fields: [("DIV0".to_string(), field(0, 4)), ("DIV1".to_string(), field(4, 4))]
            .into_iter()
            .collect(),
    };
    let pllcfg = RegisterDecl {
        address_offset: 12,
        size_bits: 32,
        fields: [("MULT".to_string(), field(0, 8))].into_iter().collect(),
    };

    let decl = DeviceDecl {
        name: "BL123".to_string(),
        peripherals: [(
            "CLOCK".to_string(),
            PeripheralDecl {
                base_address: 0x4000,
                registers: [
                    ("OSCCTL".to_string(), oscctl),
                    ("MUXSEL".to_string(), muxsel),
                    ("DIVCFG".to_string(), divcfg),
                    ("PLLCFG".to_string(), pllcfg),
                ]
                .into_iter()
                .collect(),
            },
        )]
        .into_iter()
        .collect(),
    };

    let port = FakePort::new(&[(0x4000, 0x3), (0x4004, 0x1), (0x4008, 0x24), (0x400c, 0x8)]);
    let device = Device::new(decl, port.clone()).expect("clock declaration is valid");
    (port, device)
}
