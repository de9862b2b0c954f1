//! Tests for device construction and peripheral/register lookup

mod common;

use common::{sample_decl, sample_device, FakePort};
use reglens_core::decl::{FieldDecl, PeripheralDecl, RegisterDecl};
use reglens_core::error::RegLensError;
use reglens_core::Device;

#[test]
fn test_device_exposes_declared_peripherals()
{
    let (_port, device) = sample_device();

    assert_eq!(device.name(), "TESTDEV");
    assert!(device.has_peripheral("TEST1"));
    assert!(device.has_peripheral("TEST2"));
    assert!(!device.has_peripheral("TEST3"));
    assert_eq!(device.peripheral_names(), vec!["TEST1", "TEST2"]);
}

#[test]
fn test_peripheral_exposes_declared_registers()
{
    let (_port, device) = sample_device();
    let test1 = device.peripheral("TEST1").unwrap();

    assert!(test1.has_register("TESTA"));
    assert!(!test1.has_register("TESTC"));
    assert_eq!(test1.register_names(), vec!["TESTA", "TESTB"]);
    assert_eq!(test1.register("TESTA").unwrap().field_names(), vec!["A1", "A2", "A3"]);
}

#[test]
fn test_unknown_peripheral_lookup_fails()
{
    let (_port, device) = sample_device();

    let err = device.peripheral("MISSING").unwrap_err();
    assert!(matches!(err, RegLensError::UnknownPeripheral(ref name) if name == "MISSING"));
}

#[test]
fn test_unknown_register_lookup_fails()
{
    let (_port, device) = sample_device();

    let err = device.peripheral("TEST1").unwrap().register("MISSING").unwrap_err();
    assert!(matches!(err, RegLensError::UnknownRegister { .. }));
    assert!(format!("{err}").contains("TEST1"));
    assert!(format!("{err}").contains("MISSING"));
}

#[test]
fn test_field_span_must_fit_the_register()
{
    let mut decl = sample_decl();
    decl.peripherals
        .get_mut("TEST1")
        .unwrap()
        .registers
        .get_mut("TESTA")
        .unwrap()
        .fields
        .insert("BAD".to_string(), FieldDecl { bit_offset: 31, bit_width: 2 });

    let port = FakePort::new(&[]);
    let err = Device::new(decl, port).unwrap_err();
    assert!(matches!(err, RegLensError::FieldOutOfRange { .. }));
    assert!(format!("{err}").contains("TESTA"));
    assert!(format!("{err}").contains("BAD"));
}

#[test]
fn test_field_span_near_the_integer_limit_is_out_of_range()
{
    let mut decl = sample_decl();
    decl.peripherals
        .get_mut("TEST1")
        .unwrap()
        .registers
        .get_mut("TESTA")
        .unwrap()
        .fields
        .insert("HUGE".to_string(), FieldDecl { bit_offset: u32::MAX, bit_width: 2 });

    let port = FakePort::new(&[]);
    let err = Device::new(decl, port).unwrap_err();
    assert!(matches!(err, RegLensError::FieldOutOfRange { .. }));
}

#[test]
fn test_field_span_may_end_exactly_at_the_register_top()
{
    let mut decl = sample_decl();
    decl.peripherals
        .get_mut("TEST1")
        .unwrap()
        .registers
        .get_mut("TESTA")
        .unwrap()
        .fields
        .insert("TOP".to_string(), FieldDecl { bit_offset: 30, bit_width: 2 });

    let port = FakePort::new(&[]);
    assert!(Device::new(decl, port).is_ok());
}

#[test]
fn test_registers_in_one_peripheral_share_the_port()
{
    let (port, device) = sample_device();
    let test1 = device.peripheral("TEST1").unwrap();

    test1.register("TESTA").unwrap().read(false).unwrap();
    test1.register("TESTB").unwrap().read(false).unwrap();
    assert_eq!(port.borrow().reads, 2);
}

#[test]
fn test_prefetch_populates_every_register_cache()
{
    let (port, device) = sample_device();
    let test1 = device.peripheral("TEST1").unwrap();

    test1.prefetch().unwrap();
    assert_eq!(port.borrow().reads, 2);
    assert_eq!(test1.register("TESTA").unwrap().cached_value(), Some(0x0010_0003));
    assert_eq!(test1.register("TESTB").unwrap().cached_value(), Some(0x0001_0000));
}

#[test]
fn test_prefetch_reports_port_failures()
{
    let decl = sample_decl();
    // Seed only one of TEST1's two registers; the other read fails
    let port = FakePort::new(&[(0x1234, 0x0010_0003)]);
    let device = Device::new(decl, port).unwrap();

    assert!(device.peripheral("TEST1").unwrap().prefetch().is_err());
}

#[test]
fn test_empty_device_declaration_builds()
{
    let decl = reglens_core::decl::DeviceDecl { name: "empty".to_string(), ..Default::default() };
    let port = reglens_core::port::shared(FakePort {
        memory: std::collections::HashMap::new(),
        reads: 0,
        writes: 0,
    });

    let device = Device::new(decl, port).unwrap();
    assert!(device.peripheral_names().is_empty());
}

#[test]
fn test_register_declared_with_no_fields_is_usable()
{
    let mut decl = sample_decl();
    decl.peripherals.get_mut("TEST2").unwrap().registers.insert(
        "PLAIN".to_string(),
        RegisterDecl { address_offset: 8, size_bits: 32, ..Default::default() },
    );
    decl.peripherals.insert(
        "EMPTY".to_string(),
        PeripheralDecl { base_address: 0x9000, ..Default::default() },
    );

    let port = FakePort::new(&[(0x1244, 0xdead_beef)]);
    let device = Device::new(decl, port).unwrap();
    let plain = device.peripheral("TEST2").unwrap().register("PLAIN").unwrap();

    assert_eq!(plain.read(false).unwrap(), 0xdead_beef);
    assert!(plain.field_names().is_empty());
}
