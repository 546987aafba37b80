//! Message types
//!
//! The first payload byte of every message is a [`Protocol`] code that selects
//! the header structure encoded after it:
//! - Host → controller: module and kernel commands, parameter updates
//! - Controller → host: data and state reports, service messages
//!
//! Headers are fixed-layout; fields encode in declaration order with no
//! padding. Module parameter and data messages carry a trailing object after
//! the header.

use crate::prototypes::Prototype;
use crate::wire::{FieldReader, FieldWriter, Wire};

/// Message protocol codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Protocol {
    /// Recurring command addressed to a module
    RepeatedModuleCommand = 1,
    /// One-off command addressed to a module
    OneOffModuleCommand = 2,
    /// Clear a module's command queue
    DequeueModuleCommand = 3,
    /// Command addressed to the kernel
    KernelCommand = 4,
    /// Parameter object addressed to a module
    ModuleParameters = 5,
    /// Runtime parameters for the kernel
    KernelParameters = 6,
    /// Module event with a data object
    ModuleData = 7,
    /// Kernel event with a data object
    KernelData = 8,
    /// Module event without data
    ModuleState = 9,
    /// Kernel event without data
    KernelState = 10,
    /// Acknowledges reception of a host message
    ReceptionCode = 11,
    /// Controller identification
    ControllerIdentification = 12,
    /// Module type and id identification
    ModuleIdentification = 13,
}

/// Direction a protocol travels in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Host → controller
    Inbound,
    /// Controller → host
    Outbound,
}

/// Reserved protocol code; never valid on the wire
pub const PROTOCOL_UNDEFINED: u8 = 0;

impl Protocol {
    /// Parse a protocol code. Unknown codes, including 0, are rejected.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Protocol::RepeatedModuleCommand),
            2 => Some(Protocol::OneOffModuleCommand),
            3 => Some(Protocol::DequeueModuleCommand),
            4 => Some(Protocol::KernelCommand),
            5 => Some(Protocol::ModuleParameters),
            6 => Some(Protocol::KernelParameters),
            7 => Some(Protocol::ModuleData),
            8 => Some(Protocol::KernelData),
            9 => Some(Protocol::ModuleState),
            10 => Some(Protocol::KernelState),
            11 => Some(Protocol::ReceptionCode),
            12 => Some(Protocol::ControllerIdentification),
            13 => Some(Protocol::ModuleIdentification),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Size of the structure following the protocol byte, excluding any
    /// trailing object
    pub fn header_size(self) -> usize {
        match self {
            Protocol::RepeatedModuleCommand => RepeatedModuleCommand::SIZE,
            Protocol::OneOffModuleCommand => OneOffModuleCommand::SIZE,
            Protocol::DequeueModuleCommand => DequeueModuleCommand::SIZE,
            Protocol::KernelCommand => KernelCommand::SIZE,
            Protocol::ModuleParameters => ModuleParameters::SIZE,
            Protocol::KernelParameters => KernelParameters::SIZE,
            Protocol::ModuleData => ModuleData::SIZE,
            Protocol::KernelData => KernelData::SIZE,
            Protocol::ModuleState => ModuleState::SIZE,
            Protocol::KernelState => KernelState::SIZE,
            Protocol::ReceptionCode | Protocol::ControllerIdentification => <u8 as Wire>::SIZE,
            Protocol::ModuleIdentification => <u16 as Wire>::SIZE,
        }
    }

    /// Whether an object of message-specific size follows the header
    pub fn has_trailing_object(self) -> bool {
        matches!(
            self,
            Protocol::ModuleParameters | Protocol::ModuleData | Protocol::KernelData
        )
    }

    /// Which endpoint sends this protocol
    pub fn direction(self) -> Direction {
        match self {
            Protocol::RepeatedModuleCommand
            | Protocol::OneOffModuleCommand
            | Protocol::DequeueModuleCommand
            | Protocol::KernelCommand
            | Protocol::ModuleParameters
            | Protocol::KernelParameters => Direction::Inbound,
            Protocol::ModuleData
            | Protocol::KernelData
            | Protocol::ModuleState
            | Protocol::KernelState
            | Protocol::ReceptionCode
            | Protocol::ControllerIdentification
            | Protocol::ModuleIdentification => Direction::Outbound,
        }
    }
}

/// Who a report message is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scope {
    /// The controller itself
    Kernel,
    /// One addressable module
    Module { module_type: u8, module_id: u8 },
}

/// Runtime flags shared by the kernel and all modules
///
/// Set by kernel parameter messages. The kernel owns the only copy and hands
/// it to modules by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DynamicRuntimeParameters {
    /// Blocks actions that move or dispense
    pub action_lock: bool,
    /// Blocks TTL output
    pub ttl_lock: bool,
}

impl Default for DynamicRuntimeParameters {
    fn default() -> Self {
        Self {
            action_lock: true,
            ttl_lock: true,
        }
    }
}

impl Wire for DynamicRuntimeParameters {
    const SIZE: usize = 2;

    fn encode(&self, out: &mut [u8]) {
        let mut writer = FieldWriter::new(out);
        writer.put(&self.action_lock);
        writer.put(&self.ttl_lock);
    }

    fn decode(bytes: &[u8]) -> Self {
        let mut reader = FieldReader::new(bytes);
        Self {
            action_lock: reader.take(),
            ttl_lock: reader.take(),
        }
    }
}

/// Recurring module command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RepeatedModuleCommand {
    pub module_type: u8,
    pub module_id: u8,
    /// Echoed in a reception code message when non-zero
    pub return_code: u8,
    pub command: u8,
    /// Run without blocking other modules
    pub noblock: bool,
    /// Delay between repetitions (µs)
    pub cycle_delay: u32,
}

impl Wire for RepeatedModuleCommand {
    const SIZE: usize = 9;

    fn encode(&self, out: &mut [u8]) {
        let mut writer = FieldWriter::new(out);
        writer.put(&self.module_type);
        writer.put(&self.module_id);
        writer.put(&self.return_code);
        writer.put(&self.command);
        writer.put(&self.noblock);
        writer.put(&self.cycle_delay);
    }

    fn decode(bytes: &[u8]) -> Self {
        let mut reader = FieldReader::new(bytes);
        Self {
            module_type: reader.take(),
            module_id: reader.take(),
            return_code: reader.take(),
            command: reader.take(),
            noblock: reader.take(),
            cycle_delay: reader.take(),
        }
    }
}

/// Single-run module command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OneOffModuleCommand {
    pub module_type: u8,
    pub module_id: u8,
    pub return_code: u8,
    pub command: u8,
    pub noblock: bool,
}

impl Wire for OneOffModuleCommand {
    const SIZE: usize = 5;

    fn encode(&self, out: &mut [u8]) {
        let mut writer = FieldWriter::new(out);
        writer.put(&self.module_type);
        writer.put(&self.module_id);
        writer.put(&self.return_code);
        writer.put(&self.command);
        writer.put(&self.noblock);
    }

    fn decode(bytes: &[u8]) -> Self {
        let mut reader = FieldReader::new(bytes);
        Self {
            module_type: reader.take(),
            module_id: reader.take(),
            return_code: reader.take(),
            command: reader.take(),
            noblock: reader.take(),
        }
    }
}

/// Clears queued commands of one module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DequeueModuleCommand {
    pub module_type: u8,
    pub module_id: u8,
    pub return_code: u8,
}

/// Header of a module parameters message; the parameter object follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModuleParameters {
    pub module_type: u8,
    pub module_id: u8,
    pub return_code: u8,
}

macro_rules! impl_wire_address_header {
    ($($ty:ident),*) => {
        $(
            impl Wire for $ty {
                const SIZE: usize = 3;

                fn encode(&self, out: &mut [u8]) {
                    let mut writer = FieldWriter::new(out);
                    writer.put(&self.module_type);
                    writer.put(&self.module_id);
                    writer.put(&self.return_code);
                }

                fn decode(bytes: &[u8]) -> Self {
                    let mut reader = FieldReader::new(bytes);
                    Self {
                        module_type: reader.take(),
                        module_id: reader.take(),
                        return_code: reader.take(),
                    }
                }
            }
        )*
    };
}

impl_wire_address_header!(DequeueModuleCommand, ModuleParameters);

/// Kernel command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KernelCommand {
    pub return_code: u8,
    pub command: u8,
}

impl Wire for KernelCommand {
    const SIZE: usize = 2;

    fn encode(&self, out: &mut [u8]) {
        let mut writer = FieldWriter::new(out);
        writer.put(&self.return_code);
        writer.put(&self.command);
    }

    fn decode(bytes: &[u8]) -> Self {
        let mut reader = FieldReader::new(bytes);
        Self {
            return_code: reader.take(),
            command: reader.take(),
        }
    }
}

/// Kernel runtime parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KernelParameters {
    pub return_code: u8,
    pub dynamic_parameters: DynamicRuntimeParameters,
}

impl Wire for KernelParameters {
    const SIZE: usize = 1 + DynamicRuntimeParameters::SIZE;

    fn encode(&self, out: &mut [u8]) {
        let mut writer = FieldWriter::new(out);
        writer.put(&self.return_code);
        writer.put(&self.dynamic_parameters);
    }

    fn decode(bytes: &[u8]) -> Self {
        let mut reader = FieldReader::new(bytes);
        Self {
            return_code: reader.take(),
            dynamic_parameters: reader.take(),
        }
    }
}

/// Module data report header; the object described by `prototype` follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModuleData {
    pub module_type: u8,
    pub module_id: u8,
    pub command: u8,
    pub event: u8,
    pub prototype: Prototype,
}

impl Wire for ModuleData {
    const SIZE: usize = 5;

    fn encode(&self, out: &mut [u8]) {
        let mut writer = FieldWriter::new(out);
        writer.put(&self.module_type);
        writer.put(&self.module_id);
        writer.put(&self.command);
        writer.put(&self.event);
        writer.put(&self.prototype.code());
    }

    /// Unknown prototype codes decode as [`Prototype::ONE_BOOL`]; the
    /// controller only ever encodes this header.
    fn decode(bytes: &[u8]) -> Self {
        let mut reader = FieldReader::new(bytes);
        Self {
            module_type: reader.take(),
            module_id: reader.take(),
            command: reader.take(),
            event: reader.take(),
            prototype: Prototype::from_code(reader.take()).unwrap_or(Prototype::ONE_BOOL),
        }
    }
}

/// Kernel data report header; the object described by `prototype` follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KernelData {
    pub command: u8,
    pub event: u8,
    pub prototype: Prototype,
}

impl Wire for KernelData {
    const SIZE: usize = 3;

    fn encode(&self, out: &mut [u8]) {
        let mut writer = FieldWriter::new(out);
        writer.put(&self.command);
        writer.put(&self.event);
        writer.put(&self.prototype.code());
    }

    fn decode(bytes: &[u8]) -> Self {
        let mut reader = FieldReader::new(bytes);
        Self {
            command: reader.take(),
            event: reader.take(),
            prototype: Prototype::from_code(reader.take()).unwrap_or(Prototype::ONE_BOOL),
        }
    }
}

/// Module state report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModuleState {
    pub module_type: u8,
    pub module_id: u8,
    pub command: u8,
    pub event: u8,
}

impl Wire for ModuleState {
    const SIZE: usize = 4;

    fn encode(&self, out: &mut [u8]) {
        let mut writer = FieldWriter::new(out);
        writer.put(&self.module_type);
        writer.put(&self.module_id);
        writer.put(&self.command);
        writer.put(&self.event);
    }

    fn decode(bytes: &[u8]) -> Self {
        let mut reader = FieldReader::new(bytes);
        Self {
            module_type: reader.take(),
            module_id: reader.take(),
            command: reader.take(),
            event: reader.take(),
        }
    }
}

/// Kernel state report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KernelState {
    pub command: u8,
    pub event: u8,
}

impl Wire for KernelState {
    const SIZE: usize = 2;

    fn encode(&self, out: &mut [u8]) {
        let mut writer = FieldWriter::new(out);
        writer.put(&self.command);
        writer.put(&self.event);
    }

    fn decode(bytes: &[u8]) -> Self {
        let mut reader = FieldReader::new(bytes);
        Self {
            command: reader.take(),
            event: reader.take(),
        }
    }
}

/// A decoded host → controller message header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InboundMessage {
    RepeatedModuleCommand(RepeatedModuleCommand),
    OneOffModuleCommand(OneOffModuleCommand),
    DequeueModuleCommand(DequeueModuleCommand),
    KernelCommand(KernelCommand),
    /// Header only; extract the parameter object separately
    ModuleParameters(ModuleParameters),
    KernelParameters(KernelParameters),
}

impl InboundMessage {
    /// Protocol this message arrived with
    pub fn protocol(&self) -> Protocol {
        match self {
            InboundMessage::RepeatedModuleCommand(_) => Protocol::RepeatedModuleCommand,
            InboundMessage::OneOffModuleCommand(_) => Protocol::OneOffModuleCommand,
            InboundMessage::DequeueModuleCommand(_) => Protocol::DequeueModuleCommand,
            InboundMessage::KernelCommand(_) => Protocol::KernelCommand,
            InboundMessage::ModuleParameters(_) => Protocol::ModuleParameters,
            InboundMessage::KernelParameters(_) => Protocol::KernelParameters,
        }
    }

    /// Return code the host asked to be acknowledged with (0 = none)
    pub fn return_code(&self) -> u8 {
        match self {
            InboundMessage::RepeatedModuleCommand(m) => m.return_code,
            InboundMessage::OneOffModuleCommand(m) => m.return_code,
            InboundMessage::DequeueModuleCommand(m) => m.return_code,
            InboundMessage::KernelCommand(m) => m.return_code,
            InboundMessage::ModuleParameters(m) => m.return_code,
            InboundMessage::KernelParameters(m) => m.return_code,
        }
    }
}

/// Service message protocol with a fixed code width
///
/// Implemented by the markers in [`service`]; the marker fixes both the
/// protocol byte and the code width, so a wrongly sized code does not compile.
pub trait ServiceProtocol {
    /// Protocol code sent before the service code
    const PROTOCOL: Protocol;
    /// Service code type
    type Code: Wire;
}

/// Service protocol markers
pub mod service {
    use super::{Protocol, ServiceProtocol};

    /// Echoes the return code of a received message
    pub struct ReceptionCode;

    /// Identifies the controller to the host
    pub struct ControllerIdentification;

    /// Identifies one module as `(module_type << 8) | module_id`
    pub struct ModuleIdentification;

    impl ServiceProtocol for ReceptionCode {
        const PROTOCOL: Protocol = Protocol::ReceptionCode;
        type Code = u8;
    }

    impl ServiceProtocol for ControllerIdentification {
        const PROTOCOL: Protocol = Protocol::ControllerIdentification;
        type Code = u8;
    }

    impl ServiceProtocol for ModuleIdentification {
        const PROTOCOL: Protocol = Protocol::ModuleIdentification;
        type Code = u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;
    use crate::mock::{MockClock, MockStream};
    use crate::transport::TransportLayer;
    use proptest::prelude::*;

    fn encode<T: Wire>(value: &T) -> std::vec::Vec<u8> {
        let mut out = std::vec![0u8; T::SIZE];
        value.encode(&mut out);
        out
    }

    #[test]
    fn test_protocol_codes_are_stable() {
        for code in 1..=13u8 {
            let protocol = Protocol::from_byte(code).unwrap();
            assert_eq!(protocol.to_byte(), code);
        }
        assert_eq!(Protocol::from_byte(PROTOCOL_UNDEFINED), None);
        assert_eq!(Protocol::from_byte(14), None);
        assert_eq!(Protocol::from_byte(200), None);
    }

    #[test]
    fn test_header_sizes() {
        assert_eq!(Protocol::RepeatedModuleCommand.header_size(), 9);
        assert_eq!(Protocol::OneOffModuleCommand.header_size(), 5);
        assert_eq!(Protocol::DequeueModuleCommand.header_size(), 3);
        assert_eq!(Protocol::KernelCommand.header_size(), 2);
        assert_eq!(Protocol::ModuleParameters.header_size(), 3);
        assert_eq!(Protocol::KernelParameters.header_size(), 3);
        assert_eq!(Protocol::ModuleData.header_size(), 5);
        assert_eq!(Protocol::KernelData.header_size(), 3);
        assert_eq!(Protocol::ModuleState.header_size(), 4);
        assert_eq!(Protocol::KernelState.header_size(), 2);
        assert_eq!(Protocol::ReceptionCode.header_size(), 1);
        assert_eq!(Protocol::ControllerIdentification.header_size(), 1);
        assert_eq!(Protocol::ModuleIdentification.header_size(), 2);
    }

    #[test]
    fn test_directions() {
        let inbound = (1..=13u8)
            .filter_map(Protocol::from_byte)
            .filter(|p| p.direction() == Direction::Inbound)
            .count();
        assert_eq!(inbound, 6);
        assert_eq!(Protocol::ModuleData.direction(), Direction::Outbound);
        assert!(Protocol::ModuleParameters.has_trailing_object());
        assert!(!Protocol::KernelParameters.has_trailing_object());
    }

    #[test]
    fn test_repeated_command_layout() {
        let command = RepeatedModuleCommand {
            module_type: 2,
            module_id: 3,
            return_code: 4,
            command: 5,
            noblock: true,
            cycle_delay: 1_000_000,
        };
        assert_eq!(encode(&command), [2, 3, 4, 5, 1, 0x40, 0x42, 0x0F, 0x00]);
        assert_eq!(RepeatedModuleCommand::decode(&encode(&command)), command);
    }

    #[test]
    fn test_kernel_parameters_layout() {
        let parameters = KernelParameters {
            return_code: 9,
            dynamic_parameters: DynamicRuntimeParameters {
                action_lock: false,
                ttl_lock: true,
            },
        };
        assert_eq!(encode(&parameters), [9, 0, 1]);
        assert_eq!(KernelParameters::decode(&[9, 0, 1]), parameters);
    }

    #[test]
    fn test_runtime_parameters_default_locked() {
        let parameters = DynamicRuntimeParameters::default();
        assert!(parameters.action_lock);
        assert!(parameters.ttl_lock);
    }

    #[test]
    fn test_report_layouts() {
        let data = ModuleData {
            module_type: 112,
            module_id: 12,
            command: 88,
            event: 221,
            prototype: Prototype::ONE_UINT8,
        };
        assert_eq!(encode(&data), [112, 12, 88, 221, 2]);

        let state = KernelState { command: 1, event: 2 };
        assert_eq!(encode(&state), [1, 2]);
    }

    #[test]
    fn test_inbound_message_accessors() {
        let message = InboundMessage::KernelCommand(KernelCommand {
            return_code: 7,
            command: 1,
        });
        assert_eq!(message.protocol(), Protocol::KernelCommand);
        assert_eq!(message.return_code(), 7);
    }

    /// Send protocol byte, header and object through a transport pair and
    /// check the receiver sees the same bytes and the same header
    fn check_transfer<H>(protocol: Protocol, header: H, object: &[u8]) -> Result<(), TestCaseError>
    where
        H: Wire + PartialEq + core::fmt::Debug,
    {
        let clock = MockClock::new();
        let config = TransportConfig::default();
        let mut sender: TransportLayer<MockStream, &MockClock> =
            TransportLayer::new(MockStream::new(), &clock, config).unwrap();
        sender.write_object(&protocol.to_byte()).unwrap();
        sender.write_object(&header).unwrap();
        for byte in object {
            sender.write_object(byte).unwrap();
        }
        sender.send().unwrap();
        let (stream, _) = sender.release();

        let mut receiver: TransportLayer<MockStream, &MockClock> =
            TransportLayer::new(MockStream::new(), &clock, config).unwrap();
        receiver.stream_mut().feed(&stream.tx);
        prop_assert_eq!(receiver.receive(), Ok(1 + H::SIZE + object.len()));

        let (code, header_start) = receiver.read_object_at::<u8>(0).unwrap();
        prop_assert_eq!(Protocol::from_byte(code), Some(protocol));
        let (decoded, object_start) = receiver.read_object_at::<H>(header_start).unwrap();
        prop_assert_eq!(&decoded, &header);

        let payload = receiver.received_payload();
        let encoded_header = encode(&header);
        prop_assert_eq!(&payload[header_start..object_start], encoded_header.as_slice());
        prop_assert_eq!(&payload[object_start..], object);
        Ok(())
    }

    fn any_prototype() -> impl Strategy<Value = Prototype> {
        (1u8..=165).prop_map(|code| Prototype::from_code(code).unwrap())
    }

    fn any_object() -> impl Strategy<Value = std::vec::Vec<u8>> {
        proptest::collection::vec(any::<u8>(), 0..=120)
    }

    proptest! {
        #[test]
        fn prop_repeated_module_command_transfer(
            (module_type, module_id, return_code, command, noblock, cycle_delay)
                in any::<(u8, u8, u8, u8, bool, u32)>(),
            object in any_object(),
        ) {
            let header = RepeatedModuleCommand { module_type, module_id, return_code, command, noblock, cycle_delay };
            check_transfer(Protocol::RepeatedModuleCommand, header, &object)?;
        }

        #[test]
        fn prop_one_off_module_command_transfer(
            (module_type, module_id, return_code, command, noblock) in any::<(u8, u8, u8, u8, bool)>(),
            object in any_object(),
        ) {
            let header = OneOffModuleCommand { module_type, module_id, return_code, command, noblock };
            check_transfer(Protocol::OneOffModuleCommand, header, &object)?;
        }

        #[test]
        fn prop_dequeue_module_command_transfer(
            (module_type, module_id, return_code) in any::<(u8, u8, u8)>(),
            object in any_object(),
        ) {
            let header = DequeueModuleCommand { module_type, module_id, return_code };
            check_transfer(Protocol::DequeueModuleCommand, header, &object)?;
        }

        #[test]
        fn prop_kernel_command_transfer(
            (return_code, command) in any::<(u8, u8)>(),
            object in any_object(),
        ) {
            check_transfer(Protocol::KernelCommand, KernelCommand { return_code, command }, &object)?;
        }

        #[test]
        fn prop_module_parameters_transfer(
            (module_type, module_id, return_code) in any::<(u8, u8, u8)>(),
            object in any_object(),
        ) {
            let header = ModuleParameters { module_type, module_id, return_code };
            check_transfer(Protocol::ModuleParameters, header, &object)?;
        }

        #[test]
        fn prop_kernel_parameters_transfer(
            (return_code, action_lock, ttl_lock) in any::<(u8, bool, bool)>(),
            object in any_object(),
        ) {
            let header = KernelParameters {
                return_code,
                dynamic_parameters: DynamicRuntimeParameters { action_lock, ttl_lock },
            };
            check_transfer(Protocol::KernelParameters, header, &object)?;
        }

        #[test]
        fn prop_module_data_transfer(
            (module_type, module_id, command, event) in any::<(u8, u8, u8, u8)>(),
            prototype in any_prototype(),
            object in any_object(),
        ) {
            let header = ModuleData { module_type, module_id, command, event, prototype };
            check_transfer(Protocol::ModuleData, header, &object)?;
        }

        #[test]
        fn prop_kernel_data_transfer(
            (command, event) in any::<(u8, u8)>(),
            prototype in any_prototype(),
            object in any_object(),
        ) {
            check_transfer(Protocol::KernelData, KernelData { command, event, prototype }, &object)?;
        }

        #[test]
        fn prop_module_state_transfer(
            (module_type, module_id, command, event) in any::<(u8, u8, u8, u8)>(),
            object in any_object(),
        ) {
            let header = ModuleState { module_type, module_id, command, event };
            check_transfer(Protocol::ModuleState, header, &object)?;
        }

        #[test]
        fn prop_kernel_state_transfer(
            (command, event) in any::<(u8, u8)>(),
            object in any_object(),
        ) {
            check_transfer(Protocol::KernelState, KernelState { command, event }, &object)?;
        }
    }
}
