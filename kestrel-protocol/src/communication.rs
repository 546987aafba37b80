//! Message-level send and receive
//!
//! [`Communication`] composes the [`TransportLayer`] with the message types:
//! outbound calls write a protocol byte, a header and an optional object
//! into one packet; inbound packets are dispatched on their protocol byte
//! into one storage slot per protocol.
//!
//! Every operation records its outcome in [`Communication::status`], which is
//! the code reported back to the host in communication error messages.

use core::fmt;

use kestrel_hal::{MonotonicClock, OutputPin, SerialStream};

use crate::cobs::MAX_PAYLOAD_SIZE;
use crate::config::{ConfigError, TransportConfig};
use crate::crc::CrcWord;
use crate::messages::{
    DequeueModuleCommand, InboundMessage, KernelCommand, KernelData, KernelParameters,
    KernelState, ModuleData, ModuleParameters, ModuleState, OneOffModuleCommand, Protocol,
    RepeatedModuleCommand, Scope, ServiceProtocol,
};
use crate::prototypes::{Prototype, MAX_PROTOTYPE_SIZE};
use crate::transport::{TransportError, TransportLayer, TransportStatus};
use crate::wire::Wire;

/// Largest object a module parameters message can carry
pub const MAX_PARAMETERS_SIZE: usize = MAX_PAYLOAD_SIZE - 1 - ModuleParameters::SIZE;

/// Largest object a data message can carry
///
/// Bounded by the largest prototype footprint, which fits the payload after
/// either data header.
pub const MAX_DATA_OBJECT_SIZE: usize = MAX_PROTOTYPE_SIZE;

const _: () = assert!(MAX_DATA_OBJECT_SIZE <= MAX_PAYLOAD_SIZE - 1 - ModuleData::SIZE);
const _: () = assert!(MAX_DATA_OBJECT_SIZE <= MAX_PAYLOAD_SIZE - 1 - KernelData::SIZE);

/// Outcome of the most recent façade operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommunicationStatus {
    Standby,
    ReceptionError,
    ParsingError,
    PackingError,
    TransmissionError,
    MessageSent,
    MessageReceived,
    InvalidProtocol,
    NoBytesToReceive,
    ParameterMismatch,
    ParametersExtracted,
    ExtractionForbidden,
}

impl CommunicationStatus {
    /// Status code reported to the host
    pub fn code(self) -> u8 {
        match self {
            CommunicationStatus::Standby => 151,
            CommunicationStatus::ReceptionError => 152,
            CommunicationStatus::ParsingError => 153,
            CommunicationStatus::PackingError => 154,
            CommunicationStatus::TransmissionError => 155,
            CommunicationStatus::MessageSent => 156,
            CommunicationStatus::MessageReceived => 157,
            CommunicationStatus::InvalidProtocol => 158,
            CommunicationStatus::NoBytesToReceive => 159,
            CommunicationStatus::ParameterMismatch => 160,
            CommunicationStatus::ParametersExtracted => 161,
            CommunicationStatus::ExtractionForbidden => 162,
        }
    }
}

/// Façade failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommunicationError {
    /// Framing, integrity or timeout failure while receiving
    Reception(TransportError),
    /// Payload too short for the header its protocol byte announces
    Parsing,
    /// Message does not fit the transmission buffer
    Packing(TransportError),
    /// Declared prototype does not describe the object being sent
    PrototypeMismatch { prototype: Prototype, object_size: usize },
    /// Stream rejected the packet
    Transmission(TransportError),
    /// Unknown protocol byte, or an outbound protocol received
    InvalidProtocol(u8),
    /// Trailing parameter object and destination differ in size
    ParameterMismatch { received: usize, expected: usize },
    /// Last received message carries no module parameters
    ExtractionForbidden,
}

impl CommunicationError {
    /// Status recorded for this failure
    pub fn status(self) -> CommunicationStatus {
        match self {
            CommunicationError::Reception(_) => CommunicationStatus::ReceptionError,
            CommunicationError::Parsing => CommunicationStatus::ParsingError,
            CommunicationError::Packing(_) | CommunicationError::PrototypeMismatch { .. } => {
                CommunicationStatus::PackingError
            }
            CommunicationError::Transmission(_) => CommunicationStatus::TransmissionError,
            CommunicationError::InvalidProtocol(_) => CommunicationStatus::InvalidProtocol,
            CommunicationError::ParameterMismatch { .. } => CommunicationStatus::ParameterMismatch,
            CommunicationError::ExtractionForbidden => CommunicationStatus::ExtractionForbidden,
        }
    }

    /// Status code reported to the host
    pub fn code(self) -> u8 {
        self.status().code()
    }
}

impl fmt::Display for CommunicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommunicationError::Reception(e) => write!(f, "reception failed: {}", e),
            CommunicationError::Parsing => write!(f, "payload too short for its header"),
            CommunicationError::Packing(e) => write!(f, "message does not fit: {}", e),
            CommunicationError::PrototypeMismatch {
                prototype,
                object_size,
            } => write!(
                f,
                "prototype {} describes {} bytes, object has {}",
                prototype.code(),
                prototype.size(),
                object_size
            ),
            CommunicationError::Transmission(e) => write!(f, "transmission failed: {}", e),
            CommunicationError::InvalidProtocol(code) => {
                write!(f, "invalid protocol code {}", code)
            }
            CommunicationError::ParameterMismatch { received, expected } => write!(
                f,
                "received {} parameter bytes, destination holds {}",
                received, expected
            ),
            CommunicationError::ExtractionForbidden => {
                write!(f, "last message carries no module parameters")
            }
        }
    }
}

/// Decoded inbound headers, one slot per protocol
#[derive(Debug, Default)]
struct Slots {
    repeated_module_command: RepeatedModuleCommand,
    one_off_module_command: OneOffModuleCommand,
    dequeue_module_command: DequeueModuleCommand,
    kernel_command: KernelCommand,
    module_parameters: ModuleParameters,
    kernel_parameters: KernelParameters,
}

/// Communication façade over a serial stream
///
/// `P` is the diagnostic indicator raised when an error could not be
/// reported to the host.
pub struct Communication<S, C, P, W: CrcWord = u16> {
    transport: TransportLayer<S, C, W>,
    fault_pin: P,
    status: CommunicationStatus,
    last_message: Option<InboundMessage>,
    slots: Slots,
}

impl<S, C, P, W> Communication<S, C, P, W>
where
    S: SerialStream,
    C: MonotonicClock,
    P: OutputPin,
    W: CrcWord,
{
    /// Create a façade over `stream`
    pub fn new(stream: S, clock: C, fault_pin: P, config: TransportConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            transport: TransportLayer::new(stream, clock, config)?,
            fault_pin,
            status: CommunicationStatus::Standby,
            last_message: None,
            slots: Slots::default(),
        })
    }

    /// Outcome of the most recent operation
    pub fn status(&self) -> CommunicationStatus {
        self.status
    }

    /// Outcome of the most recent transport operation
    pub fn transport_status(&self) -> TransportStatus {
        self.transport.status()
    }

    /// Underlying transport
    pub fn transport(&self) -> &TransportLayer<S, C, W> {
        &self.transport
    }

    /// Diagnostic indicator
    pub fn fault_pin(&self) -> &P {
        &self.fault_pin
    }

    /// Release the stream, clock and indicator
    pub fn release(self) -> (S, C, P) {
        let (stream, clock) = self.transport.release();
        (stream, clock, self.fault_pin)
    }

    /// Last successfully received message, until reception starts on another packet
    pub fn last_message(&self) -> Option<InboundMessage> {
        self.last_message
    }

    /// Protocol of [`Self::last_message`]
    pub fn last_protocol(&self) -> Option<Protocol> {
        self.last_message.map(|message| message.protocol())
    }

    /// Last received recurring module command
    pub fn repeated_module_command(&self) -> &RepeatedModuleCommand {
        &self.slots.repeated_module_command
    }

    /// Last received one-off module command
    pub fn one_off_module_command(&self) -> &OneOffModuleCommand {
        &self.slots.one_off_module_command
    }

    /// Last received dequeue command
    pub fn dequeue_module_command(&self) -> &DequeueModuleCommand {
        &self.slots.dequeue_module_command
    }

    /// Last received kernel command
    pub fn kernel_command(&self) -> &KernelCommand {
        &self.slots.kernel_command
    }

    /// Header of the last module parameters message; see [`Self::extract_module_parameters`]
    pub fn module_parameters(&self) -> &ModuleParameters {
        &self.slots.module_parameters
    }

    /// Last received kernel parameters
    pub fn kernel_parameters(&self) -> &KernelParameters {
        &self.slots.kernel_parameters
    }

    /// Send an event report with a data object
    ///
    /// `prototype` must describe `object`; the host decodes the trailing
    /// bytes with it.
    pub fn send_data_message<O: Wire>(
        &mut self,
        scope: Scope,
        command: u8,
        event: u8,
        prototype: Prototype,
        object: &O,
    ) -> Result<(), CommunicationError> {
        const { assert!(O::SIZE <= MAX_DATA_OBJECT_SIZE, "no prototype describes an object this large") };

        if prototype.size() != O::SIZE {
            return self.fail(CommunicationError::PrototypeMismatch {
                prototype,
                object_size: O::SIZE,
            });
        }

        self.transport.reset_transmission_buffer();
        let packed = match scope {
            Scope::Module {
                module_type,
                module_id,
            } => self.pack(
                Protocol::ModuleData,
                &ModuleData {
                    module_type,
                    module_id,
                    command,
                    event,
                    prototype,
                },
            ),
            Scope::Kernel => self.pack(
                Protocol::KernelData,
                &KernelData {
                    command,
                    event,
                    prototype,
                },
            ),
        };
        packed
            .and_then(|_| self.transport.write_object(object))
            .map_err(CommunicationError::Packing)
            .or_else(|error| self.fail(error))?;
        self.transmit()
    }

    /// Send an event report without data
    pub fn send_state_message(&mut self, scope: Scope, command: u8, event: u8) -> Result<(), CommunicationError> {
        self.transport.reset_transmission_buffer();
        let packed = match scope {
            Scope::Module {
                module_type,
                module_id,
            } => self.pack(
                Protocol::ModuleState,
                &ModuleState {
                    module_type,
                    module_id,
                    command,
                    event,
                },
            ),
            Scope::Kernel => self.pack(Protocol::KernelState, &KernelState { command, event }),
        };
        packed
            .map_err(CommunicationError::Packing)
            .or_else(|error| self.fail(error))?;
        self.transmit()
    }

    /// Report a communication failure to the host and raise the fault indicator
    ///
    /// The report is a data message with `error_code` as its event and the
    /// current façade and transport status codes as a two byte object. Its
    /// own failure is not reported again.
    pub fn send_communication_error_message(&mut self, scope: Scope, command: u8, error_code: u8) {
        let codes = [self.status.code(), self.transport.status().code()];

        #[cfg(feature = "defmt")]
        defmt::error!(
            "Communication error {}: status {}, transport {}",
            error_code,
            codes[0],
            codes[1]
        );

        if let Err(_error) = self.send_data_message(scope, command, error_code, Prototype::TWO_UINT8S, &codes) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Error report not delivered: {}", _error);
        }
        self.fault_pin.set_high();
    }

    /// Send a service message; the marker fixes the protocol and code width
    pub fn send_service_message<M: ServiceProtocol>(&mut self, code: M::Code) -> Result<(), CommunicationError> {
        self.transport.reset_transmission_buffer();
        self.transport
            .write_object(&M::PROTOCOL.to_byte())
            .and_then(|_| self.transport.write_object(&code))
            .map_err(CommunicationError::Packing)
            .or_else(|error| self.fail(error))?;
        self.transmit()
    }

    /// Poll the stream for an inbound message
    ///
    /// Returns `Ok(None)` while no complete packet is available. On success
    /// the header is stored in its protocol's slot and the protocol returned.
    pub fn receive_message(&mut self) -> Result<Option<Protocol>, CommunicationError> {
        if let Err(error) = self.transport.receive() {
            // A new packet has begun; the previous payload is gone
            if error != TransportError::NoBytesToParse {
                self.last_message = None;
            }
            if error.is_transient() {
                self.status = CommunicationStatus::NoBytesToReceive;
                return Ok(None);
            }
            return self.fail(CommunicationError::Reception(error));
        }
        self.last_message = None;

        let code = self.transport.received_payload().first().copied().unwrap_or(0);
        let Some(protocol) = Protocol::from_byte(code) else {
            return self.reject_protocol(code);
        };

        let message = match protocol {
            Protocol::RepeatedModuleCommand => {
                let header = self.read_header()?;
                self.slots.repeated_module_command = header;
                InboundMessage::RepeatedModuleCommand(header)
            }
            Protocol::OneOffModuleCommand => {
                let header = self.read_header()?;
                self.slots.one_off_module_command = header;
                InboundMessage::OneOffModuleCommand(header)
            }
            Protocol::DequeueModuleCommand => {
                let header = self.read_header()?;
                self.slots.dequeue_module_command = header;
                InboundMessage::DequeueModuleCommand(header)
            }
            Protocol::KernelCommand => {
                let header = self.read_header()?;
                self.slots.kernel_command = header;
                InboundMessage::KernelCommand(header)
            }
            Protocol::ModuleParameters => {
                let header = self.read_header()?;
                self.slots.module_parameters = header;
                InboundMessage::ModuleParameters(header)
            }
            Protocol::KernelParameters => {
                let header = self.read_header()?;
                self.slots.kernel_parameters = header;
                InboundMessage::KernelParameters(header)
            }
            Protocol::ModuleData
            | Protocol::KernelData
            | Protocol::ModuleState
            | Protocol::KernelState
            | Protocol::ReceptionCode
            | Protocol::ControllerIdentification
            | Protocol::ModuleIdentification => return self.reject_protocol(code),
        };

        self.last_message = Some(message);
        self.status = CommunicationStatus::MessageReceived;
        Ok(Some(protocol))
    }

    /// Copy the parameter object of the last module parameters message
    ///
    /// The trailing object must be exactly `T::SIZE` bytes; `destination`
    /// is untouched on any failure. Extraction may be repeated until the
    /// next packet starts arriving.
    pub fn extract_module_parameters<T: Wire>(&mut self, destination: &mut T) -> Result<(), CommunicationError> {
        const {
            assert!(T::SIZE > 0, "parameter object must not be empty");
            assert!(T::SIZE <= MAX_PARAMETERS_SIZE, "parameter object exceeds the payload");
        };

        if self.last_protocol() != Some(Protocol::ModuleParameters) {
            return self.fail(CommunicationError::ExtractionForbidden);
        }

        let header_end = 1 + ModuleParameters::SIZE;
        let received = self.transport.bytes_in_reception_buffer().saturating_sub(header_end);
        if received != T::SIZE {
            return self.fail(CommunicationError::ParameterMismatch {
                received,
                expected: T::SIZE,
            });
        }

        match self.transport.read_object_at::<T>(header_end) {
            Ok((value, _)) => {
                *destination = value;
                self.status = CommunicationStatus::ParametersExtracted;
                Ok(())
            }
            Err(_) => self.fail(CommunicationError::Parsing),
        }
    }

    fn pack<H: Wire>(&mut self, protocol: Protocol, header: &H) -> Result<usize, TransportError> {
        self.transport.write_object(&protocol.to_byte())?;
        self.transport.write_object(header)
    }

    fn transmit(&mut self) -> Result<(), CommunicationError> {
        match self.transport.send() {
            Ok(()) => {
                self.status = CommunicationStatus::MessageSent;
                Ok(())
            }
            Err(error) => self.fail(CommunicationError::Transmission(error)),
        }
    }

    fn read_header<H: Wire>(&mut self) -> Result<H, CommunicationError> {
        match self.transport.read_object_at::<H>(1) {
            Ok((header, _)) => Ok(header),
            Err(_) => self.fail(CommunicationError::Parsing),
        }
    }

    fn reject_protocol<T>(&mut self, code: u8) -> Result<T, CommunicationError> {
        #[cfg(feature = "defmt")]
        defmt::warn!("Rejected protocol code {}", code);
        self.fail(CommunicationError::InvalidProtocol(code))
    }

    fn fail<T>(&mut self, error: CommunicationError) -> Result<T, CommunicationError> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Communication failed: {}", error);
        self.status = error.status();
        Err(error)
    }
}
