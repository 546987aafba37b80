//! GPIO pin abstractions
//!
//! The communication stack drives a single output: the diagnostic indicator
//! raised when an error could not be reported to the host.

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }
}

/// Placeholder for boards without an indicator
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl OutputPin for NoPin {
    fn set_high(&mut self) {}

    fn set_low(&mut self) {}
}

/// [`OutputPin`] over an `embedded-hal` 1.0 output
///
/// Pin errors are dropped; an indicator that cannot be driven has no
/// better place to report to.
#[cfg(feature = "embedded-hal")]
pub struct HalPin<P> {
    pin: P,
}

#[cfg(feature = "embedded-hal")]
impl<P> HalPin<P> {
    /// Wrap an output pin
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Release the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

#[cfg(feature = "embedded-hal")]
impl<P: embedded_hal::digital::OutputPin> OutputPin for HalPin<P> {
    fn set_high(&mut self) {
        let _ = self.pin.set_high();
    }

    fn set_low(&mut self) {
        let _ = self.pin.set_low();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Led {
        on: bool,
    }

    impl OutputPin for Led {
        fn set_high(&mut self) {
            self.on = true;
        }

        fn set_low(&mut self) {
            self.on = false;
        }
    }

    #[test]
    fn test_set_state() {
        let mut led = Led { on: false };
        led.set_state(true);
        assert!(led.on);
        led.set_state(false);
        assert!(!led.on);
    }

    #[cfg(feature = "embedded-hal")]
    struct Line {
        high: bool,
    }

    #[cfg(feature = "embedded-hal")]
    impl embedded_hal::digital::ErrorType for Line {
        type Error = core::convert::Infallible;
    }

    #[cfg(feature = "embedded-hal")]
    impl embedded_hal::digital::OutputPin for Line {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    /// Output whose driver always reports a fault
    #[cfg(feature = "embedded-hal")]
    struct BrokenLine;

    #[cfg(feature = "embedded-hal")]
    impl embedded_hal::digital::ErrorType for BrokenLine {
        type Error = embedded_hal::digital::ErrorKind;
    }

    #[cfg(feature = "embedded-hal")]
    impl embedded_hal::digital::OutputPin for BrokenLine {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }
    }

    #[cfg(feature = "embedded-hal")]
    #[test]
    fn test_hal_pin_drives_output() {
        let mut pin = HalPin::new(Line { high: false });
        pin.set_high();
        assert!(pin.pin.high);
        pin.set_state(false);
        assert!(!pin.into_inner().high);
    }

    #[cfg(feature = "embedded-hal")]
    #[test]
    fn test_hal_pin_drops_driver_errors() {
        let mut pin = HalPin::new(BrokenLine);
        pin.set_high();
        pin.set_low();
    }
}
