//! One telemetry cycle: sample, encode, uplink
//!
//! The board hands its sensor drivers and radio to [`Telemetry`] by
//! reference; nothing here reaches for global state. A sensor that errors
//! or has nothing to report simply leaves its field out of the message.
//! Encoding cannot fail, so the only error a cycle surfaces is the
//! uplink's own.

use hal_abstractions::{BootCounter, ScalarSensor, Uplink};

use crate::fmt::Debug2Format;
use crate::measurement::{CompostTemp, Field, Measurement};
use crate::message::{self, Message};

/// Telemetry cycle configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryConfig {
    /// Application port the message is sent on
    pub port: u8,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            port: message::PORT,
        }
    }
}

/// Sensor context for one node
///
/// Both voltage rails are read through the same ADC driver type.
pub struct Telemetry<'a, V, T, C> {
    config: TelemetryConfig,
    vbat: &'a mut V,
    vbus: &'a mut V,
    compost: &'a mut T,
    boot: &'a C,
}

impl<'a, V, T, C> Telemetry<'a, V, T, C>
where
    V: ScalarSensor,
    T: ScalarSensor,
    C: BootCounter,
{
    pub fn new(
        config: TelemetryConfig,
        vbat: &'a mut V,
        vbus: &'a mut V,
        compost: &'a mut T,
        boot: &'a C,
    ) -> Self {
        Self {
            config,
            vbat,
            vbus,
            compost,
            boot,
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Sample every source into a fresh record
    pub fn poll(&mut self) -> Measurement {
        Measurement {
            vbat: sample(self.vbat, Field::Vbat),
            vbus: sample(self.vbus, Field::Vbus),
            // only the low byte goes on air
            boot: self.boot.boot_count().map(|n| n as u8),
            compost_temp: sample(self.compost, Field::CompostTemp)
                .map(|degrees| CompostTemp { degrees }),
        }
    }

    /// Sample, encode and send one message
    ///
    /// Returns the bytes handed to the uplink.
    pub fn run_cycle<U: Uplink>(&mut self, uplink: &mut U) -> Result<Message, U::Error> {
        let m = self.poll();
        let msg = message::encode(&m);

        debug!(
            "uplink {} bytes on port {}, flags {=u8:#x}",
            msg.len(),
            self.config.port,
            m.flags()
        );
        uplink.send(self.config.port, &msg)?;

        Ok(msg)
    }
}

fn sample<S: ScalarSensor>(sensor: &mut S, field: Field) -> Option<f32> {
    match sensor.sample() {
        Ok(value) => value,
        Err(e) => {
            warn!("{} sample failed: {}", field, Debug2Format(&e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal_abstractions::{ErrorKind, ErrorType, SensorError};

    struct FixedSensor(Result<Option<f32>, SensorError>);

    impl ErrorType for FixedSensor {
        type Error = SensorError;
    }

    impl ScalarSensor for FixedSensor {
        fn sample(&mut self) -> Result<Option<f32>, SensorError> {
            self.0
        }
    }

    struct Counter(Option<u32>);

    impl BootCounter for Counter {
        fn boot_count(&self) -> Option<u32> {
            self.0
        }
    }

    #[derive(Default)]
    struct RecordingUplink {
        sent: Option<(u8, Message)>,
        fail: bool,
    }

    impl ErrorType for RecordingUplink {
        type Error = ErrorKind;
    }

    impl Uplink for RecordingUplink {
        fn send(&mut self, port: u8, payload: &[u8]) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::NotConnected);
            }
            let mut copy = Message::new();
            copy.extend_from_slice(payload)
                .map_err(|_| ErrorKind::OutOfMemory)?;
            self.sent = Some((port, copy));
            Ok(())
        }
    }

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.port, 1);
    }

    #[test]
    fn test_poll_skips_missing_and_failed_sensors() {
        let mut vbat = FixedSensor(Ok(Some(3.3)));
        let mut vbus = FixedSensor(Ok(None));
        let mut probe = FixedSensor(Err(SensorError::CrcMismatch));
        let boot = Counter(Some(7));

        let mut telemetry = Telemetry::new(
            TelemetryConfig::default(),
            &mut vbat,
            &mut vbus,
            &mut probe,
            &boot,
        );
        let m = telemetry.poll();

        assert_eq!(m.vbat, Some(3.3));
        assert_eq!(m.vbus, None);
        assert_eq!(m.boot, Some(7));
        assert_eq!(m.compost_temp, None);
    }

    #[test]
    fn test_boot_count_keeps_low_byte() {
        let mut vbat = FixedSensor(Ok(None));
        let mut vbus = FixedSensor(Ok(None));
        let mut probe = FixedSensor(Ok(None));
        let boot = Counter(Some(0x1_07));

        let mut telemetry = Telemetry::new(
            TelemetryConfig::default(),
            &mut vbat,
            &mut vbus,
            &mut probe,
            &boot,
        );
        assert_eq!(telemetry.poll().boot, Some(0x07));
    }

    #[test]
    fn test_run_cycle_sends_encoded_message() {
        let mut vbat = FixedSensor(Ok(Some(3.3)));
        let mut vbus = FixedSensor(Err(SensorError::NotResponding));
        let mut probe = FixedSensor(Ok(Some(25.5)));
        let boot = Counter(Some(7));
        let mut uplink = RecordingUplink::default();

        let mut telemetry = Telemetry::new(
            TelemetryConfig::default(),
            &mut vbat,
            &mut vbus,
            &mut probe,
            &boot,
        );
        let msg = telemetry.run_cycle(&mut uplink).unwrap();

        assert_eq!(msg.as_slice(), &[0x2b, 0x0d, 0x34, 0xcd, 0x07, 0x19, 0x80]);
        let (port, sent) = uplink.sent.unwrap();
        assert_eq!(port, 1);
        assert_eq!(sent, msg);
    }

    #[test]
    fn test_run_cycle_propagates_uplink_error() {
        let mut vbat = FixedSensor(Ok(Some(3.3)));
        let mut vbus = FixedSensor(Ok(None));
        let mut probe = FixedSensor(Ok(None));
        let boot = Counter(None);
        let mut uplink = RecordingUplink {
            fail: true,
            ..Default::default()
        };

        let mut telemetry = Telemetry::new(
            TelemetryConfig { port: 2 },
            &mut vbat,
            &mut vbus,
            &mut probe,
            &boot,
        );
        assert_eq!(telemetry.config().port, 2);
        assert_eq!(
            telemetry.run_cycle(&mut uplink),
            Err(ErrorKind::NotConnected)
        );
    }
}
