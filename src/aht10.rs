use embedded_hal::delay::DelayNs;

use crate::bus::{BusRegisters, I2cBus};
use crate::error::Aht10Error;

/// 7-bit I2C address of the AHT10.
const SENSOR_ADDR: u8 = 0x38;

/// Soft reset, no parameters.
const RESET_CMD: u8 = 0xBA;
/// Initialization, followed by `0x08, 0x00`.
const INIT_CMD: u8 = 0xE1;
/// Measurement trigger, followed by `0x33, 0x00`.
const MEASURE_CMD: u8 = 0xAC;

/// Settling time after a soft reset, in milliseconds.
const RESET_SETTLE_MS: u32 = 20;
/// Settling time after the init command, in milliseconds.
const INIT_SETTLE_MS: u32 = 10;
/// Conversion time after a measurement trigger, in milliseconds.
const MEASURE_SETTLE_MS: u32 = 80;

/// Fixed-point reading pair from the AHT10.
///
/// Both fields are scaled by 10, so `234` means 23.4 °C and `450`
/// means 45.0 % RH.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Reading {
    /// Temperature in tenths of a degree Celsius.
    pub temperature_x10: i16,
    /// Relative humidity in tenths of a percent.
    pub humidity_x10: i16,
}

/// Driver for the AHT10 temperature and humidity sensor.
///
/// Holds the bus, a delay provider, and the most recently decoded
/// reading. A failed read leaves the stored reading untouched, so a
/// polling caller can keep using the previous sample.
pub struct Aht10<R, D> {
    bus: I2cBus<R>,
    delay: D,
    reading: Reading,
}

impl<R, D> Aht10<R, D>
where
    R: BusRegisters,
    D: DelayNs,
{
    /// Creates the driver with a zeroed reading. No bus traffic happens
    /// until [`begin`](Self::begin).
    ///
    /// # Arguments
    ///
    /// * `regs` - Register-level access to the I2C peripheral.
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    pub fn new(regs: R, delay: D) -> Self {
        Aht10 {
            bus: I2cBus::new(regs),
            delay,
            reading: Reading::default(),
        }
    }

    /// Brings up the bus peripheral and puts the sensor into its
    /// calibrated idle state.
    ///
    /// Issues a soft reset (20 ms settle) followed by the init command
    /// (10 ms settle). A failing init write aborts immediately. Must be
    /// called once before [`read`](Self::read).
    pub fn begin(&mut self) -> Result<(), Aht10Error> {
        self.bus.init();
        self.reading = Reading::default();

        self.reset();

        self.bus.write(SENSOR_ADDR, &[INIT_CMD, 0x08, 0x00])?;
        self.delay.delay_ms(INIT_SETTLE_MS);

        Ok(())
    }

    /// Issues a soft reset and waits out the settling time.
    ///
    /// Fire-and-forget: the sensor does not acknowledge its own reset,
    /// so a transport failure here is ignored.
    pub fn reset(&mut self) {
        let _ = self.bus.write(SENSOR_ADDR, &[RESET_CMD]);
        self.delay.delay_ms(RESET_SETTLE_MS);
    }

    /// Triggers a measurement, waits for the conversion, and decodes
    /// the 6-byte response frame.
    ///
    /// On success both stored fields are updated as a pair and the new
    /// reading is returned. On any failure, including the sensor still
    /// reporting busy after the conversion delay, the stored reading is
    /// left untouched. No retries; the caller decides whether to try
    /// again on its next poll cycle.
    pub fn read(&mut self) -> Result<Reading, Aht10Error> {
        self.bus.write(SENSOR_ADDR, &[MEASURE_CMD, 0x33, 0x00])?;
        self.delay.delay_ms(MEASURE_SETTLE_MS);

        let mut frame = [0u8; 6];
        self.bus.read(SENSOR_ADDR, &mut frame)?;

        if frame[0] & 0x80 != 0 {
            return Err(Aht10Error::SensorBusy);
        }

        self.reading = decode_frame(&frame);
        Ok(self.reading)
    }

    /// Returns the most recently decoded reading.
    pub fn reading(&self) -> Reading {
        self.reading
    }

    /// Releases the register block and the delay provider.
    pub fn release(self) -> (R, D) {
        (self.bus.release(), self.delay)
    }
}

/// Decodes a 6-byte AHT10 response frame into a fixed-point reading.
///
/// Byte 0 is the status byte and does not contribute to either value;
/// the busy bit must be checked before calling this. Bytes 1-3 carry
/// the 20-bit humidity sample, byte 3's low nibble plus bytes 4-5 the
/// 20-bit temperature sample. Scaling follows the datasheet's linear
/// transfer function, truncated to tenths:
///
/// * humidity: `raw * 1000 / 2^20`
/// * temperature: `raw * 2000 / 2^20 - 500`
pub fn decode_frame(frame: &[u8; 6]) -> Reading {
    let humidity_raw =
        (u32::from(frame[1]) << 16 | u32::from(frame[2]) << 8 | u32::from(frame[3])) >> 4;
    let temp_raw =
        u32::from(frame[3] & 0x0F) << 16 | u32::from(frame[4]) << 8 | u32::from(frame[5]);

    Reading {
        humidity_x10: (f64::from(humidity_raw) * 1000.0 / 1_048_576.0) as i16,
        temperature_x10: (f64::from(temp_raw) * 2000.0 / 1_048_576.0 - 500.0) as i16,
    }
}
