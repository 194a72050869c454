/// Failures reported by the I2C transaction engine.
///
/// Both variants mean the same thing to a polling caller: skip this
/// cycle and try again on the next one. The driver never retries
/// internally.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BusError {
    /// The bus never left the busy state before the transaction started.
    Busy,
    /// An expected status flag never asserted within the poll budget.
    Timeout,
}

/// Possible errors from the AHT10 driver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Aht10Error {
    /// A bus transaction failed.
    Bus(BusError),
    /// The response frame's busy bit was set; the measurement was still
    /// in progress when the frame was read.
    SensorBusy,
}

impl From<BusError> for Aht10Error {
    fn from(value: BusError) -> Self {
        Self::Bus(value)
    }
}
