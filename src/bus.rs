use crate::error::BusError;

/// Number of times a status flag is polled before the transaction is
/// abandoned.
///
/// Bus transactions complete in microseconds, so a flag that has not
/// asserted after this many polls means a wedged bus, not a slow one.
pub const POLL_BUDGET: u32 = 10_000;

/// Register-level access to an I2C master peripheral.
///
/// The transaction engine is written against this trait instead of a
/// concrete register block so that a board crate can supply the real
/// peripheral and tests can supply a simulated one. The methods map
/// one-to-one onto the status/control/data registers of an STM32-style
/// controller (SB, ADDR, BTF, RXNE, ACK), which is also the layout the
/// CH32 family uses.
pub trait BusRegisters {
    /// One-time peripheral bring-up: clock enable, peripheral reset
    /// pulse, pin configuration, bus clock-rate programming, enable.
    fn bring_up(&mut self);

    /// Whether a transfer is currently in progress on the bus.
    fn bus_busy(&mut self) -> bool;

    /// Request a start condition.
    fn send_start(&mut self);

    /// Whether the start condition has been generated.
    fn start_sent(&mut self) -> bool;

    /// Load one byte (address or payload) into the data register.
    fn write_data(&mut self, byte: u8);

    /// Whether the slave acknowledged the address byte.
    fn address_acked(&mut self) -> bool;

    /// Clear the address-acknowledged flag before the data phase.
    fn clear_address_flag(&mut self);

    /// Whether the last payload byte has finished transferring.
    fn transfer_complete(&mut self) -> bool;

    /// Enable or disable acknowledgment of the next received byte.
    fn set_ack(&mut self, enabled: bool);

    /// Whether a received byte is waiting in the data register.
    fn rx_ready(&mut self) -> bool;

    /// Take the received byte out of the data register.
    fn read_data(&mut self) -> u8;

    /// Request a stop condition.
    fn send_stop(&mut self);
}

impl<T: BusRegisters + ?Sized> BusRegisters for &mut T {
    fn bring_up(&mut self) {
        (**self).bring_up()
    }

    fn bus_busy(&mut self) -> bool {
        (**self).bus_busy()
    }

    fn send_start(&mut self) {
        (**self).send_start()
    }

    fn start_sent(&mut self) -> bool {
        (**self).start_sent()
    }

    fn write_data(&mut self, byte: u8) {
        (**self).write_data(byte)
    }

    fn address_acked(&mut self) -> bool {
        (**self).address_acked()
    }

    fn clear_address_flag(&mut self) {
        (**self).clear_address_flag()
    }

    fn transfer_complete(&mut self) -> bool {
        (**self).transfer_complete()
    }

    fn set_ack(&mut self, enabled: bool) {
        (**self).set_ack(enabled)
    }

    fn rx_ready(&mut self) -> bool {
        (**self).rx_ready()
    }

    fn read_data(&mut self) -> u8 {
        (**self).read_data()
    }

    fn send_stop(&mut self) {
        (**self).send_stop()
    }
}

/// Blocking I2C master built on a [`BusRegisters`] implementation.
///
/// Every wait point is bounded by [`POLL_BUDGET`]; a single stuck flag
/// aborts the whole transaction rather than hanging the caller or
/// reporting a partial transfer as success.
pub struct I2cBus<R> {
    regs: R,
}

impl<R> I2cBus<R>
where
    R: BusRegisters,
{
    /// Wraps a register block. No bus traffic until [`init`](Self::init)
    /// or a transaction is issued.
    pub fn new(regs: R) -> Self {
        I2cBus { regs }
    }

    /// Performs the one-time hardware bring-up.
    pub fn init(&mut self) {
        self.regs.bring_up();
    }

    /// Writes `bytes` to the slave at the 7-bit address `addr`.
    ///
    /// Waits for the bus to go idle, then drives start, address with
    /// the write bit, each payload byte, and stop. Each step is
    /// individually timeout-guarded.
    pub fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), BusError> {
        poll_until(&mut self.regs, |r| !r.bus_busy()).map_err(|_| BusError::Busy)?;

        self.regs.send_start();
        poll_until(&mut self.regs, |r| r.start_sent())?;

        self.regs.write_data(addr << 1);
        poll_until(&mut self.regs, |r| r.address_acked())?;
        self.regs.clear_address_flag();

        for &byte in bytes {
            self.regs.write_data(byte);
            poll_until(&mut self.regs, |r| r.transfer_complete())?;
        }

        self.regs.send_stop();
        Ok(())
    }

    /// Reads `buf.len()` bytes from the slave at the 7-bit address
    /// `addr`.
    ///
    /// The last byte is NACKed to signal end-of-transfer to the slave;
    /// every earlier byte is ACKed. Same per-step timeout policy as
    /// [`write`](Self::write).
    pub fn read(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.regs.send_start();
        poll_until(&mut self.regs, |r| r.start_sent())?;

        self.regs.write_data((addr << 1) | 1);
        poll_until(&mut self.regs, |r| r.address_acked())?;
        self.regs.clear_address_flag();

        let last = buf.len().saturating_sub(1);
        for (i, slot) in buf.iter_mut().enumerate() {
            self.regs.set_ack(i != last);
            poll_until(&mut self.regs, |r| r.rx_ready())?;
            *slot = self.regs.read_data();
        }

        self.regs.send_stop();
        Ok(())
    }

    /// Releases the underlying register block.
    pub fn release(self) -> R {
        self.regs
    }
}

/// Polls `ready` until it returns true or [`POLL_BUDGET`] iterations
/// elapse.
fn poll_until<R, F>(regs: &mut R, mut ready: F) -> Result<(), BusError>
where
    R: BusRegisters,
    F: FnMut(&mut R) -> bool,
{
    for _ in 0..POLL_BUDGET {
        if ready(regs) {
            return Ok(());
        }
    }
    Err(BusError::Timeout)
}

#[cfg(test)]
pub(crate) mod sim {
    use super::BusRegisters;

    /// Status flag a simulated peripheral holds deasserted forever.
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub enum Stuck {
        /// Bus never reports idle.
        Busy,
        /// Start condition never completes.
        Start,
        /// Address is never acknowledged.
        Addr,
        /// Byte transfer never finishes.
        Transfer,
        /// Received byte never arrives.
        Rx,
    }

    /// Well-behaved simulated bus peripheral: every flag asserts as soon
    /// as the corresponding action happens, writes are recorded per
    /// transaction, and reads are served from `rx_data`. Setting `stuck`
    /// pins one flag low to model a wedged bus, optionally only after
    /// `stuck_after_stops` transactions have completed.
    #[derive(Default)]
    pub struct SimRegs {
        pub stuck: Option<Stuck>,
        pub stuck_after_stops: usize,
        pub brought_up: bool,
        /// Raw address bytes seen (read/write bit included).
        pub addresses: Vec<u8>,
        /// Payloads of completed write transactions.
        pub writes: Vec<Vec<u8>>,
        /// Bytes served to read transactions, in order.
        pub rx_data: Vec<u8>,
        /// ACK settings in the order the master applied them.
        pub ack_trace: Vec<bool>,
        pub stops: usize,
        rx_pos: usize,
        current: Vec<u8>,
        in_addr_phase: bool,
        start_flag: bool,
        addr_flag: bool,
        transfer_flag: bool,
    }

    impl SimRegs {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_rx(bytes: &[u8]) -> Self {
            SimRegs {
                rx_data: bytes.to_vec(),
                ..Self::default()
            }
        }

        fn is_stuck(&self, flag: Stuck) -> bool {
            self.stuck == Some(flag) && self.stops >= self.stuck_after_stops
        }
    }

    impl BusRegisters for SimRegs {
        fn bring_up(&mut self) {
            self.brought_up = true;
        }

        fn bus_busy(&mut self) -> bool {
            self.is_stuck(Stuck::Busy)
        }

        fn send_start(&mut self) {
            self.start_flag = true;
            self.in_addr_phase = true;
        }

        fn start_sent(&mut self) -> bool {
            !self.is_stuck(Stuck::Start) && self.start_flag
        }

        fn write_data(&mut self, byte: u8) {
            if self.in_addr_phase {
                self.addresses.push(byte);
                self.addr_flag = true;
            } else {
                self.current.push(byte);
                self.transfer_flag = true;
            }
        }

        fn address_acked(&mut self) -> bool {
            !self.is_stuck(Stuck::Addr) && self.addr_flag
        }

        fn clear_address_flag(&mut self) {
            self.addr_flag = false;
            self.in_addr_phase = false;
        }

        fn transfer_complete(&mut self) -> bool {
            !self.is_stuck(Stuck::Transfer) && self.transfer_flag
        }

        fn set_ack(&mut self, enabled: bool) {
            self.ack_trace.push(enabled);
        }

        fn rx_ready(&mut self) -> bool {
            !self.is_stuck(Stuck::Rx)
        }

        fn read_data(&mut self) -> u8 {
            let byte = self.rx_data[self.rx_pos];
            self.rx_pos += 1;
            byte
        }

        fn send_stop(&mut self) {
            self.stops += 1;
            self.start_flag = false;
            if self.addresses.last().is_some_and(|a| a & 1 == 0) {
                self.writes.push(core::mem::take(&mut self.current));
            }
        }
    }
}
