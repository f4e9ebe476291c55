//! Bus transport abstraction
//!
//! The sensor driver never touches I2C registers or pins directly. It talks to
//! a [`BusTransport`], which offers exclusive acquire/release around raw byte
//! transmit and receive, plus a presence probe. This keeps the protocol logic
//! independent of the platform bus and lets tests substitute a simulated bus.
//!
//! All addresses are 7-bit.

use core::fmt::Debug;
use core::ops::{Deref, DerefMut};

use embedded_hal::i2c::I2c;

/// Raw byte transport on a shared bus.
///
/// Callers bracket every exchange with [`acquire`](Self::acquire) and
/// [`release`](Self::release); [`BusGuard`] does this automatically.
pub trait BusTransport {
    /// Transport-level error type
    type Error: Debug;

    /// Take exclusive ownership of the bus. Blocks until the bus is available.
    fn acquire(&mut self);

    /// Give up ownership taken by [`acquire`](Self::acquire).
    fn release(&mut self);

    /// Check whether a device acknowledges `address`.
    fn probe(&mut self, address: u8, timeout_ms: u32) -> bool;

    /// Send `bytes` to `address`.
    fn transmit(&mut self, address: u8, bytes: &[u8], timeout_ms: u32) -> Result<(), Self::Error>;

    /// Fill `buffer` with bytes read from `address`.
    fn receive(&mut self, address: u8, buffer: &mut [u8], timeout_ms: u32)
    -> Result<(), Self::Error>;
}

/// Scoped bus ownership.
///
/// Acquires the bus on construction and releases it on drop, so the bus is
/// released on every exit path including early `?` returns.
pub struct BusGuard<'a, B: BusTransport> {
    bus: &'a mut B,
}

impl<'a, B: BusTransport> BusGuard<'a, B> {
    /// Acquire `bus` for the lifetime of the returned guard.
    pub fn acquire(bus: &'a mut B) -> Self {
        bus.acquire();
        Self { bus }
    }
}

impl<B: BusTransport> Deref for BusGuard<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.bus
    }
}

impl<B: BusTransport> DerefMut for BusGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.bus
    }
}

impl<B: BusTransport> Drop for BusGuard<'_, B> {
    fn drop(&mut self) {
        self.bus.release();
    }
}

/// [`BusTransport`] over an owned `embedded-hal` I2C peripheral.
///
/// Ownership of the peripheral already guarantees exclusivity, so
/// acquire/release are no-ops. Timeouts are those configured on the HAL
/// peripheral; the per-call values are ignored.
pub struct I2cTransport<I> {
    i2c: I,
}

impl<I: I2c> I2cTransport<I> {
    /// Wrap an I2C peripheral.
    pub const fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Return the wrapped peripheral.
    pub fn into_inner(self) -> I {
        self.i2c
    }
}

impl<I: I2c> BusTransport for I2cTransport<I> {
    type Error = I::Error;

    fn acquire(&mut self) {}

    fn release(&mut self) {}

    /// Probes with an empty write; a device that ACKs its address is present.
    fn probe(&mut self, address: u8, _timeout_ms: u32) -> bool {
        self.i2c.write(address, &[]).is_ok()
    }

    fn transmit(&mut self, address: u8, bytes: &[u8], _timeout_ms: u32) -> Result<(), Self::Error> {
        self.i2c.write(address, bytes)
    }

    fn receive(
        &mut self,
        address: u8,
        buffer: &mut [u8],
        _timeout_ms: u32,
    ) -> Result<(), Self::Error> {
        self.i2c.read(address, buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    #[derive(Default)]
    struct CountingBus {
        acquired: u32,
        released: u32,
    }

    impl BusTransport for CountingBus {
        type Error = ();

        fn acquire(&mut self) {
            self.acquired += 1;
        }

        fn release(&mut self) {
            self.released += 1;
        }

        fn probe(&mut self, _address: u8, _timeout_ms: u32) -> bool {
            true
        }

        fn transmit(&mut self, _address: u8, _bytes: &[u8], _timeout_ms: u32) -> Result<(), ()> {
            Err(())
        }

        fn receive(&mut self, _address: u8, _buffer: &mut [u8], _timeout_ms: u32) -> Result<(), ()> {
            Ok(())
        }
    }

    fn failing_exchange(bus: &mut CountingBus) -> Result<(), ()> {
        let mut guard = BusGuard::acquire(bus);
        guard.transmit(0x62, &[0x21, 0xB1], 50)?;
        guard.receive(0x62, &mut [0u8; 3], 50)
    }

    #[test]
    fn test_guard_releases_on_early_return() {
        let mut bus = CountingBus::default();
        assert!(failing_exchange(&mut bus).is_err());
        assert_eq!(bus.acquired, 1);
        assert_eq!(bus.released, 1);
    }

    #[test]
    fn test_i2c_transport_probe_uses_empty_write() {
        let expectations = [
            Transaction::write(0x62, vec![]),
            Transaction::write(0x63, vec![]).with_error(ErrorKind::Other),
        ];
        let mut transport = I2cTransport::new(I2cMock::new(&expectations));

        assert!(transport.probe(0x62, 20));
        assert!(!transport.probe(0x63, 20));

        transport.into_inner().done();
    }

    #[test]
    fn test_i2c_transport_transmit_and_receive() {
        let expectations = [
            Transaction::write(0x62, vec![0xE4, 0xB8]),
            Transaction::read(0x62, vec![0x80, 0x06, 0xA2]),
        ];
        let mut transport = I2cTransport::new(I2cMock::new(&expectations));

        transport.transmit(0x62, &[0xE4, 0xB8], 50).unwrap();
        let mut rx = [0u8; 3];
        transport.receive(0x62, &mut rx, 50).unwrap();
        assert_eq!(rx, [0x80, 0x06, 0xA2]);

        transport.into_inner().done();
    }
}
