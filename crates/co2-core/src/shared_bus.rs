//! Transport over an I2C bus shared between several devices
//!
//! The bus peripheral lives behind an `embassy_sync` mutex. Each device gets
//! its own [`SharedI2cBus`] handle; [`BusTransport::acquire`] takes the lock
//! and keeps it until [`BusTransport::release`], so a command and its
//! response are never interleaved with another device's traffic.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal::i2c::I2c;

use crate::bus::BusTransport;

/// Mutex type the shared bus lives behind
pub type SharedBusMutex<T> = Mutex<CriticalSectionRawMutex, T>;

/// [`BusTransport`] handle onto a mutex-protected I2C bus.
///
/// # Example
///
/// ```
/// use co2_core::bus::BusTransport;
/// use co2_core::shared_bus::{SharedBusMutex, SharedI2cBus};
/// # use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
/// # let i2c = Mock::new(&[Transaction::write(0x62, vec![])]);
///
/// let bus = SharedBusMutex::new(i2c);
/// let mut sensor_bus = SharedI2cBus::new(&bus);
/// assert!(sensor_bus.probe(0x62, 20));
/// # drop(sensor_bus);
/// # bus.into_inner().done();
/// ```
pub struct SharedI2cBus<'a, T> {
    bus: &'a SharedBusMutex<T>,
    guard: Option<MutexGuard<'a, CriticalSectionRawMutex, T>>,
}

impl<'a, T> SharedI2cBus<'a, T> {
    /// Create a handle onto `bus`. The lock is not taken until
    /// [`BusTransport::acquire`].
    #[inline]
    pub const fn new(bus: &'a SharedBusMutex<T>) -> Self {
        Self { bus, guard: None }
    }

    /// Whether this handle currently holds the bus lock
    pub fn is_acquired(&self) -> bool {
        self.guard.is_some()
    }

    /// Spin until the lock is free. Blocking is expected on this bus.
    fn lock(bus: &'a SharedBusMutex<T>) -> MutexGuard<'a, CriticalSectionRawMutex, T> {
        loop {
            if let Ok(guard) = bus.try_lock() {
                return guard;
            }
            core::hint::spin_loop();
        }
    }

    /// Run `f` on the bus, locking it for the call if not already acquired.
    fn with_bus<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        if let Some(guard) = self.guard.as_mut() {
            return f(&mut **guard);
        }
        let mut guard = Self::lock(self.bus);
        f(&mut *guard)
    }
}

impl<T: I2c> BusTransport for SharedI2cBus<'_, T> {
    type Error = T::Error;

    fn acquire(&mut self) {
        if self.guard.is_none() {
            self.guard = Some(Self::lock(self.bus));
        }
    }

    fn release(&mut self) {
        self.guard = None;
    }

    fn probe(&mut self, address: u8, _timeout_ms: u32) -> bool {
        self.with_bus(|i2c| i2c.write(address, &[]).is_ok())
    }

    fn transmit(&mut self, address: u8, bytes: &[u8], _timeout_ms: u32) -> Result<(), Self::Error> {
        self.with_bus(|i2c| i2c.write(address, bytes))
    }

    fn receive(
        &mut self,
        address: u8,
        buffer: &mut [u8],
        _timeout_ms: u32,
    ) -> Result<(), Self::Error> {
        self.with_bus(|i2c| i2c.read(address, buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusGuard;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    #[test]
    fn test_acquire_holds_lock_until_release() {
        let bus = SharedBusMutex::new(I2cMock::new(&[]));
        let mut handle = SharedI2cBus::new(&bus);

        handle.acquire();
        assert!(handle.is_acquired());
        assert!(bus.try_lock().is_err());

        // Acquiring twice keeps the single lock
        handle.acquire();
        handle.release();
        assert!(!handle.is_acquired());
        assert!(bus.try_lock().is_ok());

        drop(handle);
        bus.into_inner().done();
    }

    #[test]
    fn test_guarded_exchange_through_shared_handle() {
        let expectations = [
            Transaction::write(0x62, vec![0xE4, 0xB8]),
            Transaction::read(0x62, vec![0x80, 0x06, 0xA2]),
        ];
        let bus = SharedBusMutex::new(I2cMock::new(&expectations));
        let mut handle = SharedI2cBus::new(&bus);

        {
            let mut guard = BusGuard::acquire(&mut handle);
            guard.transmit(0x62, &[0xE4, 0xB8], 50).unwrap();
            let mut rx = [0u8; 3];
            guard.receive(0x62, &mut rx, 50).unwrap();
            assert_eq!(rx, [0x80, 0x06, 0xA2]);
        }
        assert!(!handle.is_acquired());

        drop(handle);
        bus.into_inner().done();
    }

    #[test]
    fn test_unguarded_calls_lock_temporarily() {
        let expectations = [
            Transaction::write(0x62, vec![]),
            Transaction::write(0x10, vec![]).with_error(ErrorKind::Other),
        ];
        let bus = SharedBusMutex::new(I2cMock::new(&expectations));
        let mut first = SharedI2cBus::new(&bus);
        let mut second = SharedI2cBus::new(&bus);

        assert!(first.probe(0x62, 20));
        assert!(!second.probe(0x10, 20));
        assert!(bus.try_lock().is_ok());

        drop((first, second));
        bus.into_inner().done();
    }
}
