//! Mock MAC, PHY and link input for tests and host-side bring-up.

mod gpio;
mod mac;
mod phy;

pub use gpio::MockGpio;
pub use mac::{MacCall, MockMac};
pub use phy::MockPhy;

#[cfg(test)]
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
