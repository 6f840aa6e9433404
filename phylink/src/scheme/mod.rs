mod gpio;
mod mac;
mod phy;

pub use gpio::LinkGpio;
pub use mac::MacScheme;
pub use phy::{PhyLinkChange, PhyScheme};

pub trait Scheme: Send + Sync {
    /// Name used as the prefix of log lines.
    fn name(&self) -> &str;
}
