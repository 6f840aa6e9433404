use super::Scheme;
use crate::link_mode::LinkModes;
use crate::state::{AnMode, LinkState};
use crate::PhylinkResult;

/// Callbacks a MAC driver provides to the link manager.
///
/// All of them are called synchronously, either from the resolver thread or
/// from the management call that caused them, and must not block for long.
pub trait MacScheme: Scheme {
    /// Strip modes the MAC cannot support in `mode` from `supported`.
    fn validate_support(&self, mode: AnMode, supported: LinkModes) -> LinkModes;

    /// Trim `advertising` down to a combination the MAC can advertise.
    fn validate_advert(
        &self,
        mode: AnMode,
        supported: LinkModes,
        advertising: LinkModes,
    ) -> LinkModes;

    /// Fill in the link parameters decoded from in-band status.
    ///
    /// `state` arrives with the configured advertisement and `link` set; the
    /// MAC updates speed, duplex, pause, `lp_advertising`, `an_complete` and
    /// `link`.
    fn mac_link_state(&self, state: &mut LinkState) -> PhylinkResult;

    /// Program the MAC for `state`.
    fn mac_config(&self, mode: AnMode, state: &LinkState);

    /// Restart in-band negotiation.
    fn mac_an_restart(&self, mode: AnMode);

    fn mac_link_down(&self, mode: AnMode);

    fn mac_link_up(&self, mode: AnMode);
}
