//! Link resolution, run on the manager's worker thread.

use crate::link_mode::{speed_to_str, Duplex, SPEED_UNKNOWN};
use crate::phylink::{Carrier, Phylink};
use crate::state::{resolve_flow, AnMode, LinkState, Pause};
use crate::PhylinkResult;

impl Phylink {
    /// The configured fixed link, with the link input applied.
    pub(crate) fn fixed_state(&self, config: &LinkState) -> LinkState {
        let mut state = config.clone();
        if let Some(gpio) = &self.link_gpio {
            state.link = gpio.get_value();
        }
        state
    }

    /// Ask the MAC for its in-band status.
    pub(crate) fn try_mac_state(&self, config: &LinkState) -> PhylinkResult<LinkState> {
        let mut state = LinkState {
            interface: config.interface,
            speed: SPEED_UNKNOWN,
            duplex: Duplex::Unknown,
            pause: Pause::empty(),
            advertising: config.advertising,
            lp_advertising: Default::default(),
            link: true,
            an_enabled: config.an_enabled,
            an_complete: false,
        };
        self.mac.mac_link_state(&mut state)?;
        Ok(state)
    }

    /// Like [`try_mac_state`](Self::try_mac_state), a failed query reads as
    /// link down.
    pub(crate) fn mac_state(&self, config: &LinkState) -> LinkState {
        self.try_mac_state(config).unwrap_or_else(|e| {
            warn!("{}: in-band status query failed: {:?}", self.mac.name(), e);
            LinkState {
                interface: config.interface,
                advertising: config.advertising,
                an_enabled: config.an_enabled,
                ..Default::default()
            }
        })
    }

    pub(crate) fn resolve(&self) {
        let mut state = self.state.lock();
        let link_state = if !self.disabled().is_empty() {
            LinkState {
                interface: state.link_config.interface,
                ..Default::default()
            }
        } else {
            match self.an_mode {
                AnMode::Phy if state.phydev.is_none() => LinkState {
                    interface: state.link_config.interface,
                    ..Default::default()
                },
                AnMode::Phy => {
                    let mut link_state = state.phy_state.clone();
                    resolve_flow(&state.link_config, &mut link_state);
                    link_state
                }
                AnMode::Fixed => self.fixed_state(&state.link_config),
                AnMode::InBandSgmii => {
                    let mut link_state = self.mac_state(&state.link_config);
                    if state.phydev.is_some() {
                        link_state.link &= state.phy_state.link;
                        if state.phy_state.link || !link_state.an_enabled {
                            link_state.pause = state.phy_state.pause;
                            resolve_flow(&state.link_config, &mut link_state);
                        }
                    }
                    link_state
                }
                AnMode::InBand1000BaseX => self.mac_state(&state.link_config),
            }
        };
        debug!(
            "{}: resolved {} link {}",
            self.mac.name(),
            self.an_mode,
            if link_state.link { "up" } else { "down" }
        );

        if link_state.link == state.carrier_ok {
            return;
        }
        state.carrier_ok = link_state.link;
        let carrier = if link_state.link {
            if state.phydev.is_some() {
                self.mac.mac_config(self.an_mode, &link_state);
            }
            self.mac.mac_link_up(self.an_mode);
            Carrier::On
        } else {
            self.mac.mac_link_down(self.an_mode);
            Carrier::Off
        };
        drop(state);

        self.carrier.trigger(carrier);
        match carrier {
            Carrier::On => info!(
                "{}: Link is Up - {}/{} - flow control {}",
                self.mac.name(),
                speed_to_str(link_state.speed),
                link_state.duplex,
                link_state.pause.to_str()
            ),
            Carrier::Off => info!("{}: Link is Down", self.mac.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::fwnode::PropNode;
    use crate::link_mode::*;
    use crate::mock::{MacCall, MockGpio, MockMac};
    use crate::phylink::{Phylink, PhylinkConfig};
    use crate::state::{LinkState, PhyInterface};

    fn inband_1000x(mac: Arc<MockMac>) -> Arc<Phylink> {
        let node = PropNode::new("eth0").with_str("managed", "in-band-status");
        let cfg = PhylinkConfig {
            interface: PhyInterface::Base1000X,
            port: Port::Fibre,
        };
        Phylink::new(&node, cfg, mac).unwrap()
    }

    #[test]
    fn fixed_link_follows_gpio() {
        let mac = Arc::new(MockMac::new("eth0"));
        let gpio = Arc::new(MockGpio::new(false));
        let node = PropNode::new("eth0").with_child(
            PropNode::new("fixed-link")
                .with_u32("speed", 100)
                .with_flag("full-duplex")
                .with_gpio("link-gpios", gpio.clone()),
        );
        let cfg = PhylinkConfig {
            interface: PhyInterface::Rmii,
            port: Port::Mii,
        };
        let pl = Phylink::new(&node, cfg, mac.clone()).unwrap();
        pl.start();
        pl.flush();
        assert!(!pl.get_link());

        gpio.set(true);
        pl.mac_change(true);
        pl.flush();
        assert!(pl.get_link());

        gpio.set(false);
        pl.mac_change(false);
        pl.flush();
        assert!(!pl.get_link());
        let calls = mac.take_calls();
        assert_eq!(&calls[1..], [MacCall::LinkUp, MacCall::LinkDown]);
    }

    #[test]
    fn failed_query_reads_as_down() {
        let mac = Arc::new(MockMac::new("eth0"));
        mac.set_inband(LinkState {
            link: true,
            speed: SPEED_1000,
            duplex: Duplex::Full,
            an_complete: true,
            ..Default::default()
        });
        let pl = inband_1000x(mac.clone());
        pl.start();
        pl.flush();
        assert!(pl.get_link());

        mac.set_fail(true);
        pl.mac_change(false);
        pl.flush();
        assert!(!pl.get_link());

        mac.set_fail(false);
        pl.mac_change(true);
        pl.flush();
        assert!(pl.get_link());
    }

    #[test]
    fn inband_mac_config_only_from_start() {
        let mac = Arc::new(MockMac::new("eth0"));
        mac.set_inband(LinkState {
            link: true,
            speed: SPEED_1000,
            duplex: Duplex::Full,
            ..Default::default()
        });
        let pl = inband_1000x(mac.clone());
        pl.start();
        pl.flush();
        let calls = mac.take_calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], MacCall::Config(..)));
        assert_eq!(calls[1], MacCall::LinkUp);
    }
}
