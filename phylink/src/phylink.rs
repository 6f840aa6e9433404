use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use spin::Mutex;

use crate::fixed_link;
use crate::fwnode::FwNode;
use crate::link_mode::{Duplex, LinkModes, Port};
use crate::scheme::{LinkGpio, MacScheme, PhyLinkChange, PhyScheme};
use crate::settings;
use crate::state::{resolve_flow, AnMode, DisableReason, LinkState, Pause, PhyInterface};
use crate::utils::{EventHandler, EventListener, Work};
use crate::{PhylinkError, PhylinkResult};

/// Properties that may hold the PHY phandle, in lookup order.
const PHY_HANDLE_PROPS: [&str; 3] = ["phy-handle", "phy", "phy-device"];

/// Board level configuration that does not come from the firmware node.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhylinkConfig {
    pub interface: PhyInterface,
    /// Connector type reported when no PHY is attached.
    pub port: Port,
}

/// Carrier transitions, delivered to [`Phylink::subscribe_carrier`] handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    On,
    Off,
}

pub(crate) struct ConfigInner {
    pub supported: LinkModes,
    pub link_port: Port,
}

pub(crate) struct StateInner {
    /// What management asked for; also the whole state of a fixed link.
    pub link_config: LinkState,
    /// Last snapshot reported by the PHY.
    pub phy_state: LinkState,
    pub phydev: Option<Arc<dyn PhyScheme>>,
    /// Last link value handed to the MAC.
    pub carrier_ok: bool,
}

/// Link manager of one MAC.
///
/// Lock order is `config` then `state`. The resolver only takes `state`.
pub struct Phylink {
    pub(crate) mac: Arc<dyn MacScheme>,
    pub(crate) an_mode: AnMode,
    pub(crate) link_gpio: Option<Arc<dyn LinkGpio>>,
    /// [`DisableReason`] bits. Written under `state`.
    pub(crate) disable_state: AtomicU8,
    pub(crate) config: Mutex<ConfigInner>,
    pub(crate) state: Mutex<StateInner>,
    pub(crate) worker: Work,
    pub(crate) carrier: EventListener<Carrier>,
}

fn parse_mode<N: FwNode>(node: &N, interface: PhyInterface, name: &str) -> PhylinkResult<AnMode> {
    let fixed = node.child("fixed-link").is_some() || node.has_prop("fixed-link");
    let inband = node.prop_str("managed") == Some("in-band-status");
    match (fixed, inband) {
        (true, true) => {
            warn!("{}: can't use both fixed-link and in-band-status", name);
            Err(PhylinkError::InvalidConfig)
        }
        (true, false) => Ok(AnMode::Fixed),
        (false, true) => match interface {
            PhyInterface::Sgmii => Ok(AnMode::InBandSgmii),
            i if i.is_8023z() => Ok(AnMode::InBand1000BaseX),
            i => {
                warn!("{}: in-band status not supported on {} interface", name, i);
                Err(PhylinkError::InvalidConfig)
            }
        },
        (false, false) => Ok(AnMode::Phy),
    }
}

impl Phylink {
    /// Create the manager for `mac`, with its link source described by
    /// `node`. The link stays down until [`start`](Self::start).
    pub fn new<N: FwNode>(
        node: &N,
        config: PhylinkConfig,
        mac: Arc<dyn MacScheme>,
    ) -> PhylinkResult<Arc<Self>> {
        let an_mode = parse_mode(node, config.interface, mac.name())?;
        let mut link_config = LinkState {
            interface: config.interface,
            pause: Pause::AN,
            ..Default::default()
        };
        let mut supported = config.port.link_mode() | LinkModes::MII;
        let mut link_gpio = None;

        match an_mode {
            AnMode::Fixed => {
                let fixed = fixed_link::parse(node)?;
                let mask = mac.validate_support(an_mode, LinkModes::all());
                match settings::lookup(fixed.state.speed, fixed.state.duplex, mask, true) {
                    Some(s) => supported |= s.bit,
                    None => warn!(
                        "{}: fixed link {} duplex {}Mbps not recognised",
                        mac.name(),
                        if fixed.state.duplex == Duplex::Full {
                            "full"
                        } else {
                            "half"
                        },
                        fixed.state.speed
                    ),
                }
                supported |= LinkModes::PAUSE | LinkModes::ASYM_PAUSE;
                link_config.speed = fixed.state.speed;
                link_config.duplex = fixed.state.duplex;
                link_config.pause |= fixed.state.pause;
                link_config.link = true;
                link_config.an_complete = true;
                link_gpio = fixed.gpio;
            }
            AnMode::InBandSgmii | AnMode::InBand1000BaseX => {
                supported |= LinkModes::AUTONEG | LinkModes::PAUSE | LinkModes::ASYM_PAUSE;
                supported |= config.interface.inband_link_modes().unwrap_or_default();
                link_config.an_enabled = true;
            }
            AnMode::Phy => {}
        }

        let supported = mac.validate_support(an_mode, supported);
        if an_mode.is_inband() && supported.link_modes().is_empty() {
            warn!(
                "{}: failed to validate link configuration for in-band status",
                mac.name()
            );
            return Err(PhylinkError::UnsupportedCapabilitySet);
        }
        link_config.advertising = mac.validate_advert(an_mode, supported, supported);
        info!(
            "{}: {} link mode, {} interface",
            mac.name(),
            an_mode,
            config.interface
        );

        let pl = Arc::new(Phylink {
            mac,
            an_mode,
            link_gpio,
            disable_state: AtomicU8::new(DisableReason::STOPPED.bits()),
            config: Mutex::new(ConfigInner {
                supported,
                link_port: config.port,
            }),
            state: Mutex::new(StateInner {
                link_config,
                phy_state: LinkState::default(),
                phydev: None,
                carrier_ok: false,
            }),
            worker: Work::new(),
            carrier: EventListener::new(),
        });
        let weak = Arc::downgrade(&pl);
        pl.worker
            .spawn(format!("phylink-{}", pl.mac.name()), move || {
                if let Some(pl) = weak.upgrade() {
                    pl.resolve();
                }
            })?;
        Ok(pl)
    }

    /// Tear down. Any queued resolution is cancelled and the worker joined.
    pub fn destroy(self: Arc<Self>) {
        if self.state.lock().phydev.is_some() {
            warn!("{}: destroyed with a PHY still attached", self.mac.name());
        }
        self.worker.cancel();
    }

    pub fn an_mode(&self) -> AnMode {
        self.an_mode
    }

    pub fn supported(&self) -> LinkModes {
        self.config.lock().supported
    }

    /// Attach `phy` as the link source.
    pub fn connect_phy(self: &Arc<Self>, phy: Arc<dyn PhyScheme>) -> PhylinkResult {
        let mut config = self.config.lock();
        if self.an_mode == AnMode::Fixed || self.an_mode == AnMode::InBand1000BaseX {
            return Err(PhylinkError::InvalidRequest);
        }
        if self.state.lock().phydev.is_some() {
            return Err(PhylinkError::InvalidRequest);
        }

        let supported = self.mac.validate_support(self.an_mode, phy.supported());
        if supported.link_modes().is_empty() {
            warn!(
                "{}: validation of {} with support {:?} failed",
                self.mac.name(),
                phy.name(),
                phy.supported()
            );
            return Err(PhylinkError::UnsupportedCapabilitySet);
        }
        let advertising =
            self.mac
                .validate_advert(self.an_mode, supported, phy.advertising() & supported);

        let notify: Weak<Phylink> = Arc::downgrade(self);
        let notify: Weak<dyn PhyLinkChange> = notify;
        phy.attach(notify)?;

        {
            let mut state = self.state.lock();
            let interface = state.link_config.interface;
            state.phydev = Some(phy.clone());
            state.phy_state = LinkState {
                interface,
                ..Default::default()
            };
            state.link_config.advertising = advertising;
        }
        config.supported = supported;
        drop(config);

        info!(
            "{}: PHY {} attached at address {}",
            self.mac.name(),
            phy.name(),
            phy.mdio_addr()
        );
        phy.set_advertising(advertising);
        phy.start_machine();
        Ok(())
    }

    /// Attach the PHY referenced by `node`'s phandle, resolved by `lookup`.
    ///
    /// Fixed and 802.3z links have no PHY, so this is a no-op for them.
    pub fn connect_fwnode<N, F>(self: &Arc<Self>, node: &N, lookup: F) -> PhylinkResult
    where
        N: FwNode,
        F: FnOnce(u32) -> Option<Arc<dyn PhyScheme>>,
    {
        if self.an_mode == AnMode::Fixed || self.an_mode == AnMode::InBand1000BaseX {
            return Ok(());
        }
        let handle = PHY_HANDLE_PROPS
            .iter()
            .find_map(|prop| node.prop_u32(prop));
        let handle = match handle {
            Some(handle) => handle,
            None if self.an_mode == AnMode::Phy => {
                warn!("{}: no PHY handle in {}", self.mac.name(), node.name());
                return Err(PhylinkError::DeviceNotFound);
            }
            None => return Ok(()),
        };
        let phy = lookup(handle).ok_or_else(|| {
            warn!("{}: PHY handle {:#x} not found", self.mac.name(), handle);
            PhylinkError::DeviceNotFound
        })?;
        self.connect_phy(phy)
    }

    /// Detach the current PHY, if any.
    ///
    /// Returns once no resolution can observe the PHY any more.
    pub fn disconnect_phy(&self) {
        let _config = self.config.lock();
        let phy = {
            let mut state = self.state.lock();
            state.phy_state.link = false;
            state.phydev.take()
        };
        if let Some(phy) = phy {
            self.worker.flush();
            phy.detach();
            info!("{}: PHY {} detached", self.mac.name(), phy.name());
        }
        self.run_resolve();
    }

    /// Program the MAC and let the link come up.
    pub fn start(&self) {
        let _config = self.config.lock();
        let phy = {
            let mut state = self.state.lock();
            info!(
                "{}: configuring for {}/{} link mode",
                self.mac.name(),
                self.an_mode,
                state.link_config.interface
            );
            let cfg = state.link_config.clone();
            resolve_flow(&cfg, &mut state.link_config);
            self.mac.mac_config(self.an_mode, &state.link_config);
            self.clear_disable(DisableReason::STOPPED);
            state.phydev.clone()
        };
        self.run_resolve();
        if let Some(phy) = phy {
            phy.start();
        }
    }

    /// Force the link down. On return the MAC has seen its last link change.
    pub fn stop(&self) {
        let _config = self.config.lock();
        if let Some(phy) = self.phydev() {
            phy.stop();
        }
        {
            let _state = self.state.lock();
            self.set_disable(DisableReason::STOPPED);
        }
        self.worker.queue();
        self.worker.flush();
    }

    /// Notification from the MAC that its in-band status changed.
    pub fn mac_change(&self, up: bool) {
        debug!(
            "{}: mac link {}",
            self.mac.name(),
            if up { "up" } else { "down" }
        );
        self.run_resolve();
    }

    pub fn subscribe_carrier(&self, handler: EventHandler<Carrier>, once: bool) {
        self.carrier.subscribe(handler, once);
    }

    pub(crate) fn disabled(&self) -> DisableReason {
        DisableReason::from_bits_truncate(self.disable_state.load(Ordering::Acquire))
    }

    fn set_disable(&self, reason: DisableReason) {
        self.disable_state.fetch_or(reason.bits(), Ordering::AcqRel);
    }

    fn clear_disable(&self, reason: DisableReason) {
        self.disable_state.fetch_and(!reason.bits(), Ordering::AcqRel);
    }

    /// Queue a resolution unless the link is held down.
    pub(crate) fn run_resolve(&self) {
        if self.disabled().is_empty() {
            self.worker.queue();
        }
    }

    pub(crate) fn phydev(&self) -> Option<Arc<dyn PhyScheme>> {
        self.state.lock().phydev.clone()
    }

    #[cfg(test)]
    pub(crate) fn flush(&self) {
        self.worker.flush();
    }
}

impl PhyLinkChange for Phylink {
    fn phy_link_change(&self, up: bool, speed: i32, duplex: Duplex, pause: Pause) {
        {
            let mut state = self.state.lock();
            // Late report from a PHY that is being detached.
            if state.phydev.is_none() {
                return;
            }
            state.phy_state.link = up;
            state.phy_state.speed = speed;
            state.phy_state.duplex = duplex;
            state.phy_state.pause = pause;
        }
        self.run_resolve();
        debug!(
            "{}: phy link {} {}/{}",
            self.mac.name(),
            if up { "up" } else { "down" },
            speed,
            duplex
        );
    }
}

impl Drop for Phylink {
    fn drop(&mut self) {
        self.worker.cancel();
    }
}
