use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Weak};

use crate::ethtool::LinkKsettings;
use crate::link_mode::{Autoneg, Duplex, LinkModes, Port, SPEED_UNKNOWN};
use crate::scheme::{PhyLinkChange, PhyScheme, Scheme};
use crate::state::Pause;
use crate::{PhylinkError, PhylinkResult};

struct PhyLink {
    up: bool,
    speed: i32,
    duplex: Duplex,
    pause: Pause,
}

/// A PHY with a 32 entry register file and a manually driven link.
pub struct MockPhy {
    name: String,
    addr: u16,
    supported: LinkModes,
    advertising: Mutex<LinkModes>,
    notify: Mutex<Option<Weak<dyn PhyLinkChange>>>,
    link: Mutex<PhyLink>,
    last_set: Mutex<Option<LinkKsettings>>,
    regs: Mutex<[u16; 32]>,
    fail_attach: AtomicBool,
    fail_set: AtomicBool,
    events: Mutex<Vec<&'static str>>,
}

impl MockPhy {
    pub fn new(name: &str, addr: u16, supported: LinkModes) -> Self {
        Self {
            name: name.to_string(),
            addr,
            supported,
            advertising: Mutex::new(supported),
            notify: Mutex::new(None),
            link: Mutex::new(PhyLink {
                up: false,
                speed: SPEED_UNKNOWN,
                duplex: Duplex::Unknown,
                pause: Pause::empty(),
            }),
            last_set: Mutex::new(None),
            regs: Mutex::new([0; 32]),
            fail_attach: AtomicBool::new(false),
            fail_set: AtomicBool::new(false),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn set_fail_attach(&self, fail: bool) {
        self.fail_attach.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_set(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    /// Report a link change to the attached manager, if any.
    pub fn link_change(&self, up: bool, speed: i32, duplex: Duplex, pause: Pause) {
        *self.link.lock().unwrap() = PhyLink {
            up,
            speed,
            duplex,
            pause,
        };
        let notify = self.notify.lock().unwrap().as_ref().and_then(Weak::upgrade);
        if let Some(notify) = notify {
            notify.phy_link_change(up, speed, duplex, pause);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.notify.lock().unwrap().is_some()
    }

    /// Settings last pushed through `ksettings_set`.
    pub fn last_set(&self) -> Option<LinkKsettings> {
        self.last_set.lock().unwrap().clone()
    }

    /// Lifecycle calls received so far, by name.
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }
}

impl Scheme for MockPhy {
    fn name(&self) -> &str {
        &self.name
    }
}

impl PhyScheme for MockPhy {
    fn attach(&self, notify: Weak<dyn PhyLinkChange>) -> PhylinkResult {
        if self.fail_attach.load(Ordering::SeqCst) {
            return Err(PhylinkError::IoFailure);
        }
        *self.notify.lock().unwrap() = Some(notify);
        self.record("attach");
        Ok(())
    }

    fn detach(&self) {
        *self.notify.lock().unwrap() = None;
        self.record("detach");
    }

    fn supported(&self) -> LinkModes {
        self.supported
    }

    fn advertising(&self) -> LinkModes {
        *self.advertising.lock().unwrap()
    }

    fn set_advertising(&self, advertising: LinkModes) {
        *self.advertising.lock().unwrap() = advertising;
    }

    fn ksettings_get(&self, kset: &mut LinkKsettings) {
        let link = self.link.lock().unwrap();
        kset.port = Port::Tp;
        kset.advertising = *self.advertising.lock().unwrap();
        kset.speed = link.speed;
        kset.duplex = link.duplex;
        kset.autoneg = Autoneg::Enable as u8;
    }

    fn ksettings_set(&self, kset: &LinkKsettings) -> PhylinkResult {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(PhylinkError::IoFailure);
        }
        *self.advertising.lock().unwrap() = kset.advertising;
        *self.last_set.lock().unwrap() = Some(kset.clone());
        Ok(())
    }

    fn start_machine(&self) {
        self.record("start_machine");
    }

    fn start(&self) {
        self.record("start");
    }

    fn stop(&self) {
        self.record("stop");
    }

    fn restart_aneg(&self) -> PhylinkResult {
        self.record("restart_aneg");
        Ok(())
    }

    fn mdio_addr(&self) -> u16 {
        self.addr
    }

    fn mdio_read(&self, phy_id: u16, reg: u16) -> PhylinkResult<u16> {
        if phy_id != self.addr || reg >= 32 {
            return Ok(0xffff);
        }
        Ok(self.regs.lock().unwrap()[reg as usize])
    }

    fn mdio_write(&self, phy_id: u16, reg: u16, val: u16) -> PhylinkResult {
        if phy_id == self.addr && reg < 32 {
            self.regs.lock().unwrap()[reg as usize] = val;
        }
        Ok(())
    }
}
