use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use crate::link_mode::LinkModes;
use crate::scheme::{MacScheme, Scheme};
use crate::state::{AnMode, LinkState};
use crate::{PhylinkError, PhylinkResult};

/// A MAC callback as seen by [`MockMac`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacCall {
    Config(AnMode, LinkState),
    AnRestart,
    LinkUp,
    LinkDown,
}

/// A MAC that records every callback.
///
/// Its in-band status is whatever was last passed to
/// [`set_inband`](MockMac::set_inband).
pub struct MockMac {
    name: String,
    allowed: Mutex<LinkModes>,
    inband: Mutex<LinkState>,
    fail: AtomicBool,
    calls: Mutex<Vec<MacCall>>,
    link_state_calls: AtomicUsize,
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
}

impl MockMac {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            allowed: Mutex::new(LinkModes::all()),
            inband: Mutex::new(LinkState::default()),
            fail: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            link_state_calls: AtomicUsize::new(0),
            gate: Mutex::new(None),
        }
    }

    /// Restrict the modes this MAC accepts.
    pub fn with_allowed(self, allowed: LinkModes) -> Self {
        *self.allowed.lock().unwrap() = allowed;
        self
    }

    pub fn set_inband(&self, state: LinkState) {
        *self.inband.lock().unwrap() = state;
    }

    /// Make in-band status queries fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Block the next in-band status query.
    ///
    /// The first returned channel fires when the query is entered, the query
    /// then waits until the second one is sent to (or dropped).
    pub fn hold(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some((entered_tx, release_rx));
        (entered_rx, release_tx)
    }

    /// Drain the recorded callbacks.
    pub fn take_calls(&self) -> Vec<MacCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    pub fn link_state_calls(&self) -> usize {
        self.link_state_calls.load(Ordering::SeqCst)
    }

    fn record(&self, call: MacCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Scheme for MockMac {
    fn name(&self) -> &str {
        &self.name
    }
}

impl MacScheme for MockMac {
    fn validate_support(&self, _mode: AnMode, supported: LinkModes) -> LinkModes {
        supported & *self.allowed.lock().unwrap()
    }

    fn validate_advert(
        &self,
        _mode: AnMode,
        supported: LinkModes,
        advertising: LinkModes,
    ) -> LinkModes {
        advertising & supported & *self.allowed.lock().unwrap()
    }

    fn mac_link_state(&self, state: &mut LinkState) -> PhylinkResult {
        self.link_state_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.recv();
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PhylinkError::IoFailure);
        }
        let inband = self.inband.lock().unwrap();
        state.link = inband.link;
        state.speed = inband.speed;
        state.duplex = inband.duplex;
        state.pause = inband.pause;
        state.lp_advertising = inband.lp_advertising;
        state.an_complete = inband.an_complete;
        Ok(())
    }

    fn mac_config(&self, mode: AnMode, state: &LinkState) {
        self.record(MacCall::Config(mode, state.clone()));
    }

    fn mac_an_restart(&self, _mode: AnMode) {
        self.record(MacCall::AnRestart);
    }

    fn mac_link_down(&self, _mode: AnMode) {
        self.record(MacCall::LinkDown);
    }

    fn mac_link_up(&self, _mode: AnMode) {
        self.record(MacCall::LinkUp);
    }
}
