//! Speed/duplex to link mode table.

use crate::link_mode::*;

/// One row of the capability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhySetting {
    pub speed: i32,
    pub duplex: Duplex,
    pub bit: LinkModes,
}

const fn setting(speed: i32, duplex: Duplex, bit: LinkModes) -> PhySetting {
    PhySetting { speed, duplex, bit }
}

/// Sorted by speed, fastest first, full duplex before half.
static SETTINGS: [PhySetting; 16] = [
    setting(SPEED_10000, Duplex::Full, LinkModes::BASE10000KR_FULL),
    setting(SPEED_10000, Duplex::Full, LinkModes::BASE10000KX4_FULL),
    setting(SPEED_10000, Duplex::Full, LinkModes::BASE10000T_FULL),
    setting(SPEED_10000, Duplex::Full, LinkModes::BASE10000SR_FULL),
    setting(SPEED_10000, Duplex::Full, LinkModes::BASE10000LR_FULL),
    setting(SPEED_5000, Duplex::Full, LinkModes::BASE5000T_FULL),
    setting(SPEED_2500, Duplex::Full, LinkModes::BASE2500T_FULL),
    setting(SPEED_2500, Duplex::Full, LinkModes::BASE2500X_FULL),
    setting(SPEED_1000, Duplex::Full, LinkModes::BASE1000KX_FULL),
    setting(SPEED_1000, Duplex::Full, LinkModes::BASE1000T_FULL),
    setting(SPEED_1000, Duplex::Half, LinkModes::BASE1000T_HALF),
    setting(SPEED_1000, Duplex::Full, LinkModes::BASE1000X_FULL),
    setting(SPEED_100, Duplex::Full, LinkModes::BASE100T_FULL),
    setting(SPEED_100, Duplex::Half, LinkModes::BASE100T_HALF),
    setting(SPEED_10, Duplex::Full, LinkModes::BASE10T_FULL),
    setting(SPEED_10, Duplex::Half, LinkModes::BASE10T_HALF),
];

/// Find the table row for `speed`/`duplex` among the modes in `mask`.
///
/// With `exact`, only a row matching both speed and duplex is returned.
/// Otherwise the first row of the same duplex that is not faster than
/// `speed` is taken, falling back to the slowest row in `mask`.
pub fn lookup(
    speed: i32,
    duplex: Duplex,
    mask: LinkModes,
    exact: bool,
) -> Option<&'static PhySetting> {
    let mut last = None;
    for p in SETTINGS.iter().filter(|p| mask.contains(p.bit)) {
        if p.duplex == duplex && (p.speed == speed || (!exact && p.speed <= speed)) {
            return Some(p);
        }
        last = Some(p);
    }
    if exact {
        None
    } else {
        last
    }
}
