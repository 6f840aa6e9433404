//! Software PHY: clause 22 registers synthesised from a link state.

use crate::link_mode::{Duplex, SPEED_10, SPEED_100, SPEED_1000};
use crate::mii::*;
use crate::state::{LinkState, Pause};

/// Highest register number with defined contents.
const MII_REGS_NUM: u16 = 29;

#[derive(Clone, Copy)]
struct SwmiiRegs {
    bmsr: u16,
    lpa: u16,
    lpagb: u16,
    estat: u16,
}

const fn regs(bmsr: u16, lpa: u16, lpagb: u16, estat: u16) -> SwmiiRegs {
    SwmiiRegs {
        bmsr,
        lpa,
        lpagb,
        estat,
    }
}

/// Speeds outside the table advertise no abilities.
const NO_SPEED: SwmiiRegs = regs(0, 0, 0, 0);

/// Indexed by speed: 10, 100, 1000.
static SPEED: [SwmiiRegs; 3] = [
    regs(0, LPA_10FULL | LPA_10HALF, 0, 0),
    regs(
        BMSR_100FULL | BMSR_100HALF,
        LPA_100FULL | LPA_100HALF,
        0,
        0,
    ),
    regs(
        BMSR_ESTATEN,
        0,
        LPA_1000FULL | LPA_1000HALF,
        ESTATUS_1000_TFULL | ESTATUS_1000_THALF,
    ),
];

/// Indexed by duplex: half, full.
static DUPLEX: [SwmiiRegs; 2] = [
    regs(
        BMSR_ESTATEN | BMSR_100HALF,
        LPA_10HALF | LPA_100HALF,
        LPA_1000HALF,
        ESTATUS_1000_THALF,
    ),
    regs(
        BMSR_ESTATEN | BMSR_100FULL,
        LPA_10FULL | LPA_100FULL,
        LPA_1000FULL,
        ESTATUS_1000_TFULL,
    ),
];

fn speed_index(speed: i32) -> Option<usize> {
    match speed {
        SPEED_10 => Some(0),
        SPEED_100 => Some(1),
        SPEED_1000 => Some(2),
        _ => None,
    }
}

/// Read register `reg` of a PHY whose link is `state`.
pub fn read_reg(reg: u16, state: &LinkState) -> u16 {
    if reg > MII_REGS_NUM {
        return 0xffff;
    }
    let speed = speed_index(state.speed).map_or(NO_SPEED, |si| SPEED[si]);
    let duplex = DUPLEX[if state.duplex == Duplex::Half { 0 } else { 1 }];

    let mut bmsr = BMSR_ANEGCAPABLE | (speed.bmsr & duplex.bmsr);
    let estat = speed.estat & duplex.estat;
    let mut lpa = 0;
    let mut lpagb = 0;
    if state.link {
        bmsr |= BMSR_LSTATUS | BMSR_ANEGCOMPLETE;
        lpa |= speed.lpa & duplex.lpa;
        lpagb |= speed.lpagb & duplex.lpagb;
        if state.pause.contains(Pause::SYM) {
            lpa |= LPA_PAUSE_CAP;
        }
        if state.pause.contains(Pause::ASYM) {
            lpa |= LPA_PAUSE_ASYM;
        }
    }

    match reg {
        MII_BMCR => BMCR_ANENABLE,
        MII_BMSR => bmsr,
        MII_PHYSID1 | MII_PHYSID2 => 0,
        MII_LPA => lpa,
        MII_STAT1000 => lpagb,
        MII_ESTATUS => estat,
        _ => 0xffff,
    }
}
