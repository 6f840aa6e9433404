//! MII register ioctls, answered by the PHY or by the software PHY.

use numeric_enum_macro::numeric_enum;

use crate::phylink::Phylink;
use crate::state::{AnMode, LinkState};
use crate::swphy;
use crate::{PhylinkError, PhylinkResult};

pub const MII_BMCR: u16 = 0x00;
pub const MII_BMSR: u16 = 0x01;
pub const MII_PHYSID1: u16 = 0x02;
pub const MII_PHYSID2: u16 = 0x03;
pub const MII_ADVERTISE: u16 = 0x04;
pub const MII_LPA: u16 = 0x05;
pub const MII_STAT1000: u16 = 0x0a;
pub const MII_MMD_CTRL: u16 = 0x0d;
pub const MII_MMD_DATA: u16 = 0x0e;
pub const MII_ESTATUS: u16 = 0x0f;

pub const BMCR_ANENABLE: u16 = 0x1000;

pub const BMSR_LSTATUS: u16 = 0x0004;
pub const BMSR_ANEGCAPABLE: u16 = 0x0008;
pub const BMSR_ANEGCOMPLETE: u16 = 0x0020;
pub const BMSR_ESTATEN: u16 = 0x0100;
pub const BMSR_100HALF: u16 = 0x2000;
pub const BMSR_100FULL: u16 = 0x4000;

pub const LPA_10HALF: u16 = 0x0020;
pub const LPA_10FULL: u16 = 0x0040;
pub const LPA_100HALF: u16 = 0x0080;
pub const LPA_100FULL: u16 = 0x0100;
pub const LPA_PAUSE_CAP: u16 = 0x0400;
pub const LPA_PAUSE_ASYM: u16 = 0x0800;

/// 1000BASE-T partner abilities, in `MII_STAT1000`.
pub const LPA_1000HALF: u16 = 0x0400;
pub const LPA_1000FULL: u16 = 0x0800;

pub const ESTATUS_1000_THALF: u16 = 0x1000;
pub const ESTATUS_1000_TFULL: u16 = 0x2000;

numeric_enum! {
    #[repr(u32)]
    /// MII ioctl requests, numbered like `SIOCGMIIPHY` and friends.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MiiCmd {
        GetPhy = 0x8947,
        GetReg = 0x8948,
        SetReg = 0x8949,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MiiIoctlData {
    pub phy_id: u16,
    pub reg_num: u16,
    pub val_in: u16,
    pub val_out: u16,
}

impl Phylink {
    /// Emulated read for a MAC without a PHY. Only address 0 exists.
    fn mii_read(&self, phy_id: u16, reg: u16) -> PhylinkResult<u16> {
        let config = self.state.lock().link_config.clone();
        let state = match self.an_mode {
            AnMode::Phy => return Err(PhylinkError::NotSupported),
            _ if phy_id != 0 => return Ok(0xffff),
            AnMode::Fixed => self.fixed_state(&config),
            AnMode::InBandSgmii | AnMode::InBand1000BaseX => self.try_mac_state(&config)?,
        };
        Ok(emul_read(reg, &state))
    }

    fn mii_write(&self) -> PhylinkResult {
        match self.an_mode {
            AnMode::Phy => Err(PhylinkError::NotSupported),
            _ => Ok(()),
        }
    }

    /// Handle an MII register ioctl.
    pub fn mii_ioctl(&self, cmd: MiiCmd, data: &mut MiiIoctlData) -> PhylinkResult {
        let _config = self.config.lock();
        let phy = self.phydev();
        debug!(
            "{}: mii {:?} phy {} reg {:#x}",
            self.mac.name(),
            cmd,
            data.phy_id,
            data.reg_num
        );
        match (cmd, phy) {
            (MiiCmd::GetPhy, Some(phy)) => {
                data.phy_id = phy.mdio_addr();
                data.val_out = phy.mdio_read(data.phy_id, data.reg_num)?;
            }
            (MiiCmd::GetReg, Some(phy)) => {
                data.val_out = phy.mdio_read(data.phy_id, data.reg_num)?;
            }
            (MiiCmd::SetReg, Some(phy)) => {
                phy.mdio_write(data.phy_id, data.reg_num, data.val_in)?;
            }
            (MiiCmd::GetPhy, None) => {
                data.phy_id = 0;
                data.val_out = self.mii_read(data.phy_id, data.reg_num)?;
            }
            (MiiCmd::GetReg, None) => {
                data.val_out = self.mii_read(data.phy_id, data.reg_num)?;
            }
            (MiiCmd::SetReg, None) => self.mii_write()?,
        }
        Ok(())
    }
}

fn emul_read(reg: u16, state: &LinkState) -> u16 {
    let mut val = swphy::read_reg(reg, state);
    if reg == MII_BMSR {
        val &= !BMSR_ANEGCOMPLETE;
        if state.an_complete {
            val |= BMSR_ANEGCOMPLETE;
        }
    }
    val
}
