//! Ethtool link modes, duplex, port and autoneg encodings.

use core::fmt;

use bitflags::bitflags;
use numeric_enum_macro::numeric_enum;

pub const SPEED_10: i32 = 10;
pub const SPEED_100: i32 = 100;
pub const SPEED_1000: i32 = 1000;
pub const SPEED_2500: i32 = 2500;
pub const SPEED_5000: i32 = 5000;
pub const SPEED_10000: i32 = 10000;
pub const SPEED_UNKNOWN: i32 = -1;

bitflags! {
    /// A set of link modes. Bit positions follow the ethtool numbering.
    #[derive(Default)]
    pub struct LinkModes: u64 {
        const BASE10T_HALF = 1 << 0;
        const BASE10T_FULL = 1 << 1;
        const BASE100T_HALF = 1 << 2;
        const BASE100T_FULL = 1 << 3;
        const BASE1000T_HALF = 1 << 4;
        const BASE1000T_FULL = 1 << 5;
        const AUTONEG = 1 << 6;
        const TP = 1 << 7;
        const AUI = 1 << 8;
        const MII = 1 << 9;
        const FIBRE = 1 << 10;
        const BNC = 1 << 11;
        const BASE10000T_FULL = 1 << 12;
        const PAUSE = 1 << 13;
        const ASYM_PAUSE = 1 << 14;
        const BASE2500X_FULL = 1 << 15;
        const BACKPLANE = 1 << 16;
        const BASE1000KX_FULL = 1 << 17;
        const BASE10000KX4_FULL = 1 << 18;
        const BASE10000KR_FULL = 1 << 19;
        const BASE1000X_FULL = 1 << 41;
        const BASE10000SR_FULL = 1 << 43;
        const BASE10000LR_FULL = 1 << 44;
        const BASE2500T_FULL = 1 << 47;
        const BASE5000T_FULL = 1 << 48;
    }
}

impl LinkModes {
    /// Port (physical medium) bits.
    pub fn ports() -> Self {
        Self::TP | Self::AUI | Self::MII | Self::FIBRE | Self::BNC | Self::BACKPLANE
    }

    /// Bits that do not describe a speed/duplex combination.
    pub fn non_link_modes() -> Self {
        Self::ports() | Self::PAUSE | Self::ASYM_PAUSE | Self::AUTONEG
    }

    /// The 10/100/1000BASE-T modes carried over SGMII.
    pub fn ethernet_basic() -> Self {
        Self::BASE10T_HALF
            | Self::BASE10T_FULL
            | Self::BASE100T_HALF
            | Self::BASE100T_FULL
            | Self::BASE1000T_HALF
            | Self::BASE1000T_FULL
    }

    /// Only the speed/duplex modes of this set.
    pub fn link_modes(self) -> Self {
        self - Self::non_link_modes()
    }

    /// Keep the port bits of `self`, take every other bit from `other`.
    pub fn merge(self, other: Self) -> Self {
        (self & Self::ports()) | (other - Self::ports())
    }
}

numeric_enum! {
    #[repr(u8)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Duplex {
        Half = 0x00,
        Full = 0x01,
        Unknown = 0xff,
    }
}

impl Default for Duplex {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for Duplex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Half => "Half",
            Self::Full => "Full",
            Self::Unknown => "Unknown",
        })
    }
}

numeric_enum! {
    #[repr(u8)]
    /// Autonegotiation request as passed by management tools.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Autoneg {
        Disable = 0x00,
        Enable = 0x01,
    }
}

numeric_enum! {
    #[repr(u8)]
    /// Connector type reported to management tools.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Port {
        Tp = 0x00,
        Aui = 0x01,
        Bnc = 0x02,
        Mii = 0x03,
        Fibre = 0x04,
        Other = 0xff,
    }
}

impl Default for Port {
    fn default() -> Self {
        Self::Mii
    }
}

impl Port {
    /// The link mode bit describing this port.
    pub fn link_mode(self) -> LinkModes {
        match self {
            Self::Tp => LinkModes::TP,
            Self::Aui => LinkModes::AUI,
            Self::Bnc => LinkModes::BNC,
            Self::Mii => LinkModes::MII,
            Self::Fibre => LinkModes::FIBRE,
            Self::Other => LinkModes::empty(),
        }
    }
}

pub fn speed_to_str(speed: i32) -> &'static str {
    match speed {
        SPEED_10 => "10Mbps",
        SPEED_100 => "100Mbps",
        SPEED_1000 => "1Gbps",
        SPEED_2500 => "2.5Gbps",
        SPEED_5000 => "5Gbps",
        SPEED_10000 => "10Gbps",
        SPEED_UNKNOWN => "Unknown",
        _ => "Unsupported (update speed_to_str)",
    }
}
