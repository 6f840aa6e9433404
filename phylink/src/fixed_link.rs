//! Parse a `fixed-link` description into a static link state.

use std::sync::Arc;

use crate::fwnode::FwNode;
use crate::link_mode::{Duplex, SPEED_1000};
use crate::scheme::LinkGpio;
use crate::state::{LinkState, Pause};
use crate::{PhylinkError, PhylinkResult};

/// A link whose parameters never change.
pub struct FixedLink {
    pub state: LinkState,
    /// Overrides `state.link` when present.
    pub gpio: Option<Arc<dyn LinkGpio>>,
}

fn speed_from_cell<N: FwNode>(node: &N, speed: u32) -> PhylinkResult<i32> {
    i32::try_from(speed).map_err(|_| {
        warn!("{}: fixed-link speed {} out of range", node.name(), speed);
        PhylinkError::InvalidConfig
    })
}

/// Read the `fixed-link` child node, or the legacy five cell property
/// `<link full-duplex speed pause asym-pause>`.
pub fn parse<N: FwNode>(node: &N) -> PhylinkResult<FixedLink> {
    let mut state = LinkState {
        link: true,
        an_complete: true,
        ..Default::default()
    };
    let mut gpio = None;

    if let Some(fixed) = node.child("fixed-link") {
        let speed = fixed.prop_u32("speed").ok_or_else(|| {
            warn!("{}: fixed-link node without speed", node.name());
            PhylinkError::InvalidConfig
        })?;
        state.speed = speed_from_cell(node, speed)?;
        state.duplex = if fixed.has_prop("full-duplex") {
            Duplex::Full
        } else {
            Duplex::Half
        };
        if fixed.has_prop("pause") {
            state.pause |= Pause::SYM;
        }
        if fixed.has_prop("asym-pause") {
            state.pause |= Pause::ASYM;
        }
        gpio = fixed.gpio("link-gpios");
        if gpio.is_none() && fixed.has_prop("link-gpios") {
            warn!(
                "{}: can't resolve link-gpios, fixed link is always up",
                node.name()
            );
        }
    } else if let Some(cells) = node.prop_cells("fixed-link") {
        if cells.len() != 5 {
            warn!(
                "{}: fixed-link property has {} cells, expected 5",
                node.name(),
                cells.len()
            );
            return Err(PhylinkError::InvalidConfig);
        }
        state.duplex = if cells[1] != 0 {
            Duplex::Full
        } else {
            Duplex::Half
        };
        state.speed = speed_from_cell(node, cells[2])?;
        if cells[3] != 0 {
            state.pause |= Pause::SYM;
        }
        if cells[4] != 0 {
            state.pause |= Pause::ASYM;
        }
    } else {
        return Err(PhylinkError::InvalidConfig);
    }

    if state.speed > SPEED_1000 && state.duplex == Duplex::Half {
        warn!(
            "{}: half duplex not supported with speed {}",
            node.name(),
            state.speed
        );
    }
    Ok(FixedLink { state, gpio })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fwnode::PropNode;
    use crate::link_mode::*;
    use crate::mock::MockGpio;

    #[test]
    fn legacy_property() {
        let node = PropNode::new("eth0").with_cells("fixed-link", &[1, 1, 100, 1, 0]);
        let fixed = parse(&node).unwrap();
        assert_eq!(fixed.state.speed, SPEED_100);
        assert_eq!(fixed.state.duplex, Duplex::Full);
        assert_eq!(fixed.state.pause, Pause::SYM);
        assert!(fixed.state.link);
        assert!(fixed.state.an_complete);
        assert!(!fixed.state.an_enabled);
        assert!(fixed.gpio.is_none());
    }

    #[test]
    fn child_node() {
        let node = PropNode::new("eth0").with_child(
            PropNode::new("fixed-link")
                .with_u32("speed", 1000)
                .with_flag("asym-pause"),
        );
        let fixed = parse(&node).unwrap();
        assert_eq!(fixed.state.speed, SPEED_1000);
        assert_eq!(fixed.state.duplex, Duplex::Half);
        assert_eq!(fixed.state.pause, Pause::ASYM);
    }

    #[test]
    fn half_duplex_above_gigabit_is_kept() {
        let node = PropNode::new("eth0").with_cells("fixed-link", &[1, 0, 2500, 0, 0]);
        let fixed = parse(&node).unwrap();
        assert_eq!(fixed.state.speed, SPEED_2500);
        assert_eq!(fixed.state.duplex, Duplex::Half);
    }

    #[test]
    fn malformed() {
        let no_speed = PropNode::new("eth0")
            .with_child(PropNode::new("fixed-link").with_flag("full-duplex"));
        assert_eq!(parse(&no_speed).err(), Some(PhylinkError::InvalidConfig));
        let short = PropNode::new("eth0").with_cells("fixed-link", &[1, 1, 100]);
        assert_eq!(parse(&short).err(), Some(PhylinkError::InvalidConfig));
        assert_eq!(
            parse(&PropNode::new("eth0")).err(),
            Some(PhylinkError::InvalidConfig)
        );
    }

    #[test]
    fn speed_out_of_range() {
        let cells = PropNode::new("eth0").with_cells("fixed-link", &[1, 1, 0x8000_0000, 0, 0]);
        assert_eq!(parse(&cells).err(), Some(PhylinkError::InvalidConfig));
        let child = PropNode::new("eth0")
            .with_child(PropNode::new("fixed-link").with_u32("speed", u32::MAX));
        assert_eq!(parse(&child).err(), Some(PhylinkError::InvalidConfig));
    }

    #[test]
    fn unresolved_link_gpio() {
        let node = PropNode::new("eth0").with_child(
            PropNode::new("fixed-link")
                .with_u32("speed", 100)
                .with_cells("link-gpios", &[0x10, 3, 0]),
        );
        let fixed = parse(&node).unwrap();
        assert!(fixed.gpio.is_none());
        assert!(fixed.state.link);
    }

    #[test]
    fn link_gpio_is_resolved() {
        let gpio = Arc::new(MockGpio::new(false));
        let node = PropNode::new("eth0").with_child(
            PropNode::new("fixed-link")
                .with_u32("speed", 100)
                .with_flag("full-duplex")
                .with_gpio("link-gpios", gpio.clone()),
        );
        let fixed = parse(&node).unwrap();
        let link = fixed.gpio.unwrap();
        assert!(!link.get_value());
        gpio.set(true);
        assert!(link.get_value());
        assert_eq!(fixed.state.speed, SPEED_100);
    }
}
