mod event_listener;
mod work;

pub use event_listener::{EventHandler, EventListener};
pub(crate) use work::Work;
