use std::sync::atomic::{AtomicBool, Ordering};

use crate::scheme::LinkGpio;

pub struct MockGpio {
    value: AtomicBool,
}

impl MockGpio {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::SeqCst);
    }
}

impl LinkGpio for MockGpio {
    fn get_value(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }
}
