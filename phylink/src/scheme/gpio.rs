/// A digital input sampled for fixed-link presence.
pub trait LinkGpio: Send + Sync {
    /// `true` when the line reports the link as present.
    fn get_value(&self) -> bool;
}
