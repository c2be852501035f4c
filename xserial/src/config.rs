/// What `enqueue_for_send` does when the transmit buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPolicy {
    /// Busy-wait until the transmit interrupt frees a slot.
    #[default]
    Blocking,
    /// Return `BufferFull` immediately.
    NonBlocking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    pub send_policy: SendPolicy,
}

impl SerialConfig {
    pub const fn new() -> Self {
        Self {
            send_policy: SendPolicy::Blocking,
        }
    }

    pub const fn with_send_policy(mut self, policy: SendPolicy) -> Self {
        self.send_policy = policy;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new()
    }
}
