/// The trial whose cue has fired and which is waiting for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenTrial {
    pub index: usize,
    pub cue_at: u64,
    /// Responses before this timestamp are discarded.
    pub locked_until: u64,
}

impl OpenTrial {
    pub fn accepts(&self, at: u64) -> bool {
        at >= self.locked_until
    }
}
