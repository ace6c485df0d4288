//! Change detection over raw (undecoded) cell values.

/// The last raw value observed at the input key.
///
/// Only compared, never parsed. Absent reads leave it untouched, so a value
/// that disappears and comes back unchanged is not reported twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeState {
    last_raw: Option<String>,
}

impl ChangeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one read. Returns the raw value when it differs from the last
    /// one seen (including the very first value).
    pub fn observe(&mut self, raw: Option<String>) -> Option<&str> {
        let raw = raw?;
        if self.last_raw.as_deref() == Some(raw.as_str()) {
            return None;
        }
        self.last_raw = Some(raw);
        self.last_raw.as_deref()
    }

    pub fn last_raw(&self) -> Option<&str> {
        self.last_raw.as_deref()
    }
}
