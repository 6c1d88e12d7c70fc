//! Per-ticker alert state (ARMED / FIRED).

/// Whether the next qualifying price for a ticker will notify.
///
/// Persisted as a plain boolean "alert already sent" flag:
/// ```text
/// false => Armed
/// true  => Fired
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum AlertState {
    /// The next price at or above the limit notifies.
    #[default]
    Armed,
    /// A notification was already delivered; waiting for a reset.
    Fired,
}

impl AlertState {
    /// Convert to the persisted flag.
    pub fn is_fired(self) -> bool {
        matches!(self, AlertState::Fired)
    }

    /// Build from the persisted flag. A missing flag means `Armed`.
    pub fn from_flag(sent: Option<bool>) -> Self {
        match sent {
            Some(true) => AlertState::Fired,
            _ => AlertState::Armed,
        }
    }

    /// Short label used in listings.
    pub fn as_str(self) -> &'static str {
        match self {
            AlertState::Armed => "armed",
            AlertState::Fired => "fired",
        }
    }
}
