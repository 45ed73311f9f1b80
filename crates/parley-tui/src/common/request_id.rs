//! Request identifiers for latest-only async results.

/// Opaque request id for matching async results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

/// Tracks the latest active request and ignores stale results.
#[derive(Debug, Default)]
pub struct LatestOnly {
    next: u64,
    active: Option<RequestId>,
}

impl LatestOnly {
    /// Starts a new request and marks it as active.
    pub fn begin(&mut self) -> RequestId {
        let id = RequestId(self.next);
        self.next = self.next.wrapping_add(1);
        self.active = Some(id);
        id
    }

    /// Cancels any active request.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn is_active(&self, id: RequestId) -> bool {
        self.active == Some(id)
    }

    pub fn has_active(&self) -> bool {
        self.active.is_some()
    }

    /// Finishes the request if it is still active.
    pub fn finish_if_active(&mut self, id: RequestId) -> bool {
        let active = self.is_active(id);
        if active {
            self.active = None;
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_finishes() {
        let mut latest = LatestOnly::default();
        let first = latest.begin();
        let second = latest.begin();
        assert!(!latest.finish_if_active(first));
        assert!(latest.has_active());
        assert!(latest.finish_if_active(second));
        assert!(!latest.has_active());
        assert!(!latest.finish_if_active(second));
    }

    #[test]
    fn test_cancel_drops_active() {
        let mut latest = LatestOnly::default();
        let id = latest.begin();
        latest.cancel();
        assert!(!latest.is_active(id));
        assert!(!latest.finish_if_active(id));
    }
}
