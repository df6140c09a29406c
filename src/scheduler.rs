use crate::bitset::MembershipFilter;
use crate::error::Result;
use crate::ring::GenerationRing;

/// Counts requests and fires a ring decay on every `decay_window`-th one.
#[derive(Debug, Clone)]
pub struct WeightScheduler {
    decay_window: u64,
    request_count: u64,
    decay_count: u64,
}

impl WeightScheduler {
    pub fn new(decay_window: u64) -> Self {
        Self {
            decay_window,
            request_count: 0,
            decay_count: 0,
        }
    }

    /// Accounts for one incoming request, decaying `ring` first when the
    /// request number is a multiple of the window.
    ///
    /// Returns the recycled generation when a tick fired. If the tick fails
    /// the request is not counted and the ring is unchanged.
    pub fn on_request<F: MembershipFilter>(
        &mut self,
        ring: &mut GenerationRing<F>,
    ) -> Result<Option<usize>> {
        let request = self.request_count + 1;

        let recycled = if self.is_tick(request) {
            let idx = ring.decay()?;
            self.decay_count += 1;
            Some(idx)
        } else {
            None
        };

        self.request_count = request;
        Ok(recycled)
    }

    fn is_tick(&self, request: u64) -> bool {
        self.decay_window > 0 && request % self.decay_window == 0
    }

    pub fn decay_window(&self) -> u64 {
        self.decay_window
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn decay_count(&self) -> u64 {
        self.decay_count
    }

    /// Requests left before the next tick; the tick fires on the last one.
    pub fn requests_until_decay(&self) -> u64 {
        if self.decay_window == 0 {
            return u64::MAX;
        }
        self.decay_window - self.request_count % self.decay_window
    }
}
