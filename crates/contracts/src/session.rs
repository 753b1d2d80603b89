//! SessionState - per-run mutable state shared by generator and sink
//!
//! Owned by the run loop and passed by reference; nothing else touches it.

/// Running message-id counter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Next id to hand out (equals the post-increment count)
    counter: u64,
    /// Set when the last allocation wrapped the counter to zero
    wrapped: bool,
}

impl SessionState {
    /// Create a session starting at message id 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session whose next id is `counter`
    pub fn starting_at(counter: u64) -> Self {
        Self {
            counter,
            wrapped: false,
        }
    }

    /// Allocate the next message id
    ///
    /// Ids increase by one; after `u64::MAX` has been handed out the counter
    /// wraps to zero.
    pub fn next_message_id(&mut self) -> u64 {
        let id = self.counter;
        match self.counter.checked_add(1) {
            Some(next) => {
                self.counter = next;
                self.wrapped = false;
            }
            None => {
                self.counter = 0;
                self.wrapped = true;
            }
        }
        id
    }

    /// Post-increment counter value (number of ids handed out since the last reset)
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Whether the last allocation wrapped the counter to zero
    pub fn just_wrapped(&self) -> bool {
        self.wrapped
    }

    /// Whether a batch of `batch_size` is complete after the last allocation
    ///
    /// True when the counter is a positive multiple of `batch_size`, or when it
    /// has just wrapped to zero.
    pub fn batch_complete(&self, batch_size: u64) -> bool {
        if self.wrapped {
            return true;
        }
        batch_size > 0 && self.counter != 0 && self.counter % batch_size == 0
    }

    /// Reset the counter to zero (after a recovered failure)
    pub fn reset(&mut self) {
        self.counter = 0;
        self.wrapped = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_increase_from_zero() {
        let mut session = SessionState::new();
        let ids: Vec<u64> = (0..5).map(|_| session.next_message_id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(session.counter(), 5);
    }

    #[test]
    fn test_wraps_after_max() {
        let mut session = SessionState::starting_at(u64::MAX - 1);
        assert_eq!(session.next_message_id(), u64::MAX - 1);
        assert!(!session.just_wrapped());
        assert_eq!(session.next_message_id(), u64::MAX);
        assert!(session.just_wrapped());
        assert_eq!(session.counter(), 0);
        assert_eq!(session.next_message_id(), 0);
        assert!(!session.just_wrapped());
    }

    #[test]
    fn test_batch_complete_on_multiples() {
        let mut session = SessionState::new();
        let mut flushes = Vec::new();
        for _ in 0..7 {
            let id = session.next_message_id();
            if session.batch_complete(3) {
                flushes.push(id);
            }
        }
        // post-increment counts 3 and 6 -> ids 2 and 5
        assert_eq!(flushes, vec![2, 5]);
    }

    #[test]
    fn test_batch_complete_on_wrap() {
        let mut session = SessionState::starting_at(u64::MAX);
        session.next_message_id();
        assert!(session.batch_complete(7));
    }

    #[test]
    fn test_reset() {
        let mut session = SessionState::new();
        session.next_message_id();
        session.next_message_id();
        session.reset();
        assert_eq!(session.counter(), 0);
        assert!(!session.batch_complete(1));
        assert_eq!(session.next_message_id(), 0);
    }
}
