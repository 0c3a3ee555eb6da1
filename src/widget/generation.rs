use std::cell::Cell;

/// Monotonic counter identifying the current operation of a session.
/// Results of asynchronous work are applied only while their ticket is
/// still current.
#[derive(Debug, Default)]
pub struct Generation(Cell<u64>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Generation {
    /// Supersedes every outstanding ticket.
    pub fn advance(&self) -> Ticket {
        let next = self.0.get() + 1;
        self.0.set(next);
        Ticket(next)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.0.get() == ticket.0
    }
}
