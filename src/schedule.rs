/// Tickets for delayed callbacks. A ticket is only honoured while its
/// generation is current; `cancel_all` bumps the generation so anything
/// already armed turns into a no-op when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub id: u32,
    generation: u32,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u32,
    generation: u32,
    pending: Vec<u32>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.push(self.next_id);
        Ticket {
            id: self.next_id,
            generation: self.generation,
        }
    }

    /// Consumes the ticket. True if the callback should run.
    pub fn redeem(&mut self, ticket: Ticket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        match self.pending.iter().position(|id| *id == ticket.id) {
            Some(i) => {
                self.pending.swap_remove(i);
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self, ticket: Ticket) {
        self.pending.retain(|id| *id != ticket.id);
    }

    pub fn cancel_all(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.pending.clear();
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeem_once() {
        let mut s = Scheduler::new();
        let t = s.issue();
        assert!(s.redeem(t));
        assert!(!s.redeem(t));
    }

    #[test]
    fn test_cancel_all_invalidates() {
        let mut s = Scheduler::new();
        let a = s.issue();
        let b = s.issue();
        s.cancel_all();
        assert!(!s.redeem(a));
        assert!(!s.redeem(b));
        let c = s.issue();
        assert!(s.redeem(c));
    }

    #[test]
    fn test_cancel_single() {
        let mut s = Scheduler::new();
        let a = s.issue();
        let b = s.issue();
        s.cancel(a);
        assert_eq!(s.pending(), 1);
        assert!(!s.redeem(a));
        assert!(s.redeem(b));
    }
}
