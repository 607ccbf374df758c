//! Status transition tables.
//!
//! Order, invoice and payment status machines are plain data: a static list of
//! allowed `(from, to)` edges. Anything not listed is rejected.

/// Allowed status transitions as a static edge list.
#[derive(Debug, Clone, Copy)]
pub struct TransitionTable<S: 'static> {
    edges: &'static [(S, S)],
}

impl<S> TransitionTable<S>
where
    S: Copy + PartialEq + 'static,
{
    pub const fn new(edges: &'static [(S, S)]) -> Self {
        Self { edges }
    }

    pub fn allows(&self, from: S, to: S) -> bool {
        self.edges.iter().any(|&(f, t)| f == from && t == to)
    }

    /// Every status reachable from `from` in one step, in table order.
    pub fn targets(&self, from: S) -> impl Iterator<Item = S> + '_ {
        self.edges
            .iter()
            .filter(move |&&(f, _)| f == from)
            .map(|&(_, t)| t)
    }

    pub fn is_terminal(&self, status: S) -> bool {
        self.targets(status).next().is_none()
    }

    pub fn edges(&self) -> &'static [(S, S)] {
        self.edges
    }
}
