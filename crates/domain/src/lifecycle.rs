//! Reusable status-transition engine.
//!
//! Both aggregates declare their lifecycle as data (states, legal edges,
//! terminal states) and validate every requested transition through the same
//! engine. No call site compares statuses by hand, so transition legality
//! cannot drift between handlers.

use std::fmt;

use thiserror::Error;

/// Why a requested transition was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError<S: fmt::Display + fmt::Debug> {
    /// The current state is terminal; no further transitions are permitted.
    #[error("state {state} is terminal")]
    Terminal { state: S },

    /// The edge is not part of the declared lifecycle graph.
    #[error("illegal transition from {from} to {to}")]
    Illegal { from: S, to: S },
}

/// A directed lifecycle graph over a status type.
///
/// The state sets involved are tiny (five or six states), so edges are kept
/// in a plain slice and checked by linear scan.
#[derive(Debug, Clone)]
pub struct Lifecycle<S: Copy + Eq + fmt::Display + fmt::Debug + 'static> {
    edges: &'static [(S, S)],
    terminal: &'static [S],
}

impl<S: Copy + Eq + fmt::Display + fmt::Debug + 'static> Lifecycle<S> {
    /// Declares a lifecycle from its legal edges and terminal states.
    pub const fn new(edges: &'static [(S, S)], terminal: &'static [S]) -> Self {
        Self { edges, terminal }
    }

    /// Returns true if the state admits no further transitions.
    pub fn is_terminal(&self, state: S) -> bool {
        self.terminal.contains(&state)
    }

    /// Returns true if the edge `(from, to)` is declared.
    pub fn can_transition(&self, from: S, to: S) -> bool {
        self.edges.iter().any(|&(f, t)| f == from && t == to)
    }

    /// Validates a requested transition.
    ///
    /// A terminal current state is reported as such even if the requested
    /// edge would otherwise look legal; terminal immutability wins.
    pub fn check(&self, from: S, to: S) -> Result<(), TransitionError<S>> {
        if self.is_terminal(from) {
            return Err(TransitionError::Terminal { state: from });
        }
        if !self.can_transition(from, to) {
            return Err(TransitionError::Illegal { from, to });
        }
        Ok(())
    }

    /// Returns the states reachable in one step from `from`.
    pub fn successors(&self, from: S) -> Vec<S> {
        self.edges
            .iter()
            .filter(|&&(f, _)| f == from)
            .map(|&(_, t)| t)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Start,
        Middle,
        End,
        Aborted,
    }

    impl fmt::Display for Phase {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{self:?}")
        }
    }

    const GRAPH: Lifecycle<Phase> = Lifecycle::new(
        &[
            (Phase::Start, Phase::Middle),
            (Phase::Middle, Phase::End),
            (Phase::Start, Phase::Aborted),
            (Phase::Middle, Phase::Aborted),
        ],
        &[Phase::End, Phase::Aborted],
    );

    #[test]
    fn declared_edges_pass() {
        assert!(GRAPH.check(Phase::Start, Phase::Middle).is_ok());
        assert!(GRAPH.check(Phase::Middle, Phase::End).is_ok());
        assert!(GRAPH.check(Phase::Middle, Phase::Aborted).is_ok());
    }

    #[test]
    fn undeclared_edges_are_illegal() {
        assert_eq!(
            GRAPH.check(Phase::Start, Phase::End),
            Err(TransitionError::Illegal {
                from: Phase::Start,
                to: Phase::End
            })
        );
    }

    #[test]
    fn terminal_states_reject_everything() {
        assert_eq!(
            GRAPH.check(Phase::End, Phase::Middle),
            Err(TransitionError::Terminal { state: Phase::End })
        );
        assert_eq!(
            GRAPH.check(Phase::Aborted, Phase::Start),
            Err(TransitionError::Terminal {
                state: Phase::Aborted
            })
        );
    }

    #[test]
    fn successors_lists_outgoing_edges() {
        let next = GRAPH.successors(Phase::Start);
        assert_eq!(next, vec![Phase::Middle, Phase::Aborted]);
        assert!(GRAPH.successors(Phase::End).is_empty());
    }

    #[test]
    fn terminality() {
        assert!(!GRAPH.is_terminal(Phase::Start));
        assert!(GRAPH.is_terminal(Phase::End));
        assert!(GRAPH.is_terminal(Phase::Aborted));
    }
}
