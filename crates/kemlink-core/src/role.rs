//! The two local parties of a session.

use std::fmt;

/// One of the two parties of the exchange.
///
/// A generates the keypair and decapsulates; B encapsulates to A's public
/// key. Each role owns exactly one independent session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Initiator: keygen, then decapsulate.
    A,
    /// Responder: encapsulate.
    B,
}

impl Role {
    /// Both roles, in index order.
    pub const ALL: [Role; 2] = [Role::A, Role::B];

    /// Stable slot index (A = 0, B = 1).
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    /// Parse `a`/`b` (case-insensitive, surrounding whitespace ignored).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "a" | "A" => Some(Self::A),
            "b" | "B" => Some(Self::B),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("User A"),
            Self::B => f.write_str("User B"),
        }
    }
}
