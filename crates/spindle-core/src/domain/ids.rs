//! Invocation identifiers.
//!
//! ULID を使うので、ログ上で呼び出し順に並べられる。

use std::fmt;

use ulid::Ulid;

/// Identifies one invoke-and-publish cycle in logs.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvocationId(Ulid);

impl InvocationId {
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inv-{}", self.0)
    }
}
