//! Type-safe handles for chat-platform objects.
//!
//! The core never talks to the chat platform directly, so it only needs opaque
//! numeric handles that the front-end can map back onto its own types.

use std::fmt;

/// Macro to generate numeric handle newtypes.
macro_rules! define_handle {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_handle!(MessageRef, i32);
define_handle!(ChatRef, i64);
