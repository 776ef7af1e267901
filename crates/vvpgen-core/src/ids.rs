//! Index newtypes for design-graph objects.
//!
//! Every object in a [`Design`](crate::Design) lives in a dense arena and is
//! named by one of these identifiers. Generated labels are derived from the
//! index, so an id doubles as the stable textual identity of the object in
//! the emitted program.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(u32);

        impl $name {
            /// Create an id from a raw arena index.
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Get the underlying index.
            #[inline]
            pub const fn index(self) -> u32 {
                self.0
            }

            /// Get the underlying index as a `usize` for arena access.
            #[inline]
            pub const fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                Self::new(index)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifies a scope (module instance, task, function, named block).
    ScopeId, "scope#"
);
define_id!(
    /// Identifies a signal (net or variable).
    SignalId, "signal#"
);
define_id!(
    /// Identifies a nexus, the set of pins connected together.
    NexusId, "nexus#"
);
define_id!(
    /// Identifies a primitive logic gate.
    LogicId, "logic#"
);
define_id!(
    /// Identifies a parameterized structural device.
    LpmId, "lpm#"
);
define_id!(
    /// Identifies a structural constant driver.
    ConstId, "const#"
);
define_id!(
    /// Identifies a bidirectional switch.
    SwitchId, "switch#"
);
define_id!(
    /// Identifies a switch-level island.
    IslandId, "island#"
);
define_id!(
    /// Identifies an event (named or edge-sensitive).
    EventId, "event#"
);
define_id!(
    /// Identifies a behavioral process.
    ProcessId, "process#"
);
define_id!(
    /// Identifies a class type.
    ClassId, "class#"
);
define_id!(
    /// Identifies an enumeration type.
    EnumId, "enum#"
);
define_id!(
    /// Identifies a source file in the design's file table.
    FileId, "file#"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips_index() {
        let id = SignalId::new(42);
        assert_eq!(id.index(), 42);
        assert_eq!(id.as_usize(), 42);
        assert_eq!(u32::from(id), 42);
    }

    #[test]
    fn id_display_carries_kind() {
        assert_eq!(format!("{}", NexusId::new(3)), "nexus#3");
        assert_eq!(format!("{}", ScopeId::new(0)), "scope#0");
    }

    #[test]
    fn ids_order_by_index() {
        assert!(LogicId::new(1) < LogicId::new(2));
        assert_eq!(EventId::from(7), EventId::new(7));
    }
}
