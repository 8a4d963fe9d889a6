//! Field links - directed, argument-indexed edges

use ripple_core::{FieldId, LinkId};

/// Edge from a source field to one argument of a sink field
///
/// A link is connected iff it is registered both in the source's receiver
/// set and in the sink's input slot. The graph adds and removes the two
/// registrations together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldLink {
    pub(crate) id: LinkId,
    pub(crate) source: FieldId,
    pub(crate) sink: FieldId,
    pub(crate) arg: usize,
    pub(crate) connected: bool,
    pub(crate) propagate_updates: bool,
    pub(crate) increment_round: bool,
}

impl FieldLink {
    pub(crate) fn new(id: LinkId, source: FieldId, sink: FieldId, arg: usize) -> Self {
        FieldLink {
            id,
            source,
            sink,
            arg,
            connected: false,
            propagate_updates: true,
            increment_round: false,
        }
    }

    #[inline]
    pub fn id(&self) -> LinkId {
        self.id
    }

    #[inline]
    pub fn source(&self) -> FieldId {
        self.source
    }

    #[inline]
    pub fn sink(&self) -> FieldId {
        self.sink
    }

    /// Argument position on the sink
    #[inline]
    pub fn arg(&self) -> usize {
        self.arg
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether ongoing source updates travel over this link
    #[inline]
    pub fn propagates_updates(&self) -> bool {
        self.propagate_updates
    }

    /// Whether updates land in the sink's next-round bucket
    #[inline]
    pub fn increments_round(&self) -> bool {
        self.increment_round
    }

    /// Connected and willing to carry ongoing updates
    #[inline]
    pub(crate) fn carries_updates(&self) -> bool {
        self.connected && self.propagate_updates
    }
}
