//! Field - a named numeric cell in the propagation graph

use std::fmt;

use ripple_core::{FieldId, LinkId, OwnerId};

use crate::{Arity, DeferredState, FieldFunction};

/// One argument position of a field that accepts inputs
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputSlot {
    /// Link bound to this argument, connected or not
    pub(crate) link: Option<LinkId>,
    /// Registered in the sink's input set
    pub(crate) connected: bool,
    /// Sum of all deltas delivered over this argument so far
    pub(crate) value: f64,
}

impl InputSlot {
    pub(crate) fn vacant() -> Self {
        InputSlot::default()
    }

    #[cfg(test)]
    pub(crate) fn with_value(value: f64) -> Self {
        InputSlot {
            link: None,
            connected: true,
            value,
        }
    }

    #[inline]
    pub fn link(&self) -> Option<LinkId> {
        self.link
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Input value as incorporated by the owning field
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Notification passed to listeners after a field commits an update
#[derive(Clone, Debug, PartialEq)]
pub struct FieldUpdate {
    pub field: FieldId,
    pub owner: OwnerId,
    pub previous: f64,
    pub value: f64,
    pub delta: f64,
}

impl FieldUpdate {
    /// Whether the update moved the field from non-positive to positive
    pub fn is_rising(&self) -> bool {
        self.previous <= 0.0 && self.value > 0.0
    }
}

pub type ListenerFn = Box<dyn FnMut(&FieldUpdate)>;

/// When a listener fires
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerKind {
    /// Only on a transition to a positive value
    Event,
    /// On every accepted update
    Update,
}

pub(crate) struct Listener {
    pub(crate) name: String,
    pub(crate) kind: ListenerKind,
    pub(crate) callback: ListenerFn,
}

/// How a field obtains its value
pub(crate) enum FieldKind {
    /// Root field, assigned with `set_value`
    Input,
    /// Synchronous function of its inputs
    Function(Box<dyn FieldFunction>),
    /// Sum of its inputs, applied when the scheduler dequeues its step
    Deferred(DeferredState),
}

impl FieldKind {
    fn initial_value(&self) -> f64 {
        match self {
            FieldKind::Function(function) => function.initial_value(),
            _ => 0.0,
        }
    }

    pub(crate) fn arity(&self) -> Arity {
        match self {
            FieldKind::Input => Arity::Fixed(0),
            FieldKind::Function(function) => function.arity(),
            FieldKind::Deferred(_) => Arity::Variadic,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            FieldKind::Input => "input",
            FieldKind::Function(function) => function.name(),
            FieldKind::Deferred(state) if state.is_value_sorted() => "sorted-queue",
            FieldKind::Deferred(_) => "queue",
        }
    }
}

/// A named, owned numeric cell
///
/// `value` is the committed value. `pending` is the value the field is
/// heading to: functions write their incremental result into it, and a
/// commit turns the difference into the propagated delta. A difference
/// suppressed by the tolerance stays in `pending` instead of being lost.
pub struct Field {
    pub(crate) id: FieldId,
    pub(crate) owner: OwnerId,
    pub(crate) label: String,
    pub(crate) value: f64,
    pub(crate) pending: f64,
    pub(crate) tolerance: Option<f64>,
    pub(crate) within_update: bool,
    /// Connected outgoing links
    pub(crate) receivers: Vec<LinkId>,
    /// All outgoing links, connected or not
    pub(crate) outputs: Vec<LinkId>,
    pub(crate) inputs: Vec<InputSlot>,
    pub(crate) kind: FieldKind,
    pub(crate) listeners: Vec<Listener>,
}

impl Field {
    pub(crate) fn new(
        id: FieldId,
        owner: OwnerId,
        label: String,
        tolerance: Option<f64>,
        kind: FieldKind,
    ) -> Self {
        let initial = kind.initial_value();
        let inputs = match kind.arity() {
            Arity::Fixed(n) => vec![InputSlot::vacant(); n],
            Arity::Variadic => Vec::new(),
        };
        Field {
            id,
            owner,
            label,
            value: initial,
            pending: initial,
            tolerance,
            within_update: false,
            receivers: Vec::new(),
            outputs: Vec::new(),
            inputs,
            kind,
            listeners: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> FieldId {
        self.id
    }

    #[inline]
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Value after the in-flight update, or `value()` outside of one
    #[inline]
    pub fn updated_value(&self) -> f64 {
        if self.within_update {
            self.pending
        } else {
            self.value
        }
    }

    #[inline]
    pub fn tolerance(&self) -> Option<f64> {
        self.tolerance
    }

    #[inline]
    pub fn is_within_update(&self) -> bool {
        self.within_update
    }

    pub fn receivers(&self) -> &[LinkId] {
        &self.receivers
    }

    pub fn outputs(&self) -> &[LinkId] {
        &self.outputs
    }

    pub fn inputs(&self) -> &[InputSlot] {
        &self.inputs
    }

    pub fn arity(&self) -> Arity {
        self.kind.arity()
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, FieldKind::Input)
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.kind, FieldKind::Deferred(_))
    }

    pub fn deferred(&self) -> Option<&DeferredState> {
        match &self.kind {
            FieldKind::Deferred(state) => Some(state),
            _ => None,
        }
    }

    pub fn value_as_string(&self) -> String {
        if self.within_update {
            format!("{:.5} -> {:.5}", self.value, self.pending)
        } else {
            format!("{:.5}", self.value)
        }
    }

    /// Whether a delta is too small to be worth propagating
    pub(crate) fn suppresses(&self, delta: f64) -> bool {
        delta == 0.0 || self.tolerance.map_or(false, |tolerance| delta.abs() < tolerance)
    }

    pub(crate) fn notify(&mut self, previous: f64, delta: f64) {
        if self.listeners.is_empty() {
            return;
        }
        let update = FieldUpdate {
            field: self.id,
            owner: self.owner,
            previous,
            value: self.value,
            delta,
        };
        for listener in self.listeners.iter_mut() {
            if listener.kind == ListenerKind::Update || update.is_rising() {
                (listener.callback)(&update);
            }
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("label", &self.label)
            .field("kind", &self.kind.name())
            .field("value", &self.value)
            .field("pending", &self.pending)
            .field("within_update", &self.within_update)
            .field("inputs", &self.inputs.len())
            .field("receivers", &self.receivers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn input(tolerance: Option<f64>) -> Field {
        Field::new(
            FieldId::new(0),
            OwnerId::new(9),
            "x".to_string(),
            tolerance,
            FieldKind::Input,
        )
    }

    #[test]
    fn test_suppression() {
        let field = input(Some(0.01));
        assert!(field.suppresses(0.0));
        assert!(field.suppresses(0.005));
        assert!(!field.suppresses(-0.02));

        let exact = input(None);
        assert!(exact.suppresses(0.0));
        assert!(!exact.suppresses(1e-300));
    }

    #[test]
    fn test_updated_value_outside_update() {
        let mut field = input(None);
        field.pending = 3.0;
        assert_eq!(field.updated_value(), 0.0);
        field.within_update = true;
        assert_eq!(field.updated_value(), 3.0);
        assert_eq!(field.value_as_string(), "0.00000 -> 3.00000");
    }

    #[test]
    fn test_event_listener_fires_on_rising_edge_only() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut field = input(None);
        let sink = fired.clone();
        field.listeners.push(Listener {
            name: "fired".to_string(),
            kind: ListenerKind::Event,
            callback: Box::new(move |u| sink.borrow_mut().push(u.value)),
        });

        field.value = 0.5;
        field.notify(0.0, 0.5);
        field.value = 0.8;
        field.notify(0.5, 0.3);
        field.value = -0.1;
        field.notify(0.8, -0.9);
        field.value = 0.2;
        field.notify(-0.1, 0.3);

        assert_eq!(*fired.borrow(), vec![0.5, 0.2]);
    }
}
