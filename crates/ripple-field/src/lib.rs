//! Ripple Field - Incremental differential propagation substrate
//!
//! A mutable graph of numeric fields joined by directed, argument-indexed
//! links. A change to a field travels as a delta to every dependent field
//! instead of triggering a recomputation:
//! - Input fields are assigned from outside (`set_value`)
//! - Function fields combine their inputs incrementally (sum, product, ...)
//! - Queue fields defer their deltas into scheduler steps
//!
//! Links that increment the round deliver into a queue field's next-round
//! bucket. That one-round lag is what lets feedback cycles converge.
//!
//! ```
//! use ripple_core::OwnerId;
//! use ripple_field::{FieldGraph, Session};
//!
//! let mut graph = FieldGraph::new();
//! let mut session = Session::new();
//! let owner = OwnerId::new(1);
//!
//! let a = graph.add_input(owner, "a", None);
//! let b = graph.add_input(owner, "b", None);
//! graph.set_value(a, 2.0, session.queue_mut()).unwrap();
//! graph.set_value(b, 3.0, session.queue_mut()).unwrap();
//!
//! let product = graph
//!     .mul(owner, "a*b", Some(a), Some(b), session.queue_mut())
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(graph.value(product).unwrap(), 6.0);
//!
//! graph.set_value(a, 4.0, session.queue_mut()).unwrap();
//! session.process(&mut graph).unwrap();
//! assert_eq!(graph.value(product).unwrap(), 12.0);
//! ```

pub mod config;
pub mod field;
pub mod link;
pub mod function;
pub mod deferred;
pub mod graph;
pub mod builder;
pub mod persist;
pub mod session;

pub use config::*;
pub use field::*;
pub use link::*;
pub use function::*;
pub use deferred::*;
pub use graph::*;
pub use persist::*;
pub use session::*;

pub use ripple_sched::{Bucket, Phase, Queue, QueueConfig, Scheduled, Step, StepEntry};
