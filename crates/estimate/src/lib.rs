//! Clipline Estimate — encoding parameters as a reactive graph
//!
//! Leaf parameters (clip name, target size, framerate, speed, audio
//! settings, selection, source duration) feed derived values (duration,
//! bitrates, estimated size, validation errors). Every leaf write
//! recomputes its dependents in topological order before returning, so
//! readers and subscribers only ever see a consistent estimate.

pub mod graph;
pub mod reactive;
pub mod update;

pub use graph::{EncodingGraph, Node, SubscriptionId};
pub use reactive::DependencyGraph;
pub use update::ParameterUpdate;
