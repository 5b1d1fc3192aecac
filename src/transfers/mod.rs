//! Offline, per-service-day precomputation of reachable onward boardings for
//! every stopping event, pruned by Witt et al.'s dominance rules (spec.md
//! §4.2).

mod builder;
mod error;

use std::collections::HashMap;

use crate::model::StoppingEvent;

pub use builder::TransferBuilder;
pub use error::Error;

/// `StoppingEvent -> reachable onward boardings`, scoped to one service day.
/// Produced by [`TransferBuilder::build`], read-only thereafter (spec.md §3).
pub type TransferMap = HashMap<StoppingEvent, Box<[StoppingEvent]>>;
