//! Orka label: parse label updates, validate them against live objects, and apply them
//! to a batch of targets through a pluggable accessor.
//!
//! Flow: [`parse_command`] yields a selection and an [`UpdateSpec`]; [`resolve_targets`]
//! turns the selection into references; [`label_batch`]
//! fetches each target, runs [`apply_labels`] (which gates on [`validate_no_overwrites`]),
//! persists the result and hands it to an [`ObjectPrinter`].

#![forbid(unsafe_code)]

mod accessor;
mod batch;
mod error;
mod mutate;
mod parse;
mod validate;

pub use accessor::{Labeled, ObjectPrinter, ResourceAccessor};
pub use batch::{label_batch, resolve_targets, BatchReport, LabelOptions};
pub use error::{AccessError, Failure, LabelError};
pub use mutate::apply_labels;
pub use parse::{parse_command, parse_label_args, split_args, UpdateSpec};
pub use validate::validate_no_overwrites;
