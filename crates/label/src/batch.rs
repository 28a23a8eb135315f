//! Batch orchestration: fetch, relabel, persist and print each target in turn.

use std::time::Instant;

use metrics::{counter, histogram};
use orka_core::{ObjectRef, Selection};
use tracing::{debug, info, warn};

use crate::{apply_labels, Failure, LabelError, ObjectPrinter, ResourceAccessor, UpdateSpec};

/// Flags shared by every target of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelOptions {
    /// Replace differing values of existing keys instead of failing.
    pub overwrite: bool,
    /// Version token to stamp on each object; also the version the write expects.
    pub resource_version: Option<String>,
    /// Compute and print results without persisting them.
    pub dry_run: bool,
}

impl LabelOptions {
    fn version(&self) -> Option<&str> { self.resource_version.as_deref().filter(|v| !v.is_empty()) }
}

/// Outcome of a batch where at least one target was labeled.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Labeled targets, in input order.
    pub labeled: Vec<ObjectRef>,
    /// Per-target failures, in input order.
    pub failures: Vec<Failure>,
}

impl BatchReport {
    /// Some targets failed while others were labeled.
    pub fn is_partial(&self) -> bool { !self.failures.is_empty() }
}

/// Expand a selection into concrete targets. `All` asks the accessor; `Named` passes through.
pub async fn resolve_targets<A>(accessor: &A, selection: Selection) -> Result<Vec<ObjectRef>, LabelError>
where
    A: ResourceAccessor + ?Sized,
{
    match selection {
        Selection::Named(refs) => Ok(refs),
        Selection::All { kind, namespace } => {
            let refs = accessor.list(&kind, namespace.as_deref()).await?;
            debug!(kind = %kind, namespace = ?namespace, count = refs.len(), "expanded --all selection");
            Ok(refs)
        }
    }
}

/// Label every target sequentially.
///
/// Usage errors (no targets, no updates) return before the accessor or printer is called.
/// Per-target errors are collected; the batch fails only when nothing was labeled.
pub async fn label_batch<A, P>(
    accessor: &A,
    printer: &mut P,
    targets: &[ObjectRef],
    spec: &UpdateSpec,
    opts: &LabelOptions,
) -> Result<BatchReport, LabelError>
where
    A: ResourceAccessor + ?Sized,
    P: ObjectPrinter<A::Object> + ?Sized,
{
    if targets.is_empty() {
        counter!("label_usage_err", 1u64);
        return Err(LabelError::usage("one or more resources must be specified"));
    }
    if spec.is_empty() {
        counter!("label_usage_err", 1u64);
        return Err(LabelError::usage("at least one label update is required"));
    }

    let t0 = Instant::now();
    let mut report = BatchReport::default();
    debug!(targets = targets.len(), adds = spec.additions().len(), removes = spec.removals().len(), "label batch starting");
    for target in targets {
        counter!("label_attempts", 1u64);
        match label_one(accessor, target, spec, opts).await {
            Ok(obj) => {
                counter!("label_ok", 1u64);
                info!(target = %target, dry_run = opts.dry_run, "labeled");
                printer.print(target, &obj);
                report.labeled.push(target.clone());
            }
            Err(error) => {
                counter!("label_err", 1u64);
                warn!(target = %target, error = %error, "label failed");
                report.failures.push(Failure { target: target.clone(), error });
            }
        }
    }
    histogram!("label_latency_ms", t0.elapsed().as_secs_f64() * 1000.0);

    if report.labeled.is_empty() {
        return Err(LabelError::AllFailed(report.failures));
    }
    Ok(report)
}

async fn label_one<A>(accessor: &A, target: &ObjectRef, spec: &UpdateSpec, opts: &LabelOptions) -> Result<A::Object, LabelError>
where
    A: ResourceAccessor + ?Sized,
{
    let current = accessor.fetch(target).await?;
    let updated = apply_labels(&current, opts.overwrite, opts.version(), spec)?;
    if opts.dry_run {
        return Ok(updated);
    }
    Ok(accessor.persist(target, updated, opts.version()).await?)
}
