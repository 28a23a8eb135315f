use crate::{validate_no_overwrites, LabelError, Labeled, UpdateSpec};

/// Compute the labeled form of `obj`. The input is never modified.
///
/// Without `overwrite`, a differing value on a shared key aborts before anything is applied.
/// Removals run before additions; an empty `version` counts as not provided.
pub fn apply_labels<K: Labeled + Clone>(
    obj: &K,
    overwrite: bool,
    version: Option<&str>,
    spec: &UpdateSpec,
) -> Result<K, LabelError> {
    if !overwrite {
        validate_no_overwrites(obj.label_map(), spec.additions())?;
    }
    let mut out = obj.clone();
    let labels = out.label_map_mut();
    for key in spec.removals() {
        labels.remove(key);
    }
    for (k, v) in spec.additions() {
        labels.insert(k.clone(), v.clone());
    }
    if let Some(v) = version.filter(|v| !v.is_empty()) {
        out.set_version_token(v);
    }
    Ok(out)
}
