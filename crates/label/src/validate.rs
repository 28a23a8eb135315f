use orka_core::LabelMap;

use crate::LabelError;

/// Reject additions that would silently change an existing label.
///
/// Only shared keys with differing values conflict; the first one in key order is reported.
pub fn validate_no_overwrites(current: Option<&LabelMap>, additions: &LabelMap) -> Result<(), LabelError> {
    let current = match current { Some(c) if !c.is_empty() => c, _ => return Ok(()) };
    for (key, new) in additions {
        if let Some(old) = current.get(key) {
            if old != new {
                return Err(LabelError::OverwriteConflict { key: key.clone(), old: old.clone(), new: new.clone() });
            }
        }
    }
    Ok(())
}
