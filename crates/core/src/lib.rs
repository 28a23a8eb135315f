//! Orka core types: label maps, object references and resource selection.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

/// Flat label map as stored in `metadata.labels`.
pub type LabelMap = BTreeMap<String, String>;

/// Reference to a single cluster object. Identity only; the object itself is fetched later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Resource type as typed by the user (`pods`, `Pod`, `deployments.apps`, `apps/v1/Deployment`).
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectRef {
    pub fn new(kind: impl Into<String>, namespace: Option<&str>, name: impl Into<String>) -> Self {
        Self { kind: kind.into(), namespace: namespace.map(|s| s.to_string()), name: name.into() }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Which objects a command targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Explicitly named objects, in argument order.
    Named(Vec<ObjectRef>),
    /// Every object of a type (optionally within a namespace); expanded by the caller.
    All { kind: String, namespace: Option<String> },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("one or more resources must be specified as <resource> <name> or <resource>/<name>")]
    Empty,
    #[error("resource name may not be empty: {0}")]
    EmptyName(String),
    #[error("resource type may not be empty: {0}")]
    EmptyKind(String),
    #[error("there is no need to specify a resource type as a separate argument when passing arguments in resource/name form (e.g. 'orkactl label {0}')")]
    MixedForms(String),
    #[error("--all cannot be combined with resource names")]
    AllWithNames,
}

/// Parse positional resource arguments.
///
/// Accepted shapes: `type name [name...]`, `type/name [type/name...]`, or `type` alone with `all`.
/// The namespace is attached to every produced reference; cluster-scoped kinds ignore it later.
pub fn parse_selection(args: &[String], namespace: Option<&str>, all: bool) -> Result<Selection, SelectionError> {
    let first = match args.first() { Some(f) => f, None => return Err(SelectionError::Empty) };

    if all {
        if args.len() > 1 || first.contains('/') { return Err(SelectionError::AllWithNames); }
        return Ok(Selection::All { kind: first.clone(), namespace: namespace.map(|s| s.to_string()) });
    }

    if first.contains('/') {
        let mut out = Vec::with_capacity(args.len());
        for a in args {
            let (kind, name) = match a.split_once('/') {
                Some(pair) => pair,
                None => return Err(SelectionError::MixedForms(a.clone())),
            };
            if kind.is_empty() { return Err(SelectionError::EmptyKind(a.clone())); }
            if name.is_empty() { return Err(SelectionError::EmptyName(a.clone())); }
            out.push(ObjectRef::new(kind, namespace, name));
        }
        return Ok(Selection::Named(out));
    }

    let names = &args[1..];
    if names.is_empty() { return Err(SelectionError::Empty); }
    let mut out = Vec::with_capacity(names.len());
    for n in names {
        if n.contains('/') { return Err(SelectionError::MixedForms(n.clone())); }
        if n.is_empty() { return Err(SelectionError::EmptyName(n.clone())); }
        out.push(ObjectRef::new(first.as_str(), namespace, n.as_str()));
    }
    Ok(Selection::Named(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> { v.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn type_then_names() {
        let sel = parse_selection(&args(&["pods", "foo", "bar"]), Some("test"), false).unwrap();
        assert_eq!(sel, Selection::Named(vec![
            ObjectRef::new("pods", Some("test"), "foo"),
            ObjectRef::new("pods", Some("test"), "bar"),
        ]));
    }

    #[test]
    fn slash_form() {
        let sel = parse_selection(&args(&["pods/foo", "svc/bar"]), None, false).unwrap();
        match sel {
            Selection::Named(v) => {
                assert_eq!(v.len(), 2);
                assert_eq!(v[1].kind, "svc");
                assert_eq!(v[1].to_string(), "svc/bar");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn all_requires_bare_type() {
        let sel = parse_selection(&args(&["pods"]), Some("ns"), true).unwrap();
        assert_eq!(sel, Selection::All { kind: "pods".into(), namespace: Some("ns".into()) });
        assert_eq!(parse_selection(&args(&["pods", "foo"]), None, true), Err(SelectionError::AllWithNames));
        assert_eq!(parse_selection(&args(&["pods/foo"]), None, true), Err(SelectionError::AllWithNames));
    }

    #[test]
    fn empty_and_malformed() {
        assert_eq!(parse_selection(&[], None, false), Err(SelectionError::Empty));
        assert_eq!(parse_selection(&args(&["pods"]), None, false), Err(SelectionError::Empty));
        assert!(matches!(parse_selection(&args(&["pods/"]), None, false), Err(SelectionError::EmptyName(_))));
        assert!(matches!(parse_selection(&args(&["/foo"]), None, false), Err(SelectionError::EmptyKind(_))));
        assert!(matches!(parse_selection(&args(&["pods/foo", "bar"]), None, false), Err(SelectionError::MixedForms(_))));
        assert!(matches!(parse_selection(&args(&["pods", "svc/bar"]), None, false), Err(SelectionError::MixedForms(_))));
    }
}
