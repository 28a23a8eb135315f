//! Label expression parsing: `key=value` adds, `key-` removes.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use orka_core::{parse_selection, LabelMap, Selection, SelectionError};
use regex::Regex;

use crate::LabelError;

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").unwrap());
static DNS_SUBDOMAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap());

/// Parsed label updates. Built once per invocation, read-only afterwards.
///
/// No key is ever both added and removed; [`UpdateSpec::new`] is the only way in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSpec {
    additions: LabelMap,
    removals: BTreeSet<String>,
}

impl UpdateSpec {
    pub fn new<I>(additions: LabelMap, removals: I) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = String>,
    {
        let removals: Vec<String> = removals.into_iter().collect();
        if let Some(key) = removals.iter().find(|k| additions.contains_key(k.as_str())) {
            return Err(LabelError::ConflictingSpec { key: key.clone() });
        }
        Ok(Self { additions, removals: removals.into_iter().collect() })
    }

    pub fn additions(&self) -> &LabelMap { &self.additions }
    pub fn removals(&self) -> &BTreeSet<String> { &self.removals }
    pub fn is_empty(&self) -> bool { self.additions.is_empty() && self.removals.is_empty() }
}

/// Parse label update tokens. Later `key=value` duplicates win.
pub fn parse_label_args<S: AsRef<str>>(tokens: &[S]) -> Result<UpdateSpec, LabelError> {
    let mut additions = LabelMap::new();
    let mut removals: Vec<String> = Vec::new();

    for t in tokens {
        let token = t.as_ref();
        if let Some((key, value)) = token.split_once('=') {
            check_key(token, key)?;
            check_value(token, value)?;
            additions.insert(key.to_string(), value.to_string());
        } else if let Some(key) = token.strip_suffix('-') {
            check_key(token, key)?;
            removals.push(key.to_string());
        } else {
            return Err(invalid(token, "expected key=value or key-"));
        }
    }

    UpdateSpec::new(additions, removals)
}

/// Split positional arguments into resource arguments and label tokens.
///
/// A label token contains `=` or ends with `-`. Resources must precede every label token.
pub fn split_args(args: &[String]) -> Result<(Vec<String>, Vec<String>), LabelError> {
    let mut resources = Vec::new();
    let mut labels = Vec::new();
    for a in args {
        if a.contains('=') || a.ends_with('-') {
            labels.push(a.clone());
        } else if labels.is_empty() {
            resources.push(a.clone());
        } else {
            return Err(LabelError::usage(format!("all resources must be specified before label changes: {}", a)));
        }
    }
    Ok((resources, labels))
}

/// Turn raw positional arguments into a selection plus label updates.
///
/// Checks run in the order a user can fix them: resources, then label presence,
/// then label syntax, then resource shape. Nothing here touches the cluster.
pub fn parse_command(args: &[String], namespace: Option<&str>, all: bool) -> Result<(Selection, UpdateSpec), LabelError> {
    let (resources, tokens) = split_args(args)?;
    if resources.is_empty() {
        return Err(SelectionError::Empty.into());
    }
    if tokens.is_empty() {
        return Err(LabelError::usage("at least one label update is required"));
    }
    let spec = parse_label_args(tokens.as_slice())?;
    let selection = parse_selection(&resources, namespace, all)?;
    Ok((selection, spec))
}

fn invalid(token: &str, reason: impl Into<String>) -> LabelError {
    LabelError::InvalidSyntax { token: token.to_string(), reason: reason.into() }
}

fn check_key(token: &str, key: &str) -> Result<(), LabelError> {
    let name = match key.rsplit_once('/') {
        Some((prefix, name)) => {
            if prefix.is_empty() || prefix.len() > MAX_PREFIX_LEN || !DNS_SUBDOMAIN_RE.is_match(prefix) {
                return Err(invalid(token, format!("key prefix {:?} must be a lowercase DNS subdomain of at most {} characters", prefix, MAX_PREFIX_LEN)));
            }
            name
        }
        None => key,
    };
    if name.is_empty() {
        return Err(invalid(token, "key name may not be empty"));
    }
    if name.len() > MAX_NAME_LEN || !NAME_RE.is_match(name) {
        return Err(invalid(token, format!("key name {:?} must be at most {} alphanumeric characters, '-', '_' or '.', starting and ending alphanumeric", name, MAX_NAME_LEN)));
    }
    Ok(())
}

fn check_value(token: &str, value: &str) -> Result<(), LabelError> {
    if value.is_empty() { return Ok(()); }
    if value.len() > MAX_NAME_LEN || !NAME_RE.is_match(value) {
        return Err(invalid(token, format!("value {:?} must be empty or at most {} alphanumeric characters, '-', '_' or '.', starting and ending alphanumeric", value, MAX_NAME_LEN)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> LabelMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn set(keys: &[&str]) -> BTreeSet<String> { keys.iter().map(|k| k.to_string()).collect() }

    #[test]
    fn adds_and_removes() {
        let spec = parse_label_args(&["a=b", "c=d", "e-"]).unwrap();
        assert_eq!(spec.additions(), &map(&[("a", "b"), ("c", "d")]));
        assert_eq!(spec.removals(), &set(&["e"]));
    }

    #[test]
    fn empty_input_is_empty_spec() {
        let spec = parse_label_args::<&str>(&[]).unwrap();
        assert!(spec.is_empty());
    }

    #[test]
    fn last_duplicate_wins() {
        let spec = parse_label_args(&["a=b", "a=c", "x=", "x=y"]).unwrap();
        assert_eq!(spec.additions(), &map(&[("a", "c"), ("x", "y")]));
    }

    #[test]
    fn empty_value_allowed() {
        let spec = parse_label_args(&["a="]).unwrap();
        assert_eq!(spec.additions().get("a").map(String::as_str), Some(""));
    }

    #[test]
    fn bare_token_is_invalid_syntax() {
        match parse_label_args(&["ab", "c=d"]) {
            Err(LabelError::InvalidSyntax { token, .. }) => assert_eq!(token, "ab"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn add_and_remove_same_key_conflicts() {
        match parse_label_args(&["a=b", "c=d", "a-"]) {
            Err(LabelError::ConflictingSpec { key }) => assert_eq!(key, "a"),
            other => panic!("unexpected {:?}", other),
        }
        // order of the tokens does not matter
        assert!(matches!(parse_label_args(&["a-", "a=b"]), Err(LabelError::ConflictingSpec { .. })));
    }

    #[test]
    fn constructor_rejects_overlap() {
        let err = UpdateSpec::new(map(&[("a", "b")]), vec!["c".to_string(), "a".to_string()]).unwrap_err();
        assert!(matches!(err, LabelError::ConflictingSpec { ref key } if key == "a"));

        let spec = UpdateSpec::new(map(&[("a", "b")]), vec!["c".to_string(), "c".to_string()]).unwrap();
        assert_eq!(spec.removals(), &set(&["c"]));
    }

    #[test]
    fn prefixed_keys() {
        let spec = parse_label_args(&["app.kubernetes.io/name=web", "example.com/tier-"]).unwrap();
        assert_eq!(spec.additions().get("app.kubernetes.io/name").map(String::as_str), Some("web"));
        assert!(spec.removals().contains("example.com/tier"));
    }

    #[test]
    fn malformed_keys_and_values() {
        for bad in ["-", "=v", "/a=b", "Bad_Prefix/a=b", "a/=b", "a=b c", "a=-b", "a=b-", "_a=b", "a b-"] {
            assert!(
                matches!(parse_label_args(&[bad]), Err(LabelError::InvalidSyntax { .. })),
                "expected InvalidSyntax for {:?}", bad
            );
        }
        let long = format!("{}=v", "k".repeat(64));
        assert!(matches!(parse_label_args(&[long.as_str()]), Err(LabelError::InvalidSyntax { .. })));
    }

    #[test]
    fn split_resources_from_labels() {
        let args: Vec<String> = ["pods", "foo", "a=b", "c-"].iter().map(|s| s.to_string()).collect();
        let (res, labels) = split_args(&args).unwrap();
        assert_eq!(res, vec!["pods", "foo"]);
        assert_eq!(labels, vec!["a=b", "c-"]);

        let only_label: Vec<String> = vec!["pods-".into()];
        let (res, labels) = split_args(&only_label).unwrap();
        assert!(res.is_empty());
        assert_eq!(labels, vec!["pods-"]);

        let out_of_order: Vec<String> = ["pods", "a=b", "foo"].iter().map(|s| s.to_string()).collect();
        assert!(matches!(split_args(&out_of_order), Err(LabelError::Usage(_))));
    }

    #[test]
    fn command_usage_errors() {
        let cases: &[(&[&str], &str)] = &[
            (&[], "one or more resources must be specified"),
            (&["pods"], "at least one label update is required"),
            (&["pods-"], "one or more resources must be specified"),
            (&["pods=bar"], "one or more resources must be specified"),
            (&["pods", "a=b"], "one or more resources must be specified"),
        ];
        for (args, want) in cases {
            let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
            let err = parse_command(&args, Some("test"), false).unwrap_err();
            assert!(err.is_usage(), "{:?}: {:?}", args, err);
            assert!(err.to_string().contains(want), "{:?}: {}", args, err);
        }
    }

    #[test]
    fn command_with_all() {
        let args: Vec<String> = vec!["pods".into(), "a=b".into()];
        let (sel, spec) = parse_command(&args, Some("test"), true).unwrap();
        assert_eq!(sel, Selection::All { kind: "pods".into(), namespace: Some("test".into()) });
        assert_eq!(spec.additions().get("a").map(String::as_str), Some("b"));
    }
}
