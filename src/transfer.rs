//! Export and import of snippets and custom variables as JSON.
//!
//! A conflict is an incoming snippet whose shortcut is already taken, or an
//! incoming variable whose name already exists. Each conflict is settled by a
//! [`ConflictPolicy`]. Imports are parsed and merged in memory and written in a
//! single store update, so a bad file changes nothing.

use crate::error::{QuickfillError, Result};
use crate::models::{new_id, Snippet, Variables};
use crate::storage::Store;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    #[default]
    KeepExisting,
    KeepNew,
    KeepBoth,
}

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::KeepExisting => "keep-existing",
            ConflictPolicy::KeepNew => "keep-new",
            ConflictPolicy::KeepBoth => "keep-both",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = QuickfillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "keep-existing" | "existing" => Ok(ConflictPolicy::KeepExisting),
            "keep-new" | "new" => Ok(ConflictPolicy::KeepNew),
            "keep-both" | "both" => Ok(ConflictPolicy::KeepBoth),
            other => Err(QuickfillError::InvalidConfig(format!(
                "unknown conflict policy '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Entries added or replaced
    pub imported: usize,
    /// Incoming entries that collided with an existing one
    pub conflicts: usize,
}

pub fn export_snippets(snippets: &[Snippet]) -> Result<String> {
    Ok(serde_json::to_string_pretty(snippets)?)
}

pub fn export_variables(variables: &Variables) -> Result<String> {
    Ok(serde_json::to_string_pretty(variables)?)
}

/// Parse a snippet export: a JSON array of snippet objects with non-blank shortcuts
pub fn parse_snippets(json: &str) -> Result<Vec<Snippet>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| QuickfillError::InvalidImport(format!("not valid JSON: {}", e)))?;
    let Value::Array(items) = value else {
        return Err(QuickfillError::InvalidImport(
            "expected a JSON array of snippets".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let snippet = serde_json::from_value::<Snippet>(item).map_err(|e| {
                QuickfillError::InvalidImport(format!("snippet #{} is malformed: {}", index + 1, e))
            })?;
            if snippet.shortcut.trim().is_empty() {
                return Err(QuickfillError::InvalidImport(format!(
                    "snippet #{} has an empty shortcut",
                    index + 1
                )));
            }
            Ok(snippet)
        })
        .collect()
}

/// Parse a variable export: a JSON object of string values
pub fn parse_variables(json: &str) -> Result<Variables> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| QuickfillError::InvalidImport(format!("not valid JSON: {}", e)))?;
    let Value::Object(entries) = value else {
        return Err(QuickfillError::InvalidImport(
            "expected a JSON object of variables".to_string(),
        ));
    };

    entries
        .into_iter()
        .map(|(name, value)| match value {
            Value::String(text) => Ok((name, text)),
            _ => Err(QuickfillError::InvalidImport(format!(
                "variable '{}' must be a string",
                name
            ))),
        })
        .collect()
}

/// `shortcut_N` for the smallest N >= 1 not already used by a snippet
pub fn modify_shortcut(shortcut: &str, existing: &[Snippet]) -> String {
    unused_suffix(shortcut, |candidate| {
        existing.iter().any(|snippet| snippet.shortcut == candidate)
    })
}

fn unused_suffix(base: &str, taken: impl Fn(&str) -> bool) -> String {
    (1..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Merge `incoming` into `existing`, asking `decide` about every conflict
pub fn merge_snippets(
    existing: &[Snippet],
    incoming: Vec<Snippet>,
    mut decide: impl FnMut(&Snippet, &Snippet) -> ConflictPolicy,
) -> (Vec<Snippet>, ImportReport) {
    let mut merged = existing.to_vec();
    let mut report = ImportReport::default();

    for mut snippet in incoming {
        let conflict = merged.iter().position(|s| s.shortcut == snippet.shortcut);
        let replacing = match conflict {
            None => None,
            Some(index) => {
                report.conflicts += 1;
                match decide(&merged[index], &snippet) {
                    ConflictPolicy::KeepExisting => continue,
                    ConflictPolicy::KeepNew => Some(index),
                    ConflictPolicy::KeepBoth => {
                        snippet.shortcut = modify_shortcut(&snippet.shortcut, &merged);
                        None
                    }
                }
            }
        };

        let id_taken = merged
            .iter()
            .enumerate()
            .any(|(i, s)| Some(i) != replacing && s.id == snippet.id);
        if snippet.id.is_empty() || id_taken {
            snippet.id = new_id();
        }

        match replacing {
            Some(index) => merged[index] = snippet,
            None => merged.push(snippet),
        }
        report.imported += 1;
    }

    (merged, report)
}

/// Merge `incoming` variables into `existing`, asking `decide` about every conflict
pub fn merge_variables(
    existing: &Variables,
    incoming: Variables,
    mut decide: impl FnMut(&str, &str, &str) -> ConflictPolicy,
) -> (Variables, ImportReport) {
    let mut merged = existing.clone();
    let mut report = ImportReport::default();

    for (name, value) in incoming {
        let name = match merged.get(&name) {
            None => name,
            Some(current) => {
                report.conflicts += 1;
                match decide(&name, current, &value) {
                    ConflictPolicy::KeepExisting => continue,
                    ConflictPolicy::KeepNew => name,
                    ConflictPolicy::KeepBoth => unused_suffix(&name, |candidate| merged.contains_key(candidate)),
                }
            }
        };
        merged.insert(name, value);
        report.imported += 1;
    }

    (merged, report)
}

/// Import a snippet export into `store`, settling every conflict with `policy`
pub fn import_snippets(store: &Store, json: &str, policy: ConflictPolicy) -> Result<ImportReport> {
    let incoming = parse_snippets(json)?;
    let existing = store.load_snippets()?;
    let (merged, report) = merge_snippets(&existing, incoming, |_, _| policy);

    if merged != existing {
        store.replace_snippets(merged)?;
    }
    info!(imported = report.imported, conflicts = report.conflicts, %policy, "snippets imported");
    Ok(report)
}

/// Import a variable export into `store`, settling every conflict with `policy`
pub fn import_variables(store: &Store, json: &str, policy: ConflictPolicy) -> Result<ImportReport> {
    let incoming = parse_variables(json)?;
    let existing = store.load_custom_variables()?;
    let (merged, report) = merge_variables(&existing, incoming, |_, _, _| policy);

    if merged != existing {
        store.replace_variables(merged)?;
    }
    info!(imported = report.imported, conflicts = report.conflicts, %policy, "variables imported");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> Vec<Snippet> {
        vec![Snippet::new("/foo", "old foo"), Snippet::new("/foo_1", "taken")]
    }

    #[test]
    fn modify_shortcut_skips_used_suffixes() {
        assert_eq!(modify_shortcut("/foo", &existing()), "/foo_2");
        assert_eq!(modify_shortcut("/bar", &existing()), "/bar_1");
    }

    #[test]
    fn keep_existing_leaves_the_list_alone() {
        let before = existing();
        let (merged, report) = merge_snippets(&before, vec![Snippet::new("/foo", "new")], |_, _| {
            ConflictPolicy::KeepExisting
        });
        assert_eq!(merged, before);
        assert_eq!(report, ImportReport { imported: 0, conflicts: 1 });
    }

    #[test]
    fn keep_new_replaces_in_place() {
        let (merged, report) = merge_snippets(&existing(), vec![Snippet::new("/foo", "new")], |_, _| {
            ConflictPolicy::KeepNew
        });
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].shortcut, "/foo");
        assert_eq!(merged[0].text, "new");
        assert_eq!(report, ImportReport { imported: 1, conflicts: 1 });
    }

    #[test]
    fn keep_both_renames_the_incoming_snippet() {
        let (merged, _) = merge_snippets(&existing(), vec![Snippet::new("/foo", "new")], |_, _| {
            ConflictPolicy::KeepBoth
        });
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[2].shortcut, "/foo_2");
        assert_eq!(merged[0].text, "old foo");
    }

    #[test]
    fn colliding_and_missing_ids_are_regenerated() {
        let before = existing();
        let mut copy = before[1].clone();
        copy.shortcut = "/other".to_string();
        let mut blank = Snippet::new("/blank", "b");
        blank.id.clear();

        let (merged, _) = merge_snippets(&before, vec![copy, blank], |_, _| ConflictPolicy::KeepNew);
        assert_ne!(merged[2].id, before[1].id);
        assert!(!merged[3].id.is_empty());
    }

    #[test]
    fn non_array_snippet_import_is_rejected() {
        let err = parse_snippets(r#"{"shortcut":"/a","text":"b"}"#).unwrap_err();
        assert!(matches!(err, QuickfillError::InvalidImport(_)));
        assert!(matches!(parse_snippets("nope"), Err(QuickfillError::InvalidImport(_))));
    }

    #[test]
    fn blank_shortcuts_are_rejected() {
        let err = parse_snippets(r#"[{"shortcut": "/ok", "text": "a"}, {"shortcut": "  ", "text": "b"}]"#)
            .unwrap_err();
        assert!(matches!(err, QuickfillError::InvalidImport(msg) if msg.contains("#2")));
    }

    #[test]
    fn variables_must_be_an_object_of_strings() {
        assert!(matches!(parse_variables("[]"), Err(QuickfillError::InvalidImport(_))));
        assert!(matches!(
            parse_variables(r#"{"n": 1}"#),
            Err(QuickfillError::InvalidImport(_))
        ));
        assert_eq!(parse_variables(r#"{"n": "v"}"#).unwrap()["n"], "v");
    }

    #[test]
    fn variable_conflicts_follow_the_policy() {
        let mut before = Variables::new();
        before.insert("name".to_string(), "Bob".to_string());
        let mut incoming = Variables::new();
        incoming.insert("name".to_string(), "Ann".to_string());
        incoming.insert("city".to_string(), "Oslo".to_string());

        let (merged, report) = merge_variables(&before, incoming, |_, _, _| ConflictPolicy::KeepBoth);
        assert_eq!(merged["name"], "Bob");
        assert_eq!(merged["name_1"], "Ann");
        assert_eq!(merged["city"], "Oslo");
        assert_eq!(report, ImportReport { imported: 2, conflicts: 1 });
    }

    #[test]
    fn policies_parse_from_cli_spelling() {
        assert_eq!("keep-both".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::KeepBoth);
        assert_eq!("New".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::KeepNew);
        assert!("merge".parse::<ConflictPolicy>().is_err());
    }
}
