use std::collections::BTreeMap;

use crate::rules::Rule;

/// Parameters pulled out of a command for one rule.
///
/// Every field named by the rule has an entry; a field whose pattern did
/// not match is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    command: String,
    values: BTreeMap<&'static str, Option<String>>,
}

impl Fields {
    /// The full command the fields were extracted from.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_deref())
    }
}

/// Apply each field pattern to the full command text.
///
/// Fields are independent; an empty capture counts as absent.
pub fn extract(command: &str, rule: &Rule) -> Fields {
    let values = rule
        .fields()
        .iter()
        .map(|spec| {
            let value = spec
                .pattern
                .captures(command)
                .and_then(|caps| (spec.group..caps.len()).find_map(|i| caps.get(i)))
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            (spec.name, value)
        })
        .collect();

    Fields {
        command: command.to_string(),
        values,
    }
}
