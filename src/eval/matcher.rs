use std::ops::Range;

use crate::rules::{Rule, RuleSet};

/// The rule that fired and where its detection pattern matched.
#[derive(Debug, Clone)]
pub struct RuleMatch<'r> {
    pub rule: &'r Rule,
    pub span: Range<usize>,
}

impl RuleMatch<'_> {
    /// Matched text without the leading separator captured by command-position patterns.
    pub fn matched<'c>(&self, command: &'c str) -> &'c str {
        command
            .get(self.span.clone())
            .unwrap_or("")
            .trim_start_matches([';', '&', '\n'])
            .trim()
    }
}

/// True if the command is already in the form the rule asks for.
pub fn is_escaped(command: &str, rule: &Rule) -> bool {
    rule.escape().iter().any(|p| p.is_match(command))
}

/// Find the first rule (in declared order) whose first matching detection
/// pattern fires. Escaped rules are skipped entirely.
pub fn evaluate<'r>(command: &str, rules: &'r RuleSet) -> Option<RuleMatch<'r>> {
    for rule in rules.rules() {
        if is_escaped(command, rule) {
            log::debug!("{}: {} escaped", rules.name, rule.name);
            continue;
        }
        if let Some(m) = rule.detect().iter().find_map(|p| p.find(command)) {
            log::debug!("{}: {} matched at {:?}", rules.name, rule.name, m.range());
            return Some(RuleMatch {
                rule,
                span: m.range(),
            });
        }
    }
    None
}
