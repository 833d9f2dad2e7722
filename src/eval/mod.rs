pub mod decision;
pub mod extract;
pub mod matcher;
pub mod synthesize;

pub use decision::Decision;
pub use extract::{Fields, extract};
pub use matcher::RuleMatch;
pub use synthesize::{Remediation, synthesize};

use crate::config::Config;
use crate::rules::{RuleError, RuleSet, RuleSetKind};

/// Evaluate one command against one rule set: match, extract, synthesize.
pub fn decide(command: &str, rules: &RuleSet) -> Decision {
    let Some(found) = matcher::evaluate(command, rules) else {
        return Decision::Allow;
    };
    log::debug!(
        "{}: {} fired on {:?}",
        rules.name,
        found.rule.name,
        found.matched(command)
    );
    let fields = extract(command, found.rule);
    let remediation = synthesize(found.rule, &fields);
    Decision::Deny {
        rule: found.rule.name,
        reason: remediation.explanation,
    }
}

/// One or more independent rule sets consulted in order.
///
/// Each set is evaluated on its own; the first set that denies decides.
/// Holds no mutable state, so one instance can serve any number of calls.
pub struct Interceptor {
    sets: Vec<RuleSet>,
}

impl Interceptor {
    pub fn new(sets: Vec<RuleSet>) -> Self {
        Self { sets }
    }

    /// Build the requested built-in rule sets from configuration.
    pub fn from_config(config: &Config, kinds: &[RuleSetKind]) -> Result<Self, RuleError> {
        let sets = kinds
            .iter()
            .map(|kind| RuleSet::build(*kind, config))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sets })
    }

    /// Evaluate a full command string.
    pub fn evaluate(&self, command: &str) -> Decision {
        let command = command.trim();
        if command.is_empty() {
            return Decision::Allow;
        }
        self.sets
            .iter()
            .map(|set| decide(command, set))
            .find(Decision::is_deny)
            .unwrap_or(Decision::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all() -> Interceptor {
        Interceptor::from_config(&Config::default_config(), &RuleSetKind::ALL).unwrap()
    }

    #[test]
    fn empty_command_allowed() {
        assert_eq!(all().evaluate("   "), Decision::Allow);
    }

    #[test]
    fn first_denying_set_decides() {
        // git set precedes the container set
        let d = all().evaluate("git commit -m 'x' && bundle exec rspec");
        assert_eq!(d.rule(), Some("git-commit"));
    }

    #[test]
    fn later_set_used_when_earlier_allows() {
        let d = all().evaluate("git status && bundle exec rspec spec/a_spec.rb");
        assert_eq!(d.rule(), Some("rspec-outside-container"));
    }

    #[test]
    fn single_set_instance_ignores_other_domains() {
        let config = Config::default_config();
        let git_only = Interceptor::from_config(&config, &[RuleSetKind::Git]).unwrap();
        assert_eq!(git_only.evaluate("npx jest"), Decision::Allow);
        assert!(git_only.evaluate("git push").is_deny());
    }

    #[test]
    fn no_sets_allows_everything() {
        let none = Interceptor::new(Vec::new());
        assert_eq!(none.evaluate("git push --force"), Decision::Allow);
    }

    #[test]
    fn invalid_config_pattern_is_an_error() {
        let mut config = Config::default_config();
        config.container.extra_escape.push("(".into());
        assert!(Interceptor::from_config(&config, &[RuleSetKind::Container]).is_err());
    }
}
