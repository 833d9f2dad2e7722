/// Outcome of evaluating one candidate command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny {
        /// Name of the rule that fired.
        rule: &'static str,
        /// Synthesized remediation text shown to the agent.
        reason: String,
    },
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny { .. } => "deny",
        }
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Decision::Deny { .. })
    }

    pub fn rule(&self) -> Option<&'static str> {
        match self {
            Decision::Allow => None,
            Decision::Deny { rule, .. } => Some(*rule),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Allow => None,
            Decision::Deny { reason, .. } => Some(reason.as_str()),
        }
    }
}
