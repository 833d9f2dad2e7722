use crate::config::GitConfig;
use crate::rules::{Field, Replacement, Rule, RuleError, RuleSet, Template, Transform};

const GRAPHITE_TITLE: &str = "Graphite command guide:";

const GRAPHITE_GUIDE: &[&str] = &[
    "gt create -m \"message\" - create a NEW branch with a commit (starts a new PR)",
    "gt modify --commit -m \"message\" - add a new commit to the current branch",
    "gt modify -m \"message\" - amend the last commit and restack",
    "gt submit - push the current branch and create or update its PR",
    "gt submit --stack - submit the entire stack",
];

fn message_field() -> Field {
    Field::new("message", r#"(?:^|\s)-[a-z]*m\s+(?:"([^"]*)"|'([^']*)')"#)
        .wrap(" -m ", "")
        .transform(Transform::ShellQuote)
}

/// Build the Graphite workflow rule set.
///
/// Order matters: branch creation, then amend, then plain commit, then push.
pub fn rule_set(config: &GitConfig) -> Result<RuleSet, RuleError> {
    let rules = vec![
        Rule::builder(
            "git-branch-create",
            Template {
                headline: "Git branch creation intercepted - this repository uses the Graphite workflow.",
                context: None,
                lead: "To create a new branch and start a new PR stack, use:",
                replacement: Replacement::Format(r#"gt create -m "feat: {branch}""#),
                reference_title: GRAPHITE_TITLE,
                reference: GRAPHITE_GUIDE,
                footer: Some(
                    "gt create branches from the current position, makes the initial commit \
                     and sets the branch up for PR stacking in one step.",
                ),
            },
        )
        .command(r"git\s+checkout\s+-b\b")
        .command(r"git\s+switch\s+-c\b")
        .escapes(&config.extra_escape)
        .field(
            Field::new("branch", r"(?:checkout\s+-b|switch\s+-c)\s+([^\s;&|]+)")
                .fallback("description"),
        )
        .build()?,
        Rule::builder(
            "git-commit-amend",
            Template {
                headline: "Git commit --amend intercepted - this repository uses the Graphite workflow.",
                context: None,
                lead: "To amend the last commit on the current branch, use:",
                replacement: Replacement::Format("gt modify{message}"),
                reference_title: GRAPHITE_TITLE,
                reference: GRAPHITE_GUIDE,
                footer: Some("gt modify amends the commit and restacks every branch above it."),
            },
        )
        .command(r#"git\s+commit\b(?:[^;&\n'"]|'[^']*'|"[^"]*")*--amend\b"#)
        .escapes(&config.extra_escape)
        .field(message_field())
        .build()?,
        Rule::builder(
            "git-commit",
            Template {
                headline: "Git commit intercepted - this repository uses the Graphite workflow.",
                context: None,
                lead: "To add a new commit to the current branch, use:",
                replacement: Replacement::Format("gt modify --commit{message}"),
                reference_title: GRAPHITE_TITLE,
                reference: GRAPHITE_GUIDE,
                footer: Some(
                    "If you're starting NEW work, use 'gt create' instead.\n\
                     If you're continuing work on the current branch, use 'gt modify --commit' or 'gt modify'.",
                ),
            },
        )
        .command(r"git\s+commit\b")
        .escapes(&config.extra_escape)
        .field(message_field())
        .build()?,
        Rule::builder(
            "git-push",
            Template {
                headline: "Git push intercepted - this repository uses the Graphite workflow.",
                context: None,
                lead: "To push and create or update PRs, use:",
                replacement: Replacement::Format("gt submit"),
                reference_title: GRAPHITE_TITLE,
                reference: &[
                    "gt submit - submit the current branch",
                    "gt submit --stack - submit the entire stack",
                    "gt submit --no-interactive - skip prompts",
                ],
                footer: Some(
                    "Submitting through Graphite keeps PR stacking and dependencies intact.",
                ),
            },
        )
        .command(r"git\s+push\b")
        .escapes(&config.extra_escape)
        .build()?,
    ];

    Ok(RuleSet::new("git", rules))
}
