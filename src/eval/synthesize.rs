use std::collections::BTreeMap;

use crate::eval::Fields;
use crate::rules::{FieldSpec, Replacement, Rewrite, Rule, Transform};

/// Suggested command plus the full explanation shown to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remediation {
    pub replacement: String,
    pub explanation: String,
}

/// Build the remediation for a fired rule.
///
/// Output depends only on the rule and the fields, so the same command
/// always produces byte-identical text.
pub fn synthesize(rule: &Rule, fields: &Fields) -> Remediation {
    let mut vars: BTreeMap<&str, String> = rule
        .vars()
        .iter()
        .map(|(k, v)| (*k, v.clone()))
        .collect();
    vars.insert("command", fields.command().to_string());
    for spec in rule.fields() {
        vars.insert(spec.name, render_field(spec, fields.get(spec.name)));
    }

    let template = rule.template();
    let replacement = match &template.replacement {
        Replacement::Format(t) => fill(t, &vars).trim().to_string(),
        Replacement::Rewrite(rewrites) => {
            let (rewritten, applied) = apply_rewrites(fields.command(), rewrites);
            vars.insert("rewrites", applied.join("\n"));
            rewritten.trim().to_string()
        }
    };

    let mut text = fill(template.headline, &vars);
    text.push_str("\n\n");
    if let Some(context) = template.context {
        text.push_str(&fill(context, &vars));
        text.push_str("\n\n");
    }
    text.push_str(&fill(template.lead, &vars));
    text.push_str("\n  ");
    text.push_str(&replacement);
    text.push('\n');

    let hints: Vec<String> = rule
        .hints()
        .iter()
        .filter(|h| h.pattern.is_match(fields.command()))
        .map(|h| fill(h.text, &vars))
        .collect();
    if !hints.is_empty() {
        text.push('\n');
        for hint in hints {
            text.push_str(&hint);
            text.push('\n');
        }
    }

    text.push('\n');
    text.push_str(&fill(template.reference_title, &vars));
    for line in template.reference {
        text.push_str("\n• ");
        text.push_str(&fill(line, &vars));
    }
    if let Some(footer) = template.footer {
        text.push_str("\n\n");
        text.push_str(&fill(footer, &vars));
    }

    Remediation {
        replacement,
        explanation: text,
    }
}

/// Render one field: transformed and wrapped when present, fallback otherwise.
fn render_field(spec: &FieldSpec, value: Option<&str>) -> String {
    let Some(value) = value else {
        return spec.fallback.unwrap_or_default().to_string();
    };
    let value = match &spec.transform {
        Transform::None => value.to_string(),
        Transform::ShellQuote => shlex::try_quote(value)
            .map(|q| q.into_owned())
            .unwrap_or_else(|_| value.to_string()),
        Transform::StripRoots(roots) => strip_roots(value, roots),
    };
    format!("{}{}{}", spec.prefix, value, spec.suffix)
}

/// `/Users/me/app/api-backend/site/spec/a_spec.rb:3` → `./spec/a_spec.rb:3`
/// for root `/api-backend/site/`. Paths under no root are returned as-is.
fn strip_roots(path: &str, roots: &[String]) -> String {
    for root in roots.iter().filter(|r| !r.is_empty()) {
        if let Some((_, rest)) = path.rsplit_once(root.as_str()) {
            return format!("./{rest}");
        }
    }
    path.to_string()
}

/// Apply every rewrite to the command; returns the new text and
/// `  • old → new` lines for the rewrites that fired.
fn apply_rewrites(command: &str, rewrites: &[Rewrite]) -> (String, Vec<String>) {
    let mut out = command.to_string();
    let mut applied = Vec::new();
    for rw in rewrites {
        let Some(m) = rw.pattern.find(&out) else {
            continue;
        };
        applied.push(format!("  • {} → {}", m.as_str(), rw.with));
        out = rw
            .pattern
            .regex()
            .replace_all(&out, regex::NoExpand(&rw.with))
            .into_owned();
    }
    (out, applied)
}

/// Substitute `{name}` placeholders. Unknown names are left verbatim.
fn fill(template: &str, vars: &BTreeMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}').and_then(|close| Some((vars.get(&after[..close])?, close))) {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::extract;
    use crate::rules::{Field, Template};

    fn rule(replacement: Replacement) -> Rule {
        Rule::builder(
            "demo",
            Template {
                headline: "Blocked {tool} call.",
                context: Some("Context for {service}."),
                lead: "Use instead:",
                replacement,
                reference_title: "Related:",
                reference: &["approved {service} - the approved form", "other - something else"],
                footer: Some("Footer."),
            },
        )
        .command(r"tool\b")
        .field(Field::new("target", r"tool\s+(\S+)").fallback("<target>"))
        .field(
            Field::new("msg", r#"-m\s+"([^"]+)""#)
                .wrap(" -m ", "")
                .transform(Transform::ShellQuote),
        )
        .hint(r"--slow", "Hint: drop --slow.")
        .var("service", "api")
        .build()
        .unwrap()
    }

    fn run(rule: &Rule, cmd: &str) -> Remediation {
        synthesize(rule, &extract(cmd, rule))
    }

    #[test]
    fn all_parts_present() {
        let r = rule(Replacement::Format("approved {target}"));
        let out = run(&r, "tool build");
        assert_eq!(out.replacement, "approved build");
        assert!(out.explanation.starts_with("Blocked {tool} call.\n\nContext for api.\n\n"));
        assert!(out.explanation.contains("Use instead:\n  approved build\n"));
        assert!(
            out.explanation
                .contains("\nRelated:\n• approved api - the approved form\n• other - something else")
        );
        assert!(out.explanation.ends_with("\n\nFooter."));
    }

    #[test]
    fn absent_field_uses_fallback() {
        let r = rule(Replacement::Format("approved {target}{msg}"));
        let out = run(&r, "tool");
        assert_eq!(out.replacement, "approved <target>");
    }

    #[test]
    fn wrap_and_quote_when_present() {
        let r = rule(Replacement::Format("approved{msg}"));
        let out = run(&r, "tool x -m \"two words\"");
        assert!(out.replacement.starts_with("approved -m "), "{}", out.replacement);
        assert!(out.replacement.contains("two words"));
        assert_ne!(out.replacement, "approved -m two words");
    }

    #[test]
    fn hints_only_when_matching() {
        let r = rule(Replacement::Format("approved"));
        assert!(run(&r, "tool x --slow").explanation.contains("\nHint: drop --slow.\n"));
        assert!(!run(&r, "tool x").explanation.contains("Hint"));
    }

    #[test]
    fn deterministic() {
        let r = rule(Replacement::Format("approved {target}{msg}"));
        let cmd = "tool deploy -m \"ship it\" --slow";
        assert_eq!(run(&r, cmd), run(&r, cmd));
    }

    #[test]
    fn fill_leaves_unknown_placeholders() {
        let mut vars = BTreeMap::new();
        vars.insert("a", "1".to_string());
        assert_eq!(fill("{a}-{b}-{", &vars), "1-{b}-{");
        assert_eq!(fill("{{a}}", &vars), "{1}");
    }

    #[test]
    fn strip_roots_first_match_wins() {
        let roots = vec!["/api-backend/site/".to_string(), "/api-backend/".to_string()];
        assert_eq!(
            strip_roots("/home/u/api-backend/site/spec/a_spec.rb:3", &roots),
            "./spec/a_spec.rb:3"
        );
        assert_eq!(strip_roots("/home/u/api-backend/lib/x_spec.rb", &roots), "./lib/x_spec.rb");
        assert_eq!(strip_roots("./spec/a_spec.rb", &roots), "./spec/a_spec.rb");
    }
}
