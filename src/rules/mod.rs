//! Pattern library: declarative rule records and the rule sets built from them.
//!
//! A [`Rule`] is data, not code: detection patterns tried in declared order,
//! escape patterns that mark a command as already correct, field specs for
//! parameter extraction, and a [`Template`] for the remediation message.
//! Control flow lives in [`crate::eval`]; adding a rule never touches it.

/// Docker-only test and Rails rules (`bundle exec rspec` → `docker compose exec ...`).
pub mod container;
/// Graphite workflow rules (`git checkout -b` → `gt create`, etc.).
pub mod git;
/// Package-manager rules (`npx jest` → `yarn jest`, watch-mode test scripts).
pub mod package;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

use crate::config::Config;

/// Errors raised while building a rule set.
///
/// Built-in patterns are constants; only patterns supplied through the user
/// config can fail to compile.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule {rule}: invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        rule: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("unknown rule set: {0}")]
    UnknownRuleSet(String),
}

/// Where a pattern is allowed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// At the start of the command or right after `;`, `&&` or a newline.
    Command,
    /// Anywhere in the text.
    Anywhere,
}

/// A compiled, case-insensitive text pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    anchor: Anchor,
    regex: Regex,
}

impl Pattern {
    pub fn new(anchor: Anchor, body: &str) -> Result<Self, regex::Error> {
        let source = match anchor {
            Anchor::Command => format!(r"(?im)(?:^|;|&&)\s*(?:{body})"),
            Anchor::Anywhere => format!("(?i){body}"),
        };
        Ok(Self {
            anchor,
            regex: Regex::new(&source)?,
        })
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn find<'t>(&self, text: &'t str) -> Option<regex::Match<'t>> {
        self.regex.find(text)
    }

    pub fn captures<'t>(&self, text: &'t str) -> Option<regex::Captures<'t>> {
        self.regex.captures(text)
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// How an extracted value is transformed before it is inserted into text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Transform {
    #[default]
    None,
    /// Quote for safe use as one shell word.
    ShellQuote,
    /// Rewrite a host path into a container-relative `./...` path by cutting
    /// everything up to the first matching root.
    StripRoots(Vec<String>),
}

/// Description of one named parameter to pull out of a command.
///
/// Fields are optional by construction: a pattern that does not match
/// yields an absent value, and the synthesizer renders `fallback` instead.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub pattern: String,
    /// First capture group holding the value. When it did not participate,
    /// later groups are tried in order, so alternatives can each capture.
    pub group: usize,
    pub fallback: Option<&'static str>,
    pub prefix: &'static str,
    pub suffix: &'static str,
    pub transform: Transform,
}

impl Field {
    pub fn new(name: &'static str, pattern: impl Into<String>) -> Self {
        Self {
            name,
            pattern: pattern.into(),
            group: 1,
            fallback: None,
            prefix: "",
            suffix: "",
            transform: Transform::None,
        }
    }

    pub fn group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    /// Placeholder text used when the field is absent.
    pub fn fallback(mut self, text: &'static str) -> Self {
        self.fallback = Some(text);
        self
    }

    /// Text placed around the value when present (never around the fallback).
    pub fn wrap(mut self, prefix: &'static str, suffix: &'static str) -> Self {
        self.prefix = prefix;
        self.suffix = suffix;
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// A compiled [`Field`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub pattern: Pattern,
    pub group: usize,
    pub fallback: Option<&'static str>,
    pub prefix: &'static str,
    pub suffix: &'static str,
    pub transform: Transform,
}

/// Extra advice appended to the message when its pattern matches the command.
#[derive(Debug, Clone)]
pub struct Hint {
    pub pattern: Pattern,
    pub text: &'static str,
}

/// One `old → new` substitution applied over the whole command text.
#[derive(Debug, Clone)]
pub struct Rewrite {
    pub pattern: Pattern,
    pub with: String,
}

/// How the suggested replacement command is produced.
#[derive(Debug, Clone)]
pub enum Replacement {
    /// A template with `{field}` placeholders.
    Format(&'static str),
    /// Substitutions applied to the original command, keeping everything else.
    Rewrite(Vec<Rewrite>),
}

/// Remediation message layout. Every text part accepts `{name}` placeholders.
#[derive(Debug, Clone)]
pub struct Template {
    /// Why the command was blocked.
    pub headline: &'static str,
    pub context: Option<&'static str>,
    /// Line introducing the replacement command.
    pub lead: &'static str,
    pub replacement: Replacement,
    pub reference_title: &'static str,
    /// Related approved commands for the same workflow area.
    pub reference: &'static [&'static str],
    pub footer: Option<&'static str>,
}

/// A named detection policy.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: &'static str,
    detect: Vec<Pattern>,
    escape: Vec<Pattern>,
    fields: Vec<FieldSpec>,
    hints: Vec<Hint>,
    vars: BTreeMap<&'static str, String>,
    template: Template,
}

impl Rule {
    pub fn builder(name: &'static str, template: Template) -> RuleBuilder {
        RuleBuilder {
            name,
            detect: Vec::new(),
            escape: Vec::new(),
            fields: Vec::new(),
            hints: Vec::new(),
            vars: BTreeMap::new(),
            rewrites: Vec::new(),
            template,
            error: None,
        }
    }

    pub fn detect(&self) -> &[Pattern] {
        &self.detect
    }

    pub fn escape(&self) -> &[Pattern] {
        &self.escape
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn hints(&self) -> &[Hint] {
        &self.hints
    }

    /// Constant placeholder values (from configuration).
    pub fn vars(&self) -> &BTreeMap<&'static str, String> {
        &self.vars
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

/// Builder for [`Rule`]. Pattern errors are collected and reported by
/// [`RuleBuilder::build`] so rule definitions read as one expression.
pub struct RuleBuilder {
    name: &'static str,
    detect: Vec<Pattern>,
    escape: Vec<Pattern>,
    fields: Vec<FieldSpec>,
    hints: Vec<Hint>,
    vars: BTreeMap<&'static str, String>,
    rewrites: Vec<Rewrite>,
    template: Template,
    error: Option<RuleError>,
}

impl RuleBuilder {
    fn compile(&mut self, anchor: Anchor, body: &str) -> Option<Pattern> {
        match Pattern::new(anchor, body) {
            Ok(p) => Some(p),
            Err(source) => {
                if self.error.is_none() {
                    self.error = Some(RuleError::InvalidPattern {
                        rule: self.name,
                        pattern: body.to_string(),
                        source,
                    });
                }
                None
            }
        }
    }

    /// Detection pattern anchored at a command position.
    pub fn command(mut self, body: &str) -> Self {
        if let Some(p) = self.compile(Anchor::Command, body) {
            self.detect.push(p);
        }
        self
    }

    /// Detection pattern that may match anywhere.
    pub fn anywhere(mut self, body: &str) -> Self {
        if let Some(p) = self.compile(Anchor::Anywhere, body) {
            self.detect.push(p);
        }
        self
    }

    pub fn escape(mut self, body: &str) -> Self {
        if let Some(p) = self.compile(Anchor::Anywhere, body) {
            self.escape.push(p);
        }
        self
    }

    pub fn escapes<S: AsRef<str>>(self, bodies: &[S]) -> Self {
        bodies.iter().fold(self, |b, body| b.escape(body.as_ref()))
    }

    pub fn field(mut self, field: Field) -> Self {
        if let Some(pattern) = self.compile(Anchor::Anywhere, &field.pattern) {
            self.fields.push(FieldSpec {
                name: field.name,
                pattern,
                group: field.group,
                fallback: field.fallback,
                prefix: field.prefix,
                suffix: field.suffix,
                transform: field.transform,
            });
        }
        self
    }

    pub fn hint(mut self, body: &str, text: &'static str) -> Self {
        if let Some(pattern) = self.compile(Anchor::Anywhere, body) {
            self.hints.push(Hint { pattern, text });
        }
        self
    }

    /// Detection pattern that may match anywhere; its matches are replaced
    /// by `with` when the rule uses [`Replacement::Rewrite`].
    pub fn rewrite(mut self, body: &str, with: impl Into<String>) -> Self {
        if let Some(pattern) = self.compile(Anchor::Anywhere, body) {
            self.detect.push(pattern.clone());
            self.rewrites.push(Rewrite {
                pattern,
                with: with.into(),
            });
        }
        self
    }

    pub fn var(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.vars.insert(name, value.into());
        self
    }

    pub fn build(mut self) -> Result<Rule, RuleError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if let Replacement::Rewrite(list) = &mut self.template.replacement {
            list.append(&mut self.rewrites);
        }
        Ok(Rule {
            name: self.name,
            detect: self.detect,
            escape: self.escape,
            fields: self.fields,
            hints: self.hints,
            vars: self.vars,
            template: self.template,
        })
    }
}

/// The built-in rule set families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleSetKind {
    Git,
    Package,
    Container,
}

impl RuleSetKind {
    pub const ALL: [RuleSetKind; 3] = [Self::Git, Self::Package, Self::Container];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleSetKind::Git => "git",
            RuleSetKind::Package => "package",
            RuleSetKind::Container => "container",
        }
    }
}

impl fmt::Display for RuleSetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleSetKind {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "git" => Ok(Self::Git),
            "package" => Ok(Self::Package),
            "container" => Ok(Self::Container),
            other => Err(RuleError::UnknownRuleSet(other.to_string())),
        }
    }
}

/// An ordered list of rules. Earlier rules take precedence.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub name: &'static str,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(name: &'static str, rules: Vec<Rule>) -> Self {
        Self { name, rules }
    }

    /// Build one of the built-in rule sets from configuration.
    pub fn build(kind: RuleSetKind, config: &Config) -> Result<Self, RuleError> {
        match kind {
            RuleSetKind::Git => git::rule_set(&config.git),
            RuleSetKind::Package => package::rule_set(&config.package),
            RuleSetKind::Container => container::rule_set(&config.container),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Template {
        Template {
            headline: "blocked",
            context: None,
            lead: "use:",
            replacement: Replacement::Format("ok"),
            reference_title: "see:",
            reference: &["ok - the approved form"],
            footer: None,
        }
    }

    #[test]
    fn command_anchor_matches_start() {
        let p = Pattern::new(Anchor::Command, r"git\s+push\b").unwrap();
        assert!(p.is_match("git push origin main"));
        assert!(p.is_match("   git push"));
    }

    #[test]
    fn command_anchor_matches_after_separators() {
        let p = Pattern::new(Anchor::Command, r"git\s+push\b").unwrap();
        assert!(p.is_match("cargo test && git push"));
        assert!(p.is_match("cargo test; git push"));
        assert!(p.is_match("cargo test\ngit push"));
    }

    #[test]
    fn command_anchor_ignores_mid_word() {
        let p = Pattern::new(Anchor::Command, r"git\s+push\b").unwrap();
        assert!(!p.is_match("echo git push"));
        assert!(!p.is_match("gt submit"));
    }

    #[test]
    fn patterns_are_case_insensitive() {
        let p = Pattern::new(Anchor::Command, r"git\s+push\b").unwrap();
        assert!(p.is_match("GIT PUSH"));
        let a = Pattern::new(Anchor::Anywhere, r"\bnpx\s+jest\b").unwrap();
        assert!(a.is_match("FOO=1 NPX jest"));
    }

    #[test]
    fn builder_reports_invalid_pattern() {
        let err = Rule::builder("broken", template())
            .command(r"git\s+push")
            .escape("([unclosed")
            .build()
            .unwrap_err();
        match err {
            RuleError::InvalidPattern { rule, pattern, .. } => {
                assert_eq!(rule, "broken");
                assert_eq!(pattern, "([unclosed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn builder_keeps_declared_order() {
        let rule = Rule::builder("ordered", template())
            .command("first")
            .anywhere("second")
            .build()
            .unwrap();
        assert_eq!(rule.detect().len(), 2);
        assert_eq!(rule.detect()[0].anchor(), Anchor::Command);
        assert_eq!(rule.detect()[1].anchor(), Anchor::Anywhere);
    }

    #[test]
    fn kind_from_str() {
        assert_eq!("git".parse::<RuleSetKind>().unwrap(), RuleSetKind::Git);
        assert_eq!(" Package ".parse::<RuleSetKind>().unwrap(), RuleSetKind::Package);
        assert!(matches!(
            "helm".parse::<RuleSetKind>(),
            Err(RuleError::UnknownRuleSet(name)) if name == "helm"
        ));
    }

    #[test]
    fn default_sets_build() {
        let config = Config::default_config();
        for kind in RuleSetKind::ALL {
            let set = RuleSet::build(kind, &config).unwrap();
            assert_eq!(set.name, kind.as_str());
            assert!(!set.rules().is_empty());
        }
    }
}
