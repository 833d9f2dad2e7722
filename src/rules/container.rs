use crate::config::ContainerConfig;
use crate::rules::{Field, Replacement, Rule, RuleError, RuleSet, Template, Transform};

/// Commands that already run inside a container.
const IN_CONTAINER: &[&str] = &[r"docker\s+compose\s+exec", r"docker\s+exec"];

/// Build the containerized test and Rails rule set.
///
/// `{exec}` and `{service}` placeholders are filled from configuration.
pub fn rule_set(config: &ContainerConfig) -> Result<RuleSet, RuleError> {
    let rspec = Rule::builder(
        "rspec-outside-container",
        Template {
            headline: "RSpec command intercepted - specs must run inside the {service} container.",
            context: Some(
                "The {service} Rails app runs in Docker. Paths inside the container start \
                 at the app root, so use relative paths like ./packs/... or ./spec/...",
            ),
            lead: "Run the spec with:",
            replacement: Replacement::Format(
                "{exec} {service} bundle exec rspec {spec_path}{format}",
            ),
            reference_title: "Common patterns:",
            reference: &[
                "Single file: {exec} {service} bundle exec rspec ./spec/models/user_spec.rb",
                "With line number: {exec} {service} bundle exec rspec ./spec/models/user_spec.rb:42",
                "Entire pack: {exec} {service} bundle exec rspec ./packs/<pack>",
            ],
            footer: None,
        },
    )
    .escapes(IN_CONTAINER)
    .escapes(&config.extra_escape)
    .command(r"bin/rspec\b")
    .command(r"bundle\s+exec\s+rspec\b")
    .command(r"rspec\b")
    .field(
        Field::new("spec_path", r"(?:rspec|bin/rspec)\s+(\S+\.rb(?::\d+)?)")
            .fallback("./spec/path/to/spec.rb")
            .transform(Transform::StripRoots(config.host_roots.clone())),
    )
    .field(Field::new("format", r"(?:--format|-f)\s+(\w+)").wrap(" --format ", ""))
    .var("exec", config.exec.clone())
    .var("service", config.service.clone())
    .build()?;

    let rails = Rule::builder(
        "rails-outside-container",
        Template {
            headline: "Rails command intercepted - Rails must run inside the {service} container.",
            context: Some("The {service} Rails app runs in Docker."),
            lead: "Run the Rails command with:",
            replacement: Replacement::Format("{exec} {service} bundle exec rails {rails_cmd}"),
            reference_title: "Common commands:",
            reference: &[
                "Migrations: {exec} {service} bundle exec rails db:migrate",
                "Console: {exec} {service} bundle exec rails console",
                "Generate: {exec} {service} bundle exec rails generate ...",
            ],
            footer: None,
        },
    )
    .escapes(IN_CONTAINER)
    .escapes(&config.extra_escape)
    .command(r"bundle\s+exec\s+rails\b")
    .command(r"bin/rails\b")
    .command(r"rails\s+(?:db:|console\b|server\b|generate\b|g\s)")
    .field(
        Field::new(
            "rails_cmd",
            r"(?m)(?:^|;|&&)\s*(?:bundle\s+exec\s+rails|bin/rails|rails)\s+([^;&\n]+)",
        )
        .fallback("[command]"),
    )
    .var("exec", config.exec.clone())
    .var("service", config.service.clone())
    .build()?;

    Ok(RuleSet::new("container", vec![rspec, rails]))
}
