use crate::config::PackageConfig;
use crate::rules::{Field, Replacement, Rule, RuleError, RuleSet, Template};

const YARN_SCRIPTS: &[&str] = &[
    "yarn jest - run Jest directly without watch mode",
    "yarn test:ci - run the suite in CI mode without watch",
    "yarn lint - lint (also lint:fix, lint:quiet, lint:changed, lint:fix-changed)",
    "yarn tsc - type-check (also tsc:no-deps)",
    "yarn build - production build (also build:dev)",
    "yarn start - start the dev server",
    "yarn storybook - run Storybook (also build-storybook)",
];

/// `npx <tool>` detection body for one configured tool.
fn npx_body(tool: &str) -> String {
    format!(r"\bnpx\s+{}\b", regex::escape(tool))
}

/// Build the package-manager rule set.
///
/// Watch-mode test scripts are checked before npx so that a chain containing
/// both reports the script that would hang.
pub fn rule_set(config: &PackageConfig) -> Result<RuleSet, RuleError> {
    let watch = Rule::builder(
        "yarn-test-watch",
        Template {
            headline: "yarn test command intercepted - this script runs in watch mode and never exits.",
            context: Some(
                "The test, test:no-deps and test:changed scripts all run scripts/test.js, \
                 which defaults to watch mode.",
            ),
            lead: "Run Jest directly instead:",
            replacement: Replacement::Format("yarn {workspace}jest {file}"),
            reference_title: "Add flags as needed:",
            reference: &[
                "--watchAll=false - explicitly disable watch mode",
                "--coverage - collect a coverage report",
                "--verbose - detailed per-test output",
                "yarn test:ci - CI mode without watch",
            ],
            footer: None,
        },
    )
    .anywhere(r"\byarn\s+(?:workspace\s+\S+\s+)?test(?::no-deps|:changed)?(?:$|[\s;&|])")
    .escapes(&config.extra_escape)
    .field(Field::new("workspace", r"\byarn\s+workspace\s+(\S+)\s+test").wrap("workspace ", " "))
    .field(Field::new("file", r"(\S+\.(?:test|spec)\.[jt]sx?)\b"))
    .build()?;

    let npx = Rule::builder(
        "npx-to-yarn",
        Template {
            headline: "npx command intercepted - this project runs its tools through yarn.",
            context: None,
            lead: "Replacing npx with yarn for project consistency:\n{rewrites}\n\nSuggested command:",
            replacement: Replacement::Rewrite(Vec::new()),
            reference_title: "Available yarn scripts:",
            reference: YARN_SCRIPTS,
            footer: Some("Avoid 'yarn test': it runs in watch mode."),
        },
    )
    .escapes(&config.extra_escape)
    .hint(r"\bnpx\s+jest\b.*--coverage", "Consider using: yarn test:ci (runs without watch mode)")
    .hint(r"\bnpx\s+eslint\b.*--fix", "Consider using: yarn lint:fix or yarn eslint:fix")
    .hint(r"\bnpx\s+eslint\b.*--quiet", "Consider using: yarn lint:quiet")
    .hint(
        r"\bnpx\s+eslint\b.*\$\(git\s+diff",
        "Consider using: yarn lint:changed or yarn lint:fix-changed",
    )
    .hint(r"\bnpx\s+tsc\s+--build\b", "Consider using: yarn tsc or yarn tsc:no-deps");

    let npx = config
        .replacements
        .iter()
        .fold(npx, |b, r| b.rewrite(&npx_body(&r.tool), r.with.clone()))
        .build()?;

    Ok(RuleSet::new("package", vec![watch, npx]))
}
