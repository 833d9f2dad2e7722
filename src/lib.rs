//! cc-workflowgate: a PreToolUse hook for Claude Code that keeps an agent on
//! the project's workflow.
//!
//! Each candidate Bash command is matched against ordered rule sets. When a
//! rule fires, the command is denied with an explanation and the command to
//! run instead (`gt create` rather than `git checkout -b`, `yarn jest` rather
//! than `npx jest`, `docker compose exec ...` around `rspec`). Everything else,
//! including input the hook cannot read, is allowed.
//!
//! # Architecture
//!
//! - **[`rules`]** — Pattern library: declarative rules and the built-in rule sets.
//! - **[`eval`]** — Matcher, parameter extractor, message synthesizer, [`eval::Interceptor`].
//! - **[`hook`]** — Hook request/response JSON and the fail-open adapter.
//! - **[`config`]** — Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]** — Decision logging to `~/.local/share/cc-workflowgate/decisions.log`.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Evaluation engine: matcher, extractor, synthesizer, decisions.
pub mod eval;
/// Claude Code hook protocol adapter.
pub mod hook;
/// File-based decision logging.
pub mod logging;
/// Pattern library and built-in rule sets.
pub mod rules;

use eval::{Decision, Interceptor};
use rules::RuleSetKind;

/// Build every default rule set and evaluate a command string.
///
/// This is the main entry point for tests and simple usage.
/// For CLI usage with user config or a subset of rule sets, build an
/// [`Interceptor`] directly.
pub fn evaluate(command: &str) -> Decision {
    let config = config::Config::default_config();
    match Interceptor::from_config(&config, &RuleSetKind::ALL) {
        Ok(interceptor) => interceptor.evaluate(command),
        Err(e) => {
            log::error!("{e}");
            Decision::Allow
        }
    }
}
