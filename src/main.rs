//! cc-workflowgate: PreToolUse hook for Claude Code.
//!
//! Reads one hook request (JSON) from stdin. If the Bash command breaks a
//! project workflow convention, prints a deny decision with the command to
//! run instead; otherwise prints nothing. Always exits 0.

use cc_workflowgate::config::Config;
use cc_workflowgate::eval::Interceptor;
use cc_workflowgate::rules::RuleSetKind;
use cc_workflowgate::{hook, logging};

const USAGE: &str = "\
usage: cc-workflowgate [RULE_SET...] [--dump-config]

Reads a Claude Code PreToolUse request on stdin.

Rule sets:
  git        Graphite workflow (gt create / gt modify / gt submit)
  package    yarn instead of npx, no watch-mode test scripts
  container  RSpec and Rails inside docker compose

With no rule sets named, settings.rule_sets from the config is used.

Options:
  --dump-config  Print the merged configuration as TOML
  -h, --help     Print this help";

/// Resolve rule set names; unknown names are skipped.
fn select_rule_sets(names: &[String]) -> Vec<RuleSetKind> {
    let mut kinds = Vec::new();
    for name in names {
        match name.parse::<RuleSetKind>() {
            Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Ok(_) => {}
            Err(e) => log::warn!("{e}, skipping"),
        }
    }
    kinds
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return;
    }

    let config = Config::load();

    if args.iter().any(|a| a == "--dump-config") {
        match toml::to_string_pretty(&config) {
            Ok(s) => print!("{s}"),
            Err(e) => eprintln!("cc-workflowgate: cannot serialize config: {e}"),
        }
        return;
    }

    logging::init(&config.settings);

    let named: Vec<String> = args.into_iter().filter(|a| !a.starts_with('-')).collect();
    let kinds = if named.is_empty() {
        select_rule_sets(&config.settings.rule_sets)
    } else {
        select_rule_sets(&named)
    };

    let interceptor = match Interceptor::from_config(&config, &kinds) {
        Ok(i) => i,
        Err(e) => {
            log::error!("{e}; allowing");
            return;
        }
    };

    let limit = config.settings.max_input_bytes as u64;
    let Some(input) = hook::read_request(std::io::stdin().lock(), limit) else {
        return;
    };

    let (_, response) = hook::handle(&input, &interceptor);
    if let Some(line) = response {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_and_duplicate_names_skipped() {
        assert_eq!(select_rule_sets(&names(&["git", "helm", "git"])), vec![RuleSetKind::Git]);
    }

    #[test]
    fn order_preserved() {
        assert_eq!(
            select_rule_sets(&names(&["container", "Git"])),
            vec![RuleSetKind::Container, RuleSetKind::Git]
        );
    }

    #[test]
    fn nothing_known_selects_nothing() {
        assert!(select_rule_sets(&names(&["helm", ""])).is_empty());
    }

    #[test]
    fn default_rule_sets_all_known() {
        let config = Config::default_config();
        assert_eq!(select_rule_sets(&config.settings.rule_sets), RuleSetKind::ALL.to_vec());
    }
}
