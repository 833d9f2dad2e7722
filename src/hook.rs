//! Claude Code `PreToolUse` hook protocol.
//!
//! One JSON request in, at most one JSON line out. Anything that cannot be
//! interpreted as a Bash pre-execution event allows: the hook fails open.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::eval::{Decision, Interceptor};

/// The only event this hook governs.
pub const HOOK_EVENT: &str = "PreToolUse";
/// The only tool this hook governs.
pub const BASH_TOOL: &str = "Bash";

/// Input structure from Claude Code's `PreToolUse` hook.
#[derive(Debug, Deserialize)]
pub struct HookInput {
    pub hook_event_name: Option<String>,
    pub tool_name: Option<String>,
    pub tool_input: Option<ToolInput>,
}

#[derive(Debug, Deserialize)]
pub struct ToolInput {
    /// Left untyped so a non-string command allows instead of failing the parse.
    pub command: Option<serde_json::Value>,
}

impl HookInput {
    /// The command text, if this is a Bash pre-execution event.
    pub fn command(&self) -> Option<&str> {
        if self.hook_event_name.as_deref() != Some(HOOK_EVENT)
            || self.tool_name.as_deref() != Some(BASH_TOOL)
        {
            return None;
        }
        self.tool_input.as_ref()?.command.as_ref()?.as_str()
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HookOutput {
    #[serde(rename = "hookSpecificOutput")]
    pub hook_specific_output: HookSpecificOutput,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: &'static str,
    pub permission_decision: &'static str,
    pub permission_decision_reason: String,
}

impl HookOutput {
    /// Response for a decision; `None` for allow, which is signalled by silence.
    pub fn from_decision(decision: &Decision) -> Option<Self> {
        match decision {
            Decision::Allow => None,
            Decision::Deny { reason, .. } => Some(Self {
                hook_specific_output: HookSpecificOutput {
                    hook_event_name: HOOK_EVENT,
                    permission_decision: decision.as_str(),
                    permission_decision_reason: reason.clone(),
                },
            }),
        }
    }
}

/// Read one raw request, at most `limit` bytes (`0` means unlimited).
///
/// `None` when the reader fails, the bytes are not UTF-8, or the request is
/// over the limit. Callers allow in every such case.
pub fn read_request<R: Read>(reader: R, limit: u64) -> Option<String> {
    let cap = if limit > 0 { limit.saturating_add(1) } else { u64::MAX };
    let mut input = String::new();
    if let Err(e) = reader.take(cap).read_to_string(&mut input) {
        log::warn!("failed to read request: {e}; allowing");
        return None;
    }
    if limit > 0 && input.len() as u64 > limit {
        log::warn!("request larger than {limit} bytes; allowing");
        return None;
    }
    Some(input)
}

/// Parse a raw request and return the command to evaluate, if any.
pub fn parse_request(raw: &str) -> Option<String> {
    let input: HookInput = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("unparseable hook input, allowing: {e}");
            return None;
        }
    };
    input.command().map(str::to_string)
}

/// Evaluate a raw request. Returns the decision for logging and the
/// response line to print (`None` means print nothing).
///
/// The process exit status is success regardless of the outcome.
pub fn handle(raw: &str, interceptor: &Interceptor) -> (Decision, Option<String>) {
    let Some(command) = parse_request(raw) else {
        return (Decision::Allow, None);
    };
    let decision = interceptor.evaluate(&command);
    crate::logging::log_decision(&command, &decision);
    let response =
        HookOutput::from_decision(&decision).and_then(|out| serde_json::to_string(&out).ok());
    (decision, response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rules::RuleSetKind;

    fn interceptor() -> Interceptor {
        Interceptor::from_config(&Config::default_config(), &RuleSetKind::ALL).unwrap()
    }

    fn request(command: &str) -> String {
        serde_json::json!({
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "tool_input": { "command": command },
        })
        .to_string()
    }

    #[test]
    fn read_within_limit() {
        let raw = request("git push");
        let limit = raw.len() as u64;
        assert_eq!(read_request(raw.as_bytes(), limit), Some(raw.clone()));
        assert_eq!(read_request(raw.as_bytes(), 0), Some(raw));
    }

    #[test]
    fn oversized_request_rejected() {
        let raw = request(&"x".repeat(64));
        assert_eq!(read_request(raw.as_bytes(), 16), None);
    }

    #[test]
    fn invalid_utf8_rejected() {
        let raw: &[u8] = b"{\"tool_input\":{\"command\":\"git push \xff\"}}";
        assert_eq!(read_request(raw, 0), None);
        assert_eq!(read_request(raw, 1024), None);
    }

    #[test]
    fn deny_response_shape() {
        let (decision, out) = handle(&request("git push"), &interceptor());
        assert!(decision.is_deny());
        let v: serde_json::Value = serde_json::from_str(&out.unwrap()).unwrap();
        let h = &v["hookSpecificOutput"];
        assert_eq!(h["hookEventName"], "PreToolUse");
        assert_eq!(h["permissionDecision"], "deny");
        assert!(h["permissionDecisionReason"].as_str().unwrap().contains("gt submit"));
    }

    #[test]
    fn allow_is_silent() {
        let (decision, out) = handle(&request("ls -la"), &interceptor());
        assert_eq!(decision, Decision::Allow);
        assert!(out.is_none());
    }

    #[test]
    fn malformed_input_allows() {
        for raw in ["", "not json", "{", "[1,2]", "null", r#"{"tool_name": 5}"#] {
            let (decision, out) = handle(raw, &interceptor());
            assert_eq!(decision, Decision::Allow, "input: {raw}");
            assert!(out.is_none());
        }
    }

    #[test]
    fn truncated_request_allows() {
        let raw = request("git push");
        let cut = &raw[..raw.len() / 2];
        assert_eq!(handle(cut, &interceptor()).0, Decision::Allow);
    }

    #[test]
    fn other_events_and_tools_allow() {
        let post = r#"{"hook_event_name":"PostToolUse","tool_name":"Bash","tool_input":{"command":"git push"}}"#;
        let write = r#"{"hook_event_name":"PreToolUse","tool_name":"Write","tool_input":{"command":"git push"}}"#;
        let no_event = r#"{"tool_name":"Bash","tool_input":{"command":"git push"}}"#;
        for raw in [post, write, no_event] {
            assert_eq!(handle(raw, &interceptor()).0, Decision::Allow, "input: {raw}");
        }
    }

    #[test]
    fn missing_or_odd_command_allows() {
        let missing = r#"{"hook_event_name":"PreToolUse","tool_name":"Bash","tool_input":{}}"#;
        let number = r#"{"hook_event_name":"PreToolUse","tool_name":"Bash","tool_input":{"command":42}}"#;
        let no_input = r#"{"hook_event_name":"PreToolUse","tool_name":"Bash"}"#;
        for raw in [missing, number, no_input] {
            assert_eq!(handle(raw, &interceptor()).0, Decision::Allow, "input: {raw}");
        }
    }

    #[test]
    fn extra_fields_ignored() {
        let raw = r#"{"session_id":"abc","cwd":"/tmp","hook_event_name":"PreToolUse","tool_name":"Bash","tool_input":{"command":"git push","description":"push"}}"#;
        assert!(handle(raw, &interceptor()).0.is_deny());
    }

    #[test]
    fn identical_requests_identical_responses() {
        let raw = request("git checkout -b feature/login");
        let a = handle(&raw, &interceptor()).1;
        let b = handle(&raw, &interceptor()).1;
        assert!(a.is_some());
        assert_eq!(a, b);
    }
}
