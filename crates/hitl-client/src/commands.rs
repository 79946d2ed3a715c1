//! Parsing of interactive CLI input.

use hitl_contract::{Decision, InterruptData};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Status,
    New,
    Sessions,
    Active,
    System,
    Delete,
    Remember(String),
    Help,
    Query(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        match (head.to_ascii_lowercase().as_str(), rest.is_empty()) {
            ("", _) => Self::Empty,
            ("exit" | "quit", true) => Self::Exit,
            ("status", true) => Self::Status,
            ("new", true) => Self::New,
            ("sessions", true) => Self::Sessions,
            ("active", true) => Self::Active,
            ("system", true) => Self::System,
            ("delete", true) => Self::Delete,
            ("help", true) => Self::Help,
            ("remember", false) => Self::Remember(rest.to_string()),
            _ => Self::Query(line.to_string()),
        }
    }
}

pub const HELP: &str = "Commands:\n  \
    <text>            send a query\n  \
    status            show the current session record\n  \
    new               start a new session\n  \
    sessions          list your sessions\n  \
    active            show your most recently used session\n  \
    system            show service-wide session counts\n  \
    delete            delete the current session and start a new one\n  \
    remember <text>   store a long-term preference\n  \
    exit              quit";

pub const DECISION_HELP: &str = "Reply with one of:\n  \
    yes                 approve as proposed\n  \
    no [reason]         reject\n  \
    edit <json|amount>  approve with new arguments or a new refund amount\n  \
    response <text>     reply without executing";

/// Parse a reviewer reply to `interrupt`.
///
/// `edit <amount>` replaces `refund_amount` in the proposed arguments.
pub fn parse_decision(line: &str, interrupt: &InterruptData) -> Result<Decision, String> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    match head.to_ascii_lowercase().as_str() {
        "yes" | "y" | "accept" if rest.is_empty() => Ok(Decision::Accept),
        "no" | "n" | "reject" => Ok(Decision::Reject {
            reason: (!rest.is_empty()).then(|| rest.to_string()),
        }),
        "edit" => parse_edit(rest, &interrupt.action_request.args),
        "response" if !rest.is_empty() => Ok(Decision::Response {
            args: rest.to_string(),
        }),
        "response" => Err("response needs text".to_string()),
        _ => Err(format!("unrecognized reply '{line}'")),
    }
}

fn parse_edit(rest: &str, proposed: &Value) -> Result<Decision, String> {
    if rest.is_empty() {
        return Err("edit needs new arguments or a new amount".to_string());
    }
    if let Ok(amount) = rest.trim_start_matches('¥').parse::<f64>() {
        let mut args = proposed.clone();
        let Some(map) = args.as_object_mut() else {
            return Err("proposed arguments are not an object".to_string());
        };
        map.insert("refund_amount".to_string(), Value::from(amount));
        return Ok(Decision::Edit { args });
    }
    match serde_json::from_str::<Value>(rest) {
        Ok(args @ Value::Object(_)) => Ok(Decision::Edit { args }),
        Ok(_) => Err("edit arguments must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}
