//! Message codec: GTP request lines in, response blocks out.
//!
//! A request is one line, optionally starting with a numeric id:
//!
//! ```text
//! 12 play black D4
//! ```
//!
//! A response starts with `=` (success) or `?` (failure), echoes the id if
//! there was one, and always ends with an empty line:
//!
//! ```text
//! =12
//!
//! ```

use thiserror::Error;

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Numeric id, present only when the first token is all digits
    pub id: Option<u64>,
    /// Command name; `None` when the line held nothing but an id
    pub command: Option<String>,
    /// Everything after the command name, trimmed and not tokenized
    pub arguments: Option<String>,
}

/// Failure to parse a request line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("message id out of range: {0}")]
    IdOutOfRange(String),
}

/// A parsed response block received from a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub success: bool,
    pub id: Option<u64>,
    /// Response text without the status character, id and terminator
    pub payload: String,
}

/// Failure to parse a response block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error("empty response")]
    Empty,
    #[error("response does not start with '=' or '?': {0:?}")]
    BadStatus(String),
}

// =============================================================================
// Preprocessing
// =============================================================================

fn is_protocol_char(c: char) -> bool {
    c == '\t' || c == '\n' || (' '..='~').contains(&c)
}

/// Clean a line received by an engine.
///
/// Removes control and non-ASCII characters (tab and newline survive), drops
/// everything from the first `#`, and turns tabs into spaces.
pub fn sanitize_for_engine(line: &str) -> String {
    let cleaned: String = line.chars().filter(|&c| is_protocol_char(c)).collect();
    let without_comment = match cleaned.find('#') {
        Some(pos) => &cleaned[..pos],
        None => &cleaned[..],
    };
    without_comment.replace('\t', " ")
}

/// Clean a line received by a controller. Comments are kept.
pub fn sanitize_for_controller(line: &str) -> String {
    line.chars()
        .filter(|&c| is_protocol_char(c))
        .map(|c| if c == '\t' { ' ' } else { c })
        .collect()
}

// =============================================================================
// Requests
// =============================================================================

/// Split off the first whitespace-delimited token.
fn split_first(s: &str) -> (&str, Option<&str>) {
    match s.split_once(char::is_whitespace) {
        Some((first, rest)) => {
            let rest = rest.trim_start();
            (first, (!rest.is_empty()).then_some(rest))
        }
        None => (s, None),
    }
}

/// Parse one request line into id, command and arguments.
///
/// An empty or blank line yields an empty command rather than an error.
pub fn parse_message(line: &str) -> Result<Message, MessageError> {
    let cleaned = sanitize_for_engine(line);
    let (first, rest) = split_first(cleaned.trim());

    if !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit()) {
        let id = first
            .parse::<u64>()
            .map_err(|_| MessageError::IdOutOfRange(first.to_string()))?;
        let (command, arguments) = match rest.map(split_first) {
            Some((command, arguments)) => (Some(command.to_string()), arguments.map(String::from)),
            None => (None, None),
        };
        return Ok(Message {
            id: Some(id),
            command,
            arguments,
        });
    }

    Ok(Message {
        id: None,
        command: Some(first.to_string()),
        arguments: rest.map(String::from),
    })
}

// =============================================================================
// Responses
// =============================================================================

fn format_response(status: char, id: Option<u64>, response: &str) -> String {
    let id = id.map(|i| i.to_string()).unwrap_or_default();
    if response.is_empty() {
        format!("{status}{id}\n\n")
    } else {
        format!("{status}{id} {response}\n\n")
    }
}

/// Format a success response block, e.g. `=12 Q16\n\n`.
pub fn format_success(id: Option<u64>, response: &str) -> String {
    format_response('=', id, response)
}

/// Format a failure response block, e.g. `?7 unacceptable size\n\n`.
pub fn format_error(id: Option<u64>, response: &str) -> String {
    format_response('?', id, response)
}

/// GTP boolean.
pub fn format_boolean(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// GTP multi-line list.
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a response block as read from a peer.
///
/// Leading blank lines are skipped, so engines that emit a newline before each
/// response are accepted.
pub fn parse_response(block: &str) -> Result<Response, ResponseError> {
    let cleaned = sanitize_for_controller(block);
    let text = cleaned.trim_start_matches(|c: char| c.is_whitespace());
    let mut chars = text.chars();

    let success = match chars.next() {
        Some('=') => true,
        Some('?') => false,
        Some(_) => return Err(ResponseError::BadStatus(text.trim_end().to_string())),
        None => return Err(ResponseError::Empty),
    };

    let rest = chars.as_str();
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let id = rest[..digits].parse::<u64>().ok();

    Ok(Response {
        success,
        id,
        payload: rest[digits..].trim().to_string(),
    })
}
