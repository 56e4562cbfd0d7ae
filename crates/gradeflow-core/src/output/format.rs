//! Escaping and list formatting for workflow outputs and comments

/// Escape for GitHub Actions workflow command data (percent-encoding special chars)
pub fn safe_output_escape(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a plain log line so it cannot be read as a workflow command
pub fn safe_log_escape(s: &str) -> String {
    let escaped = safe_output_escape(s);
    if escaped.starts_with("::") {
        format!(" {escaped}")
    } else {
        escaped
    }
}

/// Markdown numbered list, one `  1. message` line per entry.
///
/// Markdown renumbers the items, so every line uses `1.`. The trailing
/// newline lets lists from several steps be concatenated.
pub fn format_error_list<S: AsRef<str>>(messages: &[S]) -> String {
    let mut buf = String::with_capacity(messages.len() * 64);
    for message in messages {
        buf.push_str("  1. ");
        buf.push_str(message.as_ref());
        buf.push('\n');
    }
    buf
}

/// Pick a heredoc delimiter that does not occur in `value`
pub fn heredoc_delimiter(value: &str) -> String {
    let mut delim = String::from("GRADEFLOW_EOF");
    while value.lines().any(|line| line == delim) {
        delim.push('_');
    }
    delim
}
