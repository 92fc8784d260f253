// src/exec/quote.rs

//! Shell-style quoting for command-line display.
//!
//! The engine never feeds these strings back to a shell; they exist so the
//! diagnostic log shows a command line that a human can copy-paste to
//! reproduce a run. `split` inverts `join` by standard double-quote rules
//! and is used by tests to check the round-trip.

/// Quote a single argument for display.
///
/// Arguments containing whitespace, quotes, or backslashes are wrapped in
/// double quotes with embedded `"` and `\` escaped; everything else is
/// passed through untouched.
pub fn quote(arg: &str) -> String {
    let needs_quoting =
        arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\');

    if !needs_quoting {
        return arg.to_string();
    }

    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Compose a display command line from a program and its arguments.
pub fn join(program: &str, args: &[String]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(quote(program));
    parts.extend(args.iter().map(|a| quote(a)));
    parts.join(" ")
}

/// Tokenize a command line by standard shell double-quote rules.
///
/// Inverse of [`join`]: whitespace separates tokens outside quotes, `"..."`
/// groups a token, and `\` escapes the next character inside quotes.
pub fn split(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                // An opening quote starts a token even if it's empty ("").
                in_token = true;
            }
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        tokens.push(current);
    }

    tokens
}
