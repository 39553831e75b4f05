//! Command-line token normalization.
//!
//! The classic interface uses slash flags (`/devnum 3 /endhex 0A`). Tokens
//! are rewritten into `--name=value` form before clap sees them, so both
//! styles parse through the same `Cli` definition. Unknown tokens are set
//! aside for a warning instead of failing the run.

use comprinter::Error;

/// Flags that take one value, with the message used when it is missing.
const VALUE_FLAGS: &[(&str, &str)] = &[
    ("devnum", "no device number specified"),
    ("baudrate", "no baudrate value specified"),
    ("charcount", "number of characters not specified"),
    ("timeout", "timeout in ms not specified"),
    ("endchar", "terminating character not specified"),
    ("endhex", "terminating hex byte not specified"),
    ("config", "configuration file path not specified"),
];

/// Flags without a value.
const SWITCHES: &[&str] = &["keystrokes", "debug", "quiet"];

/// Tokens handed to clap untouched.
const PASSTHROUGH: &[&str] = &["-h", "--help", "-V", "--version"];

/// Result of [`normalize`].
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct NormalizedArgs {
    /// Tokens for clap, without the program name.
    pub(crate) args: Vec<String>,
    /// Tokens that matched no known flag.
    pub(crate) unrecognized: Vec<String>,
}

/// Rewrite slash and long flags into `--name[=value]` tokens.
///
/// A value flag always consumes the next token, even one that looks like a
/// flag. A value flag at the end of the line is a usage error.
pub(crate) fn normalize<I>(raw: I) -> comprinter::Result<NormalizedArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut out = NormalizedArgs::default();
    let mut tokens = raw.into_iter();

    while let Some(token) = tokens.next() {
        if PASSTHROUGH.contains(&token.as_str()) {
            out.args.push(token);
            continue;
        }

        let Some(flag) = flag_body(&token) else {
            out.unrecognized.push(token);
            continue;
        };
        let (name, inline_value) = match flag.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (flag, None),
        };

        if let Some(&(name, missing)) = VALUE_FLAGS.iter().find(|(known, _)| *known == name) {
            let value = match inline_value {
                Some(value) => value,
                None => tokens
                    .next()
                    .ok_or_else(|| Error::Argument(missing.to_string()))?,
            };
            out.args.push(format!("--{name}={value}"));
        } else if inline_value.is_none() && SWITCHES.contains(&name) {
            out.args.push(format!("--{name}"));
        } else {
            out.unrecognized.push(token);
        }
    }

    Ok(out)
}

fn flag_body(token: &str) -> Option<&str> {
    token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('/'))
        .filter(|body| !body.is_empty())
}

/// Terminator from a literal: the first character of the argument, which
/// must be ASCII. Other bytes are given with `/endhex`.
pub(crate) fn parse_end_char(s: &str) -> Result<u8, String> {
    match s.chars().next() {
        Some(c) if c.is_ascii() => u8::try_from(c).map_err(|e| e.to_string()),
        Some(c) => Err(format!(
            "'{c}' is not a single-byte character, use /endhex to give the byte value"
        )),
        None => Err("terminating character is empty".to_string()),
    }
}

/// Terminator from hex (`0A`, `0x0a`, `ff`); must fit in one byte.
pub(crate) fn parse_hex_byte(s: &str) -> Result<u8, String> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u8::from_str_radix(digits, 16).map_err(|e| format!("invalid hex byte '{s}': {e}"))
}

/// One-line message from a clap parse error, without clap's `error:` prefix
/// and usage footer.
pub(crate) fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}
