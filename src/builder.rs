//! # Build-Script Builder
//!
//! Append-only accumulator for the output script. Emitters append fragments
//! in traversal order; nothing ever reformats the document as a whole.

use std::fmt::Write as _;

/// Accumulates the generated build script text.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    buf: String,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        ScriptBuilder::default()
    }

    /// Append a raw fragment.
    pub fn addtext(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consume the builder and return the accumulated script.
    pub fn build(self) -> String {
        self.buf
    }
}

/// Quote a string for the generated script (double quotes, JSON-style
/// escaping).
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Quote each item and join with single spaces.
pub fn quote_list<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    quote_list_sep(items, " ")
}

/// Quote each item and join with `separator`. Emitters pass an indented
/// newline separator for multi-line argument blocks.
pub fn quote_list_sep<I>(items: I, separator: &str) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| quote_string(item.as_ref()))
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addtext_accumulates_in_order() {
        let mut b = ScriptBuilder::new();
        b.addtext("# first\n");
        b.addtext("# second\n");
        assert_eq!(b.build(), "# first\n# second\n");
    }

    #[test]
    fn quotes_plain_strings() {
        assert_eq!(quote_string(".pb.h"), "\".pb.h\"");
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(quote_string(r#"a"b\c"#), r#""a\"b\\c""#);
        assert_eq!(quote_string("a\nb"), "\"a\\nb\"");
    }

    #[test]
    fn quote_list_joins_with_spaces() {
        assert_eq!(quote_list([".pb.h", ".pb.cc"]), "\".pb.h\" \".pb.cc\"");
        assert_eq!(quote_list(Vec::<String>::new()), "");
    }

    #[test]
    fn quote_list_sep_uses_the_given_separator() {
        assert_eq!(
            quote_list_sep(["a.proto", "b.proto"], "\n        "),
            "\"a.proto\"\n        \"b.proto\""
        );
    }
}
