use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Matches a `{{expr}}` placeholder inside a string leaf.
pub(crate) fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder regex compiles"))
}

fn func_call_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z0-9._\-]+)\s*(?:\((.*)\))?\s*$")
            .expect("func call regex compiles")
    })
}

/// Parses `name` or `name(arg1: 'v1', arg2: "v2")`. An expression that does
/// not fit the grammar comes back verbatim with no arguments.
pub(crate) fn parse_func_call(expr: &str) -> (String, HashMap<String, String>) {
    let Some(caps) = func_call_regex().captures(expr) else {
        return (expr.to_string(), HashMap::new());
    };
    let name = caps[1].to_string();
    let raw = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    if raw.is_empty() {
        return (name, HashMap::new());
    }
    (name, parse_args(raw))
}

/// Splits on top-level commas with no nested-parenthesis awareness; a literal
/// comma inside a value splits the argument. Known, preserved limitation.
fn parse_args(raw: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((key, value)) = part.split_once(':') else {
            continue;
        };
        out.insert(
            key.trim().to_string(),
            trim_quotes(value.trim()).to_string(),
        );
    }
    out
}

/// Strips one layer of matching single or double quotes.
fn trim_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_has_no_args() {
        let (name, args) = parse_func_call("random.UUID");
        assert_eq!(name, "random.UUID");
        assert!(args.is_empty());
    }

    #[test]
    fn args_with_mixed_quoting() {
        let (name, args) =
            parse_func_call("random.Date(format:'2006-01-02', startDate: \"2020-01-01\", raw: x)");
        assert_eq!(name, "random.Date");
        assert_eq!(args["format"], "2006-01-02");
        assert_eq!(args["startDate"], "2020-01-01");
        assert_eq!(args["raw"], "x");
    }

    #[test]
    fn empty_parens_yield_no_args() {
        let (name, args) = parse_func_call("random.Name()");
        assert_eq!(name, "random.Name");
        assert!(args.is_empty());
    }

    #[test]
    fn literal_comma_in_value_splits_the_argument() {
        // The splitter is deliberately naive; the quoted comma is not
        // protected.
        let (_, args) = parse_func_call("f(a: 'x,y', b: 'z')");
        assert_eq!(args["a"], "'x");
        assert_eq!(args["b"], "z");
    }

    #[test]
    fn unmatched_quotes_are_kept() {
        let (_, args) = parse_func_call("f(a: 'x\")");
        assert_eq!(args["a"], "'x\"");
    }
}
