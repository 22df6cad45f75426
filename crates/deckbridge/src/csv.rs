//! RFC-4180-style field escaping and a quote-aware line tokenizer.
//!
//! Lines are split on `\n` before tokenization, so a quoted field cannot
//! carry an embedded newline. Known limitation; see the crate docs.

/// Quote-wrap a field when it contains a comma, quote, or newline,
/// doubling any internal quotes.
pub(crate) fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Split one CSV line into fields.
///
/// Two consecutive quotes inside a quoted field emit one literal quote; a
/// bare quote toggles the quoted state; a comma outside quotes ends the
/// current field. The trailing field is always pushed, so a line with N
/// commas outside quotes yields N+1 fields.
pub(crate) fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain() {
        assert_eq!(escape_field("hello"), "hello");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn test_escape_comma() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(
            escape_field("He said \"hi\", twice"),
            "\"He said \"\"hi\"\", twice\""
        );
    }

    #[test]
    fn test_escape_newline() {
        assert_eq!(escape_field("a\nb"), "\"a\nb\"");
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(parse_line("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_empty_fields() {
        assert_eq!(parse_line(",,"), vec!["", "", ""]);
        assert_eq!(parse_line(""), vec![""]);
        assert_eq!(parse_line("a,"), vec!["a", ""]);
    }

    #[test]
    fn test_parse_quoted_comma() {
        assert_eq!(parse_line("\"a,b\",c"), vec!["a,b", "c"]);
    }

    #[test]
    fn test_parse_escaped_quote() {
        assert_eq!(
            parse_line("\"He said \"\"hi\"\", twice\",next"),
            vec!["He said \"hi\", twice", "next"]
        );
    }

    #[test]
    fn test_escape_parse_round_trip() {
        let original = "He said \"hi\", twice";
        let escaped = escape_field(original);
        let parsed = parse_line(&escaped);
        assert_eq!(parsed, vec![original]);
    }
}
