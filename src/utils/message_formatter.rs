/// Pure functions for quote message formatting (Discord-agnostic)

/// Build the message body for a quote delivery
pub fn format_quote_message(text: &str, author: Option<&str>) -> String {
    let header = build_default_header();
    let body = format_quote_body(text, author);
    format!("{}\n\n{}", header, body)
}

/// Default header shown above every delivered quote
pub fn build_default_header() -> String {
    "💬 **Quote of the day**".to_string()
}

/// Format the quote itself as a block quote with optional attribution
pub fn format_quote_body(text: &str, author: Option<&str>) -> String {
    let quoted = text
        .lines()
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n");

    match author {
        Some(author) if !author.trim().is_empty() => format!("{}\n— *{}*", quoted, author.trim()),
        _ => quoted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_quote_body_with_author() {
        let body = format_quote_body("Stay hungry, stay foolish.", Some("Steve Jobs"));
        assert_eq!(body, "> Stay hungry, stay foolish.\n— *Steve Jobs*");
    }

    #[test]
    fn test_format_quote_body_without_author() {
        let body = format_quote_body("Keep going.", None);
        assert_eq!(body, "> Keep going.");
    }

    #[test]
    fn test_format_quote_body_blank_author_is_dropped() {
        let body = format_quote_body("Keep going.", Some("   "));
        assert_eq!(body, "> Keep going.");
    }

    #[test]
    fn test_format_quote_body_multiline() {
        let body = format_quote_body("First line.\nSecond line.", None);
        assert_eq!(body, "> First line.\n> Second line.");
    }

    #[test]
    fn test_format_quote_message_has_header() {
        let message = format_quote_message("Onward.", Some("A. Nonymous"));
        assert!(message.starts_with("💬 **Quote of the day**"));
        assert!(message.contains("> Onward."));
        assert!(message.contains("*A. Nonymous*"));
    }
}
