use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

/// Bold a header line when stdout is a terminal
pub fn header(text: &str) -> String {
    if std::io::stdout().is_terminal() {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

/// Truncate to `max_chars`, respecting UTF-8 character boundaries
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long file name.pdf", 10), "a very ...");
        // multibyte content must not split inside a char
        assert_eq!(truncate("éééééééééééé", 6), "ééé...");
    }
}
