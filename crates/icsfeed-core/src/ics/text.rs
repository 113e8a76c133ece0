//! Text escaping and line folding for iCalendar content lines.

/// Line terminator mandated by RFC 5545.
pub const CRLF: &str = "\r\n";

/// Longest content line, in octets, before it is folded.
pub const MAX_LINE_OCTETS: usize = 75;

/// Escapes HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Escapes a value for an iCalendar TEXT property.
///
/// HTML entities are applied first, then backslash, semicolon and comma
/// get their iCalendar escapes. Line breaks are left alone.
pub fn escape_text(s: &str) -> String {
    let html = html_escape(s);
    let mut out = String::with_capacity(html.len());
    for ch in html.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            _ => out.push(ch),
        }
    }
    out
}

/// Turns every embedded line break into a continuation sequence and trims
/// trailing whitespace.
pub fn continue_lines(s: &str) -> String {
    s.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "\r\n ")
        .trim_end()
        .to_string()
}

/// Escapes a property value the way it is written into the feed.
pub fn text_value(s: &str) -> String {
    continue_lines(&escape_text(s))
}

/// Escapes a value for use inside a quoted parameter such as `CN="..."`.
///
/// Quoted parameters cannot contain DQUOTE or control characters.
pub fn param_value(s: &str) -> String {
    html_escape(s)
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

/// Appends `line` to `out`, folding it so no physical line exceeds
/// [`MAX_LINE_OCTETS`]. Folds never split a UTF-8 character.
pub fn fold_into(out: &mut String, line: &str) {
    let mut width = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > MAX_LINE_OCTETS {
            out.push_str(CRLF);
            out.push(' ');
            width = 1;
        }
        out.push(ch);
        width += len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_entities() {
        assert_eq!(
            html_escape(r#"<b>Tom & "Jerry's"</b>"#),
            "&lt;b&gt;Tom &amp; &quot;Jerry&#x27;s&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn ical_specials_are_escaped() {
        assert_eq!(escape_text(r"a,b;c\d"), r"a\,b\;c\\d");
    }

    #[test]
    fn entity_semicolons_are_escaped() {
        assert_eq!(escape_text("R&D"), r"R&amp\;D");
        assert_eq!(escape_text("<x>"), r"&lt\;x&gt\;");
    }

    #[test]
    fn newlines_become_continuations() {
        assert_eq!(continue_lines("one\ntwo"), "one\r\n two");
        assert_eq!(continue_lines("one\r\ntwo\rthree"), "one\r\n two\r\n three");
    }

    #[test]
    fn trailing_whitespace_trimmed() {
        assert_eq!(continue_lines("note  \n\n"), "note");
        assert_eq!(text_value("line\n"), "line");
    }

    #[test]
    fn escaped_value_has_no_bare_reserved_characters() {
        let value = text_value("a,b;c\\d <e> & f\nnext line\r\nlast");

        // Every `;` and `,` is preceded by a backslash.
        let bytes = value.as_bytes();
        for (i, b) in bytes.iter().enumerate() {
            if *b == b';' || *b == b',' {
                assert_eq!(bytes[i - 1], b'\\', "unescaped {:?} in {value}", *b as char);
            }
        }
        assert!(!value.contains('<'));
        assert!(!value.contains('>'));
        assert!(!value.contains("& "));

        // Every line break is a CRLF followed by a continuation space.
        for (i, _) in value.match_indices('\n') {
            assert_eq!(&value[i - 1..i], "\r");
            assert_eq!(&value[i + 1..i + 2], " ");
        }
    }

    #[test]
    fn param_value_drops_quotes_and_controls() {
        assert_eq!(param_value("The \"Family\"\n"), "The &quot;Family&quot;");
    }

    #[test]
    fn short_line_not_folded() {
        let mut out = String::new();
        fold_into(&mut out, "SUMMARY:Dentist");
        assert_eq!(out, "SUMMARY:Dentist");
    }

    #[test]
    fn long_line_folded_at_75_octets() {
        let line = format!("DESCRIPTION:{}", "x".repeat(150));
        let mut out = String::new();
        fold_into(&mut out, &line);

        let physical: Vec<&str> = out.split(CRLF).collect();
        assert_eq!(physical.len(), 3);
        assert_eq!(physical[0].len(), 75);
        assert!(physical[1].starts_with(' '));
        assert!(physical.iter().all(|l| l.len() <= 75));
        assert_eq!(out.replace("\r\n ", ""), line);
    }

    #[test]
    fn folding_respects_char_boundaries() {
        let line = format!("SUMMARY:{}", "é".repeat(60));
        let mut out = String::new();
        fold_into(&mut out, &line);

        for physical in out.split(CRLF) {
            assert!(physical.len() <= 75);
        }
        assert_eq!(out.replace("\r\n ", ""), line);
    }
}
