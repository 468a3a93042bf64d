use unicode_width::UnicodeWidthChar;

const TAB_WIDTH: usize = 4;

/// Makes a captured line safe to draw in one row: escape sequences and
/// control characters are dropped, tabs expand to the next stop, and a bare
/// `\r` keeps only what was written after it.
pub(super) fn sanitize_runtime_text(text: &str) -> String {
    let text = match text.rsplit_once('\r') {
        Some((_, tail)) if !tail.is_empty() => tail,
        Some((head, _)) => head,
        None => text,
    };

    let mut out = String::with_capacity(text.len());
    let mut column = 0usize;
    let mut in_escape = false;
    let mut in_csi = false;

    for ch in text.chars() {
        if in_escape {
            if in_csi {
                // CSI sequence terminates at bytes in range 0x40..0x7E.
                if ('@'..='~').contains(&ch) {
                    in_escape = false;
                    in_csi = false;
                }
                continue;
            }
            if ch == '[' {
                in_csi = true;
                continue;
            }
            in_escape = false;
            continue;
        }

        if ch == '\u{1b}' {
            in_escape = true;
            continue;
        }

        if ch == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
            continue;
        }

        if ch.is_control() {
            continue;
        }

        out.push(ch);
        column += UnicodeWidthChar::width(ch).unwrap_or(0);
    }

    out
}

pub(super) fn truncate_display_width(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > max_width {
            break;
        }
        out.push(ch);
        used += cw;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_color_codes() {
        assert_eq!(
            sanitize_runtime_text("\u{1b}[31merror\u{1b}[0m: boom"),
            "error: boom"
        );
    }

    #[test]
    fn expands_tabs_to_stops() {
        assert_eq!(sanitize_runtime_text("a\tb"), "a   b");
        assert_eq!(sanitize_runtime_text("\tx"), "    x");
    }

    #[test]
    fn carriage_return_keeps_last_segment() {
        assert_eq!(sanitize_runtime_text(" 10%\r 55%\r100%"), "100%");
        assert_eq!(sanitize_runtime_text("done\r"), "done");
    }

    #[test]
    fn truncates_by_display_width() {
        assert_eq!(truncate_display_width("hello", 3), "hel");
        assert_eq!(truncate_display_width("日本語", 4), "日本");
        assert_eq!(truncate_display_width("abc", 0), "");
    }
}
