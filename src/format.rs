//! Number formatting and text measurement for reports.

use unicode_width::UnicodeWidthStr;

/// Format a duration given in milliseconds.
pub fn format_ms(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.0} \u{00B5}s", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{:.2} ms", ms)
    } else {
        format!("{:.2} s", ms / 1000.0)
    }
}

/// Format an integer with `,` thousands separators.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a row count; fractional per-loop averages keep two decimals.
pub fn format_rows(rows: f64) -> String {
    if rows.fract() == 0.0 && rows >= 0.0 {
        format_count(rows as u64)
    } else {
        format!("{:.2}", rows)
    }
}

/// Terminal display width of `text` (wide characters count as 2).
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Pad `text` with spaces up to `width` display columns.
pub fn pad_right(text: &str, width: usize) -> String {
    let mut out = text.to_string();
    let current = display_width(text);
    if current < width {
        out.extend(std::iter::repeat_n(' ', width - current));
    }
    out
}

/// Widest display width among `items`.
pub fn max_width<'a>(items: impl IntoIterator<Item = &'a str>) -> usize {
    items.into_iter().map(display_width).max().unwrap_or(0)
}
