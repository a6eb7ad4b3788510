//! Description normalization for describe results.
//!
//! The raw description duplicates the one-line summary as its first line and
//! wraps list items over indented continuation lines. Normalization is an
//! ordered sequence of pure passes; each pass depends on the previous one's
//! output, so the order must not change:
//!
//! 1. drop the first line,
//! 2. rewrite bullet lines to carry a leading marker newline,
//! 3. collapse every newline to a space,
//! 4. collapse runs of two or more whitespace characters to one newline.

/// Characters that start a list item.
const BULLET_MARKERS: [char; 3] = ['*', '0', '-'];

/// Drop the first line of a description (a duplicate of the summary).
/// A description without a newline passes through whole.
pub fn strip_summary_line(text: &str) -> &str {
    match text.find('\n') {
        Some(i) => &text[i + 1..],
        None => text,
    }
}

/// Rewrite every line whose optional whitespace prefix is followed by a
/// bullet marker: the prefix and marker are replaced by a newline and a
/// normalized `*`. The injected newline survives the later passes as the
/// break in front of the list item.
pub fn mark_bullets(text: &str) -> String {
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| {
            let trimmed = line.trim_start_matches([' ', '\t']);
            match trimmed.chars().next() {
                Some(c) if BULLET_MARKERS.contains(&c) => {
                    format!("\n*{}", &trimmed[c.len_utf8()..])
                }
                _ => line.to_string(),
            }
        })
        .collect();
    lines.join("\n")
}

/// Replace every newline with a single space.
pub fn collapse_newlines(text: &str) -> String {
    text.replace('\n', " ")
}

/// Collapse every run of two or more whitespace characters into a single
/// newline. Single whitespace characters are kept as they are.
pub fn collapse_whitespace_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    for c in text.chars() {
        if c.is_whitespace() {
            run.push(c);
        } else {
            if run.chars().count() >= 2 {
                out.push('\n');
            } else {
                out.push_str(&run);
            }
            run.clear();
            out.push(c);
        }
    }
    if run.chars().count() >= 2 {
        out.push('\n');
    } else {
        out.push_str(&run);
    }
    out
}

/// Run the full normalization pipeline over a raw description.
pub fn normalize_description(raw: &str) -> String {
    let stripped = strip_summary_line(raw);
    let marked = mark_bullets(stripped);
    let flattened = collapse_newlines(&marked);
    collapse_whitespace_runs(&flattened)
}
