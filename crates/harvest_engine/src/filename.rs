use harvest_core::ExportFormat;

const PREFIX: &str = "connections";

/// `connections-{stamp}.{csv|json}`, with the stamp made filename-safe.
pub fn export_filename(format: ExportFormat, stamp: &str) -> String {
    let stamp = sanitize_stamp(stamp);
    if stamp.is_empty() {
        format!("{PREFIX}.{}", format.extension())
    } else {
        format!("{PREFIX}-{stamp}.{}", format.extension())
    }
}

fn sanitize_stamp(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut prev_dash = false;
    for c in input.trim().chars() {
        let c = if is_forbidden(c) || c.is_whitespace() { '-' } else { c };
        // Collapse runs of replaced characters.
        if c == '-' {
            if !prev_dash {
                cleaned.push(c);
            }
            prev_dash = true;
        } else {
            cleaned.push(c);
            prev_dash = false;
        }
    }
    cleaned.trim_matches(&['-', '.'][..]).to_string()
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}
