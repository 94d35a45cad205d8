use harvest_core::{AppViewModel, ConnectionCount, Notice, SessionState, Severity};

pub fn session_label(session: SessionState) -> &'static str {
    match session {
        SessionState::Idle => "Idle",
        SessionState::Running => "Running",
        SessionState::Cancelling => "Cancelling",
        SessionState::Completed => "Completed",
        SessionState::Cancelled => "Cancelled",
        SessionState::Failed => "Failed",
    }
}

/// One status line for the current view, e.g. `Running | 3 / 10 (30%)`.
pub fn status_line(view: &AppViewModel) -> String {
    let label = session_label(view.session);
    match view.progress {
        Some(progress) => format!(
            "{label} | {} / {} ({}%)",
            format_with_commas(progress.completed as u64),
            format_with_commas(progress.total as u64),
            progress.percent
        ),
        None => label.to_string(),
    }
}

/// The count, plus an explanation when the page and the enumeration disagree.
pub fn count_lines(count: &ConnectionCount) -> Vec<String> {
    let mut lines = vec![format!(
        "{} connections",
        format_with_commas(count.verified_count as u64)
    )];
    if !count.is_consistent() {
        lines.push(format!(
            "The number of connections shown in the page is {} but the actual number of connections is {}.",
            format_with_commas(count.displayed_count as u64),
            format_with_commas(count.verified_count as u64)
        ));
    }
    lines
}

pub fn notice_line(notice: &Notice) -> String {
    let prefix = match notice.severity {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    format!("{prefix}: {}", notice.text)
}

/// Final summary once a harvest has ended.
pub fn summary_lines(view: &AppViewModel) -> Vec<String> {
    let Some(summary) = &view.summary else {
        return Vec::new();
    };
    let mut lines = vec![format!(
        "{}: {} of {} connections exported ({} processed)",
        session_label(view.session),
        format_with_commas(summary.succeeded as u64),
        format_with_commas(summary.total as u64),
        format_with_commas(summary.processed as u64)
    )];
    if !summary.failed.is_empty() {
        lines.push(format!(
            "{} lookups failed: {}",
            summary.failed.len(),
            summary.failed.join(", ")
        ));
    }
    lines
}

fn format_with_commas(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
