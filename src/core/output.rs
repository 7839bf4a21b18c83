//! Compact output rendering helpers for CLI surfaces.

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Fixed-width text progress bar, e.g. `[#####-----]`.
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let clamped = fraction.clamp(0.0, 1.0);
    let filled = (clamped * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Render a millisecond timestamp as `<secs>Z`, matching the audit log format.
pub fn epoch_ms_z(ms: i64) -> String {
    format!("{}Z", ms.div_euclid(1000))
}
