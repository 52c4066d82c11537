//! Shared formatting helpers for terminal output

/// Format a trend percentage with a direction marker
pub fn format_trend(percent: i64) -> String {
    match percent.signum() {
        1 => format!("▲ {}%", percent),
        -1 => format!("▼ {}%", percent.abs()),
        _ => "0%".to_string(),
    }
}

/// Create a simple bar for a percentage, capped at full width
pub fn format_bar(percent: i64, width: usize) -> String {
    if percent <= 0 {
        return "░".repeat(width);
    }

    let filled = ((percent.min(100) as f64 / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);

    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Format a separator line
pub fn separator(width: usize) -> String {
    "─".repeat(width)
}

/// Truncate a string to a maximum number of characters with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
