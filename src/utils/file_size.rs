const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Human-readable size for the selection list, e.g. `12.40 KB`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    match unit {
        0 => format!("{} {}", bytes, UNITS[0]),
        _ => format!("{:.2} {}", size, UNITS[unit]),
    }
}
