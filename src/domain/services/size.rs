const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count for humans: `512 B`, `1.50 KB`, `20.00 MB`.
pub fn format_file_size(size_in_bytes: u64) -> String {
    if size_in_bytes < 1024 {
        return format!("{} B", size_in_bytes);
    }

    let mut size = size_in_bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}
