//! Common utilities

/// Check if a command is available in PATH
pub fn command_exists(cmd: &str) -> bool {
    std::process::Command::new("which")
        .arg(cmd)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Byte offset into `line` as a character offset.
///
/// Offsets past the end or inside a multi-byte character snap back to the
/// previous character boundary.
pub fn byte_to_char_offset(line: &str, byte: usize) -> u32 {
    let mut end = byte.min(line.len());
    while end > 0 && !line.is_char_boundary(end) {
        end -= 1;
    }
    line[..end].chars().count() as u32
}
