//! File-name sanitization
//!
//! Every composed name ends up as part of an artifact file name, so all
//! untrusted qualifier text goes through [`scrub`] before it reaches the
//! scope stack. The replacement rule is part of the public contract.

/// Character substituted for every invalid file-name character
pub const PLACEHOLDER: char = '_';

#[cfg(windows)]
const RESERVED: &[char] = &['"', '<', '>', '|', ':', '*', '?', '\\', '/'];

#[cfg(not(windows))]
const RESERVED: &[char] = &['/'];

/// Whether `c` may appear in a file name on the host platform
#[inline]
#[must_use]
pub fn is_valid_file_name_char(c: char) -> bool {
    if c == '\0' {
        return false;
    }
    #[cfg(windows)]
    if u32::from(c) < 0x20 {
        return false;
    }
    !RESERVED.contains(&c)
}

/// Replace every invalid file-name character with [`PLACEHOLDER`]
///
/// Total, pure and idempotent: `scrub(&scrub(x)) == scrub(x)`.
///
/// # Example
/// ```
/// use approval_naming::sanitize::scrub;
///
/// assert_eq!(scrub("invalid/chars"), "invalid_chars");
/// ```
#[must_use]
pub fn scrub(text: &str) -> String {
    text.chars()
        .map(|c| if is_valid_file_name_char(c) { c } else { PLACEHOLDER })
        .collect()
}
