//! Stable issue codes.

/// Metadata directory is a file.
pub const E001: &str = "E001";
/// Metadata directory missing, or manifest at the package root.
pub const E002: &str = "E002";
/// Component directory nested inside the metadata directory.
pub const E003: &str = "E003";
/// Frontmatter opened with `>---`.
pub const E102: &str = "E102";
/// Agent file without frontmatter.
pub const E103: &str = "E103";
/// Shell expansion or home shorthand in a JSON file.
pub const E201: &str = "E201";
/// Component field given as a directory path.
pub const E301: &str = "E301";
/// Marketplace name equals one of its plugin names.
pub const E303: &str = "E303";
/// Skill file without frontmatter.
pub const E402: &str = "E402";
/// Nested `metadata:` block in skill frontmatter.
pub const E404: &str = "E404";

/// Leading code of an issue such as `"E003: agents/ inside ..."`.
pub fn code_of(issue: &str) -> Option<&str> {
    let (code, _) = issue.split_once(':')?;
    let code = code.trim();
    let well_formed = code.len() == 4
        && code.starts_with('E')
        && code[1..].chars().all(|c| c.is_ascii_digit());
    well_formed.then_some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_of() {
        assert_eq!(code_of("E003: agents/ inside .claude-plugin/"), Some(E003));
        assert_eq!(code_of("E201: Shell expansion in hooks.json"), Some(E201));
        assert_eq!(code_of("MISSING REQUIRED FIELD: name"), None);
        assert_eq!(code_of("no colon here"), None);
    }
}
