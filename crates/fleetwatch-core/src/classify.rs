/// Transaction groups that signal post-install scripting should run once the
/// transaction completes. Fixed vocabulary, matched case-insensitively.
const INSTALL_WORTHY_PATTERNS: [&str; 2] = ["reload", "provision"];

pub fn is_install_worthy(group_name: &str) -> bool {
    let group = group_name.to_ascii_lowercase();
    INSTALL_WORTHY_PATTERNS.iter().any(|p| group.contains(p))
}
