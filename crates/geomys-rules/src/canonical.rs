//! Rule-name fragments derived from module paths.

/// Map a module path to a rule-name fragment in reverse-domain notation.
///
/// The first `/` segment is treated as a domain and its labels are reversed;
/// the remaining segments follow in order. All separators become `_`, and so
/// does every `-`.
///
/// ```
/// use geomys_rules::canonicalize;
///
/// assert_eq!(canonicalize("golang.org/x/mod"), "org_golang_x_mod");
/// assert_eq!(canonicalize("github.com/google/go-cmp"), "com_github_google_go_cmp");
/// ```
///
/// A path without `/` yields only the reversed domain.
pub fn canonicalize(module_path: &str) -> String {
    let mut segments = module_path.split('/');
    let domain = segments.next().unwrap_or_default();

    let mut name = domain.rsplit('.').collect::<Vec<_>>().join("_");
    let rest: Vec<&str> = segments.collect();
    if !rest.is_empty() {
        name.push('_');
        name.push_str(&rest.join("_"));
    }

    name.replace('-', "_")
}
