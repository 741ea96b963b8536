use url::Url;

/// Decides whether candidate URLs fall inside the scan boundary
///
/// A candidate is in scope when its scheme, host and port equal those of one
/// scope entry and the entry's path is a prefix of the candidate's path.
/// With `allow_upgrade`, an `https` candidate also matches an `http` entry
/// with the same host, port and path prefix. The reverse never matches.
#[derive(Debug, Clone)]
pub struct ScopePolicy {
    scopes: Vec<Url>,
    allow_upgrade: bool,
    excludes: Vec<String>,
}

impl ScopePolicy {
    /// Creates a policy over the given scope URLs
    ///
    /// # Arguments
    ///
    /// * `scopes` - Base URLs, already parsed (empty paths should be `/`)
    /// * `allow_upgrade` - Whether HTTP scopes admit HTTPS candidates
    /// * `excludes` - Path prefixes that are never admitted
    pub fn new(scopes: Vec<Url>, allow_upgrade: bool, excludes: Vec<String>) -> Self {
        let excludes = excludes
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            scopes,
            allow_upgrade,
            excludes,
        }
    }

    /// The scope URLs, in configuration order
    pub fn scopes(&self) -> &[Url] {
        &self.scopes
    }

    /// Returns true if the candidate matches any scope entry
    pub fn in_scope(&self, candidate: &Url) -> bool {
        self.scopes
            .iter()
            .any(|scope| matches_scope(scope, candidate, self.allow_upgrade))
    }

    /// Returns true if the candidate path starts with an excluded prefix
    pub fn is_excluded(&self, candidate: &Url) -> bool {
        let path = candidate.path();
        self.excludes.iter().any(|prefix| path.starts_with(prefix))
    }

    /// The full gate: in scope and not excluded
    pub fn admits(&self, candidate: &Url) -> bool {
        self.in_scope(candidate) && !self.is_excluded(candidate)
    }
}

/// Checks a candidate against one scope entry
pub fn matches_scope(scope: &Url, candidate: &Url, allow_upgrade: bool) -> bool {
    let scheme_ok = candidate.scheme() == scope.scheme()
        || (allow_upgrade && scope.scheme() == "http" && candidate.scheme() == "https");

    if !scheme_ok {
        return false;
    }

    // `port()` is None for the scheme's default port, so an upgraded
    // http://host/ compares equal to https://host/.
    if candidate.host_str() != scope.host_str() || candidate.port() != scope.port() {
        return false;
    }

    let scope_path = match scope.path() {
        "" => "/",
        path => path,
    };
    candidate.path().starts_with(scope_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn policy(scopes: &[&str], allow_upgrade: bool) -> ScopePolicy {
        ScopePolicy::new(scopes.iter().map(|s| url(s)).collect(), allow_upgrade, vec![])
    }

    #[test]
    fn test_same_origin_in_scope() {
        let p = policy(&["http://example.test/"], false);
        assert!(p.in_scope(&url("http://example.test/about")));
        assert!(p.in_scope(&url("http://example.test/")));
    }

    #[test]
    fn test_other_host_out_of_scope() {
        let p = policy(&["http://example.test/"], false);
        assert!(!p.in_scope(&url("http://other.test/about")));
        assert!(!p.in_scope(&url("http://sub.example.test/")));
    }

    #[test]
    fn test_port_must_match() {
        let p = policy(&["http://example.test:8080/"], false);
        assert!(p.in_scope(&url("http://example.test:8080/a")));
        assert!(!p.in_scope(&url("http://example.test/a")));
        assert!(!p.in_scope(&url("http://example.test:9090/a")));
    }

    #[test]
    fn test_path_prefix() {
        let p = policy(&["http://example.test/app/"], false);
        assert!(p.in_scope(&url("http://example.test/app/login")));
        assert!(!p.in_scope(&url("http://example.test/other")));
        assert!(!p.in_scope(&url("http://example.test/")));
    }

    #[test]
    fn test_https_rejected_without_upgrade() {
        let p = policy(&["http://example.test/"], false);
        assert!(!p.in_scope(&url("https://example.test/about")));
    }

    #[test]
    fn test_https_accepted_with_upgrade() {
        let p = policy(&["http://example.test/"], true);
        assert!(p.in_scope(&url("https://example.test/about")));
    }

    #[test]
    fn test_upgrade_keeps_path_prefix() {
        let p = policy(&["http://example.test/app/"], true);
        assert!(p.in_scope(&url("https://example.test/app/x")));
        assert!(!p.in_scope(&url("https://example.test/x")));
    }

    #[test]
    fn test_never_downgrades() {
        for allow_upgrade in [false, true] {
            let p = policy(&["https://example.test/"], allow_upgrade);
            assert!(!p.in_scope(&url("http://example.test/about")));
        }
    }

    #[test]
    fn test_any_scope_matches() {
        let p = policy(&["http://a.test/", "http://b.test/docs/"], false);
        assert!(p.in_scope(&url("http://b.test/docs/api")));
        assert!(!p.in_scope(&url("http://b.test/blog")));
    }

    #[test]
    fn test_excludes() {
        let p = ScopePolicy::new(
            vec![url("http://example.test/")],
            false,
            vec!["/logout".to_string(), " ".to_string()],
        );
        assert!(p.is_excluded(&url("http://example.test/logout?all=1")));
        assert!(!p.admits(&url("http://example.test/logout")));
        assert!(p.admits(&url("http://example.test/login")));
    }
}
