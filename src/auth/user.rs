//! User identity and per-path permission resolution (component G).

use std::fmt::{self, Display, Formatter};

/// A single permission rule over one absolute POSIX path: whether reads
/// and writes under it are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    /// Absolute POSIX path this rule covers, including all of its descendants.
    pub path: String,
    /// Whether `LIST`/`RETR` are allowed under `path`.
    pub readable: bool,
    /// Whether `MKD`/`STOR`/`DELE`/`RNFR`/`RNTO`/`RMD` are allowed under `path`.
    pub writable: bool,
}

/// A logged-in identity: the login name, its home directory, and the
/// permission rules that gate every VFS operation.
///
/// Every user implicitly has `{path: home_path, readable: true, writable:
/// true}`; if the caller's explicit `permissions` carries no rule for `/`,
/// one is synthesized as `{path: "/", readable: true, writable: false}`
/// (§9 design note: resolved as "always synthesize", matching the most
/// restrictive reading of the ambiguous source behavior).
#[derive(Debug, Clone)]
pub struct UserDetail {
    /// The login name as presented at `USER`.
    pub login: String,
    /// `/<login>` unless the credential store overrides it.
    pub home_path: String,
    /// Explicit permission rules, in declaration order (ties in longest-prefix
    /// matching resolve to the earliest-declared rule).
    pub permissions: Vec<Permission>,
}

impl UserDetail {
    /// Builds a user detail, synthesizing the home-directory and
    /// default-root permission rules described above.
    pub fn new(login: impl Into<String>, home_path: impl Into<String>, mut permissions: Vec<Permission>) -> UserDetail {
        let login = login.into();
        let home_path = home_path.into();
        permissions.push(Permission { path: home_path.clone(), readable: true, writable: true });
        if !permissions.iter().any(|p| p.path == "/") {
            permissions.push(Permission { path: "/".to_string(), readable: true, writable: false });
        }
        UserDetail { login, home_path, permissions }
    }

    /// Resolves the permission that applies to `virtual_path`: the rule
    /// whose `path` is the longest ancestor of (or equal to) the target;
    /// ties broken by declaration order, earliest wins.
    pub fn get_permissions(&self, virtual_path: &str) -> Permission {
        let mut best: Option<&Permission> = None;
        for rule in &self.permissions {
            if !is_ancestor_or_eq(&rule.path, virtual_path) {
                continue;
            }
            match best {
                None => best = Some(rule),
                Some(current) if rule.path.len() > current.path.len() => best = Some(rule),
                _ => {}
            }
        }
        best.cloned().unwrap_or(Permission { path: "/".to_string(), readable: false, writable: false })
    }
}

impl Display for UserDetail {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.login)
    }
}

fn is_ancestor_or_eq(ancestor: &str, path: &str) -> bool {
    if ancestor == "/" {
        return true;
    }
    path == ancestor || path.starts_with(&format!("{ancestor}/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_prefix_wins() {
        let user = UserDetail::new(
            "alice",
            "/alice",
            vec![Permission { path: "/".to_string(), readable: true, writable: false }, Permission { path: "/alice/ro".to_string(), readable: true, writable: false }],
        );
        let p = user.get_permissions("/alice/ro/sub/file.txt");
        assert!(p.readable && !p.writable);
        let p = user.get_permissions("/alice/docs/file.txt");
        assert!(p.readable && p.writable);
    }

    #[test]
    fn default_root_permission_is_synthesized() {
        let user = UserDetail::new("bob", "/bob", vec![]);
        let p = user.get_permissions("/other");
        assert!(p.readable && !p.writable);
    }

    #[test]
    fn ties_resolve_to_earliest_declared() {
        let user = UserDetail::new(
            "carol",
            "/carol",
            vec![Permission { path: "/shared".to_string(), readable: true, writable: false }, Permission { path: "/shared".to_string(), readable: false, writable: true }],
        );
        let p = user.get_permissions("/shared/x");
        assert!(p.readable && !p.writable);
    }
}
