// SPDX-License-Identifier: GPL-3.0-only

//! Mountpoint policies
//!
//! Callers check requested mountpoints against a policy before handing them
//! to the engine. A policy is a [`PathTrie`] of [`PathPolicy`] entries; the
//! entry of the deepest matching path decides.

mod trie;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use tracing::warn;

use crate::error::{LayoutError, Result};

pub use trie::PathTrie;

/// Rule attached to a path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathPolicy {
    /// The path and everything below it is rejected
    pub deny: bool,

    /// Only the path itself is allowed, not its subpaths
    pub exact: bool,
}

impl PathPolicy {
    pub const ALLOW: PathPolicy = PathPolicy {
        deny: false,
        exact: false,
    };

    pub const DENY: PathPolicy = PathPolicy {
        deny: true,
        exact: false,
    };

    pub const EXACT: PathPolicy = PathPolicy {
        deny: false,
        exact: true,
    };
}

/// A set of path policies
#[derive(Debug, Clone)]
pub struct PathPolicies {
    root: PathTrie<PathPolicy>,
}

impl PathPolicies {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, PathPolicy)>,
        S: Into<String>,
    {
        let map: BTreeMap<String, PathPolicy> = entries
            .into_iter()
            .map(|(path, policy)| (path.into(), policy))
            .collect();
        Self {
            root: PathTrie::from_map(map),
        }
    }

    /// Check `path` against the policies.
    ///
    /// The path must be absolute and canonical. Paths below a node without a
    /// policy of their own are allowed.
    pub fn check(&self, path: &str) -> Result<()> {
        if path.is_empty() {
            return Err(invalid(path, "path must not be empty"));
        }
        if !path.starts_with('/') {
            return Err(invalid(path, "path must be absolute"));
        }
        if clean_path(path) != path {
            return Err(invalid(path, "path must be canonical"));
        }

        let (node, left) = self.root.lookup(path);
        let policy = node.payload().copied().unwrap_or_default();
        if policy.deny || (policy.exact && !left.is_empty()) {
            return Err(LayoutError::PolicyDenied(path.to_string()));
        }
        Ok(())
    }
}

fn invalid(path: &str, reason: &str) -> LayoutError {
    LayoutError::InvalidMountpoint {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// Check every mountpoint and report all failures at once
pub fn check_mountpoints_policy<'a, I>(mountpoints: I, policies: &PathPolicies) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let errors: Vec<LayoutError> = mountpoints
        .into_iter()
        .filter_map(|mountpoint| policies.check(mountpoint).err())
        .collect();
    if errors.is_empty() {
        return Ok(());
    }
    warn!("{} mountpoints rejected by policy", errors.len());
    Err(LayoutError::MountpointPolicy(errors))
}

/// Policies for regular images
pub static MOUNTPOINT_POLICIES: LazyLock<PathPolicies> = LazyLock::new(|| {
    PathPolicies::new([
        ("/", PathPolicy::ALLOW),
        // must live on the root filesystem
        ("/etc", PathPolicy::DENY),
        // the initrd fstab generator cannot mount below /usr
        ("/usr", PathPolicy::EXACT),
        // API filesystems
        ("/sys", PathPolicy::DENY),
        ("/proc", PathPolicy::DENY),
        ("/dev", PathPolicy::DENY),
        ("/run", PathPolicy::DENY),
        // merged /usr symlinks
        ("/bin", PathPolicy::DENY),
        ("/sbin", PathPolicy::DENY),
        ("/lib", PathPolicy::DENY),
        ("/lib64", PathPolicy::DENY),
        ("/lost+found", PathPolicy::DENY),
        ("/boot/efi", PathPolicy::DENY),
        ("/sysroot", PathPolicy::DENY),
        ("/var/run", PathPolicy::DENY),
        ("/var/lock", PathPolicy::DENY),
    ])
});

/// Policies for bootable container images
///
/// Only the existing mountpoints may be resized, plus new mountpoints below
/// `/var` that the running system does not manage itself.
pub static BOOTC_MOUNTPOINT_POLICIES: LazyLock<PathPolicies> = LazyLock::new(|| {
    PathPolicies::new([
        ("/", PathPolicy::EXACT),
        ("/boot", PathPolicy::EXACT),
        ("/var", PathPolicy::ALLOW),
        ("/var/home", PathPolicy::DENY),
        // symlink to ../run/lock
        ("/var/lock", PathPolicy::DENY),
        // symlink to spool/mail
        ("/var/mail", PathPolicy::DENY),
        ("/var/mnt", PathPolicy::DENY),
        ("/var/roothome", PathPolicy::DENY),
        // symlink to ../run
        ("/var/run", PathPolicy::DENY),
        ("/var/srv", PathPolicy::DENY),
        ("/var/usrlocal", PathPolicy::DENY),
    ])
});

/// Lexically clean a path: collapse repeated slashes, drop `.` segments,
/// resolve `..` and strip any trailing slash.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Parent directory of `path`; `/` and `.` are their own parents
pub fn parent_dir(path: &str) -> String {
    let cleaned = clean_path(path);
    match cleaned.rfind('/') {
        Some(0) => "/".to_string(),
        Some(index) => cleaned[..index].to_string(),
        None => ".".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_paths() {
        assert_eq!(clean_path("/a/b/.."), "/a");
        assert_eq!(clean_path("/a//b/"), "/a/b");
        assert_eq!(clean_path("/.."), "/");
        assert_eq!(clean_path("a/../.."), "..");
        assert_eq!(clean_path(""), ".");
    }

    #[test]
    fn parents() {
        assert_eq!(parent_dir("/usr/lib"), "/usr");
        assert_eq!(parent_dir("/usr"), "/");
        assert_eq!(parent_dir("/"), "/");
        assert_eq!(parent_dir("usr"), ".");
        assert_eq!(parent_dir("."), ".");
    }

    #[test]
    fn check_rejects_malformed_paths() {
        let policies = &*MOUNTPOINT_POLICIES;
        for path in ["", "home", "/home/", "/a/b/..", "//home"] {
            assert!(
                matches!(
                    policies.check(path),
                    Err(LayoutError::InvalidMountpoint { .. })
                ),
                "{path:?} should be invalid"
            );
        }
    }

    #[test]
    fn standard_policies() {
        let policies = &*MOUNTPOINT_POLICIES;
        for allowed in ["/", "/home", "/var/log", "/usr", "/boot", "/opt/data"] {
            assert!(policies.check(allowed).is_ok(), "{allowed} should pass");
        }
        for denied in ["/etc", "/etc/foo", "/usr/share", "/proc", "/var/run", "/boot/efi"] {
            assert!(
                matches!(policies.check(denied), Err(LayoutError::PolicyDenied(_))),
                "{denied} should be denied"
            );
        }
    }

    #[test]
    fn shared_prefixes_keep_the_parent_decision() {
        let policies = PathPolicies::new([
            ("/", PathPolicy::DENY),
            ("/var/lib", PathPolicy::ALLOW),
            ("/var/log", PathPolicy::EXACT),
        ]);
        assert!(policies.check("/var/lib/containers").is_ok());
        assert!(policies.check("/var/log").is_ok());
        assert!(policies.check("/var/log/journal").is_err());
        assert!(policies.check("/var").is_err());
        assert!(policies.check("/var/tmp").is_err());
    }

    #[test]
    fn bootc_policies() {
        let policies = &*BOOTC_MOUNTPOINT_POLICIES;
        assert!(policies.check("/").is_ok());
        assert!(policies.check("/boot").is_ok());
        assert!(policies.check("/var/log").is_ok());
        assert!(policies.check("/home").is_err());
        assert!(policies.check("/boot/grub").is_err());
        assert!(policies.check("/var/home/user").is_err());
    }

    #[test]
    fn batch_check_collects_all_failures() {
        let err = check_mountpoints_policy(["/home", "/etc", "/proc"], &MOUNTPOINT_POLICIES)
            .unwrap_err();
        match err {
            LayoutError::MountpointPolicy(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error {other}"),
        }
        assert!(check_mountpoints_policy(["/home", "/srv"], &MOUNTPOINT_POLICIES).is_ok());
    }
}
