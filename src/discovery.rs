//! Installed-version discovery.
//!
//! Dispatchers never probe the environment directly; they go through
//! [`installed_version`], which answers from three layers:
//!
//! 1. the innermost [`pretend_versions`] frame on the current thread, when
//!    one is active and names the package;
//! 2. the reserved [`RUNTIME_PACKAGE`] name, reporting the toolchain version
//!    captured at build time;
//! 3. the process-global registry filled by [`publish_version`].
//!
//! A package unknown to every layer is simply absent; that is never an
//! error.

use once_cell::sync::Lazy;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::RwLock;

/// Reserved package name that reports the version of the Rust toolchain the
/// crate was built with, rather than an installed library's version.
pub static RUNTIME_PACKAGE: &str = "rustc";

static PUBLISHED: Lazy<RwLock<HashMap<String, String>>> = Lazy::new(RwLock::default);

struct Frame {
    versions: HashMap<String, String>,
    lookups: Rc<Cell<usize>>,
}

thread_local! {
    static PRETEND: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Advertise an installed component version to every dispatcher in the
/// process. Later calls for the same package overwrite earlier ones.
pub fn publish_version(package: &str, version: &str) {
    PUBLISHED
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(package.to_string(), version.to_string());
}

/// Look up the installed version of a package, or `None` when it is absent.
pub fn installed_version(package: &str) -> Option<String> {
    let pretended = PRETEND.with(|stack| {
        let stack = stack.borrow();
        stack.last().map(|frame| {
            frame.lookups.set(frame.lookups.get() + 1);
            frame.versions.get(package).cloned()
        })
    });
    match pretended {
        Some(Some(version)) => return Some(version),
        // Packages the pretend frame does not name fall through to the real
        // lookup.
        Some(None) | None => {}
    }

    if package == RUNTIME_PACKAGE {
        return runtime_version();
    }

    PUBLISHED
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(package)
        .cloned()
}

fn runtime_version() -> Option<String> {
    // Set by build.rs; empty when probing the toolchain failed.
    match env!("VERSIONDISPATCH_RUSTC_VERSION") {
        "" => None,
        version => Some(version.to_string()),
    }
}

/// Scoped version override for the current thread, for deterministic tests
/// and embedding code. The returned guard restores the previous lookup
/// behavior when dropped, on both normal and unwinding exits.
///
/// # Examples
///
/// ```
/// use versiondispatch::{installed_version, pretend_versions};
///
/// {
///     let _guard = pretend_versions([("rich", "0.1")]);
///     assert_eq!(installed_version("rich").as_deref(), Some("0.1"));
/// }
/// assert_eq!(installed_version("rich"), None);
/// ```
pub fn pretend_versions<I, K, V>(versions: I) -> PretendGuard
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let versions = versions
        .into_iter()
        .map(|(package, version)| (package.into(), version.into()))
        .collect();
    let lookups = Rc::new(Cell::new(0));
    PRETEND.with(|stack| {
        stack.borrow_mut().push(Frame {
            versions,
            lookups: Rc::clone(&lookups),
        });
    });
    PretendGuard { lookups }
}

/// Active [`pretend_versions`] scope. Frames nest; guards must be dropped in
/// reverse creation order, which falls out of normal scoping.
#[must_use = "dropping the guard immediately removes the pretended versions"]
pub struct PretendGuard {
    lookups: Rc<Cell<usize>>,
}

impl PretendGuard {
    /// How many lookups ran while this frame was the innermost one. Lets
    /// tests observe that resolution happens once per registration epoch
    /// rather than once per call.
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }
}

impl Drop for PretendGuard {
    fn drop(&mut self) {
        PRETEND.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Version;

    #[test]
    fn test_absent_package() {
        assert_eq!(installed_version("discovery-no-such-package"), None);
    }

    #[test]
    fn test_pretend_and_restore() {
        {
            let _guard = pretend_versions([("discovery-pretend-pkg", "1.0")]);
            assert_eq!(
                installed_version("discovery-pretend-pkg").as_deref(),
                Some("1.0")
            );
        }
        assert_eq!(installed_version("discovery-pretend-pkg"), None);
    }

    #[test]
    fn test_pretend_nests() {
        let _outer = pretend_versions([("discovery-nest-pkg", "1.0")]);
        {
            let _inner = pretend_versions([("discovery-nest-pkg", "2.0")]);
            assert_eq!(
                installed_version("discovery-nest-pkg").as_deref(),
                Some("2.0")
            );
        }
        assert_eq!(
            installed_version("discovery-nest-pkg").as_deref(),
            Some("1.0")
        );
    }

    #[test]
    fn test_publish_and_fall_through() {
        publish_version("discovery-published-pkg", "2.3");
        assert_eq!(
            installed_version("discovery-published-pkg").as_deref(),
            Some("2.3")
        );

        // A pretend frame that does not name the package falls through to
        // the published registry.
        let _guard = pretend_versions([("discovery-unrelated-pkg", "9.9")]);
        assert_eq!(
            installed_version("discovery-published-pkg").as_deref(),
            Some("2.3")
        );
    }

    #[test]
    fn test_pretend_shadows_published() {
        publish_version("discovery-shadowed-pkg", "1.0");
        let _guard = pretend_versions([("discovery-shadowed-pkg", "5.0")]);
        assert_eq!(
            installed_version("discovery-shadowed-pkg").as_deref(),
            Some("5.0")
        );
    }

    #[test]
    fn test_lookup_counter() {
        let guard = pretend_versions([("discovery-counted-pkg", "1.0")]);
        assert_eq!(guard.lookups(), 0);
        installed_version("discovery-counted-pkg");
        installed_version("discovery-other-pkg");
        assert_eq!(guard.lookups(), 2);
    }

    #[test]
    fn test_runtime_package() {
        // The toolchain version is captured by build.rs; when present it
        // must parse as a version.
        if let Some(version) = installed_version(RUNTIME_PACKAGE) {
            assert!(version.parse::<Version>().is_ok(), "got {version:?}");
        }
    }

    #[test]
    fn test_pretend_overrides_runtime_package() {
        let _guard = pretend_versions([(RUNTIME_PACKAGE, "0.1")]);
        assert_eq!(installed_version(RUNTIME_PACKAGE).as_deref(), Some("0.1"));
    }
}
