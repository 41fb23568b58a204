//! Dispatch to different implementations of a callable based on the
//! installed versions of one or more named packages, including the Rust
//! toolchain itself.
//!
//! A [`VersionDispatch`] wraps a default implementation and an ordered table
//! of alternatives, each guarded by a specification clause such as
//! `"rich<1.0"` or `"rich>=1000, pytest<=1"` (`,` and `;` both separate
//! AND-ed constraints). The environment is consulted once per registration
//! epoch: the first call after a registration evaluates every clause and
//! memoizes the winner, later calls reuse it.
//!
//! ```
//! use versiondispatch::{VersionDispatch, pretend_versions};
//!
//! fn default_render(text: &str) -> String {
//!     format!("plain {text}")
//! }
//! fn fancy_render(text: &str) -> String {
//!     format!("fancy {text}")
//! }
//!
//! // Tests and embedding code can pin versions for a scope; real
//! // deployments advertise them with `publish_version`.
//! let _guard = pretend_versions([("rich", "13.7.1")]);
//!
//! let mut render = VersionDispatch::new("render", default_render as fn(&str) -> String);
//! render
//!     .register("rich>=10", fancy_render as fn(&str) -> String)
//!     .unwrap();
//!
//! assert_eq!(render.call(("hello",)), "fancy hello");
//! ```
//!
//! Method-style calling shapes are covered by [`VersionDispatch::bind`],
//! which prepends a receiver (an instance reference, or a [`Class`] marker
//! for the type-bound shape) to the argument tuple. Dispatchers serialize
//! with `serde`; the memoized choice is deliberately left out of the
//! serialized form so a restored dispatcher resolves against whatever is
//! installed at restore time.

pub mod comparator;
pub mod constraint;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod version;

pub use comparator::{Comparator, satisfies};
pub use constraint::{Clause, VersionConstraint};
pub use discovery::{
    PretendGuard, RUNTIME_PACKAGE, installed_version, pretend_versions, publish_version,
};
pub use dispatch::{Bound, Class, Implementation, RegisteredImplementation, VersionDispatch};
pub use error::DispatchError;
pub use version::Version;

/// Parse a specification string into a [`Clause`].
///
/// This is what [`VersionDispatch::register`] runs eagerly on every
/// registration; it is exposed for callers that want to validate
/// specifications ahead of time.
///
/// # Examples
///
/// ```
/// use versiondispatch::parse;
///
/// let clause = parse("rich>=1.0, pytest<2").unwrap();
/// assert_eq!(clause.constraints().len(), 2);
/// assert!(parse("rich=1.0").is_err());
/// ```
pub fn parse(s: &str) -> Result<Clause, DispatchError> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let clause = parse("rich<1.0").unwrap();
        assert_eq!(clause.constraints().len(), 1);
        assert_eq!(clause.constraints()[0].package, "rich");
        assert_eq!(clause.constraints()[0].comparator, Comparator::LessThan);
        assert_eq!(clause.constraints()[0].version.to_string(), "1.0");
    }

    #[test]
    fn test_parse_conjunction() {
        let clause = parse("rich>=1000 , pytest <= 1").unwrap();
        assert_eq!(clause.constraints().len(), 2);
        assert_eq!(
            clause.constraints()[0].comparator,
            Comparator::GreaterThanOrEqual
        );
        assert_eq!(
            clause.constraints()[1].comparator,
            Comparator::LessThanOrEqual
        );
        assert_eq!(clause.packages().collect::<Vec<_>>(), ["rich", "pytest"]);
    }

    #[test]
    fn test_parse_rejects_missing_operator() {
        assert!(matches!(
            parse("rich=1.0"),
            Err(DispatchError::SpecFormat(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_version() {
        assert!(matches!(
            parse("rich==1.foo.0"),
            Err(DispatchError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_end_to_end_dispatch() {
        fn default_greet(name: &str) -> String {
            format!("hello {name}")
        }
        fn loud_greet(name: &str) -> String {
            format!("HELLO {name}")
        }

        let _guard = pretend_versions([("rich", "0.5.0")]);
        let mut greet = VersionDispatch::new("greet", default_greet as fn(&str) -> String);
        greet
            .register("rich<1.0", loud_greet as fn(&str) -> String)
            .unwrap();
        assert_eq!(greet.call(("world",)), "HELLO world");
    }
}
