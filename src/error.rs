use thiserror::Error;

/// Errors raised while building a dispatcher. All of them surface eagerly at
/// registration time; the call path never produces an error of its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The specification string does not follow the
    /// `name OP version (SEP name OP version)*` grammar, e.g. a bare `=`
    /// instead of `==`, or an empty constraint between separators.
    #[error(
        "Version not correctly specified, should be like: \"pkg<1.0\" or \
         \"pkg>=1.33.7,other-pkg==2\" (got: {0})"
    )]
    SpecFormat(String),

    /// A constraint that follows the grammar but carries an unusable token,
    /// such as a package name with forbidden characters. Wrapped into
    /// [`DispatchError::InvalidVersionSpec`] by registration so the message
    /// can name the dispatcher.
    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    /// A version literal that cannot be parsed as dotted numeric components
    /// with an optional trailing suffix.
    #[error("cannot parse {0:?} as a version")]
    InvalidVersion(String),

    /// Registration-time wrapper naming the dispatcher whose spec was bad.
    #[error("{func} uses incorrect version spec: {spec}")]
    InvalidVersionSpec { func: String, spec: String },

    /// A dispatcher was registered as an implementation of another
    /// dispatcher.
    #[error("You are nesting versiondispatch, which is not supported")]
    NestedDispatch,
}
