//! The dispatcher itself: an ordered table of (clause, handler) pairs with a
//! memoized resolution.

use crate::{Clause, DispatchError, Version, discovery};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::marker::PhantomData;

/// A callable that can be registered on a [`VersionDispatch`].
///
/// `Args` is the argument tuple. Blanket implementations cover plain
/// functions and closures of up to four arguments; handler types meant to
/// survive serialization implement the trait by hand (typically a fieldless
/// enum deriving `Serialize`/`Deserialize`).
pub trait Implementation<Args> {
    type Output;

    fn call(&self, args: Args) -> Self::Output;

    /// Dispatchers report `true` here so that [`VersionDispatch::register`]
    /// can refuse to nest them.
    fn is_dispatcher(&self) -> bool {
        false
    }
}

macro_rules! impl_fn_implementation {
    ($(($param:ident, $arg:ident)),*) => {
        impl<Func, Out, $($param),*> Implementation<($($param,)*)> for Func
        where
            Func: Fn($($param),*) -> Out,
        {
            type Output = Out;

            fn call(&self, ($($arg,)*): ($($param,)*)) -> Out {
                self($($arg),*)
            }
        }
    };
}

impl_fn_implementation!();
impl_fn_implementation!((A, a));
impl_fn_implementation!((A, a), (B, b));
impl_fn_implementation!((A, a), (B, b), (C, c));
impl_fn_implementation!((A, a), (B, b), (C, c), (D, d));

/// One entry of the dispatch table: the specification string as given, its
/// parsed clause and the handler it guards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisteredImplementation<H> {
    spec: String,
    clause: Clause,
    implementation: H,
}

impl<H> RegisteredImplementation<H> {
    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn clause(&self) -> &Clause {
        &self.clause
    }

    pub fn implementation(&self) -> &H {
        &self.implementation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Choice {
    Default,
    Registered(usize),
}

/// Version-based dispatch among several implementations of one callable.
///
/// A dispatcher owns a default handler and an ordered table of registered
/// alternatives, each guarded by a specification clause. The first call
/// after a registration evaluates every clause against the currently
/// installed versions and memoizes the winner; later calls reuse that choice
/// until the next registration opens a new epoch.
///
/// Clauses are evaluated in registration order and the latest matching
/// registration wins; when nothing matches, the default handler runs.
///
/// The memoized choice is excluded from serialization, so a persisted and
/// restored dispatcher resolves afresh against whatever is installed at
/// restore time.
///
/// # Examples
///
/// ```
/// use versiondispatch::{VersionDispatch, pretend_versions};
///
/// fn default_render(text: &str) -> String {
///     format!("plain {text}")
/// }
/// fn fancy_render(text: &str) -> String {
///     format!("fancy {text}")
/// }
///
/// let _guard = pretend_versions([("rich", "13.7.1")]);
///
/// let mut render = VersionDispatch::new("render", default_render as fn(&str) -> String);
/// render
///     .register("rich>=10", fancy_render as fn(&str) -> String)
///     .unwrap();
///
/// assert_eq!(render.call(("hello",)), "fancy hello");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VersionDispatch<H> {
    name: String,
    default: H,
    table: Vec<RegisteredImplementation<H>>,
    #[serde(skip)]
    resolved: Cell<Option<Choice>>,
}

impl<H> VersionDispatch<H> {
    /// Wrap a default implementation. `name` identifies the dispatcher in
    /// registration error messages.
    pub fn new(name: impl Into<String>, default: H) -> Self {
        VersionDispatch {
            name: name.into(),
            default,
            table: Vec::new(),
            resolved: Cell::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registered alternatives, in registration order. The default
    /// implementation is not part of the table.
    pub fn registered(&self) -> &[RegisteredImplementation<H>] {
        &self.table
    }

    /// Register an alternative implementation guarded by `spec`.
    ///
    /// The clause is parsed and every version literal validated eagerly, so
    /// a bad specification fails here rather than at call time. On success
    /// the memoized choice is invalidated and `&mut Self` is returned for
    /// chaining.
    pub fn register<Args>(
        &mut self,
        spec: &str,
        implementation: H,
    ) -> Result<&mut Self, DispatchError>
    where
        H: Implementation<Args>,
    {
        if implementation.is_dispatcher() {
            return Err(DispatchError::NestedDispatch);
        }

        let clause: Clause = spec.parse().map_err(|err| match err {
            err @ DispatchError::SpecFormat(_) => err,
            _ => DispatchError::InvalidVersionSpec {
                func: self.name.clone(),
                spec: spec.to_string(),
            },
        })?;

        self.table.push(RegisteredImplementation {
            spec: spec.to_string(),
            clause,
            implementation,
        });
        self.resolved.set(None);
        Ok(self)
    }

    /// Pick the winning implementation for the current epoch, resolving it
    /// on the first call after a registration and reusing the memoized
    /// choice afterwards.
    fn resolve(&self) -> &H {
        let choice = match self.resolved.get() {
            Some(choice) => choice,
            None => {
                let mut choice = Choice::Default;
                for (index, entry) in self.table.iter().enumerate() {
                    if clause_matches(&entry.clause) {
                        choice = Choice::Registered(index);
                    }
                }
                self.resolved.set(Some(choice));
                choice
            }
        };
        match choice {
            Choice::Default => &self.default,
            Choice::Registered(index) => &self.table[index].implementation,
        }
    }

    /// Invoke the resolved implementation with `args`, returning its result
    /// directly. The argument tuple is forwarded as-is; use [`bind`] to
    /// prepend a receiver.
    ///
    /// [`bind`]: VersionDispatch::bind
    pub fn call<Args>(&self, args: Args) -> H::Output
    where
        H: Implementation<Args>,
    {
        self.resolve().call(args)
    }

    /// Attach a receiver, yielding a bound callable that supplies it as the
    /// first argument of whichever implementation wins resolution. Pass
    /// `&instance` for the instance-method shape or [`Class::new`] for the
    /// type-bound shape.
    pub fn bind<R: Copy>(&self, receiver: R) -> Bound<'_, H, R> {
        Bound {
            dispatch: self,
            receiver,
        }
    }
}

fn clause_matches(clause: &Clause) -> bool {
    clause.constraints().iter().all(|constraint| {
        // An absent package, or one advertising an unparseable version,
        // never satisfies a constraint.
        discovery::installed_version(&constraint.package)
            .and_then(|raw| raw.parse::<Version>().ok())
            .is_some_and(|installed| constraint.is_satisfied_by(&installed))
    })
}

/// A dispatcher is itself callable, forwarding to whichever implementation
/// wins resolution. Registering one on another dispatcher is refused.
impl<H, Args> Implementation<Args> for VersionDispatch<H>
where
    H: Implementation<Args>,
{
    type Output = H::Output;

    fn call(&self, args: Args) -> Self::Output {
        VersionDispatch::call(self, args)
    }

    fn is_dispatcher(&self) -> bool {
        true
    }
}

/// Zero-size stand-in for a type-bound receiver, the analogue of handing a
/// class (rather than an instance) to a method.
pub struct Class<T>(PhantomData<T>);

impl<T> Class<T> {
    pub const fn new() -> Self {
        Class(PhantomData)
    }
}

impl<T> Default for Class<T> {
    fn default() -> Self {
        Class::new()
    }
}

impl<T> Clone for Class<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Class<T> {}

impl<T> std::fmt::Debug for Class<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Class<{}>", std::any::type_name::<T>())
    }
}

/// Argument tuples that accept a receiver prepended at call time.
/// Implemented for tuples of up to three trailing arguments.
pub trait WithReceiver<R> {
    type Full;

    fn attach(self, receiver: R) -> Self::Full;
}

impl<R> WithReceiver<R> for () {
    type Full = (R,);

    fn attach(self, receiver: R) -> (R,) {
        (receiver,)
    }
}

impl<R, A> WithReceiver<R> for (A,) {
    type Full = (R, A);

    fn attach(self, receiver: R) -> (R, A) {
        (receiver, self.0)
    }
}

impl<R, A, B> WithReceiver<R> for (A, B) {
    type Full = (R, A, B);

    fn attach(self, receiver: R) -> (R, A, B) {
        (receiver, self.0, self.1)
    }
}

impl<R, A, B, C> WithReceiver<R> for (A, B, C) {
    type Full = (R, A, B, C);

    fn attach(self, receiver: R) -> (R, A, B, C) {
        (receiver, self.0, self.1, self.2)
    }
}

/// A dispatcher with a receiver attached, obtained from
/// [`VersionDispatch::bind`]. Calling it prepends the receiver to the
/// argument tuple before forwarding to the resolved implementation.
pub struct Bound<'a, H, R> {
    dispatch: &'a VersionDispatch<H>,
    receiver: R,
}

impl<H, R: Copy> Bound<'_, H, R> {
    pub fn call<Rest>(&self, args: Rest) -> <H as Implementation<Rest::Full>>::Output
    where
        Rest: WithReceiver<R>,
        H: Implementation<Rest::Full>,
    {
        self.dispatch.resolve().call(args.attach(self.receiver))
    }
}
