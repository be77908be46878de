//! Shorthand for building element trees

/// Build an [`Element`](crate::element::Element) with [`build`](crate::element::build)
///
/// Attribute keys are identifiers; values are anything convertible into a
/// [`PropValue`](crate::props::PropValue). Children are anything convertible into a
/// [`Child`](crate::element::Child), so strings and numbers become text.
///
/// # Example
/// ```
/// use reconciler::element;
///
/// let tree = element!("div", { id: "foo" }, [
///     element!("a", ["bar"]),
///     element!("b"),
/// ]);
/// assert_eq!(tree.children().len(), 2);
/// ```
#[macro_export]
macro_rules! element {
    ($kind:expr, { $($key:ident : $value:expr),* $(,)? } $(, [ $($child:expr),* $(,)? ])?) => {
        $crate::element::build(
            $kind,
            [$((
                ::std::string::String::from(stringify!($key)),
                $crate::props::PropValue::from($value),
            )),*],
            [$($($crate::element::Child::from($child)),*)?],
        )
    };
    ($kind:expr, [ $($child:expr),* $(,)? ]) => {
        $crate::element::build($kind, [], [$($crate::element::Child::from($child)),*])
    };
    ($kind:expr) => {
        $crate::element::build($kind, [], [])
    };
}
