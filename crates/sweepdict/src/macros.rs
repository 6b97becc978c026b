// Literal sugar over the `build` factories.

/// Leaf-dict literal: `cdict! { a: 5, b: clist![3, 30] }`.
#[macro_export]
macro_rules! cdict {
    () => {
        $crate::build::dict(::std::iter::empty::<(&str, $crate::slot::Slot)>())
    };
    ( $( $key:ident : $value:expr ),+ $(,)? ) => {
        $crate::build::dict([
            $( (stringify!($key), $crate::slot::Slot::from($value)) ),+
        ])
    };
}

/// Finalized leaf-dict literal; its records reject any further combine.
#[macro_export]
macro_rules! cfinaldict {
    () => {
        $crate::build::finaldict(::std::iter::empty::<(&str, $crate::slot::Slot)>())
    };
    ( $( $key:ident : $value:expr ),+ $(,)? ) => {
        $crate::build::finaldict([
            $( (stringify!($key), $crate::slot::Slot::from($value)) ),+
        ])
    };
}

/// Leaf-dict literal whose produced values lose every collision.
#[macro_export]
macro_rules! cdefaultdict {
    () => {
        $crate::build::defaultdict(::std::iter::empty::<(&str, $crate::slot::Slot)>())
    };
    ( $( $key:ident : $value:expr ),+ $(,)? ) => {
        $crate::build::defaultdict([
            $( (stringify!($key), $crate::slot::Slot::from($value)) ),+
        ])
    };
}

/// Concatenation literal: `clist![3, 30]`, items heterogeneous.
#[macro_export]
macro_rules! clist {
    () => {
        $crate::build::list(::std::vec::Vec::<$crate::slot::Slot>::new())
    };
    ( $( $item:expr ),+ $(,)? ) => {
        $crate::build::list([
            $( $crate::slot::Slot::from($item) ),+
        ])
    };
}

/// Plain record literal, mostly for expected values in tests:
/// `record! { a: 5, b: "x" }`.
#[macro_export]
macro_rules! record {
    () => {
        $crate::record::Record::new()
    };
    ( $( $key:ident : $value:expr ),+ $(,)? ) => {
        <$crate::record::Record as ::std::iter::FromIterator<_>>::from_iter([
            $( (stringify!($key), $crate::value::Value::from($value)) ),+
        ])
    };
}
