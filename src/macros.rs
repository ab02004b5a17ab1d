// Generates `From<T>` impls wrapping the source value into the given enum variant,
// optionally converting it with `Into` first.
macro_rules! impl_from_for_variant {
    ($target:ident, $variant:ident, [$($t:ty),+]) => ($(
        impl From<$t> for $target {
            fn from(value: $t) -> Self {
                Self::$variant(value)
            }
        }
    )+);
    ($target:ident, $variant:ident, into [$($t:ty),+]) => ($(
        impl From<$t> for $target {
            fn from(value: $t) -> Self {
                Self::$variant(value.into())
            }
        }
    )+);
}
