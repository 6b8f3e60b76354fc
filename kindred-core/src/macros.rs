//! Macros for declaring unit families.

/// Generates accessor functions for a unit family in the global registry.
///
/// Expands to `family()`, one function for the standard unit and one per
/// additional unit, each returning the interned kind. Invoke once per module.
///
/// ```rust
/// mod length {
///     kindred_core::unit_family! {
///         family: "doc_length",
///         standard: meters("meters", "m"),
///         units: {
///             centimeters("centimeters", "cm") = 0.01,
///             inches("inches", "in") = 0.0254,
///         }
///     }
/// }
///
/// let cm = length::centimeters().unwrap();
/// assert!(cm.is_compatible(&length::meters().unwrap()));
/// ```
///
/// Affine units take an offset after the scale:
/// `celsius("celsius", "degC") = 1.0; offset 273.15`.
#[macro_export]
macro_rules! unit_family {
    (@offset) => { 0.0 };
    (@offset $offset:expr) => { $offset };

    (
        family: $family:literal,
        standard: $std_fn:ident($std_name:literal, $std_symbol:literal)
        $(, units: {
            $( $unit_fn:ident($unit_name:literal, $unit_symbol:literal) = $scale:expr $(; offset $offset:expr)? ),* $(,)?
        })?
        $(,)?
    ) => {
        #[doc = concat!("The `", $family, "` family.")]
        pub fn family() -> $crate::KindResult<$crate::Family> {
            $crate::KindRegistry::global().family($family)
        }

        #[doc = concat!("Standard unit `", $std_name, "` (`", $std_symbol, "`).")]
        pub fn $std_fn() -> $crate::KindResult<$crate::Kind> {
            $crate::KindRegistry::global().standard_unit(&family()?, $std_name, $std_symbol)
        }

        $($(
            #[doc = concat!("`", $unit_name, "` (`", $unit_symbol, "`).")]
            pub fn $unit_fn() -> $crate::KindResult<$crate::Kind> {
                $crate::KindRegistry::global().affine_unit(
                    &$std_fn()?,
                    $unit_name,
                    $unit_symbol,
                    $scale,
                    $crate::unit_family!(@offset $($offset)?),
                )
            }
        )*)?
    };
}
