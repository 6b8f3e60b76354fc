//! Temperature units. Standard: kelvin.
//!
//! Celsius is affine: `K = degC + 273.15`. Differences of affine values are
//! not tracked separately, so subtract in kelvin when the offset matters.

kindred_core::unit_family! {
    family: "temperature",
    standard: kelvin("kelvin", "K"),
    units: {
        celsius("celsius", "degC") = 1.0; offset 273.15,
    }
}
