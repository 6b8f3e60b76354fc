//! Planar positions. Payloads hold `[x, y]` pairs.

kindred_core::unit_family! {
    family: "length2d",
    standard: meters2d("meters2d", "m2d"),
}
