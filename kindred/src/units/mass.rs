//! Mass units. Standard: kilograms.

kindred_core::unit_family! {
    family: "mass",
    standard: kilograms("kilograms", "kg"),
    units: {
        grams("grams", "g") = 0.001,
    }
}
