//! Length units. Standard: metres.

kindred_core::unit_family! {
    family: "length",
    standard: meters("meters", "m"),
    units: {
        centimeters("centimeters", "cm") = 0.01,
        kilometers("kilometers", "km") = 1000.0,
        inches("inches", "in") = 0.0254,
        miles("miles", "mi") = 1.0 / 0.000621371,
    }
}
