//! Time units. Standard: seconds.

kindred_core::unit_family! {
    family: "time",
    standard: seconds("seconds", "s"),
    units: {
        minutes("minutes", "min") = 60.0,
        hours("hours", "h") = 3600.0,
        years("years", "yr") = 31_536_000.0,
    }
}
