//! Energy units. Standard: joules.

kindred_core::unit_family! {
    family: "energy",
    standard: joules("joules", "J"),
    units: {
        kilojoules("kilojoules", "kJ") = 1000.0,
    }
}
