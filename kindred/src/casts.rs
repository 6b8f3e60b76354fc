//! Built-in cast handlers.

use kindred_core::{CastRegistry, KindResult, Payload, UnitValue};

use crate::units::{length, length2d};

/// Lifts a 1-D length onto the x axis: `[x]` becomes `[x, 0]`.
fn length_to_plane(value: &UnitValue) -> KindResult<Payload> {
    let mut raw = value.payload().to_vec();
    raw.push(0.0);
    Ok(Payload::from(raw))
}

/// Registers the built-in casts in `casts`.
pub fn install_casts_in(casts: &CastRegistry) -> KindResult<()> {
    casts.register(&length::meters()?, &length2d::meters2d()?, length_to_plane)?;
    log::debug!("Installed built-in casts");
    Ok(())
}

/// Registers the built-in casts in [`CastRegistry::global`]. Safe to call
/// more than once.
pub fn install_casts() -> KindResult<()> {
    install_casts_in(CastRegistry::global())
}
