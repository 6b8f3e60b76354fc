//! Unit catalog file support.
//!
//! Families and units can be declared in TOML instead of code:
//!
//! ```toml
//! [[family]]
//! name = "length"
//! standard = { name = "meters", symbol = "m" }
//!
//! [[family.unit]]
//! name = "inches"
//! symbol = "in"
//! scale = 0.0254
//!
//! [[family]]
//! name = "temperature"
//! standard = { name = "kelvin", symbol = "K" }
//!
//! [[family.unit]]
//! name = "celsius"
//! symbol = "degC"
//! scale = 1.0
//! offset = 273.15
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KindError;
use crate::kind::{Family, Kind};
use crate::registry::KindRegistry;

/// Errors raised while loading or registering a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be read or found.
    #[error("Catalog I/O error: {0}")]
    Io(String),

    /// The TOML text is malformed or does not match the catalog layout.
    #[error("Catalog parse error: {0}")]
    Parse(String),

    /// Two units in the catalog share a symbol.
    #[error("Duplicate unit symbol: {0}")]
    DuplicateSymbol(String),

    /// A family or unit entry has an empty name or a bad scale or offset.
    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    /// The registry rejected a family or unit.
    #[error(transparent)]
    Kind(#[from] KindError),
}

/// A parsed unit catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitCatalog {
    /// Families in declaration order.
    #[serde(default, rename = "family")]
    pub families: Vec<FamilySettings>,
}

/// One `[[family]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilySettings {
    /// Family name, e.g. `length`.
    pub name: String,
    /// The unit every other unit of the family converts through.
    pub standard: StandardUnitSettings,
    /// Additional units, from `[[family.unit]]` tables.
    #[serde(default, rename = "unit")]
    pub units: Vec<UnitSettings>,
}

/// The standard unit of a family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardUnitSettings {
    /// Full unit name.
    pub name: String,
    /// Display symbol, unique across the catalog.
    pub symbol: String,
}

/// A non-standard unit: `standard = value * scale + offset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSettings {
    /// Full unit name.
    pub name: String,
    /// Display symbol, unique across the catalog.
    pub symbol: String,
    /// Multiplier into the standard unit; finite and non-zero.
    pub scale: f64,
    /// Added after scaling; finite, defaults to `0`.
    #[serde(default)]
    pub offset: f64,
}

impl FromStr for UnitCatalog {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}

impl UnitCatalog {
    /// Parses a catalog from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        toml::from_str(content)
            .map_err(|e| CatalogError::Parse(format!("Failed to parse unit catalog: {}", e)))
    }

    /// Loads a catalog from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            CatalogError::Io(format!(
                "Failed to read catalog file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads `units.toml` from the current directory or `kindred/`.
    pub fn from_default_location() -> Result<Self, CatalogError> {
        let search_paths = [PathBuf::from("units.toml"), PathBuf::from("kindred/units.toml")];
        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Err(CatalogError::Io(
            "No units.toml found in standard locations".to_string(),
        ))
    }

    /// Checks names, symbols, scales and offsets without touching any registry.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashMap::new();
        for family in &self.families {
            if family.name.trim().is_empty() {
                return Err(CatalogError::InvalidUnit("family with empty name".to_string()));
            }
            let symbols = std::iter::once((&family.standard.name, &family.standard.symbol))
                .chain(family.units.iter().map(|u| (&u.name, &u.symbol)));
            for (name, symbol) in symbols {
                if name.trim().is_empty() || symbol.trim().is_empty() {
                    return Err(CatalogError::InvalidUnit(format!(
                        "unit in family {} needs a name and a symbol",
                        family.name
                    )));
                }
                if seen.insert(symbol.as_str(), name.as_str()).is_some() {
                    return Err(CatalogError::DuplicateSymbol(symbol.clone()));
                }
            }
            for unit in &family.units {
                if !unit.scale.is_finite() || unit.scale == 0.0 {
                    return Err(CatalogError::InvalidUnit(format!(
                        "{} has scale {}; expected a finite non-zero number",
                        unit.name, unit.scale
                    )));
                }
                if !unit.offset.is_finite() {
                    return Err(CatalogError::InvalidUnit(format!(
                        "{} has non-finite offset {}",
                        unit.name, unit.offset
                    )));
                }
            }
        }
        Ok(())
    }

    /// Registers every family and unit in `registry`.
    pub fn register(&self, registry: &KindRegistry) -> Result<CatalogUnits, CatalogError> {
        self.validate()?;

        let mut units = CatalogUnits::default();
        for settings in &self.families {
            let family = registry.family(&settings.name)?;
            let standard =
                registry.standard_unit(&family, &settings.standard.name, &settings.standard.symbol)?;
            units.insert(&settings.standard.symbol, standard.clone());

            for unit in &settings.units {
                let kind = registry
                    .affine_unit(&standard, &unit.name, &unit.symbol, unit.scale, unit.offset)
                    .map_err(|e| match e {
                        KindError::InvalidUnitDefinition(msg) => CatalogError::InvalidUnit(msg),
                        other => CatalogError::Kind(other),
                    })?;
                units.insert(&unit.symbol, kind);
            }
            units.families.insert(settings.name.clone(), family);
        }

        log::info!(
            "Registered {} units in {} families from catalog",
            units.len(),
            self.families.len()
        );
        Ok(units)
    }
}

/// Kinds registered from a catalog, looked up by symbol.
#[derive(Debug, Clone, Default)]
pub struct CatalogUnits {
    by_symbol: HashMap<String, Kind>,
    families: HashMap<String, Family>,
}

impl CatalogUnits {
    fn insert(&mut self, symbol: &str, kind: Kind) {
        self.by_symbol.insert(symbol.to_string(), kind);
    }

    /// Kind registered under `symbol`.
    pub fn get(&self, symbol: &str) -> Option<&Kind> {
        self.by_symbol.get(symbol)
    }

    /// Like [`CatalogUnits::get`] but failing with [`CatalogError::InvalidUnit`].
    pub fn unit(&self, symbol: &str) -> Result<Kind, CatalogError> {
        self.get(symbol)
            .cloned()
            .ok_or_else(|| CatalogError::InvalidUnit(format!("unknown unit symbol {}", symbol)))
    }

    /// Family registered under `name`.
    pub fn family(&self, name: &str) -> Option<&Family> {
        self.families.get(name)
    }

    /// Registered symbols.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.by_symbol.keys().map(String::as_str)
    }

    /// Number of registered units.
    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    /// Returns `true` if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::UnitValue;
    use approx::assert_abs_diff_eq;
    use std::io::Write;

    const CATALOG: &str = r#"
[[family]]
name = "length"
standard = { name = "meters", symbol = "m" }

[[family.unit]]
name = "centimeters"
symbol = "cm"
scale = 0.01

[[family.unit]]
name = "inches"
symbol = "in"
scale = 0.0254

[[family]]
name = "temperature"

[family.standard]
name = "kelvin"
symbol = "K"

[[family.unit]]
name = "celsius"
symbol = "degC"
scale = 1.0
offset = 273.15
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = UnitCatalog::from_toml_str(CATALOG).unwrap();
        assert_eq!(catalog.families.len(), 2);
        assert_eq!(catalog.families[0].units.len(), 2);
        assert_eq!(catalog.families[0].units[0].offset, 0.0);
        assert_eq!(catalog.families[1].standard.symbol, "K");
    }

    #[test]
    fn test_register_catalog() {
        let registry = KindRegistry::new();
        let units: UnitCatalog = CATALOG.parse().unwrap();
        let units = units.register(&registry).unwrap();
        assert_eq!(units.len(), 5);

        let cm = units.unit("cm").unwrap();
        let m = units.unit("m").unwrap();
        let converted = UnitValue::convert(&m, &UnitValue::new(&cm, 250.0)).unwrap();
        assert_abs_diff_eq!(converted.payload().as_scalar().unwrap(), 2.5, epsilon = 1e-12);

        let celsius = units.unit("degC").unwrap();
        let kelvin = units.unit("K").unwrap();
        let freezing = UnitValue::convert(&kelvin, &UnitValue::new(&celsius, 0.0)).unwrap();
        assert_abs_diff_eq!(freezing.payload().as_scalar().unwrap(), 273.15, epsilon = 1e-9);
        assert!(units.family("temperature").is_some());
    }

    #[test]
    fn test_register_twice_is_idempotent() {
        let registry = KindRegistry::new();
        let catalog = UnitCatalog::from_toml_str(CATALOG).unwrap();
        let first = catalog.register(&registry).unwrap();
        let second = catalog.register(&registry).unwrap();
        assert_eq!(first.get("in"), second.get("in"));
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let toml = r#"
[[family]]
name = "length"
standard = { name = "meters", symbol = "m" }

[[family.unit]]
name = "minutes_of_arc"
symbol = "m"
scale = 1.0
"#;
        let catalog = UnitCatalog::from_toml_str(toml).unwrap();
        let result = catalog.register(&KindRegistry::new());
        assert!(matches!(result, Err(CatalogError::DuplicateSymbol(s)) if s == "m"));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let toml = r#"
[[family]]
name = "length"
standard = { name = "meters", symbol = "m" }

[[family.unit]]
name = "broken"
symbol = "b"
scale = 0.0
"#;
        let catalog = UnitCatalog::from_toml_str(toml).unwrap();
        let result = catalog.register(&KindRegistry::new());
        assert!(matches!(result, Err(CatalogError::InvalidUnit(_))));
    }

    #[test]
    fn test_bad_later_unit_leaves_registry_untouched() {
        for value in ["scale = 0.0", "scale = nan", "scale = 1.0\noffset = inf"] {
            let toml = format!(
                r#"
[[family]]
name = "length"
standard = {{ name = "meters", symbol = "m" }}

[[family]]
name = "time"
standard = {{ name = "seconds", symbol = "s" }}

[[family.unit]]
name = "broken"
symbol = "b"
{}
"#,
                value
            );
            let catalog = UnitCatalog::from_toml_str(&toml).unwrap();
            assert!(matches!(catalog.validate(), Err(CatalogError::InvalidUnit(_))));

            let registry = KindRegistry::new();
            let result = catalog.register(&registry);
            assert!(matches!(result, Err(CatalogError::InvalidUnit(_))), "{}", value);
            assert!(registry.is_empty(), "{}", value);
        }
    }

    #[test]
    fn test_conflicting_standard_surfaces_kind_error() {
        let registry = KindRegistry::new();
        let length = registry.family("length").unwrap();
        registry.standard_unit(&length, "feet", "ft").unwrap();

        let catalog = UnitCatalog::from_toml_str(CATALOG).unwrap();
        let result = catalog.register(&registry);
        assert!(matches!(
            result,
            Err(CatalogError::Kind(KindError::DuplicateStandardUnit { .. }))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let result = UnitCatalog::from_toml_str("[[family]]\nname = 3");
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        let catalog = UnitCatalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.families.len(), 2);

        let missing = UnitCatalog::from_file("/nonexistent/units.toml");
        assert!(matches!(missing, Err(CatalogError::Io(_))));
    }
}
