//! Unit registry and unit resolution for report rows
//!
//! Every unit family (for example `timeDurationInMs`) is registered in six
//! variants: plain and delta, each with no improvement direction, a
//! bigger-is-better suffix and a smaller-is-better suffix.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Improvement-direction hint value meaning "unknown"
pub const UNKNOWN_DIRECTION_HINT: i64 = 4;

/// Name of the unit every relative delta is expressed in (before the direction suffix)
pub const NORMALIZED_PERCENTAGE_DELTA: &str = "normalizedPercentageDelta";

/// Name of the dimensionless unit used for unresolvable unit names
pub const UNITLESS_NUMBER: &str = "unitlessNumber";

/// Name of the dimensionless unit used for the `count` statistic
pub const COUNT: &str = "count";

const SIZE_IN_BYTES: &str = "sizeInBytes";

/// Whether bigger or smaller values of a unit are an improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImprovementDirection {
    BiggerIsBetter,
    SmallerIsBetter,
    DontCare,
}

impl ImprovementDirection {
    pub const ALL: [ImprovementDirection; 3] = [
        ImprovementDirection::DontCare,
        ImprovementDirection::BiggerIsBetter,
        ImprovementDirection::SmallerIsBetter,
    ];

    /// Suffix appended to a unit name for this direction
    pub fn name_suffix(self) -> &'static str {
        match self {
            ImprovementDirection::BiggerIsBetter => "_biggerIsBetter",
            ImprovementDirection::SmallerIsBetter => "_smallerIsBetter",
            ImprovementDirection::DontCare => "",
        }
    }

    /// Interpret a row's numeric improvement-direction hint.
    ///
    /// Returns `None` for the "unknown" sentinel; `0` is bigger-is-better and
    /// every other value is smaller-is-better.
    pub fn from_hint(hint: i64) -> Option<Self> {
        match hint {
            UNKNOWN_DIRECTION_HINT => None,
            0 => Some(ImprovementDirection::BiggerIsBetter),
            _ => Some(ImprovementDirection::SmallerIsBetter),
        }
    }
}

/// Binary prefixes used when displaying byte-sized values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitPrefix {
    Kibi,
    Mebi,
    Gibi,
}

impl UnitPrefix {
    pub fn factor(self) -> f64 {
        match self {
            UnitPrefix::Kibi => 1024.0,
            UnitPrefix::Mebi => 1024.0 * 1024.0,
            UnitPrefix::Gibi => 1024.0 * 1024.0 * 1024.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnitPrefix::Kibi => "Ki",
            UnitPrefix::Mebi => "Mi",
            UnitPrefix::Gibi => "Gi",
        }
    }

    /// Largest prefix not exceeding `value`, never smaller than `self`
    pub fn best_fit(self, value: f64) -> UnitPrefix {
        let magnitude = value.abs();
        [UnitPrefix::Gibi, UnitPrefix::Mebi]
            .into_iter()
            .find(|p| p.factor() > self.factor() && magnitude >= p.factor())
            .unwrap_or(self)
    }
}

/// Whether a delta value is good news, bad news, or neither
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    None,
    Improvement,
    Regression,
}

/// A canonical unit of measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDescriptor {
    /// Registry name, e.g. `timeDurationInMsDelta_smallerIsBetter`
    pub name: String,
    /// Wire name, e.g. `msDelta_smallerIsBetter`
    pub json_name: String,
    /// Unit family without delta marker or direction suffix
    pub base_unit_name: String,
    pub improvement_direction: ImprovementDirection,
    pub is_delta: bool,
    pub corresponding_delta_unit_name: String,
    /// Display symbol, empty for dimensionless units
    pub symbol: String,
}

impl UnitDescriptor {
    /// Name of the variant of this unit with the given improvement direction
    pub fn name_with_direction(&self, direction: ImprovementDirection) -> String {
        variant_name(&self.base_unit_name, self.is_delta, direction)
    }

    /// Whether the base unit counts bytes
    pub fn is_byte_sized(&self) -> bool {
        self.base_unit_name == SIZE_IN_BYTES
    }

    /// Classify a value of this unit as improvement or regression.
    ///
    /// Only delta units with a known improvement direction classify; zero and
    /// non-finite values never do.
    pub fn change(&self, value: f64) -> Change {
        if !self.is_delta
            || self.improvement_direction == ImprovementDirection::DontCare
            || value == 0.0
            || !value.is_finite()
        {
            return Change::None;
        }
        let bigger = value > 0.0;
        match (self.improvement_direction, bigger) {
            (ImprovementDirection::BiggerIsBetter, true) => Change::Improvement,
            (ImprovementDirection::BiggerIsBetter, false) => Change::Regression,
            (_, true) => Change::Regression,
            (_, false) => Change::Improvement,
        }
    }
}

fn variant_name(base: &str, is_delta: bool, direction: ImprovementDirection) -> String {
    format!(
        "{}{}{}",
        base,
        if is_delta { "Delta" } else { "" },
        direction.name_suffix()
    )
}

/// Mapping from a legacy (pre-registry) unit name to a registry family
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyUnitInfo {
    pub name: &'static str,
    pub conversion_factor: f64,
    pub default_improvement_direction: Option<ImprovementDirection>,
}

/// Outcome of resolving a row's unit
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUnit {
    pub unit: UnitDescriptor,
    /// Factor applied to raw values of a legacy unit to express them in `unit`
    pub conversion_factor: f64,
    /// Display prefix, set for byte-sized units
    pub prefix: Option<UnitPrefix>,
}

/// (registry name, wire name, symbol)
const UNIT_FAMILIES: &[(&str, &str, &str)] = &[
    ("timeDurationInMs", "ms", "ms"),
    ("timeStampInMs", "tsMs", "ms"),
    ("normalizedPercentage", "n%", "%"),
    (SIZE_IN_BYTES, "sizeInBytes", "B"),
    ("energyInJoules", "J", "J"),
    ("powerInWatts", "W", "W"),
    ("electricCurrentInAmperes", "A", "A"),
    ("electricPotentialInVolts", "V", "V"),
    ("frequencyInHertz", "Hz", "Hz"),
    (UNITLESS_NUMBER, "unitless", ""),
    (COUNT, "count", ""),
    ("sigma", "sigma", "σ"),
];

fn legacy_units() -> Vec<(&'static str, LegacyUnitInfo)> {
    use ImprovementDirection::*;
    let info = |name, conversion_factor, default_improvement_direction| LegacyUnitInfo {
        name,
        conversion_factor,
        default_improvement_direction,
    };
    vec![
        ("%", info("normalizedPercentage", 0.01, None)),
        ("Hz", info("frequencyInHertz", 1.0, None)),
        ("KB", info(SIZE_IN_BYTES, 1024.0, Some(SmallerIsBetter))),
        ("MB", info(SIZE_IN_BYTES, 1024.0 * 1024.0, Some(SmallerIsBetter))),
        ("bytes", info(SIZE_IN_BYTES, 1.0, Some(SmallerIsBetter))),
        ("kb", info(SIZE_IN_BYTES, 1024.0, Some(SmallerIsBetter))),
        ("mW", info("powerInWatts", 0.001, Some(SmallerIsBetter))),
        ("mWh", info("energyInJoules", 3.6, Some(SmallerIsBetter))),
        ("ns", info("timeDurationInMs", 0.000_001, Some(SmallerIsBetter))),
        ("us", info("timeDurationInMs", 0.001, Some(SmallerIsBetter))),
        ("seconds", info("timeDurationInMs", 1000.0, Some(SmallerIsBetter))),
        ("sec", info("timeDurationInMs", 1000.0, Some(SmallerIsBetter))),
        ("count", info(COUNT, 1.0, None)),
        ("frames", info(COUNT, 1.0, None)),
        ("fps", info(UNITLESS_NUMBER, 1.0, Some(BiggerIsBetter))),
        ("runs/s", info(UNITLESS_NUMBER, 1.0, Some(BiggerIsBetter))),
        ("score", info(UNITLESS_NUMBER, 1.0, Some(BiggerIsBetter))),
    ]
}

/// Immutable lookup tables for units and legacy unit names.
///
/// Built once at startup and shared by reference; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    by_name: HashMap<String, UnitDescriptor>,
    by_json_name: HashMap<String, String>,
    legacy: HashMap<&'static str, LegacyUnitInfo>,
}

impl UnitRegistry {
    /// The standard registry with all built-in unit families
    pub fn standard() -> Self {
        let mut by_name = HashMap::new();
        let mut by_json_name = HashMap::new();

        for &(base, json, symbol) in UNIT_FAMILIES {
            for is_delta in [false, true] {
                for direction in ImprovementDirection::ALL {
                    let name = variant_name(base, is_delta, direction);
                    let json_name = variant_name(json, is_delta, direction);
                    let descriptor = UnitDescriptor {
                        name: name.clone(),
                        json_name: json_name.clone(),
                        base_unit_name: base.to_string(),
                        improvement_direction: direction,
                        is_delta,
                        corresponding_delta_unit_name: variant_name(base, true, direction),
                        symbol: symbol.to_string(),
                    };
                    by_json_name.insert(json_name, name.clone());
                    by_name.insert(name, descriptor);
                }
            }
        }

        Self {
            by_name,
            by_json_name,
            legacy: legacy_units().into_iter().collect(),
        }
    }

    /// Look up a unit by registry name or wire name
    pub fn get(&self, name: &str) -> Option<&UnitDescriptor> {
        self.by_json_name
            .get(name)
            .and_then(|n| self.by_name.get(n))
            .or_else(|| self.by_name.get(name))
    }

    /// Iterate over every registered unit
    pub fn iter(&self) -> impl Iterator<Item = &UnitDescriptor> {
        self.by_name.values()
    }

    pub fn legacy(&self, name: &str) -> Option<&LegacyUnitInfo> {
        self.legacy.get(name)
    }

    /// The delta unit corresponding to `unit`
    pub fn delta_of(&self, unit: &UnitDescriptor) -> UnitDescriptor {
        self.by_name
            .get(&unit.corresponding_delta_unit_name)
            .cloned()
            .unwrap_or_else(|| unit.clone())
    }

    /// The relative-delta unit for a given improvement direction
    pub fn normalized_percentage_delta(&self, direction: ImprovementDirection) -> UnitDescriptor {
        self.named(&format!(
            "{}{}",
            NORMALIZED_PERCENTAGE_DELTA,
            direction.name_suffix()
        ))
    }

    /// The dimensionless count unit
    pub fn count(&self) -> UnitDescriptor {
        self.named(COUNT)
    }

    fn named(&self, name: &str) -> UnitDescriptor {
        // Only called with names of built-in families.
        self.by_name.get(name).cloned().unwrap_or_else(|| UnitDescriptor {
            name: name.to_string(),
            json_name: name.to_string(),
            base_unit_name: name.to_string(),
            improvement_direction: ImprovementDirection::DontCare,
            is_delta: false,
            corresponding_delta_unit_name: name.to_string(),
            symbol: String::new(),
        })
    }

    fn redirect(&self, unit: &UnitDescriptor, direction: ImprovementDirection) -> UnitDescriptor {
        self.by_name
            .get(&unit.name_with_direction(direction))
            .cloned()
            .unwrap_or_else(|| unit.clone())
    }

    /// Resolve a row's unit name to a canonical descriptor.
    ///
    /// Unknown names fall back to `unitlessNumber`, optionally upgraded through
    /// the legacy table keyed by `legacy_units_name` (or `units_name` when no
    /// legacy name is given). A `DONT_CARE` result is overridden by an explicit
    /// direction hint.
    pub fn resolve(
        &self,
        units_name: &str,
        legacy_units_name: Option<&str>,
        improvement_direction_hint: i64,
    ) -> ResolvedUnit {
        let mut conversion_factor = 1.0;
        let mut unit = match self.get(units_name) {
            Some(unit) => unit.clone(),
            None => {
                let unitless = self.named(UNITLESS_NUMBER);
                let legacy_key = legacy_units_name.unwrap_or(units_name);
                match self.legacy(legacy_key) {
                    Some(info) => {
                        conversion_factor = info.conversion_factor;
                        let direction = info
                            .default_improvement_direction
                            .unwrap_or(ImprovementDirection::DontCare);
                        self.by_name
                            .get(&variant_name(info.name, false, direction))
                            .cloned()
                            .unwrap_or(unitless)
                    }
                    None => unitless,
                }
            }
        };

        if unit.improvement_direction == ImprovementDirection::DontCare {
            if let Some(direction) = ImprovementDirection::from_hint(improvement_direction_hint) {
                unit = self.redirect(&unit, direction);
            }
        }

        let prefix = unit.is_byte_sized().then_some(UnitPrefix::Kibi);
        ResolvedUnit {
            unit,
            conversion_factor,
            prefix,
        }
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
