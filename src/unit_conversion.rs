//! # Unit Conversion Module
//!
//! Cross-unit quantity conversion within and, where a density factor exists,
//! across measurement categories.
//!
//! Conversion within a category is a multiplicative lookup through a common
//! base unit (milliliters for volume, grams for weight, single items for
//! count). Volume and weight interconvert only when an ingredient-specific
//! density factor (grams per milliliter) is known; count units never convert
//! to or from the measured categories. All arithmetic is double-precision
//! and unrounded — display formatting is a presentation concern.
//!
//! Density data ships embedded in the crate (`data/densities.json`,
//! ingredient name -> g/ml plus an alias map) and is parsed once at first
//! use. The [`ConversionTable`] itself is an immutable value constructed
//! once and passed by reference; callers needing extra densities extend a
//! clone rather than mutating shared state.

use log::trace;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::unit_table::{self, UnitCategory};

/// Errors raised by quantity conversion
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The two units live in incompatible categories and no density factor
    /// bridges them
    IncompatibleUnits { from: String, to: String },
    /// A unit string outside the recognized vocabulary
    UnknownUnit(String),
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionError::IncompatibleUnits { from, to } => {
                write!(f, "incompatible units: cannot convert {from} to {to}")
            }
            ConversionError::UnknownUnit(unit) => write!(f, "unknown unit: {unit}"),
        }
    }
}

impl std::error::Error for ConversionError {}

/// Embedded density data format
#[derive(Deserialize)]
struct DensityDataFile {
    /// Ingredient name -> grams per milliliter
    ingredients: HashMap<String, f64>,
    /// Alternate spelling -> canonical ingredient name
    aliases: HashMap<String, String>,
}

static DENSITY_JSON: &str = include_str!("data/densities.json");

static BUILTIN_TABLE: LazyLock<ConversionTable> = LazyLock::new(|| {
    let data: DensityDataFile =
        serde_json::from_str(DENSITY_JSON).expect("densities.json should be valid JSON");
    ConversionTable {
        densities: data.ingredients,
        aliases: data.aliases,
    }
});

/// Immutable conversion table: unit factors plus ingredient density factors.
#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    /// Ingredient name -> grams per milliliter
    densities: HashMap<String, f64>,
    /// Alternate spelling -> canonical ingredient name
    aliases: HashMap<String, String>,
}

impl ConversionTable {
    /// The built-in table with the embedded density data
    pub fn builtin() -> &'static ConversionTable {
        &BUILTIN_TABLE
    }

    /// An empty table with no density entries (unit conversion still works
    /// within each category)
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the table with an ingredient density in grams per milliliter
    pub fn with_density(mut self, ingredient_name: &str, grams_per_ml: f64) -> Self {
        self.densities
            .insert(ingredient_name.to_lowercase(), grams_per_ml);
        self
    }

    /// Look up the density factor (g/ml) for an ingredient name.
    ///
    /// Tries the name directly, then the alias map, then singular/plural
    /// variations, then the last word of a multi-word name ("whole wheat
    /// flour" falls back to "flour" only via aliases or this last-word try).
    pub fn density_for(&self, ingredient_name: &str) -> Option<f64> {
        let name = ingredient_name.trim().to_lowercase();

        if let Some(&density) = self.densities.get(&name) {
            return Some(density);
        }
        if let Some(canonical) = self.aliases.get(&name) {
            if let Some(&density) = self.densities.get(canonical) {
                return Some(density);
            }
        }
        if let Some(density) = self.try_plural_variations(&name) {
            return Some(density);
        }
        // Last word fallback for modifier-carrying names
        if let Some(last) = name.rsplit(' ').next() {
            if last != name {
                if let Some(&density) = self.densities.get(last) {
                    return Some(density);
                }
            }
        }
        None
    }

    /// Convert `amount` from one unit to another.
    ///
    /// `ingredient_name` enables volume<->weight conversion when a density
    /// entry exists for it; without one, cross-category conversion fails
    /// with [`ConversionError::IncompatibleUnits`]. Count units never
    /// convert to or from volume/weight.
    pub fn convert(
        &self,
        amount: f64,
        from_unit: &str,
        to_unit: &str,
        ingredient_name: Option<&str>,
    ) -> Result<f64, ConversionError> {
        let from = unit_table::normalize_unit(from_unit)
            .ok_or_else(|| ConversionError::UnknownUnit(from_unit.to_string()))?;
        let to = unit_table::normalize_unit(to_unit)
            .ok_or_else(|| ConversionError::UnknownUnit(to_unit.to_string()))?;

        if from == to {
            return Ok(amount);
        }

        let (from_category, from_factor) = unit_table::base_factor(from)
            .ok_or_else(|| ConversionError::UnknownUnit(from.to_string()))?;
        let (to_category, to_factor) = unit_table::base_factor(to)
            .ok_or_else(|| ConversionError::UnknownUnit(to.to_string()))?;

        if from_category == to_category {
            return Ok(amount * from_factor / to_factor);
        }

        let incompatible = || ConversionError::IncompatibleUnits {
            from: from.to_string(),
            to: to.to_string(),
        };

        let density = match (from_category, to_category) {
            (UnitCategory::Volume, UnitCategory::Weight)
            | (UnitCategory::Weight, UnitCategory::Volume) => ingredient_name
                .and_then(|name| self.density_for(name))
                .ok_or_else(incompatible)?,
            // Count never bridges to a measured category
            _ => return Err(incompatible()),
        };

        trace!(
            "Cross-category conversion {from} -> {to} via density {density} g/ml for {:?}",
            ingredient_name
        );

        let converted = match from_category {
            UnitCategory::Volume => amount * from_factor * density / to_factor,
            _ => amount * from_factor / density / to_factor,
        };
        Ok(converted)
    }

    fn try_plural_variations(&self, name: &str) -> Option<f64> {
        let with_s = format!("{name}s");
        if let Some(&density) = self.densities.get(with_s.as_str()) {
            return Some(density);
        }
        if let Some(stripped) = name.strip_suffix('s') {
            if let Some(&density) = self.densities.get(stripped) {
                return Some(density);
            }
        }
        None
    }
}
