//! Weights and measures conversion for ingredient quantities
//!
//! Converts a leading quantity such as `10floz milk` or `1lb cheese` between
//! the metric and imperial systems. Anything it cannot parse is left alone.

use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    Metric,
    Imperial,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown unit system: {0}")]
pub struct UnknownUnitSystem(String);

impl FromStr for UnitSystem {
    type Err = UnknownUnitSystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            other => Err(UnknownUnitSystem(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Gram,
    Kilogram,
    Millilitre,
    Litre,
    Ounce,
    Pound,
    FluidOunce,
    Cup,
}

impl Unit {
    fn parse(token: &str) -> Option<Self> {
        let token = token.to_lowercase().replace([' ', '.'], "");
        Some(match token.as_str() {
            "g" | "gram" | "grams" => Unit::Gram,
            "kg" | "kilogram" | "kilograms" => Unit::Kilogram,
            "ml" | "millilitre" | "millilitres" | "milliliter" | "milliliters" => Unit::Millilitre,
            "l" | "litre" | "litres" | "liter" | "liters" => Unit::Litre,
            "oz" | "ounce" | "ounces" => Unit::Ounce,
            "lb" | "lbs" | "pound" | "pounds" => Unit::Pound,
            "floz" | "fluidounce" | "fluidounces" => Unit::FluidOunce,
            "cup" | "cups" => Unit::Cup,
            _ => return None,
        })
    }

    fn system(self) -> UnitSystem {
        match self {
            Unit::Gram | Unit::Kilogram | Unit::Millilitre | Unit::Litre => UnitSystem::Metric,
            Unit::Ounce | Unit::Pound | Unit::FluidOunce | Unit::Cup => UnitSystem::Imperial,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Millilitre => "ml",
            Unit::Litre => "l",
            Unit::Ounce => "oz",
            Unit::Pound => "lb",
            Unit::FluidOunce => "floz",
            Unit::Cup => "cups",
        }
    }

    /// Size in the base unit of its dimension (grams or millilitres)
    fn in_base(self) -> f64 {
        match self {
            Unit::Gram | Unit::Millilitre => 1.0,
            Unit::Kilogram | Unit::Litre => 1000.0,
            Unit::Ounce => 28.349_523,
            Unit::Pound => 453.592_37,
            Unit::FluidOunce => 29.573_53,
            Unit::Cup => 236.588_24,
        }
    }

    fn is_volume(self) -> bool {
        matches!(
            self,
            Unit::Millilitre | Unit::Litre | Unit::FluidOunce | Unit::Cup
        )
    }

    /// Unit to express `base` amount in, within the target system
    fn target(self, system: UnitSystem, base: f64) -> Unit {
        match (system, self.is_volume()) {
            (UnitSystem::Metric, false) if base >= 1000.0 => Unit::Kilogram,
            (UnitSystem::Metric, false) => Unit::Gram,
            (UnitSystem::Metric, true) if base >= 1000.0 => Unit::Litre,
            (UnitSystem::Metric, true) => Unit::Millilitre,
            (UnitSystem::Imperial, false) if base >= Unit::Pound.in_base() => Unit::Pound,
            (UnitSystem::Imperial, false) => Unit::Ounce,
            (UnitSystem::Imperial, true) => Unit::FluidOunce,
        }
    }
}

fn quantity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)^\s*(\d+(?:\.\d+)?)\s*",
            r"(fl\.?\s?oz|floz|kg|g|grams?|kilograms?|ml|millilit(?:re|er)s?",
            r"|l|lit(?:re|er)s?|oz|ounces?|lbs?|pounds?|cups?)",
            r"\b\s*(.*)$",
        ))
        .expect("quantity pattern is valid")
    })
}

fn format_amount(amount: f64) -> String {
    if amount >= 10.0 {
        format!("{}", amount.round())
    } else {
        let rounded = (amount * 10.0).round() / 10.0;
        let text = format!("{rounded:.1}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Convert the leading quantity of an ingredient line into `system`.
///
/// Returns `None` when there is no recognisable quantity or it is already
/// expressed in the target system.
pub fn convert_ingredient(ingredient: &str, system: UnitSystem) -> Option<String> {
    let captures = quantity_pattern().captures(ingredient)?;
    let amount: f64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = Unit::parse(captures.get(2)?.as_str())?;
    let rest = captures.get(3).map_or("", |m| m.as_str()).trim();

    if unit.system() == system {
        return None;
    }

    let base = amount * unit.in_base();
    let target = unit.target(system, base);
    let converted = base / target.in_base();
    let quantity = format!("{}{}", format_amount(converted), target.symbol());

    tracing::debug!(ingredient, converted = %quantity, "Converted ingredient");
    Some(if rest.is_empty() {
        quantity
    } else {
        format!("{quantity} {rest}")
    })
}
