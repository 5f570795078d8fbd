//! Recipe catalog
//!
//! A static, read-only list of schema.org-shaped recipes loaded once at
//! startup. Every recipe field is optional because catalog entries are
//! partial records.

use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const BUNDLED_CATALOG: &str = "recipes.json";

#[derive(RustEmbed)]
#[folder = "data/"]
struct BundledData;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Bundled catalog is missing")]
    MissingBundle,
}

/// Nutrition facts attached to a recipe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbohydrate_content: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cholesterol_content: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_content: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber_content: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_content: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturated_fat_content: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium_content: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar_content: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trans_fat_content: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsaturated_fat_content: Option<f64>,
}

/// A (possibly partial) recipe record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooking_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionInformation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_cuisine: Option<String>,
    #[serde(default)]
    pub recipe_ingredient: Vec<String>,
    #[serde(default)]
    pub recipe_instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_yield: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suitable_for_diet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<String>,
}

impl Recipe {
    /// Whether this recipe is called `name`, ignoring case
    pub fn is_named(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|own| own.to_lowercase() == name.to_lowercase())
    }
}

/// Immutable collection of recipes, looked up by name
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
}

impl RecipeCatalog {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    /// Parse a JSON array of recipes
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let recipes: Vec<Recipe> = serde_json::from_str(json)?;
        Ok(Self::new(recipes))
    }

    /// Load a catalog from a JSON file on disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The catalog compiled into the binary
    pub fn bundled() -> Result<Self, CatalogError> {
        let file = BundledData::get(BUNDLED_CATALOG).ok_or(CatalogError::MissingBundle)?;
        let recipes: Vec<Recipe> = serde_json::from_slice(&file.data)?;
        Ok(Self::new(recipes))
    }

    /// Case-insensitive exact name lookup
    pub fn find_by_name(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|recipe| recipe.is_named(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.recipes
            .iter()
            .filter_map(|recipe| recipe.name.as_deref())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_catalog() -> RecipeCatalog {
    RecipeCatalog::new(vec![
        Recipe {
            name: Some("Pancakes".to_string()),
            recipe_yield: Some("Makes 8 Pancakes".to_string()),
            recipe_ingredient: vec![
                "2 cups milk".to_string(),
                "1 egg".to_string(),
                "pinch of salt".to_string(),
            ],
            recipe_instructions: vec![
                "Mix everything.".to_string(),
                "Heat the pan.".to_string(),
                "Cook until golden.".to_string(),
            ],
            ..Recipe::default()
        },
        Recipe {
            name: Some("Toast".to_string()),
            recipe_yield: Some("Serves 1".to_string()),
            recipe_ingredient: vec!["1 slice bread".to_string()],
            recipe_instructions: vec!["Toast the bread.".to_string()],
            ..Recipe::default()
        },
    ])
}
