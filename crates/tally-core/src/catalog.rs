//! # Catalog
//!
//! Items, their effective-dated sell prices, recipes and packages.
//!
//! ## Derived Values
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      What Is Stored vs Derived                          │
//! │                                                                         │
//! │  CatalogItem.buy_price        STORED   (what the saloon pays)          │
//! │  SellPrice.sell_price         STORED   (history of list prices)        │
//! │  Package.bundle_sell_price    STORED   (set independently)             │
//! │                                                                         │
//! │  Recipe calculated cost       DERIVED  Σ ingredient qty × buy price    │
//! │  Recipe suggested price       DERIVED  cost × recipe markup (2.5)      │
//! │  Package estimated cost       DERIVED  Σ component cost × qty          │
//! │                                                                         │
//! │  Derived values are recomputed from the catalog on demand and never    │
//! │  stored as independent truth.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Quantity, SourceKind};

// =============================================================================
// Catalog Item
// =============================================================================

/// A purchasable stock item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Unit of purchase (bottle, keg, pound).
    pub unit: String,
    /// Cost per purchase unit.
    pub buy_price: Money,
    /// Price history, any order.
    #[serde(default)]
    pub sell_prices: Vec<SellPrice>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// One effective-dated list price for an item in a given selling unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellPrice {
    pub item_id: String,
    /// Selling unit (glass, bottle, serving).
    pub unit: String,
    pub sell_price: Money,
    pub effective_from: DateTime<Utc>,
    /// `None` means open-ended.
    #[serde(default)]
    pub effective_to: Option<DateTime<Utc>>,
}

impl SellPrice {
    /// Checks whether this price is current at `as_of`.
    ///
    /// Current means `effective_from <= as_of` and `effective_to` is absent
    /// or `>= as_of` (the end bound is inclusive).
    pub fn is_current_at(&self, as_of: DateTime<Utc>) -> bool {
        self.effective_from <= as_of && self.effective_to.map_or(true, |to| to >= as_of)
    }
}

// =============================================================================
// Recipe
// =============================================================================

/// A drink or dish made from catalog items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub category: String,
    /// 1 (pour) to 5 (showpiece).
    pub difficulty: u8,
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// One ingredient line of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub item_id: String,
    /// Quantity in the item's purchase unit.
    pub quantity: Quantity,
    /// Unit shown on the recipe card (oz, piece). Informational only.
    #[serde(default)]
    pub unit_override: Option<String>,
}

// =============================================================================
// Package
// =============================================================================

/// A bundle of items and recipes sold at its own price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    pub name: String,
    /// Set independently; NOT derived from the contents.
    pub bundle_sell_price: Money,
    pub items: Vec<PackageItem>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// One component of a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageItem {
    /// `Item` or `Recipe`. Packages do not nest.
    pub source_type: SourceKind,
    pub source_id: String,
    pub quantity: Quantity,
}

// =============================================================================
// Catalog
// =============================================================================

/// Read-only view over the catalog part of a snapshot.
///
/// Lookups are linear: catalogs are tens to hundreds of entries.
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    pub items: &'a [CatalogItem],
    pub recipes: &'a [Recipe],
    pub packages: &'a [Package],
}

impl<'a> Catalog<'a> {
    /// Creates a catalog view.
    pub fn new(items: &'a [CatalogItem], recipes: &'a [Recipe], packages: &'a [Package]) -> Self {
        Catalog {
            items,
            recipes,
            packages,
        }
    }

    /// Finds an item by id.
    pub fn item(&self, id: &str) -> CoreResult<&'a CatalogItem> {
        self.items
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found(SourceKind::Item, id))
    }

    /// Finds a recipe by id.
    pub fn recipe(&self, id: &str) -> CoreResult<&'a Recipe> {
        self.recipes
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found(SourceKind::Recipe, id))
    }

    /// Finds a package by id.
    pub fn package(&self, id: &str) -> CoreResult<&'a Package> {
        self.packages
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(SourceKind::Package, id))
    }

    /// Calculated cost of a recipe: Σ(ingredient quantity × item buy price).
    ///
    /// The sum is exact; rounding to the cent happens once at the end.
    ///
    /// ## Example
    /// ```text
    /// Dragon's Fire:  2   × $25.00 (whiskey)      = $50.00
    ///                 0.5 × $5.00  (simple syrup) =  $2.50
    ///                                               ──────
    ///                                               $52.50
    /// ```
    pub fn recipe_cost(&self, recipe: &Recipe) -> CoreResult<Money> {
        let mut exact_cents = Decimal::ZERO;
        for ingredient in &recipe.ingredients {
            let item = self.item(&ingredient.item_id)?;
            exact_cents = add_extended(exact_cents, item.buy_price, ingredient.quantity)?;
        }
        to_money(exact_cents)
    }

    /// Unit cost of a single item or recipe, as used for sale lines.
    pub fn unit_cost(&self, kind: SourceKind, id: &str) -> CoreResult<Money> {
        match kind {
            SourceKind::Item => Ok(self.item(id)?.buy_price),
            SourceKind::Recipe => self.recipe_cost(self.recipe(id)?),
            SourceKind::Package => self.package_cost(self.package(id)?),
        }
    }

    /// Estimated cost of a package: Σ(component unit cost × quantity).
    pub fn package_cost(&self, package: &Package) -> CoreResult<Money> {
        let mut exact_cents = Decimal::ZERO;
        for component in &package.items {
            let unit_cost = match component.source_type {
                SourceKind::Item => self.item(&component.source_id)?.buy_price,
                SourceKind::Recipe => self.recipe_cost(self.recipe(&component.source_id)?)?,
                // Nested packages are not a catalog shape.
                SourceKind::Package => return Err(not_found(SourceKind::Package, &component.source_id)),
            };
            exact_cents = add_extended(exact_cents, unit_cost, component.quantity)?;
        }
        to_money(exact_cents)
    }
}

/// `sum + unit × qty`, exact.
fn add_extended(sum: Decimal, unit: Money, qty: Quantity) -> CoreResult<Decimal> {
    unit.as_decimal_cents()
        .checked_mul(qty.value())
        .and_then(|extended| sum.checked_add(extended))
        .ok_or_else(|| ValidationError::overflow("quantity").into())
}

fn to_money(exact_cents: Decimal) -> CoreResult<Money> {
    Money::checked_from_decimal_cents(exact_cents)
        .ok_or_else(|| ValidationError::overflow("cost").into())
}

fn not_found(kind: SourceKind, id: &str) -> CoreError {
    CoreError::SourceNotFound {
        kind: kind.to_string(),
        id: id.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
