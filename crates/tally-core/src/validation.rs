//! # Validation Module
//!
//! Input validation for snapshot entities and sale lines.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Shape and type checks                                             │
//! │  └── Commission rule tags and params (commission.rs)                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Sign rules (qty > 0, prices ≥ 0, discount ≥ 0)                    │
//! │  ├── Ranges (recipe difficulty 1–5)                                    │
//! │  └── Required ids and names                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Snapshot consistency (engine.rs)                             │
//! │  ├── Ids unique per collection                                         │
//! │  ├── Stored sale figures reconcile                                     │
//! │  └── References resolve (staff, rules, catalog sources)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::types::Quantity;
//! use tally_core::validation::{validate_non_negative_money, validate_quantity};
//!
//! assert!(validate_quantity("quantity", Quantity::units(2)).is_ok());
//! assert!(validate_non_negative_money("discount", Money::from_cents(-1)).is_err());
//! ```

use std::collections::HashSet;

use crate::catalog::{CatalogItem, Package, Recipe};
use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::sale::{totalize_sale, Sale};
use crate::types::{Quantity, SourceKind, StaffMember};

/// Maximum length of a display name.
pub const MAX_NAME_LEN: usize = 200;

/// Recipe difficulty bounds.
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an entity id.
///
/// Ids are opaque strings; they only need to be present.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a display name.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_name;
///
/// assert!(validate_name("name", "Dragon's Fire").is_ok());
/// assert!(validate_name("name", "  ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Rejects the first id that appears twice.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_unique_ids;
///
/// assert!(validate_unique_ids("staff.id", ["jake", "rosa"]).is_ok());
/// assert!(validate_unique_ids("staff.id", ["jake", "jake"]).is_err());
/// ```
pub fn validate_unique_ids<'a>(
    field: &str,
    ids: impl IntoIterator<Item = &'a str>,
) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::Duplicate {
                field: field.to_string(),
                value: id.to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that a quantity is strictly positive.
pub fn validate_quantity(field: &str, qty: Quantity) -> ValidationResult<()> {
    if !qty.is_positive() {
        return Err(ValidationError::must_be_positive(field));
    }
    Ok(())
}

/// Validates that an amount is zero or more.
///
/// Prices, costs and discounts are never negative. Zero is allowed
/// (complimentary items, no discount).
pub fn validate_non_negative_money(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::must_not_be_negative(field));
    }
    Ok(())
}

/// Validates a recipe difficulty (1–5).
pub fn validate_difficulty(difficulty: u8) -> ValidationResult<()> {
    if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty) {
        return Err(ValidationError::OutOfRange {
            field: "difficulty".to_string(),
            min: MIN_DIFFICULTY.to_string(),
            max: MAX_DIFFICULTY.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates a catalog item and its price history.
pub fn validate_catalog_item(item: &CatalogItem) -> ValidationResult<()> {
    validate_id("item.id", &item.id)?;
    validate_name("item.name", &item.name)?;
    validate_non_negative_money("item.buyPrice", item.buy_price)?;

    for price in &item.sell_prices {
        validate_non_negative_money("sellPrice.sellPrice", price.sell_price)?;
        if let Some(to) = price.effective_to {
            if to < price.effective_from {
                return Err(ValidationError::InvalidFormat {
                    field: "sellPrice.effectiveTo".to_string(),
                    reason: "must not be before effectiveFrom".to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Validates a recipe.
pub fn validate_recipe(recipe: &Recipe) -> ValidationResult<()> {
    validate_id("recipe.id", &recipe.id)?;
    validate_name("recipe.name", &recipe.name)?;
    validate_difficulty(recipe.difficulty)?;

    for ingredient in &recipe.ingredients {
        validate_id("ingredient.itemId", &ingredient.item_id)?;
        validate_quantity("ingredient.quantity", ingredient.quantity)?;
    }

    Ok(())
}

/// Validates a package.
pub fn validate_package(package: &Package) -> ValidationResult<()> {
    validate_id("package.id", &package.id)?;
    validate_name("package.name", &package.name)?;
    validate_non_negative_money("package.bundleSellPrice", package.bundle_sell_price)?;

    for component in &package.items {
        if component.source_type == SourceKind::Package {
            return Err(ValidationError::NotAllowed {
                field: "packageItem.sourceType".to_string(),
                value: SourceKind::Package.to_string(),
                allowed: vec![SourceKind::Item.to_string(), SourceKind::Recipe.to_string()],
            });
        }
        validate_id("packageItem.sourceId", &component.source_id)?;
        validate_quantity("packageItem.quantity", component.quantity)?;
    }

    Ok(())
}

/// Validates a staff member.
pub fn validate_staff(staff: &StaffMember) -> ValidationResult<()> {
    validate_id("staff.id", &staff.id)?;
    validate_name("staff.name", &staff.name)?;
    Ok(())
}

/// Validates a stored sale.
///
/// Amounts are non-negative, `total = max(0, subtotal − discount)` and
/// `profit = total − cost`. A sale that carries its lines must also total
/// to the stored subtotal and cost.
pub fn validate_sale_record(sale: &Sale) -> ValidationResult<()> {
    validate_id("sale.id", &sale.id)?;
    validate_id("sale.staffId", &sale.staff_id)?;
    validate_non_negative_money("sale.subtotal", sale.subtotal)?;
    validate_non_negative_money("sale.discount", sale.discount)?;
    validate_non_negative_money("sale.total", sale.total)?;
    validate_non_negative_money("sale.cost", sale.cost)?;

    let total = (sale.subtotal - sale.discount).clamp_non_negative();
    reconcile("sale.total", total, sale.total)?;
    reconcile("sale.profit", sale.total - sale.cost, sale.profit)?;

    if !sale.lines.is_empty() {
        let totals = totalize_sale(&sale.lines, sale.discount)?;
        reconcile("sale.subtotal", totals.subtotal, sale.subtotal)?;
        reconcile("sale.cost", totals.cost, sale.cost)?;
    }

    Ok(())
}

fn reconcile(field: &str, expected: Money, stored: Money) -> ValidationResult<()> {
    if expected != stored {
        return Err(ValidationError::Inconsistent {
            field: field.to_string(),
            reason: format!("expected {}, stored {}", expected, stored),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
