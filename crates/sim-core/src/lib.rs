#![deny(warnings)]

//! Core domain models and invariants for Business Tycoon.
//!
//! This crate defines the serializable catalog and session entity types used
//! across the simulation, JSON catalog loading, and validation helpers to
//! guarantee basic invariants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Unique identifier for an owned company within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub u32);

/// Unique identifier for an offshore entity within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OffshoreId(pub u32);

/// A founder-selectable line of business with baseline financials.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessType {
    /// Industry name, e.g. "Dropshipping".
    pub name: String,
    /// Minimum capital required to found a company of this type.
    pub startup_capital: f64,
    /// Baseline monthly revenue per unit of capital.
    pub revenue: f64,
    /// Baseline profit margin in [0,1].
    pub profit_margin: f64,
}

/// A hireable manager. The same record is attached to a company on hire so
/// that firing can invert the hire transform with the same figures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManagerProfile {
    /// Manager name.
    pub name: String,
    /// Monthly salary in dollars.
    pub salary: f64,
    /// Multiplicative revenue boost, e.g. 0.2 = +20%.
    pub revenue_boost: f64,
    /// Additive profit margin boost.
    pub profit_margin_boost: f64,
}

/// A jurisdiction where an offshore entity can be registered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OffshoreLocation {
    /// Jurisdiction name, e.g. "Cayman Islands".
    pub name: String,
    /// One-time registration cost in dollars.
    pub setup_cost: f64,
    /// Corporate tax rate in [0,1], replaces the onshore default.
    pub tax_rate: f64,
}

/// Static reference data loaded once at session start.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    /// Business types available when founding a company.
    pub business_types: Vec<BusinessType>,
    /// Managers available for hire.
    pub management: Vec<ManagerProfile>,
    /// Jurisdictions available for offshore registration.
    pub offshore_locations: Vec<OffshoreLocation>,
}

/// Difficulty setting chosen once at session start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Rare,
    MediumRare,
    MediumWell,
    WellDone,
}

impl Difficulty {
    /// All settings in menu order, easiest first.
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Rare,
        Difficulty::MediumRare,
        Difficulty::MediumWell,
        Difficulty::WellDone,
    ];

    /// Profit multiplier applied during monthly settlement.
    pub fn multiplier(self) -> f64 {
        match self {
            Difficulty::Rare => 1.0,
            Difficulty::MediumRare => 0.75,
            Difficulty::MediumWell => 0.5,
            Difficulty::WellDone => 0.25,
        }
    }

    /// Menu label shown at session start.
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Rare => "Rare (Easiest)",
            Difficulty::MediumRare => "Medium Rare",
            Difficulty::MediumWell => "Medium Well",
            Difficulty::WellDone => "Well Done (Hardest)",
        }
    }
}

/// A product line launched inside a company.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product name.
    pub name: String,
    /// Cash spent at launch.
    pub investment: f64,
    /// Monthly revenue-rate contribution recorded at launch.
    pub revenue: f64,
}

/// An owned company. `offshore` is the authoritative membership fact; an
/// offshore entity's member list is derived from it, so the flag and the
/// list cannot disagree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Store-assigned identifier.
    pub id: CompanyId,
    /// Company name.
    pub name: String,
    /// Industry, references a `BusinessType` name.
    pub industry: String,
    /// Founding capital, fixed for the life of the company.
    pub capital: f64,
    /// Monthly revenue per unit of capital.
    pub revenue: f64,
    /// Fraction of revenue kept as profit.
    pub profit_margin: f64,
    /// Offshore entity this company is registered under, if any.
    pub offshore: Option<OffshoreId>,
    /// Launched products, in launch order.
    pub products: Vec<Product>,
    /// Current manager, if hired.
    pub management: Option<ManagerProfile>,
}

/// An offshore entity. The tax rate is copied from the location at creation
/// time and does not track later catalog changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OffshoreEntity {
    /// Store-assigned identifier.
    pub id: OffshoreId,
    /// Entity name.
    pub name: String,
    /// Jurisdiction, references an `OffshoreLocation` name.
    pub location: String,
    /// Tax rate copied from the location at creation.
    pub tax_rate: f64,
}

/// Validation errors for catalog invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Catalog record with an empty name.
    #[error("empty name in catalog record")]
    EmptyName,
    /// Two records in the same list share a name.
    #[error("duplicate catalog name: {0}")]
    DuplicateName(String),
    /// Monetary value must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Fraction must be within [0, 1].
    #[error("fraction out of [0,1] range")]
    FractionOutOfRange,
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
}

/// Errors raised while loading the catalog. All of them are fatal: the
/// session must not start on a missing or malformed source.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A catalog source could not be read.
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A catalog source is not valid JSON for its record type.
    #[error("failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// A catalog source parsed but violates an invariant.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl Catalog {
    /// Load `business_types.json`, `management.json`, and
    /// `offshore_locations.json` from `dir` and validate them.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let catalog = Catalog {
            business_types: load_records(&dir.join("business_types.json"))?,
            management: load_records(&dir.join("management.json"))?,
            offshore_locations: load_records(&dir.join("offshore_locations.json"))?,
        };
        validate_catalog(&catalog)?;
        info!(
            business_types = catalog.business_types.len(),
            managers = catalog.management.len(),
            locations = catalog.offshore_locations.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }
}

fn load_records<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn check_money(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite);
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeMoney);
    }
    Ok(())
}

fn check_fraction(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite);
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::FractionOutOfRange);
    }
    Ok(())
}

fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

/// Validate a business type record.
pub fn validate_business_type(b: &BusinessType) -> Result<(), ValidationError> {
    check_name(&b.name)?;
    check_money(b.startup_capital)?;
    check_money(b.revenue)?;
    check_fraction(b.profit_margin)?;
    Ok(())
}

/// Validate a manager record. Boosts are non-negative; the revenue boost has
/// no upper bound but must stay finite so firing can divide it back out.
pub fn validate_manager_profile(m: &ManagerProfile) -> Result<(), ValidationError> {
    check_name(&m.name)?;
    check_money(m.salary)?;
    check_money(m.revenue_boost)?;
    check_fraction(m.profit_margin_boost)?;
    Ok(())
}

/// Validate an offshore location record.
pub fn validate_offshore_location(l: &OffshoreLocation) -> Result<(), ValidationError> {
    check_name(&l.name)?;
    check_money(l.setup_cost)?;
    check_fraction(l.tax_rate)?;
    Ok(())
}

/// Validate the whole catalog, including per-list name uniqueness.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), ValidationError> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    for b in &catalog.business_types {
        validate_business_type(b)?;
        if !names.insert(&b.name) {
            return Err(ValidationError::DuplicateName(b.name.clone()));
        }
    }
    names.clear();
    for m in &catalog.management {
        validate_manager_profile(m)?;
        if !names.insert(&m.name) {
            return Err(ValidationError::DuplicateName(m.name.clone()));
        }
    }
    names.clear();
    for l in &catalog.offshore_locations {
        validate_offshore_location(l)?;
        if !names.insert(&l.name) {
            return Err(ValidationError::DuplicateName(l.name.clone()));
        }
    }
    Ok(())
}
