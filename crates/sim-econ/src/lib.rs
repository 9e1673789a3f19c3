#![deny(warnings)]

//! Economic models for Business Tycoon.
//!
//! This module provides the per-company monthly figures and the monthly
//! settlement fold:
//! - Monthly revenue, profit, and operating cost
//! - Effective tax rate selection via offshore registration
//! - Product investment effects on revenue rate and margin
//! - Management hire/fire transforms (an exact inverse pair)

use sim_core::{Company, Difficulty, ManagerProfile, OffshoreEntity};
use tracing::debug;

/// Monthly operating cost as a fraction of founding capital.
pub const OPERATING_COST_RATE: f64 = 0.05;
/// Tax rate applied to companies without an offshore registration.
pub const DEFAULT_TAX_RATE: f64 = 0.15;
/// Fixed margin converting product investment into revenue rate.
pub const PRODUCT_PROFIT_MARGIN: f64 = 0.1;

/// Monthly revenue in dollars.
///
/// Example:
/// let r = monthly_revenue of a company with revenue rate 1.0 and
/// capital 1000 is 1000.
pub fn monthly_revenue(company: &Company) -> f64 {
    company.revenue * company.capital
}

/// Monthly profit in dollars, before difficulty scaling, operating cost,
/// and tax. This is the figure a manager's salary is checked against.
pub fn monthly_profit(company: &Company) -> f64 {
    company.revenue * company.capital * company.profit_margin
}

/// Monthly operating cost: 5% of founding capital, regardless of activity.
pub fn operating_cost(company: &Company) -> f64 {
    company.capital * OPERATING_COST_RATE
}

/// Effective tax rate for a company: the registered offshore entity's rate,
/// or the onshore default.
pub fn effective_tax_rate(company: &Company, entities: &[OffshoreEntity]) -> f64 {
    match company.offshore {
        Some(id) => entities
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.tax_rate)
            .unwrap_or(DEFAULT_TAX_RATE),
        None => DEFAULT_TAX_RATE,
    }
}

/// One company's contribution to the monthly settlement. Operating cost is
/// deducted before tax; the result may be negative and no floor is applied.
pub fn taxed_profit(
    company: &Company,
    entities: &[OffshoreEntity],
    difficulty: Difficulty,
) -> f64 {
    let profit = monthly_profit(company);
    let tax_rate = effective_tax_rate(company, entities);
    (profit * difficulty.multiplier() - operating_cost(company)) * (1.0 - tax_rate)
}

/// Settle one month: fold every company's taxed profit into the balance.
///
/// The fold is additive and per-company contributions do not interact, so
/// company order does not change the result. There is no failure path; the
/// caller increments its month counter after this returns.
pub fn settle_month(
    cash_balance: f64,
    companies: &[Company],
    entities: &[OffshoreEntity],
    difficulty: Difficulty,
) -> f64 {
    let mut balance = cash_balance;
    for company in companies {
        let delta = taxed_profit(company, entities, difficulty);
        debug!(company = %company.name, delta, "settled");
        balance += delta;
    }
    balance
}

/// Revenue-rate and margin deltas caused by launching one product.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProductEffect {
    /// Revenue-rate contribution: investment × the fixed product margin.
    pub added_revenue: f64,
    /// Profit contribution at the company's pre-product margin.
    pub added_profit: f64,
    /// Increment to the company's profit margin.
    pub margin_delta: f64,
}

/// Effect of investing `investment` into a new product.
///
/// The margin delta divides by the revenue rate *after* the product's own
/// contribution while the numerator uses the pre-product margin; removing
/// the product later does not undo either delta.
pub fn product_effect(company: &Company, investment: f64) -> ProductEffect {
    let added_revenue = investment * PRODUCT_PROFIT_MARGIN;
    let added_profit = added_revenue * company.profit_margin;
    let new_revenue = company.revenue + added_revenue;
    let margin_delta = (company.profit_margin * added_profit) / new_revenue;
    ProductEffect {
        added_revenue,
        added_profit,
        margin_delta,
    }
}

/// Apply a manager's boosts: revenue multiplicatively, margin additively.
pub fn apply_management(company: &mut Company, manager: &ManagerProfile) {
    company.revenue *= 1.0 + manager.revenue_boost;
    company.profit_margin += manager.profit_margin_boost;
}

/// Invert [`apply_management`]. Exact only when revenue and margin were not
/// otherwise mutated between hire and fire.
pub fn remove_management(company: &mut Company, manager: &ManagerProfile) {
    company.revenue /= 1.0 + manager.revenue_boost;
    company.profit_margin -= manager.profit_margin_boost;
}
