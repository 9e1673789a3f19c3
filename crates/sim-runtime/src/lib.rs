#![deny(warnings)]

//! Session runtime: the authoritative entity store and the turn-based
//! operations the interaction shell drives.
//!
//! The session owns every company and offshore entity. Offshore membership
//! is a back-reference on the company (`Company::offshore`); an entity's
//! member list is always derived from it, so the membership fact cannot
//! diverge from a separately maintained list.

use sim_core::{
    BusinessType, Catalog, Company, CompanyId, Difficulty, ManagerProfile, OffshoreEntity,
    OffshoreId, OffshoreLocation, Product,
};
use sim_econ::ProductEffect;
use thiserror::Error;
use tracing::info;

/// Cash balance granted before the game-start rebalance.
pub const STARTING_CASH: f64 = 10_000.0;
/// Factor applied once to starting cash and to every business type's
/// baseline revenue and profit margin when a session begins.
pub const START_REBALANCE: f64 = 0.5;

/// Recoverable operation failures. Every variant is reported to the player
/// and leaves the session untouched.
#[derive(Debug, Error, PartialEq)]
pub enum OpError {
    /// Cash balance below a required outlay.
    #[error("insufficient cash: need ${needed:.2}, have ${available:.2}")]
    InsufficientCash { needed: f64, available: f64 },
    /// Founding capital below the business type's minimum.
    #[error("capital ${capital:.2} is below the ${required:.2} startup minimum")]
    BelowStartupCapital { capital: f64, required: f64 },
    /// Manager salary exceeds the company's current monthly profit.
    #[error("monthly profit ${profit:.2} cannot cover a ${salary:.2} salary")]
    SalaryUnaffordable { salary: f64, profit: f64 },
    /// Company already has a manager; fire first.
    #[error("company already has a manager")]
    AlreadyManaged,
    /// Company has no manager to fire.
    #[error("company has no manager to fire")]
    NotManaged,
    /// Company is already registered offshore; detach first.
    #[error("company is already part of an offshore entity")]
    AlreadyOffshore,
    /// Company is not registered with the selected offshore entity.
    #[error("company is not registered with this offshore entity")]
    NotMember,
    /// No company with the given id.
    #[error("unknown company")]
    UnknownCompany,
    /// No offshore entity with the given id.
    #[error("unknown offshore entity")]
    UnknownEntity,
    /// Product index out of range.
    #[error("unknown product")]
    UnknownProduct,
    /// Catalog index out of range.
    #[error("unknown catalog entry")]
    UnknownCatalogEntry,
}

/// A single-player session: global balances plus the owned entity stores.
#[derive(Clone, Debug)]
pub struct Session {
    player: String,
    cash_balance: f64,
    months_passed: u32,
    difficulty: Difficulty,
    catalog: Catalog,
    companies: Vec<Company>,
    offshore_entities: Vec<OffshoreEntity>,
    next_company_id: u32,
    next_offshore_id: u32,
}

impl Session {
    /// Start a session. The rebalance halves the starting cash and every
    /// business type's baseline revenue and profit margin, once.
    pub fn new(player: String, difficulty: Difficulty, mut catalog: Catalog) -> Self {
        for business in &mut catalog.business_types {
            business.revenue *= START_REBALANCE;
            business.profit_margin *= START_REBALANCE;
        }
        info!(%player, ?difficulty, "session started");
        Session {
            player,
            cash_balance: STARTING_CASH * START_REBALANCE,
            months_passed: 0,
            difficulty,
            catalog,
            companies: Vec::new(),
            offshore_entities: Vec::new(),
            next_company_id: 0,
            next_offshore_id: 0,
        }
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn cash_balance(&self) -> f64 {
        self.cash_balance
    }

    pub fn months_passed(&self) -> u32 {
        self.months_passed
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// The session's catalog, with the game-start rebalance applied.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn offshore_entities(&self) -> &[OffshoreEntity] {
        &self.offshore_entities
    }

    pub fn company(&self, id: CompanyId) -> Option<&Company> {
        self.companies.iter().find(|c| c.id == id)
    }

    /// Derived member list of an offshore entity.
    pub fn members_of(&self, id: OffshoreId) -> Vec<&Company> {
        self.companies
            .iter()
            .filter(|c| c.offshore == Some(id))
            .collect()
    }

    fn company_index(&self, id: CompanyId) -> Result<usize, OpError> {
        self.companies
            .iter()
            .position(|c| c.id == id)
            .ok_or(OpError::UnknownCompany)
    }

    fn business_type(&self, index: usize) -> Result<&BusinessType, OpError> {
        self.catalog
            .business_types
            .get(index)
            .ok_or(OpError::UnknownCatalogEntry)
    }

    fn location(&self, index: usize) -> Result<&OffshoreLocation, OpError> {
        self.catalog
            .offshore_locations
            .get(index)
            .ok_or(OpError::UnknownCatalogEntry)
    }

    fn entity_exists(&self, id: OffshoreId) -> Result<(), OpError> {
        if self.offshore_entities.iter().any(|e| e.id == id) {
            Ok(())
        } else {
            Err(OpError::UnknownEntity)
        }
    }

    /// Found a company of the given business type with `capital` taken from
    /// the cash balance. Capital is checked against the type's startup
    /// minimum before the cash check.
    pub fn create_company(
        &mut self,
        business_index: usize,
        name: String,
        capital: f64,
    ) -> Result<CompanyId, OpError> {
        let business = self.business_type(business_index)?.clone();
        if capital < business.startup_capital {
            return Err(OpError::BelowStartupCapital {
                capital,
                required: business.startup_capital,
            });
        }
        if self.cash_balance < capital {
            return Err(OpError::InsufficientCash {
                needed: capital,
                available: self.cash_balance,
            });
        }
        self.cash_balance -= capital;
        let id = CompanyId(self.next_company_id);
        self.next_company_id += 1;
        info!(company = %name, industry = %business.name, capital, "company founded");
        self.companies.push(Company {
            id,
            name,
            industry: business.name,
            capital,
            revenue: business.revenue,
            profit_margin: business.profit_margin,
            offshore: None,
            products: Vec::new(),
            management: None,
        });
        Ok(id)
    }

    /// Launch a product inside a company, debiting the investment and
    /// applying its revenue and margin effect.
    pub fn add_product(
        &mut self,
        company_id: CompanyId,
        name: String,
        investment: f64,
    ) -> Result<ProductEffect, OpError> {
        let idx = self.company_index(company_id)?;
        if self.cash_balance < investment {
            return Err(OpError::InsufficientCash {
                needed: investment,
                available: self.cash_balance,
            });
        }
        let effect = sim_econ::product_effect(&self.companies[idx], investment);
        self.cash_balance -= investment;
        let company = &mut self.companies[idx];
        company.revenue += effect.added_revenue;
        company.profit_margin += effect.margin_delta;
        info!(company = %company.name, product = %name, investment, "product launched");
        company.products.push(Product {
            name,
            investment,
            revenue: effect.added_revenue,
        });
        Ok(effect)
    }

    /// Drop the product at `index` (0-based). The revenue and margin gains
    /// it caused at launch are not reversed.
    pub fn remove_product(
        &mut self,
        company_id: CompanyId,
        index: usize,
    ) -> Result<Product, OpError> {
        let idx = self.company_index(company_id)?;
        let company = &mut self.companies[idx];
        if index >= company.products.len() {
            return Err(OpError::UnknownProduct);
        }
        let removed = company.products.remove(index);
        info!(company = %company.name, product = %removed.name, "product removed");
        Ok(removed)
    }

    /// Hire a manager from the catalog. The salary is checked against the
    /// company's current monthly profit (undifficulted) at hire time only.
    pub fn hire_manager(
        &mut self,
        company_id: CompanyId,
        manager_index: usize,
    ) -> Result<(), OpError> {
        let idx = self.company_index(company_id)?;
        if self.companies[idx].management.is_some() {
            return Err(OpError::AlreadyManaged);
        }
        let manager = self
            .catalog
            .management
            .get(manager_index)
            .cloned()
            .ok_or(OpError::UnknownCatalogEntry)?;
        let profit = sim_econ::monthly_profit(&self.companies[idx]);
        if manager.salary > profit {
            return Err(OpError::SalaryUnaffordable {
                salary: manager.salary,
                profit,
            });
        }
        let company = &mut self.companies[idx];
        sim_econ::apply_management(company, &manager);
        info!(company = %company.name, manager = %manager.name, "manager hired");
        company.management = Some(manager);
        Ok(())
    }

    /// Fire the current manager, inverting the hire transform exactly.
    pub fn fire_manager(&mut self, company_id: CompanyId) -> Result<ManagerProfile, OpError> {
        let idx = self.company_index(company_id)?;
        let company = &mut self.companies[idx];
        let manager = company.management.take().ok_or(OpError::NotManaged)?;
        sim_econ::remove_management(company, &manager);
        info!(company = %company.name, manager = %manager.name, "manager fired");
        Ok(manager)
    }

    /// Register an offshore entity at the given location, debiting the
    /// setup cost. The location's tax rate is copied and fixed thereafter.
    pub fn create_offshore(
        &mut self,
        location_index: usize,
        name: String,
    ) -> Result<OffshoreId, OpError> {
        let location = self.location(location_index)?.clone();
        if self.cash_balance < location.setup_cost {
            return Err(OpError::InsufficientCash {
                needed: location.setup_cost,
                available: self.cash_balance,
            });
        }
        self.cash_balance -= location.setup_cost;
        let id = OffshoreId(self.next_offshore_id);
        self.next_offshore_id += 1;
        info!(entity = %name, location = %location.name, "offshore entity registered");
        self.offshore_entities.push(OffshoreEntity {
            id,
            name,
            location: location.name,
            tax_rate: location.tax_rate,
        });
        Ok(id)
    }

    /// Register a company under an offshore entity. Membership is exclusive:
    /// a company already registered anywhere must be detached first.
    pub fn attach_offshore(
        &mut self,
        entity_id: OffshoreId,
        company_id: CompanyId,
    ) -> Result<(), OpError> {
        self.entity_exists(entity_id)?;
        let idx = self.company_index(company_id)?;
        let company = &mut self.companies[idx];
        if company.offshore.is_some() {
            return Err(OpError::AlreadyOffshore);
        }
        company.offshore = Some(entity_id);
        info!(company = %company.name, "attached to offshore entity");
        Ok(())
    }

    /// Remove a company from the offshore entity it is registered with.
    pub fn detach_offshore(
        &mut self,
        entity_id: OffshoreId,
        company_id: CompanyId,
    ) -> Result<(), OpError> {
        self.entity_exists(entity_id)?;
        let idx = self.company_index(company_id)?;
        let company = &mut self.companies[idx];
        if company.offshore != Some(entity_id) {
            return Err(OpError::NotMember);
        }
        company.offshore = None;
        info!(company = %company.name, "detached from offshore entity");
        Ok(())
    }

    /// Advance one month: settle every company's taxed profit into the cash
    /// balance, then bump the month counter. Infallible; the balance may go
    /// negative.
    pub fn advance_month(&mut self) {
        self.cash_balance = sim_econ::settle_month(
            self.cash_balance,
            &self.companies,
            &self.offshore_entities,
            self.difficulty,
        );
        self.months_passed += 1;
        info!(
            months_passed = self.months_passed,
            cash_balance = self.cash_balance,
            "month settled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn catalog() -> Catalog {
        Catalog {
            business_types: vec![BusinessType {
                name: "Dropshipping".to_string(),
                startup_capital: 500.0,
                // Halved by the session rebalance to 1.0 / 0.1.
                revenue: 2.0,
                profit_margin: 0.2,
            }],
            management: vec![
                ManagerProfile {
                    name: "Dana Reyes".to_string(),
                    salary: 40.0,
                    revenue_boost: 0.2,
                    profit_margin_boost: 0.05,
                },
                ManagerProfile {
                    name: "Viktor Eriksson".to_string(),
                    salary: 200.0,
                    revenue_boost: 0.5,
                    profit_margin_boost: 0.12,
                },
            ],
            offshore_locations: vec![OffshoreLocation {
                name: "Cayman Islands".to_string(),
                setup_cost: 1500.0,
                tax_rate: 0.05,
            }],
        }
    }

    fn session() -> Session {
        Session::new("Avery".to_string(), Difficulty::Rare, catalog())
    }

    #[test]
    fn rebalance_halves_cash_and_baselines() {
        let s = session();
        assert_eq!(s.cash_balance(), 5000.0);
        let b = &s.catalog().business_types[0];
        assert_eq!(b.revenue, 1.0);
        assert!((b.profit_margin - 0.1).abs() < 1e-12);
    }

    #[test]
    fn create_company_debits_exactly() {
        let mut s = session();
        let before = s.cash_balance();
        let id = s
            .create_company(0, "Acme".to_string(), 1000.0)
            .unwrap();
        assert_eq!(s.cash_balance(), before - 1000.0);
        let c = s.company(id).unwrap();
        assert_eq!(c.capital, 1000.0);
        assert_eq!(c.industry, "Dropshipping");
        assert_eq!(c.offshore, None);
        assert!(c.products.is_empty());
        assert!(c.management.is_none());
    }

    #[test]
    fn create_company_rejects_capital_below_minimum() {
        let mut s = session();
        let err = s.create_company(0, "Acme".to_string(), 400.0).unwrap_err();
        assert_eq!(
            err,
            OpError::BelowStartupCapital {
                capital: 400.0,
                required: 500.0
            }
        );
        assert_eq!(s.cash_balance(), 5000.0);
        assert!(s.companies().is_empty());
    }

    #[test]
    fn create_company_rejects_insufficient_cash() {
        let mut s = session();
        s.cash_balance = 500.0;
        let err = s.create_company(0, "Acme".to_string(), 600.0).unwrap_err();
        assert_eq!(
            err,
            OpError::InsufficientCash {
                needed: 600.0,
                available: 500.0
            }
        );
        assert_eq!(s.cash_balance(), 500.0);
        assert!(s.companies().is_empty());
    }

    #[test]
    fn hire_rejects_unaffordable_salary() {
        let mut s = session();
        // profit = 1.0 * 1500 * 0.1 = 150 < 200 salary
        let id = s.create_company(0, "Acme".to_string(), 1500.0).unwrap();
        let before = s.company(id).unwrap().clone();
        let err = s.hire_manager(id, 1).unwrap_err();
        assert_eq!(
            err,
            OpError::SalaryUnaffordable {
                salary: 200.0,
                profit: 150.0
            }
        );
        assert_eq!(s.company(id).unwrap(), &before);
    }

    #[test]
    fn hire_rejects_second_manager() {
        let mut s = session();
        let id = s.create_company(0, "Acme".to_string(), 1000.0).unwrap();
        s.hire_manager(id, 0).unwrap();
        assert_eq!(s.hire_manager(id, 0), Err(OpError::AlreadyManaged));
    }

    #[test]
    fn fire_without_manager_fails() {
        let mut s = session();
        let id = s.create_company(0, "Acme".to_string(), 1000.0).unwrap();
        assert_eq!(s.fire_manager(id), Err(OpError::NotManaged));
    }

    #[test]
    fn hire_then_fire_restores_financials() {
        let mut s = session();
        let id = s.create_company(0, "Acme".to_string(), 1000.0).unwrap();
        let before = s.company(id).unwrap().clone();
        s.hire_manager(id, 0).unwrap();
        let hired = s.company(id).unwrap();
        assert!((hired.revenue - 1.2).abs() < 1e-12);
        assert!((hired.profit_margin - 0.15).abs() < 1e-12);
        let fired = s.fire_manager(id).unwrap();
        assert_eq!(fired.name, "Dana Reyes");
        let after = s.company(id).unwrap();
        assert!((after.revenue - before.revenue).abs() < 1e-9);
        assert!((after.profit_margin - before.profit_margin).abs() < 1e-9);
        assert!(after.management.is_none());
    }

    #[test]
    fn add_product_debits_and_applies_effect() {
        let mut s = session();
        let id = s.create_company(0, "Acme".to_string(), 1000.0).unwrap();
        let cash = s.cash_balance();
        let effect = s
            .add_product(id, "Widget".to_string(), 500.0)
            .unwrap();
        assert_eq!(s.cash_balance(), cash - 500.0);
        assert!((effect.added_revenue - 50.0).abs() < 1e-12);
        let c = s.company(id).unwrap();
        assert!((c.revenue - 51.0).abs() < 1e-12);
        assert_eq!(c.products.len(), 1);
        assert_eq!(c.products[0].name, "Widget");
        assert_eq!(c.products[0].investment, 500.0);
    }

    #[test]
    fn add_product_rejects_insufficient_cash() {
        let mut s = session();
        let id = s.create_company(0, "Acme".to_string(), 1000.0).unwrap();
        let before = s.company(id).unwrap().clone();
        let cash = s.cash_balance();
        let err = s
            .add_product(id, "Widget".to_string(), cash + 1.0)
            .unwrap_err();
        assert!(matches!(err, OpError::InsufficientCash { .. }));
        assert_eq!(s.cash_balance(), cash);
        assert_eq!(s.company(id).unwrap(), &before);
    }

    #[test]
    fn remove_product_keeps_revenue_and_margin() {
        let mut s = session();
        let id = s.create_company(0, "Acme".to_string(), 1000.0).unwrap();
        s.add_product(id, "Widget".to_string(), 500.0).unwrap();
        let before = s.company(id).unwrap().clone();
        let removed = s.remove_product(id, 0).unwrap();
        assert_eq!(removed.name, "Widget");
        let after = s.company(id).unwrap();
        assert_eq!(after.revenue, before.revenue);
        assert_eq!(after.profit_margin, before.profit_margin);
        assert!(after.products.is_empty());
        assert_eq!(s.remove_product(id, 0), Err(OpError::UnknownProduct));
    }

    #[test]
    fn create_offshore_debits_and_copies_tax_rate() {
        let mut s = session();
        let cash = s.cash_balance();
        let id = s.create_offshore(0, "Shell One".to_string()).unwrap();
        assert_eq!(s.cash_balance(), cash - 1500.0);
        let e = &s.offshore_entities()[0];
        assert_eq!(e.id, id);
        assert_eq!(e.location, "Cayman Islands");
        assert_eq!(e.tax_rate, 0.05);
    }

    #[test]
    fn offshore_membership_is_exclusive() {
        let mut s = session();
        let c = s.create_company(0, "Acme".to_string(), 500.0).unwrap();
        let e1 = s.create_offshore(0, "Shell One".to_string()).unwrap();
        let e2 = s.create_offshore(0, "Shell Two".to_string()).unwrap();
        s.attach_offshore(e1, c).unwrap();
        assert_eq!(s.attach_offshore(e2, c), Err(OpError::AlreadyOffshore));
        assert_eq!(s.detach_offshore(e2, c), Err(OpError::NotMember));
        assert_eq!(s.members_of(e1).len(), 1);
        assert!(s.members_of(e2).is_empty());
        s.detach_offshore(e1, c).unwrap();
        assert_eq!(s.company(c).unwrap().offshore, None);
        assert!(s.members_of(e1).is_empty());
    }

    #[test]
    fn advance_month_settles_and_counts() {
        let mut s = session();
        let id = s.create_company(0, "Acme".to_string(), 1000.0).unwrap();
        let cash = s.cash_balance();
        s.advance_month();
        // (1.0 * 1000 * 0.1 - 50) * 0.85 = 42.5
        assert!((s.cash_balance() - (cash + 42.5)).abs() < 1e-9);
        assert_eq!(s.months_passed(), 1);

        let e = s.create_offshore(0, "Shell One".to_string()).unwrap();
        s.attach_offshore(e, id).unwrap();
        let cash = s.cash_balance();
        s.advance_month();
        // (100 - 50) * 0.95 = 47.5
        assert!((s.cash_balance() - (cash + 47.5)).abs() < 1e-9);
        assert_eq!(s.months_passed(), 2);
    }

    #[test]
    fn advance_month_is_deterministic() {
        let mut a = session();
        a.create_company(0, "Acme".to_string(), 1000.0).unwrap();
        let mut b = a.clone();
        a.advance_month();
        b.advance_month();
        assert_eq!(a.cash_balance(), b.cash_balance());
        assert_eq!(a.months_passed(), b.months_passed());
    }

    proptest! {
        #[test]
        fn membership_stays_exclusive_under_random_ops(
            ops in proptest::collection::vec(
                (any::<bool>(), 0usize..3, 0usize..2), 0..40),
        ) {
            let mut s = session();
            let mut companies = Vec::new();
            for name in ["A", "B", "C"] {
                companies.push(
                    s.create_company(0, name.to_string(), 500.0).unwrap());
            }
            let entities = vec![
                s.create_offshore(0, "Shell One".to_string()).unwrap(),
                s.create_offshore(0, "Shell Two".to_string()).unwrap(),
            ];
            for (attach, c_pick, e_pick) in ops {
                let c = companies[c_pick];
                let e = entities[e_pick];
                // Individual ops may fail; the invariant must hold anyway.
                let _ = if attach {
                    s.attach_offshore(e, c)
                } else {
                    s.detach_offshore(e, c)
                };
            }
            for &c in &companies {
                let registered = s.company(c).unwrap().offshore;
                let listing: Vec<OffshoreId> = entities
                    .iter()
                    .copied()
                    .filter(|&e| s.members_of(e).iter().any(|m| m.id == c))
                    .collect();
                match registered {
                    Some(e) => prop_assert_eq!(listing, vec![e]),
                    None => prop_assert!(listing.is_empty()),
                }
            }
        }
    }
}
