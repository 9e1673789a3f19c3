use criterion::{criterion_group, criterion_main, Criterion};
use sim_core::{BusinessType, Catalog, Difficulty, ManagerProfile, OffshoreLocation};
use sim_runtime::Session;

fn populated_session() -> Session {
    let catalog = Catalog {
        business_types: vec![BusinessType {
            name: "Dropshipping".into(),
            startup_capital: 200.0,
            revenue: 2.0,
            profit_margin: 0.2,
        }],
        management: vec![ManagerProfile {
            name: "Dana Reyes".into(),
            salary: 10.0,
            revenue_boost: 0.2,
            profit_margin_boost: 0.05,
        }],
        offshore_locations: vec![OffshoreLocation {
            name: "Cayman Islands".into(),
            setup_cost: 500.0,
            tax_rate: 0.05,
        }],
    };
    let mut session = Session::new("Bench".into(), Difficulty::Rare, catalog);
    let entity = session.create_offshore(0, "Shell".into()).unwrap();
    for i in 0..16 {
        let id = session
            .create_company(0, format!("C{i}"), 200.0)
            .unwrap();
        if i % 2 == 0 {
            session.attach_offshore(entity, id).unwrap();
        }
        if i % 4 == 0 {
            session.hire_manager(id, 0).unwrap();
        }
    }
    session
}

fn bench_settlement(c: &mut Criterion) {
    let mut session = populated_session();
    c.bench_function("advance_month 16 companies", |b| {
        b.iter(|| {
            session.advance_month();
        })
    });
}

criterion_group!(benches, bench_settlement);
criterion_main!(benches);
