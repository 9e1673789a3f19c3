#![deny(warnings)]

//! Interactive menu shell for the Business Tycoon simulation.
//!
//! The shell renders the per-turn menu, validates numeric input with an
//! indefinite re-prompt loop, and drives the session operations. Every
//! recoverable operation failure is printed and the turn loop continues;
//! only a missing or malformed catalog is fatal.

use anyhow::{Context, Result};
use sim_core::{Catalog, CompanyId, Difficulty, OffshoreId};
use sim_runtime::Session;
use std::io::{self, Write};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

fn parse_args() -> Option<String> {
    let mut data_dir: Option<String> = None;
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--data-dir" => data_dir = it.next(),
            _ => {}
        }
    }
    data_dir
}

/// Read one trimmed line. A closed input stream ends the session the same
/// way menu option 11 does.
fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush().context("flushing stdout")?;
    let mut line = String::new();
    let n = io::stdin().read_line(&mut line).context("reading stdin")?;
    if n == 0 {
        println!("\nThank you for playing Business Tycoon! Goodbye.");
        std::process::exit(0);
    }
    Ok(line.trim().to_string())
}

/// Prompt until the player enters an integer within [min, max].
fn prompt_choice(min: usize, max: usize, prompt: &str) -> Result<usize> {
    loop {
        let line = read_line(prompt)?;
        match line.parse::<usize>() {
            Ok(n) if (min..=max).contains(&n) => return Ok(n),
            Ok(_) => println!("Please enter a number between {min} and {max}."),
            Err(_) => println!("Invalid input. Please try again."),
        }
    }
}

/// Prompt until the player enters a non-negative dollar amount.
fn prompt_amount(prompt: &str) -> Result<f64> {
    loop {
        let line = read_line(prompt)?;
        match line.parse::<f64>() {
            Ok(n) if n.is_finite() && n >= 0.0 => return Ok(n),
            _ => println!("Please enter a non-negative amount."),
        }
    }
}

/// Prompt until the player enters a non-empty name.
fn prompt_text(prompt: &str) -> Result<String> {
    loop {
        let line = read_line(prompt)?;
        if !line.is_empty() {
            return Ok(line);
        }
        println!("Please enter a name.");
    }
}

fn display_intro() {
    println!(
        "Business Tycoon {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_SHA")
    );
    println!("Welcome to the Business Tycoon game!");
    println!("In this game, you will start and manage various companies, set up offshore entities, and hire management.");
    println!("Your goal is to become the ultimate business tycoon!");
}

fn choose_difficulty() -> Result<Difficulty> {
    for (i, d) in Difficulty::ALL.iter().enumerate() {
        println!("{}. {}", i + 1, d.label());
    }
    let choice = prompt_choice(
        1,
        Difficulty::ALL.len(),
        "Enter the number corresponding to your choice: ",
    )?;
    Ok(Difficulty::ALL[choice - 1])
}

fn display_player_info(session: &Session) {
    println!("\nMonths passed: {}", session.months_passed());
    println!("\nPlayer Information:");
    println!("Name: {}", session.player());
    println!("Cash Balance: ${:.2}", session.cash_balance());
    println!("Companies:");
    if session.companies().is_empty() {
        println!("None");
    } else {
        let multiplier = session.difficulty().multiplier();
        for (i, company) in session.companies().iter().enumerate() {
            let manager = company
                .management
                .as_ref()
                .map(|m| m.name.as_str())
                .unwrap_or("None");
            println!(
                "{}. {} ({}) - Management: {}, Monthly Revenue: ${:.2}, Monthly Profit: ${:.2}",
                i + 1,
                company.name,
                company.industry,
                manager,
                sim_econ::monthly_revenue(company),
                sim_econ::monthly_profit(company) * multiplier,
            );
        }
    }
    println!("Offshore Entities:");
    if session.offshore_entities().is_empty() {
        println!("None");
    } else {
        for (i, entity) in session.offshore_entities().iter().enumerate() {
            let members: Vec<&str> = session
                .members_of(entity.id)
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            let members = if members.is_empty() {
                "None".to_string()
            } else {
                members.join(", ")
            };
            println!(
                "{}. {} ({}) - Members: {}",
                i + 1,
                entity.name,
                entity.location,
                members
            );
        }
    }
}

fn display_companies_list(session: &Session) {
    println!("Companies:");
    for (i, company) in session.companies().iter().enumerate() {
        println!("{}. {} ({})", i + 1, company.name, company.industry);
    }
}

/// Pick a company from the numbered list. Returns None (with a hint) when
/// the player owns no companies yet.
fn choose_company(session: &Session, prompt: &str) -> Result<Option<CompanyId>> {
    if session.companies().is_empty() {
        return Ok(None);
    }
    display_companies_list(session);
    let choice = prompt_choice(1, session.companies().len(), prompt)?;
    Ok(Some(session.companies()[choice - 1].id))
}

fn choose_entity(session: &Session, prompt: &str) -> Result<Option<OffshoreId>> {
    if session.offshore_entities().is_empty() {
        return Ok(None);
    }
    println!("Offshore Entities:");
    for (i, entity) in session.offshore_entities().iter().enumerate() {
        println!("{}. {} ({})", i + 1, entity.name, entity.location);
    }
    let choice = prompt_choice(1, session.offshore_entities().len(), prompt)?;
    Ok(Some(session.offshore_entities()[choice - 1].id))
}

fn start_business(session: &mut Session) -> Result<()> {
    println!("Available business types:");
    for (i, business) in session.catalog().business_types.iter().enumerate() {
        println!(
            "{}. {} (Startup Capital: ${:.2})",
            i + 1,
            business.name,
            business.startup_capital
        );
    }
    let choice = prompt_choice(
        1,
        session.catalog().business_types.len(),
        "Choose a business type by entering the corresponding number: ",
    )?;
    let name = prompt_text("Enter a name for your new company: ")?;
    let capital = prompt_amount("Enter the initial capital for your company (in dollars): ")?;
    match session.create_company(choice - 1, name.clone(), capital) {
        Ok(_) => println!("{name} is open for business."),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn hire_management(session: &mut Session) -> Result<()> {
    let Some(id) = choose_company(
        session,
        "Enter the number of the company you want to hire management for: ",
    )?
    else {
        println!("You don't have any companies to hire management for. Create a company first.");
        return Ok(());
    };
    if let Some(company) = session.company(id) {
        if let Some(manager) = &company.management {
            println!(
                "{} already has a manager: {}. Please fire the current manager before hiring a new one.",
                company.name, manager.name
            );
            return Ok(());
        }
    }
    println!("Available managers:");
    for (i, manager) in session.catalog().management.iter().enumerate() {
        println!(
            "{}. {} (Salary: ${:.2}/month, Revenue Boost: {}%, Profit Margin Boost: {}%)",
            i + 1,
            manager.name,
            manager.salary,
            manager.revenue_boost * 100.0,
            manager.profit_margin_boost * 100.0
        );
    }
    let choice = prompt_choice(
        1,
        session.catalog().management.len(),
        "Choose a manager to hire by entering the corresponding number: ",
    )?;
    match session.hire_manager(id, choice - 1) {
        Ok(()) => {
            let manager = session.company(id).and_then(|c| c.management.as_ref());
            if let Some(manager) = manager {
                println!(
                    "{} has been hired as a manager at a salary of ${:.2}/month.",
                    manager.name, manager.salary
                );
            }
        }
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn fire_management(session: &mut Session) -> Result<()> {
    let Some(id) = choose_company(
        session,
        "Enter the number of the company you want to fire management for: ",
    )?
    else {
        println!("You don't have any companies to fire management for. Create a company first.");
        return Ok(());
    };
    match session.fire_manager(id) {
        Ok(manager) => println!("{} has been fired.", manager.name),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn create_offshore(session: &mut Session) -> Result<()> {
    println!("Offshore locations:");
    for (i, location) in session.catalog().offshore_locations.iter().enumerate() {
        println!(
            "{}. {} (Setup Cost: ${:.2}, Tax Rate: {}%)",
            i + 1,
            location.name,
            location.setup_cost,
            location.tax_rate * 100.0
        );
    }
    let choice = prompt_choice(
        1,
        session.catalog().offshore_locations.len(),
        "Choose an offshore location by entering the corresponding number: ",
    )?;
    let name = prompt_text("Enter a name for your new offshore entity: ")?;
    match session.create_offshore(choice - 1, name.clone()) {
        Ok(_) => println!("{name} has been registered."),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn attach_company(session: &mut Session) -> Result<()> {
    if session.offshore_entities().is_empty() || session.companies().is_empty() {
        println!("You don't have any offshore entities or companies. Create them first.");
        return Ok(());
    }
    let Some(entity) = choose_entity(
        session,
        "Enter the number of the offshore entity you want to add a company to: ",
    )?
    else {
        return Ok(());
    };
    let Some(company) = choose_company(
        session,
        "Enter the number of the company you want to add to the offshore entity: ",
    )?
    else {
        return Ok(());
    };
    match session.attach_offshore(entity, company) {
        Ok(()) => println!("The company has been added to the offshore entity."),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn detach_company(session: &mut Session) -> Result<()> {
    if session.offshore_entities().is_empty() || session.companies().is_empty() {
        println!("You don't have any offshore entities or companies. Create them first.");
        return Ok(());
    }
    let Some(entity) = choose_entity(
        session,
        "Enter the number of the offshore entity you want to remove a company from: ",
    )?
    else {
        return Ok(());
    };
    let members = session.members_of(entity);
    if members.is_empty() {
        println!("This offshore entity has no member companies.");
        return Ok(());
    }
    println!("Companies in the offshore entity:");
    for (i, company) in members.iter().enumerate() {
        println!("{}. {} ({})", i + 1, company.name, company.industry);
    }
    let choice = prompt_choice(
        1,
        members.len(),
        "Enter the number of the company you want to remove from the offshore entity: ",
    )?;
    let company = members[choice - 1].id;
    match session.detach_offshore(entity, company) {
        Ok(()) => println!("The company has been removed from the offshore entity."),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn view_products(session: &Session) -> Result<()> {
    let Some(id) = choose_company(
        session,
        "Enter the number of the company you want to view Product(s) for: ",
    )?
    else {
        println!("You don't have any companies to view Product(s) for. Create a company first.");
        return Ok(());
    };
    let Some(company) = session.company(id) else {
        return Ok(());
    };
    if company.products.is_empty() {
        println!("{} has no Product(s).", company.name);
    } else {
        println!("\nProduct(s):");
        for (i, product) in company.products.iter().enumerate() {
            println!(
                "{}. {} - Investment: ${:.2}",
                i + 1,
                product.name,
                product.investment
            );
        }
    }
    Ok(())
}

fn add_product(session: &mut Session) -> Result<()> {
    let Some(id) = choose_company(
        session,
        "Enter the number of the company you want to add a product to: ",
    )?
    else {
        println!("You don't have any companies to add a Product(s) to. Create a company first.");
        return Ok(());
    };
    let name = prompt_text("Enter a name for your new product: ")?;
    let investment =
        prompt_amount("Enter the amount of money you want to invest in this product: ")?;
    match session.add_product(id, name.clone(), investment) {
        Ok(effect) => {
            println!("You have successfully added {name} with an investment of ${investment:.2}.");
            println!(
                "Company's revenue increased by ${:.2} and profit increased by ${:.2}.",
                effect.added_revenue, effect.added_profit
            );
        }
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn remove_product(session: &mut Session) -> Result<()> {
    let Some(id) = choose_company(
        session,
        "Enter the number of the company you want to remove a Product(s) from: ",
    )?
    else {
        println!("You don't have any companies to remove a Product(s) from. Create a company first.");
        return Ok(());
    };
    let Some(company) = session.company(id) else {
        return Ok(());
    };
    if company.products.is_empty() {
        println!("{} has no Product(s) to remove.", company.name);
        return Ok(());
    }
    println!("Product(s):");
    for (i, product) in company.products.iter().enumerate() {
        println!(
            "{}. {} - Investment: ${:.2}",
            i + 1,
            product.name,
            product.investment
        );
    }
    let choice = prompt_choice(
        1,
        company.products.len(),
        "Enter the number of the Product(s) you want to remove: ",
    )?;
    match session.remove_product(id, choice - 1) {
        Ok(removed) => println!("{} has been removed.", removed.name),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn print_menu() {
    println!("\n1. Start a new business");
    println!("2. Hire management");
    println!("3. Fire management");
    println!("4. Create an offshore entity");
    println!("5. Add a company to an offshore entity");
    println!("6. Remove a company from an offshore entity");
    println!("7. Advance month");
    println!("8. View Product(s)");
    println!("9. Add a Product(s) to a company");
    println!("10. Remove a Product(s) from a company");
    println!("11. Quit game");
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let data_dir = parse_args()
        .or_else(|| std::env::var("TYCOON_DATA_DIR").ok())
        .unwrap_or_else(|| "assets/data".to_string());
    info!(%data_dir, "starting shell");
    let catalog =
        Catalog::load_dir(&data_dir).with_context(|| format!("loading catalog from {data_dir}"))?;

    display_intro();
    let player = prompt_text("Please enter your name: ")?;
    let difficulty = choose_difficulty()?;
    let mut session = Session::new(player, difficulty, catalog);

    loop {
        display_player_info(&session);
        print_menu();
        let choice = prompt_choice(1, 11, "Enter the number corresponding to your choice: ")?;
        match choice {
            1 => start_business(&mut session)?,
            2 => hire_management(&mut session)?,
            3 => fire_management(&mut session)?,
            4 => create_offshore(&mut session)?,
            5 => attach_company(&mut session)?,
            6 => detach_company(&mut session)?,
            7 => session.advance_month(),
            8 => view_products(&session)?,
            9 => add_product(&mut session)?,
            10 => remove_product(&mut session)?,
            11 => {
                println!("Thank you for playing Business Tycoon! Goodbye.");
                break;
            }
            _ => {}
        }
    }
    Ok(())
}
