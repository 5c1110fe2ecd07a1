//! Text rendering. The only module that writes to the terminal.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use vunjabei_client::{DashboardStats, ErrorKind, Listing, Loadable, OrderBook};
use vunjabei_core::{Category, Order, OrderStatus, Product, Session};

use crate::commands::CliError;

/// Loading line shown while a fetch is in flight.
pub fn loading<T>(what: &str, state: &Loadable<T>) {
    if state.is_loading() {
        progress(&format!("Loading {what}..."));
    }
}

/// Transient status line, kept off standard output.
pub fn progress(text: &str) {
    eprintln!("{text}");
}

pub fn message(text: &str) {
    println!("{text}");
}

pub fn failure(err: &CliError) {
    match err {
        CliError::Client(client) => {
            let label = match client.kind() {
                ErrorKind::Transport => "Service unavailable",
                ErrorKind::Auth => "Not allowed",
                ErrorKind::Validation => "Rejected",
                ErrorKind::NotFound => "Not found",
                ErrorKind::Internal => "Error",
            };
            eprintln!("{label}: {}", client.user_message());
            if let Some(fields) = client.field_errors() {
                for (field, messages) in fields {
                    eprintln!("  {field}: {}", messages.join(" "));
                }
            }
        }
        other => eprintln!("Error: {other}"),
    }
}

pub fn session(session: Option<&Session>) {
    match session {
        Some(s) => println!("{} ({})", s.username, s.role),
        None => println!("Not signed in."),
    }
}

pub fn products(listing: &Listing<Product>) {
    if listing.is_empty() {
        println!("No products found.");
        return;
    }
    println!("{:>5}  {:<28} {:<14} {:>16} {:>6}", "ID", "NAME", "CATEGORY", "PRICE", "STOCK");
    for p in listing {
        let stock = if p.in_stock() {
            p.quantity.to_string()
        } else {
            "sold out".to_string()
        };
        println!(
            "{:>5}  {:<28} {:<14} {:>16} {:>6}",
            p.id,
            truncate(&p.name, 28),
            truncate(p.category_label(), 14),
            p.price.display(),
            stock
        );
    }
    println!("{} of {} products", listing.len(), listing.total());
}

pub fn product(p: &Product) {
    println!("{} (#{})", p.name, p.id);
    println!("  Category: {}", p.category_label());
    println!("  Price:    {}", p.price.display());
    if p.in_stock() {
        println!("  In stock: {}", p.quantity);
    } else {
        println!("  Sold out");
    }
    if let Some(image) = &p.image {
        println!("  Image:    {image}");
    }
}

pub fn categories(listing: &Listing<Category>) {
    if listing.is_empty() {
        println!("No categories.");
        return;
    }
    for c in listing {
        println!("{:>5}  {}", c.id, c.name);
    }
}

pub fn orders(book: &OrderBook, filter: Option<OrderStatus>) {
    let shown: Vec<&Order> = book
        .orders()
        .iter()
        .filter(|o| filter.is_none_or(|status| o.status == status))
        .collect();
    if shown.is_empty() {
        println!("No orders found.");
        return;
    }
    for o in shown {
        println!(
            "#{:<5} {}  {:<24} x{:<3} {:>16}  {:<10}{}",
            o.id,
            o.date.format("%Y-%m-%d %H:%M"),
            truncate(&o.product_name, 24),
            o.quantity,
            o.total_price.display(),
            o.status,
            o.customer
                .as_deref()
                .map(|c| format!("  by {c}"))
                .unwrap_or_default()
        );
        if let (Some(phone), Some(address)) = (&o.phone, &o.address) {
            println!("        {phone}, {address}");
        }
    }
    let counts: Vec<String> = book
        .status_counts()
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(status, n)| format!("{status}: {n}"))
        .collect();
    println!("{}", counts.join("  "));
}

pub fn dashboard(stats: &DashboardStats) {
    println!("Dashboard Overview");
    println!("  All products:  {}", stats.products);
    println!("  Low stock:     {}", stats.low_stock);
    println!("  Total sales:   {}", stats.sales);
    println!("  Customers:     {}", stats.customers);
    println!("  Revenue:       {}", stats.revenue.display());
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}
