use console::style;

use darta::dashboard::{BenchmarkPair, DashboardData};

/// Render the business overview fixture as styled terminal output.
pub fn render(data: &DashboardData) {
    println!("{}", style("My Business").bold());
    println!("{}", style("Today's Overview").dim());
    println!();

    println!(
        "  {}  {}",
        style("Sales    ").green(),
        format_ugx(data.daily_sales)
    );
    println!(
        "  {}  {}",
        style("Expenses ").red(),
        format_ugx(data.daily_expenses)
    );
    println!(
        "  {}  {}",
        style("Net      ").bold(),
        style(format_ugx(data.net_income)).bold()
    );
    println!();

    println!("{}", style("DARTA INSIGHTS").bold());
    for alert in &data.alerts {
        let marker = if alert.contains("Alert") {
            style("!").red().bold()
        } else {
            style("*").cyan()
        };
        println!("  {} {}", marker, alert);
    }
    println!();

    println!("{}", style("SECTOR BENCHMARKS").bold());
    benchmark_row("Gross margin (%)", &data.benchmarks.gross_margin);
    benchmark_row("Restocks / week", &data.benchmarks.restock_frequency);
    println!();

    println!("{}", style("WEEKLY TRENDS").bold());
    for point in &data.sales_trend {
        println!(
            "  {}  {} {}",
            point.name,
            bar(point.sales, 50_000),
            style(format_ugx(point.sales)).dim()
        );
    }
    println!();

    println!("{}", style("FAST MOVING ITEMS").bold());
    for product in &data.top_products {
        println!("  {:<12} {}", product.name, bar(product.value, 5));
    }
}

fn benchmark_row(label: &str, pair: &BenchmarkPair) {
    println!("  {}", label);
    println!(
        "    {}  {} {}",
        style("you   ").cyan(),
        bar(pair.you, 1),
        pair.you
    );
    println!(
        "    {}  {} {}",
        style("sector").dim(),
        bar(pair.sector, 1),
        pair.sector
    );
}

fn bar(value: i64, unit: i64) -> String {
    let unit = unit.max(1);
    let width = ((value + unit - 1) / unit).max(1) as usize;
    "▇".repeat(width.min(60))
}

fn format_ugx(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::new();
    for (index, digit) in digits.chars().rev().enumerate() {
        if index > 0 && index % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let grouped: String = grouped.chars().rev().collect();
    if value < 0 {
        format!("UGX -{}", grouped)
    } else {
        format!("UGX {}", grouped)
    }
}
