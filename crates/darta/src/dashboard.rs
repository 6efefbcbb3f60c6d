use serde::{Deserialize, Serialize};

/// One day on the weekly sales/expenses trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub name: String,
    pub sales: i64,
    pub expenses: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductShare {
    pub name: String,
    pub value: i64,
}

/// Own value vs anonymised sector average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkPair {
    pub you: i64,
    pub sector: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Benchmarks {
    pub gross_margin: BenchmarkPair,
    /// Restocks per week.
    pub restock_frequency: BenchmarkPair,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub daily_sales: i64,
    pub daily_expenses: i64,
    pub net_income: i64,
    pub sales_trend: Vec<TrendPoint>,
    pub top_products: Vec<ProductShare>,
    pub alerts: Vec<String>,
    pub benchmarks: Benchmarks,
}

/// The dashboard is a static fixture, not computed analytics. Figures are in
/// UGX.
pub fn mock_dashboard() -> DashboardData {
    DashboardData {
        daily_sales: 450_000,
        daily_expenses: 120_000,
        net_income: 330_000,
        sales_trend: vec![
            trend("Mon", 300_000, 100_000),
            trend("Tue", 450_000, 120_000),
            trend("Wed", 280_000, 80_000),
            trend("Thu", 500_000, 200_000),
            trend("Fri", 550_000, 150_000),
            trend("Sat", 600_000, 180_000),
            trend("Sun", 400_000, 90_000),
        ],
        top_products: vec![
            product("Sugar (1kg)", 45),
            product("Cooking Oil", 30),
            product("Soap Bar", 25),
            product("Airtime", 15),
        ],
        alerts: vec![
            "Remote Alert: Staff reported 7kg Sugar remaining, expected 12kg.".to_string(),
            "Benchmark: Your gross margin is 10% lower than similar shops in Kisaasi.".to_string(),
            "Insight: Sales peak at 7pm. Consider extending hours on Fridays.".to_string(),
        ],
        benchmarks: Benchmarks {
            gross_margin: BenchmarkPair { you: 18, sector: 28 },
            restock_frequency: BenchmarkPair { you: 2, sector: 4 },
        },
    }
}

fn trend(name: &str, sales: i64, expenses: i64) -> TrendPoint {
    TrendPoint {
        name: name.to_string(),
        sales,
        expenses,
    }
}

fn product(name: &str, value: i64) -> ProductShare {
    ProductShare {
        name: name.to_string(),
        value,
    }
}
