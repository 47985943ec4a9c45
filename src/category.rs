// 🥧 Category Aggregator - percentage breakdown for the pie chart
//
// Groups keep the order in which each category first appears in the input.
// Percentages are rounded independently and may not add up to exactly 100.

use crate::ratio::percent_of;
use crate::records::Ledger;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub amount: f64,
    pub percentage: i64,
}

/// Sum per category, first-seen order
pub fn category_totals<R: Ledger>(records: &[R]) -> Vec<(String, f64)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(String, f64)> = Vec::new();

    for record in records {
        let category = record.category();
        match index.get(category) {
            Some(&i) => totals[i].1 += record.amount(),
            None => {
                index.insert(category, totals.len());
                totals.push((category.to_string(), record.amount()));
            }
        }
    }

    totals
}

/// Breakdown of `records` by category; empty when the grand total is zero
pub fn aggregate_by_category<R: Ledger>(records: &[R]) -> Vec<CategoryShare> {
    let totals = category_totals(records);
    let total: f64 = totals.iter().map(|(_, amount)| amount).sum();

    if total == 0.0 {
        return Vec::new();
    }

    totals
        .into_iter()
        .map(|(category, amount)| CategoryShare {
            percentage: percent_of(amount, total),
            category,
            amount,
        })
        .collect()
}

/// Largest share first; ties keep first-seen order
pub fn sorted_by_amount(mut shares: Vec<CategoryShare>) -> Vec<CategoryShare> {
    shares.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    shares
}

// ============================================================================
// TESTS
// ============================================================================
