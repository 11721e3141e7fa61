//! Monthly per-category sums, recomputed from the expenses of a window.

use std::collections::HashMap;

use crate::{Amount, Expense, LedgerError, MonthlySum, ResultLedger};

/// Group `expenses` by `(month, category)` and sum their amounts.
///
/// The order of the returned groups is unspecified. A group whose total does
/// not fit in an [`Amount`] fails the whole computation.
pub fn monthly_sums(expenses: &[Expense]) -> ResultLedger<Vec<MonthlySum>> {
    let mut groups: HashMap<(String, &str), Amount> = HashMap::new();
    for expense in expenses {
        let month = expense.month();
        let sum = groups
            .entry((month.clone(), expense.category.as_str()))
            .or_default();
        *sum = sum.checked_add(expense.amount).ok_or_else(|| {
            LedgerError::Validation(format!(
                "amount: sum of {} in {month} overflows",
                expense.category
            ))
        })?;
    }

    Ok(groups
        .into_iter()
        .map(|((month, category), sum)| MonthlySum {
            month,
            category: category.to_string(),
            sum,
        })
        .collect())
}
