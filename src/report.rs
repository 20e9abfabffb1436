// Report presets.
//
// Each reporter renders plain-text tables from a ledger; new reports
// implement the trait without touching the existing ones.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::account::AccountType;
use crate::budget::Budget;
use crate::ledger::Ledger;
use crate::table::{Table, TableColumn};

/// A report over a ledger and an optional budget.
pub trait Reporter: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn run(&self, ledger: &Ledger, budget: &Budget) -> String;
}

/// Look up a reporter by name.
pub fn reporter(name: &str) -> Option<Box<dyn Reporter>> {
    reporters().into_iter().find(|r| r.name() == name)
}

/// Every built-in reporter.
pub fn reporters() -> Vec<Box<dyn Reporter>> {
    vec![
        Box::new(BalanceReport),
        Box::new(ExpenseReport),
        Box::new(BudgetReport),
    ]
}

fn fmt_amount(amount: Decimal) -> String {
    amount.round_dp(2).normalize().to_string()
}

fn balance_cell(balances: &BTreeMap<String, Decimal>, negate: bool) -> String {
    balances
        .iter()
        .map(|(currency, balance)| {
            let balance = if negate { -*balance } else { *balance };
            format!("{}: {}", currency, fmt_amount(balance))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// BALANCE
// ============================================================================

/// Tally the balances of all accounts.
pub struct BalanceReport;

impl Reporter for BalanceReport {
    fn name(&self) -> &'static str {
        "balance"
    }

    fn description(&self) -> &'static str {
        "Total balance report."
    }

    fn run(&self, ledger: &Ledger, _budget: &Budget) -> String {
        let mut table = Table::new(vec![
            TableColumn::left("Account"),
            TableColumn::right("Balance"),
        ]);
        for (name, account) in ledger.accounts() {
            table.add_row(vec![name.clone(), balance_cell(&account.balances, false)]);
        }
        table.render() + "\n"
    }
}

// ============================================================================
// EXPENSE
// ============================================================================

/// Income, expenses, and total cash flow.
pub struct ExpenseReport;

impl Reporter for ExpenseReport {
    fn name(&self) -> &'static str {
        "expense"
    }

    fn description(&self) -> &'static str {
        "Income vs expenses with total cash flow."
    }

    fn run(&self, ledger: &Ledger, _budget: &Budget) -> String {
        let mut out = String::new();

        // income reads negated: money flowed out of the income source
        let mut income = Table::new(vec![
            TableColumn::left("Account"),
            TableColumn::right("Balance"),
        ]);
        for (name, account) in ledger.accounts() {
            if account.kind == AccountType::Income {
                income.add_row(vec![name.clone(), balance_cell(&account.balances, true)]);
            }
        }
        out.push_str("Income\n");
        out.push_str(&income.render());
        out.push_str("\n\n");

        let mut expenses = Table::new(vec![
            TableColumn::left("Account"),
            TableColumn::right("Balance"),
        ]);
        for (name, account) in ledger.accounts() {
            if account.kind == AccountType::Expense {
                expenses.add_row(vec![name.clone(), balance_cell(&account.balances, false)]);
            }
        }
        out.push_str("Expenses\n");
        out.push_str(&expenses.render());
        out.push_str("\n\n");

        let mut flow: BTreeMap<String, Decimal> = BTreeMap::new();
        for account in ledger.accounts().values() {
            if matches!(account.kind, AccountType::Expense | AccountType::Income) {
                for (currency, balance) in &account.balances {
                    *flow.entry(currency.clone()).or_default() -= *balance;
                }
            }
        }
        let mut cash = Table::new(vec![
            TableColumn::left("Currency"),
            TableColumn::right("Balance"),
        ]);
        for (currency, balance) in &flow {
            cash.add_row(vec![currency.clone(), fmt_amount(*balance)]);
        }
        out.push_str("Cash flow\n");
        out.push_str(&cash.render());
        out.push('\n');

        out
    }
}

// ============================================================================
// BUDGET
// ============================================================================

/// Expected balances next to what actually happened.
pub struct BudgetReport;

impl BudgetReport {
    /// Rows sorted by account, `.misc` buckets last after a spacer.
    fn sectioned(rows: Vec<(String, Decimal)>, headers: (&str, &str)) -> Table {
        let mut table = Table::new(vec![
            TableColumn::left(headers.0),
            TableColumn::right(headers.1),
        ]);

        let (misc, named): (Vec<_>, Vec<_>) =
            rows.into_iter().partition(|(name, _)| name.ends_with(".misc"));
        for (name, amount) in named {
            table.add_row(vec![name, fmt_amount(amount)]);
        }
        table.add_row(vec![String::new(), String::new()]);
        for (name, amount) in misc {
            table.add_row(vec![name, fmt_amount(amount)]);
        }
        table
    }
}

impl Reporter for BudgetReport {
    fn name(&self) -> &'static str {
        "budget"
    }

    fn description(&self) -> &'static str {
        "Budget vs the actual balances."
    }

    fn run(&self, ledger: &Ledger, budget: &Budget) -> String {
        // expected balances as budgeted
        let expected: Vec<(String, Decimal)> = budget
            .iter()
            .map(|(name, amount)| (name.to_string(), amount))
            .collect();

        // differences: budget plus what the primary-currency balance shows
        let mut deltas: BTreeMap<String, Decimal> = budget
            .iter()
            .map(|(name, amount)| (name.to_string(), amount))
            .collect();
        for (name, account) in ledger.accounts() {
            *deltas.entry(name.clone()).or_default() +=
                account.balance(ledger.primary_currency());
        }

        let exp = Self::sectioned(expected, ("Account", "Expected Balance"));
        let act = Self::sectioned(deltas.into_iter().collect(), ("Account", "Difference"));

        format!("{}\n\n{}\n", exp.render(), act.render())
    }
}

// ============================================================================
// TESTS
// ============================================================================
