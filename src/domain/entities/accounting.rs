use serde::{Deserialize, Serialize};

use crate::domain::entities::edit::FormRules;
use crate::domain::entities::record::{CellFormat, Collection, Column, FieldValue, Record, RecordId};

pub const ACCOUNT_TYPES: &[&str] = &[
    "Revenue",
    "Expense",
    "Asset",
    "Liability",
    "Equity",
    "Bank",
    "Credit Card",
    "Cost of Good Sold",
];

/// Account types whose rows also show a reconciled bank balance.
pub const BANK_ACCOUNT_TYPES: &[&str] = &["Bank", "Credit Card"];

pub const BALANCE_UNAVAILABLE: &str = "N/A";
pub const BALANCE_NOT_APPLICABLE: &str = "-";

/// Chart-of-accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: i64,
    pub account_number: String,
    pub account_name: String,
    pub account_type: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub centre: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_balance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_balance: Option<String>,
}

impl Account {
    pub fn is_bank_type(&self) -> bool {
        BANK_ACCOUNT_TYPES.contains(&self.account_type.as_str())
    }

    /// Numeric value of the account number, for dropdown ordering.
    pub fn numeric_number(&self) -> Option<f64> {
        self.account_number.trim().parse::<f64>().ok()
    }
}

impl Record for Account {
    fn id(&self) -> RecordId {
        RecordId::Int(self.account_id)
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "account_id" | "id" => FieldValue::from(self.account_id),
            "account_number" => FieldValue::text(&self.account_number),
            "account_name" => FieldValue::text(&self.account_name),
            "account_type" => FieldValue::text(&self.account_type),
            "is_active" => FieldValue::Bool(self.is_active),
            "centre" => FieldValue::optional_number(self.centre),
            "app_balance" => FieldValue::decimal(self.app_balance.as_deref()),
            "bank_balance" => FieldValue::decimal(self.bank_balance.as_deref()),
            _ => FieldValue::Null,
        }
    }
}

const ACCOUNT_COLUMNS: &[Column] = &[
    Column::new("account_number", "Account Number"),
    Column::new("account_name", "Account Name"),
    Column::new("account_type", "Type"),
    Column::new("is_active", "Status").with_format(CellFormat::ActiveFlag),
    Column::new("app_balance", "App Balance")
        .with_format(CellFormat::DashIfEmpty)
        .unsortable(),
    Column::new("bank_balance", "Bank Balance")
        .with_format(CellFormat::DashIfEmpty)
        .unsortable(),
];

impl Collection for Account {
    const ENDPOINT: &'static str = "api/coa/";
    const LABEL: &'static str = "COA";
    const CENTRE_SCOPED: bool = true;

    fn columns() -> &'static [Column] {
        ACCOUNT_COLUMNS
    }

    fn form_rules() -> FormRules {
        FormRules::default()
            .require("account_number")
            .require("account_name")
            .require("account_type")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account: i64,
    #[serde(default)]
    pub app_balance: Option<String>,
    #[serde(default)]
    pub bank_balance: Option<String>,
}

impl Record for AccountBalance {
    fn id(&self) -> RecordId {
        RecordId::Int(self.account)
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "account" | "id" => FieldValue::from(self.account),
            "app_balance" => FieldValue::decimal(self.app_balance.as_deref()),
            "bank_balance" => FieldValue::decimal(self.bank_balance.as_deref()),
            _ => FieldValue::Null,
        }
    }
}

const BALANCE_COLUMNS: &[Column] = &[
    Column::new("account", "Account"),
    Column::new("app_balance", "App Balance").with_format(CellFormat::DashIfEmpty),
    Column::new("bank_balance", "Bank Balance").with_format(CellFormat::DashIfEmpty),
];

impl Collection for AccountBalance {
    const ENDPOINT: &'static str = "api/account_balances/";
    const LABEL: &'static str = "Balances";
    const CENTRE_SCOPED: bool = true;

    fn columns() -> &'static [Column] {
        BALANCE_COLUMNS
    }
}

/// Chart-of-accounts rows joined with balances by account id.
///
/// Bank and credit card accounts show their bank balance, every other type shows `-`.
pub fn merge_account_balances(accounts: Vec<Account>, balances: &[AccountBalance]) -> Vec<Account> {
    accounts
        .into_iter()
        .map(|mut account| {
            let balance = balances
                .iter()
                .find(|balance| balance.account == account.account_id);
            account.app_balance = Some(
                balance
                    .and_then(|balance| balance.app_balance.clone())
                    .unwrap_or_else(|| BALANCE_UNAVAILABLE.to_string()),
            );
            account.bank_balance = Some(if account.is_bank_type() {
                balance
                    .and_then(|balance| balance.bank_balance.clone())
                    .unwrap_or_else(|| BALANCE_UNAVAILABLE.to_string())
            } else {
                BALANCE_NOT_APPLICABLE.to_string()
            });
            account
        })
        .collect()
}

/// One line of an account's general ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub line_id: i64,
    /// Backend label of the form `"<entry> on <date>"`.
    pub journal_entry: String,
    #[serde(default)]
    pub journal_id: Option<i64>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub debit: Option<String>,
    #[serde(default)]
    pub credit: Option<String>,
    pub running_balance: String,
}

impl LedgerLine {
    pub fn entry_label(&self) -> &str {
        match self.journal_entry.split_once(" on ") {
            Some((label, _)) => label,
            None => &self.journal_entry,
        }
    }

    pub fn entry_date(&self) -> &str {
        match self.journal_entry.split_once(" on ") {
            Some((_, date)) => date,
            None => "",
        }
    }
}

impl Record for LedgerLine {
    fn id(&self) -> RecordId {
        RecordId::Int(self.line_id)
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "line_id" | "id" => FieldValue::from(self.line_id),
            "date" => FieldValue::text(self.entry_date()),
            "entry" => FieldValue::text(self.entry_label()),
            "journal_entry" => FieldValue::text(&self.journal_entry),
            "journal_id" => FieldValue::optional_number(self.journal_id),
            "memo" => FieldValue::optional_text(self.memo.as_deref()),
            "debit" => FieldValue::decimal(self.debit.as_deref()),
            "credit" => FieldValue::decimal(self.credit.as_deref()),
            "running_balance" => FieldValue::decimal(Some(self.running_balance.as_str())),
            _ => FieldValue::Null,
        }
    }
}

const LEDGER_COLUMNS: &[Column] = &[
    Column::new("date", "Date"),
    Column::new("entry", "Entry"),
    Column::new("memo", "Memo").with_format(CellFormat::DashIfEmpty),
    Column::new("debit", "Debit").with_format(CellFormat::DashIfEmpty),
    Column::new("credit", "Credit").with_format(CellFormat::DashIfEmpty),
    Column::new("running_balance", "Balance"),
];

impl Collection for LedgerLine {
    const ENDPOINT: &'static str = "api/ledger/account/";
    const LABEL: &'static str = "General_Ledger";

    fn columns() -> &'static [Column] {
        LEDGER_COLUMNS
    }
}

/// Parameters of an account ledger request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerQuery {
    pub account_id: i64,
    pub centre_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl LedgerQuery {
    pub fn path(&self) -> String {
        format!("{}{}/", LedgerLine::ENDPOINT, self.account_id)
    }

    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(centre_id) = self.centre_id {
            params.push(("journal_entry__centre".to_string(), centre_id.to_string()));
        }
        if let Some(start) = self.start_date.as_ref().filter(|s| !s.is_empty()) {
            params.push(("start_date".to_string(), start.clone()));
        }
        if let Some(end) = self.end_date.as_ref().filter(|s| !s.is_empty()) {
            params.push(("end_date".to_string(), end.clone()));
        }
        params
    }

    pub fn range_label(&self) -> Option<String> {
        match (self.start_date.as_deref(), self.end_date.as_deref()) {
            (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
                Some(format!("As of: {start} - {end}"))
            }
            _ => None,
        }
    }

    pub fn export_filename(&self) -> String {
        let start = self.start_date.as_deref().filter(|s| !s.is_empty()).unwrap_or("all");
        let end = self.end_date.as_deref().filter(|s| !s.is_empty()).unwrap_or("all");
        format!("general_ledger_{start}_{end}.pdf")
    }
}
