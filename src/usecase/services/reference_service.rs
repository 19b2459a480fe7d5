use std::cmp::Ordering;

use tracing::warn;

use crate::domain::entities::accounting::{
    merge_account_balances, Account, AccountBalance, LedgerLine, LedgerQuery,
};
use crate::domain::entities::childcare::{Centre, Child, Classroom, Family};
use crate::domain::entities::record::{Collection, Record, RecordId};
use crate::domain::entities::scope::{CentreScope, FALLBACK_CENTRE_NAME};
use crate::domain::entities::view::Page;
use crate::usecase::ports::transport::{ApiError, Endpoint, HttpTransport};
use crate::usecase::services::query_service::ApiClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownOption {
    pub value: String,
    pub label: String,
}

impl DropdownOption {
    fn new(value: RecordId, label: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            label: label.into(),
        }
    }
}

pub fn child_options(children: &[Child]) -> Vec<DropdownOption> {
    children
        .iter()
        .map(|child| DropdownOption::new(child.id(), child.full_name()))
        .collect()
}

pub fn family_options(families: &[Family]) -> Vec<DropdownOption> {
    families
        .iter()
        .map(|family| DropdownOption::new(family.id(), family.parent_1_name.clone()))
        .collect()
}

pub fn classroom_options(classrooms: &[Classroom]) -> Vec<DropdownOption> {
    classrooms
        .iter()
        .map(|classroom| DropdownOption::new(classroom.id(), classroom.name.clone()))
        .collect()
}

/// `"<number> - <name>"` options ordered by numeric account number.
/// Non-numeric numbers sort after numeric ones, by text.
pub fn account_options(accounts: &[Account]) -> Vec<DropdownOption> {
    let mut sorted: Vec<&Account> = accounts.iter().collect();
    sorted.sort_by(|a, b| match (a.numeric_number(), b.numeric_number()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.account_number.cmp(&b.account_number),
    });
    sorted
        .into_iter()
        .map(|account| {
            DropdownOption::new(
                account.id(),
                format!("{} - {}", account.account_number, account.account_name),
            )
        })
        .collect()
}

pub fn active_children_of_family(children: &[Child], family_id: i64) -> Vec<Child> {
    children
        .iter()
        .filter(|child| child.family == Some(family_id) && child.is_active)
        .cloned()
        .collect()
}

/// Header lines printed above a ledger export.
pub fn ledger_header_lines(
    centre_name: &str,
    query: &LedgerQuery,
    generated_on: &str,
    prepared_by: &str,
) -> Vec<String> {
    let mut lines = vec![format!("Centre: {centre_name}")];
    if let Some(range) = query.range_label() {
        lines.push(range);
    }
    lines.push(format!("Generated on: {generated_on}"));
    lines.push(format!("Prepared by: {prepared_by}"));
    lines
}

/// Cross-collection lookups: dropdown sources, joined account rows, ledgers and
/// the centre name.
pub struct ReferenceService<T: HttpTransport> {
    client: ApiClient<T>,
    scope: CentreScope,
}

impl<T: HttpTransport> ReferenceService<T> {
    pub fn new(client: ApiClient<T>, scope: CentreScope) -> Self {
        Self { client, scope }
    }

    pub fn scope(&self) -> &CentreScope {
        &self.scope
    }

    async fn all<C: Collection>(&self) -> Result<Vec<C>, ApiError> {
        let endpoint = self.client.collection_endpoint::<C>(&self.scope);
        self.client.fetch_all(&endpoint).await
    }

    pub async fn children(&self) -> Result<Vec<Child>, ApiError> {
        self.all::<Child>().await
    }

    pub async fn child_options(&self) -> Result<Vec<DropdownOption>, ApiError> {
        Ok(child_options(&self.children().await?))
    }

    pub async fn family_options(&self) -> Result<Vec<DropdownOption>, ApiError> {
        Ok(family_options(&self.all::<Family>().await?))
    }

    pub async fn classroom_options(&self) -> Result<Vec<DropdownOption>, ApiError> {
        Ok(classroom_options(&self.all::<Classroom>().await?))
    }

    pub async fn account_options(&self) -> Result<Vec<DropdownOption>, ApiError> {
        Ok(account_options(&self.all::<Account>().await?))
    }

    pub async fn active_children_of_family(&self, family_id: i64) -> Result<Vec<Child>, ApiError> {
        Ok(active_children_of_family(&self.children().await?, family_id))
    }

    /// One page of the chart of accounts with balances joined in.
    pub async fn accounts_page(&self, page_number: u32) -> Result<Page<Account>, ApiError> {
        let endpoint = self.client.collection_endpoint::<Account>(&self.scope);
        let mut page = self.client.fetch_page::<Account>(&endpoint, page_number).await?;
        let balances = self.all::<AccountBalance>().await?;
        page.items = merge_account_balances(std::mem::take(&mut page.items), &balances);
        Ok(page)
    }

    pub async fn ledger(&self, query: &LedgerQuery) -> Result<Vec<LedgerLine>, ApiError> {
        let mut endpoint = Endpoint::new(query.path());
        endpoint.params = query.params();
        self.client.fetch_all(&endpoint).await
    }

    /// Display name of the selected centre. Never fails: lookup errors fall back
    /// to the configured name, and an unset centre to "Centre".
    pub async fn resolve_centre_name(&self) -> String {
        let fallback = if self.scope.name.trim().is_empty() {
            FALLBACK_CENTRE_NAME.to_string()
        } else {
            self.scope.name.clone()
        };
        let Some(centre_id) = self.scope.id else {
            return fallback;
        };

        let endpoint = Endpoint::new(Centre::ENDPOINT).item(centre_id);
        match self.client.fetch_one::<Centre>(&endpoint).await {
            Ok(centre) if !centre.name.trim().is_empty() => centre.name,
            Ok(_) => fallback,
            Err(err) => {
                warn!(centre_id, error = %err, "could not resolve centre name");
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: i64, number: &str, name: &str) -> Account {
        Account {
            account_id: id,
            account_number: number.to_string(),
            account_name: name.to_string(),
            account_type: "Expense".to_string(),
            is_active: true,
            centre: Some(1),
            app_balance: None,
            bank_balance: None,
        }
    }

    fn child(id: i64, family: Option<i64>, active: bool) -> Child {
        Child {
            id,
            first_name: format!("Kid{id}"),
            last_name: "Lee".to_string(),
            date_of_birth: None,
            classroom: None,
            classroom_name: None,
            family,
            is_active: active,
            allergy_info: None,
            notes: None,
        }
    }

    #[test]
    fn account_options_sort_numerically() {
        let accounts = vec![
            account(1, "10000", "Revenue"),
            account(2, "9000", "Rent"),
            account(3, "misc", "Suspense"),
            account(4, "1000", "Cash"),
        ];

        let labels: Vec<String> = account_options(&accounts)
            .into_iter()
            .map(|option| option.label)
            .collect();

        assert_eq!(
            labels,
            vec!["1000 - Cash", "9000 - Rent", "10000 - Revenue", "misc - Suspense"]
        );
    }

    #[test]
    fn family_children_keep_only_active_members() {
        let children = vec![
            child(1, Some(7), true),
            child(2, Some(7), false),
            child(3, Some(8), true),
            child(4, None, true),
        ];

        let kept = active_children_of_family(&children, 7);

        assert_eq!(kept.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(child_options(&kept)[0].label, "Kid1 Lee");
        assert_eq!(child_options(&kept)[0].value, "1");
    }

    #[test]
    fn ledger_header_includes_range_when_both_dates_set() {
        let query = LedgerQuery {
            account_id: 1,
            centre_id: Some(2),
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-03-31".to_string()),
        };

        let lines = ledger_header_lines("North", &query, "2024-04-02", "Admin");

        assert_eq!(
            lines,
            vec![
                "Centre: North",
                "As of: 2024-01-01 - 2024-03-31",
                "Generated on: 2024-04-02",
                "Prepared by: Admin",
            ]
        );
    }
}
