use chrono::NaiveDate;
use tracing::debug;

use crate::domain::entities::record::{project_rows, Collection};
use crate::domain::entities::view::{FilterSpec, Page, SortSpec};
use crate::usecase::ports::transport::{ApiError, Endpoint, HttpTransport};
use crate::usecase::services::export_service::{ExportArtifact, ExportFormat, ExportJob};
use crate::usecase::services::query_service::ApiClient;
use crate::usecase::services::view_model::project;

/// Generation number of a page request. Only the newest one may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub ticket: RequestTicket,
    pub endpoint: Endpoint,
    pub page_number: u32,
}

/// Paginated table over one collection: the loaded page plus the client-side
/// sort and filter applied to it.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePresenter<R: Collection> {
    endpoint: Endpoint,
    records: Vec<R>,
    current_page: u32,
    total_pages: u32,
    total_count: u64,
    sort: Option<SortSpec>,
    filter: FilterSpec,
    latest_ticket: u64,
    settled_ticket: u64,
    last_error: Option<String>,
}

impl<R: Collection> TablePresenter<R> {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            records: Vec::new(),
            current_page: 1,
            total_pages: 0,
            total_count: 0,
            sort: None,
            filter: FilterSpec::default(),
            latest_ticket: 0,
            settled_ticket: 0,
            last_error: None,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Loaded records in server order, for merges after create/update/delete.
    pub fn records_mut(&mut self) -> &mut Vec<R> {
        &mut self.records
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the newest request has not been answered yet. Superseded
    /// responses do not settle it.
    pub fn is_loading(&self) -> bool {
        self.latest_ticket != self.settled_ticket
    }

    pub fn has_previous(&self) -> bool {
        self.page_target(self.current_page.saturating_sub(1))
    }

    pub fn has_next(&self) -> bool {
        self.page_target(self.current_page.saturating_add(1))
    }

    /// Whether `page_number` is inside the known page range.
    pub fn page_target(&self, page_number: u32) -> bool {
        page_number >= 1 && page_number <= self.total_pages
    }

    fn issue_ticket(&mut self) -> RequestTicket {
        self.latest_ticket += 1;
        RequestTicket(self.latest_ticket)
    }

    /// Request for page `page_number`, or `None` when it is out of range.
    pub fn begin_page_request(&mut self, page_number: u32) -> Option<PageRequest> {
        if !self.page_target(page_number) {
            debug!(page_number, total_pages = self.total_pages, "page out of range");
            return None;
        }
        Some(self.request_for(page_number))
    }

    /// Request for the current page, issued even before the first page is known.
    pub fn begin_refresh(&mut self) -> PageRequest {
        let page_number = self.current_page.max(1);
        self.request_for(page_number)
    }

    fn request_for(&mut self, page_number: u32) -> PageRequest {
        PageRequest {
            ticket: self.issue_ticket(),
            endpoint: self.endpoint.clone(),
            page_number,
        }
    }

    /// Applies the outcome of a request. Returns `Ok(false)` when a newer request
    /// has been issued since, in which case nothing changes.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<Page<R>, ApiError>,
    ) -> Result<bool, ApiError> {
        if ticket.0 != self.latest_ticket {
            debug!(ticket = ticket.0, latest = self.latest_ticket, "discarding stale page");
            return Ok(false);
        }
        self.settled_ticket = ticket.0;
        match outcome {
            Ok(page) => {
                self.records = page.items;
                self.current_page = page.page_number;
                self.total_pages = page.total_pages;
                self.total_count = page.total_count;
                // Each page arrives in server order.
                self.sort = None;
                self.last_error = None;
                Ok(true)
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Fetches page `page_number` when it is in range. `Ok(false)` means nothing
    /// was requested or the response was superseded.
    pub async fn go_to_page<T: HttpTransport>(
        &mut self,
        client: &ApiClient<T>,
        page_number: u32,
    ) -> Result<bool, ApiError> {
        let Some(request) = self.begin_page_request(page_number) else {
            return Ok(false);
        };
        let outcome = client
            .fetch_page::<R>(&request.endpoint, request.page_number)
            .await;
        self.complete(request.ticket, outcome)
    }

    pub async fn refresh<T: HttpTransport>(&mut self, client: &ApiClient<T>) -> Result<bool, ApiError> {
        let request = self.begin_refresh();
        let outcome = client
            .fetch_page::<R>(&request.endpoint, request.page_number)
            .await;
        self.complete(request.ticket, outcome)
    }

    pub fn on_sort_header_click(&mut self, field: &str) {
        self.sort = Some(SortSpec::toggled(self.sort.as_ref(), field));
    }

    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
    }

    /// Header arrow for a column, if it is the sorted one.
    pub fn sort_indicator(&self, field: &str) -> &'static str {
        match &self.sort {
            Some(spec) if spec.field == field => spec.direction.arrow(),
            _ => "",
        }
    }

    /// Loaded records after filter and sort.
    pub fn visible_records(&self) -> Vec<R> {
        project(&self.records, self.sort.as_ref(), &self.filter)
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        project_rows(&self.visible_records(), R::columns())
    }

    /// Exports exactly what the table shows.
    pub fn export(
        &self,
        format: ExportFormat,
        scope_name: &str,
        generated_at: NaiveDate,
    ) -> anyhow::Result<ExportArtifact> {
        let visible = self.visible_records();
        ExportJob::new(&visible, R::columns(), format, R::LABEL, scope_name, generated_at).render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::childcare::Classroom;

    fn classroom(id: i64, name: &str) -> Classroom {
        Classroom {
            id,
            name: name.to_string(),
            program_type: None,
            capacity: 10,
            alternative_capacities: Vec::new(),
        }
    }

    fn page(items: Vec<Classroom>, number: u32, count: u64) -> Page<Classroom> {
        Page::from_envelope(items, number, count, 2, None)
    }

    #[test]
    fn out_of_range_pages_issue_no_request() {
        let mut presenter = TablePresenter::<Classroom>::new(Endpoint::new("api/classrooms/"));
        assert!(presenter.begin_page_request(1).is_none());

        let request = presenter.begin_refresh();
        presenter
            .complete(request.ticket, Ok(page(vec![classroom(1, "A")], 1, 3)))
            .expect("page should apply");

        assert_eq!(presenter.total_pages(), 2);
        assert!(presenter.begin_page_request(0).is_none());
        assert!(presenter.begin_page_request(3).is_none());
        assert!(presenter.begin_page_request(2).is_some());
    }

    #[test]
    fn superseded_response_is_discarded() {
        let mut presenter = TablePresenter::<Classroom>::new(Endpoint::new("api/classrooms/"));
        let first = presenter.begin_refresh();
        let second = presenter.begin_refresh();

        let applied = presenter
            .complete(second.ticket, Ok(page(vec![classroom(2, "New")], 1, 1)))
            .expect("latest page should apply");
        assert!(applied);

        let applied = presenter
            .complete(first.ticket, Ok(page(vec![classroom(1, "Old")], 1, 1)))
            .expect("stale page is not an error");
        assert!(!applied);
        assert_eq!(presenter.records()[0].name, "New");
    }

    #[test]
    fn stale_response_leaves_newer_request_loading() {
        let mut presenter = TablePresenter::<Classroom>::new(Endpoint::new("api/classrooms/"));
        assert!(!presenter.is_loading());
        let first = presenter.begin_refresh();
        let second = presenter.begin_refresh();

        presenter
            .complete(first.ticket, Ok(page(vec![classroom(1, "Old")], 1, 1)))
            .expect("stale page is not an error");
        assert!(presenter.is_loading());

        presenter
            .complete(second.ticket, Err(ApiError::Network("offline".to_string())))
            .expect_err("failure should surface");
        assert!(!presenter.is_loading());
        assert_eq!(presenter.last_error(), Some("network error: offline"));
    }

    #[test]
    fn sorting_reprojects_without_touching_loaded_order() {
        let mut presenter = TablePresenter::<Classroom>::new(Endpoint::new("api/classrooms/"));
        let request = presenter.begin_refresh();
        presenter
            .complete(
                request.ticket,
                Ok(page(vec![classroom(1, "Maple"), classroom(2, "Birch")], 1, 2)),
            )
            .expect("page should apply");

        presenter.on_sort_header_click("name");
        assert_eq!(presenter.rows()[0][0], "Birch");
        assert_eq!(presenter.sort_indicator("name"), "▲");

        presenter.on_sort_header_click("name");
        assert_eq!(presenter.rows()[0][0], "Maple");
        assert_eq!(presenter.records()[0].name, "Maple");

        presenter.on_sort_header_click("capacity");
        assert_eq!(presenter.sort(), Some(&SortSpec::asc("capacity")));
    }

    #[test]
    fn new_page_clears_sort() {
        let mut presenter = TablePresenter::<Classroom>::new(Endpoint::new("api/classrooms/"));
        let request = presenter.begin_refresh();
        presenter
            .complete(request.ticket, Ok(page(vec![classroom(1, "A")], 1, 4)))
            .expect("page should apply");
        presenter.on_sort_header_click("name");

        let request = presenter
            .begin_page_request(2)
            .expect("page 2 should be in range");
        presenter
            .complete(request.ticket, Ok(page(vec![classroom(3, "C")], 2, 4)))
            .expect("page should apply");

        assert_eq!(presenter.current_page(), 2);
        assert!(presenter.sort().is_none());
    }
}
