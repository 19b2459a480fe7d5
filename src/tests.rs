use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::domain::entities::accounting::Account;
use crate::domain::entities::childcare::{Child, Classroom, Withdrawal};
use crate::domain::entities::edit::FormState;
use crate::domain::entities::record::{Collection, RecordId};
use crate::domain::entities::scope::CentreScope;
use crate::domain::entities::view::{FilterSpec, SortSpec};
use crate::ui::state::table_state::TablePresenter;
use crate::usecase::ports::transport::{
    ApiError, ApiRequest, ApiResponse, Endpoint, HttpMethod, HttpTransport,
};
use crate::usecase::services::edit_service::{
    delete_record, DeleteOutcome, DeleteTracker, FormBinder,
};
use crate::usecase::services::export_service::{export_filename, ExportFormat, ExportJob};
use crate::usecase::services::query_service::ApiClient;
use crate::usecase::services::reference_service::ReferenceService;

const BASE: &str = "http://api.test";

/// Replays scripted responses in order and records every request it receives.
#[derive(Default)]
struct FakeTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    fn scripted(responses: Vec<Result<ApiResponse, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("requests lock should not be poisoned").clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests
            .lock()
            .expect("requests lock should not be poisoned")
            .push(request);
        self.responses
            .lock()
            .expect("responses lock should not be poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted response".to_string())))
    }
}

fn ok(status: u16, body: Value) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse {
        status,
        body: body.to_string(),
    })
}

fn client(transport: &Arc<FakeTransport>) -> ApiClient<FakeTransport> {
    ApiClient::new(Arc::clone(transport), BASE, 50).expect("base url should parse")
}

fn classroom_json(id: i64, name: &str, capacity: u32) -> Value {
    json!({"id": id, "name": name, "capacity": capacity})
}

fn classrooms(count: usize, first_id: i64) -> Vec<Value> {
    (0..count)
        .map(|idx| classroom_json(first_id + idx as i64, &format!("Room {idx}"), 10))
        .collect()
}

fn classroom(id: i64, name: &str) -> Classroom {
    Classroom {
        id,
        name: name.to_string(),
        program_type: None,
        capacity: 10,
        alternative_capacities: Vec::new(),
    }
}

fn ids<R: Collection>(records: &[R]) -> Vec<RecordId> {
    records.iter().map(|record| record.id()).collect()
}

#[tokio::test]
async fn fetch_page_derives_total_pages_from_count() {
    let transport = FakeTransport::scripted(vec![ok(
        200,
        json!({"count": 120, "next": null, "previous": "http://api.test/api/classrooms/?page=2",
               "results": classrooms(20, 101)}),
    )]);
    let client = client(&transport);

    let page = client
        .fetch_page::<Classroom>(&Endpoint::new(Classroom::ENDPOINT), 3)
        .await
        .expect("page should load");

    assert_eq!(page.total_pages, 3);
    assert_eq!(page.total_count, 120);
    assert_eq!(page.page_number, 3);
    assert_eq!(page.items.len(), 20);
    assert_eq!(
        transport.requests()[0],
        ApiRequest::get("http://api.test/api/classrooms/?page=3")
    );
}

#[tokio::test]
async fn bare_array_is_one_full_page() {
    let transport = FakeTransport::scripted(vec![ok(200, json!(classrooms(7, 1)))]);
    let client = client(&transport);

    let page = client
        .fetch_page::<Classroom>(&Endpoint::new(Classroom::ENDPOINT), 1)
        .await
        .expect("page should load");

    assert_eq!(page.total_pages, 1);
    assert_eq!(page.total_count, 7);
    assert_eq!(page.items.len(), 7);
}

#[tokio::test]
async fn fetch_all_follows_next_in_server_order() {
    let transport = FakeTransport::scripted(vec![
        ok(
            200,
            json!({"count": 3, "next": "http://api.test/api/classrooms/?page=2",
                   "results": [classroom_json(5, "B", 1), classroom_json(2, "A", 1)]}),
        ),
        ok(
            200,
            json!({"count": 3, "next": null, "results": [classroom_json(2, "A", 1)]}),
        ),
    ]);
    let client = client(&transport);

    let records = client
        .fetch_all::<Classroom>(&Endpoint::new(Classroom::ENDPOINT))
        .await
        .expect("collection should load");

    // Duplicates across pages are kept as sent.
    assert_eq!(
        ids(&records),
        vec![RecordId::Int(5), RecordId::Int(2), RecordId::Int(2)]
    );
    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            "http://api.test/api/classrooms/",
            "http://api.test/api/classrooms/?page=2",
        ]
    );
}

#[tokio::test]
async fn failures_are_typed_and_never_retried() {
    let transport = FakeTransport::scripted(vec![
        ok(400, json!({"name": ["This field is required."]})),
        Err(ApiError::Network("connection refused".to_string())),
    ]);
    let client = client(&transport);
    let endpoint = Endpoint::new(Classroom::ENDPOINT);

    let err = client
        .fetch_page::<Classroom>(&endpoint, 1)
        .await
        .expect_err("400 should fail");
    assert_eq!(
        err,
        ApiError::Server {
            status: 400,
            payload: r#"{"name":["This field is required."]}"#.to_string(),
        }
    );

    let err = client
        .fetch_page::<Classroom>(&endpoint, 1)
        .await
        .expect_err("transport failure should fail");
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn go_to_page_outside_range_sends_nothing() {
    let transport = FakeTransport::scripted(vec![
        ok(200, json!({"count": 120, "next": "x", "results": classrooms(50, 1)})),
        ok(200, json!({"count": 120, "next": null, "results": classrooms(20, 101)})),
    ]);
    let client = client(&transport);
    let mut presenter = TablePresenter::<Classroom>::new(Endpoint::new(Classroom::ENDPOINT));

    presenter.refresh(&client).await.expect("first page should load");
    assert_eq!(presenter.total_pages(), 3);

    assert!(!presenter.go_to_page(&client, 0).await.expect("no-op"));
    assert!(!presenter.go_to_page(&client, 4).await.expect("no-op"));
    assert_eq!(transport.requests().len(), 1);

    assert!(presenter.go_to_page(&client, 3).await.expect("page 3 should load"));
    assert_eq!(presenter.current_page(), 3);
    assert_eq!(presenter.records().len(), 20);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn pages_without_count_stay_navigable_backwards() {
    let transport = FakeTransport::scripted(vec![
        ok(200, json!({"next": "x", "results": classrooms(50, 1)})),
        ok(200, json!({"next": "y", "results": classrooms(50, 51)})),
        ok(200, json!({"next": null, "results": classrooms(1, 101)})),
    ]);
    let client = client(&transport);
    let mut presenter = TablePresenter::<Classroom>::new(Endpoint::new(Classroom::ENDPOINT));

    presenter.refresh(&client).await.expect("first page should load");
    assert_eq!(presenter.total_pages(), 2);
    assert!(presenter.go_to_page(&client, 2).await.expect("page 2 should load"));
    assert!(presenter.go_to_page(&client, 3).await.expect("page 3 should load"));

    assert_eq!(presenter.current_page(), 3);
    assert_eq!(presenter.total_pages(), 3);
    assert_eq!(presenter.total_count(), 101);
    assert!(presenter.has_previous());
    assert!(!presenter.has_next());
}

#[tokio::test]
async fn create_merges_response_and_resets_draft() {
    let transport = FakeTransport::scripted(vec![ok(201, classroom_json(7, "Sunflower", 12))]);
    let client = client(&transport);
    let mut list = vec![classroom(1, "Maple"), classroom(2, "Birch")];
    let mut binder = FormBinder::<Classroom>::new();

    binder.start_new();
    binder.set_field("name", json!("Sunflower"));
    binder.set_field("capacity", json!(12));
    let saved = binder
        .submit(&client, &mut list)
        .await
        .expect("create should succeed")
        .expect("a request should be sent");

    assert_eq!(saved.id, 7);
    assert_eq!(list.len(), 3);
    assert_eq!(list.iter().filter(|c| c.id == 7).count(), 1);
    assert_eq!(binder.state(), FormState::Idle);
    assert_eq!(binder.draft().get("name"), Some(&json!("")));
    assert!(binder.bound_key().is_none());

    let request = &transport.requests()[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, "http://api.test/api/classrooms/");
    assert_eq!(request.body, Some(json!({"name": "Sunflower", "capacity": 12})));
}

#[tokio::test]
async fn update_replaces_in_place_and_keeps_draft() {
    let transport = FakeTransport::scripted(vec![ok(200, classroom_json(2, "Renamed", 10))]);
    let client = client(&transport);
    let mut list = vec![classroom(1, "Maple"), classroom(2, "Birch"), classroom(3, "Oak")];
    let mut binder = FormBinder::<Classroom>::new();

    binder
        .start_edit(&list[1].clone())
        .expect("record should load into draft");
    binder.set_field("name", json!("Renamed"));
    binder
        .submit(&client, &mut list)
        .await
        .expect("update should succeed");

    assert_eq!(ids(&list), vec![RecordId::Int(1), RecordId::Int(2), RecordId::Int(3)]);
    assert_eq!(list[1].name, "Renamed");
    assert_eq!(binder.draft().get("name"), Some(&json!("Renamed")));
    assert_eq!(binder.bound_key(), Some(&RecordId::Int(2)));

    let request = &transport.requests()[0];
    assert_eq!(request.method, HttpMethod::Put);
    assert_eq!(request.url, "http://api.test/api/classrooms/2/");
}

#[tokio::test]
async fn missing_required_fields_block_the_request() {
    let transport = FakeTransport::scripted(Vec::new());
    let client = client(&transport);
    let mut list = Vec::new();
    let mut binder = FormBinder::<Classroom>::new();

    binder.start_new();
    binder.set_field("capacity", json!(12));
    let err = binder
        .submit(&client, &mut list)
        .await
        .expect_err("blank name should fail");

    assert_eq!(
        err,
        ApiError::Validation {
            missing: vec!["name".to_string()]
        }
    );
    assert_eq!(binder.state(), FormState::Editing);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn server_rejection_leaves_list_untouched() {
    let transport = FakeTransport::scripted(vec![ok(400, json!({"capacity": ["Too large."]}))]);
    let client = client(&transport);
    let mut list = vec![classroom(1, "Maple")];
    let mut binder = FormBinder::<Classroom>::new();

    binder.start_new();
    binder.set_field("name", json!("Huge"));
    binder.set_field("capacity", json!(9999));
    let err = binder
        .submit(&client, &mut list)
        .await
        .expect_err("server should reject");

    assert!(matches!(err, ApiError::Server { status: 400, .. }));
    assert_eq!(list, vec![classroom(1, "Maple")]);
    assert_eq!(binder.state(), FormState::Editing);
    assert!(binder
        .last_error()
        .is_some_and(|message| message.contains("Too large.")));
    assert_eq!(binder.draft().get("name"), Some(&json!("Huge")));
}

#[test]
fn in_flight_submit_cannot_start_twice() {
    let mut binder = FormBinder::<Classroom>::new();
    binder.start_new();
    binder.set_field("name", json!("Sunflower"));
    binder.set_field("capacity", json!(12));

    let first = binder.begin_submit().expect("draft should validate");
    assert!(first.is_some());
    assert!(binder.is_submitting());

    let second = binder.begin_submit().expect("second submit is ignored");
    assert!(second.is_none());

    binder.set_field("name", json!("Changed"));
    assert_eq!(binder.draft().get("name"), Some(&json!("Sunflower")));
}

#[tokio::test]
async fn child_intake_posts_to_add_child_without_unflagged_family() {
    let transport = FakeTransport::scripted(vec![ok(
        201,
        json!({"id": 11, "first_name": "Ada", "last_name": "Lee", "classroom": 3, "is_active": true}),
    )]);
    let client = client(&transport);
    let mut list: Vec<Child> = Vec::new();
    let mut binder = FormBinder::<Child>::new();

    binder.start_new();
    binder.set_field("first_name", json!("Ada"));
    binder.set_field("last_name", json!("Lee"));
    binder.set_field("date_of_birth", json!("2021-04-02"));
    binder.set_field("classroom", json!(3));
    binder.set_field("family", json!(9));
    binder
        .submit(&client, &mut list)
        .await
        .expect("intake should succeed");

    let request = &transport.requests()[0];
    assert_eq!(request.url, "http://api.test/api/add-child/");
    let body = request.body.as_ref().expect("post should carry a body");
    assert!(body.get("family").is_none());
    assert_eq!(body.get("classroom"), Some(&json!(3)));
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn child_intake_with_existing_family_requires_and_sends_family() {
    let transport = FakeTransport::scripted(vec![ok(
        201,
        json!({"id": 12, "first_name": "Bo", "last_name": "Lee", "classroom": 3, "family": 9}),
    )]);
    let client = client(&transport);
    let mut list: Vec<Child> = Vec::new();
    let mut binder = FormBinder::<Child>::new();

    binder.start_new();
    binder.set_field("first_name", json!("Bo"));
    binder.set_field("last_name", json!("Lee"));
    binder.set_field("date_of_birth", json!("2022-08-15"));
    binder.set_field("classroom", json!(3));
    binder.set_field("existing_family", json!(true));

    let err = binder
        .submit(&client, &mut list)
        .await
        .expect_err("family should be required");
    assert_eq!(
        err,
        ApiError::Validation {
            missing: vec!["family".to_string()]
        }
    );
    assert!(transport.requests().is_empty());

    binder.set_field("family", json!(9));
    binder
        .submit(&client, &mut list)
        .await
        .expect("intake should succeed");

    let body = transport.requests()[0]
        .body
        .clone()
        .expect("post should carry a body");
    assert_eq!(body.get("family"), Some(&json!(9)));
    assert_eq!(list[0].family, Some(9));
}

#[tokio::test]
async fn withdrawal_form_creates_then_updates_by_child_choice() {
    let transport = FakeTransport::scripted(vec![
        ok(
            201,
            json!({"id": 5, "child": 11, "child_name": "Ada Lee", "withdrawal_date": "2024-06-30",
                   "withdrawal_reason": "Moving", "status": "refunded"}),
        ),
        ok(
            200,
            json!({"id": 5, "child": 11, "child_name": "Ada Lee", "withdrawal_date": "2024-06-30",
                   "withdrawal_reason": "Moving", "status": "forfeited"}),
        ),
    ]);
    let client = client(&transport);
    let mut list: Vec<Withdrawal> = Vec::new();
    let mut binder = FormBinder::<Withdrawal>::new();

    binder.start_new();
    binder.set_field("child", json!(11));
    binder.set_field("withdrawal_date", json!("2024-06-30"));
    binder.set_field("withdrawal_reason", json!("Moving"));
    binder.set_field("status", json!("refunded"));
    binder
        .submit(&client, &mut list)
        .await
        .expect("create should succeed");

    let created = list[0].clone();
    binder.start_edit(&created).expect("edit should start");
    binder.set_field("status", json!("forfeited"));
    binder
        .submit(&client, &mut list)
        .await
        .expect("update should succeed");

    let requests = transport.requests();
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(requests[0].url, "http://api.test/api/withdrawals/");
    let body = requests[0].body.as_ref().expect("post should carry a body");
    assert_eq!(body.get("child"), Some(&json!(11)));
    assert!(body.get("notes").is_none());
    assert_eq!(requests[1].method, HttpMethod::Put);
    assert_eq!(requests[1].url, "http://api.test/api/withdrawals/5/");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].status, "forfeited");
}

#[tokio::test]
async fn delete_removes_only_after_confirmation_and_success() {
    let transport = FakeTransport::scripted(vec![
        Ok(ApiResponse {
            status: 204,
            body: String::new(),
        }),
        ok(500, json!({"detail": "boom"})),
    ]);
    let client = client(&transport);
    let mut list = vec![classroom(1, "A"), classroom(2, "B"), classroom(3, "C")];
    let mut tracker = DeleteTracker::default();

    let outcome = delete_record::<Classroom, _, _>(
        &client,
        &mut tracker,
        &mut list,
        &RecordId::Int(2),
        |_| false,
    )
    .await
    .expect("declined delete is not an error");
    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert!(transport.requests().is_empty());

    let outcome = delete_record::<Classroom, _, _>(
        &client,
        &mut tracker,
        &mut list,
        &RecordId::Int(2),
        |_| true,
    )
    .await
    .expect("delete should succeed");
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(ids(&list), vec![RecordId::Int(1), RecordId::Int(3)]);
    assert_eq!(transport.requests()[0].method, HttpMethod::Delete);
    assert_eq!(transport.requests()[0].url, "http://api.test/api/classrooms/2/");

    let err = delete_record::<Classroom, _, _>(
        &client,
        &mut tracker,
        &mut list,
        &RecordId::Int(3),
        |_| true,
    )
    .await
    .expect_err("server failure should surface");
    assert!(matches!(err, ApiError::Server { status: 500, .. }));
    assert_eq!(ids(&list), vec![RecordId::Int(1), RecordId::Int(3)]);
}

#[tokio::test]
async fn accounts_page_joins_centre_balances() {
    let transport = FakeTransport::scripted(vec![
        ok(
            200,
            json!({"count": 2, "next": null, "results": [
                {"account_id": 1, "account_number": "1000", "account_name": "Chequing", "account_type": "Bank", "is_active": true, "centre": 4},
                {"account_id": 2, "account_number": "5000", "account_name": "Supplies", "account_type": "Expense", "is_active": true, "centre": 4}
            ]}),
        ),
        ok(
            200,
            json!([{"account": 1, "app_balance": "250.00", "bank_balance": "240.00"}]),
        ),
    ]);
    let service = ReferenceService::new(client(&transport), CentreScope::new(4, "North Hill"));

    let page = service.accounts_page(1).await.expect("accounts should load");

    let accounts: &[Account] = &page.items;
    assert_eq!(accounts[0].bank_balance.as_deref(), Some("240.00"));
    assert_eq!(accounts[1].app_balance.as_deref(), Some("N/A"));
    assert_eq!(accounts[1].bank_balance.as_deref(), Some("-"));
    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            "http://api.test/api/coa/?centre=4&page=1",
            "http://api.test/api/account_balances/?centre=4",
        ]
    );
}

#[tokio::test]
async fn centre_name_falls_back_when_lookup_fails() {
    let transport = FakeTransport::scripted(vec![
        ok(200, json!({"id": 4, "name": "North Hill"})),
        ok(404, json!({"detail": "Not found."})),
    ]);
    let service = ReferenceService::new(client(&transport), CentreScope::new(4, "Configured"));

    assert_eq!(service.resolve_centre_name().await, "North Hill");
    assert_eq!(service.resolve_centre_name().await, "Configured");
    assert_eq!(transport.requests()[0].url, "http://api.test/api/centres/4/");

    let unscoped = ReferenceService::new(client(&transport), CentreScope::default());
    assert_eq!(unscoped.resolve_centre_name().await, "Centre");
    assert_eq!(transport.requests().len(), 2);
}

fn withdrawal(id: i64, child_name: &str, reason: &str, status: &str) -> Withdrawal {
    Withdrawal {
        id,
        child: id * 10,
        child_name: Some(child_name.to_string()),
        withdrawal_date: "2024-05-01".to_string(),
        withdrawal_reason: reason.to_string(),
        status: status.to_string(),
        notes: None,
    }
}

#[test]
fn delimited_export_reads_back_field_for_field() {
    let records = vec![
        withdrawal(1, "Ada Lee", "Moving, \"far\" away", "refunded"),
        withdrawal(2, "Bo Chan", "Schedule", "forfeited"),
    ];
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).expect("date should be valid");

    let artifact = ExportJob::new(
        &records,
        Withdrawal::columns(),
        ExportFormat::Delimited,
        Withdrawal::LABEL,
        "North  Hill",
        date,
    )
    .render()
    .expect("csv should render");

    assert_eq!(artifact.filename, "Withdrawals_North_Hill_2024-05-01.csv");
    let mut reader = csv::Reader::from_reader(artifact.bytes.as_slice());
    let headers = reader.headers().expect("headers should parse").clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["Child", "Withdrawal Date", "Reason", "Status", "Notes"]
    );
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|row| {
            row.expect("row should parse")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    assert_eq!(
        rows[0],
        vec!["Ada Lee", "2024-05-01", "Moving, \"far\" away", "refunded", "-"]
    );
    assert_eq!(rows.len(), 2);
}

#[test]
fn export_follows_the_visible_view_and_is_deterministic() {
    let mut presenter = TablePresenter::<Withdrawal>::new(Endpoint::new(Withdrawal::ENDPOINT));
    let request = presenter.begin_refresh();
    presenter
        .complete(
            request.ticket,
            Ok(crate::domain::entities::view::Page::single(vec![
                withdrawal(1, "Ada Lee", "Moving", "refunded"),
                withdrawal(2, "Bo Chan", "Schedule", "forfeited"),
                withdrawal(3, "Cy Diaz", "Cost", "refunded"),
            ])),
        )
        .expect("page should apply");
    presenter.on_sort_header_click("child_name");
    presenter.on_sort_header_click("child_name");
    presenter.set_filter(FilterSpec::default().category("status", "refunded"));
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).expect("date should be valid");

    let first = presenter
        .export(ExportFormat::Delimited, "North", date)
        .expect("csv should render");
    let second = presenter
        .export(ExportFormat::Delimited, "North", date)
        .expect("csv should render");

    assert_eq!(first, second);
    let text = String::from_utf8(first.bytes).expect("csv should be utf-8");
    let children: Vec<&str> = text
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap_or_default())
        .collect();
    assert_eq!(children, vec!["Cy Diaz", "Ada Lee"]);
    assert_eq!(presenter.sort(), Some(&SortSpec::desc("child_name")));

    let pdf = presenter
        .export(ExportFormat::Document, "North", date)
        .expect("pdf should render");
    assert_eq!(pdf.filename, "Withdrawals_North_2024-05-01.pdf");
    assert!(pdf.bytes.starts_with(b"%PDF-1.4"));
}

#[test]
fn export_filename_collapses_scope_whitespace() {
    let date = NaiveDate::from_ymd_opt(2025, 1, 9).expect("date should be valid");
    assert_eq!(
        export_filename("COA", "Little  Stars Centre", date, "pdf"),
        "COA_Little_Stars_Centre_2025-01-09.pdf"
    );
    assert_eq!(
        export_filename("COA", " North\tHill ", date, "csv"),
        "COA__North_Hill__2025-01-09.csv"
    );
    assert_eq!(
        export_filename("COA", "  ", date, "csv"),
        "COA_Centre_2025-01-09.csv"
    );
}
