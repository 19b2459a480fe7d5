use std::future::Future;

use chrono::Local;
use dioxus::prelude::*;
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::domain::entities::accounting::{Account, LedgerLine, LedgerQuery, ACCOUNT_TYPES};
use crate::domain::entities::childcare::{
    Child, Classroom, Family, Transition, Withdrawal, WITHDRAWAL_STATUSES,
};
use crate::domain::entities::record::{Collection, Record};
use crate::domain::entities::view::Page;
use crate::infra::http::transport::ReqwestTransport;
use crate::platform;
use crate::ui::state::app_state::{AppState, Screen};
use crate::ui::state::table_state::{PageRequest, TablePresenter};
use crate::usecase::ports::transport::ApiError;
use crate::usecase::services::edit_service::{
    send_plan, DeleteOutcome, DeleteStart, DeleteTracker, FormBinder,
};
use crate::usecase::services::export_service::{ExportFormat, ExportJob};
use crate::usecase::services::query_service::ApiClient;
use crate::usecase::services::reference_service::{
    ledger_header_lines, DropdownOption, ReferenceService,
};

const TABLE_STYLE: &str = "border-collapse: collapse; width: 100%; font-size: 14px;";
const HEADER_CELL_STYLE: &str = "border: 1px solid #ccc; background: #f5f5f5; padding: 6px 8px; text-align: left; cursor: pointer; user-select: none;";
const CELL_STYLE: &str = "border: 1px solid #ddd; padding: 6px 8px;";
const BUTTON_STYLE: &str = "border: 1px solid #bbb; background: #fff; padding: 4px 10px; border-radius: 6px; cursor: pointer;";
const ACTIVE_TAB_STYLE: &str = "border: 1px solid #3366cc; background: #eef4ff; padding: 4px 10px; border-radius: 6px; cursor: pointer;";
const INPUT_STYLE: &str = "border: 1px solid #bbb; padding: 4px 8px; border-radius: 6px;";
const ERROR_STYLE: &str = "color: #b00020; margin: 6px 0;";
const TOOLBAR_STYLE: &str = "display: flex; flex-wrap: wrap; align-items: center; gap: 8px; margin: 8px 0;";

/// Shared services handed to every screen through the Dioxus context.
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub client: ApiClient<ReqwestTransport>,
}

impl AppContext {
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        let client = ApiClient::new(
            std::sync::Arc::new(transport),
            &config.api_base_url,
            config.page_size,
        )?;
        Ok(Self { config, client })
    }

    fn reference(&self) -> ReferenceService<ReqwestTransport> {
        ReferenceService::new(self.client.clone(), self.config.centre.clone())
    }
}

fn dropdown_label(options: &[DropdownOption], selected: Option<&str>) -> String {
    selected
        .and_then(|value| options.iter().find(|opt| opt.value == value))
        .map(|opt| opt.label.clone())
        .unwrap_or_else(|| "(none)".to_string())
}

fn labelled_options(values: &[&str], all_label: &str) -> Vec<DropdownOption> {
    std::iter::once(DropdownOption {
        value: String::new(),
        label: all_label.to_string(),
    })
    .chain(values.iter().map(|value| DropdownOption {
        value: value.to_string(),
        label: value.to_string(),
    }))
    .collect()
}

#[component]
fn DropdownSelect(
    id: &'static str,
    label: &'static str,
    options: Vec<DropdownOption>,
    selected: Option<String>,
    mut open_dropdown: Signal<Option<&'static str>>,
    on_select: EventHandler<String>,
) -> Element {
    let is_open = open_dropdown() == Some(id);
    let selected_label = dropdown_label(&options, selected.as_deref());

    rsx! {
        div {
            style: "position: relative; display: inline-flex; align-items: center; gap: 6px;",
            span { "{label}" }
            button {
                style: BUTTON_STYLE,
                onclick: move |event| {
                    event.stop_propagation();
                    if open_dropdown() == Some(id) {
                        open_dropdown.set(None);
                    } else {
                        open_dropdown.set(Some(id));
                    }
                },
                "{selected_label}"
            }
            if is_open {
                div {
                    style: "position: absolute; left: 0; top: 100%; min-width: 200px; max-height: 320px; overflow-y: auto; background: #fff; border: 1px solid #bbb; border-radius: 8px; box-shadow: 0 10px 24px rgba(0,0,0,0.15); z-index: 1200;",
                    onclick: move |event| event.stop_propagation(),
                    {options.iter().map(|opt| {
                        let value = opt.value.clone();
                        let label = opt.label.clone();
                        let is_selected = selected.as_deref() == Some(value.as_str());
                        let background = if is_selected { "#eef4ff" } else { "transparent" };
                        rsx!(
                            div {
                                key: "{value}",
                                style: "padding: 8px 10px; cursor: pointer; background: {background};",
                                onclick: move |_| {
                                    on_select.call(value.clone());
                                    open_dropdown.set(None);
                                },
                                "{label}"
                            }
                        )
                    })}
                }
            }
        }
    }
}

/// Issues a page request and applies its outcome when it is still the newest one.
/// `page` of `None` reloads the current page.
fn request_page<R, F, Fut>(
    mut presenter: Signal<TablePresenter<R>>,
    page: Option<u32>,
    mut state: AppState,
    fetch: F,
) where
    R: Collection,
    F: FnOnce(PageRequest) -> Fut + 'static,
    Fut: Future<Output = Result<Page<R>, ApiError>> + 'static,
{
    let request = match page {
        Some(page_number) => presenter.write().begin_page_request(page_number),
        None => Some(presenter.write().begin_refresh()),
    };
    let Some(request) = request else {
        return;
    };

    let ticket = request.ticket;
    state.busy.set(true);
    spawn(async move {
        let outcome = fetch(request).await;
        let applied = presenter.write().complete(ticket, outcome);
        match applied {
            Ok(true) => state.status.set(format!("Loaded {}", R::LABEL)),
            Ok(false) => {}
            Err(err) => state.status.set(format!("Failed to load {}: {err}", R::LABEL)),
        }
        // A superseded response leaves the newer request in flight.
        if !presenter.read().is_loading() {
            state.busy.set(false);
        }
    });
}

fn load_list<R: Collection>(
    presenter: Signal<TablePresenter<R>>,
    page: Option<u32>,
    state: AppState,
    client: ApiClient<ReqwestTransport>,
) {
    request_page(presenter, page, state, move |request| async move {
        client
            .fetch_page::<R>(&request.endpoint, request.page_number)
            .await
    });
}

fn export_view<R: Collection>(
    presenter: Signal<TablePresenter<R>>,
    format: ExportFormat,
    mut state: AppState,
) {
    let centre_name = state.centre_name.read().clone();
    let today = Local::now().date_naive();
    let result = presenter
        .read()
        .export(format, &centre_name, today)
        .and_then(|artifact| platform::save_artifact(&artifact));
    match result {
        Ok(Some(path)) => state.status.set(format!("Exported {}", path.display())),
        Ok(None) => state.status.set("Export cancelled".to_string()),
        Err(err) => state.status.set(format!("Export failed: {err:#}")),
    }
}

fn export_buttons<R: Collection>(presenter: Signal<TablePresenter<R>>, state: AppState) -> Element {
    rsx! {
        button {
            style: BUTTON_STYLE,
            onclick: move |_| export_view(presenter, ExportFormat::Delimited, state),
            "Export CSV"
        }
        button {
            style: BUTTON_STYLE,
            onclick: move |_| export_view(presenter, ExportFormat::Document, state),
            "Export PDF"
        }
    }
}

fn search_box<R: Collection>(
    mut presenter: Signal<TablePresenter<R>>,
    field: &'static str,
    placeholder: &'static str,
) -> Element {
    let term = presenter
        .read()
        .filter()
        .search
        .as_ref()
        .map(|search| search.term.clone())
        .unwrap_or_default();

    rsx! {
        input {
            style: INPUT_STYLE,
            r#type: "search",
            placeholder: placeholder,
            value: "{term}",
            oninput: move |event| {
                let filter = presenter.read().filter().clone().search(field, event.value());
                presenter.write().set_filter(filter);
            }
        }
    }
}

fn category_value<R: Collection>(presenter: &Signal<TablePresenter<R>>) -> Option<String> {
    presenter
        .read()
        .filter()
        .category
        .as_ref()
        .map(|category| category.value.clone())
}

/// Table of the visible records with sortable headers and pagination.
fn record_table<R: Collection>(
    mut presenter: Signal<TablePresenter<R>>,
    on_page: Callback<u32>,
    row_actions: Vec<(&'static str, Callback<R>)>,
) -> Element {
    let columns = R::columns();
    let (headers, rows, current, total, count, has_previous, has_next, error) = {
        let view = presenter.read();
        let headers: Vec<_> = columns
            .iter()
            .map(|column| (*column, view.sort_indicator(column.field)))
            .collect();
        let rows: Vec<(R, Vec<String>)> = view
            .visible_records()
            .into_iter()
            .map(|record| {
                let cells = columns.iter().map(|column| column.render(&record)).collect();
                (record, cells)
            })
            .collect();
        (
            headers,
            rows,
            view.current_page(),
            view.total_pages(),
            view.total_count(),
            view.has_previous(),
            view.has_next(),
            view.last_error().map(str::to_string),
        )
    };

    rsx! {
        if let Some(error) = error {
            p { style: ERROR_STYLE, "{error}" }
        }
        table {
            style: TABLE_STYLE,
            thead {
                tr {
                    for (column, indicator) in headers {
                        th {
                            key: "{column.field}",
                            style: HEADER_CELL_STYLE,
                            onclick: move |_| {
                                if column.sortable {
                                    presenter.write().on_sort_header_click(column.field);
                                }
                            },
                            "{column.label} {indicator}"
                        }
                    }
                    if !row_actions.is_empty() {
                        th { style: HEADER_CELL_STYLE }
                    }
                }
            }
            tbody {
                for (idx, (record, cells)) in rows.into_iter().enumerate() {
                    tr {
                        key: "{idx}",
                        for (cell_idx, cell) in cells.into_iter().enumerate() {
                            td { key: "{cell_idx}", style: CELL_STYLE, "{cell}" }
                        }
                        if !row_actions.is_empty() {
                            td {
                                style: CELL_STYLE,
                                for (label, handler) in row_actions.iter().copied() {
                                    button {
                                        key: "{label}",
                                        style: BUTTON_STYLE,
                                        onclick: {
                                            let record = record.clone();
                                            move |_: MouseEvent| handler.call(record.clone())
                                        },
                                        "{label}"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        div {
            style: TOOLBAR_STYLE,
            button {
                style: BUTTON_STYLE,
                disabled: !has_previous,
                onclick: move |_| on_page.call(current.saturating_sub(1)),
                "Previous"
            }
            span { "Page {current} of {total} ({count} records)" }
            button {
                style: BUTTON_STYLE,
                disabled: !has_next,
                onclick: move |_| on_page.call(current.saturating_add(1)),
                "Next"
            }
        }
    }
}

#[component]
pub fn App() -> Element {
    let ctx = use_context::<AppContext>();
    let state = AppState::new(ctx.config.centre.name.clone());
    use_context_provider(move || state);
    let mut centre_name = state.centre_name;
    let reference = ctx.reference();

    use_hook(move || {
        spawn(async move {
            let name = reference.resolve_centre_name().await;
            centre_name.set(name);
        })
    });

    let AppState {
        mut screen,
        busy,
        status,
        ..
    } = state;
    let active = screen();
    let tabs: Vec<_> = Screen::ALL
        .into_iter()
        .map(|tab| {
            let style = if tab == active { ACTIVE_TAB_STYLE } else { BUTTON_STYLE };
            (tab, tab.title(), style)
        })
        .collect();
    let title = centre_name();
    let status_text = status();

    rsx! {
        div {
            style: "font-family: sans-serif; padding: 12px;",
            h2 { "{title}" }
            nav {
                style: TOOLBAR_STYLE,
                for (tab, label, style) in tabs {
                    button {
                        key: "{label}",
                        style: style,
                        onclick: move |_| screen.set(tab),
                        "{label}"
                    }
                }
            }
            p {
                style: "color: #555; margin: 4px 0;",
                if busy() { "Working... " }
                "{status_text}"
            }
            {match active {
                Screen::Classrooms => rsx! { ClassroomsScreen {} },
                Screen::Children => rsx! { ChildrenScreen {} },
                Screen::Families => rsx! { FamiliesScreen {} },
                Screen::Accounts => rsx! { AccountsScreen {} },
                Screen::Transitions => rsx! { TransitionsScreen {} },
                Screen::Withdrawals => rsx! { WithdrawalsScreen {} },
                Screen::Ledger => rsx! { LedgerScreen {} },
            }}
        }
    }
}

fn draft_text<C: Collection>(binder: &Signal<FormBinder<C>>, field: &str) -> String {
    match binder.read().draft().get(field) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Validates the draft, sends it, and merges the saved record into the table.
fn submit_form<C: Collection>(
    mut binder: Signal<FormBinder<C>>,
    mut presenter: Signal<TablePresenter<C>>,
    mut state: AppState,
    client: ApiClient<ReqwestTransport>,
    describe: fn(&C) -> String,
) {
    let plan = binder.write().begin_submit();
    match plan {
        Ok(Some(plan)) => {
            spawn(async move {
                let outcome = send_plan::<C, _>(&client, plan).await;
                let result = {
                    let mut table = presenter.write();
                    binder.write().finish_submit(outcome, table.records_mut())
                };
                match result {
                    Ok(record) => state.status.set(format!("Saved {}", describe(&record))),
                    Err(err) => state.status.set(format!("Save failed: {err}")),
                }
            });
        }
        Ok(None) => {}
        Err(err) => state.status.set(err.to_string()),
    }
}

fn text_input<C: Collection>(
    mut binder: Signal<FormBinder<C>>,
    field: &'static str,
    placeholder: &'static str,
    input_type: &'static str,
) -> Element {
    let value = draft_text(&binder, field);
    let submitting = binder.read().is_submitting();

    rsx! {
        input {
            style: INPUT_STYLE,
            r#type: input_type,
            placeholder: placeholder,
            value: "{value}",
            disabled: submitting,
            oninput: move |event| binder.write().set_field(field, json!(event.value())),
        }
    }
}

/// Dropdown bound to a foreign-key field; the draft stores the numeric id.
fn record_choice<C: Collection>(
    mut binder: Signal<FormBinder<C>>,
    field: &'static str,
    label: &'static str,
    options: Vec<DropdownOption>,
    open_dropdown: Signal<Option<&'static str>>,
) -> Element {
    let selected = Some(draft_text(&binder, field)).filter(|value| !value.is_empty());

    rsx! {
        DropdownSelect {
            id: field,
            label: label,
            options: options,
            selected: selected,
            open_dropdown: open_dropdown,
            on_select: move |value: String| {
                let id = value.parse::<i64>().map(|id| json!(id)).unwrap_or(Value::Null);
                binder.write().set_field(field, id);
            },
        }
    }
}

fn form_controls<C: Collection>(
    mut binder: Signal<FormBinder<C>>,
    presenter: Signal<TablePresenter<C>>,
    state: AppState,
    client: ApiClient<ReqwestTransport>,
    describe: fn(&C) -> String,
) -> Element {
    let submitting = binder.read().is_submitting();

    rsx! {
        button {
            style: BUTTON_STYLE,
            disabled: submitting,
            onclick: move |_| submit_form(binder, presenter, state, client.clone(), describe),
            if submitting { "Saving..." } else { "Save" }
        }
        button {
            style: BUTTON_STYLE,
            disabled: submitting,
            onclick: move |_| binder.write().start_new(),
            "New"
        }
    }
}

fn form_heading<C: Collection>(binder: &Signal<FormBinder<C>>, create: &str, update: &str) -> String {
    if binder.read().bound_key().is_some() {
        update.to_string()
    } else {
        create.to_string()
    }
}

fn form_error<C: Collection>(binder: &Signal<FormBinder<C>>) -> Element {
    let error = binder.read().last_error().map(str::to_string);
    rsx! {
        if let Some(error) = error {
            p { style: ERROR_STYLE, "{error}" }
        }
    }
}

fn start_edit_or_report<C: Collection>(
    mut binder: Signal<FormBinder<C>>,
    mut state: AppState,
    record: &C,
) -> bool {
    match binder.write().start_edit(record) {
        Ok(()) => true,
        Err(err) => {
            state.status.set(format!("Cannot edit {}: {err}", C::LABEL));
            false
        }
    }
}

fn child_names(children: &[Child]) -> String {
    children
        .iter()
        .map(Child::full_name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[component]
fn ClassroomsScreen() -> Element {
    let ctx = use_context::<AppContext>();
    let state = use_context::<AppState>();
    let endpoint = ctx.client.collection_endpoint::<Classroom>(&ctx.config.centre);
    let presenter = use_signal(|| TablePresenter::<Classroom>::new(endpoint));
    let mut binder = use_signal(FormBinder::<Classroom>::new);

    let client_for_init = ctx.client.clone();
    use_hook(move || load_list(presenter, None, state, client_for_init));

    let client_for_page = ctx.client.clone();
    let on_page = use_callback(move |page: u32| {
        load_list(presenter, Some(page), state, client_for_page.clone())
    });
    let on_edit = use_callback(move |record: Classroom| {
        start_edit_or_report(binder, state, &record);
    });

    let capacity = draft_text(&binder, "capacity");
    let submitting = binder.read().is_submitting();
    let heading = form_heading(&binder, "Add classroom", "Update classroom");
    let client_for_refresh = ctx.client.clone();

    rsx! {
        div {
            style: TOOLBAR_STYLE,
            {search_box(presenter, "name", "Search classrooms")}
            button {
                style: BUTTON_STYLE,
                onclick: move |_| load_list(presenter, None, state, client_for_refresh.clone()),
                "Refresh"
            }
            {export_buttons(presenter, state)}
        }
        {record_table(presenter, on_page, vec![("Edit", on_edit)])}
        div {
            style: TOOLBAR_STYLE,
            strong { "{heading}" }
            {text_input(binder, "name", "Classroom name", "text")}
            input {
                style: INPUT_STYLE,
                r#type: "number",
                min: "0",
                placeholder: "Max capacity",
                value: "{capacity}",
                disabled: submitting,
                oninput: move |event| {
                    let value = match event.value().trim().parse::<u32>() {
                        Ok(capacity) => json!(capacity),
                        Err(_) => Value::Null,
                    };
                    binder.write().set_field("capacity", value);
                },
            }
            {form_controls(binder, presenter, state, ctx.client.clone(), |classroom: &Classroom| {
                format!("classroom {}", classroom.name)
            })}
        }
        {form_error(&binder)}
    }
}

#[component]
fn ChildrenScreen() -> Element {
    let ctx = use_context::<AppContext>();
    let mut state = use_context::<AppState>();
    let endpoint = ctx.client.collection_endpoint::<Child>(&ctx.config.centre);
    let presenter = use_signal(|| TablePresenter::<Child>::new(endpoint));
    let mut binder = use_signal(FormBinder::<Child>::new);
    let mut classroom_choices = use_signal(Vec::<DropdownOption>::new);
    let mut family_choices = use_signal(Vec::<DropdownOption>::new);
    let mut siblings = use_signal(Vec::<Child>::new);
    let open_dropdown = use_signal(|| None::<&'static str>);

    let client_for_init = ctx.client.clone();
    use_hook(move || load_list(presenter, None, state, client_for_init));
    let reference_for_options = ctx.reference();
    use_hook(move || {
        spawn(async move {
            match reference_for_options.classroom_options().await {
                Ok(options) => classroom_choices.set(options),
                Err(err) => state.status.set(format!("Failed to load classrooms: {err}")),
            }
            match reference_for_options.family_options().await {
                Ok(options) => family_choices.set(options),
                Err(err) => state.status.set(format!("Failed to load families: {err}")),
            }
        })
    });

    let client_for_page = ctx.client.clone();
    let on_page = use_callback(move |page: u32| {
        load_list(presenter, Some(page), state, client_for_page.clone())
    });

    let existing_family = binder.read().draft().flag("existing_family");
    let submitting = binder.read().is_submitting();
    let selected_family = Some(draft_text(&binder, "family")).filter(|value| !value.is_empty());
    let sibling_names = child_names(&siblings.read());
    let ctx_for_family = ctx.clone();

    rsx! {
        div {
            style: TOOLBAR_STYLE,
            {search_box(presenter, "full_name", "Search children")}
            {export_buttons(presenter, state)}
        }
        {record_table(presenter, on_page, Vec::new())}
        div {
            style: TOOLBAR_STYLE,
            strong { "Add child" }
            {text_input(binder, "first_name", "First name", "text")}
            {text_input(binder, "last_name", "Last name", "text")}
            {text_input(binder, "date_of_birth", "Date of birth", "date")}
            {record_choice(binder, "classroom", "Classroom", classroom_choices(), open_dropdown)}
            label {
                input {
                    r#type: "checkbox",
                    checked: existing_family,
                    disabled: submitting,
                    onchange: move |event| {
                        binder.write().set_field("existing_family", json!(event.checked()));
                        if !event.checked() {
                            siblings.set(Vec::new());
                        }
                    },
                }
                " Existing family"
            }
            if existing_family {
                DropdownSelect {
                    id: "family",
                    label: "Family",
                    options: family_choices(),
                    selected: selected_family,
                    open_dropdown: open_dropdown,
                    on_select: move |value: String| {
                        let Ok(family_id) = value.parse::<i64>() else {
                            return;
                        };
                        binder.write().set_field("family", json!(family_id));
                        let reference = ctx_for_family.reference();
                        spawn(async move {
                            match reference.active_children_of_family(family_id).await {
                                Ok(children) => siblings.set(children),
                                Err(err) => state.status.set(format!("Failed to load family: {err}")),
                            }
                        });
                    },
                }
            }
            {form_controls(binder, presenter, state, ctx.client.clone(), |child: &Child| {
                format!("child {}", child.full_name())
            })}
        }
        if existing_family && !sibling_names.is_empty() {
            p { "Active children in this family: {sibling_names}" }
        }
        {form_error(&binder)}
    }
}

#[component]
fn FamiliesScreen() -> Element {
    let ctx = use_context::<AppContext>();
    let mut state = use_context::<AppState>();
    let endpoint = ctx.client.collection_endpoint::<Family>(&ctx.config.centre);
    let presenter = use_signal(|| TablePresenter::<Family>::new(endpoint));
    let binder = use_signal(FormBinder::<Family>::new);
    let mut members = use_signal(Vec::<Child>::new);

    let client_for_init = ctx.client.clone();
    use_hook(move || load_list(presenter, None, state, client_for_init));
    let client_for_page = ctx.client.clone();
    let on_page = use_callback(move |page: u32| {
        load_list(presenter, Some(page), state, client_for_page.clone())
    });

    let ctx_for_edit = ctx.clone();
    let on_edit = use_callback(move |record: Family| {
        if !start_edit_or_report(binder, state, &record) {
            return;
        }
        members.set(Vec::new());
        let reference = ctx_for_edit.reference();
        spawn(async move {
            match reference.active_children_of_family(record.id).await {
                Ok(children) => members.set(children),
                Err(err) => state.status.set(format!("Failed to load children: {err}")),
            }
        });
    });

    let heading = form_heading(&binder, "Add family", "Edit family");
    let member_names = child_names(&members.read());
    let editing = binder.read().bound_key().is_some();

    rsx! {
        div {
            style: TOOLBAR_STYLE,
            {search_box(presenter, "parent_1_name", "Search families")}
            {export_buttons(presenter, state)}
        }
        {record_table(presenter, on_page, vec![("Edit", on_edit)])}
        div {
            style: TOOLBAR_STYLE,
            strong { "{heading}" }
            {text_input(binder, "parent_1_name", "Parent 1 name", "text")}
            {text_input(binder, "parent_1_phone", "Parent 1 phone", "tel")}
            {text_input(binder, "parent_1_email", "Parent 1 email", "email")}
            {text_input(binder, "parent_2_name", "Parent 2 name", "text")}
            {text_input(binder, "address", "Address", "text")}
            {form_controls(binder, presenter, state, ctx.client.clone(), |family: &Family| {
                format!("family {}", family.parent_1_name)
            })}
        }
        if editing {
            p {
                if member_names.is_empty() {
                    "No active children"
                } else {
                    "Active children: {member_names}"
                }
            }
        }
        {form_error(&binder)}
    }
}

#[component]
fn AccountsScreen() -> Element {
    let ctx = use_context::<AppContext>();
    let state = use_context::<AppState>();
    let endpoint = ctx.client.collection_endpoint::<Account>(&ctx.config.centre);
    let mut presenter = use_signal(|| TablePresenter::<Account>::new(endpoint));
    let open_dropdown = use_signal(|| None::<&'static str>);

    let reference_for_init = ctx.reference();
    use_hook(move || {
        request_page(presenter, None, state, move |request| async move {
            reference_for_init.accounts_page(request.page_number).await
        })
    });

    let ctx_for_page = ctx.clone();
    let on_page = use_callback(move |page: u32| {
        let reference = ctx_for_page.reference();
        request_page(presenter, Some(page), state, move |request| async move {
            reference.accounts_page(request.page_number).await
        })
    });

    let type_options = labelled_options(ACCOUNT_TYPES, "All types");
    let status_options = vec![
        DropdownOption {
            value: String::new(),
            label: "All".to_string(),
        },
        DropdownOption {
            value: "active".to_string(),
            label: "Active".to_string(),
        },
        DropdownOption {
            value: "inactive".to_string(),
            label: "Inactive".to_string(),
        },
    ];
    let selected_type = category_value(&presenter);
    let selected_status = presenter
        .read()
        .filter()
        .status
        .as_ref()
        .map(|status| if status.value { "active" } else { "inactive" }.to_string())
        .or_else(|| Some(String::new()));

    rsx! {
        div {
            style: TOOLBAR_STYLE,
            {search_box(presenter, "account_name", "Search accounts")}
            DropdownSelect {
                id: "account_type",
                label: "Type",
                options: type_options,
                selected: selected_type,
                open_dropdown: open_dropdown,
                on_select: move |value: String| {
                    let filter = presenter.read().filter().clone().category("account_type", value);
                    presenter.write().set_filter(filter);
                },
            }
            DropdownSelect {
                id: "account_status",
                label: "Status",
                options: status_options,
                selected: selected_status,
                open_dropdown: open_dropdown,
                on_select: move |value: String| {
                    let mut filter = presenter.read().filter().clone();
                    filter = match value.as_str() {
                        "active" => filter.status("is_active", true),
                        "inactive" => filter.status("is_active", false),
                        _ => {
                            filter.status = None;
                            filter
                        }
                    };
                    presenter.write().set_filter(filter);
                },
            }
            {export_buttons(presenter, state)}
        }
        {record_table(presenter, on_page, Vec::new())}
    }
}

#[component]
fn TransitionsScreen() -> Element {
    let ctx = use_context::<AppContext>();
    let state = use_context::<AppState>();
    let endpoint = ctx.client.collection_endpoint::<Transition>(&ctx.config.centre);
    let presenter = use_signal(|| TablePresenter::<Transition>::new(endpoint));

    let client_for_init = ctx.client.clone();
    use_hook(move || load_list(presenter, None, state, client_for_init));
    let client_for_page = ctx.client.clone();
    let on_page = use_callback(move |page: u32| {
        load_list(presenter, Some(page), state, client_for_page.clone())
    });

    rsx! {
        div {
            style: TOOLBAR_STYLE,
            {search_box(presenter, "child_name", "Search by child")}
            {export_buttons(presenter, state)}
        }
        {record_table(presenter, on_page, Vec::new())}
    }
}

#[component]
fn WithdrawalsScreen() -> Element {
    let ctx = use_context::<AppContext>();
    let mut state = use_context::<AppState>();
    let endpoint = ctx.client.collection_endpoint::<Withdrawal>(&ctx.config.centre);
    let mut presenter = use_signal(|| TablePresenter::<Withdrawal>::new(endpoint));
    let mut binder = use_signal(FormBinder::<Withdrawal>::new);
    let mut deletes = use_signal(DeleteTracker::default);
    let mut child_choices = use_signal(Vec::<DropdownOption>::new);
    let open_dropdown = use_signal(|| None::<&'static str>);

    let client_for_init = ctx.client.clone();
    use_hook(move || load_list(presenter, None, state, client_for_init));
    let reference_for_children = ctx.reference();
    use_hook(move || {
        spawn(async move {
            match reference_for_children.child_options().await {
                Ok(options) => child_choices.set(options),
                Err(err) => state.status.set(format!("Failed to load children: {err}")),
            }
        })
    });
    let client_for_page = ctx.client.clone();
    let on_page = use_callback(move |page: u32| {
        load_list(presenter, Some(page), state, client_for_page.clone())
    });

    let on_edit = use_callback(move |record: Withdrawal| {
        start_edit_or_report(binder, state, &record);
    });

    let client_for_delete = ctx.client.clone();
    let on_delete = use_callback(move |record: Withdrawal| {
        let start = deletes
            .write()
            .begin(&record.id(), |id| platform::confirm_delete(Withdrawal::LABEL, id));
        let id = match start {
            DeleteStart::Send(id) => id,
            DeleteStart::Skipped(DeleteOutcome::InFlight) => {
                state.status.set(format!("Withdrawal {} is already being deleted", record.id()));
                return;
            }
            DeleteStart::Skipped(_) => {
                state.status.set("Delete cancelled".to_string());
                return;
            }
        };
        let client = client_for_delete.clone();
        spawn(async move {
            let outcome = client.delete::<Withdrawal>(&id).await;
            let result = {
                let mut table = presenter.write();
                deletes.write().finish(&id, outcome, table.records_mut())
            };
            match result {
                Ok(_) => state.status.set(format!("Deleted withdrawal {id}")),
                Err(err) => state.status.set(format!("Delete failed: {err}")),
            }
        });
    });

    let status_choices: Vec<DropdownOption> = WITHDRAWAL_STATUSES
        .iter()
        .map(|(value, label)| DropdownOption {
            value: value.to_string(),
            label: label.to_string(),
        })
        .collect();
    let status_filter_options = std::iter::once(DropdownOption {
        value: String::new(),
        label: "All statuses".to_string(),
    })
    .chain(status_choices.iter().cloned())
    .collect::<Vec<_>>();
    let selected_status = category_value(&presenter);
    let draft_status = Some(draft_text(&binder, "status")).filter(|value| !value.is_empty());
    let heading = form_heading(&binder, "Record withdrawal", "Update withdrawal");

    rsx! {
        div {
            style: TOOLBAR_STYLE,
            {search_box(presenter, "child_name", "Search by child")}
            DropdownSelect {
                id: "withdrawal_status",
                label: "Status",
                options: status_filter_options,
                selected: selected_status,
                open_dropdown: open_dropdown,
                on_select: move |value: String| {
                    let filter = presenter.read().filter().clone().category("status", value);
                    presenter.write().set_filter(filter);
                },
            }
            {export_buttons(presenter, state)}
        }
        {record_table(presenter, on_page, vec![("Edit", on_edit), ("Delete", on_delete)])}
        div {
            style: TOOLBAR_STYLE,
            strong { "{heading}" }
            {record_choice(binder, "child", "Child", child_choices(), open_dropdown)}
            {text_input(binder, "withdrawal_date", "Withdrawal date", "date")}
            {text_input(binder, "withdrawal_reason", "Reason", "text")}
            DropdownSelect {
                id: "withdrawal_form_status",
                label: "Outcome",
                options: status_choices,
                selected: draft_status,
                open_dropdown: open_dropdown,
                on_select: move |value: String| binder.write().set_field("status", json!(value)),
            }
            {text_input(binder, "notes", "Notes", "text")}
            {form_controls(binder, presenter, state, ctx.client.clone(), |withdrawal: &Withdrawal| {
                format!("withdrawal {}", withdrawal.id)
            })}
        }
        {form_error(&binder)}
    }
}

#[component]
fn LedgerScreen() -> Element {
    let ctx = use_context::<AppContext>();
    let mut state = use_context::<AppState>();
    let endpoint = ctx.client.collection_endpoint::<LedgerLine>(&ctx.config.centre);
    let presenter = use_signal(|| TablePresenter::<LedgerLine>::new(endpoint));
    let mut account_options = use_signal(Vec::<DropdownOption>::new);
    let mut selected_account = use_signal(|| None::<String>);
    let mut start_date = use_signal(String::new);
    let mut end_date = use_signal(String::new);
    let mut loaded_query = use_signal(|| None::<LedgerQuery>);
    let open_dropdown = use_signal(|| None::<&'static str>);

    let reference_for_options = ctx.reference();
    use_hook(move || {
        spawn(async move {
            match reference_for_options.account_options().await {
                Ok(options) => account_options.set(options),
                Err(err) => state.status.set(format!("Failed to load accounts: {err}")),
            }
        })
    });

    let ctx_for_load = ctx.clone();
    let load = move |_: MouseEvent| {
        let Some(account_id) = selected_account().and_then(|value| value.parse::<i64>().ok()) else {
            state.status.set("Select an account first".to_string());
            return;
        };
        let query = LedgerQuery {
            account_id,
            centre_id: ctx_for_load.config.centre.id,
            start_date: Some(start_date()).filter(|date| !date.is_empty()),
            end_date: Some(end_date()).filter(|date| !date.is_empty()),
        };
        loaded_query.set(Some(query.clone()));
        let reference = ctx_for_load.reference();
        request_page(presenter, None, state, move |_| async move {
            reference.ledger(&query).await.map(Page::single)
        });
    };

    let prepared_by = ctx.config.prepared_by.clone();
    let export = move |_: MouseEvent| {
        let Some(query) = loaded_query() else {
            state.status.set("Load a ledger before exporting".to_string());
            return;
        };
        let centre_name = state.centre_name.read().clone();
        let today = Local::now().date_naive();
        let account_label = dropdown_label(&account_options.read(), selected_account().as_deref());
        let header = ledger_header_lines(
            &centre_name,
            &query,
            &today.format("%Y-%m-%d").to_string(),
            &prepared_by,
        );
        let visible = presenter.read().visible_records();
        let result = ExportJob::new(
            &visible,
            LedgerLine::columns(),
            ExportFormat::Document,
            LedgerLine::LABEL,
            centre_name.as_str(),
            today,
        )
        .with_title(format!("General Ledger - {account_label}"))
        .with_subtitle_lines(header)
        .with_filename(query.export_filename())
        .render()
        .and_then(|artifact| platform::save_artifact(&artifact));
        match result {
            Ok(Some(path)) => state.status.set(format!("Exported {}", path.display())),
            Ok(None) => state.status.set("Export cancelled".to_string()),
            Err(err) => state.status.set(format!("Export failed: {err:#}")),
        }
    };

    let on_page = use_callback(|_: u32| {});
    let start = start_date();
    let end = end_date();

    rsx! {
        div {
            style: TOOLBAR_STYLE,
            DropdownSelect {
                id: "ledger_account",
                label: "Account",
                options: account_options(),
                selected: selected_account(),
                open_dropdown: open_dropdown,
                on_select: move |value: String| selected_account.set(Some(value)),
            }
            span { "From" }
            input {
                style: INPUT_STYLE,
                r#type: "date",
                value: "{start}",
                oninput: move |event| start_date.set(event.value()),
            }
            span { "To" }
            input {
                style: INPUT_STYLE,
                r#type: "date",
                value: "{end}",
                oninput: move |event| end_date.set(event.value()),
            }
            button { style: BUTTON_STYLE, onclick: load, "Load ledger" }
            button { style: BUTTON_STYLE, onclick: export, "Export PDF" }
        }
        {record_table(presenter, on_page, Vec::new())}
    }
}
