use cases_core::capabilities::{RpcError, TimerOperation, TimerOutput};
use cases_core::config::StartupSettings;
use cases_core::list::{CreateCaseField, ListBody};
use cases_core::model::{Case, CaseId, CaseStatus, CasesResponse, ScreenKind, StatusFilter, UnixTimeMs};
use cases_core::{App, Effect, Event, Model, ScreenView};
use crux_core::testing::AppTester;
use serde_json::{json, Value};

const CALLBACK_URL: &str = "https://evidences/triggerServerCallback";

fn sample_case(id: u64, number: &str, title: &str) -> Case {
    Case {
        id: CaseId(id),
        case_number: number.into(),
        title: title.into(),
        description: String::new(),
        status: CaseStatus::Open,
        created_by: "Officer Vale".into(),
        assigned_to: String::new(),
        created_at: UnixTimeMs(1_700_000_000_000),
        updated_at: UnixTimeMs(1_700_000_000_000),
    }
}

fn page_of(cases: Vec<Case>, current_page: u32, max_pages: u32) -> CasesResponse {
    CasesResponse {
        total: cases.len() as u64,
        cases,
        max_pages,
        current_page,
    }
}

/// Every server callback in `effects`, as `(url, envelope)`.
fn rpc_calls(effects: &[Effect]) -> Vec<(String, Value)> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some((
                request.operation.url.clone(),
                serde_json::from_slice(&request.operation.body).unwrap(),
            )),
            _ => None,
        })
        .collect()
}

fn started(app: &AppTester<App, Effect>, model: &mut Model) -> Vec<(String, Value)> {
    let update = app.update(Event::Started(StartupSettings::new("https://evidences")), model);
    rpc_calls(&update.effects)
}

fn answer_cases(app: &AppTester<App, Effect>, model: &mut Model, response: CasesResponse) {
    let seq = model.list_request_seq;
    app.update(
        Event::CasesLoaded {
            seq,
            result: Ok(response),
        },
        model,
    );
}

fn list_view(app: &AppTester<App, Effect>, model: &Model) -> cases_core::list::CasesListView {
    match app.view(model).screen {
        ScreenView::List(view) => view,
        ScreenView::Detail(_) => panic!("expected list screen"),
    }
}

#[test]
fn test_start_fetches_first_page() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let calls = started(&app, &mut model);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, CALLBACK_URL);
    assert_eq!(
        calls[0].1,
        json!({
            "name": "evidences:getCases",
            "arguments": { "search": "", "status": "all", "page": 1, "limit": 10 }
        })
    );
    assert!(model.loading);

    let request = {
        let update = app.update(Event::BackToList, &mut model);
        update
            .effects
            .into_iter()
            .find_map(|effect| match effect {
                Effect::Http(request) => Some(request),
                _ => None,
            })
            .unwrap()
    };
    assert_eq!(request.operation.method, "POST");
    assert!(request.operation.headers.iter().any(|h| {
        h.name.eq_ignore_ascii_case("content-type") && h.value == "application/json; charset=UTF-8"
    }));
}

#[test]
fn test_invalid_endpoint_sets_error_without_request() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::Started(StartupSettings::new("ftp://evidences")),
        &mut model,
    );
    assert!(rpc_calls(&update.effects).is_empty());
    assert!(model.error);
    assert!(!model.loading);
    assert_eq!(list_view(&app, &model).body, ListBody::Error);
}

#[test]
fn test_rejected_settings_block_later_callbacks() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(
        Event::Started(StartupSettings::new("https://evidences").page_size(0)),
        &mut model,
    );
    assert!(model.config_error.is_some());

    let update = app.update(
        Event::StatusFilterChanged(StatusFilter::Only(CaseStatus::Open)),
        &mut model,
    );
    assert!(rpc_calls(&update.effects).is_empty());
    assert!(model.error);

    let update = app.update(Event::CaseSelected(sample_case(9, "C-9", "Arson")), &mut model);
    assert!(rpc_calls(&update.effects).is_empty());
    assert!(model.detail().is_some_and(|detail| !detail.loading));

    let update = app.update(Event::BackToList, &mut model);
    assert!(rpc_calls(&update.effects).is_empty());

    // A later valid start recovers.
    let update = app.update(Event::Started(StartupSettings::new("https://evidences")), &mut model);
    assert_eq!(rpc_calls(&update.effects).len(), 1);
    assert!(model.config_error.is_none());
}

#[test]
fn test_startup_settings_shape_requests() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::Started(
            StartupSettings::new("http://127.0.0.1:13172")
                .page_size(25)
                .search_debounce_ms(300),
        ),
        &mut model,
    );
    let calls = rpc_calls(&update.effects);
    assert_eq!(calls[0].0, "http://127.0.0.1:13172/triggerServerCallback");
    assert_eq!(calls[0].1["arguments"]["limit"], 25);

    let update = app.update(Event::SearchTextChanged("arson".into()), &mut model);
    let timer = update
        .effects
        .iter()
        .find_map(|effect| match effect {
            Effect::Timer(request) => Some(request.operation),
            _ => None,
        })
        .unwrap();
    assert_eq!(timer, TimerOperation::NotifyAfter { millis: 300 });
}

#[test]
fn test_loaded_page_renders_rows_and_pagination() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    started(&app, &mut model);

    answer_cases(
        &app,
        &mut model,
        page_of(vec![sample_case(1, "C-1", "Burglary")], 1, 3),
    );

    assert!(!model.loading);
    assert_eq!(model.max_pages, 3);
    let view = list_view(&app, &model);
    match view.body {
        ListBody::Rows { rows } => assert_eq!(rows[0].case.case_number, "C-1"),
        other => panic!("expected rows, got {other:?}"),
    }
    let pagination = view.pagination.unwrap();
    assert!(!pagination.previous_enabled);
    assert!(pagination.next_enabled);
}

#[test]
fn test_fetch_failure_sets_error_and_hides_list() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    started(&app, &mut model);

    let seq = model.list_request_seq;
    app.update(
        Event::CasesLoaded {
            seq,
            result: Err(RpcError::Status {
                operation: "evidences:getCases".into(),
                status: 500,
            }),
        },
        &mut model,
    );

    assert!(model.error);
    assert!(!model.loading);
    let view = list_view(&app, &model);
    assert_eq!(view.body, ListBody::Error);
    assert!(view.pagination.is_none());
}

#[test]
fn test_search_is_debounced() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    started(&app, &mut model);
    answer_cases(&app, &mut model, page_of(vec![], 1, 1));

    let update = app.update(Event::SearchTextChanged("rob".into()), &mut model);
    assert!(rpc_calls(&update.effects).is_empty());
    assert!(update
        .effects
        .iter()
        .any(|effect| matches!(effect, Effect::Timer(_))));

    app.update(Event::SearchTextChanged("robbery".into()), &mut model);
    assert_eq!(model.search_text, "robbery");
    assert_eq!(model.search_debounced, "");

    // The first timer fires while typing is still going on.
    let update = app.update(Event::SearchSettled { generation: 1 }, &mut model);
    assert!(rpc_calls(&update.effects).is_empty());

    let update = app.update(Event::SearchSettled { generation: 2 }, &mut model);
    let calls = rpc_calls(&update.effects);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1["arguments"]["search"], "robbery");
    assert_eq!(model.search_debounced, "robbery");
}

#[test]
fn test_debounce_timer_resolves_into_one_fetch() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    started(&app, &mut model);
    answer_cases(&app, &mut model, page_of(vec![], 1, 1));

    let update = app.update(Event::SearchTextChanged("arson".into()), &mut model);
    let mut timer = update
        .effects
        .into_iter()
        .find_map(|effect| match effect {
            Effect::Timer(request) => Some(request),
            _ => None,
        })
        .unwrap();
    assert_eq!(timer.operation, TimerOperation::NotifyAfter { millis: 750 });

    let fired = app.resolve(&mut timer, TimerOutput::Elapsed).unwrap();
    let mut calls = Vec::new();
    for event in fired.events {
        calls.extend(rpc_calls(&app.update(event, &mut model).effects));
    }
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1["arguments"]["search"], "arson");
    assert_eq!(model.search_debounced, "arson");
}

#[test]
fn test_settling_on_same_text_does_not_refetch() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    started(&app, &mut model);

    app.update(Event::SearchTextChanged("a".into()), &mut model);
    app.update(Event::SearchTextChanged(String::new()), &mut model);
    let update = app.update(Event::SearchSettled { generation: 2 }, &mut model);
    assert!(rpc_calls(&update.effects).is_empty());
}

#[test]
fn test_filter_and_page_changes_fetch() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    started(&app, &mut model);
    answer_cases(&app, &mut model, page_of(vec![], 1, 3));

    let update = app.update(
        Event::StatusFilterChanged(StatusFilter::Only(CaseStatus::Closed)),
        &mut model,
    );
    let calls = rpc_calls(&update.effects);
    assert_eq!(calls[0].1["arguments"]["status"], "closed");
    answer_cases(&app, &mut model, page_of(vec![], 1, 3));

    let update = app.update(
        Event::StatusFilterChanged(StatusFilter::Only(CaseStatus::Closed)),
        &mut model,
    );
    assert!(rpc_calls(&update.effects).is_empty());

    let update = app.update(Event::PageChanged(2), &mut model);
    let calls = rpc_calls(&update.effects);
    assert_eq!(calls[0].1["arguments"]["page"], 2);
    assert_eq!(calls[0].1["arguments"]["status"], "closed");
}

#[test]
fn test_out_of_range_page_is_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    started(&app, &mut model);
    answer_cases(&app, &mut model, page_of(vec![], 1, 2));

    for page in [0, 3, 1] {
        let update = app.update(Event::PageChanged(page), &mut model);
        assert!(rpc_calls(&update.effects).is_empty(), "page {page}");
    }
    assert_eq!(model.page, 1);
}

#[test]
fn test_stale_list_reply_is_dropped() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    started(&app, &mut model);
    let first = model.list_request_seq;
    answer_cases(&app, &mut model, page_of(vec![], 1, 2));

    app.update(Event::PageChanged(2), &mut model);
    app.update(
        Event::CasesLoaded {
            seq: first,
            result: Ok(page_of(vec![sample_case(9, "C-9", "Old")], 1, 2)),
        },
        &mut model,
    );
    assert!(model.loading);

    answer_cases(
        &app,
        &mut model,
        page_of(vec![sample_case(10, "C-10", "New")], 2, 2),
    );
    let data = model.data.as_ref().unwrap();
    assert_eq!(data.cases[0].id, CaseId(10));
}

#[test]
fn test_create_case_success_resets_form_and_reloads() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    started(&app, &mut model);
    answer_cases(&app, &mut model, page_of(vec![], 1, 1));

    app.update(Event::CreateCaseOpened, &mut model);
    let update = app.update(Event::CreateCaseSubmitted, &mut model);
    assert!(rpc_calls(&update.effects).is_empty());

    app.update(
        Event::CreateCaseFieldChanged(CreateCaseField::CaseNumber("C-1001".into())),
        &mut model,
    );
    app.update(
        Event::CreateCaseFieldChanged(CreateCaseField::Title("Robbery".into())),
        &mut model,
    );
    assert!(list_view(&app, &model).create_modal.unwrap().can_submit);

    let update = app.update(Event::CreateCaseSubmitted, &mut model);
    let calls = rpc_calls(&update.effects);
    assert_eq!(
        calls[0].1,
        json!({
            "name": "evidences:createCase",
            "arguments": {
                "caseNumber": "C-1001",
                "title": "Robbery",
                "description": "",
                "assignedTo": ""
            }
        })
    );

    let trigger = model.reload_trigger;
    let update = app.update(Event::CaseCreated { result: Ok(()) }, &mut model);
    let calls = rpc_calls(&update.effects);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1["name"], "evidences:getCases");
    assert_eq!(calls[0].1["arguments"]["page"], 1);
    assert_eq!(model.reload_trigger, trigger + 1);
    assert!(list_view(&app, &model).create_modal.is_none());

    answer_cases(
        &app,
        &mut model,
        page_of(vec![sample_case(77, "C-1001", "Robbery")], 1, 1),
    );
    match list_view(&app, &model).body {
        ListBody::Rows { rows } => assert_eq!(rows[0].case.case_number, "C-1001"),
        other => panic!("expected rows, got {other:?}"),
    }

    app.update(Event::CreateCaseOpened, &mut model);
    let modal = list_view(&app, &model).create_modal.unwrap();
    assert!(modal.form.case_number.is_empty());
}

#[test]
fn test_create_case_failure_keeps_modal() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    started(&app, &mut model);
    answer_cases(&app, &mut model, page_of(vec![], 1, 1));

    app.update(Event::CreateCaseOpened, &mut model);
    app.update(
        Event::CreateCaseFieldChanged(CreateCaseField::CaseNumber("C-2".into())),
        &mut model,
    );
    app.update(
        Event::CreateCaseFieldChanged(CreateCaseField::Title("Arson".into())),
        &mut model,
    );
    app.update(Event::CreateCaseSubmitted, &mut model);

    let update = app.update(
        Event::CaseCreated {
            result: Err(RpcError::Transport {
                operation: "evidences:createCase".into(),
                message: "connection reset".into(),
            }),
        },
        &mut model,
    );
    assert!(rpc_calls(&update.effects).is_empty());
    let modal = list_view(&app, &model).create_modal.unwrap();
    assert_eq!(modal.form.title, "Arson");
}

#[test]
fn test_cancel_keeps_typed_values() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::CreateCaseOpened, &mut model);
    app.update(
        Event::CreateCaseFieldChanged(CreateCaseField::Description("draft".into())),
        &mut model,
    );
    app.update(Event::CreateCaseClosed, &mut model);
    app.update(Event::CreateCaseOpened, &mut model);

    let modal = list_view(&app, &model).create_modal.unwrap();
    assert_eq!(modal.form.description, "draft");
}

#[test]
fn test_delete_reloads_list() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    started(&app, &mut model);
    answer_cases(&app, &mut model, page_of(vec![sample_case(5, "C-5", "X")], 1, 1));

    let update = app.update(
        Event::DeleteCaseRequested {
            case_id: CaseId(5),
        },
        &mut model,
    );
    let calls = rpc_calls(&update.effects);
    assert_eq!(
        calls[0].1,
        json!({ "name": "evidences:deleteCase", "arguments": { "caseId": 5 } })
    );

    let update = app.update(
        Event::CaseDeleted {
            case_id: CaseId(5),
            result: Ok(()),
        },
        &mut model,
    );
    assert_eq!(rpc_calls(&update.effects)[0].1["name"], "evidences:getCases");
}

#[test]
fn test_select_then_back_reloads_with_same_query() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    started(&app, &mut model);
    answer_cases(&app, &mut model, page_of(vec![], 1, 3));
    app.update(Event::PageChanged(3), &mut model);
    answer_cases(&app, &mut model, page_of(vec![sample_case(8, "C-8", "Y")], 3, 3));

    let update = app.update(Event::CaseSelected(sample_case(8, "C-8", "Y")), &mut model);
    assert_eq!(model.screen.kind(), ScreenKind::Detail);
    assert!(rpc_calls(&update.effects)
        .iter()
        .all(|(_, body)| body["name"] != "evidences:getCases"));

    let trigger = model.reload_trigger;
    let update = app.update(Event::BackToList, &mut model);
    assert_eq!(model.screen.kind(), ScreenKind::List);
    assert!(model.selected_case().is_none());
    assert_eq!(model.reload_trigger, trigger + 1);

    let calls = rpc_calls(&update.effects);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1["arguments"]["page"], 3);
}
