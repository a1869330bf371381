//! Headless core for the laptop "Cases" screen.
//!
//! The shell feeds [`Event`]s in and draws the [`ViewModel`] that comes out.
//! All server access goes through one HTTP callback bridge (see
//! [`capabilities::http`]).

pub mod api;
pub mod capabilities;
pub mod config;
pub mod detail;
pub mod event;
pub mod list;
pub mod model;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::Model;

pub const DEFAULT_ENDPOINT_HOST: &str = "evidences";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const FIRST_PAGE: u32 = 1;
pub const BIOMETRIC_SEARCH_PAGE: u32 = 1;
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(750);

#[must_use]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

// --- View model ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ScreenView {
    List(list::CasesListView),
    Detail(detail::CaseDetailView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub screen: ScreenView,
}

pub mod app {
    use serde::Serialize;
    use tracing::{debug, info, warn};

    use super::*;
    use crate::api::{
        AddCaseNoteArgs, BiometricSearchResponse, CaseRefArgs, GetCasesArgs, RemoveEvidenceArgs,
        ServerCallback,
    };
    use crate::capabilities::{RpcClient, RpcError, RpcResult};
    use crate::config::CasesConfig;
    use crate::detail::{build_detail_view, DetailState, EvidenceModal};
    use crate::list::{build_list_view, ListScreen};
    use crate::model::{CaseId, CasesResponse, Screen, UnixTimeMs};

    #[derive(Default)]
    pub struct App;

    impl App {
        fn rpc<'a>(model: &Model, caps: &'a Capabilities) -> RpcResult<RpcClient<'a, Event>> {
            match &model.config_error {
                Some(e) => Err(RpcError::NoEndpoint {
                    reason: e.to_string(),
                }),
                None => Ok(RpcClient::new(&caps.http, model.config.endpoint())),
            }
        }

        fn send_command<A, F>(
            model: &Model,
            caps: &Capabilities,
            callback: ServerCallback,
            arguments: &A,
            on_reply: F,
        ) where
            A: Serialize,
            F: FnOnce(RpcResult<()>) -> Event + Send + 'static,
        {
            let sent =
                Self::rpc(model, caps).and_then(|rpc| rpc.command(callback, arguments, on_reply));
            if let Err(e) = sent {
                warn!(operation = callback.name(), error = %e, "could not send server callback");
            }
        }

        fn send_cases_request(model: &mut Model, caps: &Capabilities) {
            model.loading = true;
            model.error = false;
            model.list_request_seq += 1;

            let seq = model.list_request_seq;
            let args = GetCasesArgs {
                search: model.search_debounced.clone(),
                status: model.status_filter,
                page: model.page,
                limit: model.config.page_size(),
            };

            let sent = Self::rpc(model, caps).and_then(|rpc| {
                rpc.query(ServerCallback::GetCases, &args, move |result| {
                    Event::CasesLoaded { seq, result }
                })
            });
            if let Err(e) = sent {
                warn!(error = %e, "could not request cases");
                model.loading = false;
                model.error = true;
            }
        }

        fn handle_cases_response(model: &mut Model, seq: u64, result: RpcResult<CasesResponse>) {
            if seq != model.list_request_seq {
                debug!(seq, latest = model.list_request_seq, "dropping stale cases reply");
                return;
            }

            model.loading = false;
            match result {
                Ok(response) => {
                    debug!(
                        count = response.cases.len(),
                        page = model.page,
                        max_pages = response.max_pages,
                        "cases loaded"
                    );
                    model.max_pages = response.max_pages;
                    model.data = Some(response);
                }
                Err(e) => {
                    warn!(error = %e, "cases fetch failed");
                    model.error = true;
                }
            }
        }

        fn reload_list(model: &mut Model, caps: &Capabilities) {
            model.reload_trigger += 1;
            Self::send_cases_request(model, caps);
        }

        fn send_detail_load(model: &mut Model, caps: &Capabilities) {
            model.detail_generation += 1;
            let generation = model.detail_generation;

            let Some(detail) = model.detail_mut() else {
                return;
            };
            detail.begin_reload(generation);
            let args = CaseRefArgs {
                case_id: detail.case.id,
            };

            let (evidence, notes) = match Self::rpc(model, caps) {
                Ok(rpc) => (
                    rpc.query(ServerCallback::GetCaseEvidence, &args, move |result| {
                        Event::CaseEvidenceLoaded { generation, result }
                    }),
                    rpc.query(ServerCallback::GetCaseNotes, &args, move |result| {
                        Event::CaseNotesLoaded { generation, result }
                    }),
                ),
                Err(e) => (Err(e.clone()), Err(e)),
            };

            if let Some(detail) = model.detail_mut() {
                if let Err(e) = evidence {
                    detail.apply_evidence(generation, Err(e));
                }
                if let Err(e) = notes {
                    detail.apply_notes(generation, Err(e));
                }
            }
        }

        /// Reloads evidence and notes if `case_id` is still on screen.
        fn reload_detail(model: &mut Model, caps: &Capabilities, case_id: CaseId) {
            if model.detail_for(case_id).is_some() {
                Self::send_detail_load(model, caps);
            } else {
                debug!(case_id = %case_id, "case no longer open, skipping reload");
            }
        }

        fn with_detail(model: &mut Model, f: impl FnOnce(&mut DetailState)) {
            match model.detail_mut() {
                Some(detail) => f(detail),
                None => debug!("no case open"),
            }
        }

        fn with_modal(model: &mut Model, f: impl FnOnce(&mut EvidenceModal)) {
            match model.evidence_modal_mut() {
                Some(modal) => f(modal),
                None => debug!("evidence modal not open"),
            }
        }

        fn with_list(model: &mut Model, f: impl FnOnce(&mut ListScreen)) {
            match model.list_mut() {
                Some(list) => f(list),
                None => debug!("list screen not showing"),
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            model.update_timestamp();
            debug!(event = event.name(), response = event.is_response(), "update");

            match event {
                Event::Started(settings) => match CasesConfig::from_settings(&settings) {
                    Ok(config) => {
                        model.config = config;
                        model.config_error = None;
                        info!(
                            endpoint = model.config.endpoint().as_str(),
                            page_size = model.config.page_size(),
                            "cases core started"
                        );
                        Self::send_cases_request(model, caps);
                    }
                    Err(e) => {
                        warn!(error = %e, "rejected startup settings");
                        model.config_error = Some(e);
                        model.loading = false;
                        model.error = true;
                    }
                },

                Event::SearchTextChanged(text) => {
                    model.search_text = text;
                    model.search_generation += 1;
                    let generation = model.search_generation;
                    caps.timer
                        .notify_after(model.config.search_debounce(), move |_| {
                            Event::SearchSettled { generation }
                        });
                }

                Event::SearchSettled { generation } => {
                    if generation != model.search_generation {
                        debug!(generation, "search input still changing");
                    } else if model.search_text != model.search_debounced {
                        model.search_debounced = model.search_text.clone();
                        Self::send_cases_request(model, caps);
                    }
                }

                Event::StatusFilterChanged(filter) => {
                    if filter != model.status_filter {
                        model.status_filter = filter;
                        Self::send_cases_request(model, caps);
                    }
                }

                Event::PageChanged(page) => {
                    if page == model.page || !(FIRST_PAGE..=model.last_page()).contains(&page) {
                        debug!(page, max_pages = model.max_pages, "ignoring page change");
                    } else {
                        model.page = page;
                        Self::send_cases_request(model, caps);
                    }
                }

                Event::CasesLoaded { seq, result } => {
                    Self::handle_cases_response(model, seq, result);
                }

                Event::CaseSelected(case) => {
                    info!(case_id = %case.id, "opening case");
                    model.screen = Screen::Detail(Box::new(DetailState::new(
                        case,
                        model.detail_generation,
                    )));
                    Self::send_detail_load(model, caps);
                }

                Event::BackToList => {
                    model.screen = Screen::List(ListScreen::default());
                    Self::reload_list(model, caps);
                }

                Event::CreateCaseOpened => {
                    Self::with_list(model, |list| list.create_modal_open = true);
                }

                Event::CreateCaseClosed => {
                    Self::with_list(model, |list| list.create_modal_open = false);
                }

                Event::CreateCaseFieldChanged(field) => {
                    Self::with_list(model, |list| list.form.apply(field));
                }

                Event::CreateCaseSubmitted => {
                    let args = model
                        .list_mut()
                        .filter(|list| list.create_modal_open && list.form.can_submit())
                        .map(|list| list.form.to_args());
                    match args {
                        Some(args) => Self::send_command(
                            model,
                            caps,
                            ServerCallback::CreateCase,
                            &args,
                            |result| Event::CaseCreated { result },
                        ),
                        None => debug!("create case form incomplete"),
                    }
                }

                Event::CaseCreated { result } => match result {
                    Ok(()) => {
                        info!("case created");
                        Self::with_list(model, |list| {
                            list.form.clear();
                            list.create_modal_open = false;
                        });
                        Self::reload_list(model, caps);
                    }
                    Err(e) => warn!(error = %e, "create case failed"),
                },

                Event::DeleteCaseRequested { case_id } => {
                    Self::send_command(
                        model,
                        caps,
                        ServerCallback::DeleteCase,
                        &CaseRefArgs { case_id },
                        move |result| Event::CaseDeleted { case_id, result },
                    );
                }

                Event::CaseDeleted { case_id, result } => match result {
                    Ok(()) => {
                        info!(case_id = %case_id, "case deleted");
                        Self::reload_list(model, caps);
                    }
                    Err(e) => warn!(case_id = %case_id, error = %e, "delete case failed"),
                },

                Event::CaseEvidenceLoaded { generation, result } => {
                    Self::with_detail(model, |detail| {
                        detail.apply_evidence(generation, result);
                    });
                }

                Event::CaseNotesLoaded { generation, result } => {
                    Self::with_detail(model, |detail| {
                        detail.apply_notes(generation, result);
                    });
                }

                Event::EditStarted => Self::with_detail(model, DetailState::start_editing),

                Event::EditFieldChanged(edit) => {
                    Self::with_detail(model, |detail| {
                        if detail.editing {
                            detail.edit.apply(edit);
                        }
                    });
                }

                Event::EditCancelled => Self::with_detail(model, DetailState::cancel_editing),

                Event::SaveRequested => {
                    let pending = model
                        .detail()
                        .filter(|detail| detail.editing)
                        .map(|detail| (detail.case.id, detail.edit.clone()));
                    if let Some((case_id, saved)) = pending {
                        let args = saved.to_args(case_id);
                        Self::send_command(
                            model,
                            caps,
                            ServerCallback::UpdateCase,
                            &args,
                            move |result| Event::CaseUpdated {
                                case_id,
                                saved,
                                result,
                            },
                        );
                    }
                }

                Event::CaseUpdated {
                    case_id,
                    saved,
                    result,
                } => match result {
                    Ok(()) => {
                        info!(case_id = %case_id, "case updated");
                        if let Some(detail) = model.detail_for(case_id) {
                            detail.commit_edit(&saved);
                        }
                    }
                    Err(e) => warn!(case_id = %case_id, error = %e, "update case failed"),
                },

                Event::NoteDraftChanged(text) => {
                    Self::with_detail(model, |detail| detail.note_draft = text);
                }

                Event::AddNoteRequested => {
                    let args = model
                        .detail()
                        .filter(|detail| detail.can_add_note())
                        .map(|detail| AddCaseNoteArgs {
                            case_id: detail.case.id,
                            note: detail.note_draft.clone(),
                        });
                    if let Some(args) = args {
                        let case_id = args.case_id;
                        Self::send_command(
                            model,
                            caps,
                            ServerCallback::AddCaseNote,
                            &args,
                            move |result| Event::NoteAdded { case_id, result },
                        );
                    }
                }

                Event::NoteAdded { case_id, result } => match result {
                    Ok(()) => {
                        info!(case_id = %case_id, "note added");
                        if let Some(detail) = model.detail_for(case_id) {
                            detail.note_draft.clear();
                        }
                        Self::reload_detail(model, caps, case_id);
                    }
                    Err(e) => warn!(case_id = %case_id, error = %e, "add note failed"),
                },

                Event::AddEvidenceOpened => {
                    Self::with_detail(model, |detail| {
                        detail.evidence_modal = Some(EvidenceModal::default());
                    });
                }

                Event::AddEvidenceClosed => {
                    Self::with_detail(model, |detail| detail.evidence_modal = None);
                }

                Event::EvidenceTypeSelected(evidence_type) => {
                    Self::with_modal(model, |modal| modal.select_type(evidence_type));
                }

                Event::EvidenceSourceSelected(source) => {
                    Self::with_modal(model, |modal| modal.select_source(source));
                }

                Event::InventoryEvidenceChosen(item) => {
                    let chosen_at = UnixTimeMs(model.view_timestamp_ms);
                    Self::with_modal(model, |modal| {
                        if !modal.choose_inventory(item, chosen_at) {
                            debug!("inventory choice outside inventory tab");
                        }
                    });
                }

                Event::ManualIdentifierChanged(identifier) => {
                    Self::with_modal(model, |modal| {
                        if !modal.set_manual_identifier(identifier) {
                            debug!("manual entry outside manual tab");
                        }
                    });
                }

                Event::DatabaseSearchTextChanged(text) => {
                    Self::with_modal(model, |modal| modal.search_text = text);
                }

                Event::DatabaseSearchRequested => {
                    model.biometric_search_seq += 1;
                    let seq = model.biometric_search_seq;
                    let prepared = model
                        .evidence_modal_mut()
                        .and_then(|modal| modal.prepare_search(seq));
                    if let Some((seq, args)) = prepared {
                        let sent = Self::rpc(model, caps).and_then(|rpc| {
                            rpc.query(
                                ServerCallback::GetStoredBiometricDataEntries,
                                &args,
                                move |result: RpcResult<BiometricSearchResponse>| {
                                    Event::DatabaseSearchCompleted { seq, result }
                                },
                            )
                        });
                        if let Err(e) = sent {
                            warn!(error = %e, "could not send biometric search");
                        }
                    }
                }

                Event::DatabaseSearchCompleted { seq, result } => {
                    Self::with_modal(model, |modal| {
                        modal.apply_search_results(
                            seq,
                            result.map(BiometricSearchResponse::into_entries),
                        );
                    });
                }

                Event::DatabaseEntrySelected { identifier } => {
                    Self::with_modal(model, |modal| {
                        if !modal.select_database_entry(identifier) {
                            debug!("database pick outside database tab");
                        }
                    });
                }

                Event::EvidenceNotesChanged(notes) => {
                    Self::with_modal(model, |modal| modal.notes = notes);
                }

                Event::AddEvidenceSubmitted => {
                    let args = model.detail().and_then(|detail| {
                        detail
                            .evidence_modal
                            .as_ref()
                            .filter(|modal| modal.can_submit())
                            .map(|modal| modal.to_args(detail.case.id))
                    });
                    if let Some(args) = args {
                        let case_id = args.case_id;
                        Self::send_command(
                            model,
                            caps,
                            ServerCallback::AddEvidenceToCase,
                            &args,
                            move |result| Event::EvidenceAdded { case_id, result },
                        );
                    }
                }

                Event::EvidenceAdded { case_id, result } => match result {
                    Ok(()) => {
                        info!(case_id = %case_id, "evidence attached");
                        if let Some(detail) = model.detail_for(case_id) {
                            detail.evidence_modal = None;
                        }
                        Self::reload_detail(model, caps, case_id);
                    }
                    Err(e) => warn!(case_id = %case_id, error = %e, "add evidence failed"),
                },

                Event::RemoveEvidenceRequested { evidence_id } => {
                    match model.selected_case().map(|case| case.id) {
                        Some(case_id) => Self::send_command(
                            model,
                            caps,
                            ServerCallback::RemoveEvidenceFromCase,
                            &RemoveEvidenceArgs { evidence_id },
                            move |result| Event::EvidenceRemoved {
                                case_id,
                                evidence_id,
                                result,
                            },
                        ),
                        None => debug!(evidence_id = %evidence_id, "no case open"),
                    }
                }

                Event::EvidenceRemoved {
                    case_id,
                    evidence_id,
                    result,
                } => match result {
                    Ok(()) => {
                        info!(case_id = %case_id, evidence_id = %evidence_id, "evidence removed");
                        Self::reload_detail(model, caps, case_id);
                    }
                    Err(e) => {
                        warn!(case_id = %case_id, evidence_id = %evidence_id, error = %e, "remove evidence failed");
                    }
                },
            }

            caps.render.render();
        }

        fn view(&self, model: &Model) -> ViewModel {
            let now_ms = model.view_timestamp_ms;

            let screen = match &model.screen {
                Screen::List(list) => ScreenView::List(build_list_view(model, list, now_ms)),
                Screen::Detail(detail) => ScreenView::Detail(build_detail_view(detail, now_ms)),
            };

            ViewModel { screen }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod view_model_tests {
        use super::*;
        use crux_core::App as _;

        #[test]
        fn test_initial_view_is_loading_list() {
            let model = Model::default();
            let view = App.view(&model);
            match view.screen {
                ScreenView::List(list) => {
                    assert_eq!(list.body, list::ListBody::Loading);
                    assert!(list.pagination.is_none());
                }
                ScreenView::Detail(_) => panic!("expected list screen"),
            }
        }

        #[test]
        fn test_screen_tag_serialization() {
            let view = App.view(&Model::default());
            let json = serde_json::to_value(&view).unwrap();
            assert_eq!(json["screen"]["screen"], "list");
            assert_eq!(json["screen"]["body"]["type"], "loading");
        }
    }
}
