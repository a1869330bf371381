use serde::{Deserialize, Serialize};

use crate::api::BiometricSearchResponse;
use crate::capabilities::RpcResult;
use crate::config::StartupSettings;
use crate::detail::{CaseEdit, CaseEditForm, EvidenceSource};
use crate::list::CreateCaseField;
use crate::model::{
    Case, CaseEvidence, CaseId, CaseNote, CasesResponse, EvidenceId, EvidenceType,
    InventoryEvidence, StatusFilter,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // --- Lifecycle ---
    Started(StartupSettings),

    // --- Case list query ---
    SearchTextChanged(String),
    SearchSettled { generation: u64 },
    StatusFilterChanged(StatusFilter),
    PageChanged(u32),
    CasesLoaded { seq: u64, result: RpcResult<CasesResponse> },

    // --- Navigation ---
    CaseSelected(Case),
    BackToList,

    // --- Create and delete ---
    CreateCaseOpened,
    CreateCaseClosed,
    CreateCaseFieldChanged(CreateCaseField),
    CreateCaseSubmitted,
    CaseCreated { result: RpcResult<()> },
    DeleteCaseRequested { case_id: CaseId },
    CaseDeleted { case_id: CaseId, result: RpcResult<()> },

    // --- Detail loads ---
    CaseEvidenceLoaded { generation: u64, result: RpcResult<Vec<CaseEvidence>> },
    CaseNotesLoaded { generation: u64, result: RpcResult<Vec<CaseNote>> },

    // --- Edit ---
    EditStarted,
    EditFieldChanged(CaseEdit),
    EditCancelled,
    SaveRequested,
    CaseUpdated { case_id: CaseId, saved: CaseEditForm, result: RpcResult<()> },

    // --- Notes ---
    NoteDraftChanged(String),
    AddNoteRequested,
    NoteAdded { case_id: CaseId, result: RpcResult<()> },

    // --- Evidence modal ---
    AddEvidenceOpened,
    AddEvidenceClosed,
    EvidenceTypeSelected(EvidenceType),
    EvidenceSourceSelected(EvidenceSource),
    InventoryEvidenceChosen(InventoryEvidence),
    ManualIdentifierChanged(String),
    DatabaseSearchTextChanged(String),
    DatabaseSearchRequested,
    DatabaseSearchCompleted { seq: u64, result: RpcResult<BiometricSearchResponse> },
    DatabaseEntrySelected { identifier: String },
    EvidenceNotesChanged(String),
    AddEvidenceSubmitted,
    EvidenceAdded { case_id: CaseId, result: RpcResult<()> },

    // --- Evidence removal ---
    RemoveEvidenceRequested { evidence_id: EvidenceId },
    EvidenceRemoved { case_id: CaseId, evidence_id: EvidenceId, result: RpcResult<()> },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Started(_) => "started",
            Event::SearchTextChanged(_) => "search_text_changed",
            Event::SearchSettled { .. } => "search_settled",
            Event::StatusFilterChanged(_) => "status_filter_changed",
            Event::PageChanged(_) => "page_changed",
            Event::CasesLoaded { .. } => "cases_loaded",
            Event::CaseSelected(_) => "case_selected",
            Event::BackToList => "back_to_list",
            Event::CreateCaseOpened => "create_case_opened",
            Event::CreateCaseClosed => "create_case_closed",
            Event::CreateCaseFieldChanged(_) => "create_case_field_changed",
            Event::CreateCaseSubmitted => "create_case_submitted",
            Event::CaseCreated { .. } => "case_created",
            Event::DeleteCaseRequested { .. } => "delete_case_requested",
            Event::CaseDeleted { .. } => "case_deleted",
            Event::CaseEvidenceLoaded { .. } => "case_evidence_loaded",
            Event::CaseNotesLoaded { .. } => "case_notes_loaded",
            Event::EditStarted => "edit_started",
            Event::EditFieldChanged(_) => "edit_field_changed",
            Event::EditCancelled => "edit_cancelled",
            Event::SaveRequested => "save_requested",
            Event::CaseUpdated { .. } => "case_updated",
            Event::NoteDraftChanged(_) => "note_draft_changed",
            Event::AddNoteRequested => "add_note_requested",
            Event::NoteAdded { .. } => "note_added",
            Event::AddEvidenceOpened => "add_evidence_opened",
            Event::AddEvidenceClosed => "add_evidence_closed",
            Event::EvidenceTypeSelected(_) => "evidence_type_selected",
            Event::EvidenceSourceSelected(_) => "evidence_source_selected",
            Event::InventoryEvidenceChosen(_) => "inventory_evidence_chosen",
            Event::ManualIdentifierChanged(_) => "manual_identifier_changed",
            Event::DatabaseSearchTextChanged(_) => "database_search_text_changed",
            Event::DatabaseSearchRequested => "database_search_requested",
            Event::DatabaseSearchCompleted { .. } => "database_search_completed",
            Event::DatabaseEntrySelected { .. } => "database_entry_selected",
            Event::EvidenceNotesChanged(_) => "evidence_notes_changed",
            Event::AddEvidenceSubmitted => "add_evidence_submitted",
            Event::EvidenceAdded { .. } => "evidence_added",
            Event::RemoveEvidenceRequested { .. } => "remove_evidence_requested",
            Event::EvidenceRemoved { .. } => "evidence_removed",
        }
    }

    /// Replies from the shell, as opposed to something the user did.
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            Event::SearchSettled { .. }
                | Event::CasesLoaded { .. }
                | Event::CaseCreated { .. }
                | Event::CaseDeleted { .. }
                | Event::CaseEvidenceLoaded { .. }
                | Event::CaseNotesLoaded { .. }
                | Event::CaseUpdated { .. }
                | Event::NoteAdded { .. }
                | Event::DatabaseSearchCompleted { .. }
                | Event::EvidenceAdded { .. }
                | Event::EvidenceRemoved { .. }
        )
    }
}
