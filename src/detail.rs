use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{AddEvidenceArgs, BiometricSearchArgs, UpdateCaseArgs};
use crate::capabilities::RpcResult;
use crate::model::{
    BiometricEntry, Case, CaseEvidence, CaseId, CaseNote, CaseStatus, ChosenEvidence, EvidenceId,
    EvidenceType, InventoryEvidence, NoteId, UnixTimeMs,
};
use crate::BIOMETRIC_SEARCH_PAGE;

const DETAIL_LOAD_BRANCHES: u8 = 2;

/// Everything the detail screen holds for one selected case.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailState {
    pub case: Case,
    pub generation: u64,
    pub loading: bool,
    pending_loads: u8,
    pub evidence: Vec<CaseEvidence>,
    pub notes: Vec<CaseNote>,
    pub editing: bool,
    pub edit: CaseEditForm,
    pub note_draft: String,
    pub evidence_modal: Option<EvidenceModal>,
}

impl DetailState {
    pub fn new(case: Case, generation: u64) -> Self {
        let edit = CaseEditForm::from_case(&case);
        Self {
            case,
            generation,
            loading: true,
            pending_loads: DETAIL_LOAD_BRANCHES,
            evidence: Vec::new(),
            notes: Vec::new(),
            editing: false,
            edit,
            note_draft: String::new(),
            evidence_modal: None,
        }
    }

    /// Starts a fresh evidence and notes load. Replies from older loads are
    /// ignored from here on.
    pub fn begin_reload(&mut self, generation: u64) {
        self.generation = generation;
        self.loading = true;
        self.pending_loads = DETAIL_LOAD_BRANCHES;
    }

    /// Returns `false` when the reply belongs to a superseded load.
    pub fn apply_evidence(
        &mut self,
        generation: u64,
        result: RpcResult<Vec<CaseEvidence>>,
    ) -> bool {
        if generation != self.generation {
            debug!(case_id = %self.case.id, generation, "dropping stale evidence reply");
            return false;
        }
        match result {
            Ok(evidence) => self.evidence = evidence,
            Err(e) => warn!(case_id = %self.case.id, error = %e, "evidence load failed"),
        }
        self.finish_load_branch();
        true
    }

    pub fn apply_notes(&mut self, generation: u64, result: RpcResult<Vec<CaseNote>>) -> bool {
        if generation != self.generation {
            debug!(case_id = %self.case.id, generation, "dropping stale notes reply");
            return false;
        }
        match result {
            Ok(notes) => self.notes = notes,
            Err(e) => warn!(case_id = %self.case.id, error = %e, "notes load failed"),
        }
        self.finish_load_branch();
        true
    }

    fn finish_load_branch(&mut self) {
        self.pending_loads = self.pending_loads.saturating_sub(1);
        if self.pending_loads == 0 {
            self.loading = false;
        }
    }

    /// Seeds the form from the last saved snapshot of the case.
    pub fn start_editing(&mut self) {
        self.edit = CaseEditForm::from_case(&self.case);
        self.editing = true;
    }

    pub fn cancel_editing(&mut self) {
        self.editing = false;
        self.edit = CaseEditForm::from_case(&self.case);
    }

    /// Folds a confirmed save into the case snapshot and leaves edit mode.
    pub fn commit_edit(&mut self, saved: &CaseEditForm) {
        saved.apply_to(&mut self.case);
        self.edit = saved.clone();
        self.editing = false;
    }

    #[must_use]
    pub fn can_add_note(&self) -> bool {
        !self.note_draft.trim().is_empty()
    }
}

// --- Edit form ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseEdit {
    Title(String),
    Description(String),
    Status(CaseStatus),
    AssignedTo(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CaseEditForm {
    pub title: String,
    pub description: String,
    pub status: CaseStatus,
    pub assigned_to: String,
}

impl CaseEditForm {
    pub fn from_case(case: &Case) -> Self {
        Self {
            title: case.title.clone(),
            description: case.description.clone(),
            status: case.status,
            assigned_to: case.assigned_to.clone(),
        }
    }

    pub fn apply(&mut self, edit: CaseEdit) {
        match edit {
            CaseEdit::Title(v) => self.title = v,
            CaseEdit::Description(v) => self.description = v,
            CaseEdit::Status(v) => self.status = v,
            CaseEdit::AssignedTo(v) => self.assigned_to = v,
        }
    }

    pub fn apply_to(&self, case: &mut Case) {
        case.title = self.title.clone();
        case.description = self.description.clone();
        case.status = self.status;
        case.assigned_to = self.assigned_to.clone();
    }

    pub fn to_args(&self, case_id: CaseId) -> UpdateCaseArgs {
        UpdateCaseArgs {
            case_id,
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            assigned_to: self.assigned_to.clone(),
        }
    }
}

// --- Evidence modal ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    #[default]
    Inventory,
    Database,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EvidenceModal {
    pub evidence_type: EvidenceType,
    pub source: EvidenceSource,
    pub identifier: String,
    pub notes: String,
    pub chosen: Option<ChosenEvidence>,
    pub search_text: String,
    pub results: Vec<BiometricEntry>,
    pub search_seq: u64,
}

impl EvidenceModal {
    /// Magazine and other evidence can only be typed in by hand.
    #[must_use]
    pub fn effective_source(&self) -> EvidenceSource {
        if self.evidence_type.is_biometric() {
            self.source
        } else {
            EvidenceSource::Manual
        }
    }

    pub fn select_type(&mut self, evidence_type: EvidenceType) {
        self.evidence_type = evidence_type;
        self.identifier.clear();
        self.chosen = None;
        self.results.clear();
        self.search_text.clear();
    }

    pub fn select_source(&mut self, source: EvidenceSource) {
        self.source = source;
        self.identifier.clear();
        match source {
            EvidenceSource::Inventory | EvidenceSource::Manual => self.chosen = None,
            EvidenceSource::Database => self.results.clear(),
        }
    }

    /// Returns `false` if the inventory tab is not the one showing.
    pub fn choose_inventory(&mut self, item: InventoryEvidence, chosen_at: UnixTimeMs) -> bool {
        if self.effective_source() != EvidenceSource::Inventory {
            return false;
        }
        self.identifier = item.identifier.clone();
        self.chosen = Some(ChosenEvidence {
            evidence: item,
            chosen_at,
        });
        true
    }

    pub fn set_manual_identifier(&mut self, identifier: String) -> bool {
        if self.effective_source() != EvidenceSource::Manual {
            return false;
        }
        self.identifier = identifier;
        true
    }

    pub fn select_database_entry(&mut self, identifier: String) -> bool {
        if self.effective_source() != EvidenceSource::Database {
            return false;
        }
        self.identifier = identifier;
        true
    }

    /// Type filter for the biometric database; empty for non-biometric types.
    pub fn search_types(&self) -> Vec<EvidenceType> {
        if self.evidence_type.is_biometric() {
            vec![self.evidence_type]
        } else {
            Vec::new()
        }
    }

    /// Builds the biometric search tagged `seq`, or clears the results and
    /// returns `None` when there is nothing to search for. Either way `seq`
    /// becomes the only reply this modal will accept.
    pub fn prepare_search(&mut self, seq: u64) -> Option<(u64, BiometricSearchArgs)> {
        let types = self.search_types();
        self.search_seq = seq;

        if self.search_text.trim().is_empty() || types.is_empty() {
            self.results.clear();
            return None;
        }

        Some((
            self.search_seq,
            BiometricSearchArgs {
                types,
                search: self.search_text.clone(),
                page: BIOMETRIC_SEARCH_PAGE,
            },
        ))
    }

    /// Returns `false` for replies to a superseded search. A failed search
    /// keeps the previous results.
    pub fn apply_search_results(
        &mut self,
        seq: u64,
        result: RpcResult<Vec<BiometricEntry>>,
    ) -> bool {
        if seq != self.search_seq {
            debug!(seq, latest = self.search_seq, "dropping stale biometric search reply");
            return false;
        }
        match result {
            Ok(entries) => self.results = entries,
            Err(e) => warn!(error = %e, "biometric search failed"),
        }
        true
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.identifier.trim().is_empty()
    }

    pub fn to_args(&self, case_id: CaseId) -> AddEvidenceArgs {
        AddEvidenceArgs {
            case_id,
            evidence_type: self.evidence_type,
            evidence_identifier: self.identifier.clone(),
            notes: self.notes.clone(),
        }
    }
}

// --- View ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDetailView {
    pub info: CaseInfoView,
    /// Present while editing.
    pub edit_form: Option<CaseEditForm>,
    pub panels: DetailPanels,
    pub evidence_modal: Option<EvidenceModalView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseInfoView {
    pub id: CaseId,
    pub case_number: String,
    pub title: String,
    pub description: Option<String>,
    pub status: CaseStatus,
    pub status_label: String,
    pub assigned_to: Option<String>,
    pub created_by: String,
    /// Raw stamps for shells that print an absolute date.
    pub created_at: UnixTimeMs,
    pub updated_at: UnixTimeMs,
    pub created_ago: String,
    pub updated_ago: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetailPanels {
    Loading,
    Ready {
        evidence: Vec<EvidenceRow>,
        notes: Vec<NoteRow>,
        note_draft: String,
        can_add_note: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRow {
    pub id: EvidenceId,
    pub type_label: String,
    pub identifier: String,
    pub notes: Option<String>,
    pub added_by: String,
    pub added_at: UnixTimeMs,
    pub added_ago: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRow {
    pub id: NoteId,
    pub note: String,
    pub created_by: String,
    pub created_at: UnixTimeMs,
    pub created_ago: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceModalView {
    pub evidence_type: EvidenceType,
    /// Source tabs, shown only for biometric types.
    pub source_tabs: Option<EvidenceSource>,
    pub entry: EvidenceEntryView,
    pub notes: String,
    pub can_submit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvidenceEntryView {
    Inventory {
        /// Evidence kind the shell's chooser should list, e.g. `FINGERPRINT`.
        chooser_kind: String,
        selected: Option<String>,
    },
    Database {
        search_text: String,
        results: Vec<BiometricEntryView>,
        hint: Option<DatabaseHint>,
    },
    Manual {
        identifier: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseHint {
    NoResults,
    EnterSearchTerms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricEntryView {
    pub identifier: String,
    pub holder: String,
    pub selected: bool,
}

fn non_empty(s: &str) -> Option<String> {
    (!s.trim().is_empty()).then(|| s.to_string())
}

pub fn build_detail_view(detail: &DetailState, now_ms: u64) -> CaseDetailView {
    let now = UnixTimeMs(now_ms);
    let case = &detail.case;
    let info = CaseInfoView {
        id: case.id,
        case_number: case.case_number.clone(),
        title: case.title.clone(),
        description: non_empty(&case.description),
        status: case.status,
        status_label: case.status.display_name().to_string(),
        assigned_to: case.assignee().map(str::to_string),
        created_by: case.created_by.clone(),
        created_at: case.created_at,
        updated_at: case.updated_at,
        created_ago: case.created_at.age_label(now),
        updated_ago: case.updated_at.age_label(now),
    };

    let panels = if detail.loading {
        DetailPanels::Loading
    } else {
        DetailPanels::Ready {
            evidence: detail
                .evidence
                .iter()
                .map(|e| EvidenceRow {
                    id: e.id,
                    type_label: e.evidence_type.label().to_string(),
                    identifier: e.evidence_identifier.clone(),
                    notes: non_empty(&e.notes),
                    added_by: e.added_by.clone(),
                    added_at: e.added_at,
                    added_ago: e.added_at.age_label(now),
                })
                .collect(),
            notes: detail
                .notes
                .iter()
                .map(|n| NoteRow {
                    id: n.id,
                    note: n.note.clone(),
                    created_by: n.created_by.clone(),
                    created_at: n.created_at,
                    created_ago: n.created_at.age_label(now),
                })
                .collect(),
            note_draft: detail.note_draft.clone(),
            can_add_note: detail.can_add_note(),
        }
    };

    CaseDetailView {
        info,
        edit_form: detail.editing.then(|| detail.edit.clone()),
        panels,
        evidence_modal: detail.evidence_modal.as_ref().map(build_modal_view),
    }
}

fn build_modal_view(modal: &EvidenceModal) -> EvidenceModalView {
    let entry = match modal.effective_source() {
        EvidenceSource::Inventory => EvidenceEntryView::Inventory {
            chooser_kind: modal.evidence_type.label().to_string(),
            selected: modal.chosen.as_ref().map(|c| c.evidence.identifier.clone()),
        },
        EvidenceSource::Database => EvidenceEntryView::Database {
            search_text: modal.search_text.clone(),
            results: modal
                .results
                .iter()
                .map(|entry| BiometricEntryView {
                    identifier: entry.identifier.clone(),
                    holder: entry.holder(),
                    selected: entry.identifier == modal.identifier,
                })
                .collect(),
            hint: match (modal.results.is_empty(), modal.search_text.is_empty()) {
                (false, _) => None,
                (true, false) => Some(DatabaseHint::NoResults),
                (true, true) => Some(DatabaseHint::EnterSearchTerms),
            },
        },
        EvidenceSource::Manual => EvidenceEntryView::Manual {
            identifier: modal.identifier.clone(),
        },
    };

    EvidenceModalView {
        evidence_type: modal.evidence_type,
        source_tabs: modal.evidence_type.is_biometric().then_some(modal.source),
        entry,
        notes: modal.notes.clone(),
        can_submit: modal.can_submit(),
    }
}
