use serde::{Deserialize, Serialize};

use crate::api::CreateCaseArgs;
use crate::model::{Case, Model, StatusFilter, UnixTimeMs};

/// List-screen local state. Dropped when the detail screen takes over.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListScreen {
    pub create_modal_open: bool,
    pub form: CreateCaseForm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreateCaseField {
    CaseNumber(String),
    Title(String),
    Description(String),
    AssignedTo(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CreateCaseForm {
    pub case_number: String,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
}

impl CreateCaseForm {
    /// Case number and title are required. Whitespace counts as content.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.case_number.is_empty() && !self.title.is_empty()
    }

    pub fn apply(&mut self, field: CreateCaseField) {
        match field {
            CreateCaseField::CaseNumber(v) => self.case_number = v,
            CreateCaseField::Title(v) => self.title = v,
            CreateCaseField::Description(v) => self.description = v,
            CreateCaseField::AssignedTo(v) => self.assigned_to = v,
        }
    }

    pub fn to_args(&self) -> CreateCaseArgs {
        CreateCaseArgs {
            case_number: self.case_number.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            assigned_to: self.assigned_to.clone(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// --- View ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasesListView {
    pub search_text: String,
    pub status_filter: StatusFilter,
    pub body: ListBody,
    pub pagination: Option<PaginationView>,
    pub create_modal: Option<CreateCaseModalView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListBody {
    Loading,
    Error,
    /// Nothing fetched yet and nothing in flight.
    Idle,
    Empty,
    Rows { rows: Vec<CaseRow> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRow {
    /// Handed back unchanged in `Event::CaseSelected`.
    pub case: Case,
    pub status_label: String,
    pub assigned_to: Option<String>,
    pub updated_ago: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationView {
    pub page: u32,
    pub max_pages: u32,
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

impl PaginationView {
    /// `None` when there is only one page.
    #[must_use]
    pub fn derive(page: u32, max_pages: u32) -> Option<Self> {
        (max_pages > 1).then_some(Self {
            page,
            max_pages,
            previous_enabled: page > 1,
            next_enabled: page < max_pages,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCaseModalView {
    pub form: CreateCaseForm,
    pub can_submit: bool,
}

pub fn build_list_view(model: &Model, list: &ListScreen, now_ms: u64) -> CasesListView {
    let body = if model.loading {
        ListBody::Loading
    } else if model.error {
        ListBody::Error
    } else {
        match &model.data {
            None => ListBody::Idle,
            Some(data) if data.cases.is_empty() => ListBody::Empty,
            Some(data) => ListBody::Rows {
                rows: data
                    .cases
                    .iter()
                    .map(|case| CaseRow {
                        case: case.clone(),
                        status_label: case.status.display_name().to_string(),
                        assigned_to: case.assignee().map(str::to_string),
                        updated_ago: case.updated_at.age_label(UnixTimeMs(now_ms)),
                    })
                    .collect(),
            },
        }
    };

    let pagination = if model.loading || model.error || model.data.is_none() {
        None
    } else {
        PaginationView::derive(model.page, model.max_pages)
    };

    let create_modal = list.create_modal_open.then(|| CreateCaseModalView {
        form: list.form.clone(),
        can_submit: list.form.can_submit(),
    });

    CasesListView {
        search_text: model.search_text.clone(),
        status_filter: model.status_filter,
        body,
        pagination,
        create_modal,
    }
}
