use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::config::{CasesConfig, ConfigError};
use crate::detail::{DetailState, EvidenceModal};
use crate::list::ListScreen;
use crate::{get_current_time_ms, FIRST_PAGE};

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

typed_id!(CaseId);
typed_id!(EvidenceId);
typed_id!(NoteId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Coarse age such as `5m ago` or `2w ago`, in the largest unit that fits.
    /// Anything under a minute, or stamped ahead of `now`, is `just now`.
    #[must_use]
    pub fn age_label(self, now: UnixTimeMs) -> String {
        let secs = now.0.saturating_sub(self.0) / 1000;
        AGE_UNITS
            .iter()
            .find(|(unit_secs, _)| secs >= *unit_secs)
            .map_or_else(
                || "just now".to_string(),
                |(unit_secs, suffix)| format!("{}{suffix} ago", secs / unit_secs),
            )
    }
}

const DAY_SECS: u64 = 86_400;

const AGE_UNITS: [(u64, &str); 6] = [
    (365 * DAY_SECS, "y"),
    (30 * DAY_SECS, "mo"),
    (7 * DAY_SECS, "w"),
    (DAY_SECS, "d"),
    (3_600, "h"),
    (60, "m"),
];

/// Reads a JSON `null` as the type's default. The server sends `null` for
/// blank optional text columns.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// --- Case status and filter ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    #[default]
    Open,
    Active,
    Closed,
    Archived,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 4] = [Self::Open, Self::Active, Self::Closed, Self::Archived];

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "active" => Some(Self::Active),
            "closed" => Some(Self::Closed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Active => "active",
            Self::Closed => "closed",
            Self::Archived => "archived",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Active => "Active",
            Self::Closed => "Closed",
            Self::Archived => "Archived",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// List filter: every status, or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(into = "String", try_from = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(CaseStatus),
}

impl StatusFilter {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.as_str(),
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        CaseStatus::from_str(s).map(Self::Only)
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.as_str().to_string()
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).ok_or_else(|| format!("unknown status filter '{value}'"))
    }
}

// --- Evidence types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceType {
    #[default]
    Fingerprint,
    Dna,
    Magazine,
    Other,
}

impl EvidenceType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fingerprint => "fingerprint",
            Self::Dna => "dna",
            Self::Magazine => "magazine",
            Self::Other => "other",
        }
    }

    /// Upper-case label used in evidence rows.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fingerprint => "FINGERPRINT",
            Self::Dna => "DNA",
            Self::Magazine => "MAGAZINE",
            Self::Other => "OTHER",
        }
    }

    /// Fingerprint and DNA can be picked from inventory or the biometric database.
    #[must_use]
    pub const fn is_biometric(self) -> bool {
        matches!(self, Self::Fingerprint | Self::Dna)
    }
}

impl fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Records ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub case_number: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub status: CaseStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_by: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assigned_to: String,
    pub created_at: UnixTimeMs,
    pub updated_at: UnixTimeMs,
}

impl Case {
    /// `None` when nobody is assigned.
    pub fn assignee(&self) -> Option<&str> {
        let name = self.assigned_to.trim();
        (!name.is_empty()).then_some(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseEvidence {
    pub id: EvidenceId,
    pub case_id: CaseId,
    pub evidence_type: EvidenceType,
    pub evidence_identifier: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub added_by: String,
    pub added_at: UnixTimeMs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseNote {
    pub id: NoteId,
    pub case_id: CaseId,
    pub note: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_by: String,
    pub created_at: UnixTimeMs,
}

/// One page of the case list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CasesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cases: Vec<Case>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub max_pages: u32,
    #[serde(default)]
    pub current_page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricEntry {
    pub identifier: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub firstname: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lastname: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub birthdate: String,
}

impl BiometricEntry {
    /// "Firstname Lastname - birthdate"
    pub fn holder(&self) -> String {
        format!("{} {} - {}", self.firstname, self.lastname, self.birthdate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContainerRef {
    Id(i64),
    Name(String),
}

/// Item reported by the shell's inventory chooser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEvidence {
    pub label: String,
    #[serde(default)]
    pub image_path: String,
    pub container: ContainerRef,
    pub slot: u32,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenEvidence {
    pub evidence: InventoryEvidence,
    pub chosen_at: UnixTimeMs,
}

// --- Screen ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenKind {
    List,
    Detail,
}

/// Exactly one screen is live. The detail screen owns the selected case.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    List(ListScreen),
    Detail(Box<DetailState>),
}

impl Default for Screen {
    fn default() -> Self {
        Self::List(ListScreen::default())
    }
}

impl Screen {
    #[must_use]
    pub fn kind(&self) -> ScreenKind {
        match self {
            Self::List(_) => ScreenKind::List,
            Self::Detail(_) => ScreenKind::Detail,
        }
    }
}

// --- Model ---

#[derive(Debug, Clone)]
pub struct Model {
    pub config: CasesConfig,
    pub search_text: String,
    pub search_debounced: String,
    pub search_generation: u64,
    pub status_filter: StatusFilter,
    pub page: u32,
    pub max_pages: u32,
    pub loading: bool,
    pub error: bool,
    pub data: Option<CasesResponse>,
    pub reload_trigger: u64,
    pub list_request_seq: u64,
    pub detail_generation: u64,
    /// Tags biometric searches across every evidence modal ever opened.
    pub biometric_search_seq: u64,
    /// Set when the shell hands over an endpoint that fails validation; no
    /// server callback is sent while it is present.
    pub config_error: Option<ConfigError>,
    pub screen: Screen,
    pub view_timestamp_ms: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            config: CasesConfig::default(),
            search_text: String::new(),
            search_debounced: String::new(),
            search_generation: 0,
            status_filter: StatusFilter::All,
            page: FIRST_PAGE,
            max_pages: 1,
            loading: true,
            error: false,
            data: None,
            reload_trigger: 0,
            list_request_seq: 0,
            detail_generation: 0,
            biometric_search_seq: 0,
            config_error: None,
            screen: Screen::default(),
            view_timestamp_ms: 0,
        }
    }
}

impl Model {
    pub fn update_timestamp(&mut self) {
        self.view_timestamp_ms = get_current_time_ms();
    }

    pub fn selected_case(&self) -> Option<&Case> {
        self.detail().map(|detail| &detail.case)
    }

    pub fn detail(&self) -> Option<&DetailState> {
        match &self.screen {
            Screen::Detail(detail) => Some(detail),
            Screen::List(_) => None,
        }
    }

    pub fn detail_mut(&mut self) -> Option<&mut DetailState> {
        match &mut self.screen {
            Screen::Detail(detail) => Some(detail),
            Screen::List(_) => None,
        }
    }

    /// Detail state for `case_id`, if that case is still the one on screen.
    pub fn detail_for(&mut self, case_id: CaseId) -> Option<&mut DetailState> {
        self.detail_mut().filter(|detail| detail.case.id == case_id)
    }

    pub fn evidence_modal_mut(&mut self) -> Option<&mut EvidenceModal> {
        self.detail_mut()
            .and_then(|detail| detail.evidence_modal.as_mut())
    }

    pub fn list_mut(&mut self) -> Option<&mut ListScreen> {
        match &mut self.screen {
            Screen::List(list) => Some(list),
            Screen::Detail(_) => None,
        }
    }

    /// Highest page a `PageChanged` may move to.
    #[must_use]
    pub fn last_page(&self) -> u32 {
        self.max_pages.max(FIRST_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod status_tests {
        use super::*;

        #[test]
        fn test_status_round_trip_strings() {
            for status in CaseStatus::ALL {
                assert_eq!(CaseStatus::from_str(status.as_str()), Some(status));
            }
            assert_eq!(CaseStatus::from_str(" Closed "), Some(CaseStatus::Closed));
            assert_eq!(CaseStatus::from_str("pending"), None);
        }

        #[test]
        fn test_filter_serializes_as_plain_string() {
            assert_eq!(serde_json::to_value(StatusFilter::All).unwrap(), "all");
            assert_eq!(
                serde_json::to_value(StatusFilter::Only(CaseStatus::Archived)).unwrap(),
                "archived"
            );
            let parsed: StatusFilter = serde_json::from_str("\"active\"").unwrap();
            assert_eq!(parsed, StatusFilter::Only(CaseStatus::Active));
            assert!(serde_json::from_str::<StatusFilter>("\"bogus\"").is_err());
        }
    }

    mod age_tests {
        use super::*;

        const NOW: UnixTimeMs = UnixTimeMs(1_700_000_000_000);

        fn ago(millis: u64) -> String {
            UnixTimeMs(NOW.0 - millis).age_label(NOW)
        }

        #[test]
        fn test_under_a_minute_and_future() {
            assert_eq!(ago(0), "just now");
            assert_eq!(ago(59_999), "just now");
            assert_eq!(UnixTimeMs(NOW.0 + 600_000).age_label(NOW), "just now");
        }

        #[test]
        fn test_largest_unit_wins() {
            assert_eq!(ago(5 * 60_000), "5m ago");
            assert_eq!(ago(3 * 3_600_000), "3h ago");
            assert_eq!(ago(2 * 86_400_000), "2d ago");
            assert_eq!(ago(14 * 86_400_000), "2w ago");
            assert_eq!(ago(65 * 86_400_000), "2mo ago");
            assert_eq!(ago(800 * 86_400_000), "2y ago");
        }
    }

    mod record_tests {
        use super::*;

        #[test]
        fn test_case_reads_nulls_as_empty() {
            let json = serde_json::json!({
                "id": 42,
                "case_number": "C-42",
                "title": "Bank job",
                "description": null,
                "status": "active",
                "created_by": "Officer Doe",
                "assigned_to": null,
                "created_at": 1_700_000_000_000u64,
                "updated_at": 1_700_000_100_000u64
            });
            let case: Case = serde_json::from_value(json).unwrap();
            assert_eq!(case.id, CaseId(42));
            assert_eq!(case.description, "");
            assert_eq!(case.assignee(), None);
            assert_eq!(case.status, CaseStatus::Active);
        }

        #[test]
        fn test_cases_response_camel_case() {
            let json = serde_json::json!({
                "cases": [],
                "total": 23,
                "maxPages": 3,
                "currentPage": 2
            });
            let response: CasesResponse = serde_json::from_value(json).unwrap();
            assert_eq!(response.max_pages, 3);
            assert_eq!(response.current_page, 2);
            assert_eq!(response.total, 23);
        }

        #[test]
        fn test_inventory_container_number_or_name() {
            let by_id: InventoryEvidence = serde_json::from_value(serde_json::json!({
                "label": "Fingerprint",
                "imagePath": "fingerprint.png",
                "container": 12,
                "slot": 3,
                "identifier": "FP-1"
            }))
            .unwrap();
            assert_eq!(by_id.container, ContainerRef::Id(12));

            let by_name: InventoryEvidence = serde_json::from_value(serde_json::json!({
                "label": "DNA",
                "container": "glovebox-7",
                "slot": 1,
                "identifier": "DNA-9"
            }))
            .unwrap();
            assert_eq!(by_name.container, ContainerRef::Name("glovebox-7".into()));
        }

        #[test]
        fn test_biometric_holder_line() {
            let entry = BiometricEntry {
                identifier: "FP-1".into(),
                firstname: "John".into(),
                lastname: "Doe".into(),
                birthdate: "1990-01-01".into(),
            };
            assert_eq!(entry.holder(), "John Doe - 1990-01-01");
        }
    }

    mod model_tests {
        use super::*;

        #[test]
        fn test_initial_state() {
            let model = Model::default();
            assert!(model.loading);
            assert!(!model.error);
            assert_eq!(model.page, 1);
            assert_eq!(model.status_filter, StatusFilter::All);
            assert_eq!(model.screen.kind(), ScreenKind::List);
            assert!(model.selected_case().is_none());
        }

        #[test]
        fn test_last_page_never_below_one() {
            let mut model = Model::default();
            model.max_pages = 0;
            assert_eq!(model.last_page(), 1);
            model.max_pages = 4;
            assert_eq!(model.last_page(), 4);
        }
    }
}
