//! Server callbacks reachable through `triggerServerCallback` and their payloads.
//!
//! Argument keys are camelCase because that is what the server-side handlers
//! read. Records coming back use snake_case (see [`crate::model`]).

use serde::{Deserialize, Serialize};

use crate::model::{
    BiometricEntry, CaseId, CaseStatus, EvidenceId, EvidenceType, StatusFilter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerCallback {
    GetCases,
    CreateCase,
    DeleteCase,
    GetCaseEvidence,
    GetCaseNotes,
    UpdateCase,
    AddCaseNote,
    AddEvidenceToCase,
    RemoveEvidenceFromCase,
    GetStoredBiometricDataEntries,
}

impl ServerCallback {
    pub const ALL: [ServerCallback; 10] = [
        Self::GetCases,
        Self::CreateCase,
        Self::DeleteCase,
        Self::GetCaseEvidence,
        Self::GetCaseNotes,
        Self::UpdateCase,
        Self::AddCaseNote,
        Self::AddEvidenceToCase,
        Self::RemoveEvidenceFromCase,
        Self::GetStoredBiometricDataEntries,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetCases => "evidences:getCases",
            Self::CreateCase => "evidences:createCase",
            Self::DeleteCase => "evidences:deleteCase",
            Self::GetCaseEvidence => "evidences:getCaseEvidence",
            Self::GetCaseNotes => "evidences:getCaseNotes",
            Self::UpdateCase => "evidences:updateCase",
            Self::AddCaseNote => "evidences:addCaseNote",
            Self::AddEvidenceToCase => "evidences:addEvidenceToCase",
            Self::RemoveEvidenceFromCase => "evidences:removeEvidenceFromCase",
            Self::GetStoredBiometricDataEntries => "evidences:getStoredBiometricDataEntries",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Envelope<'a, A: Serialize> {
    pub name: &'static str,
    pub arguments: &'a A,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCasesArgs {
    pub search: String,
    pub status: StatusFilter,
    pub page: u32,
    pub limit: u32,
}

/// `{caseId}`, shared by delete and both detail loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRefArgs {
    pub case_id: CaseId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaseArgs {
    pub case_number: String,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaseArgs {
    pub case_id: CaseId,
    pub title: String,
    pub description: String,
    pub status: CaseStatus,
    pub assigned_to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCaseNoteArgs {
    pub case_id: CaseId,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEvidenceArgs {
    pub case_id: CaseId,
    pub evidence_type: EvidenceType,
    pub evidence_identifier: String,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveEvidenceArgs {
    pub evidence_id: EvidenceId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricSearchArgs {
    pub types: Vec<EvidenceType>,
    pub search: String,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BiometricSearchResponse {
    #[serde(default)]
    pub entries: Option<Vec<BiometricEntry>>,
}

impl BiometricSearchResponse {
    /// Missing or `null` entries read as an empty result set.
    pub fn into_entries(self) -> Vec<BiometricEntry> {
        self.entries.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_callback_names_are_unique_and_namespaced() {
        let names: HashSet<_> = ServerCallback::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), ServerCallback::ALL.len());
        assert!(names.iter().all(|n| n.starts_with("evidences:")));
    }

    #[test]
    fn test_update_args_keys() {
        let args = UpdateCaseArgs {
            case_id: CaseId(42),
            title: "T".into(),
            description: "D".into(),
            status: CaseStatus::Closed,
            assigned_to: "Smith".into(),
        };
        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            serde_json::json!({
                "caseId": 42,
                "title": "T",
                "description": "D",
                "status": "closed",
                "assignedTo": "Smith"
            })
        );
    }

    #[test]
    fn test_evidence_args_keys() {
        let args = AddEvidenceArgs {
            case_id: CaseId(3),
            evidence_type: EvidenceType::Dna,
            evidence_identifier: "DNA-1".into(),
            notes: String::new(),
        };
        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            serde_json::json!({
                "caseId": 3,
                "evidenceType": "dna",
                "evidenceIdentifier": "DNA-1",
                "notes": ""
            })
        );
        assert_eq!(
            serde_json::to_value(RemoveEvidenceArgs {
                evidence_id: EvidenceId(7)
            })
            .unwrap(),
            serde_json::json!({ "evidenceId": 7 })
        );
    }

    #[test]
    fn test_biometric_response_defaults_to_empty() {
        let missing: BiometricSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(missing.into_entries().is_empty());

        let null: BiometricSearchResponse = serde_json::from_str(r#"{"entries":null}"#).unwrap();
        assert!(null.into_entries().is_empty());

        let some: BiometricSearchResponse = serde_json::from_str(
            r#"{"entries":[{"identifier":"FP-1","firstname":"Jane","lastname":"Roe","birthdate":"1985-02-03"}]}"#,
        )
        .unwrap();
        assert_eq!(some.into_entries()[0].identifier, "FP-1");
    }
}
