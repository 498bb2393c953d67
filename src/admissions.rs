use crate::backend::Backend;
use crate::db::Stakeholder;
use crate::error::AppError;
use crate::format::display_date;
use crate::stage::AdmissionStage;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

pub const APPLICANT_KIND: &str = "applicant";

/// Display row for the admissions pipeline table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub class_name: String,
    pub stage: i64,
    pub stage_label: &'static str,
    pub updated: String,
}

impl AdmissionRow {
    pub fn from_stakeholder(s: &Stakeholder) -> Self {
        // Applicants created before a stage was assigned are still inquiries.
        let stage = s
            .stage
            .and_then(|n| AdmissionStage::from_number(n).ok())
            .unwrap_or(AdmissionStage::Inquiry);
        Self {
            id: s.id.clone(),
            name: s.display_name(),
            email: s.email.clone().unwrap_or_default(),
            class_name: s.class_name.clone().unwrap_or_default(),
            stage: stage.number(),
            stage_label: stage.label(),
            updated: s.updated_at.as_deref().map(display_date).unwrap_or_default(),
        }
    }

    fn set_stage(&mut self, stage: AdmissionStage) {
        self.stage = stage.number();
        self.stage_label = stage.label();
    }

    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.email.to_lowercase().contains(&needle)
            || self.class_name.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageChange {
    pub from: AdmissionStage,
    pub to: AdmissionStage,
}

/// A refused stage change. `rolled_back` is set when the row had already been
/// moved and was restored after the backend failed.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct StageChangeError {
    pub rolled_back: bool,
    pub source: AppError,
}

impl From<AppError> for StageChangeError {
    fn from(source: AppError) -> Self {
        Self {
            rolled_back: false,
            source,
        }
    }
}

/// The admission rows currently shown, updated optimistically on stage changes.
#[derive(Debug, Clone, Default)]
pub struct AdmissionBoard {
    rows: Vec<AdmissionRow>,
}

impl AdmissionBoard {
    pub fn replace(&mut self, rows: Vec<AdmissionRow>) {
        self.rows = rows;
    }

    /// Insert a row fetched outside a listing, or refresh it in place.
    pub fn upsert(&mut self, row: AdmissionRow) {
        match self.rows.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row,
            None => self.rows.push(row),
        }
    }

    pub fn rows(&self) -> &[AdmissionRow] {
        &self.rows
    }

    pub fn get(&self, id: &str) -> Option<&AdmissionRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Move one applicant to `to`. The board row changes before the backend
    /// call; if the backend refuses, the row is restored and the error returned.
    pub fn set_stage<B: Backend>(
        &mut self,
        backend: &B,
        id: &str,
        to: AdmissionStage,
    ) -> Result<StageChange, StageChangeError> {
        let idx = self
            .rows
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::not_found("admission", id))?;

        let snapshot = self.rows[idx].clone();
        let from = AdmissionStage::from_number(snapshot.stage)?;
        if from == to {
            return Err(AppError::StageUnchanged(to.label()).into());
        }

        self.rows[idx].set_stage(to);
        match backend.patch_stakeholder_stage(id, to) {
            Ok(()) => {
                info!(stakeholder = id, from = from.label(), to = to.label(), "admission stage changed");
                Ok(StageChange { from, to })
            }
            Err(e) => {
                self.rows[idx] = snapshot;
                warn!(stakeholder = id, error = %e, "stage update failed, restored previous stage");
                Err(StageChangeError {
                    rolled_back: true,
                    source: e,
                })
            }
        }
    }
}
