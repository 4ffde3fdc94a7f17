use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    ClubAdmission,
    Board,
    Project,
    Class,
}

impl ApplicationType {
    pub fn label(&self) -> &'static str {
        match self {
            ApplicationType::ClubAdmission => "club admission",
            ApplicationType::Board => "board",
            ApplicationType::Project => "project",
            ApplicationType::Class => "class",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Terminal decision a reviewer can take on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Accepted,
    Rejected,
}

impl ReviewDecision {
    pub fn status(&self) -> ApplicationStatus {
        match self {
            ReviewDecision::Accepted => ApplicationStatus::Accepted,
            ReviewDecision::Rejected => ApplicationStatus::Rejected,
        }
    }
}

/// Row shape as stored. The nullable response columns are only meaningful in
/// the combinations [`ApplicationResponses`] can produce; the database carries
/// matching CHECK constraints.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Application {
    pub id: i32,
    pub user_id: i32,
    pub application_type: ApplicationType,
    pub full_name: String,
    pub class_year: String,
    pub board_position: Option<String>,
    pub class_id: Option<i32>,
    pub project_id: Option<i32>,
    pub why_join: Option<String>,
    pub why_position: Option<String>,
    pub relevant_experience: Option<String>,
    pub other_commitments: Option<String>,
    pub project_detail: Option<String>,
    pub problem_solved: Option<String>,
    pub previous_experience: Option<String>,
    pub resume_path: Option<String>,
    pub transcript_path: Option<String>,
    pub status: ApplicationStatus,
    pub reviewed_by: Option<i32>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Application {
    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}

/// Raw submission payload. Every response field is optional here; which ones
/// are actually required depends on `application_type` and is decided by
/// [`ApplicationCreate::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationCreate {
    pub application_type: ApplicationType,
    pub full_name: String,
    pub class_year: String,
    pub board_position: Option<String>,
    pub class_id: Option<i32>,
    pub project_id: Option<i32>,
    pub why_join: Option<String>,
    pub why_position: Option<String>,
    pub relevant_experience: Option<String>,
    pub other_commitments: Option<String>,
    pub project_detail: Option<String>,
    pub problem_solved: Option<String>,
    pub previous_experience: Option<String>,
}

impl Default for ApplicationType {
    fn default() -> Self {
        ApplicationType::ClubAdmission
    }
}

/// Validated responses, one variant per application type. Each variant carries
/// exactly the fields that type requires (plus its optional extras), so target
/// exclusivity holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationResponses {
    ClubAdmission {
        why_join: String,
        relevant_experience: Option<String>,
    },
    Board {
        board_position: String,
        why_position: String,
        relevant_experience: String,
        other_commitments: String,
        previous_experience: Option<String>,
    },
    Project {
        project_id: i32,
        why_position: String,
        relevant_experience: String,
        project_detail: String,
        problem_solved: String,
        other_commitments: String,
    },
    Class {
        class_id: i32,
        why_position: String,
        previous_experience: String,
        relevant_experience: Option<String>,
    },
}

fn text(field: &Option<String>) -> Option<String> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

macro_rules! require {
    ($missing:ident, $field:expr, $name:literal) => {
        match $field {
            Some(v) => Some(v),
            None => {
                $missing.push($name);
                None
            }
        }
    };
}

impl ApplicationCreate {
    /// Exhaustive per-type validation. Blank strings count as missing; all
    /// missing fields are reported in one pass.
    pub fn validate(&self) -> Result<ApplicationResponses, Error> {
        if self.full_name.trim().is_empty() || self.class_year.trim().is_empty() {
            return Err(Error::Validation("required field missing: full_name, class_year".into()));
        }
        let mut missing: Vec<&'static str> = Vec::new();
        let responses = match self.application_type {
            ApplicationType::ClubAdmission => {
                let why_join = require!(missing, text(&self.why_join), "why_join");
                why_join.map(|why_join| ApplicationResponses::ClubAdmission {
                    why_join,
                    relevant_experience: text(&self.relevant_experience),
                })
            }
            ApplicationType::Board => {
                let board_position = require!(missing, text(&self.board_position), "board_position");
                let why_position = require!(missing, text(&self.why_position), "why_position");
                let relevant_experience = require!(missing, text(&self.relevant_experience), "relevant_experience");
                let other_commitments = require!(missing, text(&self.other_commitments), "other_commitments");
                match (board_position, why_position, relevant_experience, other_commitments) {
                    (Some(board_position), Some(why_position), Some(relevant_experience), Some(other_commitments)) => Some(ApplicationResponses::Board {
                        board_position,
                        why_position,
                        relevant_experience,
                        other_commitments,
                        previous_experience: text(&self.previous_experience),
                    }),
                    _ => None,
                }
            }
            ApplicationType::Project => {
                let project_id = require!(missing, self.project_id, "project_id");
                let why_position = require!(missing, text(&self.why_position), "why_position");
                let relevant_experience = require!(missing, text(&self.relevant_experience), "relevant_experience");
                let project_detail = require!(missing, text(&self.project_detail), "project_detail");
                let problem_solved = require!(missing, text(&self.problem_solved), "problem_solved");
                let other_commitments = require!(missing, text(&self.other_commitments), "other_commitments");
                match (project_id, why_position, relevant_experience, project_detail, problem_solved, other_commitments) {
                    (Some(project_id), Some(why_position), Some(relevant_experience), Some(project_detail), Some(problem_solved), Some(other_commitments)) => {
                        Some(ApplicationResponses::Project {
                            project_id,
                            why_position,
                            relevant_experience,
                            project_detail,
                            problem_solved,
                            other_commitments,
                        })
                    }
                    _ => None,
                }
            }
            ApplicationType::Class => {
                let class_id = require!(missing, self.class_id, "class_id");
                let why_position = require!(missing, text(&self.why_position), "why_position");
                let previous_experience = require!(missing, text(&self.previous_experience), "previous_experience");
                match (class_id, why_position, previous_experience) {
                    (Some(class_id), Some(why_position), Some(previous_experience)) => Some(ApplicationResponses::Class {
                        class_id,
                        why_position,
                        previous_experience,
                        relevant_experience: text(&self.relevant_experience),
                    }),
                    _ => None,
                }
            }
        };
        responses.ok_or_else(|| Error::Validation(format!("required field missing: {}", missing.iter().join(", "))))
    }
}

/// Insert shape, produced only from validated responses so a row can never
/// carry a target that disagrees with its type.
#[derive(Debug, Clone)]
pub struct ApplicationInsert {
    pub user_id: i32,
    pub application_type: ApplicationType,
    pub full_name: String,
    pub class_year: String,
    pub board_position: Option<String>,
    pub class_id: Option<i32>,
    pub project_id: Option<i32>,
    pub why_join: Option<String>,
    pub why_position: Option<String>,
    pub relevant_experience: Option<String>,
    pub other_commitments: Option<String>,
    pub project_detail: Option<String>,
    pub problem_solved: Option<String>,
    pub previous_experience: Option<String>,
    pub resume_path: Option<String>,
    pub transcript_path: Option<String>,
}

impl ApplicationInsert {
    pub fn new(user_id: i32, full_name: String, class_year: String, responses: ApplicationResponses) -> Self {
        let mut insert = ApplicationInsert {
            user_id,
            application_type: ApplicationType::ClubAdmission,
            full_name,
            class_year,
            board_position: None,
            class_id: None,
            project_id: None,
            why_join: None,
            why_position: None,
            relevant_experience: None,
            other_commitments: None,
            project_detail: None,
            problem_solved: None,
            previous_experience: None,
            resume_path: None,
            transcript_path: None,
        };
        match responses {
            ApplicationResponses::ClubAdmission { why_join, relevant_experience } => {
                insert.application_type = ApplicationType::ClubAdmission;
                insert.why_join = Some(why_join);
                insert.relevant_experience = relevant_experience;
            }
            ApplicationResponses::Board {
                board_position,
                why_position,
                relevant_experience,
                other_commitments,
                previous_experience,
            } => {
                insert.application_type = ApplicationType::Board;
                insert.board_position = Some(board_position);
                insert.why_position = Some(why_position);
                insert.relevant_experience = Some(relevant_experience);
                insert.other_commitments = Some(other_commitments);
                insert.previous_experience = previous_experience;
            }
            ApplicationResponses::Project {
                project_id,
                why_position,
                relevant_experience,
                project_detail,
                problem_solved,
                other_commitments,
            } => {
                insert.application_type = ApplicationType::Project;
                insert.project_id = Some(project_id);
                insert.why_position = Some(why_position);
                insert.relevant_experience = Some(relevant_experience);
                insert.project_detail = Some(project_detail);
                insert.problem_solved = Some(problem_solved);
                insert.other_commitments = Some(other_commitments);
            }
            ApplicationResponses::Class {
                class_id,
                why_position,
                previous_experience,
                relevant_experience,
            } => {
                insert.application_type = ApplicationType::Class;
                insert.class_id = Some(class_id);
                insert.why_position = Some(why_position);
                insert.previous_experience = Some(previous_experience);
                insert.relevant_experience = relevant_experience;
            }
        }
        insert
    }
}

#[derive(Debug, Serialize)]
pub struct FulfillmentSummary {
    pub decision: ReviewDecision,
    pub message: String,
}

/// Detail projection for the review surface. Signed document URLs are minted
/// by the handler right before the response goes out; they are never stored.
#[derive(Debug, Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub target_name: Option<String>,
    pub can_review: bool,
    pub retention: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_url: Option<String>,
}
