use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::core::models::application::{Application, ApplicationCreate, ApplicationDetail, ApplicationInsert, ApplicationResponses, ApplicationStatus, ApplicationType, FulfillmentSummary, ReviewDecision};
use crate::core::models::user::Role;
use crate::core::ports::repository::{ApplicationStore, CatalogStore, Tx, UserStore};
use crate::error::Error;

/// Days a reviewed application is retained before it becomes eligible for the
/// deletion sweep.
pub const RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Resume,
    Transcript,
}

impl DocumentKind {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Resume => "Resume",
            DocumentKind::Transcript => "Transcript",
        }
    }
}

/// Keeps ASCII letters, digits and hyphens; runs of anything else collapse
/// to a single underscore.
pub fn sanitize_name(full_name: &str) -> String {
    let mut out = String::with_capacity(full_name.len());
    let mut gap = false;
    for c in full_name.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            if gap && !out.is_empty() {
                out.push('_');
            }
            gap = false;
            out.push(c);
        } else {
            gap = true;
        }
    }
    out
}

/// Applicant-scoped storage folder: `<sanitized-name>_<user-id>`. Stable for
/// a given name and id, so re-uploads land on the same path.
pub fn document_folder(full_name: &str, uid: i32) -> String {
    format!("{}_{}", sanitize_name(full_name), uid)
}

/// Deterministic file name: `First_Last_Resume.<ext>`, extension taken from
/// the uploaded file name.
pub fn document_file_name(full_name: &str, kind: DocumentKind, original_name: &str) -> String {
    match original_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{}_{}.{}", sanitize_name(full_name), kind.label(), ext.to_lowercase()),
        _ => format!("{}_{}", sanitize_name(full_name), kind.label()),
    }
}

/// Validates the payload and confirms the referenced class/project is
/// actually offered. Runs before any write, so a refused submission leaves
/// nothing behind.
pub async fn prepare_submission<S>(store: &mut S, data: &ApplicationCreate) -> Result<ApplicationResponses, Error>
where
    S: CatalogStore,
{
    let responses = data.validate()?;
    match &responses {
        ApplicationResponses::Class { class_id, .. } => {
            store
                .get_class(*class_id)
                .await?
                .ok_or_else(|| Error::Validation(format!("class {} is not currently offered", class_id)))?;
        }
        ApplicationResponses::Project { project_id, .. } => {
            store
                .get_project(*project_id)
                .await?
                .ok_or_else(|| Error::Validation(format!("project {} is not currently offered", project_id)))?;
        }
        _ => {}
    }
    Ok(responses)
}

pub async fn submit_application<S>(mut store: S, uid: i32, data: &ApplicationCreate, responses: ApplicationResponses, resume_path: Option<String>, transcript_path: Option<String>) -> Result<i32, Error>
where
    S: ApplicationStore + Tx,
{
    let mut insert = ApplicationInsert::new(uid, data.full_name.trim().to_owned(), data.class_year.trim().to_owned(), responses);
    insert.resume_path = resume_path;
    insert.transcript_path = transcript_path;
    let id = store.insert_application(insert).await?;
    store.commit().await?;
    Ok(id)
}

/// List-level visibility (independent of review rights): e-board sees all,
/// board sees everything except board applications submitted by others, and
/// everyone else sees only their own.
pub fn can_view_application(actor: i32, role: Role, app: &Application) -> bool {
    match role {
        Role::Eboard => true,
        Role::Board => app.user_id == actor || app.application_type != ApplicationType::Board,
        _ => app.user_id == actor,
    }
}

/// Review rights: board or above, never the applicant themselves, and only
/// while the application is still pending.
pub fn can_review_application(actor: i32, role: Role, app: &Application) -> bool {
    role >= Role::Board && app.user_id != actor && app.is_pending() && can_view_application(actor, role, app)
}

pub async fn list_applications<S>(store: &mut S, actor: i32, status: Option<ApplicationStatus>, page: i64, size: i64) -> Result<(Vec<Application>, i64), Error>
where
    S: UserStore + ApplicationStore,
{
    let role = store.get_role(actor).await?;
    let total = store.count_applications(actor, role, status).await?;
    let list = store.query_applications(actor, role, status, page, size).await?;
    Ok((list, total))
}

pub async fn application_detail<S>(store: &mut S, actor: i32, id: i32) -> Result<ApplicationDetail, Error>
where
    S: UserStore + ApplicationStore + CatalogStore,
{
    let role = store.get_role(actor).await?;
    let application = store.get_application(id).await?;
    if !can_view_application(actor, role, &application) {
        return Err(Error::PermissionDenied("you do not have access to this application".into()));
    }
    let target_name = match application.application_type {
        ApplicationType::Class => match application.class_id {
            Some(cid) => store.get_class(cid).await?.map(|c| c.name),
            None => None,
        },
        ApplicationType::Project => match application.project_id {
            Some(pid) => store.get_project(pid).await?.map(|p| p.name),
            None => None,
        },
        _ => None,
    };
    let can_review = can_review_application(actor, role, &application);
    let retention = application.reviewed_at.map(|at| RetentionNotice::for_review(at, Utc::now()).to_string());
    Ok(ApplicationDetail {
        application,
        target_name,
        can_review,
        retention,
        resume_url: None,
        transcript_url: None,
    })
}

/// Transitions a pending application to a terminal state and performs the
/// type-specific fulfillment in the same transaction. The stamp is a
/// conditional update on `status = pending`; losing the race surfaces as a
/// conflict and nothing is applied.
pub async fn review_application<S>(mut store: S, reviewer: i32, application_id: i32, decision: ReviewDecision) -> Result<FulfillmentSummary, Error>
where
    S: UserStore + ApplicationStore + CatalogStore + Tx,
{
    let role = store.get_role(reviewer).await?;
    if role < Role::Board {
        return Err(Error::PermissionDenied("reviewing applications requires a board role".into()));
    }
    let app = store.get_application(application_id).await?;
    if !can_view_application(reviewer, role, &app) {
        return Err(Error::PermissionDenied("you do not have access to this application".into()));
    }
    if app.user_id == reviewer {
        return Err(Error::PermissionDenied("you cannot review your own application".into()));
    }
    if !app.is_pending() {
        return Err(Error::Conflict("application already reviewed".into()));
    }
    let updated = store.mark_reviewed(application_id, decision.status(), reviewer, Utc::now()).await?;
    if updated == 0 {
        store.rollback().await?;
        return Err(Error::Conflict("application already reviewed".into()));
    }
    let message = match decision {
        ReviewDecision::Rejected => {
            store
                .notify(app.user_id, &format!("Your {} application was not accepted.", app.application_type.label()))
                .await?;
            format!("Rejected {}'s {} application", app.full_name, app.application_type.label())
        }
        ReviewDecision::Accepted => fulfill(&mut store, &app).await?,
    };
    store.commit().await?;
    log::info!("application {} {:?} by {}", application_id, decision, reviewer);
    Ok(FulfillmentSummary { decision, message })
}

async fn fulfill<S>(store: &mut S, app: &Application) -> Result<String, Error>
where
    S: UserStore + CatalogStore,
{
    let current = store.get_role(app.user_id).await?;
    match app.application_type {
        ApplicationType::ClubAdmission => {
            if current < Role::Member {
                store.grant_role(app.user_id, Role::Member).await?;
            }
            Ok(format!("Granted {} club membership!", app.full_name))
        }
        ApplicationType::Board => {
            let position = app
                .board_position
                .clone()
                .ok_or_else(|| Error::Business("board application carries no position".into()))?;
            if current < Role::Board {
                store.grant_role(app.user_id, Role::Board).await?;
            }
            store.set_board_position(app.user_id, &position).await?;
            Ok(format!("Assigned {} the {} position and changed role to Board", app.full_name, position))
        }
        ApplicationType::Class => {
            let class_id = app.class_id.ok_or_else(|| Error::Business("class application carries no class".into()))?;
            let class = store
                .get_class(class_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("class {}", class_id)))?;
            store.enroll_in_class(class_id, app.user_id).await?;
            Ok(format!("Enrolled {} in {}!", app.full_name, class.name))
        }
        ApplicationType::Project => {
            let project_id = app.project_id.ok_or_else(|| Error::Business("project application carries no project".into()))?;
            let project = store
                .get_project(project_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("project {}", project_id)))?;
            store.add_project_member(project_id, app.user_id).await?;
            Ok(format!("Added {} to {}!", app.full_name, project.name))
        }
    }
}

/// Deletes terminal applications whose 30-day retention window has elapsed.
/// E-board only; the countdown shown in detail views is derived from the same
/// arithmetic.
pub async fn purge_expired_applications<S>(mut store: S, actor: i32, now: DateTime<Utc>) -> Result<i64, Error>
where
    S: UserStore + ApplicationStore + Tx,
{
    let role = store.get_role(actor).await?;
    if role < Role::Eboard {
        return Err(Error::PermissionDenied("the retention sweep requires the e-board role".into()));
    }
    let deleted = store.delete_reviewed_before(now - Duration::days(RETENTION_DAYS)).await?;
    store.commit().await?;
    Ok(deleted)
}

/// Read-only projection of when a reviewed application becomes eligible for
/// deletion. Day counts are calendar-day differences; once the eligibility
/// date has passed the notice degrades to "soon" instead of going negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetentionNotice {
    DeleteIn { days: i64, date: NaiveDate },
    DeleteSoon,
}

impl RetentionNotice {
    pub fn for_review(reviewed_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let eligible = (reviewed_at + Duration::days(RETENTION_DAYS)).date_naive();
        let days = eligible.signed_duration_since(now.date_naive()).num_days();
        if days < 0 {
            RetentionNotice::DeleteSoon
        } else {
            RetentionNotice::DeleteIn { days, date: eligible }
        }
    }
}

impl fmt::Display for RetentionNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionNotice::DeleteIn { days, date } => write!(f, "will be deleted in {} days ({})", days, date),
            RetentionNotice::DeleteSoon => write!(f, "will be deleted soon"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::models::catalog::{Class, Project};
    use crate::core::models::user::{RosterEntry, User, UserInsert};
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Default)]
    struct Inner {
        roles: HashMap<i32, Role>,
        applications: HashMap<i32, Application>,
        classes: HashMap<i32, Class>,
        projects: HashMap<i32, Project>,
        inserted: Vec<ApplicationInsert>,
        enrolled: Vec<(i32, i32)>,
        project_members: Vec<(i32, i32)>,
        positions: Vec<(i32, String)>,
        notifications: Vec<(i32, String)>,
        purge_cutoff: Option<DateTime<Utc>>,
        fail_cas: bool,
        committed: bool,
        rolled_back: bool,
    }

    #[derive(Clone, Default)]
    struct MockStore(Rc<RefCell<Inner>>);

    impl UserStore for MockStore {
        async fn insert_user(&mut self, _data: UserInsert) -> Result<i32, Error> {
            unimplemented!()
        }
        async fn get_user(&mut self, _uid: i32) -> Result<User, Error> {
            unimplemented!()
        }
        async fn get_user_by_email(&mut self, _email: &str) -> Result<Option<User>, Error> {
            unimplemented!()
        }
        async fn get_role(&mut self, uid: i32) -> Result<Role, Error> {
            Ok(self.0.borrow().roles.get(&uid).copied().unwrap_or(Role::Prospect))
        }
        async fn grant_role(&mut self, uid: i32, role: Role) -> Result<(), Error> {
            self.0.borrow_mut().roles.insert(uid, role);
            Ok(())
        }
        async fn set_board_position(&mut self, uid: i32, position: &str) -> Result<(), Error> {
            self.0.borrow_mut().positions.push((uid, position.to_owned()));
            Ok(())
        }
        async fn add_points(&mut self, _uid: i32, _delta: i32) -> Result<(), Error> {
            unimplemented!()
        }
        async fn notify(&mut self, uid: i32, body: &str) -> Result<(), Error> {
            self.0.borrow_mut().notifications.push((uid, body.to_owned()));
            Ok(())
        }
        async fn roster(&mut self, _page: i64, _size: i64) -> Result<(Vec<RosterEntry>, i64), Error> {
            unimplemented!()
        }
        async fn ban_user(&mut self, _uid: i32) -> Result<(), Error> {
            unimplemented!()
        }
        async fn delete_user(&mut self, _uid: i32) -> Result<i64, Error> {
            unimplemented!()
        }
    }

    impl ApplicationStore for MockStore {
        async fn insert_application(&mut self, data: ApplicationInsert) -> Result<i32, Error> {
            let mut inner = self.0.borrow_mut();
            inner.inserted.push(data);
            Ok(inner.inserted.len() as i32)
        }
        async fn get_application(&mut self, id: i32) -> Result<Application, Error> {
            self.0.borrow().applications.get(&id).cloned().ok_or_else(|| Error::NotFound(format!("application {}", id)))
        }
        async fn query_applications(&mut self, actor: i32, role: Role, _status: Option<ApplicationStatus>, _page: i64, _size: i64) -> Result<Vec<Application>, Error> {
            let inner = self.0.borrow();
            let mut list: Vec<Application> = inner.applications.values().filter(|a| can_view_application(actor, role, a)).cloned().collect();
            list.sort_by_key(|a| a.id);
            Ok(list)
        }
        async fn count_applications(&mut self, actor: i32, role: Role, _status: Option<ApplicationStatus>) -> Result<i64, Error> {
            let inner = self.0.borrow();
            Ok(inner.applications.values().filter(|a| can_view_application(actor, role, a)).count() as i64)
        }
        async fn mark_reviewed(&mut self, id: i32, status: ApplicationStatus, reviewer: i32, reviewed_at: DateTime<Utc>) -> Result<u64, Error> {
            let mut inner = self.0.borrow_mut();
            if inner.fail_cas {
                return Ok(0);
            }
            match inner.applications.get_mut(&id) {
                Some(app) if app.is_pending() => {
                    app.status = status;
                    app.reviewed_by = Some(reviewer);
                    app.reviewed_at = Some(reviewed_at);
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
        async fn delete_reviewed_before(&mut self, cutoff: DateTime<Utc>) -> Result<i64, Error> {
            self.0.borrow_mut().purge_cutoff = Some(cutoff);
            Ok(0)
        }
    }

    impl CatalogStore for MockStore {
        async fn get_class(&mut self, id: i32) -> Result<Option<Class>, Error> {
            Ok(self.0.borrow().classes.get(&id).cloned())
        }
        async fn get_project(&mut self, id: i32) -> Result<Option<Project>, Error> {
            Ok(self.0.borrow().projects.get(&id).cloned())
        }
        async fn enroll_in_class(&mut self, class_id: i32, uid: i32) -> Result<(), Error> {
            self.0.borrow_mut().enrolled.push((class_id, uid));
            Ok(())
        }
        async fn add_project_member(&mut self, project_id: i32, uid: i32) -> Result<(), Error> {
            self.0.borrow_mut().project_members.push((project_id, uid));
            Ok(())
        }
    }

    impl Tx for MockStore {
        async fn commit(self) -> Result<(), Error> {
            self.0.borrow_mut().committed = true;
            Ok(())
        }
        async fn rollback(self) -> Result<(), Error> {
            self.0.borrow_mut().rolled_back = true;
            Ok(())
        }
    }

    fn pending(id: i32, uid: i32, application_type: ApplicationType) -> Application {
        Application {
            id,
            user_id: uid,
            application_type,
            full_name: "Ada Lovelace".into(),
            class_year: "2027".into(),
            board_position: (application_type == ApplicationType::Board).then(|| "Treasurer".to_owned()),
            class_id: (application_type == ApplicationType::Class).then_some(7),
            project_id: (application_type == ApplicationType::Project).then_some(3),
            why_join: None,
            why_position: None,
            relevant_experience: None,
            other_commitments: None,
            project_detail: None,
            problem_solved: None,
            previous_experience: None,
            resume_path: None,
            transcript_path: None,
            status: ApplicationStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }

    fn store_with(f: impl FnOnce(&mut Inner)) -> MockStore {
        let store = MockStore::default();
        f(&mut store.0.borrow_mut());
        store
    }

    fn class(id: i32, name: &str) -> Class {
        Class {
            id,
            name: name.into(),
            description: None,
            created_at: Utc::now(),
        }
    }

    fn project(id: i32, name: &str) -> Project {
        Project {
            id,
            name: name.into(),
            description: None,
            created_at: Utc::now(),
        }
    }

    fn admission_create() -> ApplicationCreate {
        ApplicationCreate {
            application_type: ApplicationType::ClubAdmission,
            full_name: "Ada Lovelace".into(),
            class_year: "2027".into(),
            why_join: Some("I like building things".into()),
            ..Default::default()
        }
    }

    #[test]
    fn club_admission_requires_why_join() {
        let mut create = admission_create();
        create.why_join = Some("   ".into());
        let err = create.validate().unwrap_err();
        assert!(matches!(&err, Error::Validation(m) if m.contains("why_join")), "{}", err);
    }

    #[test]
    fn board_validation_reports_every_missing_field() {
        let create = ApplicationCreate {
            application_type: ApplicationType::Board,
            full_name: "Ada Lovelace".into(),
            class_year: "2027".into(),
            board_position: Some("Treasurer".into()),
            why_position: Some("budgets".into()),
            relevant_experience: Some("ran a bake sale".into()),
            ..Default::default()
        };
        let err = create.validate().unwrap_err();
        assert!(matches!(&err, Error::Validation(m) if m.contains("other_commitments")), "{}", err);
    }

    #[test]
    fn validated_inserts_carry_exactly_one_target() {
        let cases = vec![
            ApplicationCreate {
                application_type: ApplicationType::ClubAdmission,
                why_join: Some("x".into()),
                ..admission_create()
            },
            ApplicationCreate {
                application_type: ApplicationType::Board,
                board_position: Some("Treasurer".into()),
                why_position: Some("x".into()),
                relevant_experience: Some("x".into()),
                other_commitments: Some("x".into()),
                ..admission_create()
            },
            ApplicationCreate {
                application_type: ApplicationType::Project,
                project_id: Some(3),
                why_position: Some("x".into()),
                relevant_experience: Some("x".into()),
                project_detail: Some("x".into()),
                problem_solved: Some("x".into()),
                other_commitments: Some("x".into()),
                ..admission_create()
            },
            ApplicationCreate {
                application_type: ApplicationType::Class,
                class_id: Some(7),
                why_position: Some("x".into()),
                previous_experience: Some("x".into()),
                ..admission_create()
            },
        ];
        for create in cases {
            let responses = create.validate().unwrap();
            let insert = ApplicationInsert::new(1, create.full_name.clone(), create.class_year.clone(), responses);
            let targets = [insert.board_position.is_some(), insert.class_id.is_some(), insert.project_id.is_some()];
            let expected = match create.application_type {
                ApplicationType::ClubAdmission => 0,
                _ => 1,
            };
            assert_eq!(targets.iter().filter(|t| **t).count(), expected, "{:?}", create.application_type);
            assert_eq!(insert.application_type, create.application_type);
        }
    }

    #[tokio::test]
    async fn submission_refused_when_class_not_offered() {
        let mut store = store_with(|_| {});
        let create = ApplicationCreate {
            application_type: ApplicationType::Class,
            class_id: Some(7),
            why_position: Some("x".into()),
            previous_experience: Some("x".into()),
            ..admission_create()
        };
        let err = prepare_submission(&mut store, &create).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.0.borrow().inserted.is_empty());
    }

    #[tokio::test]
    async fn submission_inserts_pending_row() {
        let store = store_with(|_| {});
        let create = admission_create();
        let responses = create.validate().unwrap();
        let id = submit_application(store.clone(), 9, &create, responses, None, None).await.unwrap();
        let inner = store.0.borrow();
        assert_eq!(id, 1);
        assert!(inner.committed);
        let row = &inner.inserted[0];
        assert_eq!(row.user_id, 9);
        assert!(row.board_position.is_none() && row.class_id.is_none() && row.project_id.is_none());
    }

    #[tokio::test]
    async fn review_requires_board_role() {
        let store = store_with(|inner| {
            inner.roles.insert(1, Role::Member);
            inner.applications.insert(10, pending(10, 2, ApplicationType::ClubAdmission));
        });
        let err = review_application(store, 1, 10, ReviewDecision::Accepted).await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn board_cannot_review_anothers_board_application() {
        let store = store_with(|inner| {
            inner.roles.insert(1, Role::Board);
            inner.roles.insert(2, Role::Member);
            inner.applications.insert(10, pending(10, 2, ApplicationType::Board));
        });
        let err = review_application(store.clone(), 1, 10, ReviewDecision::Accepted).await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        let inner = store.0.borrow();
        assert_eq!(inner.roles.get(&2), Some(&Role::Member));
        assert!(inner.positions.is_empty());
        assert!(!inner.committed);
    }

    #[tokio::test]
    async fn self_review_is_refused_regardless_of_role() {
        let store = store_with(|inner| {
            inner.roles.insert(1, Role::Eboard);
            inner.applications.insert(10, pending(10, 1, ApplicationType::Board));
        });
        let err = review_application(store.clone(), 1, 10, ReviewDecision::Accepted).await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        assert!(!store.0.borrow().committed);
    }

    #[tokio::test]
    async fn terminal_application_cannot_be_reviewed_again() {
        let store = store_with(|inner| {
            inner.roles.insert(1, Role::Board);
            let mut app = pending(10, 2, ApplicationType::ClubAdmission);
            app.status = ApplicationStatus::Accepted;
            app.reviewed_by = Some(3);
            app.reviewed_at = Some(Utc::now());
            inner.applications.insert(10, app);
        });
        let err = review_application(store, 1, 10, ReviewDecision::Rejected).await.unwrap_err();
        assert!(matches!(&err, Error::Conflict(m) if m == "application already reviewed"));
    }

    #[tokio::test]
    async fn losing_the_review_race_rolls_back() {
        let store = store_with(|inner| {
            inner.roles.insert(1, Role::Board);
            inner.fail_cas = true;
            inner.applications.insert(10, pending(10, 2, ApplicationType::ClubAdmission));
        });
        let err = review_application(store.clone(), 1, 10, ReviewDecision::Accepted).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        let inner = store.0.borrow();
        assert!(inner.rolled_back && !inner.committed);
        assert!(inner.roles.get(&2).is_none(), "no fulfillment after a lost race");
    }

    #[tokio::test]
    async fn accepting_class_application_enrolls_the_student() {
        let store = store_with(|inner| {
            inner.roles.insert(1, Role::Board);
            inner.roles.insert(2, Role::Member);
            inner.classes.insert(7, class(7, "Intro to ML"));
            inner.applications.insert(10, pending(10, 2, ApplicationType::Class));
        });
        let summary = review_application(store.clone(), 1, 10, ReviewDecision::Accepted).await.unwrap();
        assert_eq!(summary.message, "Enrolled Ada Lovelace in Intro to ML!");
        let inner = store.0.borrow();
        assert!(inner.committed);
        assert_eq!(inner.enrolled, vec![(7, 2)]);
        let app = &inner.applications[&10];
        assert_eq!(app.status, ApplicationStatus::Accepted);
        assert!(app.reviewed_by.is_some() && app.reviewed_at.is_some());
    }

    #[tokio::test]
    async fn accepting_admission_promotes_prospect_but_never_demotes() {
        let store = store_with(|inner| {
            inner.roles.insert(1, Role::Eboard);
            inner.roles.insert(2, Role::Prospect);
            inner.roles.insert(3, Role::Eboard);
            inner.applications.insert(10, pending(10, 2, ApplicationType::ClubAdmission));
            inner.applications.insert(11, pending(11, 3, ApplicationType::ClubAdmission));
        });
        review_application(store.clone(), 1, 10, ReviewDecision::Accepted).await.unwrap();
        review_application(store.clone(), 1, 11, ReviewDecision::Accepted).await.unwrap();
        let inner = store.0.borrow();
        assert_eq!(inner.roles[&2], Role::Member);
        assert_eq!(inner.roles[&3], Role::Eboard);
    }

    #[tokio::test]
    async fn accepting_board_application_assigns_the_position() {
        let store = store_with(|inner| {
            inner.roles.insert(1, Role::Eboard);
            inner.roles.insert(2, Role::Member);
            inner.applications.insert(10, pending(10, 2, ApplicationType::Board));
        });
        let summary = review_application(store.clone(), 1, 10, ReviewDecision::Accepted).await.unwrap();
        assert_eq!(summary.message, "Assigned Ada Lovelace the Treasurer position and changed role to Board");
        let inner = store.0.borrow();
        assert_eq!(inner.roles[&2], Role::Board);
        assert_eq!(inner.positions, vec![(2, "Treasurer".to_owned())]);
    }

    #[tokio::test]
    async fn rejection_updates_status_and_notifies_only() {
        let store = store_with(|inner| {
            inner.roles.insert(1, Role::Board);
            inner.roles.insert(2, Role::Prospect);
            inner.applications.insert(10, pending(10, 2, ApplicationType::ClubAdmission));
        });
        let summary = review_application(store.clone(), 1, 10, ReviewDecision::Rejected).await.unwrap();
        assert_eq!(summary.decision, ReviewDecision::Rejected);
        let inner = store.0.borrow();
        assert_eq!(inner.applications[&10].status, ApplicationStatus::Rejected);
        assert_eq!(inner.roles[&2], Role::Prospect);
        assert_eq!(inner.notifications.len(), 1);
        assert!(inner.enrolled.is_empty());
    }

    #[tokio::test]
    async fn board_actor_never_sees_another_users_board_application() {
        let mut store = store_with(|inner| {
            inner.roles.insert(1, Role::Board);
            inner.applications.insert(10, pending(10, 1, ApplicationType::Board));
            inner.applications.insert(11, pending(11, 2, ApplicationType::Board));
            inner.applications.insert(12, pending(12, 2, ApplicationType::ClubAdmission));
            inner.applications.insert(13, pending(13, 3, ApplicationType::Class));
        });
        let (list, total) = list_applications(&mut store, 1, None, 1, 50).await.unwrap();
        let ids: Vec<i32> = list.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![10, 12, 13]);
        assert_eq!(total, 3);
    }

    #[test]
    fn visibility_rules_by_role() {
        let own_board = pending(1, 5, ApplicationType::Board);
        let other_board = pending(2, 6, ApplicationType::Board);
        let other_admission = pending(3, 6, ApplicationType::ClubAdmission);
        assert!(can_view_application(5, Role::Eboard, &other_board));
        assert!(can_view_application(5, Role::Board, &own_board));
        assert!(!can_view_application(5, Role::Board, &other_board));
        assert!(can_view_application(5, Role::Board, &other_admission));
        assert!(!can_view_application(5, Role::Member, &other_admission));
        assert!(can_view_application(6, Role::Prospect, &other_admission));
    }

    #[test]
    fn review_controls_hidden_for_applicant_and_low_roles() {
        let app = pending(1, 5, ApplicationType::Board);
        assert!(!can_review_application(5, Role::Eboard, &app));
        assert!(!can_review_application(6, Role::Member, &app));
        assert!(can_review_application(6, Role::Eboard, &app));
        let mut reviewed = app;
        reviewed.status = ApplicationStatus::Accepted;
        assert!(!can_review_application(6, Role::Eboard, &reviewed));
    }

    #[test]
    fn retention_countdown_decreases_daily_then_degrades() {
        let reviewed = Utc.with_ymd_and_hms(2026, 1, 1, 15, 30, 0).unwrap();
        let eligible = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(
            RetentionNotice::for_review(reviewed, Utc.with_ymd_and_hms(2026, 1, 2, 8, 0, 0).unwrap()),
            RetentionNotice::DeleteIn { days: 29, date: eligible }
        );
        assert_eq!(
            RetentionNotice::for_review(reviewed, Utc.with_ymd_and_hms(2026, 1, 3, 23, 0, 0).unwrap()),
            RetentionNotice::DeleteIn { days: 28, date: eligible }
        );
        assert_eq!(
            RetentionNotice::for_review(reviewed, Utc.with_ymd_and_hms(2026, 1, 31, 1, 0, 0).unwrap()),
            RetentionNotice::DeleteIn { days: 0, date: eligible }
        );
        // 31 days after review: never a negative count.
        let soon = RetentionNotice::for_review(reviewed, Utc.with_ymd_and_hms(2026, 2, 1, 1, 0, 0).unwrap());
        assert_eq!(soon, RetentionNotice::DeleteSoon);
        assert_eq!(soon.to_string(), "will be deleted soon");
    }

    #[test]
    fn retention_notice_display() {
        let reviewed = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let notice = RetentionNotice::for_review(reviewed, Utc.with_ymd_and_hms(2026, 1, 26, 0, 0, 0).unwrap());
        assert_eq!(notice.to_string(), "will be deleted in 5 days (2026-01-31)");
    }

    #[test]
    fn document_naming_is_deterministic() {
        assert_eq!(sanitize_name("Ada  Lovelace"), "Ada_Lovelace");
        assert_eq!(sanitize_name("  O'Brien, Marie "), "O_Brien_Marie");
        assert_eq!(sanitize_name("a__b"), "a_b");
        assert_eq!(document_folder("Ada Lovelace", 42), "Ada_Lovelace_42");
        assert_eq!(document_file_name("Ada Lovelace", DocumentKind::Resume, "cv.PDF"), "Ada_Lovelace_Resume.pdf");
        assert_eq!(document_file_name("Ada Lovelace", DocumentKind::Transcript, "fall.pdf"), "Ada_Lovelace_Transcript.pdf");
        // re-upload for the same name and id lands on the same path
        assert_eq!(
            document_file_name("Ada Lovelace", DocumentKind::Resume, "a.pdf"),
            document_file_name("Ada Lovelace", DocumentKind::Resume, "b.pdf")
        );
    }

    #[tokio::test]
    async fn purge_is_eboard_only_and_uses_the_retention_window() {
        let store = store_with(|inner| {
            inner.roles.insert(1, Role::Board);
            inner.roles.insert(2, Role::Eboard);
        });
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let err = purge_expired_applications(store.clone(), 1, now).await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        purge_expired_applications(store.clone(), 2, now).await.unwrap();
        assert_eq!(store.0.borrow().purge_cutoff, Some(now - Duration::days(30)));
    }
}
