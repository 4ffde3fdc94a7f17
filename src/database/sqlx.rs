use chrono::{DateTime, Utc};
use sqlx::{query, query_as, query_scalar, Executor, Postgres, Transaction};
use uuid::Uuid;

use crate::core::models::{
    application::{Application, ApplicationInsert, ApplicationStatus},
    catalog::{Class, Project},
    event::Event,
    user::{RosterEntry, Role, User, UserInsert},
};
use crate::core::ports::repository::{ApplicationStore, CatalogStore, EventStore, Tx, UserStore};
use crate::error::Error;

/// Postgres-backed store, generic over a pool connection or an open
/// transaction. Mutating services run against the transaction flavor and
/// commit through [`Tx`].
pub struct PgStore<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    executor: E,
}

impl<E> PgStore<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

impl<E> UserStore for PgStore<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert_user(&mut self, data: UserInsert) -> Result<i32, Error> {
        let id = query_scalar(
            "
        INSERT INTO users (full_name, class_year, email, password, salt)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id",
        )
        .bind(data.full_name)
        .bind(data.class_year)
        .bind(data.email)
        .bind(data.password)
        .bind(data.salt)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }

    async fn get_user(&mut self, uid: i32) -> Result<User, Error> {
        query_as("SELECT * FROM users WHERE id = $1")
            .bind(uid)
            .fetch_optional(&mut self.executor)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {}", uid)))
    }

    async fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>, Error> {
        let user = query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(user)
    }

    async fn get_role(&mut self, uid: i32) -> Result<Role, Error> {
        let role: Option<Role> = query_scalar("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(uid)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(role.unwrap_or(Role::Prospect))
    }

    async fn grant_role(&mut self, uid: i32, role: Role) -> Result<(), Error> {
        query(
            "
        INSERT INTO user_roles (user_id, role)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role",
        )
        .bind(uid)
        .bind(role)
        .execute(&mut self.executor)
        .await?;
        Ok(())
    }

    async fn set_board_position(&mut self, uid: i32, position: &str) -> Result<(), Error> {
        query("UPDATE user_roles SET board_position = $2 WHERE user_id = $1")
            .bind(uid)
            .bind(position)
            .execute(&mut self.executor)
            .await?;
        Ok(())
    }

    async fn add_points(&mut self, uid: i32, delta: i32) -> Result<(), Error> {
        query("UPDATE users SET points = points + $2 WHERE id = $1")
            .bind(uid)
            .bind(delta)
            .execute(&mut self.executor)
            .await?;
        Ok(())
    }

    async fn notify(&mut self, uid: i32, body: &str) -> Result<(), Error> {
        query("INSERT INTO notifications (user_id, body) VALUES ($1, $2)")
            .bind(uid)
            .bind(body)
            .execute(&mut self.executor)
            .await?;
        Ok(())
    }

    async fn roster(&mut self, page: i64, size: i64) -> Result<(Vec<RosterEntry>, i64), Error> {
        let total: i64 = query_scalar("SELECT COUNT(*) FROM users WHERE banned_at IS NULL")
            .fetch_one(&mut self.executor)
            .await?;
        let list = query_as(
            "
        SELECT u.id, u.full_name, u.class_year, COALESCE(r.role, 'prospect'::user_role) AS role, u.points
        FROM users AS u
        LEFT JOIN user_roles AS r ON u.id = r.user_id
        WHERE u.banned_at IS NULL
        ORDER BY u.full_name
        LIMIT $1
        OFFSET $2",
        )
        .bind(size)
        .bind((page - 1) * size)
        .fetch_all(&mut self.executor)
        .await?;
        Ok((list, total))
    }

    async fn ban_user(&mut self, uid: i32) -> Result<(), Error> {
        query("UPDATE users SET banned_at = NOW() WHERE id = $1 AND banned_at IS NULL")
            .bind(uid)
            .execute(&mut self.executor)
            .await?;
        Ok(())
    }

    async fn delete_user(&mut self, uid: i32) -> Result<i64, Error> {
        let res = query("DELETE FROM users WHERE id = $1").bind(uid).execute(&mut self.executor).await?;
        Ok(res.rows_affected() as i64)
    }
}

impl<E> ApplicationStore for PgStore<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert_application(&mut self, data: ApplicationInsert) -> Result<i32, Error> {
        let id = query_scalar(
            "
        INSERT INTO applications (
            user_id, application_type, full_name, class_year,
            board_position, class_id, project_id,
            why_join, why_position, relevant_experience, other_commitments,
            project_detail, problem_solved, previous_experience,
            resume_path, transcript_path, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 'pending')
        RETURNING id",
        )
        .bind(data.user_id)
        .bind(data.application_type)
        .bind(data.full_name)
        .bind(data.class_year)
        .bind(data.board_position)
        .bind(data.class_id)
        .bind(data.project_id)
        .bind(data.why_join)
        .bind(data.why_position)
        .bind(data.relevant_experience)
        .bind(data.other_commitments)
        .bind(data.project_detail)
        .bind(data.problem_solved)
        .bind(data.previous_experience)
        .bind(data.resume_path)
        .bind(data.transcript_path)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }

    async fn get_application(&mut self, id: i32) -> Result<Application, Error> {
        query_as("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut self.executor)
            .await?
            .ok_or_else(|| Error::NotFound(format!("application {}", id)))
    }

    async fn query_applications(&mut self, actor: i32, role: Role, status: Option<ApplicationStatus>, page: i64, size: i64) -> Result<Vec<Application>, Error> {
        // Same scoping predicate as count_applications; the database policy is
        // the authority, handler-side checks are a convenience.
        let list = query_as(
            "
        SELECT *
        FROM applications
        WHERE CASE
                WHEN $2 = 'eboard'::user_role THEN TRUE
                WHEN $2 = 'board'::user_role THEN user_id = $1 OR application_type <> 'board'::application_type
                ELSE user_id = $1
            END
            AND ($3::application_status IS NULL OR status = $3)
        ORDER BY created_at DESC
        LIMIT $4
        OFFSET $5",
        )
        .bind(actor)
        .bind(role)
        .bind(status)
        .bind(size)
        .bind((page - 1) * size)
        .fetch_all(&mut self.executor)
        .await?;
        Ok(list)
    }

    async fn count_applications(&mut self, actor: i32, role: Role, status: Option<ApplicationStatus>) -> Result<i64, Error> {
        let total = query_scalar(
            "
        SELECT COUNT(*)
        FROM applications
        WHERE CASE
                WHEN $2 = 'eboard'::user_role THEN TRUE
                WHEN $2 = 'board'::user_role THEN user_id = $1 OR application_type <> 'board'::application_type
                ELSE user_id = $1
            END
            AND ($3::application_status IS NULL OR status = $3)",
        )
        .bind(actor)
        .bind(role)
        .bind(status)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(total)
    }

    async fn mark_reviewed(&mut self, id: i32, status: ApplicationStatus, reviewer: i32, reviewed_at: DateTime<Utc>) -> Result<u64, Error> {
        // Conditional on still-pending; a lost race updates zero rows.
        let res = query(
            "
        UPDATE applications
        SET status = $2, reviewed_by = $3, reviewed_at = $4
        WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(status)
        .bind(reviewer)
        .bind(reviewed_at)
        .execute(&mut self.executor)
        .await?;
        Ok(res.rows_affected())
    }

    async fn delete_reviewed_before(&mut self, cutoff: DateTime<Utc>) -> Result<i64, Error> {
        let res = query("DELETE FROM applications WHERE status <> 'pending' AND reviewed_at <= $1")
            .bind(cutoff)
            .execute(&mut self.executor)
            .await?;
        Ok(res.rows_affected() as i64)
    }
}

impl<E> CatalogStore for PgStore<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn get_class(&mut self, id: i32) -> Result<Option<Class>, Error> {
        let class = query_as("SELECT * FROM classes WHERE id = $1").bind(id).fetch_optional(&mut self.executor).await?;
        Ok(class)
    }

    async fn get_project(&mut self, id: i32) -> Result<Option<Project>, Error> {
        let project = query_as("SELECT * FROM projects WHERE id = $1").bind(id).fetch_optional(&mut self.executor).await?;
        Ok(project)
    }

    async fn enroll_in_class(&mut self, class_id: i32, uid: i32) -> Result<(), Error> {
        query(
            "
        INSERT INTO class_enrollments (class_id, user_id, member_role)
        VALUES ($1, $2, 'student')
        ON CONFLICT (class_id, user_id) DO NOTHING",
        )
        .bind(class_id)
        .bind(uid)
        .execute(&mut self.executor)
        .await?;
        Ok(())
    }

    async fn add_project_member(&mut self, project_id: i32, uid: i32) -> Result<(), Error> {
        query(
            "
        INSERT INTO project_members (project_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (project_id, user_id) DO NOTHING",
        )
        .bind(project_id)
        .bind(uid)
        .execute(&mut self.executor)
        .await?;
        Ok(())
    }
}

impl<E> EventStore for PgStore<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn get_event(&mut self, id: i32) -> Result<Event, Error> {
        query_as("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut self.executor)
            .await?
            .ok_or_else(|| Error::NotFound(format!("event {}", id)))
    }

    async fn get_event_by_token(&mut self, token: Uuid) -> Result<Option<Event>, Error> {
        let event = query_as("SELECT * FROM events WHERE checkin_token = $1")
            .bind(token)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(event)
    }

    async fn list_events(&mut self, page: i64, size: i64) -> Result<(Vec<Event>, i64), Error> {
        let total: i64 = query_scalar("SELECT COUNT(*) FROM events").fetch_one(&mut self.executor).await?;
        let list = query_as(
            "
        SELECT *
        FROM events
        ORDER BY starts_at DESC
        LIMIT $1
        OFFSET $2",
        )
        .bind(size)
        .bind((page - 1) * size)
        .fetch_all(&mut self.executor)
        .await?;
        Ok((list, total))
    }

    async fn has_rsvp(&mut self, event_id: i32, uid: i32) -> Result<bool, Error> {
        let exists = query_scalar("SELECT EXISTS(SELECT 1 FROM event_rsvps WHERE event_id = $1 AND user_id = $2)")
            .bind(event_id)
            .bind(uid)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(exists)
    }

    async fn insert_rsvp(&mut self, event_id: i32, uid: i32) -> Result<u64, Error> {
        // Seat count checked inside the insert so the capacity guard holds
        // under concurrent RSVPs.
        let res = query(
            "
        INSERT INTO event_rsvps (event_id, user_id)
        SELECT e.id, $2
        FROM events AS e
        WHERE e.id = $1
            AND (e.capacity IS NULL OR (SELECT COUNT(*) FROM event_rsvps WHERE event_id = e.id) < e.capacity)
        ON CONFLICT (event_id, user_id) DO NOTHING",
        )
        .bind(event_id)
        .bind(uid)
        .execute(&mut self.executor)
        .await?;
        Ok(res.rows_affected())
    }

    async fn has_attended(&mut self, event_id: i32, uid: i32) -> Result<bool, Error> {
        let exists = query_scalar("SELECT EXISTS(SELECT 1 FROM event_attendance WHERE event_id = $1 AND user_id = $2)")
            .bind(event_id)
            .bind(uid)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(exists)
    }

    async fn record_attendance(&mut self, event_id: i32, uid: i32, points_awarded: i32) -> Result<(), Error> {
        query("INSERT INTO event_attendance (event_id, user_id, points_awarded) VALUES ($1, $2, $3)")
            .bind(event_id)
            .bind(uid)
            .bind(points_awarded)
            .execute(&mut self.executor)
            .await?;
        Ok(())
    }

    async fn delete_event(&mut self, id: i32) -> Result<i64, Error> {
        let res = query("DELETE FROM events WHERE id = $1").bind(id).execute(&mut self.executor).await?;
        Ok(res.rows_affected() as i64)
    }
}

impl Tx for PgStore<Transaction<'static, Postgres>> {
    async fn commit(self) -> Result<(), Error> {
        self.executor.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.executor.rollback().await?;
        Ok(())
    }
}
