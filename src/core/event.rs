use uuid::Uuid;

use crate::core::models::event::{CheckinOutcome, Event};
use crate::core::models::user::Role;
use crate::core::ports::repository::{EventStore, Tx, UserStore};
use crate::error::Error;

/// Capacity-enforced RSVP. The capacity check is the store's conditional
/// insert, so two racing RSVPs for the last seat cannot both land.
pub async fn rsvp<S>(mut store: S, uid: i32, event_id: i32) -> Result<Event, Error>
where
    S: EventStore + Tx,
{
    let event = store.get_event(event_id).await?;
    if store.has_rsvp(event_id, uid).await? {
        return Err(Error::Conflict(format!("you already RSVP'd to {}", event.name)));
    }
    let inserted = store.insert_rsvp(event_id, uid).await?;
    if inserted == 0 {
        store.rollback().await?;
        return Err(Error::Conflict(format!("{} is full", event.name)));
    }
    store.commit().await?;
    Ok(event)
}

/// Resolves an opaque check-in token, records attendance once, and applies
/// the point award. Checking in without a required RSVP still succeeds but
/// awards the negative penalty; callers style that case as a failure.
pub async fn check_in<S>(mut store: S, uid: i32, token: Uuid) -> Result<CheckinOutcome, Error>
where
    S: EventStore + UserStore + Tx,
{
    let event = store
        .get_event_by_token(token)
        .await?
        .ok_or_else(|| Error::Business("invalid check-in token".into()))?;
    if store.has_attended(event.id, uid).await? {
        return Err(Error::Conflict(format!("you already checked in to {}", event.name)));
    }
    let rsvp_missing = event.rsvp_required && !store.has_rsvp(event.id, uid).await?;
    let (points_awarded, message) = if rsvp_missing {
        (-event.rsvp_penalty, format!("Checked in to {} without an RSVP", event.name))
    } else {
        (event.points, format!("Checked in to {}!", event.name))
    };
    store.record_attendance(event.id, uid, points_awarded).await?;
    store.add_points(uid, points_awarded).await?;
    store.commit().await?;
    Ok(CheckinOutcome {
        success: true,
        message,
        points_awarded,
        event_name: event.name,
    })
}

pub async fn delete_event<S>(mut store: S, actor: i32, event_id: i32) -> Result<i64, Error>
where
    S: EventStore + UserStore + Tx,
{
    let role = store.get_role(actor).await?;
    if role < Role::Board {
        return Err(Error::PermissionDenied("deleting events requires a board role".into()));
    }
    let deleted = store.delete_event(event_id).await?;
    store.commit().await?;
    Ok(deleted)
}
