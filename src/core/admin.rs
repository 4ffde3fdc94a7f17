use crate::core::models::user::Role;
use crate::core::ports::repository::{Tx, UserStore};
use crate::error::Error;

/// Marks a user banned; banned accounts fail at login. E-board only, and not
/// against yourself.
pub async fn ban_user<S>(mut store: S, actor: i32, uid: i32) -> Result<(), Error>
where
    S: UserStore + Tx,
{
    let role = store.get_role(actor).await?;
    if role < Role::Eboard {
        return Err(Error::PermissionDenied("banning users requires the e-board role".into()));
    }
    if actor == uid {
        return Err(Error::Business("you cannot ban yourself".into()));
    }
    store.ban_user(uid).await?;
    store.commit().await?;
    log::warn!("user {} banned by {}", uid, actor);
    Ok(())
}

pub async fn delete_user<S>(mut store: S, actor: i32, uid: i32) -> Result<i64, Error>
where
    S: UserStore + Tx,
{
    let role = store.get_role(actor).await?;
    if role < Role::Eboard {
        return Err(Error::PermissionDenied("deleting users requires the e-board role".into()));
    }
    if actor == uid {
        return Err(Error::Business("you cannot delete yourself".into()));
    }
    let deleted = store.delete_user(uid).await?;
    store.commit().await?;
    log::warn!("user {} deleted by {}", uid, actor);
    Ok(deleted)
}
