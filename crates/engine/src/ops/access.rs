use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};

use crate::{EngineError, ResultEngine, Role, stations, users};

use super::Engine;

/// The authenticated user an operation runs as.
///
/// Built from a `users` row at the trust boundary; the engine only ever sees
/// the parsed form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub username: String,
    pub role: Role,
    pub station_id: Option<String>,
}

impl Actor {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
            station_id: None,
        }
    }

    #[must_use]
    pub fn station_id(mut self, station_id: impl Into<String>) -> Self {
        self.station_id = Some(station_id.into());
        self
    }

    pub(super) fn require_min_role(&self, required: Role) -> ResultEngine<()> {
        if !self.role.has_min_role(required) {
            return Err(EngineError::Permission(format!(
                "requires {} role or above",
                required.as_str()
            )));
        }
        Ok(())
    }
}

impl Engine {
    pub(super) async fn require_station(
        &self,
        db: &DatabaseTransaction,
        station_id: &str,
    ) -> ResultEngine<stations::Model> {
        stations::Entity::find_by_id(station_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("station not exists".to_string()))
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("user not exists".to_string()))
    }

    /// Whether `actor` may operate on `station_id`: super admins anywhere,
    /// owners on stations they own, everyone else on their assigned station.
    pub(super) async fn can_act_for_station(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        station_id: &str,
    ) -> ResultEngine<bool> {
        match actor.role {
            Role::SuperAdmin => Ok(true),
            Role::Owner => {
                let station = self.require_station(db, station_id).await?;
                Ok(station.owner_id == actor.username)
            }
            Role::Manager | Role::Employee => {
                Ok(actor.station_id.as_deref() == Some(station_id))
            }
        }
    }

    pub(super) async fn require_station_access(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        station_id: &str,
    ) -> ResultEngine<()> {
        self.require_station(db, station_id).await?;
        if !self.can_act_for_station(db, actor, station_id).await? {
            return Err(EngineError::Permission(format!(
                "no access to station {station_id}"
            )));
        }
        Ok(())
    }

    pub(super) async fn owned_station_ids(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
    ) -> ResultEngine<Vec<String>> {
        let rows = stations::Entity::find()
            .filter(stations::Column::OwnerId.eq(owner_id.to_string()))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|station| station.id).collect())
    }
}
