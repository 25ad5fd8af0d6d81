//! The authenticated-user row the auth middleware attaches to requests.

use engine::{Actor, Role};
use sea_orm::entity::prelude::*;

use crate::ServerError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub role: String,
    pub station_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Parses the stored role and builds the engine-side actor for a request.
pub fn actor_for(user: &Model) -> Result<Actor, ServerError> {
    let role = Role::try_from(user.role.as_str())?;
    let mut actor = Actor::new(user.username.clone(), role);
    if let Some(station_id) = &user.station_id {
        actor = actor.station_id(station_id.clone());
    }
    Ok(actor)
}
