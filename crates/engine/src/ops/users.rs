use chrono::Utc;
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, users};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Registers a user. Identity is checked upstream; the row only anchors
    /// budget ownership.
    pub async fn new_user(&self, username: &str) -> ResultEngine<String> {
        let username = normalize_required_name(username, "user")?;
        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }
            users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            tracing::debug!(%username, "created user");
            Ok(username)
        })
    }
}
