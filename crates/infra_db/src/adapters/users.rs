//! PostgreSQL User Store Adapter
//!
//! Implements the `UserPort` used by the authentication layer.

use async_trait::async_trait;
use tracing::instrument;

use core_kernel::{DomainPort, PortError, UserId};
use domain_loyalty::{UserPort, UserRecord};
use sqlx::PgPool;

use crate::error::db_to_port_error;
use crate::repositories::users::{UserRepository, UserRow};

/// PostgreSQL-backed implementation of the UserPort trait
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    repository: UserRepository,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: UserRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresUserStore {}

#[async_trait]
impl UserPort for PostgresUserStore {
    #[instrument(skip(self, password_hash))]
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<Option<UserRecord>, PortError> {
        let row = self
            .repository
            .create(login, password_hash)
            .await
            .map_err(db_to_port_error)?;

        Ok(row.map(row_to_record))
    }

    #[instrument(skip(self))]
    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, PortError> {
        let row = self
            .repository
            .find_by_login(login)
            .await
            .map_err(db_to_port_error)?;

        Ok(row.map(row_to_record))
    }
}

fn row_to_record(row: UserRow) -> UserRecord {
    UserRecord {
        id: UserId::new(row.id),
        login: row.login,
        password_hash: row.password_hash,
        created_at: row.created_at,
    }
}
