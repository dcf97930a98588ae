use async_trait::async_trait;

use crate::{Error, User, UserId};

/// Read access to the external user directory.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Look up a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error>;

    /// Look up a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error>;
}
