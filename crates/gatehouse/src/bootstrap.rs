//! Startup provisioning

use anyhow::Result;
use gatehouse_auth::hash_password_async;
use gatehouse_db::{Database, NewUser, Role, User};
use tracing::{debug, info};

use crate::config::AdminConfig;

/// Create the configured administrator unless that email is already taken
///
/// Returns the user only when one was created on this call.
pub async fn bootstrap_admin(db: &Database, admin: Option<&AdminConfig>) -> Result<Option<User>> {
    let Some(admin) = admin else {
        return Ok(None);
    };

    if db.get_user_by_email(&admin.email).await?.is_some() {
        debug!("Bootstrap admin already present");
        return Ok(None);
    }

    info!("Creating bootstrap admin user");
    let password_hash = hash_password_async(admin.password.clone()).await?;
    let user = db
        .create_user(NewUser {
            name: admin.name.clone(),
            email: admin.email.clone(),
            phone: None,
            password_hash,
            role: Role::Admin,
        })
        .await?;
    info!("Bootstrap admin created (id: {})", user.id);
    Ok(Some(user))
}
