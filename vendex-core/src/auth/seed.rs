//! Startup seeding for the role catalog.

use crate::error::CoreError;
use crate::store::ports::RoleStore;
use crate::users::roles;

/// Create the built-in roles if they are missing.
///
/// Runs on every boot before the server accepts traffic. Safe to repeat:
/// existing roles are left untouched, and a concurrent boot losing the
/// insert race to the unique name constraint is treated as success.
pub async fn ensure_default_roles(
    store: &dyn RoleStore,
) -> Result<(), CoreError> {
    for name in [roles::USER, roles::ADMIN] {
        if store.find_by_name(name).await?.is_some() {
            continue;
        }

        match store.create(name).await {
            Ok(role) => {
                tracing::info!(role = %role.name, "seeded default role");
            }
            Err(CoreError::Conflict(_)) => {
                tracing::debug!(role = name, "default role seeded concurrently");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn seeds_both_roles_once() {
        let store = MemoryStore::new();

        ensure_default_roles(&store).await.unwrap();
        ensure_default_roles(&store).await.unwrap();

        let user = store.find_by_name(roles::USER).await.unwrap();
        let admin = store.find_by_name(roles::ADMIN).await.unwrap();
        assert!(user.is_some());
        assert!(admin.is_some());
        assert_ne!(user.unwrap().id, admin.unwrap().id);
    }

    #[tokio::test]
    async fn leaves_existing_roles_untouched() {
        let store = MemoryStore::new();
        let existing = store.create(roles::USER).await.unwrap();

        ensure_default_roles(&store).await.unwrap();

        let found = store
            .find_by_name(roles::USER)
            .await
            .unwrap()
            .expect("role still present");
        assert_eq!(found.id, existing.id);
    }
}
