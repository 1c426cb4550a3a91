//! SQL implementation of the device registration repository

use crate::error::DbError;
use crate::repositories::device_registration::{DeviceRegistration, DeviceRegistrationRepository};
use crate::DbClient;
use chrono::{DateTime, NaiveDateTime, Utc};
use medremind_common::models::Platform;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, platform, push_token, active, created_at, updated_at FROM device_registrations";

/// SQL implementation of the device registration repository
#[derive(Debug, Clone)]
pub struct SqlDeviceRegistrationRepository {
    /// The database client
    db_client: DbClient,
}

impl SqlDeviceRegistrationRepository {
    /// Create a new SQL device registration repository
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    async fn fetch_by_user(
        &self,
        user_id: &str,
        only_active: bool,
    ) -> Result<Vec<DeviceRegistration>, DbError> {
        let query = if only_active {
            format!("{} WHERE user_id = $1 AND active = 1 ORDER BY id", SELECT_COLUMNS)
        } else {
            format!("{} WHERE user_id = $1 ORDER BY id", SELECT_COLUMNS)
        };

        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find device registrations: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(row_to_registration).collect()
    }
}

// Timestamps are stored as TEXT; the Any driver has no portable DateTime decoding.
fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn row_to_registration(row: &AnyRow) -> Result<DeviceRegistration, DbError> {
    let platform: String = row.try_get("platform")?;
    let platform = platform.parse::<Platform>().map_err(DbError::InvalidRow)?;
    let active: i64 = row.try_get("active")?;

    Ok(DeviceRegistration {
        id: row.try_get("id").ok(),
        user_id: row.try_get("user_id")?,
        platform,
        push_token: row.try_get("push_token")?,
        active: active != 0,
        created_at: parse_timestamp(row.try_get("created_at").ok()),
        updated_at: parse_timestamp(row.try_get("updated_at").ok()),
    })
}

impl DeviceRegistrationRepository for SqlDeviceRegistrationRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing device registration schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS device_registrations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                push_token TEXT NOT NULL UNIQUE,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            )
        "#;
        self.db_client.execute(query).await?;

        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_device_registrations_user ON device_registrations (user_id)",
            )
            .await?;

        info!("Device registration schema initialized successfully");
        Ok(())
    }

    async fn register_device(
        &self,
        user_id: &str,
        platform: Platform,
        push_token: &str,
    ) -> Result<DeviceRegistration, DbError> {
        debug!("Registering {} device for user: {}", platform, user_id);

        // a known token moves to the new user and is reactivated in the same statement
        let query = r#"
            INSERT INTO device_registrations (user_id, platform, push_token, active)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT(push_token) DO UPDATE SET
                user_id = excluded.user_id,
                platform = excluded.platform,
                active = 1,
                updated_at = CURRENT_TIMESTAMP
        "#;

        sqlx::query(query)
            .bind(user_id)
            .bind(platform.as_str())
            .bind(push_token)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to upsert device registration: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        self.find_by_token(push_token).await?.ok_or_else(|| {
            DbError::QueryError("Device registration vanished after write".to_string())
        })
    }

    async fn find_by_token(&self, push_token: &str) -> Result<Option<DeviceRegistration>, DbError> {
        let query = format!("{} WHERE push_token = $1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(push_token)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find device registration: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        row.as_ref().map(row_to_registration).transpose()
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<DeviceRegistration>, DbError> {
        debug!("Finding all device registrations for user: {}", user_id);
        self.fetch_by_user(user_id, false).await
    }

    async fn find_active_by_user(&self, user_id: &str) -> Result<Vec<DeviceRegistration>, DbError> {
        debug!("Finding active device registrations for user: {}", user_id);
        self.fetch_by_user(user_id, true).await
    }

    async fn deactivate_tokens(&self, user_id: &str, push_tokens: &[String]) -> Result<u64, DbError> {
        if push_tokens.is_empty() {
            return Ok(0);
        }

        let placeholders = (0..push_tokens.len())
            .map(|i| format!("${}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "UPDATE device_registrations SET active = 0, updated_at = CURRENT_TIMESTAMP \
             WHERE user_id = $1 AND push_token IN ({})",
            placeholders
        );

        let mut statement = sqlx::query(&query).bind(user_id);
        for token in push_tokens {
            statement = statement.bind(token.as_str());
        }

        let result = statement
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to deactivate device registrations: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        info!(
            "Deactivated {} of {} push tokens for user {}",
            result.rows_affected(),
            push_tokens.len(),
            user_id
        );
        Ok(result.rows_affected())
    }

    async fn unregister_device(&self, user_id: &str, push_token: &str) -> Result<bool, DbError> {
        debug!("Unregistering device for user: {}", user_id);

        let affected = self
            .deactivate_tokens(user_id, &[push_token.to_string()])
            .await?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN_A: &str = "ExponentPushToken[aaaaaaaaaaaaaaaaaaaaaa]";
    const TOKEN_B: &str = "ExponentPushToken[bbbbbbbbbbbbbbbbbbbbbb]";

    async fn repository() -> SqlDeviceRegistrationRepository {
        let client = DbClient::from_url("sqlite::memory:").await.unwrap();
        let repository = SqlDeviceRegistrationRepository::new(client);
        repository.init_schema().await.unwrap();
        repository
    }

    #[tokio::test]
    async fn test_register_new_device() {
        let repo = repository().await;

        let reg = repo
            .register_device("user-1", Platform::Android, TOKEN_A)
            .await
            .unwrap();

        assert!(reg.id.is_some());
        assert_eq!(reg.user_id, "user-1");
        assert_eq!(reg.platform, Platform::Android);
        assert!(reg.active);
    }

    #[tokio::test]
    async fn test_reregistering_same_token_is_idempotent() {
        let repo = repository().await;

        let first = repo
            .register_device("user-1", Platform::Ios, TOKEN_A)
            .await
            .unwrap();
        let second = repo
            .register_device("user-1", Platform::Ios, TOKEN_A)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.find_by_user("user-1").await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_registration_creates_one_row() {
        let path = std::env::temp_dir().join(format!(
            "medremind-register-{}-{}.db",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let client = DbClient::from_url(&format!("sqlite://{}", path.display()))
            .await
            .unwrap();
        let repo = SqlDeviceRegistrationRepository::new(client);
        repo.init_schema().await.unwrap();

        let (a, b, c, d) = tokio::join!(
            repo.register_device("user-1", Platform::Ios, TOKEN_A),
            repo.register_device("user-1", Platform::Ios, TOKEN_A),
            repo.register_device("user-2", Platform::Android, TOKEN_A),
            repo.register_device("user-1", Platform::Ios, TOKEN_A),
        );
        for result in [a, b, c, d] {
            assert!(result.is_ok(), "registration failed: {:?}", result.err());
        }

        let owners = [
            repo.find_by_user("user-1").await.unwrap(),
            repo.find_by_user("user-2").await.unwrap(),
        ];
        assert_eq!(owners.iter().map(Vec::len).sum::<usize>(), 1);

        drop(repo);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_registering_inactive_token_reassigns_and_reactivates() {
        let repo = repository().await;

        repo.register_device("user-1", Platform::Android, TOKEN_A)
            .await
            .unwrap();
        repo.deactivate_tokens("user-1", &[TOKEN_A.to_string()])
            .await
            .unwrap();

        let reg = repo
            .register_device("user-2", Platform::Android, TOKEN_A)
            .await
            .unwrap();

        assert_eq!(reg.user_id, "user-2");
        assert!(reg.active);
        assert!(repo.find_by_user("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_active_by_user_skips_inactive() {
        let repo = repository().await;
        repo.register_device("user-1", Platform::Android, TOKEN_A)
            .await
            .unwrap();
        repo.register_device("user-1", Platform::Ios, TOKEN_B)
            .await
            .unwrap();
        repo.deactivate_tokens("user-1", &[TOKEN_B.to_string()])
            .await
            .unwrap();

        let active = repo.find_active_by_user("user-1").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].push_token, TOKEN_A);
        assert_eq!(repo.find_by_user("user-1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deactivate_is_scoped_to_user() {
        let repo = repository().await;
        repo.register_device("user-1", Platform::Android, TOKEN_A)
            .await
            .unwrap();

        let affected = repo
            .deactivate_tokens("user-2", &[TOKEN_A.to_string()])
            .await
            .unwrap();

        assert_eq!(affected, 0);
        assert!(repo.find_by_token(TOKEN_A).await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn test_deactivate_twice_is_a_noop() {
        let repo = repository().await;
        repo.register_device("user-1", Platform::Android, TOKEN_A)
            .await
            .unwrap();
        let tokens = vec![TOKEN_A.to_string()];

        repo.deactivate_tokens("user-1", &tokens).await.unwrap();
        let before = repo.find_by_token(TOKEN_A).await.unwrap().unwrap();
        repo.deactivate_tokens("user-1", &tokens).await.unwrap();
        let after = repo.find_by_token(TOKEN_A).await.unwrap().unwrap();

        assert!(!after.active);
        assert_eq!(before.active, after.active);
        assert_eq!(before.user_id, after.user_id);
    }

    #[tokio::test]
    async fn test_deactivate_empty_list() {
        let repo = repository().await;
        assert_eq!(repo.deactivate_tokens("user-1", &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unregister_device() {
        let repo = repository().await;
        repo.register_device("user-1", Platform::Ios, TOKEN_A)
            .await
            .unwrap();

        assert!(!repo.unregister_device("user-2", TOKEN_A).await.unwrap());
        assert!(repo.unregister_device("user-1", TOKEN_A).await.unwrap());
        assert!(repo.find_active_by_user("user-1").await.unwrap().is_empty());
    }

    #[test]
    fn test_parse_timestamp() {
        let parsed = parse_timestamp(Some("2026-03-01 08:30:00".to_string())).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T08:30:00+00:00");
        assert!(parse_timestamp(Some("not a date".to_string())).is_none());
        assert!(parse_timestamp(None).is_none());
    }
}
