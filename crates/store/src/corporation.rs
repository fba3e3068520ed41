//! Corporation rows and queries

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::{debug, info};

use crate::{Result, StoreError};

/// A cached corporation row.
///
/// Mirrors the on-chain SPS account by public key; `battle_points` is a
/// snapshot, not authoritative. `last_raided` is unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Corporation {
    pub publickey: String,
    pub discord_owner_id: String,
    pub battle_points: i64,
    pub last_raided: i64,
    pub is_dead: bool,
}

/// Queries over the corporations table
#[derive(Debug, Clone)]
pub struct CorporationStore {
    pool: SqlitePool,
}

impl CorporationStore {
    /// Connect and bootstrap the schema.
    ///
    /// `url` is a sqlx SQLite URL, e.g. `sqlite://spsnet.db?mode=rwc` or
    /// `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // An in-memory database lives and dies with its connection, so the
        // pool must hold exactly one and never reap it
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS corporations (
                publickey        TEXT PRIMARY KEY,
                discord_owner_id TEXT NOT NULL,
                battle_points    INTEGER NOT NULL DEFAULT 0,
                last_raided      INTEGER NOT NULL DEFAULT 0,
                is_dead          INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&pool)
        .await?;

        info!("Corporation store ready at {}", url);
        Ok(Self { pool })
    }

    /// Insert a freshly incorporated corporation
    pub async fn insert(&self, corp: &Corporation) -> Result<()> {
        sqlx::query(
            "INSERT INTO corporations
                (publickey, discord_owner_id, battle_points, last_raided, is_dead)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&corp.publickey)
        .bind(&corp.discord_owner_id)
        .bind(corp.battle_points)
        .bind(corp.last_raided)
        .bind(corp.is_dead)
        .execute(&self.pool)
        .await?;

        debug!("Inserted corporation {}", corp.publickey);
        Ok(())
    }

    /// Look up a corporation by its on-chain address
    pub async fn find_by_pubkey(&self, publickey: &str) -> Result<Option<Corporation>> {
        let corp = sqlx::query_as::<_, Corporation>(
            "SELECT publickey, discord_owner_id, battle_points, last_raided, is_dead
             FROM corporations WHERE publickey = ?",
        )
        .bind(publickey)
        .fetch_optional(&self.pool)
        .await?;
        Ok(corp)
    }

    /// Look up a corporation by its on-chain address, erroring when absent
    pub async fn get_by_pubkey(&self, publickey: &str) -> Result<Corporation> {
        self.find_by_pubkey(publickey)
            .await?
            .ok_or_else(|| StoreError::NotFound(publickey.to_string()))
    }

    /// Look up a corporation by the owning Discord user
    pub async fn find_by_owner(&self, discord_owner_id: &str) -> Result<Option<Corporation>> {
        let corp = sqlx::query_as::<_, Corporation>(
            "SELECT publickey, discord_owner_id, battle_points, last_raided, is_dead
             FROM corporations WHERE discord_owner_id = ?",
        )
        .bind(discord_owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(corp)
    }

    /// All corporations still alive in the cache
    pub async fn living(&self) -> Result<Vec<Corporation>> {
        let corps = sqlx::query_as::<_, Corporation>(
            "SELECT publickey, discord_owner_id, battle_points, last_raided, is_dead
             FROM corporations WHERE is_dead = 0",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(corps)
    }

    /// Mark a batch of corporations dead, in one transaction
    pub async fn mark_dead(&self, publickeys: &[String]) -> Result<u64> {
        if publickeys.is_empty() {
            return Ok(0);
        }

        let mut txn = self.pool.begin().await?;
        let mut updated = 0;
        for publickey in publickeys {
            let result = sqlx::query("UPDATE corporations SET is_dead = 1 WHERE publickey = ?")
                .bind(publickey)
                .execute(&mut *txn)
                .await?;
            updated += result.rows_affected();
        }
        txn.commit().await?;

        debug!("Marked {} corporations as dead", updated);
        Ok(updated)
    }

    /// Set the last-raided timestamp on a batch of corporations
    pub async fn touch_last_raided(&self, publickeys: &[String], raid_time: i64) -> Result<u64> {
        if publickeys.is_empty() {
            return Ok(0);
        }

        let mut txn = self.pool.begin().await?;
        let mut updated = 0;
        for publickey in publickeys {
            let result = sqlx::query("UPDATE corporations SET last_raided = ? WHERE publickey = ?")
                .bind(raid_time)
                .bind(publickey)
                .execute(&mut *txn)
                .await?;
            updated += result.rows_affected();
        }
        txn.commit().await?;

        debug!("Touched last_raided on {} corporations", updated);
        Ok(updated)
    }
}
