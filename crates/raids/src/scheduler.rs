//! The raid scheduler

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::future;
use rand::Rng;
use solana_sdk::pubkey::Pubkey;
use tracing::{error, info, warn};

use spsnet_chain::ChainClient;
use spsnet_core::{MAX_GOBLINS, MIN_GOBLINS};
use spsnet_store::{Corporation, CorporationStore};

use crate::Result;

/// Raid scheduler configuration
#[derive(Debug, Clone)]
pub struct RaidConfig {
    /// Time between raid rounds
    pub interval: Duration,
    /// Per-corporation selection probability per round
    pub probability: f64,
    /// Skip corporations raided within `raid_cooldown_secs`
    pub round_robin: bool,
    /// Seconds a corporation is protected after a raid
    pub raid_cooldown_secs: i64,
    /// Transactions submitted concurrently per batch
    pub batch_size: usize,
    /// Wait after submission before re-reading chain state
    pub settle_delay: Duration,
}

impl Default for RaidConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            probability: 0.10,
            round_robin: true,
            raid_cooldown_secs: 60 * 60,
            batch_size: 50,
            settle_delay: Duration::from_secs(5),
        }
    }
}

/// One selected attack
#[derive(Debug, Clone)]
pub struct Raid {
    pub corporation: Corporation,
    pub goblins: u64,
}

/// Accounting for one raid round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaidReport {
    /// Living corporations considered
    pub living: usize,
    /// Corporations selected for a raid
    pub selected: usize,
    /// Raid transactions the chain confirmed
    pub confirmed: usize,
    /// Raid transactions that failed
    pub failed: usize,
    /// Cache rows newly marked dead
    pub marked_dead: u64,
    /// Cache rows with a bumped last-raided timestamp
    pub touched: u64,
}

/// Periodically raids corporations and reconciles the cache
pub struct RaidScheduler {
    chain: Arc<ChainClient>,
    store: CorporationStore,
    config: RaidConfig,
}

impl RaidScheduler {
    pub fn new(chain: Arc<ChainClient>, store: CorporationStore, config: RaidConfig) -> Self {
        Self {
            chain,
            store,
            config,
        }
    }

    /// The chain client this scheduler raids through
    pub fn chain(&self) -> &Arc<ChainClient> {
        &self.chain
    }

    /// The cache this scheduler reconciles into
    pub fn store(&self) -> &CorporationStore {
        &self.store
    }

    /// Run rounds forever. Round errors are logged, never fatal.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.config.interval);
        loop {
            ticker.tick().await;
            match self.run_once().await {
                Ok(report) => info!(
                    "Raid round done: {}/{} raided, {} failed, {} dead",
                    report.confirmed, report.selected, report.failed, report.marked_dead
                ),
                Err(e) => error!("Raid round failed: {}", e),
            }
        }
    }

    /// One full raid round
    pub async fn run_once(&self) -> Result<RaidReport> {
        let corporations = self.store.living().await?;
        info!("Retrieved {} living corporations.", corporations.len());

        let raids = self.select_raids(&corporations, now_unix());
        info!("Selected {} corporations to raid.", raids.len());

        // Submit in bounded batches, everything within a batch concurrent
        let mut outcomes: Vec<bool> = Vec::with_capacity(raids.len());
        for batch in raids.chunks(self.config.batch_size.max(1)) {
            info!("Sending batch of {} raids", batch.len());
            let results = future::join_all(batch.iter().map(|raid| self.perform_raid(raid))).await;
            outcomes.extend(results.into_iter().map(|result| result.is_ok()));
        }
        let raid_time = now_unix();
        if !raids.is_empty() {
            tokio::time::sleep(self.config.settle_delay).await;
        }

        // Transactions that made it through are the raided corporations
        let raided: Vec<&Raid> = raids
            .iter()
            .zip(&outcomes)
            .filter(|(_, ok)| **ok)
            .map(|(raid, _)| raid)
            .collect();
        let confirmed = raided.len();
        let failed = raids.len() - confirmed;
        info!(
            "{} transactions succeeded, {} transactions failed ({} total)",
            confirmed,
            failed,
            raids.len()
        );

        let (marked_dead, touched) = self.reconcile(&raided, raid_time).await?;

        Ok(RaidReport {
            living: corporations.len(),
            selected: raids.len(),
            confirmed,
            failed,
            marked_dead,
            touched,
        })
    }

    /// Probabilistic selection with round-robin protection
    fn select_raids(&self, corporations: &[Corporation], now: i64) -> Vec<Raid> {
        let mut rng = rand::thread_rng();
        let probability = if self.config.probability.is_finite() {
            self.config.probability.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut raids = Vec::new();
        for corporation in corporations {
            let selected = rng.gen_bool(probability);
            let recently_raided = self.config.round_robin
                && now - corporation.last_raided < self.config.raid_cooldown_secs;
            if selected && !recently_raided {
                raids.push(Raid {
                    corporation: corporation.clone(),
                    goblins: rng.gen_range(MIN_GOBLINS..=MAX_GOBLINS),
                });
            }
        }
        raids
    }

    /// Submit one raid transaction and wait for confirmation
    async fn perform_raid(&self, raid: &Raid) -> Result<()> {
        let sps = match Pubkey::from_str(&raid.corporation.publickey) {
            Ok(sps) => sps,
            Err(e) => {
                warn!(
                    "Skipping raid on {}: bad pubkey ({})",
                    raid.corporation.publickey, e
                );
                return Err(spsnet_chain::ChainError::AccountNotFound(
                    raid.corporation.publickey.clone(),
                )
                .into());
            }
        };

        match self.chain.raid(&sps, raid.goblins).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Raid on {} failed: {}", raid.corporation.publickey, e);
                Err(e.into())
            }
        }
    }

    /// Re-read raided accounts from chain and write the delta to the cache.
    ///
    /// Returns (rows marked dead, rows with last_raided bumped).
    async fn reconcile(&self, raided: &[&Raid], raid_time: i64) -> Result<(u64, u64)> {
        if raided.is_empty() {
            return Ok((0, 0));
        }

        let keys: Vec<Pubkey> = raided
            .iter()
            .filter_map(|raid| Pubkey::from_str(&raid.corporation.publickey).ok())
            .collect();
        let states = self.chain.fetch_sps_multiple(&keys).await?;

        // Only the chain's view of death is written back
        let dead: Vec<String> = keys
            .iter()
            .zip(&states)
            .filter(|(_, state)| state.as_ref().map(|s| s.is_dead).unwrap_or(false))
            .map(|(key, _)| key.to_string())
            .collect();
        let marked_dead = self.store.mark_dead(&dead).await?;
        info!("Marked {} corporations as dead.", marked_dead);

        let raided_keys: Vec<String> = raided
            .iter()
            .map(|raid| raid.corporation.publickey.clone())
            .collect();
        let touched = self.store.touch_last_raided(&raided_keys, raid_time).await?;
        info!(
            "Set {} corporations last_raided to {}.",
            touched, raid_time
        );

        Ok((marked_dead, touched))
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Keypair;
    use spsnet_chain::ChainConfig;

    fn test_config(probability: f64) -> RaidConfig {
        RaidConfig {
            interval: Duration::from_secs(1),
            probability,
            round_robin: true,
            raid_cooldown_secs: 60 * 60,
            batch_size: 2,
            settle_delay: Duration::from_millis(0),
        }
    }

    async fn scheduler_with(probability: f64) -> RaidScheduler {
        let chain = Arc::new(ChainClient::with_keypair(ChainConfig::mock(), Keypair::new()));
        let store = CorporationStore::connect("sqlite::memory:").await.unwrap();
        RaidScheduler::new(chain, store, test_config(probability))
    }

    /// Incorporate on the mock chain, set forces, and insert the cache row
    async fn seed_corporation(
        scheduler: &RaidScheduler,
        discord_id: &str,
        security_forces: u64,
        last_raided: i64,
    ) -> String {
        let (sps, _) = scheduler.chain.incorporate(discord_id).await.unwrap();
        let mut state = scheduler.chain.fetch_sps(&sps).await.unwrap().unwrap();
        state.security_forces = security_forces;
        scheduler.chain.mock_add_sps(sps, state).unwrap();

        scheduler
            .store
            .insert(&Corporation {
                publickey: sps.to_string(),
                discord_owner_id: discord_id.to_string(),
                battle_points: 0,
                last_raided,
                is_dead: false,
            })
            .await
            .unwrap();
        sps.to_string()
    }

    #[tokio::test]
    async fn test_select_raids_all_when_certain() {
        let scheduler = scheduler_with(1.0).await;
        let corporations: Vec<Corporation> = (0..10)
            .map(|i| Corporation {
                publickey: format!("pk{}", i),
                discord_owner_id: format!("u{}", i),
                battle_points: 0,
                last_raided: 0,
                is_dead: false,
            })
            .collect();

        let raids = scheduler.select_raids(&corporations, now_unix());
        assert_eq!(raids.len(), 10);
        for raid in &raids {
            assert!(raid.goblins >= MIN_GOBLINS && raid.goblins <= MAX_GOBLINS);
        }
    }

    #[tokio::test]
    async fn test_select_raids_none_when_impossible() {
        let scheduler = scheduler_with(0.0).await;
        let corporations = vec![Corporation {
            publickey: "pk".to_string(),
            discord_owner_id: "u".to_string(),
            battle_points: 0,
            last_raided: 0,
            is_dead: false,
        }];
        assert!(scheduler.select_raids(&corporations, now_unix()).is_empty());
    }

    #[tokio::test]
    async fn test_round_robin_protects_recent_raids() {
        let scheduler = scheduler_with(1.0).await;
        let now = now_unix();
        let corporations = vec![
            Corporation {
                publickey: "fresh".to_string(),
                discord_owner_id: "a".to_string(),
                battle_points: 0,
                last_raided: now - 10, // raided seconds ago
                is_dead: false,
            },
            Corporation {
                publickey: "stale".to_string(),
                discord_owner_id: "b".to_string(),
                battle_points: 0,
                last_raided: now - 2 * 60 * 60, // two hours ago
                is_dead: false,
            },
        ];

        let raids = scheduler.select_raids(&corporations, now);
        assert_eq!(raids.len(), 1);
        assert_eq!(raids[0].corporation.publickey, "stale");
    }

    #[tokio::test]
    async fn test_round_robin_disabled_raids_everyone() {
        let mut config = test_config(1.0);
        config.round_robin = false;
        let chain = Arc::new(ChainClient::with_keypair(ChainConfig::mock(), Keypair::new()));
        let store = CorporationStore::connect("sqlite::memory:").await.unwrap();
        let scheduler = RaidScheduler::new(chain, store, config);

        let now = now_unix();
        let corporations = vec![Corporation {
            publickey: "fresh".to_string(),
            discord_owner_id: "a".to_string(),
            battle_points: 0,
            last_raided: now - 10,
            is_dead: false,
        }];
        assert_eq!(scheduler.select_raids(&corporations, now).len(), 1);
    }

    #[tokio::test]
    async fn test_run_once_raids_and_reconciles() {
        let scheduler = scheduler_with(1.0).await;

        // Plenty of forces: survives any goblin roll (max 5)
        let survivor = seed_corporation(&scheduler, "1", 100, 0).await;
        // One force: every roll >= 1 wipes it out
        let victim = seed_corporation(&scheduler, "2", 1, 0).await;

        let report = scheduler.run_once().await.unwrap();
        assert_eq!(report.living, 2);
        assert_eq!(report.selected, 2);
        assert_eq!(report.confirmed, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.marked_dead, 1);
        assert_eq!(report.touched, 2);

        let survivor_row = scheduler.store.find_by_pubkey(&survivor).await.unwrap().unwrap();
        assert!(!survivor_row.is_dead);
        assert!(survivor_row.last_raided > 0);

        let victim_row = scheduler.store.find_by_pubkey(&victim).await.unwrap().unwrap();
        assert!(victim_row.is_dead);

        // The chain agrees
        let state = scheduler
            .chain
            .fetch_sps(&Pubkey::from_str(&victim).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(state.is_dead);
    }

    #[tokio::test]
    async fn test_run_once_counts_failures_without_touching_rows() {
        let scheduler = scheduler_with(1.0).await;

        // In the cache but never incorporated on the mock chain: the raid
        // transaction fails and the row must stay untouched
        scheduler
            .store
            .insert(&Corporation {
                publickey: Pubkey::new_unique().to_string(),
                discord_owner_id: "ghost".to_string(),
                battle_points: 0,
                last_raided: 0,
                is_dead: false,
            })
            .await
            .unwrap();

        let report = scheduler.run_once().await.unwrap();
        assert_eq!(report.selected, 1);
        assert_eq!(report.confirmed, 0);
        assert_eq!(report.failed, 1);
        assert_eq!(report.marked_dead, 0);
        assert_eq!(report.touched, 0);

        let row = scheduler.store.living().await.unwrap();
        assert_eq!(row[0].last_raided, 0);
    }

    #[tokio::test]
    async fn test_run_once_with_empty_cache() {
        let scheduler = scheduler_with(1.0).await;
        let report = scheduler.run_once().await.unwrap();
        assert_eq!(report, RaidReport::default());
    }

    #[tokio::test]
    async fn test_batching_covers_all_selections() {
        // batch_size is 2; five corporations still all get raided
        let scheduler = scheduler_with(1.0).await;
        for i in 0..5 {
            seed_corporation(&scheduler, &format!("u{}", i), 100, 0).await;
        }

        let report = scheduler.run_once().await.unwrap();
        assert_eq!(report.selected, 5);
        assert_eq!(report.confirmed, 5);
        assert_eq!(report.touched, 5);
    }
}
