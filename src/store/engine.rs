//! Client State Store
//!
//! A single observable state object:
//! - Mutation path: lock → apply → persist (temp file + rename) → publish event
//! - Read path: lock (shared) → clone
//!
//! Thread-safe via Tokio's async RwLock. A failed persist rolls the
//! in-memory state back so memory and disk never disagree.

use crate::config::StoreConfig;
use crate::sandbox::{SandboxSimulation, SimulationUpdate};
use crate::store::error::{StoreError, StoreResult};
use crate::store::types::{
    ChangeKind, ChatMessage, ChatSession, Pool, StoreEvent, StoreState, StoreTopic, Token, User,
    Vault, WalletState,
};
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, RwLock};

/// Observable, persisted client state
pub struct StateStore {
    /// File holding the persisted subset of the state
    path: PathBuf,
    /// Current state
    state: RwLock<StoreState>,
    /// Change notifications
    events: broadcast::Sender<StoreEvent>,
}

impl StateStore {
    /// Open the store described by `config`, loading any persisted state
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let path = Path::new(&config.data_dir).join(format!("{}.json", config.storage_name));
        Self::open_at(path, config.event_capacity)
    }

    /// Open a store persisted at an explicit file path
    pub fn open_at(path: impl Into<PathBuf>, event_capacity: usize) -> StoreResult<Self> {
        let path = path.into();
        let state = Self::load(&path)?;
        let (events, _) = broadcast::channel(event_capacity.max(1));

        tracing::debug!(
            path = %path.display(),
            tokens = state.tokens.len(),
            pools = state.pools.len(),
            simulations = state.simulations.len(),
            "Opened state store"
        );

        Ok(Self {
            path,
            state: RwLock::new(state),
            events,
        })
    }

    fn load(path: &Path) -> StoreResult<StoreState> {
        if !path.exists() {
            return Ok(StoreState::default());
        }

        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn persist(&self, state: &StoreState) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply a mutation, persist it and publish its event
    async fn mutate<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut StoreState) -> StoreResult<(T, StoreEvent)>,
    {
        let mut state = self.state.write().await;
        let previous = state.clone();

        let (value, event) = match f(&mut state) {
            Ok(applied) => applied,
            Err(e) => {
                *state = previous;
                return Err(e);
            }
        };

        if let Err(e) = self.persist(&state) {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to persist store");
            *state = previous;
            return Err(e);
        }
        drop(state);

        tracing::trace!(topic = %event.topic, kind = ?event.kind, "Store changed");
        // No receivers is fine
        let _ = self.events.send(event);
        Ok(value)
    }

    /// Path of the persisted store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Clone of the full current state
    pub async fn snapshot(&self) -> StoreState {
        self.state.read().await.clone()
    }

    // ============================================
    // User & wallet
    // ============================================

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn set_user(&self, user: Option<User>) -> StoreResult<()> {
        self.mutate(|state| {
            let id = user.as_ref().map(|u| u.id.clone());
            state.user = user;
            Ok(((), StoreEvent::new(StoreTopic::User, ChangeKind::Replaced, id)))
        })
        .await
    }

    pub async fn wallet(&self) -> WalletState {
        self.state.read().await.wallet.clone()
    }

    pub async fn set_wallet(&self, wallet: WalletState) -> StoreResult<()> {
        self.mutate(|state| {
            state.wallet = wallet;
            Ok(((), StoreEvent::new(StoreTopic::Wallet, ChangeKind::Replaced, None)))
        })
        .await
    }

    // ============================================
    // Chat
    // ============================================

    pub async fn current_session(&self) -> Option<ChatSession> {
        self.state.read().await.current_session.clone()
    }

    pub async fn set_current_session(&self, session: Option<ChatSession>) -> StoreResult<()> {
        self.mutate(|state| {
            let id = session.as_ref().map(|s| s.id.clone());
            state.current_session = session;
            Ok(((), StoreEvent::new(StoreTopic::Chat, ChangeKind::Replaced, id)))
        })
        .await
    }

    /// Append a message, starting a session if none is active
    ///
    /// Returns the id of the session the message landed in.
    pub async fn add_message(&self, message: ChatMessage) -> StoreResult<String> {
        self.mutate(|state| {
            let user_id = state
                .user
                .as_ref()
                .map(|u| u.id.clone())
                .unwrap_or_else(|| "anonymous".to_string());

            let session = state
                .current_session
                .get_or_insert_with(|| ChatSession::new(user_id));
            let message_id = message.id.clone();
            session.updated_at = message.timestamp;
            session.messages.push(message);

            Ok((
                session.id.clone(),
                StoreEvent::new(StoreTopic::Chat, ChangeKind::Added, Some(message_id)),
            ))
        })
        .await
    }

    pub async fn clear_session(&self) -> StoreResult<()> {
        self.mutate(|state| {
            state.current_session = None;
            Ok(((), StoreEvent::new(StoreTopic::Chat, ChangeKind::Cleared, None)))
        })
        .await
    }

    // ============================================
    // Tokens
    // ============================================

    pub async fn tokens(&self) -> Vec<Token> {
        self.state.read().await.tokens.clone()
    }

    pub async fn set_tokens(&self, tokens: Vec<Token>) -> StoreResult<()> {
        self.mutate(|state| {
            ensure_unique_ids("token", tokens.iter().map(|t| t.id.as_str()))?;
            state.tokens = tokens;
            Ok(((), StoreEvent::new(StoreTopic::Tokens, ChangeKind::Replaced, None)))
        })
        .await
    }

    pub async fn add_token(&self, token: Token) -> StoreResult<()> {
        self.mutate(|state| {
            if state.tokens.iter().any(|t| t.id == token.id) {
                return Err(duplicate("token", &token.id));
            }
            let id = token.id.clone();
            state.tokens.push(token);
            Ok(((), StoreEvent::new(StoreTopic::Tokens, ChangeKind::Added, Some(id))))
        })
        .await
    }

    pub async fn remove_token(&self, id: &str) -> StoreResult<Token> {
        self.mutate(|state| {
            let index = position(&state.tokens, |t| t.id == id).ok_or_else(|| not_found("token", id))?;
            let removed = state.tokens.remove(index);
            Ok((
                removed,
                StoreEvent::new(StoreTopic::Tokens, ChangeKind::Removed, Some(id.to_string())),
            ))
        })
        .await
    }

    // ============================================
    // Pools
    // ============================================

    pub async fn pools(&self) -> Vec<Pool> {
        self.state.read().await.pools.clone()
    }

    pub async fn set_pools(&self, pools: Vec<Pool>) -> StoreResult<()> {
        self.mutate(|state| {
            ensure_unique_ids("pool", pools.iter().map(|p| p.id.as_str()))?;
            state.pools = pools;
            Ok(((), StoreEvent::new(StoreTopic::Pools, ChangeKind::Replaced, None)))
        })
        .await
    }

    pub async fn add_pool(&self, pool: Pool) -> StoreResult<()> {
        self.mutate(|state| {
            if state.pools.iter().any(|p| p.id == pool.id) {
                return Err(duplicate("pool", &pool.id));
            }
            let id = pool.id.clone();
            state.pools.push(pool);
            Ok(((), StoreEvent::new(StoreTopic::Pools, ChangeKind::Added, Some(id))))
        })
        .await
    }

    pub async fn remove_pool(&self, id: &str) -> StoreResult<Pool> {
        self.mutate(|state| {
            let index = position(&state.pools, |p| p.id == id).ok_or_else(|| not_found("pool", id))?;
            let removed = state.pools.remove(index);
            Ok((
                removed,
                StoreEvent::new(StoreTopic::Pools, ChangeKind::Removed, Some(id.to_string())),
            ))
        })
        .await
    }

    // ============================================
    // Vaults
    // ============================================

    pub async fn vaults(&self) -> Vec<Vault> {
        self.state.read().await.vaults.clone()
    }

    pub async fn set_vaults(&self, vaults: Vec<Vault>) -> StoreResult<()> {
        self.mutate(|state| {
            ensure_unique_ids("vault", vaults.iter().map(|v| v.id.as_str()))?;
            state.vaults = vaults;
            Ok(((), StoreEvent::new(StoreTopic::Vaults, ChangeKind::Replaced, None)))
        })
        .await
    }

    pub async fn add_vault(&self, vault: Vault) -> StoreResult<()> {
        self.mutate(|state| {
            if state.vaults.iter().any(|v| v.id == vault.id) {
                return Err(duplicate("vault", &vault.id));
            }
            let id = vault.id.clone();
            state.vaults.push(vault);
            Ok(((), StoreEvent::new(StoreTopic::Vaults, ChangeKind::Added, Some(id))))
        })
        .await
    }

    pub async fn remove_vault(&self, id: &str) -> StoreResult<Vault> {
        self.mutate(|state| {
            let index = position(&state.vaults, |v| v.id == id).ok_or_else(|| not_found("vault", id))?;
            let removed = state.vaults.remove(index);
            Ok((
                removed,
                StoreEvent::new(StoreTopic::Vaults, ChangeKind::Removed, Some(id.to_string())),
            ))
        })
        .await
    }

    // ============================================
    // Simulations
    // ============================================

    pub async fn simulations(&self) -> Vec<SandboxSimulation> {
        self.state.read().await.simulations.clone()
    }

    pub async fn simulation(&self, id: &str) -> Option<SandboxSimulation> {
        self.state
            .read()
            .await
            .simulations
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub async fn set_simulations(&self, simulations: Vec<SandboxSimulation>) -> StoreResult<()> {
        self.mutate(|state| {
            ensure_unique_ids("simulation", simulations.iter().map(|s| s.id.as_str()))?;
            state.simulations = simulations;
            Ok(((), StoreEvent::new(StoreTopic::Simulations, ChangeKind::Replaced, None)))
        })
        .await
    }

    pub async fn add_simulation(&self, simulation: SandboxSimulation) -> StoreResult<()> {
        self.mutate(|state| {
            if state.simulations.iter().any(|s| s.id == simulation.id) {
                return Err(duplicate("simulation", &simulation.id));
            }
            let id = simulation.id.clone();
            state.simulations.push(simulation);
            Ok(((), StoreEvent::new(StoreTopic::Simulations, ChangeKind::Added, Some(id))))
        })
        .await
    }

    /// Apply a partial update; a status change must move forward
    pub async fn update_simulation(
        &self,
        id: &str,
        update: SimulationUpdate,
    ) -> StoreResult<SandboxSimulation> {
        self.mutate(|state| {
            let sim = state
                .simulations
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| not_found("simulation", id))?;

            if let Some(next) = update.status {
                if next != sim.status {
                    if !sim.status.can_transition_to(next) {
                        return Err(StoreError::InvalidTransition {
                            from: sim.status,
                            to: next,
                        });
                    }
                    sim.status = next;
                }
            }
            if let Some(code) = update.code {
                sim.code = code;
            }
            if let Some(result) = update.result {
                sim.result = Some(result);
            }

            Ok((
                sim.clone(),
                StoreEvent::new(StoreTopic::Simulations, ChangeKind::Updated, Some(id.to_string())),
            ))
        })
        .await
    }

    pub async fn remove_simulation(&self, id: &str) -> StoreResult<SandboxSimulation> {
        self.mutate(|state| {
            let index = position(&state.simulations, |s| s.id == id)
                .ok_or_else(|| not_found("simulation", id))?;
            let removed = state.simulations.remove(index);
            Ok((
                removed,
                StoreEvent::new(StoreTopic::Simulations, ChangeKind::Removed, Some(id.to_string())),
            ))
        })
        .await
    }

    // ============================================
    // Runtime status (not persisted)
    // ============================================

    pub async fn set_error(&self, error: Option<String>) {
        self.state.write().await.error = error;
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn set_loading(&self, loading: bool) {
        self.state.write().await.loading = loading;
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Reset every collection and the session
    pub async fn clear(&self) -> StoreResult<()> {
        let result = self
            .mutate(|state| {
                *state = StoreState::default();
                Ok(((), StoreEvent::new(StoreTopic::Chat, ChangeKind::Cleared, None)))
            })
            .await;

        if result.is_ok() {
            for topic in StoreTopic::all().iter().filter(|t| **t != StoreTopic::Chat) {
                let _ = self
                    .events
                    .send(StoreEvent::new(*topic, ChangeKind::Cleared, None));
            }
        }
        result
    }
}

fn position<T>(items: &[T], pred: impl Fn(&T) -> bool) -> Option<usize> {
    items.iter().position(pred)
}

fn duplicate(collection: &'static str, id: &str) -> StoreError {
    StoreError::DuplicateId {
        collection,
        id: id.to_string(),
    }
}

fn not_found(collection: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        collection,
        id: id.to_string(),
    }
}

fn ensure_unique_ids<'a>(
    collection: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> StoreResult<()> {
    let mut seen = std::collections::HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(duplicate(collection, id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{SimulationKind, SimulationResult, SimulationStatus};
    use crate::store::types::ChatRole;
    use tempfile::tempdir;

    fn create_test_store() -> (StateStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StoreConfig {
            data_dir: dir.path().to_string_lossy().to_string(),
            storage_name: "test-store".to_string(),
            event_capacity: 16,
        };
        let store = StateStore::open(&config).unwrap();
        (store, dir)
    }

    fn sample_token(symbol: &str) -> Token {
        Token::new(format!("{} Token", symbol), symbol, 8, "1000000", "0x1", "0xabc")
    }

    #[tokio::test]
    async fn test_open_empty() {
        let (store, dir) = create_test_store();
        let state = store.snapshot().await;
        assert!(state.tokens.is_empty());
        assert!(state.current_session.is_none());
        assert!(!state.wallet.connected);
        assert_eq!(store.path(), dir.path().join("test-store.json"));
    }

    #[tokio::test]
    async fn test_add_message_creates_session() {
        let (store, _dir) = create_test_store();

        let first = store.add_message(ChatMessage::user("hello")).await.unwrap();
        let second = store
            .add_message(ChatMessage::assistant("hi there"))
            .await
            .unwrap();
        assert_eq!(first, second);

        let session = store.current_session().await.unwrap();
        assert_eq!(session.user_id, "anonymous");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, ChatRole::User);
        assert_eq!(session.messages[1].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_session_uses_user_id() {
        let (store, _dir) = create_test_store();
        let user = User::new("0xabc");
        let user_id = user.id.clone();
        store.set_user(Some(user)).await.unwrap();

        store.add_message(ChatMessage::user("hello")).await.unwrap();
        assert_eq!(store.current_session().await.unwrap().user_id, user_id);

        store.clear_session().await.unwrap();
        assert!(store.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_token_mutations_leave_other_collections() {
        let (store, _dir) = create_test_store();
        let a = sample_token("AAA");
        let b = sample_token("BBB");
        let pool = Pool::new("AAA/BBB", a.clone(), b.clone(), 0.3, "0x2", "0xabc");
        let pool_id = pool.id.clone();

        store.add_pool(pool).await.unwrap();
        store
            .add_simulation(SandboxSimulation::new(SimulationKind::Token, None))
            .await
            .unwrap();

        let before = store.snapshot().await;

        store.add_token(a.clone()).await.unwrap();
        store.add_token(b).await.unwrap();
        store.remove_token(&a.id).await.unwrap();

        let after = store.snapshot().await;
        assert_eq!(after.tokens.len(), 1);
        assert_eq!(after.pools, before.pools);
        assert_eq!(after.vaults, before.vaults);
        assert_eq!(after.simulations, before.simulations);
        assert_eq!(after.pools[0].id, pool_id);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let (store, _dir) = create_test_store();
        let token = sample_token("AAA");
        store.add_token(token.clone()).await.unwrap();

        let err = store.add_token(token).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
        assert_eq!(store.tokens().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_missing() {
        let (store, _dir) = create_test_store();
        let err = store.remove_pool("pool_missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_simulation_status_moves_forward() {
        let (store, _dir) = create_test_store();
        let sim = SandboxSimulation::new(SimulationKind::Vault, None);
        let id = sim.id.clone();
        store.add_simulation(sim).await.unwrap();

        // pending -> success skips compiling
        let err = store
            .update_simulation(
                &id,
                SimulationUpdate {
                    status: Some(SimulationStatus::Success),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));

        store
            .update_simulation(
                &id,
                SimulationUpdate {
                    status: Some(SimulationStatus::Compiling),
                    code: Some("module m {}".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = store
            .update_simulation(
                &id,
                SimulationUpdate {
                    status: Some(SimulationStatus::Error),
                    result: Some(SimulationResult::failure("Missing public entry function")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, SimulationStatus::Error);
        assert_eq!(updated.code, "module m {}");

        // terminal
        let err = store
            .update_simulation(
                &id,
                SimulationUpdate {
                    status: Some(SimulationStatus::Compiling),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = StateStore::open_at(&path, 8).unwrap();
            store.add_token(sample_token("AAA")).await.unwrap();
            store
                .set_wallet(WalletState {
                    connected: true,
                    address: Some("0xabc".to_string()),
                    ..Default::default()
                })
                .await
                .unwrap();
            store.add_message(ChatMessage::user("hello")).await.unwrap();
            store.set_error(Some("transient".to_string())).await;
        }

        let reopened = StateStore::open_at(&path, 8).unwrap();
        let state = reopened.snapshot().await;
        assert_eq!(state.tokens.len(), 1);
        assert!(state.wallet.connected);
        assert_eq!(state.current_session.unwrap().messages.len(), 1);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = StateStore::open_at(&path, 8);
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_events_published() {
        let (store, _dir) = create_test_store();
        let mut events = store.subscribe();

        let token = sample_token("AAA");
        let id = token.id.clone();
        store.add_token(token).await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.topic, StoreTopic::Tokens);
        assert_eq!(event.kind, ChangeKind::Added);
        assert_eq!(event.id.as_deref(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn test_failed_mutation_publishes_nothing() {
        let (store, _dir) = create_test_store();
        let mut events = store.subscribe();

        assert!(store.remove_vault("vault_missing").await.is_err());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_clear() {
        let (store, _dir) = create_test_store();
        store.add_token(sample_token("AAA")).await.unwrap();
        store.add_message(ChatMessage::user("hello")).await.unwrap();

        store.clear().await.unwrap();
        let state = store.snapshot().await;
        assert!(state.tokens.is_empty());
        assert!(state.current_session.is_none());
    }
}
