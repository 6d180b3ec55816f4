//! Simulation pipeline
//!
//! Tracks simulations in memory and drives them through
//! `pending -> compiling -> success | error`, mirroring every change into
//! the state store when one is attached.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use super::compiler;
use super::types::{
    SandboxSimulation, SimulationKind, SimulationParameters, SimulationResult, SimulationStatus,
    SimulationUpdate,
};
use crate::llm::{CodeAssistant, LlmError};
use crate::store::{StateStore, StoreError};

/// Errors raised by the simulation pipeline
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Simulation not found: {0}")]
    NotFound(String),

    #[error("No code generated for simulation {0}")]
    NoCode(String),

    #[error("Simulation {0} has no parameters to generate code from")]
    MissingParameters(String),

    #[error("Simulation {id} is already {status}")]
    InvalidTransition { id: String, status: SimulationStatus },

    #[error("Code generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Failed to save simulation: {0}")]
    Store(#[from] StoreError),
}

pub type SandboxResult<T> = Result<T, SandboxError>;

/// Creates, generates and tests simulations
pub struct SandboxService {
    simulations: RwLock<HashMap<String, SandboxSimulation>>,
    assistant: Arc<dyn CodeAssistant>,
    store: Option<Arc<StateStore>>,
}

impl SandboxService {
    pub fn new(assistant: Arc<dyn CodeAssistant>) -> Self {
        Self {
            simulations: RwLock::new(HashMap::new()),
            assistant,
            store: None,
        }
    }

    /// Mirror records into `store`, seeding the map with what it already holds
    pub async fn with_store(assistant: Arc<dyn CodeAssistant>, store: Arc<StateStore>) -> Self {
        let existing = store
            .simulations()
            .await
            .into_iter()
            .map(|sim| (sim.id.clone(), sim))
            .collect();

        Self {
            simulations: RwLock::new(existing),
            assistant,
            store: Some(store),
        }
    }

    pub async fn create_simulation(
        &self,
        kind: SimulationKind,
        parameters: Option<SimulationParameters>,
    ) -> SandboxResult<SandboxSimulation> {
        self.insert(SandboxSimulation::new(kind, parameters)).await
    }

    /// Ask the assistant for code; the simulation moves to `compiling`
    pub async fn generate_code(&self, id: &str) -> SandboxResult<String> {
        let sim = self.get(id).await.ok_or_else(|| SandboxError::NotFound(id.to_string()))?;
        if sim.status.is_terminal() {
            return Err(SandboxError::InvalidTransition {
                id: id.to_string(),
                status: sim.status,
            });
        }
        let params = sim
            .parameters
            .clone()
            .ok_or_else(|| SandboxError::MissingParameters(id.to_string()))?;

        self.apply(id, |sim| sim.status = SimulationStatus::Compiling).await?;

        match self.assistant.generate_code(&params).await {
            Ok(code) => {
                tracing::info!(simulation = %id, kind = %sim.kind, bytes = code.len(), "Code generated");
                self.apply(id, |sim| sim.code = code.clone()).await?;
                Ok(code)
            }
            Err(e) => {
                tracing::warn!(simulation = %id, error = %e, "Code generation failed");
                let message = e.to_string();
                self.apply(id, |sim| {
                    sim.status = SimulationStatus::Error;
                    sim.result = Some(SimulationResult::failure(message));
                })
                .await?;
                Err(SandboxError::Generation(e))
            }
        }
    }

    /// Compile the attached code and record the result
    pub async fn test_code(&self, id: &str) -> SandboxResult<SandboxSimulation> {
        let sim = self.get(id).await.ok_or_else(|| SandboxError::NotFound(id.to_string()))?;
        if sim.code.is_empty() {
            return Err(SandboxError::NoCode(id.to_string()));
        }
        if sim.status.is_terminal() {
            return Err(SandboxError::InvalidTransition {
                id: id.to_string(),
                status: sim.status,
            });
        }
        if sim.status == SimulationStatus::Pending {
            self.apply(id, |sim| sim.status = SimulationStatus::Compiling).await?;
        }

        let report = compiler::compile(&sim.code, sim.kind);

        let ai_analysis = match self.assistant.analyze_code(&sim.code, sim.kind).await {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                tracing::warn!(simulation = %id, error = %e, "Code analysis unavailable");
                None
            }
        };

        tracing::info!(
            simulation = %id,
            success = report.success,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            gas = report.gas_estimate,
            "Simulation tested"
        );

        let status = if report.success {
            SimulationStatus::Success
        } else {
            SimulationStatus::Error
        };
        let result = SimulationResult {
            success: report.success,
            errors: report.errors,
            warnings: report.warnings,
            gas_estimate: Some(report.gas_estimate),
            ai_analysis,
        };

        self.apply(id, |sim| {
            sim.status = status;
            sim.result = Some(result);
        })
        .await
    }

    /// Create a simulation around existing code and test it
    pub async fn test_source(
        &self,
        kind: SimulationKind,
        code: impl Into<String>,
    ) -> SandboxResult<SandboxSimulation> {
        let sim = self.insert(SandboxSimulation::new(kind, None).code(code)).await?;
        self.test_code(&sim.id).await
    }

    pub async fn get(&self, id: &str) -> Option<SandboxSimulation> {
        self.simulations.read().await.get(id).cloned()
    }

    /// All simulations, oldest first
    pub async fn list(&self) -> Vec<SandboxSimulation> {
        let mut all: Vec<_> = self.simulations.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Returns whether a simulation was removed
    pub async fn delete(&self, id: &str) -> SandboxResult<bool> {
        let mut sims = self.simulations.write().await;
        if !sims.contains_key(id) {
            return Ok(false);
        }

        if let Some(store) = &self.store {
            match store.remove_simulation(id).await {
                // Already gone from the store, e.g. after a store-wide clear
                Ok(_) | Err(StoreError::NotFound { .. }) => {}
                Err(e) => return Err(self.store_failure(store, id, e).await),
            }
        }

        sims.remove(id);
        Ok(true)
    }

    pub async fn clear(&self) -> SandboxResult<()> {
        let mut sims = self.simulations.write().await;
        if let Some(store) = &self.store {
            if let Err(e) = store.set_simulations(Vec::new()).await {
                return Err(self.store_failure(store, "*", e).await);
            }
        }
        sims.clear();
        Ok(())
    }

    /// The map only takes the record once the store has it
    async fn insert(&self, sim: SandboxSimulation) -> SandboxResult<SandboxSimulation> {
        let mut sims = self.simulations.write().await;
        self.mirror(&sim).await?;
        sims.insert(sim.id.clone(), sim.clone());
        tracing::debug!(simulation = %sim.id, kind = %sim.kind, "Simulation created");
        Ok(sim)
    }

    /// Modify a copy of a simulation, mirror it, then commit it to the map
    async fn apply<F>(&self, id: &str, f: F) -> SandboxResult<SandboxSimulation>
    where
        F: FnOnce(&mut SandboxSimulation),
    {
        let mut sims = self.simulations.write().await;
        let current = sims
            .get_mut(id)
            .ok_or_else(|| SandboxError::NotFound(id.to_string()))?;

        let mut updated = current.clone();
        f(&mut updated);
        self.mirror(&updated).await?;

        *current = updated.clone();
        Ok(updated)
    }

    async fn mirror(&self, sim: &SandboxSimulation) -> SandboxResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let result = if store.simulation(&sim.id).await.is_some() {
            store
                .update_simulation(&sim.id, SimulationUpdate::from_simulation(sim))
                .await
                .map(|_| ())
        } else {
            store.add_simulation(sim.clone()).await
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => Err(self.store_failure(store, &sim.id, e).await),
        }
    }

    async fn store_failure(&self, store: &StateStore, id: &str, err: StoreError) -> SandboxError {
        tracing::error!(simulation = %id, error = %err, "Failed to mirror simulation");
        store
            .set_error(Some(format!("Failed to save simulation: {}", err)))
            .await;
        SandboxError::Store(err)
    }
}
