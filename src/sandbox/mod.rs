//! Sandbox
//!
//! Mocked compile-and-cost pipeline for generated Move code.
//!
//! - **types**: Simulation records and typed parameters
//! - **compiler**: Substring predicates and gas estimate
//! - **validation**: Parameter rules and required-field checks
//! - **service**: `SandboxService`, the simulation lifecycle

pub mod compiler;
pub mod service;
pub mod types;
pub mod validation;

pub use compiler::{compile, estimate_gas, CompileReport};
pub use service::{SandboxError, SandboxResult, SandboxService};
pub use types::{
    PoolParameters, SandboxSimulation, SimulationKind, SimulationParameters, SimulationResult,
    SimulationStatus, SimulationUpdate, TokenParameters, VaultParameters,
};
pub use validation::{check_required_fields, required_fields, validate_parameters, ValidationReport};
