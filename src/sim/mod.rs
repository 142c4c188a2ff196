/// Per-run variable environment.
pub mod context;
pub mod engine;
/// Physical plausibility checks.
pub mod invariants;
pub mod kpi;
pub mod power_balance;
pub mod types;

pub use context::RunContext;
pub use engine::{Engine, SimError, SimRun, StepOutcome, simulate};
pub use invariants::{InvariantReport, Violation, ViolationKind};
pub use kpi::{KpiReport, PostProcessed};
pub use power_balance::BalanceCheck;
pub use types::{HORIZON, InputError, ResultRow, RunStatus, SimInputs};
