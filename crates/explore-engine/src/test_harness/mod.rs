// Test harness module
// Scripted collaborators and the exploration simulator

pub mod scripted;
pub mod simulator;

pub use scripted::{
    GatedExplorationService, RecordingEntityUpdater, ScriptedExplorationService, ServiceCall,
};
pub use simulator::{
    demo_config, run_simulator, SimulatorConfig, SimulatorReport, SimulatorStats, Violation,
};

/// Aggregate over several simulator seeds
#[derive(Debug, Clone, serde::Serialize)]
pub struct CertificationReport {
    pub passed: bool,
    pub total_violations: usize,
    pub seeds_tested: u64,
}

/// Run the simulator once per seed in `0..seeds`
pub async fn run_certification(
    exploration: &crate::config::ExplorationConfig,
    seeds: u64,
    failure_rate: f64,
) -> CertificationReport {
    let mut total_violations = 0;
    for seed in 0..seeds {
        let config = SimulatorConfig {
            seed,
            failure_rate,
            ..SimulatorConfig::default()
        };
        let report = run_simulator(exploration, config).await;
        total_violations += report.violations.len();
    }

    CertificationReport {
        passed: total_violations == 0,
        total_violations,
        seeds_tested: seeds,
    }
}
