//! Shared fixtures for the integration tests: scripted engines, a counting
//! repair stub and small helpers.

#![allow(dead_code)]

use glam::DVec3;
use sphere_cache::{
    Approximation, ComputationEngine, EngineError, EngineParams, Method, OrchestratorConfig,
    ShapeRepair, Sphere,
};
use sphere_mesh::primitives::create_box;
use sphere_mesh::{Mesh, MeshResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use tempfile::TempDir;

/// Installs a test subscriber once; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Orchestrator configuration writing into `dir`.
pub fn config(dir: &TempDir) -> OrchestratorConfig {
    OrchestratorConfig::new(dir.path().join("spheres.json")).with_workers(4)
}

/// A closed unit box.
pub fn unit_box() -> Mesh {
    create_box(DVec3::ONE, true).unwrap()
}

/// An approximation with `count` unit spheres along X and the given mean.
pub fn level(count: usize, mean_error: f64) -> Approximation {
    let primitives = (0..count)
        .map(|i| Sphere::new(DVec3::new(i as f64, 0.0, 0.0), 1.0))
        .collect();
    Approximation::new(primitives, mean_error, mean_error / 2.0, mean_error * 2.0)
}

// =============================================================================
// GATE
// =============================================================================

/// One-shot latch that blocks callers until released.
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn wait(&self) {
        let guard = self.open.lock().unwrap();
        let _guard = self.opened.wait_while(guard, |open| !*open).unwrap();
    }

    pub fn release(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }
}

// =============================================================================
// SCRIPTED ENGINE
// =============================================================================

/// Engine returning fixed levels, with scripted unsuitability, failures,
/// blocking and panics. Every call is counted.
pub struct ScriptedEngine {
    levels: Vec<Approximation>,
    unsuitable_checks: usize,
    failures: usize,
    panics: bool,
    gate: Option<Arc<Gate>>,
    pub checks: AtomicUsize,
    pub computes: AtomicUsize,
}

impl ScriptedEngine {
    pub fn returning(levels: Vec<Approximation>) -> Self {
        Self {
            levels,
            unsuitable_checks: 0,
            failures: 0,
            panics: false,
            gate: None,
            checks: AtomicUsize::new(0),
            computes: AtomicUsize::new(0),
        }
    }

    /// The first `n` suitability checks answer "unsuitable".
    pub fn unsuitable_for(mut self, n: usize) -> Self {
        self.unsuitable_checks = n;
        self
    }

    /// The first `n` computations fail.
    pub fn failing(mut self, n: usize) -> Self {
        self.failures = n;
        self
    }

    /// Every computation panics.
    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    /// Every computation blocks until `gate` is released.
    pub fn gated(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn compute_count(&self) -> usize {
        self.computes.load(Ordering::SeqCst)
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

impl ComputationEngine for ScriptedEngine {
    fn is_suitable(&self, _method: Method, _mesh: &Mesh) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst) >= self.unsuitable_checks
    }

    fn compute(&self, _mesh: &Mesh, _params: &EngineParams) -> Result<Vec<Approximation>, EngineError> {
        let attempt = self.computes.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        if self.panics {
            panic!("scripted engine panic");
        }
        if attempt < self.failures {
            return Err(EngineError::Failed(format!("scripted failure {}", attempt)));
        }
        Ok(self.levels.clone())
    }
}

// =============================================================================
// COUNTING REPAIR
// =============================================================================

/// Repair stub that returns its input unchanged and counts calls.
#[derive(Default)]
pub struct CountingRepair {
    pub repairs: AtomicUsize,
    pub decompositions: AtomicUsize,
    pub smooths: AtomicUsize,
}

impl CountingRepair {
    pub fn repair_count(&self) -> usize {
        self.repairs.load(Ordering::SeqCst)
    }

    pub fn decompose_count(&self) -> usize {
        self.decompositions.load(Ordering::SeqCst)
    }

    pub fn smooth_count(&self) -> usize {
        self.smooths.load(Ordering::SeqCst)
    }
}

impl ShapeRepair for CountingRepair {
    fn repair_and_simplify(&self, mesh: &Mesh, _leaves: u32, _ratio: f64) -> MeshResult<Mesh> {
        self.repairs.fetch_add(1, Ordering::SeqCst);
        Ok(mesh.clone())
    }

    fn decompose(&self, mesh: &Mesh) -> MeshResult<Vec<Mesh>> {
        self.decompositions.fetch_add(1, Ordering::SeqCst);
        Ok(vec![mesh.clone()])
    }

    fn smooth(&self, _mesh: &mut Mesh) {
        self.smooths.fetch_add(1, Ordering::SeqCst);
    }
}
