//! # Orchestrator
//!
//! Ties the dispatcher and the level cache together. Work is only submitted
//! for keys the cache cannot answer, results are selected with the level
//! policies, and the cache is flushed exactly once when the orchestrator goes
//! away.
//!
//! ## Lifetime
//!
//! - [`Orchestrator::close`] flushes and reports the flush error
//! - [`Orchestrator::scope`] runs a closure and flushes afterwards, also when
//!   the closure fails or panics
//! - Dropping an orchestrator that was never closed flushes and logs failures
//!
//! ## Example
//!
//! ```rust,no_run
//! use sphere_cache::{Orchestrator, OrchestratorConfig, Shape, SpherizeParams};
//! use sphere_mesh::primitives::create_sphere;
//!
//! let config = OrchestratorConfig::new("sphere_database.json");
//! let spheres = Orchestrator::scope_with_defaults(config, |orchestrator| {
//!     let mesh = create_sphere(1.0, 24).unwrap();
//!     orchestrator.request("ball", Shape::Mesh(mesh), &SpherizeParams::new(8, 1))?;
//!     orchestrator.resolve("ball", 8, 1, true)
//! })
//! .unwrap();
//! assert!(!spheres.is_empty());
//! ```

use crate::approximation::Approximation;
use crate::cache::LevelCache;
use crate::dispatcher::Dispatcher;
use crate::engine::{BoundingTreeEngine, ComputationEngine, MeshRepair, ShapeRepair};
use crate::error::{SpherizeError, SpherizeResult};
use crate::params::{OrchestratorConfig, SpherizeParams};
use crate::selection::select_level;
use crate::shape::Shape;
use crate::spherize::spherize_shape;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Cache-aware front end to the dispatcher.
pub struct Orchestrator {
    dispatcher: Dispatcher,
    cache: LevelCache,
    engine: Arc<dyn ComputationEngine>,
    repair: Arc<dyn ShapeRepair>,
    closed: bool,
}

impl Orchestrator {
    /// Starts the worker pool and opens the cache.
    ///
    /// With `config.reload` set, the cache file is restored; otherwise the
    /// cache starts empty and overwrites the file on flush.
    ///
    /// # Errors
    ///
    /// Invalid configuration, worker pool start-up failures, and when
    /// reloading, a corrupt or unreadable cache file.
    pub fn new(
        config: OrchestratorConfig,
        engine: Arc<dyn ComputationEngine>,
        repair: Arc<dyn ShapeRepair>,
    ) -> SpherizeResult<Self> {
        config.validate()?;
        let cache = if config.reload {
            LevelCache::restore(&config.cache_path)?
        } else {
            LevelCache::open(&config.cache_path)
        };
        let dispatcher = Dispatcher::new(config.dispatcher)?;

        Ok(Self {
            dispatcher,
            cache,
            engine,
            repair,
            closed: false,
        })
    }

    /// Starts an orchestrator with [`BoundingTreeEngine`] and [`MeshRepair`].
    pub fn with_defaults(config: OrchestratorConfig) -> SpherizeResult<Self> {
        Self::new(config, Arc::new(BoundingTreeEngine), Arc::new(MeshRepair))
    }

    /// Runs `f` with a fresh orchestrator and flushes the cache afterwards.
    ///
    /// The flush happens when `f` returns, fails, or panics. If both `f` and
    /// the flush fail, the error from `f` is returned and the flush error is
    /// logged.
    pub fn scope<T, F>(
        config: OrchestratorConfig,
        engine: Arc<dyn ComputationEngine>,
        repair: Arc<dyn ShapeRepair>,
        f: F,
    ) -> SpherizeResult<T>
    where
        F: FnOnce(&Orchestrator) -> SpherizeResult<T>,
    {
        let orchestrator = Self::new(config, engine, repair)?;
        // A panic in `f` unwinds through `Drop`, which flushes
        let outcome = f(&orchestrator);
        let flushed = orchestrator.close();

        match (outcome, flushed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(flush_err)) => Err(flush_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(flush_err)) => {
                warn!(error = %flush_err, "cache flush failed after scope error");
                Err(err)
            }
        }
    }

    /// [`Orchestrator::scope`] with the default engine and repair passes.
    pub fn scope_with_defaults<T, F>(config: OrchestratorConfig, f: F) -> SpherizeResult<T>
    where
        F: FnOnce(&Orchestrator) -> SpherizeResult<T>,
    {
        Self::scope(config, Arc::new(BoundingTreeEngine), Arc::new(MeshRepair), f)
    }

    /// Enqueues a spherization of `shape` under `shape_id`.
    ///
    /// Does nothing if the cache already holds
    /// `(shape_id, params.branch_factor(), params.depth())`. A request for a
    /// shape that is still being computed joins that computation, whatever its
    /// parameters.
    ///
    /// # Errors
    ///
    /// [`SpherizeError::InvalidParams`] if `params` fail validation.
    pub fn request(&self, shape_id: &str, shape: Shape, params: &SpherizeParams) -> SpherizeResult<()> {
        params.validate()?;
        let (branch_factor, depth) = (params.branch_factor(), params.depth());

        if self.cache.contains(shape_id, branch_factor, depth) {
            debug!(shape_id, branch_factor, depth, "request answered by cache");
            return Ok(());
        }

        let id = shape_id.to_string();
        let params = params.clone();
        let engine = Arc::clone(&self.engine);
        let repair = Arc::clone(&self.repair);
        self.dispatcher.submit(shape_id, move |cancel| {
            spherize_shape(&id, &shape, &params, engine.as_ref(), repair.as_ref(), cancel)
        });
        info!(shape_id, branch_factor, depth, "spherization requested");
        Ok(())
    }

    /// Returns the approximation for `(shape_id, branch_factor, level)`,
    /// blocking on the computation if the cache cannot answer.
    ///
    /// On the computed path every produced level is put into the cache when
    /// `use_cache` is set. Both paths coarsen past empty levels the same way.
    ///
    /// # Errors
    ///
    /// - [`SpherizeError::UnknownTask`] if the key is not cached and nothing
    ///   was requested under `shape_id`
    /// - [`SpherizeError::EmptyResult`] if the computation produced no levels
    /// - [`SpherizeError::NotFound`] if the cached path finds no usable entry
    /// - the computation's own failure
    pub fn resolve(
        &self,
        shape_id: &str,
        branch_factor: u32,
        level: u32,
        use_cache: bool,
    ) -> SpherizeResult<Approximation> {
        if self.cache.contains(shape_id, branch_factor, level) {
            return self.cache.select(shape_id, branch_factor, level);
        }

        let levels = self.dispatcher.result(shape_id)?;
        if use_cache {
            for (index, approx) in levels.iter().enumerate() {
                self.cache.put(shape_id, branch_factor, index as u32, approx.clone());
            }
        }

        select_level(&levels, level)
            .cloned()
            .ok_or_else(|| SpherizeError::EmptyResult {
                shape_id: shape_id.to_string(),
            })
    }

    /// Cancels the pending computation for `shape_id`.
    ///
    /// Returns false if there is no such computation or it already finished.
    pub fn cancel(&self, shape_id: &str) -> bool {
        match self.dispatcher.handle(shape_id) {
            Some(handle) if !handle.is_finished() => {
                handle.cancel();
                true
            }
            _ => false,
        }
    }

    /// Blocks until every requested computation has finished.
    pub fn await_all(&self) {
        self.dispatcher.await_all();
    }

    /// The level cache.
    pub fn cache(&self) -> &LevelCache {
        &self.cache
    }

    /// The task dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Flushes the cache and shuts the orchestrator down.
    ///
    /// Pending computations are not awaited; their results are simply never
    /// cached.
    pub fn close(mut self) -> SpherizeResult<()> {
        self.closed = true;
        self.cache.flush()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(err) = self.cache.flush() {
            error!(error = %err, "failed to flush sphere cache on drop");
        }
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("dispatcher", &self.dispatcher)
            .field("cache", &self.cache.path())
            .field("closed", &self.closed)
            .finish()
    }
}
