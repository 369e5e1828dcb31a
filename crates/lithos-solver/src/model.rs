//! The model: state, collaborators and the stepping loop.

use std::time::Instant;

use lithos_io::validator::validate_run_params;
use lithos_io::{CheckpointLayout, CheckpointStore, DirectoryStore, Rendezvous, RunParams, RunSummary, SingleProcess};
use lithos_material::{Material, MaterialRegistry};
use lithos_mesh::{CartesianMesh, FrictionBoundaries};
use lithos_telemetry::{EventBus, EventKind, SimulationEvent};
use lithos_types::{LithosError, LithosResult, MaterialId, Scalar};

use crate::clock::ModelClock;
use crate::composer::Composer;
use crate::config::ModelConfig;
use crate::hooks::{NoHooks, StepContext, StepHooks};
use crate::scheduler::CheckpointScheduler;
use crate::solution::Solution;
use crate::strategy::{
    Advector, FreeSurface, MeshAdvector, PopulationControl, SolveOptions, SolveReport, StokesProblem, StokesSolver,
    SurfaceProcess, ThermalSolver, ThermalSources, TracerSet, Visugrid,
};
use crate::swarm::{Remap, Swarm};
use crate::timestep::{TimestepBound, TimestepInputs};

/// A geodynamic model.
///
/// Owns the material registry, the particle swarm and its history fields,
/// the clock, and the collaborators that solve and advect. Per-particle
/// state is mutated only by [`Model::run_for`] and the methods it calls.
pub struct Model {
    pub config: ModelConfig,
    pub mesh: CartesianMesh,
    pub registry: MaterialRegistry,
    pub swarm: Swarm,
    pub solution: Solution,
    pub clock: ModelClock,
    pub friction: Option<FrictionBoundaries>,

    pub(crate) solution_exists: bool,
    pub(crate) mesh_saved: bool,

    pub(crate) stokes: Box<dyn StokesSolver>,
    pub(crate) advector: Box<dyn Advector>,
    pub(crate) population: Box<dyn PopulationControl>,
    pub(crate) thermal: Option<Box<dyn ThermalSolver>>,
    pub(crate) mesh_advector: Option<Box<dyn MeshAdvector>>,
    pub(crate) free_surface: Option<Box<dyn FreeSurface>>,
    pub(crate) surface_process: Option<Box<dyn SurfaceProcess>>,
    pub(crate) visugrid: Option<Box<dyn Visugrid>>,
    pub(crate) tracers: Vec<Box<dyn TracerSet>>,
    pub(crate) hooks: Box<dyn StepHooks>,

    pub(crate) store: Box<dyn CheckpointStore>,
    pub(crate) rendezvous: Box<dyn Rendezvous>,
    pub(crate) layout: CheckpointLayout,
    pub(crate) events: Option<EventBus>,
}

impl Model {
    /// Builds a model and populates its swarm with background material.
    ///
    /// Checkpoints go to a [`DirectoryStore`] at `config.output_dir` unless
    /// another store is set with [`Model::with_store`].
    pub fn new(
        config: ModelConfig,
        mesh: CartesianMesh,
        background: Material,
        stokes: Box<dyn StokesSolver>,
        advector: Box<dyn Advector>,
        population: Box<dyn PopulationControl>,
    ) -> LithosResult<Self> {
        config.validate()?;
        mesh.validate()?;
        background.validate()?;

        let per_cell = config.population.particles_per_cell(mesh.dim);
        let positions = population.populate(&mesh, per_cell);
        if positions.is_empty() {
            return Err(LithosError::InvalidMesh("particle layout produced no particles".into()));
        }
        let swarm = Swarm::new(mesh.dim, positions);
        let solution = Solution::new(swarm.len());
        let store = Box::new(DirectoryStore::new(&config.output_dir));

        tracing::info!(
            name = %config.name,
            particles = swarm.len(),
            elements = mesh.element_count(),
            "model created"
        );

        Ok(Self {
            registry: MaterialRegistry::new(background),
            config,
            mesh,
            swarm,
            solution,
            clock: ModelClock::default(),
            friction: None,
            solution_exists: false,
            mesh_saved: false,
            stokes,
            advector,
            population,
            thermal: None,
            mesh_advector: None,
            free_surface: None,
            surface_process: None,
            visugrid: None,
            tracers: Vec::new(),
            hooks: Box::new(NoHooks),
            store,
            rendezvous: Box::new(SingleProcess),
            layout: CheckpointLayout::default(),
            events: None,
        })
    }

    // ─── Builders ─────────────────────────────────────────────

    /// Attaches a thermal solver and samples its temperature on the swarm.
    pub fn with_thermal(mut self, thermal: Box<dyn ThermalSolver>) -> Self {
        self.thermal = Some(thermal);
        self.refresh_temperature();
        self
    }

    pub fn with_mesh_advector(mut self, advector: Box<dyn MeshAdvector>) -> Self {
        self.mesh_advector = Some(advector);
        self
    }

    pub fn with_free_surface(mut self, free_surface: Box<dyn FreeSurface>) -> Self {
        self.free_surface = Some(free_surface);
        self
    }

    pub fn with_surface_process(mut self, process: Box<dyn SurfaceProcess>) -> Self {
        self.surface_process = Some(process);
        self
    }

    pub fn with_visugrid(mut self, grid: Box<dyn Visugrid>) -> Self {
        self.visugrid = Some(grid);
        self
    }

    pub fn with_tracers(mut self, tracers: Box<dyn TracerSet>) -> Self {
        self.tracers.push(tracers);
        self
    }

    pub fn with_hooks(mut self, hooks: Box<dyn StepHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_store(mut self, store: Box<dyn CheckpointStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_rendezvous(mut self, rendezvous: Box<dyn Rendezvous>) -> Self {
        self.rendezvous = rendezvous;
        self
    }

    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn with_friction(mut self, friction: FrictionBoundaries) -> Self {
        self.friction = Some(friction);
        self
    }

    // ─── Materials ────────────────────────────────────────────

    /// Registers a material and paints its shape onto the swarm.
    ///
    /// Painting happens immediately, so a later material overrides the
    /// claims of earlier ones where their shapes overlap.
    pub fn add_material(&mut self, material: Material, index: Option<MaterialId>) -> LithosResult<MaterialId> {
        let shape = material.shape.clone();
        let id = self.registry.add(material, index)?;
        if let Some(shape) = shape {
            let painted = shape.paint(&self.swarm.positions, &mut self.swarm.material, id, self.swarm.dim);
            tracing::debug!(material = %id, painted, "material painted");
        }
        Ok(id)
    }

    /// Sets every particle's melt field from its material's initial melt
    /// fraction (zero where none is declared).
    pub fn init_melt_fraction(&mut self) -> LithosResult<()> {
        for (melt, &id) in self.swarm.melt.iter_mut().zip(&self.swarm.material) {
            *melt = self.registry.get(id)?.initial_melt_fraction.unwrap_or(0.0);
        }
        Ok(())
    }

    /// Prepares the initial state: steady-state geotherm when a thermal
    /// solver is attached, then the initial melt fraction.
    pub fn init_model(&mut self) -> LithosResult<()> {
        if self.thermal.is_some() {
            let sources = self.thermal_sources()?;
            if let Some(thermal) = self.thermal.as_mut() {
                thermal.steady_state(&sources, &self.mesh)?;
            }
            self.refresh_temperature();
        }
        self.init_melt_fraction()
    }

    // ─── Accessors ────────────────────────────────────────────

    /// Composer over the current state.
    pub fn composer(&self) -> Composer<'_> {
        Composer {
            registry: &self.registry,
            config: &self.config,
            mesh: &self.mesh,
            swarm: &self.swarm,
            solution: &self.solution,
            friction: self.friction.as_ref(),
            solution_exists: self.solution_exists,
            dt: self.clock.dt,
        }
    }

    pub fn solution_exists(&self) -> bool {
        self.solution_exists
    }

    pub fn particle_count(&self) -> usize {
        self.swarm.len()
    }

    pub fn tracers(&self) -> &[Box<dyn TracerSet>] {
        &self.tracers
    }

    pub fn store(&self) -> &dyn CheckpointStore {
        self.store.as_ref()
    }

    pub fn layout(&self) -> &CheckpointLayout {
        &self.layout
    }

    /// Whether mesh nodes move during the run.
    pub fn mesh_moves(&self) -> bool {
        self.mesh_advector.is_some() || self.free_surface.is_some()
    }

    // ─── Internal helpers ─────────────────────────────────────

    pub(crate) fn emit(&self, kind: EventKind) {
        if let Some(bus) = &self.events {
            bus.emit(SimulationEvent::new(self.clock.step, kind));
        }
    }

    pub(crate) fn refresh_temperature(&mut self) {
        if let Some(thermal) = &self.thermal {
            self.solution.temperature = Some(thermal.sample(&self.mesh, &self.swarm.positions));
        }
    }

    pub(crate) fn apply_remap(&mut self, remap: &Remap) -> LithosResult<()> {
        self.swarm.apply_remap(remap)?;
        self.solution.remap(&remap.sources)?;
        self.refresh_temperature();
        Ok(())
    }

    pub(crate) fn update_owners(&mut self) -> LithosResult<()> {
        if let Some(remap) = self.population.update_owners(&self.swarm.positions, &self.mesh)? {
            tracing::debug!(before = self.swarm.len(), after = remap.len(), "particle owners updated");
            self.apply_remap(&remap)?;
        }
        Ok(())
    }

    pub(crate) fn thermal_sources(&self) -> LithosResult<ThermalSources> {
        let c = self.composer();
        Ok(ThermalSources {
            positions: self.swarm.positions.clone(),
            diffusivity: c.diffusivity()?,
            heat_production: c.heat_production()?,
        })
    }

    fn run_hooks(&mut self, pre: bool) -> LithosResult<()> {
        let mut ctx = StepContext { clock: &self.clock, mesh: &self.mesh, swarm: &mut self.swarm };
        if pre {
            self.hooks.pre_solve(&mut ctx)
        } else {
            self.hooks.post_step(&mut ctx)
        }
    }

    // ─── Solve and timestep ───────────────────────────────────

    /// Runs the non-linear Stokes solve.
    ///
    /// The first solve of the model (step 0) uses the initial tolerance
    /// and iteration bounds.
    pub fn solve(&mut self) -> LithosResult<SolveReport> {
        let options = SolveOptions::from_config(&self.config, self.clock.step == 0);
        self.refresh_temperature();
        let mut problem = StokesProblem {
            registry: &self.registry,
            config: &self.config,
            mesh: &self.mesh,
            swarm: &self.swarm,
            friction: self.friction.as_ref(),
            solution: &mut self.solution,
            solution_exists: &mut self.solution_exists,
            dt: self.clock.dt,
            hooks: self.hooks.as_mut(),
        };
        let report = self.stokes.solve(&mut problem, &options)?;
        self.solution_exists = true;
        self.solution.check_len(self.swarm.len())?;

        if report.converged {
            tracing::debug!(iterations = report.iterations, residual = report.residual, "stokes solve converged");
        } else {
            tracing::warn!(
                iterations = report.iterations,
                residual = report.residual,
                tolerance = options.tolerance,
                "stokes solve did not reach tolerance"
            );
        }
        self.emit(EventKind::Solve {
            iterations: report.iterations,
            residual: report.residual,
            converged: report.converged,
            initial: options.initial,
        });
        Ok(report)
    }

    fn select_dt(
        &self,
        scheduler: &CheckpointScheduler,
        run_end: Option<Scalar>,
        ceiling: Option<Scalar>,
    ) -> LithosResult<(Scalar, TimestepBound)> {
        let velocity = self.stokes.velocity();
        let advector_max_dt = self.advector.max_dt(velocity, &self.mesh);
        let thermal_max_dt = match &self.thermal {
            Some(thermal) if self.config.advection_diffusion.limits_timestep() => {
                let sources = self.thermal_sources()?;
                Some(thermal.max_dt(&sources, velocity, &self.mesh))
            }
            _ => None,
        };
        let inputs = TimestepInputs {
            cfl: self.config.cfl,
            advector_max_dt,
            thermal_max_dt,
            time: self.clock.time,
            next_checkpoint: scheduler.next_time(),
            run_end,
            user_ceiling: ceiling,
            checkpoint_times: scheduler.checkpoint_times(),
            min_observation_time: self.composer().min_observation_time(),
        };
        let (dt, bound) = inputs.select()?;
        tracing::debug!(dt, %bound, "timestep selected");
        self.emit(EventKind::Timestep { dt, bound: bound.to_string() });
        Ok((dt, bound))
    }

    // ─── Stepping loop ────────────────────────────────────────

    /// Runs the model until the requested duration has elapsed or the
    /// requested number of steps has been performed, whichever keeps the
    /// loop alive longer.
    ///
    /// Each iteration: pre-solve hook, solve, timestep selection, state
    /// advance, clock advance, checkpoint decision, post-step hook. An
    /// initial checkpoint is written when any checkpoint is requested.
    pub fn run_for(&mut self, params: &RunParams) -> LithosResult<RunSummary> {
        validate_run_params(params)?;
        self.config.validate()?;
        self.registry.validate()?;
        let started = Instant::now();

        let mut summary = RunSummary::default();
        if let Some(request) = &params.restart {
            summary.restarted_from = self.restart(request)?;
        }

        let run_end = params.duration.map(|d| self.clock.time + d);
        let nstep = params.nstep.unwrap_or(0);
        let mut steps_done: u64 = 0;
        let mut scheduler = CheckpointScheduler::new(params, self.clock.time, steps_done);

        tracing::info!(
            time = self.clock.time,
            step = self.clock.step,
            duration = ?params.duration,
            nstep,
            "run started"
        );

        if scheduler.is_active() {
            summary.checkpoints.push(self.checkpoint(true)?);
        }

        while run_end.is_some_and(|end| self.clock.time < end) || steps_done < nstep {
            let step_started = Instant::now();
            self.emit(EventKind::StepBegin { time: self.clock.time });

            self.run_hooks(true)?;
            self.solve()?;

            let (dt, _bound) = self.select_dt(&scheduler, run_end, params.dt)?;
            self.clock.dt = Some(dt);
            self.advance(dt)?;
            self.clock.tick(dt);
            steps_done += 1;

            tracing::info!(step = self.clock.step, time = self.clock.time, dt, "step complete");

            if scheduler.due(self.clock.time, steps_done) {
                self.clock.checkpoint_id += 1;
                let with_swarm = scheduler.swarm_due(self.clock.checkpoint_id);
                summary.checkpoints.push(self.checkpoint(with_swarm)?);
            }

            self.run_hooks(false)?;

            if let Some(bus) = self.events.as_mut() {
                bus.end_step(self.clock.step, self.clock.time, dt, step_started.elapsed().as_secs_f64());
            }
        }
        if let Some(bus) = self.events.as_mut() {
            bus.end_run();
        }

        summary.steps = steps_done;
        summary.time = self.clock.time;
        summary.step = self.clock.step;
        summary.last_dt = self.clock.dt;
        summary.particle_count = self.swarm.len();
        summary.wall_time_seconds = started.elapsed().as_secs_f64();

        tracing::info!(
            steps = summary.steps,
            time = summary.time,
            checkpoints = summary.checkpoints.len(),
            "run finished"
        );
        Ok(summary)
    }
}
