//! Checkpoint writing and restart.
//!
//! Every persistence operation runs between two rendezvous points: all
//! workers enter together and all leave with the same verdict, so one
//! worker's failure fails the whole group.

use std::io;

use lithos_io::layout::{available_checkpoints, resolve_step};
use lithos_io::xdmf::{fields_document, swarm_document, XdmfAttribute};
use lithos_io::{
    CheckpointRecord, CheckpointStore, DirectoryStore, FieldSnapshot, MeshSnapshot, RestartRequest, Snapshot,
    SwarmSnapshot, TracerSnapshot,
};
use lithos_telemetry::EventKind;
use lithos_types::constants::RESTART_TIME_TOLERANCE;
use lithos_types::{LithosError, LithosResult, Scalar};

use crate::model::Model;
use crate::solution::Solution;
use crate::swarm::{
    Swarm, MATERIAL_FIELD, MELT_FIELD, PARTICLE_TIME_FIELD, PLASTIC_STRAIN_FIELD, PREVIOUS_STRESS_FIELD,
};

const TEMPERATURE: &str = "temperature";

/// Swarm variables persisted with every swarm checkpoint.
pub const SWARM_VARIABLES: [&str; 5] =
    [MATERIAL_FIELD, PLASTIC_STRAIN_FIELD, MELT_FIELD, PREVIOUS_STRESS_FIELD, PARTICLE_TIME_FIELD];

/// Particle-centred diagnostics that can be listed in `default_outputs`.
pub const DIAGNOSTICS: [&str; 7] =
    ["viscosity", "density", "stress", "strain_rate", "yield_stress", "melt_fraction", "heat_production"];

/// Everything read back from one checkpoint.
struct RestartData {
    step: u64,
    swarm: SwarmSnapshot,
    variables: Vec<FieldSnapshot>,
    mesh: Option<MeshSnapshot>,
    fields: Vec<FieldSnapshot>,
    temperature: Option<FieldSnapshot>,
    tracers: Vec<TracerSnapshot>,
}

fn read<T: Snapshot>(store: &dyn CheckpointStore, name: &str) -> LithosResult<T> {
    T::from_bytes(&store.read(name)?)
}

fn write<T: Snapshot>(store: &mut dyn CheckpointStore, name: &str, payload: &T) -> LithosResult<()> {
    store.write(name, &payload.to_bytes()?)
}

impl Model {
    /// Runs `op` as a collective persistence operation.
    fn collective<T>(&mut self, op: impl FnOnce(&mut Self) -> LithosResult<T>) -> LithosResult<T> {
        self.rendezvous.wait();
        let result = op(self);
        if self.rendezvous.all_ok(result.is_ok()) {
            return result;
        }
        match result {
            Err(e) => Err(e),
            Ok(_) => Err(LithosError::Io(io::Error::other("persistence failed on another worker"))),
        }
    }

    // ─── Writing ──────────────────────────────────────────────

    /// Writes checkpoint `clock.checkpoint_id`: fields and tracers always,
    /// the swarm when `with_swarm` is set.
    pub fn checkpoint(&mut self, with_swarm: bool) -> LithosResult<CheckpointRecord> {
        let id = self.clock.checkpoint_id;
        self.collective(|m| m.write_fields(id))?;
        if with_swarm {
            self.collective(|m| m.write_swarm(id))?;
        }
        self.collective(|m| m.write_tracers(id))?;

        let record = CheckpointRecord { id, time: self.clock.time, step: self.clock.step, swarm: with_swarm };
        tracing::info!(id, time = record.time, step = record.step, swarm = with_swarm, "checkpoint written");
        self.emit(EventKind::Checkpoint { id, time: record.time, swarm: with_swarm });
        Ok(record)
    }

    /// Mesh fields owned by collaborators plus the requested diagnostics.
    fn checkpoint_fields(&self) -> LithosResult<(Vec<FieldSnapshot>, Vec<FieldSnapshot>)> {
        let time = self.clock.time;
        let wanted = |name: &str| {
            self.config.default_outputs.iter().any(|n| n == name) || self.config.restart_fields.iter().any(|n| n == name)
        };
        let mut mesh_fields: Vec<FieldSnapshot> =
            self.stokes.fields(&self.mesh, time).into_iter().filter(|f| wanted(&f.name)).collect();
        if let Some(thermal) = &self.thermal {
            mesh_fields.extend(thermal.fields(time).into_iter().filter(|f| wanted(&f.name)));
        }

        let mut particle_fields = Vec::new();
        for name in &self.config.default_outputs {
            if let Some(field) = self.diagnostic(name)? {
                particle_fields.push(field);
            }
        }
        Ok((mesh_fields, particle_fields))
    }

    /// Composes one particle diagnostic by name; `None` for other names.
    pub fn diagnostic(&self, name: &str) -> LithosResult<Option<FieldSnapshot>> {
        let c = self.composer();
        let time = self.clock.time;
        let dim = self.swarm.dim;
        let field = match name {
            "viscosity" => FieldSnapshot::scalar(name, time, c.viscosity()?),
            "density" => FieldSnapshot::scalar(name, time, c.density()?),
            "yield_stress" => FieldSnapshot::scalar(name, time, c.yield_stress()?),
            "melt_fraction" => FieldSnapshot::scalar(name, time, c.melt_fraction()?),
            "heat_production" => FieldSnapshot::scalar(name, time, c.heat_production()?),
            "strain_rate" => FieldSnapshot::scalar(
                name,
                time,
                (0..c.len()).map(|i| c.point(i).strain_rate_invariant).collect(),
            ),
            "stress" => FieldSnapshot {
                name: name.into(),
                time,
                components: dim.components(),
                values: c.stress()?.iter().flat_map(|s| s.components(dim).to_vec()).collect(),
            },
            _ => return Ok(None),
        };
        Ok(Some(field))
    }

    fn write_fields(&mut self, id: u64) -> LithosResult<()> {
        let time = self.clock.time;
        let mesh_file = if self.mesh_moves() {
            let name = self.layout.mesh_file(Some(id));
            write(self.store.as_mut(), &name, &MeshSnapshot { time, mesh: self.mesh.clone() })?;
            name
        } else {
            let name = self.layout.mesh_file(None);
            if !self.mesh_saved {
                write(self.store.as_mut(), &name, &MeshSnapshot { time, mesh: self.mesh.clone() })?;
                self.mesh_saved = true;
            }
            name
        };

        let (mesh_fields, particle_fields) = self.checkpoint_fields()?;
        let mut attrs = Vec::with_capacity(mesh_fields.len());
        for field in &mesh_fields {
            let file = self.layout.field_file(&field.name, id);
            write(self.store.as_mut(), &file, field)?;
            attrs.push(XdmfAttribute::new(field.name.clone(), file, field.components));
        }
        for field in &particle_fields {
            let file = self.layout.field_file(&field.name, id);
            write(self.store.as_mut(), &file, field)?;
        }

        let doc = fields_document(&mesh_file, &self.mesh, time, &attrs);
        self.store.write(&self.layout.xdmf_fields_file(id), doc.as_bytes())?;
        tracing::debug!(id, fields = mesh_fields.len(), diagnostics = particle_fields.len(), "fields written");
        Ok(())
    }

    fn write_swarm(&mut self, id: u64) -> LithosResult<()> {
        let time = self.clock.time;
        let swarm_file = self.layout.swarm_file(id);
        write(self.store.as_mut(), &swarm_file, &self.swarm.snapshot(time, self.clock.step))?;

        let mut attrs = Vec::new();
        for var in self.swarm.variables(time) {
            let file = self.layout.field_file(&var.name, id);
            write(self.store.as_mut(), &file, &var)?;
            attrs.push(XdmfAttribute::new(var.name.clone(), file, var.components));
        }
        let doc = swarm_document(&swarm_file, self.swarm.len(), time, &attrs);
        self.store.write(&self.layout.xdmf_swarms_file(id), doc.as_bytes())?;
        tracing::debug!(id, particles = self.swarm.len(), "swarm written");
        Ok(())
    }

    fn write_tracers(&mut self, id: u64) -> LithosResult<()> {
        let time = self.clock.time;
        for tracers in &self.tracers {
            let snapshot = tracers.snapshot(time);
            let file = self.layout.tracer_file(&snapshot.name, id);
            write(self.store.as_mut(), &file, &snapshot)?;
        }
        Ok(())
    }

    // ─── Restart ──────────────────────────────────────────────

    /// Restores the model from a checkpoint.
    ///
    /// Returns `None` (and leaves the model untouched) when the checkpoint
    /// location does not exist or holds no checkpoint.
    pub fn restart(&mut self, request: &RestartRequest) -> LithosResult<Option<u64>> {
        let data = match &request.dir {
            Some(dir) => {
                let store = DirectoryStore::new(dir);
                self.collective(|m| m.read_restart(&store, request.step))?
            }
            None => self.collective(|m| m.read_restart(m.store.as_ref(), request.step))?,
        };
        let Some(data) = data else {
            return Ok(None);
        };
        self.apply_restart(data)
    }

    fn read_restart(&self, store: &dyn CheckpointStore, step: i64) -> LithosResult<Option<RestartData>> {
        if !store.is_available() {
            tracing::info!(location = %store.location(), "no checkpoint directory, starting fresh");
            return Ok(None);
        }
        let names = store.list()?;
        let available = available_checkpoints(names.iter().map(String::as_str));
        if available.is_empty() {
            tracing::info!(location = %store.location(), "checkpoint directory is empty, starting fresh");
            return Ok(None);
        }
        let restartable = self.layout.restartable_checkpoints(names.iter().map(String::as_str));
        let step = resolve_step(&restartable, step)?;
        tracing::debug!(step, checkpoints = available.len(), restartable = restartable.len(), "restart step resolved");

        let swarm_file = self.layout.swarm_file(step);
        if !store.exists(&swarm_file) {
            return Err(LithosError::Restart(format!("checkpoint {step} has no swarm ({swarm_file})")));
        }
        let swarm: SwarmSnapshot = read(store, &swarm_file)?;
        if swarm.dim != self.mesh.dim {
            return Err(LithosError::Restart(format!(
                "checkpoint {step} is {:?}, model is {:?}",
                swarm.dim, self.mesh.dim
            )));
        }

        let mesh_file = if self.mesh_moves() { self.layout.mesh_file(Some(step)) } else { self.layout.mesh_file(None) };
        let mesh = if store.exists(&mesh_file) {
            Some(read::<MeshSnapshot>(store, &mesh_file)?)
        } else if self.mesh_moves() {
            return Err(LithosError::Restart(format!("deformed mesh {mesh_file} missing")));
        } else {
            tracing::warn!(file = %mesh_file, "mesh file missing, keeping current mesh");
            None
        };

        let mut variables = Vec::with_capacity(SWARM_VARIABLES.len());
        for var in SWARM_VARIABLES {
            let file = self.layout.field_file(var, step);
            if !store.exists(&file) {
                return Err(LithosError::Restart(format!("swarm variable {file} missing")));
            }
            variables.push(read::<FieldSnapshot>(store, &file)?);
        }

        let mut fields = Vec::new();
        for name in self.config.restart_fields.iter().filter(|n| n.as_str() != TEMPERATURE) {
            let file = self.layout.field_file(name, step);
            if !store.exists(&file) {
                return Err(LithosError::Restart(format!("restart field {file} missing")));
            }
            fields.push(read::<FieldSnapshot>(store, &file)?);
        }
        let temperature_file = self.layout.field_file(TEMPERATURE, step);
        let temperature =
            if store.exists(&temperature_file) { Some(read::<FieldSnapshot>(store, &temperature_file)?) } else { None };

        let mut tracers = Vec::with_capacity(self.tracers.len());
        for set in &self.tracers {
            let file = self.layout.tracer_file(set.name(), step);
            if !store.exists(&file) {
                return Err(LithosError::Restart(format!("tracer file {file} missing")));
            }
            tracers.push(read::<TracerSnapshot>(store, &file)?);
        }

        Ok(Some(RestartData { step, swarm, variables, mesh, fields, temperature, tracers }))
    }

    fn apply_restart(&mut self, data: RestartData) -> LithosResult<Option<u64>> {
        let time: Scalar = data.swarm.time;
        tracing::info!(checkpoint = data.step, time, "restarting model");

        if let Some(snapshot) = data.mesh {
            snapshot.mesh.validate()?;
            self.mesh = snapshot.mesh;
            tracing::info!("mesh loaded");
        }

        let mut swarm = Swarm::from_snapshot(&data.swarm);
        for var in &data.variables {
            swarm.restore_variable(var)?;
        }
        self.swarm = swarm;
        self.solution = Solution::new(self.swarm.len());
        self.solution_exists = false;
        tracing::info!(particles = self.swarm.len(), "swarm loaded");

        for field in &data.fields {
            if !self.stokes.restore_field(field)? {
                tracing::warn!(field = %field.name, "restart field not owned by the stokes solver");
            } else {
                tracing::info!(field = %field.name, "field reloaded");
            }
        }
        if let Some(field) = &data.temperature {
            match self.thermal.as_mut() {
                Some(thermal) => {
                    thermal.restore_field(field)?;
                    tracing::info!("temperature reloaded");
                }
                None => tracing::warn!("checkpoint has a temperature field but no thermal solver is attached"),
            }
        }
        self.refresh_temperature();

        for (set, snapshot) in self.tracers.iter_mut().zip(&data.tracers) {
            set.restore(snapshot)?;
            tracing::info!(tracers = %snapshot.name, count = snapshot.positions.len(), "tracers reloaded");
        }

        if let Some(t) = self.surface_process.as_ref().and_then(|p| p.model_time()) {
            if (t - time).abs() > RESTART_TIME_TOLERANCE {
                return Err(LithosError::Restart(format!(
                    "surface process time {t} does not match model time {time}"
                )));
            }
        }

        self.clock.time = time;
        self.clock.step = data.swarm.step;
        self.clock.checkpoint_id = data.step;
        self.clock.dt = None;
        self.emit(EventKind::Restart { checkpoint: data.step, time });
        Ok(Some(data.step))
    }
}
