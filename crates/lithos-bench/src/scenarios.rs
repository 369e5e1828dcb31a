//! Benchmark scenarios: mesh, materials, flow and run parameters.
//!
//! Three canonical scenarios for regression testing:
//! 1. **Shear box** - brittle crust sheared until it yields
//! 2. **Rift** - layered lithosphere under pure-shear extension, with melt
//! 3. **Elastic relaxation** - visco-elastic sediment whose timestep is set
//!    by the observation time

use serde::{Deserialize, Serialize};

use lithos_io::{MemoryStore, RunParams};
use lithos_material::{MaterialLibrary, Shape};
use lithos_mesh::CartesianMesh;
use lithos_solver::stub::{CellRefill, ConductiveGeotherm, Flow, MidpointAdvector, PrescribedFlow};
use lithos_solver::{Model, ModelConfig};
use lithos_types::units::SECONDS_PER_YEAR;
use lithos_types::{LithosError, LithosResult, Scalar};

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    /// Plastic crust in simple shear.
    ShearBox,
    /// Three-layer lithosphere in pure-shear extension.
    Rift,
    /// Elastic sediment in slow simple shear.
    ElasticRelaxation,
}

impl ScenarioKind {
    pub fn all() -> &'static [ScenarioKind] {
        &[ScenarioKind::ShearBox, ScenarioKind::Rift, ScenarioKind::ElasticRelaxation]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::ShearBox => "shear_box",
            ScenarioKind::Rift => "rift",
            ScenarioKind::ElasticRelaxation => "elastic_relaxation",
        }
    }

    /// Parses a name produced by [`ScenarioKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// A fully specified benchmark scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub config: ModelConfig,
    /// Domain size (m); the lower-left corner is the origin.
    pub extent: [Scalar; 2],
    pub resolution: [usize; 2],
    /// Preset names with the region they occupy. The first entry is the
    /// background; the rest are painted in order.
    pub layers: Vec<(String, Option<Shape>)>,
    pub flow: Flow,
    /// Pressure from the composed density instead of zero.
    pub lithostatic: bool,
    /// Fixed top and bottom temperatures (K) of a conductive geotherm.
    pub geotherm: Option<(Scalar, Scalar)>,
    pub run: RunParams,
}

fn background(name: &str) -> (String, Option<Shape>) {
    (name.to_string(), None)
}

fn layer(name: &str, top: Scalar, bottom: Scalar) -> (String, Option<Shape>) {
    (name.to_string(), Some(Shape::layer(top, bottom)))
}

impl Scenario {
    /// 40 km x 10 km of wet-quartzite crust sheared at 1e-14 1/s.
    pub fn shear_box() -> Self {
        Self {
            kind: ScenarioKind::ShearBox,
            config: ModelConfig { name: "shear_box".into(), ..ModelConfig::debug() },
            extent: [40e3, 10e3],
            resolution: [16, 4],
            layers: vec![background("upper_crust")],
            flow: Flow::SimpleShear { rate: 2e-14, origin: 0.0 },
            lithostatic: true,
            geotherm: Some((293.0, 573.0)),
            run: RunParams::for_steps(10).checkpoint_every_steps(5),
        }
    }

    /// 200 km x 60 km lithosphere extended at 1e-15 1/s.
    pub fn rift() -> Self {
        Self {
            kind: ScenarioKind::Rift,
            config: ModelConfig { name: "rift".into(), ..ModelConfig::debug() },
            extent: [200e3, 60e3],
            resolution: [20, 6],
            layers: vec![
                background("mantle_lithosphere"),
                layer("upper_crust", 60e3, 45e3),
                layer("lower_crust", 45e3, 25e3),
            ],
            flow: Flow::PureShear { rate: 1e-15, centre: [100e3, 30e3, 0.0] },
            lithostatic: true,
            geotherm: Some((293.0, 1573.0)),
            run: RunParams::for_steps(10),
        }
    }

    /// 10 km box of elastic sediment; the timestep is a third of the
    /// 10 kyr observation time.
    pub fn elastic_relaxation() -> Self {
        Self {
            kind: ScenarioKind::ElasticRelaxation,
            config: ModelConfig { name: "elastic_relaxation".into(), ..ModelConfig::debug() },
            extent: [10e3, 10e3],
            resolution: [8, 8],
            layers: vec![background("sediment")],
            flow: Flow::SimpleShear { rate: 1e-15, origin: 0.0 },
            lithostatic: false,
            geotherm: None,
            run: RunParams::for_duration(1e5 * SECONDS_PER_YEAR),
        }
    }

    pub fn from_kind(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::ShearBox => Self::shear_box(),
            ScenarioKind::Rift => Self::rift(),
            ScenarioKind::ElasticRelaxation => Self::elastic_relaxation(),
        }
    }

    /// Replaces the run length with a fixed number of steps, keeping the
    /// checkpoint schedule.
    pub fn with_steps(mut self, nstep: u64) -> Self {
        self.run.nstep = Some(nstep);
        self.run.duration = None;
        self
    }

    pub fn mesh(&self) -> LithosResult<CartesianMesh> {
        CartesianMesh::new_2d([0.0, 0.0], self.extent, self.resolution)
    }

    /// Builds the model with in-memory checkpoints and the initial state
    /// prepared. Layer names are looked up in `library`.
    pub fn build(&self, library: &MaterialLibrary) -> LithosResult<Model> {
        let mut materials = Vec::with_capacity(self.layers.len());
        for (name, shape) in &self.layers {
            let mut material = library.get(name).ok_or_else(|| {
                LithosError::Configuration(format!("unknown material preset '{name}' in scenario {}", self.kind.name()))
            })?;
            material.shape = shape.clone();
            materials.push(material);
        }
        let mut materials = materials.into_iter();
        let background = materials
            .next()
            .ok_or_else(|| LithosError::Configuration(format!("scenario {} has no materials", self.kind.name())))?;

        let mesh = self.mesh()?;
        let mut stokes = PrescribedFlow::new(self.flow);
        if self.lithostatic {
            stokes = stokes.with_lithostatic_pressure();
        }
        let mut model = Model::new(
            self.config.clone(),
            mesh.clone(),
            background,
            Box::new(stokes),
            Box::new(MidpointAdvector),
            Box::new(CellRefill::default()),
        )?
        .with_store(Box::new(MemoryStore::new()));

        if let Some((top, bottom)) = self.geotherm {
            model = model.with_thermal(Box::new(ConductiveGeotherm::new(&mesh, top, bottom)));
        }
        for material in materials {
            model.add_material(material, None)?;
        }
        model.init_model()?;
        Ok(model)
    }
}
