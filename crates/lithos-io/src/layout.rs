//! Checkpoint file naming.
//!
//! Per checkpoint `N` a run writes `mesh.h5` (or `mesh-N.h5` when the mesh
//! deforms), `swarm-N.h5`, `<field>-N.h5` per field or swarm variable,
//! `<tracer>-N.h5` per tracer set, and the index documents
//! `XDMF.fields.NNNNN.xmf` / `XDMF.swarms.NNNNN.xmf`.

use lithos_types::{LithosError, LithosResult};

/// File naming scheme of a checkpoint directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointLayout {
    /// Payload file extension, without the dot.
    pub extension: String,
}

impl Default for CheckpointLayout {
    fn default() -> Self {
        Self { extension: "h5".into() }
    }
}

impl CheckpointLayout {
    /// `mesh.h5` when `id` is `None`, else `mesh-N.h5`.
    pub fn mesh_file(&self, id: Option<u64>) -> String {
        match id {
            Some(id) => format!("mesh-{id}.{}", self.extension),
            None => format!("mesh.{}", self.extension),
        }
    }

    pub fn swarm_file(&self, id: u64) -> String {
        self.indexed("swarm", id)
    }

    pub fn field_file(&self, field: &str, id: u64) -> String {
        self.indexed(field, id)
    }

    pub fn tracer_file(&self, tracer: &str, id: u64) -> String {
        self.indexed(tracer, id)
    }

    pub fn xdmf_fields_file(&self, id: u64) -> String {
        format!("XDMF.fields.{id:05}.xmf")
    }

    pub fn xdmf_swarms_file(&self, id: u64) -> String {
        format!("XDMF.swarms.{id:05}.xmf")
    }

    /// Sorted indices of the checkpoints that carry a swarm payload. Only
    /// these can be restarted from.
    pub fn restartable_checkpoints<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<u64> {
        let prefix = "swarm-";
        let suffix = format!(".{}", self.extension);
        available_checkpoints(names.into_iter().filter(|n| n.starts_with(prefix) && n.ends_with(suffix.as_str())))
    }

    fn indexed(&self, prefix: &str, id: u64) -> String {
        format!("{prefix}-{id}.{}", self.extension)
    }
}

/// Checkpoint index encoded in a payload file name (`name-N.ext`).
///
/// Names without a `-` or with a non-numeric suffix yield `None`.
pub fn checkpoint_index(file_name: &str) -> Option<u64> {
    let stem = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);
    let (_, suffix) = stem.rsplit_once('-')?;
    suffix.parse().ok()
}

/// Sorted, de-duplicated checkpoint indices present among `names`.
pub fn available_checkpoints<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<u64> {
    let mut indices: Vec<u64> = names.into_iter().filter_map(checkpoint_index).collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Resolves a restart step against the available indices.
///
/// Negative steps count back from the end (`-1` = last).
pub fn resolve_step(available: &[u64], step: i64) -> LithosResult<u64> {
    let resolved = if step < 0 {
        let back = step.unsigned_abs() as usize;
        if back > available.len() {
            return Err(LithosError::Restart(format!(
                "cannot resolve step {step}: only {} checkpoints available",
                available.len()
            )));
        }
        available[available.len() - back]
    } else {
        step as u64
    };
    if available.binary_search(&resolved).is_err() {
        return Err(LithosError::Restart(format!("cannot find step {resolved} in checkpoint directory")));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_parsing() {
        assert_eq!(checkpoint_index("swarm-12.h5"), Some(12));
        assert_eq!(checkpoint_index("plastic_strain-3.h5"), Some(3));
        assert_eq!(checkpoint_index("mesh.h5"), None);
        assert_eq!(checkpoint_index("XDMF.fields.00001.xmf"), None);
        assert_eq!(checkpoint_index("notes-final.txt"), None);
    }

    #[test]
    fn negative_steps_count_from_end() {
        let idx = [0, 1, 2, 5];
        assert_eq!(resolve_step(&idx, -1).unwrap(), 5);
        assert_eq!(resolve_step(&idx, -2).unwrap(), 2);
        assert!(resolve_step(&idx, -5).is_err());
        assert!(resolve_step(&idx, 3).is_err());
        assert_eq!(resolve_step(&idx, 1).unwrap(), 1);
    }

    #[test]
    fn restartable_checkpoints_need_a_swarm() {
        let layout = CheckpointLayout::default();
        let names = ["mesh.h5", "swarm-0.h5", "temperature-1.h5", "swarm-2.h5", "velocity-3.h5", "XDMF.swarms.00002.xmf"];
        assert_eq!(available_checkpoints(names), vec![0, 1, 2, 3]);
        assert_eq!(layout.restartable_checkpoints(names), vec![0, 2]);
    }
}
