//! Integration tests for lithos-io.

use lithos_io::barrier::{LocalGroup, Rendezvous, SingleProcess};
use lithos_io::contract::{CheckpointSchedule, RestartRequest, RunParams};
use lithos_io::layout::{available_checkpoints, resolve_step, CheckpointLayout};
use lithos_io::snapshot::{FieldSnapshot, MeshSnapshot, Snapshot, SwarmSnapshot};
use lithos_io::store::{CheckpointStore, DirectoryStore, MemoryStore};
use lithos_io::validator::validate_run_params;
use lithos_io::xdmf::{fields_document, swarm_document, XdmfAttribute};
use lithos_mesh::CartesianMesh;
use lithos_types::{Dimension, LithosError};

// ─── Contract Tests ───────────────────────────────────────────

#[test]
fn default_run_params() {
    let p = RunParams::default();
    assert_eq!(p.restart_checkpoint, 1);
    assert!(p.duration.is_none());
    assert!(!p.checkpoints_requested());
}

#[test]
fn run_params_from_toml() {
    let src = r#"
        duration = 3500.0
        checkpoint_times = [1500.0]
        dt = 250.0

        [checkpoint]
        by_time = 1000.0

        [restart]
        step = -2
        dir = "outputs"
    "#;
    let p: RunParams = toml::from_str(src).unwrap();
    assert_eq!(p.duration, Some(3500.0));
    assert_eq!(p.checkpoint, Some(CheckpointSchedule::ByTime(1000.0)));
    assert_eq!(p.restart_checkpoint, 1);
    let r = p.restart.unwrap();
    assert_eq!(r.step, -2);
    assert_eq!(r.dir.unwrap().to_str(), Some("outputs"));
}

#[test]
fn run_params_json_round_trip() {
    let p = RunParams::for_steps(10)
        .checkpoint_every_steps(2)
        .with_swarm_stride(3)
        .restart_from(RestartRequest::last().in_dir("/tmp/x"));
    let json = serde_json::to_string(&p).unwrap();
    let back: RunParams = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
}

// ─── Validator Tests ──────────────────────────────────────────

#[test]
fn valid_params_pass() {
    let p = RunParams::for_duration(3500.0).checkpoint_every(1000.0).with_max_dt(10.0);
    assert!(validate_run_params(&p).is_ok());
}

#[test]
fn non_positive_values_rejected() {
    let cases = vec![
        RunParams::for_duration(0.0),
        RunParams::for_duration(-1.0),
        RunParams::for_duration(1.0).checkpoint_every(0.0),
        RunParams::for_steps(3).checkpoint_every_steps(0),
        RunParams::for_steps(3).with_swarm_stride(0),
        RunParams::for_steps(3).with_max_dt(-2.0),
        RunParams::for_steps(3).with_checkpoint_times(vec![f64::NAN]),
    ];
    for p in cases {
        assert!(matches!(validate_run_params(&p), Err(LithosError::InvalidConfig(_))), "{p:?}");
    }
}

// ─── Layout Tests ─────────────────────────────────────────────

#[test]
fn file_names() {
    let l = CheckpointLayout::default();
    assert_eq!(l.mesh_file(None), "mesh.h5");
    assert_eq!(l.mesh_file(Some(4)), "mesh-4.h5");
    assert_eq!(l.swarm_file(7), "swarm-7.h5");
    assert_eq!(l.field_file("temperature", 2), "temperature-2.h5");
    assert_eq!(l.xdmf_fields_file(3), "XDMF.fields.00003.xmf");
    assert_eq!(l.xdmf_swarms_file(12), "XDMF.swarms.00012.xmf");
}

#[test]
fn restart_step_resolution_from_listing() {
    let names = ["mesh.h5", "swarm-0.h5", "swarm-2.h5", "velocity-1.h5", "XDMF.fields.00002.xmf"];
    let idx = available_checkpoints(names.iter().copied());
    assert_eq!(idx, vec![0, 1, 2]);
    assert_eq!(resolve_step(&idx, -1).unwrap(), 2);
    assert!(matches!(resolve_step(&idx, 9), Err(LithosError::Restart(_))));
}

// ─── Store Tests ──────────────────────────────────────────────

#[test]
fn memory_store_clones_share_contents() {
    let mut a = MemoryStore::new();
    let b = a.clone();
    a.write("swarm-1.h5", &[1, 2, 3]).unwrap();
    assert!(b.exists("swarm-1.h5"));
    assert_eq!(b.read("swarm-1.h5").unwrap(), vec![1, 2, 3]);
    assert!(matches!(b.read("missing"), Err(LithosError::Io(_))));
}

#[test]
fn directory_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("outputs");
    let mut store = DirectoryStore::new(&root);
    assert!(!store.is_available());

    let snap = SwarmSnapshot { time: 12.5, step: 3, dim: Dimension::Two, positions: vec![[1.0, 2.0, 0.0]] };
    store.write("swarm-1.h5", &snap.to_bytes().unwrap()).unwrap();
    assert!(store.is_available());
    assert_eq!(store.list().unwrap(), vec!["swarm-1.h5".to_string()]);

    let back = SwarmSnapshot::from_bytes(&store.read("swarm-1.h5").unwrap()).unwrap();
    assert_eq!(back, snap);
}

#[test]
fn directory_store_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirectoryStore::new(dir.path());
    assert!(matches!(store.read("nope.h5"), Err(LithosError::Io(_))));
}

#[test]
fn directory_store_lists_payload_files_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DirectoryStore::new(dir.path());
    store.write("velocity-2.h5", &[2]).unwrap();
    store.write("swarm-10.h5", &[10]).unwrap();
    store.write("mesh.h5", &[0]).unwrap();
    std::fs::create_dir(dir.path().join("swarm-3.h5")).unwrap();

    let names = store.list().unwrap();
    assert_eq!(names, vec!["mesh.h5", "swarm-10.h5", "velocity-2.h5"]);
    assert!(!store.exists("swarm-3.h5"));
    assert_eq!(store.read("swarm-10.h5").unwrap(), vec![10]);

    let layout = CheckpointLayout::default();
    assert_eq!(layout.restartable_checkpoints(names.iter().map(String::as_str)), vec![10]);
}

// ─── Snapshot Tests ───────────────────────────────────────────

#[test]
fn mesh_snapshot_preserves_deformation() {
    let mut mesh = CartesianMesh::new_2d([0.0, 0.0], [1.0, 1.0], [2, 2]).unwrap();
    mesh.set_node(8, [1.0, 1.1, 0.0]);
    let snap = MeshSnapshot { time: 1.0, mesh };
    let back = MeshSnapshot::from_bytes(&snap.to_bytes().unwrap()).unwrap();
    assert_eq!(back.mesh.node(8), [1.0, 1.1, 0.0]);
}

#[test]
fn field_snapshot_bytes() {
    let f = FieldSnapshot::scalar("melt", 4.0, vec![0.0, 0.1, 0.2]);
    let back = FieldSnapshot::from_bytes(&f.to_bytes().unwrap()).unwrap();
    assert_eq!(back, f);
}

// ─── XDMF Tests ───────────────────────────────────────────────

#[test]
fn xdmf_documents_reference_payloads() {
    let mesh = CartesianMesh::new_2d([0.0, 0.0], [1.0, 1.0], [2, 2]).unwrap();
    let doc = fields_document("mesh.h5", &mesh, 1000.0, &[XdmfAttribute::new("velocity", "velocity-1.h5", 2)]);
    assert!(doc.contains("mesh.h5"));
    assert!(doc.contains("velocity-1.h5"));
    assert!(doc.contains("Time Value"));

    let doc = swarm_document("swarm-1.h5", 10, 1000.0, &[XdmfAttribute::new("material", "material-1.h5", 1)]);
    assert!(doc.contains("POLYVERTEX"));
    assert!(doc.contains("material-1.h5"));
}

// ─── Rendezvous Tests ─────────────────────────────────────────

#[test]
fn single_process_agreement_is_local() {
    let r = SingleProcess;
    r.wait();
    assert!(r.all_ok(true));
    assert!(!r.all_ok(false));
    assert_eq!(r.size(), 1);
}

#[test]
fn local_group_failure_is_collective() {
    let group = LocalGroup::new(3);
    let handles: Vec<_> = group
        .into_iter()
        .map(|g| {
            std::thread::spawn(move || {
                let first = g.all_ok(true);
                let second = g.all_ok(g.rank() != 1);
                (first, second)
            })
        })
        .collect();
    for h in handles {
        let (first, second) = h.join().unwrap();
        assert!(first);
        assert!(!second);
    }
}
