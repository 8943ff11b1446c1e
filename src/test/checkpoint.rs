use crate::error::CheckpointError;
use crate::net::{MeshSnapshot, MeshWorld, Tick};
use crate::pe::DestinationPolicy;
use crate::sim::{MeshSpec, SimTime, Simulator, TrafficSpec};
use crate::topo::mesh::build_mesh;

fn spec(size: u16) -> MeshSpec {
    MeshSpec::uniform(
        size,
        TrafficSpec {
            pir: Some(0.02),
            min_packet_length: Some(3),
            max_packet_length: Some(8),
            destination: Some(DestinationPolicy::Uniform { nodes: size * size }),
            seed: Some(21),
            ..TrafficSpec::default()
        },
    )
}

fn world(size: u16) -> MeshWorld {
    build_mesh(&spec(size)).expect("build mesh")
}

#[test]
fn restored_mesh_continues_like_an_uninterrupted_run() {
    let until = SimTime(599);

    let mut uninterrupted = world(3);
    let mut sim = Simulator::default();
    sim.schedule(SimTime::ZERO, Tick { until });
    sim.run_until(SimTime(299), &mut uninterrupted);
    let snap = uninterrupted.mesh.snapshot(SimTime(300));

    let raw = serde_json::to_string(&snap).expect("encode snapshot");
    let decoded: MeshSnapshot = serde_json::from_str(&raw).expect("decode snapshot");
    assert_eq!(decoded, snap);

    let mut restored = world(3);
    restored.mesh.restore(&decoded).expect("restore");
    let mut resumed = Simulator::starting_at(decoded.next_cycle);
    resumed.schedule(decoded.next_cycle, Tick { until });
    resumed.run_until(until, &mut restored);

    sim.run_until(until, &mut uninterrupted);
    assert_eq!(restored.mesh.stats(), uninterrupted.mesh.stats());
    assert_eq!(
        restored.mesh.snapshot(SimTime(600)),
        uninterrupted.mesh.snapshot(SimTime(600))
    );
    assert!(uninterrupted.mesh.stats().delivered_ok > 0);
}

#[test]
fn restore_rejects_a_different_mesh_size() {
    let small = world(2);
    let snap = small.mesh.snapshot(SimTime(0));
    let mut big = world(3);
    let err = big.mesh.restore(&snap).expect_err("shape mismatch");
    assert!(matches!(
        err,
        CheckpointError::ShapeMismatch {
            snapshot: 4,
            mesh: 9,
            ..
        }
    ));
}

#[test]
fn restore_rejects_swapped_addresses_without_touching_nodes() {
    let w = world(2);
    let mut snap = w.mesh.snapshot(SimTime(0));
    snap.pes[1].address = 3;
    snap.pes[1].injected_flits = 99;

    let mut target = world(2);
    let err = target.mesh.restore(&snap).expect_err("address mismatch");
    assert!(matches!(
        err,
        CheckpointError::AddressMismatch {
            index: 1,
            expected: 1,
            found: 3,
        }
    ));
    assert_eq!(target.mesh.pe(1).expect("pe 1").injected_flits(), 0);
}
