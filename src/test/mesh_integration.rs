use crate::flit::make_header;
use crate::net::{Emit, MeshStats, MeshWorld, NodeEvent, NodeId, NodeModel, Stop, Tick};
use crate::pe::DestinationPolicy;
use crate::router::Direction;
use crate::sim::{MeshSpec, SimTime, Simulator, TrafficSpec};
use crate::topo::mesh::{MeshOpts, build_mesh};

fn idle_mesh(size: u16) -> MeshWorld {
    let opts = MeshOpts {
        mesh_size: size,
        pir: 0.0,
        ..MeshOpts::default()
    };
    build_mesh(&opts.to_spec()).expect("build mesh")
}

fn run(world: &mut MeshWorld, cycles: u64) -> Simulator {
    let mut sim = Simulator::default();
    let until = SimTime(cycles - 1);
    sim.schedule(SimTime::ZERO, Tick { until });
    sim.run_until(until, world);
    sim
}

fn uniform_spec(size: u16, end_time: u64, seed: u64) -> MeshSpec {
    MeshSpec::uniform(
        size,
        TrafficSpec {
            pir: Some(0.01),
            min_packet_length: Some(3),
            max_packet_length: Some(6),
            end_time: Some(end_time),
            destination: Some(DestinationPolicy::Uniform { nodes: size * size }),
            seed: Some(seed),
        },
    )
}

#[test]
fn neighbors_follow_mesh_geometry() {
    let world = idle_mesh(3);
    let m = &world.mesh;
    assert_eq!(m.neighbor(4, Direction::North), Some(NodeId::Router(1)));
    assert_eq!(m.neighbor(4, Direction::East), Some(NodeId::Router(5)));
    assert_eq!(m.neighbor(4, Direction::West), Some(NodeId::Router(3)));
    assert_eq!(m.neighbor(4, Direction::South), Some(NodeId::Router(7)));
    assert_eq!(m.neighbor(4, Direction::Local), Some(NodeId::Pe(4)));
    assert_eq!(m.neighbor(0, Direction::North), None);
    assert_eq!(m.neighbor(0, Direction::West), None);
    assert_eq!(m.neighbor(2, Direction::East), None);
    assert_eq!(m.neighbor(8, Direction::South), None);
}

#[test]
fn emits_land_on_the_opposite_port() {
    let world = idle_mesh(3);
    let m = &world.mesh;
    let f = make_header(5, 4);

    assert_eq!(
        m.route_emit(
            NodeId::Router(4),
            Emit::Flit {
                port: Direction::East,
                flit: f,
            }
        ),
        Some((
            NodeId::Router(5),
            NodeEvent::Flit {
                port: Direction::West,
                flit: f,
            }
        ))
    );
    assert_eq!(
        m.route_emit(
            NodeId::Router(4),
            Emit::Credit {
                port: Direction::North,
            }
        ),
        Some((NodeId::Router(1), NodeEvent::CreditIn(Direction::South)))
    );
    assert_eq!(
        m.route_emit(
            NodeId::Router(4),
            Emit::Credit {
                port: Direction::Local,
            }
        ),
        Some((NodeId::Pe(4), NodeEvent::CreditIn(Direction::Local)))
    );
    assert_eq!(
        m.route_emit(
            NodeId::Pe(4),
            Emit::Flit {
                port: Direction::Local,
                flit: f,
            }
        ),
        Some((
            NodeId::Router(4),
            NodeEvent::Flit {
                port: Direction::Local,
                flit: f,
            }
        ))
    );
    assert_eq!(
        m.route_emit(
            NodeId::Router(2),
            Emit::Flit {
                port: Direction::East,
                flit: f,
            }
        ),
        None
    );
}

#[test]
fn single_packet_crosses_the_mesh() {
    let mut world = idle_mesh(2);
    world.mesh.pe_mut(0).expect("pe 0").enqueue_packet(5, 3);
    run(&mut world, 100);

    let received = world.mesh.pe(3).expect("pe 3").received();
    assert_eq!(received.len(), 1);
    assert!(received[0].is_ok());
    assert_eq!((received[0].src, received[0].dst), (0, 3));

    // 0 -> east -> 1 -> south -> 3 -> local: three routers forward every flit
    let s = world.mesh.stats();
    assert_eq!(s.injected_flits, 5);
    assert_eq!(s.forwarded_flits, 15);
    assert_eq!(s.received_flits, 5);
    assert_eq!(s.delivered_ok, 1);
    assert_eq!(s.dropped_flits, 0);
}

#[test]
fn uniform_traffic_drains_without_faults() {
    let mut world = build_mesh(&uniform_spec(4, 1500, 3)).expect("build mesh");
    run(&mut world, 3000);

    let s = world.mesh.stats();
    let sent: u64 = world
        .mesh
        .pes()
        .iter()
        .map(|pe| pe.generator().sent_packets())
        .sum();
    assert!(sent > 100, "sent {sent}");
    assert_eq!(s.generated_flits, s.injected_flits);
    assert_eq!(s.injected_flits, s.received_flits);
    assert_eq!(s.delivered_ok, sent);
    assert_eq!(s.delivered_faulty, 0);
    assert_eq!(s.flit_order_faults, 0);
    assert_eq!(s.dropped_flits, 0);
    assert_eq!(s.orphan_flits, 0);
    for r in world.mesh.routers() {
        for d in Direction::COMPASS {
            assert!(r.router().credit(d) <= 3);
        }
    }
}

#[test]
fn runs_are_reproducible() {
    let stats = |seed| -> MeshStats {
        let mut world = build_mesh(&uniform_spec(3, 800, seed)).expect("build mesh");
        run(&mut world, 1000);
        world.mesh.stats()
    };
    assert_eq!(stats(9), stats(9));
}

#[test]
fn stop_broadcasts_end_and_halts_ticks() {
    let mut world = build_mesh(&uniform_spec(2, 10_000, 1)).expect("build mesh");
    let mut sim = Simulator::default();
    sim.schedule(SimTime::ZERO, Tick { until: SimTime(500) });
    sim.schedule(SimTime(100), Stop);
    sim.run(&mut world);

    assert!(world.mesh.is_stopped());
    assert!(world.mesh.pes().iter().all(|pe| !pe.is_running()));
    // Stop runs before the t=100 tick, so no tick happens after it
    assert!(world.mesh.routers().iter().all(|r| r.now() == SimTime(99)));
    assert_eq!(sim.now(), SimTime(100));
    assert_eq!(sim.pending(), 0);
}
