//! 2D 网格仿真
//!
//! 每个地址一个路由器和一个 PE，按注入率产生流量，运行指定周期数后打印汇总。

use clap::Parser;
use nocsim_rs::net::{MeshSnapshot, Stop, Tick};
use nocsim_rs::sim::{MeshSpec, SimTime, Simulator, StopToken};
use nocsim_rs::topo::mesh::{MeshOpts, build_mesh};
use std::fmt::Display;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "mesh-sim", about = "Run a 2D mesh network-on-chip simulation")]
struct Args {
    /// Mesh side length (ignored with --config)
    #[arg(long, default_value_t = 4)]
    mesh_size: u16,

    /// Path to a mesh spec JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of clock cycles to simulate
    #[arg(long, default_value_t = 1000)]
    cycles: u64,

    /// Packet injection rate in packets per cycle (ignored with --config)
    #[arg(long, default_value_t = 0.05)]
    pir: f64,

    #[arg(long, default_value_t = 10)]
    min_len: u16,

    #[arg(long, default_value_t = 10)]
    max_len: u16,

    /// Cycle after which generators start no new packets
    #[arg(long)]
    end_time: Option<u64>,

    /// Pick destinations uniformly over the mesh instead of always node 1
    #[arg(long)]
    uniform_dest: bool,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Resume from a checkpoint written by --checkpoint-out
    #[arg(long)]
    checkpoint_in: Option<PathBuf>,

    /// Write a checkpoint after the last cycle
    #[arg(long)]
    checkpoint_out: Option<PathBuf>,
}

fn fail(what: &str, err: impl Display) -> ! {
    eprintln!("error: {what}: {err}");
    std::process::exit(2);
}

fn main() {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let spec = match &args.config {
        Some(path) => MeshSpec::load(path).unwrap_or_else(|e| fail("load mesh spec", e)),
        None => MeshOpts {
            mesh_size: args.mesh_size,
            pir: args.pir,
            min_packet_length: args.min_len,
            max_packet_length: args.max_len,
            end_time: args.end_time.map(SimTime).unwrap_or(SimTime::MAX),
            uniform_destination: args.uniform_dest,
            seed: args.seed,
        }
        .to_spec(),
    };
    let mut world = build_mesh(&spec).unwrap_or_else(|e| fail("build mesh", e));

    let mut start = SimTime::ZERO;
    if let Some(path) = &args.checkpoint_in {
        let raw = fs::read_to_string(path).unwrap_or_else(|e| fail("read checkpoint", e));
        let snap: MeshSnapshot =
            serde_json::from_str(&raw).unwrap_or_else(|e| fail("parse checkpoint", e));
        world
            .mesh
            .restore(&snap)
            .unwrap_or_else(|e| fail("restore checkpoint", e));
        start = snap.next_cycle;
        info!(path = %path.display(), next_cycle = start.0, "📂 从检查点恢复");
    }

    let mut sim = Simulator::starting_at(start);
    let stop = StopToken::new();
    let next_cycle = start + args.cycles;
    if args.cycles > 0 {
        let until = SimTime(next_cycle.0 - 1);
        sim.schedule(start, Tick { until });
        sim.run_until_stopped(until, &mut world, &stop);
    }

    if let Some(path) = &args.checkpoint_out {
        let snap = world.mesh.snapshot(next_cycle);
        let raw = serde_json::to_string_pretty(&snap).unwrap_or_else(|e| fail("encode checkpoint", e));
        fs::write(path, raw).unwrap_or_else(|e| fail("write checkpoint", e));
        info!(path = %path.display(), next_cycle = next_cycle.0, "💾 检查点已写入");
    }

    sim.schedule(sim.now(), Stop);
    sim.run(&mut world);

    let stats = world.mesh.stats();
    println!(
        "done @ cycle={} injected_flits={} delivered_ok={} delivered_faulty={} flit_order_faults={} dropped_flits={}",
        next_cycle.0,
        stats.injected_flits,
        stats.delivered_ok,
        stats.delivered_faulty,
        stats.flit_order_faults,
        stats.dropped_flits
    );
}
