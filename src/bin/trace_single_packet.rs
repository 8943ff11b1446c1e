//! 单包追踪模式
//!
//! 只发送一个数据包，打印详细的执行流程和调试信息

use clap::Parser;
use nocsim_rs::net::{MeshWorld, Stop, Tick};
use nocsim_rs::sim::{Event, SimTime, Simulator, World};
use nocsim_rs::topo::mesh::{MeshOpts, build_mesh};
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "trace-single-packet", about = "单包追踪模式：只发送一个数据包，打印详细的执行流程")]
struct Args {
    #[arg(long, default_value_t = 2)]
    mesh_size: u16,
    #[arg(long, default_value_t = 0)]
    src: u16,
    #[arg(long, default_value_t = 3)]
    dst: u16,
    /// 包长（flit 数，至少 3）
    #[arg(long, default_value_t = 5)]
    len: u16,
    /// 最多运行的周期数
    #[arg(long, default_value_t = 100)]
    max_cycles: u64,
}

/// 单包追踪事件：把一个完整的包放进源 PE 的发送队列
#[derive(Debug)]
struct TraceSinglePacket {
    src: u16,
    dst: u16,
    len: u16,
}

impl Event for TraceSinglePacket {
    #[tracing::instrument(skip(self, sim, world), fields(src = self.src, dst = self.dst, len = self.len))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TraceSinglePacket { src, dst, len } = *self;

        info!("📦 创建并发送单个数据包");
        debug!(now = ?sim.now(), "事件参数");

        let w = world
            .as_any_mut()
            .downcast_mut::<MeshWorld>()
            .expect("world must be MeshWorld");
        let pe = w.mesh.pe_mut(src).expect("source address inside mesh");
        pe.enqueue_packet(len, dst);

        debug!(backlog = pe.backlog(), "数据包已进入源 PE 队列，等待注入");
    }
}

fn main() {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let opts = MeshOpts {
        mesh_size: args.mesh_size,
        pir: 0.0,
        ..MeshOpts::default()
    };
    let mut world = build_mesh(&opts.to_spec()).expect("build mesh");
    let nodes = args.mesh_size * args.mesh_size;
    assert!(args.src < nodes && args.dst < nodes, "src/dst must be inside the mesh");

    info!("╔════════════════════════════════════════════════════════════════════════════════╗");
    info!("║                    单包追踪模式启动                                            ║");
    info!("╚════════════════════════════════════════════════════════════════════════════════╝");

    let mut sim = Simulator::default();
    let until = SimTime(args.max_cycles.saturating_sub(1));
    sim.schedule(
        SimTime::ZERO,
        TraceSinglePacket {
            src: args.src,
            dst: args.dst,
            len: args.len,
        },
    );
    sim.schedule(SimTime::ZERO, Tick { until });
    sim.run_until(until, &mut world);
    sim.schedule(sim.now(), Stop);
    sim.run(&mut world);

    info!("╔════════════════════════════════════════════════════════════════════════════════╗");
    info!("║                    仿真完成                                                    ║");
    info!("╚════════════════════════════════════════════════════════════════════════════════╝");

    let arrived = world
        .mesh
        .pe(args.dst)
        .and_then(|pe| pe.received().front().map(|p| p.time.0.to_string()));
    let stats = world.mesh.stats();
    println!(
        "done @ cycle={}, delivered_ok={}, delivered_faulty={}, forwarded_flits={}, arrival_cycle={}",
        sim.now().0,
        stats.delivered_ok,
        stats.delivered_faulty,
        stats.forwarded_flits,
        arrived.as_deref().unwrap_or("none")
    );
}
