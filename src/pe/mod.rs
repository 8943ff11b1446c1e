//! 处理单元：包生成器与包接收端

mod generator;
mod processing_element;
mod sink;

pub use generator::{
    DestinationPolicy, FALLBACK_PIR, FIRST_STARTUP_DELAY, GenerationState, GeneratorConfig,
    GeneratorState, MIN_PACKET_LENGTH, NextFlit, PacketGenerator, STARTUP_DELAY,
};
pub use processing_element::{PeState, ProcessingElement, RECENT_PACKETS};
pub use sink::{PacketSink, PacketState, PacketStatus, ReceivedPacket, SinkCounters, SinkState};
