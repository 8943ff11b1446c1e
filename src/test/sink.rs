use crate::flit::{Flit, FlitCrc, make_body, make_first_body, make_header, make_tail};
use crate::pe::{GeneratorConfig, PacketGenerator, PacketSink, PacketState, PacketStatus};
use crate::sim::SimTime;

fn packet(src: u16, dst: u16, len: u16) -> Vec<Flit> {
    let mut g = PacketGenerator::new(GeneratorConfig {
        address: src,
        pir: 0.0,
        ..GeneratorConfig::default()
    });
    g.generate_packet(len, dst)
}

fn feed(sink: &mut PacketSink, flits: &[Flit]) -> Vec<crate::pe::ReceivedPacket> {
    flits
        .iter()
        .enumerate()
        .filter_map(|(t, &f)| sink.put_flit(f, SimTime(t as u64)))
        .collect()
}

#[test]
fn complete_packet_is_reported_ok() {
    let mut sink = PacketSink::new(3);
    let reports = feed(&mut sink, &packet(0, 3, 6));
    assert_eq!(reports.len(), 1);
    let r = reports[0];
    assert_eq!(r.status, PacketStatus::Ok);
    assert_eq!((r.src, r.dst, r.id), (0, 3, 0));
    assert_eq!((r.declared_length, r.counted_length), (6, 6));
    assert!(r.crc_ok());
    assert_eq!(r.time, SimTime(5));
    assert_eq!(sink.state(), PacketState::WaitHeader);
    assert_eq!(sink.counters().ok_packets, 1);
    assert_eq!(sink.counters().received_flits, 6);
}

#[test]
fn missing_body_flit_makes_packet_faulty() {
    let mut pkt = packet(0, 3, 6);
    pkt.remove(3);
    let mut sink = PacketSink::new(3);
    let reports = feed(&mut sink, &pkt);
    assert_eq!(reports.len(), 1);
    let r = reports[0];
    assert_eq!(r.status, PacketStatus::Faulty);
    assert!(!r.length_ok());
    assert_eq!(r.counted_length, 5);
    assert_eq!(sink.counters().faulty_packets, 1);
    assert_eq!(sink.counters().ok_packets, 0);
}

#[test]
fn resyncs_on_next_header_after_flit_order_fault() {
    let h = make_header(3, 1);
    let fb = make_first_body(4, 9);
    let b = make_body(7);
    let t = make_tail(u32::from(FlitCrc::over([h, fb, b])));

    let mut sink = PacketSink::new(3);
    let reports = feed(&mut sink, &[make_header(3, 1), make_tail(0), h, fb, b, t]);

    assert_eq!(sink.counters().flit_order_faults, 1);
    assert_eq!(reports.len(), 1);
    let r = reports[0];
    assert!(r.is_ok());
    assert_eq!((r.src, r.id, r.declared_length, r.counted_length), (1, 9, 4, 4));
}

#[test]
fn error_burst_is_counted_once() {
    let mut sink = PacketSink::new(0);
    feed(&mut sink, &[make_body(1), make_body(2), make_tail(3)]);
    assert_eq!(sink.counters().flit_order_faults, 1);
    assert_eq!(sink.state(), PacketState::WaitHeader);

    // a good header clears the burst, the next stray flit counts again
    feed(&mut sink, &[make_header(0, 1), make_header(0, 1)]);
    assert_eq!(sink.counters().flit_order_faults, 2);
}

#[test]
fn parity_error_marks_packet_faulty_without_breaking_framing() {
    let mut pkt = packet(2, 0, 5);
    pkt[2] = Flit(pkt[2].raw() ^ 1);
    let mut sink = PacketSink::new(0);
    let mut all = pkt.clone();
    all.extend(packet(2, 0, 4));

    let reports = feed(&mut sink, &all);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].status, PacketStatus::Faulty);
    assert_eq!(reports[0].parity_errors, 1);
    assert!(reports[0].length_ok());
    assert!(reports[1].is_ok());
    assert_eq!(sink.counters().parity_errors, 1);
    assert_eq!(sink.counters().flit_order_faults, 0);
}

#[test]
fn corrupted_checksum_is_detected() {
    let mut pkt = packet(0, 1, 4);
    let last = pkt.len() - 1;
    pkt[last] = make_tail(0x1234);
    let mut sink = PacketSink::new(1);
    let r = feed(&mut sink, &pkt)[0];
    assert!(!r.crc_ok());
    assert_eq!(r.encoded_crc, 0x1234);
    assert_eq!(r.status, PacketStatus::Faulty);
}

#[test]
fn save_and_load_continue_mid_packet() {
    let pkt = packet(0, 1, 6);
    let mut sink = PacketSink::new(1);
    feed(&mut sink, &pkt[..3]);
    let saved = sink.save();

    let mut restored = PacketSink::new(1);
    restored.load(&saved);
    let reports = feed(&mut restored, &pkt[3..]);
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_ok());
}
