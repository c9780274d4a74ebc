use codec::{CodecConfig, StructWriter};
use mqtt::{
    read_packet, write_packet, ConnectPacket, Packet, PubAckPacket, PublishPacket,
    SubscribePacket, Subscription,
};
use proptest::prelude::*;

fn topic() -> impl Strategy<Value = String> {
    "[a-z/+#]{1,24}"
}

fn publish() -> impl Strategy<Value = Packet> {
    (
        topic(),
        prop::collection::vec(any::<u8>(), 0..300),
        0u8..=2,
        any::<u16>(),
        any::<bool>(),
    )
        .prop_map(|(topic, payload, qos, id, retain)| {
            let mut packet = PublishPacket::new(topic, payload);
            if qos > 0 {
                packet = packet.with_qos(qos, id);
            }
            packet.retain = retain;
            Packet::Publish(packet)
        })
}

fn connect() -> impl Strategy<Value = Packet> {
    (
        "[A-Za-z0-9]{0,23}",
        any::<u16>(),
        any::<bool>(),
        prop::option::of((topic(), prop::collection::vec(any::<u8>(), 0..32), 0u8..=2)),
        prop::option::of(("[a-z]{1,12}", prop::option::of(prop::collection::vec(any::<u8>(), 0..16)))),
    )
        .prop_map(|(id, keep_alive, clean, will, credentials)| {
            let mut packet = ConnectPacket::new(id);
            packet.keep_alive = keep_alive;
            packet.clean_session = clean;
            if let Some((topic, message, qos)) = will {
                packet = packet.with_will(topic, message, qos, false);
            }
            if let Some((user, password)) = credentials {
                packet = packet.with_credentials(user, password);
            }
            Packet::Connect(packet)
        })
}

fn subscribe() -> impl Strategy<Value = Packet> {
    (
        any::<u16>(),
        prop::collection::vec((topic(), 0u8..=2), 1..8),
    )
        .prop_map(|(id, filters)| {
            let subscriptions = filters
                .into_iter()
                .map(|(filter, qos)| Subscription::new(filter, qos))
                .collect();
            Packet::Subscribe(SubscribePacket::new(id, subscriptions))
        })
}

fn any_packet() -> impl Strategy<Value = Packet> {
    prop_oneof![
        publish(),
        connect(),
        subscribe(),
        any::<u16>().prop_map(|id| Packet::PubAck(PubAckPacket::new(id))),
    ]
}

/// Clears what only decoding fills in so packets compare by content.
fn without_header(packet: Packet) -> Packet {
    match packet {
        Packet::Publish(mut p) => {
            p.header = Default::default();
            Packet::Publish(p)
        }
        Packet::Connect(mut p) => {
            p.header = Default::default();
            Packet::Connect(p)
        }
        Packet::Subscribe(mut p) => {
            p.header = Default::default();
            Packet::Subscribe(p)
        }
        Packet::PubAck(mut p) => {
            p.header = Default::default();
            Packet::PubAck(p)
        }
        other => other,
    }
}

proptest! {
    #[test]
    fn packet_stream_round_trip(packets in prop::collection::vec(any_packet(), 1..6)) {
        let mut writer = StructWriter::new(Vec::new());
        for packet in &packets {
            write_packet(&mut writer, packet).unwrap();
        }
        let bytes = writer.close().unwrap();

        let config = CodecConfig::default();
        let mut source = &bytes[..];
        for expected in packets {
            let decoded = read_packet(&mut source, &config).unwrap();
            prop_assert_eq!(decoded.header().frame_len(), decoded.to_bytes().unwrap().len());
            prop_assert_eq!(without_header(decoded), expected);
        }
        prop_assert!(source.is_empty());
    }

    #[test]
    fn truncated_packets_never_decode(packet in any_packet(), cut in 1usize..64) {
        let bytes = packet.to_bytes().unwrap();
        let keep = bytes.len().saturating_sub(cut);
        prop_assert!(mqtt::decode_packet(&bytes[..keep]).is_err());
    }
}
