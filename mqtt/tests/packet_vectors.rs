//! Byte-exact packets checked in both directions.

use mqtt::{
    decode_packet, ConnectPacket, MqttError, Packet, PacketType, PublishPacket, SubAckCode,
    SubAckPacket, SubscribePacket, Subscription, UnsubscribePacket,
};

const CONNECT_WITH_PAYLOAD: [u8; 27] = [
    0x10, 25, // fixed header
    0x00, 0x04, b'M', b'Q', b'T', b'T', // protocol name
    0x04,        // level
    0b1101_0100, // username, password, will QoS 2, will flag
    0x00, 0x0A, // keep alive
    0x00, 0x01, b'1', // client id
    0x00, 0x01, b'2', // will topic
    0x00, 0x01, 0x03, // will message
    0x00, 0x01, b'4', // username
    0x00, 0x01, b'5', // password
];

const SUBSCRIBE_TWO_FILTERS: [u8; 14] = [
    0x82, 12, // fixed header
    0x00, 0x08, // packet id
    0x00, 0x02, b'a', b'b', 0b0000_0000, // filter 1, QoS 0
    0x00, 0x02, b'c', b'd', 0b0000_0001, // filter 2, QoS 1
];

const UNSUBSCRIBE_TWO_FILTERS: [u8; 12] = [
    0xA2, 10, // fixed header
    0x00, 0x08, // packet id
    0x00, 0x02, b'a', b'b', // filter 1
    0x00, 0x02, b'c', b'd', // filter 2
];

#[test]
fn connect_with_payload_encodes() {
    let mut packet = ConnectPacket::new("1")
        .with_will("2", vec![3], 2, false)
        .with_credentials("4", Some(b"5".to_vec()));
    packet.keep_alive = 10;
    assert_eq!(
        Packet::Connect(packet).to_bytes().unwrap(),
        CONNECT_WITH_PAYLOAD
    );
}

#[test]
fn connect_with_payload_decodes() {
    let Packet::Connect(packet) = decode_packet(&CONNECT_WITH_PAYLOAD).unwrap() else {
        panic!("expected CONNECT");
    };
    assert_eq!(packet.protocol_name, "MQTT");
    assert_eq!(packet.protocol_level, 4);
    assert_eq!(packet.keep_alive, 10);
    assert!(!packet.clean_session);
    assert_eq!(packet.will_qos, 2);
    assert!(!packet.will_retain);
    assert_eq!(packet.client_id, "1");
    assert_eq!(packet.will_topic.as_deref(), Some("2"));
    assert_eq!(packet.will_message.as_deref(), Some(&[3u8][..]));
    assert_eq!(packet.username.as_deref(), Some("4"));
    assert_eq!(packet.password.as_deref(), Some(&b"5"[..]));
    assert_eq!(packet.header.remaining_length, 25);
}

#[test]
fn connect_without_payload_options() {
    let bytes = [
        0x10, 13, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x04, 0b0000_0010, 0x00, 0x0A, 0x00,
        0x01, b'1',
    ];
    let Packet::Connect(packet) = decode_packet(&bytes).unwrap() else {
        panic!("expected CONNECT");
    };
    assert!(packet.clean_session);
    assert!(!packet.has_will());
    assert_eq!(packet.username, None);
    assert_eq!(packet.password, None);

    let mut rebuilt = ConnectPacket::new("1");
    rebuilt.clean_session = true;
    rebuilt.keep_alive = 10;
    assert_eq!(Packet::Connect(rebuilt).to_bytes().unwrap(), bytes);
}

#[test]
fn will_qos_without_will_is_rejected() {
    let bytes = [
        0x10, 13, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x04, 0b0001_1010, 0x00, 0x0A, 0x00,
        0x01, b'1',
    ];
    let err = decode_packet(&bytes).unwrap_err();
    assert!(matches!(
        err,
        MqttError::InvalidPacket {
            packet: PacketType::Connect,
            ..
        }
    ));
}

#[test]
fn publish_without_payload() {
    let bytes = [0x30, 4, 0x00, 0x02, b'a', b'b'];
    let Packet::Publish(packet) = decode_packet(&bytes).unwrap() else {
        panic!("expected PUBLISH");
    };
    assert_eq!(packet.topic, "ab");
    assert_eq!(packet.packet_id, None);
    assert!(packet.payload.is_empty());
    assert_eq!(
        Packet::Publish(PublishPacket::new("ab", Vec::new())).to_bytes().unwrap(),
        bytes
    );
}

#[test]
fn publish_payload_runs_to_end_of_packet() {
    let bytes = [0x30, 7, 0x00, 0x02, b'a', b'b', 0x00, 0x01, 0x02];
    let Packet::Publish(packet) = decode_packet(&bytes).unwrap() else {
        panic!("expected PUBLISH");
    };
    assert_eq!(packet.payload, [0x00, 0x01, 0x02]);
}

#[test]
fn subscribe_vector() {
    let Packet::Subscribe(packet) = decode_packet(&SUBSCRIBE_TWO_FILTERS).unwrap() else {
        panic!("expected SUBSCRIBE");
    };
    assert_eq!(packet.packet_id, 8);
    assert_eq!(
        packet.subscriptions,
        [Subscription::new("ab", 0), Subscription::new("cd", 1)]
    );

    let rebuilt = SubscribePacket::new(
        8,
        vec![Subscription::new("ab", 0), Subscription::new("cd", 1)],
    );
    assert_eq!(
        Packet::Subscribe(rebuilt).to_bytes().unwrap(),
        SUBSCRIBE_TWO_FILTERS
    );
}

#[test]
fn suback_vector() {
    let bytes = [0x90, 4, 0x00, 0x08, 0x01, 0x02];
    let Packet::SubAck(packet) = decode_packet(&bytes).unwrap() else {
        panic!("expected SUBACK");
    };
    assert_eq!(packet.packet_id, 8);
    assert_eq!(
        packet.return_codes,
        [
            SubAckCode::new(SubAckCode::SUCCESS_QOS_1),
            SubAckCode::new(SubAckCode::SUCCESS_QOS_2)
        ]
    );
    assert_eq!(
        Packet::SubAck(SubAckPacket::new(8, [1, 2])).to_bytes().unwrap(),
        bytes
    );
}

#[test]
fn unsubscribe_vector() {
    let Packet::Unsubscribe(packet) = decode_packet(&UNSUBSCRIBE_TWO_FILTERS).unwrap() else {
        panic!("expected UNSUBSCRIBE");
    };
    assert_eq!(packet.packet_id, 8);
    let filters: Vec<_> = packet
        .topic_filters
        .iter()
        .map(|f| f.topic_filter.as_str())
        .collect();
    assert_eq!(filters, ["ab", "cd"]);
    assert_eq!(
        Packet::Unsubscribe(UnsubscribePacket::new(8, ["ab", "cd"]))
            .to_bytes()
            .unwrap(),
        UNSUBSCRIBE_TWO_FILTERS
    );
}

#[test]
fn subscribe_with_cleared_flags_rejected() {
    let mut bytes = SUBSCRIBE_TWO_FILTERS;
    bytes[0] = 0x80;
    let err = decode_packet(&bytes).unwrap_err();
    assert!(matches!(
        err,
        MqttError::InvalidFlags {
            packet: PacketType::Subscribe,
            flags: 0
        }
    ));
}

#[test]
fn two_byte_remaining_length() {
    let payload = vec![0xABu8; 200];
    let packet = Packet::Publish(PublishPacket::new("t", payload.clone()));
    let bytes = packet.to_bytes().unwrap();
    // 2 + 1 + 200 = 203 = 0b1_1001011
    assert_eq!(&bytes[..3], &[0x30, 0xCB, 0x01u8]);
    assert_eq!(bytes.len(), 3 + 203);
    let Packet::Publish(decoded) = decode_packet(&bytes).unwrap() else {
        panic!("expected PUBLISH");
    };
    assert_eq!(decoded.header.remaining_length, 203);
    assert_eq!(decoded.payload, payload);
}
