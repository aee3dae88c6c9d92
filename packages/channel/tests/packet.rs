//! Packet lifecycle between two chains

mod common;

use common::*;
use interchain_channel::{ChannelError, ErrorKind, Ordering, State};
use interchain_host::{events::IbcEvent, Height, Path, Timeout};

const FAR_FUTURE: u64 = 1_000_000;

#[test]
fn test_unordered_packet_is_settled_by_its_acknowledgement() {
    let (mut a, mut b) = setup();
    let channel_id = open_channel(&mut a, &mut b, Ordering::Unordered);

    let packet = send(&mut a, &channel_id, b"hello", FAR_FUTURE).unwrap();
    assert_eq!(packet.sequence, 1);
    let commitment = Path::packet_commitment(&port(), &channel_id, 1);
    assert!(a.has(&commitment));

    recv(&mut a, &mut b, &packet).unwrap();
    assert!(b.has(&Path::packet_receipt(&port(), &channel_id, 1)));
    assert!(matches!(
        b.events.as_slice(),
        [IbcEvent::RecvPacket(e)] if e.sequence == 1 && e.data_hex == hex::encode("hello")
    ));

    write_ack(&mut b, &packet, b"ok").unwrap();
    acknowledge(&mut b, &mut a, &packet, b"ok").unwrap();

    assert!(!a.has(&commitment));
    assert!(matches!(
        a.events.as_slice(),
        [IbcEvent::AcknowledgePacket(e)] if e.ack_hex.as_deref() == Some("6f6b")
    ));
    assert_eq!(
        acknowledge(&mut b, &mut a, &packet, b"ok"),
        Err(ChannelError::PacketCommitmentNotFound(1))
    );
}

#[test]
fn test_acknowledgement_must_match_what_was_written() {
    let (mut a, mut b) = setup();
    let channel_id = open_channel(&mut a, &mut b, Ordering::Unordered);
    let packet = send(&mut a, &channel_id, b"hello", FAR_FUTURE).unwrap();
    recv(&mut a, &mut b, &packet).unwrap();
    write_ack(&mut b, &packet, b"ok").unwrap();

    let err = acknowledge(&mut b, &mut a, &packet, b"not ok").unwrap_err();

    assert_eq!(err, ChannelError::VerificationFailed("packet acknowledgement"));
    assert!(a.has(&Path::packet_commitment(&port(), &channel_id, 1)));
}

#[test]
fn test_unordered_packet_is_received_once() {
    let (mut a, mut b) = setup();
    let channel_id = open_channel(&mut a, &mut b, Ordering::Unordered);
    let first = send(&mut a, &channel_id, b"one", FAR_FUTURE).unwrap();
    let second = send(&mut a, &channel_id, b"two", FAR_FUTURE).unwrap();

    recv(&mut a, &mut b, &second).unwrap();
    recv(&mut a, &mut b, &first).unwrap();

    let err = recv(&mut a, &mut b, &first).unwrap_err();
    assert_eq!(err, ChannelError::PacketAlreadyReceived(1));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(b.events.is_empty());
}

#[test]
fn test_ordered_channel_receives_in_sequence() {
    let (mut a, mut b) = setup();
    let channel_id = open_channel(&mut a, &mut b, Ordering::Ordered);
    let first = send(&mut a, &channel_id, b"one", FAR_FUTURE).unwrap();
    let second = send(&mut a, &channel_id, b"two", FAR_FUTURE).unwrap();

    assert_eq!(
        recv(&mut a, &mut b, &second),
        Err(ChannelError::PacketSequenceOutOfOrder {
            expected: 1,
            actual: 2,
        })
    );

    recv(&mut a, &mut b, &first).unwrap();
    recv(&mut a, &mut b, &second).unwrap();
    assert_eq!(
        recv(&mut a, &mut b, &first),
        Err(ChannelError::PacketAlreadyReceived(1))
    );
}

#[test]
fn test_packet_past_its_timeout_is_not_received() {
    let (mut a, mut b) = setup();
    let channel_id = open_channel(&mut a, &mut b, Ordering::Unordered);
    let packet = send(&mut a, &channel_id, b"late", 50_000).unwrap();
    b.env.timestamp = 50_000;

    assert_eq!(
        recv(&mut a, &mut b, &packet),
        Err(ChannelError::PacketTimedOut {
            sequence: 1,
            timeout: Timeout::new(Height::zero(), 50_000),
        })
    );
    assert!(!b.has(&Path::packet_receipt(&port(), &channel_id, 1)));
}

#[test]
fn test_unordered_timeout_waits_for_the_counterparty_clock() {
    let (mut a, mut b) = setup();
    let channel_id = open_channel(&mut a, &mut b, Ordering::Unordered);
    let packet = send(&mut a, &channel_id, b"late", 50_000).unwrap();

    assert!(matches!(
        timeout(&mut b, &mut a, &packet),
        Err(ChannelError::PacketTimeoutNotReached { sequence: 1, .. })
    ));

    b.signer.timestamp = 60_000;
    timeout(&mut b, &mut a, &packet).unwrap();

    assert!(!a.has(&Path::packet_commitment(&port(), &channel_id, 1)));
    assert_eq!(a.channel(&channel_id).state, State::Open);
    assert!(matches!(
        a.events.as_slice(),
        [IbcEvent::TimeoutPacket(e)] if e.sequence == 1
    ));
}

#[test]
fn test_ordered_timeout_closes_the_channel() {
    let (mut a, mut b) = setup();
    let channel_id = open_channel(&mut a, &mut b, Ordering::Ordered);
    let packet = send(&mut a, &channel_id, b"late", 50_000).unwrap();
    b.signer.timestamp = 60_000;

    timeout(&mut b, &mut a, &packet).unwrap();

    assert_eq!(a.channel(&channel_id).state, State::Closed);
    assert_eq!(
        send(&mut a, &channel_id, b"again", FAR_FUTURE).unwrap_err(),
        ChannelError::InvalidChannelState {
            channel_id,
            state: State::Closed,
        }
    );
}

#[test]
fn test_received_packet_cannot_time_out() {
    let (mut a, mut b) = setup();
    let channel_id = open_channel(&mut a, &mut b, Ordering::Unordered);
    let packet = send(&mut a, &channel_id, b"hello", 50_000).unwrap();
    recv(&mut a, &mut b, &packet).unwrap();
    b.signer.timestamp = 60_000;

    assert_eq!(
        timeout(&mut b, &mut a, &packet),
        Err(ChannelError::VerificationFailed("packet receipt absence"))
    );
    assert!(a.has(&Path::packet_commitment(&port(), &channel_id, 1)));
}
