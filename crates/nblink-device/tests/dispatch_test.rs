//! End-to-end exercises of the device runtime: uplink reporting,
//! inbound dispatch of the platform fixture frames, and the borrowed
//! static-region workflow.

use std::cell::RefCell;
use std::rc::Rc;

use nblink_device::{Dispatch, Dispatcher, Transport};
use nblink_protocol::{decode_frame_hex, Message, MessageType, ProtocolError};

/// Platform ACK for uplink msg_id 0.
const ACK_FRAME: &str = "01F1000200F4";
/// CMD, dtag 1, cmd_id 3, one TLV (tag 3, int8 0).
const CMD_SINGLE_FRAME: &str = "01F2000A00010300040300010009";
/// CMD, dtag 2, cmd_id 3, three TLVs (int8, float, int16).
const CMD_TRIPLE_FRAME: &str = "01F2001600020300100300010104000441BBA5E3050002006117";

/// Id used for the single registered platform command.
const CMD_ID: u8 = 3;

fn capturing_transport(frames: &Rc<RefCell<Vec<String>>>) -> Transport {
    let sink_frames = frames.clone();
    let mut transport = Transport::new();
    transport.set_timestamp_cb(|| 1_514_906_998_853);
    transport.set_signal_cb(|| -66);
    transport.set_battery_cb(|| 99);
    transport.set_nb_sink(move |bytes| {
        sink_frames
            .borrow_mut()
            .push(String::from_utf8(bytes.to_vec()).unwrap());
    });
    transport
}

#[test]
fn test_uplink_report_round_trips() {
    let frames = Rc::new(RefCell::new(Vec::new()));
    let mut transport = capturing_transport(&frames);

    let mut msg = Message::new();
    msg.set_header(MessageType::Up, 1).unwrap();
    msg.add_f32(1, 123.123).unwrap();
    msg.add_f32(2, 321.456).unwrap();
    msg.add_i8(3, -127).unwrap();
    msg.add_f32(4, 321.456).unwrap();
    msg.add_str(5, "HELLO,WORLD").unwrap();
    transport.push(&mut msg).unwrap();

    let frames = frames.borrow();
    assert_eq!(frames.len(), 1);
    let decoded = decode_frame_hex(&frames[0]).unwrap();
    assert_eq!(decoded.msg_type(), MessageType::Up);
    assert_eq!(decoded.msg_id(), 1);
    assert_eq!(decoded.get_f32(1).unwrap(), 123.123f32);
    assert_eq!(decoded.get_f32(2).unwrap(), 321.456f32);
    assert_eq!(decoded.get_i8(3).unwrap(), -127);
    assert_eq!(decoded.get_str(5).unwrap(), "HELLO,WORLD");
    // five application fields plus three ambient ones
    assert_eq!(decoded.tlvs().count(), 8);
}

#[test]
fn test_fixture_frames_route_with_expected_tlv_counts() {
    let acks = Rc::new(RefCell::new(Vec::new()));
    let tlv_counts = Rc::new(RefCell::new(Vec::new()));
    let ack_log = acks.clone();
    let count_log = tlv_counts.clone();

    let mut dispatcher = Dispatcher::new(Transport::new());
    dispatcher.set_ack_handler(move |_, req| ack_log.borrow_mut().push(req.msg_id()));
    dispatcher.set_cmd_handler(CMD_ID, move |_, req| {
        count_log.borrow_mut().push(req.tlvs().count())
    });

    assert_eq!(
        dispatcher.ingest_hex(ACK_FRAME).unwrap(),
        Dispatch::Acked { msg_id: 0 }
    );
    assert_eq!(
        dispatcher.ingest_hex(CMD_SINGLE_FRAME).unwrap(),
        Dispatch::Handled { cmd_id: CMD_ID }
    );
    assert_eq!(
        dispatcher.ingest_hex(CMD_TRIPLE_FRAME).unwrap(),
        Dispatch::Handled { cmd_id: CMD_ID }
    );

    assert_eq!(*acks.borrow(), vec![0]);
    assert_eq!(*tlv_counts.borrow(), vec![1, 3]);
}

#[test]
fn test_cmd_handler_reads_fields_and_pushes_response() {
    let frames = Rc::new(RefCell::new(Vec::new()));
    let transport = capturing_transport(&frames);

    let mut dispatcher = Dispatcher::new(transport);
    dispatcher.set_cmd_handler(CMD_ID, |transport, req| {
        // typed reads out of the request
        assert_eq!(req.get_i8(3).unwrap(), 1);
        assert_eq!(
            req.get_f32(4).unwrap(),
            f32::from_be_bytes([0x41, 0xBB, 0xA5, 0xE3])
        );
        assert_eq!(req.get_i16(5).unwrap(), 97);
        assert_eq!(req.get_i8(9), Err(ProtocolError::FieldNotFound(9)));

        // response on an independent envelope, correlated to the request
        let mut rsp = Message::new();
        rsp.set_header(MessageType::CmdRsp, req.msg_id()).unwrap();
        rsp.set_dtag(req.dtag());
        rsp.set_cmd_id(req.cmd_id());
        rsp.add_f32(1, 123.123).unwrap();
        rsp.add_f32(2, 321.456).unwrap();
        transport.push(&mut rsp).unwrap();
    });

    dispatcher.ingest_hex(CMD_TRIPLE_FRAME).unwrap();

    let frames = frames.borrow();
    assert_eq!(frames.len(), 1);
    let rsp = decode_frame_hex(&frames[0]).unwrap();
    assert_eq!(rsp.msg_type(), MessageType::CmdRsp);
    assert_eq!(rsp.msg_id(), 0);
    assert_eq!(rsp.dtag(), 2);
    assert_eq!(rsp.cmd_id(), CMD_ID);
    assert_eq!(rsp.get_f32(1).unwrap(), 123.123f32);
    // responses carry no ambient fields
    assert_eq!(rsp.tlvs().count(), 2);
}

#[test]
fn test_static_region_serves_sequential_frames() {
    let frames = Rc::new(RefCell::new(Vec::new()));
    let transport = capturing_transport(&frames);

    let mut dispatcher = Dispatcher::new(transport);
    let hits = Rc::new(RefCell::new(0));
    let counter = hits.clone();
    dispatcher.set_cmd_handler(CMD_ID, move |_, _| *counter.borrow_mut() += 1);

    let mut region = [0u8; 1024];

    // uplink out of the region first
    {
        let mut msg = Message::with_region(&mut region);
        msg.set_header(MessageType::Up, 1).unwrap();
        msg.add_f32(1, 123.123).unwrap();
        msg.add_str(5, "HELLO,WORLD").unwrap();
        dispatcher.transport().push(&mut msg).unwrap();
    }

    // then the same region hosts each ingested frame in turn
    dispatcher.ingest_hex_into(ACK_FRAME, &mut region).unwrap();
    dispatcher
        .ingest_hex_into(CMD_SINGLE_FRAME, &mut region)
        .unwrap();
    dispatcher
        .ingest_hex_into(CMD_TRIPLE_FRAME, &mut region)
        .unwrap();

    assert_eq!(*hits.borrow(), 2);
    assert_eq!(frames.borrow().len(), 1);
}

#[test]
fn test_rejected_frame_leaves_dispatcher_usable() {
    let hits = Rc::new(RefCell::new(0));
    let counter = hits.clone();

    let mut dispatcher = Dispatcher::new(Transport::new());
    dispatcher.set_cmd_handler(CMD_ID, move |_, _| *counter.borrow_mut() += 1);

    assert!(dispatcher.ingest_hex("01F2").is_err());
    assert!(dispatcher.ingest_hex("zz").is_err());
    assert_eq!(*hits.borrow(), 0);

    // a good frame still dispatches afterwards
    assert_eq!(
        dispatcher.ingest_hex(CMD_SINGLE_FRAME).unwrap(),
        Dispatch::Handled { cmd_id: CMD_ID }
    );
    assert_eq!(*hits.borrow(), 1);
}
