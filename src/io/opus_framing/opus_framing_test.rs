use bytes::Bytes;

use super::*;

#[test]
fn test_byte_source_primitives() {
    let mut src = Bytes::from_static(&[0x01, 0x02, 0x03]);

    assert_eq!(src.size(), 3);
    assert_eq!(src.read_u8_at(2), 0x03);
    assert_eq!(src.read_u16_le_at(0), 0x0201);
    assert_eq!(src.read_u16_be_at(0), 0x0102);
    assert_eq!(src.read_u32_le_at(0), 0x00030201); // zero-filled tail
    assert_eq!(src.read_u32_be_at(1), 0x02030000);

    // fully out of range decodes as zero
    assert_eq!(src.read_u8_at(3), 0);
    assert_eq!(src.read_u32_be_at(64), 0);

    let mut buf = [0xAAu8; 4];
    assert_eq!(src.read_at(&mut buf, 2), 1);
    assert_eq!(buf[0], 0x03);
}

#[test]
fn test_switch_framing() {
    let mut src = Bytes::from_static(&[
        0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00,
    ]);

    let frame = OpusFraming::Switch.packet_frame(&mut src, 0, 0);
    assert_eq!(
        frame,
        PacketFrame {
            payload_len: 2,
            skip: 8
        }
    );
    assert_eq!(frame.block_len(), 10);
}

#[test]
fn test_ue4_framing() {
    let mut src = Bytes::from_static(&[0x02, 0x00, 0x04, 0x00]);

    let frame = OpusFraming::Ue4.packet_frame(&mut src, 0, 0);
    assert_eq!(
        frame,
        PacketFrame {
            payload_len: 2,
            skip: 2
        }
    );
}

#[test]
fn test_ea_framing() {
    let mut src = Bytes::from_static(&[0x00, 0x02, 0x04, 0x00]);

    let frame = OpusFraming::Ea.packet_frame(&mut src, 0, 0);
    assert_eq!(
        frame,
        PacketFrame {
            payload_len: 2,
            skip: 2
        }
    );
}

#[test]
fn test_x_framing_size_table() {
    let mut src = vec![0u8; 0x20];
    src.extend_from_slice(&[0x02, 0x00, 0x03, 0x00]); // size table
    src.extend_from_slice(&[0x04, 0x00, 0x08, 0x00, 0x00]); // contiguous payloads

    let frame0 = OpusFraming::X.packet_frame(&mut src, 0x24, 0);
    assert_eq!(
        frame0,
        PacketFrame {
            payload_len: 2,
            skip: 0
        }
    );

    // the size comes from the table, not from the packet offset
    let frame1 = OpusFraming::X.packet_frame(&mut src, 0x26, 1);
    assert_eq!(frame1.payload_len, 3);
    assert_eq!(frame1.skip, 0);
}

#[test]
fn test_framing_past_source_reads_zero() {
    let mut src = Bytes::from_static(&[0x01]);

    let frame = OpusFraming::Switch.packet_frame(&mut src, 64, 0);
    assert_eq!(frame.payload_len, 0);
    assert_eq!(frame.block_len(), 8);
}

#[test]
fn test_count_samples() {
    // two UE4 packets, a 10 ms and a 20 ms SILK frame
    let mut src = Bytes::from_static(&[0x02, 0x00, 0x04, 0x00, 0x02, 0x00, 0x08, 0x00]);

    assert_eq!(OpusFraming::Ue4.count_samples(&mut src, 0, 8), 1440);
}

#[test]
fn test_count_samples_clamps_to_source() {
    let mut src = Bytes::from_static(&[0x02, 0x00, 0x04, 0x00]);

    // the region claims more than the source holds
    assert_eq!(OpusFraming::Ue4.count_samples(&mut src, 0, 100), 480);
}

#[test]
fn test_encoder_delay() {
    let mut src = Bytes::from_static(&[
        0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00,
    ]);

    // 480 samples per packet, delay fixed at an eighth of that
    assert_eq!(OpusFraming::Switch.encoder_delay(&mut src, 0), 60);
}
