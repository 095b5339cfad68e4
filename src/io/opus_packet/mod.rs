//! Opus packet inspection from the TOC byte, without decoding.
//!
//! The layouts come from RFC 6716 section 3.1; the decision trees mirror
//! libopus `opus_packet_get_samples_per_frame` and
//! `opus_packet_get_nb_frames`.


/// Opus always runs its internal clock at 48 kHz, whatever the input rate.
pub const SAMPLE_RATE: u32 = 48_000;

/// frame_count returns the number of frames in the packet from the TOC
/// frame-count code, 0 when the packet is too short to tell.
pub fn frame_count(packet: &[u8]) -> u32 {
    if packet.is_empty() {
        return 0;
    }
    match packet[0] & 0x03 {
        0 => 1,
        1 | 2 => 2,
        // code 3: arbitrary frame count, from the byte after the TOC
        _ => match packet.get(1) {
            Some(b) => u32::from(b & 0x3F),
            None => 0,
        },
    }
}

/// samples_per_frame returns how many samples one frame decodes to at
/// rate `fs`.
pub fn samples_per_frame(toc: u8, fs: u32) -> u32 {
    if toc & 0x80 != 0 {
        // CELT-only configs: 2.5, 5, 10 or 20 ms
        let audiosize = u32::from((toc >> 3) & 0x03);
        (fs << audiosize) / 400
    } else if toc & 0x60 == 0x60 {
        // hybrid configs: 10 or 20 ms
        if toc & 0x08 != 0 {
            fs / 50
        } else {
            fs / 100
        }
    } else {
        // SILK-only configs: 10, 20, 40 or 60 ms
        let audiosize = u32::from((toc >> 3) & 0x03);
        if audiosize == 3 {
            fs * 60 / 1000
        } else {
            (fs << audiosize) / 100
        }
    }
}

/// packet_samples returns the total sample count the packet decodes to at
/// 48 kHz.
pub fn packet_samples(packet: &[u8]) -> u32 {
    if packet.is_empty() {
        return 0;
    }
    frame_count(packet) * samples_per_frame(packet[0], SAMPLE_RATE)
}
