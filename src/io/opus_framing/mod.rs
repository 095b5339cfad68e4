#[cfg(test)]
mod opus_framing_test;

use crate::io::opus_packet;
use crate::io::ByteSource;

/// Offset of the packet size table within an X stream.
const X_SIZE_TABLE_OFFSET: u64 = 0x20;

/// A code 3 packet keeps its frame count in the byte after the TOC, so
/// framing probes always read this many bytes.
const TOC_PROBE_SIZE: usize = 4;

/// OpusFraming selects the per-packet framing a game engine layered around
/// raw Opus packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpusFraming {
    /// Eight-byte packet header: 32-bit big-endian payload size plus opaque
    /// encoder state.
    Switch,
    /// 16-bit little-endian payload size prefix.
    Ue4,
    /// 16-bit big-endian payload size prefix.
    Ea,
    /// Contiguous payloads; sizes live in a table at the start of the
    /// source.
    X,
}

/// PacketFrame locates one framed packet: the payload length and the bytes
/// between the packet start and the payload.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PacketFrame {
    pub payload_len: u32,
    pub skip: u64,
}

impl PacketFrame {
    /// block_len returns the physical bytes the packet consumes, framing
    /// included.
    pub fn block_len(&self) -> u64 {
        u64::from(self.payload_len) + self.skip
    }
}

impl OpusFraming {
    /// packet_frame reads the framing of the packet starting at `offset`.
    /// `packet_index` addresses the size table of table-framed streams.
    ///
    /// Sizes past the end of the source decode as zero; callers treat a
    /// packet that cannot advance as end of stream.
    pub fn packet_frame<S: ByteSource>(
        &self,
        source: &mut S,
        offset: u64,
        packet_index: u64,
    ) -> PacketFrame {
        match self {
            OpusFraming::Switch => PacketFrame {
                payload_len: source.read_u32_be_at(offset),
                skip: 0x08, // size + Opus state(?)
            },
            OpusFraming::Ue4 => PacketFrame {
                payload_len: u32::from(source.read_u16_le_at(offset)),
                skip: 0x02,
            },
            OpusFraming::Ea => PacketFrame {
                payload_len: u32::from(source.read_u16_be_at(offset)),
                skip: 0x02,
            },
            OpusFraming::X => PacketFrame {
                payload_len: u32::from(
                    source.read_u16_le_at(X_SIZE_TABLE_OFFSET + packet_index * 2),
                ),
                skip: 0,
            },
        }
    }

    /// count_samples walks every packet in `[start, start + size)` and sums
    /// the decoded sample count at 48 kHz. A region that overhangs the
    /// source is clamped to the source end.
    pub fn count_samples<S: ByteSource>(&self, source: &mut S, start: u64, size: u64) -> u64 {
        let mut end = start + size;
        if end > source.size() {
            log::warn!(
                "opus region end {:#x} past source end {:#x}",
                end,
                source.size()
            );
            end = source.size();
        }

        let mut samples = 0u64;
        let mut offset = start;
        let mut packet_index = 0u64;
        while offset < end {
            let frame = self.packet_frame(source, offset, packet_index);
            if frame.block_len() == 0 {
                break;
            }

            let mut toc = [0u8; TOC_PROBE_SIZE];
            source.read_at(&mut toc, offset + frame.skip);
            samples += u64::from(opus_packet::packet_samples(&toc));

            offset += frame.block_len();
            packet_index += 1;
        }
        samples
    }

    /// encoder_delay probes the first packet at `offset` and returns the
    /// delay estimate in samples.
    ///
    /// The delay of these containers tracks 1/8 of the samples per frame.
    /// TODO: verify the heuristic against EA streams with non-20ms frames.
    pub fn encoder_delay<S: ByteSource>(&self, source: &mut S, offset: u64) -> u64 {
        let frame = self.packet_frame(source, offset, 0);
        let mut toc = [0u8; TOC_PROBE_SIZE];
        source.read_at(&mut toc, offset + frame.skip);
        u64::from(opus_packet::packet_samples(&toc)) / 8
    }
}
