
use crate::error::{Error, Result};
use crate::io::ogg_page::{self, OggPageWriter, STREAM_HEADERS_MAX_SIZE, STREAM_SERIAL};
use crate::io::opus_framing::OpusFraming;
use crate::io::opus_packet;
use crate::io::ByteSource;

/// Page scratch size. The largest packet seen in game rips stays near
/// 0xc00, so this leaves ample headroom.
pub const PAGE_BUFFER_SIZE: usize = 0x2000;

/// RemuxerConfig is the stream layout an outer format parser discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemuxerConfig {
    pub framing: OpusFraming,
    /// Start of the framed packet region within the source.
    pub start: u64,
    /// Size of the framed packet region in bytes.
    pub size: u64,
    /// Channel count, 1 or 2. Mapping family 0 only.
    pub channels: u8,
    /// Decoder samples to drop for encoder lookahead, stored in OpusHead.
    pub pre_skip: u16,
    /// Original input sample rate, stored in OpusHead. Playback still runs
    /// at 48 kHz.
    pub sample_rate: u32,
}

/// OpusRemuxer re-packages framed Opus packets into an Ogg Opus byte
/// stream on the fly.
///
/// The logical stream is a synthesized OpusHead/OpusTags prelude followed
/// by one Ogg page per source packet, so it is larger than the physical
/// region backing it. Pages are built lazily one at a time; the page cache
/// is the minimum unit because the checksum covers a whole page. Any
/// logical offset can be served without materializing the stream: backward
/// seeks rewind to the region start and replay, since page sizes depend on
/// packet payloads and logical offsets cannot be mapped back to physical
/// ones.
///
/// The remuxer implements [`ByteSource`] itself, so it stacks under a
/// read-ahead buffer or any consumer expecting a random-access stream.
pub struct OpusRemuxer<S: ByteSource> {
    source: S,
    config: RemuxerConfig,
    page_writer: OggPageWriter,

    /// The two header pages, concatenated.
    head: Vec<u8>,
    logical_size: u64,
    packet_count: u64,

    /// Source offset of the current packet's framing header.
    physical_offset: u64,
    /// Logical offset of the first byte of the cached page.
    logical_offset: u64,
    page_buffer: [u8; PAGE_BUFFER_SIZE],
    /// Valid bytes in `page_buffer`, 0 when no page is cached.
    page_size: usize,
    /// Physical bytes the cached page's packet consumes.
    block_size: u64,
    sequence: u32,
    /// Cumulative decoded samples through the cached page, the granule.
    samples_done: u64,
}

impl<S: ByteSource> OpusRemuxer<S> {
    /// new validates `config` against the source, synthesizes the header
    /// pages and precomputes the logical stream size.
    pub fn new(mut source: S, config: RemuxerConfig) -> Result<Self> {
        if config.channels == 0 || config.channels > 2 {
            return Err(Error::ErrUnsupportedChannelCount);
        }
        let source_size = source.size();
        if config.start > source_size || config.size > source_size - config.start {
            return Err(Error::ErrRegionOutOfBounds);
        }

        let page_writer = OggPageWriter::new(STREAM_SERIAL);
        let mut head_buffer = [0u8; STREAM_HEADERS_MAX_SIZE];
        let head_size = page_writer.write_stream_headers(
            &mut head_buffer,
            config.channels,
            config.pre_skip,
            config.sample_rate,
        )?;
        let head = head_buffer[..head_size].to_vec();

        let (logical_size, packet_count) =
            compute_logical_size(&mut source, &config, head_size as u64);

        Ok(OpusRemuxer {
            source,
            config,
            page_writer,
            head,
            logical_size,
            packet_count,
            physical_offset: config.start,
            logical_offset: head_size as u64,
            page_buffer: [0u8; PAGE_BUFFER_SIZE],
            page_size: 0,
            block_size: 0,
            sequence: 2, // 0 and 1 name the prelude pages
            samples_done: 0,
        })
    }

    /// read_at serves logical bytes starting at `offset` and returns how
    /// many were available. Offsets past the end return 0; a short read
    /// mid-stream means the source was truncated or a packet did not fit a
    /// page, and the cursors stay on the offending page so an earlier seek
    /// resynchronizes.
    pub fn read_at(&mut self, buf: &mut [u8], offset: u64) -> usize {
        if buf.is_empty() || offset > self.logical_size {
            return 0;
        }

        let head_size = self.head.len() as u64;
        let mut offset = offset;
        let mut total_read = 0usize;

        // previous offset: re-start, as logical offsets cannot be mapped
        // back to physical ones
        if offset < self.logical_offset {
            self.physical_offset = self.config.start;
            self.logical_offset = if offset < head_size { 0 } else { head_size };
            self.page_size = 0;
            self.samples_done = 0;
            self.sequence = 2;
        }

        // serve the synthesized prelude
        if offset < head_size {
            let to_read = ((head_size - offset) as usize).min(buf.len());
            let head_at = offset as usize;
            buf[..to_read].copy_from_slice(&self.head[head_at..head_at + to_read]);

            total_read += to_read;
            offset += to_read as u64;
            self.logical_offset = head_size;
        }

        // audio pages, one packet at a time
        while total_read < buf.len() {
            if self.logical_offset >= self.logical_size {
                break;
            }

            if self.page_size == 0 && !self.build_page() {
                break;
            }

            // move to the next packet once the request is past this page
            if offset >= self.logical_offset + self.page_size as u64 {
                self.physical_offset += self.block_size;
                self.logical_offset += self.page_size as u64;
                self.page_size = 0;
                continue;
            }

            let bytes_consumed = (offset - self.logical_offset) as usize;
            let to_read = (self.page_size - bytes_consumed).min(buf.len() - total_read);
            if to_read == 0 {
                break;
            }
            buf[total_read..total_read + to_read]
                .copy_from_slice(&self.page_buffer[bytes_consumed..bytes_consumed + to_read]);

            total_read += to_read;
            offset += to_read as u64;
        }

        total_read
    }

    /// Total size of the logical Ogg Opus stream, prelude included.
    pub fn logical_size(&self) -> u64 {
        self.logical_size
    }

    /// Number of packets discovered in the physical region.
    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }

    /// Size of the synthesized header prelude in bytes.
    pub fn head_size(&self) -> usize {
        self.head.len()
    }

    pub fn config(&self) -> &RemuxerConfig {
        &self.config
    }

    /// total_samples walks every packet in the region and sums the decoded
    /// sample count, the duration of the stream at 48 kHz.
    pub fn total_samples(&mut self) -> u64 {
        self.config
            .framing
            .count_samples(&mut self.source, self.config.start, self.config.size)
    }

    /// encoder_delay estimates the stream's encoder delay in samples from
    /// the first packet.
    pub fn encoder_delay(&mut self) -> u64 {
        self.config
            .framing
            .encoder_delay(&mut self.source, self.config.start)
    }

    /// Synthesizes the page for the packet at `physical_offset` into the
    /// page scratch. False means the page cannot be built, either because
    /// the payload does not fit a page or the source ran out; cursors are
    /// left untouched.
    fn build_page(&mut self) -> bool {
        let packet_index = u64::from(self.sequence) - 2;
        let frame =
            self.config
                .framing
                .packet_frame(&mut self.source, self.physical_offset, packet_index);
        let payload_len = frame.payload_len as usize;
        let overhead = ogg_page::page_overhead(payload_len);

        // happens on bad reads and EOF as well
        if overhead + payload_len > PAGE_BUFFER_SIZE {
            log::warn!(
                "page buffer can't hold OggS page at {:#x}",
                self.physical_offset
            );
            return false;
        }

        let copied = self.source.read_at(
            &mut self.page_buffer[overhead..overhead + payload_len],
            self.physical_offset + frame.skip,
        );
        if copied < payload_len {
            log::warn!("truncated opus packet at {:#x}", self.physical_offset);
            return false;
        }

        // the granule covers the samples through this page's packet
        let samples = u64::from(opus_packet::packet_samples(
            &self.page_buffer[overhead..overhead + payload_len],
        ));

        let page_size = match self.page_writer.write_page(
            &mut self.page_buffer,
            payload_len,
            self.samples_done + samples,
            self.sequence,
        ) {
            Ok(n) => n,
            Err(_) => return false,
        };

        self.samples_done += samples;
        self.block_size = frame.block_len();
        self.page_size = page_size;
        self.sequence += 1;
        true
    }
}

impl<S: ByteSource> ByteSource for OpusRemuxer<S> {
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> usize {
        OpusRemuxer::read_at(self, buf, offset)
    }

    fn size(&self) -> u64 {
        self.logical_size
    }
}

/// Walks the physical region once to find the logical stream size and the
/// packet count. A last packet that claims more bytes than the source
/// holds is still counted; reads truncate at it instead.
fn compute_logical_size<S: ByteSource>(
    source: &mut S,
    config: &RemuxerConfig,
    head_size: u64,
) -> (u64, u64) {
    let end = config.start + config.size;
    let mut physical_offset = config.start;
    let mut logical_size = head_size;
    let mut packet = 0u64;

    while physical_offset < end {
        let frame = config.framing.packet_frame(source, physical_offset, packet);
        if frame.block_len() == 0 {
            // an exhausted size table reads as zero and would never advance
            break;
        }

        let payload_len = frame.payload_len as usize;
        physical_offset += frame.block_len();
        logical_size += (ogg_page::page_overhead(payload_len) + payload_len) as u64;
        packet += 1;
    }

    if physical_offset > source.size() {
        log::warn!(
            "opus packet walk overran the source, {:#x} > {:#x}; the stream will truncate",
            physical_offset,
            source.size()
        );
    }

    (logical_size, packet)
}
