
use std::io::{Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};

pub const PAGE_HEADER_TYPE_CONTINUATION_OF_STREAM: u8 = 0x00;
pub const PAGE_HEADER_TYPE_BEGINNING_OF_STREAM: u8 = 0x02;
pub const PAGE_HEADER_TYPE_END_OF_STREAM: u8 = 0x04;
pub const PAGE_HEADER_SIGNATURE: &[u8] = b"OggS";
pub const ID_PAGE_SIGNATURE: &[u8] = b"OpusHead";
pub const COMMENT_PAGE_SIGNATURE: &[u8] = b"OpusTags";
pub const PAGE_HEADER_SIZE: usize = 27;
pub const ID_PAGE_PAYLOAD_SIZE: usize = 19;

/// The two synthesized header pages always fit in this many bytes.
pub const STREAM_HEADERS_MAX_SIZE: usize = 0x100;

/// Serial number stamped on every page. Zero is legal but should not be
/// used; the value is fixed rather than random so output is reproducible
/// byte for byte.
pub const STREAM_SERIAL: u32 = 0x7667;

pub const VENDOR_STRING: &str = "opus-remux";
pub const USER_COMMENT: &str = "ENCODER=opus-remux";

/// Number of lacing values for a single-packet page of `payload_len` bytes.
///
/// A payload that is a positive multiple of 255 keeps a closing zero lacing
/// value so the packet does not read as continued on the next page, and a
/// zero-length payload still takes one lacing value.
pub fn page_segments(payload_len: usize) -> usize {
    payload_len / 255 + 1
}

/// Bytes of page header plus lacing table ahead of the payload.
pub fn page_overhead(payload_len: usize) -> usize {
    PAGE_HEADER_SIZE + page_segments(payload_len)
}

/// OggPageWriter formats single-packet Ogg pages into caller buffers
/// <https://tools.ietf.org/html/rfc3533#section-6>
pub struct OggPageWriter {
    serial: u32,
    checksum_table: [u32; 256],
}

impl OggPageWriter {
    /// new returns a page writer stamping `serial` on every page
    pub fn new(serial: u32) -> Self {
        OggPageWriter {
            serial,
            checksum_table: generate_checksum_table(),
        }
    }

    /// write_page lays down the header and lacing table of a page whose
    /// payload bytes are already placed at `buf[page_overhead(payload_len)..]`,
    /// then patches the checksum over the finished page. Returns the total
    /// page size.
    ///
    /// The header type flags follow from the sequence number: page zero
    /// carries the beginning-of-stream flag, every other page is a normal
    /// page. The end-of-stream flag is never set; decoders accept streams
    /// that simply stop.
    pub fn write_page(
        &self,
        buf: &mut [u8],
        payload_len: usize,
        granule_position: u64,
        sequence: u32,
    ) -> Result<usize> {
        let segments = page_segments(payload_len);
        let page_size = PAGE_HEADER_SIZE + segments + payload_len;
        if segments > 0xFF || page_size > buf.len() {
            return Err(Error::ErrPageBufferTooSmall);
        }

        let header_type = if sequence == 0 {
            PAGE_HEADER_TYPE_BEGINNING_OF_STREAM
        } else {
            PAGE_HEADER_TYPE_CONTINUATION_OF_STREAM
        };

        {
            let mut header_writer = Cursor::new(&mut buf[..PAGE_HEADER_SIZE + segments]);
            header_writer.write_all(PAGE_HEADER_SIGNATURE)?; // capture pattern //0-3
            header_writer.write_u8(0)?; // stream structure version //4
            header_writer.write_u8(header_type)?; // header type flags //5
            header_writer.write_u64::<LittleEndian>(granule_position)?; // granule position //6-13
            header_writer.write_u32::<LittleEndian>(self.serial)?; // bitstream serial number //14-17
            header_writer.write_u32::<LittleEndian>(sequence)?; // page sequence number //18-21
            header_writer.write_u32::<LittleEndian>(0)?; // checksum, patched below //22-25
            header_writer.write_u8(segments as u8)?; // lacing value count //26

            // First (segments - 1) lacing values are always 255, the last is
            // the remainder. For a multiple of 255 the remainder is the
            // closing zero.
            for _ in 0..segments - 1 {
                header_writer.write_u8(255)?;
            }
            header_writer.write_u8((payload_len % 255) as u8)?;
        }

        let checksum = self.checksum(&buf[..page_size]);
        buf[22..26].copy_from_slice(&checksum.to_le_bytes());

        Ok(page_size)
    }

    /// write_stream_headers synthesizes the two header pages every Ogg Opus
    /// stream starts with, OpusHead and OpusTags, at sequences 0 and 1 and
    /// granule 0. Returns the combined size.
    /// <https://tools.ietf.org/html/rfc7845.html#section-5>
    pub fn write_stream_headers(
        &self,
        buf: &mut [u8],
        channels: u8,
        pre_skip: u16,
        sample_rate: u32,
    ) -> Result<usize> {
        if buf.len() < STREAM_HEADERS_MAX_SIZE {
            return Err(Error::ErrHeadBufferTooSmall);
        }

        // ID header
        let id_overhead = page_overhead(ID_PAGE_PAYLOAD_SIZE);
        {
            let id_payload = &mut buf[id_overhead..id_overhead + ID_PAGE_PAYLOAD_SIZE];
            let mut payload_writer = Cursor::new(id_payload);
            payload_writer.write_all(ID_PAGE_SIGNATURE)?; // Magic Signature 'OpusHead' //0-7
            payload_writer.write_u8(1)?; // Version //8
            payload_writer.write_u8(channels)?; // Channel count //9
            payload_writer.write_u16::<LittleEndian>(pre_skip)?; // pre-skip //10-11
            payload_writer.write_u32::<LittleEndian>(sample_rate)?; // original sample rate //12-15
            payload_writer.write_u16::<LittleEndian>(0)?; // output gain //16-17
            payload_writer.write_u8(0)?; // channel map 0 = one stream: mono or stereo //18
        }
        let mut done = self.write_page(buf, ID_PAGE_PAYLOAD_SIZE, 0, 0)?;

        // Comment header
        let vendor = VENDOR_STRING.as_bytes();
        let user_comment = USER_COMMENT.as_bytes();
        let comment_payload_len = 8 + 4 + vendor.len() + 4 + 4 + user_comment.len();
        let comment_overhead = page_overhead(comment_payload_len);
        {
            let comment_payload =
                &mut buf[done + comment_overhead..done + comment_overhead + comment_payload_len];
            let mut payload_writer = Cursor::new(comment_payload);
            payload_writer.write_all(COMMENT_PAGE_SIGNATURE)?; // Magic Signature 'OpusTags' //0-7
            payload_writer.write_u32::<LittleEndian>(vendor.len() as u32)?; // Vendor Length
            payload_writer.write_all(vendor)?;
            payload_writer.write_u32::<LittleEndian>(1)?; // User Comment List Length
            payload_writer.write_u32::<LittleEndian>(user_comment.len() as u32)?;
            payload_writer.write_all(user_comment)?;
        }
        done += self.write_page(&mut buf[done..], comment_payload_len, 0, 1)?;

        Ok(done)
    }

    /// checksum computes the Ogg CRC-32 of `data`, polynomial 0x04c11db7
    /// without reflection, initial value 0 and no final xor.
    pub fn checksum(&self, data: &[u8]) -> u32 {
        let mut sum = 0u32;
        for v in data {
            sum = (sum << 8) ^ self.checksum_table[(((sum >> 24) as u8) ^ *v) as usize];
        }
        sum
    }
}

pub(crate) fn generate_checksum_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    const POLY: u32 = 0x04c11db7;

    for (i, t) in table.iter_mut().enumerate() {
        let mut r = (i as u32) << 24;
        for _ in 0..8 {
            if (r & 0x80000000) != 0 {
                r = (r << 1) ^ POLY;
            } else {
                r <<= 1;
            }
        }
        *t = r;
    }
    table
}
