pub mod ogg_page;
pub mod opus_framing;
pub mod opus_packet;
pub mod opus_remuxer;

use bytes::Bytes;

/// ByteSource is a randomly addressable byte stream.
///
/// A short read signals EOF or truncation; there is no error channel. The
/// provided integer readers zero-fill bytes past the end of the source, so an
/// out-of-range read decodes as zero instead of failing.
pub trait ByteSource {
    /// Copies up to `buf.len()` bytes starting at `offset` into `buf` and
    /// returns how many were available.
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> usize;

    /// Total size of the stream in bytes.
    fn size(&self) -> u64;

    fn read_u8_at(&mut self, offset: u64) -> u8 {
        let mut b = [0u8; 1];
        self.read_at(&mut b, offset);
        b[0]
    }

    fn read_u16_be_at(&mut self, offset: u64) -> u16 {
        let mut b = [0u8; 2];
        self.read_at(&mut b, offset);
        u16::from_be_bytes(b)
    }

    fn read_u16_le_at(&mut self, offset: u64) -> u16 {
        let mut b = [0u8; 2];
        self.read_at(&mut b, offset);
        u16::from_le_bytes(b)
    }

    fn read_u32_be_at(&mut self, offset: u64) -> u32 {
        let mut b = [0u8; 4];
        self.read_at(&mut b, offset);
        u32::from_be_bytes(b)
    }

    fn read_u32_le_at(&mut self, offset: u64) -> u32 {
        let mut b = [0u8; 4];
        self.read_at(&mut b, offset);
        u32::from_le_bytes(b)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> usize {
        (**self).read_at(buf, offset)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }
}

impl ByteSource for [u8] {
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> usize {
        read_slice_at(self, buf, offset)
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl ByteSource for Vec<u8> {
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> usize {
        read_slice_at(self, buf, offset)
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl ByteSource for Bytes {
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> usize {
        read_slice_at(self, buf, offset)
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }
}

fn read_slice_at(src: &[u8], buf: &mut [u8], offset: u64) -> usize {
    if offset >= src.len() as u64 {
        return 0;
    }
    let start = offset as usize;
    let n = buf.len().min(src.len() - start);
    buf[..n].copy_from_slice(&src[start..start + n]);
    n
}
