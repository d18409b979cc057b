//! Generic Linux `ioctl` request codes.
//!
//! Based on include/uapi/asm-generic/ioctl.h: a request code is a 32 bit word
//! made of a command number (bits 0..8), a subsystem type tag (bits 8..16), the
//! size of the transferred payload (bits 16..30) and the access direction
//! (bits 30..32).

use std::fmt;
use std::mem;

use bitflags::bitflags;

pub mod sys;

const NR_BITS: u32 = 8;
const TYPE_BITS: u32 = 8;
const SIZE_BITS: u32 = 14;
const DIR_BITS: u32 = 2;

const NR_MASK: u32 = (1 << NR_BITS) - 1;
const TYPE_MASK: u32 = (1 << TYPE_BITS) - 1;
const SIZE_MASK: u32 = (1 << SIZE_BITS) - 1;
const DIR_MASK: u32 = (1 << DIR_BITS) - 1;

const NR_SHIFT: u32 = 0;
const TYPE_SHIFT: u32 = NR_SHIFT + NR_BITS;
const SIZE_SHIFT: u32 = TYPE_SHIFT + TYPE_BITS;
const DIR_SHIFT: u32 = SIZE_SHIFT + SIZE_BITS;

/// Largest payload size a request code can describe.
pub const MAX_SIZE: u32 = SIZE_MASK;

bitflags! {
    /// Data transfer direction, seen from userspace.
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct Direction: u32 {
        const WRITE = 0b01;
        const READ = 0b10;
    }
}

impl Direction {
    pub const NONE: Direction = Direction::empty();
    pub const READ_WRITE: Direction = Direction::from_bits_retain(0b11);
}

/// Byte width of `T` as handed to the kernel.
///
/// Payload types must be `#[repr(C)]` and mirror the kernel struct exactly. A
/// mismatch is not detected by the kernel: it simply copies the number of bytes
/// encoded in the request.
pub const fn size_of<T>() -> usize {
    mem::size_of::<T>()
}

/// Packs the four fields into a request code.
///
/// No range checks are done. A `size` wider than 14 bits spills into the
/// direction field.
pub const fn pack(dir: Direction, ty: u8, nr: u8, size: u32) -> RequestCode {
    RequestCode(
        (dir.bits() << DIR_SHIFT) | ((ty as u32) << TYPE_SHIFT) | ((nr as u32) << NR_SHIFT) | (size << SIZE_SHIFT),
    )
}

/// Splits a request code into `(direction, type, number, size)`.
pub const fn unpack(code: RequestCode) -> (Direction, u8, u8, u32) {
    (code.dir(), code.ty(), code.nr(), code.size())
}

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct RequestCode(u32);

impl RequestCode {
    pub const fn from_raw(raw: u32) -> Self {
        RequestCode(raw)
    }

    /// `_IOR(ty, nr, T)`
    pub const fn read<T>(ty: u8, nr: u8) -> Self {
        pack(Direction::READ, ty, nr, size_of::<T>() as u32)
    }

    /// `_IOC(_IOC_READ, ty, nr, len)` for variable length buffers.
    pub const fn read_buf(ty: u8, nr: u8, len: usize) -> Self {
        pack(Direction::READ, ty, nr, len as u32)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn dir(self) -> Direction {
        Direction::from_bits_retain((self.0 >> DIR_SHIFT) & DIR_MASK)
    }

    pub const fn ty(self) -> u8 {
        ((self.0 >> TYPE_SHIFT) & TYPE_MASK) as u8
    }

    pub const fn nr(self) -> u8 {
        ((self.0 >> NR_SHIFT) & NR_MASK) as u8
    }

    pub const fn size(self) -> u32 {
        (self.0 >> SIZE_SHIFT) & SIZE_MASK
    }
}

impl fmt::Debug for RequestCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = self.dir();
        let dir = if dir == Direction::READ_WRITE {
            "READ|WRITE"
        } else if dir == Direction::READ {
            "READ"
        } else if dir == Direction::WRITE {
            "WRITE"
        } else {
            "NONE"
        };
        write!(
            f,
            "RequestCode({:#010x}: dir={} type={:#04x} nr={:#04x} size={})",
            self.0,
            dir,
            self.ty(),
            self.nr(),
            self.size()
        )
    }
}

impl From<RequestCode> for u32 {
    fn from(code: RequestCode) -> u32 {
        code.raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn unpack_inverts_pack(dir in 0u32..4, ty: u8, nr: u8, size in 0u32..=MAX_SIZE) {
            let dir = Direction::from_bits_retain(dir);
            prop_assert_eq!(unpack(pack(dir, ty, nr, size)), (dir, ty, nr, size));
        }
    }

    #[test]
    fn field_layout() {
        assert_eq!(pack(Direction::NONE, 0, 0xff, 0).raw(), 0x0000_00ff);
        assert_eq!(pack(Direction::NONE, 0xff, 0, 0).raw(), 0x0000_ff00);
        assert_eq!(pack(Direction::NONE, 0, 0, MAX_SIZE).raw(), 0x3fff_0000);
        assert_eq!(pack(Direction::WRITE, 0, 0, 0).raw(), 0x4000_0000);
        assert_eq!(pack(Direction::READ, 0, 0, 0).raw(), 0x8000_0000);
        assert_eq!(pack(Direction::READ_WRITE, 0, 0, 0).raw(), 0xc000_0000);
    }

    #[test]
    fn oversized_payload_spills_into_direction() {
        let code = pack(Direction::NONE, b'E', 0x06, MAX_SIZE + 1);
        assert_eq!(code.size(), 0);
        assert_eq!(code.dir(), Direction::WRITE);
    }

    #[test]
    fn read_uses_type_size() {
        let code = RequestCode::read::<[u16; 4]>(b'E', 0x02);
        assert_eq!(unpack(code), (Direction::READ, 0x45, 0x02, 8));
        assert_eq!(code.raw(), 0x8008_4502);
    }

    #[test]
    fn debug_shows_fields() {
        let code = RequestCode::read_buf(b'E', 0x20, 4);
        assert_eq!(
            format!("{:?}", code),
            "RequestCode(0x80044520: dir=READ type=0x45 nr=0x20 size=4)"
        );
    }

    #[cfg(any(
        target_arch = "x86",
        target_arch = "x86_64",
        target_arch = "arm",
        target_arch = "aarch64",
        target_arch = "riscv64"
    ))]
    #[test]
    fn matches_nix_encoding() {
        assert_eq!(
            RequestCode::read_buf(b'E', 0x06, 256).raw(),
            nix::request_code_read!(b'E', 0x06, 256) as u32
        );
        assert_eq!(
            RequestCode::read::<std::ffi::c_int>(b'E', 0x01).raw(),
            nix::request_code_read!(b'E', 0x01, size_of::<std::ffi::c_int>()) as u32
        );
    }
}
