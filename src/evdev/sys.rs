use std::ffi::{c_int, c_uint};
use std::mem;

use crate::ioctl::RequestCode;

// Based on include/uapi/linux/input.h
const EVIO_IOC_MAGIC: u8 = b'E';

pub const EVIOCGVERSION: RequestCode = RequestCode::read::<c_int>(EVIO_IOC_MAGIC, 0x01);
pub const EVIOCGID: RequestCode = RequestCode::read::<input_id>(EVIO_IOC_MAGIC, 0x02);
// Delay and period in milliseconds
pub const EVIOCGREP: RequestCode = RequestCode::read::<[c_uint; 2]>(EVIO_IOC_MAGIC, 0x03);
pub const EVIOCGEFFECTS: RequestCode = RequestCode::read::<c_int>(EVIO_IOC_MAGIC, 0x84);

const EVIOCGNAME: u8 = 0x06;
const EVIOCGPHYS: u8 = 0x07;
const EVIOCGUNIQ: u8 = 0x08;
const EVIOCGPROP: u8 = 0x09;
const EVIOCGKEY: u8 = 0x18;
const EVIOCGLED: u8 = 0x19;
const EVIOCGSND: u8 = 0x1a;
const EVIOCGSW: u8 = 0x1b;
const EVIOCGBIT: u8 = 0x20;
const EVIOCGABS: u8 = 0x40;

pub const INPUT_PROP_MAX: u16 = 0x1f;

#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, Default)]
pub struct input_id {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, Default)]
pub struct input_absinfo {
    // Latest reported value for the axis
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
    // Noise filter threshold
    pub fuzz: i32,
    // Dead zone reported as zero by joydev
    pub flat: i32,
    // Units per millimeter (or per radian for rotational axes)
    pub resolution: i32,
}

pub const INPUT_ID_SIZE: usize = mem::size_of::<input_id>();

const _: () = assert!(INPUT_ID_SIZE == 8);
const _: () = assert!(mem::size_of::<input_absinfo>() == 24);

pub const fn evdev_get_name(len: usize) -> RequestCode {
    RequestCode::read_buf(EVIO_IOC_MAGIC, EVIOCGNAME, len)
}

pub const fn evdev_get_phys(len: usize) -> RequestCode {
    RequestCode::read_buf(EVIO_IOC_MAGIC, EVIOCGPHYS, len)
}

pub const fn evdev_get_uniq(len: usize) -> RequestCode {
    RequestCode::read_buf(EVIO_IOC_MAGIC, EVIOCGUNIQ, len)
}

pub const fn evdev_get_prop_bits(len: usize) -> RequestCode {
    RequestCode::read_buf(EVIO_IOC_MAGIC, EVIOCGPROP, len)
}

pub const fn evdev_get_key_state(len: usize) -> RequestCode {
    RequestCode::read_buf(EVIO_IOC_MAGIC, EVIOCGKEY, len)
}

pub const fn evdev_get_led_state(len: usize) -> RequestCode {
    RequestCode::read_buf(EVIO_IOC_MAGIC, EVIOCGLED, len)
}

pub const fn evdev_get_sound_state(len: usize) -> RequestCode {
    RequestCode::read_buf(EVIO_IOC_MAGIC, EVIOCGSND, len)
}

pub const fn evdev_get_switch_state(len: usize) -> RequestCode {
    RequestCode::read_buf(EVIO_IOC_MAGIC, EVIOCGSW, len)
}

/// `EVIOCGBIT(ev, len)`. Category 0 yields the bitmask of supported categories.
pub const fn evdev_get_event_bits(ev: u8, len: usize) -> RequestCode {
    RequestCode::read_buf(EVIO_IOC_MAGIC, EVIOCGBIT + ev, len)
}

pub const fn evdev_get_abs_info(abs: u8) -> RequestCode {
    RequestCode::read::<input_absinfo>(EVIO_IOC_MAGIC, EVIOCGABS + abs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ioctl::{pack, unpack, Direction};

    #[test]
    fn category_bits_request_is_literal() {
        assert_eq!(evdev_get_event_bits(0, 4), pack(Direction::READ, 0x45, 0x20, 4));
        assert_eq!(evdev_get_event_bits(0, 4).raw(), 0x8004_4520);
    }

    #[test]
    fn fixed_size_requests() {
        assert_eq!(unpack(EVIOCGVERSION), (Direction::READ, 0x45, 0x01, 4));
        assert_eq!(unpack(EVIOCGID), (Direction::READ, 0x45, 0x02, 8));
        assert_eq!(unpack(evdev_get_abs_info(0x35)), (Direction::READ, 0x45, 0x75, 24));
        assert_eq!(EVIOCGREP.raw(), 0x8008_4503);
        assert_eq!(unpack(EVIOCGEFFECTS), (Direction::READ, 0x45, 0x84, 4));
    }

    #[test]
    fn buffer_requests() {
        assert_eq!(evdev_get_name(256).raw(), 0x8100_4506);
        assert_eq!(unpack(evdev_get_event_bits(1, 96)), (Direction::READ, 0x45, 0x21, 96));
        assert_eq!(unpack(evdev_get_switch_state(3)), (Direction::READ, 0x45, 0x1b, 3));
    }
}
