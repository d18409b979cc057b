use std::collections::BTreeSet;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::mem::MaybeUninit;
use std::os::fd::{AsRawFd, IntoRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bitflags::bitflags;
use log::debug;
use nix::errno::Errno;
use thiserror::Error;

use crate::ioctl::{self, RequestCode};

pub mod bitset;
mod category;
mod registry;
mod sys;

use self::bitset::BitSet;
pub use self::category::{Category, Code, ParseCategoryError};
pub use self::registry::{discover, Registry};

const NAME_LEN: usize = 256;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Input device not found: {0:?}")]
    NotFound(PathBuf),
    #[error("Permission denied for input device: {0:?}")]
    PermissionDenied(PathBuf),
    #[error("Failed to open input device file: {0:?}")]
    OpenError(PathBuf, #[source] io::Error),
    #[error("Unknown event category {0}")]
    UnknownCategory(Category),
    #[error("Unknown event code {1} for {0}")]
    UnknownCode(Category, Code),
    #[error("{op}: kernel returned {actual} bytes, expected {expected}")]
    MalformedResponse {
        op: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{op} failed")]
    OsError {
        op: &'static str,
        #[source]
        source: Errno,
    },
    #[error("{op}: input device is closed")]
    Closed { op: &'static str },
    #[error("Invalid input device path pattern")]
    PatternError(#[from] glob::PatternError),
    #[error("Failed to access input device")]
    GlobError(#[from] glob::GlobError),
}

/// Hardware identity of a device (`struct input_id`).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct InputId {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

impl InputId {
    /// Decodes the kernel's in-memory layout: four native endian `u16`.
    pub fn from_ne_bytes(buf: [u8; sys::INPUT_ID_SIZE]) -> Self {
        let field = |i: usize| u16::from_ne_bytes([buf[2 * i], buf[2 * i + 1]]);
        InputId {
            bustype: field(0),
            vendor: field(1),
            product: field(2),
            version: field(3),
        }
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bus {:#x} vendor {:#x} product {:#x} version {:#x}",
            self.bustype, self.vendor, self.product, self.version
        )
    }
}

/// Evdev protocol version, e.g. `0x010001` for 1.0.1.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DriverVersion(pub i32);

impl fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(f, "{}.{}.{}", v >> 16, (v >> 8) & 0xff, v & 0xff)
    }
}

/// Parameters of an absolute axis.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AbsInfo {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
    pub resolution: i32,
}

impl From<sys::input_absinfo> for AbsInfo {
    fn from(info: sys::input_absinfo) -> Self {
        AbsInfo {
            value: info.value,
            minimum: info.minimum,
            maximum: info.maximum,
            fuzz: info.fuzz,
            flat: info.flat,
            resolution: info.resolution,
        }
    }
}

/// Keyboard auto-repeat timing.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RepeatSettings {
    /// Time a key is held before it starts repeating.
    pub delay: Duration,
    pub period: Duration,
}

impl RepeatSettings {
    fn from_millis([delay, period]: [libc::c_uint; 2]) -> Self {
        RepeatSettings {
            delay: Duration::from_millis(delay.into()),
            period: Duration::from_millis(period.into()),
        }
    }
}

bitflags! {
    /// Device properties (`INPUT_PROP_*`).
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Properties: u32 {
        const POINTER = 1 << 0x00;
        const DIRECT = 1 << 0x01;
        const BUTTONPAD = 1 << 0x02;
        const SEMI_MT = 1 << 0x03;
        const TOPBUTTONPAD = 1 << 0x04;
        const POINTING_STICK = 1 << 0x05;
        const ACCELEROMETER = 1 << 0x06;
    }
}

/// Coarse summary of what a device can report.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Capabilities {
    pub has_absolute_axes: bool,
    pub has_buttons: bool,
    /// Absolute axes and buttons together, as found on joysticks and gamepads.
    pub is_joystick: bool,
}

impl Capabilities {
    fn from_categories(categories: &BTreeSet<Category>) -> Self {
        let has_absolute_axes = categories.contains(&Category::ABS);
        let has_buttons = categories.contains(&Category::KEY);
        Capabilities {
            has_absolute_axes,
            has_buttons,
            is_joystick: has_absolute_axes && has_buttons,
        }
    }
}

// Auto-repeat is a settings channel, not something the device reports.
fn categories_from_bits(bits: &BitSet) -> BTreeSet<Category> {
    bits.decode(Category::MAX as usize)
        .into_iter()
        .map(|c| Category(c as u16))
        .filter(|&c| c != Category::REP)
        .collect()
}

fn codes_from_bits(bits: &BitSet, max: u16) -> BTreeSet<Code> {
    bits.decode(max as usize).into_iter().map(|c| Code(c as u16)).collect()
}

fn category_mask_request(len: usize) -> RequestCode {
    sys::evdev_get_event_bits(0, len)
}

fn code_bound(category: Category) -> Result<u16, Error> {
    category.max_code().ok_or(Error::UnknownCategory(category))
}

fn code_mask_request(category: Category, len: usize) -> RequestCode {
    sys::evdev_get_event_bits(category.0 as u8, len)
}

fn open_error(path: &Path, err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => Error::PermissionDenied(path.to_path_buf()),
        _ => Error::OpenError(path.to_path_buf(), err),
    }
}

// Bitmask ioctls report how many bytes they copied.
fn check_bitmask_reply(op: &'static str, expected: usize, actual: usize) -> Result<(), Error> {
    if actual < expected {
        return Err(Error::MalformedResponse { op, expected, actual });
    }
    Ok(())
}

// String ioctls report the text length including the NUL.
fn check_string_reply(op: &'static str, capacity: usize, actual: usize) -> Result<(), Error> {
    if actual > capacity {
        return Err(Error::MalformedResponse {
            op,
            expected: capacity,
            actual,
        });
    }
    Ok(())
}

// Turns one specific errno into "not available".
fn unless_errno<T>(result: Result<T, Error>, errno: Errno) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::OsError { source, .. }) if source == errno => Ok(None),
        Err(err) => Err(err),
    }
}

// Text up to the first NUL, or the whole buffer if the kernel truncated it.
fn c_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// An open `/dev/input/eventN` node.
///
/// All queries are read-only. Once [`Device::close`] has been called every
/// query fails with [`Error::Closed`]. Dropping an open device closes it.
#[derive(Debug)]
pub struct Device {
    dev: Option<File>,
    path: PathBuf,
}

impl Device {
    /// Opens `path` read-write; some introspection ioctls refuse read-only
    /// descriptors.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let dev = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|err| open_error(path, err))?;

        debug!("Opened input device {:?}", path);
        Ok(Device {
            dev: Some(dev),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.dev.is_some()
    }

    /// Releases the descriptor. Closing twice returns [`Error::Closed`].
    pub fn close(&mut self) -> Result<(), Error> {
        let dev = self.dev.take().ok_or(Error::Closed { op: "close" })?;
        // The descriptor is gone after close(2) even if it reports an error
        let fd = dev.into_raw_fd();
        Errno::result(unsafe { libc::close(fd) }).map_err(|source| Error::OsError { op: "close", source })?;

        debug!("Closed input device {:?}", self.path);
        Ok(())
    }

    fn fd(&self, op: &'static str) -> Result<RawFd, Error> {
        self.dev.as_ref().map(|dev| dev.as_raw_fd()).ok_or(Error::Closed { op })
    }

    /// # Safety
    ///
    /// `arg` must be valid for writes of `request.size()` bytes.
    unsafe fn ioctl<T>(&self, op: &'static str, request: RequestCode, arg: *mut T) -> Result<usize, Error> {
        let fd = self.fd(op)?;
        let n = ioctl::sys::invoke(fd, request, arg).map_err(|source| Error::OsError { op, source })?;
        Ok(n as usize)
    }

    // The request is built from the buffer length so the two cannot disagree.
    fn fetch_bits(
        &self,
        op: &'static str,
        max: usize,
        request: impl FnOnce(usize) -> RequestCode,
    ) -> Result<BitSet, Error> {
        let mut bits = BitSet::for_max(max);
        let expected = bits.len();
        let actual = unsafe { self.ioctl(op, request(expected), bits.as_mut_ptr())? };
        check_bitmask_reply(op, expected, actual)?;
        Ok(bits)
    }

    fn fetch_string(&self, op: &'static str, request: fn(usize) -> RequestCode) -> Result<String, Error> {
        let mut buf = [0u8; NAME_LEN];
        let n = unsafe { self.ioctl(op, request(buf.len()), buf.as_mut_ptr())? };
        check_string_reply(op, buf.len(), n)?;
        Ok(c_string(&buf[..n]))
    }

    // EVIOCGPHYS and EVIOCGUNIQ report ENOENT when the driver leaves the field unset
    fn fetch_optional_string(
        &self,
        op: &'static str,
        request: fn(usize) -> RequestCode,
    ) -> Result<Option<String>, Error> {
        unless_errno(self.fetch_string(op, request), Errno::ENOENT)
    }

    fn fetch_state(
        &self,
        op: &'static str,
        category: Category,
        request: fn(usize) -> RequestCode,
    ) -> Result<BTreeSet<Code>, Error> {
        let max = code_bound(category)?;
        let bits = self.fetch_bits(op, max as usize, request)?;
        Ok(codes_from_bits(&bits, max))
    }

    pub fn name(&self) -> Result<String, Error> {
        self.fetch_string("EVIOCGNAME", sys::evdev_get_name)
    }

    pub fn physical_location(&self) -> Result<Option<String>, Error> {
        self.fetch_optional_string("EVIOCGPHYS", sys::evdev_get_phys)
    }

    pub fn unique_id(&self) -> Result<Option<String>, Error> {
        self.fetch_optional_string("EVIOCGUNIQ", sys::evdev_get_uniq)
    }

    pub fn identity(&self) -> Result<InputId, Error> {
        let mut buf = [0u8; sys::INPUT_ID_SIZE];
        unsafe {
            self.ioctl("EVIOCGID", sys::EVIOCGID, buf.as_mut_ptr())?;
        }
        Ok(InputId::from_ne_bytes(buf))
    }

    pub fn driver_version(&self) -> Result<DriverVersion, Error> {
        let mut version: libc::c_int = 0;
        unsafe {
            self.ioctl("EVIOCGVERSION", sys::EVIOCGVERSION, &mut version as *mut libc::c_int)?;
        }
        Ok(DriverVersion(version))
    }

    /// Supported event categories, excluding [`Category::REP`].
    pub fn supported_categories(&self) -> Result<BTreeSet<Category>, Error> {
        let bits = self.fetch_bits("EVIOCGBIT", Category::MAX as usize, category_mask_request)?;
        Ok(categories_from_bits(&bits))
    }

    /// Supported codes within `category`.
    ///
    /// Fails with [`Error::UnknownCategory`] without touching the device if
    /// the category has no known bound.
    pub fn supported_codes(&self, category: Category) -> Result<BTreeSet<Code>, Error> {
        let max = code_bound(category)?;
        let bits = self.fetch_bits("EVIOCGBIT", max as usize, |len| code_mask_request(category, len))?;
        Ok(codes_from_bits(&bits, max))
    }

    pub fn capabilities(&self) -> Result<Capabilities, Error> {
        Ok(Capabilities::from_categories(&self.supported_categories()?))
    }

    pub fn properties(&self) -> Result<Properties, Error> {
        let max = sys::INPUT_PROP_MAX as usize;
        let bits = self.fetch_bits("EVIOCGPROP", max, sys::evdev_get_prop_bits)?;
        let props = bits.decode(max).into_iter().fold(0u32, |acc, i| acc | 1 << i);
        Ok(Properties::from_bits_retain(props))
    }

    pub fn abs_info(&self, axis: Code) -> Result<AbsInfo, Error> {
        match Category::ABS.max_code() {
            Some(max) if axis.0 <= max => (),
            _ => return Err(Error::UnknownCode(Category::ABS, axis)),
        }

        let info = unsafe {
            let mut info = MaybeUninit::<sys::input_absinfo>::zeroed();
            self.ioctl("EVIOCGABS", sys::evdev_get_abs_info(axis.0 as u8), info.as_mut_ptr())?;
            info.assume_init()
        };
        Ok(AbsInfo::from(info))
    }

    /// Auto-repeat timing, or `None` if the device does not repeat keys.
    pub fn repeat_settings(&self) -> Result<Option<RepeatSettings>, Error> {
        let mut rep: [libc::c_uint; 2] = [0; 2];
        // ENOSYS when EV_REP is not enabled on the device
        let result = unsafe { self.ioctl("EVIOCGREP", sys::EVIOCGREP, &mut rep as *mut [libc::c_uint; 2]) };
        Ok(unless_errno(result, Errno::ENOSYS)?.map(|_| RepeatSettings::from_millis(rep)))
    }

    /// Number of force feedback effects the device can hold at once.
    pub fn effect_slots(&self) -> Result<usize, Error> {
        let mut slots: libc::c_int = 0;
        unsafe {
            self.ioctl("EVIOCGEFFECTS", sys::EVIOCGEFFECTS, &mut slots as *mut libc::c_int)?;
        }
        Ok(slots.max(0) as usize)
    }

    /// Keys and buttons currently held down.
    pub fn key_state(&self) -> Result<BTreeSet<Code>, Error> {
        self.fetch_state("EVIOCGKEY", Category::KEY, sys::evdev_get_key_state)
    }

    /// LEDs currently lit.
    pub fn led_state(&self) -> Result<BTreeSet<Code>, Error> {
        self.fetch_state("EVIOCGLED", Category::LED, sys::evdev_get_led_state)
    }

    pub fn sound_state(&self) -> Result<BTreeSet<Code>, Error> {
        self.fetch_state("EVIOCGSND", Category::SND, sys::evdev_get_sound_state)
    }

    /// Switches currently in the "on" position.
    pub fn switch_state(&self) -> Result<BTreeSet<Code>, Error> {
        self.fetch_state("EVIOCGSW", Category::SW, sys::evdev_get_switch_state)
    }
}
