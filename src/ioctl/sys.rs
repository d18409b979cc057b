use std::ffi::c_int;
use std::os::fd::RawFd;

use nix::errno::Errno;

use super::RequestCode;

/// Issues `ioctl(fd, code, arg)`.
///
/// Returns the non-negative value produced by the kernel, which buffer queries
/// use to report the number of bytes written. Errors are passed through as-is.
///
/// # Safety
///
/// `arg` must point to a writable buffer of at least `code.size()` bytes. It may
/// only be null if the request carries no payload.
pub unsafe fn invoke<T>(fd: RawFd, code: RequestCode, arg: *mut T) -> Result<c_int, Errno> {
    debug_assert!(!arg.is_null() || code.size() == 0, "null buffer for {:?}", code);

    let res = libc::ioctl(fd, code.raw() as _, arg);
    Errno::result(res)
}
