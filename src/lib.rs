//! Read-only introspection of Linux evdev input devices.
//!
//! [`ioctl`] encodes generic request codes and issues them. [`evdev`] builds the
//! input specific queries on top: device name and identity, supported event
//! categories and codes, and device enumeration under `/dev/input`.
//!
//! ```no_run
//! use evprobe::evdev::{self, Category};
//!
//! for dev in evdev::discover()? {
//!     println!("{}: {}", dev.identity()?, dev.name()?);
//!     if dev.supported_categories()?.contains(&Category::KEY) {
//!         println!("  {} keys", dev.supported_codes(Category::KEY)?.len());
//!     }
//! }
//! # Ok::<(), evprobe::evdev::Error>(())
//! ```

pub mod evdev;
pub mod ioctl;
