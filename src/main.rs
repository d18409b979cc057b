use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use log::{debug, warn};
use nix::errno::Errno;

use evprobe::evdev::{self, Category, Device, Registry};

use crate::opts::{Options, Selection};

mod opts;

type Outcome = (PathBuf, Result<Device, evdev::Error>);

fn open_devices(opts: &Options) -> Result<Vec<Outcome>, anyhow::Error> {
    Ok(match &opts.selection {
        Selection::Pattern(pattern) => {
            let registry = Registry::with_pattern(pattern);
            debug!("Searching input devices: {:?}", registry.pattern());
            if opts.keep_going {
                registry.discover_each()?
            } else {
                registry
                    .discover()
                    .context("Failed to access input devices")?
                    .into_iter()
                    .map(|dev| (dev.path().to_path_buf(), Ok(dev)))
                    .collect()
            }
        }
        Selection::Paths(paths) => paths.iter().map(|path| (path.clone(), Device::open(path))).collect(),
    })
}

fn describe(out: &mut impl Write, dev: &Device, opts: &Options) -> Result<(), anyhow::Error> {
    writeln!(out, "{}", dev.path().display())?;
    writeln!(out, "  ID: {}", dev.identity()?)?;
    writeln!(out, "  Name: {}", dev.name()?)?;
    writeln!(out, "  Driver version: {}", dev.driver_version()?)?;
    if let Some(phys) = dev.physical_location()? {
        writeln!(out, "  Physical location: {}", phys)?;
    }
    if let Some(uniq) = dev.unique_id()? {
        writeln!(out, "  Unique ID: {}", uniq)?;
    }
    writeln!(out, "  Properties: {:?}", dev.properties()?)?;
    if let Some(rep) = dev.repeat_settings()? {
        writeln!(out, "  Key repeat: delay {:?} period {:?}", rep.delay, rep.period)?;
    }

    let categories = dev.supported_categories()?;
    if categories.contains(&Category::FF) {
        writeln!(out, "  Force feedback effects: {}", dev.effect_slots()?)?;
    }

    writeln!(out, "  Supported event types:")?;
    for category in categories {
        if !opts.categories.is_empty() && !opts.categories.contains(&category) {
            continue;
        }
        writeln!(out, "    Event type {} ({})", category.code(), category)?;
        if !opts.codes {
            continue;
        }

        match dev.supported_codes(category) {
            Ok(codes) => {
                for code in codes {
                    writeln!(out, "      Event code {}", code)?;
                }
            }
            // Some categories have no EVIOCGBIT counterpart in the kernel
            Err(evdev::Error::OsError {
                source: Errno::EINVAL, ..
            })
            | Err(evdev::Error::UnknownCategory(_)) => writeln!(out, "      (codes not reported)")?,
            Err(err) => return Err(err.into()),
        }
    }

    writeln!(out, "{}", "-".repeat(60))?;
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let opts = opts::parse();

    let mut stdout = io::stdout().lock();
    for (path, dev) in open_devices(&opts)? {
        let report = dev.map_err(anyhow::Error::from).and_then(|mut dev| {
            let mut buf = Vec::new();
            let described = describe(&mut buf, &dev, &opts);
            dev.close()?;
            described.map(|()| buf)
        });

        match report {
            Ok(buf) => stdout.write_all(&buf)?,
            Err(err) if opts.keep_going => warn!("Skipping input device {:?}: {:#}", path, err),
            Err(err) => return Err(err.context(format!("Failed to inspect input device {:?}", path))),
        }
    }

    Ok(())
}
