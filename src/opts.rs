use std::path::PathBuf;

use bpaf::{construct, long, positional, Parser};

use evprobe::evdev::{Category, Registry};

#[derive(Debug)]
pub enum Selection {
    Pattern(String),
    Paths(Vec<PathBuf>),
}

#[derive(Debug)]
pub struct Options {
    pub selection: Selection,
    pub keep_going: bool,
    pub codes: bool,
    pub categories: Vec<Category>,
}

fn selection() -> impl Parser<Selection> {
    let pattern = long("devices")
        .env("EVPROBE_DEVICES")
        .help("Input devices to inspect (default: /dev/input/event*)")
        .argument::<String>("PATTERN")
        .fallback(String::from(Registry::DEFAULT_PATTERN));
    let paths = positional::<PathBuf>("DEVICE")
        .help("Inspect these device nodes instead of searching for them")
        .many();

    construct!(pattern, paths).map(|(pattern, paths)| match paths.is_empty() {
        true => Selection::Pattern(pattern),
        false => Selection::Paths(paths),
    })
}

fn options() -> impl Parser<Options> {
    let keep_going = long("keep-going")
        .env("EVPROBE_KEEP_GOING")
        .help("Skip devices which cannot be opened or queried")
        .switch();
    let codes = long("codes")
        .env("EVPROBE_CODES")
        .help("List supported event codes for each event type")
        .switch();
    let categories = long("type")
        .env("EVPROBE_TYPE")
        .help("Only report these event types, e.g. EV_KEY or 3")
        .argument::<Category>("TYPE")
        .many();

    construct!(Options {
        keep_going,
        codes,
        categories,
        // positional arguments at the end
        selection(),
    })
}

pub fn parse() -> Options {
    options().to_options().run()
}
