//! CLI mkcheck tool
extern crate die;
extern crate getopts;
extern crate makeparse;

use die::{die, Die};
use std::env;
use std::fs;
use std::path;

fn main() {
    let brief: String = format!("Usage: {} <OPTIONS> <makefile> [<makefile> ...]", env!("CARGO_PKG_NAME"));
    let mut opts: getopts::Options = getopts::Options::new();
    opts.optflag("h", "help", "print usage info");
    opts.optflag("v", "version", "print version info");
    opts.optflag("n", "check", "parse only, reporting nothing but errors");
    let usage: String = opts.usage(&brief);

    let arguments: Vec<String> = env::args().collect();
    let optmatches: getopts::Matches = opts.parse(&arguments[1..]).die(&usage);

    if optmatches.opt_present("h") {
        die!(0; usage);
    }
    if optmatches.opt_present("v") {
        die!(0; format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
    }

    let pth_strings: Vec<String> = optmatches.free;
    if pth_strings.is_empty() {
        die!(1; usage);
    }
    let check_only = optmatches.opt_present("n");

    let mut found_error = false;
    for pth_string in pth_strings {
        let pth: &path::Path = path::Path::new(&pth_string);
        let md: fs::Metadata = fs::metadata(pth).die("unable to access file path");
        if md.is_dir() {
            die!(1; usage);
        }

        match makeparse::parse_file(pth) {
            Ok(statements) => {
                if !check_only {
                    println!("{}: {} statements", pth_string, statements.len());
                }
            }
            Err(err) => {
                found_error = true;
                eprintln!("{}", err);
            }
        }
    }

    if found_error {
        die!(1);
    }
}
