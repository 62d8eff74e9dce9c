use std::env;
use std::path::Path;

use anyhow::{bail, Result};
use apkforge::{preflight, Config, Packer, SubprocessRunner, Unpacker};

fn usage() -> &'static str {
    "Usage:\n  \
     apkforge unpack <app.apk>\n  \
     apkforge pack <source-dir> <output.apk>"
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.as_slice() {
        [cmd, apk] if cmd == "unpack" => unpack(Path::new(apk)),
        [cmd, source, output] if cmd == "pack" => pack(Path::new(source), Path::new(output)),
        [flag] if flag == "--version" || flag == "-V" => {
            println!("apkforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        _ => bail!(usage()),
    }
}

fn unpack(apk: &Path) -> Result<()> {
    let config = Config::load()?;
    preflight::check_runtime(&config)?;
    let runner = SubprocessRunner::new(config.clone());
    Unpacker::new(&runner).unpack(apk)
}

fn pack(source: &Path, output: &Path) -> Result<()> {
    let config = Config::load()?;
    preflight::check_runtime(&config)?;
    let runner = SubprocessRunner::new(config.clone());
    Packer::new(&config, &runner).pack(source, output)
}
