use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Shaders are read from disk at init, so ship a copy next to the build artifacts.
    println!("cargo:rerun-if-changed=shaders");

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let shaders_src = manifest_dir.join("shaders");
    if shaders_src.exists() {
        copy_items(&[shaders_src], out_dir, &copy_options)?;
    }

    Ok(())
}
