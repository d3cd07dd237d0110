use std::env;
use std::path::PathBuf;

fn main() {
    // Only regenerate the header when the FFI source changes.
    println!("cargo:rerun-if-changed=src/ffi.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => dir,
        Err(_) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set; skipping header generation");
            return;
        }
    };

    let output_file = PathBuf::from(&crate_dir).join("include").join("cvforge.h");

    if let Some(parent) = output_file.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            println!("cargo:warning=cannot create include/: {e}");
            return;
        }
    }

    let config = match cbindgen::Config::from_file(PathBuf::from(&crate_dir).join("cbindgen.toml"))
    {
        Ok(c) => c,
        Err(e) => {
            println!("cargo:warning=failed to read cbindgen.toml: {e}");
            return;
        }
    };

    // A header failure must not break the Rust build itself.
    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(&output_file);
        }
        Err(e) => println!("cargo:warning=cbindgen failed: {e}"),
    }
}
