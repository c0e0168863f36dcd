//! Build script for mlserve-core.
//!
//! This script compiles the protobuf definitions into Rust code.
//!
//! Note: Build scripts require `println!` for cargo integration,
//! so we allow it here.
#![allow(clippy::disallowed_macros)]

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure()
        // Generate server code
        .build_server(true)
        // Generate client code (used by the `mls` CLI and tests)
        .build_client(true)
        .compile_protos(&["proto/mlserve.proto"], &["proto/"])?;

    // Tell cargo to rerun this script if proto files change
    println!("cargo:rerun-if-changed=proto/");

    Ok(())
}
