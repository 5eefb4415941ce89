// minetile_deployer/deployer/build.rs

fn main() {
    // Package name, version and target triple, logged at startup.
    built::write_built_file().expect("Failed to acquire build-time information");
    println!("cargo:rerun-if-changed=build.rs");
}
