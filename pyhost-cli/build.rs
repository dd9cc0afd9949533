fn main() {
    // Test binaries load libpython at runtime; point them at the interpreter
    // the crate was configured against.
    let config = pyo3_build_config::get();
    if config.shared {
        if let Some(lib_dir) = &config.lib_dir {
            println!("cargo:rustc-link-arg=-Wl,-rpath,{}", lib_dir);
        }
    }
}
