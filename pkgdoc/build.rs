use std::env;

fn main() {
  // Let the linker drop unreferenced sections of the statically linked
  // Python grammar. Its parse tables are data and stay as they are.
  if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("linux") {
    println!("cargo:rustc-link-arg-bins=-Wl,--gc-sections");
  }
}
