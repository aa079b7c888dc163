// ESP-IDF link arguments are only needed when building the firmware. Host
// builds (tests, simulator) skip them.
fn main() {
    println!("cargo:rerun-if-changed=cfg.toml");
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
