// Sets HELPDESK_VERSION for the `--version` flag

fn main() {
    // Packagers can pin a version string, otherwise the crate version is used
    let version =
        std::env::var("HELPDESK_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=HELPDESK_VERSION={}", version);
    println!("cargo:rerun-if-env-changed=HELPDESK_VERSION");
    println!("cargo:rerun-if-changed=Cargo.toml");
}
