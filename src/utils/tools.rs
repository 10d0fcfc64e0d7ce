use log::info;

/// Version d'une dépendance : variable d'environnement, sinon valeur figée par `build.rs`.
fn dependency_version(name: &str, built: Option<&'static str>) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| built.map(str::to_owned))
        .unwrap_or_else(|| "Unknown".into())
}

/// Affiche les informations Rust et les dépendances principales de la compilation.
pub fn show_rust_core_dependencies() {
    // Info système (Rust version, OS)
    info!("Rust compiler version: {}", rustc_version_runtime::version());
    info!("  Platform    : {}", std::env::consts::OS);
    info!("  Arch        : {}", std::env::consts::ARCH);

    info!("Rust core dependancies");
    info!("  CPAL    version: {}", dependency_version("CPAL", option_env!("CPAL")));
    info!("  HOUND   version: {}", dependency_version("HOUND", option_env!("HOUND")));
    info!("  RUSTFFT version: {}", dependency_version("RUSTFFT", option_env!("RUSTFFT")));
}
