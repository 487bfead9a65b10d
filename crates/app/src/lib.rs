pub mod app;
pub mod camera;
pub mod pointer;
pub mod viewport;

pub use winit;

#[cfg(test)]
mod tests {
    #[test]
    fn native_runtime_crates_stay_off_the_web() {
        let manifest = include_str!("../Cargo.toml");
        let native = manifest
            .find("[target.'cfg(not(target_arch = \"wasm32\"))'.dependencies]")
            .unwrap();
        let web = manifest
            .find("[target.'cfg(target_arch = \"wasm32\")'.dependencies]")
            .unwrap();
        for name in ["env_logger", "pollster"] {
            let entries: Vec<_> = manifest
                .match_indices(&format!("\n{name} ="))
                .map(|(position, _)| position)
                .collect();
            assert_eq!(entries.len(), 1, "{name}");
            assert!(native < entries[0] && entries[0] < web, "{name}");
        }
    }
}
