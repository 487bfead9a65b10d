#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to read config file {path:?}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything needed to start a ballpit. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BallpitConfig {
    pub simulation: physics::SimulationConfig,
    /// Seed for the initial placement, reused on every rebuild.
    pub seed: u64,
    /// Gradient stops as `0xRRGGBB`.
    pub colors: Vec<u32>,
    pub lighting: scene::LightingConfig,
    pub material: scene::SphereMaterial,
    pub window: app::app::WindowOptions,
}

impl Default for BallpitConfig {
    fn default() -> Self {
        Self {
            simulation: physics::SimulationConfig::default(),
            seed: 0,
            colors: vec![0xff6b6b, 0xfeca57, 0x48dbfb, 0x1dd1a1],
            lighting: scene::LightingConfig::default(),
            material: scene::SphereMaterial::default(),
            window: app::app::WindowOptions::default(),
        }
    }
}

impl BallpitConfig {
    pub fn from_ron(contents: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(contents)
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron(&contents).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {path:?}");
        Ok(config)
    }
}
