use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Small real-time scene viewer")]
pub struct Args {
    /// TOML file describing the startup scene.
    #[arg(short, long)]
    pub scene: Option<PathBuf>,
    /// glTF models imported after the scene is built.
    pub model: Vec<PathBuf>,
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    #[arg(long, default_value_t = cfg!(debug_assertions))]
    pub validation: bool,
    #[arg(long)]
    pub no_validation: bool,
    #[arg(long, default_value_t = false)]
    pub no_vsync: bool,
}

impl Args {
    pub fn validation_enabled(&self) -> bool {
        self.validation && !self.no_validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_paths_are_models() {
        let args = Args::try_parse_from(["glint", "a.glb", "b.gltf", "--scene", "scene.toml"]).unwrap();

        assert_eq!(args.model, vec![PathBuf::from("a.glb"), PathBuf::from("b.gltf")]);
        assert_eq!(args.scene, Some(PathBuf::from("scene.toml")));
        assert!(!args.no_vsync);
    }

    #[test]
    fn validation_can_be_switched_off() {
        let args = Args::try_parse_from(["glint", "--validation", "--no-validation"]).unwrap();
        assert!(!args.validation_enabled());

        let args = Args::try_parse_from(["glint", "--validation"]).unwrap();
        assert!(args.validation_enabled());
    }

    #[test]
    fn size_overrides_parse() {
        let args = Args::try_parse_from(["glint", "--width", "800", "--height", "600"]).unwrap();

        assert_eq!(args.width, Some(800));
        assert_eq!(args.height, Some(600));
    }
}
