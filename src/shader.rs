use std::sync::atomic::{AtomicU64, Ordering};

pub static SHADER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ShadingModel {
    Phong,
    Gouraud,
    Unlit,
}

impl ShadingModel {
    pub const ALL: [ShadingModel; 3] = [ShadingModel::Phong, ShadingModel::Gouraud, ShadingModel::Unlit];

    /// Name of the pipeline table in the shader archive manifest.
    pub fn pipeline_name(&self) -> &'static str {
        match self {
            ShadingModel::Phong => "phong",
            ShadingModel::Gouraud => "gouraud",
            ShadingModel::Unlit => "unlit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.pipeline_name().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug)]
pub struct Shader {
    pub id: u64,
    pub name: String,
    pub model: ShadingModel,
}

impl Shader {
    pub fn new(name: impl Into<String>, model: ShadingModel) -> Self {
        Self {
            id: SHADER_ID_COUNTER.fetch_add(1, Ordering::SeqCst),
            name: name.into(),
            model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for model in ShadingModel::ALL {
            assert_eq!(ShadingModel::from_name(model.pipeline_name()), Some(model));
        }

        assert_eq!(ShadingModel::from_name("Phong"), Some(ShadingModel::Phong));
        assert_eq!(ShadingModel::from_name("pbr"), None);
    }

    #[test]
    fn shaders_get_unique_ids() {
        let a = Shader::new("a", ShadingModel::Phong);
        let b = Shader::new("b", ShadingModel::Phong);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn lit_fragment_shaders_sample_every_map() {
        let sources = [include_str!("../shaders/phong.frag"), include_str!("../shaders/gouraud.frag")];

        for source in sources {
            for (flag, sampler) in [
                ("MAP_DIFFUSE", "texture(diffuse_map"),
                ("MAP_SPECULAR", "texture(specular_map"),
                ("MAP_EMISSION", "texture(emission_map"),
            ] {
                assert!(source.contains(flag), "{flag} is never checked");
                assert!(source.contains(sampler), "{sampler} is never sampled");
            }
        }
    }
}
