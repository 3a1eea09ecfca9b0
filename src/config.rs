use crate::camera::Camera;
use crate::import;
use crate::light::{DirectionalLight, PointLight};
use crate::material::Material;
use crate::object::{Object, ObjectId, Transform};
use crate::scene::{Scene, SceneError};
use crate::texture::{Texture, TextureError, TextureKind};
use log::{error, info};
use nalgebra_glm::Vec3;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid scene file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown {kind} \"{name}\"")]
    UnknownReference { kind: &'static str, name: String },
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "glint".to_owned(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Option<[f32; 3]>,
    pub yaw: Option<f32>,
    pub pitch: Option<f32>,
    pub fov: Option<f32>,
    pub speed: Option<f32>,
    pub sensitivity: Option<f32>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DirectionalLightConfig {
    pub direction: Option<[f32; 3]>,
    pub color: Option<[f32; 3]>,
    pub intensity: Option<f32>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PointLightConfig {
    pub name: Option<String>,
    pub position: [f32; 3],
    #[serde(default = "white")]
    pub color: [f32; 3],
    #[serde(default = "one")]
    pub intensity: f32,
    pub constant: Option<f32>,
    pub linear: Option<f32>,
    pub quadratic: Option<f32>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TextureConfig {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MaterialConfig {
    pub name: String,
    #[serde(default = "white")]
    pub ambient: [f32; 3],
    #[serde(default = "white")]
    pub diffuse: [f32; 3],
    #[serde(default = "half")]
    pub specular: [f32; 3],
    #[serde(default = "default_shininess")]
    pub shininess: f32,
    pub diffuse_map: Option<String>,
    pub specular_map: Option<String>,
    pub emission_map: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ObjectConfig {
    pub name: String,
    #[serde(default = "default_mesh")]
    pub mesh: String,
    pub material: Option<String>,
    #[serde(default = "default_shader")]
    pub shader: String,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "ones")]
    pub scale: [f32; 3],
    pub parent: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ModelConfig {
    pub name: Option<String>,
    pub path: PathBuf,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "ones")]
    pub scale: [f32; 3],
    #[serde(default = "default_shader")]
    pub shader: String,
}

fn white() -> [f32; 3] {
    [1.0; 3]
}

fn ones() -> [f32; 3] {
    [1.0; 3]
}

fn half() -> [f32; 3] {
    [0.5; 3]
}

fn one() -> f32 {
    1.0
}

fn default_shininess() -> f32 {
    32.0
}

fn default_mesh() -> String {
    "cube".to_owned()
}

fn default_shader() -> String {
    "phong".to_owned()
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SceneConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub directional_light: DirectionalLightConfig,
    pub point_lights: Option<Vec<PointLightConfig>>,
    pub textures: Vec<TextureConfig>,
    pub materials: Vec<MaterialConfig>,
    pub objects: Vec<ObjectConfig>,
    pub models: Vec<ModelConfig>,
    /// Directory relative texture and model paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl SceneConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;

        let mut config = Self::parse(&text)?;
        config.base_dir = path.parent().map(Path::to_owned).unwrap_or_default();

        info!("loaded scene file {}", path.display());

        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn build_scene(&self) -> Result<Scene, ConfigError> {
        let mut scene = Scene::with_builtins();

        self.apply_camera(&mut scene.camera);
        self.apply_dir_light(&mut scene.dir_light);

        match &self.point_lights {
            Some(lights) => {
                for (i, l) in lights.iter().enumerate() {
                    let name = l.name.clone().unwrap_or_else(|| format!("Point light {}", i + 1));
                    let mut light = PointLight::new(name, l.position.into(), l.color.into(), l.intensity);
                    light.constant = l.constant.unwrap_or(light.constant);
                    light.linear = l.linear.unwrap_or(light.linear);
                    light.quadratic = l.quadratic.unwrap_or(light.quadratic);
                    scene.add_point_light(light)?;
                }
            }
            None => {
                scene.add_point_light(PointLight::default())?;
            }
        }

        for t in &self.textures {
            let texture = Texture::load(self.resolve(&t.path))?;
            scene.add_texture(Texture {
                name: t.name.clone(),
                ..texture
            });
        }

        for m in &self.materials {
            let mut material = Material::colored(
                m.name.clone(),
                m.ambient.into(),
                m.diffuse.into(),
                m.specular.into(),
                m.shininess,
            );

            let maps = [
                (TextureKind::Diffuse, &m.diffuse_map),
                (TextureKind::Specular, &m.specular_map),
                (TextureKind::Emission, &m.emission_map),
            ];

            for (kind, name) in maps {
                if let Some(name) = name {
                    let texture = scene.find_texture_by_name(name).cloned().ok_or_else(|| unknown("texture", name))?;
                    material.set_map(kind, Some(texture));
                }
            }

            scene.add_material(material);
        }

        let mut models = HashMap::new();

        for model in &self.models {
            let shader = scene
                .find_shader_by_name(&model.shader)
                .cloned()
                .ok_or_else(|| unknown("shader", &model.shader))?;

            let path = self.resolve(&model.path);
            match import::import_model(&path) {
                Ok(mut imported) => {
                    if let Some(name) = &model.name {
                        imported.name = name.clone();
                    }
                    let name = imported.name.clone();
                    let root = scene.add_model(imported, shader);
                    if let Some(object) = scene.object_mut(root) {
                        object.transform = transform(model.position, model.rotation, model.scale);
                    }
                    models.insert(name, root);
                }
                Err(e) => error!("failed to import {}: {e}", path.display()),
            }
        }

        for o in &self.objects {
            match models.get(&o.mesh) {
                Some(&source) => self.instance_model(&mut scene, source, o)?,
                None => {
                    let object = self.make_object(&scene, o)?;
                    scene.add_object(object);
                }
            }
        }

        if self.objects.is_empty() && self.models.is_empty() {
            let object = Object::new(
                "Default cube",
                scene.meshes[0].clone(),
                scene.materials[0].clone(),
                scene.shaders[0].clone(),
            );
            scene.add_object(object);
        }

        Ok(scene)
    }

    fn make_object(&self, scene: &Scene, o: &ObjectConfig) -> Result<Object, ConfigError> {
        let mesh = scene.find_mesh_by_name(&o.mesh).cloned().ok_or_else(|| unknown("mesh", &o.mesh))?;

        let material = match &o.material {
            Some(name) => scene.find_material_by_name(name).cloned().ok_or_else(|| unknown("material", name))?,
            None => scene.materials[0].clone(),
        };

        let shader = scene
            .find_shader_by_name(&o.shader.to_lowercase())
            .cloned()
            .ok_or_else(|| unknown("shader", &o.shader))?;

        let mut object =
            Object::new(o.name.clone(), mesh, material, shader).with_transform(transform(o.position, o.rotation, o.scale));

        if let Some(parent) = &o.parent {
            object.parent = Some(scene.find_object_by_name(parent).ok_or_else(|| unknown("object", parent))?.id);
        }

        Ok(object)
    }

    /// Places another copy of an imported model's tree, named and positioned by `o`.
    fn instance_model(&self, scene: &mut Scene, source: ObjectId, o: &ObjectConfig) -> Result<(), ConfigError> {
        let shader = scene
            .find_shader_by_name(&o.shader.to_lowercase())
            .cloned()
            .ok_or_else(|| unknown("shader", &o.shader))?;

        let material = match &o.material {
            Some(name) => Some(scene.find_material_by_name(name).cloned().ok_or_else(|| unknown("material", name))?),
            None => None,
        };

        let parent = match &o.parent {
            Some(parent) => Some(scene.find_object_by_name(parent).ok_or_else(|| unknown("object", parent))?.id),
            None => None,
        };

        let root = scene.duplicate_subtree(source, parent)?;

        for id in scene.subtree(root)? {
            if let Some(object) = scene.object_mut(id) {
                object.shader = shader.clone();
                if let Some(material) = &material {
                    object.material = material.clone();
                }
            }
        }

        if let Some(object) = scene.object_mut(root) {
            object.name = o.name.clone();
            object.transform = transform(o.position, o.rotation, o.scale);
        }

        Ok(())
    }

    fn apply_camera(&self, camera: &mut Camera) {
        let c = &self.camera;

        if let Some(position) = c.position {
            camera.position = position.into();
        }
        camera.set_orientation(c.yaw.unwrap_or(camera.yaw), c.pitch.unwrap_or(camera.pitch));
        if let Some(fov) = c.fov {
            camera.fov = fov.clamp(crate::camera::MIN_FOV, crate::camera::MAX_FOV);
        }
        if let Some(speed) = c.speed {
            camera.set_speed(speed);
        }
        if let Some(sensitivity) = c.sensitivity {
            camera.set_sensitivity(sensitivity);
        }
    }

    fn apply_dir_light(&self, light: &mut DirectionalLight) {
        let l = &self.directional_light;

        if let Some(direction) = l.direction {
            light.direction = direction.into();
        }
        if let Some(color) = l.color {
            light.set_color(color.into());
        }
        if let Some(intensity) = l.intensity {
            light.set_intensity(intensity);
        }
    }
}

fn unknown(kind: &'static str, name: &str) -> ConfigError {
    ConfigError::UnknownReference {
        kind,
        name: name.to_owned(),
    }
}

fn transform(position: [f32; 3], rotation: [f32; 3], scale: [f32; 3]) -> Transform {
    Transform::new(Vec3::from(position), Vec3::from(rotation), Vec3::from(scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm::vec3;

    #[test]
    fn empty_file_gives_default_scene() {
        let scene = SceneConfig::parse("").unwrap().build_scene().unwrap();

        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.objects[0].name, "Default cube");
        assert_eq!(scene.point_lights.len(), 1);
        assert_eq!(scene.shaders.len(), 3);
    }

    #[test]
    fn window_defaults_fill_missing_keys() {
        let config = SceneConfig::parse("[window]\nwidth = 800").unwrap();

        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert!(config.window.vsync);
    }

    #[test]
    fn objects_and_materials_resolve_by_name() {
        let text = r#"
            [camera]
            position = [0.0, 1.0, 5.0]
            fov = 90.0

            [[point_lights]]
            position = [1.0, 1.0, 1.0]
            color = [1.0, 0.0, 0.0]
            linear = 0.5

            [[materials]]
            name = "red"
            diffuse = [1.0, 0.0, 0.0]
            shininess = 1000.0

            [[objects]]
            name = "floor"
            mesh = "plane"
            material = "red"
            shader = "Gouraud"

            [[objects]]
            name = "ball"
            mesh = "sphere"
            position = [0.0, 2.0, 0.0]
            parent = "floor"
        "#;

        let scene = SceneConfig::parse(text).unwrap().build_scene().unwrap();

        assert_eq!(scene.camera.position, vec3(0.0, 1.0, 5.0));
        assert_eq!(scene.camera.fov, crate::camera::MAX_FOV);
        assert_eq!(scene.point_lights.len(), 1);
        assert_eq!(scene.point_lights[0].linear, 0.5);
        assert_eq!(scene.point_lights[0].name, "Point light 1");

        assert_eq!(scene.objects.len(), 2);
        let floor = &scene.objects[0];
        assert_eq!(floor.material.borrow().name, "red");
        assert_eq!(floor.material.borrow().shininess(), crate::material::MAX_SHININESS);
        assert_eq!(floor.shader.name, "gouraud");

        let ball = &scene.objects[1];
        assert_eq!(ball.parent, Some(floor.id));
        assert_eq!(ball.transform.position, vec3(0.0, 2.0, 0.0));
        assert_eq!(ball.material.borrow().name, "Default");
    }

    #[test]
    fn explicit_empty_light_list_means_no_lights() {
        let scene = SceneConfig::parse("point_lights = []").unwrap().build_scene().unwrap();
        assert!(scene.point_lights.is_empty());
    }

    #[test]
    fn unknown_mesh_is_reported() {
        let text = "[[objects]]\nname = \"x\"\nmesh = \"teapot\"";
        let err = SceneConfig::parse(text).unwrap().build_scene().err().unwrap();

        assert!(matches!(err, ConfigError::UnknownReference { kind: "mesh", ref name } if name == "teapot"));
    }

    #[test]
    fn unknown_texture_is_reported() {
        let text = "[[materials]]\nname = \"m\"\ndiffuse_map = \"missing\"";
        let err = SceneConfig::parse(text).unwrap().build_scene().err().unwrap();

        assert!(matches!(err, ConfigError::UnknownReference { kind: "texture", .. }));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(matches!(SceneConfig::parse("[window"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn models_import_and_can_be_placed_again() {
        let dir = std::env::temp_dir().join(format!("glint-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tri.glb"), crate::import::fixtures::triangle_glb()).unwrap();

        let text = r#"
            [[models]]
            path = "tri.glb"
            position = [0.0, 5.0, 0.0]
            scale = [2.0, 2.0, 2.0]
            shader = "gouraud"

            [[objects]]
            name = "second"
            mesh = "tri"
            shader = "unlit"
            position = [3.0, 0.0, 0.0]
        "#;

        let mut config = SceneConfig::parse(text).unwrap();
        config.base_dir = dir.clone();
        let scene = config.build_scene().unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let root = scene.objects[0].id;
        assert_eq!(scene.objects[0].name, "tri");
        assert_eq!(scene.objects[0].transform.position, vec3(0.0, 5.0, 0.0));
        assert_eq!(scene.objects[0].transform.scale, vec3(2.0, 2.0, 2.0));
        assert_eq!(scene.children(Some(root)).next().unwrap().shader.name, "gouraud");

        let second = scene.find_object_by_name("second").unwrap();
        assert_eq!(second.transform.position, vec3(3.0, 0.0, 0.0));
        assert_eq!(second.parent, None);

        let copied = scene.children(Some(second.id)).collect::<Vec<_>>();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].name, "tri");
        assert_eq!(copied[0].shader.name, "unlit");
        assert_eq!(scene.children(Some(copied[0].id)).next().unwrap().name, "child");

        // tri + child, twice over
        let frame = scene.build_frame();
        assert_eq!(frame.draws.iter().filter(|d| d.object_id.is_some()).count(), 4);
    }

    #[test]
    fn missing_model_is_skipped() {
        let text = "[[models]]\npath = \"does/not/exist.gltf\"";
        let scene = SceneConfig::parse(text).unwrap().build_scene().unwrap();

        // the model section was given, so no default cube either
        assert!(scene.objects.is_empty());
    }
}
