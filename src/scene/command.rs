use crate::light::PointLight;
use crate::object::ObjectId;
use crate::scene::{ObjectSpec, Scene, SceneError, check_index};
use crate::texture::TextureKind;
use log::debug;
use nalgebra_glm::Vec3;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialEdit {
    Ambient(Vec3),
    Diffuse(Vec3),
    Specular(Vec3),
    Shininess(f32),
    /// Texture index into the scene list, `None` clears the map.
    Map(TextureKind, Option<usize>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointLightEdit {
    Position(Vec3),
    Color(Vec3),
    Intensity(f32),
    Attenuation { constant: f32, linear: f32, quadratic: f32 },
    Enabled(bool),
}

/// One change requested by the editor panel.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    SetCameraSpeed(f32),
    SetCameraSensitivity(f32),
    SetCameraFov(f32),
    SetLightDirection(Vec3),
    SetLightColor(Vec3),
    SetLightIntensity(f32),
    SetPosition(ObjectId, Vec3),
    SetRotation(ObjectId, Vec3),
    SetScale(ObjectId, Vec3),
    SetUniformScaling(ObjectId, bool),
    SetObjectShader(ObjectId, usize),
    SetObjectMaterial(ObjectId, usize),
    SetObjectTexture(ObjectId, TextureKind, Option<usize>),
    SetVisible(ObjectId, bool),
    SetObjectWireframe(ObjectId, bool),
    SetParent(ObjectId, Option<ObjectId>),
    CreateObject(ObjectSpec),
    RemoveObject(ObjectId),
    EditMaterial(usize, MaterialEdit),
    AddPointLight,
    RemovePointLight(usize),
    EditPointLight(usize, PointLightEdit),
    SetClearColor(Vec3),
    SetWireframe(bool),
    ToggleWireframe,
    ImportModel(PathBuf),
}

#[derive(Debug, PartialEq)]
pub enum Applied {
    Done,
    /// Loading happens outside the scene, the caller picks the file up.
    ImportRequested(PathBuf),
}

impl Scene {
    pub fn apply(&mut self, command: EditorCommand) -> Result<Applied, SceneError> {
        debug!("applying {command:?}");

        match command {
            EditorCommand::SetCameraSpeed(speed) => self.camera.set_speed(speed),
            EditorCommand::SetCameraSensitivity(sensitivity) => self.camera.set_sensitivity(sensitivity),
            EditorCommand::SetCameraFov(fov) => {
                self.camera.fov = fov.clamp(crate::camera::MIN_FOV, crate::camera::MAX_FOV);
            }
            EditorCommand::SetLightDirection(direction) => self.dir_light.direction = direction,
            EditorCommand::SetLightColor(color) => self.dir_light.set_color(color),
            EditorCommand::SetLightIntensity(intensity) => self.dir_light.set_intensity(intensity),
            EditorCommand::SetPosition(id, position) => self.expect_object(id)?.transform.position = position,
            EditorCommand::SetRotation(id, rotation) => self.expect_object(id)?.transform.rotation = rotation,
            EditorCommand::SetScale(id, scale) => self.expect_object(id)?.transform.set_scale_synced(scale),
            EditorCommand::SetUniformScaling(id, enabled) => {
                self.expect_object(id)?.transform.uniform_scaling = enabled;
            }
            EditorCommand::SetObjectShader(id, index) => {
                check_index("shader", index, self.shaders.len())?;
                let shader = self.shaders[index].clone();
                self.expect_object(id)?.shader = shader;
            }
            EditorCommand::SetObjectMaterial(id, index) => {
                check_index("material", index, self.materials.len())?;
                let material = self.materials[index].clone();
                self.expect_object(id)?.material = material;
            }
            EditorCommand::SetObjectTexture(id, kind, index) => {
                let texture = self.texture_at(index)?;
                self.expect_object(id)?.set_texture(kind, texture);
            }
            EditorCommand::SetVisible(id, visible) => self.expect_object(id)?.visible = visible,
            EditorCommand::SetObjectWireframe(id, wireframe) => self.expect_object(id)?.wireframe = wireframe,
            EditorCommand::SetParent(child, parent) => self.set_parent(child, parent)?,
            EditorCommand::CreateObject(spec) => {
                self.create_object(spec)?;
            }
            EditorCommand::RemoveObject(id) => {
                self.remove_subtree(id)?;
            }
            EditorCommand::EditMaterial(index, edit) => {
                check_index("material", index, self.materials.len())?;

                let texture = match &edit {
                    MaterialEdit::Map(_, texture) => self.texture_at(*texture)?,
                    _ => None,
                };

                let mut material = self.materials[index].borrow_mut();
                match edit {
                    MaterialEdit::Ambient(c) => material.ambient = c,
                    MaterialEdit::Diffuse(c) => material.diffuse = c,
                    MaterialEdit::Specular(c) => material.specular = c,
                    MaterialEdit::Shininess(s) => material.set_shininess(s),
                    MaterialEdit::Map(kind, _) => material.set_map(kind, texture),
                }
            }
            EditorCommand::AddPointLight => {
                let name = format!("Point light {}", self.point_lights.len() + 1);
                let position = self.camera.position + self.camera.front() * 2.0;
                self.add_point_light(PointLight::new(name, position, Vec3::from_element(1.0), 1.0))?;
            }
            EditorCommand::RemovePointLight(index) => {
                self.remove_point_light(index)?;
            }
            EditorCommand::EditPointLight(index, edit) => {
                check_index("point light", index, self.point_lights.len())?;

                let light = &mut self.point_lights[index];
                match edit {
                    PointLightEdit::Position(p) => light.position = p,
                    PointLightEdit::Color(c) => light.set_color(c),
                    PointLightEdit::Intensity(i) => light.set_intensity(i),
                    PointLightEdit::Attenuation {
                        constant,
                        linear,
                        quadratic,
                    } => {
                        light.constant = constant;
                        light.linear = linear;
                        light.quadratic = quadratic;
                    }
                    PointLightEdit::Enabled(e) => light.enabled = e,
                }
            }
            EditorCommand::SetClearColor(color) => self.clear_color = color,
            EditorCommand::SetWireframe(wireframe) => self.wireframe = wireframe,
            EditorCommand::ToggleWireframe => self.wireframe = !self.wireframe,
            EditorCommand::ImportModel(path) => return Ok(Applied::ImportRequested(path)),
        }

        Ok(Applied::Done)
    }

    fn expect_object(&mut self, id: ObjectId) -> Result<&mut crate::object::Object, SceneError> {
        self.object_mut(id).ok_or(SceneError::UnknownObject(id))
    }

    fn texture_at(&self, index: Option<usize>) -> Result<Option<std::rc::Rc<crate::texture::Texture>>, SceneError> {
        match index {
            Some(i) => {
                check_index("texture", i, self.textures.len())?;
                Ok(Some(self.textures[i].clone()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::ShadingModel;
    use crate::texture::Texture;
    use nalgebra_glm::vec3;

    fn scene_with_object() -> (Scene, ObjectId) {
        let mut scene = Scene::with_builtins();
        let id = scene
            .create_object(ObjectSpec {
                name: "box".into(),
                mesh: 0,
                material: 0,
                shader: 0,
                parent: None,
            })
            .unwrap();
        (scene, id)
    }

    #[test]
    fn camera_edits() {
        let (mut scene, _) = scene_with_object();

        scene.apply(EditorCommand::SetCameraSpeed(12.0)).unwrap();
        scene.apply(EditorCommand::SetCameraSensitivity(0.5)).unwrap();
        scene.apply(EditorCommand::SetCameraFov(200.0)).unwrap();

        assert_eq!(scene.camera.speed, 12.0);
        assert_eq!(scene.camera.sensitivity, 0.5);
        assert_eq!(scene.camera.fov, 45.0);
    }

    #[test]
    fn light_edits_rederive_terms() {
        let (mut scene, _) = scene_with_object();

        scene.apply(EditorCommand::SetLightColor(vec3(1.0, 0.0, 0.0))).unwrap();
        assert_eq!(scene.dir_light.diffuse, vec3(0.5, 0.0, 0.0));

        scene.apply(EditorCommand::SetLightDirection(vec3(0.0, -1.0, 0.0))).unwrap();
        assert_eq!(scene.dir_light.direction, vec3(0.0, -1.0, 0.0));
    }

    #[test]
    fn transform_edits_respect_uniform_flag() {
        let (mut scene, id) = scene_with_object();

        scene.apply(EditorCommand::SetUniformScaling(id, true)).unwrap();
        scene.apply(EditorCommand::SetScale(id, vec3(1.0, 1.0, 4.0))).unwrap();
        scene.apply(EditorCommand::SetPosition(id, vec3(1.0, 2.0, 3.0))).unwrap();

        let t = &scene.object(id).unwrap().transform;
        assert_eq!(t.scale, vec3(4.0, 4.0, 4.0));
        assert_eq!(t.position, vec3(1.0, 2.0, 3.0));
    }

    #[test]
    fn object_resource_swaps_are_bounds_checked() {
        let (mut scene, id) = scene_with_object();

        scene.apply(EditorCommand::SetObjectShader(id, 2)).unwrap();
        assert_eq!(scene.object(id).unwrap().shader.model, ShadingModel::Unlit);

        assert!(matches!(
            scene.apply(EditorCommand::SetObjectMaterial(id, 9)),
            Err(SceneError::IndexOutOfRange { what: "material", .. })
        ));
        assert!(matches!(
            scene.apply(EditorCommand::SetVisible(ObjectId(u64::MAX), false)),
            Err(SceneError::UnknownObject(_))
        ));
    }

    #[test]
    fn material_map_edit_uses_texture_list() {
        let (mut scene, _) = scene_with_object();
        let tex = scene.add_texture(Texture::solid("t", [0; 4]));

        scene
            .apply(EditorCommand::EditMaterial(0, MaterialEdit::Map(TextureKind::Diffuse, Some(0))))
            .unwrap();
        scene.apply(EditorCommand::EditMaterial(0, MaterialEdit::Shininess(0.1))).unwrap();

        let material = scene.materials[0].borrow();
        assert_eq!(material.diffuse_map.as_ref().unwrap().id, tex.id);
        assert_eq!(material.shininess(), 1.0);
        drop(material);

        assert!(
            scene
                .apply(EditorCommand::EditMaterial(0, MaterialEdit::Map(TextureKind::Diffuse, Some(3))))
                .is_err()
        );
    }

    #[test]
    fn object_lifecycle() {
        let (mut scene, id) = scene_with_object();

        scene
            .apply(EditorCommand::CreateObject(ObjectSpec {
                name: "child".into(),
                mesh: 1,
                material: 0,
                shader: 1,
                parent: Some(id),
            }))
            .unwrap();
        assert_eq!(scene.objects.len(), 2);

        scene.apply(EditorCommand::RemoveObject(id)).unwrap();
        assert!(scene.objects.is_empty());

        assert!(scene.apply(EditorCommand::RemoveObject(id)).is_err());
    }

    #[test]
    fn removing_model_root_stops_drawing_the_model() {
        let mut scene = Scene::with_builtins();
        let shader = scene.shaders[0].clone();
        let cube = scene.meshes[0].clone();

        let part = |name: &str| crate::import::ImportedNode {
            name: name.into(),
            transform: Default::default(),
            mesh: Some(0),
            children: Vec::new(),
        };
        let model = crate::import::ImportedModel {
            name: "pair".into(),
            meshes: vec![crate::import::ImportedMesh {
                name: "cube".into(),
                primitives: vec![crate::import::ImportedPrimitive {
                    mesh: cube,
                    material: None,
                }],
            }],
            materials: Vec::new(),
            textures: Vec::new(),
            nodes: vec![part("left"), part("right")],
        };

        let root = scene.add_model(model, shader);
        assert_eq!(scene.build_frame().draws.len(), 2);

        scene.apply(EditorCommand::RemoveObject(root)).unwrap();

        assert!(scene.objects.is_empty());
        assert!(scene.build_frame().draws.is_empty());
    }

    #[test]
    fn point_light_commands() {
        let (mut scene, _) = scene_with_object();

        scene.apply(EditorCommand::AddPointLight).unwrap();
        scene
            .apply(EditorCommand::EditPointLight(0, PointLightEdit::Intensity(2.0)))
            .unwrap();
        scene
            .apply(EditorCommand::EditPointLight(0, PointLightEdit::Enabled(false)))
            .unwrap();

        assert_eq!(scene.point_lights[0].intensity(), 2.0);
        assert!(!scene.point_lights[0].enabled);
        assert_eq!(scene.point_lights[0].name, "Point light 1");

        scene.apply(EditorCommand::RemovePointLight(0)).unwrap();
        assert!(scene.apply(EditorCommand::RemovePointLight(0)).is_err());
    }

    #[test]
    fn wireframe_and_import() {
        let (mut scene, _) = scene_with_object();

        scene.apply(EditorCommand::ToggleWireframe).unwrap();
        assert!(scene.wireframe);
        scene.apply(EditorCommand::SetWireframe(false)).unwrap();
        assert!(!scene.wireframe);

        let applied = scene.apply(EditorCommand::ImportModel("a.glb".into())).unwrap();
        assert_eq!(applied, Applied::ImportRequested("a.glb".into()));
    }
}
