use crate::camera::Camera;
use crate::frame::{DrawCall, FramePacket, FrameUniforms};
use crate::import::{ImportedModel, ImportedNode};
use crate::light::{DirectionalLight, MAX_POINT_LIGHTS, PointLight};
use crate::material::Material;
use crate::mesh::{self, MeshResource};
use crate::object::{Object, ObjectId};
use crate::shader::{Shader, ShadingModel};
use crate::texture::{Texture, TextureKind};
use log::{debug, info};
use nalgebra_glm::{Mat4, Vec3, vec3};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

mod command;
pub use command::{Applied, EditorCommand, MaterialEdit, PointLightEdit};

const GIZMO_SCALE: f32 = 0.2;

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("{what} index {index} is out of range (have {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    #[error("no object with id {0}")]
    UnknownObject(ObjectId),
    #[error("making {parent} the parent of {child} would create a cycle")]
    HierarchyCycle { child: ObjectId, parent: ObjectId },
    #[error("point light limit reached")]
    TooManyPointLights,
}

fn check_index(what: &'static str, index: usize, len: usize) -> Result<(), SceneError> {
    if index < len {
        Ok(())
    } else {
        Err(SceneError::IndexOutOfRange { what, index, len })
    }
}

/// Index based object description, as picked from the editor combos.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpec {
    pub name: String,
    pub mesh: usize,
    pub material: usize,
    pub shader: usize,
    pub parent: Option<ObjectId>,
}

pub struct Scene {
    pub camera: Camera,
    pub dir_light: DirectionalLight,
    pub point_lights: Vec<PointLight>,
    pub objects: Vec<Object>,
    pub meshes: Vec<Rc<MeshResource>>,
    pub materials: Vec<Rc<RefCell<Material>>>,
    pub shaders: Vec<Rc<Shader>>,
    pub textures: Vec<Rc<Texture>>,
    pub clear_color: Vec3,
    pub wireframe: bool,
    /// Mesh drawn at every enabled point light.
    pub gizmo_mesh: Option<Rc<MeshResource>>,
    view: Mat4,
    projection: Mat4,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            camera: Camera::default(),
            dir_light: DirectionalLight::default(),
            point_lights: Vec::new(),
            objects: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
            shaders: Vec::new(),
            textures: Vec::new(),
            clear_color: vec3(0.1, 0.1, 0.1),
            wireframe: false,
            gizmo_mesh: None,
            view: Mat4::identity(),
            projection: Mat4::identity(),
        }
    }

    /// Scene with the stock meshes, the default material and one shader per shading model.
    pub fn with_builtins() -> Self {
        let mut scene = Self::new();

        let cube = Rc::new(mesh::cube());
        scene.gizmo_mesh = Some(cube.clone());
        scene.add_mesh(cube);
        scene.add_mesh(Rc::new(mesh::sphere(0.5, 36, 18)));
        scene.add_mesh(Rc::new(mesh::plane(10.0)));

        scene.add_material(Material::default());

        for model in ShadingModel::ALL {
            scene.add_shader(Shader::new(model.pipeline_name(), model));
        }

        scene
    }

    pub fn add_mesh(&mut self, mesh: Rc<MeshResource>) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn remove_mesh(&mut self, index: usize) -> Result<Rc<MeshResource>, SceneError> {
        check_index("mesh", index, self.meshes.len())?;
        Ok(self.meshes.remove(index))
    }

    pub fn add_material(&mut self, material: Material) -> Rc<RefCell<Material>> {
        let material = Rc::new(RefCell::new(material));
        self.materials.push(material.clone());
        material
    }

    pub fn remove_material(&mut self, index: usize) -> Result<Rc<RefCell<Material>>, SceneError> {
        check_index("material", index, self.materials.len())?;
        Ok(self.materials.remove(index))
    }

    pub fn add_shader(&mut self, shader: Shader) -> Rc<Shader> {
        let shader = Rc::new(shader);
        self.shaders.push(shader.clone());
        shader
    }

    pub fn remove_shader(&mut self, index: usize) -> Result<Rc<Shader>, SceneError> {
        check_index("shader", index, self.shaders.len())?;
        Ok(self.shaders.remove(index))
    }

    pub fn add_texture(&mut self, texture: Texture) -> Rc<Texture> {
        let texture = Rc::new(texture);
        self.textures.push(texture.clone());
        texture
    }

    pub fn remove_texture(&mut self, index: usize) -> Result<Rc<Texture>, SceneError> {
        check_index("texture", index, self.textures.len())?;
        Ok(self.textures.remove(index))
    }

    pub fn add_point_light(&mut self, light: PointLight) -> Result<usize, SceneError> {
        if self.point_lights.len() >= MAX_POINT_LIGHTS {
            return Err(SceneError::TooManyPointLights);
        }

        self.point_lights.push(light);
        Ok(self.point_lights.len() - 1)
    }

    pub fn remove_point_light(&mut self, index: usize) -> Result<PointLight, SceneError> {
        check_index("point light", index, self.point_lights.len())?;
        Ok(self.point_lights.remove(index))
    }

    pub fn add_object(&mut self, object: Object) -> ObjectId {
        let id = object.id;
        self.objects.push(object);
        id
    }

    /// Removes the object at `index`. Its children move up to its parent.
    pub fn remove_object(&mut self, index: usize) -> Result<Object, SceneError> {
        check_index("object", index, self.objects.len())?;

        let removed = self.objects.remove(index);

        for child in self.objects.iter_mut().filter(|o| o.parent == Some(removed.id)) {
            child.parent = removed.parent;
        }

        debug!("removed object {} ({})", removed.name, removed.id);

        Ok(removed)
    }

    /// Removes `id` together with everything parented below it, returned root first.
    pub fn remove_subtree(&mut self, id: ObjectId) -> Result<Vec<Object>, SceneError> {
        let ids = self.subtree(id)?;
        let mut removed = Vec::with_capacity(ids.len());

        // leaves first, so nothing is left to re-parent
        for id in ids.iter().rev() {
            let index = self.index_of(*id)?;
            removed.push(self.remove_object(index)?);
        }
        removed.reverse();

        Ok(removed)
    }

    /// Copies `source` and its descendants under `parent`. Every copy gets a fresh id.
    pub fn duplicate_subtree(&mut self, source: ObjectId, parent: Option<ObjectId>) -> Result<ObjectId, SceneError> {
        if let Some(parent) = parent {
            self.index_of(parent)?;
        }

        let ids = self.subtree(source)?;
        let copies = ids
            .iter()
            .filter_map(|id| self.object(*id))
            .map(|o| (o.id, Object { id: ObjectId::next(), ..o.clone() }))
            .collect::<Vec<_>>();

        let new_id = |old: Option<ObjectId>| {
            copies.iter().find(|(o, _)| Some(*o) == old).map(|(_, c)| c.id)
        };

        let mut root = source;
        for (old, copy) in &copies {
            let mut copy = copy.clone();
            copy.parent = if *old == source { parent } else { new_id(copy.parent) };
            if *old == source {
                root = copy.id;
            }
            self.add_object(copy);
        }

        Ok(root)
    }

    /// Ids of `id` and all of its descendants, parents before children.
    pub fn subtree(&self, id: ObjectId) -> Result<Vec<ObjectId>, SceneError> {
        self.index_of(id)?;

        let mut ids = vec![id];
        let mut next = 0;
        while next < ids.len() {
            let current = ids[next];
            ids.extend(self.children(Some(current)).map(|o| o.id));
            next += 1;
        }

        Ok(ids)
    }

    pub fn create_object(&mut self, spec: ObjectSpec) -> Result<ObjectId, SceneError> {
        check_index("mesh", spec.mesh, self.meshes.len())?;
        check_index("material", spec.material, self.materials.len())?;
        check_index("shader", spec.shader, self.shaders.len())?;

        if let Some(parent) = spec.parent {
            self.index_of(parent)?;
        }

        let mut object = Object::new(
            spec.name,
            self.meshes[spec.mesh].clone(),
            self.materials[spec.material].clone(),
            self.shaders[spec.shader].clone(),
        );
        object.parent = spec.parent;

        Ok(self.add_object(object))
    }

    pub fn index_of(&self, id: ObjectId) -> Result<usize, SceneError> {
        self.objects
            .iter()
            .position(|o| o.id == id)
            .ok_or(SceneError::UnknownObject(id))
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn children(&self, id: Option<ObjectId>) -> impl Iterator<Item = &Object> {
        self.objects.iter().filter(move |o| o.parent == id)
    }

    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) -> Result<(), SceneError> {
        let child_index = self.index_of(child)?;

        if let Some(parent) = parent {
            self.index_of(parent)?;

            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if current == child {
                    return Err(SceneError::HierarchyCycle { child, parent });
                }
                cursor = self.object(current).and_then(|o| o.parent);
            }
        }

        self.objects[child_index].parent = parent;

        Ok(())
    }

    /// Local matrices multiplied from the root down to `id`.
    pub fn world_matrix(&self, id: ObjectId) -> Result<Mat4, SceneError> {
        let mut object = self.object(id).ok_or(SceneError::UnknownObject(id))?;
        let mut matrix = object.transform.local_matrix();

        // the hierarchy is kept acyclic, the bound only guards against a corrupted one
        for _ in 0..self.objects.len() {
            let Some(parent) = object.parent.and_then(|p| self.object(p)) else {
                break;
            };

            matrix = parent.transform.local_matrix() * matrix;
            object = parent;
        }

        Ok(matrix)
    }

    pub fn find_object_by_name(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn find_mesh_by_name(&self, name: &str) -> Option<&Rc<MeshResource>> {
        self.meshes.iter().find(|m| m.name == name)
    }

    pub fn find_material_by_name(&self, name: &str) -> Option<&Rc<RefCell<Material>>> {
        self.materials.iter().find(|m| m.borrow().name == name)
    }

    pub fn find_shader_by_name(&self, name: &str) -> Option<&Rc<Shader>> {
        self.shaders.iter().find(|s| s.name == name)
    }

    pub fn find_texture_by_name(&self, name: &str) -> Option<&Rc<Texture>> {
        self.textures.iter().find(|t| t.name == name)
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn update(&mut self, aspect: f32) {
        self.view = self.camera.view();
        self.projection = self.camera.projection(aspect);
    }

    pub fn build_frame(&self) -> FramePacket {
        let point_lights = self
            .point_lights
            .iter()
            .filter(|l| l.enabled)
            .take(MAX_POINT_LIGHTS)
            .cloned()
            .collect::<Vec<_>>();

        let uniforms = FrameUniforms {
            view: self.view,
            projection: self.projection,
            camera_position: self.camera.position,
            dir_light: self.dir_light.clone(),
            point_lights,
        };

        let mut draws = Vec::with_capacity(self.objects.len() + uniforms.point_lights.len());

        for object in self.objects.iter().filter(|o| o.visible) {
            let Some(mesh) = &object.mesh else {
                continue;
            };

            let model = match self.world_matrix(object.id) {
                Ok(m) => m,
                Err(_) => continue,
            };

            let textures = TextureKind::ALL.map(|k| object.effective_texture(k));

            let mut material = object.material.borrow().uniforms();
            material.map_mask = textures
                .iter()
                .enumerate()
                .filter(|(_, t)| t.is_some())
                .fold(0, |mask, (slot, _)| mask | (1 << slot));

            draws.push(DrawCall {
                object_id: Some(object.id),
                mesh: mesh.clone(),
                shading: object.shader.model,
                wireframe: self.wireframe || object.wireframe,
                model,
                material,
                textures,
            });
        }

        if let Some(gizmo) = &self.gizmo_mesh {
            for light in &uniforms.point_lights {
                let model = nalgebra_glm::translation(&light.position)
                    * nalgebra_glm::scaling(&Vec3::from_element(GIZMO_SCALE));

                let mut material = Material::new("gizmo").uniforms();
                material.diffuse = light.color();

                draws.push(DrawCall {
                    object_id: None,
                    mesh: gizmo.clone(),
                    shading: ShadingModel::Unlit,
                    wireframe: false,
                    model,
                    material,
                    textures: [None, None, None],
                });
            }
        }

        FramePacket {
            uniforms,
            draws,
            clear_color: [self.clear_color.x, self.clear_color.y, self.clear_color.z, 1.0],
        }
    }

    /// Registers the model's resources and instantiates its node tree under a new root object.
    pub fn add_model(&mut self, model: ImportedModel, shader: Rc<Shader>) -> ObjectId {
        let fallback = self.fallback_material();

        self.textures.extend(model.textures.iter().cloned());
        self.materials.extend(model.materials.iter().cloned());
        for mesh in &model.meshes {
            self.meshes.extend(mesh.primitives.iter().map(|p| p.mesh.clone()));
        }

        let root = self.add_object(Object::empty(model.name.clone(), fallback.clone(), shader.clone()));

        // reversed so pops come out in file order
        let mut stack = model.nodes.iter().rev().map(|n| (n, root)).collect::<Vec<_>>();
        let mut created = 1;

        while let Some((node, parent)) = stack.pop() {
            let id = self.instantiate_node(&model, node, parent, &fallback, &shader, &mut created);
            stack.extend(node.children.iter().rev().map(|c| (c, id)));
        }

        info!("added model {} as {} objects", model.name, created);

        root
    }

    fn instantiate_node(
        &mut self,
        model: &ImportedModel,
        node: &ImportedNode,
        parent: ObjectId,
        fallback: &Rc<RefCell<Material>>,
        shader: &Rc<Shader>,
        created: &mut usize,
    ) -> ObjectId {
        let primitives = node
            .mesh
            .and_then(|m| model.meshes.get(m))
            .map(|m| m.primitives.as_slice())
            .unwrap_or_default();

        let material_of = |index: Option<usize>| {
            index
                .and_then(|i| model.materials.get(i))
                .cloned()
                .unwrap_or_else(|| fallback.clone())
        };

        let mut object = match primitives {
            [single] => Object::new(node.name.clone(), single.mesh.clone(), material_of(single.material), shader.clone()),
            _ => Object::empty(node.name.clone(), fallback.clone(), shader.clone()),
        };
        object.transform = node.transform.clone();
        object.parent = Some(parent);

        let id = self.add_object(object);
        *created += 1;

        if primitives.len() > 1 {
            for (i, primitive) in primitives.iter().enumerate() {
                let mut part = Object::new(
                    format!("{}.{}", node.name, i),
                    primitive.mesh.clone(),
                    material_of(primitive.material),
                    shader.clone(),
                );
                part.parent = Some(id);
                self.add_object(part);
                *created += 1;
            }
        }

        id
    }

    fn fallback_material(&mut self) -> Rc<RefCell<Material>> {
        match self.materials.first() {
            Some(m) => m.clone(),
            None => self.add_material(Material::default()),
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
