use crate::material::Material;
use crate::math;
use crate::mesh::MeshResource;
use crate::shader::Shader;
use crate::texture::{Texture, TextureKind};
use nalgebra_glm::{Mat4, Vec3, vec3};
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

pub static OBJECT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ObjectId(pub u64);

impl ObjectId {
    pub fn next() -> Self {
        Self(OBJECT_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// XYZ euler angles in degrees.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub uniform_scaling: bool,
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            uniform_scaling: false,
        }
    }

    pub fn local_matrix(&self) -> Mat4 {
        math::compose_trs(&self.position, &self.rotation, &self.scale)
    }

    /// With uniform scaling on, the first component that differs from the current
    /// scale is copied to all three axes.
    pub fn set_scale_synced(&mut self, scale: Vec3) {
        if !self.uniform_scaling {
            self.scale = scale;
            return;
        }

        let changed = (0..3).find(|&i| scale[i] != self.scale[i]);

        if let Some(i) = changed {
            self.scale = Vec3::from_element(scale[i]);
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros(), vec3(1.0, 1.0, 1.0))
    }
}

#[derive(Debug, Default, Clone)]
pub struct TextureOverrides {
    pub diffuse: Option<Rc<Texture>>,
    pub specular: Option<Rc<Texture>>,
    pub emission: Option<Rc<Texture>>,
}

impl TextureOverrides {
    pub fn get(&self, kind: TextureKind) -> Option<&Rc<Texture>> {
        match kind {
            TextureKind::Diffuse => self.diffuse.as_ref(),
            TextureKind::Specular => self.specular.as_ref(),
            TextureKind::Emission => self.emission.as_ref(),
        }
    }

    fn slot(&mut self, kind: TextureKind) -> &mut Option<Rc<Texture>> {
        match kind {
            TextureKind::Diffuse => &mut self.diffuse,
            TextureKind::Specular => &mut self.specular,
            TextureKind::Emission => &mut self.emission,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Object {
    pub id: ObjectId,
    pub name: String,
    pub parent: Option<ObjectId>,
    pub transform: Transform,
    pub mesh: Option<Rc<MeshResource>>,
    pub material: Rc<RefCell<Material>>,
    pub shader: Rc<Shader>,
    pub textures: TextureOverrides,
    pub visible: bool,
    pub wireframe: bool,
}

impl Object {
    pub fn new(
        name: impl Into<String>,
        mesh: Rc<MeshResource>,
        material: Rc<RefCell<Material>>,
        shader: Rc<Shader>,
    ) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::empty(name, material, shader)
        }
    }

    /// Object without geometry, used as a grouping node for imported hierarchies.
    pub fn empty(name: impl Into<String>, material: Rc<RefCell<Material>>, shader: Rc<Shader>) -> Self {
        Self {
            id: ObjectId::next(),
            name: name.into(),
            parent: None,
            transform: Transform::default(),
            mesh: None,
            material,
            shader,
            textures: TextureOverrides::default(),
            visible: true,
            wireframe: false,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Replaces one map for this object only; the shared material is untouched.
    pub fn set_texture(&mut self, kind: TextureKind, texture: Option<Rc<Texture>>) {
        *self.textures.slot(kind) = texture;
    }

    /// The texture this object samples for `kind`: its own override first, then the material's.
    pub fn effective_texture(&self, kind: TextureKind) -> Option<Rc<Texture>> {
        self.textures
            .get(kind)
            .cloned()
            .or_else(|| self.material.borrow().map(kind).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh;
    use crate::shader::ShadingModel;
    use nalgebra_glm::vec4;

    fn test_object() -> Object {
        Object::new(
            "obj",
            Rc::new(mesh::cube()),
            Rc::new(RefCell::new(Material::default())),
            Rc::new(Shader::new("phong", ShadingModel::Phong)),
        )
    }

    #[test]
    fn local_matrix_is_trs() {
        let t = Transform::new(vec3(1.0, 0.0, 0.0), vec3(0.0, 0.0, 90.0), vec3(2.0, 2.0, 2.0));
        let p = t.local_matrix() * vec4(1.0, 0.0, 0.0, 1.0);

        // scaled to x=2, rotated onto +Y, then moved by +X
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn synced_scale_copies_changed_axis() {
        let mut t = Transform::default();
        t.uniform_scaling = true;

        t.set_scale_synced(vec3(1.0, 3.0, 1.0));
        assert_eq!(t.scale, vec3(3.0, 3.0, 3.0));

        t.set_scale_synced(vec3(3.0, 3.0, 0.5));
        assert_eq!(t.scale, vec3(0.5, 0.5, 0.5));

        t.set_scale_synced(vec3(0.5, 0.5, 0.5));
        assert_eq!(t.scale, vec3(0.5, 0.5, 0.5));
    }

    #[test]
    fn free_scale_is_taken_as_is() {
        let mut t = Transform::default();
        t.set_scale_synced(vec3(1.0, 2.0, 3.0));
        assert_eq!(t.scale, vec3(1.0, 2.0, 3.0));
    }

    #[test]
    fn override_shadows_material_map() {
        let mut obj = test_object();
        let shared = Rc::new(Texture::solid("shared", [1; 4]));
        let own = Rc::new(Texture::solid("own", [2; 4]));

        obj.material.borrow_mut().set_map(TextureKind::Diffuse, Some(shared.clone()));
        assert_eq!(obj.effective_texture(TextureKind::Diffuse).unwrap().id, shared.id);

        obj.set_texture(TextureKind::Diffuse, Some(own.clone()));
        assert_eq!(obj.effective_texture(TextureKind::Diffuse).unwrap().id, own.id);
        assert_eq!(obj.material.borrow().map(TextureKind::Diffuse).unwrap().id, shared.id);

        obj.set_texture(TextureKind::Diffuse, None);
        assert_eq!(obj.effective_texture(TextureKind::Diffuse).unwrap().id, shared.id);
        assert!(obj.effective_texture(TextureKind::Specular).is_none());
    }

    #[test]
    fn new_objects_are_visible_and_unique() {
        let a = test_object();
        let b = test_object();

        assert!(a.visible);
        assert!(!a.wireframe);
        assert_ne!(a.id, b.id);
    }
}
