use crate::material::Material;
use crate::math;
use crate::mesh::{Indices, MeshResource};
use crate::object::Transform;
use crate::texture::{Filter, SamplerDesc, Texture, TextureError, Wrap};
use crate::vulkan::Vertex;
use gltf::image::Format;
use gltf::mesh::Mode;
use gltf::mesh::util::ReadIndices;
use gltf::texture::{MagFilter, MinFilter, WrappingMode};
use log::{info, warn};
use nalgebra::{Quaternion, UnitQuaternion};
use nalgebra_glm::{Vec2, Vec3, vec3};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error("model {0} contains no triangle geometry")]
    Empty(String),
}

pub struct ImportedPrimitive {
    pub mesh: Rc<MeshResource>,
    /// Index into `ImportedModel::materials`.
    pub material: Option<usize>,
}

pub struct ImportedMesh {
    pub name: String,
    pub primitives: Vec<ImportedPrimitive>,
}

pub struct ImportedNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<usize>,
    pub children: Vec<ImportedNode>,
}

pub struct ImportedModel {
    pub name: String,
    pub meshes: Vec<ImportedMesh>,
    pub materials: Vec<Rc<RefCell<Material>>>,
    pub textures: Vec<Rc<Texture>>,
    pub nodes: Vec<ImportedNode>,
}

pub fn import_model(path: impl AsRef<Path>) -> Result<ImportedModel, ImportError> {
    let path = path.as_ref();
    let start = Instant::now();

    let (document, buffers, images) = gltf::import(path)?;

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_owned());

    let model = build_model(name, &document, &buffers, &images)?;

    info!(
        "imported {} ({} meshes, {} materials, {} textures) in {} s",
        path.display(),
        model.meshes.len(),
        model.materials.len(),
        model.textures.len(),
        start.elapsed().as_secs_f32()
    );

    Ok(model)
}

pub fn import_slice(name: impl Into<String>, bytes: &[u8]) -> Result<ImportedModel, ImportError> {
    let (document, buffers, images) = gltf::import_slice(bytes)?;

    build_model(name.into(), &document, &buffers, &images)
}

fn build_model(
    name: String,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> Result<ImportedModel, ImportError> {
    let mut textures = TextureCache::new(name.clone(), images);

    let materials = document
        .materials()
        .map(|m| Rc::new(RefCell::new(convert_material(&m, &mut textures))))
        .collect::<Vec<_>>();

    let meshes = document
        .meshes()
        .map(|m| extract_mesh(&m, buffers))
        .collect::<Vec<_>>();

    if meshes.iter().all(|m| m.primitives.is_empty()) {
        return Err(ImportError::Empty(name));
    }

    let roots = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().collect::<Vec<_>>(),
        None => {
            let children = document
                .nodes()
                .flat_map(|n| n.children().map(|c| c.index()).collect::<Vec<_>>())
                .collect::<HashSet<_>>();

            document.nodes().filter(|n| !children.contains(&n.index())).collect()
        }
    };

    let nodes = roots.iter().map(convert_node).collect();

    Ok(ImportedModel {
        name,
        meshes,
        materials,
        textures: textures.into_textures(),
        nodes,
    })
}

fn convert_node(node: &gltf::Node) -> ImportedNode {
    let (translation, rotation, scale) = node.transform().decomposed();

    let quat = UnitQuaternion::from_quaternion(Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]));
    let (roll, pitch, yaw) = quat.euler_angles();

    let transform = Transform::new(
        Vec3::from(translation),
        vec3(math::rad_to_deg(roll), math::rad_to_deg(pitch), math::rad_to_deg(yaw)),
        Vec3::from(scale),
    );

    ImportedNode {
        name: node
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("node{}", node.index())),
        transform,
        mesh: node.mesh().map(|m| m.index()),
        children: node.children().map(|c| convert_node(&c)).collect(),
    }
}

fn extract_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> ImportedMesh {
    let mesh_name = mesh
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("mesh{}", mesh.index()));

    let mut primitives = Vec::new();

    for (i, primitive) in mesh.primitives().enumerate() {
        if primitive.mode() != Mode::Triangles {
            warn!("{mesh_name}: skipping primitive {i} with mode {:?}", primitive.mode());
            continue;
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

        let Some(positions) = reader.read_positions() else {
            warn!("{mesh_name}: skipping primitive {i} without positions");
            continue;
        };

        let mut vertices = positions
            .map(|p| Vertex {
                pos: Vec3::from(p),
                ..Default::default()
            })
            .collect::<Vec<_>>();

        if let Some(normals) = reader.read_normals() {
            for (v, n) in vertices.iter_mut().zip(normals) {
                v.normal = Vec3::from(n);
            }
        }

        if let Some(uvs) = reader.read_tex_coords(0) {
            for (v, uv) in vertices.iter_mut().zip(uvs.into_f32()) {
                v.uv = Vec2::from(uv);
            }
        }

        let indices = reader.read_indices().map(|i| match i {
            ReadIndices::U8(i) => Indices::U16(i.map(|v| v as u16).collect()),
            ReadIndices::U16(i) => Indices::U16(i.collect()),
            ReadIndices::U32(i) => Indices::U32(i.collect()),
        });

        let name = if mesh.primitives().len() > 1 {
            format!("{mesh_name}.{i}")
        } else {
            mesh_name.clone()
        };

        primitives.push(ImportedPrimitive {
            mesh: Rc::new(MeshResource::new(name, vertices, indices)),
            material: primitive.material().index(),
        });
    }

    ImportedMesh {
        name: mesh_name,
        primitives,
    }
}

/// Blinn-Phong exponent roughly matching a GGX roughness.
pub fn roughness_to_shininess(roughness: f32) -> f32 {
    let r = roughness.clamp(0.0, 1.0);
    (2.0 / r.powi(4) - 2.0).clamp(1.0, 256.0)
}

fn convert_material(material: &gltf::Material, textures: &mut TextureCache) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    let roughness = pbr.roughness_factor();

    let name = material
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("material{}", material.index().unwrap_or_default()));

    let mut out = Material::colored(
        name,
        vec3(r, g, b),
        vec3(r, g, b),
        Vec3::from_element(0.5 * (1.0 - roughness)),
        roughness_to_shininess(roughness),
    );

    out.diffuse_map = pbr.base_color_texture().and_then(|t| textures.get(&t.texture()));
    out.specular_map = pbr.metallic_roughness_texture().and_then(|t| textures.get(&t.texture()));
    out.emission_map = material.emissive_texture().and_then(|t| textures.get(&t.texture()));

    out
}

/// glTF leaves both filters optional, linear is used when unset.
pub fn sampler_desc(sampler: &gltf::texture::Sampler) -> SamplerDesc {
    let wrap = match sampler.wrap_s() {
        WrappingMode::Repeat => Wrap::Repeat,
        WrappingMode::ClampToEdge => Wrap::ClampToEdge,
        WrappingMode::MirroredRepeat => Wrap::MirroredRepeat,
    };

    let min = match sampler.min_filter() {
        Some(MinFilter::Nearest | MinFilter::NearestMipmapNearest | MinFilter::NearestMipmapLinear) => Filter::Nearest,
        _ => Filter::Linear,
    };

    let mag = match sampler.mag_filter() {
        Some(MagFilter::Nearest) => Filter::Nearest,
        _ => Filter::Linear,
    };

    SamplerDesc { wrap, min, mag }
}

/// Converts each glTF texture at most once, however many materials use it.
struct TextureCache<'a> {
    model: String,
    images: &'a [gltf::image::Data],
    loaded: HashMap<usize, Option<Rc<Texture>>>,
    order: Vec<Rc<Texture>>,
}

impl<'a> TextureCache<'a> {
    fn new(model: String, images: &'a [gltf::image::Data]) -> Self {
        Self {
            model,
            images,
            loaded: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn get(&mut self, texture: &gltf::Texture) -> Option<Rc<Texture>> {
        let index = texture.index();
        if let Some(cached) = self.loaded.get(&index) {
            return cached.clone();
        }

        let converted = self.convert(texture);
        if let Some(t) = &converted {
            self.order.push(t.clone());
        }
        self.loaded.insert(index, converted.clone());

        converted
    }

    fn convert(&self, texture: &gltf::Texture) -> Option<Rc<Texture>> {
        let index = texture.index();
        let image = texture.source().index();
        let data = self.images.get(image)?;

        let Some(pixels) = to_rgba8(data) else {
            warn!("{}: image {image} has unsupported format {:?}", self.model, data.format);
            return None;
        };

        match Texture::from_rgba(format!("{}#{index}", self.model), data.width, data.height, pixels) {
            Ok(t) => Some(Rc::new(t.with_sampler(sampler_desc(&texture.sampler())))),
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }

    fn into_textures(self) -> Vec<Rc<Texture>> {
        self.order
    }
}

pub fn to_rgba8(data: &gltf::image::Data) -> Option<Vec<u8>> {
    let px = &data.pixels;

    let out = match data.format {
        Format::R8G8B8A8 => px.clone(),
        Format::R8G8B8 => px.chunks_exact(3).flat_map(|c| [c[0], c[1], c[2], 255]).collect(),
        Format::R8G8 => px.chunks_exact(2).flat_map(|c| [c[0], c[1], 0, 255]).collect(),
        Format::R8 => px.iter().flat_map(|&c| [c, c, c, 255]).collect(),
        // 16 bit channels are little endian, keep the high byte
        Format::R16G16B16A16 => px.chunks_exact(8).flat_map(|c| [c[1], c[3], c[5], c[7]]).collect(),
        Format::R16G16B16 => px.chunks_exact(6).flat_map(|c| [c[1], c[3], c[5], 255]).collect(),
        Format::R16G16 => px.chunks_exact(4).flat_map(|c| [c[1], c[3], 0, 255]).collect(),
        Format::R16 => px.chunks_exact(2).flat_map(|c| [c[1], c[1], c[1], 255]).collect(),
        Format::R32G32B32FLOAT | Format::R32G32B32A32FLOAT => {
            let channels = if data.format == Format::R32G32B32FLOAT { 3 } else { 4 };

            px.chunks_exact(4 * channels)
                .flat_map(|c| {
                    let f = |i: usize| {
                        let v = f32::from_le_bytes([c[4 * i], c[4 * i + 1], c[4 * i + 2], c[4 * i + 3]]);
                        (v.clamp(0.0, 1.0) * 255.0).round() as u8
                    };
                    [f(0), f(1), f(2), if channels == 4 { f(3) } else { 255 }]
                })
                .collect()
        }
    };

    Some(out)
}

/// Binary glTF files assembled in memory.
#[cfg(test)]
pub(crate) mod fixtures {
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    const TRIANGLE: &str = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [
            {"name": "tri", "mesh": 0, "translation": [1.0, 2.0, 3.0], "children": [1]},
            {"name": "child", "mesh": 0, "scale": [2.0, 2.0, 2.0]}
        ],
        "meshes": [{"name": "tri", "primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "material": 0}]}],
        "materials": [{"name": "rough", "pbrMetallicRoughness": {"baseColorFactor": [1.0, 0.0, 0.0, 1.0], "roughnessFactor": 1.0}}],
        "buffers": [{"byteLength": 42}],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 6}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
            {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
        ]
    }"#;

    fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], mut data: Vec<u8>, pad: u8) {
        while data.len() % 4 != 0 {
            data.push(pad);
        }
        out.extend((data.len() as u32).to_le_bytes());
        out.extend(kind);
        out.extend(data);
    }

    pub fn glb(json: &str, bin: Vec<u8>) -> Vec<u8> {
        let mut chunks = Vec::new();
        chunk(&mut chunks, b"JSON", json.as_bytes().to_vec(), b' ');
        chunk(&mut chunks, b"BIN\0", bin, 0);

        let mut glb = Vec::new();
        glb.extend(b"glTF");
        glb.extend(2u32.to_le_bytes());
        glb.extend((12 + chunks.len() as u32).to_le_bytes());
        glb.extend(chunks);
        glb
    }

    /// Three vertices followed by three u16 indices, 42 bytes.
    fn triangle_bin() -> Vec<u8> {
        let mut bin = Vec::new();
        for f in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend(f.to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            bin.extend(i.to_le_bytes());
        }
        bin
    }

    fn png(rgba: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(1, 1, Rgba(rgba));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    pub fn triangle_glb() -> Vec<u8> {
        glb(TRIANGLE, triangle_bin())
    }

    /// Triangle with two embedded 1x1 images: red (texture 0, clamped and nearest) and
    /// green (texture 1). Material "painted" uses red for base colour and emission and
    /// green for metallic-roughness, "reuse" uses red again.
    pub fn textured_glb() -> Vec<u8> {
        let red = png([255, 0, 0, 255]);
        let green = png([0, 255, 0, 255]);

        let mut bin = triangle_bin();
        bin.extend([0, 0]);
        let red_offset = bin.len();
        bin.extend(&red);
        let green_offset = bin.len();
        bin.extend(&green);

        let json = format!(
            r#"{{
            "asset": {{"version": "2.0"}},
            "scene": 0,
            "scenes": [{{"nodes": [0, 1]}}],
            "nodes": [
                {{"name": "painted", "mesh": 0}},
                {{"name": "reused", "mesh": 1}}
            ],
            "meshes": [
                {{"name": "a", "primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1, "material": 0}}]}},
                {{"name": "b", "primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1, "material": 1}}]}}
            ],
            "materials": [
                {{
                    "name": "painted",
                    "pbrMetallicRoughness": {{"baseColorTexture": {{"index": 0}}, "metallicRoughnessTexture": {{"index": 1}}}},
                    "emissiveTexture": {{"index": 0}}
                }},
                {{"name": "reuse", "pbrMetallicRoughness": {{"baseColorTexture": {{"index": 0}}}}}}
            ],
            "samplers": [{{"magFilter": 9728, "minFilter": 9728, "wrapS": 33071, "wrapT": 33071}}],
            "textures": [{{"source": 0, "sampler": 0}}, {{"source": 1}}],
            "images": [
                {{"bufferView": 2, "mimeType": "image/png"}},
                {{"bufferView": 3, "mimeType": "image/png"}}
            ],
            "buffers": [{{"byteLength": {total}}}],
            "bufferViews": [
                {{"buffer": 0, "byteOffset": 0, "byteLength": 36}},
                {{"buffer": 0, "byteOffset": 36, "byteLength": 6}},
                {{"buffer": 0, "byteOffset": {red_offset}, "byteLength": {red_len}}},
                {{"buffer": 0, "byteOffset": {green_offset}, "byteLength": {green_len}}}
            ],
            "accessors": [
                {{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}},
                {{"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}}
            ]
        }}"#,
            total = bin.len(),
            red_len = red.len(),
            green_len = green.len(),
        );

        glb(&json, bin)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{textured_glb, triangle_glb};
    use super::*;
    use crate::material::{MAP_DIFFUSE, MAP_EMISSION, MAP_SPECULAR};

    #[test]
    fn glb_triangle_imports() {
        let model = import_slice("tri", &triangle_glb()).unwrap();

        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0].primitives[0].mesh;
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.draw_count(), 3);
        assert_eq!(mesh.indices, Some(Indices::U16(vec![0, 1, 2])));
        assert_eq!(mesh.vertices[1].pos, vec3(1.0, 0.0, 0.0));
        assert_eq!(mesh.vertices[1].normal, Vec3::zeros());
        assert_eq!(model.meshes[0].primitives[0].material, Some(0));
    }

    #[test]
    fn material_maps_roughness() {
        let model = import_slice("tri", &triangle_glb()).unwrap();
        let material = model.materials[0].borrow();

        assert_eq!(material.name, "rough");
        assert_eq!(material.diffuse, vec3(1.0, 0.0, 0.0));
        assert_eq!(material.ambient, material.diffuse);
        assert_eq!(material.specular, Vec3::zeros());
        assert_eq!(material.shininess(), 1.0);
        assert!(material.diffuse_map.is_none());
    }

    #[test]
    fn node_tree_is_kept() {
        let model = import_slice("tri", &triangle_glb()).unwrap();

        assert_eq!(model.nodes.len(), 1);
        let root = &model.nodes[0];
        assert_eq!(root.name, "tri");
        assert_eq!(root.transform.position, vec3(1.0, 2.0, 3.0));
        assert_eq!(root.mesh, Some(0));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].transform.scale, vec3(2.0, 2.0, 2.0));
        assert_eq!(root.children[0].transform.rotation, Vec3::zeros());
    }

    #[test]
    fn shininess_curve() {
        assert_eq!(roughness_to_shininess(0.0), 256.0);
        assert_eq!(roughness_to_shininess(1.0), 1.0);
        assert!((roughness_to_shininess(0.5) - 30.0).abs() < 1e-4);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(import_slice("junk", b"nope"), Err(ImportError::Gltf(_))));
    }

    #[test]
    fn rgb_expands_to_rgba() {
        let data = gltf::image::Data {
            pixels: vec![1, 2, 3, 4, 5, 6],
            format: Format::R8G8B8,
            width: 2,
            height: 1,
        };

        assert_eq!(to_rgba8(&data).unwrap(), vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn textures_map_to_slots_and_load_once() {
        let model = import_slice("tex", &textured_glb()).unwrap();

        assert_eq!(model.textures.len(), 2);

        let painted = model.materials[0].borrow();
        let diffuse = painted.diffuse_map.clone().unwrap();
        let specular = painted.specular_map.clone().unwrap();
        let emission = painted.emission_map.clone().unwrap();

        assert!(Rc::ptr_eq(&diffuse, &emission));
        assert!(!Rc::ptr_eq(&diffuse, &specular));
        assert_eq!(specular.name, "tex#1");
        assert_eq!(diffuse.pixels, vec![255, 0, 0, 255]);
        assert_eq!(specular.pixels, vec![0, 255, 0, 255]);
        assert_eq!(painted.map_mask(), MAP_DIFFUSE | MAP_SPECULAR | MAP_EMISSION);

        let reuse = model.materials[1].borrow();
        assert!(Rc::ptr_eq(reuse.diffuse_map.as_ref().unwrap(), &diffuse));
        assert!(reuse.specular_map.is_none());
    }

    #[test]
    fn samplers_follow_the_texture() {
        let model = import_slice("tex", &textured_glb()).unwrap();
        let painted = model.materials[0].borrow();

        assert_eq!(
            painted.diffuse_map.as_ref().unwrap().sampler,
            SamplerDesc {
                wrap: Wrap::ClampToEdge,
                min: Filter::Nearest,
                mag: Filter::Nearest,
            }
        );
        assert_eq!(painted.specular_map.as_ref().unwrap().sampler, SamplerDesc::default());
    }
}
