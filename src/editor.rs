use crate::camera::{MAX_FOV, MIN_FOV};
use crate::material::{MAX_SHININESS, MIN_SHININESS};
use crate::object::{Object, ObjectId};
use crate::scene::{EditorCommand, MaterialEdit, ObjectSpec, PointLightEdit, Scene};
use crate::texture::{Texture, TextureKind};
use imgui::{Condition, SliderFlags, TreeNodeFlags, Ui};
use nalgebra_glm::Vec3;
use std::borrow::Cow;
use std::path::PathBuf;
use std::rc::Rc;

const NONE_LABEL: &str = "None";

/// Per-axis limits of the transform drags, in degrees for rotation.
const ROTATION_RANGE: (f32, f32) = (-180.0, 180.0);
const SCALE_RANGE: (f32, f32) = (0.1, 10.0);

struct NewObject {
    name: String,
    mesh: usize,
    material: usize,
    shader: usize,
    /// Combo index, 0 means no parent.
    parent: usize,
}

impl Default for NewObject {
    fn default() -> Self {
        Self {
            name: "Object".to_owned(),
            mesh: 0,
            material: 0,
            shader: 0,
            parent: 0,
        }
    }
}

/// Debug panel state. Drawing never touches the scene, edits come back as commands.
pub struct Editor {
    pub cursor_captured: bool,
    import_path: String,
    new_object: NewObject,
}

impl Editor {
    pub fn new() -> Self {
        Self {
            cursor_captured: false,
            import_path: String::new(),
            new_object: NewObject::default(),
        }
    }

    pub fn draw(&mut self, ui: &Ui, scene: &Scene) -> Vec<EditorCommand> {
        let mut commands = Vec::new();

        ui.window("glint")
            .position([10.0, 10.0], Condition::FirstUseEver)
            .size([380.0, 640.0], Condition::FirstUseEver)
            .menu_bar(true)
            .collapsed(self.cursor_captured, Condition::Always)
            .build(|| {
                self.menu_bar(ui, &mut commands);

                if self.cursor_captured {
                    return;
                }

                ui.text("Right click toggles mouse look");

                if ui.collapsing_header("Camera", TreeNodeFlags::DEFAULT_OPEN) {
                    camera_section(ui, scene, &mut commands);
                }
                if ui.collapsing_header("Lights", TreeNodeFlags::empty()) {
                    lights_section(ui, scene, &mut commands);
                }
                if ui.collapsing_header("Scene", TreeNodeFlags::DEFAULT_OPEN) {
                    self.scene_section(ui, scene, &mut commands);
                }
                if ui.collapsing_header("Materials", TreeNodeFlags::empty()) {
                    materials_section(ui, scene, &mut commands);
                }
            });

        commands
    }

    fn menu_bar(&mut self, ui: &Ui, commands: &mut Vec<EditorCommand>) {
        let Some(_bar) = ui.begin_menu_bar() else {
            return;
        };

        if let Some(_menu) = ui.begin_menu("File") {
            ui.input_text("Path", &mut self.import_path).build();

            if ui.menu_item("Import") {
                let path = self.import_path.trim();
                if !path.is_empty() {
                    commands.push(EditorCommand::ImportModel(PathBuf::from(path)));
                }
            }
        }
    }

    fn scene_section(&mut self, ui: &Ui, scene: &Scene, commands: &mut Vec<EditorCommand>) {
        let mut wireframe = scene.wireframe;
        if ui.checkbox("Wireframe", &mut wireframe) {
            commands.push(EditorCommand::SetWireframe(wireframe));
        }

        if let Some(color) = color_vec3(ui, "Clear color", &scene.clear_color) {
            commands.push(EditorCommand::SetClearColor(color));
        }

        ui.separator();

        for object in scene.children(None) {
            draw_object(ui, scene, object, commands);
        }

        ui.separator();
        self.new_object_form(ui, scene, commands);
    }

    fn new_object_form(&mut self, ui: &Ui, scene: &Scene, commands: &mut Vec<EditorCommand>) {
        let form = &mut self.new_object;

        let meshes = names(scene.meshes.iter().map(|m| m.name.as_str()));
        let materials = names(scene.materials.iter().map(|m| m.borrow().name.clone()));
        let shaders = names(scene.shaders.iter().map(|s| s.name.as_str()));
        let parents = with_none(scene.objects.iter().map(|o| o.name.as_str()));

        form.mesh = clamp_index(form.mesh, meshes.len());
        form.material = clamp_index(form.material, materials.len());
        form.shader = clamp_index(form.shader, shaders.len());
        form.parent = clamp_index(form.parent, parents.len());

        let _id = ui.push_id("new object");

        ui.input_text("Name", &mut form.name).build();
        ui.combo("Mesh", &mut form.mesh, &meshes, label);
        ui.combo("Material", &mut form.material, &materials, label);
        ui.combo("Shader", &mut form.shader, &shaders, label);
        ui.combo("Parent", &mut form.parent, &parents, label);

        let ready = !meshes.is_empty() && !materials.is_empty() && !shaders.is_empty();

        if ui.button("Add object") && ready {
            let parent = combo_to_option(form.parent).and_then(|i| scene.objects.get(i)).map(|o| o.id);

            commands.push(EditorCommand::CreateObject(ObjectSpec {
                name: form.name.clone(),
                mesh: form.mesh,
                material: form.material,
                shader: form.shader,
                parent,
            }));
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

fn camera_section(ui: &Ui, scene: &Scene, commands: &mut Vec<EditorCommand>) {
    let camera = &scene.camera;

    let mut speed = camera.speed;
    if ui.slider("Speed", 0.1, 100.0, &mut speed) {
        commands.push(EditorCommand::SetCameraSpeed(speed));
    }

    let mut sensitivity = camera.sensitivity;
    if ui.slider("Sensitivity", 0.001, 5.0, &mut sensitivity) {
        commands.push(EditorCommand::SetCameraSensitivity(sensitivity));
    }

    let mut fov = camera.fov;
    if ui.slider("FOV", MIN_FOV, MAX_FOV, &mut fov) {
        commands.push(EditorCommand::SetCameraFov(fov));
    }

    let p = camera.position;
    ui.text(format!("Position {:.2} {:.2} {:.2}", p.x, p.y, p.z));
}

fn lights_section(ui: &Ui, scene: &Scene, commands: &mut Vec<EditorCommand>) {
    if let Some(_node) = ui.tree_node("Directional light") {
        let light = &scene.dir_light;

        if let Some(direction) = drag_vec3(ui, "Direction", &light.direction, 0.01) {
            commands.push(EditorCommand::SetLightDirection(direction));
        }
        if let Some(color) = color_vec3(ui, "Color", &light.color()) {
            commands.push(EditorCommand::SetLightColor(color));
        }

        let mut intensity = light.intensity();
        if ui.slider("Intensity", 0.0, 10.0, &mut intensity) {
            commands.push(EditorCommand::SetLightIntensity(intensity));
        }
    }

    for (i, light) in scene.point_lights.iter().enumerate() {
        let _id = ui.push_id_usize(i);

        let Some(_node) = ui.tree_node(&light.name) else {
            continue;
        };

        let mut edit = |e: PointLightEdit| commands.push(EditorCommand::EditPointLight(i, e));

        let mut enabled = light.enabled;
        if ui.checkbox("Enabled", &mut enabled) {
            edit(PointLightEdit::Enabled(enabled));
        }
        if let Some(position) = drag_vec3(ui, "Position", &light.position, 0.05) {
            edit(PointLightEdit::Position(position));
        }
        if let Some(color) = color_vec3(ui, "Color", &light.color()) {
            edit(PointLightEdit::Color(color));
        }

        let mut intensity = light.intensity();
        if ui.slider("Intensity", 0.0, 10.0, &mut intensity) {
            edit(PointLightEdit::Intensity(intensity));
        }

        let mut attenuation = [light.constant, light.linear, light.quadratic];
        if imgui::Drag::new("Attenuation")
            .speed(0.001)
            .range(0.0, 10.0)
            .build_array(ui, &mut attenuation)
        {
            let [constant, linear, quadratic] = attenuation;
            edit(PointLightEdit::Attenuation {
                constant,
                linear,
                quadratic,
            });
        }

        if ui.button("Remove") {
            commands.push(EditorCommand::RemovePointLight(i));
        }
    }

    if ui.button("Add point light") {
        commands.push(EditorCommand::AddPointLight);
    }
}

fn draw_object(ui: &Ui, scene: &Scene, object: &Object, commands: &mut Vec<EditorCommand>) {
    let _id = ui.push_id_usize(object.id.0 as usize);

    let Some(_node) = ui.tree_node(&object.name) else {
        return;
    };

    let id = object.id;
    let transform = &object.transform;

    if let Some(position) = drag_vec3(ui, "Position", &transform.position, 0.05) {
        commands.push(EditorCommand::SetPosition(id, position));
    }
    if let Some(rotation) = drag_clamped(ui, "Rotation", &transform.rotation, 0.5, ROTATION_RANGE) {
        commands.push(EditorCommand::SetRotation(id, rotation));
    }
    if let Some(scale) = drag_clamped(ui, "Scale", &transform.scale, 0.01, SCALE_RANGE) {
        commands.push(EditorCommand::SetScale(id, scale));
    }

    let mut uniform = transform.uniform_scaling;
    if ui.checkbox("Uniform scale", &mut uniform) {
        commands.push(EditorCommand::SetUniformScaling(id, uniform));
    }

    let shaders = names(scene.shaders.iter().map(|s| s.name.as_str()));
    let mut shader = position_of(&scene.shaders, &object.shader).unwrap_or(0);
    if ui.combo("Shader", &mut shader, &shaders, label) {
        commands.push(EditorCommand::SetObjectShader(id, shader));
    }

    let materials = names(scene.materials.iter().map(|m| m.borrow().name.clone()));
    let mut material = position_of(&scene.materials, &object.material).unwrap_or(0);
    if ui.combo("Material", &mut material, &materials, label) {
        commands.push(EditorCommand::SetObjectMaterial(id, material));
    }

    let parents = with_none(scene.objects.iter().filter(|o| o.id != id).map(|o| o.name.as_str()));
    let others: Vec<ObjectId> = scene.objects.iter().filter(|o| o.id != id).map(|o| o.id).collect();
    let mut parent = option_to_combo(object.parent.and_then(|p| others.iter().position(|&o| o == p)));
    if ui.combo("Parent", &mut parent, &parents, label) {
        let parent = combo_to_option(parent).and_then(|i| others.get(i).copied());
        commands.push(EditorCommand::SetParent(id, parent));
    }

    if object.mesh.is_some() {
        if let Some(_textures) = ui.tree_node("Texture overrides") {
            for kind in TextureKind::ALL {
                if let Some(texture) = texture_combo(ui, kind.label(), &scene.textures, object.textures.get(kind)) {
                    commands.push(EditorCommand::SetObjectTexture(id, kind, texture));
                }
            }
        }
    }

    let mut visible = object.visible;
    if ui.checkbox("Visible", &mut visible) {
        commands.push(EditorCommand::SetVisible(id, visible));
    }

    let mut wireframe = object.wireframe;
    ui.same_line();
    if ui.checkbox("Wireframe", &mut wireframe) {
        commands.push(EditorCommand::SetObjectWireframe(id, wireframe));
    }

    if ui.button("Remove") {
        commands.push(EditorCommand::RemoveObject(id));
    }

    for child in scene.children(Some(id)) {
        draw_object(ui, scene, child, commands);
    }
}

fn materials_section(ui: &Ui, scene: &Scene, commands: &mut Vec<EditorCommand>) {
    for (i, material) in scene.materials.iter().enumerate() {
        let material = material.borrow();
        let _id = ui.push_id_usize(i);

        let Some(_node) = ui.tree_node(&material.name) else {
            continue;
        };

        let mut edit = |e: MaterialEdit| commands.push(EditorCommand::EditMaterial(i, e));

        if let Some(c) = color_vec3(ui, "Ambient", &material.ambient) {
            edit(MaterialEdit::Ambient(c));
        }
        if let Some(c) = color_vec3(ui, "Diffuse", &material.diffuse) {
            edit(MaterialEdit::Diffuse(c));
        }
        if let Some(c) = color_vec3(ui, "Specular", &material.specular) {
            edit(MaterialEdit::Specular(c));
        }

        let mut shininess = material.shininess();
        if ui.slider("Shininess", MIN_SHININESS, MAX_SHININESS, &mut shininess) {
            edit(MaterialEdit::Shininess(shininess));
        }

        for kind in TextureKind::ALL {
            if let Some(texture) = texture_combo(ui, kind.label(), &scene.textures, material.map(kind)) {
                edit(MaterialEdit::Map(kind, texture));
            }
        }
    }
}

/// Returns the new selection when the combo changed, `Some(None)` when cleared.
fn texture_combo(
    ui: &Ui,
    title: &str,
    textures: &[Rc<Texture>],
    current: Option<&Rc<Texture>>,
) -> Option<Option<usize>> {
    let items = with_none(textures.iter().map(|t| t.name.as_str()));
    let mut index = option_to_combo(current.and_then(|c| position_of(textures, c)));

    ui.combo(title, &mut index, &items, label).then(|| combo_to_option(index))
}

fn drag_vec3(ui: &Ui, title: &str, value: &Vec3, speed: f32) -> Option<Vec3> {
    let mut array = to_array(value);

    imgui::Drag::new(title)
        .speed(speed)
        .build_array(ui, &mut array)
        .then(|| Vec3::from(array))
}

fn drag_clamped(ui: &Ui, title: &str, value: &Vec3, speed: f32, (min, max): (f32, f32)) -> Option<Vec3> {
    let mut array = to_array(value);

    imgui::Drag::new(title)
        .speed(speed)
        .range(min, max)
        .flags(SliderFlags::ALWAYS_CLAMP)
        .build_array(ui, &mut array)
        .then(|| clamp_vec3(Vec3::from(array), (min, max)))
}

fn clamp_vec3(v: Vec3, (min, max): (f32, f32)) -> Vec3 {
    v.map(|x| x.clamp(min, max))
}

fn color_vec3(ui: &Ui, title: &str, value: &Vec3) -> Option<Vec3> {
    let mut array = to_array(value);

    ui.color_edit3(title, &mut array).then(|| Vec3::from(array))
}

fn to_array(v: &Vec3) -> [f32; 3] {
    [v.x, v.y, v.z]
}

fn label(s: &String) -> Cow<'_, str> {
    Cow::from(s.as_str())
}

fn names<S: Into<String>>(items: impl Iterator<Item = S>) -> Vec<String> {
    items.map(Into::into).collect()
}

fn with_none<S: Into<String>>(items: impl Iterator<Item = S>) -> Vec<String> {
    std::iter::once(NONE_LABEL.to_owned()).chain(items.map(Into::into)).collect()
}

fn position_of<T: ?Sized>(list: &[Rc<T>], item: &Rc<T>) -> Option<usize> {
    list.iter().position(|x| Rc::ptr_eq(x, item))
}

fn option_to_combo(index: Option<usize>) -> usize {
    index.map_or(0, |i| i + 1)
}

fn combo_to_option(index: usize) -> Option<usize> {
    index.checked_sub(1)
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm::vec3;

    #[test]
    fn none_entry_shifts_combo_indices() {
        assert_eq!(option_to_combo(None), 0);
        assert_eq!(option_to_combo(Some(2)), 3);
        assert_eq!(combo_to_option(0), None);
        assert_eq!(combo_to_option(3), Some(2));

        let items = with_none(["a", "b"].into_iter());
        assert_eq!(items, vec!["None", "a", "b"]);
    }

    #[test]
    fn position_compares_by_identity() {
        let a = Rc::new(Texture::solid("same", [0; 4]));
        let b = Rc::new(Texture::solid("same", [0; 4]));
        let list = vec![a.clone(), b.clone()];

        assert_eq!(position_of(&list, &b), Some(1));
        assert_eq!(position_of(&list[..1], &b), None);
    }

    #[test]
    fn stale_selection_is_clamped() {
        assert_eq!(clamp_index(5, 3), 2);
        assert_eq!(clamp_index(1, 3), 1);
        assert_eq!(clamp_index(4, 0), 0);
    }

    #[test]
    fn transform_drags_are_limited() {
        assert_eq!(clamp_vec3(vec3(-270.0, 90.0, 400.0), ROTATION_RANGE), vec3(-180.0, 90.0, 180.0));
        assert_eq!(clamp_vec3(vec3(0.0, 1.0, 50.0), SCALE_RANGE), vec3(0.1, 1.0, 10.0));
    }

    #[test]
    fn vec3_becomes_array() {
        assert_eq!(to_array(&vec3(1.0, 2.0, 3.0)), [1.0, 2.0, 3.0]);
    }

    // The only test creating an imgui context, a second live context would panic.
    #[test]
    fn untouched_panel_emits_nothing() {
        let mut imgui = imgui::Context::create();
        imgui.set_ini_filename(None);
        imgui.io_mut().display_size = [1280.0, 720.0];
        imgui.fonts().build_rgba32_texture();

        let scene = Scene::with_builtins();
        let mut editor = Editor::new();

        let ui = imgui.new_frame();
        let commands = editor.draw(ui, &scene);
        imgui.render();

        assert!(commands.is_empty());

        editor.cursor_captured = true;
        let ui = imgui.new_frame();
        let commands = editor.draw(ui, &scene);
        imgui.render();

        assert!(commands.is_empty());
    }
}
