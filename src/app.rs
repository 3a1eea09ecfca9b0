use crate::args::Args;
use crate::config::SceneConfig;
use crate::editor::Editor;
use crate::err::AppError;
use crate::import;
use crate::input::{self, InputAxes, InputMapper};
use crate::renderer::VulkanRenderer;
use crate::scene::{Applied, EditorCommand, Scene};
use crate::timer::FrameTimer;
use imgui_sdl2_support::SdlPlatform;
use log::{error, info, warn};
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Scancode;
use sdl2::mouse::MouseButton;
use sdl2::video::{FullscreenType, Window};
use sdl2::{EventPump, Sdl};
use std::path::Path;
use std::time::Instant;

const TITLE_INTERVAL: f32 = 0.5;

pub struct App {
    renderer: VulkanRenderer,
    platform: SdlPlatform,
    imgui: imgui::Context,
    event_pump: EventPump,
    window: Window,
    sdl_context: Sdl,
    input_mapper: InputMapper<InputAxes>,
    editor: Editor,
    scene: Scene,
    title: String,
}

impl App {
    pub fn create(config: &SceneConfig, args: &Args) -> Result<Self, AppError> {
        let sdl_context = sdl2::init().map_err(AppError::Other)?;
        let video_subsystem = sdl_context.video().map_err(AppError::Other)?;

        let width = args.width.unwrap_or(config.window.width);
        let height = args.height.unwrap_or(config.window.height);

        let mut window = video_subsystem
            .window(&config.window.title, width, height)
            .allow_highdpi()
            .resizable()
            .position_centered()
            .vulkan()
            .build()
            .map_err(|e| AppError::Other(format!("cannot build window: {e}")))?;

        window
            .set_minimum_size(120, 40)
            .map_err(|e| AppError::Other(format!("cannot set min size: {e}")))?;

        let event_pump = sdl_context.event_pump().map_err(AppError::Other)?;

        let mut imgui = imgui::Context::create();
        imgui.set_ini_filename(None);
        let platform = SdlPlatform::new(&mut imgui);

        let vsync = config.window.vsync && !args.no_vsync;
        let renderer = VulkanRenderer::init(&window, &mut imgui, args.validation_enabled(), vsync)?;

        let scene = config.build_scene()?;

        info!("scene with {} objects ready", scene.objects.len());

        Ok(Self {
            renderer,
            platform,
            imgui,
            event_pump,
            window,
            sdl_context,
            input_mapper: InputAxes::default_mapper(),
            editor: Editor::new(),
            scene,
            title: config.window.title.clone(),
        })
    }

    pub fn import_models(&mut self, paths: &[impl AsRef<Path>]) {
        for path in paths {
            import_into(&mut self.scene, path.as_ref());
        }
    }

    pub fn run(mut self) -> Result<(), AppError> {
        let start = Instant::now();
        let mut timer = FrameTimer::new(0.0);
        let mut since_title = 0.0;

        'running: loop {
            let mut resized = false;
            let mut commands = Vec::new();

            let ui_wants_mouse = self.imgui.io().want_capture_mouse;
            let ui_wants_keyboard = self.imgui.io().want_capture_keyboard;

            for event in self.event_pump.poll_iter() {
                self.platform.handle_event(&mut self.imgui, &event);

                match event {
                    Event::Quit { .. }
                    | Event::KeyDown {
                        scancode: Some(Scancode::Escape),
                        ..
                    } => {
                        break 'running;
                    }
                    Event::KeyDown {
                        scancode: Some(Scancode::F11),
                        repeat: false,
                        ..
                    } => toggle_fullscreen(&mut self.window),
                    Event::KeyDown {
                        scancode: Some(Scancode::G),
                        repeat: false,
                        ..
                    } if self.editor.cursor_captured => {
                        commands.push(EditorCommand::ToggleWireframe);
                    }
                    Event::MouseButtonDown {
                        mouse_btn: MouseButton::Right,
                        ..
                    } if self.editor.cursor_captured || !ui_wants_mouse => {
                        self.editor.cursor_captured = !self.editor.cursor_captured;
                        self.sdl_context.mouse().set_relative_mouse_mode(self.editor.cursor_captured);
                        self.input_mapper.clear();
                    }
                    Event::MouseMotion { xrel, yrel, .. } if self.editor.cursor_captured => {
                        self.scene.camera.process_mouse_movement(xrel as f32, -yrel as f32, true);
                    }
                    Event::MouseWheel { y, .. } if self.editor.cursor_captured => {
                        self.scene.camera.zoom(y as f32);
                    }
                    Event::Window {
                        win_event: WindowEvent::Resized(..) | WindowEvent::SizeChanged(..),
                        ..
                    } => {
                        resized = true;
                    }
                    Event::DropFile { filename, .. } => {
                        import_into(&mut self.scene, Path::new(&filename));
                    }
                    _ => {}
                }
            }

            timer.update(start.elapsed().as_secs_f64());
            let delta = timer.delta();

            self.platform.prepare_frame(&mut self.imgui, &self.window, &self.event_pump);
            let ui = self.imgui.new_frame();
            commands.extend(self.editor.draw(ui, &self.scene));
            let draw_data = self.imgui.render();

            for command in commands {
                match self.scene.apply(command) {
                    Ok(Applied::Done) => {}
                    Ok(Applied::ImportRequested(path)) => import_into(&mut self.scene, &path),
                    Err(e) => warn!("editor command rejected: {e}"),
                }
            }

            if self.editor.cursor_captured || !ui_wants_keyboard {
                self.input_mapper.update(self.event_pump.keyboard_state());
                input::drive_camera(&self.input_mapper, &mut self.scene.camera, delta);
            }

            let (width, height) = self.window.drawable_size();
            self.scene.update(width as f32 / height.max(1) as f32);

            let packet = self.scene.build_frame();
            self.renderer.render_frame(&packet, draw_data, (width, height))?;

            if resized {
                self.renderer.resize(self.window.drawable_size())?;
            }

            since_title += delta;
            if since_title >= TITLE_INTERVAL {
                since_title = 0.0;
                if let Err(e) = self.window.set_title(&timer.title(&self.title)) {
                    warn!("cannot set window title: {e}");
                }
            }
        }

        info!("Quitting app...");

        Ok(())
    }
}

fn toggle_fullscreen(window: &mut Window) {
    let next = match window.fullscreen_state() {
        FullscreenType::Off => FullscreenType::Desktop,
        _ => FullscreenType::Off,
    };

    if let Err(e) = window.set_fullscreen(next) {
        warn!("cannot change fullscreen mode: {e}");
    }
}

fn import_into(scene: &mut Scene, path: &Path) {
    info!("loading file `{}`", path.display());
    let start = Instant::now();

    let Some(shader) = scene.find_shader_by_name("phong").or(scene.shaders.first()).cloned() else {
        error!("no shader to draw {} with", path.display());
        return;
    };

    match import::import_model(path) {
        Ok(model) => {
            let root = scene.add_model(model, shader);
            info!("Loaded {root} in {} s", start.elapsed().as_secs_f32());
        }
        Err(e) => error!("failed to import {}: {e}", path.display()),
    }
}
