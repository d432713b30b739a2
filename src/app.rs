use std::iter;
use std::ops::RangeInclusive;
use std::time::Duration;

use eframe::egui::{
    CentralPanel, ClippedPrimitive, ScrollArea, SidePanel, Slider, TextureId, Ui, Vec2,
};
use log::{error, info};
use thiserror::Error;
use web_time::Instant;
use wgpu::{
    Backends, Color, CommandBuffer, CommandEncoder, CommandEncoderDescriptor, CompositeAlphaMode,
    CreateSurfaceError, Device, DeviceDescriptor, Dx12Compiler, Features, FilterMode, Instance,
    InstanceDescriptor, Limits, LoadOp, Operations, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RequestAdapterOptions, RequestDeviceError,
    Surface, SurfaceConfiguration, SurfaceError, TextureUsages, TextureViewDescriptor,
};
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::EventLoop;
use winit::window::Window;

use crate::texture::Image;
use crate::tracer::camera::{BASE_HEIGHT, BASE_WIDTH};
use crate::tracer::framebuffer::Framebuffer;
use crate::tracer::scene::Scene;
use crate::tracer::{Settings, Tracer};
use crate::util::Vec3;

const SCREENSHOT_PATH: &str = "tinytrace.png";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("surface를 만들지 못함")]
    CreateSurface(#[from] CreateSurfaceError),
    #[error("쓸 수 있는 GPU 어댑터가 없음")]
    NoAdapter,
    #[error("GPU 장치를 가져오지 못함")]
    RequestDevice(#[from] RequestDeviceError),
}

// 레이 트레이싱 결과를 egui에 보여주기 위한 텍스쳐와 그 ID
struct Viewport {
    image: Image,
    texture_id: TextureId,
}

pub struct Application {
    surface: Surface,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    // 무조건 winit의 Window를 쓸 것!
    pub window: Window,
    egui_state: egui_winit::State,
    egui_context: eframe::egui::Context,
    egui_renderer: egui_wgpu::Renderer,
    egui_screen: egui_wgpu::renderer::ScreenDescriptor,

    // UI가 프레임 사이에 고치고, 렌더링하는 동안엔 빌려주기만 함
    scene: Scene,
    tracer: Tracer,
    framebuffer: Option<Framebuffer>,
    viewport: Option<Viewport>,

    last_frame: Instant,
    average_frame_time: Duration,
}

impl Application {
    pub async fn new(window: Window, event_loop: &EventLoop<()>) -> Result<Self, AppError> {
        let size = window.inner_size();

        // instance는 Adapter와 Surface를 만들어주며 이들에 필요한 정보를 제공함.
        let instance = Instance::new(InstanceDescriptor {
            backends: Backends::all(),                     // 모든 종류의 백엔드 허용
            dx12_shader_compiler: Dx12Compiler::default(), // DirectX 사용시, 쉐이더 컴파일러로 FXC 사용
        });

        // 전달하는 &window가 생성하는 surface보다 오래 유지되어야 함.
        // window는 Application이 계속 들고 있으니 괜찮음
        let surface = unsafe { instance.create_surface(&window) }?;

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .ok_or(AppError::NoAdapter)?;
        info!("GPU 어댑터: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    features: Features::empty(),
                    limits: if cfg!(target_arch = "wasm32") {
                        // 브라우저가 아직 webgpu를 제대로 지원 안하니 webgl2 기준 채택
                        Limits::downlevel_webgl2_defaults()
                    } else {
                        Limits::default()
                    },
                    label: Some("tinytrace GPU"),
                },
                None,
            )
            .await?;

        let capabilities = surface.get_capabilities(&adapter);

        // 색 포맷으로 sRGB 사용
        let surface_format = capabilities
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .unwrap_or(capabilities.formats[0]);
        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: CompositeAlphaMode::Auto,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let mut egui_state = egui_winit::State::new(event_loop);
        egui_state.set_pixels_per_point(window.scale_factor() as f32);
        let egui_context = eframe::egui::Context::default();

        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            surface_format,
            None, // 깊이 안씀
            1,    // 멀티 샘플링 1번만 할꺼임
        );
        let egui_screen = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            window,
            egui_state,
            egui_context,
            egui_renderer,
            egui_screen,
            scene: Scene::default(),
            tracer: Tracer::new(Settings::default()),
            framebuffer: None,
            viewport: None,
            last_frame: Instant::now(),
            average_frame_time: Duration::ZERO,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);

        self.egui_screen.pixels_per_point = self.window.scale_factor() as f32;
        self.egui_screen.size_in_pixels = [self.config.width, self.config.height];
    }

    /// 현재 장면으로 한 프레임을 추적하고 텍스쳐에 올림
    pub fn update(&mut self) {
        let now = Instant::now();
        let frame_time = now - self.last_frame;
        self.last_frame = now;
        // FPS 숫자가 너무 튀지 않게 지수 이동 평균
        self.average_frame_time = self.average_frame_time.mul_f32(0.9) + frame_time.mul_f32(0.1);

        match self.tracer.render(&self.scene) {
            Ok(framebuffer) => {
                self.present_frame(&framebuffer);
                self.framebuffer = Some(framebuffer);
            }
            Err(error) => error!("렌더링 실패: {error}"),
        }
    }

    fn present_frame(&mut self, framebuffer: &Framebuffer) {
        let size = PhysicalSize::new(framebuffer.width(), framebuffer.height());

        match &mut self.viewport {
            Some(viewport) => {
                // scale이 바뀌면 텍스쳐를 새로 만들고 egui에도 다시 알려줘야 함
                if viewport.image.resize(&self.device, size) {
                    self.egui_renderer.update_egui_texture_from_wgpu_texture(
                        &self.device,
                        &viewport.image.view,
                        FilterMode::Linear,
                        viewport.texture_id,
                    );
                }
                viewport.image.upload(&self.queue, framebuffer);
            }
            None => {
                let mut image = Image::for_framebuffer(&self.device, framebuffer, "Viewport");
                image.upload(&self.queue, framebuffer);
                let texture_id = self.egui_renderer.register_native_texture(
                    &self.device,
                    &image.view,
                    FilterMode::Linear,
                );
                self.viewport = Some(Viewport { image, texture_id });
            }
        }
    }

    pub fn render(&mut self) -> Result<(), SurfaceError> {
        let output = self.surface.get_current_texture()?; // 렌더링 결과를 출력할 곳

        let view = output.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("Encoder"),
        });

        let frame = self.update_egui(&mut encoder);

        // render_pass가 encoder를 빌려오기 때문에 아래처럼 따로 빼지 않으면 앞으로 계속 쓸 수 없음
        {
            let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color {
                            r: 0.2,
                            g: 0.2,
                            b: 0.2,
                            a: 1.0,
                        }),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            self.egui_renderer
                .render(&mut render_pass, &frame.primitives, &self.egui_screen)
        }

        self.queue.submit(
            frame
                .command_buffers
                .into_iter()
                .chain(iter::once(encoder.finish())),
        );
        output.present();

        for id in &frame.freed_textures {
            self.egui_renderer.free_texture(id);
        }

        if frame.save_requested {
            self.save_frame();
        }

        Ok(())
    }

    // true: 앱에서 입력 처리를 했으니 따로 관리할 필요 없음
    // false: 아래 event loop에서 처리 해야 함.
    pub fn input(&mut self, event: &WindowEvent) -> bool {
        let egui_response = self.egui_state.on_event(&self.egui_context, event);
        egui_response.consumed
    }

    fn save_frame(&self) {
        let Some(framebuffer) = &self.framebuffer else {
            return;
        };

        match framebuffer.save_png(SCREENSHOT_PATH) {
            Ok(()) => info!("{SCREENSHOT_PATH}에 저장함"),
            Err(error) => error!("{SCREENSHOT_PATH} 저장 실패: {error}"),
        }
    }

    fn update_egui(&mut self, encoder: &mut CommandEncoder) -> EguiFrame {
        let egui_input = self.egui_state.take_egui_input(&self.window);

        let scene = &mut self.scene;
        let settings = &mut self.tracer.settings;
        let frame_time = self.average_frame_time;
        let texture_id = self.viewport.as_ref().map(|viewport| viewport.texture_id);
        let mut save_requested = false;

        let egui_output = self.egui_context.run(egui_input, |ctx| {
            SidePanel::left("Menu")
                .resizable(true)
                .default_width(320.0)
                .show(ctx, |ui| {
                    menu(ui, scene, settings, frame_time, &mut save_requested);
                });

            CentralPanel::default().show(ctx, |ui| {
                let Some(texture_id) = texture_id else {
                    ui.label("Rendering...");
                    return;
                };

                // 내부 해상도는 언제나 4:3
                let available = ui.available_size();
                let fit = (available.x / BASE_WIDTH as f32).min(available.y / BASE_HEIGHT as f32);
                let size = Vec2::new(BASE_WIDTH as f32, BASE_HEIGHT as f32) * fit.max(0.0);
                ui.image(texture_id, size);
            });
        });

        self.egui_state.handle_platform_output(
            &self.window,
            &self.egui_context,
            egui_output.platform_output,
        );
        let primitives = self.egui_context.tessellate(egui_output.shapes);
        egui_output.textures_delta.set.iter().for_each(|(id, delta)| {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, delta);
        });

        let command_buffers = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &primitives,
            &self.egui_screen,
        );

        EguiFrame {
            primitives,
            command_buffers,
            freed_textures: egui_output.textures_delta.free,
            save_requested,
        }
    }
}

struct EguiFrame {
    primitives: Vec<ClippedPrimitive>,
    command_buffers: Vec<CommandBuffer>,
    freed_textures: Vec<TextureId>,
    save_requested: bool,
}

fn menu(
    ui: &mut Ui,
    scene: &mut Scene,
    settings: &mut Settings,
    frame_time: Duration,
    save_requested: &mut bool,
) {
    let millis = frame_time.as_secs_f32() * 1000.0;
    let fps = if millis > 0.0 { 1000.0 / millis } else { 0.0 };
    ui.label(format!("Average {millis:.3} ms/frame ({fps:.1} FPS)"));
    ui.separator();

    ui.add(Slider::new(&mut scene.scale, 1..=20).text("Internal Scale"));
    ui.label(format!(
        "Internal Resolution: {}x{}",
        BASE_WIDTH * scene.scale,
        BASE_HEIGHT * scene.scale
    ));
    ui.add(Slider::new(&mut scene.field_of_view, 0.1..=3.0).text("FOV"));
    position_sliders(ui, "Camera", &mut scene.camera_position, -10.0..=10.0);
    ui.checkbox(&mut settings.skip_dead_bounces, "Skip zero-weight bounces");

    if ui.button("Save PNG").clicked() {
        *save_requested = true;
    }
    ui.separator();

    ScrollArea::vertical().show(ui, |ui| {
        for (index, light) in scene.lights.iter_mut().enumerate() {
            ui.push_id(("light", index), |ui| {
                ui.label(format!("Light {index}"));
                position_sliders(ui, "Light", &mut light.position, -30.0..=30.0);
            });
        }

        for (index, sphere) in scene.spheres.iter_mut().enumerate() {
            ui.push_id(("sphere", index), |ui| {
                ui.label(format!("Sphere {index}"));
                position_sliders(ui, "Sphere", &mut sphere.center, -30.0..=30.0);
                // 반지름은 양수만
                ui.add(Slider::new(&mut sphere.radius, 0.1..=10.0).text("Sphere Radius"));
            });
        }
    });
}

fn position_sliders(ui: &mut Ui, name: &str, position: &mut Vec3, range: RangeInclusive<f32>) {
    ui.add(Slider::new(&mut position.x, range.clone()).text(format!("{name} X")));
    ui.add(Slider::new(&mut position.y, range.clone()).text(format!("{name} Y")));
    ui.add(Slider::new(&mut position.z, range).text(format!("{name} Z")));
}
