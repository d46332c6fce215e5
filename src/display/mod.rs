//! Window that shows a [`Rendering`], stretched to the window size.

mod buffers;

use std::fmt;

use bytemuck::{Pod, Zeroable};
use log::{debug, error, warn};
use mandelbrot_image::{colour::Rendering, screen::Size};
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use buffers::{Storage, Uniform};

/// Mirrors `levels.wgsl#Frame`.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug)]
struct Frame {
    window: Size,
    grid: Size,
}

#[derive(Debug)]
pub enum DisplayError {
    Window(winit::error::OsError),
    NoAdapter,
    Device(wgpu::RequestDeviceError),
    NoSurfaceFormat,
    /// The levels need a larger storage binding than the device allows.
    GridTooLarge { bytes: u64, limit: u32 },
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window(err) => write!(f, "failed to create window: {err}"),
            Self::NoAdapter => write!(f, "no compatible graphics adapter"),
            Self::Device(err) => write!(f, "failed to request graphics device: {err}"),
            Self::NoSurfaceFormat => write!(f, "surface supports no texture format"),
            Self::GridTooLarge { bytes, limit } => write!(
                f,
                "grid needs a {bytes} byte storage buffer, device allows {limit}"
            ),
        }
    }
}

impl std::error::Error for DisplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Window(err) => Some(err),
            Self::Device(err) => Some(err),
            Self::NoAdapter | Self::NoSurfaceFormat | Self::GridTooLarge { .. } => None,
        }
    }
}

struct Display {
    surface: wgpu::Surface,
    surface_configuration: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
    render_pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    frame: Uniform<Frame>,
    // Bound through `bind_group`; owned here so it lives as long as the window.
    _levels: Storage<f32>,
    grid: Size,
}

impl Display {
    fn new(window: &winit::window::Window, rendering: &Rendering) -> Result<Self, DisplayError> {
        let instance = wgpu::Instance::new(wgpu::Backends::all());

        let size = window.inner_size();
        // SAFETY: `window` outlives the surface; both are moved into the event loop together.
        let surface = unsafe { instance.create_surface(window) };

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .ok_or(DisplayError::NoAdapter)?;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("device"),
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::default(),
            },
            None,
        ))
        .map_err(DisplayError::Device)?;

        // Levels are already display values, so skip the sRGB encode when possible.
        let formats = surface.get_supported_formats(&adapter);
        let format = formats
            .iter()
            .copied()
            .find(|format| !format.describe().srgb)
            .or_else(|| formats.first().copied())
            .ok_or(DisplayError::NoSurfaceFormat)?;

        let surface_configuration = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
        };
        surface.configure(&device, &surface_configuration);

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("levels-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("levels.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("levels-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("render-pipeline-layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("render-pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vertex_main",
                buffers: &[],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fragment_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_configuration.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
        });

        let grid = rendering.size;
        check_levels_fit(rendering.levels.len(), &device.limits())?;
        let levels = Storage::create(&device, "levels-buffer", rendering.levels.as_slice());
        debug!("uploaded {} levels for a {:?} grid", levels.len(), grid);
        let frame = Uniform::create(
            &device,
            "frame-buffer",
            Frame {
                window: Size::new(surface_configuration.width, surface_configuration.height),
                grid,
            },
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("levels-bind-group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: levels.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: frame.binding_resource(),
                },
            ],
        });

        Ok(Self {
            surface,
            surface_configuration,
            device,
            queue,
            render_pipeline,
            bind_group,
            frame,
            _levels: levels,
            grid,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            // Minimised; keep the last configuration until the window comes back.
            return;
        }
        debug!("resizing to {:?}", size);

        self.surface_configuration.width = size.width;
        self.surface_configuration.height = size.height;
        self.surface.configure(&self.device, &self.surface_configuration);

        self.frame.write(
            &self.queue,
            Frame {
                window: Size::new(size.width, size.height),
                grid: self.grid,
            },
        );
    }

    fn redraw(&mut self) -> Result<(), wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let command_encoder = {
            let mut command_encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());

            command_encoder.push_debug_group("render-pass");
            {
                let mut render_pass =
                    command_encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("render-pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &surface_texture_view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                                store: true,
                            },
                        })],
                        depth_stencil_attachment: None,
                    });

                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, &self.bind_group, &[]);
                render_pass.draw(0..4, 0..1);
            }
            command_encoder.pop_debug_group();

            command_encoder
        };

        self.queue.submit([command_encoder.finish()]);
        surface_texture.present();
        Ok(())
    }
}

fn check_levels_fit(len: usize, limits: &wgpu::Limits) -> Result<(), DisplayError> {
    let bytes = (len * std::mem::size_of::<f32>()) as u64;
    let limit = limits.max_storage_buffer_binding_size;
    if bytes > u64::from(limit) {
        return Err(DisplayError::GridTooLarge { bytes, limit });
    }
    Ok(())
}

/// Opens a window showing `rendering` and runs until it is closed.
///
/// Only returns on setup failure; closing the window exits the process.
pub fn show(rendering: &Rendering, title: &str) -> Result<(), DisplayError> {
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(PhysicalSize::new(
            rendering.size.width,
            rendering.size.height,
        ))
        .build(&event_loop)
        .map_err(DisplayError::Window)?;

    let mut display = Display::new(&window, rendering)?;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    display.resize(size);
                    window.request_redraw();
                }
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    display.resize(*new_inner_size);
                    window.request_redraw();
                }
                _ => {}
            },
            Event::RedrawRequested(window_id) if window_id == window.id() => {
                match display.redraw() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        display.resize(window.inner_size());
                        window.request_redraw();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        warn!("timed out waiting for the next surface texture");
                    }
                    Err(err @ wgpu::SurfaceError::OutOfMemory) => {
                        error!("{err}");
                        *control_flow = ControlFlow::Exit;
                    }
                }
            }
            _ => {}
        }
    })
}
