use anyhow::Result;
use imgui::Condition;
use winit::dpi::LogicalSize;

use kiln_engine::core::{App, AppControl, FrameCtx, ResizeCtx};
use kiln_engine::device::{GpuInit, SurfaceErrorAction};
use kiln_engine::gui::{
    map_cursor, ArboardClipboard, GuiTextureConfig, ImguiAdapter, ImguiAdapterConfig, RenderError,
};
use kiln_engine::logging::{init_logging, LoggingConfig};
use kiln_engine::window::{Runtime, RuntimeConfig};

const CHECKER_SIZE: u32 = 64;
const CHECKER_CELL: u32 = 8;

/// RGBA8 checkerboard, two tones of grey.
fn checkerboard(size: u32, cell: u32) -> Vec<u8> {
    let mut texels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let v = if ((x / cell) + (y / cell)) % 2 == 0 { 220 } else { 60 };
            texels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    texels
}

struct DemoApp {
    imgui: imgui::Context,
    adapter: Option<ImguiAdapter>,
    checker: Option<imgui::TextureId>,
    /// Adapter name and backend, shown in the frame window.
    gpu_label: String,
    clear_color: [f32; 4],
}

impl DemoApp {
    fn new() -> Self {
        let mut imgui = imgui::Context::create();
        imgui.set_ini_filename(None);
        imgui.style_mut().use_dark_colors();

        if !ArboardClipboard::install(&mut imgui) {
            log::info!("using imgui's built-in clipboard");
        }

        Self {
            imgui,
            adapter: None,
            checker: None,
            gpu_label: String::new(),
            clear_color: [0.10, 0.11, 0.13, 1.0],
        }
    }

    fn ensure_adapter(&mut self, ctx: &FrameCtx<'_, '_>) -> Result<()> {
        if self.adapter.is_some() {
            return Ok(());
        }

        let mut adapter = ImguiAdapter::new(
            ctx.gpu,
            &mut self.imgui,
            ctx.window.scale_factor(),
            ImguiAdapterConfig::default(),
        )?;

        let texels = checkerboard(CHECKER_SIZE, CHECKER_CELL);
        self.checker = Some(adapter.register_rgba8(
            ctx.gpu,
            CHECKER_SIZE,
            CHECKER_SIZE,
            &texels,
            &GuiTextureConfig::labeled("checkerboard").nearest(),
        ));

        let info = ctx.gpu.adapter_info();
        self.gpu_label = format!("{} ({:?})", info.name, info.backend);
        log::info!("rendering on {}", self.gpu_label);

        self.adapter = Some(adapter);
        Ok(())
    }
}

impl App for DemoApp {
    fn on_resize(&mut self, ctx: &mut ResizeCtx<'_, '_>) {
        match self.adapter.as_mut() {
            Some(adapter) => {
                let scale = ctx.window.scale_factor();
                adapter.resize(ctx.gpu, self.imgui.io_mut(), ctx.size, scale);
            }
            None => ctx.gpu.resize(ctx.size),
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if let Err(e) = self.ensure_adapter(ctx) {
            log::error!("failed to set up imgui adapter: {e:#}");
            return AppControl::Exit;
        }
        let Some(adapter) = self.adapter.as_mut() else {
            return AppControl::Exit;
        };

        let io = self.imgui.io_mut();
        for event in &ctx.input_frame.events {
            adapter.handle_input(io, event);
        }
        io.update_delta_time(ctx.time.delta);

        let mut clear_color = self.clear_color;
        let stats = adapter.stats();
        let checker = self.checker;
        let gpu_label = self.gpu_label.as_str();

        let ui = self.imgui.new_frame();

        ui.window("Hello, Kiln!")
            .size([360.0, 260.0], Condition::FirstUseEver)
            .position([20.0, 20.0], Condition::FirstUseEver)
            .build(|| {
                ui.text("Dear ImGui on wgpu.");
                ui.separator();
                if let Some(id) = checker {
                    imgui::Image::new(id, [128.0, 128.0]).build(ui);
                }
                let [x, y] = ui.io().mouse_pos;
                ui.text(format!("mouse: ({x:.0}, {y:.0})"));
            });

        ui.window("Frame")
            .size([260.0, 160.0], Condition::FirstUseEver)
            .position([400.0, 20.0], Condition::FirstUseEver)
            .build(|| {
                ui.text(gpu_label);
                ui.text(format!("{:.1} fps", ui.io().framerate));
                ui.text(format!("draw lists: {}", stats.draw_lists));
                ui.text(format!("draw calls: {}", stats.draw_calls));
                ui.text(format!("vertices: {}  indices: {}", stats.vertices, stats.indices));
                ui.color_edit4("clear", &mut clear_color);
            });

        ctx.window.set_cursor(map_cursor(ui.mouse_cursor()));

        let draw_data = self.imgui.render();

        self.clear_color = clear_color;
        adapter.set_clear_color(wgpu::Color {
            r: clear_color[0] as f64,
            g: clear_color[1] as f64,
            b: clear_color[2] as f64,
            a: clear_color[3] as f64,
        });

        ctx.pre_present();
        match adapter.render(ctx.gpu, draw_data) {
            Ok(()) => AppControl::Continue,
            Err(RenderError::Surface(err)) => match ctx.gpu.handle_surface_error(err) {
                SurfaceErrorAction::Fatal => {
                    log::error!("surface lost for good, exiting");
                    AppControl::Exit
                }
                SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                    AppControl::Continue
                }
            },
            Err(e @ RenderError::UnregisteredTexture(_)) => {
                log::error!("{e}");
                AppControl::Exit
            }
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Kiln ImGui Demo".to_string(),
        initial_size: LogicalSize::new(960.0, 540.0),
        ..RuntimeConfig::default()
    };

    Runtime::run(config, GpuInit::default(), DemoApp::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_alternates_cells() {
        let texels = checkerboard(16, 8);
        assert_eq!(texels.len(), 16 * 16 * 4);
        assert_eq!(texels[0], 220);
        // First texel of the second cell in row 0.
        assert_eq!(texels[8 * 4], 60);
        // Row 8 starts on a dark cell.
        assert_eq!(texels[(8 * 16) * 4], 60);
        assert!(texels.chunks(4).all(|t| t[3] == 255));
    }
}
