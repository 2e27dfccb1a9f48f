//! Application shell: window lifecycle, event bridge and the frame loop.
//!
//! Bootstrap is asynchronous (adapter probing, planet textures); on native
//! it blocks on a tokio runtime, on the web it runs in `spawn_local` and
//! hands the finished state back through a user event. The environment
//! panorama loads the same way: its completion posts a user event so the
//! installation always happens between frames, never during one.

use std::sync::Arc;

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::{
    context::Context,
    controls::Navigation,
    environment::{self, EnvironmentImage, PROBE_ERROR_MESSAGE},
    pipelines::basic::diffuse_layout,
    scene::{rng::SceneRng, Scene},
    stats::FrameStats,
};

/// Events posted back onto the event loop from async work.
pub enum AppEvent {
    /// Bootstrap finished (web path; native blocks instead).
    Initialized(Box<AppState>),
    /// Bootstrap failed, keep the window but show nothing.
    InitFailed(String),
    /// The HDR panorama arrived and is ready to install.
    EnvironmentLoaded(EnvironmentImage),
}

/// Everything the frame loop touches.
pub struct AppState {
    pub ctx: Context,
    pub scene: Scene,
    pub navigation: Navigation,
    pub stats: FrameStats,
}

async fn bootstrap(window: Arc<Window>) -> anyhow::Result<AppState> {
    let ctx = Context::new(window).await?;

    let scene = Scene::new(
        &ctx.device,
        &ctx.queue,
        &diffuse_layout(&ctx.device),
        SceneRng::from_entropy(),
    )
    .await;

    let mut ctx = ctx;
    ctx.lights.uniform.set_lights(scene.flare_lights());
    ctx.lights.write(&ctx.queue);

    let navigation = Navigation::new(&ctx.camera.camera);
    Ok(AppState {
        ctx,
        scene,
        navigation,
        stats: FrameStats::new(),
    })
}

pub struct App {
    proxy: EventLoopProxy<AppEvent>,
    #[cfg(not(target_arch = "wasm32"))]
    runtime: tokio::runtime::Runtime,
    state: Option<AppState>,
    last_frame: Option<Instant>,
    failed: bool,
}

impl App {
    pub fn new(event_loop: &EventLoop<AppEvent>) -> anyhow::Result<Self> {
        Ok(Self {
            proxy: event_loop.create_proxy(),
            #[cfg(not(target_arch = "wasm32"))]
            runtime: tokio::runtime::Runtime::new()?,
            state: None,
            last_frame: None,
            failed: false,
        })
    }

    fn spawn_environment_load(&self) {
        let proxy = self.proxy.clone();
        let load = async move {
            match environment::load_environment().await {
                Ok(image) => {
                    // A closed loop means shutdown; nothing to do.
                    let _ = proxy.send_event(AppEvent::EnvironmentLoaded(image));
                }
                Err(err) => {
                    log::warn!("environment load failed, background stays black: {err}");
                }
            }
        };
        #[cfg(not(target_arch = "wasm32"))]
        self.runtime.spawn(load);
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(load);
    }

    fn report_failure(&mut self, message: &str) {
        self.failed = true;
        log::error!("{message}");
        #[cfg(not(target_arch = "wasm32"))]
        eprintln!("{message}");
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(body) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.body())
            {
                body.set_inner_html(&format!("<p>{message}</p>"));
            }
        }
    }

    fn redraw(&mut self) {
        if self.failed {
            return;
        }
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| now - last)
            .unwrap_or_default();
        self.last_frame = Some(now);

        state.scene.advance(&state.ctx.queue);
        state
            .navigation
            .update(&mut state.ctx.camera.camera, dt);
        state.ctx.update_camera();

        match state.ctx.render(&mut state.scene) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = state.ctx.window.inner_size();
                state.ctx.resize(size.width, size.height);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory, shutting down");
                self.failed = true;
                return;
            }
            Err(err) => log::warn!("frame dropped: {err}"),
        }

        if let Some(fps) = state.stats.record(dt) {
            state
                .ctx
                .window
                .set_title(&format!("astroscene - {fps:.0} fps"));
        }

        state.ctx.window.request_redraw();
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("astroscene");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.report_failure(&format!("window creation failed: {err}"));
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.runtime.block_on(bootstrap(window)) {
                Ok(state) => {
                    self.state = Some(state);
                    self.spawn_environment_load();
                    if let Some(state) = &self.state {
                        state.ctx.window.request_redraw();
                    }
                }
                Err(err) => {
                    log::error!("bootstrap failed: {err:#}");
                    self.report_failure(PROBE_ERROR_MESSAGE);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match bootstrap(window).await {
                    Ok(state) => AppEvent::Initialized(Box::new(state)),
                    Err(err) => {
                        log::error!("bootstrap failed: {err:#}");
                        AppEvent::InitFailed(PROBE_ERROR_MESSAGE.to_string())
                    }
                };
                let _ = proxy.send_event(event);
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(state) => {
                state.ctx.window.request_redraw();
                self.state = Some(*state);
                self.spawn_environment_load();
            }
            AppEvent::InitFailed(message) => {
                self.report_failure(&message);
                #[cfg(not(target_arch = "wasm32"))]
                event_loop.exit();
                #[cfg(target_arch = "wasm32")]
                let _ = event_loop;
            }
            AppEvent::EnvironmentLoaded(image) => {
                if let Some(state) = self.state.as_mut() {
                    // Applied here, between frames, never mid-render.
                    if let Err(err) = state.ctx.install_environment(&image) {
                        log::warn!("environment install failed: {err}");
                    }
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(state) = self.state.as_mut() {
                    state.ctx.resize(size.width, size.height);
                }
            }
            WindowEvent::CursorEntered { .. } => {
                if let Some(state) = self.state.as_mut() {
                    state.navigation.fly.set_frozen(false);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if let Some(state) = self.state.as_mut() {
                    state.navigation.fly.set_frozen(true);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            other => {
                if let Some(state) = self.state.as_mut() {
                    state.navigation.handle_window_events(&other);
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if let Some(state) = self.state.as_mut() {
                state.navigation.handle_mouse(dx, dy);
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(err) = run() {
        log::error!("event loop terminated: {err:#}");
    }
}

pub fn run() -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
