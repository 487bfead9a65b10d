#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to create winit event loop!")]
    CreateEventLoop(#[source] winit::error::EventLoopError),

    #[error("Failed to create winit window!")]
    CreateWindow(#[source] winit::error::OsError),

    #[error("Failed to execute the event loop!")]
    RunEventLoop(#[source] winit::error::EventLoopError),

    #[error("No canvas element with id `{0}` was found")]
    MissingCanvas(String),

    #[error(transparent)]
    Viewport(#[from] crate::viewport::Error),

    #[error(transparent)]
    Renderer(#[from] render::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WindowOptions {
    pub size_mode: crate::viewport::SizeMode,
    pub viewport: crate::viewport::ViewportSettings,
    /// Canvas element used on the web.
    pub canvas_id: String,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            size_mode: crate::viewport::SizeMode::default(),
            viewport: crate::viewport::ViewportSettings::default(),
            canvas_id: "canvas".to_string(),
        }
    }
}

pub struct Context {
    pub router: crate::pointer::PointerRouter<winit::window::WindowId>,
    pub viewport: crate::viewport::Viewport,
    pub window_id: winit::window::WindowId,
    pub should_exit: bool,
}

pub trait State {
    fn title(&self) -> &str {
        "Ballpit"
    }

    /// Called once before the main loop
    fn initialize(&mut self, _context: &mut Context) {}

    /// Called when a winit event is received
    fn receive_event(&mut self, _context: &mut Context, _event: &winit::event::Event<()>) {}

    /// Called after the viewport has been resized
    fn resized(&mut self, _context: &mut Context) {}

    /// Called every running frame prior to rendering
    fn update(&mut self, _context: &mut Context, _timing: &crate::viewport::FrameTiming) {}

    /// Called every running frame after rendering
    fn after_render(&mut self, _context: &mut Context, _timing: &crate::viewport::FrameTiming) {}

    /// The scene to draw, if any
    fn scene(&mut self) -> Option<&mut scene::Scene> {
        None
    }

    /// Called once when the event loop exits
    fn dispose(&mut self, _context: &mut Context) {}
}

#[cfg(not(target_arch = "wasm32"))]
pub fn run(options: WindowOptions, state: impl State + 'static) -> Result<()> {
    env_logger::init();
    pollster::block_on(run_async(options, state))
}

#[cfg(target_arch = "wasm32")]
pub fn run(options: WindowOptions, state: impl State + 'static) -> Result<()> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if let Err(error) = console_log::init() {
        web_sys::console::error_1(&format!("Could not initialize logger: {error}").into());
    }
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(error) = run_async(options, state).await {
            log::error!("Ballpit stopped: {error}");
        }
    });
    Ok(())
}

pub async fn run_async(options: WindowOptions, mut state: impl State + 'static) -> Result<()> {
    let event_loop = winit::event_loop::EventLoop::new().map_err(Error::CreateEventLoop)?;

    #[allow(unused_mut)]
    let mut builder = winit::window::WindowBuilder::new();

    if !cfg!(target_arch = "wasm32") {
        builder = builder.with_title(state.title());
        if let crate::viewport::SizeMode::Fixed { width, height } = options.size_mode {
            builder = builder.with_inner_size(winit::dpi::LogicalSize::new(width, height));
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        use web_sys::wasm_bindgen::JsCast;
        use winit::platform::web::WindowBuilderExtWebSys;
        let canvas = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(&options.canvas_id))
            .and_then(|element| element.dyn_into::<web_sys::HtmlCanvasElement>().ok())
            .ok_or_else(|| Error::MissingCanvas(options.canvas_id.clone()))?;
        builder = builder.with_canvas(Some(canvas));
    }

    let window = builder.build(&event_loop).map_err(Error::CreateWindow)?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let window = std::sync::Arc::new(window);

    let viewport = crate::viewport::Viewport::new(&*window, options.size_mode, options.viewport)?;
    let (width, height) = viewport.state().physical_size();
    let mut renderer = render::Renderer::new(window.clone(), width, height).await?;

    let mut context = Context {
        router: crate::pointer::PointerRouter::default(),
        viewport,
        window_id: window.id(),
        should_exit: false,
    };

    state.initialize(&mut context);

    let mut cursor = nalgebra_glm::Vec2::zeros();
    let mut disposed = false;

    event_loop
        .run(move |event, elwt| {
            let now = chrono::Utc::now();

            state.receive_event(&mut context, &event);

            match event {
                winit::event::Event::WindowEvent { ref event, .. } => {
                    let scale_factor = window.scale_factor();
                    let to_logical = |position: winit::dpi::PhysicalPosition<f64>| {
                        let position: winit::dpi::LogicalPosition<f32> =
                            position.to_logical(scale_factor);
                        nalgebra_glm::vec2(position.x, position.y)
                    };

                    let pointer_event = match event {
                        winit::event::WindowEvent::KeyboardInput {
                            event:
                                winit::event::KeyEvent {
                                    physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                                    state: winit::event::ElementState::Pressed,
                                    ..
                                },
                            ..
                        } => {
                            // Exit by pressing the escape key
                            if matches!(key_code, winit::keyboard::KeyCode::Escape) {
                                elwt.exit();
                            }
                            None
                        }

                        // Close button handler
                        winit::event::WindowEvent::CloseRequested => {
                            elwt.exit();
                            None
                        }

                        winit::event::WindowEvent::Resized(..)
                        | winit::event::WindowEvent::ScaleFactorChanged { .. } => {
                            context.viewport.request_resize(now);
                            None
                        }

                        winit::event::WindowEvent::Occluded(occluded) => {
                            context.viewport.set_intersecting(!occluded);
                            None
                        }

                        winit::event::WindowEvent::CursorMoved { position, .. } => {
                            cursor = to_logical(*position);
                            Some(crate::pointer::PointerEvent::Moved(cursor))
                        }

                        winit::event::WindowEvent::CursorLeft { .. } => {
                            Some(crate::pointer::PointerEvent::Left)
                        }

                        winit::event::WindowEvent::MouseInput {
                            state: winit::event::ElementState::Pressed,
                            button: winit::event::MouseButton::Left,
                            ..
                        } => Some(crate::pointer::PointerEvent::Clicked(cursor)),

                        winit::event::WindowEvent::Touch(touch) => {
                            let position = to_logical(touch.location);
                            Some(match touch.phase {
                                winit::event::TouchPhase::Started => {
                                    crate::pointer::PointerEvent::TouchStarted(position)
                                }
                                winit::event::TouchPhase::Moved => {
                                    crate::pointer::PointerEvent::TouchMoved(position)
                                }
                                winit::event::TouchPhase::Ended
                                | winit::event::TouchPhase::Cancelled => {
                                    crate::pointer::PointerEvent::TouchEnded
                                }
                            })
                        }

                        _ => None,
                    };

                    if let Some(pointer_event) = pointer_event {
                        let window_id = context.window_id;
                        let rect = context.viewport.state().rect();
                        let dispatch = context
                            .router
                            .dispatch(pointer_event, |surface| (*surface == window_id).then_some(rect));
                        if dispatch.prevent_default {
                            log::trace!("Pointer gesture captured by the ballpit");
                        }
                    }
                }

                winit::event::Event::Suspended => context.viewport.set_page_visible(false),

                winit::event::Event::Resumed => context.viewport.set_page_visible(true),

                winit::event::Event::AboutToWait => {
                    if context.should_exit {
                        elwt.exit();
                        return;
                    }

                    if context.viewport.poll_resize(now, &*window) {
                        let (width, height) = context.viewport.state().physical_size();
                        renderer.resize(width, height);
                        state.resized(&mut context);
                    }

                    let control_flow = if context.viewport.is_running()
                        || context.viewport.has_pending_resize()
                    {
                        winit::event_loop::ControlFlow::Poll
                    } else {
                        winit::event_loop::ControlFlow::Wait
                    };
                    elwt.set_control_flow(control_flow);

                    let Some(timing) = context.viewport.frame(now) else {
                        return;
                    };

                    state.update(&mut context, &timing);
                    if let Some(scene) = state.scene() {
                        renderer.render_frame(&context.viewport.camera().frame_camera(), scene);
                    }
                    state.after_render(&mut context, &timing);
                }

                winit::event::Event::LoopExiting => {
                    if !disposed {
                        disposed = true;
                        state.dispose(&mut context);
                        renderer.dispose();
                        context.viewport.dispose();
                    }
                }

                _ => {}
            }
        })
        .map_err(Error::RunEventLoop)
}
