#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("No drawable surface is available")]
    SurfaceUnavailable,

    #[error("Fixed viewport size must be finite and positive, got ({0}, {1})")]
    InvalidSize(f32, f32),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Where the viewport takes its dimensions from.
#[derive(Default, Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SizeMode {
    Fixed {
        width: f32,
        height: f32,
    },
    Parent,
    #[default]
    Window,
}

/// A drawable surface, measured in logical pixels.
pub trait Surface {
    /// `false` once the surface has been detached from its host.
    fn is_attached(&self) -> bool {
        true
    }

    fn parent_size(&self) -> Option<(f32, f32)>;

    fn window_size(&self) -> (f32, f32);

    fn device_pixel_ratio(&self) -> f64;
}

impl Surface for winit::window::Window {
    fn parent_size(&self) -> Option<(f32, f32)> {
        Some(self.window_size())
    }

    fn window_size(&self) -> (f32, f32) {
        let size: winit::dpi::LogicalSize<f32> = self.inner_size().to_logical(self.scale_factor());
        (size.width, size.height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.scale_factor()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportState {
    pub width: f32,
    pub height: f32,
    pub aspect_ratio: f32,
    pub pixel_ratio: f64,
    pub world_width: f32,
    pub world_height: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            aspect_ratio: 1.0,
            pixel_ratio: 1.0,
            world_width: 0.0,
            world_height: 0.0,
        }
    }
}

impl ViewportState {
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.pixel_ratio).round() as u32,
            (self.height as f64 * self.pixel_ratio).round() as u32,
        )
    }

    /// Surface-local bounds for pointer hit testing.
    pub fn rect(&self) -> crate::pointer::Rect {
        crate::pointer::Rect {
            left: 0.0,
            top: 0.0,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub camera: crate::camera::Camera,
    pub min_aspect: Option<f32>,
    pub max_aspect: Option<f32>,
    pub min_pixel_ratio: Option<f64>,
    pub max_pixel_ratio: Option<f64>,
    pub resize_debounce_ms: u32,
    /// Upper bound for a single frame's delta time, in seconds.
    pub max_frame_delta: f32,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            camera: crate::camera::Camera::default(),
            min_aspect: None,
            max_aspect: Some(1.5),
            min_pixel_ratio: None,
            max_pixel_ratio: None,
            resize_debounce_ms: 100,
            max_frame_delta: 0.1,
        }
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct FrameTiming {
    pub elapsed: f32,
    pub delta: f32,
}

/// Turns frame timestamps into guarded delta times.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_frame: Option<chrono::DateTime<chrono::Utc>>,
    elapsed: f32,
    max_delta: f32,
}

impl FrameClock {
    pub fn new(max_delta: f32) -> Self {
        Self {
            last_frame: None,
            elapsed: 0.0,
            max_delta,
        }
    }

    /// The next tick reports a zero delta.
    pub fn restart(&mut self) {
        self.last_frame = None;
    }

    pub fn tick(&mut self, now: chrono::DateTime<chrono::Utc>) -> FrameTiming {
        let delta = match self.last_frame {
            Some(last_frame) => now
                .signed_duration_since(last_frame)
                .num_microseconds()
                .map_or(0.0, |microseconds| microseconds as f32 / 1_000_000.0),
            None => 0.0,
        };
        self.last_frame = Some(now);

        let delta = if delta.is_finite() && delta > 0.0 {
            delta.min(self.max_delta)
        } else {
            0.0
        };
        self.elapsed += delta;

        FrameTiming {
            elapsed: self.elapsed,
            delta,
        }
    }
}

/// Owns the camera, the visible world extent, and the run state of the frame loop.
#[derive(Debug, Clone)]
pub struct Viewport {
    mode: SizeMode,
    settings: ViewportSettings,
    camera: crate::camera::Camera,
    state: ViewportState,
    clock: FrameClock,
    intersecting: bool,
    page_visible: bool,
    pending_resize: Option<chrono::DateTime<chrono::Utc>>,
    disposed: bool,
}

impl Viewport {
    pub fn new(
        surface: &impl Surface,
        mode: SizeMode,
        settings: ViewportSettings,
    ) -> Result<Self> {
        if !surface.is_attached() {
            return Err(Error::SurfaceUnavailable);
        }
        if let SizeMode::Fixed { width, height } = mode {
            let valid = |value: f32| value.is_finite() && value > 0.0;
            if !valid(width) || !valid(height) {
                return Err(Error::InvalidSize(width, height));
            }
        }

        let mut viewport = Self {
            mode,
            camera: settings.camera.clone(),
            clock: FrameClock::new(settings.max_frame_delta),
            settings,
            state: ViewportState::default(),
            intersecting: true,
            page_visible: true,
            pending_resize: None,
            disposed: false,
        };
        viewport.resize(surface);
        log::info!("Viewport initialized with {:?}", viewport.mode);
        Ok(viewport)
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn camera(&self) -> &crate::camera::Camera {
        &self.camera
    }

    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_running(&self) -> bool {
        !self.disposed && self.intersecting && self.page_visible
    }

    pub fn has_pending_resize(&self) -> bool {
        self.pending_resize.is_some()
    }

    /// Recomputes size, camera framing, and world extent.
    /// Returns `false` when the surface cannot be measured right now.
    pub fn resize(&mut self, surface: &impl Surface) -> bool {
        if self.disposed || !surface.is_attached() {
            return false;
        }

        let size = match self.mode {
            SizeMode::Fixed { width, height } => Some((width, height)),
            SizeMode::Parent => surface.parent_size(),
            SizeMode::Window => Some(surface.window_size()),
        };
        let Some((width, height)) = size.filter(|(width, height)| *width > 0.0 && *height > 0.0)
        else {
            log::debug!("Skipping resize, surface has no measurable size");
            return false;
        };

        let aspect_ratio = width / height;
        self.camera.set_aspect_ratio(
            aspect_ratio,
            self.settings.min_aspect,
            self.settings.max_aspect,
        );
        let (world_width, world_height) = self.camera.world_size();

        let mut pixel_ratio = surface.device_pixel_ratio();
        if let Some(min) = self.settings.min_pixel_ratio {
            pixel_ratio = pixel_ratio.max(min);
        }
        if let Some(max) = self.settings.max_pixel_ratio {
            pixel_ratio = pixel_ratio.min(max);
        }

        self.state = ViewportState {
            width,
            height,
            aspect_ratio,
            pixel_ratio,
            world_width,
            world_height,
        };
        log::debug!("Viewport resized: {:?}", self.state);
        true
    }

    /// Restarts the debounce window.
    pub fn request_resize(&mut self, now: chrono::DateTime<chrono::Utc>) {
        if self.disposed {
            return;
        }
        self.pending_resize = Some(now);
    }

    /// Runs a requested resize once the debounce window has passed.
    pub fn poll_resize(
        &mut self,
        now: chrono::DateTime<chrono::Utc>,
        surface: &impl Surface,
    ) -> bool {
        let Some(requested) = self.pending_resize else {
            return false;
        };
        let debounce = chrono::Duration::milliseconds(i64::from(self.settings.resize_debounce_ms));
        if now.signed_duration_since(requested) < debounce {
            return false;
        }
        self.pending_resize = None;
        self.resize(surface)
    }

    pub fn set_intersecting(&mut self, intersecting: bool) {
        self.update_visibility(|viewport| viewport.intersecting = intersecting);
    }

    pub fn set_page_visible(&mut self, page_visible: bool) {
        self.update_visibility(|viewport| viewport.page_visible = page_visible);
    }

    fn update_visibility(&mut self, change: impl FnOnce(&mut Self)) {
        if self.disposed {
            return;
        }
        let was_running = self.is_running();
        change(self);
        match (was_running, self.is_running()) {
            (false, true) => {
                self.clock.restart();
                log::info!("Render loop started");
            }
            (true, false) => log::info!("Render loop stopped"),
            _ => {}
        }
    }

    /// Timing for the next frame, or `None` while the loop is stopped.
    pub fn frame(&mut self, now: chrono::DateTime<chrono::Utc>) -> Option<FrameTiming> {
        self.is_running().then(|| self.clock.tick(now))
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.pending_resize = None;
        self.disposed = true;
        log::info!("Viewport disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    struct FakeSurface {
        attached: bool,
        parent: Option<(f32, f32)>,
        window: (f32, f32),
        pixel_ratio: f64,
    }

    impl Default for FakeSurface {
        fn default() -> Self {
            Self {
                attached: true,
                parent: Some((300.0, 200.0)),
                window: (800.0, 600.0),
                pixel_ratio: 2.0,
            }
        }
    }

    impl Surface for FakeSurface {
        fn is_attached(&self) -> bool {
            self.attached
        }

        fn parent_size(&self) -> Option<(f32, f32)> {
            self.parent
        }

        fn window_size(&self) -> (f32, f32) {
            self.window
        }

        fn device_pixel_ratio(&self) -> f64 {
            self.pixel_ratio
        }
    }

    fn at(milliseconds: i64) -> chrono::DateTime<chrono::Utc> {
        use chrono::TimeZone;
        chrono::Utc.timestamp_millis_opt(milliseconds).unwrap()
    }

    #[test]
    fn missing_surface_fails_fast() {
        let surface = FakeSurface {
            attached: false,
            ..Default::default()
        };
        let result = Viewport::new(&surface, SizeMode::Window, ViewportSettings::default());
        assert_eq!(result.unwrap_err(), Error::SurfaceUnavailable);
    }

    #[test]
    fn invalid_fixed_size_is_rejected() {
        let result = Viewport::new(
            &FakeSurface::default(),
            SizeMode::Fixed {
                width: 0.0,
                height: 10.0,
            },
            ViewportSettings::default(),
        );
        assert_eq!(result.unwrap_err(), Error::InvalidSize(0.0, 10.0));
    }

    #[test]
    fn size_modes_pick_their_source() {
        let surface = FakeSurface::default();
        let settings = ViewportSettings::default();

        let fixed = Viewport::new(
            &surface,
            SizeMode::Fixed {
                width: 100.0,
                height: 50.0,
            },
            settings.clone(),
        )
        .unwrap();
        assert_eq!(fixed.state().width, 100.0);
        assert_eq!(fixed.state().aspect_ratio, 2.0);

        let parent = Viewport::new(&surface, SizeMode::Parent, settings.clone()).unwrap();
        assert_eq!(parent.state().width, 300.0);
        assert_eq!(parent.state().height, 200.0);

        let window = Viewport::new(&surface, SizeMode::Window, settings).unwrap();
        assert_eq!(window.state().width, 800.0);
        assert_eq!(window.state().physical_size(), (1600, 1200));
    }

    #[test]
    fn world_size_matches_camera_framing() {
        let viewport = Viewport::new(
            &FakeSurface::default(),
            SizeMode::Fixed {
                width: 100.0,
                height: 100.0,
            },
            ViewportSettings::default(),
        )
        .unwrap();
        let expected_height = 2.0 * 25f32.to_radians().tan() * 20.0;
        assert_abs_diff_eq!(viewport.state().world_height, expected_height, epsilon = 1e-4);
        assert_abs_diff_eq!(viewport.state().world_width, expected_height, epsilon = 1e-4);
    }

    #[test]
    fn pixel_ratio_is_clamped() {
        let settings = ViewportSettings {
            max_pixel_ratio: Some(1.5),
            ..Default::default()
        };
        let viewport = Viewport::new(&FakeSurface::default(), SizeMode::Window, settings).unwrap();
        assert_eq!(viewport.state().pixel_ratio, 1.5);
    }

    #[test]
    fn detached_surface_skips_resize() {
        let mut surface = FakeSurface::default();
        let mut viewport =
            Viewport::new(&surface, SizeMode::Parent, ViewportSettings::default()).unwrap();
        let before = *viewport.state();

        surface.parent = None;
        assert!(!viewport.resize(&surface));
        surface.parent = Some((10.0, 10.0));
        surface.attached = false;
        assert!(!viewport.resize(&surface));

        assert_eq!(*viewport.state(), before);
    }

    #[test]
    fn resize_is_debounced() {
        let mut surface = FakeSurface::default();
        let mut viewport =
            Viewport::new(&surface, SizeMode::Window, ViewportSettings::default()).unwrap();
        surface.window = (400.0, 400.0);

        viewport.request_resize(at(0));
        viewport.request_resize(at(60));
        assert!(!viewport.poll_resize(at(120), &surface));
        assert_eq!(viewport.state().width, 800.0);

        assert!(viewport.poll_resize(at(160), &surface));
        assert_eq!(viewport.state().width, 400.0);
        assert!(!viewport.has_pending_resize());
    }

    #[test]
    fn loop_runs_only_while_visible() {
        let mut viewport = Viewport::new(
            &FakeSurface::default(),
            SizeMode::Window,
            ViewportSettings::default(),
        )
        .unwrap();
        assert!(viewport.frame(at(0)).is_some());

        viewport.set_intersecting(false);
        assert!(viewport.frame(at(16)).is_none());

        viewport.set_intersecting(true);
        viewport.set_page_visible(false);
        assert!(viewport.frame(at(32)).is_none());

        viewport.set_page_visible(true);
        let timing = viewport.frame(at(5_000)).unwrap();
        assert_eq!(timing.delta, 0.0);
    }

    #[test]
    fn frame_deltas_are_guarded() {
        let mut clock = FrameClock::new(0.1);
        assert_eq!(clock.tick(at(1_000)).delta, 0.0);
        assert_abs_diff_eq!(clock.tick(at(1_016)).delta, 0.016, epsilon = 1e-6);
        assert_eq!(clock.tick(at(1_010)).delta, 0.0);
        assert_eq!(clock.tick(at(3_000)).delta, 0.1);
        assert_abs_diff_eq!(clock.tick(at(3_000)).elapsed, 0.116, epsilon = 1e-6);
    }

    #[test]
    fn disposed_viewport_ignores_calls() {
        let surface = FakeSurface::default();
        let mut viewport =
            Viewport::new(&surface, SizeMode::Window, ViewportSettings::default()).unwrap();
        viewport.dispose();
        viewport.dispose();

        assert!(viewport.is_disposed());
        assert!(!viewport.is_running());
        assert!(!viewport.resize(&surface));
        viewport.request_resize(at(0));
        assert!(!viewport.poll_resize(at(1_000), &surface));
        viewport.set_intersecting(true);
        assert!(viewport.frame(at(0)).is_none());
    }
}
