#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Simulation(#[from] physics::Error),

    #[error(transparent)]
    Colors(#[from] scene::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Bodies added or removed by one press of `+` or `-`.
const COUNT_STEP: usize = 10;

/// Latest pointer state, written by the router and read once per frame.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
struct PointerInput {
    hovering: bool,
    normalized_position: nalgebra_glm::Vec2,
    changed: bool,
}

struct PointerTracker {
    input: std::rc::Rc<std::cell::RefCell<PointerInput>>,
}

impl PointerTracker {
    fn track(&self, data: &app::pointer::PointerData) {
        let mut input = self.input.borrow_mut();
        input.hovering = true;
        input.normalized_position = data.normalized_position;
        input.changed = true;
    }
}

impl app::pointer::PointerHandler for PointerTracker {
    fn on_enter(&mut self, data: &app::pointer::PointerData) {
        self.track(data);
    }

    fn on_move(&mut self, data: &app::pointer::PointerData) {
        self.track(data);
    }

    fn on_leave(&mut self, _data: &app::pointer::PointerData) {
        let mut input = self.input.borrow_mut();
        input.hovering = false;
        input.changed = true;
    }
}

/// Wires physics, scene, and pointer input into one animated ensemble.
pub struct Ballpit {
    config: crate::config::BallpitConfig,
    physics: physics::Physics,
    scene: scene::Scene,
    pointer: std::rc::Rc<std::cell::RefCell<PointerInput>>,
    registration: Option<app::pointer::Registration>,
    title: String,
    paused: bool,
    disposed: bool,
}

impl Ballpit {
    pub fn new(config: crate::config::BallpitConfig) -> Result<Self> {
        let gradient = scene::ColorGradient::from_hex(&config.colors)?;
        let physics = physics::Physics::new(config.simulation.clone(), config.seed)?;
        let scene = scene::Scene::new(
            physics.count(),
            config.simulation.follow_cursor,
            gradient,
            &config.lighting,
            config.material,
        );
        log::info!("Ballpit created with {} bodies", physics.count());

        Ok(Self {
            config,
            physics,
            scene,
            pointer: std::rc::Rc::default(),
            registration: None,
            title: "Ballpit".to_string(),
            paused: false,
            disposed: false,
        })
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        if let Some(title) = title {
            self.title = title;
        }
        self
    }

    pub fn config(&self) -> &crate::config::BallpitConfig {
        &self.config
    }

    pub fn physics(&self) -> &physics::Physics {
        &self.physics
    }

    pub fn scene(&self) -> &scene::Scene {
        &self.scene
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Routes pointer input from `surface` to the controlled body.
    pub fn attach<K: Copy + PartialEq + std::fmt::Debug>(
        &mut self,
        router: &mut app::pointer::PointerRouter<K>,
        surface: K,
    ) {
        if self.disposed {
            return;
        }
        let tracker = PointerTracker {
            input: self.pointer.clone(),
        };
        self.registration = Some(router.register(surface, Box::new(tracker)));
    }

    /// Discards the ensemble and builds `count` fresh bodies.
    /// On error the current ensemble is kept.
    pub fn set_count(&mut self, count: usize) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        let config = self.physics.config().with_count(count);
        let mut physics = physics::Physics::new(config, self.config.seed)?;
        physics.set_controlled(self.physics.is_controlled());
        physics.set_target(self.physics.target());
        self.physics = physics;
        self.scene.rebuild(count);
        self.scene.sync_frame(&self.physics);
        self.config.simulation.count = count;
        log::info!("Ballpit rebuilt with {count} bodies");
        Ok(())
    }

    /// Returns whether the simulation is paused afterwards.
    pub fn toggle_pause(&mut self) -> bool {
        if self.disposed {
            return self.paused;
        }
        self.paused = !self.paused;
        log::info!(
            "Ballpit {}",
            if self.paused { "paused" } else { "resumed" }
        );
        self.paused
    }

    /// Sizes the simulation box to the visible world area.
    pub fn fit_viewport(&mut self, state: &app::viewport::ViewportState) {
        if self.disposed {
            return;
        }
        self.physics
            .set_bounds(state.world_width / 2.0, state.world_height / 2.0);
    }

    /// Applies pointer input, advances the simulation, and syncs the draw list.
    pub fn advance(&mut self, camera: &app::camera::Camera, delta_time: f32) {
        if self.disposed {
            return;
        }
        self.apply_pointer(camera);
        if self.paused {
            return;
        }
        self.physics.step(delta_time);
        self.scene.sync_frame(&self.physics);
    }

    fn apply_pointer(&mut self, camera: &app::camera::Camera) {
        let input = {
            let mut input = self.pointer.borrow_mut();
            let snapshot = *input;
            input.changed = false;
            snapshot
        };
        if !input.changed {
            return;
        }

        if !input.hovering {
            self.physics.set_controlled(false);
            return;
        }

        self.physics.set_controlled(true);
        let plane = app::camera::Plane {
            normal: camera.direction(),
            constant: 0.0,
        };
        match camera.ray(&input.normalized_position).intersect_plane(&plane) {
            Some(target) => self.physics.set_target(target),
            None => log::trace!("Pointer ray missed the scene plane"),
        }
    }

    /// Releases pointer routing and the draw list. Safe to call more than once.
    pub fn dispose<K: Copy + PartialEq + std::fmt::Debug>(
        &mut self,
        router: &mut app::pointer::PointerRouter<K>,
    ) {
        if self.disposed {
            return;
        }
        if let Some(registration) = self.registration.take() {
            router.unregister(registration);
        }
        self.scene.dispose();
        self.disposed = true;
        log::info!("Ballpit disposed");
    }
}

impl app::app::State for Ballpit {
    fn title(&self) -> &str {
        &self.title
    }

    fn initialize(&mut self, context: &mut app::app::Context) {
        self.attach(&mut context.router, context.window_id);
        self.fit_viewport(context.viewport.state());
    }

    fn receive_event(
        &mut self,
        _context: &mut app::app::Context,
        event: &winit::event::Event<()>,
    ) {
        let winit::event::Event::WindowEvent {
            event:
                winit::event::WindowEvent::KeyboardInput {
                    event:
                        winit::event::KeyEvent {
                            physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                            state: winit::event::ElementState::Pressed,
                            repeat: false,
                            ..
                        },
                    ..
                },
            ..
        } = *event
        else {
            return;
        };

        let count = self.physics.count();
        let new_count = match key_code {
            winit::keyboard::KeyCode::Space => {
                self.toggle_pause();
                return;
            }
            winit::keyboard::KeyCode::Equal | winit::keyboard::KeyCode::NumpadAdd => {
                count + COUNT_STEP
            }
            winit::keyboard::KeyCode::Minus | winit::keyboard::KeyCode::NumpadSubtract => {
                count.saturating_sub(COUNT_STEP).max(1)
            }
            _ => return,
        };

        if let Err(error) = self.set_count(new_count) {
            log::error!("Failed to rebuild ballpit: {error}");
        }
    }

    fn resized(&mut self, context: &mut app::app::Context) {
        self.fit_viewport(context.viewport.state());
    }

    fn update(&mut self, context: &mut app::app::Context, timing: &app::viewport::FrameTiming) {
        self.advance(context.viewport.camera(), timing.delta);
    }

    fn scene(&mut self) -> Option<&mut scene::Scene> {
        (!self.disposed).then_some(&mut self.scene)
    }

    fn dispose(&mut self, context: &mut app::app::Context) {
        Ballpit::dispose(self, &mut context.router);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ballpit(count: usize) -> Ballpit {
        Ballpit::new(crate::config::BallpitConfig {
            simulation: physics::SimulationConfig {
                count,
                ..Default::default()
            },
            seed: 3,
            ..Default::default()
        })
        .unwrap()
    }

    fn bounds(surface: &u32) -> Option<app::pointer::Rect> {
        (*surface == 1).then_some(app::pointer::Rect {
            left: 0.0,
            top: 0.0,
            width: 100.0,
            height: 100.0,
        })
    }

    fn moved(x: f32, y: f32) -> app::pointer::PointerEvent {
        app::pointer::PointerEvent::Moved(nalgebra_glm::vec2(x, y))
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = crate::config::BallpitConfig {
            colors: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(Ballpit::new(config), Err(Error::Colors(_))));

        let config = crate::config::BallpitConfig {
            simulation: physics::SimulationConfig {
                count: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(Ballpit::new(config), Err(Error::Simulation(_))));
    }

    #[test]
    fn set_count_rebuilds_everything() {
        let mut ballpit = ballpit(20);
        let camera = app::camera::Camera::default();
        for _ in 0..30 {
            ballpit.advance(&camera, 0.016);
        }
        let generation = ballpit.scene().spheres.generation();

        ballpit.set_count(35).unwrap();

        assert_eq!(ballpit.physics().count(), 35);
        assert_eq!(ballpit.scene().spheres.len(), 35);
        assert_eq!(ballpit.scene().spheres.generation(), generation + 1);
        assert!(ballpit
            .physics()
            .velocities()
            .iter()
            .all(|velocity| velocity == nalgebra_glm::Vec3::zeros()));
    }

    #[test]
    fn failed_rebuild_keeps_ensemble() {
        let mut ballpit = ballpit(20);
        assert!(ballpit.set_count(0).is_err());
        assert_eq!(ballpit.physics().count(), 20);
        assert_eq!(ballpit.scene().spheres.len(), 20);
    }

    #[test]
    fn pause_freezes_simulation() {
        let mut ballpit = ballpit(5);
        let camera = app::camera::Camera::default();
        assert!(ballpit.toggle_pause());

        let before = ballpit.physics().positions().clone();
        ballpit.advance(&camera, 0.016);
        assert_eq!(ballpit.physics().positions(), &before);

        assert!(!ballpit.toggle_pause());
        ballpit.advance(&camera, 0.016);
        assert_ne!(ballpit.physics().positions(), &before);
    }

    #[test]
    fn pointer_drives_controlled_body() {
        let mut ballpit = ballpit(5);
        let mut router = app::pointer::PointerRouter::default();
        let camera = app::camera::Camera::default();
        ballpit.attach(&mut router, 1u32);
        assert!(!ballpit.physics().is_controlled());

        router.dispatch(moved(50.0, 50.0), bounds);
        router.dispatch(moved(100.0, 50.0), bounds);
        ballpit.advance(&camera, 0.016);

        assert!(ballpit.physics().is_controlled());
        let (world_width, _) = camera.world_size();
        let target = ballpit.physics().target();
        assert_abs_diff_eq!(target.x, world_width / 2.0, epsilon = 1e-3);
        assert_abs_diff_eq!(target.y, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(target.z, 0.0, epsilon = 1e-3);

        router.dispatch(moved(500.0, 50.0), bounds);
        ballpit.advance(&camera, 0.016);
        assert!(!ballpit.physics().is_controlled());
    }

    #[test]
    fn fit_viewport_tracks_world_size() {
        let mut ballpit = ballpit(5);
        let state = app::viewport::ViewportState {
            world_width: 30.0,
            world_height: 12.0,
            ..Default::default()
        };
        ballpit.fit_viewport(&state);
        assert_eq!(ballpit.physics().config().max_x, 15.0);
        assert_eq!(ballpit.physics().config().max_y, 6.0);

        ballpit.set_count(8).unwrap();
        assert_eq!(ballpit.physics().config().max_x, 15.0);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut ballpit = ballpit(5);
        let mut router = app::pointer::PointerRouter::default();
        ballpit.attach(&mut router, 1u32);
        assert!(router.is_listening());

        ballpit.dispose(&mut router);
        ballpit.dispose(&mut router);

        assert!(ballpit.is_disposed());
        assert!(!router.is_listening());
        assert!(ballpit.scene().spheres.is_disposed());
        assert!(ballpit.set_count(10).is_ok());
        assert_eq!(ballpit.physics().count(), 5);
        assert!(app::app::State::scene(&mut ballpit).is_none());
    }

    #[test]
    fn rebuild_while_paused_places_instances() {
        let mut ballpit = ballpit(5);
        assert!(ballpit.toggle_pause());
        ballpit.set_count(30).unwrap();

        let instances = ballpit.scene().spheres.instances();
        assert_eq!(instances.len(), 30);
        for (index, instance) in instances.iter().enumerate() {
            let translation = nalgebra_glm::vec3(
                instance.model[(0, 3)],
                instance.model[(1, 3)],
                instance.model[(2, 3)],
            );
            assert_eq!(translation, ballpit.physics().positions().get(index));
        }
    }
}
