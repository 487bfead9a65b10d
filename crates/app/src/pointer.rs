/// Bounds of a surface in client coordinates.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn contains(&self, point: &nalgebra_glm::Vec2) -> bool {
        point.x >= self.left
            && point.x <= self.left + self.width
            && point.y >= self.top
            && point.y <= self.top + self.height
    }
}

/// Per-surface pointer state handed to every callback.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct PointerData {
    pub hover: bool,
    pub touching: bool,
    /// Surface-local pixels.
    pub position: nalgebra_glm::Vec2,
    /// `[-1, 1]` on both axes, y pointing up.
    pub normalized_position: nalgebra_glm::Vec2,
}

impl PointerData {
    fn update(&mut self, pointer: &nalgebra_glm::Vec2, rect: &Rect) {
        self.position = nalgebra_glm::vec2(pointer.x - rect.left, pointer.y - rect.top);
        if rect.width > 0.0 && rect.height > 0.0 {
            self.normalized_position = nalgebra_glm::vec2(
                self.position.x / rect.width * 2.0 - 1.0,
                -(self.position.y / rect.height * 2.0 - 1.0),
            );
        }
    }
}

pub trait PointerHandler {
    fn on_enter(&mut self, _data: &PointerData) {}
    fn on_move(&mut self, _data: &PointerData) {}
    fn on_click(&mut self, _data: &PointerData) {}
    fn on_leave(&mut self, _data: &PointerData) {}
}

/// Raw input in client coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PointerEvent {
    Moved(nalgebra_glm::Vec2),
    Clicked(nalgebra_glm::Vec2),
    /// The pointer left the host entirely.
    Left,
    TouchStarted(nalgebra_glm::Vec2),
    TouchMoved(nalgebra_glm::Vec2),
    TouchEnded,
}

/// Token returned by [`PointerRouter::register`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Registration(u64);

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// The host should suppress its default scrolling for this event.
    pub prevent_default: bool,
}

struct Entry<K> {
    surface: K,
    registration: Registration,
    data: PointerData,
    handler: Box<dyn PointerHandler>,
}

/// Fans pointer input out to every registered surface.
///
/// Global listeners are attached with the first registration and
/// detached when the last one is released.
pub struct PointerRouter<K> {
    entries: Vec<Entry<K>>,
    next_registration: u64,
    listening: bool,
    attachments: usize,
}

impl<K> Default for PointerRouter<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_registration: 0,
            listening: false,
            attachments: 0,
        }
    }
}

impl<K: Copy + PartialEq + std::fmt::Debug> PointerRouter<K> {
    /// Registering a surface twice replaces its handler and keeps its token.
    pub fn register(&mut self, surface: K, handler: Box<dyn PointerHandler>) -> Registration {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.surface == surface) {
            entry.handler = handler;
            return entry.registration;
        }

        let registration = Registration(self.next_registration);
        self.next_registration += 1;
        self.entries.push(Entry {
            surface,
            registration,
            data: PointerData::default(),
            handler,
        });
        log::debug!("Registered pointer handler for {surface:?}");

        if !self.listening {
            self.listening = true;
            self.attachments += 1;
            log::info!("Attached global pointer listeners");
        }
        registration
    }

    /// Releasing an unknown or already released token does nothing.
    pub fn unregister(&mut self, registration: Registration) {
        let Some(index) = self
            .entries
            .iter()
            .position(|entry| entry.registration == registration)
        else {
            return;
        };
        let entry = self.entries.remove(index);
        log::debug!("Unregistered pointer handler for {:?}", entry.surface);

        if self.entries.is_empty() && self.listening {
            self.listening = false;
            log::info!("Detached global pointer listeners");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// How many times global listeners have been attached.
    pub fn attachments(&self) -> usize {
        self.attachments
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn data(&self, surface: K) -> Option<&PointerData> {
        self.entries
            .iter()
            .find(|entry| entry.surface == surface)
            .map(|entry| &entry.data)
    }

    /// Routes one event. `bounds` yields the current rectangle of a surface,
    /// or `None` if it cannot be measured.
    pub fn dispatch(&mut self, event: PointerEvent, bounds: impl Fn(&K) -> Option<Rect>) -> Dispatch {
        let mut dispatch = Dispatch::default();
        if !self.listening {
            return dispatch;
        }

        for entry in self.entries.iter_mut() {
            let rect = bounds(&entry.surface);
            let data = &mut entry.data;
            let handler = &mut entry.handler;
            let inside = |point: &nalgebra_glm::Vec2| rect.is_some_and(|rect| rect.contains(point));

            match event {
                PointerEvent::Moved(point) => {
                    if let (true, Some(rect)) = (inside(&point), rect) {
                        data.update(&point, &rect);
                        if !data.hover {
                            data.hover = true;
                            handler.on_enter(data);
                        }
                        handler.on_move(data);
                    } else if data.hover && !data.touching {
                        data.hover = false;
                        handler.on_leave(data);
                    }
                }
                PointerEvent::Clicked(point) => {
                    if let (true, Some(rect)) = (inside(&point), rect) {
                        data.update(&point, &rect);
                        handler.on_click(data);
                    }
                }
                PointerEvent::Left => {
                    if data.hover && !data.touching {
                        data.hover = false;
                        handler.on_leave(data);
                    }
                }
                PointerEvent::TouchStarted(point) => {
                    if let (true, Some(rect)) = (inside(&point), rect) {
                        dispatch.prevent_default = true;
                        data.touching = true;
                        data.update(&point, &rect);
                        if !data.hover {
                            data.hover = true;
                            handler.on_enter(data);
                        }
                        handler.on_move(data);
                    }
                }
                PointerEvent::TouchMoved(point) => {
                    if let Some(rect) = rect {
                        data.update(&point, &rect);
                    }
                    if inside(&point) {
                        dispatch.prevent_default = true;
                        if !data.hover {
                            data.hover = true;
                            handler.on_enter(data);
                        }
                        handler.on_move(data);
                    } else if data.hover && data.touching {
                        dispatch.prevent_default = true;
                        handler.on_move(data);
                    }
                }
                PointerEvent::TouchEnded => {
                    if data.touching {
                        data.touching = false;
                        if data.hover {
                            data.hover = false;
                            handler.on_leave(data);
                        }
                    }
                }
            }
        }

        dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: std::rc::Rc<std::cell::RefCell<Vec<(&'static str, PointerData)>>>,
    }

    impl PointerHandler for Recorder {
        fn on_enter(&mut self, data: &PointerData) {
            self.calls.borrow_mut().push(("enter", *data));
        }

        fn on_move(&mut self, data: &PointerData) {
            self.calls.borrow_mut().push(("move", *data));
        }

        fn on_click(&mut self, data: &PointerData) {
            self.calls.borrow_mut().push(("click", *data));
        }

        fn on_leave(&mut self, data: &PointerData) {
            self.calls.borrow_mut().push(("leave", *data));
        }
    }

    type Calls = std::rc::Rc<std::cell::RefCell<Vec<(&'static str, PointerData)>>>;

    fn recorder() -> (Box<dyn PointerHandler>, Calls) {
        let recorder = Recorder::default();
        let calls = recorder.calls.clone();
        (Box::new(recorder), calls)
    }

    fn names(calls: &Calls) -> Vec<&'static str> {
        calls.borrow().iter().map(|(name, _)| *name).collect()
    }

    fn bounds(surface: &u32) -> Option<Rect> {
        match surface {
            1 => Some(Rect {
                left: 0.0,
                top: 0.0,
                width: 100.0,
                height: 50.0,
            }),
            2 => Some(Rect {
                left: 200.0,
                top: 0.0,
                width: 100.0,
                height: 100.0,
            }),
            _ => None,
        }
    }

    #[test]
    fn enter_fires_before_move() {
        let mut router = PointerRouter::default();
        let (handler, calls) = recorder();
        router.register(1u32, handler);

        router.dispatch(PointerEvent::Moved(nalgebra_glm::vec2(10.0, 10.0)), bounds);
        router.dispatch(PointerEvent::Moved(nalgebra_glm::vec2(20.0, 10.0)), bounds);
        router.dispatch(PointerEvent::Moved(nalgebra_glm::vec2(500.0, 10.0)), bounds);
        router.dispatch(PointerEvent::Moved(nalgebra_glm::vec2(600.0, 10.0)), bounds);

        assert_eq!(names(&calls), ["enter", "move", "move", "leave"]);
    }

    #[test]
    fn positions_are_normalized_with_y_up() {
        let mut router = PointerRouter::default();
        let (handler, calls) = recorder();
        router.register(2u32, handler);

        router.dispatch(PointerEvent::Moved(nalgebra_glm::vec2(225.0, 25.0)), bounds);

        let (_, data) = calls.borrow()[1];
        assert_eq!(data.position, nalgebra_glm::vec2(25.0, 25.0));
        assert_eq!(data.normalized_position, nalgebra_glm::vec2(-0.5, 0.5));
    }

    #[test]
    fn surfaces_are_hit_tested_independently() {
        let mut router = PointerRouter::default();
        let (first, first_calls) = recorder();
        let (second, second_calls) = recorder();
        router.register(1u32, first);
        router.register(2u32, second);

        router.dispatch(PointerEvent::Moved(nalgebra_glm::vec2(250.0, 10.0)), bounds);
        router.dispatch(PointerEvent::Clicked(nalgebra_glm::vec2(250.0, 10.0)), bounds);

        assert!(names(&first_calls).is_empty());
        assert_eq!(names(&second_calls), ["enter", "move", "click"]);
        assert_eq!(router.attachments(), 1);
    }

    #[test]
    fn touch_drag_keeps_hover_until_release() {
        let mut router = PointerRouter::default();
        let (handler, calls) = recorder();
        router.register(1u32, handler);

        let started =
            router.dispatch(PointerEvent::TouchStarted(nalgebra_glm::vec2(10.0, 10.0)), bounds);
        assert!(started.prevent_default);

        router.dispatch(PointerEvent::Moved(nalgebra_glm::vec2(500.0, 10.0)), bounds);
        let moved =
            router.dispatch(PointerEvent::TouchMoved(nalgebra_glm::vec2(500.0, 10.0)), bounds);
        assert!(moved.prevent_default);
        assert!(router.data(1).unwrap().hover);

        router.dispatch(PointerEvent::TouchEnded, bounds);
        router.dispatch(PointerEvent::TouchEnded, bounds);

        assert_eq!(names(&calls), ["enter", "move", "move", "leave"]);
        let data = router.data(1).unwrap();
        assert!(!data.hover && !data.touching);
    }

    #[test]
    fn touch_outside_surfaces_keeps_default() {
        let mut router = PointerRouter::default();
        let (handler, _) = recorder();
        router.register(1u32, handler);

        let dispatch =
            router.dispatch(PointerEvent::TouchStarted(nalgebra_glm::vec2(150.0, 10.0)), bounds);
        assert!(!dispatch.prevent_default);
    }

    #[test]
    fn host_leave_fires_once() {
        let mut router = PointerRouter::default();
        let (handler, calls) = recorder();
        router.register(1u32, handler);

        router.dispatch(PointerEvent::Moved(nalgebra_glm::vec2(10.0, 10.0)), bounds);
        router.dispatch(PointerEvent::Left, bounds);
        router.dispatch(PointerEvent::Left, bounds);

        assert_eq!(names(&calls), ["enter", "move", "leave"]);
    }

    #[test]
    fn unmeasurable_surface_is_skipped() {
        let mut router = PointerRouter::default();
        let (handler, calls) = recorder();
        router.register(7u32, handler);

        router.dispatch(PointerEvent::Moved(nalgebra_glm::vec2(10.0, 10.0)), bounds);

        assert!(names(&calls).is_empty());
    }

    #[test]
    fn listeners_follow_registrations() {
        let mut router = PointerRouter::default();
        assert!(!router.is_listening());

        let (first, _) = recorder();
        let (second, _) = recorder();
        let first = router.register(1u32, first);
        let second = router.register(2u32, second);
        assert!(router.is_listening());

        router.unregister(first);
        router.unregister(first);
        assert!(router.is_listening());

        router.unregister(second);
        assert!(!router.is_listening());
        assert!(router.is_empty());

        let (third, _) = recorder();
        router.register(1u32, third);
        assert_eq!(router.attachments(), 2);
    }

    #[test]
    fn registering_twice_replaces_handler() {
        let mut router = PointerRouter::default();
        let (stale, stale_calls) = recorder();
        let (fresh, fresh_calls) = recorder();

        let first = router.register(1u32, stale);
        let second = router.register(1u32, fresh);
        assert_eq!(first, second);
        assert_eq!(router.len(), 1);

        router.dispatch(PointerEvent::Moved(nalgebra_glm::vec2(10.0, 10.0)), bounds);
        assert!(names(&stale_calls).is_empty());
        assert_eq!(names(&fresh_calls), ["enter", "move"]);
    }

    #[test]
    fn events_without_listeners_are_ignored() {
        let mut router = PointerRouter::default();
        let (handler, calls) = recorder();
        let registration = router.register(1u32, handler);
        router.unregister(registration);

        let dispatch =
            router.dispatch(PointerEvent::TouchStarted(nalgebra_glm::vec2(10.0, 10.0)), bounds);
        assert!(!dispatch.prevent_default);
        assert!(names(&calls).is_empty());
    }
}
