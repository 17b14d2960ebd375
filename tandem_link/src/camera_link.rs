// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Links mirroring cameras between views.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tandem_proxy::{Interaction, Proxy, ProxyId, ProxyLocator, ProxyObserver, names};

use crate::direction::Direction;
use crate::endpoint::LinkEndpoint;
use crate::filter::ExceptionFilter;
use crate::link::Link;
use crate::link_core::LinkCore;
use crate::object_link::{apply, copy_property, output_proxies, push_property};
use crate::state::{LinkState, LinkStateError};

/// An object link restricted to camera properties that also mirrors renders.
///
/// Only [`names::CAMERA_PROPERTIES`] replicate. Gestures on an INPUT view
/// (`Render`, `End`, `ResetCamera`) copy the whole camera to the OUTPUT views
/// and then render them; `Begin` does nothing.
pub struct CameraLink {
    core: LinkCore,
    exceptions: RefCell<ExceptionFilter>,
    synchronize_interactive_renders: Cell<bool>,
}

impl CameraLink {
    /// Creates an empty, enabled link that mirrors interactive renders.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let observer: Weak<dyn ProxyObserver> = this.clone();
            Self {
                core: LinkCore::new(observer),
                exceptions: RefCell::new(ExceptionFilter::new()),
                synchronize_interactive_renders: Cell::new(true),
            }
        })
    }

    /// Links `view` in role `direction`.
    pub fn add_endpoint(&self, view: &Proxy, direction: Direction) -> bool {
        self.core.insert(LinkEndpoint::proxy(view, direction))
    }

    /// Removes the first endpoint for `view`.
    pub fn remove_endpoint(&self, view: &Proxy) -> bool {
        let id = view.id();
        self.core.remove_first(|e| e.is_proxy(id)).is_some()
    }

    /// Stops the camera property `name` from propagating.
    pub fn add_exception(&self, name: &str) {
        self.exceptions.borrow_mut().insert(name);
    }

    /// Lets `name` propagate again.
    pub fn remove_exception(&self, name: &str) {
        self.exceptions.borrow_mut().remove(name);
    }

    /// Controls whether interactive renders are mirrored.
    pub fn set_synchronize_interactive_renders(&self, synchronize: bool) {
        self.synchronize_interactive_renders.set(synchronize);
    }

    /// Returns `true` if interactive renders are mirrored.
    #[must_use]
    pub fn synchronize_interactive_renders(&self) -> bool {
        self.synchronize_interactive_renders.get()
    }

    /// Renders every renderable OUTPUT view other than `caller`.
    ///
    /// Interactive renders are skipped when they are not mirrored.
    pub fn update_views(&self, caller: &Proxy, interactive: bool) {
        if interactive && !self.synchronize_interactive_renders() {
            return;
        }
        for view in output_proxies(&self.core, caller) {
            if view.is_renderable() {
                view.render(interactive);
            }
        }
    }

    /// Replaces the endpoints with a persisted block.
    pub fn load_state(
        &self,
        state: &LinkState,
        locator: &dyn ProxyLocator,
    ) -> Result<(), LinkStateError> {
        self.core.load_state(state, locator, false)
    }

    fn replicates(&self, name: &str) -> bool {
        names::CAMERA_PROPERTIES.iter().any(|p| *p == name)
            && !self.exceptions.borrow().contains(name)
    }

    fn on_interaction(&self, caller: &Proxy, event: Interaction) {
        let interactive = match event {
            Interaction::Begin => {
                tracing::trace!(view = %caller.id(), "camera gesture started");
                return;
            }
            Interaction::Render { interactive } => interactive,
            Interaction::End | Interaction::ResetCamera => false,
        };
        if !self.core.is_enabled() || !self.core.has_input(caller.id()) {
            return;
        }
        let Some(_guard) = self.core.enter() else {
            return;
        };
        for name in names::CAMERA_PROPERTIES {
            if self.replicates(name) {
                copy_property(&self.core, caller, name);
            }
        }
        self.update_views(caller, interactive);
    }
}

impl Link for CameraLink {
    fn core(&self) -> &LinkCore {
        &self.core
    }

    fn on_property_changed(&self, caller: &Proxy, name: &str) {
        if self.replicates(name) {
            copy_property(&self.core, caller, name);
        }
    }

    fn on_apply_requested(&self, caller: &Proxy) {
        apply(&self.core, caller);
    }

    fn on_property_pushed(&self, caller: &Proxy, name: &str) {
        if self.replicates(name) {
            push_property(&self.core, caller, name);
        }
    }
}

impl ProxyObserver for CameraLink {
    fn property_changed(&self, proxy: &Proxy, name: &str) {
        self.dispatch_property_changed(proxy, name);
    }

    fn resource_updated(&self, proxy: &Proxy) {
        self.dispatch_apply_requested(proxy);
    }

    fn property_pushed(&self, proxy: &Proxy, name: &str) {
        self.dispatch_property_pushed(proxy, name);
    }

    fn interaction(&self, proxy: &Proxy, event: Interaction) {
        self.on_interaction(proxy, event);
    }

    fn proxy_destroyed(&self, id: ProxyId) {
        self.core.forget_proxy(id);
    }
}

impl core::fmt::Debug for CameraLink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CameraLink")
            .field("core", &self.core)
            .field(
                "synchronize_interactive_renders",
                &self.synchronize_interactive_renders.get(),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_proxy::{PropertyValue, ProxyDefinitionBuilder, ProxyFlags, ProxySpace};

    fn views() -> (ProxySpace, Proxy, Proxy) {
        let space = ProxySpace::new();
        let mut builder = ProxyDefinitionBuilder::new("views", "RenderView")
            .flags(ProxyFlags::RENDERABLE);
        for name in names::CAMERA_PROPERTIES {
            builder = builder.property(name, PropertyValue::doubles([0.0, 0.0, 1.0]));
        }
        space.register(builder.property("Background", 0.0).build());
        let a = space.create("views", "RenderView").unwrap();
        let b = space.create("views", "RenderView").unwrap();
        (space, a, b)
    }

    fn linked() -> (ProxySpace, Proxy, Proxy, Rc<CameraLink>) {
        let (space, a, b) = views();
        let link = CameraLink::new();
        link.add_endpoint(&a, Direction::INPUT);
        link.add_endpoint(&b, Direction::OUTPUT);
        (space, a, b, link)
    }

    #[test]
    fn only_camera_properties_replicate() {
        let (_space, a, b, _link) = linked();
        a.set("Background", 1.0).unwrap();
        a.set(names::CAMERA_POSITION, PropertyValue::doubles([5.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(b.get("Background"), Some(PropertyValue::Double(0.0)));
        assert_eq!(
            b.get(names::CAMERA_POSITION),
            Some(PropertyValue::doubles([5.0, 0.0, 0.0]))
        );
    }

    #[test]
    fn gesture_end_renders_outputs() {
        let (_space, a, b, _link) = linked();
        a.interact(Interaction::Begin);
        assert_eq!(b.pipeline().still_renders, 0);
        a.interact(Interaction::End);
        assert_eq!(b.pipeline().still_renders, 1);
        a.interact(Interaction::ResetCamera);
        assert_eq!(b.pipeline().still_renders, 2);
    }

    #[test]
    fn interactive_renders_can_be_skipped() {
        let (_space, a, b, link) = linked();
        a.interact(Interaction::Render { interactive: true });
        assert_eq!(b.pipeline().interactive_renders, 1);

        link.set_synchronize_interactive_renders(false);
        a.interact(Interaction::Render { interactive: true });
        assert_eq!(b.pipeline().interactive_renders, 1);
        a.interact(Interaction::Render { interactive: false });
        assert_eq!(b.pipeline().still_renders, 1);
    }

    #[test]
    fn output_gestures_are_ignored() {
        let (_space, a, b, _link) = linked();
        b.interact(Interaction::End);
        assert_eq!(a.pipeline().still_renders, 0);
    }

    #[test]
    fn bidirectional_views_do_not_loop() {
        let (_space, a, b) = views();
        let link = CameraLink::new();
        link.add_endpoint(&a, Direction::INPUT | Direction::OUTPUT);
        link.add_endpoint(&b, Direction::INPUT | Direction::OUTPUT);

        b.set(names::CAMERA_VIEW_ANGLE, 45.0).unwrap();
        assert_eq!(a.get(names::CAMERA_VIEW_ANGLE), Some(PropertyValue::Double(45.0)));
        a.interact(Interaction::End);
        assert_eq!(b.pipeline().still_renders, 1);
        assert_eq!(a.pipeline().still_renders, 0);
    }
}
