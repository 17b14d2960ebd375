// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The comparative grid manager.

use std::rc::Rc;

use smallvec::SmallVec;
use tandem_link::{CameraLink, Direction, Link, ObjectLink};
use tandem_proxy::{PropertyValue, Proxy, ProxyError, ProxySpace, names};

use crate::cue::ComparativeCue;
use crate::error::GridError;
use crate::event::{GridEvent, Listener};
use crate::layout::cell_rect;
use crate::settings::ComparativeSettings;

/// Properties a new view does not take over from the root view.
const VIEW_CLONE_EXCEPTIONS: [&str; 4] = [
    names::REPRESENTATIONS,
    names::VIEW_SIZE,
    names::VIEW_POSITION,
    names::VIEW_TIME,
];

/// Properties a clone does not take over from its representation.
const REPRESENTATION_CLONE_EXCEPTIONS: [&str; 5] = [
    names::REPRESENTATIONS,
    names::VIEW_SIZE,
    names::FORCE_USE_CACHE,
    names::CACHE_KEY,
    names::VIEW_POSITION,
];

/// Per-cell properties the view link never replicates.
const VIEW_LINK_EXCEPTIONS: [&str; 6] = [
    names::REPRESENTATIONS,
    names::FORCE_USE_CACHE,
    names::CACHE_KEY,
    names::VIEW_SIZE,
    names::VIEW_POSITION,
    names::VIEW_TIME,
];

/// Cache control stays local to each representation copy.
const CACHE_CONTROL: [&str; 2] = [names::FORCE_USE_CACHE, names::CACHE_KEY];

fn is_one_of(list: &[&str], name: &str) -> bool {
    list.iter().any(|n| *n == name)
}

struct CloneSlot {
    view: Proxy,
    clone: Proxy,
}

struct RepresentationEntry {
    original: Proxy,
    link: Rc<ObjectLink>,
    clones: Vec<CloneSlot>,
}

impl RepresentationEntry {
    /// Returns the copy of the representation shown in cell `index`.
    fn copy_at(&self, index: usize, views: &[Proxy], overlay: bool) -> Option<Proxy> {
        if index == 0 {
            return Some(self.original.clone());
        }
        if overlay {
            return self.clones.get(index - 1).map(|s| s.clone.clone());
        }
        let view = views.get(index)?;
        self.clones
            .iter()
            .find(|s| Proxy::ptr_eq(&s.view, view))
            .map(|s| s.clone.clone())
    }

    fn copies(&self) -> impl Iterator<Item = &Proxy> + '_ {
        core::iter::once(&self.original).chain(self.clones.iter().map(|s| &s.clone))
    }

    fn detach(&self, slot: &CloneSlot) {
        self.link.remove_endpoint(&slot.clone);
        hide(&slot.view, &slot.clone);
    }

    fn attach(&mut self, space: &ProxySpace, view: &Proxy) -> Result<(), ProxyError> {
        let clone = space.create_like(&self.original)?;
        for property in self.original.properties() {
            if is_one_of(&REPRESENTATION_CLONE_EXCEPTIONS, property.name()) {
                continue;
            }
            if let Some(target) = clone.property(property.name()) {
                target.copy_from(property);
            }
        }
        self.link.add_endpoint(&clone, Direction::OUTPUT);
        show(view, &clone);
        tracing::trace!(
            representation = %self.original.id(),
            clone = %clone.id(),
            view = %view.id(),
            "representation cloned"
        );
        self.clones.push(CloneSlot {
            view: view.clone(),
            clone,
        });
        Ok(())
    }

    /// Creates and destroys clones until every cell has exactly one copy.
    fn reconcile(
        &mut self,
        space: &ProxySpace,
        views: &[Proxy],
        overlay: bool,
        cells: usize,
    ) -> Result<(), ProxyError> {
        let Some(root) = views.first() else {
            return Ok(());
        };
        let (kept, stale): (Vec<_>, Vec<_>) = core::mem::take(&mut self.clones)
            .into_iter()
            .partition(|slot| {
                let in_root = Proxy::ptr_eq(&slot.view, root);
                if overlay {
                    in_root
                } else {
                    !in_root && views.iter().any(|v| Proxy::ptr_eq(v, &slot.view))
                }
            });
        self.clones = kept;
        for slot in &stale {
            self.detach(slot);
        }

        if overlay {
            let wanted = cells.saturating_sub(1);
            while self.clones.len() > wanted {
                if let Some(slot) = self.clones.pop() {
                    self.detach(&slot);
                }
            }
            while self.clones.len() < wanted {
                self.attach(space, root)?;
            }
        } else {
            for view in &views[1..] {
                if !self.clones.iter().any(|s| Proxy::ptr_eq(&s.view, view)) {
                    self.attach(space, view)?;
                }
            }
            self.clones.sort_by_key(|slot| {
                views
                    .iter()
                    .position(|v| Proxy::ptr_eq(v, &slot.view))
                    .unwrap_or(usize::MAX)
            });
        }
        Ok(())
    }
}

/// Adds `representation` to the representation list of `view`.
fn show(view: &Proxy, representation: &Proxy) {
    let Some(list) = view.property(names::REPRESENTATIONS) else {
        tracing::warn!(view = %view.id(), "view has no representation list");
        return;
    };
    let mut ids = list.get().proxies().to_vec();
    if !ids.contains(&representation.id()) {
        ids.push(representation.id());
        list.set(ids);
    }
}

/// Removes `representation` from the representation list of `view`.
fn hide(view: &Proxy, representation: &Proxy) {
    let Some(list) = view.property(names::REPRESENTATIONS) else {
        return;
    };
    let mut ids = list.get().proxies().to_vec();
    ids.retain(|id| *id != representation.id());
    list.set(ids);
}

fn set_if_present(proxy: &Proxy, name: &str, value: PropertyValue) {
    if let Some(property) = proxy.property(name) {
        property.set(value);
    }
}

fn is_visible(proxy: &Proxy) -> bool {
    proxy
        .get(names::VISIBILITY)
        .and_then(|v| v.as_bool())
        .unwrap_or(true)
}

/// Disables links for a scope and re-enables them on every exit path.
struct SuspendedLinks {
    links: SmallVec<[Rc<dyn Link>; 8]>,
}

impl SuspendedLinks {
    fn new(links: impl IntoIterator<Item = Rc<dyn Link>>) -> Self {
        let links = links
            .into_iter()
            .filter(|link| link.is_enabled())
            .inspect(|link| link.set_enabled(false))
            .collect();
        Self { links }
    }
}

impl Drop for SuspendedLinks {
    fn drop(&mut self) {
        for link in &self.links {
            link.set_enabled(true);
        }
    }
}

struct TrackedCue {
    cue: Rc<ComparativeCue>,
    /// Revision seen by the last successful update.
    seen: Option<u64>,
}

/// Maintains a grid of views that show clones of the same representations.
///
/// The manager starts from a root view. [`build`](Self::build) creates a
/// `dx` by `dy` grid of views of the root's kind; every representation added
/// with [`add_representation`](Self::add_representation) is shown in the
/// root view and cloned into every other cell. Edits to the root view or to
/// an original representation are replicated into the other cells by
/// [`ObjectLink`]s, while per-cell parameters (view time and animated
/// properties) are driven by [`ComparativeCue`]s during
/// [`update`](Self::update).
///
/// In overlay mode the grid collapses into the root view, which then shows
/// `dx * dy` copies of each representation.
///
/// ```rust
/// use tandem_comparative::ComparativeGridManager;
/// use tandem_proxy::{PropertyValue, ProxyDefinitionBuilder, ProxyFlags, ProxySpace, names};
///
/// let space = ProxySpace::new();
/// space.register(
///     ProxyDefinitionBuilder::new("views", "RenderView")
///         .flags(ProxyFlags::RENDERABLE)
///         .property(names::REPRESENTATIONS, PropertyValue::Proxies(Vec::new()))
///         .build(),
/// );
/// space.register(
///     ProxyDefinitionBuilder::new("representations", "Surface")
///         .property("Opacity", 1.0)
///         .build(),
/// );
///
/// let root = space.create("views", "RenderView").unwrap();
/// let surface = space.create("representations", "Surface").unwrap();
///
/// let mut grid = ComparativeGridManager::new(space.clone());
/// grid.initialize(&root);
/// grid.add_representation(&surface).unwrap();
/// grid.build(2, 2).unwrap();
///
/// assert_eq!(grid.views().len(), 4);
/// assert_eq!(grid.clones_of(&surface).len(), 3);
///
/// surface.set("Opacity", 0.5).unwrap();
/// for clone in grid.clones_of(&surface) {
///     assert_eq!(clone.get("Opacity"), Some(PropertyValue::Double(0.5)));
/// }
/// ```
pub struct ComparativeGridManager {
    space: ProxySpace,
    settings: ComparativeSettings,
    /// `views[0]` is the root view.
    views: Vec<Proxy>,
    view_link: Rc<ObjectLink>,
    camera_link: Rc<CameraLink>,
    entries: Vec<RepresentationEntry>,
    cues: Vec<TrackedCue>,
    outdated: bool,
    listeners: Vec<Listener>,
}

impl ComparativeGridManager {
    /// Creates an uninitialized manager with default settings.
    #[must_use]
    pub fn new(space: ProxySpace) -> Self {
        Self::with_settings(space, ComparativeSettings::default())
    }

    /// Creates an uninitialized manager.
    ///
    /// The dimensions in `settings` are used by the first
    /// [`rebuild`](Self::rebuild); nothing is built before that.
    #[must_use]
    pub fn with_settings(space: ProxySpace, settings: ComparativeSettings) -> Self {
        let view_link = ObjectLink::new();
        for name in VIEW_LINK_EXCEPTIONS.into_iter().chain(names::CAMERA_PROPERTIES) {
            view_link.add_exception(name);
        }
        Self {
            space,
            settings,
            views: Vec::new(),
            view_link,
            camera_link: CameraLink::new(),
            entries: Vec::new(),
            cues: Vec::new(),
            outdated: false,
            listeners: Vec::new(),
        }
    }

    /// Adopts `root` as the root view.
    ///
    /// One-shot: later calls are ignored.
    pub fn initialize(&mut self, root: &Proxy) {
        if let Some(current) = self.views.first() {
            tracing::debug!(root = %current.id(), ignored = %root.id(), "comparative grid already initialized");
            return;
        }
        self.view_link.add_endpoint(root, Direction::INPUT);
        self.camera_link
            .add_endpoint(root, Direction::INPUT | Direction::OUTPUT);
        self.views.push(root.clone());
        self.outdated = true;
        tracing::debug!(root = %root.id(), "comparative grid initialized");
    }

    /// Returns the root view, once initialized.
    #[must_use]
    pub fn root_view(&self) -> Option<&Proxy> {
        self.views.first()
    }

    fn root(&self) -> Result<Proxy, GridError> {
        self.views.first().cloned().ok_or_else(|| {
            tracing::error!("comparative grid used before initialization");
            GridError::NotInitialized
        })
    }

    fn ensure_clonable(&self, proxy: &Proxy) -> Result<(), GridError> {
        if self.space.definition(proxy.group(), proxy.kind()).is_none() {
            tracing::error!(proxy = %proxy.id(), kind = proxy.kind(), "kind is not registered in the grid's space");
            return Err(ProxyError::UnknownDefinition {
                group: proxy.group().to_owned(),
                name: proxy.kind().to_owned(),
            }
            .into());
        }
        Ok(())
    }

    fn cell_count(&self) -> usize {
        let (dx, dy) = self.settings.dimensions;
        dx as usize * dy as usize
    }

    /// Builds a `dx` by `dy` grid.
    ///
    /// Views and clones are created or destroyed to match; in overlay mode a
    /// single view remains and each representation gets `dx * dy - 1` clones
    /// in it. Fires [`GridEvent::LayoutChanged`].
    pub fn build(&mut self, dx: u32, dy: u32) -> Result<(), GridError> {
        if dx == 0 || dy == 0 {
            tracing::error!(dx, dy, "comparative grid dimensions must be positive");
            return Err(GridError::InvalidDimensions { dx, dy });
        }
        let root = self.root()?;
        self.ensure_clonable(&root)?;
        for entry in &self.entries {
            self.ensure_clonable(&entry.original)?;
        }

        self.settings.dimensions = (dx, dy);
        let overlay = self.settings.overlay;
        let required = if overlay { 1 } else { self.cell_count() };
        while self.views.len() > required {
            if let Some(view) = self.views.last().cloned() {
                self.remove_view(&view)?;
            }
        }
        while self.views.len() < required {
            self.add_view(&root)?;
        }

        let cells = self.cell_count();
        for entry in &mut self.entries {
            entry.reconcile(&self.space, &self.views, overlay, cells)?;
        }

        self.update_layout();
        self.outdated = true;
        tracing::debug!(dx, dy, overlay, views = self.views.len(), "comparative grid built");
        self.emit(GridEvent::LayoutChanged);
        Ok(())
    }

    /// Rebuilds with the configured dimensions.
    pub fn rebuild(&mut self) -> Result<(), GridError> {
        let (dx, dy) = self.settings.dimensions;
        self.build(dx, dy)
    }

    fn add_view(&mut self, root: &Proxy) -> Result<(), GridError> {
        let view = self.space.create_like(root)?;
        for property in root.properties() {
            if is_one_of(&VIEW_CLONE_EXCEPTIONS, property.name()) {
                continue;
            }
            if let Some(target) = view.property(property.name()) {
                target.copy_from(property);
            }
        }
        self.view_link.add_endpoint(&view, Direction::OUTPUT);
        self.camera_link
            .add_endpoint(&view, Direction::INPUT | Direction::OUTPUT);
        tracing::trace!(view = %view.id(), "comparative view created");
        self.views.push(view);
        Ok(())
    }

    fn remove_view(&mut self, view: &Proxy) -> Result<(), GridError> {
        let root = self.root()?;
        if Proxy::ptr_eq(&root, view) {
            tracing::error!(view = %view.id(), "the root view cannot be removed from the grid");
            return Err(GridError::RootViewRemoval { view: view.id() });
        }
        let Some(index) = self.views.iter().position(|v| Proxy::ptr_eq(v, view)) else {
            return Ok(());
        };
        for entry in &mut self.entries {
            let (stale, kept): (Vec<_>, Vec<_>) = core::mem::take(&mut entry.clones)
                .into_iter()
                .partition(|slot| Proxy::ptr_eq(&slot.view, view));
            entry.clones = kept;
            for slot in &stale {
                entry.detach(slot);
            }
        }
        self.view_link.remove_endpoint(view);
        self.camera_link.remove_endpoint(view);
        self.views.remove(index);
        tracing::trace!(view = %view.id(), "comparative view removed");
        Ok(())
    }

    /// Assigns each view its cell size and position.
    ///
    /// Views without size or position properties are left alone.
    pub fn update_layout(&self) {
        for (view, index) in self.views.iter().zip(0_u32..) {
            let rect = cell_rect(&self.settings, index);
            set_if_present(
                view,
                names::VIEW_SIZE,
                PropertyValue::ints([rect.size.0, rect.size.1]),
            );
            set_if_present(
                view,
                names::VIEW_POSITION,
                PropertyValue::ints([rect.position.0, rect.position.1]),
            );
        }
    }

    /// Switches between one view per cell and overlay mode.
    ///
    /// An initialized grid is rebuilt with its current dimensions.
    pub fn set_overlay(&mut self, overlay: bool) -> Result<(), GridError> {
        if self.settings.overlay == overlay {
            return Ok(());
        }
        self.settings.overlay = overlay;
        self.outdated = true;
        if self.views.is_empty() {
            return Ok(());
        }
        self.rebuild()
    }

    /// Sets the gap between cells and lays the grid out again.
    pub fn set_spacing(&mut self, x: u32, y: u32) {
        self.settings.spacing = (x, y);
        self.update_layout();
    }

    /// Sets the total grid size and lays the grid out again.
    pub fn set_view_size(&mut self, width: u32, height: u32) {
        self.settings.view_size = (width, height);
        self.update_layout();
    }

    /// Sets the grid origin and lays the grid out again.
    pub fn set_view_position(&mut self, x: i32, y: i32) {
        self.settings.view_position = (x, y);
        self.update_layout();
    }

    /// Sets the time shown by cells without a time cue.
    pub fn set_view_time(&mut self, time: f64) {
        if self.settings.view_time != time {
            self.settings.view_time = time;
            self.outdated = true;
        }
    }

    /// Starts tracking `representation`.
    ///
    /// The representation is shown in the root view and cloned into every
    /// other cell; later edits to it are replicated to the clones, except for
    /// cache control. Adding a tracked representation is a no-op. Fires
    /// [`GridEvent::RepresentationSetChanged`].
    pub fn add_representation(&mut self, representation: &Proxy) -> Result<(), GridError> {
        if self.is_tracked(representation) {
            tracing::debug!(representation = %representation.id(), "representation already tracked");
            return Ok(());
        }
        let root = self.root()?;
        self.ensure_clonable(representation)?;

        self.outdated = true;
        show(&root, representation);
        let link = ObjectLink::new();
        link.add_endpoint(representation, Direction::INPUT);
        for name in CACHE_CONTROL {
            link.add_exception(name);
        }
        let mut entry = RepresentationEntry {
            original: representation.clone(),
            link,
            clones: Vec::new(),
        };
        let cells = self.cell_count();
        entry.reconcile(&self.space, &self.views, self.settings.overlay, cells)?;
        tracing::debug!(
            representation = %representation.id(),
            clones = entry.clones.len(),
            "representation tracked"
        );
        self.entries.push(entry);
        self.emit(GridEvent::RepresentationSetChanged);
        Ok(())
    }

    /// Stops tracking `representation` and destroys its clones.
    ///
    /// Untracked representations are ignored. Fires
    /// [`GridEvent::RepresentationSetChanged`].
    pub fn remove_representation(&mut self, representation: &Proxy) {
        let Some(index) = self
            .entries
            .iter()
            .position(|e| Proxy::ptr_eq(&e.original, representation))
        else {
            tracing::debug!(representation = %representation.id(), "representation not tracked");
            return;
        };
        self.outdated = true;
        let entry = self.entries.remove(index);
        for slot in &entry.clones {
            hide(&slot.view, &slot.clone);
        }
        if let Some(root) = self.views.first() {
            hide(root, &entry.original);
        }
        tracing::debug!(representation = %representation.id(), "representation untracked");
        drop(entry);
        self.emit(GridEvent::RepresentationSetChanged);
    }

    /// Stops tracking every representation.
    pub fn remove_all_representations(&mut self) {
        while let Some(representation) = self.entries.last().map(|e| e.original.clone()) {
            self.remove_representation(&representation);
        }
    }

    /// Adds an animation cue. Adding a cue twice is a no-op.
    pub fn add_cue(&mut self, cue: Rc<ComparativeCue>) {
        if self.cues.iter().any(|t| Rc::ptr_eq(&t.cue, &cue)) {
            return;
        }
        self.cues.push(TrackedCue { cue, seen: None });
    }

    /// Removes an animation cue.
    pub fn remove_cue(&mut self, cue: &Rc<ComparativeCue>) -> bool {
        let Some(index) = self.cues.iter().position(|t| Rc::ptr_eq(&t.cue, cue)) else {
            return false;
        };
        self.cues.remove(index);
        self.outdated = true;
        true
    }

    /// Returns the animation cues in evaluation order.
    pub fn cues(&self) -> impl Iterator<Item = &Rc<ComparativeCue>> + '_ {
        self.cues.iter().map(|t| &t.cue)
    }

    /// Returns `true` if [`update`](Self::update) has work to do.
    #[must_use]
    pub fn is_outdated(&self) -> bool {
        self.outdated || self.cues.iter().any(|t| t.seen != Some(t.cue.revision()))
    }

    /// Forces every representation copy to recompute its data.
    ///
    /// For each copy, cache forcing is switched off and pushed, the pipeline
    /// is marked dirty, then cache forcing is switched on and pushed again.
    /// A dirty mark made while cache forcing is on would be absorbed.
    pub fn clear_data_caches(&self) {
        for entry in &self.entries {
            for copy in entry.copies() {
                let Some(force) = copy.property(names::FORCE_USE_CACHE) else {
                    continue;
                };
                force.set(false);
                copy.update_property(names::FORCE_USE_CACHE);
                copy.mark_dirty();
                force.set(true);
                copy.update_property(names::FORCE_USE_CACHE);
            }
        }
    }

    /// Refreshes every cell if the grid is outdated.
    ///
    /// Cells are visited row by row. For each cell the view time comes from
    /// the first enabled cue without a target (or the configured view time),
    /// every other cue assigns its value to that cell's copy of its target,
    /// and the cell's visible representations are updated at that time
    /// before the view renders. Replication between copies and camera
    /// mirroring between views are suspended meanwhile.
    ///
    /// Returns `Ok(false)` if the grid was up to date. On error the grid
    /// stays outdated.
    pub fn update(&mut self) -> Result<bool, GridError> {
        if !self.is_outdated() {
            return Ok(false);
        }
        let root = self.root()?;
        for (index, tracked) in self.cues.iter().enumerate() {
            if let Some(target) = tracked.cue.target() {
                if target.proxy().is_none() {
                    tracing::error!(
                        cue = index,
                        property = target.property(),
                        "cue animates a destroyed proxy"
                    );
                    return Err(GridError::CueTargetLost { cue: index });
                }
            }
        }

        self.clear_data_caches();
        {
            let _suspended = SuspendedLinks::new(
                self.entries
                    .iter()
                    .map(|e| e.link.clone() as Rc<dyn Link>)
                    .chain([
                        self.view_link.clone() as Rc<dyn Link>,
                        self.camera_link.clone() as Rc<dyn Link>,
                    ]),
            );
            let (dx, dy) = self.settings.dimensions;
            let overlay = self.settings.overlay;
            let time_cue = self
                .cues
                .iter()
                .map(|t| &t.cue)
                .find(|c| c.is_enabled() && c.is_time_cue())
                .cloned();

            for y in 0..dy {
                for x in 0..dx {
                    let index = (y * dx + x) as usize;
                    let time = time_cue
                        .as_ref()
                        .and_then(|c| c.value_at(x, y, dx, dy))
                        .unwrap_or(self.settings.view_time);
                    self.apply_cues(x, y, index);

                    if overlay {
                        for copy in self.copies_at(index) {
                            if is_visible(&copy) {
                                copy.update_pipeline(time);
                            }
                        }
                    } else if let Some(view) = self.views.get(index) {
                        set_if_present(view, names::VIEW_TIME, PropertyValue::Double(time));
                        self.update_view(view, time);
                        view.render(false);
                    }
                }
            }
            if overlay {
                set_if_present(
                    &root,
                    names::VIEW_TIME,
                    PropertyValue::Double(self.settings.view_time),
                );
                root.render(false);
            }
        }

        for tracked in &mut self.cues {
            tracked.seen = Some(tracked.cue.revision());
        }
        self.outdated = false;
        tracing::debug!(cells = self.cell_count(), "comparative grid updated");
        Ok(true)
    }

    fn apply_cues(&self, x: u32, y: u32, index: usize) {
        let (dx, dy) = self.settings.dimensions;
        for tracked in &self.cues {
            let cue = &tracked.cue;
            if !cue.is_enabled() {
                continue;
            }
            let Some(target) = cue.target() else {
                continue;
            };
            let (Some(proxy), Some(value)) = (target.proxy(), cue.value_at(x, y, dx, dy)) else {
                continue;
            };
            let proxy = self.cell_target(&proxy, index);
            let Some(property) = proxy.property(target.property()) else {
                tracing::warn!(proxy = %proxy.id(), property = target.property(), "cue target has no such property");
                continue;
            };
            match property.get().with_element(target.element(), value) {
                Some(next) => {
                    property.set(next);
                }
                None => {
                    tracing::warn!(
                        proxy = %proxy.id(),
                        property = target.property(),
                        element = target.element(),
                        "cue value does not fit the animated property"
                    );
                }
            }
        }
    }

    /// Maps a cue target onto the proxy playing its part in cell `index`.
    fn cell_target(&self, proxy: &Proxy, index: usize) -> Proxy {
        let overlay = self.settings.overlay;
        if let Some(entry) = self.entry_of(proxy) {
            return entry
                .copy_at(index, &self.views, overlay)
                .unwrap_or_else(|| proxy.clone());
        }
        if !overlay && self.views.first().is_some_and(|root| Proxy::ptr_eq(root, proxy)) {
            if let Some(view) = self.views.get(index) {
                return view.clone();
            }
        }
        proxy.clone()
    }

    fn copies_at(&self, index: usize) -> Vec<Proxy> {
        self.entries
            .iter()
            .filter_map(|e| e.copy_at(index, &self.views, self.settings.overlay))
            .collect()
    }

    fn update_view(&self, view: &Proxy, time: f64) {
        let Some(list) = view.get(names::REPRESENTATIONS) else {
            return;
        };
        for id in list.proxies() {
            match self.space.locate(*id) {
                Some(representation) if is_visible(&representation) => {
                    representation.update_pipeline(time);
                }
                Some(_) => {}
                None => {
                    tracing::warn!(view = %view.id(), representation = %id, "view lists a destroyed representation");
                }
            }
        }
    }

    fn entry_of(&self, representation: &Proxy) -> Option<&RepresentationEntry> {
        self.entries
            .iter()
            .find(|e| Proxy::ptr_eq(&e.original, representation))
    }

    /// Returns `true` if `representation` is tracked.
    #[must_use]
    pub fn is_tracked(&self, representation: &Proxy) -> bool {
        self.entry_of(representation).is_some()
    }

    /// Returns the views, root first, in row-major cell order.
    #[must_use]
    pub fn views(&self) -> &[Proxy] {
        &self.views
    }

    /// Returns the grid dimensions.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.settings.dimensions
    }

    /// Returns `true` in overlay mode.
    #[must_use]
    pub fn is_overlay(&self) -> bool {
        self.settings.overlay
    }

    /// Returns the current settings.
    #[must_use]
    pub fn settings(&self) -> &ComparativeSettings {
        &self.settings
    }

    /// Returns the tracked representations in the order they were added.
    #[must_use]
    pub fn representations(&self) -> Vec<Proxy> {
        self.entries.iter().map(|e| e.original.clone()).collect()
    }

    /// Returns the clones of `representation`, in cell order.
    ///
    /// Untracked representations have no clones; a warning is logged.
    #[must_use]
    pub fn clones_of(&self, representation: &Proxy) -> Vec<Proxy> {
        let Some(entry) = self.entry_of(representation) else {
            tracing::warn!(representation = %representation.id(), "clones requested for an untracked representation");
            return Vec::new();
        };
        entry.clones.iter().map(|s| s.clone.clone()).collect()
    }

    /// Returns the copy of `representation` shown in cell `(x, y)`.
    ///
    /// `None` if the cell is outside the grid.
    pub fn copy_in_cell(
        &self,
        representation: &Proxy,
        x: u32,
        y: u32,
    ) -> Result<Option<Proxy>, GridError> {
        let entry = self
            .entry_of(representation)
            .ok_or(GridError::UntrackedRepresentation {
                representation: representation.id(),
            })?;
        let (dx, dy) = self.settings.dimensions;
        if x >= dx || y >= dy {
            return Ok(None);
        }
        Ok(entry.copy_at((y * dx + x) as usize, &self.views, self.settings.overlay))
    }

    /// Returns the tracked copies (originals and clones) shown in `view`.
    #[must_use]
    pub fn representations_for_view(&self, view: &Proxy) -> Vec<Proxy> {
        let is_root = self.views.first().is_some_and(|r| Proxy::ptr_eq(r, view));
        let mut shown = Vec::new();
        for entry in &self.entries {
            if is_root {
                shown.push(entry.original.clone());
            }
            shown.extend(
                entry
                    .clones
                    .iter()
                    .filter(|s| Proxy::ptr_eq(&s.view, view))
                    .map(|s| s.clone.clone()),
            );
        }
        shown
    }

    /// Returns the tracked copies making up cell `(x, y)`.
    ///
    /// Cells outside the grid are empty; a warning is logged.
    #[must_use]
    pub fn representations_at(&self, x: u32, y: u32) -> Vec<Proxy> {
        let (dx, dy) = self.settings.dimensions;
        if x >= dx || y >= dy {
            tracing::warn!(x, y, dx, dy, "cell outside the comparative grid");
            return Vec::new();
        }
        let index = (y * dx + x) as usize;
        if self.settings.overlay {
            return self.copies_at(index);
        }
        self.views
            .get(index)
            .map(|view| self.representations_for_view(view))
            .unwrap_or_default()
    }

    /// Registers a listener for [`GridEvent`]s.
    pub fn subscribe(&mut self, listener: impl FnMut(&GridEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: GridEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

impl Drop for ComparativeGridManager {
    fn drop(&mut self) {
        for entry in &self.entries {
            entry.link.set_enabled(false);
            for slot in &entry.clones {
                hide(&slot.view, &slot.clone);
            }
        }
    }
}

impl core::fmt::Debug for ComparativeGridManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComparativeGridManager")
            .field("settings", &self.settings)
            .field(
                "views",
                &self.views.iter().map(Proxy::id).collect::<Vec<_>>(),
            )
            .field(
                "representations",
                &self.entries.iter().map(|e| e.original.id()).collect::<Vec<_>>(),
            )
            .field("cues", &self.cues.len())
            .field("outdated", &self.is_outdated())
            .finish_non_exhaustive()
    }
}
