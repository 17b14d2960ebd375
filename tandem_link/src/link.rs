// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tandem_proxy::Proxy;

use crate::link_core::LinkCore;
use crate::state::LinkState;

/// The propagation contract shared by every link kind.
///
/// Implementors supply [`core`](Link::core) and the three `on_*` callbacks,
/// which fan a change out to OUTPUT endpoints. The `dispatch_*` methods are
/// the entry points an observer implementation forwards to: they drop
/// notifications from proxies without an INPUT endpoint, ignore everything
/// while the link is disabled, and suppress nested re-entry into the same
/// link.
pub trait Link {
    /// Returns the shared endpoint bookkeeping.
    fn core(&self) -> &LinkCore;

    /// Property `name` of the INPUT proxy `caller` changed.
    fn on_property_changed(&self, caller: &Proxy, name: &str);

    /// The INPUT proxy `caller` pushed its pending values.
    fn on_apply_requested(&self, caller: &Proxy);

    /// The INPUT proxy `caller` pushed property `name`.
    fn on_property_pushed(&self, caller: &Proxy, name: &str);

    /// Enables or disables propagation; endpoints are kept either way.
    fn set_enabled(&self, enabled: bool) {
        self.core().set_enabled(enabled);
    }

    /// Returns `true` unless propagation was disabled.
    fn is_enabled(&self) -> bool {
        self.core().is_enabled()
    }

    /// Controls whether apply requests reach OUTPUT proxies.
    fn set_propagate_apply(&self, propagate: bool) {
        self.core().set_propagate_apply(propagate);
    }

    /// Returns `true` if apply requests reach OUTPUT proxies.
    fn propagate_apply(&self) -> bool {
        self.core().propagate_apply()
    }

    /// Removes every endpoint. The enabled flag is left untouched.
    fn remove_all_links(&self) {
        self.core().clear();
    }

    /// Returns the number of endpoints.
    fn endpoint_count(&self) -> usize {
        self.core().len()
    }

    /// Persists the endpoint list.
    fn save_state(&self) -> LinkState {
        self.core().save_state()
    }

    /// Routes a property change into [`on_property_changed`](Link::on_property_changed).
    fn dispatch_property_changed(&self, caller: &Proxy, name: &str) {
        let core = self.core();
        if !core.is_enabled() || !core.has_input(caller.id()) {
            return;
        }
        let Some(_guard) = core.enter() else {
            tracing::trace!(proxy = %caller.id(), property = name, "nested propagation suppressed");
            return;
        };
        self.on_property_changed(caller, name);
    }

    /// Routes an apply request into [`on_apply_requested`](Link::on_apply_requested).
    fn dispatch_apply_requested(&self, caller: &Proxy) {
        let core = self.core();
        if !core.is_enabled() || !core.propagate_apply() || !core.has_input(caller.id()) {
            return;
        }
        let Some(_guard) = core.enter() else {
            return;
        };
        self.on_apply_requested(caller);
    }

    /// Routes a property push into [`on_property_pushed`](Link::on_property_pushed).
    fn dispatch_property_pushed(&self, caller: &Proxy, name: &str) {
        let core = self.core();
        if !core.is_enabled() || !core.has_input(caller.id()) {
            return;
        }
        let Some(_guard) = core.enter() else {
            return;
        };
        self.on_property_pushed(caller, name);
    }
}
