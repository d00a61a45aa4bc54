//! Shared read-only surface for delta rendering.
//!
//! Rendering a delta goes through a real surface so the markup matches what
//! the editor shows. One instance is created on first use and reused; it is
//! replaced if it reports itself detached. Access is serialized by a lock and
//! only possible inside [`with_render_surface`].

use std::sync::{LazyLock, Mutex};

use agora_richtext::{Delta, FontBounds, sanitize_delta};

use crate::headless::HeadlessSurface;
use crate::surface::{HostSurface, SurfaceError};

/// Lazily created surface with a liveness check.
pub struct RenderSurface<S> {
    instance: Option<S>,
    factory: fn() -> S,
}

impl<S: HostSurface> RenderSurface<S> {
    pub const fn new(factory: fn() -> S) -> Self {
        Self {
            instance: None,
            factory,
        }
    }

    /// The live instance, creating or replacing it as needed.
    pub fn acquire(&mut self) -> &mut S {
        if self.instance.as_ref().is_some_and(|surface| !surface.is_attached()) {
            tracing::debug!("render surface detached, recreating");
            self.instance = None;
        }
        self.instance.get_or_insert_with(self.factory)
    }

    pub fn is_initialized(&self) -> bool {
        self.instance.is_some()
    }
}

static RENDER_SURFACE: LazyLock<Mutex<RenderSurface<HeadlessSurface>>> =
    LazyLock::new(|| Mutex::new(RenderSurface::new(HeadlessSurface::read_only)));

/// Run `f` against the shared render surface while holding its lock.
pub fn with_render_surface<R>(
    f: impl FnOnce(&mut HeadlessSurface) -> R,
) -> Result<R, SurfaceError> {
    let mut guard = RENDER_SURFACE
        .lock()
        .map_err(|_| SurfaceError::from("render surface lock poisoned"))?;
    Ok(f(guard.acquire()))
}

/// Sanitize a delta and render it the way the editor displays it.
///
/// Returns an empty string if rendering fails; callers fall back to
/// [`agora_richtext::render_payload_to_html`].
pub fn render_delta_to_html(delta: &Delta) -> String {
    let bounds = FontBounds::default();
    let delta = sanitize_delta(delta, bounds);
    let rendered = with_render_surface(|surface| {
        surface.set_contents(&delta)?;
        surface.render_html()
    })
    .and_then(|rendered| rendered);

    match rendered {
        Ok(html) => html,
        Err(error) => {
            tracing::warn!(%error, "delta render failed");
            String::new()
        }
    }
}
