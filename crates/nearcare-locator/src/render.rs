//! Boundary to whatever displays search results.
//!
//! Renderers may hold resources (a terminal, a map handle). A
//! [`RenderSession`] owns one renderer and calls [`Renderer::dispose`] exactly
//! once when it goes out of scope, on every exit path.

use nearcare_core::{Coordinate, RankedFacility};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render output failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("render serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait Renderer {
    /// Displays `facilities` (already ranked) around `origin`. May be called
    /// repeatedly, including for the same origin.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if output cannot be produced.
    fn render(&mut self, origin: Coordinate, facilities: &[RankedFacility])
        -> Result<(), RenderError>;

    /// Releases anything acquired while rendering.
    fn dispose(&mut self);
}

pub struct RenderSession<R: Renderer> {
    renderer: R,
}

impl<R: Renderer> RenderSession<R> {
    #[must_use]
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    /// # Errors
    ///
    /// Propagates the renderer's [`RenderError`]; `dispose` still runs when
    /// the session is dropped.
    pub fn render(
        &mut self,
        origin: Coordinate,
        facilities: &[RankedFacility],
    ) -> Result<(), RenderError> {
        self.renderer.render(origin, facilities)
    }
}

impl<R: Renderer> Drop for RenderSession<R> {
    fn drop(&mut self) {
        self.renderer.dispose();
    }
}
