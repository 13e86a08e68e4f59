//! Terminal renderers for ranked facility lists.

use std::io::Write;

use nearcare_core::{Coordinate, RankedFacility};
use nearcare_locator::{RenderError, Renderer};
use serde::Serialize;

/// Placeholder for absent optional fields in table output.
const NONE: &str = "-";

/// Fixed-width table, one facility per line, nearest first.
pub(crate) struct TableRenderer<W: Write> {
    out: W,
}

impl<W: Write> TableRenderer<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub(crate) fn output(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Renderer for TableRenderer<W> {
    fn render(
        &mut self,
        origin: Coordinate,
        facilities: &[RankedFacility],
    ) -> Result<(), RenderError> {
        if facilities.is_empty() {
            writeln!(self.out, "no facilities found near {origin}")?;
            return Ok(());
        }

        writeln!(self.out, "{} facilities near {origin}", facilities.len())?;
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{:>8}  {:<10}{:<36}{:<18}ADDRESS",
            "KM", "KIND", "NAME", "PHONE"
        )?;
        for ranked in facilities {
            let facility = &ranked.facility;
            writeln!(
                self.out,
                "{:>8.2}  {:<10}{:<36}{:<18}{}",
                ranked.rounded_distance_km(),
                facility.kind,
                truncate(&facility.name, 34),
                facility.phone.as_deref().unwrap_or(NONE),
                facility.address
            )?;
        }
        Ok(())
    }

    fn dispose(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::warn!(error = %e, "failed to flush table output");
        }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    origin: Coordinate,
    count: usize,
    facilities: &'a [RankedFacility],
}

/// Pretty-printed JSON document per render call.
pub(crate) struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub(crate) fn output(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(
        &mut self,
        origin: Coordinate,
        facilities: &[RankedFacility],
    ) -> Result<(), RenderError> {
        let document = JsonOutput {
            origin,
            count: facilities.len(),
            facilities,
        };
        serde_json::to_writer_pretty(&mut self.out, &document)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn dispose(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::warn!(error = %e, "failed to flush json output");
        }
    }
}

/// Shorten `value` to at most `max` characters, marking the cut with `~`.
fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut short: String = value.chars().take(max.saturating_sub(1)).collect();
    short.push('~');
    short
}
