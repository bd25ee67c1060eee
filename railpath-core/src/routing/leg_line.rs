//! Routes through every call of a journey leg

use geo::LineString;
use log::{debug, trace, warn};

use super::pathfinding::{SearchOptions, route_between};
use crate::{
    Error,
    geometry::merge_lines,
    model::{RailNetwork, StationPoint},
    projection::line_to_geographic,
};

/// Track followed by a leg through all of its calls
#[derive(Debug, Clone, PartialEq)]
pub struct LegLine {
    /// The boarding point chosen at each call
    pub calls: Vec<StationPoint>,
    /// Track followed, in WGS84
    pub line: LineString<f64>,
    /// Length in metres
    pub length: f64,
}

/// Cheapest way to reach one candidate point of the latest call
#[derive(Debug, Clone)]
struct Chain {
    calls: Vec<StationPoint>,
    lines: Vec<LineString<f64>>,
    length: f64,
}

/// Chain routes between adjacent calls of a leg.
///
/// `calls` holds the candidate points of each call in order. Every
/// combination of candidates is considered, but for each candidate only the
/// shortest chain ending there is carried forward. `Ok(None)` if there are
/// fewer than two calls or any two adjacent calls cannot be joined.
///
/// # Errors
///
/// Any error that is not [recoverable](Error::is_recoverable).
pub fn build_leg_line(
    network: &RailNetwork,
    calls: &[Vec<StationPoint>],
    options: &SearchOptions,
) -> Result<Option<LegLine>, Error> {
    let Some((first, rest)) = calls.split_first() else {
        return Ok(None);
    };
    if rest.is_empty() {
        return Ok(None);
    }

    let mut chains: Vec<Chain> = first
        .iter()
        .map(|point| Chain {
            calls: vec![*point],
            lines: Vec::new(),
            length: 0.0,
        })
        .collect();

    for (position, candidates) in rest.iter().enumerate() {
        let mut extended = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            extended.extend(extend_best(network, &chains, candidate, options)?);
        }
        if extended.is_empty() {
            debug!("No route reaches call {} of the leg", position + 1);
            return Ok(None);
        }
        chains = extended;
    }

    let Some(best) = chains
        .into_iter()
        .reduce(|best, chain| if chain.length < best.length { chain } else { best })
    else {
        return Ok(None);
    };

    let line = match merge_lines(&best.lines) {
        Ok(line) => line_to_geographic(&line)?,
        Err(err) if err.is_recoverable() => {
            warn!("Discarding leg line: {err}");
            return Ok(None);
        }
        Err(err) => return Err(err),
    };

    Ok(Some(LegLine {
        calls: best.calls,
        line,
        length: best.length,
    }))
}

/// The shortest of `chains` extended to `candidate`
fn extend_best(
    network: &RailNetwork,
    chains: &[Chain],
    candidate: &StationPoint,
    options: &SearchOptions,
) -> Result<Option<Chain>, Error> {
    let mut best: Option<(&Chain, LineString<f64>, f64)> = None;

    for chain in chains {
        let Some(last) = chain.calls.last() else {
            continue;
        };
        let route = match route_between(network, last, candidate, options) {
            Ok(Some(route)) => route,
            Ok(None) => {
                trace!("{} -> {}: no route", last.node_id(), candidate.node_id());
                continue;
            }
            Err(err) if err.is_recoverable() => {
                warn!(
                    "Skipping {} -> {}: {err}",
                    last.node_id(),
                    candidate.node_id()
                );
                continue;
            }
            Err(err) => return Err(err),
        };

        let length = chain.length + route.length;
        if best.as_ref().is_none_or(|(_, _, current)| length < *current) {
            best = Some((chain, route.line, length));
        }
    }

    Ok(best.map(|(chain, line, length)| {
        let mut extended = chain.clone();
        extended.calls.push(*candidate);
        extended.lines.push(line);
        extended.length = length;
        extended
    }))
}
