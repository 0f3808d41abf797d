//! Arc references and delta decoding
//!
//! Arcs are stored once per topology and shared by every ring that runs along them.
//! Each raw arc is a sequence of integer pairs: the first pair is an absolute quantized
//! position, every later pair is a delta from the previous decoded position.

use crate::{RawArc, Result, TopoError};
use geo::Coord;
use serde::{Deserialize, Serialize};

/// A resolved reference to an arc of the topology's arc table
///
/// On the wire an arc reference is a signed integer where a negative value `i` means
/// "arc `!i`, traversed backwards". That encoding only exists at the serialization
/// boundary: once parsed, references are always this explicit pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct ArcRef {
    /// Index into the arc table
    pub index: usize,
    /// Whether the arc is traversed end to start
    pub reversed: bool,
}

impl ArcRef {
    /// Reference arc `index` in its stored direction
    #[inline]
    pub fn forward(index: usize) -> Self {
        Self {
            index,
            reversed: false,
        }
    }

    /// Reference arc `index` traversed end to start
    #[inline]
    pub fn reversed(index: usize) -> Self {
        Self {
            index,
            reversed: true,
        }
    }

    /// Decode the signed wire representation (`~i` for reversed arcs)
    ///
    /// An index that does not fit in `usize` becomes `usize::MAX`, which no arc
    /// table can hold, so it is reported as out of range instead of wrapping.
    #[inline]
    pub fn from_signed(signed: i64) -> Self {
        let index = |value: i64| usize::try_from(value).unwrap_or(usize::MAX);
        if signed < 0 {
            Self::reversed(index(!signed))
        } else {
            Self::forward(index(signed))
        }
    }

    /// Encode back to the signed wire representation
    #[inline]
    pub fn to_signed(self) -> i64 {
        if self.reversed {
            !(self.index as i64)
        } else {
            self.index as i64
        }
    }
}

impl From<i64> for ArcRef {
    fn from(signed: i64) -> Self {
        Self::from_signed(signed)
    }
}

impl From<ArcRef> for i64 {
    fn from(arc: ArcRef) -> Self {
        arc.to_signed()
    }
}

/// Decode one raw arc into absolute quantized positions
///
/// The first pair is taken literally; every later pair is added to the running
/// position. When `reversed` is set the decoded sequence is reversed afterwards:
/// reversing the deltas before accumulating would produce the wrong points.
///
/// # Errors
/// `MalformedTopology` if the arc is empty or accumulating overflows.
pub fn decode_arc(raw: &[[i64; 2]], reversed: bool) -> Result<Vec<Coord<i64>>> {
    let Some((&[x0, y0], deltas)) = raw.split_first() else {
        return Err(TopoError::MalformedTopology("empty arc".to_string()));
    };

    let mut points = Vec::with_capacity(raw.len());
    let mut current = Coord { x: x0, y: y0 };
    points.push(current);

    for &[dx, dy] in deltas {
        current = match (current.x.checked_add(dx), current.y.checked_add(dy)) {
            (Some(x), Some(y)) => Coord { x, y },
            _ => {
                return Err(TopoError::MalformedTopology(
                    "arc coordinate overflow".to_string(),
                ));
            }
        };
        points.push(current);
    }

    if reversed {
        points.reverse();
    }
    Ok(points)
}

/// Look up a referenced arc in the arc table
///
/// # Errors
/// `ArcIndexOutOfRange` if the reference points past the end of the table.
#[inline]
pub fn resolve_arc(arcs: &[RawArc], arc: ArcRef) -> Result<&RawArc> {
    arcs.get(arc.index).ok_or(TopoError::ArcIndexOutOfRange {
        index: arc.index,
        len: arcs.len(),
    })
}

/// Resolve and decode a referenced arc in one step
pub fn decode_arc_ref(arcs: &[RawArc], arc: ArcRef) -> Result<Vec<Coord<i64>>> {
    decode_arc(resolve_arc(arcs, arc)?, arc.reversed)
}
