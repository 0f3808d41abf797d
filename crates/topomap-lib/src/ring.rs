//! Ring assembly from shared arcs
//!
//! A ring is the concatenation of its referenced arcs. Consecutive arcs share their
//! joining point, so every arc after the first contributes all of its points except
//! the first one.

use crate::arc::{self, ArcRef};
use crate::{RawArc, Result, TopoError, Transform};
use geo::{Coord, LineString};

/// Assemble a ring in quantized integer space
///
/// Closure is exact here: for well-formed data the first and last point are equal.
///
/// # Errors
/// `EmptyRing` for a ring without arcs, `ArcIndexOutOfRange` for a reference past
/// the arc table, `MalformedTopology` for an empty raw arc.
pub fn assemble_ring(arcs: &[RawArc], ring: &[ArcRef]) -> Result<Vec<Coord<i64>>> {
    ArcTable::Raw(arcs).assemble(ring)
}

/// Assemble a ring and dequantize it into longitude/latitude
pub fn decode_ring(
    arcs: &[RawArc],
    ring: &[ArcRef],
    transform: &Transform,
) -> Result<LineString<f64>> {
    ArcTable::Raw(arcs).decode(ring, transform)
}

/// Like [`decode_ring`], taking arc indices in their signed wire form (`~i` = reversed)
pub fn decode_ring_signed(
    arcs: &[RawArc],
    ring: &[i64],
    transform: &Transform,
) -> Result<LineString<f64>> {
    let refs: Vec<ArcRef> = ring.iter().copied().map(ArcRef::from_signed).collect();
    decode_ring(arcs, &refs, transform)
}

/// Where ring assembly reads its arcs from
#[derive(Clone, Copy, Debug)]
pub(crate) enum ArcTable<'a> {
    /// Delta-encoded arcs, decoded on every use
    Raw(&'a [RawArc]),
    /// Arcs decoded ahead of time. `None` marks an arc that failed to decode; the raw
    /// arc is decoded again on use so the original error is reported.
    Decoded {
        raw: &'a [RawArc],
        decoded: &'a [Option<Vec<Coord<i64>>>],
    },
}

impl ArcTable<'_> {
    /// Assemble a ring in quantized space
    pub(crate) fn assemble(&self, ring: &[ArcRef]) -> Result<Vec<Coord<i64>>> {
        if ring.is_empty() {
            return Err(TopoError::EmptyRing);
        }

        let mut points: Vec<Coord<i64>> = Vec::new();
        for (position, &arc_ref) in ring.iter().enumerate() {
            self.append(arc_ref, position > 0, &mut points)?;
        }
        Ok(points)
    }

    /// Assemble a ring and dequantize it
    pub(crate) fn decode(&self, ring: &[ArcRef], transform: &Transform) -> Result<LineString<f64>> {
        let points = self.assemble(ring)?;
        Ok(points.into_iter().map(|p| transform.apply(p)).collect())
    }

    fn append(&self, arc_ref: ArcRef, skip_first: bool, out: &mut Vec<Coord<i64>>) -> Result<()> {
        let skip = usize::from(skip_first);
        match *self {
            Self::Raw(arcs) => {
                out.extend(arc::decode_arc_ref(arcs, arc_ref)?.into_iter().skip(skip));
            }
            Self::Decoded { raw, decoded } => {
                let points = match decoded.get(arc_ref.index) {
                    Some(Some(points)) => points,
                    Some(None) => return Self::Raw(raw).append(arc_ref, skip_first, out),
                    None => {
                        return Err(TopoError::ArcIndexOutOfRange {
                            index: arc_ref.index,
                            len: decoded.len(),
                        });
                    }
                };
                if arc_ref.reversed {
                    out.extend(points.iter().rev().skip(skip).copied());
                } else {
                    out.extend(points.iter().skip(skip).copied());
                }
            }
        }
        Ok(())
    }
}
