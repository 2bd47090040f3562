use crate::digest::fingerprint::{InstanceDigest, TourDigest, problem_code, weight_type_code};
use crate::instance::{EdgeWeights, Instance, NodeCoords};
use digest::Output;
use sha2::{Digest, Sha256};

type Algo = Sha256;

/// Computes the fingerprint of an instance. Only the decoded content enters the hash:
/// problem type, dimension, weight type, node coordinates and the canonical edge weights.
/// Hence an instance gets the same fingerprint regardless of its name, comments, or the
/// triangular layout its weights were stored in.
pub fn digest_instance(instance: &Instance) -> InstanceDigest {
    let header = [
        problem_code(instance.problem_type()),
        weight_type_code(instance.edge_weight_type()),
        instance.dimension().max(1).ilog2() as u8,
    ];

    InstanceDigest::assemble(&header, digest_content(instance).as_slice())
}

/// Computes the fingerprint of a tour. It is invariant under rotation of the tour and,
/// if `symmetric` is set, under reversal of its direction.
pub fn digest_tour(tour: &[usize], symmetric: bool) -> TourDigest {
    let mut hasher = Algo::new();
    for node in normalize_tour(tour, symmetric) {
        hasher.update((node as u64).to_be_bytes());
    }

    let len = u32::try_from(tour.len()).unwrap_or(u32::MAX);
    TourDigest::assemble(&len.to_be_bytes(), hasher.finalize().as_slice())
}

/// Rotates the smallest node to the front; a symmetric tour is then walked towards the
/// smaller of its two neighbours.
fn normalize_tour(tour: &[usize], symmetric: bool) -> Vec<usize> {
    let Some(start) = tour.iter().enumerate().min_by_key(|(_, node)| **node).map(|(i, _)| i)
    else {
        return Vec::new();
    };

    let mut normalized: Vec<usize> = tour[start..].iter().chain(&tour[..start]).copied().collect();

    if symmetric && normalized.len() > 2 && normalized[normalized.len() - 1] < normalized[1] {
        normalized[1..].reverse();
    }

    normalized
}

fn digest_content(instance: &Instance) -> Output<Algo> {
    let mut hasher = Algo::new();

    let keyword = |k: Option<&'static str>| k.unwrap_or("-");
    hasher.update(keyword(instance.problem_type().map(|t| t.as_str())));
    hasher.update([0u8]);
    hasher.update((instance.dimension() as u64).to_be_bytes());
    hasher.update(keyword(instance.edge_weight_type().map(|t| t.as_str())));
    hasher.update([0u8]);

    match instance.node_coords() {
        None => hasher.update([0u8]),
        Some(coords) => {
            hasher.update([coords.point_dimensions() as u8]);
            let components: Box<dyn Iterator<Item = &f64>> = match coords {
                NodeCoords::TwoD(points) => Box::new(points.iter().flatten()),
                NodeCoords::ThreeD(points) => Box::new(points.iter().flatten()),
            };
            for x in components {
                hasher.update(x.to_bits().to_be_bytes());
            }
        }
    }

    match instance.edge_weights() {
        None => hasher.update([0u8]),
        Some(weights) => {
            hasher.update(match weights {
                EdgeWeights::Compact { .. } => [1u8],
                EdgeWeights::Full { .. } => [2u8],
            });
            for w in weights.as_slice() {
                hasher.update(w.to_be_bytes());
            }
        }
    }

    hasher.finalize()
}
