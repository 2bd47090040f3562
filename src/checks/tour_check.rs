use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::instance::Instance;
use crate::io::instance_reader::InstanceReaderError;
use crate::weights::{EdgeWeightResolver, WeightError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TourCheckError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    InstanceReaderError(#[from] InstanceReaderError),

    #[error("Failed to read tour file: {0}")]
    TourReaderError(InstanceReaderError),

    #[error(transparent)]
    WeightError(#[from] WeightError),

    #[error("Tour {} has {found} nodes, but the instance has {expected}", tour + 1)]
    LengthMismatch {
        tour: usize,
        found: usize,
        expected: usize,
    },

    #[error("Tour {} visits node {} more than once", tour + 1, node + 1)]
    DuplicateNode { tour: usize, node: usize },

    #[error("Tour file contains no tour")]
    NoTours,
}

pub fn check_instance_only(path: &Path, paranoid: bool) -> Result<Instance, TourCheckError> {
    Ok(Instance::read(path, paranoid)?)
}

/// Checks that every tour of the tour file visits each node of the instance exactly
/// once and, if so, returns the instance, the tours and the value of each tour
pub fn check_instance_and_tours(
    instance_path: &Path,
    tour_path: &Path,
    paranoid: bool,
) -> Result<(Instance, Vec<Vec<usize>>, Vec<i64>), TourCheckError> {
    debug!("Read tours from {tour_path:?}");
    let instance_reader = BufReader::new(File::open(instance_path)?);
    let tour_reader = BufReader::new(File::open(tour_path)?);
    check_instance_and_tours_from(instance_reader, tour_reader, paranoid)
}

pub fn check_instance_and_tours_from(
    instance_reader: impl BufRead,
    tour_reader: impl BufRead,
    paranoid: bool,
) -> Result<(Instance, Vec<Vec<usize>>, Vec<i64>), TourCheckError> {
    let instance = Instance::read_from(instance_reader, paranoid)?;
    let tour_file =
        Instance::read_from(tour_reader, paranoid).map_err(TourCheckError::TourReaderError)?;

    if tour_file.tours().is_empty() {
        return Err(TourCheckError::NoTours);
    }

    let values = check_tours(&instance, tour_file.tours())?;
    Ok((instance, tour_file.tours, values))
}

/// Verifies that each tour is a permutation of the nodes of `instance` and returns the tour values.
pub fn check_tours(instance: &Instance, tours: &[Vec<usize>]) -> Result<Vec<i64>, TourCheckError> {
    let weights = EdgeWeightResolver::new(instance)?;
    let n = instance.dimension();

    let mut values = Vec::with_capacity(tours.len());
    for (index, tour) in tours.iter().enumerate() {
        if tour.len() != n {
            return Err(TourCheckError::LengthMismatch {
                tour: index,
                found: tour.len(),
                expected: n,
            });
        }

        let mut visited = vec![false; n];
        for &node in tour {
            if node >= n || std::mem::replace(&mut visited[node], true) {
                return Err(TourCheckError::DuplicateNode { tour: index, node });
            }
        }

        let value = weights.tour_value(tour);
        debug!("Tour {} is feasible with value {value}", index + 1);
        values.push(value);
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::tests::{test_instances, test_instances_directory};

    fn check(input: &Path, tour: Option<&Path>, paranoid: bool) -> Result<(), TourCheckError> {
        match tour {
            Some(tour) => check_instance_and_tours(input, tour, paranoid).map(|_| ()),
            None => check_instance_only(input, paranoid).map(|_| ()),
        }
    }

    #[test]
    fn check_valid() {
        for (input, tour) in test_instances("valid") {
            let result = check(&input, tour.as_deref(), false);
            assert!(result.is_ok(), "{input:?}: {result:?}");
        }
    }

    #[test]
    fn check_valid_paranoid() {
        for (input, tour) in test_instances("valid") {
            let result = check(&input, tour.as_deref(), true);
            assert!(result.is_ok(), "{input:?}: {result:?}");
        }
    }

    #[test]
    fn check_invalid() {
        for (input, tour) in test_instances("invalid") {
            assert!(check(&input, tour.as_deref(), false).is_err(), "{input:?}");
        }
    }

    #[test]
    fn check_invalid_paranoid() {
        for (input, tour) in test_instances("invalid") {
            assert!(check(&input, tour.as_deref(), true).is_err(), "{input:?}");
        }
    }

    #[test]
    fn check_instance_only_paranoid() {
        for (input, _) in test_instances("paranoid") {
            assert!(check_instance_only(&input, false).is_ok(), "{input:?}");
            assert!(check_instance_only(&input, true).is_err(), "{input:?}");
        }
    }

    #[test]
    fn tour_values() {
        let dir = test_instances_directory("valid");

        let (instance, tours, values) =
            check_instance_and_tours(&dir.join("square4.tsp"), &dir.join("square4.tour"), true)
                .unwrap();
        assert_eq!(instance.name(), Some("square4"));
        assert_eq!(tours, vec![vec![0, 1, 2, 3]]);
        assert_eq!(values, vec![14]);

        let (_, _, values) =
            check_instance_and_tours(&dir.join("lower4.tsp"), &dir.join("lower4.tour"), true)
                .unwrap();
        assert_eq!(values, vec![1 + 4 + 6 + 3, 2 + 4 + 5 + 3]);
    }

    #[test]
    fn infeasible_tours() {
        let instance = b"DIMENSION: 3\nEDGE_WEIGHT_TYPE: MAN_2D\nNODE_COORD_SECTION\n\
            1 0 0\n2 1 0\n3 1 1\nEOF\n";

        let result =
            check_instance_and_tours_from(&instance[..], &b"TOUR_SECTION\n1 3 1 -1\nEOF\n"[..], false);
        assert!(matches!(
            result,
            Err(TourCheckError::DuplicateNode { tour: 0, node: 0 })
        ));

        let result = check_instance_and_tours_from(
            &instance[..],
            &b"TOUR_SECTION\n1 2 3 -1\n1 2 -1\nEOF\n"[..],
            false,
        );
        assert!(matches!(result, Err(TourCheckError::TourReaderError(_))));

        let result = check_instance_and_tours_from(
            &instance[..],
            &b"TOUR_SECTION\n2 1 -1\nEOF\n"[..],
            false,
        );
        assert!(matches!(
            result,
            Err(TourCheckError::LengthMismatch {
                tour: 0,
                found: 2,
                expected: 3
            })
        ));

        let result =
            check_instance_and_tours_from(&instance[..], &b"NAME: empty\nEOF\n"[..], false);
        assert!(matches!(result, Err(TourCheckError::NoTours)));

        let (_, _, values) = check_instance_and_tours_from(
            &instance[..],
            &b"TOUR_SECTION\n1 2 3 -1\n3 1 2 -1\nEOF\n"[..],
            false,
        )
        .unwrap();
        assert_eq!(values, vec![4, 4]);
    }

    #[test]
    fn instance_growing_after_coords() {
        let result = check_instance_and_tours_from(
            &b"DIMENSION: 2\nEDGE_WEIGHT_TYPE: EUC_2D\nNODE_COORD_SECTION\n1 0 0\n2 3 4\n\
               DIMENSION: 3\nEOF\n"[..],
            &b"TOUR_SECTION\n1 2 3 -1\nEOF\n"[..],
            false,
        );
        assert!(matches!(
            result,
            Err(TourCheckError::InstanceReaderError(
                InstanceReaderError::Format { .. }
            ))
        ));
    }

    #[test]
    fn tours_inside_instance_file() {
        let instance = Instance::read_from(
            &b"DIMENSION: 3\nEDGE_WEIGHT_FORMAT: UPPER_ROW\nEDGE_WEIGHT_SECTION\n1 2 3\n\
               TOUR_SECTION\n1 2 3 -1\nEOF\n"[..],
            true,
        )
        .unwrap();

        assert_eq!(check_tours(&instance, instance.tours()).unwrap(), vec![6]);
    }
}
