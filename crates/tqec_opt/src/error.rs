//! Errors that abort an optimization run.

use tqec_common::{InternalError, Kind, Point3};
use tqec_config::ConfigError;
use tqec_lattice::{LatticeError, LoopId};

/// A fatal optimizer error.
///
/// Recoverable conditions (pruned dangling geometry, rejected rotations,
/// infeasible SA proposals, non-convergence) never surface here; they are
/// handled in place or reported through the diagnostic sink.
#[derive(Debug, thiserror::Error)]
pub enum OptError {
    /// The placement built from the input lattice already admits no consistent port ids.
    #[error("initial {kind} placement is infeasible: cross ports cannot be given consistent ids")]
    InfeasibleInitialPlacement {
        /// The phase whose modules could not be allocated.
        kind: Kind,
    },

    /// The grid search found no path between two ports of a net.
    #[error("no route for net {net} from {from} to {to}")]
    NoRoute {
        /// The net (loop id) being wired.
        net: LoopId,
        /// Source port.
        from: Point3,
        /// Destination port.
        to: Point3,
    },

    /// A lattice mutation was rejected.
    #[error(transparent)]
    Lattice(#[from] LatticeError),

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An internal invariant was violated.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_no_route() {
        let err = OptError::NoRoute {
            net: LoopId::from_raw(4),
            from: Point3::new(1, 1, 1),
            to: Point3::new(5, 1, 1),
        };
        assert_eq!(
            format!("{err}"),
            "no route for net 4 from (1, 1, 1) to (5, 1, 1)"
        );
    }

    #[test]
    fn display_infeasible() {
        let err = OptError::InfeasibleInitialPlacement { kind: Kind::Dual };
        assert!(format!("{err}").starts_with("initial dual placement is infeasible"));
    }

    #[test]
    fn internal_is_transparent() {
        let err: OptError = InternalError::new("boom").into();
        assert_eq!(format!("{err}"), "internal optimizer error: boom");
    }
}
