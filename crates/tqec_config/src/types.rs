//! Configuration types deserialized from `tqec.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use tqec_common::Kind;

/// The top-level optimizer configuration parsed from `tqec.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    /// Seed for the single RNG stream driving the placer.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Sublattices to optimize, in order (`"primal"`, `"dual"`, or a list).
    #[serde(
        default = "default_phases",
        deserialize_with = "deserialize_kind_or_vec"
    )]
    pub phases: Vec<Kind>,
    /// Simulated annealing schedule for the placer.
    #[serde(default)]
    pub anneal: AnnealConfig,
    /// Net router settings.
    #[serde(default)]
    pub route: RouteConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            phases: default_phases(),
            anneal: AnnealConfig::default(),
            route: RouteConfig::default(),
        }
    }
}

fn default_seed() -> u64 {
    42
}

fn default_phases() -> Vec<Kind> {
    vec![Kind::Primal, Kind::Dual]
}

/// Simulated annealing schedule.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnnealConfig {
    /// Starting temperature.
    pub initial_temperature: f64,
    /// The search stops once the temperature drops below this value.
    pub final_temperature: f64,
    /// Geometric cooling factor applied after each temperature level.
    pub cooling_rate: f64,
    /// Number of proposals evaluated per temperature level.
    pub moves_per_temperature: usize,
    /// Hard cap on the total number of proposals.
    pub max_steps: usize,
    /// Weight of the shared-net distance term relative to the surface term.
    pub net_weight: f64,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 100.0,
            final_temperature: 0.01,
            cooling_rate: 0.97,
            moves_per_temperature: 100,
            max_steps: 200_000,
            net_weight: 0.1,
        }
    }
}

/// Net router settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Padding added on every side of the lattice bounding box to form the routing volume.
    pub margin: i32,
    /// Maximum number of rip-up and reroute iterations.
    pub max_iterations: usize,
    /// Base of the penalty weight; iteration `i` scales penalties by `penalty_growth^i`.
    pub penalty_growth: f64,
    /// Penalty for running along a cell already used by another net on the same axis.
    pub parallel_penalty: f64,
    /// Penalty for crossing a cell already used by another net transversally.
    pub cross_penalty: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            margin: 4,
            max_iterations: 100,
            penalty_growth: 1.05,
            parallel_penalty: 20.0,
            cross_penalty: 2.0,
        }
    }
}

/// Deserializes `phases` from either a single sublattice name or a list.
///
/// Accepts both `phases = "dual"` and `phases = ["primal", "dual"]`.
fn deserialize_kind_or_vec<'de, D>(deserializer: D) -> Result<Vec<Kind>, D::Error>
where
    D: Deserializer<'de>,
{
    struct KindOrVec;

    impl<'de> Visitor<'de> for KindOrVec {
        type Value = Vec<Kind>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("\"primal\", \"dual\", or a list of them")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let kind = Kind::deserialize(de::value::StrDeserializer::<E>::new(v))?;
            Ok(vec![kind])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut kinds = Vec::new();
            while let Some(kind) = seq.next_element::<Kind>()? {
                kinds.push(kind);
            }
            Ok(kinds)
        }
    }

    deserializer.deserialize_any(KindOrVec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn phases_single_string() {
        let config = load_config_from_str("phases = \"dual\"").unwrap();
        assert_eq!(config.phases, vec![Kind::Dual]);
    }

    #[test]
    fn phases_list() {
        let config = load_config_from_str("phases = [\"dual\", \"primal\"]").unwrap();
        assert_eq!(config.phases, vec![Kind::Dual, Kind::Primal]);
    }

    #[test]
    fn phases_unknown_name_rejected() {
        assert!(load_config_from_str("phases = \"quantum\"").is_err());
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let config = load_config_from_str("[anneal]\ncooling_rate = 0.5\n").unwrap();
        assert_eq!(config.anneal.cooling_rate, 0.5);
        assert_eq!(config.anneal.initial_temperature, 100.0);
        assert_eq!(config.route.margin, 4);
    }
}
