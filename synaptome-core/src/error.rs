//! Error types for the synaptome generation engine.
//!
//! Defines the error enum exposed by every generator, stable machine-readable
//! codes for each variant, and a convenient result alias.

use std::{fmt, sync::Arc};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Broad failure classes shared by all generators.
///
/// Invalid arguments are raised before any sampling happens and are never
/// retried. Convergence failures mean a retry budget ran out. Non-graphical
/// failures mean a degree sequence can never be realised as a simple graph.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    /// Malformed or infeasible parameters.
    InvalidArgument,
    /// A bounded retry loop was exhausted before reaching its target.
    ConvergenceFailure,
    /// A degree sequence cannot be realised as a simple graph.
    NotGraphical,
}

/// Error type produced by the generation engine.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GenerationError {
    /// None of `density`, `edges` or `avg_deg` was supplied.
    #[error("at least one of `density`, `edges` or `avg_deg` must be specified")]
    MissingEdgeTarget,
    /// A scalar parameter was outside its accepted domain.
    #[error("invalid value for `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Human-readable explanation.
        reason: String,
    },
    /// More edges were requested than the topology can hold.
    #[error("{requested} edges requested but the topology can hold at most {capacity}")]
    TooManyEdges {
        /// Number of edges requested by the caller.
        requested: usize,
        /// Maximum number of edges allowed by the self-loop and multigraph rules.
        capacity: usize,
    },
    /// Requested reciprocity is below what the density forces.
    #[error("reciprocity {requested} is below the minimum {minimum} allowed by the density")]
    ReciprocityTooLow {
        /// Reciprocity requested by the caller.
        requested: f64,
        /// Smallest reciprocity compatible with the density.
        minimum: f64,
    },
    /// Requested reciprocity cannot be reached with the available edges.
    #[error("reciprocity {requested} cannot be obtained with the requested density")]
    ReciprocityUnreachable {
        /// Reciprocity requested by the caller.
        requested: f64,
    },
    /// The model only supports identical source and target populations.
    #[error("`{model}` requires identical source and target populations")]
    SinglePopulationRequired {
        /// Model or feature that imposed the restriction.
        model: &'static str,
    },
    /// A degree sequence did not provide one entry per anchor node.
    #[error("degree sequence has {got} entries but {expected} nodes were given")]
    DegreeSequenceLength {
        /// Number of anchor nodes.
        expected: usize,
        /// Number of degrees supplied.
        got: usize,
    },
    /// A node cannot find enough distinct partners for its degree.
    #[error("node {node} needs {degree} partners but only {available} are available")]
    InsufficientPartners {
        /// Node whose degree cannot be met.
        node: usize,
        /// Requested degree.
        degree: usize,
        /// Number of distinct partners still available.
        available: usize,
    },
    /// A total-degree sequence has an odd sum.
    #[error("the sum of a total-degree sequence must be even (got {sum})")]
    OddDegreeSum {
        /// Sum of the supplied degrees.
        sum: usize,
    },
    /// Unknown distance rule name.
    #[error("unknown distance rule `{rule}`; expected `exp` or `lin`")]
    UnknownDistanceRule {
        /// Rule name supplied by the caller.
        rule: Arc<str>,
    },
    /// Unknown graph model name.
    #[error("unknown graph model `{name}`")]
    UnknownModel {
        /// Model name supplied by the caller.
        name: Arc<str>,
    },
    /// Unknown degree type name.
    #[error("unknown degree type `{name}`; expected `in`, `out` or `total`")]
    UnknownDegreeType {
        /// Degree type supplied by the caller.
        name: Arc<str>,
    },
    /// Unknown reciprocity choice name.
    #[error("unknown reciprocity choice `{name}`; expected `random` or `closest`")]
    UnknownReciprocityChoice {
        /// Choice supplied by the caller.
        name: Arc<str>,
    },
    /// A spatial model was invoked without node positions.
    #[error("`{model}` requires node positions")]
    MissingPositions {
        /// Model that needed positions.
        model: &'static str,
    },
    /// A node id has no corresponding row in the position table.
    #[error("node {node} has no position (table holds {len} rows)")]
    PositionOutOfRange {
        /// Node id without a position.
        node: usize,
        /// Number of rows in the position table.
        len: usize,
    },
    /// The position table is malformed.
    #[error("invalid positions: {reason}")]
    InvalidPositions {
        /// Human-readable explanation.
        reason: String,
    },
    /// The distance window does not contain enough candidate pairs.
    #[error(
        "scale is too small: {neighbours} candidate pairs for {edges} edges; increase the scale or the node density"
    )]
    NotEnoughNeighbours {
        /// Candidate pairs inside the distance window.
        neighbours: usize,
        /// Edges requested.
        edges: usize,
    },
    /// The model is recognised but not implemented by this build.
    #[error("graph model `{model}` is not available in this build")]
    BackendUnavailable {
        /// Model that could not be served.
        model: &'static str,
    },
    /// A bounded retry loop was exhausted.
    #[error(
        "`{model}` generation did not converge: {accepted} of {target} edges after {attempts} attempts"
    )]
    ConvergenceFailure {
        /// Model whose loop failed.
        model: &'static str,
        /// Edges accepted when the budget ran out.
        accepted: usize,
        /// Edges the loop was trying to reach.
        target: usize,
        /// Attempts spent.
        attempts: usize,
    },
    /// A degree sequence is not graphical.
    #[error("degree sequence is not graphical: the {prefix} largest degrees cannot be realised")]
    NotGraphical {
        /// Prefix length at which the Erdős–Gallai inequality fails.
        prefix: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`GenerationError`] variants.
    enum GenerationErrorCode for GenerationError {
        /// None of `density`, `edges` or `avg_deg` was supplied.
        MissingEdgeTarget => MissingEdgeTarget => "GENERATION_MISSING_EDGE_TARGET",
        /// A scalar parameter was outside its accepted domain.
        InvalidParameter => InvalidParameter { .. } => "GENERATION_INVALID_PARAMETER",
        /// More edges were requested than the topology can hold.
        TooManyEdges => TooManyEdges { .. } => "GENERATION_TOO_MANY_EDGES",
        /// Requested reciprocity is below what the density forces.
        ReciprocityTooLow => ReciprocityTooLow { .. } => "GENERATION_RECIPROCITY_TOO_LOW",
        /// Requested reciprocity cannot be reached.
        ReciprocityUnreachable => ReciprocityUnreachable { .. } => "GENERATION_RECIPROCITY_UNREACHABLE",
        /// The model only supports a single population.
        SinglePopulationRequired => SinglePopulationRequired { .. } => "GENERATION_SINGLE_POPULATION_REQUIRED",
        /// A degree sequence did not provide one entry per node.
        DegreeSequenceLength => DegreeSequenceLength { .. } => "GENERATION_DEGREE_SEQUENCE_LENGTH",
        /// A node cannot find enough distinct partners.
        InsufficientPartners => InsufficientPartners { .. } => "GENERATION_INSUFFICIENT_PARTNERS",
        /// A total-degree sequence has an odd sum.
        OddDegreeSum => OddDegreeSum { .. } => "GENERATION_ODD_DEGREE_SUM",
        /// Unknown distance rule name.
        UnknownDistanceRule => UnknownDistanceRule { .. } => "GENERATION_UNKNOWN_DISTANCE_RULE",
        /// Unknown graph model name.
        UnknownModel => UnknownModel { .. } => "GENERATION_UNKNOWN_MODEL",
        /// Unknown degree type name.
        UnknownDegreeType => UnknownDegreeType { .. } => "GENERATION_UNKNOWN_DEGREE_TYPE",
        /// Unknown reciprocity choice name.
        UnknownReciprocityChoice => UnknownReciprocityChoice { .. } => "GENERATION_UNKNOWN_RECIPROCITY_CHOICE",
        /// A spatial model was invoked without node positions.
        MissingPositions => MissingPositions { .. } => "GENERATION_MISSING_POSITIONS",
        /// A node id has no corresponding position.
        PositionOutOfRange => PositionOutOfRange { .. } => "GENERATION_POSITION_OUT_OF_RANGE",
        /// The position table is malformed.
        InvalidPositions => InvalidPositions { .. } => "GENERATION_INVALID_POSITIONS",
        /// The distance window does not contain enough candidate pairs.
        NotEnoughNeighbours => NotEnoughNeighbours { .. } => "GENERATION_NOT_ENOUGH_NEIGHBOURS",
        /// The model is recognised but not implemented by this build.
        BackendUnavailable => BackendUnavailable { .. } => "GENERATION_BACKEND_UNAVAILABLE",
        /// A bounded retry loop was exhausted.
        ConvergenceFailure => ConvergenceFailure { .. } => "GENERATION_CONVERGENCE_FAILURE",
        /// A degree sequence is not graphical.
        NotGraphical => NotGraphical { .. } => "GENERATION_NOT_GRAPHICAL",
    }
}

impl GenerationError {
    /// Returns the broad class this error belongs to.
    ///
    /// # Examples
    /// ```
    /// use synaptome_core::{ErrorClass, GenerationError};
    ///
    /// let err = GenerationError::NotGraphical { prefix: 4 };
    /// assert_eq!(err.class(), ErrorClass::NotGraphical);
    /// ```
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::ConvergenceFailure { .. } => ErrorClass::ConvergenceFailure,
            Self::NotGraphical { .. } => ErrorClass::NotGraphical,
            _ => ErrorClass::InvalidArgument,
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Convenient alias for results returned by the generation API.
pub type Result<T> = core::result::Result<T, GenerationError>;
