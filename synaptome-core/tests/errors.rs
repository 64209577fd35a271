use std::sync::Arc;

use rstest::rstest;
use synaptome_core::{ErrorClass, GenerationError, GenerationErrorCode};

#[rstest]
#[case(GenerationError::MissingEdgeTarget, GenerationErrorCode::MissingEdgeTarget, ErrorClass::InvalidArgument)]
#[case(
    GenerationError::TooManyEdges { requested: 10, capacity: 6 },
    GenerationErrorCode::TooManyEdges,
    ErrorClass::InvalidArgument,
)]
#[case(
    GenerationError::ReciprocityTooLow { requested: 0.1, minimum: 0.4 },
    GenerationErrorCode::ReciprocityTooLow,
    ErrorClass::InvalidArgument,
)]
#[case(
    GenerationError::UnknownDistanceRule { rule: Arc::from("power") },
    GenerationErrorCode::UnknownDistanceRule,
    ErrorClass::InvalidArgument,
)]
#[case(
    GenerationError::BackendUnavailable { model: "price_scale_free" },
    GenerationErrorCode::BackendUnavailable,
    ErrorClass::InvalidArgument,
)]
#[case(
    GenerationError::ConvergenceFailure { model: "erdos_renyi", accepted: 3, target: 4, attempts: 1000 },
    GenerationErrorCode::ConvergenceFailure,
    ErrorClass::ConvergenceFailure,
)]
#[case(GenerationError::NotGraphical { prefix: 2 }, GenerationErrorCode::NotGraphical, ErrorClass::NotGraphical)]
fn errors_map_to_codes_and_classes(
    #[case] error: GenerationError,
    #[case] code: GenerationErrorCode,
    #[case] class: ErrorClass,
) {
    assert_eq!(error.code(), code);
    assert_eq!(error.code().as_str(), code.as_str());
    assert!(code.as_str().starts_with("GENERATION_"));
    assert_eq!(error.class(), class);
}

#[rstest]
fn messages_name_the_offending_values() {
    let err = GenerationError::TooManyEdges { requested: 10, capacity: 6 };
    assert_eq!(err.to_string(), "10 edges requested but the topology can hold at most 6");
    let err = GenerationError::UnknownModel { name: Arc::from("barabasi") };
    assert_eq!(err.to_string(), "unknown graph model `barabasi`");
}
