pub mod chart_normalizer;
pub mod chart_parser;
pub mod chart_serializer;
pub mod crypto;
pub mod error;
pub mod pec_parser;
pub mod rks_utils;
pub mod rpe_parser;
pub mod serde_helpers;
