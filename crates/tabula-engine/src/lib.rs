//! `tabula-engine` turns raw string columns into typed series and computes
//! statistics over them.
//!
//! The pipeline is: [`UntypedSeries`] (raw tokens) → [`UntypedSeries::auto`]
//! (inference + parsing) → [`Series`] (homogeneous typed values with
//! aggregates) → [`Frame`] (named equal-length columns with JSON export). All
//! value semantics live in `tabula-model`; this crate only drives them.

pub mod frame;
pub mod infer;
pub mod series;

pub use frame::{Column, Frame, FrameError, Header};
pub use infer::{InferenceConfig, TokenPatterns, UntypedSeries};
pub use series::{Series, SeriesError};
