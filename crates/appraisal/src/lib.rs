//! Appraisal - housing batch ETL and prediction pipeline
//!
//! Loads housing records, validates and one-hot encodes them, prices them with
//! a [`PriceModel`] and persists raw input, features and predictions under one
//! batch id. The HTTP adapter in [`api`] exposes the same pipeline.

pub mod api;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod transform;
pub mod validate;

pub use config::AppConfig;
pub use error::{PipelineError, Result};
pub use model::{load_model, LinearModel, ModelError, PriceModel};
pub use pipeline::{BatchOutcome, Pipeline, SinglePrediction};
pub use transform::Transformer;
pub use validate::Validator;
