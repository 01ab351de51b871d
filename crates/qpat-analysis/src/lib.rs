//! `qpat-analysis`: coincidence counting on detector timestamp streams.
//!
//! Two detectors that see photons from the same entangled pair click at
//! (nearly) the same time. A [`CoincidenceModel`] counts such pairs between
//! two timestamp sequences and turns the count into a rate:
//!
//! - [`WindowCoincidenceModel`]: every pair closer than the window
//! - [`BinnedCoincidenceModel`]: pairs sharing a fixed time bin
//!
//! Timestamps and windows are integer picoseconds.
//!
//! ```rust
//! use qpat_analysis::{CoincidenceModel, WindowCoincidenceModel};
//!
//! let model = WindowCoincidenceModel::new(3).unwrap();
//! let c = model.compute(&[10, 50, 100], &[12, 90, 101]);
//! assert_eq!(c.count, 2);
//! assert_eq!(model.rate(&c, 0.5).unwrap(), 4.0);
//! ```

pub mod binned;
pub mod error;
pub mod model;
pub mod window;

pub use binned::BinnedCoincidenceModel;
pub use error::{AnalysisError, AnalysisResult};
pub use model::{
    CoincidenceMethod, CoincidenceModel, Coincidences, PS_PER_SECOND, Timestamp,
    window_from_seconds,
};
pub use window::WindowCoincidenceModel;
