//! Admission gates — cheap per-window pre-filters.
//!
//! Both gates exist to avoid invoking the neural classifier on windows
//! that obviously contain no speech. A window is admitted only when the
//! energy gate AND the spectral gate pass.
//!
//! The gates are deliberately asymmetric in failure behaviour: the energy
//! gate rejects degenerate input (too short for a single frame), while the
//! spectral gate fails open on anything it cannot compute, leaving the
//! final word to the classifier.

pub mod energy;
pub mod spectral;

pub use energy::has_sufficient_energy;
pub use spectral::has_voice_characteristics;
