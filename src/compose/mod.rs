//! Slip composition.
//!
//! Records are laid out on a uniform grid ([`grid`]), their fields are
//! resolved against template placeholders ([`substitution`]) and wrapped to
//! fit ([`wrap`]), and the result is rendered into one document
//! ([`engine`]).

pub mod engine;
pub mod grid;
pub mod substitution;
pub mod wrap;

pub use engine::{compose, plan, render, CompositionPlan, PagePlan, SlipPlan, TextLine, TextPlacement};
pub use grid::{GridLayout, LayoutCell};
pub use substitution::{Resolution, ResolutionPolicy, SemanticMap};
pub use wrap::{wrap_text, FixedAdvance, TextMeasure};
