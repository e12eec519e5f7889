//! Content model and fragment builder.
//!
//! - [`ContentModel`]: the person's resume/portfolio data, as supplied by the caller.
//! - [`ContentModelBuilder`]: pure mapping from a model to a [`LayoutFragment`].
//! - [`LayoutFragment`]: the styled node tree the export stage lays out and paints.

pub mod builder;
pub mod fragment;
pub mod model;
pub mod theme;

pub use builder::{build, ContentModelBuilder};
pub use fragment::{
    BoxStyle, Edges, FontRequest, FragmentNode, LayoutFragment, TextAlign, TextStyle,
};
pub use model::{
    Certification, ContentError, ContentModel, Education, Experience, Identity, Project,
    SkillCategory,
};
pub use theme::Theme;
