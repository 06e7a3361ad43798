pub mod boq;
pub mod plan;
pub mod section;
