use std::fmt::Debug;

use num::Num;

/// Numeric cell type accepted by every stage of the pipeline.
///
/// Products are accumulated in `Self`, starting from `Self::zero()`.
pub trait Element: Num + Copy + Send + Sync + Debug + 'static {}

impl<T> Element for T where T: Num + Copy + Send + Sync + Debug + 'static {}
