//! Visual definitions shared by node renderers and the flow drawer.

mod stroke;
mod text;

pub use stroke::{StrokeCap, StrokeDefinition, StrokeJoin, StrokeStyle, dasharray_value};
pub use text::{Text, TextDefinition};
