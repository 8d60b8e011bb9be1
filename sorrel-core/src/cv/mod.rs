pub mod composite;
pub mod connected;
pub mod overlay;
pub mod tiling;
pub mod transform;

pub use composite::{AreaStrategy, Composite, MaskRecord, composite, composite_strict};
pub use connected::{component_areas, connected_components, first_component_area};
pub use overlay::{label_color, render_overlay};
pub use tiling::{Rect, Tile, Tiling};
