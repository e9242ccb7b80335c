/// A batch item paired with its render layer, produced at flush time.
///
/// Lower layers draw further back. Sorting collections of render items is
/// always done with a stable sort keyed on `layer` only, so items sharing
/// a layer keep their submission order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderItem<T> {
    pub layer: i32,
    pub item: T,
}

impl<T> RenderItem<T> {
    pub fn new(layer: i32, item: T) -> Self {
        Self { layer, item }
    }
}
