use crate::accessor::Geometry;

/// Whether a control is hidden under the fixed header or below the fold.
pub fn is_out_of_view(geometry: &Geometry, header_margin: f64) -> bool {
    geometry.top < header_margin || geometry.bottom > geometry.viewport_height
}

/// Window scroll offset that centers the control vertically.
pub fn centered_scroll_top(geometry: &Geometry) -> f64 {
    let top = geometry.offset_top - geometry.viewport_height / 2.0 + geometry.offset_height / 2.0;
    top.max(0.0)
}
