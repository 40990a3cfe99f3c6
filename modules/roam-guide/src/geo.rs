use roam_common::Coordinates;
use tracing::debug;

/// Best-effort device reading, or `fallback` when absent or out of range.
pub fn resolve_location(reading: Option<Coordinates>, fallback: Coordinates) -> Coordinates {
    match reading {
        Some(coordinates) if coordinates.is_valid() => coordinates,
        Some(coordinates) => {
            debug!(?coordinates, "Ignoring invalid location reading");
            fallback
        }
        None => fallback,
    }
}

pub fn directions_url(destination: Coordinates) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&destination={},{}",
        destination.latitude, destination.longitude
    )
}

pub fn map_embed_url(destination: Coordinates) -> String {
    format!(
        "https://maps.google.com/maps?q={},{}&z=15&output=embed",
        destination.latitude, destination.longitude
    )
}
