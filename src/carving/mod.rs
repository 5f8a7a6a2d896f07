//! Carving open water out of the cell diagram
//!
//! The main path is walked through its nodes, widened to the minimum path
//! width, joined by side tunnels, and finally everything not bordering open
//! water is discarded.

mod cleanup;
mod path;
mod tunnel;
mod widen;

pub use cleanup::{clean_cells, create_holes, flag_outside_level};
pub use path::{generate_path, generate_path_between, resolve_targets};
pub use tunnel::{carve_tunnels, generate_tunnel, generate_tunnels, Tunnel, TunnelBounds};
pub use widen::{sample_polyline, too_close_cells, widen_path};
