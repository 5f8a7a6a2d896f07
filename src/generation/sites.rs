//! Jittered Lattice Site Distribution
//!
//! Voronoi sites are placed on a regular lattice with a random offset per
//! site, which gives evenly sized but irregular cells.
//!
//! # Algorithm
//!
//! Lattice points start half an interval in from the origin and step by
//! `voronoi_site_interval`. Each site is offset by a uniform draw in
//! `[-variance, variance)` per axis. Where a tunnel node lies within one
//! interval of a site, three extra sites are added half an interval away
//! (right, up, diagonal) so tunnels are carved through smaller cells.

use glam::{IVec2, Vec2};

use crate::geometry::Rect;
use crate::rng::LevelRng;

/// Generate Voronoi sites for a level
///
/// # Arguments
///
/// * `borders` - Level borders; sites are clamped one unit inside them
/// * `interval` - Lattice spacing
/// * `variance` - Maximum random offset per axis
/// * `tunnels` - Tunnel node lists that get denser sites around them
/// * `rng` - Level random stream
///
/// # Example
///
/// ```rust
/// use glam::IVec2;
/// use rust_voronoi_cave::generation::generate_sites;
/// use rust_voronoi_cave::{LevelRng, Rect};
///
/// let mut rng = LevelRng::from_seed_str("sites");
/// let borders = Rect::new(0.0, 0.0, 30_000.0, 12_000.0);
/// let sites = generate_sites(borders, IVec2::new(3000, 3000), IVec2::new(700, 700), &[], &mut rng);
/// assert_eq!(sites.len(), 10 * 4);
/// ```
pub fn generate_sites(
    borders: Rect,
    interval: IVec2,
    variance: IVec2,
    tunnels: &[Vec<Vec2>],
    rng: &mut LevelRng,
) -> Vec<Vec2> {
    let width = borders.width as i32;
    let height = borders.height as i32;
    let interval_sqr = (interval.x * interval.x + interval.y * interval.y) as f32;

    let cols = (width / interval.x.max(1)) as usize + 1;
    let rows = (height / interval.y.max(1)) as usize + 1;
    let mut sites = Vec::with_capacity(cols * rows);

    let mut x = interval.x / 2;
    while x < width {
        let mut y = interval.y / 2;
        while y < height {
            let site = Vec2::new(
                (x + rng.range_i32(-variance.x, variance.x)) as f32,
                (y + rng.range_i32(-variance.y, variance.y)) as f32,
            );

            let near_tunnel = tunnels
                .iter()
                .flatten()
                .any(|node| node.distance_squared(site) < interval_sqr);
            if near_tunnel {
                let half = interval / 2;
                if x < width - interval.x {
                    sites.push(Vec2::new((x + half.x) as f32, y as f32));
                }
                if y < height - interval.y {
                    sites.push(Vec2::new(x as f32, (y + half.y) as f32));
                }
                if x < width - interval.x && y < height - interval.y {
                    sites.push(Vec2::new((x + half.x) as f32, (y + half.y) as f32));
                }
            }

            sites.push(site);
            y += interval.y;
        }
        x += interval.x;
    }

    let min = Vec2::new(borders.x + 1.0, borders.y + 1.0);
    let max = Vec2::new(borders.right() - 1.0, borders.top() - 1.0);
    for site in &mut sites {
        *site = site.clamp(min, max);
    }

    sites
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_count_without_tunnels() {
        let mut rng = LevelRng::from_seed_str("count");
        let borders = Rect::new(0.0, 0.0, 30_000.0, 12_000.0);
        let sites = generate_sites(
            borders,
            IVec2::new(3000, 3000),
            IVec2::new(700, 700),
            &[],
            &mut rng,
        );
        assert_eq!(sites.len(), 40);
    }

    #[test]
    fn test_sites_stay_inside_borders() {
        let mut rng = LevelRng::from_seed_str("inside");
        let borders = Rect::new(0.0, 0.0, 20_000.0, 10_000.0);
        let sites = generate_sites(
            borders,
            IVec2::new(1000, 1000),
            IVec2::new(900, 900),
            &[],
            &mut rng,
        );
        for site in sites {
            assert!(site.x >= 1.0 && site.x <= 19_999.0);
            assert!(site.y >= 1.0 && site.y <= 9999.0);
        }
    }

    #[test]
    fn test_tunnels_add_sites() {
        let borders = Rect::new(0.0, 0.0, 30_000.0, 12_000.0);
        let tunnel = vec![Vec2::new(15_000.0, 6000.0), Vec2::new(16_000.0, 6500.0)];

        let mut rng = LevelRng::from_seed_str("dense");
        let plain = generate_sites(
            borders,
            IVec2::new(3000, 3000),
            IVec2::new(700, 700),
            &[],
            &mut rng,
        );
        let mut rng = LevelRng::from_seed_str("dense");
        let dense = generate_sites(
            borders,
            IVec2::new(3000, 3000),
            IVec2::new(700, 700),
            &[tunnel],
            &mut rng,
        );
        assert!(dense.len() > plain.len());
    }

    #[test]
    fn test_sites_are_deterministic() {
        let borders = Rect::new(0.0, 0.0, 20_000.0, 10_000.0);
        let run = || {
            let mut rng = LevelRng::from_seed_str("AB");
            generate_sites(
                borders,
                IVec2::new(3000, 3000),
                IVec2::new(700, 700),
                &[],
                &mut rng,
            )
        };
        assert_eq!(run(), run());
    }
}
