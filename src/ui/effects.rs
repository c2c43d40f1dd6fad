use rand::Rng;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
};

/// Chance per cell of a grain speck at full intensity.
pub const GRAIN_DENSITY: f64 = 0.06;
pub const VIGNETTE_MAX_DEPTH: u16 = 4;

const GRAIN_SYMBOLS: [&str; 3] = ["·", "˙", "."];

/// Scatters noise specks over `area`. Draw this before anything that must
/// stay legible.
pub fn render_grain<R: Rng>(strength: f32, area: Rect, buf: &mut Buffer, rng: &mut R) {
    if strength <= 0.0 {
        return;
    }
    let chance = (f64::from(strength) * GRAIN_DENSITY).clamp(0.0, 1.0);
    let style = Style::default().fg(Color::DarkGray);

    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if !rng.gen_bool(chance) {
                continue;
            }
            let symbol = GRAIN_SYMBOLS[rng.gen_range(0..GRAIN_SYMBOLS.len())];
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_symbol(symbol);
                cell.set_style(style);
            }
        }
    }
}

pub fn vignette_depth(strength: f32, area: Rect) -> u16 {
    let depth = (strength.clamp(0.0, 1.0) * f32::from(VIGNETTE_MAX_DEPTH)).round() as u16;
    depth.min(area.width / 4)
}

pub fn render_vignette(strength: f32, area: Rect, buf: &mut Buffer) {
    let depth = vignette_depth(strength, area);
    let style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::DIM);

    for d in 0..depth {
        let left = Rect::new(area.left() + d, area.top(), 1, area.height);
        let right = Rect::new(area.right() - 1 - d, area.top(), 1, area.height);
        buf.set_style(left, style);
        buf.set_style(right, style);
    }
}

pub fn render_flash(area: Rect, buf: &mut Buffer) {
    buf.set_style(area, Style::default().bg(Color::White).fg(Color::Black));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn specks(buf: &Buffer) -> usize {
        buf.content()
            .iter()
            .filter(|c| GRAIN_SYMBOLS.contains(&c.symbol()))
            .count()
    }

    #[test]
    fn test_grain_scales_with_strength() {
        let area = Rect::new(0, 0, 100, 40);
        let mut rng = StdRng::seed_from_u64(7);

        let mut none = Buffer::empty(area);
        render_grain(0.0, area, &mut none, &mut rng);
        assert_eq!(specks(&none), 0);

        let mut faint = Buffer::empty(area);
        render_grain(0.2, area, &mut faint, &mut rng);
        let mut heavy = Buffer::empty(area);
        render_grain(1.0, area, &mut heavy, &mut rng);

        assert!(specks(&heavy) > specks(&faint));
        assert!(specks(&heavy) < (area.area() as usize) / 4);
    }

    #[test]
    fn test_vignette_depth() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(vignette_depth(0.0, area), 0);
        assert_eq!(vignette_depth(0.5, area), 2);
        assert_eq!(vignette_depth(1.0, area), VIGNETTE_MAX_DEPTH);
        assert_eq!(vignette_depth(1.0, Rect::new(0, 0, 8, 4)), 2);
    }

    #[test]
    fn test_vignette_touches_edges_only() {
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        render_vignette(1.0, area, &mut buf);

        assert!(buf[(0, 5)].modifier.contains(Modifier::DIM));
        assert!(buf[(39, 5)].modifier.contains(Modifier::DIM));
        assert!(!buf[(20, 5)].modifier.contains(Modifier::DIM));
    }

    #[test]
    fn test_flash_covers_everything() {
        let area = Rect::new(0, 0, 10, 4);
        let mut buf = Buffer::empty(area);
        render_flash(area, &mut buf);
        assert!(buf.content().iter().all(|c| c.bg == Color::White));
    }
}
