pub mod effects;
pub mod view;

use rand::Rng;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::{app::App, clock, snapshot::Snapshot};

const HORIZONTAL_MARGIN: u16 = 2;
const HEADER_HEIGHT: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        render_snapshot(
            &self.sequencer.snapshot(),
            area,
            buf,
            &mut rand::thread_rng(),
        );
    }
}

/// Draws one frame. Grain is drawn first and the flash last.
pub fn render_snapshot<R: Rng>(snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer, rng: &mut R) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    effects::render_grain(snap.grain, chunks[1], buf, rng);

    render_header(snap, chunks[0], buf);
    view::current_view(snap).render(snap, chunks[1], buf);
    render_legend(snap, chunks[2], buf);

    effects::render_vignette(snap.vignette, area, buf);
    if snap.flash {
        effects::render_flash(area, buf);
    }
}

fn render_header(snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    block.render(area, buf);
    let inner = Rect::new(
        inner.x + HORIZONTAL_MARGIN.min(inner.width),
        inner.y,
        inner.width.saturating_sub(HORIZONTAL_MARGIN * 2),
        inner.height,
    );

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let mut left = Vec::new();
    if !snap.complete {
        left.push(Span::styled("STATUS ", dim));
        left.push(Span::styled(snap.status_label, bold));
        if snap.administering {
            left.push(Span::styled("   ELAPSED ", dim));
            left.push(Span::styled(snap.elapsed_display.as_str(), bold));
            if let Some(dose) = snap.dose {
                left.push(Span::styled("   DOSE ", dim));
                left.push(Span::styled(
                    format!("{}/{} {}", dose.administered, dose.total, dose.unit),
                    bold,
                ));
            }
        }
    }

    let stamp = format!(
        "{} | {}",
        clock::format_date(&snap.wall_time),
        clock::format_time(&snap.wall_time)
    );
    let stamp_width = u16::try_from(stamp.width()).map_or(inner.width, |w| w.min(inner.width));

    Paragraph::new(Line::from(left)).render(
        Rect::new(
            inner.x,
            inner.y,
            inner.width.saturating_sub(stamp_width + 1),
            inner.height,
        ),
        buf,
    );
    Paragraph::new(Span::styled(stamp, dim))
        .alignment(Alignment::Right)
        .render(inner, buf);
}

fn render_legend(snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    let legend = if snap.complete {
        "(esc)ape"
    } else if snap.is_ad {
        "(x) close ad / (esc)ape"
    } else if snap.acknowledgment_required {
        "(enter) acknowledge / (esc)ape"
    } else {
        "(esc)ape"
    };

    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Right)
    .render(area, buf);
}
