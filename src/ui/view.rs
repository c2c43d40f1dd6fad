use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::snapshot::Snapshot;

const CARD_PADDING: u16 = 4;
const AD_CARD_WIDTH: u16 = 64;
const AD_CARD_HEIGHT: u16 = 14;

pub const AD_BADGE: &str = " AD ";
pub const AD_CLOSE: &str = " × ";
pub const CANNOT_SKIP_FOOTER: &str = "Ad cannot be skipped";
pub const CANNOT_SKIP_NOTICE: &str = "You cannot skip this ad.";

/// One way of drawing the body of the screen.
pub trait View {
    fn render(&self, snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer);
}

pub struct ContentView;

pub struct InterstitialView;

pub struct CompleteView;

pub fn current_view(snap: &Snapshot<'_>) -> Box<dyn View> {
    if snap.complete {
        Box::new(CompleteView)
    } else if snap.is_ad {
        Box::new(InterstitialView)
    } else {
        Box::new(ContentView)
    }
}

/// Rect of at most `width` x `height`, centered inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Rows a line takes once wrapped to `width` columns. Word wrapping can
/// leave a short tail, so a line that wraps at all gets one spare row.
fn wrapped_rows(line_width: usize, width: usize) -> usize {
    if width == 0 || line_width <= width {
        1
    } else {
        line_width.div_ceil(width) + 1
    }
}

fn body_style(fading: bool) -> Style {
    if fading {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    } else {
        Style::default()
    }
}

impl View for ContentView {
    fn render(&self, snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
        let lines = snap.screen_content_lines;
        let widest = lines.iter().map(|l| l.width()).max().unwrap_or(0);
        let button_rows = if snap.acknowledgment_required { 2 } else { 0 };

        let width = to_u16(widest)
            .saturating_add(CARD_PADDING * 2 + 2)
            .min(area.width);
        let text_width = usize::from(width.saturating_sub(2));
        let rows: usize = lines.iter().map(|l| wrapped_rows(l.width(), text_width)).sum();
        let height = to_u16(rows).saturating_add(4 + button_rows);
        let card = centered(area, width, height);
        Clear.render(card, buf);

        let style = body_style(snap.fading);
        // hidden lines keep their row so nothing jumps when they appear
        let text: Vec<Line> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if snap.is_line_visible(i) {
                    Line::from(Span::styled(line.as_str(), style))
                } else {
                    Line::default()
                }
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(card);
        block.render(card, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .vertical_margin(1)
            .constraints([Constraint::Min(0), Constraint::Length(button_rows)])
            .split(inner);

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .render(chunks[0], buf);

        if snap.acknowledgment_required {
            render_acknowledge_button(snap, chunks[1], buf);
        }
    }
}

fn render_acknowledge_button(snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    let enabled = !snap.acknowledged && !snap.fading;
    let style = if enabled {
        Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
    };
    let label = format!("[ {} ]", snap.acknowledge_label);

    Paragraph::new(Line::from(Span::styled(label, style)))
        .alignment(Alignment::Center)
        .render(Rect::new(area.x, area.bottom().saturating_sub(1), area.width, 1), buf);
}

impl View for InterstitialView {
    fn render(&self, snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        let card = centered(chunks[0], AD_CARD_WIDTH, AD_CARD_HEIGHT);
        Clear.render(card, buf);

        let fade = body_style(snap.fading);
        let badge = Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD);

        let top_left = Line::from(vec![
            Span::styled(AD_BADGE, badge),
            Span::styled(" Sponsored ", Style::default().add_modifier(Modifier::ITALIC)),
        ]);
        let top_right = Line::from(vec![
            Span::styled(
                format!(" {} ", snap.ad_countdown_remaining),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(AD_CLOSE, Style::default().fg(Color::DarkGray)),
        ])
        .right_aligned();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(top_left)
            .title(top_right);
        let inner = block.inner(card);
        block.render(card, buf);

        let mut text = Vec::new();
        if let Some(ad) = snap.ad {
            text.push(Line::from(Span::styled(
                ad.title.as_str(),
                fade.add_modifier(Modifier::BOLD),
            )));
            text.push(Line::default());
            text.push(Line::from(Span::styled(ad.body.as_str(), fade)));
            text.push(Line::default());
            if !ad.fine_print.is_empty() {
                text.push(Line::from(Span::styled(
                    ad.fine_print.as_str(),
                    fade.add_modifier(Modifier::DIM | Modifier::ITALIC),
                )));
                text.push(Line::default());
            }
            if !ad.call_to_action.is_empty() {
                text.push(Line::from(Span::styled(
                    format!("[ {} ]", ad.call_to_action),
                    fade.fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
            }
        }
        if snap.cannot_skip_notice {
            text.push(Line::default());
            text.push(Line::from(Span::styled(
                CANNOT_SKIP_NOTICE,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(inner.inner(Margin::new(1, 0)), buf);

        Paragraph::new(Span::styled(
            CANNOT_SKIP_FOOTER,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Left)
        .render(chunks[1], buf);
    }
}

impl View for CompleteView {
    fn render(&self, snap: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
        let label = snap.complete_label;
        let card = centered(area, to_u16(label.width()).saturating_add(8), 3);
        Clear.render(card, buf);

        Paragraph::new(Line::from(Span::styled(
            label,
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(Rect::new(card.x, card.y + card.height / 2, card.width, 1), buf);
    }
}
