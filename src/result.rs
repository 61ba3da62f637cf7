use image::DynamicImage;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::{
    flags::FlagWidget,
    selection::{Winner, RIVAL_CODE},
};

pub const PRIMARY: Color = Color::Rgb(0, 75, 255);

pub fn rounded_percent(score: f64) -> i64 {
    score.round() as i64
}

pub fn caption(country_code: &str) -> &'static str {
    if country_code == RIVAL_CODE {
        "de probabilité de pénalty"
    } else {
        "de probabilité de gagner"
    }
}

pub fn winner_lines(winner: &Winner) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            format!("{} 🏆", winner.team),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!(" {}% ", rounded_percent(winner.prediction_score)),
                Style::default().bg(Color::White).fg(PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(caption(&winner.country_code), Style::default().add_modifier(Modifier::BOLD)),
        ]),
    ]
}

/// Flag on top, name and rounded probability underneath.
pub struct WinnerPanel<'a> {
    pub winner: &'a Winner,
    pub flag: Option<&'a DynamicImage>,
}

impl Widget for WinnerPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let flag_height = if self.flag.is_some() { 6 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(flag_height), Constraint::Min(0)])
            .split(area);

        if let Some(img) = self.flag {
            let flag_area = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(0), Constraint::Length(18), Constraint::Min(0)])
                .split(chunks[0])[1];
            FlagWidget::new(img).render(flag_area, buf);
        }

        Paragraph::new(winner_lines(self.winner))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
    }
}
