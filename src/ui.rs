use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};
use tui_big_text::{BigText, PixelSize};

use crate::{
    app::{App, Tab},
    flags::{inline_flag, FlagWidget},
    result::{WinnerPanel, PRIMARY},
    selection::{Field, SelectionView, SubmitError},
    tournament::{outcome_label, TournamentState},
};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Nav
            Constraint::Min(0),    // Page
            Constraint::Length(1), // Help
        ])
        .split(f.area());

    draw_nav(f, app, chunks[0]);
    match app.tab {
        Tab::Matches => draw_selection(f, app, chunks[1]),
        Tab::Euro => draw_tournament(f, app, chunks[1]),
    }

    let help = match app.tab {
        Tab::Matches => " ↑/↓ champ  ←/→ choix  ⌫ effacer  s/⏎ simuler  g drapeaux  Tab page  q quitter",
        Tab::Euro => " ↑/↓ défiler  Tab page  q quitter",
    };
    f.render_widget(Paragraph::new(help).fg(Color::DarkGray), chunks[2]);
}

fn draw_nav(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.label())).collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn draw_title(f: &mut Frame, title: &str, area: Rect) {
    let (word, emoji) = title.rsplit_once(' ').unwrap_or((title, ""));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    if area.width < 110 || area.height < 5 {
        let p = Paragraph::new(title.to_string())
            .style(Style::default().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        f.render_widget(p, area);
    } else {
        let big = BigText::builder()
            .pixel_size(PixelSize::Quadrant)
            .style(Style::default().fg(Color::White))
            .lines(vec![word.to_string().into()])
            .alignment(Alignment::Center)
            .build();
        f.render_widget(big, chunks[0]);
        f.render_widget(Paragraph::new(emoji.to_string()).alignment(Alignment::Center), chunks[1]);
    }
}

fn draw_selection(f: &mut Frame, app: &App, area: Rect) {
    let view = &app.selection;
    let result_height = match view.outcome() {
        Some(outcome) if outcome.winner().is_some() => 10,
        _ => 3,
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),             // Title
            Constraint::Length(12),            // Teams
            Constraint::Length(1),             // "Paramètres"
            Constraint::Length(9),             // Context pickers
            Constraint::Length(3),             // Button
            Constraint::Length(result_height), // Result
            Constraint::Min(0),
        ])
        .split(area);

    draw_title(f, view.title(), chunks[0]);

    let team_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(10),
            Constraint::Percentage(45),
        ])
        .split(chunks[1]);

    draw_team_column(f, app, Field::Team1, team_chunks[0]);
    let vs = Paragraph::new(vec![
        Line::from(""),
        Line::from(""),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(" VS ", Style::default().bg(PRIMARY).fg(Color::White).add_modifier(Modifier::BOLD))),
    ])
    .alignment(Alignment::Center);
    f.render_widget(vs, team_chunks[1]);
    draw_team_column(f, app, Field::Team2, team_chunks[2]);

    f.render_widget(Paragraph::new(" Paramètres").bold(), chunks[2]);
    let pickers = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Length(3)])
        .split(chunks[3]);
    for (field, rect) in [Field::Tournament, Field::City, Field::Country]
        .into_iter()
        .zip(pickers.iter())
    {
        draw_picker(f, view, field, *rect);
    }

    draw_button(f, view, chunks[4]);
    draw_result(f, app, chunks[5]);
}

fn draw_team_column(f: &mut Frame, app: &App, field: Field, area: Rect) {
    let view = &app.selection;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Flag
            Constraint::Length(3), // Picker
            Constraint::Length(1), // Score
        ])
        .split(area);

    let code = view.selection.get(field);
    match code.and_then(|c| app.flags.get(c)) {
        Some(img) => {
            let flag_area = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(0), Constraint::Length(20), Constraint::Min(0)])
                .split(chunks[0])[1];
            f.render_widget(FlagWidget::new(img), flag_area);
        }
        None => {
            let label = code.unwrap_or("?");
            let p = Paragraph::new(vec![Line::from(""), Line::from(""), Line::from(label.to_string())])
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
            f.render_widget(p, chunks[0]);
        }
    }

    draw_picker(f, view, field, chunks[1]);

    if let Some((home, away)) = view.outcome().map(|o| o.scores()) {
        let score = if field == Field::Team1 { home } else { away };
        let p = Paragraph::new(format!("Score prédit : {score}"))
            .bold()
            .alignment(Alignment::Center);
        f.render_widget(p, chunks[2]);
    }
}

fn draw_picker(f: &mut Frame, view: &SelectionView, field: Field, area: Rect) {
    let focused = view.focus == field;
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let content = match view.display_value(field) {
        Some(value) => Span::raw(value.to_string()),
        None => Span::styled(field.placeholder(), Style::default().fg(Color::DarkGray)),
    };
    let line = if focused {
        Line::from(vec![Span::raw("◀ "), content, Span::raw(" ▶")])
    } else {
        Line::from(content)
    };
    let p = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(border));
    f.render_widget(p, area);
}

fn draw_button(f: &mut Frame, view: &SelectionView, area: Rect) {
    let focused = view.focus == Field::Submit;
    let bg = if view.in_flight() {
        Color::DarkGray
    } else if focused {
        Color::Rgb(4, 50, 117)
    } else {
        Color::Rgb(0, 61, 168)
    };
    let p = Paragraph::new(view.button_label().to_uppercase())
        .style(Style::default().bg(bg).fg(Color::White).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }));
    f.render_widget(p, area);
}

fn draw_result(f: &mut Frame, app: &App, area: Rect) {
    let view = &app.selection;

    if let Some(err) = view.error() {
        let style = match err {
            SubmitError::MissingTeams => Style::default().fg(Color::Yellow),
            _ => Style::default().fg(Color::Red),
        };
        let p = Paragraph::new(err.to_string())
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(p, area);
        return;
    }

    let Some(outcome) = view.outcome() else {
        return;
    };
    if let Some(winner) = outcome.winner() {
        let panel = WinnerPanel {
            winner,
            flag: app.flags.get(&winner.country_code),
        };
        f.render_widget(panel, area);
    } else if let Some(line) = outcome.draw_line() {
        let p = Paragraph::new(line)
            .bold()
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(p, area);
    }
}

const INLINE_FLAG_WIDTH: u16 = 3;

fn draw_tournament(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Min(0),    // Groups
            Constraint::Length(1), // Status
        ])
        .split(area);

    let header = Paragraph::new("Prédictions de l'Euro 2024 ⚽️")
        .bold()
        .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    // Inside the borders.
    app.tournament.set_viewport(chunks[1].height.saturating_sub(2));
    let view = &app.tournament;

    let groups = Paragraph::new(tournament_lines(app))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .scroll((view.scroll(), 0));
    f.render_widget(groups, chunks[1]);

    let status = match view.state() {
        TournamentState::NotLoaded => Line::from(""),
        TournamentState::Loading => Line::from(" Chargement...").fg(Color::DarkGray),
        TournamentState::Loaded { fetched_at, .. } => {
            Line::from(format!(" Mis à jour à {}", fetched_at.format("%H:%M:%S"))).fg(Color::DarkGray)
        }
        TournamentState::Failed(err) => Line::from(format!(" {err}")).fg(Color::Red),
    };
    f.render_widget(Paragraph::new(status), chunks[2]);
}

/// One line per row of the group list; `TournamentView::content_height`
/// counts the same rows.
fn tournament_lines(app: &App) -> Vec<Line<'static>> {
    let view = &app.tournament;
    let flag = |name: &str| {
        app.selection
            .catalog()
            .team_by_name(name)
            .and_then(|t| app.flags.get(&t.country_code))
            .map(|img| inline_flag(img, INLINE_FLAG_WIDTH))
            .unwrap_or_default()
    };

    let mut lines = Vec::new();
    for group in view.groups() {
        lines.push(Line::from(Span::styled(
            format!("Groupe {}", group.name),
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )));
        lines.push(Line::from(""));
        for m in &group.matches {
            let mut row = flag(&m.home_team);
            if !row.is_empty() {
                row.push(Span::raw(" "));
            }
            row.push(Span::styled(m.home_team.clone(), Style::default().add_modifier(Modifier::BOLD)));
            row.push(Span::raw(format!("   {} - {}   ", m.home_score, m.away_score)));
            row.push(Span::styled(m.away_team.clone(), Style::default().add_modifier(Modifier::BOLD)));
            let away = flag(&m.away_team);
            if !away.is_empty() {
                row.push(Span::raw(" "));
                row.extend(away);
            }
            lines.push(Line::from(row));
            lines.push(Line::from(m.city.clone()).fg(Color::Gray));
            lines.push(Line::from(outcome_label(m)));
            lines.push(Line::from("─".repeat(24)).fg(Color::DarkGray));
        }
        lines.push(Line::from(""));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ratatui::{backend::TestBackend, Terminal};

    use crate::{
        app::Message,
        catalog::Catalog,
        model::{MatchPrediction, PredictResponse},
    };

    fn render(app: &mut App) -> String {
        let backend = TestBackend::new(120, 60);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        let buf = terminal.backend().buffer();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn submitted(winner: &str, score: f64, home: u32, away: u32) -> App {
        let mut app = App::new(Arc::new(Catalog::bundled().unwrap()), false);
        app.selection.select(Field::Team1, Some("FR".to_string()));
        app.selection.select(Field::Team2, Some("BR".to_string()));
        let pending = app.selection.begin_submit().unwrap();
        app.apply(Message::Prediction {
            ticket: pending.ticket,
            result: Ok(PredictResponse {
                winner: winner.to_string(),
                prediction_score: score,
                home_score: f64::from(home),
                away_score: f64::from(away),
            }),
        });
        app
    }

    #[test]
    fn decisive_result_is_rendered() {
        let screen = render(&mut submitted("France", 63.4, 2, 1));
        assert!(screen.contains("France 🏆"));
        assert!(screen.contains("63%"));
        assert!(screen.contains("de probabilité de gagner"));
        assert!(screen.contains("Score prédit : 2"));
        assert!(screen.contains("Score prédit : 1"));
        assert!(!screen.contains("Match nul prédit"));
    }

    #[test]
    fn draw_result_is_rendered() {
        let screen = render(&mut submitted("draw", 28.7, 1, 1));
        assert!(screen.contains(
            "Match nul prédit : 1 - 1 (28.7% de probabilité de faire match nul)"
        ));
        assert!(!screen.contains("de probabilité de gagner"));
    }

    #[test]
    fn button_label_follows_request() {
        let mut app = App::new(Arc::new(Catalog::bundled().unwrap()), false);
        assert!(render(&mut app).contains("SIMULER"));

        app.selection.select(Field::Team1, Some("FR".to_string()));
        app.selection.select(Field::Team2, Some("BR".to_string()));
        let pending = app.selection.begin_submit().unwrap();
        assert!(render(&mut app).contains("SIMULATION EN COURS..."));

        app.apply(Message::Prediction {
            ticket: pending.ticket,
            result: Err(crate::data::ServiceError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                detail: None,
            }),
        });
        let screen = render(&mut app);
        assert!(screen.contains("SIMULER"));
        assert!(!screen.contains("SIMULATION EN COURS"));
        assert!(!screen.contains("Score prédit"));
    }

    #[test]
    fn validation_notice_is_shown() {
        let mut app = App::new(Arc::new(Catalog::bundled().unwrap()), false);
        assert!(app.selection.begin_submit().is_none());
        assert!(render(&mut app).contains("Veuillez sélectionner deux équipes."));
    }

    #[test]
    fn tournament_groups_are_rendered() {
        let mut app = App::new(Arc::new(Catalog::bundled().unwrap()), false);
        app.tab = Tab::Euro;
        assert!(app.tournament.begin_fetch());
        let m = |home: &str, away: &str, winner: &str, group: &str| MatchPrediction {
            home_team: home.to_string(),
            away_team: away.to_string(),
            winner: winner.to_string(),
            prediction_score: 45.5,
            home_score: 1.0,
            away_score: 1.0,
            group: group.to_string(),
            city: "Munich".to_string(),
        };
        app.apply(Message::Predictions(Ok(vec![
            m("Germany", "Scotland", "Germany", "A"),
            m("Spain", "Croatia", "draw", "B"),
        ])));

        let screen = render(&mut app);
        let a = screen.find("Groupe A").unwrap();
        let b = screen.find("Groupe B").unwrap();
        assert!(a < b);
        assert!(screen.contains("Gagnant : Germany (45.5%)"));
        assert!(screen.contains("Match nul (45.5%)"));
        assert!(screen.contains("Munich"));
        assert!(screen.contains("Mis à jour à"));
    }

    fn tournament_app(matches: Vec<MatchPrediction>) -> App {
        let mut app = App::new(Arc::new(Catalog::bundled().unwrap()), true);
        app.tab = Tab::Euro;
        assert!(app.tournament.begin_fetch());
        app.apply(Message::Predictions(Ok(matches)));
        app
    }

    fn euro_match(home: &str, away: &str, group: &str) -> MatchPrediction {
        MatchPrediction {
            home_team: home.to_string(),
            away_team: away.to_string(),
            winner: home.to_string(),
            prediction_score: 60.0,
            home_score: 2.0,
            away_score: 0.0,
            group: group.to_string(),
            city: "Berlin".to_string(),
        }
    }

    #[test]
    fn tournament_rows_carry_known_flags() {
        let mut app = tournament_app(vec![euro_match("Germany", "Atlantis", "A")]);
        app.apply(Message::Flag {
            code: "de".to_string(),
            image: image::DynamicImage::new_rgba8(8, 4),
        });

        let screen = render(&mut app);
        let row = screen.lines().find(|l| l.contains("Germany")).unwrap();
        assert!(row.contains("▀▀▀ Germany   2 - 0   Atlantis"));
        assert!(!row.contains("Atlantis ▀"));
    }

    #[test]
    fn line_count_matches_content_height() {
        let app = tournament_app(vec![
            euro_match("Germany", "Scotland", "A"),
            euro_match("Hungary", "Switzerland", "A"),
            euro_match("Spain", "Croatia", "B"),
        ]);
        assert_eq!(
            tournament_lines(&app).len(),
            usize::from(app.tournament.content_height())
        );
    }

    #[test]
    fn scrolling_stops_at_the_last_row() {
        let matches = (0..20)
            .map(|i| euro_match("Germany", "Scotland", &format!("G{i}")))
            .collect();
        let mut app = tournament_app(matches);
        render(&mut app);
        for _ in 0..500 {
            app.on_key(crossterm::event::KeyCode::Down);
        }
        let screen = render(&mut app);
        // 60 rows: nav 3, help 1, header 2, status 1, borders 2.
        assert_eq!(app.tournament.scroll(), app.tournament.content_height() - 51);
        assert!(screen.contains("Groupe G19"));
    }
}
