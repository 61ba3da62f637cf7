use std::sync::Arc;

use crossterm::event::KeyCode;
use image::DynamicImage;

use crate::{
    catalog::Catalog,
    data::ServiceError,
    flags::FlagCache,
    model::{MatchPrediction, PredictResponse},
    selection::{Pending, SelectionView},
    tournament::TournamentView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Matches,
    Euro,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Matches, Tab::Euro];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Matches => "Matchs",
            Tab::Euro => "Euro",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Matches => 0,
            Tab::Euro => 1,
        }
    }
}

/// Work the event loop must start on a background task.
#[derive(Debug, PartialEq)]
pub enum Action {
    Predict(Pending),
    FetchPredictions,
    FetchFlags(Vec<String>),
}

/// Results coming back from background tasks.
#[derive(Debug)]
pub enum Message {
    Prediction {
        ticket: u64,
        result: Result<PredictResponse, ServiceError>,
    },
    Predictions(Result<Vec<MatchPrediction>, ServiceError>),
    Flag {
        code: String,
        image: DynamicImage,
    },
}

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub tab: Tab,
    pub selection: SelectionView,
    pub tournament: TournamentView,
    pub flags: FlagCache,
}

impl App {
    pub fn new(catalog: Arc<Catalog>, show_flags: bool) -> Self {
        Self {
            should_quit: false,
            tab: Tab::Matches,
            selection: SelectionView::new(catalog),
            tournament: TournamentView::new(),
            flags: FlagCache::new(show_flags),
        }
    }

    pub fn on_key(&mut self, code: KeyCode) -> Vec<Action> {
        let mut actions = Vec::new();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('1') => self.tab = Tab::Matches,
            KeyCode::Char('2') => self.tab = Tab::Euro,
            KeyCode::Tab => {
                self.tab = match self.tab {
                    Tab::Matches => Tab::Euro,
                    Tab::Euro => Tab::Matches,
                }
            }
            KeyCode::Char('g') => self.flags.toggle(),
            _ => match self.tab {
                Tab::Matches => self.on_selection_key(code, &mut actions),
                Tab::Euro => self.on_tournament_key(code),
            },
        }

        if self.tab == Tab::Euro && self.tournament.begin_fetch() {
            actions.push(Action::FetchPredictions);
        }
        self.push_flag_fetches(&mut actions);
        actions
    }

    fn on_selection_key(&mut self, code: KeyCode, actions: &mut Vec<Action>) {
        use crate::selection::Field;

        let view = &mut self.selection;
        match code {
            KeyCode::Up | KeyCode::Char('k') => view.focus_previous(),
            KeyCode::Down | KeyCode::Char('j') => view.focus_next(),
            KeyCode::Left | KeyCode::Char('h') => view.cycle(false),
            KeyCode::Right | KeyCode::Char('l') => view.cycle(true),
            KeyCode::Backspace | KeyCode::Delete => view.clear_focused(),
            KeyCode::Char('s') => actions.extend(view.begin_submit().map(Action::Predict)),
            KeyCode::Enter if view.focus == Field::Submit => {
                actions.extend(view.begin_submit().map(Action::Predict))
            }
            KeyCode::Enter => view.focus_next(),
            _ => {}
        }
    }

    fn on_tournament_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Down | KeyCode::Char('j') => self.tournament.scroll_down(),
            KeyCode::Up | KeyCode::Char('k') => self.tournament.scroll_up(),
            _ => {}
        }
    }

    fn push_flag_fetches(&mut self, actions: &mut Vec<Action>) {
        let mut codes = self.selection.flag_codes();
        codes.extend(self.tournament.team_codes(self.selection.catalog()));
        let missing = self.flags.claim_missing(codes);
        if !missing.is_empty() {
            actions.push(Action::FetchFlags(missing));
        }
    }

    /// Applies a background result and returns any follow-up work.
    pub fn apply(&mut self, message: Message) -> Vec<Action> {
        match message {
            Message::Prediction { ticket, result } => self.selection.complete(ticket, result),
            Message::Predictions(result) => self.tournament.complete(result),
            Message::Flag { code, image } => self.flags.insert(&code, image),
        }
        let mut actions = Vec::new();
        self.push_flag_fetches(&mut actions);
        actions
    }
}
