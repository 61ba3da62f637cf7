use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    catalog::Catalog,
    data::{PredictionService, ServiceError},
    model::{PredictRequest, PredictResponse},
};

pub const MISSING_TEAMS_NOTICE: &str = "Veuillez sélectionner deux équipes.";

/// Team code that swaps the title and the winner caption.
pub const RIVAL_CODE: &str = "AR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Team1,
    Team2,
    Tournament,
    City,
    Country,
    Submit,
}

impl Field {
    const ORDER: [Field; 6] = [
        Field::Team1,
        Field::Team2,
        Field::Tournament,
        Field::City,
        Field::Country,
        Field::Submit,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        let len = Self::ORDER.len();
        Self::ORDER[(self.index() + len - 1) % len]
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Field::Team1 | Field::Team2 => "Sélection d'une équipe",
            Field::Tournament => "Sélection d'un tournoi",
            Field::City => "Sélection d'une ville",
            Field::Country => "Sélection d'un pays",
            Field::Submit => "",
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub team1_code: Option<String>,
    pub team2_code: Option<String>,
    pub tournament: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Selection {
    fn slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::Team1 => Some(&mut self.team1_code),
            Field::Team2 => Some(&mut self.team2_code),
            Field::Tournament => Some(&mut self.tournament),
            Field::City => Some(&mut self.city),
            Field::Country => Some(&mut self.country),
            Field::Submit => None,
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Team1 => self.team1_code.as_deref(),
            Field::Team2 => self.team2_code.as_deref(),
            Field::Tournament => self.tournament.as_deref(),
            Field::City => self.city.as_deref(),
            Field::Country => self.country.as_deref(),
            Field::Submit => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Winner {
    pub team: String,
    pub country_code: String,
    pub prediction_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Decisive {
        winner: Winner,
        home_score: f64,
        away_score: f64,
    },
    Draw {
        draw_probability: f64,
        home_score: f64,
        away_score: f64,
    },
    /// The service named a winner the catalog does not know.
    ScoresOnly {
        unresolved_winner: String,
        home_score: f64,
        away_score: f64,
    },
}

impl Outcome {
    pub fn scores(&self) -> (f64, f64) {
        match self {
            Outcome::Decisive { home_score, away_score, .. }
            | Outcome::Draw { home_score, away_score, .. }
            | Outcome::ScoresOnly { home_score, away_score, .. } => (*home_score, *away_score),
        }
    }

    pub fn winner(&self) -> Option<&Winner> {
        match self {
            Outcome::Decisive { winner, .. } => Some(winner),
            _ => None,
        }
    }

    pub fn draw_line(&self) -> Option<String> {
        match self {
            Outcome::Draw {
                draw_probability,
                home_score,
                away_score,
            } => Some(format!(
                "Match nul prédit : {home_score} - {away_score} ({draw_probability}% de probabilité de faire match nul)"
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{}", MISSING_TEAMS_NOTICE)]
    MissingTeams,

    #[error("unknown team code {0}")]
    UnknownTeamCode(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// A request handed to the caller to run off the event loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    pub ticket: u64,
    pub request: PredictRequest,
}

#[derive(Debug)]
pub struct SelectionView {
    catalog: Arc<Catalog>,
    pub selection: Selection,
    pub focus: Field,
    in_flight: bool,
    pending_ticket: Option<u64>,
    next_ticket: u64,
    outcome: Option<Outcome>,
    error: Option<SubmitError>,
}

impl SelectionView {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            selection: Selection::default(),
            focus: Field::Team1,
            in_flight: false,
            pending_ticket: None,
            next_ticket: 1,
            outcome: None,
            error: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn error(&self) -> Option<&SubmitError> {
        self.error.as_ref()
    }

    pub fn title(&self) -> &'static str {
        if self.selection.team2_code.as_deref() == Some(RIVAL_CODE) {
            "The Pessitor 💀"
        } else {
            "The Predictor ⚽️"
        }
    }

    pub fn button_label(&self) -> &'static str {
        if self.in_flight {
            "Simulation en cours..."
        } else {
            "Simuler"
        }
    }

    /// Text shown in a picker for the current value of `field`.
    pub fn display_value(&self, field: Field) -> Option<&str> {
        let value = self.selection.get(field)?;
        match field {
            Field::Team1 | Field::Team2 => self.catalog.team_by_code(value).map(|t| t.team.as_str()),
            _ => Some(value),
        }
    }

    fn options(&self, field: Field) -> Vec<&str> {
        match field {
            Field::Team1 | Field::Team2 => self
                .catalog
                .teams()
                .iter()
                .map(|t| t.country_code.as_str())
                .collect(),
            Field::Tournament => self.catalog.tournaments.iter().map(String::as_str).collect(),
            Field::City => self.catalog.cities.iter().map(String::as_str).collect(),
            Field::Country => self.catalog.countries.iter().map(String::as_str).collect(),
            Field::Submit => Vec::new(),
        }
    }

    pub fn select(&mut self, field: Field, value: Option<String>) {
        if let Some(slot) = self.selection.slot(field) {
            *slot = value;
            if self.error.as_ref().is_some_and(|e| matches!(e, SubmitError::MissingTeams)) {
                self.error = None;
            }
        }
    }

    /// Steps the focused picker through its options.
    pub fn cycle(&mut self, forward: bool) {
        let field = self.focus;
        let options = self.options(field);
        if options.is_empty() {
            return;
        }
        let current = self
            .selection
            .get(field)
            .and_then(|v| options.iter().position(|o| *o == v));
        let len = options.len();
        let idx = match (current, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        let value = options[idx].to_string();
        self.select(field, Some(value));
    }

    pub fn clear_focused(&mut self) {
        self.select(self.focus, None);
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    /// Validates the selection and moves the view into the in-flight state.
    /// Returns `None` when no request must be sent.
    pub fn begin_submit(&mut self) -> Option<Pending> {
        if self.in_flight {
            debug!("submit ignored, a prediction is already in flight");
            return None;
        }
        let (Some(code1), Some(code2)) = (
            self.selection.team1_code.clone(),
            self.selection.team2_code.clone(),
        ) else {
            info!("submit rejected, both teams are required");
            self.error = Some(SubmitError::MissingTeams);
            return None;
        };

        self.outcome = None;
        self.error = None;
        self.in_flight = true;

        let team1 = self.catalog.team_by_code(&code1).map(|t| t.team.clone());
        let team2 = self.catalog.team_by_code(&code2).map(|t| t.team.clone());
        let (team1, team2) = match (team1, team2) {
            (Some(t1), Some(t2)) => (t1, t2),
            (None, _) => {
                self.fail_before_send(SubmitError::UnknownTeamCode(code1));
                return None;
            }
            (_, None) => {
                self.fail_before_send(SubmitError::UnknownTeamCode(code2));
                return None;
            }
        };

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending_ticket = Some(ticket);

        let request = PredictRequest {
            team1,
            team2,
            tournament: self.selection.tournament.clone(),
            city: self.selection.city.clone(),
            country: self.selection.country.clone(),
        };
        info!(ticket, team1 = %request.team1, team2 = %request.team2, "submitting prediction");
        Some(Pending { ticket, request })
    }

    fn fail_before_send(&mut self, err: SubmitError) {
        error!(%err, "prediction not sent");
        self.error = Some(err);
        self.in_flight = false;
    }

    /// Applies the outcome of the request identified by `ticket`.
    pub fn complete(&mut self, ticket: u64, result: Result<PredictResponse, ServiceError>) {
        if self.pending_ticket != Some(ticket) {
            debug!(ticket, "discarding stale prediction result");
            return;
        }
        self.pending_ticket = None;
        self.in_flight = false;

        let resp = match result {
            Ok(resp) => resp,
            Err(err) => {
                error!(ticket, %err, "prediction failed");
                self.error = Some(err.into());
                return;
            }
        };

        let (home_score, away_score) = (resp.home_score, resp.away_score);
        let outcome = if resp.is_draw() {
            Outcome::Draw {
                draw_probability: resp.prediction_score,
                home_score,
                away_score,
            }
        } else {
            match self.catalog.team_by_name(&resp.winner) {
                Some(team) => Outcome::Decisive {
                    winner: Winner {
                        team: team.team.clone(),
                        country_code: team.country_code.clone(),
                        prediction_score: resp.prediction_score,
                    },
                    home_score,
                    away_score,
                },
                None => {
                    warn!(ticket, winner = %resp.winner, "winner is not in the team list");
                    Outcome::ScoresOnly {
                        unresolved_winner: resp.winner,
                        home_score,
                        away_score,
                    }
                }
            }
        };
        info!(ticket, ?outcome, "prediction received");
        self.outcome = Some(outcome);
    }

    /// Runs one full request/response cycle inline.
    pub async fn submit<S: PredictionService>(&mut self, service: &S) {
        if let Some(pending) = self.begin_submit() {
            let result = service.predict(&pending.request).await;
            self.complete(pending.ticket, result);
        }
    }

    /// Country codes whose flags the view currently shows.
    pub fn flag_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = [&self.selection.team1_code, &self.selection.team2_code]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        if let Some(winner) = self.outcome.as_ref().and_then(Outcome::winner) {
            codes.push(winner.country_code.clone());
        }
        codes
    }
}
