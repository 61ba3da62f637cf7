use chrono::{DateTime, Local};
use tracing::{error, info};

use crate::{
    catalog::Catalog,
    data::{PredictionService, ServiceError},
    model::MatchPrediction,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub matches: Vec<MatchPrediction>,
}

/// Buckets matches by group, keeping first-seen group order and the
/// received order inside each group.
pub fn group_matches(matches: Vec<MatchPrediction>) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for m in matches {
        let key = m.group_key().to_string();
        match groups.iter_mut().find(|g| g.name == key) {
            Some(group) => group.matches.push(m),
            None => groups.push(Group {
                name: key,
                matches: vec![m],
            }),
        }
    }
    groups
}

/// Rows drawn per group: title and blank line, four per match, one trailing.
pub const GROUP_HEADER_LINES: usize = 2;
pub const LINES_PER_MATCH: usize = 4;
pub const GROUP_FOOTER_LINES: usize = 1;

pub fn outcome_label(m: &MatchPrediction) -> String {
    if m.is_draw() {
        format!("Match nul ({}%)", m.prediction_score)
    } else {
        format!("Gagnant : {} ({}%)", m.winner, m.prediction_score)
    }
}

#[derive(Debug, Default)]
pub enum TournamentState {
    #[default]
    NotLoaded,
    Loading,
    Loaded {
        groups: Vec<Group>,
        fetched_at: DateTime<Local>,
    },
    Failed(ServiceError),
}

#[derive(Debug, Default)]
pub struct TournamentView {
    state: TournamentState,
    scroll: u16,
    viewport: u16,
}

impl TournamentView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TournamentState {
        &self.state
    }

    pub fn groups(&self) -> &[Group] {
        match &self.state {
            TournamentState::Loaded { groups, .. } => groups,
            _ => &[],
        }
    }

    /// Returns true exactly once, the first time the view is shown.
    pub fn begin_fetch(&mut self) -> bool {
        if matches!(self.state, TournamentState::NotLoaded) {
            self.state = TournamentState::Loading;
            true
        } else {
            false
        }
    }

    pub fn complete(&mut self, result: Result<Vec<MatchPrediction>, ServiceError>) {
        self.state = match result {
            Ok(matches) => {
                let groups = group_matches(matches);
                info!(groups = groups.len(), "tournament predictions loaded");
                TournamentState::Loaded {
                    groups,
                    fetched_at: Local::now(),
                }
            }
            Err(err) => {
                error!(%err, "error fetching predictions");
                TournamentState::Failed(err)
            }
        };
    }

    pub async fn load<S: PredictionService>(&mut self, service: &S) {
        if self.begin_fetch() {
            let result = service.fetch_predictions().await;
            self.complete(result);
        }
    }

    /// Country codes of every home and away team the catalog knows.
    pub fn team_codes(&self, catalog: &Catalog) -> Vec<String> {
        self.groups()
            .iter()
            .flat_map(|g| &g.matches)
            .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()])
            .filter_map(|name| catalog.team_by_name(name))
            .map(|t| t.country_code.clone())
            .collect()
    }

    pub fn content_height(&self) -> u16 {
        let lines: usize = self
            .groups()
            .iter()
            .map(|g| GROUP_HEADER_LINES + LINES_PER_MATCH * g.matches.len() + GROUP_FOOTER_LINES)
            .sum();
        u16::try_from(lines).unwrap_or(u16::MAX)
    }

    fn max_scroll(&self) -> u16 {
        self.content_height().saturating_sub(self.viewport)
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Records how many rows the group list gets on screen.
    pub fn set_viewport(&mut self, height: u16) {
        self.viewport = height;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}
