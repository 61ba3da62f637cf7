use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::model::Team;

const TEAMS_FILE: &str = "teams.json";
const CITIES_FILE: &str = "all_cities.json";
const COUNTRIES_FILE: &str = "all_countries.json";
const TOURNAMENTS_FILE: &str = "all_tournaments.json";

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("team list is empty")]
    NoTeams,

    #[error("country code {code} is used by both {first} and {second}")]
    DuplicateCode {
        code: String,
        first: String,
        second: String,
    },

    #[error("team name {0} appears more than once")]
    DuplicateName(String),
}

#[derive(Deserialize)]
struct TeamsFile {
    teams: Vec<Team>,
}

#[derive(Deserialize)]
struct CitiesFile {
    cities: Vec<String>,
}

#[derive(Deserialize)]
struct CountriesFile {
    countries: Vec<String>,
}

#[derive(Deserialize)]
struct TournamentsFile {
    tournaments: Vec<String>,
}

/// Read-only lookup tables shared by both views.
#[derive(Debug, Clone)]
pub struct Catalog {
    teams: Vec<Team>,
    by_code: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    pub cities: Vec<String>,
    pub countries: Vec<String>,
    pub tournaments: Vec<String>,
}

impl Catalog {
    pub fn new(
        mut teams: Vec<Team>,
        cities: Vec<String>,
        countries: Vec<String>,
        tournaments: Vec<String>,
    ) -> Result<Self, CatalogError> {
        if teams.is_empty() {
            return Err(CatalogError::NoTeams);
        }
        teams.sort_by(|a, b| {
            a.team
                .to_lowercase()
                .cmp(&b.team.to_lowercase())
                .then_with(|| a.team.cmp(&b.team))
        });

        let mut by_code = HashMap::with_capacity(teams.len());
        let mut by_name = HashMap::with_capacity(teams.len());
        for (idx, team) in teams.iter().enumerate() {
            if let Some(prev) = by_code.insert(team.country_code.clone(), idx) {
                return Err(CatalogError::DuplicateCode {
                    code: team.country_code.clone(),
                    first: teams[prev].team.clone(),
                    second: team.team.clone(),
                });
            }
            if by_name.insert(team.team.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateName(team.team.clone()));
            }
        }

        Ok(Self {
            teams,
            by_code,
            by_name,
            cities,
            countries,
            tournaments,
        })
    }

    /// Catalog compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_sources(
            include_str!("../data/teams.json"),
            include_str!("../data/all_cities.json"),
            include_str!("../data/all_countries.json"),
            include_str!("../data/all_tournaments.json"),
        )
    }

    pub fn load_dir(dir: &Path) -> Result<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
        };
        let catalog = Self::from_sources(
            &read(TEAMS_FILE)?,
            &read(CITIES_FILE)?,
            &read(COUNTRIES_FILE)?,
            &read(TOURNAMENTS_FILE)?,
        )?;
        info!(dir = %dir.display(), teams = catalog.teams.len(), "loaded catalog from disk");
        Ok(catalog)
    }

    fn from_sources(teams: &str, cities: &str, countries: &str, tournaments: &str) -> Result<Self> {
        let teams: TeamsFile = serde_json::from_str(teams).context("invalid team list")?;
        let cities: CitiesFile = serde_json::from_str(cities).context("invalid city list")?;
        let countries: CountriesFile =
            serde_json::from_str(countries).context("invalid country list")?;
        let tournaments: TournamentsFile =
            serde_json::from_str(tournaments).context("invalid tournament list")?;

        Ok(Self::new(
            teams.teams,
            cities.cities,
            countries.countries,
            tournaments.tournaments,
        )?)
    }

    /// Teams ordered by display name.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team_by_code(&self, code: &str) -> Option<&Team> {
        self.by_code.get(code).map(|&idx| &self.teams[idx])
    }

    pub fn team_by_name(&self, name: &str) -> Option<&Team> {
        self.by_name.get(name).map(|&idx| &self.teams[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(name: &str, code: &str) -> Team {
        Team {
            team: name.to_string(),
            country_code: code.to_string(),
        }
    }

    #[test]
    fn bundled_catalog_loads() {
        let catalog = Catalog::bundled().expect("bundled catalog");
        assert_eq!(catalog.team_by_code("FR").map(|t| t.team.as_str()), Some("France"));
        assert_eq!(catalog.team_by_name("Brazil").map(|t| t.country_code.as_str()), Some("BR"));
        assert!(!catalog.cities.is_empty());
        assert!(!catalog.countries.is_empty());
        assert!(!catalog.tournaments.is_empty());
    }

    #[test]
    fn teams_are_sorted_by_name() {
        let catalog = Catalog::new(
            vec![team("Spain", "ES"), team("albania", "AL"), team("Brazil", "BR")],
            vec![],
            vec![],
            vec![],
        )
        .unwrap();
        let names: Vec<&str> = catalog.teams().iter().map(|t| t.team.as_str()).collect();
        assert_eq!(names, vec!["albania", "Brazil", "Spain"]);
        assert_eq!(catalog.team_by_code("ES").map(|t| t.team.as_str()), Some("Spain"));
    }

    #[test]
    fn duplicate_code_is_rejected() {
        let err = Catalog::new(
            vec![team("England", "GB"), team("Scotland", "GB")],
            vec![],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateCode {
                code: "GB".to_string(),
                first: "England".to_string(),
                second: "Scotland".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = Catalog::new(
            vec![team("Congo", "CG"), team("Congo", "CD")],
            vec![],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateName("Congo".to_string()));
    }

    #[test]
    fn empty_team_list_is_rejected() {
        assert_eq!(
            Catalog::new(vec![], vec![], vec![], vec![]).unwrap_err(),
            CatalogError::NoTeams
        );
    }

    #[test]
    fn lookups_are_exact() {
        let catalog = Catalog::new(vec![team("France", "FR")], vec![], vec![], vec![]).unwrap();
        assert!(catalog.team_by_code("fr").is_none());
        assert!(catalog.team_by_name("france").is_none());
    }

    #[test]
    fn load_dir_reports_missing_file() {
        let dir = std::env::temp_dir().join("predictor-tui-missing-catalog");
        let err = Catalog::load_dir(&dir).unwrap_err();
        assert!(err.to_string().contains("teams.json"));
    }
}
