//! Movie Entity

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use kernel::id::{Id, MovieId};
use kernel::pagination::{read_csv, read_string};
use kernel::validation::{Validate, Validator, unique};
use serde::{Deserialize, Serialize};

use crate::domain::resource::{Resource, check_name};
use crate::domain::runtime::Runtime;

pub const MIN_YEAR: i32 = 1888;
pub const MAX_GENRES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub id: MovieId,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
    pub version: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub runtime: Runtime,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

/// `?title=` full-text, `?genres=a,b` containment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    pub title: Option<String>,
    pub genres: Vec<String>,
}

impl Validate for Movie {
    fn validate(&self, v: &mut Validator) {
        check_name(v, "title", &self.title);

        v.check(self.year != 0, "year", "must be provided");
        v.check(self.year >= MIN_YEAR, "year", "must be greater than 1888");
        v.check(self.year <= Utc::now().year(), "year", "must not be in the future");

        v.check(self.runtime.minutes() != 0, "runtime", "must be provided");
        v.check(self.runtime.minutes() > 0, "runtime", "must be a positive integer");

        v.check(!self.genres.is_empty(), "genres", "must contain at least 1 genre");
        v.check(
            self.genres.len() <= MAX_GENRES,
            "genres",
            "must not contain more than 5 genres",
        );
        v.check(unique(&self.genres), "genres", "must not contain duplicate values");
    }
}

impl Resource for Movie {
    type Input = MovieInput;
    type Patch = MoviePatch;

    const SINGULAR: &'static str = "movie";
    const PLURAL: &'static str = "movies";
    const PATH: &'static str = "/movies";

    fn create(input: MovieInput) -> Self {
        Self {
            id: Id::from_db(0),
            created_at: Utc::now(),
            title: input.title,
            year: input.year,
            runtime: input.runtime,
            genres: input.genres,
            version: 0,
        }
    }

    fn apply(&mut self, patch: MoviePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(runtime) = patch.runtime {
            self.runtime = runtime;
        }
        if let Some(genres) = patch.genres {
            self.genres = genres;
        }
    }

    fn parse_filter(query: &HashMap<String, String>, _v: &mut Validator) -> MovieFilter {
        MovieFilter {
            title: read_string(query, "title"),
            genres: read_csv(query, "genres"),
        }
    }
}
