//! Typed metadata records and their mapping from catalog payloads.
//!
//! # Design
//! - A record is built only when every required field of its variant is present;
//!   partial payloads are rejected before anything reaches the cache.
//! - Years are canonical strings so non-numeric catalog values survive.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MetadataError, MetadataResult};

/// Movie record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieInfo {
    /// Catalog identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Release year.
    pub year: String,
    /// Poster reference understood by the catalog.
    pub poster: String,
}

/// Series record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesInfo {
    /// Catalog identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// First-aired year.
    pub year: String,
    /// Poster reference understood by the catalog.
    pub poster: String,
}

/// Episode record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    /// Identifier of the owning series.
    pub id: String,
    /// Episode title.
    pub title: String,
    /// Season number.
    pub season: u32,
    /// Episode number within the season.
    pub episode: u32,
    /// Air year when the catalog provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

/// Any metadata record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetaInfo {
    /// Movie record.
    Movie(MovieInfo),
    /// Series record.
    Series(SeriesInfo),
    /// Episode record.
    Episode(EpisodeInfo),
}

impl MetaInfo {
    /// Catalog identifier of the record.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Movie(info) => &info.id,
            Self::Series(info) => &info.id,
            Self::Episode(info) => &info.id,
        }
    }

    /// Display title of the record.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Movie(info) => &info.title,
            Self::Series(info) => &info.title,
            Self::Episode(info) => &info.title,
        }
    }
}

impl MovieInfo {
    /// Map a catalog payload; `title`, `year`, and `poster` are required.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::IncompletePayload`] naming the first missing field.
    pub fn from_payload(id: &str, payload: &Value) -> MetadataResult<Self> {
        const KIND: &str = "movie";
        Ok(Self {
            id: id.to_string(),
            title: required_text(payload, KIND, id, "title")?,
            year: required_text(payload, KIND, id, "year")?,
            poster: required_text(payload, KIND, id, "poster")?,
        })
    }
}

impl SeriesInfo {
    /// Map a catalog payload; `title`, `year`, and `poster` are required.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::IncompletePayload`] naming the first missing field.
    pub fn from_payload(id: &str, payload: &Value) -> MetadataResult<Self> {
        const KIND: &str = "series";
        Ok(Self {
            id: id.to_string(),
            title: required_text(payload, KIND, id, "title")?,
            year: required_text(payload, KIND, id, "year")?,
            poster: required_text(payload, KIND, id, "poster")?,
        })
    }
}

impl EpisodeInfo {
    /// Map a catalog payload; `title`, `season`, and `episode` are required.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::IncompletePayload`] naming the first missing field.
    pub fn from_payload(id: &str, payload: &Value) -> MetadataResult<Self> {
        const KIND: &str = "episode";
        Ok(Self {
            id: id.to_string(),
            title: required_text(payload, KIND, id, "title")?,
            season: required_number(payload, KIND, id, "season")?,
            episode: required_number(payload, KIND, id, "episode")?,
            year: text(payload.get("year")),
        })
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn required_text(
    payload: &Value,
    kind: &'static str,
    id: &str,
    field: &'static str,
) -> MetadataResult<String> {
    text(payload.get(field)).ok_or_else(|| MetadataError::incomplete(kind, id, field))
}

fn required_number(
    payload: &Value,
    kind: &'static str,
    id: &str,
    field: &'static str,
) -> MetadataResult<u32> {
    let parsed = match payload.get(field) {
        Some(Value::Number(number)) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(text)) => text.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| MetadataError::incomplete(kind, id, field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn movie_payload_maps_and_canonicalises_year() -> MetadataResult<()> {
        let movie = MovieInfo::from_payload(
            "tt1",
            &json!({"id": "tt1", "title": "X", "year": 2020, "poster": "p.jpg"}),
        )?;
        assert_eq!(movie.year, "2020");
        assert_eq!(movie.poster, "p.jpg");

        let textual = MovieInfo::from_payload(
            "tt2",
            &json!({"title": "Y", "year": "1999-2001", "poster": "q.png"}),
        )?;
        assert_eq!(textual.year, "1999-2001");
        Ok(())
    }

    #[test]
    fn partial_payloads_are_rejected() {
        let err = MovieInfo::from_payload("tt1", &json!({"title": "X", "year": 2020}))
            .unwrap_err();
        assert!(matches!(
            err,
            MetadataError::IncompletePayload {
                kind: "movie",
                field: "poster",
                ..
            }
        ));

        let err = SeriesInfo::from_payload(
            "tt3",
            &json!({"title": null, "year": 2001, "poster": "s.jpg"}),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MetadataError::IncompletePayload { field: "title", .. }
        ));
    }

    #[test]
    fn episode_numbers_accept_strings_and_numbers() -> MetadataResult<()> {
        let episode = EpisodeInfo::from_payload(
            "tt3",
            &json!({"title": "Pilot", "season": "01", "episode": 2}),
        )?;
        assert_eq!((episode.season, episode.episode), (1, 2));
        assert_eq!(episode.year, None);

        let err = EpisodeInfo::from_payload("tt3", &json!({"title": "Pilot", "season": -1}))
            .unwrap_err();
        assert!(matches!(
            err,
            MetadataError::IncompletePayload { field: "season", .. }
        ));
        Ok(())
    }

    #[test]
    fn meta_info_is_tagged_by_kind() -> anyhow::Result<()> {
        let info = MetaInfo::Series(SeriesInfo {
            id: "tt3".to_string(),
            title: "Show".to_string(),
            year: "2001".to_string(),
            poster: "s.jpg".to_string(),
        });
        let encoded = serde_json::to_value(&info)?;
        assert_eq!(encoded["kind"], "series");
        assert_eq!(info.id(), "tt3");
        assert_eq!(info.title(), "Show");
        Ok(())
    }
}
