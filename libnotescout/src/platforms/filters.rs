//! Post search filters
//!
//! Each filter travels to the gateway as its numeric code. The string forms
//! accepted by `FromStr` are what the CLI exposes; numeric codes are
//! accepted too.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    General,
    Latest,
    MostLiked,
    MostCommented,
    MostCollected,
}

impl SortOrder {
    pub fn code(&self) -> u8 {
        match self {
            Self::General => 0,
            Self::Latest => 1,
            Self::MostLiked => 2,
            Self::MostCommented => 3,
            Self::MostCollected => 4,
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "general" | "0" => Ok(Self::General),
            "latest" | "1" => Ok(Self::Latest),
            "most_liked" | "2" => Ok(Self::MostLiked),
            "most_commented" | "3" => Ok(Self::MostCommented),
            "most_collected" | "4" => Ok(Self::MostCollected),
            _ => Err(format!(
                "Invalid sort order: '{}'. Valid options: general, latest, most-liked, most-commented, most-collected",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    #[default]
    Any,
    Video,
    Normal,
}

impl NoteType {
    pub fn code(&self) -> u8 {
        match self {
            Self::Any => 0,
            Self::Video => 1,
            Self::Normal => 2,
        }
    }
}

impl FromStr for NoteType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" | "0" => Ok(Self::Any),
            "video" | "1" => Ok(Self::Video),
            "normal" | "image" | "2" => Ok(Self::Normal),
            _ => Err(format!(
                "Invalid note type: '{}'. Valid options: any, video, normal",
                s
            )),
        }
    }
}

/// How recent a post must be
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteTime {
    #[default]
    Any,
    Day,
    Week,
    HalfYear,
}

impl NoteTime {
    pub fn code(&self) -> u8 {
        match self {
            Self::Any => 0,
            Self::Day => 1,
            Self::Week => 2,
            Self::HalfYear => 3,
        }
    }
}

impl FromStr for NoteTime {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "any" | "0" => Ok(Self::Any),
            "day" | "1" => Ok(Self::Day),
            "week" | "2" => Ok(Self::Week),
            "half_year" | "3" => Ok(Self::HalfYear),
            _ => Err(format!(
                "Invalid note time: '{}'. Valid options: any, day, week, half-year",
                s
            )),
        }
    }
}

/// Relationship between the viewer and the post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteRange {
    #[default]
    Any,
    Seen,
    Unseen,
    Following,
}

impl NoteRange {
    pub fn code(&self) -> u8 {
        match self {
            Self::Any => 0,
            Self::Seen => 1,
            Self::Unseen => 2,
            Self::Following => 3,
        }
    }
}

impl FromStr for NoteRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" | "0" => Ok(Self::Any),
            "seen" | "1" => Ok(Self::Seen),
            "unseen" | "2" => Ok(Self::Unseen),
            "following" | "3" => Ok(Self::Following),
            _ => Err(format!(
                "Invalid note range: '{}'. Valid options: any, seen, unseen, following",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    #[default]
    Any,
    SameCity,
    Nearby,
}

impl Distance {
    pub fn code(&self) -> u8 {
        match self {
            Self::Any => 0,
            Self::SameCity => 1,
            Self::Nearby => 2,
        }
    }
}

impl FromStr for Distance {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "any" | "0" => Ok(Self::Any),
            "same_city" | "1" => Ok(Self::SameCity),
            "nearby" | "2" => Ok(Self::Nearby),
            _ => Err(format!(
                "Invalid distance: '{}'. Valid options: any, same-city, nearby",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl FromStr for GeoPoint {
    type Err = String;

    /// `"lat,lon"`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || format!("Invalid geo point: '{}'. Expected LAT,LON", s);
        let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let longitude: f64 = lon.trim().parse().map_err(|_| invalid())?;

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid());
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Filters applied to a post keyword search
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub sort: SortOrder,
    pub note_type: NoteType,
    pub note_time: NoteTime,
    pub note_range: NoteRange,
    pub distance: Distance,
    pub geo: Option<GeoPoint>,
}

impl FilterSet {
    /// A distance filter is meaningless without a location
    pub fn validate(&self) -> Result<()> {
        if self.distance != Distance::Any && self.geo.is_none() {
            return Err(ScoutError::InvalidInput(
                "distance filter requires a geo point".to_string(),
            ));
        }
        Ok(())
    }

    /// Query parameters in gateway wire form
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("sort", self.sort.code().to_string()),
            ("note_type", self.note_type.code().to_string()),
            ("note_time", self.note_time.code().to_string()),
            ("note_range", self.note_range.code().to_string()),
            ("pos_distance", self.distance.code().to_string()),
        ];
        if let Some(geo) = self.geo {
            pairs.push(("geo", format!("{},{}", geo.latitude, geo.longitude)));
        }
        pairs
    }
}
