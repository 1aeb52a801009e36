//! Wire-shaped response types for the upstream GraphQL API.
//!
//! These mirror the query shapes in [`crate::query`] field-for-field;
//! [`crate::normalize`] turns them into `bracket_core::domain` values.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GraphQlEnvelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TournamentQueryData {
    pub tournament: Option<RawTournament>,
}

#[derive(Debug, Deserialize)]
pub struct RawTournament {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub url: Option<String>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
pub struct RawEvent {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub participants: Option<RawParticipantConnection>,
}

#[derive(Debug, Deserialize)]
pub struct RawParticipantConnection {
    #[serde(default)]
    pub nodes: Vec<RawParticipant>,
}

#[derive(Debug, Deserialize)]
pub struct RawParticipant {
    pub id: Option<String>,
    pub player: Option<RawPlayer>,
}

#[derive(Debug, Deserialize)]
pub struct RawPlayer {
    pub id: Option<String>,
    #[serde(rename = "gamerTag")]
    pub gamer_tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhaseGroupsQueryData {
    pub event: Option<RawEventPhaseGroups>,
}

#[derive(Debug, Deserialize)]
pub struct RawEventPhaseGroups {
    #[serde(rename = "phaseGroups", default)]
    pub phase_groups: Vec<RawPhaseGroup>,
}

#[derive(Debug, Deserialize)]
pub struct RawPhaseGroup {
    pub id: String,
    #[serde(rename = "displayIdentifier")]
    pub display_identifier: String,
    pub phase: Option<RawPhase>,
}

#[derive(Debug, Deserialize)]
pub struct RawPhase {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetsPageQueryData {
    #[serde(rename = "phaseGroup")]
    pub phase_group: Option<RawPhaseGroupSets>,
}

#[derive(Debug, Deserialize)]
pub struct RawPhaseGroupSets {
    pub sets: Option<RawSetConnection>,
}

#[derive(Debug, Deserialize)]
pub struct RawSetConnection {
    #[serde(default)]
    pub nodes: Vec<RawSet>,
}

#[derive(Debug, Deserialize)]
pub struct RawSet {
    pub id: String,
    pub round: Option<i64>,
    #[serde(rename = "fullRoundText")]
    pub full_round_text: Option<String>,
    pub state: Option<i64>,
    #[serde(rename = "startedAt")]
    pub started_at: Option<i64>,
    #[serde(rename = "completedAt")]
    pub completed_at: Option<i64>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<i64>,
    #[serde(rename = "winnerId")]
    pub winner_id: Option<String>,
    #[serde(default)]
    pub slots: Vec<RawSlot>,
}

#[derive(Debug, Deserialize)]
pub struct RawSlot {
    pub entrant: Option<RawEntrant>,
    pub standing: Option<RawStanding>,
}

#[derive(Debug, Deserialize)]
pub struct RawEntrant {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub participants: Vec<RawEntrantParticipant>,
}

#[derive(Debug, Deserialize)]
pub struct RawEntrantParticipant {
    pub id: Option<String>,
    #[serde(rename = "gamerTag")]
    pub gamer_tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawStanding {
    pub stats: Option<RawStats>,
}

#[derive(Debug, Deserialize)]
pub struct RawStats {
    pub score: Option<RawScoreValue>,
}

#[derive(Debug, Deserialize)]
pub struct RawScoreValue {
    pub value: Option<f64>,
}
