//! Song records as exchanged with the data API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A song record as returned by the data API.
///
/// `created_at` / `updated_at` are managed by the server. They are read but
/// never written back: every mutation goes through [`SongInput`], which has
/// no timestamp fields. `description` and `owner` are nullable in the schema
/// and a `null` is written back as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Artist name.
    #[serde(default)]
    pub owner: Option<String>,
    /// Storage key of the audio blob.
    pub file_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub like: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// A null like count is read as zero so a like can still increment it.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Write payload for `createSong` / `updateSong`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongInput {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub file_path: String,
    pub like: i64,
}

/// The text fields of the add-song form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongDraft {
    pub title: String,
    pub owner: String,
    pub description: String,
}

impl Song {
    pub fn owner_name(&self) -> &str {
        self.owner.as_deref().unwrap_or("")
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

impl From<&Song> for SongInput {
    fn from(song: &Song) -> Self {
        Self {
            id: song.id.clone(),
            title: song.title.clone(),
            description: song.description.clone(),
            owner: song.owner.clone(),
            file_path: song.file_path.clone(),
            like: song.like,
        }
    }
}

impl From<SongInput> for Song {
    fn from(input: SongInput) -> Self {
        Self {
            id: input.id,
            title: input.title,
            description: input.description,
            owner: input.owner,
            file_path: input.file_path,
            like: input.like,
            created_at: None,
            updated_at: None,
        }
    }
}

impl SongInput {
    /// A fresh record for a just-uploaded blob. Likes start at zero.
    pub fn new_upload(id: String, draft: &SongDraft, file_path: String) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            description: Some(draft.description.clone()),
            owner: Some(draft.owner.clone()),
            file_path,
            like: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Song {
        serde_json::from_value(json!({
            "id": "a1",
            "title": "Night Drive",
            "description": "synths",
            "owner": "Mira",
            "filePath": "a1.mp3",
            "like": 3,
            "createdAt": "2021-03-01T10:00:00.000Z",
            "updatedAt": "2021-03-02T10:00:00.000Z"
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_server_record() {
        let song = sample();
        assert_eq!(song.file_path, "a1.mp3");
        assert_eq!(song.like, 3);
        assert!(song.created_at.is_some());
        assert!(song.updated_at.is_some());
    }

    #[test]
    fn input_never_carries_timestamps() {
        let value = serde_json::to_value(SongInput::from(&sample())).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("createdAt"));
        assert!(!obj.contains_key("updatedAt"));
        assert_eq!(obj["filePath"], "a1.mp3");
        assert_eq!(obj["like"], 3);
    }

    #[test]
    fn missing_optional_fields_default() {
        let song: Song = serde_json::from_value(json!({
            "id": "b2",
            "title": "Untitled",
            "filePath": "b2.mp3",
            "description": null,
            "like": null
        }))
        .unwrap();
        assert_eq!(song.like, 0);
        assert_eq!(song.owner, None);
        assert_eq!(song.description_text(), "");
    }

    #[test]
    fn null_description_is_echoed_as_null() {
        let song: Song = serde_json::from_value(json!({
            "id": "c3",
            "title": "Demo",
            "filePath": "c3.mp3",
            "description": null,
            "owner": "Mira",
            "like": 2
        }))
        .unwrap();
        let value = serde_json::to_value(SongInput::from(&song)).unwrap();
        assert!(value["description"].is_null());
        assert_eq!(value["owner"], "Mira");
    }

    #[test]
    fn new_upload_starts_with_zero_likes() {
        let draft = SongDraft {
            title: "T".into(),
            owner: "O".into(),
            description: "D".into(),
        };
        let input = SongInput::new_upload("id-1".into(), &draft, "k.mp3".into());
        assert_eq!(input.like, 0);
        assert_eq!(input.title, "T");
        assert_eq!(input.owner.as_deref(), Some("O"));
        assert_eq!(input.description.as_deref(), Some("D"));
        assert_eq!(input.file_path, "k.mp3");
    }
}
