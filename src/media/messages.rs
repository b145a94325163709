use serde::{Deserialize, Serialize};

/// Response of `GET /gopro/media/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaListing {
    /// Listing id, changes whenever media is added or removed
    #[serde(default)]
    pub id: Option<String>,
    pub media: Vec<MediaDirectory>,
}

/// One DCIM sub-directory, e.g. "100GOPRO"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDirectory {
    #[serde(rename = "d")]
    pub directory: String,
    #[serde(rename = "fs", default)]
    pub files: Vec<MediaFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    #[serde(rename = "n")]
    pub name: String,
    /// Size in bytes, sent as a string
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Creation time, unix seconds as a string
    #[serde(rename = "cre", default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

/// A file on the camera and the directory holding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub directory: String,
    pub file_name: String,
}

impl MediaListing {
    /// Every file, directory by directory, in device order
    pub fn entries(&self) -> Vec<MediaEntry> {
        self.media
            .iter()
            .flat_map(|dir| {
                dir.files.iter().map(move |file| MediaEntry {
                    directory: dir.directory.clone(),
                    file_name: file.name.clone(),
                })
            })
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.media.iter().map(|dir| dir.files.len()).sum()
    }
}
