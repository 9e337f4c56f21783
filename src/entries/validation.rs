//! Entry form validation

use url::Url;

use super::EntryError;

/// Shortest accepted entry text, in characters
pub const MIN_TEXT_CHARS: usize = 5;

/// Raw form input
#[derive(Debug, Clone, Default)]
pub struct EntryForm {
    pub text: String,
    /// Empty string means no song
    pub song_url: Option<String>,
}

impl EntryForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            song_url: None,
        }
    }

    pub fn with_song_url(mut self, url: impl Into<String>) -> Self {
        self.song_url = Some(url.into());
        self
    }

    pub fn validate(&self) -> Result<ValidEntry, EntryError> {
        if self.text.chars().count() < MIN_TEXT_CHARS {
            return Err(EntryError::TextTooShort);
        }

        let song_url = match self.song_url.as_deref() {
            None | Some("") => None,
            Some(raw) => {
                let url =
                    Url::parse(raw).map_err(|_| EntryError::InvalidSongUrl(raw.to_string()))?;
                Some(url)
            }
        };

        Ok(ValidEntry {
            text: self.text.clone(),
            song_url,
        })
    }
}

/// Form input that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEntry {
    pub text: String,
    pub song_url: Option<Url>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_length() {
        assert!(matches!(
            EntryForm::new("meh").validate(),
            Err(EntryError::TextTooShort)
        ));
        assert!(EntryForm::new("sunny").validate().is_ok());
        // Characters, not bytes
        assert!(matches!(
            EntryForm::new("ééé").validate(),
            Err(EntryError::TextTooShort)
        ));
    }

    #[test]
    fn test_empty_song_url_is_absent() {
        let entry = EntryForm::new("A quiet day")
            .with_song_url("")
            .validate()
            .unwrap();
        assert!(entry.song_url.is_none());
    }

    #[test]
    fn test_song_url_must_be_absolute() {
        let err = EntryForm::new("A quiet day")
            .with_song_url("not a url")
            .validate()
            .unwrap_err();
        assert!(matches!(err, EntryError::InvalidSongUrl(_)));

        let entry = EntryForm::new("A quiet day")
            .with_song_url("https://open.spotify.com/track/abc")
            .validate()
            .unwrap();
        assert_eq!(
            entry.song_url.map(|u| u.host_str().map(str::to_string)),
            Some(Some("open.spotify.com".to_string()))
        );
    }
}
