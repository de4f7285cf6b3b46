//! Spoken announcements.
//!
//! [`Announcer::announce`] blocks until playback has finished: no other
//! game event happens while the result is being read out.

use tracing::info;

use crate::error::AnnounceError;

/// Longest text the TTS endpoint accepts in one request
pub const MAX_CHUNK_CHARS: usize = 100;

pub trait Announcer {
    /// Speak `text` and return once playback is done
    fn announce(&mut self, text: &str) -> Result<(), AnnounceError>;

    /// Get announcer name (for logging)
    fn name(&self) -> &'static str;
}

/// Announcer that only writes the text to the log
#[derive(Debug, Default)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&mut self, text: &str) -> Result<(), AnnounceError> {
        info!("🔊 {}", text);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogAnnouncer"
    }
}

/// Split text into chunks of at most `max_chars` characters on word
/// boundaries. Words longer than the limit are split mid-word.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.push(word.drain(..max_chars).collect());
        }
        if word.is_empty() {
            continue;
        }

        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(feature = "speech")]
pub use google::GoogleTtsAnnouncer;

#[cfg(feature = "speech")]
mod google {
    use std::io::{Cursor, Read};
    use std::time::Duration;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
    use tracing::debug;

    use super::{split_into_chunks, Announcer, MAX_CHUNK_CHARS};
    use crate::config::SpeechConfig;
    use crate::error::AnnounceError;

    const TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    const MAX_AUDIO_BYTES: u64 = 4 * 1024 * 1024;

    /// Synthesizes speech through the Google Translate TTS endpoint and plays
    /// the MP3 audio through `rodio`. Audio is kept in memory only.
    pub struct GoogleTtsAnnouncer {
        _stream: OutputStream,
        stream_handle: OutputStreamHandle,
        agent: ureq::Agent,
        language: String,
    }

    impl GoogleTtsAnnouncer {
        pub fn new(config: &SpeechConfig) -> Result<Self, AnnounceError> {
            let (stream, stream_handle) = OutputStream::try_default()
                .map_err(|e| AnnounceError::OutputUnavailable(Box::new(e)))?;
            let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();

            Ok(Self {
                _stream: stream,
                stream_handle,
                agent,
                language: config.language.clone(),
            })
        }

        /// Fetch MP3 audio for one chunk
        fn synthesize(&self, chunk: &str, idx: usize, total: usize) -> Result<Vec<u8>, AnnounceError> {
            let response = self
                .agent
                .get(TTS_ENDPOINT)
                .query("ie", "UTF-8")
                .query("client", "tw-ob")
                .query("tl", &self.language)
                .query("q", chunk)
                .query("total", &total.to_string())
                .query("idx", &idx.to_string())
                .query("textlen", &chunk.chars().count().to_string())
                .call()
                .map_err(|e| AnnounceError::Synthesis(Box::new(e)))?;

            let mut audio = Vec::new();
            response
                .into_reader()
                .take(MAX_AUDIO_BYTES)
                .read_to_end(&mut audio)
                .map_err(|e| AnnounceError::Synthesis(Box::new(e)))?;
            debug!("Synthesized chunk {}/{} ({} bytes)", idx + 1, total, audio.len());
            Ok(audio)
        }
    }

    impl Announcer for GoogleTtsAnnouncer {
        fn announce(&mut self, text: &str) -> Result<(), AnnounceError> {
            let chunks = split_into_chunks(text, MAX_CHUNK_CHARS);
            let total = chunks.len();

            // Synthesize everything first so a failed request plays nothing
            let audio = chunks
                .iter()
                .enumerate()
                .map(|(idx, chunk)| self.synthesize(chunk, idx, total))
                .collect::<Result<Vec<_>, _>>()?;

            let sink = Sink::try_new(&self.stream_handle)
                .map_err(|e| AnnounceError::Playback(Box::new(e)))?;
            for bytes in audio {
                let decoder = Decoder::new(Cursor::new(bytes))
                    .map_err(|e| AnnounceError::Playback(Box::new(e)))?;
                sink.append(decoder);
            }
            sink.sleep_until_end();
            Ok(())
        }

        fn name(&self) -> &'static str {
            "GoogleTtsAnnouncer"
        }
    }
}
