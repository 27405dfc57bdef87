use tracing::{debug, info, warn};

use crate::config::{DEFAULT_IMAGE_MODEL, DEFAULT_IMAGE_QUALITY};
use crate::errors::CliError;
use crate::imaging::{DISPLAY_SIZE, GENERATION_SIZE, GeneratedImage, decode_for_display};
use crate::prompts::{Segment, segment_prompt};
use crate::script::Script;
use crate::services::{ImageGenerator, ImageRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Ordered images plus the index currently presented. The cursor is only
/// meaningful while the sequence is non-empty.
#[derive(Debug, Clone, Default)]
pub struct ImageSequence {
    images: Vec<GeneratedImage>,
    cursor: usize,
}

impl ImageSequence {
    pub fn new(images: Vec<GeneratedImage>) -> Self {
        Self { images, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[GeneratedImage] {
        &self.images
    }

    pub fn cursor(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.cursor)
        }
    }

    pub fn current(&self) -> Option<&GeneratedImage> {
        self.images.get(self.cursor)
    }

    /// Step the cursor one place, clamped to the ends.
    pub fn navigate(&mut self, direction: Direction) -> Option<&GeneratedImage> {
        let last = self.images.len().checked_sub(1)?;
        self.cursor = match direction {
            Direction::Previous => self.cursor.saturating_sub(1),
            Direction::Next => (self.cursor + 1).min(last),
        };
        self.images.get(self.cursor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSettings {
    pub model: String,
    pub quality: String,
    pub generation_size: u32,
    pub display_size: u32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_IMAGE_MODEL.to_string(),
            quality: DEFAULT_IMAGE_QUALITY.to_string(),
            generation_size: GENERATION_SIZE,
            display_size: DISPLAY_SIZE,
        }
    }
}

/// Generate, fetch and scale one image per segment, strictly in order.
/// The first failure stops the run and nothing fetched so far is returned.
pub async fn generate_sequence<G: ImageGenerator>(
    generator: &G,
    settings: &ImageSettings,
    script: &Script,
) -> Result<ImageSequence, CliError> {
    if script.is_blank() {
        info!("no script text; skipping image generation");
        return Err(CliError::EmptyInput);
    }

    let mut images = Vec::with_capacity(Segment::ALL.len());
    for (idx, segment) in Segment::ALL.into_iter().enumerate() {
        let prompt = segment_prompt(segment, script);
        debug!(%segment, image = idx + 1, prompt_chars = prompt.chars().count(), %prompt, "image prompt");

        let request = ImageRequest {
            model: settings.model.clone(),
            prompt,
            size: settings.generation_size,
            quality: settings.quality.clone(),
        };
        let url = generator.generate(request).await.inspect_err(|err| {
            warn!(%segment, error = %err, "image generation failed");
        })?;
        info!(%segment, %url, "image generated");

        let bytes = generator.fetch(url.clone()).await.inspect_err(|err| {
            warn!(%segment, error = %err, "image fetch failed");
        })?;
        let bitmap = decode_for_display(&bytes, settings.display_size)?;
        images.push(GeneratedImage {
            segment,
            source_url: url,
            bitmap,
        });
    }

    info!(count = images.len(), "all images downloaded and resized");
    Ok(ImageSequence::new(images))
}

/// Owns the image sequence currently on display and the service that fills it.
#[derive(Debug)]
pub struct VisualSequence<G> {
    generator: G,
    settings: ImageSettings,
    sequence: ImageSequence,
}

impl<G: ImageGenerator> VisualSequence<G> {
    pub fn new(generator: G, settings: ImageSettings) -> Self {
        Self {
            generator,
            settings,
            sequence: ImageSequence::default(),
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn settings(&self) -> &ImageSettings {
        &self.settings
    }

    pub fn sequence(&self) -> &ImageSequence {
        &self.sequence
    }

    pub fn current(&self) -> Option<&GeneratedImage> {
        self.sequence.current()
    }

    /// Drop the held images, e.g. when a request is handed to a worker task.
    pub fn clear(&mut self) {
        self.sequence = ImageSequence::default();
    }

    /// Install the outcome of a request made elsewhere. Failures leave the
    /// sequence empty.
    pub fn install(
        &mut self,
        outcome: Result<ImageSequence, CliError>,
    ) -> Result<&ImageSequence, CliError> {
        match outcome {
            Ok(sequence) => {
                self.sequence = sequence;
                Ok(&self.sequence)
            }
            Err(err) => {
                self.clear();
                Err(err)
            }
        }
    }

    /// Replace the held sequence with a fresh one for `script`.
    pub async fn request_images(&mut self, script: &Script) -> Result<&ImageSequence, CliError> {
        self.clear();
        let outcome = generate_sequence(&self.generator, &self.settings, script).await;
        self.install(outcome)
    }

    pub fn navigate(&mut self, direction: Direction) -> Option<&GeneratedImage> {
        self.sequence.navigate(direction)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::imaging::encoded_png;

    const TEST_DISPLAY: u32 = 8;

    #[derive(Default)]
    struct FakeImages {
        prompts: Mutex<Vec<String>>,
        fetches: Mutex<Vec<String>>,
        fail_generate_at: Option<usize>,
        fail_fetch_at: Option<usize>,
    }

    impl ImageGenerator for FakeImages {
        async fn generate(&self, request: ImageRequest) -> Result<String, CliError> {
            let mut prompts = self.prompts.lock().unwrap();
            let idx = prompts.len();
            prompts.push(request.prompt);
            if self.fail_generate_at == Some(idx) {
                return Err(CliError::Server("content policy".to_string()));
            }
            Ok(format!("https://img.test/{idx}.png"))
        }

        async fn fetch(&self, reference: String) -> Result<Vec<u8>, CliError> {
            let mut fetches = self.fetches.lock().unwrap();
            let idx = fetches.len();
            fetches.push(reference);
            if self.fail_fetch_at == Some(idx) {
                return Err(CliError::Fetch("link expired".to_string()));
            }
            Ok(encoded_png(16, [idx as u8 * 40, 10, 10, 255]))
        }
    }

    fn settings() -> ImageSettings {
        ImageSettings {
            display_size: TEST_DISPLAY,
            ..ImageSettings::default()
        }
    }

    fn visuals(fake: FakeImages) -> VisualSequence<FakeImages> {
        VisualSequence::new(fake, settings())
    }

    fn loaded(count: usize) -> ImageSequence {
        let images = (0..count)
            .map(|i| GeneratedImage {
                segment: Segment::ALL[i % 3],
                source_url: format!("https://img.test/{i}.png"),
                bitmap: image::RgbaImage::new(1, 1),
            })
            .collect();
        ImageSequence::new(images)
    }

    #[tokio::test]
    async fn success_yields_three_images_in_segment_order() {
        let mut visuals = visuals(FakeImages::default());
        let seq = visuals
            .request_images(&Script::new("A heist goes wrong."))
            .await
            .unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.cursor(), Some(0));
        let segments: Vec<_> = seq.images().iter().map(|i| i.segment).collect();
        assert_eq!(segments, Segment::ALL.to_vec());
        for image in seq.images() {
            assert_eq!((image.width(), image.height()), (TEST_DISPLAY, TEST_DISPLAY));
        }
        assert_eq!(
            *visuals.generator().fetches.lock().unwrap(),
            vec![
                "https://img.test/0.png".to_string(),
                "https://img.test/1.png".to_string(),
                "https://img.test/2.png".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn three_images_regardless_of_script_length() {
        for text in ["x".to_string(), "long scene. ".repeat(400)] {
            let mut visuals = visuals(FakeImages::default());
            let seq = visuals.request_images(&Script::new(&text)).await.unwrap();
            assert_eq!(seq.len(), 3);
        }
    }

    #[tokio::test]
    async fn long_scripts_are_truncated_in_every_prompt() {
        let head = "h".repeat(500);
        let text = format!("{head}TAIL-SHOULD-NOT-APPEAR");
        let mut visuals = visuals(FakeImages::default());
        visuals.request_images(&Script::new(&text)).await.unwrap();

        let prompts = visuals.generator().prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        for prompt in prompts.iter() {
            assert!(prompt.contains(&format!("{head}...")));
            assert!(!prompt.contains("TAIL"));
        }
    }

    #[tokio::test]
    async fn blank_script_makes_no_calls_and_leaves_nothing() {
        let mut visuals = visuals(FakeImages::default());
        let err = visuals.request_images(&Script::new("  ")).await.unwrap_err();
        assert!(matches!(err, CliError::EmptyInput));
        assert!(visuals.sequence().is_empty());
        assert!(visuals.generator().prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_generation_failure_leaves_sequence_empty() {
        let mut visuals = visuals(FakeImages {
            fail_generate_at: Some(1),
            ..FakeImages::default()
        });
        let err = visuals
            .request_images(&Script::new("Storm at sea."))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Server(_)));
        assert!(visuals.sequence().is_empty());
        assert_eq!(visuals.generator().prompts.lock().unwrap().len(), 2);
        assert_eq!(visuals.generator().fetches.lock().unwrap().len(), 1);
        assert!(visuals.navigate(Direction::Next).is_none());
        assert!(visuals.navigate(Direction::Previous).is_none());
    }

    #[tokio::test]
    async fn fetch_failure_aborts_remaining_requests() {
        let mut visuals = visuals(FakeImages {
            fail_fetch_at: Some(0),
            ..FakeImages::default()
        });
        let err = visuals
            .request_images(&Script::new("Storm at sea."))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Fetch(_)));
        assert!(visuals.sequence().is_empty());
        assert_eq!(visuals.generator().prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_request_discards_previous_sequence() {
        let mut visuals = visuals(FakeImages {
            fail_generate_at: Some(3),
            ..FakeImages::default()
        });
        visuals.request_images(&Script::new("first")).await.unwrap();
        assert_eq!(visuals.sequence().len(), 3);
        assert!(visuals.request_images(&Script::new("second")).await.is_err());
        assert!(visuals.sequence().is_empty());
    }

    #[tokio::test]
    async fn new_sequence_resets_cursor() {
        let mut visuals = visuals(FakeImages::default());
        visuals.request_images(&Script::new("one")).await.unwrap();
        visuals.navigate(Direction::Next);
        visuals.navigate(Direction::Next);
        assert_eq!(visuals.sequence().cursor(), Some(2));

        let seq = visuals.request_images(&Script::new("two")).await.unwrap();
        assert_eq!(seq.cursor(), Some(0));
    }

    #[test]
    fn next_clamps_at_last_image() {
        let mut seq = loaded(3);
        let mut seen = Vec::new();
        for _ in 0..3 {
            seq.navigate(Direction::Next).expect("image");
            seen.push(seq.cursor().unwrap());
        }
        assert_eq!(seen, vec![1, 2, 2]);
        assert_eq!(
            seq.current().map(|i| i.source_url.as_str()),
            Some("https://img.test/2.png")
        );
    }

    #[test]
    fn previous_clamps_at_first_image() {
        let mut seq = loaded(3);
        seq.navigate(Direction::Next);
        seq.navigate(Direction::Next);
        let mut seen = Vec::new();
        for _ in 0..3 {
            seq.navigate(Direction::Previous).expect("image");
            seen.push(seq.cursor().unwrap());
        }
        assert_eq!(seen, vec![1, 0, 0]);
    }

    #[test]
    fn empty_sequence_navigates_to_nothing() {
        let mut seq = ImageSequence::default();
        assert!(seq.navigate(Direction::Previous).is_none());
        assert!(seq.navigate(Direction::Next).is_none());
        assert_eq!(seq.cursor(), None);
        assert!(seq.current().is_none());
    }

    #[test]
    fn single_image_stays_put() {
        let mut seq = loaded(1);
        assert!(seq.navigate(Direction::Next).is_some());
        assert!(seq.navigate(Direction::Previous).is_some());
        assert_eq!(seq.cursor(), Some(0));
    }
}
