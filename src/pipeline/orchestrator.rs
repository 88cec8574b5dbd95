//! Pipeline orchestrator: job state machine and stage sequencing.

use crate::acquire::{Acquired, Acquirer, ChainAcquirer, SourceLocator};
use crate::audio::{AudioTrack, PlacedClip, assemble_speech_track, mix_tracks};
use crate::config::Config;
use crate::defaults::{
    BACKGROUND_WEIGHT, PROGRESS_ACQUIRE, PROGRESS_ACQUIRE_DONE, PROGRESS_COMPLETE, PROGRESS_MIX,
    PROGRESS_MIX_DONE, PROGRESS_SEPARATE, PROGRESS_SEPARATE_DONE, PROGRESS_SYNTHESIZE,
    PROGRESS_SYNTHESIZE_DONE, PROGRESS_TRANSCRIBE, PROGRESS_TRANSCRIBE_DONE, PROGRESS_TRANSLATE,
    PROGRESS_TRANSLATE_SPAN, SPEECH_WEIGHT,
};
use crate::error::{DubError, ErrorReporter, LogReporter, Result};
use crate::job::{JobStatus, JobStore, JobUpdate, new_job_id};
use crate::mux::{FfmpegMuxer, Muxer};
use crate::segment::TimedSegment;
use crate::separate::{CommandSeparator, Separator, Stems};
use crate::synth::{CommandSynthesizer, Synthesizer};
use crate::transcribe::{CommandTranscriber, Transcriber};
use crate::translate::{HttpTranslator, Translator};
use crate::voices::{language_code, language_voice};
use crate::workspace::JobWorkspace;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The external collaborators a pipeline run calls into, behind trait
/// objects so tests can substitute every one of them.
#[derive(Clone)]
pub struct Collaborators {
    pub acquirer: Arc<dyn Acquirer>,
    pub separator: Arc<dyn Separator>,
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub muxer: Arc<dyn Muxer>,
}

impl Collaborators {
    /// Builds the production adapter set from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            acquirer: Arc::new(ChainAcquirer::new(config.acquire.clone(), &config.tools)),
            separator: Arc::new(CommandSeparator::new(
                config.separate.clone(),
                &config.tools,
            )),
            transcriber: Arc::new(CommandTranscriber::new(config.transcribe.clone())),
            translator: Arc::new(HttpTranslator::new(&config.translate)),
            synthesizer: Arc::new(CommandSynthesizer::new(config.tts.clone(), &config.tools)),
            muxer: Arc::new(FfmpegMuxer::new(&config.tools)),
        }
    }
}

/// Progress value while translating segment `done` of `total`.
fn translate_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return PROGRESS_TRANSLATE;
    }
    PROGRESS_TRANSLATE + (PROGRESS_TRANSLATE_SPAN as usize * done / total) as u8
}

/// Sequences the six pipeline stages and drives job state.
///
/// One orchestrator serves every job; each submission spawns an
/// independent run. There is deliberately no bound on concurrent runs and
/// no cancellation — cleanup removes a job's record and storage but does
/// not stop an in-flight stage.
#[derive(Clone)]
pub struct Orchestrator {
    store: JobStore,
    collaborators: Collaborators,
    reporter: Arc<dyn ErrorReporter>,
    jobs_root: Option<PathBuf>,
}

impl Orchestrator {
    pub fn new(store: JobStore, collaborators: Collaborators) -> Self {
        Self {
            store,
            collaborators,
            reporter: Arc::new(LogReporter),
            jobs_root: None,
        }
    }

    /// Builds an orchestrator with the production adapter set.
    pub fn from_config(store: JobStore, config: &Config) -> Self {
        Self::new(store, Collaborators::from_config(config))
    }

    /// Sets a custom reporter for recoverable per-segment errors.
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Overrides where job workspaces are created (tests).
    pub fn with_jobs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.jobs_root = Some(root.into());
        self
    }

    /// The job registry this orchestrator writes to.
    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Registers a new job and spawns its pipeline run.
    ///
    /// Returns the job id immediately; progress is observable through the
    /// store from this point on.
    pub fn submit(&self, source: SourceLocator, language: &str) -> String {
        let job_id = new_job_id();
        self.store.create(&job_id);

        let this = self.clone();
        let id = job_id.clone();
        let language = language.to_string();
        tokio::spawn(async move {
            this.run(&id, source, &language).await;
        });

        job_id
    }

    /// Executes the full pipeline for one job, converting any stage error
    /// into a failed status. This is the single catch point: stages
    /// themselves only return tagged results.
    pub async fn run(&self, job_id: &str, source: SourceLocator, language: &str) {
        self.store.update(
            job_id,
            JobUpdate::new()
                .status(JobStatus::Processing)
                .step("starting")
                .progress(0)
                .message("Starting pipeline..."),
        );

        match self.run_stages(job_id, source, language).await {
            Ok(output) => {
                self.store.update(
                    job_id,
                    JobUpdate::new()
                        .status(JobStatus::Completed)
                        .progress(PROGRESS_COMPLETE)
                        .message("Dubbing complete! Your file is ready.")
                        .output_file(output),
                );
            }
            Err(e) => {
                // Operators get the full error; consumers get the message
                // on the record. A failed job never exposes output_file.
                eprintln!("polydub: job {} failed: {}", job_id, e);
                self.store.update(
                    job_id,
                    JobUpdate::new()
                        .status(JobStatus::Failed)
                        .message(format!("Error: {}", e))
                        .error(e.to_string()),
                );
            }
        }
    }

    async fn run_stages(
        &self,
        job_id: &str,
        source: SourceLocator,
        language: &str,
    ) -> Result<PathBuf> {
        let workspace = match &self.jobs_root {
            Some(root) => JobWorkspace::create_in(root, job_id)?,
            None => JobWorkspace::create(job_id)?,
        };

        let acquired = self.acquire_stage(job_id, &source, &workspace).await?;
        let stems = self
            .separate_stage(job_id, &acquired.audio, &workspace)
            .await?;
        let segments = self
            .transcribe_stage(job_id, &stems.vocals, &workspace)
            .await?;
        let segments = self.translate_stage(job_id, segments, language).await;
        let speech = self
            .synthesize_stage(job_id, &segments, language, &workspace)
            .await?;
        self.mix_stage(job_id, &acquired.video, &stems.background, &speech, &workspace)
            .await
    }

    async fn acquire_stage(
        &self,
        job_id: &str,
        source: &SourceLocator,
        workspace: &JobWorkspace,
    ) -> Result<Acquired> {
        self.store.update(
            job_id,
            JobUpdate::new()
                .step("downloading")
                .progress(PROGRESS_ACQUIRE)
                .message("Downloading video..."),
        );

        let acquired = self
            .collaborators
            .acquirer
            .acquire(source, workspace)
            .await?;

        self.store.update(
            job_id,
            JobUpdate::new()
                .progress(PROGRESS_ACQUIRE_DONE)
                .message("Download complete"),
        );
        Ok(acquired)
    }

    async fn separate_stage(
        &self,
        job_id: &str,
        audio: &Path,
        workspace: &JobWorkspace,
    ) -> Result<Stems> {
        self.store.update(
            job_id,
            JobUpdate::new()
                .step("separating")
                .progress(PROGRESS_SEPARATE)
                .message("Separating vocals from background audio..."),
        );

        let stems = self
            .collaborators
            .separator
            .separate(audio, workspace)
            .await?;

        self.store.update(
            job_id,
            JobUpdate::new()
                .progress(PROGRESS_SEPARATE_DONE)
                .message("Audio separation complete"),
        );
        Ok(stems)
    }

    async fn transcribe_stage(
        &self,
        job_id: &str,
        vocals: &Path,
        workspace: &JobWorkspace,
    ) -> Result<Vec<TimedSegment>> {
        self.store.update(
            job_id,
            JobUpdate::new()
                .step("transcribing")
                .progress(PROGRESS_TRANSCRIBE)
                .message("Transcribing speech..."),
        );

        let segments = self
            .collaborators
            .transcriber
            .transcribe(vocals, workspace)
            .await?;

        self.store.update(
            job_id,
            JobUpdate::new()
                .progress(PROGRESS_TRANSCRIBE_DONE)
                .message(format!("Transcribed {} segments", segments.len())),
        );
        Ok(segments)
    }

    /// Translates segments one by one. Never fails: a segment whose
    /// translation errors falls back to its original text, and the skip is
    /// reported rather than propagated.
    async fn translate_stage(
        &self,
        job_id: &str,
        mut segments: Vec<TimedSegment>,
        language: &str,
    ) -> Vec<TimedSegment> {
        self.store.update(
            job_id,
            JobUpdate::new()
                .step("translating")
                .progress(PROGRESS_TRANSLATE)
                .message("Translating text..."),
        );

        let code = language_code(language);
        let total = segments.len();

        for (i, segment) in segments.iter_mut().enumerate() {
            if !segment.text.is_empty() {
                match self
                    .collaborators
                    .translator
                    .translate(&segment.text, code)
                    .await
                {
                    Ok(translated) => segment.translated = translated,
                    Err(e) => {
                        self.reporter.report("translate", &e);
                        segment.translated = segment.text.clone();
                    }
                }
            }

            self.store.update(
                job_id,
                JobUpdate::new()
                    .progress(translate_progress(i + 1, total))
                    .message(format!("Translated {}/{} segments", i + 1, total)),
            );
        }

        segments
    }

    /// Synthesizes one clip per speakable segment, then rebuilds the
    /// full-length speech track anchored at the original timestamps.
    async fn synthesize_stage(
        &self,
        job_id: &str,
        segments: &[TimedSegment],
        language: &str,
        workspace: &JobWorkspace,
    ) -> Result<PathBuf> {
        self.store.update(
            job_id,
            JobUpdate::new()
                .step("synthesizing")
                .progress(PROGRESS_SYNTHESIZE)
                .message("Generating dubbed audio..."),
        );

        let voice = language_voice(language);
        let tts_dir = workspace.tts_dir()?;

        let mut clips = Vec::new();
        for (i, segment) in segments.iter().enumerate() {
            if segment.is_silent() {
                continue;
            }

            let clip_path = tts_dir.join(format!("seg_{:04}.wav", i));
            match self
                .collaborators
                .synthesizer
                .synthesize(segment.spoken_text(), voice, &clip_path)
                .await
            {
                Ok(()) => clips.push(PlacedClip {
                    source: clip_path,
                    start: segment.start,
                    end: segment.end,
                }),
                Err(e) => self.reporter.report("synthesize", &e),
            }
        }

        if clips.is_empty() {
            return Err(DubError::Synthesis {
                message: "no synthesized clips produced".to_string(),
            });
        }

        // Sample math is CPU-bound with no suspension point; it runs on a
        // blocking worker so progress queries stay live.
        let combined = workspace.path("tts_combined.wav");
        let out = combined.clone();
        let reporter = Arc::clone(&self.reporter);
        tokio::task::spawn_blocking(move || -> Result<()> {
            let track = assemble_speech_track(&clips, reporter.as_ref())?;
            track.to_wav(&out)
        })
        .await
        .map_err(|e| DubError::Other(format!("assembly task failed: {}", e)))??;

        self.store.update(
            job_id,
            JobUpdate::new()
                .progress(PROGRESS_SYNTHESIZE_DONE)
                .message("TTS synthesis complete"),
        );
        Ok(combined)
    }

    async fn mix_stage(
        &self,
        job_id: &str,
        video: &Path,
        background: &Path,
        speech: &Path,
        workspace: &JobWorkspace,
    ) -> Result<PathBuf> {
        self.store.update(
            job_id,
            JobUpdate::new()
                .step("mixing")
                .progress(PROGRESS_MIX)
                .message("Mixing final audio and video..."),
        );

        let mixed = workspace.path("mixed_audio.wav");
        let bg_path = background.to_path_buf();
        let speech_path = speech.to_path_buf();
        let mixed_out = mixed.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let background = AudioTrack::from_wav(&bg_path)?;
            let speech = AudioTrack::from_wav(&speech_path)?;
            let mixed = mix_tracks(&background, &speech, BACKGROUND_WEIGHT, SPEECH_WEIGHT)?;
            mixed.to_wav(&mixed_out)
        })
        .await
        .map_err(|e| DubError::Other(format!("mixing task failed: {}", e)))??;

        let output = workspace.path("dubbed_output.mp4");
        let output = self
            .collaborators
            .muxer
            .mux(video, &mixed, &output)
            .await?;

        self.store.update(
            job_id,
            JobUpdate::new()
                .progress(PROGRESS_MIX_DONE)
                .message("Final video rendered"),
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_progress_spans_60_to_75() {
        assert_eq!(translate_progress(0, 4), 60);
        assert_eq!(translate_progress(1, 4), 63);
        assert_eq!(translate_progress(2, 4), 67);
        assert_eq!(translate_progress(4, 4), 75);
    }

    #[test]
    fn test_translate_progress_zero_total() {
        assert_eq!(translate_progress(0, 0), 60);
    }

    #[test]
    fn test_translate_progress_is_monotone() {
        let total = 7;
        let mut prev = 0;
        for done in 0..=total {
            let p = translate_progress(done, total);
            assert!(p >= prev);
            prev = p;
        }
    }
}
