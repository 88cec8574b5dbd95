//! End-to-end pipeline tests with substituted collaborators.
//!
//! Every external collaborator is mocked; the orchestrator, job store,
//! audio assembly and mixing run for real against scratch WAV files.

use async_trait::async_trait;
use polydub::acquire::{Acquired, Acquirer, SourceLocator};
use polydub::audio::AudioTrack;
use polydub::defaults::SAMPLE_RATE;
use polydub::error::{DubError, NullReporter, Result};
use polydub::job::progress::ProgressWatcher;
use polydub::job::{JobStatus, JobStore};
use polydub::mux::Muxer;
use polydub::pipeline::{Collaborators, Orchestrator};
use polydub::segment::TimedSegment;
use polydub::separate::{Separator, Stems};
use polydub::synth::Synthesizer;
use polydub::transcribe::Transcriber;
use polydub::translate::Translator;
use polydub::workspace::JobWorkspace;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

const STAGE_DELAY: Duration = Duration::from_millis(20);

fn tone(duration_secs: f64, value: i16) -> AudioTrack {
    let len = (duration_secs * SAMPLE_RATE as f64).round() as usize;
    AudioTrack::from_samples(vec![value; len], SAMPLE_RATE)
}

struct MockAcquirer;

#[async_trait]
impl Acquirer for MockAcquirer {
    async fn acquire(&self, _source: &SourceLocator, workspace: &JobWorkspace) -> Result<Acquired> {
        tokio::time::sleep(STAGE_DELAY).await;
        let video = workspace.path("source.mp4");
        std::fs::write(&video, b"fake video bytes")?;
        let audio = workspace.path("source_audio.wav");
        tone(6.0, 300).to_wav(&audio)?;
        Ok(Acquired { video, audio })
    }
}

struct MockSeparator {
    fail: bool,
}

#[async_trait]
impl Separator for MockSeparator {
    async fn separate(&self, _audio: &Path, workspace: &JobWorkspace) -> Result<Stems> {
        tokio::time::sleep(STAGE_DELAY).await;
        if self.fail {
            return Err(DubError::Separation {
                message: "no output directory produced".to_string(),
            });
        }
        let vocals = workspace.path("vocals.wav");
        let background = workspace.path("background.wav");
        tone(6.0, 400).to_wav(&vocals)?;
        tone(6.0, 200).to_wav(&background)?;
        Ok(Stems { vocals, background })
    }
}

struct MockTranscriber {
    segments: Vec<TimedSegment>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        _vocals: &Path,
        _workspace: &JobWorkspace,
    ) -> Result<Vec<TimedSegment>> {
        tokio::time::sleep(STAGE_DELAY).await;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.segments.clone())
    }
}

struct MockTranslator {
    fail: bool,
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String> {
        if self.fail {
            return Err(DubError::Translation {
                message: "service unavailable".to_string(),
            });
        }
        Ok(format!("{} [{}]", text, target_code))
    }
}

struct MockSynthesizer {
    fail: bool,
    spoken: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, _voice: &str, out_wav: &Path) -> Result<()> {
        if self.fail {
            return Err(DubError::Synthesis {
                message: "voice engine produced no audio".to_string(),
            });
        }
        self.spoken.lock().expect("lock").push(text.to_string());
        tone(1.0, 500).to_wav(out_wav)
    }
}

struct MockMuxer;

#[async_trait]
impl Muxer for MockMuxer {
    async fn mux(&self, video: &Path, mixed_audio: &Path, output: &Path) -> Result<PathBuf> {
        assert!(video.is_file(), "muxer must receive the acquired video");
        assert!(mixed_audio.is_file(), "muxer must receive the mixed track");
        std::fs::write(output, b"fake dubbed video")?;
        Ok(output.to_path_buf())
    }
}

struct Harness {
    store: JobStore,
    orchestrator: Orchestrator,
    transcriber_calls: Arc<AtomicUsize>,
    spoken: Arc<Mutex<Vec<String>>>,
    _root: TempDir,
}

fn three_segments() -> Vec<TimedSegment> {
    vec![
        TimedSegment::new(0.0, 2.0, "hi"),
        TimedSegment::new(2.0, 5.0, "go now"),
        TimedSegment::new(5.0, 6.0, ""),
    ]
}

fn harness(
    segments: Vec<TimedSegment>,
    separator_fails: bool,
    translator_fails: bool,
    synthesizer_fails: bool,
) -> Harness {
    let root = TempDir::new().expect("tempdir");
    let store = JobStore::new();
    let transcriber_calls = Arc::new(AtomicUsize::new(0));
    let spoken = Arc::new(Mutex::new(Vec::new()));

    let collaborators = Collaborators {
        acquirer: Arc::new(MockAcquirer),
        separator: Arc::new(MockSeparator {
            fail: separator_fails,
        }),
        transcriber: Arc::new(MockTranscriber {
            segments,
            calls: Arc::clone(&transcriber_calls),
        }),
        translator: Arc::new(MockTranslator {
            fail: translator_fails,
        }),
        synthesizer: Arc::new(MockSynthesizer {
            fail: synthesizer_fails,
            spoken: Arc::clone(&spoken),
        }),
        muxer: Arc::new(MockMuxer),
    };

    let orchestrator = Orchestrator::new(store.clone(), collaborators)
        .with_reporter(Arc::new(NullReporter))
        .with_jobs_root(root.path());

    Harness {
        store,
        orchestrator,
        transcriber_calls,
        spoken,
        _root: root,
    }
}

#[tokio::test]
async fn unknown_job_ids_report_not_found() {
    let h = harness(three_segments(), false, false, false);
    assert!(h.store.get("never-submitted").is_none());
}

#[tokio::test]
async fn happy_path_completes_with_output() {
    let h = harness(three_segments(), false, false, false);

    let job_id = h
        .orchestrator
        .submit(SourceLocator::Url("https://example.com/v.mp4".into()), "spanish");

    let final_job = ProgressWatcher::new(h.store.clone(), &job_id)
        .with_poll_interval(Duration::from_millis(5))
        .collect()
        .await
        .pop()
        .expect("at least one snapshot");

    assert_eq!(final_job.status, JobStatus::Completed);
    assert_eq!(final_job.progress, 100);
    let output = final_job.output_file.expect("output file set");
    assert!(output.is_file());
    assert!(final_job.error.is_none());

    // The empty third segment must not reach the synthesizer.
    let spoken = h.spoken.lock().expect("lock").clone();
    assert_eq!(spoken.len(), 2);
    assert!(spoken[0].contains("hi"));
    assert!(spoken[1].contains("go now"));
}

#[tokio::test]
async fn progress_is_monotonic_across_the_run() {
    let h = harness(three_segments(), false, false, false);

    let job_id = h
        .orchestrator
        .submit(SourceLocator::Url("https://example.com/v.mp4".into()), "french");

    let snapshots = ProgressWatcher::new(h.store.clone(), &job_id)
        .with_poll_interval(Duration::from_millis(2))
        .collect()
        .await;

    assert!(snapshots.len() >= 3, "expected several observable updates");
    let mut prev = 0;
    for snap in &snapshots {
        assert!(
            snap.progress >= prev,
            "progress went backwards: {} -> {}",
            prev,
            snap.progress
        );
        prev = snap.progress;
    }
    assert_eq!(prev, 100);
}

#[tokio::test]
async fn translation_failure_falls_back_to_original_text() {
    let h = harness(three_segments(), false, true, false);

    let job_id = h
        .orchestrator
        .submit(SourceLocator::Url("https://example.com/v.mp4".into()), "german");

    let final_job = ProgressWatcher::new(h.store.clone(), &job_id)
        .with_poll_interval(Duration::from_millis(5))
        .collect()
        .await
        .pop()
        .expect("snapshot");

    // Per-segment fallback keeps the job alive.
    assert_eq!(final_job.status, JobStatus::Completed);
    assert!(final_job.output_file.is_some());

    let spoken = h.spoken.lock().expect("lock").clone();
    assert_eq!(spoken, vec!["hi".to_string(), "go now".to_string()]);
}

#[tokio::test]
async fn separation_failure_fails_the_job() {
    let h = harness(three_segments(), true, false, false);

    let job_id = h
        .orchestrator
        .submit(SourceLocator::Url("https://example.com/v.mp4".into()), "spanish");

    let final_job = ProgressWatcher::new(h.store.clone(), &job_id)
        .with_poll_interval(Duration::from_millis(5))
        .collect()
        .await
        .pop()
        .expect("snapshot");

    assert_eq!(final_job.status, JobStatus::Failed);
    let error = final_job.error.expect("error recorded");
    assert!(
        error.to_lowercase().contains("separation"),
        "error should name the failed stage: {}",
        error
    );
    assert!(final_job.output_file.is_none(), "no partial output exposed");

    // Failure at stage 2 must not run stage 3.
    assert_eq!(h.transcriber_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn all_synthesis_failures_fail_the_job() {
    let h = harness(three_segments(), false, false, true);

    let job_id = h
        .orchestrator
        .submit(SourceLocator::Url("https://example.com/v.mp4".into()), "spanish");

    let final_job = ProgressWatcher::new(h.store.clone(), &job_id)
        .with_poll_interval(Duration::from_millis(5))
        .collect()
        .await
        .pop()
        .expect("snapshot");

    assert_eq!(final_job.status, JobStatus::Failed);
    let error = final_job.error.expect("error recorded");
    assert!(error.to_lowercase().contains("synthesis"), "got: {}", error);
}

#[tokio::test]
async fn empty_transcript_fails_the_job() {
    let h = harness(Vec::new(), false, false, false);

    let job_id = h
        .orchestrator
        .submit(SourceLocator::Url("https://example.com/v.mp4".into()), "spanish");

    let final_job = ProgressWatcher::new(h.store.clone(), &job_id)
        .with_poll_interval(Duration::from_millis(5))
        .collect()
        .await
        .pop()
        .expect("snapshot");

    // Zero segments means zero clips: the synthesize stage must fail the
    // job rather than render a silent dub.
    assert_eq!(final_job.status, JobStatus::Failed);
    assert!(final_job.output_file.is_none());
}
