//! Voice conversation actor.
//!
//! One spawned task owns every piece of loop state; commands and capture
//! events arrive over channels, so no mutation races another. The loop:
//! listen while the user speaks, detect the end of the utterance by a
//! silence window, send the transcript, speak the reply, listen again.
//! Observers follow along through a watch channel of [`VoiceSnapshot`]s.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use colloquy_types::config::VoiceConfig;
use colloquy_types::error::{RequestError, VoiceError};

use crate::completion::{CompletionService, CompletionTurn};
use crate::voice::io::{CaptureControl, CaptureEvent, SpeechSynthesizer};
use crate::voice::waveform::WaveformBuffer;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoicePhase {
    #[default]
    Idle,
    Listening,
    Thinking,
    Speaking,
}

/// Point-in-time view of the loop, published after every state change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VoiceSnapshot {
    pub phase: VoicePhase,
    /// Rolling transcript of the current utterance; empty outside Listening.
    pub transcript: String,
    /// Recent input levels, oldest first.
    pub waveform: Vec<f32>,
    /// Last non-fatal problem, e.g. a failed request.
    pub status: Option<String>,
}

/// One completed voice exchange, emitted on the optional recorder channel
/// so a caller can persist it.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceExchange {
    pub prompt: String,
    pub answer: String,
}

/// Tunables for silence detection and waveform display.
#[derive(Debug, Clone)]
pub struct VoiceSettings {
    /// Levels above this count as speech.
    pub silence_threshold: f32,
    /// Quiet for this long with a non-empty transcript ends the utterance.
    pub silence_window: Duration,
    pub waveform_samples: usize,
    /// Cadence of the silence check.
    pub tick: Duration,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            silence_threshold: 0.1,
            silence_window: Duration::from_millis(1500),
            waveform_samples: 40,
            tick: Duration::from_millis(250),
        }
    }
}

impl From<&VoiceConfig> for VoiceSettings {
    fn from(config: &VoiceConfig) -> Self {
        Self {
            silence_threshold: config.silence_threshold,
            silence_window: Duration::from_millis(config.silence_window_ms),
            waveform_samples: config.waveform_samples,
            ..Self::default()
        }
    }
}

enum Command {
    Start,
    Stop,
}

/// Handle to a spawned voice loop.
pub struct VoiceEngine {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<VoiceSnapshot>,
}

impl VoiceEngine {
    /// Spawn the actor task.
    ///
    /// `events` is the capture pipeline's event stream; `recorder`, when
    /// present, receives every completed exchange.
    pub fn spawn<Cap, Syn, Cli>(
        capture: Cap,
        events: mpsc::Receiver<CaptureEvent>,
        synth: Syn,
        client: Arc<Cli>,
        settings: VoiceSettings,
        recorder: Option<mpsc::Sender<VoiceExchange>>,
    ) -> Self
    where
        Cap: CaptureControl,
        Syn: SpeechSynthesizer,
        Cli: CompletionService + Send + Sync + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(8);
        let (snapshot_tx, snapshot_rx) = watch::channel(VoiceSnapshot::default());

        let actor = Actor {
            capture,
            synth: Arc::new(synth),
            client,
            recorder,
            waveform: WaveformBuffer::new(settings.waveform_samples),
            settings,
            phase: VoicePhase::Idle,
            transcript: String::new(),
            status: None,
            last_voice: Instant::now(),
            in_flight_prompt: None,
            pending_send: None,
            pending_speak: None,
            snapshot: snapshot_tx,
        };
        tokio::spawn(actor.run(command_rx, events));

        Self {
            commands: command_tx,
            snapshot: snapshot_rx,
        }
    }

    /// Begin listening. Ignored unless the loop is idle.
    pub async fn start(&self) {
        let _ = self.commands.send(Command::Start).await;
    }

    /// Return to idle from any phase: capture stopped, any in-flight
    /// request cancelled, playback cut. Barge-in uses this same path.
    pub async fn stop(&self) {
        let _ = self.commands.send(Command::Stop).await;
    }

    pub fn snapshot(&self) -> watch::Receiver<VoiceSnapshot> {
        self.snapshot.clone()
    }
}

struct Actor<Cap, Syn, Cli> {
    capture: Cap,
    synth: Arc<Syn>,
    client: Arc<Cli>,
    recorder: Option<mpsc::Sender<VoiceExchange>>,
    settings: VoiceSettings,
    phase: VoicePhase,
    transcript: String,
    waveform: WaveformBuffer,
    status: Option<String>,
    last_voice: Instant,
    in_flight_prompt: Option<String>,
    pending_send: Option<oneshot::Receiver<Result<Option<String>, RequestError>>>,
    pending_speak: Option<oneshot::Receiver<Result<(), VoiceError>>>,
    snapshot: watch::Sender<VoiceSnapshot>,
}

/// Await the receiver in the slot, or park forever when it is empty. The
/// handler that consumes the result clears the slot.
async fn recv_pending<T>(slot: &mut Option<oneshot::Receiver<T>>) -> Option<T> {
    match slot.as_mut() {
        Some(rx) => rx.await.ok(),
        None => std::future::pending().await,
    }
}

impl<Cap, Syn, Cli> Actor<Cap, Syn, Cli>
where
    Cap: CaptureControl,
    Syn: SpeechSynthesizer,
    Cli: CompletionService + Send + Sync + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::Receiver<CaptureEvent>,
    ) {
        let mut tick = tokio::time::interval(self.settings.tick);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Start) => self.handle_start().await,
                    Some(Command::Stop) => self.handle_stop().await,
                    None => {
                        self.handle_stop().await;
                        break;
                    }
                },
                Some(event) = events.recv() => self.handle_event(event),
                answer = recv_pending(&mut self.pending_send) => self.handle_answer(answer).await,
                spoken = recv_pending(&mut self.pending_speak) => self.handle_spoken(spoken).await,
                _ = tick.tick() => self.handle_tick().await,
            }
        }
    }

    async fn handle_start(&mut self) {
        if self.phase != VoicePhase::Idle {
            return;
        }
        if let Err(err) = self.capture.start().await {
            self.status = Some(err.to_string());
            self.publish();
            return;
        }
        self.transcript.clear();
        self.waveform.clear();
        self.status = None;
        self.last_voice = Instant::now();
        self.phase = VoicePhase::Listening;
        self.publish();
    }

    async fn handle_stop(&mut self) {
        // Dropping the slots silences any in-flight request or playback
        // before their tasks resolve.
        self.pending_send = None;
        self.pending_speak = None;
        self.in_flight_prompt = None;
        self.client.cancel();
        self.synth.stop();
        if let Err(err) = self.capture.stop().await {
            warn!(%err, "capture stop failed");
        }
        self.transcript.clear();
        self.waveform.clear();
        self.phase = VoicePhase::Idle;
        self.publish();
    }

    fn handle_event(&mut self, event: CaptureEvent) {
        if self.phase != VoicePhase::Listening {
            return;
        }
        match event {
            CaptureEvent::Level(level) => {
                self.waveform.push(level);
                if level > self.settings.silence_threshold {
                    self.last_voice = Instant::now();
                }
            }
            CaptureEvent::Transcript(text) => self.transcript = text,
        }
        self.publish();
    }

    async fn handle_tick(&mut self) {
        if self.phase != VoicePhase::Listening || self.transcript.is_empty() {
            return;
        }
        if self.last_voice.elapsed() < self.settings.silence_window {
            return;
        }

        if let Err(err) = self.capture.pause().await {
            self.status = Some(err.to_string());
        }
        let prompt = std::mem::take(&mut self.transcript);
        debug!(chars = prompt.len(), "utterance ended, dispatching");

        let (tx, rx) = oneshot::channel();
        let client = Arc::clone(&self.client);
        let text = prompt.clone();
        tokio::spawn(async move {
            let _ = tx.send(client.send(CompletionTurn::text_only(text)).await);
        });

        self.in_flight_prompt = Some(prompt);
        self.pending_send = Some(rx);
        self.waveform.clear();
        self.phase = VoicePhase::Thinking;
        self.publish();
    }

    async fn handle_answer(&mut self, answer: Option<Result<Option<String>, RequestError>>) {
        self.pending_send = None;
        let prompt = self.in_flight_prompt.take();

        match answer {
            Some(Ok(Some(text))) => {
                if let (Some(recorder), Some(prompt)) = (&self.recorder, prompt) {
                    let exchange = VoiceExchange {
                        prompt,
                        answer: text.clone(),
                    };
                    if recorder.send(exchange).await.is_err() {
                        warn!("exchange recorder dropped");
                    }
                }
                let (tx, rx) = oneshot::channel();
                let synth = Arc::clone(&self.synth);
                tokio::spawn(async move {
                    let _ = tx.send(synth.speak(text).await);
                });
                self.pending_speak = Some(rx);
                self.phase = VoicePhase::Speaking;
                self.publish();
            }
            // Superseded without a stop; just pick up listening again.
            Some(Ok(None)) => self.resume_listening().await,
            Some(Err(err)) => {
                self.status = Some(err.to_string());
                self.resume_listening().await;
            }
            None => {
                self.status = Some("request task dropped".to_string());
                self.resume_listening().await;
            }
        }
    }

    async fn handle_spoken(&mut self, spoken: Option<Result<(), VoiceError>>) {
        self.pending_speak = None;
        if let Some(Err(err)) = spoken {
            self.status = Some(err.to_string());
        }
        self.resume_listening().await;
    }

    async fn resume_listening(&mut self) {
        if let Err(err) = self.capture.resume().await {
            self.status = Some(err.to_string());
        }
        self.last_voice = Instant::now();
        self.phase = VoicePhase::Listening;
        self.publish();
    }

    fn publish(&self) {
        let _ = self.snapshot.send(VoiceSnapshot {
            phase: self.phase,
            transcript: self.transcript.clone(),
            waveform: self.waveform.levels(),
            status: self.status.clone(),
        });
    }
}
