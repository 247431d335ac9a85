//! The audio stream hub (C6): owns the capture device, produces a totally
//! ordered stream of frames, and fans them out to any number of
//! independently-paced subscribers.

mod devices;
mod error;

pub use devices::{list_input_devices, select_input_device, AudioDeviceInfo};
pub use error::AudioError;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::StreamConfig;
use tracing::{debug, error, warn};

use crate::model::AudioFrame;
pub use crate::model::AudioFormat;

const DEFAULT_MAX_FRAMES: usize = 1024;

struct SubscriberQueue {
    frames: VecDeque<AudioFrame>,
    closed: bool,
}

struct Subscriber {
    #[allow(dead_code)]
    name: String,
    max_frames: usize,
    state: Mutex<SubscriberQueue>,
    available: Condvar,
}

impl Subscriber {
    fn push(&self, frame: AudioFrame) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.frames.push_back(frame);
        while state.frames.len() > self.max_frames {
            state.frames.pop_front();
        }
        self.available.notify_one();
    }

    fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

/// A subscriber's handle into the hub's fan-out. Frames are delivered in
/// strictly increasing `sequence` order with no reordering; gaps indicate
/// drops under backpressure.
#[derive(Clone)]
pub struct Reader {
    subscriber: Arc<Subscriber>,
}

impl Reader {
    /// Block up to `timeout` for the next frame. `Some(Duration::ZERO)`
    /// is non-blocking; `None` blocks indefinitely.
    pub fn read(&self, timeout: Option<Duration>) -> Option<AudioFrame> {
        let mut state = self.subscriber.state.lock().unwrap();
        loop {
            if let Some(frame) = state.frames.pop_front() {
                return Some(frame);
            }
            if state.closed {
                return None;
            }
            match timeout {
                Some(Duration::ZERO) => return None,
                Some(d) => {
                    let (guard, result) =
                        self.subscriber.available.wait_timeout(state, d).unwrap();
                    state = guard;
                    if result.timed_out() && state.frames.is_empty() {
                        return None;
                    }
                }
                None => {
                    state = self.subscriber.available.wait(state).unwrap();
                }
            }
        }
    }

    pub fn close(&self) {
        let mut state = self.subscriber.state.lock().unwrap();
        state.closed = true;
        self.subscriber.available.notify_all();
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        self.close();
    }
}

struct HubInner {
    format: AudioFormat,
    sequence: AtomicU64,
    subscribers: Mutex<Vec<Arc<Subscriber>>>,
    running: AtomicBool,
}

impl HubInner {
    fn fan_out(&self, frame: AudioFrame) {
        let mut subs = self.subscribers.lock().unwrap();
        subs.retain(|s| !s.is_closed());
        for s in subs.iter() {
            s.push(frame.clone());
        }
    }
}

/// Owns the capture device and fans frames out to subscribers added and
/// removed at runtime. `start`/`stop` are idempotent.
pub struct StreamHub {
    inner: Arc<HubInner>,
    stream: Mutex<Option<cpal::Stream>>,
}

// cpal::Stream is not Send on some platforms because its inner handle is a
// raw pointer into platform audio APIs; we never touch the stream from more
// than one thread at a time (construction, then drop), so sharing the
// handle behind our own mutex is sound.
unsafe impl Send for StreamHub {}
unsafe impl Sync for StreamHub {}

impl StreamHub {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            inner: Arc::new(HubInner {
                format,
                sequence: AtomicU64::new(0),
                subscribers: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
            }),
            stream: Mutex::new(None),
        }
    }

    pub fn audio_format(&self) -> AudioFormat {
        self.inner.format
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Add a subscriber that will receive every frame produced after this
    /// call returns; no replay of past frames.
    pub fn subscribe(&self, name: impl Into<String>, max_frames: Option<usize>) -> Reader {
        let subscriber = Arc::new(Subscriber {
            name: name.into(),
            max_frames: max_frames.unwrap_or(DEFAULT_MAX_FRAMES),
            state: Mutex::new(SubscriberQueue {
                frames: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        });
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .push(subscriber.clone());
        Reader { subscriber }
    }

    pub fn start(&self) -> Result<(), AudioError> {
        if self.is_running() {
            return Ok(());
        }

        let device = devices::select_input_device()?;
        let format = self.inner.format;
        let config = StreamConfig {
            channels: format.channels,
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(format.blocksize),
        };
        // `format.dtype` is always `Float32`; the device is always opened
        // as an f32 input stream.

        let inner = self.inner.clone();
        let err_inner = self.inner.clone();
        let err_fn = move |err| {
            error!(error = %err, "audio device callback error");
            if matches!(err, cpal::StreamError::DeviceNotAvailable) {
                err_inner.running.store(false, Ordering::SeqCst);
            }
        };

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let sequence = inner.sequence.fetch_add(1, Ordering::SeqCst);
                    let frame = AudioFrame::new(
                        data.to_vec(),
                        inner.format,
                        crate::model::now_nanos(),
                        sequence,
                    );
                    inner.fan_out(frame);
                },
                err_fn,
                None,
            )
            .map_err(AudioError::from)?;

        stream.play().map_err(AudioError::from)?;
        *self.stream.lock().unwrap() = Some(stream);
        self.inner.running.store(true, Ordering::SeqCst);
        debug!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            blocksize = format.blocksize,
            "stream hub started"
        );
        Ok(())
    }

    /// Idempotent; drops any frames still in flight. Subscriber handles are
    /// not closed, so readers observe end-of-stream on their next `read`
    /// only once this hub is dropped entirely or restarted.
    pub fn stop(&self) {
        if let Some(stream) = self.stream.lock().unwrap().take() {
            drop(stream);
        }
        self.inner.running.store(false, Ordering::SeqCst);
        warn!("stream hub stopped");
    }

    /// Fan a frame out to subscribers without a real capture device. Used
    /// by tests in this crate that exercise subscribers against a hub that
    /// was never `start`ed.
    #[cfg(test)]
    pub(crate) fn push_test_frame(&self, frame: AudioFrame) {
        self.inner.fan_out(frame);
    }

    /// Mark the hub as running without opening a real capture device, for
    /// tests of components that gate on `is_running`.
    #[cfg(test)]
    pub(crate) fn force_running_for_test(&self) {
        self.inner.running.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SampleDtype;

    fn format() -> AudioFormat {
        AudioFormat::new(1600, 1, 160, SampleDtype::Float32).unwrap()
    }

    fn frame(format: AudioFormat, sequence: u64) -> AudioFrame {
        AudioFrame::new(vec![0.0; format.blocksize as usize], format, sequence as u128, sequence)
    }

    #[test]
    fn subscriber_receives_frames_in_order() {
        let hub = StreamHub::new(format());
        let reader = hub.subscribe("test", None);
        for seq in 0..5 {
            hub.push_test_frame(frame(format(), seq));
        }
        for seq in 0..5 {
            let f = reader.read(Some(Duration::ZERO)).expect("frame");
            assert_eq!(f.sequence, seq);
        }
        assert!(reader.read(Some(Duration::ZERO)).is_none());
    }

    #[test]
    fn backpressure_drops_oldest_frames() {
        let hub = StreamHub::new(format());
        let reader = hub.subscribe("test", Some(2));
        for seq in 0..5 {
            hub.push_test_frame(frame(format(), seq));
        }
        let first = reader.read(Some(Duration::ZERO)).expect("frame");
        assert_eq!(first.sequence, 3);
        let second = reader.read(Some(Duration::ZERO)).expect("frame");
        assert_eq!(second.sequence, 4);
        assert!(reader.read(Some(Duration::ZERO)).is_none());
    }

    #[test]
    fn closing_reader_stops_fan_out_and_unblocks_read() {
        let hub = StreamHub::new(format());
        let reader = hub.subscribe("test", None);
        reader.close();
        hub.push_test_frame(frame(format(), 0));
        assert!(reader.read(Some(Duration::from_millis(50))).is_none());
    }

    #[test]
    fn dropping_reader_closes_its_subscription() {
        let hub = StreamHub::new(format());
        {
            let _reader = hub.subscribe("test", None);
        }
        // No subscribers left after the reader is dropped; fan_out should
        // not panic even though every subscriber is now closed.
        hub.push_test_frame(frame(format(), 0));
    }
}
